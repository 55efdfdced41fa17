use crate::UrlError;
use std::fmt;
use url::Url;

/// A URL in canonical form, usable as an equality and dedup key
///
/// Values can only be built through [`canonicalize`], so two `CanonicalUrl`s
/// compare equal exactly when they name the same page for crawl purposes.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CanonicalUrl(Url);

impl CanonicalUrl {
    /// Canonicalizes an absolute URL string
    pub fn parse(raw: &str) -> Result<Self, UrlError> {
        canonicalize(raw, None)
    }

    /// Returns the canonical URL as a string
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns the underlying parsed URL
    pub fn as_url(&self) -> &Url {
        &self.0
    }

    /// Returns the lowercase host
    pub fn host(&self) -> &str {
        // canonicalize() rejects URLs without a host
        self.0.host_str().unwrap_or_default()
    }

    /// Returns the URL path (always starts with `/`)
    pub fn path(&self) -> &str {
        self.0.path()
    }
}

impl fmt::Display for CanonicalUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

impl AsRef<str> for CanonicalUrl {
    fn as_ref(&self) -> &str {
        self.0.as_str()
    }
}

/// Canonicalizes a URL, resolving it against `base` when given
///
/// # Canonicalization Steps
///
/// 1. Resolve `raw` against `base` (or parse it as an absolute URL)
/// 2. Reject anything that is not HTTP(S)
/// 3. Lowercase the scheme and host; default ports are dropped by the parser
/// 4. Normalize the path:
///    - Remove dot segments (. and ..)
///    - Collapse repeated slashes
///    - Remove trailing slash (except for root /)
/// 5. Remove the fragment (everything after #)
/// 6. Drop an empty query string (trailing ?)
///
/// Non-empty query strings are kept as-is: distinct queries are distinct pages.
///
/// # Arguments
///
/// * `raw` - The URL string to canonicalize, absolute or relative
/// * `base` - The URL of the page the link was found on
///
/// # Returns
///
/// * `Ok(CanonicalUrl)` - Canonical URL
/// * `Err(UrlError)` - Unparsable URL, unsupported scheme, or missing host
///
/// # Examples
///
/// ```
/// use crawldown::url::canonicalize;
///
/// let url = canonicalize("HTTPS://Docs.Example.COM:443/guide/#intro", None).unwrap();
/// assert_eq!(url.as_str(), "https://docs.example.com/guide");
/// ```
pub fn canonicalize(raw: &str, base: Option<&Url>) -> Result<CanonicalUrl, UrlError> {
    let raw = raw.trim();

    // Step 1: Resolve
    let parsed = match base {
        Some(base) => base.join(raw),
        None => Url::parse(raw),
    };
    let mut url = parsed.map_err(|e| UrlError::Parse(format!("{}: {}", raw, e)))?;

    // Step 2: Validate scheme
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    // Step 3: Lowercase the host
    let host = url.host_str().ok_or(UrlError::MissingHost)?.to_lowercase();
    url.set_host(Some(&host))
        .map_err(|e| UrlError::Parse(format!("Failed to set host: {}", e)))?;

    // Step 4: Normalize path
    let normalized_path = normalize_path(url.path());
    url.set_path(&normalized_path);

    // Step 5: Remove fragment
    url.set_fragment(None);

    // Step 6: Remove empty query
    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(CanonicalUrl(url))
}

/// Normalizes a URL path by removing dot segments and trailing slashes
fn normalize_path(path: &str) -> String {
    let mut segments: Vec<&str> = Vec::new();

    for segment in path.split('/') {
        match segment {
            "" | "." => continue,
            ".." => {
                segments.pop();
            }
            _ => segments.push(segment),
        }
    }

    format!("/{}", segments.join("/"))
}
