use super::CanonicalUrl;

/// Checks whether a discovered URL belongs to the site being crawled
///
/// A URL is in scope only when its canonical host is exactly the start host:
/// subdomains and other domains are never followed. Scheme is not compared,
/// so `http://` links on an `https://` site stay in scope.
///
/// # Arguments
///
/// * `url` - The canonical URL of the discovered link
/// * `start_host` - The canonical host of the start URL
pub fn in_scope(url: &CanonicalUrl, start_host: &str) -> bool {
    url.host() == start_host
}

/// Returns the directory name used for a crawl's output
///
/// This is the canonical host, with `_<port>` appended when the URL carries
/// a non-default port. Any `:` left (IPv6 hosts) is replaced with `_`.
///
/// # Examples
///
/// ```
/// use crawldown::url::{output_domain, CanonicalUrl};
///
/// let url = CanonicalUrl::parse("http://127.0.0.1:8080/docs").unwrap();
/// assert_eq!(output_domain(&url), "127.0.0.1_8080");
/// ```
pub fn output_domain(url: &CanonicalUrl) -> String {
    let name = match url.as_url().port() {
        Some(port) => format!("{}_{}", url.host(), port),
        None => url.host().to_string(),
    };
    name.replace(':', "_")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn canonical(raw: &str) -> CanonicalUrl {
        CanonicalUrl::parse(raw).unwrap()
    }

    #[test]
    fn test_same_host_in_scope() {
        let url = canonical("https://docs.example.com/guide");
        assert!(in_scope(&url, "docs.example.com"));
    }

    #[test]
    fn test_scheme_ignored_for_scope() {
        let url = canonical("http://docs.example.com/guide");
        assert!(in_scope(&url, "docs.example.com"));
    }

    #[test]
    fn test_subdomain_out_of_scope() {
        let url = canonical("https://api.docs.example.com/");
        assert!(!in_scope(&url, "docs.example.com"));
    }

    #[test]
    fn test_parent_domain_out_of_scope() {
        let url = canonical("https://example.com/");
        assert!(!in_scope(&url, "docs.example.com"));
    }

    #[test]
    fn test_other_domain_out_of_scope() {
        let url = canonical("https://github.com/example/docs");
        assert!(!in_scope(&url, "docs.example.com"));
    }

    #[test]
    fn test_output_domain_plain_host() {
        assert_eq!(
            output_domain(&canonical("https://Docs.Example.com/a")),
            "docs.example.com"
        );
    }

    #[test]
    fn test_output_domain_default_port_dropped() {
        assert_eq!(
            output_domain(&canonical("https://example.com:443/")),
            "example.com"
        );
    }

    #[test]
    fn test_output_domain_ipv6() {
        assert_eq!(output_domain(&canonical("http://[::1]:3000/")), "[__1]_3000");
    }
}
