/// Page status definitions for crawl records
use std::fmt;

/// Final status of a page fetch attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PageStatus {
    /// Page was fetched and written to disk
    Ok,

    /// Page fetch or write failed; nothing was kept for it
    Failed,
}

impl PageStatus {
    /// Returns true if this represents a successful completion
    pub fn is_success(&self) -> bool {
        matches!(self, Self::Ok)
    }

    /// Returns the lowercase name used in logs and summaries
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for PageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// The step at which a failed page was lost
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailureStage {
    /// The page could not be fetched or converted
    Fetch,

    /// The page was fetched but its file could not be written
    Write,
}
