//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `PageStatus`: Outcome of a single fetch attempt (ok or failed)
//! - `PageRecord`: One record per dequeued frontier entry
//! - `CrawlResult`: Everything the index builder needs once the crawl ends

mod page_record;
mod page_state;

// Re-export main types
pub use page_record::{CrawlResult, PageRecord};
pub use page_state::{FailureStage, PageStatus};
