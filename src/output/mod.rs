//! Output module for writing crawl results to disk
//!
//! This module handles:
//! - Preparing the per-domain output directory
//! - Writing one markdown file per crawled page
//! - Generating the `index.md` navigation document
//! - Printing the end-of-crawl summary

mod error;
mod index;
pub mod stats;
mod writer;

pub use error::{OutputError, OutputResult};
pub use index::{format_index, write_index};
pub use stats::{format_summary, print_summary};
pub use writer::{
    page_file_name, render_page, slugify, OutputDir, PageWriter, WrittenPage, INDEX_FILE,
    PAGES_DIR,
};
