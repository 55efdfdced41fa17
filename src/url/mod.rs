//! URL handling module
//!
//! This module provides URL canonicalization (the dedup key used by the
//! frontier) and the same-site scoping rules of a crawl.

mod domain;
mod normalize;

// Re-export main functions
pub use domain::{in_scope, output_domain};
pub use normalize::{canonicalize, CanonicalUrl};
