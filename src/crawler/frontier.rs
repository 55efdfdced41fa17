//! Breadth-first crawl frontier
//!
//! This module handles:
//! - The FIFO queue of pages waiting to be fetched
//! - The visited set used to deduplicate canonical URLs
//! - Enforcement of the depth and page budgets at offer time

use crate::url::CanonicalUrl;
use std::collections::{HashSet, VecDeque};

/// A URL waiting to be fetched, with its link distance from the start URL
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrontierEntry {
    /// The canonical URL to fetch
    pub url: CanonicalUrl,

    /// Link distance from the start URL (start URL is 0)
    pub depth: u32,
}

/// What happened to a URL handed to [`Frontier::offer`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Offer {
    /// Marked visited and appended to the queue
    Queued,
    /// Already enqueued or fetched during this crawl
    Duplicate,
    /// Deeper than the crawl's maximum depth
    TooDeep,
    /// The page budget is already spoken for
    BudgetFull,
}

/// Frontier queue plus visited set for one crawl run
///
/// Entries leave the queue in the order they were offered. Since every entry
/// at depth `d + 1` is offered while processing an entry at depth `d`, all
/// depth-`d` entries are taken before any depth-`d + 1` entry.
///
/// The visited set only grows. The page budget is checked against the number
/// of URLs admitted through [`Frontier::offer`], start URL included: once
/// `max_pages` URLs have been admitted, new discoveries are dropped before
/// they are ever fetched. A redirect target takes over the admission of the
/// URL that redirected to it, so redirects never eat into the budget.
#[derive(Debug)]
pub struct Frontier {
    /// URLs waiting to be fetched, in breadth-first order
    queue: VecDeque<FrontierEntry>,

    /// Every URL admitted or reached through a redirect so far
    visited: HashSet<CanonicalUrl>,

    /// Number of URLs admitted through `offer`
    admitted: usize,

    /// Deepest depth that may be queued
    max_depth: u32,

    /// Maximum number of URLs ever admitted
    max_pages: usize,
}

impl Frontier {
    /// Creates an empty frontier with the given budgets
    pub fn new(max_depth: u32, max_pages: usize) -> Self {
        Self {
            queue: VecDeque::new(),
            visited: HashSet::new(),
            admitted: 0,
            max_depth,
            max_pages,
        }
    }

    /// Inserts the start URL at depth 0
    ///
    /// The start URL counts against the page budget like any other page.
    pub fn seed(&mut self, url: CanonicalUrl) -> Offer {
        self.offer(url, 0)
    }

    /// Offers a discovered URL for crawling
    ///
    /// The membership check and the enqueue happen in this one call, so the
    /// same canonical URL can never be queued twice.
    pub fn offer(&mut self, url: CanonicalUrl, depth: u32) -> Offer {
        if self.visited.contains(&url) {
            return Offer::Duplicate;
        }

        if depth > self.max_depth {
            return Offer::TooDeep;
        }

        if self.admitted >= self.max_pages {
            return Offer::BudgetFull;
        }

        self.visited.insert(url.clone());
        self.admitted += 1;
        self.queue.push_back(FrontierEntry { url, depth });
        Offer::Queued
    }

    /// Queues the target of a redirect in place of the URL that redirected
    ///
    /// The target keeps the depth of the redirecting entry and goes to the
    /// front of the queue, which keeps the queue in breadth-first order. It
    /// is not checked against the budget.
    pub fn redirect(&mut self, url: CanonicalUrl, depth: u32) -> Offer {
        if !self.visited.insert(url.clone()) {
            return Offer::Duplicate;
        }

        self.queue.push_front(FrontierEntry { url, depth });
        Offer::Queued
    }

    /// Marks a URL as visited without queueing it
    ///
    /// Returns `false` if the URL was already visited.
    pub fn mark_visited(&mut self, url: CanonicalUrl) -> bool {
        self.visited.insert(url)
    }

    /// Removes and returns the next entry
    ///
    /// `None` only means the queue is currently empty. Fetches still in
    /// flight may offer more URLs afterwards.
    pub fn take(&mut self) -> Option<FrontierEntry> {
        self.queue.pop_front()
    }

    /// Returns the number of queued entries
    pub fn len(&self) -> usize {
        self.queue.len()
    }

    /// Returns whether the queue is empty
    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }

    /// Returns the number of URLs admitted against the page budget
    pub fn admitted_count(&self) -> usize {
        self.admitted
    }

    /// Returns the number of distinct URLs seen so far, redirect targets included
    pub fn visited_count(&self) -> usize {
        self.visited.len()
    }

    /// Returns whether a URL has already been admitted
    pub fn is_visited(&self, url: &CanonicalUrl) -> bool {
        self.visited.contains(url)
    }

    /// Deepest depth that may be queued
    pub fn max_depth(&self) -> u32 {
        self.max_depth
    }

    /// Maximum number of URLs admitted through `offer`
    pub fn max_pages(&self) -> usize {
        self.max_pages
    }
}
