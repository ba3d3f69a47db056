use crate::listing::Listing;
use std::collections::HashSet;

/// Seen URLs and accepted records of the current dataset
///
/// Every `source_url` in `records` is also in `seen_urls`, and no two
/// records share a `source_url`. The walker owns the only instance.
#[derive(Debug, Clone, Default)]
pub struct CrawlState {
    seen_urls: HashSet<String>,
    record_urls: HashSet<String>,
    records: Vec<Listing>,
}

impl CrawlState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuilds state from a snapshot
    ///
    /// `seen` holds every URL present in the snapshot, including rows that
    /// could not be turned back into records. Records with a URL already
    /// kept are dropped, first occurrence wins.
    pub fn from_snapshot(seen: impl IntoIterator<Item = String>, records: Vec<Listing>) -> Self {
        let mut state = Self {
            seen_urls: seen.into_iter().collect(),
            record_urls: HashSet::with_capacity(records.len()),
            records: Vec::with_capacity(records.len()),
        };
        for listing in records {
            state.append(listing);
        }
        state
    }

    /// Marks a URL as visited; returns false if it already was
    pub fn mark_seen(&mut self, url: &str) -> bool {
        if self.seen_urls.contains(url) {
            return false;
        }
        self.seen_urls.insert(url.to_string())
    }

    pub fn is_seen(&self, url: &str) -> bool {
        self.seen_urls.contains(url)
    }

    /// Appends an accepted listing; returns false for a duplicate URL
    pub fn append(&mut self, listing: Listing) -> bool {
        if !self.record_urls.insert(listing.source_url.clone()) {
            return false;
        }
        self.seen_urls.insert(listing.source_url.clone());
        self.records.push(listing);
        true
    }

    pub fn records(&self) -> &[Listing] {
        &self.records
    }

    pub fn record_count(&self) -> usize {
        self.records.len()
    }

    pub fn seen_count(&self) -> usize {
        self.seen_urls.len()
    }
}

/// Position in the index walk
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrontierCursor {
    /// Index page number being walked
    pub page: u32,

    /// Unseen item links harvested from the current page
    pub new_links: usize,
}

impl FrontierCursor {
    pub fn new(start_page: u32) -> Self {
        Self {
            page: start_page,
            new_links: 0,
        }
    }

    /// Moves to the next index page
    pub fn advance(&mut self) {
        self.page = self.page.saturating_add(1);
        self.new_links = 0;
    }
}
