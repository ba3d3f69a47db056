//! Walk phase definitions for tracking crawl progress
//!
//! The walker moves through these phases for every index page and every
//! item link it harvests.

use std::fmt;

/// Phase of the index walk
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WalkPhase {
    /// Requesting the index page under the cursor
    FetchingIndex,

    /// Collecting unseen item links from the index page
    HarvestingLinks,

    /// Requesting one item page
    FetchingItem,

    /// Pulling fields, price and title out of the item page
    Extracting,

    /// Validating the candidate and recording the outcome
    Deciding,

    /// Moving the cursor to the next index page
    AdvancePage,

    /// Walk finished
    Terminate,
}

impl WalkPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FetchingIndex => "fetching_index",
            Self::HarvestingLinks => "harvesting_links",
            Self::FetchingItem => "fetching_item",
            Self::Extracting => "extracting",
            Self::Deciding => "deciding",
            Self::AdvancePage => "advance_page",
            Self::Terminate => "terminate",
        }
    }
}

impl fmt::Display for WalkPhase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why the walk ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// An index page had no item link that was not already seen
    NoUnseenLinks,

    /// The dataset reached the configured size
    TargetReached,

    /// The configured last index page was walked
    PageLimit,

    /// Several index pages in a row could not be fetched
    IndexUnreachable,
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoUnseenLinks => write!(f, "index page had no unseen links"),
            Self::TargetReached => write!(f, "target record count reached"),
            Self::PageLimit => write!(f, "last configured index page walked"),
            Self::IndexUnreachable => write!(f, "index pages kept failing"),
        }
    }
}
