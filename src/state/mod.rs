//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `CrawlState`: seen item URLs and accepted records, carried across restarts
//! - `FrontierCursor`: position in the index walk, reset every session
//! - `WalkPhase` / `StopReason`: the walker's state machine vocabulary

mod crawl_state;
mod phase;

pub use crawl_state::{CrawlState, FrontierCursor};
pub use phase::{StopReason, WalkPhase};
