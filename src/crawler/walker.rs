//! Index walker - main harvest orchestration logic
//!
//! This module contains the walk over paginated index pages:
//! - Fetching each index page and harvesting unseen item links
//! - Fetching, extracting and validating every unseen item
//! - Checkpointing at bot walls
//! - Autosaving the dataset and flushing it once more at the end

use crate::config::{Config, CrawlerConfig};
use crate::crawler::botwall::{BotWallDetector, ClearanceGate};
use crate::crawler::fetcher::{Page, PageKind, PageSource};
use crate::crawler::parser::harvest_item_links;
use crate::crawler::rate_limit::RateLimiter;
use crate::extract::{extract_price, page_title, visible_text, FieldExtractor};
use crate::listing::Validator;
use crate::state::{CrawlState, FrontierCursor, StopReason, WalkPhase};
use crate::storage::SnapshotStore;
use crate::{ConfigError, HarvestError};
use regex::Regex;
use scraper::Html;
use url::Url;

/// Index fetch failures in a row after which the walk gives up
const MAX_CONSECUTIVE_INDEX_FAILURES: u32 = 5;

/// Counters reported at the end of a session
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct WalkSummary {
    pub stop_reason: Option<StopReason>,
    pub index_pages: u32,
    pub index_failures: u32,
    pub items_attempted: usize,
    pub accepted: usize,
    pub rejected: usize,
    pub item_failures: usize,
    pub bot_walls: usize,
    pub flushes: usize,
    pub flush_failures: usize,
    pub records_total: usize,
}

/// A fetched page that passed the bot-wall check
struct ClearedPage {
    page: Page,
    text: String,
}

/// Walks index pages and builds the dataset
pub struct Walker {
    crawler: CrawlerConfig,
    target: usize,
    autosave_every: usize,
    item_pattern: Regex,
    extractor: FieldExtractor,
    validator: Validator,
    detector: BotWallDetector,
    limiter: RateLimiter,
    source: Box<dyn PageSource>,
    gate: Box<dyn ClearanceGate>,
    store: Box<dyn SnapshotStore>,
    state: CrawlState,
    phase: WalkPhase,
    since_flush: usize,
    summary: WalkSummary,
}

impl Walker {
    /// Creates a walker over `state`
    ///
    /// # Arguments
    ///
    /// * `config` - Validated configuration
    /// * `state` - State restored from the snapshot, or empty
    /// * `source` - Where pages come from
    /// * `gate` - What to wait on when a bot wall shows up
    /// * `store` - Where the dataset is flushed
    pub fn new(
        config: &Config,
        state: CrawlState,
        source: Box<dyn PageSource>,
        gate: Box<dyn ClearanceGate>,
        store: Box<dyn SnapshotStore>,
    ) -> Result<Self, HarvestError> {
        let item_pattern = Regex::new(&config.crawler.item_path_pattern)
            .map_err(|e| ConfigError::InvalidPattern(e.to_string()))?;

        Ok(Self {
            crawler: config.crawler.clone(),
            target: config.crawler.target_records,
            autosave_every: config.output.autosave_every.max(1),
            item_pattern,
            extractor: FieldExtractor::new(&config.labels),
            validator: Validator::for_today(config.validation.min_price),
            detector: BotWallDetector::new(&config.bot_wall),
            limiter: RateLimiter::from_config(&config.pacing),
            source,
            gate,
            store,
            state,
            phase: WalkPhase::FetchingIndex,
            since_flush: 0,
            summary: WalkSummary::default(),
        })
    }

    /// Replaces the validator (fixed reference year in tests)
    pub fn with_validator(mut self, validator: Validator) -> Self {
        self.validator = validator;
        self
    }

    pub fn state(&self) -> &CrawlState {
        &self.state
    }

    pub fn phase(&self) -> WalkPhase {
        self.phase
    }

    /// Runs the walk to completion
    ///
    /// The dataset is flushed once more on the way out, also when the walk
    /// ends with an error.
    pub async fn run(&mut self) -> Result<WalkSummary, HarvestError> {
        let outcome = if self.target_reached() {
            tracing::info!(
                "Dataset already holds {} records (target {}), skipping walk",
                self.state.record_count(),
                self.target
            );
            Ok(StopReason::TargetReached)
        } else {
            self.walk().await
        };

        self.set_phase(WalkPhase::Terminate);
        self.flush("final");

        let stop_reason = outcome?;
        self.summary.stop_reason = Some(stop_reason);
        self.summary.records_total = self.state.record_count();

        tracing::info!(
            "Walk finished ({}): {} index pages, {} items tried, {} accepted, {} rejected, {} records total",
            stop_reason,
            self.summary.index_pages,
            self.summary.items_attempted,
            self.summary.accepted,
            self.summary.rejected,
            self.summary.records_total
        );

        Ok(self.summary.clone())
    }

    async fn walk(&mut self) -> Result<StopReason, HarvestError> {
        let mut cursor = FrontierCursor::new(self.crawler.start_page);
        let mut failures_in_row = 0u32;

        loop {
            if self.crawler.max_pages.is_some_and(|max| cursor.page > max) {
                return Ok(StopReason::PageLimit);
            }

            self.set_phase(WalkPhase::FetchingIndex);
            let index_url = self.crawler.index_url(cursor.page);
            tracing::info!("Index page {}: {}", cursor.page, index_url);

            let Some(index) = self.fetch_cleared(&index_url, PageKind::Index).await? else {
                self.summary.index_failures += 1;
                failures_in_row += 1;
                if failures_in_row >= MAX_CONSECUTIVE_INDEX_FAILURES {
                    tracing::error!("{} index pages in a row failed, giving up", failures_in_row);
                    return Ok(StopReason::IndexUnreachable);
                }
                self.set_phase(WalkPhase::AdvancePage);
                cursor.advance();
                continue;
            };
            failures_in_row = 0;
            self.summary.index_pages += 1;

            self.set_phase(WalkPhase::HarvestingLinks);
            let unseen: Vec<String> = self
                .harvest(&index.page)
                .into_iter()
                .filter(|link| !self.state.is_seen(link))
                .collect();
            cursor.new_links = unseen.len();
            tracing::info!("Page {}: {} unseen item links", cursor.page, cursor.new_links);

            if unseen.is_empty() {
                return Ok(StopReason::NoUnseenLinks);
            }

            for link in unseen {
                if !self.state.mark_seen(&link) {
                    continue;
                }
                self.process_item(&link).await?;

                if self.target_reached() {
                    return Ok(StopReason::TargetReached);
                }
            }

            if self.crawler.max_pages == Some(cursor.page) {
                return Ok(StopReason::PageLimit);
            }

            self.set_phase(WalkPhase::AdvancePage);
            cursor.advance();
        }
    }

    async fn process_item(&mut self, url: &str) -> Result<(), HarvestError> {
        self.set_phase(WalkPhase::FetchingItem);
        self.summary.items_attempted += 1;
        self.limiter.delay().await;

        let Some(item) = self.fetch_cleared(url, PageKind::Item).await? else {
            self.summary.item_failures += 1;
            return Ok(());
        };

        self.set_phase(WalkPhase::Extracting);
        let (fields, title) = {
            let document = Html::parse_document(&item.page.body);
            let raw = self.extractor.extract(&document);
            tracing::trace!("{}: {} raw fields via {:?}", url, raw.len(), raw.strategy());
            (self.extractor.resolve(&raw), page_title(&document))
        };
        let price = extract_price(&item.text);

        self.set_phase(WalkPhase::Deciding);
        match self.validator.validate(&fields, price, &title, url) {
            Ok(listing) => {
                if self.state.append(listing) {
                    self.summary.accepted += 1;
                    self.since_flush += 1;
                    tracing::info!(
                        "Accepted {}/{}: {}",
                        self.state.record_count(),
                        self.target,
                        url
                    );
                    if self.since_flush >= self.autosave_every {
                        self.flush("autosave");
                    }
                }
            }
            Err(rejection) => {
                self.summary.rejected += 1;
                tracing::debug!("Rejected {}: {}", url, rejection);
            }
        }

        Ok(())
    }

    /// Fetches a page, waiting out bot walls
    ///
    /// Returns None on a transient fetch failure. A blocked page is fetched
    /// again after the gate returns.
    async fn fetch_cleared(
        &mut self,
        url: &str,
        kind: PageKind,
    ) -> Result<Option<ClearedPage>, HarvestError> {
        loop {
            let page = match self.source.fetch(url, kind).await {
                Ok(page) => page,
                Err(e) => {
                    tracing::warn!("{}", e);
                    return Ok(None);
                }
            };

            if page.status >= 400 {
                tracing::debug!("{} answered HTTP {}", page.url, page.status);
            }

            let text = visible_text(&Html::parse_document(&page.body));
            if !self.detector.is_blocked(&page.url, &text) {
                return Ok(Some(ClearedPage { page, text }));
            }

            self.summary.bot_walls += 1;
            tracing::warn!("Bot wall at {} (requested {}), waiting for clearance", page.url, url);
            self.gate.await_clearance(url).await?;
            tracing::info!("Clearance confirmed, fetching {} again", url);
        }
    }

    fn harvest(&self, page: &Page) -> Vec<String> {
        let base = match Url::parse(&page.url) {
            Ok(base) => base,
            Err(e) => {
                tracing::warn!("Index page URL {} does not parse: {}", page.url, e);
                return Vec::new();
            }
        };
        let document = Html::parse_document(&page.body);
        harvest_item_links(&document, &base, &self.item_pattern)
    }

    /// Writes the dataset; failures are logged and retried at the next trigger
    fn flush(&mut self, reason: &str) {
        self.since_flush = 0;
        match self.store.flush(self.state.records()) {
            Ok(rows) => {
                self.summary.flushes += 1;
                tracing::info!("Saved {} rows to {} ({})", rows, self.store.location(), reason);
            }
            Err(e) => {
                self.summary.flush_failures += 1;
                tracing::error!("Failed to save {} ({}): {}", self.store.location(), reason, e);
            }
        }
    }

    fn target_reached(&self) -> bool {
        self.state.record_count() >= self.target
    }

    fn set_phase(&mut self, phase: WalkPhase) {
        tracing::trace!("{} -> {}", self.phase, phase);
        self.phase = phase;
    }
}
