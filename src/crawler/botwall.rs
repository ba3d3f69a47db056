//! Bot-wall detection and the clearance checkpoint
//!
//! A blocked page is never parsed. The walker hands control to a
//! [`ClearanceGate`] and fetches the same URL again once it returns.

use crate::config::BotWallConfig;
use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};

/// Case-insensitive marker matching against URL and visible text
#[derive(Debug, Clone)]
pub struct BotWallDetector {
    url_markers: Vec<String>,
    text_markers: Vec<String>,
}

impl BotWallDetector {
    pub fn new(config: &BotWallConfig) -> Self {
        let lower = |markers: &[String]| {
            markers
                .iter()
                .map(|m| m.trim().to_lowercase())
                .filter(|m| !m.is_empty())
                .collect()
        };
        Self {
            url_markers: lower(&config.url_markers),
            text_markers: lower(&config.text_markers),
        }
    }

    /// Returns true when the URL or the visible text carries a marker
    pub fn is_blocked(&self, url: &str, text: &str) -> bool {
        let url = url.to_lowercase();
        if self.url_markers.iter().any(|m| url.contains(m.as_str())) {
            return true;
        }

        let text = text.to_lowercase();
        self.text_markers.iter().any(|m| text.contains(m.as_str()))
    }
}

/// Suspends the walk until a block has been cleared
#[async_trait]
pub trait ClearanceGate: Send + Sync {
    /// Returns once the block is believed cleared
    ///
    /// An error aborts the session.
    async fn await_clearance(&self, url: &str) -> std::io::Result<()>;
}

/// Waits for ENTER on stdin
#[derive(Debug, Default)]
pub struct ConsoleClearance;

impl ConsoleClearance {
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl ClearanceGate for ConsoleClearance {
    async fn await_clearance(&self, url: &str) -> std::io::Result<()> {
        eprintln!();
        eprintln!("Bot wall detected at {}", url);
        eprintln!("Solve it in a browser, then press ENTER to continue...");

        let mut line = String::new();
        let read = BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
        if read == 0 {
            return Err(std::io::Error::new(
                std::io::ErrorKind::UnexpectedEof,
                "stdin closed while waiting for bot-wall clearance",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn detector() -> BotWallDetector {
        BotWallDetector::new(&BotWallConfig::default())
    }

    #[test]
    fn test_url_markers() {
        let d = detector();
        assert!(d.is_blocked("https://www.example.hr/captcha?ref=x", ""));
        assert!(d.is_blocked("https://www.example.hr/UNBLOCK", ""));
        assert!(!d.is_blocked("https://www.example.hr/auti/golf", ""));
    }

    #[test]
    fn test_text_marker_case_insensitive() {
        let d = detector();
        assert!(d.is_blocked("https://www.example.hr/auti/1", "Please solve the CAPTCHA"));
        assert!(!d.is_blocked("https://www.example.hr/auti/1", "Marka automobila\nVW"));
    }

    #[test]
    fn test_unblock_only_checked_in_url() {
        let d = detector();
        assert!(!d.is_blocked("https://www.example.hr/auti/1", "how to unblock a drain"));
    }

    #[test]
    fn test_custom_markers() {
        let d = BotWallDetector::new(&BotWallConfig {
            url_markers: vec![],
            text_markers: vec!["  Access Denied ".to_string(), " ".to_string()],
        });
        assert!(d.is_blocked("https://x.hr", "<b>access denied</b>"));
        assert!(!d.is_blocked("https://x.hr/captcha", "fine"));
    }
}
