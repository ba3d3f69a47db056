//! Randomized pacing between item fetches

use crate::config::PacingConfig;
use rand::Rng;
use std::time::Duration;

/// Sleeps a uniformly random duration from `[min, max]`
#[derive(Debug, Clone, Copy)]
pub struct RateLimiter {
    min_ms: u64,
    max_ms: u64,
}

impl RateLimiter {
    /// Creates a limiter; bounds are swapped if given in the wrong order
    pub fn new(min: Duration, max: Duration) -> Self {
        let (a, b) = (min.as_millis() as u64, max.as_millis() as u64);
        Self {
            min_ms: a.min(b),
            max_ms: a.max(b),
        }
    }

    pub fn from_config(config: &PacingConfig) -> Self {
        Self::new(
            Duration::from_millis(config.min_delay_ms),
            Duration::from_millis(config.max_delay_ms),
        )
    }

    /// Draws the next delay
    pub fn next_delay(&self) -> Duration {
        if self.min_ms == self.max_ms {
            return Duration::from_millis(self.min_ms);
        }
        Duration::from_millis(rand::thread_rng().gen_range(self.min_ms..=self.max_ms))
    }

    pub async fn delay(&self) {
        let pause = self.next_delay();
        tracing::trace!("Pausing {:?} before next item", pause);
        tokio::time::sleep(pause).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_delay_within_bounds() {
        let limiter = RateLimiter::new(Duration::from_millis(2500), Duration::from_millis(5000));
        for _ in 0..200 {
            let d = limiter.next_delay();
            assert!(d >= Duration::from_millis(2500) && d <= Duration::from_millis(5000));
        }
    }

    #[test]
    fn test_equal_bounds_are_fixed() {
        let limiter = RateLimiter::new(Duration::ZERO, Duration::ZERO);
        assert_eq!(limiter.next_delay(), Duration::ZERO);
    }

    #[test]
    fn test_from_config() {
        let limiter = RateLimiter::from_config(&PacingConfig {
            min_delay_ms: 10,
            max_delay_ms: 20,
        });
        let d = limiter.next_delay();
        assert!(d >= Duration::from_millis(10) && d <= Duration::from_millis(20));
    }

    #[tokio::test]
    async fn test_delay_sleeps() {
        let limiter = RateLimiter::new(Duration::from_millis(20), Duration::from_millis(20));
        let start = tokio::time::Instant::now();
        limiter.delay().await;
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
