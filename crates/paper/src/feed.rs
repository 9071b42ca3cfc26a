use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;

use common::{Bar, BarFeed, Error, Result};

/// Bar feed that replays a fixed history one bar at a time.
///
/// `visible` counts how many bars from the front of the history the
/// consumer may see; `advance` reveals the next one. Once the history
/// is exhausted `recent_bars` errors, which the live loop treats as a
/// feed outage and eventually shuts down on.
pub struct ReplayFeed {
    bars: Vec<Bar>,
    visible: AtomicUsize,
}

impl ReplayFeed {
    /// Start with `initial` bars already visible (the warm-up window).
    pub fn new(bars: Vec<Bar>, initial: usize) -> Self {
        let initial = initial.min(bars.len());
        Self {
            bars,
            visible: AtomicUsize::new(initial),
        }
    }

    /// Reveal the next bar. Returns `false` once the history is spent.
    pub fn advance(&self) -> bool {
        let visible = self.visible.load(Ordering::Relaxed);
        if visible >= self.bars.len() {
            return false;
        }
        self.visible.store(visible + 1, Ordering::Relaxed);
        true
    }

    /// The most recently revealed bar, if any.
    pub fn current_bar(&self) -> Option<Bar> {
        let visible = self.visible.load(Ordering::Relaxed);
        if visible == 0 {
            None
        } else {
            Some(self.bars[visible - 1])
        }
    }
}

#[async_trait]
impl BarFeed for ReplayFeed {
    async fn recent_bars(&self, _symbol: &str, count: usize) -> Result<Vec<Bar>> {
        let visible = self.visible.load(Ordering::Relaxed);
        if visible == 0 {
            return Err(Error::Other("replay feed has no bars yet".to_string()));
        }
        let start = visible.saturating_sub(count);
        Ok(self.bars[start..visible].to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone, Utc};

    fn bars(n: usize) -> Vec<Bar> {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        (0..n)
            .map(|i| Bar {
                time: start + Duration::hours(i as i64),
                open: 1.0 + i as f64,
                high: 1.5 + i as f64,
                low: 0.5 + i as f64,
                close: 1.2 + i as f64,
                volume: 100.0,
            })
            .collect()
    }

    #[tokio::test]
    async fn window_slides_forward_with_advance() {
        let feed = ReplayFeed::new(bars(5), 3);

        let window = feed.recent_bars("EURUSD", 3).await.unwrap();
        assert_eq!(window.len(), 3);
        assert_eq!(window[2].open, 3.0);

        assert!(feed.advance());
        let window = feed.recent_bars("EURUSD", 3).await.unwrap();
        assert_eq!(window[2].open, 4.0);
        // Oldest-first ordering.
        assert!(window[0].time < window[2].time);
    }

    #[tokio::test]
    async fn short_history_returns_what_exists() {
        let feed = ReplayFeed::new(bars(2), 2);
        let window = feed.recent_bars("EURUSD", 10).await.unwrap();
        assert_eq!(window.len(), 2);
    }

    #[tokio::test]
    async fn advance_stops_at_end_of_history() {
        let feed = ReplayFeed::new(bars(3), 2);
        assert!(feed.advance());
        assert!(!feed.advance());
        assert_eq!(feed.current_bar().unwrap().open, 3.0);
    }

    #[tokio::test]
    async fn empty_feed_errors() {
        let feed = ReplayFeed::new(vec![], 0);
        assert!(feed.recent_bars("EURUSD", 5).await.is_err());
        assert!(feed.current_bar().is_none());
    }
}
