//! Turns completed chat turns and user votes into catalog updates.
//!
//! The aggregator owns the catalog and the store it came from. Every mutation
//! is followed by a save; the in-memory catalog is authoritative either way.

use tracing::{debug, warn};

use super::display::DisplayStats;
use super::stats::{MetricsCatalog, ModelStats};
use super::store::StatsStore;
use crate::backend::ModelInfo;
use crate::utils::token_counter::count_tokens;

/// What a recorded turn contributed to the windows.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TurnSample {
    pub tokens: usize,
    pub latency: f64,
    pub throughput: f64,
}

pub struct MetricsAggregator {
    store: StatsStore,
    catalog: MetricsCatalog,
    window: usize,
}

impl MetricsAggregator {
    /// Wrap an already-loaded catalog.
    pub fn new(store: StatsStore, mut catalog: MetricsCatalog, window: usize) -> Self {
        let window = window.max(1);
        catalog.normalize(window);
        Self {
            store,
            catalog,
            window,
        }
    }

    /// Load the catalog from `store` and wrap it.
    pub fn load(mut store: StatsStore, window: usize) -> Self {
        let catalog = store.load();
        debug!(models = catalog.len(), "metrics catalog loaded");
        Self::new(store, catalog, window)
    }

    /// Record one successful turn.
    ///
    /// Returns `None` and leaves the catalog untouched when `elapsed_secs` is
    /// not a positive finite number, since no throughput can be derived.
    pub fn record_turn(&mut self, model: &str, content: &str, elapsed_secs: f64) -> Option<TurnSample> {
        if !(elapsed_secs.is_finite() && elapsed_secs > 0.0) {
            warn!(model, elapsed_secs, "skipping turn sample with non-positive duration");
            return None;
        }

        let tokens = count_tokens(content);
        let throughput = tokens as f64 / elapsed_secs;
        self.catalog
            .entry(model)
            .push_sample(elapsed_secs, throughput, self.window);
        self.persist();

        Some(TurnSample {
            tokens,
            latency: elapsed_secs,
            throughput,
        })
    }

    /// Record a thumbs-up (`good = true`) or thumbs-down vote and return the
    /// model's new rating.
    pub fn record_vote(&mut self, model: &str, good: bool) -> f64 {
        let stats = self.catalog.entry(model);
        stats.push_vote(good);
        let rating = stats.rating().unwrap_or_default();
        self.persist();
        rating
    }

    /// Overwrite the size of every listed model, creating entries as needed.
    pub fn record_model_sizes(&mut self, models: &[ModelInfo]) {
        for model in models {
            self.catalog.entry(&model.name).size = model.size;
        }
        self.persist();
    }

    pub fn summarize(&self, model: &str) -> DisplayStats {
        self.catalog
            .get(model)
            .map(DisplayStats::from)
            .unwrap_or_else(DisplayStats::empty)
    }

    pub fn summarize_all(&self) -> Vec<(String, DisplayStats)> {
        self.catalog
            .iter()
            .map(|(model, stats)| (model.to_string(), DisplayStats::from(stats)))
            .collect()
    }

    /// Drop every model's stats and persist the empty catalog.
    pub fn reset(&mut self) {
        let catalog = std::mem::take(&mut self.catalog);
        self.catalog = self.store.reset(catalog);
    }

    pub fn stats(&self, model: &str) -> Option<&ModelStats> {
        self.catalog.get(model)
    }

    pub fn catalog(&self) -> &MetricsCatalog {
        &self.catalog
    }

    pub fn store(&self) -> &StatsStore {
        &self.store
    }

    pub fn window(&self) -> usize {
        self.window
    }

    fn persist(&mut self) {
        self.store.save(&self.catalog);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metrics::stats::DEFAULT_WINDOW;

    fn aggregator() -> (tempfile::TempDir, MetricsAggregator) {
        let dir = tempfile::tempdir().unwrap();
        let store = StatsStore::at(dir.path().join("metrics.json"));
        (dir, MetricsAggregator::load(store, DEFAULT_WINDOW))
    }

    #[test]
    fn record_turn_computes_throughput_from_word_count() {
        let (_dir, mut agg) = aggregator();
        let sample = agg.record_turn("m1", "hello there", 0.5).unwrap();
        assert_eq!(sample.tokens, 2);
        assert!((sample.throughput - 4.0).abs() < 1e-9);

        let stats = agg.stats("m1").unwrap();
        assert_eq!(stats.avg_latency(), Some(0.5));
        assert_eq!(stats.avg_throughput(), Some(4.0));
    }

    #[test]
    fn non_positive_duration_is_skipped() {
        let (_dir, mut agg) = aggregator();
        assert!(agg.record_turn("m1", "a b", 0.0).is_none());
        assert!(agg.record_turn("m1", "a b", -1.0).is_none());
        assert!(agg.record_turn("m1", "a b", f64::NAN).is_none());
        assert!(agg.stats("m1").is_none());
    }

    #[test]
    fn summarize_reflects_latest_turn() {
        let (_dir, mut agg) = aggregator();
        agg.record_turn("m1", "one", 1.0);
        assert_eq!(agg.summarize("m1").avg_latency, "1.00s");
        agg.record_turn("m1", "one", 2.0);
        assert_eq!(agg.summarize("m1").avg_latency, "1.50s");
    }

    #[test]
    fn vote_without_prior_turns_creates_entry() {
        let (_dir, mut agg) = aggregator();
        assert_eq!(agg.record_vote("fresh", true), 1.0);
        assert_eq!(agg.record_vote("fresh", false), 0.5);
        let summary = agg.summarize("fresh");
        assert_eq!(summary.rating, "0.50");
        assert_eq!(summary.avg_latency, "-");
    }

    #[test]
    fn model_sizes_are_overwritten_on_refresh() {
        let (_dir, mut agg) = aggregator();
        agg.record_model_sizes(&[ModelInfo {
            name: "m1".to_string(),
            size: Some(2_000_000_000),
        }]);
        assert_eq!(agg.summarize("m1").size, "2.00 GB");

        agg.record_model_sizes(&[ModelInfo {
            name: "m1".to_string(),
            size: None,
        }]);
        assert_eq!(agg.summarize("m1").size, "-");
    }

    #[test]
    fn unknown_model_summarizes_as_placeholders() {
        let (_dir, agg) = aggregator();
        assert_eq!(agg.summarize("nope"), DisplayStats::empty());
        assert!(agg.summarize_all().is_empty());
    }

    #[test]
    fn zero_window_is_clamped_to_one() {
        let dir = tempfile::tempdir().unwrap();
        let mut agg = MetricsAggregator::load(StatsStore::at(dir.path().join("m.json")), 0);
        agg.record_turn("m", "a", 1.0);
        agg.record_turn("m", "a", 3.0);
        assert_eq!(agg.stats("m").unwrap().latency_window().len(), 1);
        assert_eq!(agg.stats("m").unwrap().avg_latency(), Some(3.0));
    }
}
