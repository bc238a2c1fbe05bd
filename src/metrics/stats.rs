//! Per-model rolling statistics and the catalog that holds them.
//!
//! Latency and throughput samples live in two bounded FIFO windows that move
//! in lock-step: index `i` of both windows describes the same turn. Votes are
//! unbounded and never evicted. Averages are cached but recomputed on every
//! insertion, and re-derived by [`ModelStats::normalize`] after loading.

use std::collections::{BTreeMap, VecDeque};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Default number of recent turns kept per model.
pub const DEFAULT_WINDOW: usize = 10;

// ---------------------------------------------------------------------------
// ModelStats
// ---------------------------------------------------------------------------

/// Rolling performance and rating record for one model.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelStats {
    /// Size of the model artifact in bytes, as reported by the backend.
    pub size: Option<u64>,
    latency_window: VecDeque<f64>,
    throughput_window: VecDeque<f64>,
    avg_latency: Option<f64>,
    avg_throughput: Option<f64>,
    /// 1 = good, 0 = bad.
    votes: Vec<u8>,
    rating: Option<f64>,
    last_used: Option<DateTime<Utc>>,
}

impl ModelStats {
    /// Push one turn's latency (seconds) and throughput (tokens/s), evicting
    /// the oldest sample once the window exceeds `capacity`.
    pub fn push_sample(&mut self, latency: f64, throughput: f64, capacity: usize) {
        self.latency_window.push_back(latency);
        self.throughput_window.push_back(throughput);
        trim_front(&mut self.latency_window, capacity);
        trim_front(&mut self.throughput_window, capacity);
        self.avg_latency = mean(self.latency_window.iter().copied());
        self.avg_throughput = mean(self.throughput_window.iter().copied());
        self.last_used = Some(Utc::now());
    }

    pub fn push_vote(&mut self, good: bool) {
        self.votes.push(u8::from(good));
        self.rating = mean(self.votes.iter().map(|&v| f64::from(v)));
        self.last_used = Some(Utc::now());
    }

    /// Repair a record read from disk: clamp both windows to `capacity`,
    /// drop unpaired samples and non-binary votes, and recompute every
    /// cached average.
    pub fn normalize(&mut self, capacity: usize) {
        let paired = self.latency_window.len().min(self.throughput_window.len());
        self.latency_window.truncate(paired);
        self.throughput_window.truncate(paired);
        trim_front(&mut self.latency_window, capacity);
        trim_front(&mut self.throughput_window, capacity);
        self.votes.retain(|&v| v <= 1);

        self.avg_latency = mean(self.latency_window.iter().copied());
        self.avg_throughput = mean(self.throughput_window.iter().copied());
        self.rating = mean(self.votes.iter().map(|&v| f64::from(v)));
    }

    pub fn latency_window(&self) -> &VecDeque<f64> {
        &self.latency_window
    }

    pub fn throughput_window(&self) -> &VecDeque<f64> {
        &self.throughput_window
    }

    pub fn avg_latency(&self) -> Option<f64> {
        self.avg_latency
    }

    pub fn avg_throughput(&self) -> Option<f64> {
        self.avg_throughput
    }

    pub fn votes(&self) -> &[u8] {
        &self.votes
    }

    /// Mean of all votes; `None` until the first vote.
    pub fn rating(&self) -> Option<f64> {
        self.rating
    }

    pub fn last_used(&self) -> Option<DateTime<Utc>> {
        self.last_used
    }
}

fn trim_front(window: &mut VecDeque<f64>, capacity: usize) {
    while window.len() > capacity {
        window.pop_front();
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

// ---------------------------------------------------------------------------
// MetricsCatalog
// ---------------------------------------------------------------------------

/// Every model's stats, keyed by model identity. This is the whole persisted
/// state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MetricsCatalog {
    models: BTreeMap<String, ModelStats>,
}

impl MetricsCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, model: &str) -> Option<&ModelStats> {
        self.models.get(model)
    }

    /// Stats for `model`, created empty on first use.
    pub fn entry(&mut self, model: &str) -> &mut ModelStats {
        self.models.entry(model.to_string()).or_default()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ModelStats)> {
        self.models.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn clear(&mut self) {
        self.models.clear();
    }

    pub fn len(&self) -> usize {
        self.models.len()
    }

    pub fn is_empty(&self) -> bool {
        self.models.is_empty()
    }

    pub fn normalize(&mut self, capacity: usize) {
        for stats in self.models.values_mut() {
            stats.normalize(capacity);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn average_tracks_partial_window() {
        let mut s = ModelStats::default();
        s.push_sample(1.0, 10.0, DEFAULT_WINDOW);
        s.push_sample(2.0, 20.0, DEFAULT_WINDOW);
        s.push_sample(3.0, 30.0, DEFAULT_WINDOW);
        assert!(approx(s.avg_latency().unwrap(), 2.0));
        assert!(approx(s.avg_throughput().unwrap(), 20.0));
    }

    #[test]
    fn eleventh_sample_evicts_the_first() {
        let mut s = ModelStats::default();
        for i in 1..=11 {
            s.push_sample(i as f64, (i * 10) as f64, DEFAULT_WINDOW);
        }
        assert_eq!(s.latency_window().len(), 10);
        assert_eq!(s.throughput_window().len(), 10);
        assert_eq!(s.latency_window().front(), Some(&2.0));
        assert_eq!(s.throughput_window().front(), Some(&20.0));
        // mean of 2..=11
        assert!(approx(s.avg_latency().unwrap(), 6.5));
        assert!(approx(s.avg_throughput().unwrap(), 65.0));
    }

    #[test]
    fn rating_is_absent_until_first_vote() {
        let mut s = ModelStats::default();
        assert_eq!(s.rating(), None);
        s.push_vote(true);
        assert_eq!(s.rating(), Some(1.0));
        s.push_vote(false);
        assert_eq!(s.rating(), Some(0.5));
        assert_eq!(s.votes(), &[1, 0]);
    }

    #[test]
    fn votes_do_not_touch_windows() {
        let mut s = ModelStats::default();
        s.push_vote(false);
        assert!(s.latency_window().is_empty());
        assert_eq!(s.avg_latency(), None);
        assert_eq!(s.rating(), Some(0.0));
    }

    #[test]
    fn normalize_repairs_hand_edited_record() {
        let json = r#"{
            "size": 42,
            "latency_window": [1, 2, 3, 4],
            "throughput_window": [5, 6, 7],
            "avg_latency": 99.0,
            "votes": [1, 1, 7],
            "rating": 0.1
        }"#;
        let mut s: ModelStats = serde_json::from_str(json).unwrap();
        s.normalize(2);
        assert_eq!(s.latency_window().iter().copied().collect::<Vec<_>>(), vec![2.0, 3.0]);
        assert_eq!(s.throughput_window().iter().copied().collect::<Vec<_>>(), vec![6.0, 7.0]);
        assert!(approx(s.avg_latency().unwrap(), 2.5));
        assert_eq!(s.rating(), Some(1.0));
        assert_eq!(s.size, Some(42));
    }

    #[test]
    fn catalog_entry_is_created_lazily() {
        let mut c = MetricsCatalog::new();
        assert!(c.get("m").is_none());
        c.entry("m").push_vote(true);
        assert_eq!(c.len(), 1);
        assert_eq!(c.get("m").unwrap().rating(), Some(1.0));
    }

    #[test]
    fn catalog_serializes_as_plain_map() {
        let mut c = MetricsCatalog::new();
        c.entry("m").size = Some(1);
        let json = serde_json::to_value(&c).unwrap();
        assert!(json.get("m").is_some());
    }
}
