//! Human-readable projection of [`ModelStats`].

use serde::Serialize;

use super::stats::ModelStats;

/// Placeholder shown for values that have not been measured yet.
pub const ABSENT: &str = "-";

const LAST_USED_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// Display-ready summary of one model's stats.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DisplayStats {
    pub size: String,
    pub avg_latency: String,
    pub avg_throughput: String,
    pub rating: String,
    /// Time of the last recorded turn or vote, UTC.
    pub last_used: String,
}

impl DisplayStats {
    /// Summary for a model with no recorded data.
    pub fn empty() -> Self {
        Self {
            size: ABSENT.to_string(),
            avg_latency: ABSENT.to_string(),
            avg_throughput: ABSENT.to_string(),
            rating: ABSENT.to_string(),
            last_used: ABSENT.to_string(),
        }
    }
}

impl From<&ModelStats> for DisplayStats {
    fn from(stats: &ModelStats) -> Self {
        Self {
            size: stats.size.map(format_size).unwrap_or_else(|| ABSENT.to_string()),
            avg_latency: stats
                .avg_latency()
                .map(|v| format!("{v:.2}s"))
                .unwrap_or_else(|| ABSENT.to_string()),
            avg_throughput: stats
                .avg_throughput()
                .map(|v| format!("{v:.1}"))
                .unwrap_or_else(|| ABSENT.to_string()),
            rating: stats
                .rating()
                .map(|v| format!("{v:.2}"))
                .unwrap_or_else(|| ABSENT.to_string()),
            last_used: stats
                .last_used()
                .map(|t| t.format(LAST_USED_FORMAT).to_string())
                .unwrap_or_else(|| ABSENT.to_string()),
        }
    }
}

/// Format a byte count as decimal gigabytes, e.g. `"4.66 GB"`.
pub fn format_size(bytes: u64) -> String {
    format!("{:.2} GB", bytes as f64 / 1e9)
}
