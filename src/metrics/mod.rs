//! Per-model performance and satisfaction telemetry.
//!
//! - [`stats`]: bounded rolling windows and the catalog keyed by model
//! - [`store`]: JSON file persistence for the catalog
//! - [`aggregator`]: records turns and votes, triggers persistence
//! - [`display`]: formatted summaries for the UI and CLI

pub mod aggregator;
pub mod display;
pub mod stats;
pub mod store;

pub use aggregator::{MetricsAggregator, TurnSample};
pub use display::DisplayStats;
pub use stats::{DEFAULT_WINDOW, MetricsCatalog, ModelStats};
pub use store::StatsStore;
