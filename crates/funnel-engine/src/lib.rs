//! Reconciles two messy enrollment feeds into one consistent picture.
//!
//! The admissions pipeline export and the point-in-time census snapshot
//! describe overlapping populations with different fields. This crate
//! standardizes both, classifies every row through ordered rule cascades,
//! aggregates funnel metrics and net tuition revenue, and reconciles the
//! two sources without double counting. All output is plain serializable
//! data; presentation, export, and I/O live with the callers.

pub mod cache;
pub mod census;
pub mod config;
pub mod error;
pub mod funnel;
pub mod pipeline;
pub mod reconcile;
pub mod snapshot;
pub mod table;
pub mod telemetry;

pub use error::EngineError;
pub use snapshot::{AnalyticsEngine, AnalyticsSnapshot, SnapshotOutcome};
