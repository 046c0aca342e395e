//! # Consolidation
//!
//! Orchestrates one monthly consolidation run:
//!
//! 1. Fetch the raw counters of the competency.
//! 2. Compute the 14 indicators.
//! 3. Persist the result document.
//! 4. Fetch it together with the preceding month's document, derive the
//!    variation flags and apply them.
//!
//! ## Public API
//!
//! - `Consolidator`: `submit`, `run`, `refresh_variation`, `history` and
//!   `last_consolidation` over any `KpiStore`.
//! - `ConsolidationOutcome`: all updated, first consolidation, partial or failed.
//! - `ConsolidationHistory`: the yearly submitted/consolidated overview.
//! - `ConsolidationError`: the specific error types that can be returned from this crate.

pub mod consolidator;
pub mod error;
pub mod history;

pub use consolidator::{ConsolidationOutcome, Consolidator};
pub use error::ConsolidationError;
pub use history::{ConsolidationHistory, MonthStatus};
