//! # Core Types
//!
//! Shared vocabulary for the KPI consolidation workspace: reporting periods,
//! raw counter rows, computed indicator documents and variation flags.
//!
//! This is a Layer 0 crate. It holds data and small invariants only, and has
//! no knowledge of formulas, storage or configuration.

pub mod enums;
pub mod error;
pub mod non_finite;
pub mod structs;

// Re-export the core types to provide a clean public API.
pub use enums::{IndicatorKey, Variation};
pub use error::CoreError;
pub use structs::{
    Competency, FieldProblem, IndicatorValue, Organization, RawMetricsRecord, ResultRecord,
    Stratum, VariationFlag,
};
