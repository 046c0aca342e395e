//! # Variation Engine
//!
//! Derives month-over-month variation flags from consolidated results and
//! patches them onto the stored documents.
//!
//! ## Architectural Principles
//!
//! - **Layer 3 Logic:** Sits above the storage seam. `apply_variation` runs
//!   against any `KpiStore`, so the crate depends on `database` for the trait.
//! - **Pure Comparison:** `compute_variation` only reads the records it is
//!   given. Fetching the current and immediately preceding competency is the
//!   caller's job.
//! - **Independent Updates:** `apply_variation` issues one targeted update per
//!   indicator and reports each acknowledgment, so partial success is visible.
//!
//! ## Public API
//!
//! - `VariationEngine`: `compute_variation` and `apply_variation`.
//! - `ApplyReport` / `ApplyStatus`: the per-item and overall outcome of an apply run.

pub mod engine;
pub mod report;

pub use engine::VariationEngine;
pub use report::{ApplyReport, ApplyStatus, ItemReport, UpdateOutcome};
