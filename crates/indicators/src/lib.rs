//! # Indicator Engine
//!
//! Computes the 14 hospital-quality indicators from one month of raw counters.
//!
//! ## Architectural Principles
//!
//! - **Layer 1 Logic:** A pure logic crate. It depends only on `core-types` and
//!   performs no I/O.
//! - **Stateless Calculation:** `IndicatorEngine` is zero-sized. Each indicator
//!   reads a typed counter structure, rolls its leaves up through an explicit
//!   hierarchy and returns a fresh `IndicatorValue`.
//! - **No Zero Guard:** A zero denominator yields NaN or an infinity, never an
//!   error and never zero.
//!
//! ## Public API
//!
//! - `IndicatorEngine`: `compute_all`, `compute` and one method per indicator.
//! - `Formula` / `Ratio`: the rate, average and density primitives.
//! - The `*Counters` structures and their `REQUIRED_FIELDS`.
//! - `IndicatorError`: validation failures, naming every offending field.

mod breakdown;
mod catalog;
pub mod counters;
pub mod engine;
pub mod error;
pub mod formula;

pub use counters::{
    required_fields, AntibioticProphylaxisCounters, BirthCounters, CardiacArrestCounters,
    CautiCounters, ClabsiCounters, EmergencyStayCounters, EmergencyWaitCounters, FallCounters,
    LengthOfStayCounters, MortalityCounters, ReadmissionCounters, SentinelEventCounters,
    SurgicalSiteInfectionCounters, VteProphylaxisCounters,
};
pub use engine::IndicatorEngine;
pub use error::{FieldIssue, IndicatorError};
pub use formula::{average, density, rate, Formula, Ratio};
