//! # Database Crate
//!
//! The storage seam of the KPI pipeline: raw counter rows in, result
//! documents out, variation flags patched in place.
//!
//! ## Architectural Principles
//!
//! - **Layer 2 Adapter:** Encapsulates all storage-specific logic behind the
//!   `KpiStore` trait, so the orchestration layer never sees SQL.
//! - **Document Storage:** Indicators are kept as a single JSONB document per
//!   competency. Variation updates touch one member of that document through
//!   `jsonb_set`; values and stratification are never rewritten.
//! - **Asynchronous & Pooled:** All operations are asynchronous over a
//!   connection pool (`PgPool`).
//!
//! ## Public API
//!
//! - `connect` / `run_migrations`: pool setup and schema migrations.
//! - `KpiStore` / `UpdateAck`: the storage contract.
//! - `DbRepository`: the PostgreSQL implementation.
//! - `InMemoryStore`: an in-process implementation with identical semantics.
//! - `DbError`: the specific error types that can be returned from this crate.

// Declare the modules that constitute this crate.
pub mod connection;
pub mod error;
pub mod memory;
pub mod repository;
pub mod store;

// Re-export the key components to create a clean, public-facing API.
pub use connection::{connect, run_migrations};
pub use error::DbError;
pub use memory::InMemoryStore;
pub use repository::DbRepository;
pub use store::{KpiStore, UpdateAck};
