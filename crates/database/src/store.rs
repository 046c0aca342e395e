use crate::error::DbError;
use async_trait::async_trait;
use core_types::{
    Competency, IndicatorKey, Organization, RawMetricsRecord, ResultRecord, Variation,
};

/// The acknowledgment of a single targeted variation update.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct UpdateAck {
    /// A stored document with that competency and indicator key exists.
    pub matched: bool,
    /// The stored flag actually changed.
    pub modified: bool,
}

impl UpdateAck {
    pub const NOT_FOUND: UpdateAck = UpdateAck { matched: false, modified: false };

    pub fn new(matched: bool, modified: bool) -> Self {
        Self { matched, modified }
    }
}

/// The storage contract the consolidation pipeline runs against.
///
/// Implemented by the PostgreSQL `DbRepository` and by `InMemoryStore`.
#[async_trait]
pub trait KpiStore: Send + Sync {
    /// Fetches the raw counter row of one competency.
    async fn fetch_metrics(&self, competency: Competency)
        -> Result<Option<RawMetricsRecord>, DbError>;

    /// Stores (or replaces) the raw counter row of one competency.
    async fn save_metrics(
        &self,
        competency: Competency,
        raw: &RawMetricsRecord,
    ) -> Result<(), DbError>;

    async fn fetch_result(&self, competency: Competency) -> Result<Option<ResultRecord>, DbError>;

    /// Fetches every result that exists among `competencies`, ordered by (year, month).
    async fn fetch_results(&self, competencies: &[Competency]) -> Result<Vec<ResultRecord>, DbError> {
        let mut found = Vec::with_capacity(competencies.len());
        for competency in competencies {
            if let Some(record) = self.fetch_result(*competency).await? {
                found.push(record);
            }
        }
        found.sort_by_key(|record| record.competency().period());
        Ok(found)
    }

    /// Persists a freshly computed result. Returns `false` when the store did
    /// not acknowledge the write; an existing result is never overwritten.
    async fn save_result(&self, record: &ResultRecord) -> Result<bool, DbError>;

    /// Sets `indicators[key].variation` on one stored result and nothing else.
    async fn update_variation(
        &self,
        competency: Competency,
        key: IndicatorKey,
        variation: Variation,
    ) -> Result<UpdateAck, DbError>;

    /// The most recent consolidated competency of an organization.
    async fn last_consolidation(&self, organization_id: i64) -> Result<Option<Competency>, DbError>;

    /// Months of `year` with a raw counter row, ascending.
    async fn submitted_months(&self, organization_id: i64, year: i32) -> Result<Vec<u32>, DbError>;

    /// Months of `year` with a consolidated result, ascending.
    async fn consolidated_months(&self, organization_id: i64, year: i32)
        -> Result<Vec<u32>, DbError>;

    /// Registers an organization, or updates its name and active flag.
    async fn upsert_organization(&self, organization: &Organization) -> Result<(), DbError>;

    async fn active_organizations(&self) -> Result<Vec<Organization>, DbError>;
}
