use crate::error::DbError;
use crate::store::{KpiStore, UpdateAck};
use async_trait::async_trait;
use core_types::{
    Competency, IndicatorKey, Organization, RawMetricsRecord, ResultRecord, Variation,
};
use std::collections::{BTreeMap, BTreeSet};
use tokio::sync::RwLock;

/// A `KpiStore` held entirely in memory, with the same semantics as the
/// PostgreSQL repository.
///
/// Used by the offline CLI path and by tests. Writes can be made to go
/// unacknowledged and individual variation updates can be made to fail,
/// so error paths of callers can be exercised without a database.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

#[derive(Debug)]
struct State {
    organizations: BTreeMap<i64, Organization>,
    metrics: BTreeMap<Competency, RawMetricsRecord>,
    results: BTreeMap<Competency, ResultRecord>,
    acknowledge_writes: bool,
    failing_updates: BTreeSet<IndicatorKey>,
}

impl Default for State {
    fn default() -> Self {
        Self {
            organizations: BTreeMap::new(),
            metrics: BTreeMap::new(),
            results: BTreeMap::new(),
            acknowledge_writes: true,
            failing_updates: BTreeSet::new(),
        }
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// When `false`, `save_result` stores nothing and reports `false`.
    pub async fn set_acknowledge_writes(&self, acknowledge: bool) {
        self.state.write().await.acknowledge_writes = acknowledge;
    }

    /// Makes every later `update_variation` for `key` fail with `DbError::Unavailable`.
    pub async fn fail_updates_for(&self, key: IndicatorKey) {
        self.state.write().await.failing_updates.insert(key);
    }

    /// Number of stored result documents.
    pub async fn result_count(&self) -> usize {
        self.state.read().await.results.len()
    }

    async fn months<F>(&self, organization_id: i64, year: i32, select: F) -> Vec<u32>
    where
        F: Fn(&State) -> Vec<Competency> + Send,
    {
        let state = self.state.read().await;
        select(&state)
            .into_iter()
            .filter(|c| c.organization_id == organization_id && c.year == year)
            .map(|c| c.month)
            .collect()
    }
}

#[async_trait]
impl KpiStore for InMemoryStore {
    async fn fetch_metrics(
        &self,
        competency: Competency,
    ) -> Result<Option<RawMetricsRecord>, DbError> {
        Ok(self.state.read().await.metrics.get(&competency).cloned())
    }

    async fn save_metrics(
        &self,
        competency: Competency,
        raw: &RawMetricsRecord,
    ) -> Result<(), DbError> {
        self.state.write().await.metrics.insert(competency, raw.clone());
        Ok(())
    }

    async fn fetch_result(&self, competency: Competency) -> Result<Option<ResultRecord>, DbError> {
        Ok(self.state.read().await.results.get(&competency).cloned())
    }

    async fn save_result(&self, record: &ResultRecord) -> Result<bool, DbError> {
        let mut state = self.state.write().await;
        let competency = record.competency();
        if !state.acknowledge_writes || state.results.contains_key(&competency) {
            return Ok(false);
        }
        state.results.insert(competency, record.clone());
        Ok(true)
    }

    async fn update_variation(
        &self,
        competency: Competency,
        key: IndicatorKey,
        variation: Variation,
    ) -> Result<UpdateAck, DbError> {
        let mut state = self.state.write().await;
        if state.failing_updates.contains(&key) {
            return Err(DbError::Unavailable(format!("update of {key} for {competency} rejected")));
        }
        let ack = match state
            .results
            .get_mut(&competency)
            .and_then(|record| record.set_variation(key, variation))
        {
            Some(changed) => UpdateAck::new(true, changed),
            None => UpdateAck::NOT_FOUND,
        };
        Ok(ack)
    }

    async fn last_consolidation(&self, organization_id: i64) -> Result<Option<Competency>, DbError> {
        let state = self.state.read().await;
        Ok(state
            .results
            .keys()
            .filter(|c| c.organization_id == organization_id)
            .max()
            .copied())
    }

    async fn submitted_months(&self, organization_id: i64, year: i32) -> Result<Vec<u32>, DbError> {
        Ok(self
            .months(organization_id, year, |state| state.metrics.keys().copied().collect())
            .await)
    }

    async fn consolidated_months(
        &self,
        organization_id: i64,
        year: i32,
    ) -> Result<Vec<u32>, DbError> {
        Ok(self
            .months(organization_id, year, |state| state.results.keys().copied().collect())
            .await)
    }

    async fn upsert_organization(&self, organization: &Organization) -> Result<(), DbError> {
        let mut state = self.state.write().await;
        state.organizations.insert(organization.organization_id, organization.clone());
        Ok(())
    }

    async fn active_organizations(&self) -> Result<Vec<Organization>, DbError> {
        let state = self.state.read().await;
        let mut active: Vec<Organization> =
            state.organizations.values().filter(|o| o.active).cloned().collect();
        active.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(active)
    }
}
