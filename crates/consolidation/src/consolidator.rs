use crate::error::ConsolidationError;
use crate::history::ConsolidationHistory;
use core_types::{Competency, RawMetricsRecord};
use database::KpiStore;
use indicators::IndicatorEngine;
use variation::{ApplyReport, ApplyStatus, VariationEngine};

/// How a consolidation run ended once its result document was persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConsolidationOutcome {
    /// Every variation flag matched the stored document.
    AllUpdated(ApplyReport),
    /// No prior month to compare against, so no flags were produced.
    FirstConsolidation(ApplyReport),
    /// Some flags were applied, others were not.
    Partial { applied: usize, expected: usize, report: ApplyReport },
    /// Flags were produced but none could be applied.
    Failed { expected: usize, report: ApplyReport },
}

impl ConsolidationOutcome {
    fn from_report(report: ApplyReport) -> Self {
        match report.status() {
            ApplyStatus::NothingToApply => ConsolidationOutcome::FirstConsolidation(report),
            ApplyStatus::AllMatched => ConsolidationOutcome::AllUpdated(report),
            ApplyStatus::Partial => ConsolidationOutcome::Partial {
                applied: report.matched_count(),
                expected: report.expected(),
                report,
            },
            ApplyStatus::Failed => ConsolidationOutcome::Failed { expected: report.expected(), report },
        }
    }

    pub fn report(&self) -> &ApplyReport {
        match self {
            ConsolidationOutcome::AllUpdated(report)
            | ConsolidationOutcome::FirstConsolidation(report)
            | ConsolidationOutcome::Partial { report, .. }
            | ConsolidationOutcome::Failed { report, .. } => report,
        }
    }
}

/// Runs the monthly consolidation pipeline against a `KpiStore`.
pub struct Consolidator<'a, S: KpiStore + ?Sized> {
    store: &'a S,
    indicators: IndicatorEngine,
    variation: VariationEngine,
}

impl<'a, S: KpiStore + ?Sized> Consolidator<'a, S> {
    pub fn new(store: &'a S) -> Self {
        Self {
            store,
            indicators: IndicatorEngine::new(),
            variation: VariationEngine::new(),
        }
    }

    /// Validates a raw counter row and stores it under the competency it names.
    ///
    /// Every indicator is computed once as a dry run so that an incomplete row
    /// is rejected at submission time. A month that is already consolidated
    /// cannot be resubmitted.
    pub async fn submit(&self, raw: &RawMetricsRecord) -> Result<Competency, ConsolidationError> {
        let record = self
            .indicators
            .compute_all(raw)
            .map_err(ConsolidationError::InvalidSubmission)?;
        let competency = record.competency();

        if self
            .store
            .fetch_result(competency)
            .await
            .map_err(ConsolidationError::storage(competency))?
            .is_some()
        {
            return Err(ConsolidationError::AlreadyConsolidated(competency));
        }

        self.store
            .save_metrics(competency, raw)
            .await
            .map_err(ConsolidationError::storage(competency))?;
        tracing::info!(%competency, "Raw metrics submitted.");
        Ok(competency)
    }

    /// Consolidates one competency: compute, persist, then flag variation
    /// against the immediately preceding month.
    pub async fn run(&self, competency: Competency) -> Result<ConsolidationOutcome, ConsolidationError> {
        tracing::info!(%competency, "Starting consolidation.");

        // 1. Fetch
        let raw = self
            .store
            .fetch_metrics(competency)
            .await
            .map_err(ConsolidationError::storage(competency))?
            .ok_or(ConsolidationError::NotFound(competency))?;

        if self
            .store
            .fetch_result(competency)
            .await
            .map_err(ConsolidationError::storage(competency))?
            .is_some()
        {
            return Err(ConsolidationError::AlreadyConsolidated(competency));
        }

        // 2. Compute
        let record = self
            .indicators
            .compute_all(&raw)
            .map_err(|source| ConsolidationError::Validation { competency, source })?;
        if record.competency() != competency {
            return Err(ConsolidationError::CompetencyMismatch {
                requested: competency,
                computed: record.competency(),
            });
        }

        // 3. Persist
        let acknowledged = self
            .store
            .save_result(&record)
            .await
            .map_err(ConsolidationError::storage(competency))?;
        if !acknowledged {
            tracing::error!(%competency, "Result document was not acknowledged.");
            return Err(ConsolidationError::PersistenceNotAcknowledged(competency));
        }

        // 4. Variation
        let report = self.apply_variation(competency).await?;
        let outcome = ConsolidationOutcome::from_report(report);
        tracing::info!(%competency, status = %outcome.report().status(), "Consolidation finished.");
        Ok(outcome)
    }

    /// Recomputes and reapplies the variation flags of an already consolidated
    /// competency, e.g. after its preceding month was consolidated late.
    pub async fn refresh_variation(
        &self,
        competency: Competency,
    ) -> Result<ConsolidationOutcome, ConsolidationError> {
        if self
            .store
            .fetch_result(competency)
            .await
            .map_err(ConsolidationError::storage(competency))?
            .is_none()
        {
            return Err(ConsolidationError::NotFound(competency));
        }
        let report = self.apply_variation(competency).await?;
        Ok(ConsolidationOutcome::from_report(report))
    }

    async fn apply_variation(&self, competency: Competency) -> Result<ApplyReport, ConsolidationError> {
        let records = self
            .store
            .fetch_results(&[competency.previous(), competency])
            .await
            .map_err(ConsolidationError::storage(competency))?;
        let flags = self.variation.compute_variation(&records);
        Ok(self.variation.apply_variation(self.store, competency, &flags).await)
    }

    /// The submitted and consolidated months of one organization and year.
    pub async fn history(
        &self,
        organization_id: i64,
        year: i32,
    ) -> Result<ConsolidationHistory, ConsolidationError> {
        let submitted = self
            .store
            .submitted_months(organization_id, year)
            .await
            .map_err(ConsolidationError::lookup(organization_id))?;
        let consolidated = self
            .store
            .consolidated_months(organization_id, year)
            .await
            .map_err(ConsolidationError::lookup(organization_id))?;
        Ok(ConsolidationHistory::new(organization_id, year, &submitted, &consolidated))
    }

    pub async fn last_consolidation(
        &self,
        organization_id: i64,
    ) -> Result<Option<Competency>, ConsolidationError> {
        self.store
            .last_consolidation(organization_id)
            .await
            .map_err(ConsolidationError::lookup(organization_id))
    }
}
