use crate::report::{ApplyReport, ItemReport, UpdateOutcome};
use core_types::{Competency, IndicatorKey, ResultRecord, VariationFlag};
use database::KpiStore;

/// Compares consecutive result documents and writes the resulting flags back.
#[derive(Debug, Default, Clone, Copy)]
pub struct VariationEngine {}

impl VariationEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Flags, per indicator, whether the latest record's value is strictly
    /// greater than the earliest record's value.
    ///
    /// The records are ordered by (year, month) here, so callers may pass them
    /// in any order. Fewer than two records yield no flags. An indicator missing
    /// from either end is skipped. A NaN on either side is never an increase.
    pub fn compute_variation(&self, records: &[ResultRecord]) -> Vec<VariationFlag> {
        if records.len() < 2 {
            tracing::debug!(records = records.len(), "Nothing to compare.");
            return Vec::new();
        }

        let mut ordered: Vec<&ResultRecord> = records.iter().collect();
        ordered.sort_by_key(|record| record.competency().period());
        let (Some(prior), Some(current)) = (ordered.first(), ordered.last()) else {
            return Vec::new();
        };

        if prior.organization_id != current.organization_id {
            tracing::warn!(
                prior = %prior.competency(),
                current = %current.competency(),
                "Comparing results of different organizations."
            );
        }

        let flags: Vec<VariationFlag> = IndicatorKey::ALL
            .into_iter()
            .filter_map(|key| {
                let before = prior.indicator(key)?;
                let after = current.indicator(key)?;
                Some(VariationFlag::new(key, before.value, after.value))
            })
            .collect();

        tracing::debug!(
            prior = %prior.competency(),
            current = %current.competency(),
            flags = flags.len(),
            "Variation computed."
        );
        flags
    }

    /// Writes each flag onto the stored document of `target` as an independent update.
    ///
    /// A storage error on one item is recorded in the report and the remaining
    /// items still run. Re-applying the same flags is harmless: items match
    /// again but report no modification.
    pub async fn apply_variation<S>(
        &self,
        store: &S,
        target: Competency,
        flags: &[VariationFlag],
    ) -> ApplyReport
    where
        S: KpiStore + ?Sized,
    {
        let mut report = ApplyReport::new(target);

        for flag in flags {
            let outcome = match store
                .update_variation(target, flag.indicator_key, flag.variation)
                .await
            {
                Ok(ack) => {
                    if !ack.matched {
                        tracing::warn!(
                            competency = %target,
                            indicator = %flag.indicator_key,
                            "No stored document matched the variation update."
                        );
                    }
                    UpdateOutcome::Acknowledged(ack)
                }
                Err(e) => {
                    tracing::error!(
                        competency = %target,
                        indicator = %flag.indicator_key,
                        error = ?e,
                        "Variation update failed."
                    );
                    UpdateOutcome::Failed(e.to_string())
                }
            };
            report.items.push(ItemReport { flag: *flag, outcome });
        }

        tracing::info!(
            competency = %target,
            expected = report.expected(),
            matched = report.matched_count(),
            modified = report.modified_count(),
            status = %report.status(),
            "Variation applied."
        );
        report
    }
}
