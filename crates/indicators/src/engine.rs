use crate::counters::*;
use crate::error::IndicatorError;
use core_types::{
    Competency, CoreError, FieldProblem, IndicatorKey, IndicatorValue, RawMetricsRecord,
    ResultRecord,
};
use std::collections::BTreeMap;

/// A stateless calculator turning one month of raw counters into indicator documents.
///
/// Every intermediate aggregate lives on the stack of the call that produced
/// it, so computations on different rows never observe each other.
#[derive(Debug, Default, Clone, Copy)]
pub struct IndicatorEngine {}

impl IndicatorEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// The main entry point: computes all 14 indicators for one raw row.
    ///
    /// # Arguments
    ///
    /// * `raw` - The flat monthly counter row, grouping keys included.
    ///
    /// # Returns
    ///
    /// A `ResultRecord` with every variation still pending, or the first
    /// `IndicatorError` encountered. Grouping keys are checked before any
    /// indicator is computed.
    pub fn compute_all(&self, raw: &RawMetricsRecord) -> Result<ResultRecord, IndicatorError> {
        let competency = Self::competency(raw)?;

        let mut indicators = BTreeMap::new();
        for key in IndicatorKey::ALL {
            let value = self.compute(key, raw)?;
            indicators.insert(key, value);
        }

        tracing::info!(%competency, indicators = indicators.len(), "Computed indicators.");
        Ok(ResultRecord::new(competency, indicators))
    }

    /// Computes a single indicator by key.
    pub fn compute(
        &self,
        key: IndicatorKey,
        raw: &RawMetricsRecord,
    ) -> Result<IndicatorValue, IndicatorError> {
        let result = match key {
            IndicatorKey::Kpi1 => self.vaginal_birth_proportion(raw),
            IndicatorKey::Kpi2 => self.readmission_30_day(raw),
            IndicatorKey::Kpi3 => self.cardiac_arrest_density(raw),
            IndicatorKey::Kpi4 => self.institutional_mortality(raw),
            IndicatorKey::Kpi5 => self.average_length_of_stay(raw),
            IndicatorKey::Kpi6 => self.er_total_time(raw),
            IndicatorKey::Kpi7 => self.er_wait_time(raw),
            IndicatorKey::Kpi8 => self.prophylactic_antibiotic_rate(raw),
            IndicatorKey::Kpi9 => self.clean_surgery_infection_rate(raw),
            IndicatorKey::Kpi10 => self.clabsi_density(raw),
            IndicatorKey::Kpi11 => self.cauti_density(raw),
            IndicatorKey::Kpi12 => self.vte_prophylaxis_rate(raw),
            IndicatorKey::Kpi13 => self.fall_with_harm_density(raw),
            IndicatorKey::Kpi14 => self.sentinel_event_density(raw),
        };

        match &result {
            Ok(value) => tracing::debug!(
                indicator = %key,
                value = value.value,
                strata = value.stratification.len(),
                "Indicator computed."
            ),
            Err(e) => tracing::warn!(indicator = %key, error = %e, "Indicator rejected raw counters."),
        }
        result
    }

    /// The counter names `key` requires, in declaration order.
    pub fn required_fields(&self, key: IndicatorKey) -> &'static [&'static str] {
        required_fields(key)
    }

    // --- Per-indicator entry points ---

    pub fn vaginal_birth_proportion(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(BirthCounters::read(raw)?.evaluate())
    }

    pub fn readmission_30_day(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(ReadmissionCounters::read(raw)?.evaluate())
    }

    pub fn cardiac_arrest_density(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(CardiacArrestCounters::read(raw)?.evaluate())
    }

    pub fn institutional_mortality(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(MortalityCounters::read(raw)?.evaluate())
    }

    pub fn average_length_of_stay(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(LengthOfStayCounters::read(raw)?.evaluate())
    }

    pub fn er_total_time(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(EmergencyStayCounters::read(raw)?.evaluate())
    }

    pub fn er_wait_time(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(EmergencyWaitCounters::read(raw)?.evaluate())
    }

    pub fn prophylactic_antibiotic_rate(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(AntibioticProphylaxisCounters::read(raw)?.evaluate())
    }

    pub fn clean_surgery_infection_rate(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(SurgicalSiteInfectionCounters::read(raw)?.evaluate())
    }

    pub fn clabsi_density(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(ClabsiCounters::read(raw)?.evaluate())
    }

    pub fn cauti_density(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(CautiCounters::read(raw)?.evaluate())
    }

    pub fn vte_prophylaxis_rate(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(VteProphylaxisCounters::read(raw)?.evaluate())
    }

    pub fn fall_with_harm_density(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(FallCounters::read(raw)?.evaluate())
    }

    pub fn sentinel_event_density(&self, raw: &RawMetricsRecord) -> Result<IndicatorValue, IndicatorError> {
        Ok(SentinelEventCounters::read(raw)?.evaluate())
    }

    /// Reads the (organization, year, month) grouping keys of a raw row.
    pub fn competency(raw: &RawMetricsRecord) -> Result<Competency, IndicatorError> {
        let organization_id = grouping_key(raw, "organization_id")?;
        let year = grouping_key(raw, "year")?;
        let month = grouping_key(raw, "month")?;

        let year = i32::try_from(year).map_err(|_| {
            CoreError::InvalidInput("year".to_string(), format!("{year} is out of range"))
        })?;
        let month = u32::try_from(month).map_err(|_| {
            CoreError::InvalidInput("month".to_string(), format!("{month} is outside 1..=12"))
        })?;

        Ok(Competency::new(organization_id, year, month)?)
    }
}

fn grouping_key(raw: &RawMetricsRecord, field: &'static str) -> Result<i64, IndicatorError> {
    raw.integer(field)
        .map_err(|problem: FieldProblem| IndicatorError::InvalidGroupingKey { field, problem })
}
