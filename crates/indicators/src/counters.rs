//! Typed input structures, one per indicator.
//!
//! Each structure is declared once through `counters!`, which derives both the
//! struct and its `REQUIRED_FIELDS` list from the same field names. Reading a
//! structure validates every declared field in a single pass and reports all
//! offending fields of that indicator together.

use crate::error::{FieldIssue, IndicatorError};
use core_types::{IndicatorKey, RawMetricsRecord};

macro_rules! counters {
    (
        $(#[$meta:meta])*
        pub struct $name:ident for $key:expr => {
            $($field:ident),+ $(,)?
        }
    ) => {
        $(#[$meta])*
        #[derive(Debug, Clone, Copy, PartialEq)]
        pub struct $name {
            $(pub $field: f64,)+
        }

        impl $name {
            pub const INDICATOR: IndicatorKey = $key;
            pub const REQUIRED_FIELDS: &'static [&'static str] = &[$(stringify!($field)),+];

            /// Reads and validates every required counter from a raw row.
            pub fn read(raw: &RawMetricsRecord) -> Result<Self, IndicatorError> {
                let mut issues = Vec::new();
                $(
                    let $field = match raw.counter(stringify!($field)) {
                        Ok(value) => Some(value),
                        Err(problem) => {
                            issues.push(FieldIssue::new(stringify!($field), problem));
                            None
                        }
                    };
                )+
                match ($($field,)+) {
                    ($(Some($field),)+) => Ok(Self { $($field),+ }),
                    _ => Err(IndicatorError::InvalidCounters {
                        indicator: Self::INDICATOR,
                        issues,
                    }),
                }
            }
        }
    };
}

counters! {
    /// kpi_1: births by delivery route.
    pub struct BirthCounters for IndicatorKey::Kpi1 => {
        vaginal_births,
        cesarean_births,
    }
}

counters! {
    /// kpi_2: readmissions within 30 days over the previous month's discharges.
    pub struct ReadmissionCounters for IndicatorKey::Kpi2 => {
        clinical_readmissions_30d,
        clinical_discharges_prev_month,
        surgical_readmissions_30d,
        surgical_discharges_prev_month,
    }
}

counters! {
    /// kpi_3
    pub struct CardiacArrestCounters for IndicatorKey::Kpi3 => {
        cardiac_arrests,
        patient_days,
    }
}

counters! {
    /// kpi_4: deaths and discharges by service line and age group.
    pub struct MortalityCounters for IndicatorKey::Kpi4 => {
        clinical_early_neonatal_deaths,
        clinical_early_neonatal_discharges,
        clinical_late_neonatal_deaths,
        clinical_late_neonatal_discharges,
        clinical_pediatric_deaths,
        clinical_pediatric_discharges,
        clinical_adult_deaths,
        clinical_adult_discharges,
        clinical_elderly_deaths,
        clinical_elderly_discharges,
        surgical_early_neonatal_deaths,
        surgical_early_neonatal_discharges,
        surgical_late_neonatal_deaths,
        surgical_late_neonatal_discharges,
        surgical_pediatric_deaths,
        surgical_pediatric_discharges,
        surgical_adult_deaths,
        surgical_adult_discharges,
        surgical_elderly_deaths,
        surgical_elderly_discharges,
    }
}

counters! {
    /// kpi_5: patient-days and discharges by service line and age group.
    /// Neonatal stays are not part of this indicator.
    pub struct LengthOfStayCounters for IndicatorKey::Kpi5 => {
        clinical_pediatric_patient_days,
        clinical_pediatric_discharges,
        clinical_adult_patient_days,
        clinical_adult_discharges,
        clinical_elderly_patient_days,
        clinical_elderly_discharges,
        surgical_pediatric_patient_days,
        surgical_pediatric_discharges,
        surgical_adult_patient_days,
        surgical_adult_discharges,
        surgical_elderly_patient_days,
        surgical_elderly_discharges,
    }
}

counters! {
    /// kpi_6: hours between ER arrival and end of care.
    pub struct EmergencyStayCounters for IndicatorKey::Kpi6 => {
        er_total_stay_hours,
        er_patients,
    }
}

counters! {
    /// kpi_7: minutes between triage and first medical care, by triage level.
    pub struct EmergencyWaitCounters for IndicatorKey::Kpi7 => {
        er_level2_wait_minutes,
        er_level2_patients,
        er_level3_wait_minutes,
        er_level3_patients,
    }
}

counters! {
    /// kpi_8
    pub struct AntibioticProphylaxisCounters for IndicatorKey::Kpi8 => {
        clean_surgeries_with_prophylaxis,
        clean_surgeries,
    }
}

counters! {
    /// kpi_9: surgical site infections within 30 days of a clean surgery
    /// performed in the previous month.
    pub struct SurgicalSiteInfectionCounters for IndicatorKey::Kpi9 => {
        clean_surgery_infections_30d,
        clean_surgeries_prev_month,
    }
}

counters! {
    /// kpi_10: central-line bloodstream infections over central-venous-catheter days.
    pub struct ClabsiCounters for IndicatorKey::Kpi10 => {
        ward_neonatal_clabsi,
        ward_neonatal_cvc_days,
        ward_pediatric_clabsi,
        ward_pediatric_cvc_days,
        ward_adult_clabsi,
        ward_adult_cvc_days,
        icu_neonatal_clabsi,
        icu_neonatal_cvc_days,
        icu_pediatric_clabsi,
        icu_pediatric_cvc_days,
        icu_adult_clabsi,
        icu_adult_cvc_days,
    }
}

counters! {
    /// kpi_11: catheter-associated urinary tract infections over urinary-catheter days.
    pub struct CautiCounters for IndicatorKey::Kpi11 => {
        ward_neonatal_cauti,
        ward_neonatal_urinary_catheter_days,
        ward_pediatric_cauti,
        ward_pediatric_urinary_catheter_days,
        ward_adult_cauti,
        ward_adult_urinary_catheter_days,
        icu_neonatal_cauti,
        icu_neonatal_urinary_catheter_days,
        icu_pediatric_cauti,
        icu_pediatric_urinary_catheter_days,
        icu_adult_cauti,
        icu_adult_urinary_catheter_days,
    }
}

counters! {
    /// kpi_12: at-risk patients who received venous thromboembolism prophylaxis.
    pub struct VteProphylaxisCounters for IndicatorKey::Kpi12 => {
        clinical_vte_prophylaxis,
        clinical_vte_at_risk,
        surgical_ortho_vte_prophylaxis,
        surgical_ortho_vte_at_risk,
        surgical_non_ortho_vte_prophylaxis,
        surgical_non_ortho_vte_at_risk,
    }
}

counters! {
    /// kpi_13
    pub struct FallCounters for IndicatorKey::Kpi13 => {
        falls_with_harm,
        patient_days,
    }
}

counters! {
    /// kpi_14
    pub struct SentinelEventCounters for IndicatorKey::Kpi14 => {
        sentinel_events,
        patient_days,
    }
}

/// The declared counter names an indicator needs.
pub fn required_fields(key: IndicatorKey) -> &'static [&'static str] {
    match key {
        IndicatorKey::Kpi1 => BirthCounters::REQUIRED_FIELDS,
        IndicatorKey::Kpi2 => ReadmissionCounters::REQUIRED_FIELDS,
        IndicatorKey::Kpi3 => CardiacArrestCounters::REQUIRED_FIELDS,
        IndicatorKey::Kpi4 => MortalityCounters::REQUIRED_FIELDS,
        IndicatorKey::Kpi5 => LengthOfStayCounters::REQUIRED_FIELDS,
        IndicatorKey::Kpi6 => EmergencyStayCounters::REQUIRED_FIELDS,
        IndicatorKey::Kpi7 => EmergencyWaitCounters::REQUIRED_FIELDS,
        IndicatorKey::Kpi8 => AntibioticProphylaxisCounters::REQUIRED_FIELDS,
        IndicatorKey::Kpi9 => SurgicalSiteInfectionCounters::REQUIRED_FIELDS,
        IndicatorKey::Kpi10 => ClabsiCounters::REQUIRED_FIELDS,
        IndicatorKey::Kpi11 => CautiCounters::REQUIRED_FIELDS,
        IndicatorKey::Kpi12 => VteProphylaxisCounters::REQUIRED_FIELDS,
        IndicatorKey::Kpi13 => FallCounters::REQUIRED_FIELDS,
        IndicatorKey::Kpi14 => SentinelEventCounters::REQUIRED_FIELDS,
    }
}
