//! The aggregation hierarchy of every indicator.
//!
//! Each `evaluate` lists its stratification explicitly and in a fixed order.
//! Leaves are emitted before the composites they roll up into, and the
//! top-level value is never repeated inside the stratification.

use crate::breakdown::{grid, Breakdown, Marginals};
use crate::counters::*;
use crate::formula::{Formula, Ratio};
use core_types::IndicatorValue;

const AGE_GROUPS_MORTALITY: [&str; 5] =
    ["early_neonatal", "late_neonatal", "pediatric", "adult", "elderly"];
const AGE_GROUPS_STAY: [&str; 3] = ["pediatric", "adult", "elderly"];
const DEVICE_AGE_GROUPS: [&str; 3] = ["neonatal", "pediatric", "adult"];

impl BirthCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        Breakdown::single(
            Formula::Rate,
            Ratio::new(self.vaginal_births, self.vaginal_births + self.cesarean_births),
        )
    }
}

impl ReadmissionCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        let clinical = Ratio::new(self.clinical_readmissions_30d, self.clinical_discharges_prev_month);
        let surgical = Ratio::new(self.surgical_readmissions_30d, self.surgical_discharges_prev_month);

        let mut breakdown = Breakdown::new(Formula::Rate);
        breakdown.add("clinical", clinical);
        breakdown.add("surgical", surgical);
        breakdown.finish(clinical + surgical)
    }
}

impl CardiacArrestCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        Breakdown::single(Formula::Density, Ratio::new(self.cardiac_arrests, self.patient_days))
    }
}

impl MortalityCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        let mut breakdown = Breakdown::new(Formula::Average);
        let total = grid(
            &mut breakdown,
            [
                (
                    "clinical",
                    [
                        Ratio::new(self.clinical_early_neonatal_deaths, self.clinical_early_neonatal_discharges),
                        Ratio::new(self.clinical_late_neonatal_deaths, self.clinical_late_neonatal_discharges),
                        Ratio::new(self.clinical_pediatric_deaths, self.clinical_pediatric_discharges),
                        Ratio::new(self.clinical_adult_deaths, self.clinical_adult_discharges),
                        Ratio::new(self.clinical_elderly_deaths, self.clinical_elderly_discharges),
                    ],
                ),
                (
                    "surgical",
                    [
                        Ratio::new(self.surgical_early_neonatal_deaths, self.surgical_early_neonatal_discharges),
                        Ratio::new(self.surgical_late_neonatal_deaths, self.surgical_late_neonatal_discharges),
                        Ratio::new(self.surgical_pediatric_deaths, self.surgical_pediatric_discharges),
                        Ratio::new(self.surgical_adult_deaths, self.surgical_adult_discharges),
                        Ratio::new(self.surgical_elderly_deaths, self.surgical_elderly_discharges),
                    ],
                ),
            ],
            AGE_GROUPS_MORTALITY,
            Marginals::GroupsFirst,
        );
        breakdown.finish(total)
    }
}

impl LengthOfStayCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        let mut breakdown = Breakdown::new(Formula::Average);
        let total = grid(
            &mut breakdown,
            [
                (
                    "clinical",
                    [
                        Ratio::new(self.clinical_pediatric_patient_days, self.clinical_pediatric_discharges),
                        Ratio::new(self.clinical_adult_patient_days, self.clinical_adult_discharges),
                        Ratio::new(self.clinical_elderly_patient_days, self.clinical_elderly_discharges),
                    ],
                ),
                (
                    "surgical",
                    [
                        Ratio::new(self.surgical_pediatric_patient_days, self.surgical_pediatric_discharges),
                        Ratio::new(self.surgical_adult_patient_days, self.surgical_adult_discharges),
                        Ratio::new(self.surgical_elderly_patient_days, self.surgical_elderly_discharges),
                    ],
                ),
            ],
            AGE_GROUPS_STAY,
            Marginals::GroupsFirst,
        );
        breakdown.finish(total)
    }
}

impl EmergencyStayCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        Breakdown::single(Formula::Average, Ratio::new(self.er_total_stay_hours, self.er_patients))
    }
}

impl EmergencyWaitCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        let level2 = Ratio::new(self.er_level2_wait_minutes, self.er_level2_patients);
        let level3 = Ratio::new(self.er_level3_wait_minutes, self.er_level3_patients);

        let mut breakdown = Breakdown::new(Formula::Average);
        breakdown.add("level2", level2);
        breakdown.add("level3", level3);
        breakdown.finish(level2 + level3)
    }
}

impl AntibioticProphylaxisCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        Breakdown::single(
            Formula::Rate,
            Ratio::new(self.clean_surgeries_with_prophylaxis, self.clean_surgeries),
        )
    }
}

impl SurgicalSiteInfectionCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        Breakdown::single(
            Formula::Rate,
            Ratio::new(self.clean_surgery_infections_30d, self.clean_surgeries_prev_month),
        )
    }
}

impl ClabsiCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        let mut breakdown = Breakdown::new(Formula::Density);
        let total = grid(
            &mut breakdown,
            [
                (
                    "ward",
                    [
                        Ratio::new(self.ward_neonatal_clabsi, self.ward_neonatal_cvc_days),
                        Ratio::new(self.ward_pediatric_clabsi, self.ward_pediatric_cvc_days),
                        Ratio::new(self.ward_adult_clabsi, self.ward_adult_cvc_days),
                    ],
                ),
                (
                    "icu",
                    [
                        Ratio::new(self.icu_neonatal_clabsi, self.icu_neonatal_cvc_days),
                        Ratio::new(self.icu_pediatric_clabsi, self.icu_pediatric_cvc_days),
                        Ratio::new(self.icu_adult_clabsi, self.icu_adult_cvc_days),
                    ],
                ),
            ],
            DEVICE_AGE_GROUPS,
            Marginals::BandsFirst,
        );
        breakdown.finish(total)
    }
}

impl CautiCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        let mut breakdown = Breakdown::new(Formula::Density);
        let total = grid(
            &mut breakdown,
            [
                (
                    "ward",
                    [
                        Ratio::new(self.ward_neonatal_cauti, self.ward_neonatal_urinary_catheter_days),
                        Ratio::new(self.ward_pediatric_cauti, self.ward_pediatric_urinary_catheter_days),
                        Ratio::new(self.ward_adult_cauti, self.ward_adult_urinary_catheter_days),
                    ],
                ),
                (
                    "icu",
                    [
                        Ratio::new(self.icu_neonatal_cauti, self.icu_neonatal_urinary_catheter_days),
                        Ratio::new(self.icu_pediatric_cauti, self.icu_pediatric_urinary_catheter_days),
                        Ratio::new(self.icu_adult_cauti, self.icu_adult_urinary_catheter_days),
                    ],
                ),
            ],
            DEVICE_AGE_GROUPS,
            Marginals::BandsFirst,
        );
        breakdown.finish(total)
    }
}

impl VteProphylaxisCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        let clinical = Ratio::new(self.clinical_vte_prophylaxis, self.clinical_vte_at_risk);
        let ortho = Ratio::new(self.surgical_ortho_vte_prophylaxis, self.surgical_ortho_vte_at_risk);
        let non_ortho =
            Ratio::new(self.surgical_non_ortho_vte_prophylaxis, self.surgical_non_ortho_vte_at_risk);
        let surgical = ortho + non_ortho;

        // Clinical patients only count towards the overall value.
        let mut breakdown = Breakdown::new(Formula::Rate);
        breakdown.add("surgical_ortho", ortho);
        breakdown.add("surgical_non_ortho", non_ortho);
        breakdown.add("surgical", surgical);
        breakdown.finish(clinical + surgical)
    }
}

impl FallCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        Breakdown::single(Formula::Density, Ratio::new(self.falls_with_harm, self.patient_days))
    }
}

impl SentinelEventCounters {
    pub fn evaluate(&self) -> IndicatorValue {
        Breakdown::single(Formula::Density, Ratio::new(self.sentinel_events, self.patient_days))
    }
}
