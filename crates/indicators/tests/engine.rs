//! Tests for the indicator engine.

use core_types::{FieldProblem, IndicatorKey, RawMetricsRecord, Variation};
use indicators::{
    required_fields, IndicatorEngine, IndicatorError, LengthOfStayCounters, MortalityCounters,
};
use proptest::prelude::*;
use serde_json::Value;

// --- Fixtures ---

/// A complete raw row: every counter of every indicator present with a
/// small positive integer, plus the grouping keys.
fn full_record() -> RawMetricsRecord {
    let mut raw = RawMetricsRecord::new();
    raw.insert("organization_id", 2077);
    raw.insert("year", 2024);
    raw.insert("month", 3);
    for key in IndicatorKey::ALL {
        for (i, field) in required_fields(key).iter().enumerate() {
            raw.insert(*field, ((i % 7) + 1) as u64 * 10);
        }
    }
    raw
}

fn with(mut raw: RawMetricsRecord, pairs: &[(&str, f64)]) -> RawMetricsRecord {
    for (field, value) in pairs {
        raw.insert(*field, *value);
    }
    raw
}

fn labels(raw: &RawMetricsRecord, key: IndicatorKey) -> Vec<String> {
    IndicatorEngine::new()
        .compute(key, raw)
        .unwrap()
        .stratification
        .into_iter()
        .map(|s| s.label)
        .collect()
}

fn sum_fields(raw: &RawMetricsRecord, fields: &[&str], suffix: &str) -> f64 {
    fields
        .iter()
        .filter(|f| f.ends_with(suffix))
        .map(|f| raw.counter(f).unwrap())
        .sum()
}

fn assert_close(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-9,
        "expected {expected}, got {actual}"
    );
}

/// Sets the twelve ward/icu x neonatal/pediatric/adult cells of a device
/// indicator, in that order, as (infections, device_days) pairs.
fn device_cells(
    raw: RawMetricsRecord,
    infection: &str,
    device_days: &str,
    cells: [(f64, f64); 6],
) -> RawMetricsRecord {
    let mut raw = raw;
    let names = [
        "ward_neonatal", "ward_pediatric", "ward_adult",
        "icu_neonatal", "icu_pediatric", "icu_adult",
    ];
    for (name, (infections, days)) in names.iter().zip(cells) {
        raw.insert(format!("{name}_{infection}"), infections);
        raw.insert(format!("{name}_{device_days}"), days);
    }
    raw
}

// --- compute_all ---

#[test]
fn test_compute_all_returns_every_indicator() {
    let result = IndicatorEngine::new().compute_all(&full_record()).unwrap();

    assert_eq!(result.organization_id, 2077);
    assert_eq!(result.year, 2024);
    assert_eq!(result.month, 3);
    assert_eq!(result.indicators.len(), 14);
    for (key, value) in &result.indicators {
        assert!(value.value.is_finite(), "{key} should be finite");
        assert_eq!(value.variation, Variation::Pending);
    }
}

#[test]
fn test_vaginal_birth_proportion() {
    let raw = with(full_record(), &[("vaginal_births", 80.0), ("cesarean_births", 20.0)]);
    let result = IndicatorEngine::new().compute_all(&raw).unwrap();
    assert_eq!(result.indicator(IndicatorKey::Kpi1).unwrap().value, 80.0);
}

#[test]
fn test_cardiac_arrest_density_is_per_thousand() {
    let raw = with(full_record(), &[("cardiac_arrests", 3.0), ("patient_days", 1500.0)]);
    let value = IndicatorEngine::new().cardiac_arrest_density(&raw).unwrap();
    assert_eq!(value.value, 2.0);
    assert!(value.stratification.is_empty());
}

#[test]
fn test_readmission_strata_and_total() {
    let raw = with(
        full_record(),
        &[
            ("clinical_readmissions_30d", 5.0),
            ("clinical_discharges_prev_month", 100.0),
            ("surgical_readmissions_30d", 15.0),
            ("surgical_discharges_prev_month", 100.0),
        ],
    );
    let value = IndicatorEngine::new().readmission_30_day(&raw).unwrap();
    assert_eq!(value.stratum("clinical"), Some(5.0));
    assert_eq!(value.stratum("surgical"), Some(15.0));
    assert_eq!(value.value, 10.0);
}

#[test]
fn test_mortality_aggregates_by_summing_counts() {
    let raw = with(
        full_record(),
        &[("clinical_adult_deaths", 9.0), ("surgical_elderly_discharges", 400.0)],
    );
    let fields = MortalityCounters::REQUIRED_FIELDS;
    let expected = sum_fields(&raw, fields, "_deaths") / sum_fields(&raw, fields, "_discharges");

    let value = IndicatorEngine::new().institutional_mortality(&raw).unwrap();
    assert_eq!(value.value, expected);

    // The mean of the per-cell ratios is a different number.
    let mean_of_cells: f64 = value.stratification[..10].iter().map(|s| s.value).sum::<f64>() / 10.0;
    assert_ne!(value.value, mean_of_cells);
}

#[test]
fn test_length_of_stay_aggregates_by_summing_counts() {
    let raw = full_record();
    let fields = LengthOfStayCounters::REQUIRED_FIELDS;
    let expected =
        sum_fields(&raw, fields, "_patient_days") / sum_fields(&raw, fields, "_discharges");

    let value = IndicatorEngine::new().average_length_of_stay(&raw).unwrap();
    assert_eq!(value.value, expected);
}

#[test]
fn test_mortality_uses_unscaled_average() {
    let mut raw = full_record();
    for field in MortalityCounters::REQUIRED_FIELDS {
        let count = if field.ends_with("_deaths") { 1.0 } else { 50.0 };
        raw.insert(*field, count);
    }
    let value = IndicatorEngine::new().institutional_mortality(&raw).unwrap();
    assert_eq!(value.value, 0.02);
    assert_eq!(value.stratum("clinical_adult"), Some(0.02));
    assert_eq!(value.stratum("elderly"), Some(0.02));
}

#[test]
fn test_er_wait_time_levels_use_their_own_patients() {
    let raw = with(
        full_record(),
        &[
            ("er_level2_wait_minutes", 300.0),
            ("er_level2_patients", 10.0),
            ("er_level3_wait_minutes", 900.0),
            ("er_level3_patients", 20.0),
        ],
    );
    let value = IndicatorEngine::new().er_wait_time(&raw).unwrap();
    assert_eq!(value.stratum("level2"), Some(30.0));
    assert_eq!(value.stratum("level3"), Some(45.0));
    assert_eq!(value.value, 40.0);
}

#[test]
fn test_vte_prophylaxis_overall_includes_clinical() {
    let raw = with(
        full_record(),
        &[
            ("clinical_vte_prophylaxis", 50.0),
            ("clinical_vte_at_risk", 100.0),
            ("surgical_ortho_vte_prophylaxis", 40.0),
            ("surgical_ortho_vte_at_risk", 50.0),
            ("surgical_non_ortho_vte_prophylaxis", 30.0),
            ("surgical_non_ortho_vte_at_risk", 50.0),
        ],
    );
    let value = IndicatorEngine::new().vte_prophylaxis_rate(&raw).unwrap();
    assert_eq!(value.stratum("surgical_ortho"), Some(80.0));
    assert_eq!(value.stratum("surgical_non_ortho"), Some(60.0));
    assert_eq!(value.stratum("surgical"), Some(70.0));
    assert_eq!(value.stratum("clinical"), None);
    assert_eq!(value.value, 60.0);
}

#[test]
fn test_er_total_time_is_hours_per_patient() {
    let raw = with(full_record(), &[("er_total_stay_hours", 90.0), ("er_patients", 30.0)]);
    let result = IndicatorEngine::new().compute_all(&raw).unwrap();
    assert_close(result.indicator(IndicatorKey::Kpi6).unwrap().value, 3.0);
}

#[test]
fn test_prophylactic_antibiotic_rate() {
    let raw = with(
        full_record(),
        &[("clean_surgeries_with_prophylaxis", 45.0), ("clean_surgeries", 50.0)],
    );
    let result = IndicatorEngine::new().compute_all(&raw).unwrap();
    assert_close(result.indicator(IndicatorKey::Kpi8).unwrap().value, 90.0);
}

#[test]
fn test_clean_surgery_infection_is_a_percentage() {
    let raw = with(
        full_record(),
        &[("clean_surgery_infections_30d", 3.0), ("clean_surgeries_prev_month", 60.0)],
    );
    let result = IndicatorEngine::new().compute_all(&raw).unwrap();
    assert_close(result.indicator(IndicatorKey::Kpi9).unwrap().value, 5.0);
}

#[test]
fn test_falls_and_sentinel_events_are_per_thousand_patient_days() {
    let raw = with(
        full_record(),
        &[("falls_with_harm", 2.0), ("sentinel_events", 1.0), ("patient_days", 4000.0)],
    );
    let result = IndicatorEngine::new().compute_all(&raw).unwrap();
    assert_close(result.indicator(IndicatorKey::Kpi13).unwrap().value, 0.5);
    assert_close(result.indicator(IndicatorKey::Kpi14).unwrap().value, 0.25);
}

#[test]
fn test_clabsi_density_sums_cells_before_dividing() {
    let raw = device_cells(
        full_record(),
        "clabsi",
        "cvc_days",
        [(1.0, 100.0), (0.0, 400.0), (3.0, 500.0), (2.0, 1000.0), (1.0, 250.0), (5.0, 750.0)],
    );
    let value = IndicatorEngine::new().clabsi_density(&raw).unwrap();

    assert_close(value.stratum("ward_neonatal").unwrap(), 10.0);
    assert_close(value.stratum("icu_adult").unwrap(), 5000.0 / 750.0);
    assert_close(value.stratum("neonatal").unwrap(), 3.0 / 1100.0 * 1000.0);
    assert_close(value.stratum("pediatric").unwrap(), 1.0 / 650.0 * 1000.0);
    assert_close(value.stratum("ward").unwrap(), 4.0);
    assert_close(value.stratum("icu").unwrap(), 4.0);
    assert_close(value.value, 4.0);

    // The mean of the six cells is a different number.
    let mean_of_cells: f64 = value.stratification[..6].iter().map(|s| s.value).sum::<f64>() / 6.0;
    assert!((value.value - mean_of_cells).abs() > 1e-6);
}

#[test]
fn test_cauti_density_sums_cells_before_dividing() {
    let raw = device_cells(
        full_record(),
        "cauti",
        "urinary_catheter_days",
        [(0.0, 200.0), (1.0, 300.0), (4.0, 500.0), (1.0, 100.0), (2.0, 400.0), (2.0, 500.0)],
    );
    let value = IndicatorEngine::new().cauti_density(&raw).unwrap();

    assert_eq!(value.stratum("ward_neonatal"), Some(0.0));
    assert_close(value.stratum("ward_adult").unwrap(), 8.0);
    assert_close(value.stratum("adult").unwrap(), 6.0);
    assert_close(value.stratum("ward").unwrap(), 5.0);
    assert_close(value.stratum("icu").unwrap(), 5.0);
    assert_close(value.value, 5.0);

    let result = IndicatorEngine::new().compute_all(&raw).unwrap();
    assert_close(result.indicator(IndicatorKey::Kpi11).unwrap().value, 5.0);
}

// --- Stratification order ---

#[test]
fn test_stratification_labels_follow_catalog_order() {
    let raw = full_record();

    assert_eq!(labels(&raw, IndicatorKey::Kpi2), ["clinical", "surgical"]);
    assert_eq!(labels(&raw, IndicatorKey::Kpi7), ["level2", "level3"]);
    assert_eq!(
        labels(&raw, IndicatorKey::Kpi12),
        ["surgical_ortho", "surgical_non_ortho", "surgical"]
    );
    assert_eq!(
        labels(&raw, IndicatorKey::Kpi10),
        [
            "ward_neonatal", "ward_pediatric", "ward_adult",
            "icu_neonatal", "icu_pediatric", "icu_adult",
            "neonatal", "pediatric", "adult",
            "ward", "icu",
        ]
    );
    assert_eq!(labels(&raw, IndicatorKey::Kpi11), labels(&raw, IndicatorKey::Kpi10));
    assert_eq!(
        labels(&raw, IndicatorKey::Kpi5),
        [
            "clinical_pediatric", "clinical_adult", "clinical_elderly",
            "surgical_pediatric", "surgical_adult", "surgical_elderly",
            "clinical", "surgical",
            "pediatric", "adult", "elderly",
        ]
    );

    let mortality = labels(&raw, IndicatorKey::Kpi4);
    assert_eq!(mortality.len(), 17);
    assert_eq!(mortality[0], "clinical_early_neonatal");
    assert_eq!(mortality[9], "surgical_elderly");
    assert_eq!(&mortality[10..12], ["clinical", "surgical"]);
    assert_eq!(
        &mortality[12..],
        ["early_neonatal", "late_neonatal", "pediatric", "adult", "elderly"]
    );

    for key in [
        IndicatorKey::Kpi1,
        IndicatorKey::Kpi3,
        IndicatorKey::Kpi6,
        IndicatorKey::Kpi8,
        IndicatorKey::Kpi9,
        IndicatorKey::Kpi13,
        IndicatorKey::Kpi14,
    ] {
        assert!(labels(&raw, key).is_empty(), "{key} has no stratification");
    }
}

// --- Zero denominators ---

#[test]
fn test_zero_denominator_propagates_as_non_finite() {
    let raw = with(
        full_record(),
        &[
            ("vaginal_births", 0.0),
            ("cesarean_births", 0.0),
            ("cardiac_arrests", 3.0),
            ("patient_days", 0.0),
        ],
    );
    let result = IndicatorEngine::new().compute_all(&raw).unwrap();

    assert!(result.indicator(IndicatorKey::Kpi1).unwrap().value.is_nan());
    assert_eq!(result.indicator(IndicatorKey::Kpi3).unwrap().value, f64::INFINITY);
}

#[test]
fn test_zero_denominator_in_one_cell_leaves_total_finite() {
    let raw = with(full_record(), &[("icu_neonatal_clabsi", 1.0), ("icu_neonatal_cvc_days", 0.0)]);
    let value = IndicatorEngine::new().clabsi_density(&raw).unwrap();

    assert_eq!(value.stratum("icu_neonatal"), Some(f64::INFINITY));
    assert!(value.value.is_finite());
}

// --- Validation ---

#[test]
fn test_missing_counter_names_field_and_indicator() {
    let mut raw = full_record();
    raw.remove("cesarean_births");

    let err = IndicatorEngine::new().compute_all(&raw).unwrap_err();
    assert_eq!(err.indicator(), Some(IndicatorKey::Kpi1));
    assert_eq!(err.fields(), vec!["cesarean_births"]);
    assert!(err.to_string().contains("'cesarean_births' is missing"));
}

#[test]
fn test_all_offending_fields_are_reported_together() {
    let mut raw = full_record();
    raw.insert("ward_adult_cvc_days", Value::Null);
    raw.insert("icu_adult_clabsi", "three");
    raw.remove("icu_pediatric_clabsi");

    match IndicatorEngine::new().clabsi_density(&raw) {
        Err(IndicatorError::InvalidCounters { indicator, issues }) => {
            assert_eq!(indicator, IndicatorKey::Kpi10);
            let found: Vec<_> = issues.iter().map(|i| (i.field, i.problem)).collect();
            assert_eq!(
                found,
                vec![
                    ("ward_adult_cvc_days", FieldProblem::Null),
                    ("icu_pediatric_clabsi", FieldProblem::Missing),
                    ("icu_adult_clabsi", FieldProblem::NotNumeric),
                ]
            );
        }
        other => panic!("expected InvalidCounters, got {other:?}"),
    }
}

#[test]
fn test_missing_field_only_blocks_indicators_that_need_it() {
    let mut raw = full_record();
    raw.remove("er_patients");
    let engine = IndicatorEngine::new();

    assert!(engine.er_total_time(&raw).is_err());
    assert!(engine.er_wait_time(&raw).is_ok());
    assert!(engine.compute_all(&raw).is_err());
}

#[test]
fn test_missing_grouping_key_fails_before_indicators() {
    let mut raw = full_record();
    raw.remove("month");
    raw.remove("vaginal_births");

    let err = IndicatorEngine::new().compute_all(&raw).unwrap_err();
    assert_eq!(
        err,
        IndicatorError::InvalidGroupingKey { field: "month", problem: FieldProblem::Missing }
    );
}

#[test]
fn test_grouping_keys_accept_integral_floats() {
    let raw = with(full_record(), &[("year", 2023.0), ("month", 12.0)]);
    let result = IndicatorEngine::new().compute_all(&raw).unwrap();
    assert_eq!((result.year, result.month), (2023, 12));
}

#[test]
fn test_invalid_month_is_rejected() {
    let raw = with(full_record(), &[("month", 13.0)]);
    assert!(matches!(
        IndicatorEngine::new().compute_all(&raw),
        Err(IndicatorError::InvalidCompetency(_))
    ));

    let raw = with(full_record(), &[("month", 2.5)]);
    assert!(matches!(
        IndicatorEngine::new().compute_all(&raw),
        Err(IndicatorError::InvalidGroupingKey { field: "month", problem: FieldProblem::NotIntegral })
    ));
}

#[test]
fn test_year_outside_four_digits_is_rejected() {
    for year in [i32::MIN as f64, 0.0, 10_000.0] {
        let raw = with(full_record(), &[("year", year), ("month", 1.0)]);
        assert!(matches!(
            IndicatorEngine::new().compute_all(&raw),
            Err(IndicatorError::InvalidCompetency(_))
        ));
    }
}

#[test]
fn test_required_fields_cover_every_indicator() {
    let engine = IndicatorEngine::new();
    assert_eq!(engine.required_fields(IndicatorKey::Kpi4).len(), 20);
    assert_eq!(engine.required_fields(IndicatorKey::Kpi5).len(), 12);
    assert_eq!(engine.required_fields(IndicatorKey::Kpi10).len(), 12);
    assert_eq!(engine.required_fields(IndicatorKey::Kpi12).len(), 6);
    assert_eq!(engine.required_fields(IndicatorKey::Kpi13), ["falls_with_harm", "patient_days"]);
}

// --- Statelessness ---

#[test]
fn test_repeated_computation_is_bit_identical() {
    let engine = IndicatorEngine::new();
    let first = full_record();
    let second = with(full_record(), &[("vaginal_births", 1.0), ("clinical_adult_deaths", 70.0)]);

    let a = engine.compute_all(&first).unwrap();
    let _ = engine.compute_all(&second).unwrap();
    let b = engine.compute_all(&first).unwrap();

    assert_eq!(serde_json::to_string(&a).unwrap(), serde_json::to_string(&b).unwrap());
}

proptest! {
    #[test]
    fn prop_mortality_total_commutes_with_summation(
        counts in proptest::collection::vec((0u32..500, 1u32..5000), 10)
    ) {
        let mut raw = full_record();
        let fields = MortalityCounters::REQUIRED_FIELDS;
        for (pair, (deaths, discharges)) in fields.chunks(2).zip(&counts) {
            raw.insert(pair[0], *deaths);
            raw.insert(pair[1], *discharges);
        }
        let deaths: f64 = counts.iter().map(|(d, _)| *d as f64).sum();
        let discharges: f64 = counts.iter().map(|(_, d)| *d as f64).sum();

        let value = IndicatorEngine::new().institutional_mortality(&raw).unwrap();
        prop_assert_eq!(value.value, deaths / discharges);
    }

    #[test]
    fn prop_compute_all_is_deterministic(
        births in 0u32..10_000,
        arrests in 0u32..100,
        patient_days in 1u32..100_000,
    ) {
        let raw = with(
            full_record(),
            &[
                ("vaginal_births", births as f64),
                ("cardiac_arrests", arrests as f64),
                ("patient_days", patient_days as f64),
            ],
        );
        let engine = IndicatorEngine::new();
        let a = engine.compute_all(&raw).unwrap();
        let b = engine.compute_all(&raw).unwrap();
        prop_assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }
}
