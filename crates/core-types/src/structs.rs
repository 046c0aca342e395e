use crate::enums::{IndicatorKey, Variation};
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use std::fmt;
use std::ops::RangeInclusive;

/// A single (organization, year, month) reporting period.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Competency {
    pub organization_id: i64,
    pub year: i32,
    pub month: u32,
}

impl Competency {
    /// Years a competency can name. Four digits, so every accepted
    /// competency has a predecessor and prints as `YYYY-MM`.
    pub const YEARS: RangeInclusive<i32> = 1..=9999;

    pub fn new(organization_id: i64, year: i32, month: u32) -> Result<Self, CoreError> {
        if !Self::YEARS.contains(&year) {
            return Err(CoreError::InvalidInput(
                "year".to_string(),
                format!("{year} is outside 1..=9999"),
            ));
        }
        if !(1..=12).contains(&month) {
            return Err(CoreError::InvalidInput(
                "month".to_string(),
                format!("{month} is outside 1..=12"),
            ));
        }
        Ok(Self { organization_id, year, month })
    }

    /// The immediately preceding competency of the same organization.
    /// January rolls back to December of the prior year.
    pub fn previous(&self) -> Self {
        if self.month == 1 {
            Self { year: self.year.saturating_sub(1), month: 12, ..*self }
        } else {
            Self { month: self.month - 1, ..*self }
        }
    }

    /// The (year, month) pair used for chronological ordering within one organization.
    pub fn period(&self) -> (i32, u32) {
        (self.year, self.month)
    }
}

impl fmt::Display for Competency {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{:04}-{:02}", self.organization_id, self.year, self.month)
    }
}

/// Why a named field of a raw row could not be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldProblem {
    Missing,
    Null,
    NotNumeric,
    NotIntegral,
}

impl fmt::Display for FieldProblem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            FieldProblem::Missing => "missing",
            FieldProblem::Null => "null",
            FieldProblem::NotNumeric => "not numeric",
            FieldProblem::NotIntegral => "not an integer",
        };
        f.write_str(text)
    }
}

/// One row of monthly raw counters, exactly as delivered by the upload layer.
///
/// The row is a flat JSON object: counter name to number. The grouping keys
/// `organization_id`, `year` and `month` live in the same object.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RawMetricsRecord(Map<String, Value>);

impl RawMetricsRecord {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a record from an arbitrary JSON value, which must be an object.
    pub fn from_value(value: Value) -> Result<Self, CoreError> {
        match value {
            Value::Object(map) => Ok(Self(map)),
            other => Err(CoreError::InvalidInput(
                "raw metrics".to_string(),
                format!("expected a JSON object, found {}", json_type_name(&other)),
            )),
        }
    }

    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(name.into(), value.into())
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        self.0.remove(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Reads a numeric counter.
    pub fn counter(&self, name: &str) -> Result<f64, FieldProblem> {
        match self.0.get(name) {
            None => Err(FieldProblem::Missing),
            Some(Value::Null) => Err(FieldProblem::Null),
            Some(Value::Number(n)) => n.as_f64().ok_or(FieldProblem::NotNumeric),
            Some(_) => Err(FieldProblem::NotNumeric),
        }
    }

    /// Reads an integral field such as a grouping key. `2024.0` is accepted as `2024`.
    pub fn integer(&self, name: &str) -> Result<i64, FieldProblem> {
        match self.0.get(name) {
            None => Err(FieldProblem::Missing),
            Some(Value::Null) => Err(FieldProblem::Null),
            Some(Value::Number(n)) => {
                if let Some(i) = n.as_i64() {
                    return Ok(i);
                }
                match n.as_f64() {
                    Some(f) if f.fract() == 0.0 && f.abs() < i64::MAX as f64 => Ok(f as i64),
                    _ => Err(FieldProblem::NotIntegral),
                }
            }
            Some(_) => Err(FieldProblem::NotNumeric),
        }
    }

    pub fn into_value(self) -> Value {
        Value::Object(self.0)
    }
}

fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// A named partial value feeding into an indicator's top-level value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Stratum {
    pub label: String,
    #[serde(with = "crate::non_finite")]
    pub value: f64,
}

impl Stratum {
    pub fn new(label: impl Into<String>, value: f64) -> Self {
        Self { label: label.into(), value }
    }
}

/// The computed value of one indicator with its stratification breakdown.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndicatorValue {
    #[serde(with = "crate::non_finite")]
    pub value: f64,
    #[serde(default)]
    pub variation: Variation,
    #[serde(default)]
    pub stratification: Vec<Stratum>,
}

impl IndicatorValue {
    /// A freshly computed value; the variation stays pending until compared.
    pub fn new(value: f64, stratification: Vec<Stratum>) -> Self {
        Self { value, variation: Variation::Pending, stratification }
    }

    /// Looks up a stratum by label.
    pub fn stratum(&self, label: &str) -> Option<f64> {
        self.stratification
            .iter()
            .find(|s| s.label == label)
            .map(|s| s.value)
    }
}

/// The consolidated indicators of one competency.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultRecord {
    pub organization_id: i64,
    pub year: i32,
    pub month: u32,
    pub indicators: BTreeMap<IndicatorKey, IndicatorValue>,
}

impl ResultRecord {
    pub fn new(competency: Competency, indicators: BTreeMap<IndicatorKey, IndicatorValue>) -> Self {
        Self {
            organization_id: competency.organization_id,
            year: competency.year,
            month: competency.month,
            indicators,
        }
    }

    pub fn competency(&self) -> Competency {
        Competency {
            organization_id: self.organization_id,
            year: self.year,
            month: self.month,
        }
    }

    pub fn indicator(&self, key: IndicatorKey) -> Option<&IndicatorValue> {
        self.indicators.get(&key)
    }

    /// Sets the variation field of one indicator. Returns `None` when the
    /// record has no such indicator, otherwise whether the field changed.
    pub fn set_variation(&mut self, key: IndicatorKey, variation: Variation) -> Option<bool> {
        let entry = self.indicators.get_mut(&key)?;
        let changed = entry.variation != variation;
        entry.variation = variation;
        Some(changed)
    }
}

/// The result of comparing one indicator between two consecutive competencies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct VariationFlag {
    pub indicator_key: IndicatorKey,
    #[serde(rename = "variation_flag")]
    pub variation: Variation,
}

impl VariationFlag {
    pub fn new(indicator_key: IndicatorKey, prior: f64, current: f64) -> Self {
        Self { indicator_key, variation: Variation::between(prior, current) }
    }
}

/// A reporting organization known to the store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Organization {
    pub organization_id: i64,
    pub name: String,
    pub active: bool,
}

impl fmt::Display for Organization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.name, self.organization_id)
    }
}
