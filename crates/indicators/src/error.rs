use core_types::{CoreError, FieldProblem, IndicatorKey};
use std::fmt;
use thiserror::Error;

/// A single unusable field in a raw metrics row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldIssue {
    pub field: &'static str,
    pub problem: FieldProblem,
}

impl FieldIssue {
    pub fn new(field: &'static str, problem: FieldProblem) -> Self {
        Self { field, problem }
    }
}

impl fmt::Display for FieldIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}' is {}", self.field, self.problem)
    }
}

#[derive(Error, Debug, Clone, PartialEq)]
pub enum IndicatorError {
    #[error("Indicator {indicator} cannot be computed: {}", join_issues(.issues))]
    InvalidCounters {
        indicator: IndicatorKey,
        issues: Vec<FieldIssue>,
    },

    #[error("Grouping key '{field}' is {problem}")]
    InvalidGroupingKey {
        field: &'static str,
        problem: FieldProblem,
    },

    #[error("Invalid competency in raw metrics: {0}")]
    InvalidCompetency(#[from] CoreError),
}

impl IndicatorError {
    /// The indicator that failed, when the failure is indicator-specific.
    pub fn indicator(&self) -> Option<IndicatorKey> {
        match self {
            IndicatorError::InvalidCounters { indicator, .. } => Some(*indicator),
            _ => None,
        }
    }

    /// Every offending field name carried by this error.
    pub fn fields(&self) -> Vec<&'static str> {
        match self {
            IndicatorError::InvalidCounters { issues, .. } => {
                issues.iter().map(|issue| issue.field).collect()
            }
            IndicatorError::InvalidGroupingKey { field, .. } => vec![*field],
            IndicatorError::InvalidCompetency(_) => vec![],
        }
    }
}

fn join_issues(issues: &[FieldIssue]) -> String {
    issues
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}
