use core_types::Competency;
use database::DbError;
use indicators::IndicatorError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConsolidationError {
    #[error("No raw metrics were submitted for {0}")]
    NotFound(Competency),

    #[error("{0} is already consolidated")]
    AlreadyConsolidated(Competency),

    #[error("Raw metrics for {competency} are invalid: {source}")]
    Validation {
        competency: Competency,
        #[source]
        source: IndicatorError,
    },

    #[error("Submitted raw metrics are invalid: {0}")]
    InvalidSubmission(#[source] IndicatorError),

    #[error("Raw metrics stored under {requested} describe {computed}")]
    CompetencyMismatch {
        requested: Competency,
        computed: Competency,
    },

    #[error("The store did not acknowledge the result document for {0}")]
    PersistenceNotAcknowledged(Competency),

    #[error("Storage failed while processing {competency}: {source}")]
    Storage {
        competency: Competency,
        #[source]
        source: DbError,
    },

    #[error("Storage failed while reading history of organization {organization_id}: {source}")]
    Lookup {
        organization_id: i64,
        #[source]
        source: DbError,
    },
}

impl ConsolidationError {
    pub(crate) fn storage(competency: Competency) -> impl FnOnce(DbError) -> Self {
        move |source| ConsolidationError::Storage { competency, source }
    }

    pub(crate) fn lookup(organization_id: i64) -> impl FnOnce(DbError) -> Self {
        move |source| ConsolidationError::Lookup { organization_id, source }
    }

    /// The competency the failure refers to, when there is one.
    pub fn competency(&self) -> Option<Competency> {
        match self {
            ConsolidationError::NotFound(c)
            | ConsolidationError::AlreadyConsolidated(c)
            | ConsolidationError::PersistenceNotAcknowledged(c) => Some(*c),
            ConsolidationError::Validation { competency, .. }
            | ConsolidationError::Storage { competency, .. } => Some(*competency),
            ConsolidationError::CompetencyMismatch { requested, .. } => Some(*requested),
            ConsolidationError::InvalidSubmission(_) | ConsolidationError::Lookup { .. } => None,
        }
    }
}
