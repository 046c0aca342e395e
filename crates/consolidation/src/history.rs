/// Submission and consolidation state of one month.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MonthStatus {
    pub month: u32,
    pub submitted: bool,
    pub consolidated: bool,
}

impl MonthStatus {
    /// Raw counters exist but no result has been computed yet.
    pub fn is_pending(&self) -> bool {
        self.submitted && !self.consolidated
    }
}

/// The yearly overview of one organization: twelve rows, January first.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConsolidationHistory {
    pub organization_id: i64,
    pub year: i32,
    pub months: Vec<MonthStatus>,
}

impl ConsolidationHistory {
    pub fn new(organization_id: i64, year: i32, submitted: &[u32], consolidated: &[u32]) -> Self {
        let months = (1..=12)
            .map(|month| MonthStatus {
                month,
                submitted: submitted.contains(&month),
                consolidated: consolidated.contains(&month),
            })
            .collect();
        Self { organization_id, year, months }
    }

    pub fn submitted_count(&self) -> usize {
        self.months.iter().filter(|m| m.submitted).count()
    }

    pub fn consolidated_count(&self) -> usize {
        self.months.iter().filter(|m| m.consolidated).count()
    }

    /// Months waiting for consolidation.
    pub fn pending(&self) -> Vec<u32> {
        self.months.iter().filter(|m| m.is_pending()).map(|m| m.month).collect()
    }
}
