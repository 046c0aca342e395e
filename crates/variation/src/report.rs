use core_types::{Competency, VariationFlag};
use database::UpdateAck;
use std::fmt;

/// What happened to a single flag when it was applied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The store answered; the ack says whether a document matched and changed.
    Acknowledged(UpdateAck),
    /// The store failed for this item. The message is kept for the operator.
    Failed(String),
}

impl UpdateOutcome {
    pub fn matched(&self) -> bool {
        matches!(self, UpdateOutcome::Acknowledged(ack) if ack.matched)
    }

    pub fn modified(&self) -> bool {
        matches!(self, UpdateOutcome::Acknowledged(ack) if ack.modified)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemReport {
    pub flag: VariationFlag,
    pub outcome: UpdateOutcome,
}

/// The overall verdict of an apply run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApplyStatus {
    /// There were no flags, typically because no prior month exists.
    NothingToApply,
    /// Every flag matched the stored document.
    AllMatched,
    /// Some, but not all, flags matched.
    Partial,
    /// Flags existed but none matched.
    Failed,
}

impl fmt::Display for ApplyStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let text = match self {
            ApplyStatus::NothingToApply => "nothing to apply",
            ApplyStatus::AllMatched => "all matched",
            ApplyStatus::Partial => "partial",
            ApplyStatus::Failed => "failed",
        };
        f.write_str(text)
    }
}

/// Per-item acknowledgments of one `apply_variation` call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplyReport {
    pub target: Competency,
    pub items: Vec<ItemReport>,
}

impl ApplyReport {
    pub fn new(target: Competency) -> Self {
        Self { target, items: Vec::new() }
    }

    /// The number of flags that were attempted.
    pub fn expected(&self) -> usize {
        self.items.len()
    }

    pub fn matched_count(&self) -> usize {
        self.items.iter().filter(|item| item.outcome.matched()).count()
    }

    pub fn modified_count(&self) -> usize {
        self.items.iter().filter(|item| item.outcome.modified()).count()
    }

    /// Items that did not match, whether the store failed or found nothing.
    pub fn failed(&self) -> Vec<&ItemReport> {
        self.items.iter().filter(|item| !item.outcome.matched()).collect()
    }

    pub fn status(&self) -> ApplyStatus {
        let matched = self.matched_count();
        if self.items.is_empty() {
            ApplyStatus::NothingToApply
        } else if matched == self.items.len() {
            ApplyStatus::AllMatched
        } else if matched == 0 {
            ApplyStatus::Failed
        } else {
            ApplyStatus::Partial
        }
    }
}
