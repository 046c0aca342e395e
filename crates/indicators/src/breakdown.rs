use crate::formula::{Formula, Ratio};
use core_types::{IndicatorValue, Stratum};

/// Collects the stratification of one indicator while it is being computed.
///
/// Lives only for the duration of a single indicator computation, so no
/// intermediate value can leak from one call into the next.
#[derive(Debug)]
pub(crate) struct Breakdown {
    formula: Formula,
    strata: Vec<Stratum>,
}

impl Breakdown {
    pub(crate) fn new(formula: Formula) -> Self {
        Self { formula, strata: Vec::new() }
    }

    /// Evaluates `ratio` and appends it under `label`.
    pub(crate) fn add(&mut self, label: impl Into<String>, ratio: Ratio) {
        self.strata.push(Stratum::new(label, self.formula.apply(ratio)));
    }

    /// Evaluates the top-level ratio and packages the collected strata with it.
    pub(crate) fn finish(self, total: Ratio) -> IndicatorValue {
        IndicatorValue::new(self.formula.apply(total), self.strata)
    }

    /// An indicator with no stratification at all.
    pub(crate) fn single(formula: Formula, total: Ratio) -> IndicatorValue {
        Self::new(formula).finish(total)
    }
}

/// The order in which the marginal totals of a grid are emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Marginals {
    /// Group totals (rows) first, then band totals (columns).
    GroupsFirst,
    /// Band totals (columns) first, then group totals (rows).
    BandsFirst,
}

/// Emits a group × band grid of cells followed by its marginal totals and
/// returns the grand total.
///
/// Cells are labelled `{group}_{band}`, group totals `{group}` and band
/// totals `{band}`. The grand total is the sum of the group totals, which
/// equals the sum of every cell numerator over every cell denominator.
pub(crate) fn grid<const G: usize, const B: usize>(
    breakdown: &mut Breakdown,
    groups: [(&str, [Ratio; B]); G],
    bands: [&str; B],
    marginals: Marginals,
) -> Ratio {
    for (group, cells) in &groups {
        for (band, cell) in bands.iter().zip(cells) {
            breakdown.add(format!("{group}_{band}"), *cell);
        }
    }

    let group_totals: [(&str, Ratio); G] =
        std::array::from_fn(|g| (groups[g].0, groups[g].1.iter().copied().sum()));
    let band_totals: [(&str, Ratio); B] =
        std::array::from_fn(|b| (bands[b], groups.iter().map(|(_, cells)| cells[b]).sum()));

    let (first, second): (&[(&str, Ratio)], &[(&str, Ratio)]) = match marginals {
        Marginals::GroupsFirst => (&group_totals, &band_totals),
        Marginals::BandsFirst => (&band_totals, &group_totals),
    };
    for (label, ratio) in first.iter().chain(second) {
        breakdown.add(*label, *ratio);
    }

    group_totals.iter().map(|(_, ratio)| *ratio).sum()
}
