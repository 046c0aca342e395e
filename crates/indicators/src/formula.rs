use std::iter::Sum;
use std::ops::Add;

/// The three primitive formulas every indicator level is evaluated with.
///
/// No rounding and no zero-denominator guard: a zero denominator yields NaN or
/// an infinity exactly as IEEE-754 division does.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Formula {
    /// `(num / den) * 100`
    Rate,
    /// `num / den`
    Average,
    /// `(num / den) * 1000`
    Density,
}

impl Formula {
    pub fn apply(self, ratio: Ratio) -> f64 {
        match self {
            Formula::Rate => rate(ratio.numerator, ratio.denominator),
            Formula::Average => average(ratio.numerator, ratio.denominator),
            Formula::Density => density(ratio.numerator, ratio.denominator),
        }
    }
}

pub fn rate(numerator: f64, denominator: f64) -> f64 {
    (numerator / denominator) * 100.0
}

pub fn average(numerator: f64, denominator: f64) -> f64 {
    numerator / denominator
}

pub fn density(numerator: f64, denominator: f64) -> f64 {
    (numerator / denominator) * 1000.0
}

/// An unevaluated numerator/denominator pair.
///
/// Aggregation always sums numerators and denominators separately; the
/// formula is only applied once a level is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ratio {
    pub numerator: f64,
    pub denominator: f64,
}

impl Ratio {
    pub fn new(numerator: f64, denominator: f64) -> Self {
        Self { numerator, denominator }
    }
}

impl Add for Ratio {
    type Output = Ratio;

    fn add(self, other: Ratio) -> Ratio {
        Ratio {
            numerator: self.numerator + other.numerator,
            denominator: self.denominator + other.denominator,
        }
    }
}

impl Sum for Ratio {
    fn sum<I: Iterator<Item = Ratio>>(iter: I) -> Ratio {
        iter.fold(Ratio::default(), Add::add)
    }
}
