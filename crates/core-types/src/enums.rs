use crate::error::CoreError;
use serde::de::{self, Visitor};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One of the fourteen standardized hospital-quality indicators.
///
/// The derived ordering follows the catalog numbering, so `BTreeMap`s keyed by
/// `IndicatorKey` iterate `kpi_1` through `kpi_14`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum IndicatorKey {
    #[serde(rename = "kpi_1")]
    Kpi1,
    #[serde(rename = "kpi_2")]
    Kpi2,
    #[serde(rename = "kpi_3")]
    Kpi3,
    #[serde(rename = "kpi_4")]
    Kpi4,
    #[serde(rename = "kpi_5")]
    Kpi5,
    #[serde(rename = "kpi_6")]
    Kpi6,
    #[serde(rename = "kpi_7")]
    Kpi7,
    #[serde(rename = "kpi_8")]
    Kpi8,
    #[serde(rename = "kpi_9")]
    Kpi9,
    #[serde(rename = "kpi_10")]
    Kpi10,
    #[serde(rename = "kpi_11")]
    Kpi11,
    #[serde(rename = "kpi_12")]
    Kpi12,
    #[serde(rename = "kpi_13")]
    Kpi13,
    #[serde(rename = "kpi_14")]
    Kpi14,
}

impl IndicatorKey {
    pub const ALL: [IndicatorKey; 14] = [
        IndicatorKey::Kpi1,
        IndicatorKey::Kpi2,
        IndicatorKey::Kpi3,
        IndicatorKey::Kpi4,
        IndicatorKey::Kpi5,
        IndicatorKey::Kpi6,
        IndicatorKey::Kpi7,
        IndicatorKey::Kpi8,
        IndicatorKey::Kpi9,
        IndicatorKey::Kpi10,
        IndicatorKey::Kpi11,
        IndicatorKey::Kpi12,
        IndicatorKey::Kpi13,
        IndicatorKey::Kpi14,
    ];

    /// The document key, e.g. `"kpi_4"`.
    pub fn as_str(&self) -> &'static str {
        match self {
            IndicatorKey::Kpi1 => "kpi_1",
            IndicatorKey::Kpi2 => "kpi_2",
            IndicatorKey::Kpi3 => "kpi_3",
            IndicatorKey::Kpi4 => "kpi_4",
            IndicatorKey::Kpi5 => "kpi_5",
            IndicatorKey::Kpi6 => "kpi_6",
            IndicatorKey::Kpi7 => "kpi_7",
            IndicatorKey::Kpi8 => "kpi_8",
            IndicatorKey::Kpi9 => "kpi_9",
            IndicatorKey::Kpi10 => "kpi_10",
            IndicatorKey::Kpi11 => "kpi_11",
            IndicatorKey::Kpi12 => "kpi_12",
            IndicatorKey::Kpi13 => "kpi_13",
            IndicatorKey::Kpi14 => "kpi_14",
        }
    }

    /// A short human-readable description of the indicator.
    pub fn description(&self) -> &'static str {
        match self {
            IndicatorKey::Kpi1 => "Vaginal birth proportion",
            IndicatorKey::Kpi2 => "30-day readmission proportion",
            IndicatorKey::Kpi3 => "Cardiac arrest density",
            IndicatorKey::Kpi4 => "Institutional mortality",
            IndicatorKey::Kpi5 => "Average length of stay",
            IndicatorKey::Kpi6 => "Average ER total time",
            IndicatorKey::Kpi7 => "Average ER wait to first care",
            IndicatorKey::Kpi8 => "Prophylactic antibiotic rate",
            IndicatorKey::Kpi9 => "Clean-surgery site infection rate",
            IndicatorKey::Kpi10 => "CLABSI density",
            IndicatorKey::Kpi11 => "CAUTI density",
            IndicatorKey::Kpi12 => "VTE prophylaxis rate",
            IndicatorKey::Kpi13 => "Fall-with-harm density",
            IndicatorKey::Kpi14 => "Sentinel event density",
        }
    }
}

impl fmt::Display for IndicatorKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IndicatorKey {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        IndicatorKey::ALL
            .into_iter()
            .find(|key| key.as_str() == s)
            .ok_or_else(|| CoreError::UnknownIndicator(s.to_string()))
    }
}

/// The month-over-month variation marker stored alongside each indicator value.
///
/// Serialized as `""` while pending, `0` when the value did not increase and
/// `1` when it increased.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Variation {
    #[default]
    Pending,
    NotIncreased,
    Increased,
}

impl Variation {
    /// Compares the current value against the prior one. Ties are not an increase.
    pub fn between(prior: f64, current: f64) -> Self {
        if current > prior {
            Variation::Increased
        } else {
            Variation::NotIncreased
        }
    }

    /// The stored flag, or `None` while pending.
    pub fn flag(&self) -> Option<u8> {
        match self {
            Variation::Pending => None,
            Variation::NotIncreased => Some(0),
            Variation::Increased => Some(1),
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Variation::Pending)
    }
}

impl fmt::Display for Variation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.flag() {
            Some(flag) => write!(f, "{flag}"),
            None => f.write_str(""),
        }
    }
}

impl Serialize for Variation {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.flag() {
            Some(flag) => serializer.serialize_u8(flag),
            None => serializer.serialize_str(""),
        }
    }
}

impl<'de> Deserialize<'de> for Variation {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct VariationVisitor;

        impl<'de> Visitor<'de> for VariationVisitor {
            type Value = Variation;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(r#""", 0 or 1"#)
            }

            fn visit_u64<E: de::Error>(self, v: u64) -> Result<Variation, E> {
                match v {
                    0 => Ok(Variation::NotIncreased),
                    1 => Ok(Variation::Increased),
                    other => Err(E::invalid_value(de::Unexpected::Unsigned(other), &self)),
                }
            }

            fn visit_i64<E: de::Error>(self, v: i64) -> Result<Variation, E> {
                match u64::try_from(v) {
                    Ok(v) => self.visit_u64(v),
                    Err(_) => Err(E::invalid_value(de::Unexpected::Signed(v), &self)),
                }
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Variation, E> {
                match v {
                    "" => Ok(Variation::Pending),
                    "0" => Ok(Variation::NotIncreased),
                    "1" => Ok(Variation::Increased),
                    other => Err(E::invalid_value(de::Unexpected::Str(other), &self)),
                }
            }

            fn visit_unit<E: de::Error>(self) -> Result<Variation, E> {
                Ok(Variation::Pending)
            }
        }

        deserializer.deserialize_any(VariationVisitor)
    }
}
