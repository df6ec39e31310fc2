//! Status lattice: the total order used to pick the worst outcome.
//!
//! RED is worse than YELLOW, YELLOW worse than GREEN, and GREEN worse than
//! N/A. N/A is the neutral element: it stands for absent, empty and
//! unrecognized status text alike.

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// An evaluation outcome.
///
/// Variants are declared in priority order, so the derived `Ord` ranks
/// `Red` lowest and [`worst`] is simply the minimum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Default)]
pub enum StatusValue {
    #[serde(rename = "RED")]
    Red,
    #[serde(rename = "YELLOW")]
    Yellow,
    #[serde(rename = "GREEN")]
    Green,
    #[serde(rename = "N/A")]
    #[default]
    NotApplicable,
}

impl StatusValue {
    pub const ALL: [StatusValue; 4] = [
        StatusValue::Red,
        StatusValue::Yellow,
        StatusValue::Green,
        StatusValue::NotApplicable,
    ];

    /// Parse status text. Case and surrounding whitespace are ignored;
    /// anything unrecognized is N/A.
    pub fn parse(text: &str) -> Self {
        match text.trim().to_ascii_uppercase().as_str() {
            "RED" => StatusValue::Red,
            "YELLOW" => StatusValue::Yellow,
            "GREEN" => StatusValue::Green,
            _ => StatusValue::NotApplicable,
        }
    }

    /// Parse an optional status cell.
    pub fn from_raw(text: Option<&str>) -> Self {
        text.map(Self::parse).unwrap_or(StatusValue::NotApplicable)
    }

    /// Rank in the lattice: 0 is the worst.
    pub fn priority(&self) -> u8 {
        match self {
            StatusValue::Red => 0,
            StatusValue::Yellow => 1,
            StatusValue::Green => 2,
            StatusValue::NotApplicable => 3,
        }
    }

    /// Whether this status carries an actual evaluation.
    pub fn is_applicable(&self) -> bool {
        !matches!(self, StatusValue::NotApplicable)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusValue::Red => "RED",
            StatusValue::Yellow => "YELLOW",
            StatusValue::Green => "GREEN",
            StatusValue::NotApplicable => "N/A",
        }
    }
}

impl fmt::Display for StatusValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl From<&str> for StatusValue {
    fn from(text: &str) -> Self {
        Self::parse(text)
    }
}

impl<'de> Deserialize<'de> for StatusValue {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let text = Option::<String>::deserialize(deserializer)?;
        Ok(Self::from_raw(text.as_deref()))
    }
}

/// The worst status in `statuses`, or N/A when there is none.
pub fn worst<I>(statuses: I) -> StatusValue
where
    I: IntoIterator<Item = StatusValue>,
{
    statuses
        .into_iter()
        .min()
        .unwrap_or(StatusValue::NotApplicable)
}
