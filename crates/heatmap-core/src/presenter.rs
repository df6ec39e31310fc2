//! Presentation of resolved statuses.
//!
//! The aggregator only ever deals in [`StatusValue`] and [`Role`]. Glyphs,
//! words and colors live here, behind the [`Presenter`] trait, so a caller
//! can swap the rendering without touching the rollup.
//!
//! | status | sub-operation | parent | color |
//! |---|---|---|---|
//! | RED | marker | "NOK" | red |
//! | YELLOW | marker | "acceptable" | yellow |
//! | GREEN | marker | "OK" | green |
//! | N/A | none | none | none |

use serde::{Deserialize, Serialize};

use crate::config::HeatmapConfig;
use crate::status::StatusValue;
use crate::types::Role;

/// Default sub-operation marker.
pub const DEFAULT_MARKER_GLYPH: &str = "●";

/// Heat map cell color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisplayColor {
    Red,
    Yellow,
    Green,
}

impl DisplayColor {
    /// RGB hex code used by spreadsheet fonts.
    pub fn hex(&self) -> &'static str {
        match self {
            DisplayColor::Red => "FF0000",
            DisplayColor::Yellow => "FFFF00",
            DisplayColor::Green => "00FF00",
        }
    }

    pub fn for_status(status: StatusValue) -> Option<Self> {
        match status {
            StatusValue::Red => Some(DisplayColor::Red),
            StatusValue::Yellow => Some(DisplayColor::Yellow),
            StatusValue::Green => Some(DisplayColor::Green),
            StatusValue::NotApplicable => None,
        }
    }
}

/// What a heat map cell shows.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    pub text: String,
    pub color: DisplayColor,
}

/// How sub-operation markers are rendered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MarkerFormat {
    /// The glyph alone, colored by status
    #[default]
    DotOnly,
    /// The glyph followed by the parent status word, e.g. "● NOK"
    DotPlusWord,
}

/// Maps a resolved status to what a cell displays.
///
/// `None` means the cell stays empty.
pub trait Presenter {
    fn present(&self, status: StatusValue, role: Role) -> Option<Display>;
}

/// Status word used for parent operations.
pub fn status_word(status: StatusValue) -> Option<&'static str> {
    match status {
        StatusValue::Red => Some("NOK"),
        StatusValue::Yellow => Some("acceptable"),
        StatusValue::Green => Some("OK"),
        StatusValue::NotApplicable => None,
    }
}

/// The fixed marker table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerPresenter {
    format: MarkerFormat,
    glyph: String,
}

impl MarkerPresenter {
    pub fn new(format: MarkerFormat) -> Self {
        Self {
            format,
            glyph: DEFAULT_MARKER_GLYPH.to_string(),
        }
    }

    pub fn from_config(config: &HeatmapConfig) -> Self {
        Self::new(config.marker_format).with_glyph(config.marker_glyph.clone())
    }

    pub fn with_glyph(mut self, glyph: impl Into<String>) -> Self {
        self.glyph = glyph.into();
        self
    }
}

impl Default for MarkerPresenter {
    fn default() -> Self {
        Self::new(MarkerFormat::default())
    }
}

impl Presenter for MarkerPresenter {
    fn present(&self, status: StatusValue, role: Role) -> Option<Display> {
        let color = DisplayColor::for_status(status)?;
        let word = status_word(status)?;

        let text = match (role, self.format) {
            (Role::Parent, _) => word.to_string(),
            (Role::SubOperation, MarkerFormat::DotOnly) => self.glyph.clone(),
            (Role::SubOperation, MarkerFormat::DotPlusWord) => format!("{} {}", self.glyph, word),
        };

        Some(Display { text, color })
    }
}
