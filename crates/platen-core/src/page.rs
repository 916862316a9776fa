//! Page configuration for binary document layout.
//!
//! A page configuration is the `{size, orientation}` pair handed to the
//! binarizer. Sizes are either one of the rasterizer's named formats or a
//! custom `"<number><unit> <number><unit>"` string (units: in/cm/mm/px).
//! Malformed sizes are rejected, never coerced.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::Error;

/// Page orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Orientation {
    Portrait,
    Landscape,
}

impl Orientation {
    pub fn as_str(self) -> &'static str {
        match self {
            Orientation::Portrait => "portrait",
            Orientation::Landscape => "landscape",
        }
    }

    pub fn is_landscape(self) -> bool {
        self == Orientation::Landscape
    }
}

/// Named page formats understood by the rasterizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StandardSize {
    Letter,
    Legal,
    Tabloid,
    Ledger,
    A0,
    A1,
    A2,
    A3,
    A4,
    A5,
    A6,
}

impl StandardSize {
    pub fn as_str(self) -> &'static str {
        match self {
            StandardSize::Letter => "Letter",
            StandardSize::Legal => "Legal",
            StandardSize::Tabloid => "Tabloid",
            StandardSize::Ledger => "Ledger",
            StandardSize::A0 => "A0",
            StandardSize::A1 => "A1",
            StandardSize::A2 => "A2",
            StandardSize::A3 => "A3",
            StandardSize::A4 => "A4",
            StandardSize::A5 => "A5",
            StandardSize::A6 => "A6",
        }
    }

    /// Case-insensitive match against the named formats. HTTP callers
    /// routinely lowercase, so `"a4"` is accepted as `A4`.
    pub fn parse(s: &str) -> Option<Self> {
        let all = [
            StandardSize::Letter,
            StandardSize::Legal,
            StandardSize::Tabloid,
            StandardSize::Ledger,
            StandardSize::A0,
            StandardSize::A1,
            StandardSize::A2,
            StandardSize::A3,
            StandardSize::A4,
            StandardSize::A5,
            StandardSize::A6,
        ];
        all.into_iter().find(|v| v.as_str().eq_ignore_ascii_case(s))
    }
}

/// Length unit for custom page dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unit {
    In,
    Cm,
    Mm,
    Px,
}

impl Unit {
    pub fn as_str(self) -> &'static str {
        match self {
            Unit::In => "in",
            Unit::Cm => "cm",
            Unit::Mm => "mm",
            Unit::Px => "px",
        }
    }

    const ALL: [Unit; 4] = [Unit::In, Unit::Cm, Unit::Mm, Unit::Px];
}

/// One custom page dimension, e.g. `8.5in`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Dimension {
    pub value: f64,
    pub unit: Unit,
}

impl Dimension {
    fn parse(token: &str) -> Option<Self> {
        let unit = Unit::ALL
            .into_iter()
            .find(|u| token.ends_with(u.as_str()))?;
        let number = &token[..token.len() - unit.as_str().len()];
        let value: f64 = number.parse().ok()?;
        if !value.is_finite() || value <= 0.0 {
            return None;
        }
        Some(Dimension { value, unit })
    }
}

impl fmt::Display for Dimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.value.fract() == 0.0 {
            write!(f, "{}{}", self.value as i64, self.unit.as_str())
        } else {
            write!(f, "{}{}", self.value, self.unit.as_str())
        }
    }
}

/// A document page size: one of the named formats, or a custom
/// width/height pair.
///
/// Serializes to and from the wire string form (`"A4"`, `"8.5in 11in"`).
/// Named formats are recognized first and are never parsed as custom.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum PageSize {
    Standard(StandardSize),
    Custom { width: Dimension, height: Dimension },
}

impl FromStr for PageSize {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Some(standard) = StandardSize::parse(s) {
            return Ok(PageSize::Standard(standard));
        }
        let mut parts = s.split_whitespace();
        match (parts.next(), parts.next(), parts.next()) {
            (Some(w), Some(h), None) => {
                match (Dimension::parse(w), Dimension::parse(h)) {
                    (Some(width), Some(height)) => Ok(PageSize::Custom { width, height }),
                    _ => Err(Error::InvalidPageSize(s.to_string())),
                }
            }
            _ => Err(Error::InvalidPageSize(s.to_string())),
        }
    }
}

impl fmt::Display for PageSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PageSize::Standard(s) => f.write_str(s.as_str()),
            PageSize::Custom { width, height } => write!(f, "{width} {height}"),
        }
    }
}

impl TryFrom<String> for PageSize {
    type Error = Error;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<PageSize> for String {
    fn from(value: PageSize) -> Self {
        value.to_string()
    }
}

/// The `{size, orientation}` pair governing binary-document layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PageConfig {
    pub size: PageSize,
    pub orientation: Orientation,
}

impl Default for PageConfig {
    fn default() -> Self {
        PageConfig {
            size: PageSize::Standard(StandardSize::A4),
            orientation: Orientation::Portrait,
        }
    }
}

/// Resolve caller overrides against a default page configuration.
///
/// Pure override-or-default per field; no hidden state.
pub fn resolve_page_config(
    default: &PageConfig,
    size: Option<PageSize>,
    orientation: Option<Orientation>,
) -> PageConfig {
    PageConfig {
        size: size.unwrap_or_else(|| default.size.clone()),
        orientation: orientation.unwrap_or(default.orientation),
    }
}
