//! Dynamometer resource types.
//!
//! A dyno has a hard weight ceiling, a type tag and an optional availability
//! window (maintenance schedule). Which vehicle traction
//! types a dyno type accepts is decided by the
//! [`CompatibilityTable`](crate::matcher::CompatibilityTable), never here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Dyno identifier (catalog primary key)
pub type DynoId = u64;

// ============================================================================
// DynoType
// ============================================================================

/// Equipment classification of a dyno.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct DynoType(String);

impl DynoType {
    pub const TWO_WHEEL: &'static str = "two-wheel";
    pub const FOUR_WHEEL: &'static str = "four-wheel";
    pub const ALL_WHEEL: &'static str = "all-wheel";
    /// Wildcard rig accepting any drivetrain the table lists it for
    pub const ANY: &'static str = "any";

    /// Create a tag, normalizing case and surrounding whitespace
    pub fn new(tag: impl AsRef<str>) -> Self {
        Self(tag.as_ref().trim().to_ascii_lowercase())
    }

    pub fn two_wheel() -> Self {
        Self::new(Self::TWO_WHEEL)
    }

    pub fn four_wheel() -> Self {
        Self::new(Self::FOUR_WHEEL)
    }

    pub fn all_wheel() -> Self {
        Self::new(Self::ALL_WHEEL)
    }

    pub fn any() -> Self {
        Self::new(Self::ANY)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for DynoType {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

impl From<DynoType> for String {
    fn from(tag: DynoType) -> Self {
        tag.0
    }
}

impl fmt::Display for DynoType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Dyno
// ============================================================================

/// A dynamometer test resource.
///
/// ## Example
///
/// ```
/// use dyno_allocator::types::{Dyno, DynoType};
///
/// let dyno = Dyno::new(1, "D1", 2000, DynoType::four_wheel());
/// assert!(dyno.enabled);
/// assert!(dyno.supports_weight(2000));
/// assert!(!dyno.supports_weight(2001));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Dyno {
    /// Unique dyno identifier
    pub id: DynoId,

    /// Display name
    pub name: String,

    /// Maximum supported vehicle weight (inclusive)
    pub max_weight: u64,

    /// Equipment type
    #[serde(rename = "type")]
    pub kind: DynoType,

    /// Disabled dynos are kept in the catalog but never matched
    #[serde(default = "enabled_by_default")]
    pub enabled: bool,

    /// Unix ms from which the dyno may be booked; open if absent
    #[serde(default)]
    pub available_from: Option<u64>,

    /// Unix ms after which the dyno is out of service; open if absent
    #[serde(default)]
    pub available_to: Option<u64>,
}

fn enabled_by_default() -> bool {
    true
}

impl Dyno {
    /// Create a new, enabled dyno
    pub fn new(id: DynoId, name: impl Into<String>, max_weight: u64, kind: DynoType) -> Self {
        Self {
            id,
            name: name.into(),
            max_weight,
            kind,
            enabled: true,
            available_from: None,
            available_to: None,
        }
    }

    /// Builder-style toggle for the enabled flag
    pub fn with_enabled(mut self, enabled: bool) -> Self {
        self.enabled = enabled;
        self
    }

    /// Builder-style availability window, bounds inclusive
    pub fn with_availability(mut self, from: Option<u64>, to: Option<u64>) -> Self {
        self.available_from = from;
        self.available_to = to;
        self
    }

    /// Whether `now_ms` falls inside the availability window
    #[inline]
    pub fn is_available_at(&self, now_ms: u64) -> bool {
        self.available_from.map_or(true, |from| from <= now_ms)
            && self.available_to.map_or(true, |to| now_ms <= to)
    }

    /// Capacity is a hard ceiling
    #[inline]
    pub fn supports_weight(&self, weight: u64) -> bool {
        weight <= self.max_weight
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
