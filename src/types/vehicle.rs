//! Vehicle types for the dyno allocation engine.
//!
//! ## Traction Tags
//!
//! Traction types are open string tags rather than a closed enum so new
//! drivetrain classes can be introduced through the compatibility table
//! without touching matching code. The well-known tags have constructors.
//!
//! ## Weight
//!
//! Weights are plain `u64` mass units (the catalog uses pounds). A vehicle
//! weight of zero is rejected when the catalog is built.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Vehicle identifier (catalog primary key)
pub type VehicleId = u64;

// ============================================================================
// TractionType
// ============================================================================

/// Drivetrain classification of a vehicle.
///
/// Stored lowercase so `"AWD"`-style inputs from different catalogs compare
/// equal once normalized by [`TractionType::new`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct TractionType(String);

impl TractionType {
    /// Two-wheel drive
    pub const TWO_WHEEL: &'static str = "two-wheel";
    /// Four-wheel drive
    pub const FOUR_WHEEL: &'static str = "four-wheel";
    /// All-wheel drive
    pub const ALL_WHEEL: &'static str = "all-wheel";

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

    /// The normalized tag
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for TractionType {
    fn from(tag: String) -> Self {
        Self::new(tag)
    }
}

impl From<TractionType> for String {
    fn from(tag: TractionType) -> Self {
        tag.0
    }
}

impl fmt::Display for TractionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

// ============================================================================
// Vehicle
// ============================================================================

/// A vehicle that can be submitted for a dyno test.
///
/// ## Example
///
/// ```
/// use dyno_allocator::types::{TractionType, Vehicle};
///
/// let vehicle = Vehicle::new(1, "F-150 prototype", 1800, TractionType::four_wheel());
/// assert_eq!(vehicle.weight, 1800);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vehicle {
    /// Unique vehicle identifier
    pub id: VehicleId,

    /// Display name (VIN or build label)
    pub name: String,

    /// Test weight in mass units, always positive
    pub weight: u64,

    /// Drivetrain classification
    pub traction: TractionType,
}

impl Vehicle {
    /// Create a new vehicle
    pub fn new(id: VehicleId, name: impl Into<String>, weight: u64, traction: TractionType) -> Self {
        Self {
            id,
            name: name.into(),
            weight,
            traction,
        }
    }
}

// ============================================================================
// Unit Tests
// ============================================================================
