use serde::{Deserialize, Serialize};
use std::fmt;
use std::ops::{Add, Div, Mul, Neg, Sub};

const METERS_PER_FOOT: f64 = 0.3048;

/// Unit of a textual linear value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LinearUnit {
    Meters,
    Feet,
}

/// A length, stored in meters
#[derive(Debug, Clone, Copy, Default, PartialEq, PartialOrd, Serialize, Deserialize)]
pub struct LinearDimension {
    meters: f64,
}

impl LinearDimension {
    pub const ZERO: LinearDimension = LinearDimension { meters: 0.0 };

    pub fn from_meters(meters: f64) -> Self {
        Self { meters }
    }

    pub fn from_feet(feet: f64) -> Self {
        Self {
            meters: feet * METERS_PER_FOOT,
        }
    }

    pub fn from_unit(value: f64, unit: LinearUnit) -> Self {
        match unit {
            LinearUnit::Meters => Self::from_meters(value),
            LinearUnit::Feet => Self::from_feet(value),
        }
    }

    pub fn meters(self) -> f64 {
        self.meters
    }

    pub fn feet(self) -> f64 {
        self.meters / METERS_PER_FOOT
    }

    pub fn abs(self) -> Self {
        Self::from_meters(self.meters.abs())
    }

    /// Parse a plain decimal number (`.` separator) in the given unit
    pub fn parse(text: &str, unit: LinearUnit) -> Option<Self> {
        text.trim()
            .parse::<f64>()
            .ok()
            .filter(|value| value.is_finite())
            .map(|value| Self::from_unit(value, unit))
    }
}

impl Add for LinearDimension {
    type Output = LinearDimension;

    fn add(self, rhs: Self) -> Self::Output {
        Self::from_meters(self.meters + rhs.meters)
    }
}

impl Sub for LinearDimension {
    type Output = LinearDimension;

    fn sub(self, rhs: Self) -> Self::Output {
        Self::from_meters(self.meters - rhs.meters)
    }
}

impl Mul<f64> for LinearDimension {
    type Output = LinearDimension;

    fn mul(self, rhs: f64) -> Self::Output {
        Self::from_meters(self.meters * rhs)
    }
}

impl Div<f64> for LinearDimension {
    type Output = LinearDimension;

    fn div(self, rhs: f64) -> Self::Output {
        Self::from_meters(self.meters / rhs)
    }
}

impl Div for LinearDimension {
    type Output = f64;

    fn div(self, rhs: Self) -> Self::Output {
        self.meters / rhs.meters
    }
}

impl Neg for LinearDimension {
    type Output = LinearDimension;

    fn neg(self) -> Self::Output {
        Self::from_meters(-self.meters)
    }
}

impl fmt::Display for LinearDimension {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.3} m", self.meters)
    }
}
