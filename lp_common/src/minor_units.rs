use std::{
    fmt::Display,
    iter::Sum,
    ops::{Add, AddAssign, Sub, SubAssign},
};

use serde::{Deserialize, Serialize};
use sqlx::Type;
use thiserror::Error;

use crate::op;

pub const DEFAULT_CURRENCY_CODE: &str = "INR";

//--------------------------------------     MinorUnits       ---------------------------------------------------------
/// A monetary amount in the smallest unit of its currency (paisa for INR, cents for USD).
///
/// The currency itself is stored alongside the amount, so this type only carries the integer value.
#[derive(Debug, Clone, Copy, Default, Type, PartialEq, Eq, Ord, PartialOrd, Hash, Serialize, Deserialize)]
#[sqlx(transparent)]
#[serde(transparent)]
pub struct MinorUnits(i64);

// Amounts saturate rather than wrap or panic
op!(binary MinorUnits, Add, add => saturating_add);
op!(binary MinorUnits, Sub, sub => saturating_sub);
op!(inplace MinorUnits, AddAssign, add_assign => saturating_add);
op!(inplace MinorUnits, SubAssign, sub_assign => saturating_sub);

impl Sum for MinorUnits {
    fn sum<I: Iterator<Item = Self>>(iter: I) -> Self {
        iter.fold(Self::default(), Add::add)
    }
}

#[derive(Debug, Clone, Error)]
#[error("Value cannot be represented in minor currency units: {0}")]
pub struct MinorUnitsConversionError(String);

impl From<i64> for MinorUnits {
    fn from(value: i64) -> Self {
        Self(value)
    }
}

impl TryFrom<u64> for MinorUnits {
    type Error = MinorUnitsConversionError;

    fn try_from(value: u64) -> Result<Self, Self::Error> {
        if value > i64::MAX as u64 {
            Err(MinorUnitsConversionError(format!("Value {value} is too large to convert to MinorUnits")))
        } else {
            #[allow(clippy::cast_possible_wrap)]
            Ok(Self(value as i64))
        }
    }
}

impl TryFrom<MinorUnits> for u64 {
    type Error = MinorUnitsConversionError;

    fn try_from(value: MinorUnits) -> Result<Self, Self::Error> {
        u64::try_from(value.0).map_err(|_| MinorUnitsConversionError(format!("Negative amount {}", value.0)))
    }
}

/// Formats the amount assuming two decimal places, which holds for every currency the platform sells in.
impl Display for MinorUnits {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.0 < 0 { "-" } else { "" };
        let abs = self.0.unsigned_abs();
        write!(f, "{sign}{}.{:02}", abs / 100, abs % 100)
    }
}

impl MinorUnits {
    pub fn value(&self) -> i64 {
        self.0
    }

    pub fn from_major(major: i64) -> Self {
        Self(major * 100)
    }

    pub fn is_positive(&self) -> bool {
        self.0 > 0
    }
}
