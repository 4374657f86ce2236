//! Field numbers as carried on the wire.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// A field number, unique within one message type.
///
/// Valid numbers are `1..=536_870_911` (the 29 bits left in a wire tag once
/// the wire type is packed in).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u32", into = "u32")]
pub struct FieldNumber(u32);

impl FieldNumber {
    /// Smallest valid field number.
    pub const MIN: u32 = 1;
    /// Largest valid field number.
    pub const MAX: u32 = (1 << 29) - 1;

    /// Validates and wraps a raw field number.
    pub fn new(number: u32) -> Result<Self> {
        if (Self::MIN..=Self::MAX).contains(&number) {
            Ok(Self(number))
        } else {
            Err(Error::InvalidFieldNumber(number))
        }
    }

    /// Returns the raw number.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl TryFrom<u32> for FieldNumber {
    type Error = Error;

    fn try_from(number: u32) -> Result<Self> {
        Self::new(number)
    }
}

impl From<FieldNumber> for u32 {
    fn from(number: FieldNumber) -> Self {
        number.0
    }
}

impl fmt::Display for FieldNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
