//! Last-one-wins accumulation for scalar fields.
//!
//! When a scalar field occurs several times on the wire, the last occurrence
//! is the field's value. Earlier values are discarded, never blended.

use crate::{Accumulate, MergeResult, Value};

/// Keeps only the most recently observed value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct LastOneWins;

impl Accumulate for LastOneWins {
    /// Returns the last element of `observed`, or `current` unchanged when
    /// nothing was observed.
    fn merge<I>(&self, current: Option<Value>, observed: I) -> MergeResult<Option<Value>>
    where
        I: IntoIterator<Item = Value>,
    {
        Ok(observed.into_iter().last().or(current))
    }
}
