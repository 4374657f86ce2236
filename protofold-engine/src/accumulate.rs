//! The accumulation strategies.
//!
//! An accumulator folds zero or more newly observed values for one field
//! into that field's stored value. Accumulators carry no state between
//! calls: everything lives in the `current` value passed in and the value
//! handed back, so one instance can serve any number of messages.
//!
//! Three strategies exist, fixed per field when its schema is built:
//!
//! - [`LastOneWins`]: scalar fields; the last observation replaces the value
//! - [`Sequence`]: repeated fields; observations are appended in order
//! - [`MessageMerge`]: embedded messages; merged field by field, recursively

use crate::{LastOneWins, MergeError, MergeResult, MessageMerge, Sequence, Value};

/// Folds observed values into a stored value.
///
/// Results compose left to right: merging `a` then `b` gives the same value
/// as merging `a` followed by `b` in a single call.
pub trait Accumulate {
    /// Merges `observed`, in order, into `current` and returns the new value.
    fn merge<I>(&self, current: Option<Value>, observed: I) -> MergeResult<Option<Value>>
    where
        I: IntoIterator<Item = Value>;
}

/// The strategy a field uses, chosen once at schema-build time.
#[derive(Debug, Clone)]
pub enum Accumulator {
    LastOneWins(LastOneWins),
    Sequence(Sequence),
    MessageMerge(MessageMerge),
}

impl Accumulator {
    /// Merges one already-stored field value into another.
    ///
    /// Used when whole messages are merged. An absent `incoming` value leaves
    /// `current` untouched. For a repeated field the incoming container's
    /// elements are the observations; every other strategy observes the
    /// incoming value itself.
    pub fn merge_stored(
        &self,
        current: Option<Value>,
        incoming: Option<Value>,
    ) -> MergeResult<Option<Value>> {
        let mut slot = current;
        self.merge_stored_into(&mut slot, incoming)?;
        Ok(slot)
    }

    /// In-place form of [`Accumulator::merge_stored`].
    pub(crate) fn merge_stored_into(
        &self,
        slot: &mut Option<Value>,
        incoming: Option<Value>,
    ) -> MergeResult<()> {
        let Some(incoming) = incoming else {
            return Ok(());
        };
        match (self, incoming) {
            (Self::Sequence(sequence), Value::Repeated(items)) => sequence.extend_into(slot, items),
            (_, incoming) => self.merge_into(slot, [incoming]),
        }
    }

    /// Merges `observed` into a stored field slot, in place.
    ///
    /// A value that does not fit the strategy fails before the slot is
    /// touched, so the stored value survives the error. Messages observed
    /// before a failing one stay merged.
    pub(crate) fn merge_into<I>(&self, slot: &mut Option<Value>, observed: I) -> MergeResult<()>
    where
        I: IntoIterator<Item = Value>,
    {
        match self {
            Self::LastOneWins(_) => {
                if let Some(last) = observed.into_iter().last() {
                    *slot = Some(last);
                }
                Ok(())
            }
            Self::Sequence(sequence) => sequence.extend_into(slot, observed),
            Self::MessageMerge(merge) => {
                let mut observed = observed.into_iter().peekable();
                if slot.is_none() && observed.peek().is_none() {
                    return Err(MergeError::NoRightHand);
                }
                for value in observed {
                    merge.merge_into(slot, value)?;
                }
                Ok(())
            }
        }
    }

    /// Short strategy name, for logs.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::LastOneWins(_) => "last_one_wins",
            Self::Sequence(_) => "sequence",
            Self::MessageMerge(_) => "message_merge",
        }
    }
}

impl Accumulate for Accumulator {
    fn merge<I>(&self, current: Option<Value>, observed: I) -> MergeResult<Option<Value>>
    where
        I: IntoIterator<Item = Value>,
    {
        match self {
            Self::LastOneWins(inner) => inner.merge(current, observed),
            Self::Sequence(inner) => inner.merge(current, observed),
            Self::MessageMerge(inner) => inner.merge(current, observed),
        }
    }
}

impl From<LastOneWins> for Accumulator {
    fn from(inner: LastOneWins) -> Self {
        Self::LastOneWins(inner)
    }
}

impl From<Sequence> for Accumulator {
    fn from(inner: Sequence) -> Self {
        Self::Sequence(inner)
    }
}

impl From<MessageMerge> for Accumulator {
    fn from(inner: MessageMerge) -> Self {
        Self::MessageMerge(inner)
    }
}
