//! Sequence accumulation for repeated fields.
//!
//! Unpacked delivery (one value per wire entry) and packed delivery (a whole
//! batch from one length-delimited block) look the same here: a batch of
//! newly observed values, appended in order.

use crate::{Accumulate, MergeError, MergeResult, Repeated, Value};
use protofold_types::ContainerKind;

/// Appends observations to an ordered container.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sequence {
    kind: ContainerKind,
}

impl Sequence {
    /// Creates an accumulator that starts new containers of `kind`.
    #[must_use]
    pub const fn new(kind: ContainerKind) -> Self {
        Self { kind }
    }

    /// The container kind used when the field has no value yet.
    #[must_use]
    pub const fn kind(&self) -> ContainerKind {
        self.kind
    }

    /// Appends `observed` to the container in `slot`, in place.
    ///
    /// A slot holding anything but a container is left as it was.
    pub(crate) fn extend_into<I>(&self, slot: &mut Option<Value>, observed: I) -> MergeResult<()>
    where
        I: IntoIterator<Item = Value>,
    {
        let container = match slot.take() {
            None => Repeated::empty(self.kind),
            Some(Value::Repeated(container)) => container,
            Some(other) => {
                let found = other.kind_name();
                *slot = Some(other);
                return Err(MergeError::TypeMismatch {
                    expected: "repeated",
                    found,
                });
            }
        };
        *slot = Some(Value::Repeated(container.extended(observed)));
        Ok(())
    }
}

impl Accumulate for Sequence {
    /// Appends every element of `observed` to `current`.
    ///
    /// An absent `current` starts an empty container of the configured kind;
    /// an existing container keeps its own kind.
    fn merge<I>(&self, current: Option<Value>, observed: I) -> MergeResult<Option<Value>>
    where
        I: IntoIterator<Item = Value>,
    {
        let mut slot = current;
        self.extend_into(&mut slot, observed)?;
        Ok(slot)
    }
}
