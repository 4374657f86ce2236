//! Field-structural merge of embedded messages.
//!
//! Two instances of the same message type merge field by field: every
//! declared field goes through its own accumulator, so scalars are replaced,
//! repeated fields concatenate and nested messages recurse. A message is
//! never overwritten wholesale, except that merging into an absent message
//! adopts the first right-hand message as-is.
//!
//! Right-hand messages are consumed. Their values may end up inside the
//! result, so callers must not reuse them.

use crate::schema::SchemaLink;
use crate::{Accumulate, MergeError, MergeResult, Message, MessageSchema, Value};
use std::sync::Arc;

/// Merges messages of one schema.
#[derive(Debug, Clone)]
pub struct MessageMerge {
    schema: SchemaLink,
}

impl MessageMerge {
    /// Creates a merger for messages of `schema`.
    #[must_use]
    pub fn new(schema: Arc<MessageSchema>) -> Self {
        Self {
            schema: SchemaLink::Owned(schema),
        }
    }

    pub(crate) fn linked(schema: SchemaLink) -> Self {
        Self { schema }
    }

    /// Name of the message type this merger is bound to.
    #[must_use]
    pub fn type_name(&self) -> &str {
        self.schema.name()
    }

    /// The schema this merger is bound to.
    ///
    /// Fails with [`MergeError::UnresolvedSchema`] only for a recursive
    /// reference whose schema has been dropped.
    pub fn schema(&self) -> MergeResult<Arc<MessageSchema>> {
        self.schema
            .resolve()
            .ok_or_else(|| MergeError::UnresolvedSchema(self.type_name().to_string()))
    }

    /// Merges every `rhs` message, in order, into `lhs`.
    ///
    /// # Errors
    ///
    /// - [`MergeError::AbsentRightHand`] if any `rhs` item is `None`
    /// - [`MergeError::NoRightHand`] if `lhs` is `None` and `rhs` is empty
    /// - [`MergeError::SchemaMismatch`] for a message of another type, or of
    ///   a same-named type with a different field layout
    ///
    /// There is no rollback: items merged before a failing item stay merged.
    pub fn merge_messages<I>(&self, lhs: Option<Message>, rhs: I) -> MergeResult<Message>
    where
        I: IntoIterator<Item = Option<Message>>,
    {
        let schema = self.schema()?;
        if let Some(lhs) = &lhs {
            check_schema(&schema, lhs)?;
        }

        let mut lhs = lhs;
        for item in rhs {
            let other = item.ok_or(MergeError::AbsentRightHand)?;
            check_schema(&schema, &other)?;
            lhs = Some(match lhs {
                None => other,
                Some(mut target) => {
                    target.absorb(other)?;
                    target
                }
            });
        }

        lhs.ok_or(MergeError::NoRightHand)
    }

    /// Merges one message value into a stored field slot, in place.
    ///
    /// An absent slot adopts `incoming`. A type or schema mismatch is
    /// reported before the slot is touched.
    pub(crate) fn merge_into(&self, slot: &mut Option<Value>, incoming: Value) -> MergeResult<()> {
        let other = match incoming {
            Value::Message(other) => other,
            other => return Err(mismatch(&other)),
        };
        let schema = self.schema()?;
        check_schema(&schema, &other)?;

        match slot.as_mut() {
            Some(Value::Message(target)) => {
                check_schema(&schema, target)?;
                target.absorb(*other)
            }
            Some(current) => Err(mismatch(current)),
            None => {
                *slot = Some(Value::Message(other));
                Ok(())
            }
        }
    }
}

fn check_schema(expected: &MessageSchema, message: &Message) -> MergeResult<()> {
    if expected.is_compatible(message.schema()) {
        Ok(())
    } else {
        Err(MergeError::SchemaMismatch {
            expected: expected.name().to_string(),
            found: message.schema().name().to_string(),
        })
    }
}

fn mismatch(value: &Value) -> MergeError {
    MergeError::TypeMismatch {
        expected: "message",
        found: value.kind_name(),
    }
}

impl Accumulate for MessageMerge {
    /// Merges observed [`Value::Message`]s into `current`.
    ///
    /// Observations are checked before anything is merged, so a
    /// [`MergeError::TypeMismatch`] leaves no partial result behind.
    fn merge<I>(&self, current: Option<Value>, observed: I) -> MergeResult<Option<Value>>
    where
        I: IntoIterator<Item = Value>,
    {
        let lhs = current.map(into_message).transpose()?;
        let rhs = observed
            .into_iter()
            .map(|value| into_message(value).map(Some))
            .collect::<MergeResult<Vec<_>>>()?;
        let merged = self.merge_messages(lhs, rhs)?;
        Ok(Some(Value::from(merged)))
    }
}

fn into_message(value: Value) -> MergeResult<Message> {
    match value {
        Value::Message(message) => Ok(*message),
        other => Err(mismatch(&other)),
    }
}
