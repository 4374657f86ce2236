//! Message instances.
//!
//! A [`Message`] stores one optional value per declared field, in a dense
//! slot table laid out by its schema. Field access by name or number goes
//! through the schema's lookup tables; there is no per-message reflection.

use crate::{
    FieldDescriptor, MergeError, MergeResult, MessageSchema, UnknownFieldPolicy, Value,
};
use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// An instance of a message type.
#[derive(Clone)]
pub struct Message {
    schema: Arc<MessageSchema>,
    slots: Vec<Option<Value>>,
}

impl Message {
    /// Creates a message with every field absent.
    #[must_use]
    pub fn new(schema: Arc<MessageSchema>) -> Self {
        let slots = vec![None; schema.fields().len()];
        Self { schema, slots }
    }

    #[must_use]
    pub fn schema(&self) -> &Arc<MessageSchema> {
        &self.schema
    }

    /// Returns a field's value, or `None` if absent or not declared.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.schema
            .field_by_name(name)
            .and_then(|field| self.slots[field.index()].as_ref())
    }

    #[must_use]
    pub fn get_by_number(&self, number: u32) -> Option<&Value> {
        self.schema
            .field_by_number(number)
            .and_then(|field| self.slots[field.index()].as_ref())
    }

    /// Returns true if the field is declared and present.
    #[must_use]
    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Returns true if no field is present.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.slots.iter().all(Option::is_none)
    }

    /// Sets a field, clearing the other members of its oneof group.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> MergeResult<()> {
        let schema = Arc::clone(&self.schema);
        let field = lookup(&schema, name)?;
        self.slots[field.index()] = Some(value.into());
        self.keep_one_of_member(&schema, field);
        Ok(())
    }

    /// Consuming form of [`Message::set`], for building messages inline.
    pub fn with(mut self, name: &str, value: impl Into<Value>) -> MergeResult<Self> {
        self.set(name, value)?;
        Ok(self)
    }

    /// Removes a field's value and returns it.
    pub fn take(&mut self, name: &str) -> MergeResult<Option<Value>> {
        let index = lookup(&self.schema, name)?.index();
        Ok(self.slots[index].take())
    }

    pub fn clear(&mut self, name: &str) -> MergeResult<()> {
        self.take(name).map(drop)
    }

    /// Name of the present member of a oneof group.
    #[must_use]
    pub fn which_one_of(&self, group: &str) -> Option<&str> {
        let group = self.schema.one_of(group)?;
        group
            .members()
            .iter()
            .find(|&&index| self.slots[index].is_some())
            .map(|&index| self.schema.fields()[index].name())
    }

    /// Iterates declared fields in ascending field-number order.
    pub fn fields(&self) -> impl Iterator<Item = (&FieldDescriptor, Option<&Value>)> + '_ {
        self.schema
            .fields()
            .iter()
            .zip(self.slots.iter().map(Option::as_ref))
    }

    /// Folds newly decoded values for one field into the message.
    ///
    /// This is the wire decoder's entry point: `observed` is a single value
    /// for an unpacked occurrence, or a whole batch for a packed one. Returns
    /// `false` when the field number is unknown and the schema's
    /// [`UnknownFieldPolicy`] is `Skip`.
    pub fn merge_field<I>(&mut self, number: u32, observed: I) -> MergeResult<bool>
    where
        I: IntoIterator<Item = Value>,
    {
        let schema = Arc::clone(&self.schema);
        let Some(field) = schema.field_by_number(number) else {
            return match schema.config().unknown_fields {
                UnknownFieldPolicy::Reject => Err(MergeError::UnknownField {
                    message: schema.name().to_string(),
                    field: number.to_string(),
                }),
                UnknownFieldPolicy::Skip => {
                    warn!(message = %schema.name(), number, "skipping unknown field");
                    Ok(false)
                }
            };
        };

        field
            .accumulator()
            .merge_into(&mut self.slots[field.index()], observed)?;
        self.keep_one_of_member(&schema, field);
        Ok(true)
    }

    /// Merges another message of the same type into this one.
    ///
    /// `other` is consumed; see [`MessageMerge`](crate::MessageMerge). Its
    /// schema must be [compatible](MessageSchema::is_compatible) with this
    /// message's.
    pub fn merge_from(&mut self, other: Message) -> MergeResult<()> {
        if !self.schema.is_compatible(&other.schema) {
            return Err(MergeError::SchemaMismatch {
                expected: self.schema.name().to_string(),
                found: other.schema.name().to_string(),
            });
        }
        self.absorb(other)
    }

    /// Field-by-field merge of `other` into `self`, schemas already checked.
    ///
    /// Fields are merged in place; on error, fields merged so far keep their
    /// new values and the failing field keeps its old one.
    pub(crate) fn absorb(&mut self, other: Message) -> MergeResult<()> {
        let schema = Arc::clone(&self.schema);
        for (field, incoming) in schema.fields().iter().zip(other.slots) {
            trace!(
                message = %schema.name(),
                field = field.name(),
                strategy = field.accumulator().name(),
                "merging field"
            );
            field
                .accumulator()
                .merge_stored_into(&mut self.slots[field.index()], incoming)?;
            self.keep_one_of_member(&schema, field);
        }
        Ok(())
    }

    /// Serializes the present fields to a JSON object keyed by field name.
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }

    /// If `field` is present and in a oneof group, clears the rest of the
    /// group.
    fn keep_one_of_member(&mut self, schema: &MessageSchema, field: &FieldDescriptor) {
        if self.slots[field.index()].is_none() {
            return;
        }
        let Some(group) = schema.group_of(field) else {
            return;
        };
        for &index in group.members() {
            if index != field.index() && self.slots[index].take().is_some() {
                debug!(
                    message = %schema.name(),
                    one_of = group.name(),
                    kept = field.name(),
                    cleared = schema.fields()[index].name(),
                    "cleared oneof member"
                );
            }
        }
    }
}

fn lookup<'s>(schema: &'s MessageSchema, name: &str) -> MergeResult<&'s FieldDescriptor> {
    schema
        .field_by_name(name)
        .ok_or_else(|| MergeError::UnknownField {
            message: schema.name().to_string(),
            field: name.to_string(),
        })
}

impl PartialEq for Message {
    fn eq(&self, other: &Self) -> bool {
        self.schema.is_compatible(&other.schema) && self.slots == other.slots
    }
}

impl fmt::Debug for Message {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = f.debug_struct(self.schema.name());
        for (field, value) in self.fields() {
            if let Some(value) = value {
                out.field(field.name(), value);
            }
        }
        out.finish()
    }
}

impl Serialize for Message {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let present = self.slots.iter().filter(|slot| slot.is_some()).count();
        let mut map = serializer.serialize_map(Some(present))?;
        for (field, value) in self.fields() {
            if let Some(value) = value {
                map.serialize_entry(field.name(), value)?;
            }
        }
        map.end()
    }
}
