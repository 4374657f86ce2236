//! Message schemas.
//!
//! A [`MessageSchema`] is built once per message type and then shared. Each
//! declared field becomes a [`FieldDescriptor`] holding the field's
//! accumulator, chosen from the field's classified type:
//!
//! | declared type            | accumulator            |
//! |--------------------------|------------------------|
//! | repeated (any element)   | `Sequence(kind)`       |
//! | embedded message         | `MessageMerge(schema)` |
//! | scalar                   | `LastOneWins`          |
//!
//! Fields are stored in ascending field-number order; a field's position in
//! that order is its slot index in every [`Message`] of the schema.
//!
//! A message type may contain itself through a repeated or optional field
//! (`Node { children: list[Node] }`). Such back references are held weakly
//! and bound once the referenced schema is built; see [`SchemaLink`].

use crate::{
    Accumulator, LastOneWins, Message, MessageMerge, SchemaConfig, SchemaError, SchemaResult,
    Sequence,
};
use protofold_types::{ContainerKind, FieldNumber, FieldShape, TypeHint, classify};
use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, OnceLock, Weak};
use tracing::debug;

/// A schema that is referenced before it has finished building.
pub(crate) type PendingSchema = Arc<OnceLock<Weak<MessageSchema>>>;

/// How a field reaches the schema of its embedded message type.
#[derive(Clone)]
pub(crate) enum SchemaLink {
    Owned(Arc<MessageSchema>),
    /// Back reference into a recursive type. Weak, so recursive schemas do
    /// not keep themselves alive.
    Recursive { name: String, slot: PendingSchema },
}

impl SchemaLink {
    pub(crate) fn name(&self) -> &str {
        match self {
            Self::Owned(schema) => schema.name(),
            Self::Recursive { name, .. } => name,
        }
    }

    pub(crate) fn resolve(&self) -> Option<Arc<MessageSchema>> {
        match self {
            Self::Owned(schema) => Some(Arc::clone(schema)),
            Self::Recursive { slot, .. } => slot.get().and_then(Weak::upgrade),
        }
    }
}

impl fmt::Debug for SchemaLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Owned(_) => write!(f, "Owned({:?})", self.name()),
            Self::Recursive { name, .. } => write!(f, "Recursive({name:?})"),
        }
    }
}

/// One declared field of a message type.
#[derive(Debug, Clone)]
pub struct FieldDescriptor {
    number: FieldNumber,
    name: String,
    hint: TypeHint,
    element: TypeHint,
    repeated: Option<ContainerKind>,
    optional: bool,
    message_type: Option<SchemaLink>,
    accumulator: Accumulator,
    index: usize,
    one_of: Option<usize>,
}

impl FieldDescriptor {
    #[must_use]
    pub fn number(&self) -> FieldNumber {
        self.number
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The type as declared.
    #[must_use]
    pub fn hint(&self) -> &TypeHint {
        &self.hint
    }

    /// The type of one value, with optional and repeated wrappers removed.
    #[must_use]
    pub fn element(&self) -> &TypeHint {
        &self.element
    }

    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.repeated.is_some()
    }

    /// Container kind of a repeated field.
    #[must_use]
    pub fn container(&self) -> Option<ContainerKind> {
        self.repeated
    }

    #[must_use]
    pub fn is_optional(&self) -> bool {
        self.optional
    }

    /// Schema of the embedded message type, for message and repeated
    /// message fields.
    ///
    /// `None` for scalar fields, and for a recursive reference whose schema
    /// has since been dropped.
    #[must_use]
    pub fn message_type(&self) -> Option<Arc<MessageSchema>> {
        self.message_type.as_ref().and_then(SchemaLink::resolve)
    }

    #[must_use]
    pub fn accumulator(&self) -> &Accumulator {
        &self.accumulator
    }

    /// Slot index within messages of the owning schema.
    #[must_use]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Index of the oneof group this field belongs to, if any.
    #[must_use]
    pub fn one_of(&self) -> Option<usize> {
        self.one_of
    }
}

/// A set of mutually exclusive fields.
///
/// At most one member is present on a message at any time; merging into or
/// setting a member clears the others.
#[derive(Debug, Clone)]
pub struct OneofGroup {
    name: String,
    members: Vec<usize>,
}

impl OneofGroup {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Slot indices of the member fields, ascending.
    #[must_use]
    pub fn members(&self) -> &[usize] {
        &self.members
    }
}

/// The schema of one message type.
#[derive(Debug)]
pub struct MessageSchema {
    name: String,
    fields: Vec<FieldDescriptor>,
    by_number: HashMap<u32, usize>,
    by_name: HashMap<String, usize>,
    one_ofs: Vec<OneofGroup>,
    config: SchemaConfig,
}

impl MessageSchema {
    /// Starts declaring a message type.
    #[must_use]
    pub fn builder(name: impl Into<String>) -> SchemaBuilder {
        SchemaBuilder::new(name)
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Field descriptors in ascending field-number order.
    #[must_use]
    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    #[must_use]
    pub fn field_by_number(&self, number: u32) -> Option<&FieldDescriptor> {
        self.by_number.get(&number).map(|&index| &self.fields[index])
    }

    #[must_use]
    pub fn field_by_name(&self, name: &str) -> Option<&FieldDescriptor> {
        self.by_name.get(name).map(|&index| &self.fields[index])
    }

    #[must_use]
    pub fn one_ofs(&self) -> &[OneofGroup] {
        &self.one_ofs
    }

    #[must_use]
    pub fn one_of(&self, name: &str) -> Option<&OneofGroup> {
        self.one_ofs.iter().find(|group| group.name == name)
    }

    /// The group a field belongs to.
    #[must_use]
    pub fn group_of(&self, field: &FieldDescriptor) -> Option<&OneofGroup> {
        field.one_of.map(|index| &self.one_ofs[index])
    }

    #[must_use]
    pub fn config(&self) -> &SchemaConfig {
        &self.config
    }

    /// Creates an empty message of this type.
    #[must_use]
    pub fn new_message(self: &Arc<Self>) -> Message {
        Message::new(Arc::clone(self))
    }

    /// The accumulator that merges whole messages of this type.
    #[must_use]
    pub fn merger(self: &Arc<Self>) -> MessageMerge {
        MessageMerge::new(Arc::clone(self))
    }

    /// Returns true if messages of `other` can be merged slot by slot into
    /// messages of this schema: same type name and the same fields, in the
    /// same order, with the same declared types.
    #[must_use]
    pub fn is_compatible(&self, other: &MessageSchema) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.name == other.name
            && self.fields.len() == other.fields.len()
            && self.fields.iter().zip(&other.fields).all(|(a, b)| {
                a.number == b.number
                    && a.name == b.name
                    && a.hint == b.hint
                    && a.repeated == b.repeated
            })
    }
}

/// Declarative construction of a [`MessageSchema`].
///
/// ```ignore
/// let point = MessageSchema::builder("Point")
///     .field(1, "x", ScalarType::SInt32)
///     .field(2, "y", ScalarType::SInt32)
///     .build()?;
/// let shape = MessageSchema::builder("Shape")
///     .register(&point)
///     .field(1, "points", "list[Point]".parse::<TypeHint>()?)
///     .build()?;
/// ```
#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    config: SchemaConfig,
    fields: Vec<PendingField>,
    one_ofs: Vec<(String, Vec<u32>)>,
    known: HashMap<String, SchemaLink>,
}

#[derive(Debug, Clone)]
struct PendingField {
    number: u32,
    name: String,
    hint: TypeHint,
}

impl SchemaBuilder {
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            config: SchemaConfig::default(),
            fields: Vec::new(),
            one_ofs: Vec::new(),
            known: HashMap::new(),
        }
    }

    #[must_use]
    pub fn config(mut self, config: SchemaConfig) -> Self {
        self.config = config;
        self
    }

    /// Makes a message type resolvable by name in field hints.
    ///
    /// The schema's own name needs no registration: a repeated or optional
    /// field of the type being built refers back to it.
    #[must_use]
    pub fn register(mut self, schema: &Arc<MessageSchema>) -> Self {
        self.known.insert(
            schema.name().to_string(),
            SchemaLink::Owned(Arc::clone(schema)),
        );
        self
    }

    /// Makes a message type that is still being built resolvable by name.
    pub(crate) fn register_pending(mut self, name: &str, slot: &PendingSchema) -> Self {
        self.known.insert(
            name.to_string(),
            SchemaLink::Recursive {
                name: name.to_string(),
                slot: Arc::clone(slot),
            },
        );
        self
    }

    /// Declares a field.
    #[must_use]
    pub fn field(mut self, number: u32, name: impl Into<String>, hint: impl Into<TypeHint>) -> Self {
        self.fields.push(PendingField {
            number,
            name: name.into(),
            hint: hint.into(),
        });
        self
    }

    /// Declares a oneof group over already or later declared field numbers.
    #[must_use]
    pub fn one_of(mut self, name: impl Into<String>, numbers: impl IntoIterator<Item = u32>) -> Self {
        self.one_ofs
            .push((name.into(), numbers.into_iter().collect()));
        self
    }

    /// Validates the declaration and builds the schema.
    pub fn build(self) -> SchemaResult<Arc<MessageSchema>> {
        let Self {
            name,
            config,
            mut fields,
            one_ofs,
            known,
        } = self;

        fields.sort_by_key(|field| field.number);
        let own = PendingSchema::default();

        let mut descriptors = Vec::with_capacity(fields.len());
        let mut by_number = HashMap::with_capacity(fields.len());
        let mut by_name = HashMap::with_capacity(fields.len());

        for (index, pending) in fields.into_iter().enumerate() {
            let number = FieldNumber::new(pending.number)?;
            if by_number.insert(pending.number, index).is_some() {
                return Err(SchemaError::DuplicateNumber {
                    message: name,
                    number: pending.number,
                });
            }
            if by_name.insert(pending.name.clone(), index).is_some() {
                return Err(SchemaError::DuplicateName {
                    message: name,
                    field: pending.name,
                });
            }
            let context = Context {
                message: &name,
                config: &config,
                known: &known,
                own: &own,
            };
            descriptors.push(context.describe(number, pending, index)?);
        }

        let mut groups = Vec::with_capacity(one_ofs.len());
        for (group_name, numbers) in one_ofs {
            if groups.iter().any(|group: &OneofGroup| group.name == group_name) {
                return Err(SchemaError::DuplicateOneof {
                    message: name,
                    group: group_name,
                });
            }
            let group_index = groups.len();
            let mut members = Vec::with_capacity(numbers.len());
            for number in numbers {
                let Some(&index) = by_number.get(&number) else {
                    return Err(SchemaError::OneofUnknownField {
                        message: name,
                        group: group_name,
                        number,
                    });
                };
                let descriptor: &mut FieldDescriptor = &mut descriptors[index];
                if descriptor.is_repeated() {
                    return Err(SchemaError::OneofRepeatedField {
                        message: name,
                        group: group_name,
                        field: descriptor.name.clone(),
                    });
                }
                match descriptor.one_of {
                    Some(previous) if previous == group_index => {
                        return Err(SchemaError::DuplicateOneofMember {
                            message: name,
                            group: group_name,
                            field: descriptor.name.clone(),
                        });
                    }
                    Some(previous) => {
                        return Err(SchemaError::OneofConflict {
                            message: name,
                            field: descriptor.name.clone(),
                            first: groups[previous].name.clone(),
                            second: group_name,
                        });
                    }
                    None => {}
                }
                descriptor.one_of = Some(group_index);
                members.push(index);
            }
            members.sort_unstable();
            groups.push(OneofGroup {
                name: group_name,
                members,
            });
        }

        debug!(
            message = %name,
            fields = descriptors.len(),
            one_ofs = groups.len(),
            "built message schema"
        );

        let schema = Arc::new(MessageSchema {
            name,
            fields: descriptors,
            by_number,
            by_name,
            one_ofs: groups,
            config,
        });
        // Fresh slot, so this cannot already be set.
        let _ = own.set(Arc::downgrade(&schema));
        Ok(schema)
    }
}

/// What a field declaration is resolved against.
struct Context<'a> {
    message: &'a str,
    config: &'a SchemaConfig,
    known: &'a HashMap<String, SchemaLink>,
    own: &'a PendingSchema,
}

impl Context<'_> {
    /// Classifies one field and selects its accumulator.
    fn describe(
        &self,
        number: FieldNumber,
        pending: PendingField,
        index: usize,
    ) -> SchemaResult<FieldDescriptor> {
        let shape = classify(pending.hint.clone(), self.config.iterable_container);

        let message_type = match &shape.element {
            TypeHint::Scalar(_) => None,
            TypeHint::Message(type_name) => Some(self.link(type_name, &pending, &shape)?),
            _ => {
                return Err(SchemaError::UnsupportedType {
                    message: self.message.to_string(),
                    field: pending.name,
                    hint: pending.hint.to_string(),
                });
            }
        };

        let accumulator = match (shape.repeated, &message_type) {
            (Some(kind), _) => Accumulator::from(Sequence::new(kind)),
            (None, Some(link)) => Accumulator::from(MessageMerge::linked(link.clone())),
            (None, None) => Accumulator::from(LastOneWins),
        };

        Ok(FieldDescriptor {
            number,
            name: pending.name,
            hint: pending.hint,
            element: shape.element,
            repeated: shape.repeated,
            optional: shape.optional,
            message_type,
            accumulator,
            index,
            one_of: None,
        })
    }

    fn link(
        &self,
        type_name: &str,
        pending: &PendingField,
        shape: &FieldShape,
    ) -> SchemaResult<SchemaLink> {
        if let Some(link) = self.known.get(type_name) {
            return Ok(link.clone());
        }
        if type_name != self.message {
            return Err(SchemaError::UnknownMessageType {
                message: self.message.to_string(),
                field: pending.name.clone(),
                type_name: type_name.to_string(),
            });
        }
        // A singular, non-optional field of the type itself can never end.
        if !shape.is_repeated() && !shape.optional {
            return Err(SchemaError::CyclicSchema(type_name.to_string()));
        }
        Ok(SchemaLink::Recursive {
            name: type_name.to_string(),
            slot: Arc::clone(self.own),
        })
    }
}
