//! Schema registry.
//!
//! Builds a family of message schemas from declarative definitions, usually
//! loaded from JSON:
//!
//! ```json
//! {
//!   "config": { "unknown_fields": "skip" },
//!   "messages": [
//!     { "name": "Point", "fields": [
//!       { "number": 1, "name": "x", "type": "sint32" },
//!       { "number": 2, "name": "y", "type": "sint32" }
//!     ] },
//!     { "name": "Shape", "fields": [
//!       { "number": 1, "name": "points", "type": "list[Point]" },
//!       { "number": 2, "name": "circle", "type": "Circle", "one_of": "kind" }
//!     ] }
//!   ]
//! }
//! ```
//!
//! Definitions may appear in any order; embedded message types are built
//! before the types that embed them. Recursive types are allowed as long as
//! every cycle passes through a repeated or optional field
//! (`Node { children: list[Node] }`, `Node { next: Node | None }`); a cycle
//! of singular, non-optional fields only is rejected.

use crate::schema::PendingSchema;
use crate::{Message, MessageSchema, SchemaConfig, SchemaError, SchemaResult};
use protofold_types::{TypeHint, classify};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::debug;

/// A registry document: shared configuration plus message definitions.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RegistryDocument {
    #[serde(default)]
    pub config: SchemaConfig,
    pub messages: Vec<MessageDefinition>,
}

/// Declarative form of one message type.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageDefinition {
    pub name: String,
    #[serde(default)]
    pub fields: Vec<FieldDefinition>,
}

/// Declarative form of one field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    pub number: u32,
    pub name: String,
    #[serde(rename = "type")]
    pub hint: TypeHint,
    /// Name of the oneof group this field belongs to.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub one_of: Option<String>,
}

/// Message schemas by type name.
#[derive(Debug, Clone, Default)]
pub struct SchemaRegistry {
    schemas: HashMap<String, Arc<MessageSchema>>,
}

impl SchemaRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parses a JSON [`RegistryDocument`] and builds every schema in it.
    pub fn from_json(json: &str) -> SchemaResult<Self> {
        let document: RegistryDocument = serde_json::from_str(json)?;
        Self::from_document(document)
    }

    pub fn from_document(document: RegistryDocument) -> SchemaResult<Self> {
        Self::from_definitions(document.messages, &document.config)
    }

    /// Builds every definition, resolving embedded types across them.
    pub fn from_definitions(
        definitions: impl IntoIterator<Item = MessageDefinition>,
        config: &SchemaConfig,
    ) -> SchemaResult<Self> {
        let mut by_name = HashMap::new();
        let mut order = Vec::new();
        for definition in definitions {
            if by_name.contains_key(&definition.name) {
                return Err(SchemaError::DuplicateMessage(definition.name));
            }
            order.push(definition.name.clone());
            by_name.insert(definition.name.clone(), definition);
        }

        check_well_founded(&by_name, &order, config)?;

        let mut resolver = Resolver {
            definitions: &by_name,
            config,
            built: HashMap::with_capacity(by_name.len()),
            visiting: HashMap::new(),
        };
        for name in &order {
            resolver.resolve(name)?;
        }

        debug!(messages = resolver.built.len(), "built schema registry");
        Ok(Self {
            schemas: resolver.built,
        })
    }

    /// Adds an already built schema.
    pub fn insert(&mut self, schema: Arc<MessageSchema>) -> SchemaResult<()> {
        if self.schemas.contains_key(schema.name()) {
            return Err(SchemaError::DuplicateMessage(schema.name().to_string()));
        }
        self.schemas.insert(schema.name().to_string(), schema);
        Ok(())
    }

    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Arc<MessageSchema>> {
        self.schemas.get(name)
    }

    /// Creates an empty message of the named type.
    #[must_use]
    pub fn new_message(&self, name: &str) -> Option<Message> {
        self.get(name).map(MessageSchema::new_message)
    }

    /// Registered type names, sorted.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.schemas.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.schemas.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.schemas.is_empty()
    }
}

/// Rejects cycles made only of singular, non-optional message fields.
///
/// Such a type has no finite instance. Cycles through a repeated or
/// optional field are fine and are bound by [`Resolver`].
fn check_well_founded(
    definitions: &HashMap<String, MessageDefinition>,
    order: &[String],
    config: &SchemaConfig,
) -> SchemaResult<()> {
    // Edges a message must always contain.
    let required: HashMap<&str, Vec<&str>> = definitions
        .iter()
        .map(|(name, definition)| {
            let targets = definition
                .fields
                .iter()
                .filter_map(|field| {
                    let shape = classify(field.hint.clone(), config.iterable_container);
                    if shape.is_repeated() || shape.optional {
                        return None;
                    }
                    shape
                        .element
                        .message_name()
                        .and_then(|target| definitions.get_key_value(target))
                        .map(|(target, _)| target.as_str())
                })
                .collect();
            (name.as_str(), targets)
        })
        .collect();

    let mut done = HashSet::new();
    let mut path = HashSet::new();
    for name in order {
        walk_required(name, &required, &mut path, &mut done)?;
    }
    Ok(())
}

fn walk_required<'a>(
    name: &'a str,
    required: &HashMap<&'a str, Vec<&'a str>>,
    path: &mut HashSet<&'a str>,
    done: &mut HashSet<&'a str>,
) -> SchemaResult<()> {
    if done.contains(name) {
        return Ok(());
    }
    if !path.insert(name) {
        return Err(SchemaError::CyclicSchema(name.to_string()));
    }
    for &target in required.get(name).into_iter().flatten() {
        walk_required(target, required, path, done)?;
    }
    path.remove(name);
    done.insert(name);
    Ok(())
}

/// Depth-first build over the embedding graph.
///
/// A reference to a type still on the build stack is a back edge of a
/// recursive cycle; it is registered as pending and bound once that type is
/// built.
struct Resolver<'a> {
    definitions: &'a HashMap<String, MessageDefinition>,
    config: &'a SchemaConfig,
    built: HashMap<String, Arc<MessageSchema>>,
    visiting: HashMap<String, PendingSchema>,
}

impl Resolver<'_> {
    fn resolve(&mut self, name: &str) -> SchemaResult<Arc<MessageSchema>> {
        if let Some(schema) = self.built.get(name) {
            return Ok(Arc::clone(schema));
        }
        let pending = PendingSchema::default();
        self.visiting.insert(name.to_string(), Arc::clone(&pending));

        let definitions = self.definitions;
        let definition = &definitions[name];
        let mut builder = MessageSchema::builder(&definition.name).config(self.config.clone());
        let mut groups: Vec<(&str, Vec<u32>)> = Vec::new();

        for field in &definition.fields {
            // Names with no definition are left for the builder to report
            // against the field that uses them.
            for type_name in field.hint.message_names() {
                if let Some(slot) = self.visiting.get(type_name) {
                    builder = builder.register_pending(type_name, slot);
                } else if definitions.contains_key(type_name) {
                    let nested = self.resolve(type_name)?;
                    builder = builder.register(&nested);
                }
            }
            builder = builder.field(field.number, &field.name, field.hint.clone());

            if let Some(group) = &field.one_of {
                match groups.iter().position(|(name, _)| *name == group.as_str()) {
                    Some(index) => groups[index].1.push(field.number),
                    None => groups.push((group.as_str(), vec![field.number])),
                }
            }
        }
        for (group, numbers) in groups {
            builder = builder.one_of(group, numbers);
        }

        let schema = builder.build()?;
        // Fresh slot, so this cannot already be set.
        let _ = pending.set(Arc::downgrade(&schema));
        self.visiting.remove(name);
        self.built.insert(name.to_string(), Arc::clone(&schema));
        Ok(schema)
    }
}
