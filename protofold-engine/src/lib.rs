//! Field-value accumulation for protofold messages.
//!
//! When a message is decoded, each field may show up zero, one or many times
//! on the wire. This crate folds those observations into the message's
//! stored values, and merges whole decoded messages into one:
//!
//! - [`LastOneWins`]: scalar fields keep the last observed value
//! - [`Sequence`]: repeated fields append, packed or not
//! - [`MessageMerge`]: embedded messages merge field by field, recursively,
//!   keeping oneof groups exclusive
//!
//! Schemas ([`MessageSchema`], built with [`SchemaBuilder`] or loaded into a
//! [`SchemaRegistry`]) pick each field's strategy once. [`Message`] is the
//! instance type the strategies operate on; [`Message::merge_field`] is the
//! wire decoder's entry point.
//!
//! Everything here is synchronous and in-memory. Schemas and accumulators are
//! immutable and may be shared across threads; a message being merged into
//! is borrowed mutably for the duration of the merge.

mod accumulate;
mod config;
mod error;
mod last_one_wins;
mod message;
mod message_merge;
mod registry;
mod schema;
mod sequence;
mod value;

pub use accumulate::{Accumulate, Accumulator};
pub use config::{SchemaConfig, UnknownFieldPolicy};
pub use error::{MergeError, MergeResult, SchemaError, SchemaResult};
pub use last_one_wins::LastOneWins;
pub use message::Message;
pub use message_merge::MessageMerge;
pub use registry::{FieldDefinition, MessageDefinition, RegistryDocument, SchemaRegistry};
pub use schema::{FieldDescriptor, MessageSchema, OneofGroup, SchemaBuilder};
pub use sequence::Sequence;
pub use value::{Repeated, Value};

pub use protofold_types::{ContainerKind, FieldNumber, ScalarType, TypeHint};
