//! Error types for schema building and merging.

use thiserror::Error;

/// Result type for merge operations.
pub type MergeResult<T> = Result<T, MergeError>;

/// Result type for schema construction.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// Errors raised while merging values or messages.
///
/// These are contract violations by the caller, never transient faults.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MergeError {
    /// A right-hand message item was absent.
    #[error("right-hand side messages must not be absent")]
    AbsentRightHand,

    /// A message merge ended with nothing to return.
    #[error("there must be at least one right-hand side message")]
    NoRightHand,

    /// The message type has no such field.
    #[error("message `{message}` has no field `{field}`")]
    UnknownField { message: String, field: String },

    /// A message of another type was handed to a message merge.
    #[error("expected a `{expected}` message, found `{found}`")]
    SchemaMismatch { expected: String, found: String },

    /// A recursive message type was dropped while a reference to it was
    /// still in use.
    #[error("message type `{0}` is no longer available")]
    UnresolvedSchema(String),

    /// A value's variant does not fit the field's strategy.
    #[error("expected {expected} value, found {found}")]
    TypeMismatch {
        expected: &'static str,
        found: &'static str,
    },
}

/// Errors raised while building a message schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error(transparent)]
    Type(#[from] protofold_types::Error),

    #[error("invalid schema document: {0}")]
    Document(#[from] serde_json::Error),

    #[error("message `{message}`: duplicate field number {number}")]
    DuplicateNumber { message: String, number: u32 },

    #[error("message `{message}`: duplicate field name `{field}`")]
    DuplicateName { message: String, field: String },

    #[error("message `{message}`: field `{field}` has unsupported type `{hint}`")]
    UnsupportedType {
        message: String,
        field: String,
        hint: String,
    },

    #[error("message `{message}`: field `{field}` refers to unknown message type `{type_name}`")]
    UnknownMessageType {
        message: String,
        field: String,
        type_name: String,
    },

    #[error("message `{message}`: duplicate oneof `{group}`")]
    DuplicateOneof { message: String, group: String },

    #[error("message `{message}`: oneof `{group}` names unknown field {number}")]
    OneofUnknownField {
        message: String,
        group: String,
        number: u32,
    },

    #[error("message `{message}`: oneof `{group}` member `{field}` is repeated")]
    OneofRepeatedField {
        message: String,
        group: String,
        field: String,
    },

    #[error("message `{message}`: oneof `{group}` lists field `{field}` twice")]
    DuplicateOneofMember {
        message: String,
        group: String,
        field: String,
    },

    #[error("message `{message}`: field `{field}` is in both oneof `{first}` and `{second}`")]
    OneofConflict {
        message: String,
        field: String,
        first: String,
        second: String,
    },

    #[error("duplicate message type `{0}`")]
    DuplicateMessage(String),

    /// The type contains itself through singular, non-optional fields
    /// only, so no finite message of it exists.
    #[error("message type `{0}` embeds itself")]
    CyclicSchema(String),
}
