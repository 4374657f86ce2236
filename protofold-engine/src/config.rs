//! Schema configuration.

use protofold_types::ContainerKind;
use serde::{Deserialize, Serialize};

/// Settings applied when a schema is built and when its messages are fed
/// decoded values.
///
/// Every field has a default, so a partial JSON object (or none at all)
/// is a valid configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchemaConfig {
    /// Container used for `iterable[T]` fields, which name none themselves.
    pub iterable_container: ContainerKind,
    /// What [`Message::merge_field`](crate::Message::merge_field) does with
    /// field numbers the schema does not declare.
    pub unknown_fields: UnknownFieldPolicy,
}

/// Handling of field numbers missing from the schema.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownFieldPolicy {
    /// Fail with [`MergeError::UnknownField`](crate::MergeError::UnknownField).
    #[default]
    Reject,
    /// Log and drop the values.
    Skip,
}
