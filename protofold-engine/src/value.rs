//! Stored field values.
//!
//! The wire decoder hands the engine native values, never bytes. [`Value`]
//! is the closed set of those values; [`Repeated`] holds the ordered
//! container of a repeated field.

use crate::Message;
use protofold_types::ContainerKind;
use serde::{Serialize, Serializer};
use std::collections::VecDeque;
use std::sync::Arc;

/// A decoded field value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Value {
    Bool(bool),
    Int32(i32),
    Int64(i64),
    UInt32(u32),
    UInt64(u64),
    Float(f32),
    Double(f64),
    String(String),
    Bytes(Vec<u8>),
    Enum(i32),
    Message(Box<Message>),
    Repeated(Repeated),
}

impl Value {
    /// Short name of the variant, for error messages.
    #[must_use]
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Bool(_) => "bool",
            Self::Int32(_) => "int32",
            Self::Int64(_) => "int64",
            Self::UInt32(_) => "uint32",
            Self::UInt64(_) => "uint64",
            Self::Float(_) => "float",
            Self::Double(_) => "double",
            Self::String(_) => "string",
            Self::Bytes(_) => "bytes",
            Self::Enum(_) => "enum",
            Self::Message(_) => "message",
            Self::Repeated(_) => "repeated",
        }
    }

    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any signed integer variant widened to `i64`.
    #[must_use]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int32(v) | Self::Enum(v) => Some(i64::from(*v)),
            Self::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any unsigned integer variant widened to `u64`.
    #[must_use]
    pub fn as_u64(&self) -> Option<u64> {
        match self {
            Self::UInt32(v) => Some(u64::from(*v)),
            Self::UInt64(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(v) => Some(f64::from(*v)),
            Self::Double(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Self::Bytes(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_message(&self) -> Option<&Message> {
        match self {
            Self::Message(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_repeated(&self) -> Option<&Repeated> {
        match self {
            Self::Repeated(v) => Some(v),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_message(self) -> Option<Message> {
        match self {
            Self::Message(v) => Some(*v),
            _ => None,
        }
    }

    #[must_use]
    pub fn into_repeated(self) -> Option<Repeated> {
        match self {
            Self::Repeated(v) => Some(v),
            _ => None,
        }
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::$variant(v)
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => Int32,
    i64 => Int64,
    u32 => UInt32,
    u64 => UInt64,
    f32 => Float,
    f64 => Double,
    String => String,
    Vec<u8> => Bytes,
    Repeated => Repeated,
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::String(v.to_string())
    }
}

impl From<Message> for Value {
    fn from(v: Message) -> Self {
        Self::Message(Box::new(v))
    }
}

/// The ordered container of a repeated field.
///
/// Order is always first-observed-first-appended.
#[derive(Debug, Clone, PartialEq)]
pub enum Repeated {
    List(Vec<Value>),
    Deque(VecDeque<Value>),
    /// Immutable; [`Repeated::extended`] builds a fresh tuple.
    Tuple(Arc<[Value]>),
}

impl Repeated {
    /// Creates an empty container of the given kind.
    #[must_use]
    pub fn empty(kind: ContainerKind) -> Self {
        match kind {
            ContainerKind::List => Self::List(Vec::new()),
            ContainerKind::Deque => Self::Deque(VecDeque::new()),
            ContainerKind::Tuple => Self::Tuple(Arc::from(Vec::new())),
        }
    }

    /// Collects values into a container of the given kind.
    #[must_use]
    pub fn collect(kind: ContainerKind, values: impl IntoIterator<Item = Value>) -> Self {
        Self::empty(kind).extended(values)
    }

    #[must_use]
    pub fn kind(&self) -> ContainerKind {
        match self {
            Self::List(_) => ContainerKind::List,
            Self::Deque(_) => ContainerKind::Deque,
            Self::Tuple(_) => ContainerKind::Tuple,
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        match self {
            Self::List(v) => v.len(),
            Self::Deque(v) => v.len(),
            Self::Tuple(v) => v.len(),
        }
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Iterates the elements front to back.
    pub fn iter(&self) -> impl Iterator<Item = &Value> + '_ {
        let empty: &[Value] = &[];
        let (front, back) = match self {
            Self::List(v) => (v.as_slice(), empty),
            Self::Deque(v) => v.as_slices(),
            Self::Tuple(v) => (&v[..], empty),
        };
        front.iter().chain(back)
    }

    /// Appends `values` at the end, keeping this container's kind.
    ///
    /// Lists and deques grow in place; a tuple is rebuilt as its old
    /// elements followed by `values`.
    #[must_use]
    pub fn extended(self, values: impl IntoIterator<Item = Value>) -> Self {
        match self {
            Self::List(mut v) => {
                v.extend(values);
                Self::List(v)
            }
            Self::Deque(mut v) => {
                v.extend(values);
                Self::Deque(v)
            }
            Self::Tuple(v) => Self::Tuple(v.iter().cloned().chain(values).collect()),
        }
    }

    /// Copies the elements into a `Vec`.
    #[must_use]
    pub fn to_vec(&self) -> Vec<Value> {
        self.iter().cloned().collect()
    }
}

impl IntoIterator for Repeated {
    type Item = Value;
    type IntoIter = std::vec::IntoIter<Value>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            Self::List(v) => v.into_iter(),
            Self::Deque(v) => Vec::from(v).into_iter(),
            Self::Tuple(v) => v.to_vec().into_iter(),
        }
    }
}

impl Serialize for Repeated {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_seq(self.iter())
    }
}
