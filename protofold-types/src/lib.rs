//! Core type definitions for protofold.
//!
//! This crate defines the vocabulary the accumulation engine is built on,
//! with no merge logic of its own:
//! - [`FieldNumber`]: validated wire field numbers
//! - [`TypeHint`]: declared field types, with a textual syntax
//! - [`ContainerKind`]: the ordered containers a repeated field can use
//! - The annotation inspector ([`extract_repeated`], [`extract_optional`],
//!   [`classify`]) which decides, once at schema-build time, whether a field
//!   is repeated and/or optional.

mod hint;
mod inspect;
mod number;

pub use hint::{ContainerKind, ScalarType, TypeHint};
pub use inspect::{FieldShape, classify, extract_optional, extract_repeated, repeated_kind};
pub use number::FieldNumber;

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("invalid field number: {0} (expected 1..={max})", max = FieldNumber::MAX)]
    InvalidFieldNumber(u32),

    #[error("invalid type hint: {0}")]
    InvalidTypeHint(String),
}
