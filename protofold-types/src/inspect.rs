//! Annotation inspection.
//!
//! Peels container and union wrappers off a declared [`TypeHint`] to find
//! out whether a field is repeated and/or optional. Runs once per field when
//! a schema is built; the result picks the field's accumulation strategy.
//!
//! None of these functions fail: a hint that matches nothing is simply
//! "not repeated" / "not optional".

use crate::{ContainerKind, TypeHint};
use serde::{Deserialize, Serialize};

/// Strips a repeated-container wrapper.
///
/// `list[T]`, `deque[T]`, `iterable[T]` and the open tuple `tuple[T, ...]`
/// yield `(T, true)`. Anything else, including a fixed `tuple[A, B]`, is
/// returned unchanged with `false`.
#[must_use]
pub fn extract_repeated(hint: TypeHint) -> (TypeHint, bool) {
    match hint {
        TypeHint::List(element) | TypeHint::Deque(element) | TypeHint::Iterable(element) => {
            (*element, true)
        }
        TypeHint::Tuple(mut args) if is_open_tuple(&args) => (args.swap_remove(0), true),
        other => (other, false),
    }
}

/// Strips the absent marker from a union.
///
/// `T | None` yields `(T, true)`; `A | B | None` yields `(A | B, true)`.
/// Non-unions, unions without `None`, and a union made only of `None` are
/// returned unchanged with `false`.
#[must_use]
pub fn extract_optional(hint: TypeHint) -> (TypeHint, bool) {
    match hint {
        TypeHint::Union(members)
            if members.iter().any(TypeHint::is_absent)
                && members.iter().any(|member| !member.is_absent()) =>
        {
            let present = members.into_iter().filter(|member| !member.is_absent());
            (TypeHint::union(present), true)
        }
        other => (other, false),
    }
}

/// The container kind a repeated hint accumulates into, or `None` if the
/// hint is not repeated.
///
/// `iterable[T]` names no concrete container, so it maps to `iterable_kind`.
#[must_use]
pub fn repeated_kind(hint: &TypeHint, iterable_kind: ContainerKind) -> Option<ContainerKind> {
    match hint {
        TypeHint::List(_) => Some(ContainerKind::List),
        TypeHint::Deque(_) => Some(ContainerKind::Deque),
        TypeHint::Iterable(_) => Some(iterable_kind),
        TypeHint::Tuple(args) if is_open_tuple(args) => Some(ContainerKind::Tuple),
        _ => None,
    }
}

fn is_open_tuple(args: &[TypeHint]) -> bool {
    matches!(args, [_, TypeHint::Ellipsis])
}

/// The classified shape of one declared field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldShape {
    /// The type of a single value (the element type for repeated fields).
    pub element: TypeHint,
    /// Container kind, when the field is repeated.
    pub repeated: Option<ContainerKind>,
    pub optional: bool,
}

impl FieldShape {
    #[must_use]
    pub fn is_repeated(&self) -> bool {
        self.repeated.is_some()
    }
}

/// Classifies a declared field type.
///
/// The optional marker is stripped first, then the repeated container, so
/// `list[T] | None` is an optional repeated field of `T`. An optional marker
/// inside the container is left on the element: `list[T | None]` is a
/// repeated field whose element is `T | None`.
#[must_use]
pub fn classify(hint: TypeHint, iterable_kind: ContainerKind) -> FieldShape {
    let (hint, optional) = extract_optional(hint);
    let repeated = repeated_kind(&hint, iterable_kind);
    let (element, _) = extract_repeated(hint);
    FieldShape {
        element,
        repeated,
        optional,
    }
}
