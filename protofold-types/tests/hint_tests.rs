use pretty_assertions::assert_eq;
use protofold_types::{ContainerKind, Error, ScalarType, TypeHint};

fn parse(s: &str) -> TypeHint {
    s.parse().unwrap()
}

fn int32() -> TypeHint {
    TypeHint::scalar(ScalarType::Int32)
}

// ── Parsing ──────────────────────────────────────────────────────

#[test]
fn parses_scalars() {
    for scalar in ScalarType::ALL {
        assert_eq!(parse(scalar.name()), TypeHint::Scalar(scalar));
    }
}

#[test]
fn non_scalar_name_is_message() {
    assert_eq!(parse("Point"), TypeHint::message("Point"));
    assert_eq!(parse("geo.Point"), TypeHint::message("geo.Point"));
}

#[test]
fn parses_containers() {
    assert_eq!(parse("list[int32]"), TypeHint::list(int32()));
    assert_eq!(parse("deque[int32]"), TypeHint::deque(int32()));
    assert_eq!(parse("iterable[int32]"), TypeHint::iterable(int32()));
    assert_eq!(parse("List[int32]"), TypeHint::list(int32()));
}

#[test]
fn parses_tuples() {
    assert_eq!(parse("tuple[int32, ...]"), TypeHint::open_tuple(int32()));
    assert_eq!(
        parse("tuple[int32, string]"),
        TypeHint::Tuple(vec![int32(), TypeHint::scalar(ScalarType::String)])
    );
}

#[test]
fn parses_unions() {
    assert_eq!(
        parse("int32 | None"),
        TypeHint::Union(vec![int32(), TypeHint::Absent])
    );
    assert_eq!(parse("optional[int32]"), parse("int32 | None"));
    assert_eq!(parse("None"), TypeHint::Absent);
}

#[test]
fn nested_unions_flatten() {
    assert_eq!(
        parse("optional[int32 | string]"),
        TypeHint::Union(vec![
            int32(),
            TypeHint::scalar(ScalarType::String),
            TypeHint::Absent,
        ])
    );
}

#[test]
fn parses_nested_containers() {
    assert_eq!(
        parse("list[Point | None] | None"),
        TypeHint::optional(TypeHint::list(TypeHint::optional(TypeHint::message("Point"))))
    );
}

#[test]
fn whitespace_is_ignored() {
    assert_eq!(parse("  list [ int32 ]  "), TypeHint::list(int32()));
}

#[test]
fn rejects_malformed() {
    for bad in ["", "list[", "list[int32", "list[]", "int32 |", "list[int32, int32]", "foo[int32]", "int32 int32", "int32 ; x", "."] {
        let result = bad.parse::<TypeHint>();
        assert!(
            matches!(result, Err(Error::InvalidTypeHint(_))),
            "{bad:?} should not parse, got {result:?}"
        );
    }
}

// ── Display ──────────────────────────────────────────────────────

#[test]
fn display_is_canonical() {
    assert_eq!(parse("List[ int32 ]").to_string(), "list[int32]");
    assert_eq!(parse("optional[Point]").to_string(), "Point | None");
    assert_eq!(parse("tuple[bytes,...]").to_string(), "tuple[bytes, ...]");
}

#[test]
fn display_parses_back() {
    for text in [
        "deque[sint64]",
        "tuple[int32, string]",
        "list[Point | None] | None",
        "iterable[geo.Point]",
    ] {
        assert_eq!(parse(&parse(text).to_string()), parse(text));
    }
}

// ── Constructors ─────────────────────────────────────────────────

#[test]
fn union_of_one_is_unwrapped() {
    assert_eq!(TypeHint::union([int32()]), int32());
}

#[test]
fn message_name() {
    assert_eq!(TypeHint::message("Point").message_name(), Some("Point"));
    assert_eq!(int32().message_name(), None);
}

#[test]
fn scalar_from_name() {
    assert_eq!(ScalarType::from_name("uint64"), Some(ScalarType::UInt64));
    assert_eq!(ScalarType::from_name("Point"), None);
}

// ── serde ────────────────────────────────────────────────────────

#[test]
fn hint_serializes_as_string() {
    let hint = TypeHint::optional(TypeHint::deque(int32()));
    assert_eq!(serde_json::to_string(&hint).unwrap(), "\"deque[int32] | None\"");
    let back: TypeHint = serde_json::from_str("\"deque[int32] | None\"").unwrap();
    assert_eq!(back, hint);
}

#[test]
fn bad_hint_fails_to_deserialize() {
    assert!(serde_json::from_str::<TypeHint>("\"list[\"").is_err());
}

#[test]
fn container_kind_serde() {
    assert_eq!(serde_json::to_string(&ContainerKind::Deque).unwrap(), "\"deque\"");
    assert_eq!(ContainerKind::default(), ContainerKind::List);
}

#[test]
fn message_names_walks_nested_hints() {
    let hint = parse("list[Point | Line] | None");
    assert_eq!(hint.message_names(), vec!["Point", "Line"]);
    assert!(int32().message_names().is_empty());
}

#[test]
fn scalar_serde_names_match_hint_syntax() {
    for scalar in ScalarType::ALL {
        let json = serde_json::to_string(&scalar).unwrap();
        assert_eq!(json, format!("\"{}\"", scalar.name()));
    }
}
