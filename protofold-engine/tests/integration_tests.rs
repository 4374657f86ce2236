//! End-to-end decoding scenarios.
//!
//! A toy decoder walks a list of wire records and feeds each one to the
//! engine, the way a real protobuf decoder would after reading a tag.

use pretty_assertions::assert_eq;
use protofold_engine::{MergeResult, Message, SchemaRegistry, Value};
use serde_json::json;

const REGISTRY: &str = r#"{
    "messages": [
        { "name": "Header", "fields": [
            { "number": 1, "name": "source", "type": "string" },
            { "number": 2, "name": "sequence", "type": "uint64" },
            { "number": 3, "name": "labels", "type": "list[string]" }
        ] },
        { "name": "Reading", "fields": [
            { "number": 1, "name": "sensor", "type": "uint32" },
            { "number": 2, "name": "samples", "type": "list[sint32]" },
            { "number": 3, "name": "celsius", "type": "double", "one_of": "unit" },
            { "number": 4, "name": "kelvin", "type": "double", "one_of": "unit" }
        ] },
        { "name": "Batch", "fields": [
            { "number": 1, "name": "header", "type": "Header" },
            { "number": 2, "name": "readings", "type": "list[Reading]" },
            { "number": 3, "name": "note", "type": "optional[string]" }
        ] }
    ]
}"#;

/// One decoded wire record: a field number and what its payload decoded to.
enum Record {
    /// A single value from an unpacked occurrence.
    Scalar(u32, Value),
    /// A whole packed run.
    Packed(u32, Vec<Value>),
    /// An embedded message, itself a list of records.
    Nested(u32, &'static str, Vec<Record>),
}

fn decode(registry: &SchemaRegistry, type_name: &str, records: Vec<Record>) -> MergeResult<Message> {
    let Some(mut message) = registry.new_message(type_name) else {
        panic!("unknown type {type_name}");
    };
    for record in records {
        match record {
            Record::Scalar(number, value) => {
                message.merge_field(number, [value])?;
            }
            Record::Packed(number, values) => {
                message.merge_field(number, values)?;
            }
            Record::Nested(number, nested_type, nested) => {
                let nested = decode(registry, nested_type, nested)?;
                message.merge_field(number, [Value::from(nested)])?;
            }
        }
    }
    Ok(message)
}

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("protofold_engine=trace")
        .with_test_writer()
        .try_init();
}

fn registry() -> SchemaRegistry {
    SchemaRegistry::from_json(REGISTRY).unwrap()
}

fn sint32s(values: &[i32]) -> Vec<Value> {
    values.iter().copied().map(Value::from).collect()
}

#[test]
fn split_header_occurrences_merge() {
    init_tracing();
    let registry = registry();

    let batch = decode(
        &registry,
        "Batch",
        vec![
            Record::Nested(
                1,
                "Header",
                vec![
                    Record::Scalar(1, "sensor-a".into()),
                    Record::Scalar(3, "outdoor".into()),
                ],
            ),
            Record::Scalar(3, "first".into()),
            Record::Nested(
                1,
                "Header",
                vec![
                    Record::Scalar(2, 42u64.into()),
                    Record::Scalar(3, "north".into()),
                ],
            ),
            Record::Scalar(3, "second".into()),
        ],
    )
    .unwrap();

    assert_eq!(
        batch.to_json().unwrap(),
        json!({
            "header": {
                "source": "sensor-a",
                "sequence": 42,
                "labels": ["outdoor", "north"],
            },
            "note": "second",
        })
    );
}

#[test]
fn readings_concatenate_and_samples_pack() {
    init_tracing();
    let registry = registry();

    let batch = decode(
        &registry,
        "Batch",
        vec![
            Record::Nested(
                2,
                "Reading",
                vec![
                    Record::Scalar(1, 7u32.into()),
                    Record::Packed(2, sint32s(&[1, 2])),
                    Record::Scalar(2, 3i32.into()),
                    Record::Scalar(3, 21.5f64.into()),
                ],
            ),
            Record::Nested(
                2,
                "Reading",
                vec![
                    Record::Scalar(1, 8u32.into()),
                    Record::Scalar(3, 19.0f64.into()),
                    Record::Scalar(4, 292.15f64.into()),
                ],
            ),
        ],
    )
    .unwrap();

    assert_eq!(
        batch.to_json().unwrap(),
        json!({
            "readings": [
                { "sensor": 7, "samples": [1, 2, 3], "celsius": 21.5 },
                { "sensor": 8, "kelvin": 292.15 },
            ],
        })
    );

    let readings = batch.get("readings").and_then(Value::as_repeated).unwrap();
    let second = readings.iter().nth(1).and_then(Value::as_message).unwrap();
    assert_eq!(second.which_one_of("unit"), Some("kelvin"));
}

#[test]
fn concatenated_encodings_equal_merged_messages() {
    init_tracing();
    let registry = registry();

    let first = vec![
        Record::Scalar(1, 1u32.into()),
        Record::Packed(2, sint32s(&[1])),
        Record::Scalar(3, 20.0f64.into()),
    ];
    let second = vec![
        Record::Packed(2, sint32s(&[2, 3])),
        Record::Scalar(4, 300.0f64.into()),
    ];
    let both = vec![
        Record::Scalar(1, 1u32.into()),
        Record::Packed(2, sint32s(&[1])),
        Record::Scalar(3, 20.0f64.into()),
        Record::Packed(2, sint32s(&[2, 3])),
        Record::Scalar(4, 300.0f64.into()),
    ];

    let mut merged = decode(&registry, "Reading", first).unwrap();
    merged
        .merge_from(decode(&registry, "Reading", second).unwrap())
        .unwrap();
    let concatenated = decode(&registry, "Reading", both).unwrap();

    assert_eq!(merged, concatenated);
    assert_eq!(merged.which_one_of("unit"), Some("kelvin"));
}

#[test]
fn unknown_record_fails_decode() {
    init_tracing();
    let registry = registry();
    let err = decode(&registry, "Header", vec![Record::Scalar(9, 1i32.into())]).unwrap_err();
    assert_eq!(err.to_string(), "message `Header` has no field `9`");
}
