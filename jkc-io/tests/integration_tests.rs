//! Integration tests for the JKC I/O layer

use jkc_io::{
    compress_document, compress_ndjson, compress_paths_document, expand_document,
    inspect_document, read_document, CompressOptions, EnvelopeKind, NestedHandling, OutputStyle,
    PathOptions,
};
use serde_json::{json, Value};
use std::fs::{self, File};
use std::io::{BufReader, Cursor};
use tempfile::tempdir;

fn sample_records(count: usize) -> Value {
    Value::Array(
        (0..count)
            .map(|i| {
                json!({
                    "identifier": i,
                    "displayName": format!("User {i}"),
                    "address": {"streetName": "Main", "postalCode": format!("{i:05}")},
                    "orders": [{"orderId": i * 10, "amount": 1.5}]
                })
            })
            .collect(),
    )
}

#[test]
fn file_round_trip_through_envelope() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("records.json");
    let packed_path = dir.path().join("records.jkc.json");
    let restored_path = dir.path().join("restored.json");

    let records = sample_records(50);
    fs::write(&input_path, records.to_string()).unwrap();

    let stats = compress_document(
        File::open(&input_path).unwrap(),
        File::create(&packed_path).unwrap(),
        &CompressOptions::default(),
        OutputStyle::Compact,
    )
    .unwrap();
    assert!(stats.compressed_bytes < stats.original_bytes);
    assert!(stats.table_entries >= 6);

    expand_document(
        File::open(&packed_path).unwrap(),
        File::create(&restored_path).unwrap(),
        OutputStyle::Pretty,
    )
    .unwrap();

    let restored = read_document(File::open(&restored_path).unwrap()).unwrap();
    assert_eq!(restored, records);
}

#[test]
fn ndjson_input_compresses_as_one_array() {
    let lines = "{\"firstName\":\"John\"}\n{\"firstName\":\"Jane\"}\n";
    let mut out = Vec::new();
    compress_document(
        Cursor::new(lines),
        &mut out,
        &CompressOptions::default(),
        OutputStyle::Compact,
    )
    .unwrap();

    let wire: Value = serde_json::from_slice(&out).unwrap();
    assert_eq!(wire["data"], json!([{"a": "John"}, {"a": "Jane"}]));
}

#[test]
fn shallow_option_reaches_the_wire() {
    let opts = CompressOptions {
        nested_handling: NestedHandling::Shallow,
        ..CompressOptions::default()
    };
    let mut out = Vec::new();
    compress_document(
        Cursor::new(sample_records(2).to_string()),
        &mut out,
        &opts,
        OutputStyle::Compact,
    )
    .unwrap();

    let wire: Value = serde_json::from_slice(&out).unwrap();
    assert!(wire["data"][0]
        .as_object()
        .unwrap()
        .values()
        .any(|value| value.get("streetName").is_some()));
}

#[test]
fn batch_stream_to_file_and_back() {
    let dir = tempdir().unwrap();
    let input_path = dir.path().join("events.ndjson");
    let output_path = dir.path().join("events.jkc.ndjson");

    let lines: String = (0..10)
        .map(|i| format!("{{\"eventName\":\"click\",\"sequence\":{i}}}\n"))
        .collect();
    fs::write(&input_path, &lines).unwrap();

    let mut batches = 0;
    compress_ndjson(
        BufReader::new(File::open(&input_path).unwrap()),
        File::create(&output_path).unwrap(),
        4,
        &CompressOptions::default(),
        |_| batches += 1,
    )
    .unwrap();
    assert_eq!(batches, 3);

    let written = fs::read_to_string(&output_path).unwrap();
    let mut sequence = Vec::new();
    for line in written.lines() {
        let wire: Value = serde_json::from_str(line).unwrap();
        let restored = jkc_codec::expand_value(&wire).unwrap();
        for record in restored.as_array().unwrap() {
            sequence.push(record["sequence"].as_u64().unwrap());
        }
    }
    assert_eq!(sequence, (0..10).collect::<Vec<u64>>());
}

#[test]
fn inspect_path_addressed_envelope() {
    let response = json!({
        "data": {
            "repository": {
                "issues": [{"title": "a", "labels": []}, {"title": "b", "labels": []}]
            }
        }
    });
    let mut out = Vec::new();
    compress_paths_document(
        Cursor::new(response.to_string()),
        &mut out,
        &PathOptions::default(),
        OutputStyle::Compact,
    )
    .unwrap();

    let inspection = inspect_document(Cursor::new(out)).unwrap();
    assert_eq!(inspection.kind, EnvelopeKind::PathAddressed);
    assert_eq!(inspection.paths.len(), 1);
    assert_eq!(inspection.paths[0].to_string(), "data.repository.issues");
    assert!(inspection.table.alias_of("title").is_some());
    assert!(inspection.pattern.is_none());
}

#[test]
fn inspect_rejects_plain_json() {
    assert!(inspect_document(Cursor::new("[{\"title\":\"a\"}]")).is_err());
}
