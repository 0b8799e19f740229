//! End-to-end pipeline tests through the library API: detection, streaming,
//! and profiling against real files on disk.

use apache_avro::{Schema, Writer, types::Value as AvroValue};
use assert_cmd::Command;
use encoding_rs::UTF_8;
use predicates::str::contains;

use tabscan::{
    detect,
    profile::{ProfileOptions, profile},
};

mod common;
use common::{ORDERS_CSV, TestWorkspace};

#[test]
fn csv_pipeline_produces_expected_statistics() {
    let ws = TestWorkspace::new();
    let path = ws.write("orders.csv", ORDERS_CSV);
    let stream = detect::open_stream(&path, None, UTF_8).expect("open stream");
    let report = profile(stream, &ProfileOptions::default()).expect("profile");

    assert_eq!(report.row_count, 4);
    assert_eq!(report.coverage.len(), 3);

    let amount = &report.coverage[0];
    assert_eq!(amount.name, "amount");
    assert_eq!(amount.count, 3);
    assert!((amount.percent - 75.0).abs() < 1e-9);
    assert!(amount.summary.contains("1 NULL"));
    assert!(amount.summary.contains("min: 5.25"));
    assert!(amount.summary.contains("max: 20"));

    let id = &report.coverage[1];
    assert_eq!(id.name, "id");
    assert!(id.summary.contains("mean: 2.5"));

    let frequency = report.frequency.expect("frequency section");
    assert_eq!(frequency.columns.len(), 1);
    let entries = frequency.columns[0].entries.as_ref().expect("entries");
    assert_eq!(entries[0].value, "open");
    assert_eq!(entries[0].count, 2);
    assert!((entries[0].percent - 50.0).abs() < 1e-9);
}

#[test]
fn csv_pipeline_is_deterministic_across_runs() {
    let ws = TestWorkspace::new();
    let path = ws.write("orders.csv", ORDERS_CSV);
    let run = || {
        let stream = detect::open_stream(&path, None, UTF_8).expect("open stream");
        profile(stream, &ProfileOptions::default()).expect("profile")
    };
    let first = run();
    let second = run();
    assert_eq!(
        serde_json::to_string(&first).expect("serialize"),
        serde_json::to_string(&second).expect("serialize")
    );
}

const AVRO_SCHEMA: &str = r#"{
    "type": "record",
    "name": "event",
    "fields": [
        {"name": "seq", "type": "long"},
        {"name": "kind", "type": "string"},
        {"name": "score", "type": ["null", "double"], "default": null}
    ]
}"#;

fn write_avro(ws: &TestWorkspace, name: &str, rows: &[(i64, &str, Option<f64>)]) -> std::path::PathBuf {
    let schema = Schema::parse_str(AVRO_SCHEMA).expect("schema");
    let mut writer = Writer::new(&schema, Vec::new());
    for (seq, kind, score) in rows {
        writer
            .append(AvroValue::Record(vec![
                ("seq".to_string(), AvroValue::Long(*seq)),
                ("kind".to_string(), AvroValue::String(kind.to_string())),
                (
                    "score".to_string(),
                    match score {
                        Some(value) => AvroValue::Union(1, Box::new(AvroValue::Double(*value))),
                        None => AvroValue::Union(0, Box::new(AvroValue::Null)),
                    },
                ),
            ]))
            .expect("append record");
    }
    let bytes = writer.into_inner().expect("finish container");
    ws.write_bytes(name, &bytes)
}

#[test]
fn avro_pipeline_profiles_records_and_nulls() {
    let ws = TestWorkspace::new();
    let path = write_avro(
        &ws,
        "events.avro",
        &[
            (1, "click", Some(0.5)),
            (2, "click", None),
            (3, "view", Some(1.5)),
        ],
    );
    let stream = detect::open_stream(&path, None, UTF_8).expect("open stream");
    let report = profile(stream, &ProfileOptions::default()).expect("profile");

    assert_eq!(report.row_count, 3);
    assert_eq!(report.file_info, "Avro, 3 fields");
    let kind = report
        .coverage
        .iter()
        .find(|entry| entry.name == "kind")
        .expect("kind column");
    assert_eq!(kind.count, 3);
    let score = report
        .coverage
        .iter()
        .find(|entry| entry.name == "score")
        .expect("score column");
    assert_eq!(score.count, 2);
    assert!(score.summary.contains("1 NULL"));
    assert!(score.summary.contains("mean: 1"));
}

#[test]
fn avro_detection_beats_misleading_extension() {
    let ws = TestWorkspace::new();
    let path = write_avro(&ws, "events.csv", &[(1, "click", None)]);
    let stream = detect::open_stream(&path, None, UTF_8).expect("open stream");
    let report = profile(stream, &ProfileOptions::default()).expect("profile");
    assert_eq!(report.file_info, "Avro, 3 fields");
}

#[test]
fn empty_avro_container_reports_no_data_via_cli() {
    let ws = TestWorkspace::new();
    let path = write_avro(&ws, "empty.avro", &[]);
    Command::cargo_bin("tabscan")
        .expect("binary exists")
        .arg(path.to_str().unwrap())
        .assert()
        .success()
        .stdout(contains("No data found"));
}
