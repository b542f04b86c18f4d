use std::fs;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

use serde_json::{Value, json};
use uuid::Uuid;

fn temp_dir() -> PathBuf {
    let dir = std::env::temp_dir().join(format!("schemaforge-cli-{}", Uuid::new_v4()));
    fs::create_dir_all(&dir).expect("create temp dir");
    dir
}

fn write(dir: &Path, name: &str, value: &Value) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, serde_json::to_vec_pretty(value).expect("encode")).expect("write fixture");
    path
}

fn snapshot() -> Value {
    json!({
        "id": "db",
        "schemas": [{
            "id": "s1",
            "database_id": "db",
            "name": "shop",
            "vendor": "MYSQL",
            "charset": null,
            "collation": null,
            "tables": [{
                "id": "t1",
                "schema_id": "s1",
                "name": "customers",
                "comment": null,
                "columns": [{
                    "id": "c1",
                    "table_id": "t1",
                    "name": "id",
                    "ordinal_position": 1,
                    "data_type": "INT",
                    "length_scale": null,
                    "is_auto_increment": false,
                    "charset": null,
                    "collation": null,
                    "comment": null
                }],
                "indexes": [],
                "constraints": [{
                    "id": "k1",
                    "table_id": "t1",
                    "name": "pk_customers",
                    "kind": "PRIMARY_KEY",
                    "check_expr": null,
                    "default_expr": null,
                    "columns": [{"id": "k1c1", "column_id": "c1", "seq_no": 1}]
                }],
                "relationships": []
            }]
        }]
    })
}

fn run(args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_schemaforge"))
        .args(args)
        .env("RUST_LOG", "off")
        .output()
        .expect("run schemaforge")
}

fn stdout_json(output: &Output) -> Value {
    serde_json::from_slice(&output.stdout).expect("stdout is json")
}

#[test]
fn apply_writes_success_envelope_and_snapshot() {
    let dir = temp_dir();
    let snapshot = write(&dir, "design.json", &snapshot());
    let ops = write(
        &dir,
        "ops.json",
        &json!([
            {"op": "createTable", "schema_id": "s1", "table": {"id": "t2", "name": "orders"}},
            {"op": "createRelationship", "schema_id": "s1", "relationship": {
                "id": "r1",
                "fk_table_id": "t2",
                "pk_table_id": "t1",
                "name": "fk_orders_customers",
                "kind": "IDENTIFYING",
                "columns": [{"id": "m1", "pk_column_id": "c1", "fk_column_id": "c2"}]
            }}
        ]),
    );
    let out = dir.join("result").join("design.json");

    let output = run(&[
        "apply",
        "--snapshot",
        snapshot.to_str().expect("utf8 path"),
        "--ops",
        ops.to_str().expect("utf8 path"),
        "--out",
        out.to_str().expect("utf8 path"),
    ]);
    assert!(output.status.success(), "stderr: {}", String::from_utf8_lossy(&output.stderr));

    let envelope = stdout_json(&output);
    let orders = &envelope["success"]["database"]["schemas"][0]["tables"][1];
    assert_eq!(orders["name"], "orders");
    assert_eq!(orders["columns"][0]["name"], "customers_id");
    assert_eq!(orders["constraints"][0]["kind"], "PRIMARY_KEY");

    let written: Value =
        serde_json::from_str(&fs::read_to_string(&out).expect("read output")).expect("parse output");
    assert_eq!(written, envelope["success"]["database"]);

    let output = run(&["validate", "--snapshot", out.to_str().expect("utf8 path")]);
    assert!(output.status.success());
}

#[test]
fn rejected_batch_reports_failure_envelope() {
    let dir = temp_dir();
    let snapshot = write(&dir, "design.json", &snapshot());
    let ops = write(
        &dir,
        "ops.json",
        &json!([
            {"op": "createTable", "schema_id": "s1", "table": {"id": "t2", "name": "orders"}},
            {"op": "createTable", "schema_id": "s1", "table": {"id": "t3", "name": "orders"}}
        ]),
    );
    let out = dir.join("never.json");

    let output = run(&[
        "apply",
        "--snapshot",
        snapshot.to_str().expect("utf8 path"),
        "--ops",
        ops.to_str().expect("utf8 path"),
        "--out",
        out.to_str().expect("utf8 path"),
    ]);
    assert_eq!(output.status.code(), Some(1));

    let envelope = stdout_json(&output);
    let error = &envelope["failure"]["errors"][0];
    assert_eq!(error["code"], "TABLE_NAME_NOT_UNIQUE");
    assert_eq!(error["details"]["name"], "orders");
    assert!(!out.exists());
}

#[test]
fn config_file_tightens_name_bounds() {
    let dir = temp_dir();
    let snapshot = write(&dir, "design.json", &snapshot());
    let ops = write(
        &dir,
        "ops.json",
        &json!([
            {"op": "changeTableName", "schema_id": "s1", "table_id": "t1", "name": "clients"}
        ]),
    );
    let config = dir.join("forge.toml");
    fs::write(&config, "[naming.table]\nmin = 1\nmax = 4\n").expect("write config");

    let output = run(&[
        "apply",
        "--snapshot",
        snapshot.to_str().expect("utf8 path"),
        "--ops",
        ops.to_str().expect("utf8 path"),
        "--config",
        config.to_str().expect("utf8 path"),
    ]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(stdout_json(&output)["failure"]["errors"][0]["code"], "TABLE_NAME_INVALID");
}

#[test]
fn validate_flags_inconsistent_snapshots() {
    let dir = temp_dir();
    let mut broken = snapshot();
    broken["schemas"][0]["tables"][0]["columns"][0]["ordinal_position"] = json!(3);
    let path = write(&dir, "broken.json", &broken);

    let output = run(&["validate", "--snapshot", path.to_str().expect("utf8 path")]);
    assert_eq!(output.status.code(), Some(1));
    assert_eq!(
        stdout_json(&output)["failure"]["errors"][0]["code"],
        "SEQUENCE_NOT_GAPLESS"
    );
}

#[test]
fn order_lists_key_providers_first() {
    let dir = temp_dir();
    let path = write(&dir, "design.json", &snapshot());

    let output = run(&["order", "--snapshot", path.to_str().expect("utf8 path")]);
    assert!(output.status.success());
    let reports = stdout_json(&output);
    assert_eq!(reports[0]["schema"], "shop");
    assert_eq!(reports[0]["order"], json!(["customers"]));
}
