use std::sync::Arc;

use schemaforge_core::{
    Column, Database, DbVendor, Id, LengthScale, Operation, Schema, SchemaEditor, Table,
};
use serde_json::json;

fn fixed_snapshot() -> Database {
    let column = Column {
        id: Id::from("c1"),
        table_id: Id::from("t1"),
        name: "sku".to_string(),
        ordinal_position: 1,
        data_type: Some("VARCHAR".to_string()),
        length_scale: Some(LengthScale::Length(32)),
        is_auto_increment: false,
        charset: None,
        collation: None,
        comment: None,
    };
    let table = Table {
        id: Id::from("t1"),
        schema_id: Id::from("s1"),
        name: "products".to_string(),
        comment: Some("catalog".to_string()),
        columns: vec![column],
        indexes: Vec::new(),
        constraints: Vec::new(),
        relationships: Vec::new(),
    };
    Database {
        id: Id::from("db"),
        schemas: vec![Arc::new(Schema {
            id: Id::from("s1"),
            database_id: Id::from("db"),
            name: "shop".to_string(),
            vendor: DbVendor::Postgresql,
            charset: None,
            collation: None,
            tables: vec![Arc::new(table)],
        })],
    }
}

#[test]
fn serializes_snapshot_deterministically() {
    let value = serde_json::to_value(fixed_snapshot()).expect("serialize snapshot");
    let expected = json!({
        "id": "db",
        "schemas": [{
            "id": "s1",
            "database_id": "db",
            "name": "shop",
            "vendor": "POSTGRESQL",
            "charset": null,
            "collation": null,
            "tables": [{
                "id": "t1",
                "schema_id": "s1",
                "name": "products",
                "comment": "catalog",
                "columns": [{
                    "id": "c1",
                    "table_id": "t1",
                    "name": "sku",
                    "ordinal_position": 1,
                    "data_type": "VARCHAR",
                    "length_scale": {"length": 32},
                    "is_auto_increment": false,
                    "charset": null,
                    "collation": null,
                    "comment": null
                }],
                "indexes": [],
                "constraints": [],
                "relationships": []
            }]
        }]
    });
    assert_eq!(value, expected);

    let text = serde_json::to_string(&fixed_snapshot()).expect("serialize snapshot");
    let parsed: Database = serde_json::from_str(&text).expect("parse snapshot");
    assert_eq!(parsed, fixed_snapshot());
}

#[test]
fn operation_scripts_replay_from_json() {
    let script = json!([
        {"op": "createTable", "schema_id": "s1", "table": {"id": "t2", "name": "vendors"}},
        {"op": "createColumn", "schema_id": "s1", "table_id": "t2", "column": {
            "id": "c2", "name": "id", "data_type": "INT", "nullable": false, "primary_key": true
        }},
        {"op": "createRelationship", "schema_id": "s1", "relationship": {
            "id": "r1",
            "fk_table_id": "t1",
            "pk_table_id": "t2",
            "name": "fk_products_vendors",
            "kind": "NON_IDENTIFYING",
            "columns": [{"id": "m1", "pk_column_id": "c2", "fk_column_id": "c3"}]
        }}
    ]);
    let operations: Vec<Operation> = serde_json::from_value(script).expect("parse script");

    let db = SchemaEditor::default()
        .apply_all(&fixed_snapshot(), &operations)
        .expect("replay script");
    let products = db.schemas[0].table(&Id::from("t1")).expect("products");
    let fk = products.column(&Id::from("c3")).expect("foreign-key column");
    assert_eq!(fk.name, "vendors_id");
    assert_eq!(fk.ordinal_position, 2);
    assert_eq!(fk.data_type.as_deref(), Some("INT"));
}
