#![allow(dead_code)]

use schemaforge_core::{Database, Id, Schema, SchemaEditor, Table, validate_database};

pub fn editor() -> SchemaEditor {
    SchemaEditor::default()
}

pub fn schema(db: &Database) -> &Schema {
    db.schemas.first().expect("fixture has a schema")
}

pub fn schema_id(db: &Database) -> Id {
    schema(db).id.clone()
}

pub fn table<'a>(db: &'a Database, name: &str) -> &'a Table {
    schema(db)
        .table_by_name(name)
        .unwrap_or_else(|| panic!("missing table {name}"))
}

pub fn table_id(db: &Database, name: &str) -> Id {
    table(db, name).id.clone()
}

pub fn column_id(db: &Database, table_name: &str, column: &str) -> Id {
    table(db, table_name)
        .column_by_name(column)
        .unwrap_or_else(|| panic!("missing column {table_name}.{column}"))
        .id
        .clone()
}

pub fn column_names(db: &Database, table_name: &str) -> Vec<String> {
    table(db, table_name)
        .ordered_columns()
        .into_iter()
        .map(|column| column.name.clone())
        .collect()
}

pub fn key_names(db: &Database, table_name: &str) -> Vec<String> {
    let table = table(db, table_name);
    table
        .primary_key_columns()
        .iter()
        .filter_map(|column_id| table.column(column_id))
        .map(|column| column.name.clone())
        .collect()
}

pub fn assert_valid(db: &Database) {
    if let Err(err) = validate_database(db) {
        panic!("snapshot invalid: {err}");
    }
}
