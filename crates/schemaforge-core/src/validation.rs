use std::collections::{BTreeSet, HashMap, HashSet};

use crate::error::{Error, Result};
use crate::graph::identifying_order;
use crate::handlers::{check_data_type, types_compatible};
use crate::ids::Id;
use crate::schema::{Database, Schema, Table};
use crate::types::DbVendor;

/// Validate the cross-entity consistency of a design snapshot.
///
/// This checks:
/// - ids are unique across the whole snapshot
/// - name uniqueness scopes (schema, table, column, index, constraint, relationship)
/// - every sequence (ordinal positions, column seq numbers) is gapless from 1
/// - owner ids and column references resolve
/// - IDENTIFYING relationships are acyclic and carry their parent's key
/// - column types are valid for the schema's vendor and foreign keys match
///   the type of the column they reference
/// - no duplicate index or constraint definitions on one table
pub fn validate_database(db: &Database) -> Result<()> {
    check_unique_ids(db)?;

    let mut schema_names = BTreeSet::new();
    for schema in &db.schemas {
        if !schema_names.insert(schema.name.as_str()) {
            return Err(Error::SchemaNameNotUnique {
                name: schema.name.clone(),
            });
        }
        if schema.database_id != db.id {
            return Err(dangling("schema", &schema.id, "database", &schema.database_id));
        }
        validate_schema(schema)?;
    }

    Ok(())
}

fn validate_schema(schema: &Schema) -> Result<()> {
    let mut table_names = BTreeSet::new();
    let mut index_names = BTreeSet::new();
    let mut constraint_names = BTreeSet::new();

    for table in &schema.tables {
        if !table_names.insert(table.name.as_str()) {
            return Err(Error::TableNameNotUnique {
                name: table.name.clone(),
            });
        }
        if table.schema_id != schema.id {
            return Err(dangling("table", &table.id, "schema", &table.schema_id));
        }
        for index in &table.indexes {
            if !index_names.insert(index.name.as_str()) {
                return Err(Error::IndexNameNotUnique {
                    name: index.name.clone(),
                });
            }
        }
        for constraint in &table.constraints {
            if !constraint_names.insert(constraint.name.as_str()) {
                return Err(Error::ConstraintNameNotUnique {
                    name: constraint.name.clone(),
                });
            }
        }

        validate_table(table, schema.vendor)?;
        validate_relationships(schema, table)?;
    }

    let report = identifying_order(schema);
    if let Some(cycle) = report.cycle {
        let members: BTreeSet<&str> = cycle.iter().map(String::as_str).collect();
        let edge = schema.tables.iter().find_map(|table| {
            table
                .relationships
                .iter()
                .filter(|relationship| relationship.is_identifying())
                .filter_map(|relationship| schema.table(&relationship.pk_table_id))
                .find(|provider| {
                    members.contains(table.name.as_str()) && members.contains(provider.name.as_str())
                })
                .map(|provider| (table.name.clone(), provider.name.clone()))
        });
        let (fk_table, pk_table) = edge.unwrap_or_else(|| {
            let first = cycle.first().cloned().unwrap_or_default();
            (first.clone(), first)
        });
        return Err(Error::RelationshipCyclicReference { fk_table, pk_table });
    }

    Ok(())
}

fn validate_table(table: &Table, vendor: DbVendor) -> Result<()> {
    let mut column_names = BTreeSet::new();
    for (idx, column) in table.columns.iter().enumerate() {
        if !column_names.insert(column.name.as_str()) {
            return Err(Error::ColumnNameNotUnique {
                table_name: table.name.clone(),
                name: column.name.clone(),
            });
        }
        if column.table_id != table.id {
            return Err(dangling("column", &column.id, "table", &column.table_id));
        }
        if column.ordinal_position != idx as u32 + 1 {
            return Err(gap("column", &table.id));
        }
        check_data_type(vendor, column.data_type.as_deref(), column.length_scale)?;
    }

    let mut signatures = HashMap::new();
    for index in &table.indexes {
        if index.table_id != table.id {
            return Err(dangling("index", &index.id, "table", &index.table_id));
        }
        for (idx, column) in index.columns.iter().enumerate() {
            if column.seq_no != idx as u32 + 1 {
                return Err(gap("index column", &index.id));
            }
            if table.column(&column.column_id).is_none() {
                return Err(dangling("index", &index.id, "column", &column.column_id));
            }
        }
        if let Some(existing) = signatures.insert(index.signature(), &index.name) {
            return Err(Error::IndexDefinitionDuplicate {
                name: index.name.clone(),
                existing: existing.clone(),
            });
        }
    }

    let mut signatures = HashMap::new();
    let mut primary_keys = 0;
    for constraint in &table.constraints {
        if constraint.table_id != table.id {
            return Err(dangling("constraint", &constraint.id, "table", &constraint.table_id));
        }
        if constraint.is_primary_key() {
            primary_keys += 1;
            if primary_keys > 1 {
                return Err(Error::ConstraintMultiplePrimaryKey {
                    table_name: table.name.clone(),
                });
            }
        }
        for (idx, column) in constraint.columns.iter().enumerate() {
            if column.seq_no != idx as u32 + 1 {
                return Err(gap("constraint column", &constraint.id));
            }
            if table.column(&column.column_id).is_none() {
                return Err(dangling("constraint", &constraint.id, "column", &column.column_id));
            }
        }
        if let Some(existing) = signatures.insert(constraint.signature(), &constraint.name) {
            return Err(Error::DuplicateKeyDefinition {
                name: constraint.name.clone(),
                existing: existing.clone(),
            });
        }
    }

    Ok(())
}

fn validate_relationships(schema: &Schema, table: &Table) -> Result<()> {
    let mut names = BTreeSet::new();
    for relationship in &table.relationships {
        if !names.insert(relationship.name.as_str()) {
            return Err(Error::RelationshipNameNotUnique {
                table_name: table.name.clone(),
                name: relationship.name.clone(),
            });
        }
        if relationship.fk_table_id != table.id {
            return Err(dangling(
                "relationship",
                &relationship.id,
                "table",
                &relationship.fk_table_id,
            ));
        }
        let provider = schema
            .table(&relationship.pk_table_id)
            .ok_or_else(|| dangling("relationship", &relationship.id, "table", &relationship.pk_table_id))?;
        if relationship.columns.is_empty() {
            return Err(Error::RelationshipEmptyColumn {
                name: relationship.name.clone(),
            });
        }

        for (idx, mapping) in relationship.columns.iter().enumerate() {
            if mapping.seq_no != idx as u32 + 1 {
                return Err(gap("relationship column", &relationship.id));
            }
            let fk_column = table.column(&mapping.fk_column_id).ok_or_else(|| {
                dangling("relationship", &relationship.id, "column", &mapping.fk_column_id)
            })?;
            let pk_column = provider.column(&mapping.pk_column_id).ok_or_else(|| {
                dangling("relationship", &relationship.id, "column", &mapping.pk_column_id)
            })?;
            if !types_compatible(fk_column, pk_column) {
                return Err(Error::RelationshipColumnTypeIncompatible {
                    fk_column: fk_column.name.clone(),
                    pk_column: pk_column.name.clone(),
                });
            }
        }

        if !relationship.is_identifying() {
            continue;
        }
        for key_column in provider.primary_key_columns() {
            let carried = relationship.columns.iter().any(|mapping| {
                mapping.pk_column_id == key_column && table.is_primary_key_column(&mapping.fk_column_id)
            });
            if !carried {
                let column = provider
                    .column(&key_column)
                    .map(|column| column.name.clone())
                    .unwrap_or_else(|| key_column.to_string());
                return Err(Error::IdentifyingKeyNotPropagated {
                    table: table.name.clone(),
                    parent: provider.name.clone(),
                    column,
                });
            }
        }
    }

    Ok(())
}

fn check_unique_ids(db: &Database) -> Result<()> {
    let mut ids: Vec<(&str, &Id)> = vec![("database", &db.id)];
    for schema in &db.schemas {
        ids.push(("schema", &schema.id));
        for table in &schema.tables {
            ids.push(("table", &table.id));
            ids.extend(table.columns.iter().map(|column| ("column", &column.id)));
            for index in &table.indexes {
                ids.push(("index", &index.id));
                ids.extend(index.columns.iter().map(|column| ("index column", &column.id)));
            }
            for constraint in &table.constraints {
                ids.push(("constraint", &constraint.id));
                ids.extend(
                    constraint
                        .columns
                        .iter()
                        .map(|column| ("constraint column", &column.id)),
                );
            }
            for relationship in &table.relationships {
                ids.push(("relationship", &relationship.id));
                ids.extend(
                    relationship
                        .columns
                        .iter()
                        .map(|column| ("relationship column", &column.id)),
                );
            }
        }
    }

    let mut seen: HashSet<&Id> = HashSet::with_capacity(ids.len());
    for (entity, id) in ids {
        if !seen.insert(id) {
            return Err(Error::EntityIdNotUnique {
                entity: entity.to_string(),
                id: id.clone(),
            });
        }
    }
    Ok(())
}

fn dangling(entity: &str, owner_id: &Id, target: &str, target_id: &Id) -> Error {
    Error::ReferenceDangling {
        entity: entity.to_string(),
        owner_id: owner_id.clone(),
        target: target.to_string(),
        target_id: target_id.clone(),
    }
}

fn gap(scope: &str, owner_id: &Id) -> Error {
    Error::SequenceNotGapless {
        scope: scope.to_string(),
        owner_id: owner_id.clone(),
    }
}
