use std::collections::{BTreeSet, HashSet};
use std::sync::Arc;

use crate::config::EditorConfig;
use crate::constraints::{Constraint, ConstraintColumn, ConstraintKind, resequence};
use crate::error::{Error, Result};
use crate::ids::Id;
use crate::naming::unique_name;
use crate::schema::{Column, Database, Schema, Table};

/// Working copy of a snapshot for the duration of one operation.
///
/// The copy starts as a shallow clone of the caller's snapshot; schemas and
/// tables are copied on first write. A failed operation simply drops the
/// working copy.
pub(crate) struct Edit<'a> {
    db: Database,
    pub(crate) config: &'a EditorConfig,
}

impl<'a> Edit<'a> {
    pub(crate) fn new(db: &Database, config: &'a EditorConfig) -> Self {
        Self {
            db: db.clone(),
            config,
        }
    }

    pub(crate) fn finish(self) -> Database {
        self.db
    }

    pub(crate) fn database(&self) -> &Database {
        &self.db
    }

    pub(crate) fn database_mut(&mut self) -> &mut Database {
        &mut self.db
    }

    pub(crate) fn schema(&self, schema_id: &Id) -> Result<&Schema> {
        self.db.schema(schema_id).ok_or_else(|| Error::SchemaNotExist {
            schema_id: schema_id.clone(),
        })
    }

    pub(crate) fn schema_mut(&mut self, schema_id: &Id) -> Result<&mut Schema> {
        let slot = self
            .db
            .schemas
            .iter_mut()
            .find(|schema| &schema.id == schema_id)
            .ok_or_else(|| Error::SchemaNotExist {
                schema_id: schema_id.clone(),
            })?;
        Ok(Arc::make_mut(slot))
    }

    pub(crate) fn table(&self, schema_id: &Id, table_id: &Id) -> Result<&Table> {
        self.schema(schema_id)?
            .table(table_id)
            .ok_or_else(|| Error::TableNotExist {
                table_id: table_id.clone(),
            })
    }

    pub(crate) fn table_mut(&mut self, schema_id: &Id, table_id: &Id) -> Result<&mut Table> {
        let schema = self.schema_mut(schema_id)?;
        let slot = schema
            .tables
            .iter_mut()
            .find(|table| &table.id == table_id)
            .ok_or_else(|| Error::TableNotExist {
                table_id: table_id.clone(),
            })?;
        Ok(Arc::make_mut(slot))
    }

    pub(crate) fn column(&self, schema_id: &Id, table_id: &Id, column_id: &Id) -> Result<&Column> {
        self.table(schema_id, table_id)?
            .column(column_id)
            .ok_or_else(|| Error::ColumnNotExist {
                table_id: table_id.clone(),
                column_id: column_id.clone(),
            })
    }

    /// Reject `id` when any entity of the snapshot already uses it.
    pub(crate) fn ensure_fresh_id(&self, entity: &str, id: &Id) -> Result<()> {
        if self.db.contains_id(id) {
            return Err(Error::EntityIdNotUnique {
                entity: entity.to_string(),
                id: id.clone(),
            });
        }
        Ok(())
    }

    /// Constraint names are unique across the whole schema.
    pub(crate) fn fresh_constraint_name(&self, schema_id: &Id, base: &str) -> Result<String> {
        let taken: BTreeSet<String> = self
            .schema(schema_id)?
            .constraints()
            .map(|constraint| constraint.name.clone())
            .collect();
        Ok(unique_name(base, self.config.naming.constraint.max, &taken))
    }

    /// Add columns to the table's primary key, creating `pk_<table>` when the
    /// table has none. Columns already in the key are skipped.
    pub(crate) fn add_to_primary_key(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        column_ids: &[Id],
    ) -> Result<()> {
        let table = self.table(schema_id, table_id)?;
        let pk_name = match table.primary_key() {
            Some(_) => None,
            None => {
                let base = format!("pk_{}", sanitize_identifier(&table.name));
                Some(self.fresh_constraint_name(schema_id, &base)?)
            }
        };

        let table = self.table_mut(schema_id, table_id)?;
        if let Some(name) = pk_name {
            table.constraints.push(Constraint {
                id: Id::new(),
                table_id: table_id.clone(),
                name,
                kind: ConstraintKind::PrimaryKey,
                check_expr: None,
                default_expr: None,
                columns: Vec::new(),
            });
        }

        if let Some(pk) = table
            .constraints
            .iter_mut()
            .find(|constraint| constraint.is_primary_key())
        {
            for column_id in column_ids {
                if !pk.contains_column(column_id) {
                    let seq_no = pk.columns.len() as u32 + 1;
                    pk.columns.push(ConstraintColumn {
                        id: Id::new(),
                        column_id: column_id.clone(),
                        seq_no,
                    });
                }
            }
        }

        ensure_key_not_restated(table)
    }

    /// Drop columns from the table's primary key; an emptied key is removed.
    pub(crate) fn remove_from_primary_key(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        column_ids: &[Id],
    ) -> Result<()> {
        let table = self.table_mut(schema_id, table_id)?;
        for constraint in table
            .constraints
            .iter_mut()
            .filter(|constraint| constraint.is_primary_key())
        {
            constraint
                .columns
                .retain(|column| !column_ids.contains(&column.column_id));
            resequence(&mut constraint.columns, |column| &mut column.seq_no);
        }
        table
            .constraints
            .retain(|constraint| !(constraint.is_primary_key() && constraint.columns.is_empty()));
        table.prune_redundant_keys();
        Ok(())
    }
}

impl Database {
    /// True when any entity at any depth uses `id`.
    pub fn contains_id(&self, id: &Id) -> bool {
        &self.id == id
            || self.schemas.iter().any(|schema| {
                &schema.id == id || schema.tables.iter().any(|table| table.contains_id(id))
            })
    }
}

impl Table {
    pub(crate) fn contains_id(&self, id: &Id) -> bool {
        &self.id == id
            || self.columns.iter().any(|column| &column.id == id)
            || self.indexes.iter().any(|index| {
                &index.id == id || index.columns.iter().any(|column| &column.id == id)
            })
            || self.constraints.iter().any(|constraint| {
                &constraint.id == id || constraint.columns.iter().any(|column| &column.id == id)
            })
            || self.relationships.iter().any(|relationship| {
                &relationship.id == id
                    || relationship.columns.iter().any(|column| &column.id == id)
            })
    }

    pub(crate) fn column_names(&self) -> BTreeSet<String> {
        self.columns.iter().map(|column| column.name.clone()).collect()
    }

    /// Renumber ordinal positions 1..=N in vector order.
    pub(crate) fn resequence_columns(&mut self) {
        resequence(&mut self.columns, |column| &mut column.ordinal_position);
    }

    /// Remove a column and every entry built on it within this table.
    ///
    /// Index, constraint and relationship entries naming the column are
    /// dropped and renumbered; entries left without columns are pruned.
    /// Callers are responsible for cascading into tables that reference the
    /// column.
    pub(crate) fn detach_column(&mut self, column_id: &Id) -> Option<Column> {
        let position = self.columns.iter().position(|column| &column.id == column_id)?;
        let removed = self.columns.remove(position);
        self.resequence_columns();

        for index in &mut self.indexes {
            index.columns.retain(|column| &column.column_id != column_id);
            resequence(&mut index.columns, |column| &mut column.seq_no);
        }
        self.indexes.retain(|index| !index.columns.is_empty());

        for constraint in &mut self.constraints {
            constraint
                .columns
                .retain(|column| &column.column_id != column_id);
            resequence(&mut constraint.columns, |column| &mut column.seq_no);
        }
        self.constraints
            .retain(|constraint| !constraint.columns.is_empty());

        for relationship in &mut self.relationships {
            relationship
                .columns
                .retain(|column| &column.fk_column_id != column_id);
            resequence(&mut relationship.columns, |column| &mut column.seq_no);
        }
        self.relationships
            .retain(|relationship| !relationship.columns.is_empty());

        self.prune_redundant_keys();
        Some(removed)
    }

    /// The UNIQUE constraint whose column set equals the primary key's.
    pub(crate) fn unique_restating_key(&self) -> Option<&Constraint> {
        let key: BTreeSet<&Id> = self.primary_key()?.columns.iter().map(|c| &c.column_id).collect();
        self.constraints.iter().find(|constraint| {
            constraint.kind == ConstraintKind::Unique
                && constraint.columns.iter().map(|c| &c.column_id).collect::<BTreeSet<_>>() == key
        })
    }

    /// Drop indexes and constraints that became redundant after columns
    /// left them: later duplicates of an earlier definition, and UNIQUE
    /// constraints that now restate the primary key.
    pub(crate) fn prune_redundant_keys(&mut self) {
        let mut seen = HashSet::new();
        self.indexes.retain(|index| seen.insert(index.signature()));

        while let Some(restated) = self.unique_restating_key().map(|c| c.id.clone()) {
            self.constraints.retain(|constraint| constraint.id != restated);
        }
        let mut seen = HashSet::new();
        self.constraints
            .retain(|constraint| seen.insert(constraint.signature()));
    }
}

/// Reject a primary key whose column set is restated by a UNIQUE constraint.
pub(crate) fn ensure_key_not_restated(table: &Table) -> Result<()> {
    match table.unique_restating_key() {
        Some(unique) => Err(Error::UniqueSameAsPrimaryKey {
            name: unique.name.clone(),
        }),
        None => Ok(()),
    }
}

/// Turn an arbitrary table or column name into an identifier fragment.
pub(crate) fn sanitize_identifier(name: &str) -> String {
    let mut out: String = name
        .chars()
        .map(|ch| if ch.is_ascii_alphanumeric() || ch == '_' { ch } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|ch: char| ch.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}
