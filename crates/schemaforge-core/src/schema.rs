use std::sync::Arc;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{Constraint, ConstraintKind, Index, Relationship};
use crate::ids::Id;
use crate::types::{DbVendor, LengthScale};

/// Top-level design snapshot.
///
/// Schemas and tables are shared behind `Arc`; cloning a snapshot is cheap
/// and mutations copy only the nodes they touch.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Database {
    pub id: Id,
    pub schemas: Vec<Arc<Schema>>,
}

/// A namespace of tables designed for one vendor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Schema {
    pub id: Id,
    pub database_id: Id,
    pub name: String,
    pub vendor: DbVendor,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub tables: Vec<Arc<Table>>,
}

/// A table and everything it owns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Table {
    pub id: Id,
    pub schema_id: Id,
    pub name: String,
    pub comment: Option<String>,
    pub columns: Vec<Column>,
    pub indexes: Vec<Index>,
    pub constraints: Vec<Constraint>,
    /// Relationships whose foreign key lives in this table.
    pub relationships: Vec<Relationship>,
}

/// Column metadata. Nullability is expressed through NOT_NULL and
/// PRIMARY_KEY constraints, see [`Table::is_nullable`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Column {
    pub id: Id,
    pub table_id: Id,
    pub name: String,
    pub ordinal_position: u32,
    pub data_type: Option<String>,
    pub length_scale: Option<LengthScale>,
    pub is_auto_increment: bool,
    pub charset: Option<String>,
    pub collation: Option<String>,
    pub comment: Option<String>,
}

impl Database {
    pub fn new(id: Id) -> Self {
        Self {
            id,
            schemas: Vec::new(),
        }
    }

    pub fn schema(&self, schema_id: &Id) -> Option<&Schema> {
        self.schemas
            .iter()
            .map(Arc::as_ref)
            .find(|schema| &schema.id == schema_id)
    }

    pub fn schema_by_name(&self, name: &str) -> Option<&Schema> {
        self.schemas
            .iter()
            .map(Arc::as_ref)
            .find(|schema| schema.name == name)
    }
}

impl Schema {
    pub fn table(&self, table_id: &Id) -> Option<&Table> {
        self.tables
            .iter()
            .map(Arc::as_ref)
            .find(|table| &table.id == table_id)
    }

    pub fn table_by_name(&self, name: &str) -> Option<&Table> {
        self.tables
            .iter()
            .map(Arc::as_ref)
            .find(|table| table.name == name)
    }

    /// Locate a relationship and the table holding it.
    pub fn relationship(&self, relationship_id: &Id) -> Option<(&Table, &Relationship)> {
        self.tables.iter().find_map(|table| {
            table
                .relationships
                .iter()
                .find(|relationship| &relationship.id == relationship_id)
                .map(|relationship| (table.as_ref(), relationship))
        })
    }

    /// All relationships of the schema, in table order.
    pub fn relationships(&self) -> impl Iterator<Item = &Relationship> {
        self.tables
            .iter()
            .flat_map(|table| table.relationships.iter())
    }

    /// Relationships whose referenced (key-providing) table is `table_id`.
    pub fn relationships_referencing<'a>(
        &'a self,
        table_id: &'a Id,
    ) -> impl Iterator<Item = &'a Relationship> + 'a {
        self.relationships()
            .filter(move |relationship| &relationship.pk_table_id == table_id)
    }

    pub fn constraints(&self) -> impl Iterator<Item = &Constraint> {
        self.tables.iter().flat_map(|table| table.constraints.iter())
    }

    pub fn indexes(&self) -> impl Iterator<Item = &Index> {
        self.tables.iter().flat_map(|table| table.indexes.iter())
    }
}

impl Table {
    pub fn column(&self, column_id: &Id) -> Option<&Column> {
        self.columns.iter().find(|column| &column.id == column_id)
    }

    pub fn column_by_name(&self, name: &str) -> Option<&Column> {
        self.columns.iter().find(|column| column.name == name)
    }

    pub fn index(&self, index_id: &Id) -> Option<&Index> {
        self.indexes.iter().find(|index| &index.id == index_id)
    }

    pub fn index_by_name(&self, name: &str) -> Option<&Index> {
        self.indexes.iter().find(|index| index.name == name)
    }

    pub fn constraint(&self, constraint_id: &Id) -> Option<&Constraint> {
        self.constraints
            .iter()
            .find(|constraint| &constraint.id == constraint_id)
    }

    pub fn constraint_by_name(&self, name: &str) -> Option<&Constraint> {
        self.constraints
            .iter()
            .find(|constraint| constraint.name == name)
    }

    pub fn relationship(&self, relationship_id: &Id) -> Option<&Relationship> {
        self.relationships
            .iter()
            .find(|relationship| &relationship.id == relationship_id)
    }

    pub fn relationship_by_name(&self, name: &str) -> Option<&Relationship> {
        self.relationships
            .iter()
            .find(|relationship| relationship.name == name)
    }

    pub fn primary_key(&self) -> Option<&Constraint> {
        self.constraints
            .iter()
            .find(|constraint| constraint.kind == ConstraintKind::PrimaryKey)
    }

    /// Primary-key column ids in key order; empty when there is no key.
    pub fn primary_key_columns(&self) -> Vec<Id> {
        self.primary_key()
            .map(Constraint::column_ids)
            .unwrap_or_default()
    }

    pub fn is_primary_key_column(&self, column_id: &Id) -> bool {
        self.primary_key()
            .is_some_and(|pk| pk.contains_column(column_id))
    }

    /// A column is nullable unless it is a key column or carries NOT_NULL.
    pub fn is_nullable(&self, column_id: &Id) -> bool {
        !self.constraints.iter().any(|constraint| {
            matches!(
                constraint.kind,
                ConstraintKind::PrimaryKey | ConstraintKind::NotNull
            ) && constraint.contains_column(column_id)
        })
    }

    /// Columns ordered by ordinal position.
    pub fn ordered_columns(&self) -> Vec<&Column> {
        let mut columns: Vec<&Column> = self.columns.iter().collect();
        columns.sort_by_key(|column| column.ordinal_position);
        columns
    }
}
