//! Fixture builders that assemble snapshots directly, addressing entities by
//! name. Names are resolved to freshly minted ids when the snapshot is built.
//!
//! The builders do not run design validation; pair them with
//! [`validate_database`](crate::validate_database) when a fixture must be
//! consistent.
//!
//! # Panics
//!
//! `build*` methods panic when a name does not resolve (unknown column in a
//! key, unknown relationship target). Builders are meant for tests and demos.

use std::sync::Arc;

use crate::constraints::{
    Cardinality, Constraint, ConstraintColumn, ConstraintKind, Index, IndexColumn, IndexType,
    RefAction, Relationship, RelationshipColumn, RelationshipKind, SortDir,
};
use crate::ids::Id;
use crate::schema::{Column, Database, Schema, Table};
use crate::types::{DbVendor, LengthScale};

#[derive(Debug, Clone, Default)]
pub struct DatabaseBuilder {
    schemas: Vec<SchemaBuilder>,
}

impl DatabaseBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn schema(mut self, schema: SchemaBuilder) -> Self {
        self.schemas.push(schema);
        self
    }

    pub fn build(self) -> Database {
        let mut db = Database::new(Id::new());
        for schema in self.schemas {
            let schema = schema.assemble(&db.id);
            db.schemas.push(Arc::new(schema));
        }
        db
    }
}

#[derive(Debug, Clone)]
pub struct SchemaBuilder {
    name: String,
    vendor: DbVendor,
    tables: Vec<TableBuilder>,
}

impl SchemaBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            vendor: DbVendor::Mysql,
            tables: Vec::new(),
        }
    }

    pub fn vendor(mut self, vendor: DbVendor) -> Self {
        self.vendor = vendor;
        self
    }

    pub fn table(mut self, table: TableBuilder) -> Self {
        self.tables.push(table);
        self
    }

    /// Build a detached schema.
    pub fn build_schema(self) -> Schema {
        self.assemble(&Id::new())
    }

    /// Build a database holding only this schema.
    pub fn build(self) -> Database {
        DatabaseBuilder::new().schema(self).build()
    }

    fn assemble(self, database_id: &Id) -> Schema {
        let schema_id = Id::new();
        let mut tables: Vec<Table> = Vec::with_capacity(self.tables.len());
        let mut pending = Vec::with_capacity(self.tables.len());
        for builder in self.tables {
            let (table, relationships) = builder.assemble(&schema_id);
            tables.push(table);
            pending.push(relationships);
        }

        for (holder_idx, relationships) in pending.into_iter().enumerate() {
            for builder in relationships {
                let relationship = builder.resolve(&tables, holder_idx);
                tables[holder_idx].relationships.push(relationship);
            }
        }

        Schema {
            id: schema_id,
            database_id: database_id.clone(),
            name: self.name,
            vendor: self.vendor,
            charset: None,
            collation: None,
            tables: tables.into_iter().map(Arc::new).collect(),
        }
    }
}

#[derive(Debug, Clone)]
pub struct TableBuilder {
    name: String,
    comment: Option<String>,
    columns: Vec<ColumnBuilder>,
    keys: Vec<(String, ConstraintKind, Vec<String>)>,
    indexes: Vec<(String, Vec<String>)>,
    relationships: Vec<RelationshipBuilder>,
}

impl TableBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            comment: None,
            columns: Vec::new(),
            keys: Vec::new(),
            indexes: Vec::new(),
            relationships: Vec::new(),
        }
    }

    pub fn comment(mut self, comment: impl Into<String>) -> Self {
        self.comment = Some(comment.into());
        self
    }

    pub fn column(mut self, column: ColumnBuilder) -> Self {
        self.columns.push(column);
        self
    }

    /// Primary key named `pk_<table>` over the given columns.
    pub fn primary_key<I, S>(mut self, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let name = format!("pk_{}", self.name);
        self.keys.push((
            name,
            ConstraintKind::PrimaryKey,
            columns.into_iter().map(Into::into).collect(),
        ));
        self
    }

    pub fn unique<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.keys.push((
            name.into(),
            ConstraintKind::Unique,
            columns.into_iter().map(Into::into).collect(),
        ));
        self
    }

    /// NOT_NULL constraint named `nn_<table>_<column>`.
    pub fn not_null(mut self, column: impl Into<String>) -> Self {
        let column = column.into();
        let name = format!("nn_{}_{}", self.name, column);
        self.keys.push((name, ConstraintKind::NotNull, vec![column]));
        self
    }

    pub fn index<I, S>(mut self, name: impl Into<String>, columns: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.indexes
            .push((name.into(), columns.into_iter().map(Into::into).collect()));
        self
    }

    pub fn relationship(mut self, relationship: RelationshipBuilder) -> Self {
        self.relationships.push(relationship);
        self
    }

    fn assemble(self, schema_id: &Id) -> (Table, Vec<RelationshipBuilder>) {
        let table_id = Id::new();
        let columns: Vec<Column> = self
            .columns
            .into_iter()
            .enumerate()
            .map(|(idx, column)| column.assemble(&table_id, idx as u32 + 1))
            .collect();
        let column_id = |name: &str| -> Id {
            columns
                .iter()
                .find(|column| column.name == name)
                .map(|column| column.id.clone())
                .unwrap_or_else(|| panic!("unknown column '{name}' in table '{}'", self.name))
        };

        let constraints = self
            .keys
            .iter()
            .map(|(name, kind, names)| Constraint {
                id: Id::new(),
                table_id: table_id.clone(),
                name: name.clone(),
                kind: *kind,
                check_expr: None,
                default_expr: None,
                columns: names
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| ConstraintColumn {
                        id: Id::new(),
                        column_id: column_id(name),
                        seq_no: idx as u32 + 1,
                    })
                    .collect(),
            })
            .collect();
        let indexes = self
            .indexes
            .iter()
            .map(|(name, names)| Index {
                id: Id::new(),
                table_id: table_id.clone(),
                name: name.clone(),
                index_type: IndexType::Btree,
                columns: names
                    .iter()
                    .enumerate()
                    .map(|(idx, name)| IndexColumn {
                        id: Id::new(),
                        column_id: column_id(name),
                        seq_no: idx as u32 + 1,
                        sort_dir: SortDir::Asc,
                    })
                    .collect(),
            })
            .collect();

        let table = Table {
            id: table_id,
            schema_id: schema_id.clone(),
            name: self.name,
            comment: self.comment,
            columns,
            indexes,
            constraints,
            relationships: Vec::new(),
        };
        (table, self.relationships)
    }
}

#[derive(Debug, Clone)]
pub struct ColumnBuilder {
    name: String,
    data_type: Option<String>,
    length_scale: Option<LengthScale>,
    auto_increment: bool,
}

impl ColumnBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            data_type: None,
            length_scale: None,
            auto_increment: false,
        }
    }

    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn length(mut self, length: u32) -> Self {
        self.length_scale = Some(LengthScale::Length(length));
        self
    }

    pub fn precision(mut self, precision: u32, scale: u32) -> Self {
        self.length_scale = Some(LengthScale::PrecisionScale { precision, scale });
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    fn assemble(self, table_id: &Id, ordinal_position: u32) -> Column {
        Column {
            id: Id::new(),
            table_id: table_id.clone(),
            name: self.name,
            ordinal_position,
            data_type: self.data_type,
            length_scale: self.length_scale,
            is_auto_increment: self.auto_increment,
            charset: None,
            collation: None,
            comment: None,
        }
    }
}

/// Relationship held by the enclosing [`TableBuilder`], pointing at another
/// table of the same schema by name.
#[derive(Debug, Clone)]
pub struct RelationshipBuilder {
    name: String,
    target: String,
    kind: RelationshipKind,
    cardinality: Cardinality,
    on_delete: RefAction,
    on_update: RefAction,
    mappings: Vec<(String, String)>,
}

impl RelationshipBuilder {
    pub fn new(name: impl Into<String>, target: impl Into<String>, kind: RelationshipKind) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            kind,
            cardinality: Cardinality::OneToMany,
            on_delete: RefAction::NoAction,
            on_update: RefAction::NoAction,
            mappings: Vec::new(),
        }
    }

    /// Map a column of the holder onto a column of the target.
    pub fn map(mut self, fk_column: impl Into<String>, pk_column: impl Into<String>) -> Self {
        self.mappings.push((fk_column.into(), pk_column.into()));
        self
    }

    pub fn cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }

    pub fn on_delete(mut self, action: RefAction) -> Self {
        self.on_delete = action;
        self
    }

    pub fn on_update(mut self, action: RefAction) -> Self {
        self.on_update = action;
        self
    }

    fn resolve(self, tables: &[Table], holder_idx: usize) -> Relationship {
        let holder = &tables[holder_idx];
        let target = tables
            .iter()
            .find(|table| table.name == self.target)
            .unwrap_or_else(|| panic!("unknown relationship target '{}'", self.target));
        let lookup = |table: &Table, name: &str| -> Id {
            table
                .column_by_name(name)
                .map(|column| column.id.clone())
                .unwrap_or_else(|| panic!("unknown column '{name}' in table '{}'", table.name))
        };

        Relationship {
            id: Id::new(),
            fk_table_id: holder.id.clone(),
            pk_table_id: target.id.clone(),
            name: self.name,
            kind: self.kind,
            cardinality: self.cardinality,
            on_delete: self.on_delete,
            on_update: self.on_update,
            columns: self
                .mappings
                .iter()
                .enumerate()
                .map(|(idx, (fk, pk))| RelationshipColumn {
                    id: Id::new(),
                    fk_column_id: lookup(holder, fk),
                    pk_column_id: lookup(target, pk),
                    seq_no: idx as u32 + 1,
                })
                .collect(),
        }
    }
}
