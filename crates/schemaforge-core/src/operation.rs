//! Serializable form of every facade call, used by batch adapters.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{Cardinality, RefAction, RelationshipKind, SortDir};
use crate::drafts::{
    ColumnDraft, ConstraintColumnDraft, ConstraintDraft, IndexColumnDraft, IndexDraft,
    RelationshipColumnDraft, RelationshipDraft, SchemaDraft, TableDraft,
};
use crate::editor::SchemaEditor;
use crate::error::{Error, Result};
use crate::ids::Id;
use crate::schema::Database;
use crate::types::LengthScale;

/// One design operation, tagged by `op` (e.g. `{"op": "createTable", ...}`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "op", rename_all = "camelCase")]
pub enum Operation {
    CreateSchema {
        schema: SchemaDraft,
    },
    DeleteSchema {
        schema_id: Id,
    },
    ChangeSchemaName {
        schema_id: Id,
        name: String,
    },
    CreateTable {
        schema_id: Id,
        table: TableDraft,
    },
    DeleteTable {
        schema_id: Id,
        table_id: Id,
    },
    ChangeTableName {
        schema_id: Id,
        table_id: Id,
        name: String,
    },
    ChangeTableComment {
        schema_id: Id,
        table_id: Id,
        #[serde(default)]
        comment: Option<String>,
    },
    CreateColumn {
        schema_id: Id,
        table_id: Id,
        column: ColumnDraft,
    },
    DeleteColumn {
        schema_id: Id,
        table_id: Id,
        column_id: Id,
    },
    ChangeColumnName {
        schema_id: Id,
        table_id: Id,
        column_id: Id,
        name: String,
    },
    ChangeColumnType {
        schema_id: Id,
        table_id: Id,
        column_id: Id,
        #[serde(default)]
        data_type: Option<String>,
        #[serde(default)]
        length_scale: Option<LengthScale>,
    },
    ChangeColumnPosition {
        schema_id: Id,
        table_id: Id,
        column_id: Id,
        position: u32,
    },
    ChangeColumnNullable {
        schema_id: Id,
        table_id: Id,
        column_id: Id,
        nullable: bool,
    },
    ChangeColumnAutoIncrement {
        schema_id: Id,
        table_id: Id,
        column_id: Id,
        auto_increment: bool,
    },
    CreateIndex {
        schema_id: Id,
        table_id: Id,
        index: IndexDraft,
    },
    DeleteIndex {
        schema_id: Id,
        table_id: Id,
        index_id: Id,
    },
    ChangeIndexName {
        schema_id: Id,
        table_id: Id,
        index_id: Id,
        name: String,
    },
    AddColumnToIndex {
        schema_id: Id,
        table_id: Id,
        index_id: Id,
        column: IndexColumnDraft,
    },
    RemoveColumnFromIndex {
        schema_id: Id,
        table_id: Id,
        index_id: Id,
        index_column_id: Id,
    },
    ChangeIndexColumnSortDir {
        schema_id: Id,
        table_id: Id,
        index_id: Id,
        index_column_id: Id,
        sort_dir: SortDir,
    },
    CreateConstraint {
        schema_id: Id,
        table_id: Id,
        constraint: ConstraintDraft,
    },
    DeleteConstraint {
        schema_id: Id,
        table_id: Id,
        constraint_id: Id,
    },
    ChangeConstraintName {
        schema_id: Id,
        table_id: Id,
        constraint_id: Id,
        name: String,
    },
    AddColumnToConstraint {
        schema_id: Id,
        table_id: Id,
        constraint_id: Id,
        column: ConstraintColumnDraft,
    },
    RemoveColumnFromConstraint {
        schema_id: Id,
        table_id: Id,
        constraint_id: Id,
        constraint_column_id: Id,
    },
    CreateRelationship {
        schema_id: Id,
        relationship: RelationshipDraft,
    },
    DeleteRelationship {
        schema_id: Id,
        relationship_id: Id,
    },
    ChangeRelationshipName {
        schema_id: Id,
        relationship_id: Id,
        name: String,
    },
    ChangeRelationshipCardinality {
        schema_id: Id,
        relationship_id: Id,
        cardinality: Cardinality,
    },
    ChangeRelationshipKind {
        schema_id: Id,
        relationship_id: Id,
        kind: RelationshipKind,
    },
    ChangeRelationshipActions {
        schema_id: Id,
        relationship_id: Id,
        on_delete: RefAction,
        on_update: RefAction,
    },
    AddColumnToRelationship {
        schema_id: Id,
        relationship_id: Id,
        column: RelationshipColumnDraft,
    },
    RemoveColumnFromRelationship {
        schema_id: Id,
        relationship_id: Id,
        relationship_column_id: Id,
    },
}

impl SchemaEditor {
    /// Dispatch one serialized operation to its facade method.
    pub fn apply(&self, db: &Database, operation: &Operation) -> Result<Database> {
        use Operation as Op;

        match operation {
            Op::CreateSchema { schema } => self.create_schema(db, schema.clone()),
            Op::DeleteSchema { schema_id } => self.delete_schema(db, schema_id),
            Op::ChangeSchemaName { schema_id, name } => self.change_schema_name(db, schema_id, name),
            Op::CreateTable { schema_id, table } => self.create_table(db, schema_id, table.clone()),
            Op::DeleteTable {
                schema_id,
                table_id,
            } => self.delete_table(db, schema_id, table_id),
            Op::ChangeTableName {
                schema_id,
                table_id,
                name,
            } => self.change_table_name(db, schema_id, table_id, name),
            Op::ChangeTableComment {
                schema_id,
                table_id,
                comment,
            } => self.change_table_comment(db, schema_id, table_id, comment.clone()),
            Op::CreateColumn {
                schema_id,
                table_id,
                column,
            } => self.create_column(db, schema_id, table_id, column.clone()),
            Op::DeleteColumn {
                schema_id,
                table_id,
                column_id,
            } => self.delete_column(db, schema_id, table_id, column_id),
            Op::ChangeColumnName {
                schema_id,
                table_id,
                column_id,
                name,
            } => self.change_column_name(db, schema_id, table_id, column_id, name),
            Op::ChangeColumnType {
                schema_id,
                table_id,
                column_id,
                data_type,
                length_scale,
            } => self.change_column_type(
                db,
                schema_id,
                table_id,
                column_id,
                data_type.clone(),
                *length_scale,
            ),
            Op::ChangeColumnPosition {
                schema_id,
                table_id,
                column_id,
                position,
            } => self.change_column_position(db, schema_id, table_id, column_id, *position),
            Op::ChangeColumnNullable {
                schema_id,
                table_id,
                column_id,
                nullable,
            } => self.change_column_nullable(db, schema_id, table_id, column_id, *nullable),
            Op::ChangeColumnAutoIncrement {
                schema_id,
                table_id,
                column_id,
                auto_increment,
            } => self.change_column_auto_increment(db, schema_id, table_id, column_id, *auto_increment),
            Op::CreateIndex {
                schema_id,
                table_id,
                index,
            } => self.create_index(db, schema_id, table_id, index.clone()),
            Op::DeleteIndex {
                schema_id,
                table_id,
                index_id,
            } => self.delete_index(db, schema_id, table_id, index_id),
            Op::ChangeIndexName {
                schema_id,
                table_id,
                index_id,
                name,
            } => self.change_index_name(db, schema_id, table_id, index_id, name),
            Op::AddColumnToIndex {
                schema_id,
                table_id,
                index_id,
                column,
            } => self.add_column_to_index(db, schema_id, table_id, index_id, column.clone()),
            Op::RemoveColumnFromIndex {
                schema_id,
                table_id,
                index_id,
                index_column_id,
            } => self.remove_column_from_index(db, schema_id, table_id, index_id, index_column_id),
            Op::ChangeIndexColumnSortDir {
                schema_id,
                table_id,
                index_id,
                index_column_id,
                sort_dir,
            } => self.change_index_column_sort_dir(
                db,
                schema_id,
                table_id,
                index_id,
                index_column_id,
                *sort_dir,
            ),
            Op::CreateConstraint {
                schema_id,
                table_id,
                constraint,
            } => self.create_constraint(db, schema_id, table_id, constraint.clone()),
            Op::DeleteConstraint {
                schema_id,
                table_id,
                constraint_id,
            } => self.delete_constraint(db, schema_id, table_id, constraint_id),
            Op::ChangeConstraintName {
                schema_id,
                table_id,
                constraint_id,
                name,
            } => self.change_constraint_name(db, schema_id, table_id, constraint_id, name),
            Op::AddColumnToConstraint {
                schema_id,
                table_id,
                constraint_id,
                column,
            } => self.add_column_to_constraint(db, schema_id, table_id, constraint_id, column.clone()),
            Op::RemoveColumnFromConstraint {
                schema_id,
                table_id,
                constraint_id,
                constraint_column_id,
            } => self.remove_column_from_constraint(
                db,
                schema_id,
                table_id,
                constraint_id,
                constraint_column_id,
            ),
            Op::CreateRelationship {
                schema_id,
                relationship,
            } => self.create_relationship(db, schema_id, relationship.clone()),
            Op::DeleteRelationship {
                schema_id,
                relationship_id,
            } => self.delete_relationship(db, schema_id, relationship_id),
            Op::ChangeRelationshipName {
                schema_id,
                relationship_id,
                name,
            } => self.change_relationship_name(db, schema_id, relationship_id, name),
            Op::ChangeRelationshipCardinality {
                schema_id,
                relationship_id,
                cardinality,
            } => self.change_relationship_cardinality(db, schema_id, relationship_id, *cardinality),
            Op::ChangeRelationshipKind {
                schema_id,
                relationship_id,
                kind,
            } => self.change_relationship_kind(db, schema_id, relationship_id, *kind),
            Op::ChangeRelationshipActions {
                schema_id,
                relationship_id,
                on_delete,
                on_update,
            } => self.change_relationship_actions(db, schema_id, relationship_id, *on_delete, *on_update),
            Op::AddColumnToRelationship {
                schema_id,
                relationship_id,
                column,
            } => self.add_column_to_relationship(db, schema_id, relationship_id, column.clone()),
            Op::RemoveColumnFromRelationship {
                schema_id,
                relationship_id,
                relationship_column_id,
            } => self.remove_column_from_relationship(
                db,
                schema_id,
                relationship_id,
                relationship_column_id,
            ),
        }
    }

    /// Apply a batch in order. The first rejection aborts the batch and the
    /// input snapshot stays the current design.
    pub fn apply_all(&self, db: &Database, operations: &[Operation]) -> Result<Database> {
        let mut current = db.clone();
        for operation in operations {
            current = self.apply(&current, operation)?;
        }
        Ok(current)
    }
}

/// Wire shape of an operation outcome.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Envelope {
    Success { database: Database },
    Failure { errors: Vec<ErrorBody> },
}

/// One reported error.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ErrorBody {
    pub code: &'static str,
    pub message: String,
    #[serde(skip_serializing_if = "serde_json::Value::is_null")]
    pub details: serde_json::Value,
}

impl From<&Error> for ErrorBody {
    fn from(err: &Error) -> Self {
        Self {
            code: err.code(),
            message: err.to_string(),
            details: err.details(),
        }
    }
}

impl From<Result<Database>> for Envelope {
    fn from(result: Result<Database>) -> Self {
        match result {
            Ok(database) => Envelope::Success { database },
            Err(err) => Envelope::Failure {
                errors: vec![ErrorBody::from(&err)],
            },
        }
    }
}
