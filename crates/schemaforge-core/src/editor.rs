//! Public facade: one method per design operation.
//!
//! Every method takes the caller's snapshot by reference and returns a new
//! snapshot. The input is never modified, so on error the previous snapshot
//! is still the current design.

use tracing::debug;

use crate::config::EditorConfig;
use crate::constraints::{Cardinality, RefAction, RelationshipKind, SortDir};
use crate::drafts::{
    ColumnDraft, ConstraintColumnDraft, ConstraintDraft, IndexColumnDraft, IndexDraft,
    RelationshipColumnDraft, RelationshipDraft, SchemaDraft, TableDraft,
};
use crate::edit::Edit;
use crate::error::Result;
use crate::ids::Id;
use crate::schema::Database;
use crate::types::LengthScale;

#[derive(Debug, Clone, Default)]
pub struct SchemaEditor {
    config: EditorConfig,
}

impl SchemaEditor {
    pub fn new(config: EditorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EditorConfig {
        &self.config
    }

    fn run<F>(&self, db: &Database, operation: &'static str, mutate: F) -> Result<Database>
    where
        F: FnOnce(&mut Edit<'_>) -> Result<()>,
    {
        let mut edit = Edit::new(db, &self.config);
        match mutate(&mut edit) {
            Ok(()) => {
                debug!(operation, "operation applied");
                Ok(edit.finish())
            }
            Err(err) => {
                debug!(operation, code = err.code(), "operation rejected");
                Err(err)
            }
        }
    }

    // schema

    pub fn create_schema(&self, db: &Database, draft: SchemaDraft) -> Result<Database> {
        self.run(db, "create_schema", |edit| edit.create_schema(draft))
    }

    pub fn delete_schema(&self, db: &Database, schema_id: &Id) -> Result<Database> {
        self.run(db, "delete_schema", |edit| edit.delete_schema(schema_id))
    }

    pub fn change_schema_name(&self, db: &Database, schema_id: &Id, name: &str) -> Result<Database> {
        self.run(db, "change_schema_name", |edit| {
            edit.change_schema_name(schema_id, name)
        })
    }

    // table

    pub fn create_table(&self, db: &Database, schema_id: &Id, draft: TableDraft) -> Result<Database> {
        self.run(db, "create_table", |edit| edit.create_table(schema_id, draft))
    }

    /// Delete a table along with every relationship that names it as holder
    /// or target, cascading foreign-key removal into dependent tables.
    pub fn delete_table(&self, db: &Database, schema_id: &Id, table_id: &Id) -> Result<Database> {
        self.run(db, "delete_table", |edit| edit.delete_table(schema_id, table_id))
    }

    pub fn change_table_name(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        name: &str,
    ) -> Result<Database> {
        self.run(db, "change_table_name", |edit| {
            edit.change_table_name(schema_id, table_id, name)
        })
    }

    pub fn change_table_comment(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        comment: Option<String>,
    ) -> Result<Database> {
        self.run(db, "change_table_comment", |edit| {
            edit.change_table_comment(schema_id, table_id, comment)
        })
    }

    // column

    pub fn create_column(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        draft: ColumnDraft,
    ) -> Result<Database> {
        self.run(db, "create_column", |edit| {
            edit.create_column(schema_id, table_id, draft)
        })
    }

    pub fn delete_column(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
    ) -> Result<Database> {
        self.run(db, "delete_column", |edit| {
            edit.delete_column(schema_id, table_id, column_id)
        })
    }

    pub fn change_column_name(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
        name: &str,
    ) -> Result<Database> {
        self.run(db, "change_column_name", |edit| {
            edit.change_column_name(schema_id, table_id, column_id, name)
        })
    }

    pub fn change_column_type(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
        data_type: Option<String>,
        length_scale: Option<LengthScale>,
    ) -> Result<Database> {
        self.run(db, "change_column_type", |edit| {
            edit.change_column_type(schema_id, table_id, column_id, data_type, length_scale)
        })
    }

    pub fn change_column_position(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
        position: u32,
    ) -> Result<Database> {
        self.run(db, "change_column_position", |edit| {
            edit.change_column_position(schema_id, table_id, column_id, position)
        })
    }

    pub fn change_column_nullable(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
        nullable: bool,
    ) -> Result<Database> {
        self.run(db, "change_column_nullable", |edit| {
            edit.change_column_nullable(schema_id, table_id, column_id, nullable)
        })
    }

    pub fn change_column_auto_increment(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
        enabled: bool,
    ) -> Result<Database> {
        self.run(db, "change_column_auto_increment", |edit| {
            edit.change_column_auto_increment(schema_id, table_id, column_id, enabled)
        })
    }

    // index

    pub fn create_index(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        draft: IndexDraft,
    ) -> Result<Database> {
        self.run(db, "create_index", |edit| {
            edit.create_index(schema_id, table_id, draft)
        })
    }

    pub fn delete_index(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        index_id: &Id,
    ) -> Result<Database> {
        self.run(db, "delete_index", |edit| {
            edit.delete_index(schema_id, table_id, index_id)
        })
    }

    pub fn change_index_name(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        index_id: &Id,
        name: &str,
    ) -> Result<Database> {
        self.run(db, "change_index_name", |edit| {
            edit.change_index_name(schema_id, table_id, index_id, name)
        })
    }

    pub fn add_column_to_index(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        index_id: &Id,
        draft: IndexColumnDraft,
    ) -> Result<Database> {
        self.run(db, "add_column_to_index", |edit| {
            edit.add_column_to_index(schema_id, table_id, index_id, draft)
        })
    }

    pub fn remove_column_from_index(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        index_id: &Id,
        index_column_id: &Id,
    ) -> Result<Database> {
        self.run(db, "remove_column_from_index", |edit| {
            edit.remove_column_from_index(schema_id, table_id, index_id, index_column_id)
        })
    }

    pub fn change_index_column_sort_dir(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        index_id: &Id,
        index_column_id: &Id,
        sort_dir: SortDir,
    ) -> Result<Database> {
        self.run(db, "change_index_column_sort_dir", |edit| {
            edit.change_index_column_sort_dir(schema_id, table_id, index_id, index_column_id, sort_dir)
        })
    }

    // constraint

    pub fn create_constraint(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        draft: ConstraintDraft,
    ) -> Result<Database> {
        self.run(db, "create_constraint", |edit| {
            edit.create_constraint(schema_id, table_id, draft)
        })
    }

    pub fn delete_constraint(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        constraint_id: &Id,
    ) -> Result<Database> {
        self.run(db, "delete_constraint", |edit| {
            edit.delete_constraint(schema_id, table_id, constraint_id)
        })
    }

    pub fn change_constraint_name(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        constraint_id: &Id,
        name: &str,
    ) -> Result<Database> {
        self.run(db, "change_constraint_name", |edit| {
            edit.change_constraint_name(schema_id, table_id, constraint_id, name)
        })
    }

    pub fn add_column_to_constraint(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        constraint_id: &Id,
        draft: ConstraintColumnDraft,
    ) -> Result<Database> {
        self.run(db, "add_column_to_constraint", |edit| {
            edit.add_column_to_constraint(schema_id, table_id, constraint_id, draft)
        })
    }

    pub fn remove_column_from_constraint(
        &self,
        db: &Database,
        schema_id: &Id,
        table_id: &Id,
        constraint_id: &Id,
        constraint_column_id: &Id,
    ) -> Result<Database> {
        self.run(db, "remove_column_from_constraint", |edit| {
            edit.remove_column_from_constraint(schema_id, table_id, constraint_id, constraint_column_id)
        })
    }

    // relationship

    pub fn create_relationship(
        &self,
        db: &Database,
        schema_id: &Id,
        draft: RelationshipDraft,
    ) -> Result<Database> {
        self.run(db, "create_relationship", |edit| {
            edit.create_relationship(schema_id, draft)
        })
    }

    pub fn delete_relationship(
        &self,
        db: &Database,
        schema_id: &Id,
        relationship_id: &Id,
    ) -> Result<Database> {
        self.run(db, "delete_relationship", |edit| {
            edit.delete_relationship(schema_id, relationship_id)
        })
    }

    pub fn change_relationship_name(
        &self,
        db: &Database,
        schema_id: &Id,
        relationship_id: &Id,
        name: &str,
    ) -> Result<Database> {
        self.run(db, "change_relationship_name", |edit| {
            edit.change_relationship_name(schema_id, relationship_id, name)
        })
    }

    pub fn change_relationship_cardinality(
        &self,
        db: &Database,
        schema_id: &Id,
        relationship_id: &Id,
        cardinality: Cardinality,
    ) -> Result<Database> {
        self.run(db, "change_relationship_cardinality", |edit| {
            edit.change_relationship_cardinality(schema_id, relationship_id, cardinality)
        })
    }

    pub fn change_relationship_kind(
        &self,
        db: &Database,
        schema_id: &Id,
        relationship_id: &Id,
        kind: RelationshipKind,
    ) -> Result<Database> {
        self.run(db, "change_relationship_kind", |edit| {
            edit.change_relationship_kind(schema_id, relationship_id, kind)
        })
    }

    pub fn change_relationship_actions(
        &self,
        db: &Database,
        schema_id: &Id,
        relationship_id: &Id,
        on_delete: RefAction,
        on_update: RefAction,
    ) -> Result<Database> {
        self.run(db, "change_relationship_actions", |edit| {
            edit.change_relationship_actions(schema_id, relationship_id, on_delete, on_update)
        })
    }

    pub fn add_column_to_relationship(
        &self,
        db: &Database,
        schema_id: &Id,
        relationship_id: &Id,
        draft: RelationshipColumnDraft,
    ) -> Result<Database> {
        self.run(db, "add_column_to_relationship", |edit| {
            edit.add_column_to_relationship(schema_id, relationship_id, draft)
        })
    }

    pub fn remove_column_from_relationship(
        &self,
        db: &Database,
        schema_id: &Id,
        relationship_id: &Id,
        relationship_column_id: &Id,
    ) -> Result<Database> {
        self.run(db, "remove_column_from_relationship", |edit| {
            edit.remove_column_from_relationship(schema_id, relationship_id, relationship_column_id)
        })
    }
}
