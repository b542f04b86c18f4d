mod common;

use common::*;
use schemaforge_core::builders::{ColumnBuilder, RelationshipBuilder, SchemaBuilder, TableBuilder};
use schemaforge_core::{
    ColumnDraft, Database, Error, RelationshipColumnDraft, RelationshipDraft, RelationshipKind,
};

fn parent_and_child() -> Database {
    SchemaBuilder::new("app")
        .table(
            TableBuilder::new("parent")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .table(TableBuilder::new("child"))
        .build()
}

fn identifying(db: &Database, name: &str, child: &str, parent: &str) -> RelationshipDraft {
    let key = table(db, parent).primary_key_columns();
    RelationshipDraft::new(
        name,
        RelationshipKind::Identifying,
        table_id(db, child),
        table_id(db, parent),
        key,
    )
}

#[test]
fn identifying_relationship_mirrors_parent_key() {
    let db = parent_and_child();
    let draft = identifying(&db, "fk_child_parent", "child", "parent");

    let db = editor()
        .create_relationship(&db, &schema_id(&db), draft)
        .expect("create relationship");

    assert_eq!(column_names(&db, "child"), vec!["parent_id"]);
    assert_eq!(key_names(&db, "child"), vec!["parent_id"]);
    let relationship = table(&db, "child")
        .relationship_by_name("fk_child_parent")
        .expect("relationship");
    assert_eq!(relationship.columns.len(), 1);
    assert_eq!(
        table(&db, "child").column_by_name("parent_id").and_then(|c| c.data_type.clone()),
        Some("INT".to_string())
    );
    assert_valid(&db);
}

#[test]
fn new_key_columns_reach_every_identifying_descendant() {
    let db = SchemaBuilder::new("app")
        .table(
            TableBuilder::new("parent")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .table(TableBuilder::new("child"))
        .table(TableBuilder::new("grandchild"))
        .build();
    let editor = editor();
    let schema_id = schema_id(&db);

    let db = editor
        .create_relationship(&db, &schema_id, identifying(&db, "fk_child_parent", "child", "parent"))
        .expect("child -> parent");
    let db = editor
        .create_relationship(
            &db,
            &schema_id,
            identifying(&db, "fk_grandchild_child", "grandchild", "child"),
        )
        .expect("grandchild -> child");
    assert_eq!(column_names(&db, "grandchild"), vec!["child_parent_id"]);

    let db = editor
        .create_column(
            &db,
            &schema_id,
            &table_id(&db, "parent"),
            ColumnDraft::new("tenant").data_type("INT").primary_key(),
        )
        .expect("add key column");

    assert_eq!(key_names(&db, "parent"), vec!["id", "tenant"]);
    assert_eq!(key_names(&db, "child"), vec!["parent_id", "parent_tenant"]);
    assert_eq!(
        key_names(&db, "grandchild"),
        vec!["child_parent_id", "child_parent_tenant"]
    );
    assert_eq!(
        table(&db, "grandchild").relationships[0].columns.len(),
        2
    );
    assert_valid(&db);
}

#[test]
fn deleting_identifying_relationship_restores_child() {
    let db = SchemaBuilder::new("app")
        .table(
            TableBuilder::new("parent")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .column(ColumnBuilder::new("code").data_type("VARCHAR").length(8))
                .primary_key(["id", "code"]),
        )
        .table(
            TableBuilder::new("child")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .build();
    let editor = editor();
    let schema_id = schema_id(&db);
    let before = table(&db, "child").clone();

    let draft = identifying(&db, "fk_child_parent", "child", "parent");
    let relationship_id = draft.id.clone();
    let linked = editor
        .create_relationship(&db, &schema_id, draft)
        .expect("create relationship");
    assert_eq!(key_names(&linked, "child"), vec!["id", "parent_id", "parent_code"]);

    let unlinked = editor
        .delete_relationship(&linked, &schema_id, &relationship_id)
        .expect("delete relationship");
    assert_eq!(table(&unlinked, "child"), &before);
    assert_valid(&unlinked);
}

#[test]
fn identifying_back_edge_is_a_cycle_but_non_identifying_is_not() {
    let db = SchemaBuilder::new("app")
        .table(
            TableBuilder::new("a")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .column(ColumnBuilder::new("b_id").data_type("INT"))
                .primary_key(["id", "b_id"])
                .relationship(
                    RelationshipBuilder::new("fk_a_b", "b", RelationshipKind::Identifying)
                        .map("b_id", "id"),
                ),
        )
        .table(
            TableBuilder::new("b")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .build();
    assert_valid(&db);
    let editor = editor();
    let schema_id = schema_id(&db);

    let err = editor
        .create_relationship(&db, &schema_id, identifying(&db, "fk_b_a", "b", "a"))
        .unwrap_err();
    assert_eq!(
        err,
        Error::RelationshipCyclicReference {
            fk_table: "b".to_string(),
            pk_table: "a".to_string(),
        }
    );

    let mut draft = identifying(&db, "fk_b_a", "b", "a");
    draft.kind = RelationshipKind::NonIdentifying;
    let relationship_id = draft.id.clone();
    let db = editor
        .create_relationship(&db, &schema_id, draft)
        .expect("non-identifying back edge");
    assert_eq!(column_names(&db, "b"), vec!["id", "a_id", "a_b_id"]);
    assert_valid(&db);

    let err = editor
        .change_relationship_kind(&db, &schema_id, &relationship_id, RelationshipKind::Identifying)
        .unwrap_err();
    assert!(matches!(err, Error::RelationshipCyclicReference { .. }));
}

#[test]
fn self_reference_is_only_allowed_when_non_identifying() {
    let db = SchemaBuilder::new("app")
        .table(
            TableBuilder::new("employee")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .build();
    let editor = editor();
    let schema_id = schema_id(&db);

    let err = editor
        .create_relationship(
            &db,
            &schema_id,
            identifying(&db, "fk_employee_manager", "employee", "employee"),
        )
        .unwrap_err();
    assert!(matches!(err, Error::RelationshipCyclicReference { .. }));

    let mut draft = identifying(&db, "fk_employee_manager", "employee", "employee");
    draft.kind = RelationshipKind::NonIdentifying;
    draft.columns[0].fk_column_name = Some("manager_id".to_string());
    let db = editor
        .create_relationship(&db, &schema_id, draft)
        .expect("self reference");
    assert_eq!(column_names(&db, "employee"), vec!["id", "manager_id"]);
    assert_eq!(key_names(&db, "employee"), vec!["id"]);
    assert_valid(&db);
}

#[test]
fn kind_flip_folds_and_unfolds_exactly_the_foreign_key_columns() {
    let db = SchemaBuilder::new("app")
        .table(
            TableBuilder::new("parent")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .table(
            TableBuilder::new("child")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .table(
            TableBuilder::new("grandchild")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .column(ColumnBuilder::new("child_id").data_type("INT"))
                .primary_key(["id", "child_id"])
                .relationship(
                    RelationshipBuilder::new("fk_grandchild_child", "child", RelationshipKind::Identifying)
                        .map("child_id", "id"),
                ),
        )
        .build();
    let editor = editor();
    let schema_id = schema_id(&db);

    let mut draft = identifying(&db, "fk_child_parent", "child", "parent");
    draft.kind = RelationshipKind::NonIdentifying;
    let relationship_id = draft.id.clone();
    let db = editor
        .create_relationship(&db, &schema_id, draft)
        .expect("non-identifying");
    assert_eq!(key_names(&db, "child"), vec!["id"]);

    let folded = editor
        .change_relationship_kind(&db, &schema_id, &relationship_id, RelationshipKind::Identifying)
        .expect("flip to identifying");
    assert_eq!(key_names(&folded, "child"), vec!["id", "parent_id"]);
    assert_eq!(
        key_names(&folded, "grandchild"),
        vec!["id", "child_id", "child_parent_id"]
    );
    assert_valid(&folded);

    let unfolded = editor
        .change_relationship_kind(
            &folded,
            &schema_id,
            &relationship_id,
            RelationshipKind::NonIdentifying,
        )
        .expect("flip back");
    assert_eq!(key_names(&unfolded, "child"), vec!["id"]);
    assert_eq!(column_names(&unfolded, "child"), vec!["id", "parent_id"]);
    assert_eq!(key_names(&unfolded, "grandchild"), vec!["id", "child_id"]);
    assert_eq!(column_names(&unfolded, "grandchild"), vec!["id", "child_id"]);
    assert!(table(&unfolded, "grandchild")
        .relationship_by_name("fk_grandchild_child")
        .is_some());
    assert_valid(&unfolded);
}

#[test]
fn dropping_parent_key_cascades_into_children() {
    let db = SchemaBuilder::new("app")
        .table(
            TableBuilder::new("parent")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .column(ColumnBuilder::new("code").data_type("INT"))
                .primary_key(["id", "code"]),
        )
        .table(TableBuilder::new("child").column(ColumnBuilder::new("note").data_type("TEXT")))
        .build();
    let editor = editor();
    let schema_id = schema_id(&db);
    let db = editor
        .create_relationship(&db, &schema_id, identifying(&db, "fk_child_parent", "child", "parent"))
        .expect("link");
    assert_eq!(column_names(&db, "child"), vec!["note", "parent_id", "parent_code"]);

    let without_code = editor
        .delete_column(
            &db,
            &schema_id,
            &table_id(&db, "parent"),
            &column_id(&db, "parent", "code"),
        )
        .expect("delete key column");
    assert_eq!(column_names(&without_code, "child"), vec!["note", "parent_id"]);
    assert_eq!(table(&without_code, "child").relationships[0].columns.len(), 1);
    assert_valid(&without_code);

    let parent = table(&db, "parent");
    let pk_id = parent.primary_key().expect("parent key").id.clone();
    let without_key = editor
        .delete_constraint(&db, &schema_id, &parent.id, &pk_id)
        .expect("delete primary key");
    let child = table(&without_key, "child");
    assert_eq!(column_names(&without_key, "child"), vec!["note"]);
    assert!(child.relationships.is_empty());
    assert!(child.primary_key().is_none());
    assert_valid(&without_key);
}

#[test]
fn dropping_parent_key_keeps_non_identifying_references() {
    let db = SchemaBuilder::new("app")
        .table(
            TableBuilder::new("parent")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .table(
            TableBuilder::new("child")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .column(ColumnBuilder::new("parent_id").data_type("INT"))
                .primary_key(["id"])
                .relationship(
                    RelationshipBuilder::new("fk_child_parent", "parent", RelationshipKind::NonIdentifying)
                        .map("parent_id", "id"),
                ),
        )
        .build();
    let parent = table(&db, "parent");
    let pk_id = parent.primary_key().expect("parent key").id.clone();

    let db = editor()
        .delete_constraint(&db, &schema_id(&db), &parent.id, &pk_id)
        .expect("delete primary key");

    assert_eq!(column_names(&db, "child"), vec!["id", "parent_id"]);
    let relationship = table(&db, "child")
        .relationship_by_name("fk_child_parent")
        .expect("reference survives");
    assert_eq!(relationship.columns.len(), 1);
    assert_valid(&db);
}

#[test]
fn kind_flip_leaves_unrelated_references_to_released_columns() {
    let db = SchemaBuilder::new("app")
        .table(
            TableBuilder::new("parent")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .table(
            TableBuilder::new("child")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .column(ColumnBuilder::new("parent_id").data_type("INT"))
                .primary_key(["id", "parent_id"])
                .relationship(
                    RelationshipBuilder::new("fk_child_parent", "parent", RelationshipKind::Identifying)
                        .map("parent_id", "id"),
                ),
        )
        .table(
            TableBuilder::new("other")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .column(ColumnBuilder::new("child_id").data_type("INT"))
                .column(ColumnBuilder::new("child_parent_id").data_type("INT"))
                .primary_key(["id"])
                .relationship(
                    RelationshipBuilder::new("fk_other_child", "child", RelationshipKind::NonIdentifying)
                        .map("child_id", "id")
                        .map("child_parent_id", "parent_id"),
                ),
        )
        .build();
    let relationship_id = table(&db, "child")
        .relationship_by_name("fk_child_parent")
        .expect("relationship")
        .id
        .clone();

    let db = editor()
        .change_relationship_kind(&db, &schema_id(&db), &relationship_id, RelationshipKind::NonIdentifying)
        .expect("flip to non-identifying");

    assert_eq!(key_names(&db, "child"), vec!["id"]);
    assert_eq!(column_names(&db, "other"), vec!["id", "child_id", "child_parent_id"]);
    let reference = table(&db, "other")
        .relationship_by_name("fk_other_child")
        .expect("reference survives");
    assert_eq!(reference.columns.len(), 2);
    assert_valid(&db);
}

#[test]
fn growing_a_key_into_an_existing_unique_is_rejected() {
    let db = SchemaBuilder::new("app")
        .table(
            TableBuilder::new("parent")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .table(
            TableBuilder::new("child")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .column(ColumnBuilder::new("parent_id").data_type("INT"))
                .primary_key(["id"])
                .unique("uq_child", ["id", "parent_id"]),
        )
        .build();
    let mut draft = identifying(&db, "fk_child_parent", "child", "parent");
    draft.columns = vec![RelationshipColumnDraft::existing(
        column_id(&db, "parent", "id"),
        column_id(&db, "child", "parent_id"),
    )];

    let err = editor()
        .create_relationship(&db, &schema_id(&db), draft)
        .unwrap_err();
    assert_eq!(
        err,
        Error::UniqueSameAsPrimaryKey {
            name: "uq_child".to_string(),
        }
    );
}

#[test]
fn type_changes_follow_references() {
    let db = parent_and_child();
    let editor = editor();
    let schema_id = schema_id(&db);
    let db = editor
        .create_relationship(&db, &schema_id, identifying(&db, "fk_child_parent", "child", "parent"))
        .expect("link");

    let widened = editor
        .change_column_type(
            &db,
            &schema_id,
            &table_id(&db, "parent"),
            &column_id(&db, "parent", "id"),
            Some("BIGINT".to_string()),
            None,
        )
        .expect("widen key");
    let mirrored = table(&widened, "child")
        .column_by_name("parent_id")
        .and_then(|column| column.data_type.clone());
    assert_eq!(mirrored.as_deref(), Some("BIGINT"));

    let err = editor
        .change_column_type(
            &widened,
            &schema_id,
            &table_id(&widened, "child"),
            &column_id(&widened, "child", "parent_id"),
            Some("INT".to_string()),
            None,
        )
        .unwrap_err();
    assert!(matches!(err, Error::RelationshipColumnTypeIncompatible { .. }));
}

#[test]
fn mirrored_key_columns_cannot_be_removed_piecemeal() {
    let db = SchemaBuilder::new("app")
        .table(
            TableBuilder::new("parent")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .table(
            TableBuilder::new("child")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .build();
    let editor = editor();
    let schema_id = schema_id(&db);
    let db = editor
        .create_relationship(&db, &schema_id, identifying(&db, "fk_child_parent", "child", "parent"))
        .expect("link");
    let child = table(&db, "child");
    let fk_column = column_id(&db, "child", "parent_id");

    let err = editor
        .delete_column(&db, &schema_id, &child.id, &fk_column)
        .unwrap_err();
    assert_eq!(
        err,
        Error::ForeignKeyColumnRequired {
            column: "parent_id".to_string(),
            relationship: "fk_child_parent".to_string(),
        }
    );

    let pk = child.primary_key().expect("child key");
    let entry = pk
        .columns
        .iter()
        .find(|column| column.column_id == fk_column)
        .expect("key entry");
    let err = editor
        .remove_column_from_constraint(&db, &schema_id, &child.id, &pk.id, &entry.id)
        .unwrap_err();
    assert!(matches!(err, Error::ForeignKeyColumnRequired { .. }));

    let err = editor
        .delete_constraint(&db, &schema_id, &child.id, &pk.id)
        .unwrap_err();
    assert!(matches!(err, Error::ForeignKeyColumnRequired { .. }));

    let relationship = &child.relationships[0];
    let err = editor
        .remove_column_from_relationship(&db, &schema_id, &relationship.id, &relationship.columns[0].id)
        .unwrap_err();
    assert!(matches!(err, Error::ForeignKeyColumnRequired { .. }));
}

#[test]
fn rejected_operations_leave_the_snapshot_untouched() {
    let db = parent_and_child();
    let pristine = db.clone();
    let editor = editor();
    let schema_id = schema_id(&db);

    let err = editor
        .create_column(
            &db,
            &schema_id,
            &table_id(&db, "child"),
            ColumnDraft::new("select"),
        )
        .unwrap_err();
    assert!(matches!(err, Error::ColumnNameReservedKeyword { .. }));
    assert_eq!(db, pristine);

    let next = editor
        .create_relationship(&db, &schema_id, identifying(&db, "fk_child_parent", "child", "parent"))
        .expect("link");
    assert_eq!(db, pristine);
    assert_ne!(next, pristine);
}

#[test]
fn deleting_a_provider_table_removes_dependent_columns() {
    let db = SchemaBuilder::new("app")
        .table(
            TableBuilder::new("parent")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .table(
            TableBuilder::new("child")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .table(
            TableBuilder::new("grandchild")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .build();
    let editor = editor();
    let schema_id = schema_id(&db);
    let db = editor
        .create_relationship(&db, &schema_id, identifying(&db, "fk_child_parent", "child", "parent"))
        .expect("child -> parent");
    let db = editor
        .create_relationship(
            &db,
            &schema_id,
            identifying(&db, "fk_grandchild_child", "grandchild", "child"),
        )
        .expect("grandchild -> child");
    assert_eq!(key_names(&db, "grandchild"), vec!["id", "child_id", "child_parent_id"]);

    let db = editor
        .delete_table(&db, &schema_id, &table_id(&db, "parent"))
        .expect("delete parent");
    assert!(schema(&db).table_by_name("parent").is_none());
    assert_eq!(column_names(&db, "child"), vec!["id"]);
    assert_eq!(column_names(&db, "grandchild"), vec!["id", "child_id"]);
    assert_eq!(table(&db, "grandchild").relationships[0].columns.len(), 1);
    assert_valid(&db);
}
