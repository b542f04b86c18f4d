mod common;

use common::*;
use schemaforge_core::builders::{ColumnBuilder, SchemaBuilder, TableBuilder};
use schemaforge_core::{
    Cardinality, Database, Error, Id, RefAction, RelationshipColumnDraft, RelationshipDraft,
    RelationshipKind,
};

fn storefront() -> Database {
    SchemaBuilder::new("store")
        .table(
            TableBuilder::new("customers")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .column(ColumnBuilder::new("code").data_type("VARCHAR").length(8))
                .primary_key(["id"]),
        )
        .table(
            TableBuilder::new("orders")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .column(ColumnBuilder::new("note").data_type("TEXT"))
                .primary_key(["id"]),
        )
        .build()
}

fn reference(db: &Database, name: &str, kind: RelationshipKind) -> RelationshipDraft {
    RelationshipDraft::new(
        name,
        kind,
        table_id(db, "orders"),
        table_id(db, "customers"),
        [column_id(db, "customers", "id")],
    )
}

#[test]
fn non_identifying_relationship_adds_a_plain_foreign_key() {
    let db = storefront();
    let editor = editor();
    let schema_id = schema_id(&db);

    let draft = reference(&db, "fk_orders_customers", RelationshipKind::NonIdentifying);
    let relationship_id = draft.id.clone();
    let with_fk = editor
        .create_relationship(&db, &schema_id, draft)
        .expect("create");
    assert_eq!(column_names(&with_fk, "orders"), vec!["id", "note", "customers_id"]);
    assert_eq!(key_names(&with_fk, "orders"), vec!["id"]);
    assert_valid(&with_fk);

    let renamed = editor
        .change_relationship_name(&with_fk, &schema_id, &relationship_id, "fk_buyer")
        .expect("rename");
    let renamed = editor
        .change_relationship_cardinality(&renamed, &schema_id, &relationship_id, Cardinality::OneToOne)
        .expect("cardinality");
    let relationship = table(&renamed, "orders")
        .relationship(&relationship_id)
        .expect("relationship");
    assert_eq!(relationship.name, "fk_buyer");
    assert_eq!(relationship.cardinality, Cardinality::OneToOne);

    let dropped = editor
        .delete_relationship(&renamed, &schema_id, &relationship_id)
        .expect("delete");
    assert_eq!(table(&dropped, "orders"), table(&db, "orders"));
}

#[test]
fn relationship_names_are_unique_per_table() {
    let db = storefront();
    let editor = editor();
    let schema_id = schema_id(&db);
    let db = editor
        .create_relationship(&db, &schema_id, reference(&db, "fk_customer", RelationshipKind::NonIdentifying))
        .expect("first");

    let err = editor
        .create_relationship(&db, &schema_id, reference(&db, "fk_customer", RelationshipKind::NonIdentifying))
        .unwrap_err();
    assert_eq!(
        err,
        Error::RelationshipNameNotUnique {
            table_name: "orders".to_string(),
            name: "fk_customer".to_string(),
        }
    );

    let mut elsewhere = reference(&db, "fk_customer", RelationshipKind::NonIdentifying);
    elsewhere.fk_table_id = table_id(&db, "customers");
    elsewhere.pk_table_id = table_id(&db, "orders");
    elsewhere.columns = vec![RelationshipColumnDraft::new(column_id(&db, "orders", "id"))];
    editor
        .create_relationship(&db, &schema_id, elsewhere)
        .expect("same name on another table");
}

#[test]
fn malformed_mappings_are_rejected() {
    let db = storefront();
    let editor = editor();
    let schema_id = schema_id(&db);
    let customer_key = column_id(&db, "customers", "id");

    let mut empty = reference(&db, "fk_empty", RelationshipKind::NonIdentifying);
    empty.columns.clear();
    let err = editor.create_relationship(&db, &schema_id, empty).unwrap_err();
    assert_eq!(
        err,
        Error::RelationshipEmptyColumn {
            name: "fk_empty".to_string()
        }
    );

    let mut orphan = reference(&db, "fk_orphan", RelationshipKind::NonIdentifying);
    orphan.pk_table_id = Id::from("nowhere");
    let err = editor.create_relationship(&db, &schema_id, orphan).unwrap_err();
    assert_eq!(
        err,
        Error::RelationshipTargetTableNotExist {
            table_id: Id::from("nowhere")
        }
    );

    let mut twice = reference(&db, "fk_twice", RelationshipKind::NonIdentifying);
    twice.columns.push(RelationshipColumnDraft::new(customer_key.clone()));
    let err = editor.create_relationship(&db, &schema_id, twice).unwrap_err();
    assert!(matches!(err, Error::RelationshipColumnMappingDuplicate { .. }));

    let mut mistyped = reference(&db, "fk_note", RelationshipKind::NonIdentifying);
    mistyped.columns = vec![RelationshipColumnDraft::existing(
        customer_key,
        column_id(&db, "orders", "note"),
    )];
    let err = editor.create_relationship(&db, &schema_id, mistyped).unwrap_err();
    assert_eq!(
        err,
        Error::RelationshipColumnTypeIncompatible {
            fk_column: "note".to_string(),
            pk_column: "id".to_string(),
        }
    );
}

#[test]
fn set_null_needs_nullable_foreign_keys() {
    let db = storefront();
    let editor = editor();
    let schema_id = schema_id(&db);

    let draft = reference(&db, "fk_owner", RelationshipKind::Identifying).on_delete(RefAction::SetNull);
    let err = editor.create_relationship(&db, &schema_id, draft).unwrap_err();
    assert_eq!(
        err,
        Error::RelationshipSetNullRequiresNullable {
            name: "fk_owner".to_string(),
            column: "customers_id".to_string(),
        }
    );

    let draft = reference(&db, "fk_owner", RelationshipKind::NonIdentifying).on_delete(RefAction::SetNull);
    let relationship_id = draft.id.clone();
    let db = editor
        .create_relationship(&db, &schema_id, draft)
        .expect("nullable foreign key");
    let orders = table_id(&db, "orders");
    let fk_column = column_id(&db, "orders", "customers_id");

    let err = editor
        .change_column_nullable(&db, &schema_id, &orders, &fk_column, false)
        .unwrap_err();
    assert!(matches!(err, Error::RelationshipSetNullRequiresNullable { .. }));

    let err = editor
        .change_relationship_kind(&db, &schema_id, &relationship_id, RelationshipKind::Identifying)
        .unwrap_err();
    assert!(matches!(err, Error::RelationshipSetNullRequiresNullable { .. }));

    let db = editor
        .change_relationship_actions(&db, &schema_id, &relationship_id, RefAction::Cascade, RefAction::NoAction)
        .expect("cascade");
    let db = editor
        .change_relationship_kind(&db, &schema_id, &relationship_id, RelationshipKind::Identifying)
        .expect("identifying");
    assert_eq!(key_names(&db, "orders"), vec!["id", "customers_id"]);

    let err = editor
        .change_relationship_actions(&db, &schema_id, &relationship_id, RefAction::NoAction, RefAction::SetNull)
        .unwrap_err();
    assert!(matches!(err, Error::RelationshipSetNullRequiresNullable { .. }));
}

#[test]
fn mappings_can_be_added_and_removed() {
    let db = storefront();
    let editor = editor();
    let schema_id = schema_id(&db);

    let draft = reference(&db, "fk_customer", RelationshipKind::NonIdentifying);
    let relationship_id = draft.id.clone();
    let db = editor
        .create_relationship(&db, &schema_id, draft)
        .expect("create");

    let extra = RelationshipColumnDraft::new(column_id(&db, "customers", "code"));
    let extra_id = extra.id.clone();
    let db = editor
        .add_column_to_relationship(&db, &schema_id, &relationship_id, extra)
        .expect("add mapping");
    assert_eq!(
        column_names(&db, "orders"),
        vec!["id", "note", "customers_id", "customers_code"]
    );
    let code = table(&db, "orders").column_by_name("customers_code").expect("column");
    assert_eq!(code.data_type.as_deref(), Some("VARCHAR"));

    let err = editor
        .add_column_to_relationship(
            &db,
            &schema_id,
            &relationship_id,
            RelationshipColumnDraft::new(column_id(&db, "customers", "code")),
        )
        .unwrap_err();
    assert!(matches!(err, Error::RelationshipColumnMappingDuplicate { .. }));

    let db = editor
        .remove_column_from_relationship(&db, &schema_id, &relationship_id, &extra_id)
        .expect("remove mapping");
    assert_eq!(column_names(&db, "orders"), vec!["id", "note", "customers_id"]);

    let err = editor
        .remove_column_from_relationship(&db, &schema_id, &relationship_id, &extra_id)
        .unwrap_err();
    assert!(matches!(err, Error::RelationshipColumnNotExist { .. }));

    let last = table(&db, "orders")
        .relationship(&relationship_id)
        .expect("relationship")
        .columns[0]
        .id
        .clone();
    let db = editor
        .remove_column_from_relationship(&db, &schema_id, &relationship_id, &last)
        .expect("remove last mapping");
    assert!(table(&db, "orders").relationship(&relationship_id).is_none());
    assert_eq!(column_names(&db, "orders"), vec!["id", "note"]);
    assert_valid(&db);
}

#[test]
fn existing_columns_can_carry_the_foreign_key() {
    let db = SchemaBuilder::new("store")
        .table(
            TableBuilder::new("customers")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .primary_key(["id"]),
        )
        .table(
            TableBuilder::new("orders")
                .column(ColumnBuilder::new("id").data_type("INT"))
                .column(ColumnBuilder::new("buyer").data_type("int"))
                .primary_key(["id"]),
        )
        .build();
    let editor = editor();
    let schema_id = schema_id(&db);

    let mut draft = reference(&db, "fk_buyer", RelationshipKind::NonIdentifying);
    draft.columns = vec![RelationshipColumnDraft::existing(
        column_id(&db, "customers", "id"),
        column_id(&db, "orders", "buyer"),
    )];
    let db = editor
        .create_relationship(&db, &schema_id, draft)
        .expect("reuse column");
    assert_eq!(column_names(&db, "orders"), vec!["id", "buyer"]);
    assert_valid(&db);
}
