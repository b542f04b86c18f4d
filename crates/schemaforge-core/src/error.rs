use std::fmt;

use serde::Serialize;
use thiserror::Error;

use crate::constraints::{ConstraintKind, IndexType};
use crate::ids::Id;
use crate::types::{DbVendor, LengthScale};

/// Rule a rejected name broke.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "rule", rename_all = "snake_case")]
pub enum NameRule {
    /// Length outside the configured inclusive bounds.
    Length { min: usize, max: usize },
    /// Not a plain identifier (letters, digits, underscore; no leading digit).
    Format,
}

impl fmt::Display for NameRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NameRule::Length { min, max } => {
                write!(f, "must be between {min} and {max} characters")
            }
            NameRule::Format => f.write_str(
                "must contain only letters, digits and underscores and must not start with a digit",
            ),
        }
    }
}

/// Error family, used by adapters to classify failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorFamily {
    NotFound,
    Naming,
    Structural,
    Semantic,
    Relationship,
    Integrity,
}

/// Every way a design mutation can be rejected.
///
/// Serialized adjacently tagged: `{"code": "...", "details": {...}}`.
#[derive(Debug, Clone, PartialEq, Eq, Error, Serialize)]
#[serde(tag = "code", content = "details", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Error {
    // not found
    #[error("schema '{schema_id}' does not exist")]
    SchemaNotExist { schema_id: Id },
    #[error("table '{table_id}' does not exist")]
    TableNotExist { table_id: Id },
    #[error("column '{column_id}' does not exist in table '{table_id}'")]
    ColumnNotExist { table_id: Id, column_id: Id },
    #[error("index '{index_id}' does not exist in table '{table_id}'")]
    IndexNotExist { table_id: Id, index_id: Id },
    #[error("index column '{index_column_id}' does not exist in index '{index_id}'")]
    IndexColumnNotExist { index_id: Id, index_column_id: Id },
    #[error("constraint '{constraint_id}' does not exist in table '{table_id}'")]
    ConstraintNotExist { table_id: Id, constraint_id: Id },
    #[error("constraint column '{constraint_column_id}' does not exist in constraint '{constraint_id}'")]
    ConstraintColumnNotExist {
        constraint_id: Id,
        constraint_column_id: Id,
    },
    #[error("relationship '{relationship_id}' does not exist")]
    RelationshipNotExist { relationship_id: Id },
    #[error("relationship column '{relationship_column_id}' does not exist in relationship '{relationship_id}'")]
    RelationshipColumnNotExist {
        relationship_id: Id,
        relationship_column_id: Id,
    },
    #[error("relationship target table '{table_id}' does not exist")]
    RelationshipTargetTableNotExist { table_id: Id },

    // naming
    #[error("schema name '{name}' is invalid: {rule}")]
    SchemaNameInvalid { name: String, rule: NameRule },
    #[error("schema name '{name}' is already used")]
    SchemaNameNotUnique { name: String },
    #[error("table name '{name}' is invalid: {rule}")]
    TableNameInvalid { name: String, rule: NameRule },
    #[error("table name '{name}' is already used in this schema")]
    TableNameNotUnique { name: String },
    #[error("column name '{name}' is invalid: {rule}")]
    ColumnNameInvalid { name: String, rule: NameRule },
    #[error("column name '{name}' is already used in table '{table_name}'")]
    ColumnNameNotUnique { table_name: String, name: String },
    #[error("column name '{name}' is a reserved keyword")]
    ColumnNameReservedKeyword { name: String },
    #[error("index name '{name}' is invalid: {rule}")]
    IndexNameInvalid { name: String, rule: NameRule },
    #[error("index name '{name}' is already used in this schema")]
    IndexNameNotUnique { name: String },
    #[error("constraint name '{name}' is invalid: {rule}")]
    ConstraintNameInvalid { name: String, rule: NameRule },
    #[error("constraint name '{name}' is already used in this schema")]
    ConstraintNameNotUnique { name: String },
    #[error("relationship name '{name}' is invalid: {rule}")]
    RelationshipNameInvalid { name: String, rule: NameRule },
    #[error("relationship name '{name}' is already used in table '{table_name}'")]
    RelationshipNameNotUnique { table_name: String, name: String },

    // structural
    #[error("id '{id}' is already used by another {entity}")]
    EntityIdNotUnique { entity: String, id: Id },
    #[error("table '{table_name}' must keep at least one column")]
    TableEmptyColumn { table_name: String },
    #[error("position {position} is out of range 1..={max} in table '{table_name}'")]
    ColumnPositionOutOfRange {
        table_name: String,
        position: u32,
        max: u32,
    },
    #[error("{scope} sequence of '{owner_id}' is not gapless from 1")]
    SequenceNotGapless { scope: String, owner_id: Id },
    #[error("index '{name}' must have at least one column")]
    IndexColumnsEmpty { name: String },
    #[error("column '{column_id}' appears more than once in index '{name}'")]
    IndexColumnNotUnique { name: String, column_id: Id },
    #[error("index '{name}' duplicates the definition of index '{existing}'")]
    IndexDefinitionDuplicate { name: String, existing: String },
    #[error("constraint '{name}' must have at least one column")]
    ConstraintColumnsEmpty { name: String },
    #[error("column '{column_id}' appears more than once in constraint '{name}'")]
    ConstraintColumnNotUnique { name: String, column_id: Id },
    #[error("constraint '{name}' duplicates the definition of constraint '{existing}'")]
    DuplicateKeyDefinition { name: String, existing: String },

    // semantic
    #[error("data type '{data_type}' is not supported by {vendor}")]
    ColumnDataTypeInvalid { data_type: String, vendor: DbVendor },
    #[error("data type '{data_type}' requires a length")]
    ColumnLengthRequired { data_type: String },
    #[error("data type '{data_type}' requires precision and scale")]
    ColumnPrecisionRequired { data_type: String },
    #[error("length/scale '{length_scale}' is invalid for data type '{data_type}'")]
    ColumnLengthScaleInvalid {
        data_type: String,
        length_scale: LengthScale,
    },
    #[error("data type '{data_type}' does not take a length or precision")]
    ColumnLengthScaleNotApplicable { data_type: String },
    #[error("table '{table_name}' already has an auto-increment column")]
    ColumnMultipleAutoIncrement { table_name: String },
    #[error("auto-increment column '{name}' must have an integer data type")]
    ColumnAutoIncrementNotInteger { name: String },
    #[error("column '{name}' belongs to the primary key and cannot be nullable")]
    ColumnNullableInPrimaryKey { name: String },
    #[error("unique constraint '{name}' has the same columns as the primary key")]
    UniqueSameAsPrimaryKey { name: String },
    #[error("{kind:?} constraint '{name}' requires an expression")]
    ConstraintExpressionRequired { name: String, kind: ConstraintKind },
    #[error("table '{table_name}' already has a primary key")]
    ConstraintMultiplePrimaryKey { table_name: String },
    #[error("{kind:?} constraint '{name}' must have exactly one column")]
    ConstraintSingleColumnRequired { name: String, kind: ConstraintKind },
    #[error("index type {index_type:?} is not supported by {vendor}")]
    IndexTypeNotSupported {
        index_type: IndexType,
        vendor: DbVendor,
    },

    // relationship
    #[error("relationship '{name}' must map at least one column")]
    RelationshipEmptyColumn { name: String },
    #[error("identifying relationship from '{fk_table}' to '{pk_table}' would create a cycle")]
    RelationshipCyclicReference { fk_table: String, pk_table: String },
    #[error("foreign-key column '{column_id}' is mapped more than once in relationship '{name}'")]
    RelationshipColumnNotUnique { name: String, column_id: Id },
    #[error("referenced column '{column_id}' is mapped more than once in relationship '{name}'")]
    RelationshipColumnMappingDuplicate { name: String, column_id: Id },
    #[error("column '{fk_column}' is not type-compatible with referenced column '{pk_column}'")]
    RelationshipColumnTypeIncompatible { fk_column: String, pk_column: String },
    #[error("relationship '{name}' uses SET NULL but column '{column}' is not nullable")]
    RelationshipSetNullRequiresNullable { name: String, column: String },

    // integrity
    #[error("the last remaining schema cannot be deleted")]
    SchemaDeleteLast { schema_id: Id },
    #[error("column '{column}' is required by identifying relationship '{relationship}'")]
    ForeignKeyColumnRequired { column: String, relationship: String },
    #[error("{entity} '{owner_id}' references missing {target} '{target_id}'")]
    ReferenceDangling {
        entity: String,
        owner_id: Id,
        target: String,
        target_id: Id,
    },
    #[error("table '{table}' does not carry key column '{column}' of identifying parent '{parent}'")]
    IdentifyingKeyNotPropagated {
        table: String,
        parent: String,
        column: String,
    },
}

impl Error {
    /// Stable machine-readable code.
    pub fn code(&self) -> &'static str {
        match self {
            Error::SchemaNotExist { .. } => "SCHEMA_NOT_EXIST",
            Error::TableNotExist { .. } => "TABLE_NOT_EXIST",
            Error::ColumnNotExist { .. } => "COLUMN_NOT_EXIST",
            Error::IndexNotExist { .. } => "INDEX_NOT_EXIST",
            Error::IndexColumnNotExist { .. } => "INDEX_COLUMN_NOT_EXIST",
            Error::ConstraintNotExist { .. } => "CONSTRAINT_NOT_EXIST",
            Error::ConstraintColumnNotExist { .. } => "CONSTRAINT_COLUMN_NOT_EXIST",
            Error::RelationshipNotExist { .. } => "RELATIONSHIP_NOT_EXIST",
            Error::RelationshipColumnNotExist { .. } => "RELATIONSHIP_COLUMN_NOT_EXIST",
            Error::RelationshipTargetTableNotExist { .. } => "RELATIONSHIP_TARGET_TABLE_NOT_EXIST",
            Error::SchemaNameInvalid { .. } => "SCHEMA_NAME_INVALID",
            Error::SchemaNameNotUnique { .. } => "SCHEMA_NAME_NOT_UNIQUE",
            Error::TableNameInvalid { .. } => "TABLE_NAME_INVALID",
            Error::TableNameNotUnique { .. } => "TABLE_NAME_NOT_UNIQUE",
            Error::ColumnNameInvalid { .. } => "COLUMN_NAME_INVALID",
            Error::ColumnNameNotUnique { .. } => "COLUMN_NAME_NOT_UNIQUE",
            Error::ColumnNameReservedKeyword { .. } => "COLUMN_NAME_RESERVED_KEYWORD",
            Error::IndexNameInvalid { .. } => "INDEX_NAME_INVALID",
            Error::IndexNameNotUnique { .. } => "INDEX_NAME_NOT_UNIQUE",
            Error::ConstraintNameInvalid { .. } => "CONSTRAINT_NAME_INVALID",
            Error::ConstraintNameNotUnique { .. } => "CONSTRAINT_NAME_NOT_UNIQUE",
            Error::RelationshipNameInvalid { .. } => "RELATIONSHIP_NAME_INVALID",
            Error::RelationshipNameNotUnique { .. } => "RELATIONSHIP_NAME_NOT_UNIQUE",
            Error::EntityIdNotUnique { .. } => "ENTITY_ID_NOT_UNIQUE",
            Error::TableEmptyColumn { .. } => "TABLE_EMPTY_COLUMN",
            Error::ColumnPositionOutOfRange { .. } => "COLUMN_POSITION_OUT_OF_RANGE",
            Error::SequenceNotGapless { .. } => "SEQUENCE_NOT_GAPLESS",
            Error::IndexColumnsEmpty { .. } => "INDEX_COLUMNS_EMPTY",
            Error::IndexColumnNotUnique { .. } => "INDEX_COLUMN_NOT_UNIQUE",
            Error::IndexDefinitionDuplicate { .. } => "INDEX_DEFINITION_DUPLICATE",
            Error::ConstraintColumnsEmpty { .. } => "CONSTRAINT_COLUMNS_EMPTY",
            Error::ConstraintColumnNotUnique { .. } => "CONSTRAINT_COLUMN_NOT_UNIQUE",
            Error::DuplicateKeyDefinition { .. } => "DUPLICATE_KEY_DEFINITION",
            Error::ColumnDataTypeInvalid { .. } => "COLUMN_DATA_TYPE_INVALID",
            Error::ColumnLengthRequired { .. } => "COLUMN_LENGTH_REQUIRED",
            Error::ColumnPrecisionRequired { .. } => "COLUMN_PRECISION_REQUIRED",
            Error::ColumnLengthScaleInvalid { .. } => "COLUMN_LENGTH_SCALE_INVALID",
            Error::ColumnLengthScaleNotApplicable { .. } => "COLUMN_LENGTH_SCALE_NOT_APPLICABLE",
            Error::ColumnMultipleAutoIncrement { .. } => "COLUMN_MULTIPLE_AUTO_INCREMENT",
            Error::ColumnAutoIncrementNotInteger { .. } => "COLUMN_AUTO_INCREMENT_NOT_INTEGER",
            Error::ColumnNullableInPrimaryKey { .. } => "COLUMN_NULLABLE_IN_PRIMARY_KEY",
            Error::UniqueSameAsPrimaryKey { .. } => "UNIQUE_SAME_AS_PRIMARY_KEY",
            Error::ConstraintExpressionRequired { .. } => "CONSTRAINT_EXPRESSION_REQUIRED",
            Error::ConstraintMultiplePrimaryKey { .. } => "CONSTRAINT_MULTIPLE_PRIMARY_KEY",
            Error::ConstraintSingleColumnRequired { .. } => "CONSTRAINT_SINGLE_COLUMN_REQUIRED",
            Error::IndexTypeNotSupported { .. } => "INDEX_TYPE_NOT_SUPPORTED",
            Error::RelationshipEmptyColumn { .. } => "RELATIONSHIP_EMPTY_COLUMN",
            Error::RelationshipCyclicReference { .. } => "RELATIONSHIP_CYCLIC_REFERENCE",
            Error::RelationshipColumnNotUnique { .. } => "RELATIONSHIP_COLUMN_NOT_UNIQUE",
            Error::RelationshipColumnMappingDuplicate { .. } => {
                "RELATIONSHIP_COLUMN_MAPPING_DUPLICATE"
            }
            Error::RelationshipColumnTypeIncompatible { .. } => {
                "RELATIONSHIP_COLUMN_TYPE_INCOMPATIBLE"
            }
            Error::RelationshipSetNullRequiresNullable { .. } => {
                "RELATIONSHIP_SET_NULL_REQUIRES_NULLABLE"
            }
            Error::SchemaDeleteLast { .. } => "SCHEMA_DELETE_LAST",
            Error::ForeignKeyColumnRequired { .. } => "FOREIGN_KEY_COLUMN_REQUIRED",
            Error::ReferenceDangling { .. } => "REFERENCE_DANGLING",
            Error::IdentifyingKeyNotPropagated { .. } => "IDENTIFYING_KEY_NOT_PROPAGATED",
        }
    }

    pub fn family(&self) -> ErrorFamily {
        match self {
            Error::SchemaNotExist { .. }
            | Error::TableNotExist { .. }
            | Error::ColumnNotExist { .. }
            | Error::IndexNotExist { .. }
            | Error::IndexColumnNotExist { .. }
            | Error::ConstraintNotExist { .. }
            | Error::ConstraintColumnNotExist { .. }
            | Error::RelationshipNotExist { .. }
            | Error::RelationshipColumnNotExist { .. }
            | Error::RelationshipTargetTableNotExist { .. } => ErrorFamily::NotFound,
            Error::SchemaNameInvalid { .. }
            | Error::SchemaNameNotUnique { .. }
            | Error::TableNameInvalid { .. }
            | Error::TableNameNotUnique { .. }
            | Error::ColumnNameInvalid { .. }
            | Error::ColumnNameNotUnique { .. }
            | Error::ColumnNameReservedKeyword { .. }
            | Error::IndexNameInvalid { .. }
            | Error::IndexNameNotUnique { .. }
            | Error::ConstraintNameInvalid { .. }
            | Error::ConstraintNameNotUnique { .. }
            | Error::RelationshipNameInvalid { .. }
            | Error::RelationshipNameNotUnique { .. } => ErrorFamily::Naming,
            Error::EntityIdNotUnique { .. }
            | Error::TableEmptyColumn { .. }
            | Error::ColumnPositionOutOfRange { .. }
            | Error::SequenceNotGapless { .. }
            | Error::IndexColumnsEmpty { .. }
            | Error::IndexColumnNotUnique { .. }
            | Error::IndexDefinitionDuplicate { .. }
            | Error::ConstraintColumnsEmpty { .. }
            | Error::ConstraintColumnNotUnique { .. }
            | Error::DuplicateKeyDefinition { .. } => ErrorFamily::Structural,
            Error::ColumnDataTypeInvalid { .. }
            | Error::ColumnLengthRequired { .. }
            | Error::ColumnPrecisionRequired { .. }
            | Error::ColumnLengthScaleInvalid { .. }
            | Error::ColumnLengthScaleNotApplicable { .. }
            | Error::ColumnMultipleAutoIncrement { .. }
            | Error::ColumnAutoIncrementNotInteger { .. }
            | Error::ColumnNullableInPrimaryKey { .. }
            | Error::UniqueSameAsPrimaryKey { .. }
            | Error::ConstraintExpressionRequired { .. }
            | Error::ConstraintMultiplePrimaryKey { .. }
            | Error::ConstraintSingleColumnRequired { .. }
            | Error::IndexTypeNotSupported { .. } => ErrorFamily::Semantic,
            Error::RelationshipEmptyColumn { .. }
            | Error::RelationshipCyclicReference { .. }
            | Error::RelationshipColumnNotUnique { .. }
            | Error::RelationshipColumnMappingDuplicate { .. }
            | Error::RelationshipColumnTypeIncompatible { .. }
            | Error::RelationshipSetNullRequiresNullable { .. } => ErrorFamily::Relationship,
            Error::SchemaDeleteLast { .. }
            | Error::ForeignKeyColumnRequired { .. }
            | Error::ReferenceDangling { .. }
            | Error::IdentifyingKeyNotPropagated { .. } => ErrorFamily::Integrity,
        }
    }

    /// Structured payload of the error (the offending names and ids).
    pub fn details(&self) -> serde_json::Value {
        match serde_json::to_value(self) {
            Ok(serde_json::Value::Object(mut map)) => map
                .remove("details")
                .unwrap_or(serde_json::Value::Null),
            _ => serde_json::Value::Null,
        }
    }
}

/// Convenience alias for results returned by schemaforge crates.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn serialized_code_matches_code() {
        let errors = vec![
            Error::TableEmptyColumn {
                table_name: "users".to_string(),
            },
            Error::RelationshipCyclicReference {
                fk_table: "a".to_string(),
                pk_table: "b".to_string(),
            },
            Error::DuplicateKeyDefinition {
                name: "uq_2".to_string(),
                existing: "uq_1".to_string(),
            },
            Error::ColumnNameInvalid {
                name: "1abc".to_string(),
                rule: NameRule::Format,
            },
        ];

        for error in errors {
            let value = serde_json::to_value(&error).expect("serialize error");
            assert_eq!(value["code"], error.code());
        }
    }

    #[test]
    fn details_carry_payload_fields() {
        let error = Error::RelationshipCyclicReference {
            fk_table: "orders".to_string(),
            pk_table: "users".to_string(),
        };
        let details = error.details();
        assert_eq!(details["fk_table"], "orders");
        assert_eq!(details["pk_table"], "users");
        assert_eq!(error.family(), ErrorFamily::Relationship);
        assert_eq!(
            error.to_string(),
            "identifying relationship from 'orders' to 'users' would create a cycle"
        );
    }

    #[test]
    fn name_rule_is_part_of_details() {
        let error = Error::TableNameInvalid {
            name: String::new(),
            rule: NameRule::Length { min: 1, max: 20 },
        };
        assert_eq!(error.details()["rule"]["rule"], "length");
        assert_eq!(error.details()["rule"]["max"], 20);
    }
}
