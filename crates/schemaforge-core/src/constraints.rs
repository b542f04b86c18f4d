use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::ids::Id;

/// Access method of an index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum IndexType {
    #[default]
    Btree,
    Hash,
    Fulltext,
    Spatial,
}

/// Sort direction of an indexed column.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SortDir {
    #[default]
    Asc,
    Desc,
}

/// One column of an index, ordered by `seq_no`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IndexColumn {
    pub id: Id,
    pub column_id: Id,
    pub seq_no: u32,
    pub sort_dir: SortDir,
}

/// Index definition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Index {
    pub id: Id,
    pub table_id: Id,
    pub name: String,
    pub index_type: IndexType,
    pub columns: Vec<IndexColumn>,
}

impl Index {
    /// Column ids in `seq_no` order, used for duplicate-definition checks.
    pub fn signature(&self) -> (IndexType, Vec<(Id, SortDir)>) {
        let columns = self
            .columns
            .iter()
            .map(|column| (column.column_id.clone(), column.sort_dir))
            .collect();
        (self.index_type, columns)
    }

    pub fn contains_column(&self, column_id: &Id) -> bool {
        self.columns.iter().any(|column| &column.column_id == column_id)
    }
}

/// Kind of a table-level constraint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ConstraintKind {
    PrimaryKey,
    Unique,
    Check,
    Default,
    NotNull,
}

impl ConstraintKind {
    /// CHECK and DEFAULT carry an expression.
    pub fn requires_expression(self) -> bool {
        matches!(self, ConstraintKind::Check | ConstraintKind::Default)
    }

    /// DEFAULT and NOT_NULL apply to exactly one column.
    pub fn is_single_column(self) -> bool {
        matches!(self, ConstraintKind::Default | ConstraintKind::NotNull)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintKind::PrimaryKey => "PRIMARY_KEY",
            ConstraintKind::Unique => "UNIQUE",
            ConstraintKind::Check => "CHECK",
            ConstraintKind::Default => "DEFAULT",
            ConstraintKind::NotNull => "NOT_NULL",
        }
    }
}

/// One column of a constraint, ordered by `seq_no`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConstraintColumn {
    pub id: Id,
    pub column_id: Id,
    pub seq_no: u32,
}

/// Constraint definition preserving column order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Constraint {
    pub id: Id,
    pub table_id: Id,
    pub name: String,
    pub kind: ConstraintKind,
    pub check_expr: Option<String>,
    pub default_expr: Option<String>,
    pub columns: Vec<ConstraintColumn>,
}

/// Identity of a constraint for duplicate detection: kind, expressions and
/// ordered column ids.
pub type ConstraintSignature = (ConstraintKind, Option<String>, Option<String>, Vec<Id>);

impl Constraint {
    pub fn signature(&self) -> ConstraintSignature {
        (
            self.kind,
            self.check_expr.clone(),
            self.default_expr.clone(),
            self.column_ids(),
        )
    }

    pub fn column_ids(&self) -> Vec<Id> {
        self.columns.iter().map(|column| column.column_id.clone()).collect()
    }

    pub fn contains_column(&self, column_id: &Id) -> bool {
        self.columns.iter().any(|column| &column.column_id == column_id)
    }

    pub fn is_primary_key(&self) -> bool {
        self.kind == ConstraintKind::PrimaryKey
    }
}

/// Whether the foreign key takes part in the holder's primary key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationshipKind {
    Identifying,
    NonIdentifying,
}

/// Cardinality drawn on the relationship edge.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Cardinality {
    OneToOne,
    OneToZeroOrOne,
    #[default]
    OneToMany,
    OneToZeroOrMany,
}

/// Referential action for ON DELETE / ON UPDATE.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RefAction {
    #[default]
    NoAction,
    Restrict,
    Cascade,
    SetNull,
    SetDefault,
}

/// Mapping of one foreign-key column to the column it references.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RelationshipColumn {
    pub id: Id,
    pub fk_column_id: Id,
    pub pk_column_id: Id,
    pub seq_no: u32,
}

/// Foreign-key relationship attached to the table holding the foreign key.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct Relationship {
    pub id: Id,
    /// Table holding the foreign-key columns (owner of this relationship).
    pub fk_table_id: Id,
    /// Table providing the referenced key.
    pub pk_table_id: Id,
    pub name: String,
    pub kind: RelationshipKind,
    pub cardinality: Cardinality,
    pub on_delete: RefAction,
    pub on_update: RefAction,
    pub columns: Vec<RelationshipColumn>,
}

impl Relationship {
    pub fn is_identifying(&self) -> bool {
        self.kind == RelationshipKind::Identifying
    }

    pub fn uses_set_null(&self) -> bool {
        self.on_delete == RefAction::SetNull || self.on_update == RefAction::SetNull
    }

    pub fn maps_pk_column(&self, pk_column_id: &Id) -> bool {
        self.columns.iter().any(|column| &column.pk_column_id == pk_column_id)
    }

    pub fn maps_fk_column(&self, fk_column_id: &Id) -> bool {
        self.columns.iter().any(|column| &column.fk_column_id == fk_column_id)
    }

    pub fn fk_column_ids(&self) -> Vec<Id> {
        self.columns.iter().map(|column| column.fk_column_id.clone()).collect()
    }
}

/// Renumber `seq_no` fields 1..=N in slice order.
pub(crate) fn resequence<T>(items: &mut [T], seq: impl Fn(&mut T) -> &mut u32) {
    for (idx, item) in items.iter_mut().enumerate() {
        *seq(item) = idx as u32 + 1;
    }
}
