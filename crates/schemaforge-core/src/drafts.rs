//! Caller-supplied shapes for `create*` and `add*To*` operations.
//!
//! Ids are chosen by the caller so that a client can refer to an entity
//! before the engine answers; `new` constructors mint fresh ones.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::constraints::{Cardinality, ConstraintKind, IndexType, RefAction, RelationshipKind, SortDir};
use crate::ids::Id;
use crate::types::{DbVendor, LengthScale};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct SchemaDraft {
    pub id: Id,
    pub name: String,
    pub vendor: DbVendor,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
}

impl SchemaDraft {
    pub fn new(name: impl Into<String>, vendor: DbVendor) -> Self {
        Self {
            id: Id::new(),
            name: name.into(),
            vendor,
            charset: None,
            collation: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct TableDraft {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub comment: Option<String>,
}

impl TableDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Id::new(),
            name: name.into(),
            comment: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ColumnDraft {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub data_type: Option<String>,
    #[serde(default)]
    pub length_scale: Option<LengthScale>,
    /// 1-based insert position; appended when absent.
    #[serde(default)]
    pub position: Option<u32>,
    #[serde(default = "default_true")]
    pub nullable: bool,
    #[serde(default)]
    pub primary_key: bool,
    #[serde(default)]
    pub auto_increment: bool,
    #[serde(default)]
    pub charset: Option<String>,
    #[serde(default)]
    pub collation: Option<String>,
    #[serde(default)]
    pub comment: Option<String>,
}

fn default_true() -> bool {
    true
}

impl ColumnDraft {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Id::new(),
            name: name.into(),
            data_type: None,
            length_scale: None,
            position: None,
            nullable: true,
            primary_key: false,
            auto_increment: false,
            charset: None,
            collation: None,
            comment: None,
        }
    }

    pub fn data_type(mut self, data_type: impl Into<String>) -> Self {
        self.data_type = Some(data_type.into());
        self
    }

    pub fn length_scale(mut self, length_scale: LengthScale) -> Self {
        self.length_scale = Some(length_scale);
        self
    }

    pub fn position(mut self, position: u32) -> Self {
        self.position = Some(position);
        self
    }

    pub fn not_null(mut self) -> Self {
        self.nullable = false;
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IndexColumnDraft {
    pub id: Id,
    pub column_id: Id,
    #[serde(default)]
    pub sort_dir: SortDir,
}

impl IndexColumnDraft {
    pub fn new(column_id: Id) -> Self {
        Self {
            id: Id::new(),
            column_id,
            sort_dir: SortDir::Asc,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct IndexDraft {
    pub id: Id,
    pub name: String,
    #[serde(default)]
    pub index_type: IndexType,
    /// Index columns in key order.
    pub columns: Vec<IndexColumnDraft>,
}

impl IndexDraft {
    pub fn new(name: impl Into<String>, column_ids: impl IntoIterator<Item = Id>) -> Self {
        Self {
            id: Id::new(),
            name: name.into(),
            index_type: IndexType::Btree,
            columns: column_ids.into_iter().map(IndexColumnDraft::new).collect(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConstraintColumnDraft {
    pub id: Id,
    pub column_id: Id,
}

impl ConstraintColumnDraft {
    pub fn new(column_id: Id) -> Self {
        Self {
            id: Id::new(),
            column_id,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ConstraintDraft {
    pub id: Id,
    pub name: String,
    pub kind: ConstraintKind,
    #[serde(default)]
    pub check_expr: Option<String>,
    #[serde(default)]
    pub default_expr: Option<String>,
    /// Constraint columns in key order.
    pub columns: Vec<ConstraintColumnDraft>,
}

impl ConstraintDraft {
    pub fn new(
        name: impl Into<String>,
        kind: ConstraintKind,
        column_ids: impl IntoIterator<Item = Id>,
    ) -> Self {
        Self {
            id: Id::new(),
            name: name.into(),
            kind,
            check_expr: None,
            default_expr: None,
            columns: column_ids.into_iter().map(ConstraintColumnDraft::new).collect(),
        }
    }

    pub fn check_expr(mut self, expr: impl Into<String>) -> Self {
        self.check_expr = Some(expr.into());
        self
    }

    pub fn default_expr(mut self, expr: impl Into<String>) -> Self {
        self.default_expr = Some(expr.into());
        self
    }
}

/// One requested foreign-key mapping.
///
/// `fk_column_id` may name an existing column of the holder table, which is
/// then reused; otherwise a column mirroring the referenced one is created
/// under that id, named `fk_column_name` or `{pk_table}_{pk_column}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RelationshipColumnDraft {
    pub id: Id,
    pub pk_column_id: Id,
    pub fk_column_id: Id,
    #[serde(default)]
    pub fk_column_name: Option<String>,
}

impl RelationshipColumnDraft {
    pub fn new(pk_column_id: Id) -> Self {
        Self {
            id: Id::new(),
            pk_column_id,
            fk_column_id: Id::new(),
            fk_column_name: None,
        }
    }

    /// Map onto an existing foreign-key column.
    pub fn existing(pk_column_id: Id, fk_column_id: Id) -> Self {
        Self {
            id: Id::new(),
            pk_column_id,
            fk_column_id,
            fk_column_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct RelationshipDraft {
    pub id: Id,
    pub fk_table_id: Id,
    pub pk_table_id: Id,
    pub name: String,
    pub kind: RelationshipKind,
    #[serde(default)]
    pub cardinality: Cardinality,
    #[serde(default)]
    pub on_delete: RefAction,
    #[serde(default)]
    pub on_update: RefAction,
    pub columns: Vec<RelationshipColumnDraft>,
}

impl RelationshipDraft {
    pub fn new(
        name: impl Into<String>,
        kind: RelationshipKind,
        fk_table_id: Id,
        pk_table_id: Id,
        pk_column_ids: impl IntoIterator<Item = Id>,
    ) -> Self {
        Self {
            id: Id::new(),
            fk_table_id,
            pk_table_id,
            name: name.into(),
            kind,
            cardinality: Cardinality::OneToMany,
            on_delete: RefAction::NoAction,
            on_update: RefAction::NoAction,
            columns: pk_column_ids
                .into_iter()
                .map(RelationshipColumnDraft::new)
                .collect(),
        }
    }

    pub fn on_delete(mut self, action: RefAction) -> Self {
        self.on_delete = action;
        self
    }

    pub fn on_update(mut self, action: RefAction) -> Self {
        self.on_update = action;
        self
    }

    pub fn cardinality(mut self, cardinality: Cardinality) -> Self {
        self.cardinality = cardinality;
        self
    }
}
