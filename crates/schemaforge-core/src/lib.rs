//! Consistency engine for relational schema designs.
//!
//! A design is an immutable [`Database`] snapshot. [`SchemaEditor`] applies
//! one design operation at a time and returns a new snapshot, keeping
//! naming, key propagation along IDENTIFYING relationships and cascading
//! foreign-key removal consistent. Failed operations leave the input
//! snapshot untouched.

pub mod builders;
mod cascade;
pub mod config;
pub mod constraints;
pub mod drafts;
mod edit;
pub mod editor;
pub mod error;
pub mod graph;
mod handlers;
pub mod ids;
pub mod naming;
pub mod operation;
pub mod schema;
pub mod types;
pub mod validation;

pub use config::{EditorConfig, LengthBounds, NamingRules};
pub use constraints::{
    Cardinality, Constraint, ConstraintColumn, ConstraintKind, Index, IndexColumn, IndexType,
    RefAction, Relationship, RelationshipColumn, RelationshipKind, SortDir,
};
pub use drafts::{
    ColumnDraft, ConstraintColumnDraft, ConstraintDraft, IndexColumnDraft, IndexDraft,
    RelationshipColumnDraft, RelationshipDraft, SchemaDraft, TableDraft,
};
pub use editor::SchemaEditor;
pub use error::{Error, ErrorFamily, NameRule, Result};
pub use graph::{IdentifyingGraphReport, IdentifyingGraphSummary, identifying_order};
pub use ids::Id;
pub use operation::{Envelope, ErrorBody, Operation};
pub use schema::{Column, Database, Schema, Table};
pub use types::{DbVendor, LengthScale};
pub use validation::validate_database;

/// Current contract version for serialized design snapshots.
pub const SNAPSHOT_VERSION: &str = "0.1";
