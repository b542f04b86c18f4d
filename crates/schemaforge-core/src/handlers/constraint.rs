use std::collections::HashSet;

use crate::constraints::{Constraint, ConstraintColumn, ConstraintKind, resequence};
use crate::drafts::{ConstraintColumnDraft, ConstraintDraft};
use crate::edit::{Edit, ensure_key_not_restated};
use crate::error::{Error, Result};
use crate::ids::Id;
use crate::naming::check_identifier;
use crate::schema::Table;

impl Edit<'_> {
    /// Constraint names share one namespace per schema.
    fn check_constraint_name(&self, schema_id: &Id, name: &str, exclude: Option<&Id>) -> Result<()> {
        check_identifier(name, self.config.naming.constraint).map_err(|rule| {
            Error::ConstraintNameInvalid {
                name: name.to_string(),
                rule,
            }
        })?;

        let taken = self
            .schema(schema_id)?
            .constraints()
            .any(|constraint| constraint.name == name && Some(&constraint.id) != exclude);
        if taken {
            return Err(Error::ConstraintNameNotUnique {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Key and NOT NULL constraints may not cover columns a SET NULL
    /// relationship needs nullable.
    fn ensure_nullability_allowed(
        &self,
        schema_id: &Id,
        table_id: &Id,
        kind: ConstraintKind,
        column_ids: &[Id],
    ) -> Result<()> {
        if matches!(kind, ConstraintKind::PrimaryKey | ConstraintKind::NotNull) {
            for column_id in column_ids {
                self.ensure_not_set_null_target(schema_id, table_id, column_id)?;
            }
        }
        Ok(())
    }

    pub(crate) fn create_constraint(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        draft: ConstraintDraft,
    ) -> Result<()> {
        let table = self.table(schema_id, table_id)?;
        self.check_constraint_name(schema_id, &draft.name, None)?;
        self.ensure_fresh_id("constraint", &draft.id)?;

        if draft.columns.is_empty() {
            return Err(Error::ConstraintColumnsEmpty { name: draft.name });
        }
        if draft.kind.is_single_column() && draft.columns.len() != 1 {
            return Err(Error::ConstraintSingleColumnRequired {
                name: draft.name,
                kind: draft.kind,
            });
        }
        let expression = match draft.kind {
            ConstraintKind::Check => draft.check_expr.as_deref(),
            ConstraintKind::Default => draft.default_expr.as_deref(),
            _ => Some("-"),
        };
        if !expression.is_some_and(|expr| !expr.trim().is_empty()) {
            return Err(Error::ConstraintExpressionRequired {
                name: draft.name,
                kind: draft.kind,
            });
        }
        if draft.kind == ConstraintKind::PrimaryKey && table.primary_key().is_some() {
            return Err(Error::ConstraintMultiplePrimaryKey {
                table_name: table.name.clone(),
            });
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(draft.columns.len());
        for (position, column) in draft.columns.into_iter().enumerate() {
            self.column(schema_id, table_id, &column.column_id)?;
            self.ensure_fresh_id("constraint column", &column.id)?;
            if !seen.insert(column.column_id.clone()) {
                return Err(Error::ConstraintColumnNotUnique {
                    name: draft.name,
                    column_id: column.column_id,
                });
            }
            columns.push(ConstraintColumn {
                id: column.id,
                column_id: column.column_id,
                seq_no: position as u32 + 1,
            });
        }
        let column_ids: Vec<Id> = columns.iter().map(|column| column.column_id.clone()).collect();
        self.ensure_nullability_allowed(schema_id, table_id, draft.kind, &column_ids)?;

        let constraint_id = draft.id.clone();
        let kind = draft.kind;
        let (check_expr, default_expr) = match kind {
            ConstraintKind::Check => (draft.check_expr, None),
            ConstraintKind::Default => (None, draft.default_expr),
            _ => (None, None),
        };
        let table = self.table_mut(schema_id, table_id)?;
        table.constraints.push(Constraint {
            id: draft.id,
            table_id: table_id.clone(),
            name: draft.name,
            kind,
            check_expr,
            default_expr,
            columns,
        });
        ensure_distinct_key(table, &constraint_id)?;

        if kind == ConstraintKind::PrimaryKey {
            self.propagate_keys(schema_id, table_id, column_ids)?;
        }
        Ok(())
    }

    /// Delete a constraint; dropping a primary key removes every
    /// foreign-key column derived from it.
    pub(crate) fn delete_constraint(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        constraint_id: &Id,
    ) -> Result<()> {
        let constraint = constraint_mut(self.table_mut(schema_id, table_id)?, constraint_id)?;
        let is_primary_key = constraint.is_primary_key();
        let column_ids = constraint.column_ids();

        if is_primary_key {
            for column_id in &column_ids {
                self.ensure_key_column_removable(schema_id, table_id, column_id)?;
            }
        }
        self.table_mut(schema_id, table_id)?
            .constraints
            .retain(|constraint| &constraint.id != constraint_id);

        if is_primary_key {
            let seeds = column_ids
                .into_iter()
                .map(|column_id| (table_id.clone(), column_id))
                .collect();
            self.cascade_key_removal(schema_id, seeds, true)?;
        }
        Ok(())
    }

    pub(crate) fn change_constraint_name(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        constraint_id: &Id,
        name: &str,
    ) -> Result<()> {
        constraint_mut(self.table_mut(schema_id, table_id)?, constraint_id)?;
        self.check_constraint_name(schema_id, name, Some(constraint_id))?;
        constraint_mut(self.table_mut(schema_id, table_id)?, constraint_id)?.name = name.to_string();
        Ok(())
    }

    /// Add a column to a constraint; a primary-key column is propagated to
    /// identifying dependents.
    pub(crate) fn add_column_to_constraint(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        constraint_id: &Id,
        draft: ConstraintColumnDraft,
    ) -> Result<()> {
        self.column(schema_id, table_id, &draft.column_id)?;
        self.ensure_fresh_id("constraint column", &draft.id)?;
        let kind = constraint_mut(self.table_mut(schema_id, table_id)?, constraint_id)?.kind;
        self.ensure_nullability_allowed(
            schema_id,
            table_id,
            kind,
            std::slice::from_ref(&draft.column_id),
        )?;

        let column_id = draft.column_id.clone();
        let table = self.table_mut(schema_id, table_id)?;
        let constraint = constraint_mut(table, constraint_id)?;
        if constraint.contains_column(&draft.column_id) {
            return Err(Error::ConstraintColumnNotUnique {
                name: constraint.name.clone(),
                column_id: draft.column_id,
            });
        }
        if kind.is_single_column() {
            return Err(Error::ConstraintSingleColumnRequired {
                name: constraint.name.clone(),
                kind,
            });
        }
        let seq_no = constraint.columns.len() as u32 + 1;
        constraint.columns.push(ConstraintColumn {
            id: draft.id,
            column_id: draft.column_id,
            seq_no,
        });
        ensure_distinct_key(table, constraint_id)?;

        if kind == ConstraintKind::PrimaryKey {
            self.propagate_keys(schema_id, table_id, vec![column_id])?;
        }
        Ok(())
    }

    /// Remove a column from a constraint; an emptied constraint is deleted.
    /// Removing a primary-key column cascades into dependent tables.
    pub(crate) fn remove_column_from_constraint(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        constraint_id: &Id,
        constraint_column_id: &Id,
    ) -> Result<()> {
        let constraint = constraint_mut(self.table_mut(schema_id, table_id)?, constraint_id)?;
        let is_primary_key = constraint.is_primary_key();
        let column_id = constraint
            .columns
            .iter()
            .find(|column| &column.id == constraint_column_id)
            .map(|column| column.column_id.clone())
            .ok_or_else(|| Error::ConstraintColumnNotExist {
                constraint_id: constraint_id.clone(),
                constraint_column_id: constraint_column_id.clone(),
            })?;
        if is_primary_key {
            self.ensure_key_column_removable(schema_id, table_id, &column_id)?;
        }

        let table = self.table_mut(schema_id, table_id)?;
        let constraint = constraint_mut(table, constraint_id)?;
        constraint
            .columns
            .retain(|column| &column.id != constraint_column_id);
        resequence(&mut constraint.columns, |column| &mut column.seq_no);
        if constraint.columns.is_empty() {
            table
                .constraints
                .retain(|constraint| &constraint.id != constraint_id);
        } else {
            ensure_distinct_key(table, constraint_id)?;
        }

        if is_primary_key {
            self.cascade_key_removal(schema_id, vec![(table_id.clone(), column_id)], true)?;
        }
        Ok(())
    }
}

fn constraint_mut<'t>(table: &'t mut Table, constraint_id: &Id) -> Result<&'t mut Constraint> {
    let table_id = table.id.clone();
    table
        .constraints
        .iter_mut()
        .find(|constraint| &constraint.id == constraint_id)
        .ok_or_else(|| Error::ConstraintNotExist {
            table_id,
            constraint_id: constraint_id.clone(),
        })
}

/// Reject a constraint duplicating another one of the table, and UNIQUE
/// constraints restating the primary key.
fn ensure_distinct_key(table: &Table, constraint_id: &Id) -> Result<()> {
    let Some(constraint) = table.constraint(constraint_id) else {
        return Ok(());
    };
    let signature = constraint.signature();
    if let Some(existing) = table
        .constraints
        .iter()
        .find(|other| &other.id != constraint_id && other.signature() == signature)
    {
        return Err(Error::DuplicateKeyDefinition {
            name: constraint.name.clone(),
            existing: existing.name.clone(),
        });
    }

    ensure_key_not_restated(table)
}
