use std::collections::HashSet;

use tracing::debug;

use crate::cascade::FkSpec;
use crate::constraints::{Cardinality, RefAction, Relationship, RelationshipKind, resequence};
use crate::drafts::{RelationshipColumnDraft, RelationshipDraft};
use crate::edit::Edit;
use crate::error::{Error, Result};
use crate::graph::ensure_identifying_acyclic;
use crate::ids::Id;
use crate::naming::check_identifier;
use crate::schema::Table;

use super::column::types_compatible;

impl Edit<'_> {
    /// Relationship names are unique within the holding table.
    fn check_relationship_name(
        &self,
        schema_id: &Id,
        table_id: &Id,
        name: &str,
        exclude: Option<&Id>,
    ) -> Result<()> {
        check_identifier(name, self.config.naming.relationship).map_err(|rule| {
            Error::RelationshipNameInvalid {
                name: name.to_string(),
                rule,
            }
        })?;

        let table = self.table(schema_id, table_id)?;
        let taken = table
            .relationships
            .iter()
            .any(|relationship| relationship.name == name && Some(&relationship.id) != exclude);
        if taken {
            return Err(Error::RelationshipNameNotUnique {
                table_name: table.name.clone(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    fn relationship(&self, schema_id: &Id, relationship_id: &Id) -> Result<(&Table, &Relationship)> {
        self.schema(schema_id)?
            .relationship(relationship_id)
            .ok_or_else(|| Error::RelationshipNotExist {
                relationship_id: relationship_id.clone(),
            })
    }

    fn provider(&self, schema_id: &Id, table_id: &Id) -> Result<&Table> {
        self.schema(schema_id)?
            .table(table_id)
            .ok_or_else(|| Error::RelationshipTargetTableNotExist {
                table_id: table_id.clone(),
            })
    }

    fn relationship_mut(&mut self, schema_id: &Id, relationship_id: &Id) -> Result<&mut Relationship> {
        let holder_id = self.relationship(schema_id, relationship_id)?.0.id.clone();
        self.table_mut(schema_id, &holder_id)?
            .relationships
            .iter_mut()
            .find(|relationship| &relationship.id == relationship_id)
            .ok_or_else(|| Error::RelationshipNotExist {
                relationship_id: relationship_id.clone(),
            })
    }

    /// Check a stored relationship as if it were being created now.
    fn revalidate_relationship(&self, schema_id: &Id, relationship_id: &Id) -> Result<()> {
        let (holder, relationship) = self.relationship(schema_id, relationship_id)?;
        self.check_relationship_name(schema_id, &holder.id, &relationship.name, Some(relationship_id))?;
        let provider = self.provider(schema_id, &relationship.pk_table_id)?;
        if relationship.columns.is_empty() {
            return Err(Error::RelationshipEmptyColumn {
                name: relationship.name.clone(),
            });
        }

        let mut pk_seen = HashSet::new();
        let mut fk_seen = HashSet::new();
        for mapping in &relationship.columns {
            let referenced = provider.column(&mapping.pk_column_id).ok_or_else(|| {
                Error::ColumnNotExist {
                    table_id: provider.id.clone(),
                    column_id: mapping.pk_column_id.clone(),
                }
            })?;
            let fk_column = holder.column(&mapping.fk_column_id).ok_or_else(|| {
                Error::ColumnNotExist {
                    table_id: holder.id.clone(),
                    column_id: mapping.fk_column_id.clone(),
                }
            })?;
            if !pk_seen.insert(&mapping.pk_column_id) {
                return Err(Error::RelationshipColumnMappingDuplicate {
                    name: relationship.name.clone(),
                    column_id: mapping.pk_column_id.clone(),
                });
            }
            if !fk_seen.insert(&mapping.fk_column_id) {
                return Err(Error::RelationshipColumnNotUnique {
                    name: relationship.name.clone(),
                    column_id: mapping.fk_column_id.clone(),
                });
            }
            if !types_compatible(fk_column, referenced) {
                return Err(Error::RelationshipColumnTypeIncompatible {
                    fk_column: fk_column.name.clone(),
                    pk_column: referenced.name.clone(),
                });
            }
        }

        if relationship.is_identifying() {
            ensure_identifying_acyclic(
                self.schema(schema_id)?,
                &holder.id,
                &provider.id,
                Some(relationship_id),
            )?;
        }

        if relationship.uses_set_null() {
            if let Some(fk_column) = relationship
                .columns
                .iter()
                .find(|mapping| !holder.is_nullable(&mapping.fk_column_id))
                .and_then(|mapping| holder.column(&mapping.fk_column_id))
            {
                return Err(Error::RelationshipSetNullRequiresNullable {
                    name: relationship.name.clone(),
                    column: fk_column.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Map every unmapped key column of the provider, fold the foreign-key
    /// columns into the holder's primary key and push the new key columns
    /// further down the identifying chain.
    fn complete_identifying(&mut self, schema_id: &Id, relationship_id: &Id) -> Result<()> {
        let (holder, relationship) = self.relationship(schema_id, relationship_id)?;
        let holder_id = holder.id.clone();
        let provider_id = relationship.pk_table_id.clone();
        let missing: Vec<Id> = self
            .provider(schema_id, &provider_id)?
            .primary_key_columns()
            .into_iter()
            .filter(|column_id| !relationship.maps_pk_column(column_id))
            .collect();

        for pk_column_id in missing {
            self.attach_foreign_key(
                schema_id,
                &holder_id,
                relationship_id,
                &provider_id,
                FkSpec::fresh(pk_column_id),
            )?;
        }

        let (holder, relationship) = self.relationship(schema_id, relationship_id)?;
        let fk_columns = relationship.fk_column_ids();
        let new_keys: Vec<Id> = fk_columns
            .iter()
            .filter(|column_id| !holder.is_primary_key_column(column_id))
            .cloned()
            .collect();
        self.add_to_primary_key(schema_id, &holder_id, &fk_columns)?;
        if !new_keys.is_empty() {
            self.propagate_keys(schema_id, &holder_id, new_keys)?;
        }
        Ok(())
    }

    /// Detach foreign-key columns no relationship of the holder maps any
    /// more, cascading into tables that referenced them.
    fn release_fk_columns(&mut self, schema_id: &Id, holder_id: &Id, fk_columns: Vec<Id>) -> Result<()> {
        let holder = self.table(schema_id, holder_id)?;
        let orphaned: Vec<Id> = fk_columns
            .into_iter()
            .filter(|column_id| {
                !holder
                    .relationships
                    .iter()
                    .any(|relationship| relationship.maps_fk_column(column_id))
            })
            .collect();
        if orphaned.is_empty() {
            return Ok(());
        }

        let seeds = orphaned
            .iter()
            .map(|column_id| (holder_id.clone(), column_id.clone()))
            .collect();
        self.cascade_key_removal(schema_id, seeds, false)?;
        let holder = self.table_mut(schema_id, holder_id)?;
        for column_id in &orphaned {
            holder.detach_column(column_id);
        }
        Ok(())
    }

    pub(crate) fn create_relationship(&mut self, schema_id: &Id, draft: RelationshipDraft) -> Result<()> {
        let holder = self.table(schema_id, &draft.fk_table_id)?;
        let provider = self.provider(schema_id, &draft.pk_table_id)?;
        self.check_relationship_name(schema_id, &draft.fk_table_id, &draft.name, None)?;
        self.ensure_fresh_id("relationship", &draft.id)?;
        if draft.columns.is_empty() {
            return Err(Error::RelationshipEmptyColumn { name: draft.name });
        }

        let mut pk_seen = HashSet::new();
        let mut fk_seen = HashSet::new();
        for mapping in &draft.columns {
            let referenced = provider.column(&mapping.pk_column_id).ok_or_else(|| {
                Error::ColumnNotExist {
                    table_id: provider.id.clone(),
                    column_id: mapping.pk_column_id.clone(),
                }
            })?;
            if !pk_seen.insert(&mapping.pk_column_id) {
                return Err(Error::RelationshipColumnMappingDuplicate {
                    name: draft.name.clone(),
                    column_id: mapping.pk_column_id.clone(),
                });
            }
            if !fk_seen.insert(&mapping.fk_column_id) {
                return Err(Error::RelationshipColumnNotUnique {
                    name: draft.name.clone(),
                    column_id: mapping.fk_column_id.clone(),
                });
            }
            if let Some(existing) = holder.column(&mapping.fk_column_id) {
                if !types_compatible(existing, referenced) {
                    return Err(Error::RelationshipColumnTypeIncompatible {
                        fk_column: existing.name.clone(),
                        pk_column: referenced.name.clone(),
                    });
                }
            }
        }
        if draft.kind == RelationshipKind::Identifying {
            ensure_identifying_acyclic(
                self.schema(schema_id)?,
                &draft.fk_table_id,
                &draft.pk_table_id,
                None,
            )?;
        }

        let relationship_id = draft.id.clone();
        let holder_id = draft.fk_table_id.clone();
        let provider_id = draft.pk_table_id.clone();
        self.table_mut(schema_id, &holder_id)?
            .relationships
            .push(Relationship {
                id: draft.id,
                fk_table_id: draft.fk_table_id,
                pk_table_id: draft.pk_table_id,
                name: draft.name,
                kind: draft.kind,
                cardinality: draft.cardinality,
                on_delete: draft.on_delete,
                on_update: draft.on_update,
                columns: Vec::new(),
            });
        for mapping in draft.columns {
            self.attach_foreign_key(
                schema_id,
                &holder_id,
                &relationship_id,
                &provider_id,
                FkSpec {
                    mapping_id: mapping.id,
                    fk_column_id: mapping.fk_column_id,
                    fk_column_name: mapping.fk_column_name,
                    pk_column_id: mapping.pk_column_id,
                },
            )?;
        }
        if draft.kind == RelationshipKind::Identifying {
            self.complete_identifying(schema_id, &relationship_id)?;
        }

        self.revalidate_relationship(schema_id, &relationship_id)
    }

    /// Delete a relationship together with the foreign-key columns it owns.
    pub(crate) fn delete_relationship(&mut self, schema_id: &Id, relationship_id: &Id) -> Result<()> {
        let holder_id = self.relationship(schema_id, relationship_id)?.0.id.clone();
        let holder = self.table_mut(schema_id, &holder_id)?;
        let Some(position) = holder
            .relationships
            .iter()
            .position(|relationship| &relationship.id == relationship_id)
        else {
            return Ok(());
        };
        let removed = holder.relationships.remove(position);
        debug!(relationship = %removed.name, "relationship removed");

        self.release_fk_columns(schema_id, &holder_id, removed.fk_column_ids())
    }

    pub(crate) fn change_relationship_name(
        &mut self,
        schema_id: &Id,
        relationship_id: &Id,
        name: &str,
    ) -> Result<()> {
        let holder_id = self.relationship(schema_id, relationship_id)?.0.id.clone();
        self.check_relationship_name(schema_id, &holder_id, name, Some(relationship_id))?;
        self.relationship_mut(schema_id, relationship_id)?.name = name.to_string();
        Ok(())
    }

    pub(crate) fn change_relationship_cardinality(
        &mut self,
        schema_id: &Id,
        relationship_id: &Id,
        cardinality: Cardinality,
    ) -> Result<()> {
        self.relationship_mut(schema_id, relationship_id)?.cardinality = cardinality;
        self.revalidate_relationship(schema_id, relationship_id)
    }

    pub(crate) fn change_relationship_actions(
        &mut self,
        schema_id: &Id,
        relationship_id: &Id,
        on_delete: RefAction,
        on_update: RefAction,
    ) -> Result<()> {
        let relationship = self.relationship_mut(schema_id, relationship_id)?;
        relationship.on_delete = on_delete;
        relationship.on_update = on_update;
        self.revalidate_relationship(schema_id, relationship_id)
    }

    /// Flip between IDENTIFYING and NON_IDENTIFYING.
    ///
    /// Becoming identifying folds the foreign-key columns into the holder's
    /// primary key and propagates them; the reverse flip takes exactly those
    /// columns out of the key again and removes what was derived from them.
    pub(crate) fn change_relationship_kind(
        &mut self,
        schema_id: &Id,
        relationship_id: &Id,
        kind: RelationshipKind,
    ) -> Result<()> {
        let (holder, relationship) = self.relationship(schema_id, relationship_id)?;
        if relationship.kind == kind {
            return Ok(());
        }
        let holder_id = holder.id.clone();

        match kind {
            RelationshipKind::Identifying => {
                ensure_identifying_acyclic(
                    self.schema(schema_id)?,
                    &holder_id,
                    &relationship.pk_table_id,
                    Some(relationship_id),
                )?;
                self.relationship_mut(schema_id, relationship_id)?.kind = kind;
                self.complete_identifying(schema_id, relationship_id)?;
            }
            RelationshipKind::NonIdentifying => {
                let released: Vec<Id> = relationship
                    .fk_column_ids()
                    .into_iter()
                    .filter(|column_id| {
                        holder.is_primary_key_column(column_id)
                            && !holder.relationships.iter().any(|other| {
                                &other.id != relationship_id
                                    && other.is_identifying()
                                    && other.maps_fk_column(column_id)
                            })
                    })
                    .collect();
                self.relationship_mut(schema_id, relationship_id)?.kind = kind;
                self.remove_from_primary_key(schema_id, &holder_id, &released)?;
                let seeds = released
                    .into_iter()
                    .map(|column_id| (holder_id.clone(), column_id))
                    .collect();
                self.cascade_key_removal(schema_id, seeds, true)?;
            }
        }

        self.revalidate_relationship(schema_id, relationship_id)
    }

    /// Map one more referenced column; on an identifying relationship the
    /// foreign-key column joins the holder's key.
    pub(crate) fn add_column_to_relationship(
        &mut self,
        schema_id: &Id,
        relationship_id: &Id,
        draft: RelationshipColumnDraft,
    ) -> Result<()> {
        let (holder, relationship) = self.relationship(schema_id, relationship_id)?;
        let provider = self.provider(schema_id, &relationship.pk_table_id)?;
        let referenced = provider.column(&draft.pk_column_id).ok_or_else(|| Error::ColumnNotExist {
            table_id: provider.id.clone(),
            column_id: draft.pk_column_id.clone(),
        })?;
        if relationship.maps_pk_column(&draft.pk_column_id) {
            return Err(Error::RelationshipColumnMappingDuplicate {
                name: relationship.name.clone(),
                column_id: draft.pk_column_id,
            });
        }
        if relationship.maps_fk_column(&draft.fk_column_id) {
            return Err(Error::RelationshipColumnNotUnique {
                name: relationship.name.clone(),
                column_id: draft.fk_column_id,
            });
        }
        if let Some(existing) = holder.column(&draft.fk_column_id) {
            if !types_compatible(existing, referenced) {
                return Err(Error::RelationshipColumnTypeIncompatible {
                    fk_column: existing.name.clone(),
                    pk_column: referenced.name.clone(),
                });
            }
        }

        let holder_id = holder.id.clone();
        let provider_id = provider.id.clone();
        let identifying = relationship.is_identifying();
        let fk_column_id = self.attach_foreign_key(
            schema_id,
            &holder_id,
            relationship_id,
            &provider_id,
            FkSpec {
                mapping_id: draft.id,
                fk_column_id: draft.fk_column_id,
                fk_column_name: draft.fk_column_name,
                pk_column_id: draft.pk_column_id,
            },
        )?;

        if identifying && !self.table(schema_id, &holder_id)?.is_primary_key_column(&fk_column_id) {
            self.add_to_primary_key(schema_id, &holder_id, std::slice::from_ref(&fk_column_id))?;
            self.propagate_keys(schema_id, &holder_id, vec![fk_column_id])?;
        }
        self.revalidate_relationship(schema_id, relationship_id)
    }

    /// Drop one mapping; the last mapping takes the relationship with it.
    pub(crate) fn remove_column_from_relationship(
        &mut self,
        schema_id: &Id,
        relationship_id: &Id,
        relationship_column_id: &Id,
    ) -> Result<()> {
        let (holder, relationship) = self.relationship(schema_id, relationship_id)?;
        let mapping = relationship
            .columns
            .iter()
            .find(|mapping| &mapping.id == relationship_column_id)
            .ok_or_else(|| Error::RelationshipColumnNotExist {
                relationship_id: relationship_id.clone(),
                relationship_column_id: relationship_column_id.clone(),
            })?;
        if relationship.is_identifying() {
            let provider = self.provider(schema_id, &relationship.pk_table_id)?;
            if provider.is_primary_key_column(&mapping.pk_column_id) {
                let column = holder
                    .column(&mapping.fk_column_id)
                    .map(|column| column.name.clone())
                    .unwrap_or_else(|| mapping.fk_column_id.to_string());
                return Err(Error::ForeignKeyColumnRequired {
                    column,
                    relationship: relationship.name.clone(),
                });
            }
        }

        let holder_id = holder.id.clone();
        let fk_column_id = mapping.fk_column_id.clone();
        let holder = self.table_mut(schema_id, &holder_id)?;
        for relationship in holder
            .relationships
            .iter_mut()
            .filter(|relationship| &relationship.id == relationship_id)
        {
            relationship
                .columns
                .retain(|mapping| &mapping.id != relationship_column_id);
            resequence(&mut relationship.columns, |mapping| &mut mapping.seq_no);
        }
        holder
            .relationships
            .retain(|relationship| !relationship.columns.is_empty());

        self.release_fk_columns(schema_id, &holder_id, vec![fk_column_id])
    }
}
