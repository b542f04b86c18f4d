//! Cascades along foreign-key mappings.
//!
//! All traversals are worklists with a visited set owned by the traversal.
//! Identifying edges are acyclic by construction, so the visited set only
//! guards against malformed snapshots and self-references.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, trace};

use crate::constraints::{RelationshipColumn, resequence};
use crate::edit::{Edit, sanitize_identifier};
use crate::error::{Error, Result};
use crate::ids::Id;
use crate::naming::unique_name;
use crate::schema::Column;
use crate::types::LengthScale;

/// A foreign-key column to attach to a relationship.
pub(crate) struct FkSpec {
    pub mapping_id: Id,
    pub fk_column_id: Id,
    pub fk_column_name: Option<String>,
    pub pk_column_id: Id,
}

impl FkSpec {
    pub(crate) fn fresh(pk_column_id: Id) -> Self {
        Self {
            mapping_id: Id::new(),
            fk_column_id: Id::new(),
            fk_column_name: None,
            pk_column_id,
        }
    }
}

impl Edit<'_> {
    /// Map `spec.pk_column_id` of the relationship's provider onto a column
    /// of the holder and append the mapping to the relationship.
    ///
    /// An existing holder column is reused; otherwise a column mirroring the
    /// referenced one is appended. Returns the foreign-key column id.
    pub(crate) fn attach_foreign_key(
        &mut self,
        schema_id: &Id,
        holder_id: &Id,
        relationship_id: &Id,
        provider_id: &Id,
        spec: FkSpec,
    ) -> Result<Id> {
        let provider = self.table(schema_id, provider_id)?;
        let provider_name = provider.name.clone();
        let source = provider
            .column(&spec.pk_column_id)
            .cloned()
            .ok_or_else(|| Error::ColumnNotExist {
                table_id: provider_id.clone(),
                column_id: spec.pk_column_id.clone(),
            })?;

        let holder = self.table(schema_id, holder_id)?;
        let reuse = holder.column(&spec.fk_column_id).is_some();
        if !reuse {
            self.ensure_fresh_id("column", &spec.fk_column_id)?;
            let name = match spec.fk_column_name {
                Some(name) => {
                    self.check_column_name(schema_id, holder_id, &name, None)?;
                    name
                }
                None => {
                    let base = format!(
                        "{}_{}",
                        sanitize_identifier(&provider_name),
                        sanitize_identifier(&source.name)
                    );
                    unique_name(&base, self.config.naming.column.max, &holder.column_names())
                }
            };
            let column = mirror_column(&source, spec.fk_column_id.clone(), holder_id.clone(), name);
            let holder = self.table_mut(schema_id, holder_id)?;
            holder.columns.push(column);
            holder.resequence_columns();
        }

        self.ensure_fresh_id("relationship column", &spec.mapping_id)?;
        let holder = self.table_mut(schema_id, holder_id)?;
        let relationship = holder
            .relationships
            .iter_mut()
            .find(|relationship| &relationship.id == relationship_id)
            .ok_or_else(|| Error::RelationshipNotExist {
                relationship_id: relationship_id.clone(),
            })?;
        let seq_no = relationship.columns.len() as u32 + 1;
        relationship.columns.push(RelationshipColumn {
            id: spec.mapping_id,
            fk_column_id: spec.fk_column_id.clone(),
            pk_column_id: spec.pk_column_id,
            seq_no,
        });

        Ok(spec.fk_column_id)
    }

    /// Mirror new key columns of `provider_id` into every table that depends
    /// on it through an IDENTIFYING relationship, transitively.
    ///
    /// Each recipient gains one column per key column its relationship does
    /// not map yet; the column joins the recipient's primary key, which makes
    /// it a new key column for the recipient's own dependents.
    pub(crate) fn propagate_keys(
        &mut self,
        schema_id: &Id,
        provider_id: &Id,
        key_column_ids: Vec<Id>,
    ) -> Result<usize> {
        let mut worklist: VecDeque<(Id, Vec<Id>)> = VecDeque::new();
        let mut visited: HashSet<(Id, Id)> = key_column_ids
            .iter()
            .map(|column_id| (provider_id.clone(), column_id.clone()))
            .collect();
        worklist.push_back((provider_id.clone(), key_column_ids));
        let mut synthesized = 0_usize;

        while let Some((provider, key_columns)) = worklist.pop_front() {
            let dependents: Vec<(Id, Id)> = self
                .schema(schema_id)?
                .relationships_referencing(&provider)
                .filter(|relationship| {
                    relationship.is_identifying() && relationship.fk_table_id != provider
                })
                .map(|relationship| (relationship.fk_table_id.clone(), relationship.id.clone()))
                .collect();

            for (holder_id, relationship_id) in dependents {
                let mut added = Vec::new();
                for key_column in &key_columns {
                    let already_mapped = self
                        .table(schema_id, &holder_id)?
                        .relationship(&relationship_id)
                        .is_some_and(|relationship| relationship.maps_pk_column(key_column));
                    if already_mapped {
                        continue;
                    }
                    let fk_column_id = self.attach_foreign_key(
                        schema_id,
                        &holder_id,
                        &relationship_id,
                        &provider,
                        FkSpec::fresh(key_column.clone()),
                    )?;
                    added.push(fk_column_id);
                }

                if added.is_empty() {
                    continue;
                }
                synthesized += added.len();
                self.add_to_primary_key(schema_id, &holder_id, &added)?;
                trace!(
                    table = %holder_id,
                    relationship = %relationship_id,
                    columns = added.len(),
                    "propagated key columns"
                );

                let fresh: Vec<Id> = added
                    .into_iter()
                    .filter(|column_id| visited.insert((holder_id.clone(), column_id.clone())))
                    .collect();
                if !fresh.is_empty() {
                    worklist.push_back((holder_id, fresh));
                }
            }
        }

        if synthesized > 0 {
            debug!(provider = %provider_id, synthesized, "key propagation finished");
        }
        Ok(synthesized)
    }

    /// Remove every foreign-key column that mirrors one of the `seeds`
    /// (`(table, column)` pairs), transitively.
    ///
    /// `seeds_survive` marks seeds that stay in their table and only stopped
    /// being keys; for them only IDENTIFYING relationships are followed.
    /// Seeds that are being deleted, and every column detached on the way,
    /// take all referencing relationships along.
    ///
    /// The mapping is dropped from its relationship, relationships left
    /// without mappings are removed, and the foreign-key column is detached
    /// unless another relationship on the same table still maps it. A
    /// detached column becomes the next seed.
    pub(crate) fn cascade_key_removal(
        &mut self,
        schema_id: &Id,
        seeds: Vec<(Id, Id)>,
        seeds_survive: bool,
    ) -> Result<usize> {
        let mut visited: HashSet<(Id, Id)> = seeds.iter().cloned().collect();
        let mut worklist: VecDeque<(Id, Id, bool)> = seeds
            .into_iter()
            .map(|(table_id, column_id)| (table_id, column_id, seeds_survive))
            .collect();
        let mut removed = 0_usize;

        while let Some((provider, key_column, survives)) = worklist.pop_front() {
            let key = &key_column;
            let dependents: Vec<(Id, Id, Id)> = self
                .schema(schema_id)?
                .relationships_referencing(&provider)
                .filter(|relationship| !survives || relationship.is_identifying())
                .flat_map(move |relationship| {
                    relationship
                        .columns
                        .iter()
                        .filter(move |column| &column.pk_column_id == key)
                        .map(move |column| {
                            (
                                relationship.fk_table_id.clone(),
                                relationship.id.clone(),
                                column.fk_column_id.clone(),
                            )
                        })
                })
                .collect();

            for (holder_id, relationship_id, fk_column_id) in dependents {
                let holder = self.table_mut(schema_id, &holder_id)?;
                if let Some(relationship) = holder
                    .relationships
                    .iter_mut()
                    .find(|relationship| relationship.id == relationship_id)
                {
                    relationship.columns.retain(|column| {
                        !(column.fk_column_id == fk_column_id && column.pk_column_id == key_column)
                    });
                    resequence(&mut relationship.columns, |column| &mut column.seq_no);
                }
                holder
                    .relationships
                    .retain(|relationship| !relationship.columns.is_empty());

                let still_mapped = holder
                    .relationships
                    .iter()
                    .any(|relationship| relationship.maps_fk_column(&fk_column_id));
                if still_mapped {
                    continue;
                }

                if holder.detach_column(&fk_column_id).is_some() {
                    removed += 1;
                    trace!(table = %holder_id, column = %fk_column_id, "removed foreign-key column");
                }
                if visited.insert((holder_id.clone(), fk_column_id.clone())) {
                    worklist.push_back((holder_id, fk_column_id, false));
                }
            }
        }

        if removed > 0 {
            debug!(removed, "foreign-key cascade finished");
        }
        Ok(removed)
    }

    /// Copy the type of a referenced column into every foreign-key column
    /// mirroring it, transitively.
    pub(crate) fn mirror_type_change(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
        data_type: Option<String>,
        length_scale: Option<LengthScale>,
    ) -> Result<()> {
        let mut worklist: VecDeque<(Id, Id)> = VecDeque::from([(table_id.clone(), column_id.clone())]);
        let mut visited: HashSet<(Id, Id)> = HashSet::from([(table_id.clone(), column_id.clone())]);

        while let Some((provider, key_column)) = worklist.pop_front() {
            let key = &key_column;
            let dependents: Vec<(Id, Id)> = self
                .schema(schema_id)?
                .relationships_referencing(&provider)
                .flat_map(move |relationship| {
                    relationship
                        .columns
                        .iter()
                        .filter(move |column| &column.pk_column_id == key)
                        .map(move |column| {
                            (relationship.fk_table_id.clone(), column.fk_column_id.clone())
                        })
                })
                .collect();

            for (holder_id, fk_column_id) in dependents {
                let holder = self.table_mut(schema_id, &holder_id)?;
                if let Some(column) = holder
                    .columns
                    .iter_mut()
                    .find(|column| column.id == fk_column_id)
                {
                    column.data_type = data_type.clone();
                    column.length_scale = length_scale;
                }
                if visited.insert((holder_id.clone(), fk_column_id.clone())) {
                    worklist.push_back((holder_id, fk_column_id));
                }
            }
        }

        Ok(())
    }
}

/// Foreign-key column copying the type attributes of `source`.
fn mirror_column(source: &Column, id: Id, table_id: Id, name: String) -> Column {
    Column {
        id,
        table_id,
        name,
        ordinal_position: 0,
        data_type: source.data_type.clone(),
        length_scale: source.length_scale,
        is_auto_increment: false,
        charset: source.charset.clone(),
        collation: source.collation.clone(),
        comment: None,
    }
}
