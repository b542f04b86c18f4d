use std::collections::HashSet;

use crate::constraints::{Index, IndexColumn, SortDir, resequence};
use crate::drafts::{IndexColumnDraft, IndexDraft};
use crate::edit::Edit;
use crate::error::{Error, Result};
use crate::ids::Id;
use crate::naming::check_identifier;
use crate::schema::Table;

impl Edit<'_> {
    /// Index names share one namespace per schema.
    fn check_index_name(&self, schema_id: &Id, name: &str, exclude: Option<&Id>) -> Result<()> {
        check_identifier(name, self.config.naming.index).map_err(|rule| Error::IndexNameInvalid {
            name: name.to_string(),
            rule,
        })?;

        let taken = self
            .schema(schema_id)?
            .indexes()
            .any(|index| index.name == name && Some(&index.id) != exclude);
        if taken {
            return Err(Error::IndexNameNotUnique {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn create_index(&mut self, schema_id: &Id, table_id: &Id, draft: IndexDraft) -> Result<()> {
        let vendor = self.schema(schema_id)?.vendor;
        self.table(schema_id, table_id)?;
        self.check_index_name(schema_id, &draft.name, None)?;
        self.ensure_fresh_id("index", &draft.id)?;
        if !vendor.supports_index_type(draft.index_type) {
            return Err(Error::IndexTypeNotSupported {
                index_type: draft.index_type,
                vendor,
            });
        }
        if draft.columns.is_empty() {
            return Err(Error::IndexColumnsEmpty { name: draft.name });
        }

        let mut seen = HashSet::new();
        let mut columns = Vec::with_capacity(draft.columns.len());
        for (position, column) in draft.columns.into_iter().enumerate() {
            self.column(schema_id, table_id, &column.column_id)?;
            self.ensure_fresh_id("index column", &column.id)?;
            if !seen.insert(column.column_id.clone()) {
                return Err(Error::IndexColumnNotUnique {
                    name: draft.name,
                    column_id: column.column_id,
                });
            }
            columns.push(IndexColumn {
                id: column.id,
                column_id: column.column_id,
                seq_no: position as u32 + 1,
                sort_dir: column.sort_dir,
            });
        }

        let index_id = draft.id.clone();
        let table = self.table_mut(schema_id, table_id)?;
        table.indexes.push(Index {
            id: draft.id,
            table_id: table_id.clone(),
            name: draft.name,
            index_type: draft.index_type,
            columns,
        });
        ensure_distinct_definition(table, &index_id)
    }

    pub(crate) fn delete_index(&mut self, schema_id: &Id, table_id: &Id, index_id: &Id) -> Result<()> {
        index_mut(self.table_mut(schema_id, table_id)?, index_id)?;
        self.table_mut(schema_id, table_id)?
            .indexes
            .retain(|index| &index.id != index_id);
        Ok(())
    }

    pub(crate) fn change_index_name(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        index_id: &Id,
        name: &str,
    ) -> Result<()> {
        index_mut(self.table_mut(schema_id, table_id)?, index_id)?;
        self.check_index_name(schema_id, name, Some(index_id))?;
        index_mut(self.table_mut(schema_id, table_id)?, index_id)?.name = name.to_string();
        Ok(())
    }

    pub(crate) fn add_column_to_index(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        index_id: &Id,
        draft: IndexColumnDraft,
    ) -> Result<()> {
        self.column(schema_id, table_id, &draft.column_id)?;
        self.ensure_fresh_id("index column", &draft.id)?;

        let table = self.table_mut(schema_id, table_id)?;
        let index = index_mut(table, index_id)?;
        if index.contains_column(&draft.column_id) {
            return Err(Error::IndexColumnNotUnique {
                name: index.name.clone(),
                column_id: draft.column_id,
            });
        }
        let seq_no = index.columns.len() as u32 + 1;
        index.columns.push(IndexColumn {
            id: draft.id,
            column_id: draft.column_id,
            seq_no,
            sort_dir: draft.sort_dir,
        });
        ensure_distinct_definition(table, index_id)
    }

    /// Remove one column from an index; an emptied index is deleted.
    pub(crate) fn remove_column_from_index(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        index_id: &Id,
        index_column_id: &Id,
    ) -> Result<()> {
        let table = self.table_mut(schema_id, table_id)?;
        let index = index_mut(table, index_id)?;
        let before = index.columns.len();
        index.columns.retain(|column| &column.id != index_column_id);
        if index.columns.len() == before {
            return Err(Error::IndexColumnNotExist {
                index_id: index_id.clone(),
                index_column_id: index_column_id.clone(),
            });
        }
        if index.columns.is_empty() {
            table.indexes.retain(|index| &index.id != index_id);
            return Ok(());
        }
        resequence(&mut index.columns, |column| &mut column.seq_no);
        ensure_distinct_definition(table, index_id)
    }

    pub(crate) fn change_index_column_sort_dir(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        index_id: &Id,
        index_column_id: &Id,
        sort_dir: SortDir,
    ) -> Result<()> {
        let table = self.table_mut(schema_id, table_id)?;
        let index = index_mut(table, index_id)?;
        let column = index
            .columns
            .iter_mut()
            .find(|column| &column.id == index_column_id)
            .ok_or_else(|| Error::IndexColumnNotExist {
                index_id: index_id.clone(),
                index_column_id: index_column_id.clone(),
            })?;
        column.sort_dir = sort_dir;
        ensure_distinct_definition(table, index_id)
    }
}

fn index_mut<'t>(table: &'t mut Table, index_id: &Id) -> Result<&'t mut Index> {
    let table_id = table.id.clone();
    table
        .indexes
        .iter_mut()
        .find(|index| &index.id == index_id)
        .ok_or_else(|| Error::IndexNotExist {
            table_id,
            index_id: index_id.clone(),
        })
}

/// Two indexes of a table must not share type, columns and sort order.
fn ensure_distinct_definition(table: &Table, index_id: &Id) -> Result<()> {
    let Some(index) = table.index(index_id) else {
        return Ok(());
    };
    let signature = index.signature();
    match table
        .indexes
        .iter()
        .find(|other| &other.id != index_id && other.signature() == signature)
    {
        Some(existing) => Err(Error::IndexDefinitionDuplicate {
            name: index.name.clone(),
            existing: existing.name.clone(),
        }),
        None => Ok(()),
    }
}
