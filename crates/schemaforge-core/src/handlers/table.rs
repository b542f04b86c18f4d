use std::sync::Arc;

use crate::drafts::TableDraft;
use crate::edit::Edit;
use crate::error::{Error, Result};
use crate::ids::Id;
use crate::naming::check_length;
use crate::schema::Table;

impl Edit<'_> {
    fn check_table_name(&self, schema_id: &Id, name: &str, exclude: Option<&Id>) -> Result<()> {
        check_length(name, self.config.naming.table).map_err(|rule| Error::TableNameInvalid {
            name: name.to_string(),
            rule,
        })?;

        let taken = self
            .schema(schema_id)?
            .tables
            .iter()
            .any(|table| table.name == name && Some(&table.id) != exclude);
        if taken {
            return Err(Error::TableNameNotUnique {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn create_table(&mut self, schema_id: &Id, draft: TableDraft) -> Result<()> {
        self.check_table_name(schema_id, &draft.name, None)?;
        self.ensure_fresh_id("table", &draft.id)?;

        self.schema_mut(schema_id)?.tables.push(Arc::new(Table {
            id: draft.id,
            schema_id: schema_id.clone(),
            name: draft.name,
            comment: draft.comment,
            columns: Vec::new(),
            indexes: Vec::new(),
            constraints: Vec::new(),
            relationships: Vec::new(),
        }));
        Ok(())
    }

    /// Delete every relationship touching the table, then the table itself.
    pub(crate) fn delete_table(&mut self, schema_id: &Id, table_id: &Id) -> Result<()> {
        let table = self.table(schema_id, table_id)?;
        let mut relationship_ids: Vec<Id> = self
            .schema(schema_id)?
            .relationships_referencing(table_id)
            .map(|relationship| relationship.id.clone())
            .collect();
        for relationship in &table.relationships {
            if !relationship_ids.contains(&relationship.id) {
                relationship_ids.push(relationship.id.clone());
            }
        }

        for relationship_id in relationship_ids {
            // an earlier cascade may already have emptied and removed it
            if self.schema(schema_id)?.relationship(&relationship_id).is_some() {
                self.delete_relationship(schema_id, &relationship_id)?;
            }
        }

        self.schema_mut(schema_id)?
            .tables
            .retain(|table| &table.id != table_id);
        Ok(())
    }

    pub(crate) fn change_table_name(&mut self, schema_id: &Id, table_id: &Id, name: &str) -> Result<()> {
        self.table(schema_id, table_id)?;
        self.check_table_name(schema_id, name, Some(table_id))?;
        self.table_mut(schema_id, table_id)?.name = name.to_string();
        Ok(())
    }

    pub(crate) fn change_table_comment(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        comment: Option<String>,
    ) -> Result<()> {
        self.table_mut(schema_id, table_id)?.comment = comment;
        Ok(())
    }
}
