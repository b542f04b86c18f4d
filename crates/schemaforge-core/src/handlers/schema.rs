use std::sync::Arc;

use crate::drafts::SchemaDraft;
use crate::edit::Edit;
use crate::error::{Error, Result};
use crate::ids::Id;
use crate::naming::check_identifier;
use crate::schema::Schema;

impl Edit<'_> {
    fn check_schema_name(&self, name: &str, exclude: Option<&Id>) -> Result<()> {
        check_identifier(name, self.config.naming.schema).map_err(|rule| {
            Error::SchemaNameInvalid {
                name: name.to_string(),
                rule,
            }
        })?;

        let taken = self
            .database()
            .schemas
            .iter()
            .any(|schema| schema.name == name && Some(&schema.id) != exclude);
        if taken {
            return Err(Error::SchemaNameNotUnique {
                name: name.to_string(),
            });
        }
        Ok(())
    }

    pub(crate) fn create_schema(&mut self, draft: SchemaDraft) -> Result<()> {
        self.check_schema_name(&draft.name, None)?;
        self.ensure_fresh_id("schema", &draft.id)?;

        let database_id = self.database().id.clone();
        self.database_mut().schemas.push(Arc::new(Schema {
            id: draft.id,
            database_id,
            name: draft.name,
            vendor: draft.vendor,
            charset: draft.charset,
            collation: draft.collation,
            tables: Vec::new(),
        }));
        Ok(())
    }

    pub(crate) fn delete_schema(&mut self, schema_id: &Id) -> Result<()> {
        self.schema(schema_id)?;
        if !self.config.allow_delete_last_schema && self.database().schemas.len() == 1 {
            return Err(Error::SchemaDeleteLast {
                schema_id: schema_id.clone(),
            });
        }

        self.database_mut()
            .schemas
            .retain(|schema| &schema.id != schema_id);
        Ok(())
    }

    pub(crate) fn change_schema_name(&mut self, schema_id: &Id, name: &str) -> Result<()> {
        self.schema(schema_id)?;
        self.check_schema_name(name, Some(schema_id))?;
        self.schema_mut(schema_id)?.name = name.to_string();
        Ok(())
    }
}
