use crate::constraints::{Constraint, ConstraintColumn, ConstraintKind};
use crate::drafts::ColumnDraft;
use crate::edit::{Edit, sanitize_identifier};
use crate::error::{Error, Result};
use crate::ids::Id;
use crate::naming::check_identifier;
use crate::schema::{Column, Table};
use crate::types::{DbVendor, LengthScale, TypeParams, is_reserved_keyword, type_params};

impl Edit<'_> {
    /// Format, keyword and per-table uniqueness rules for a column name.
    pub(crate) fn check_column_name(
        &self,
        schema_id: &Id,
        table_id: &Id,
        name: &str,
        exclude: Option<&Id>,
    ) -> Result<()> {
        check_identifier(name, self.config.naming.column).map_err(|rule| {
            Error::ColumnNameInvalid {
                name: name.to_string(),
                rule,
            }
        })?;
        if is_reserved_keyword(name) {
            return Err(Error::ColumnNameReservedKeyword {
                name: name.to_string(),
            });
        }

        let table = self.table(schema_id, table_id)?;
        let taken = table
            .columns
            .iter()
            .any(|column| column.name == name && Some(&column.id) != exclude);
        if taken {
            return Err(Error::ColumnNameNotUnique {
                table_name: table.name.clone(),
                name: name.to_string(),
            });
        }
        Ok(())
    }

    /// Reject removing a foreign-key column that mirrors a key column of an
    /// identifying parent.
    pub(crate) fn ensure_key_column_removable(
        &self,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
    ) -> Result<()> {
        let schema = self.schema(schema_id)?;
        let table = self.table(schema_id, table_id)?;
        for relationship in table.relationships.iter().filter(|relationship| relationship.is_identifying()) {
            let Some(provider) = schema.table(&relationship.pk_table_id) else {
                continue;
            };
            let required = relationship.columns.iter().any(|mapping| {
                &mapping.fk_column_id == column_id
                    && provider.is_primary_key_column(&mapping.pk_column_id)
            });
            if required {
                let column = table
                    .column(column_id)
                    .map(|column| column.name.clone())
                    .unwrap_or_else(|| column_id.to_string());
                return Err(Error::ForeignKeyColumnRequired {
                    column,
                    relationship: relationship.name.clone(),
                });
            }
        }
        Ok(())
    }

    /// Reject making a column non-nullable while a SET NULL relationship
    /// maps it.
    pub(crate) fn ensure_not_set_null_target(
        &self,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
    ) -> Result<()> {
        let table = self.table(schema_id, table_id)?;
        if let Some(relationship) = table.relationships.iter().find(|relationship| {
            relationship.uses_set_null() && relationship.maps_fk_column(column_id)
        }) {
            let column = table
                .column(column_id)
                .map(|column| column.name.clone())
                .unwrap_or_else(|| column_id.to_string());
            return Err(Error::RelationshipSetNullRequiresNullable {
                name: relationship.name.clone(),
                column,
            });
        }
        Ok(())
    }

    pub(crate) fn create_column(&mut self, schema_id: &Id, table_id: &Id, draft: ColumnDraft) -> Result<()> {
        let vendor = self.schema(schema_id)?.vendor;
        self.check_column_name(schema_id, table_id, &draft.name, None)?;
        self.ensure_fresh_id("column", &draft.id)?;
        check_data_type(vendor, draft.data_type.as_deref(), draft.length_scale)?;

        let table = self.table(schema_id, table_id)?;
        if draft.auto_increment {
            check_auto_increment(table, vendor, &draft.name, draft.data_type.as_deref(), None)?;
        }
        let count = table.columns.len() as u32;
        let position = draft.position.unwrap_or(count + 1);
        if position < 1 || position > count + 1 {
            return Err(Error::ColumnPositionOutOfRange {
                table_name: table.name.clone(),
                position,
                max: count + 1,
            });
        }
        let not_null_name = if draft.nullable {
            None
        } else {
            let base = format!(
                "nn_{}_{}",
                sanitize_identifier(&table.name),
                sanitize_identifier(&draft.name)
            );
            Some(self.fresh_constraint_name(schema_id, &base)?)
        };

        let column_id = draft.id.clone();
        let table = self.table_mut(schema_id, table_id)?;
        table.columns.insert(
            position as usize - 1,
            Column {
                id: draft.id,
                table_id: table_id.clone(),
                name: draft.name,
                ordinal_position: position,
                data_type: draft.data_type,
                length_scale: draft.length_scale,
                is_auto_increment: draft.auto_increment,
                charset: draft.charset,
                collation: draft.collation,
                comment: draft.comment,
            },
        );
        table.resequence_columns();
        if let Some(name) = not_null_name {
            table.constraints.push(not_null_constraint(table_id, &column_id, name));
        }

        if draft.primary_key {
            self.add_to_primary_key(schema_id, table_id, std::slice::from_ref(&column_id))?;
            self.propagate_keys(schema_id, table_id, vec![column_id])?;
        }
        Ok(())
    }

    /// Delete a column and every foreign-key column derived from it.
    pub(crate) fn delete_column(&mut self, schema_id: &Id, table_id: &Id, column_id: &Id) -> Result<()> {
        self.column(schema_id, table_id, column_id)?;
        let table = self.table(schema_id, table_id)?;
        if table.columns.len() == 1 {
            return Err(Error::TableEmptyColumn {
                table_name: table.name.clone(),
            });
        }
        self.ensure_key_column_removable(schema_id, table_id, column_id)?;

        self.cascade_key_removal(schema_id, vec![(table_id.clone(), column_id.clone())], false)?;
        self.table_mut(schema_id, table_id)?.detach_column(column_id);
        Ok(())
    }

    pub(crate) fn change_column_name(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
        name: &str,
    ) -> Result<()> {
        self.column(schema_id, table_id, column_id)?;
        self.check_column_name(schema_id, table_id, name, Some(column_id))?;
        column_mut(self.table_mut(schema_id, table_id)?, column_id)?.name = name.to_string();
        Ok(())
    }

    /// Change the type of a column and of every foreign-key column mirroring
    /// it. A foreign-key column itself can only take its referenced type.
    pub(crate) fn change_column_type(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
        data_type: Option<String>,
        length_scale: Option<LengthScale>,
    ) -> Result<()> {
        let vendor = self.schema(schema_id)?.vendor;
        let column = self.column(schema_id, table_id, column_id)?;
        check_data_type(vendor, data_type.as_deref(), length_scale)?;
        if column.is_auto_increment
            && !data_type
                .as_deref()
                .is_some_and(|data_type| vendor.is_integer_type(data_type))
        {
            return Err(Error::ColumnAutoIncrementNotInteger {
                name: column.name.clone(),
            });
        }

        let schema = self.schema(schema_id)?;
        let table = self.table(schema_id, table_id)?;
        let candidate = Column {
            data_type: data_type.clone(),
            length_scale,
            ..column.clone()
        };
        for relationship in &table.relationships {
            for mapping in relationship
                .columns
                .iter()
                .filter(|mapping| &mapping.fk_column_id == column_id)
            {
                let referenced = schema
                    .table(&relationship.pk_table_id)
                    .and_then(|provider| provider.column(&mapping.pk_column_id));
                if let Some(referenced) = referenced {
                    if !types_compatible(&candidate, referenced) {
                        return Err(Error::RelationshipColumnTypeIncompatible {
                            fk_column: candidate.name.clone(),
                            pk_column: referenced.name.clone(),
                        });
                    }
                }
            }
        }

        let column = column_mut(self.table_mut(schema_id, table_id)?, column_id)?;
        column.data_type = data_type.clone();
        column.length_scale = length_scale;
        self.mirror_type_change(schema_id, table_id, column_id, data_type, length_scale)
    }

    pub(crate) fn change_column_position(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
        position: u32,
    ) -> Result<()> {
        self.column(schema_id, table_id, column_id)?;
        let table = self.table_mut(schema_id, table_id)?;
        let count = table.columns.len() as u32;
        if position < 1 || position > count {
            return Err(Error::ColumnPositionOutOfRange {
                table_name: table.name.clone(),
                position,
                max: count,
            });
        }

        let Some(current) = table.columns.iter().position(|column| &column.id == column_id) else {
            return Ok(());
        };
        let column = table.columns.remove(current);
        table.columns.insert(position as usize - 1, column);
        table.resequence_columns();
        Ok(())
    }

    /// Toggle the NOT_NULL constraint of a column after re-checking the
    /// column as if it were created anew.
    pub(crate) fn change_column_nullable(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
        nullable: bool,
    ) -> Result<()> {
        let vendor = self.schema(schema_id)?.vendor;
        let column = self.column(schema_id, table_id, column_id)?.clone();
        self.check_column_name(schema_id, table_id, &column.name, Some(column_id))?;
        check_data_type(vendor, column.data_type.as_deref(), column.length_scale)?;
        let table = self.table(schema_id, table_id)?;
        if column.is_auto_increment {
            check_auto_increment(
                table,
                vendor,
                &column.name,
                column.data_type.as_deref(),
                Some(column_id),
            )?;
        }

        if nullable {
            if table.is_primary_key_column(column_id) {
                return Err(Error::ColumnNullableInPrimaryKey { name: column.name });
            }
            self.table_mut(schema_id, table_id)?
                .constraints
                .retain(|constraint| {
                    !(constraint.kind == ConstraintKind::NotNull
                        && constraint.contains_column(column_id))
                });
            return Ok(());
        }

        self.ensure_not_set_null_target(schema_id, table_id, column_id)?;
        let has_not_null = table.constraints.iter().any(|constraint| {
            constraint.kind == ConstraintKind::NotNull && constraint.contains_column(column_id)
        });
        if has_not_null {
            return Ok(());
        }
        let base = format!(
            "nn_{}_{}",
            sanitize_identifier(&table.name),
            sanitize_identifier(&column.name)
        );
        let name = self.fresh_constraint_name(schema_id, &base)?;
        self.table_mut(schema_id, table_id)?
            .constraints
            .push(not_null_constraint(table_id, column_id, name));
        Ok(())
    }

    pub(crate) fn change_column_auto_increment(
        &mut self,
        schema_id: &Id,
        table_id: &Id,
        column_id: &Id,
        enabled: bool,
    ) -> Result<()> {
        let vendor = self.schema(schema_id)?.vendor;
        let column = self.column(schema_id, table_id, column_id)?;
        if enabled {
            let table = self.table(schema_id, table_id)?;
            check_auto_increment(
                table,
                vendor,
                &column.name,
                column.data_type.as_deref(),
                Some(column_id),
            )?;
        }
        column_mut(self.table_mut(schema_id, table_id)?, column_id)?.is_auto_increment = enabled;
        Ok(())
    }
}

fn column_mut<'t>(table: &'t mut Table, column_id: &Id) -> Result<&'t mut Column> {
    let table_id = table.id.clone();
    table
        .columns
        .iter_mut()
        .find(|column| &column.id == column_id)
        .ok_or_else(|| Error::ColumnNotExist {
            table_id,
            column_id: column_id.clone(),
        })
}

fn not_null_constraint(table_id: &Id, column_id: &Id, name: String) -> Constraint {
    Constraint {
        id: Id::new(),
        table_id: table_id.clone(),
        name,
        kind: ConstraintKind::NotNull,
        check_expr: None,
        default_expr: None,
        columns: vec![ConstraintColumn {
            id: Id::new(),
            column_id: column_id.clone(),
            seq_no: 1,
        }],
    }
}

/// Validate a data type against the vendor catalog and its descriptor rules.
pub(crate) fn check_data_type(
    vendor: DbVendor,
    data_type: Option<&str>,
    length_scale: Option<LengthScale>,
) -> Result<()> {
    let Some(data_type) = data_type else {
        return match length_scale {
            Some(_) => Err(Error::ColumnLengthScaleNotApplicable {
                data_type: String::new(),
            }),
            None => Ok(()),
        };
    };
    if !vendor.supports_data_type(data_type) {
        return Err(Error::ColumnDataTypeInvalid {
            data_type: data_type.to_string(),
            vendor,
        });
    }

    let invalid = |length_scale| Error::ColumnLengthScaleInvalid {
        data_type: data_type.to_string(),
        length_scale,
    };
    match (type_params(data_type), length_scale) {
        (TypeParams::Length, None) => Err(Error::ColumnLengthRequired {
            data_type: data_type.to_string(),
        }),
        (TypeParams::PrecisionScale, None) => Err(Error::ColumnPrecisionRequired {
            data_type: data_type.to_string(),
        }),
        (TypeParams::Length | TypeParams::OptionalLength, Some(ls @ LengthScale::Length(0))) => {
            Err(invalid(ls))
        }
        (TypeParams::Length | TypeParams::OptionalLength, Some(LengthScale::Length(_))) => Ok(()),
        (TypeParams::PrecisionScale, Some(ls @ LengthScale::PrecisionScale { precision, scale })) => {
            if precision == 0 || scale > precision {
                Err(invalid(ls))
            } else {
                Ok(())
            }
        }
        (TypeParams::None, Some(_)) => Err(Error::ColumnLengthScaleNotApplicable {
            data_type: data_type.to_string(),
        }),
        (_, Some(ls)) => Err(invalid(ls)),
        (TypeParams::OptionalLength | TypeParams::None, None) => Ok(()),
    }
}

/// At most one auto-increment column per table, and only on integer types.
fn check_auto_increment(
    table: &Table,
    vendor: DbVendor,
    name: &str,
    data_type: Option<&str>,
    exclude: Option<&Id>,
) -> Result<()> {
    let other = table
        .columns
        .iter()
        .any(|column| column.is_auto_increment && Some(&column.id) != exclude);
    if other {
        return Err(Error::ColumnMultipleAutoIncrement {
            table_name: table.name.clone(),
        });
    }
    if !data_type.is_some_and(|data_type| vendor.is_integer_type(data_type)) {
        return Err(Error::ColumnAutoIncrementNotInteger {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// A foreign-key column must carry the exact type of the column it mirrors.
/// Untyped columns are compatible with anything.
pub(crate) fn types_compatible(fk: &Column, pk: &Column) -> bool {
    match (&fk.data_type, &pk.data_type) {
        (Some(fk_type), Some(pk_type)) => {
            fk_type.eq_ignore_ascii_case(pk_type) && fk.length_scale == pk.length_scale
        }
        _ => true,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_rules_follow_type_family() {
        let vendor = DbVendor::Mysql;
        assert!(check_data_type(vendor, Some("INT"), None).is_ok());
        assert!(check_data_type(vendor, Some("VARCHAR"), Some(LengthScale::Length(10))).is_ok());
        assert_eq!(
            check_data_type(vendor, Some("VARCHAR"), None),
            Err(Error::ColumnLengthRequired {
                data_type: "VARCHAR".to_string()
            })
        );
        assert_eq!(
            check_data_type(vendor, Some("DECIMAL"), None),
            Err(Error::ColumnPrecisionRequired {
                data_type: "DECIMAL".to_string()
            })
        );
        assert!(matches!(
            check_data_type(
                vendor,
                Some("DECIMAL"),
                Some(LengthScale::PrecisionScale { precision: 4, scale: 6 })
            ),
            Err(Error::ColumnLengthScaleInvalid { .. })
        ));
        assert!(matches!(
            check_data_type(vendor, Some("INT"), Some(LengthScale::Length(11))),
            Err(Error::ColumnLengthScaleNotApplicable { .. })
        ));
        assert!(matches!(
            check_data_type(vendor, Some("JSONB"), None),
            Err(Error::ColumnDataTypeInvalid { .. })
        ));
    }
}
