use crate::{
    CommandBuilder, FieldContribution, FieldRole, ReadBack, Result, Statement, UpdateFragments,
    parameter_slot, statement_state_error, truncate_long, writer::SqlWriter,
};
use std::borrow::Cow;

/// Builds `UPDATE <table> SET <changed columns> WHERE <key>` followed by the read back.
///
/// Keys only go to WHERE, writeable and updateable fields go to SET only when changed. With
/// no assignment left only the read back is produced, see [`UpdateCommandBuilder::has_changes`].
#[derive(Default, Debug, Clone)]
pub struct UpdateCommandBuilder {
    table: Option<Cow<'static, str>>,
    fields: Vec<FieldContribution>,
}

impl UpdateCommandBuilder {
    pub fn new() -> Self {
        Default::default()
    }

    fn is_assignment(field: &FieldContribution) -> bool {
        field.role.is_updateable() && field.changed && field.value.is_some()
    }

    /// Whether at least one column would be assigned.
    pub fn has_changes(&self) -> bool {
        self.fields.iter().any(Self::is_assignment)
    }
}

impl CommandBuilder for UpdateCommandBuilder {
    fn set_table_name(&mut self, table: Cow<'static, str>) {
        self.table = Some(table);
    }

    fn add_contribution(&mut self, field: FieldContribution) {
        self.fields.push(field);
    }

    fn build(&self, writer: &dyn SqlWriter) -> Result<Statement> {
        let Some(table) = self.table.as_deref().filter(|t| !t.is_empty()) else {
            return Err(statement_state_error("UPDATE without a table name"));
        };
        let mut parameters = Vec::new();
        let mut assignments = Vec::new();
        for field in self.fields.iter().filter(|f| Self::is_assignment(f)) {
            if let Some(value) = &field.value {
                let slot = parameter_slot(&mut parameters, value.clone());
                assignments.push((field.name.clone(), slot));
            }
        }
        let mut key_predicate = Vec::new();
        for field in self.fields.iter().filter(|f| f.role == FieldRole::KeyField) {
            if let Some(value) = &field.value {
                let slot = parameter_slot(&mut parameters, value.clone());
                key_predicate.push((field.name.clone(), slot));
            }
        }
        if key_predicate.is_empty() {
            return Err(statement_state_error(format!(
                "UPDATE of `{table}` without key fields"
            )));
        }
        let columns: Vec<_> = self.fields.iter().map(|f| f.name.clone()).collect();
        let mut sql = String::new();
        writer.write_update(
            &mut sql,
            &UpdateFragments {
                table,
                assignments: &assignments,
                key_predicate: &key_predicate,
                read_back: ReadBack {
                    table,
                    columns: &columns,
                    key_predicate: &key_predicate,
                },
            },
        );
        log::debug!("Built update: {}", truncate_long!(sql));
        Ok(Statement::new(sql, parameters))
    }
}
