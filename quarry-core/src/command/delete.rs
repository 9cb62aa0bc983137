use crate::{
    CommandBuilder, DeleteFragments, FieldContribution, FieldRole, Result, Statement,
    parameter_slot, statement_state_error, truncate_long, writer::SqlWriter,
};
use std::borrow::Cow;

/// Builds `DELETE <table> [WHERE <key>]`, only key fields are used.
#[derive(Default, Debug, Clone)]
pub struct DeleteCommandBuilder {
    table: Option<Cow<'static, str>>,
    fields: Vec<FieldContribution>,
}

impl DeleteCommandBuilder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl CommandBuilder for DeleteCommandBuilder {
    fn set_table_name(&mut self, table: Cow<'static, str>) {
        self.table = Some(table);
    }

    fn add_contribution(&mut self, field: FieldContribution) {
        self.fields.push(field);
    }

    fn build(&self, writer: &dyn SqlWriter) -> Result<Statement> {
        let Some(table) = self.table.as_deref().filter(|t| !t.is_empty()) else {
            return Err(statement_state_error("DELETE without a table name"));
        };
        let mut parameters = Vec::new();
        let mut key_predicate = Vec::new();
        for field in self.fields.iter().filter(|f| f.role == FieldRole::KeyField) {
            if let Some(value) = &field.value {
                let slot = parameter_slot(&mut parameters, value.clone());
                key_predicate.push((field.name.clone(), slot));
            }
        }
        if key_predicate.is_empty() {
            log::warn!("DELETE from `{table}` without key fields removes every row");
        }
        let mut sql = String::new();
        writer.write_delete(
            &mut sql,
            &DeleteFragments {
                table,
                key_predicate: &key_predicate,
            },
        );
        log::debug!("Built delete: {}", truncate_long!(sql));
        Ok(Statement::new(sql, parameters))
    }
}
