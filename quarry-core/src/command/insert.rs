use crate::{
    CommandBuilder, FieldContribution, FieldRole, InsertFragments, ReadBack, Result, Slot,
    Statement, parameter_slot, statement_state_error, truncate_long, writer::SqlWriter,
};
use std::borrow::Cow;

/// Builds the INSERT batch: key initialization snippets, the INSERT itself and the SELECT
/// reading the row back by key.
///
/// A non empty key is inserted as given. An empty key is generated in process when its
/// strategy has a generator, otherwise the strategy SQL runs around the INSERT and the
/// column is part of it only when the strategy sets it during the insert.
#[derive(Default, Debug, Clone)]
pub struct InsertCommandBuilder {
    table: Option<Cow<'static, str>>,
    fields: Vec<FieldContribution>,
}

impl InsertCommandBuilder {
    pub fn new() -> Self {
        Default::default()
    }
}

impl CommandBuilder for InsertCommandBuilder {
    fn set_table_name(&mut self, table: Cow<'static, str>) {
        self.table = Some(table);
    }

    fn add_contribution(&mut self, field: FieldContribution) {
        self.fields.push(field);
    }

    fn build(&self, writer: &dyn SqlWriter) -> Result<Statement> {
        let Some(table) = self.table.as_deref().filter(|t| !t.is_empty()) else {
            return Err(statement_state_error("INSERT without a table name"));
        };
        let mut parameters = Vec::new();
        let mut values = Vec::new();
        let mut pre_insert = Vec::new();
        let mut post_insert = Vec::new();
        let mut key_predicate = Vec::new();
        let mut columns = Vec::with_capacity(self.fields.len());
        let mut key_index = 0;
        for field in &self.fields {
            columns.push(field.name.clone());
            let Some(value) = &field.value else {
                continue;
            };
            match field.role {
                FieldRole::KeyField => {
                    let strategy = field.key_strategy.as_deref();
                    let empty = match strategy {
                        Some(strategy) => (strategy.is_empty)(value),
                        None => value.is_null(),
                    };
                    if !empty {
                        let slot = parameter_slot(&mut parameters, value.clone());
                        values.push((field.name.clone(), slot.clone()));
                        key_predicate.push((field.name.clone(), slot));
                        continue;
                    }
                    let Some(strategy) = strategy else {
                        return Err(statement_state_error(format!(
                            "Key `{}` of `{table}` is empty and has no key initialization strategy",
                            field.name
                        )));
                    };
                    if let Some(generate) = strategy.generate {
                        let slot = parameter_slot(&mut parameters, generate());
                        values.push((field.name.clone(), slot.clone()));
                        key_predicate.push((field.name.clone(), slot));
                        continue;
                    }
                    let render = |template: &str| {
                        writer.render_key_template(template, key_index, &field.name, table)
                    };
                    if let Some(template) = strategy.pre_insert {
                        pre_insert.push(render(template));
                    }
                    let reference = render(strategy.key_reference);
                    if strategy.set_value_during_insert {
                        values.push((field.name.clone(), Slot::Sql(reference.clone())));
                    }
                    if let Some(template) = strategy.post_insert {
                        post_insert.push(render(template));
                    }
                    key_predicate.push((field.name.clone(), Slot::Sql(reference)));
                    key_index += 1;
                }
                FieldRole::Writeable | FieldRole::Insertable => {
                    let slot = parameter_slot(&mut parameters, value.clone());
                    values.push((field.name.clone(), slot));
                }
                FieldRole::Updateable | FieldRole::ReadOnly => {}
            }
        }
        if key_predicate.is_empty() {
            return Err(statement_state_error(format!(
                "INSERT into `{table}` has no key to read the row back"
            )));
        }
        let mut sql = String::new();
        writer.write_insert(
            &mut sql,
            &InsertFragments {
                table,
                pre_insert: &pre_insert,
                values: &values,
                post_insert: &post_insert,
                read_back: ReadBack {
                    table,
                    columns: &columns,
                    key_predicate: &key_predicate,
                },
            },
        );
        log::debug!("Built insert: {}", truncate_long!(sql));
        Ok(Statement::new(sql, parameters))
    }
}
