mod delete;
mod fragments;
mod insert;
mod select;
mod statement;
mod update;

pub use delete::*;
pub use fragments::*;
pub use insert::*;
pub use select::*;
pub use statement::*;
pub use update::*;

use crate::{FieldRole, KeyInitialization, Result, Value, writer::SqlWriter};
use std::{borrow::Cow, sync::Arc};

/// One field handed to a command builder.
#[derive(Debug, Clone)]
pub struct FieldContribution {
    pub name: Cow<'static, str>,
    /// `None` for schema only declarations.
    pub value: Option<Value>,
    pub role: FieldRole,
    pub key_strategy: Option<Arc<KeyInitialization>>,
    pub changed: bool,
}

/// Accumulates the pieces of one statement. One instance per statement.
pub trait CommandBuilder {
    fn set_table_name(&mut self, table: Cow<'static, str>);

    /// Declares a column the statement reads back, without a value.
    fn add_field_declaration(&mut self, name: Cow<'static, str>, role: FieldRole) {
        self.add_contribution(FieldContribution {
            name,
            value: None,
            role,
            key_strategy: None,
            changed: false,
        });
    }

    /// Contributes a column value.
    fn add_field(
        &mut self,
        name: Cow<'static, str>,
        value: Value,
        role: FieldRole,
        key_strategy: Option<Arc<KeyInitialization>>,
        changed: bool,
    ) {
        self.add_contribution(FieldContribution {
            name,
            value: Some(value),
            role,
            key_strategy,
            changed,
        });
    }

    fn add_contribution(&mut self, field: FieldContribution);

    /// Materializes the statement. Fails when a required piece is missing.
    fn build(&self, writer: &dyn SqlWriter) -> Result<Statement>;
}
