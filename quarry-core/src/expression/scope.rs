use crate::{EntityType, TypeMapping, Value};
use std::borrow::Cow;

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum JoinType {
    Inner,
    #[default]
    Left,
}

/// Join derived from a foreign object navigation.
#[derive(Debug, Clone, PartialEq)]
pub struct JoinClause {
    /// Navigation path from the statement root, for example `t0.manager.department`.
    pub path: String,
    pub join: JoinType,
    pub table: Cow<'static, str>,
    pub alias: String,
    pub left_alias: String,
    pub left_column: Cow<'static, str>,
    pub right_column: Cow<'static, str>,
}

/// Alias, join and parameter sink of one statement.
///
/// Aliases are numbered per statement, in the order they are requested, starting from the
/// root table. Compiling the same graphs in the same order yields the same text.
#[derive(Debug, Clone)]
pub struct StatementScope {
    entity: EntityType,
    table: Cow<'static, str>,
    alias: String,
    next_alias: u32,
    parameters: Vec<Value>,
    joins: Vec<JoinClause>,
    bindings: Vec<(Cow<'static, str>, String)>,
}

impl StatementScope {
    pub fn new(mapping: &TypeMapping) -> Self {
        Self {
            entity: mapping.entity,
            table: mapping.table.clone(),
            alias: "t0".into(),
            next_alias: 1,
            parameters: Vec::new(),
            joins: Vec::new(),
            bindings: Vec::new(),
        }
    }

    pub fn root_entity(&self) -> EntityType {
        self.entity
    }
    pub fn root_alias(&self) -> &str {
        &self.alias
    }
    pub fn table(&self) -> &str {
        &self.table
    }
    pub fn set_table(&mut self, table: impl Into<Cow<'static, str>>) {
        self.table = table.into();
    }

    pub fn next_alias(&mut self) -> String {
        let alias = format!("t{}", self.next_alias);
        self.next_alias += 1;
        alias
    }

    /// Appends a parameter and returns its position.
    pub fn add_parameter(&mut self, value: Value) -> usize {
        self.parameters.push(value);
        self.parameters.len() - 1
    }
    pub fn parameters(&self) -> &[Value] {
        &self.parameters
    }
    pub fn take_parameters(&mut self) -> Vec<Value> {
        std::mem::take(&mut self.parameters)
    }

    pub fn joins(&self) -> &[JoinClause] {
        &self.joins
    }

    /// Alias of the join for `path`, created on first request.
    pub fn require_join(
        &mut self,
        path: String,
        table: Cow<'static, str>,
        left_alias: &str,
        left_column: Cow<'static, str>,
        right_column: Cow<'static, str>,
    ) -> String {
        if let Some(join) = self.joins.iter().find(|j| j.path == path) {
            return join.alias.clone();
        }
        let alias = self.next_alias();
        self.joins.push(JoinClause {
            path,
            join: JoinType::Left,
            table,
            alias: alias.clone(),
            left_alias: left_alias.to_owned(),
            left_column,
            right_column,
        });
        alias
    }

    /// Binds a lambda parameter name to an alias.
    pub fn bind(&mut self, name: impl Into<Cow<'static, str>>, alias: impl Into<String>) {
        let name = name.into();
        let alias = alias.into();
        match self.bindings.iter_mut().find(|(n, _)| *n == name) {
            Some(binding) => binding.1 = alias,
            None => self.bindings.push((name, alias)),
        }
    }

    pub fn binding(&self, name: &str) -> Option<&str> {
        self.bindings
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, a)| a.as_str())
    }
}
