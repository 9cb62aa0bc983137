use crate::{
    CommandBuilder, Context, Expr, ExpressionCompiler, FieldContribution, Fragment, Order,
    Result, SelectFragments, Statement, StatementScope, TypeMapping, statement_state_error,
    truncate_long, writer::SqlWriter,
};
use std::borrow::Cow;

/// Builds `SELECT <alias.column, ...> FROM <table> <alias> [JOIN ...] [WHERE ...]
/// [ORDER BY ...] [LIMIT|TOP n]`.
///
/// Joins are requested by the expression compiler while filters and orderings are added.
#[derive(Debug, Clone)]
pub struct SelectCommandBuilder {
    table: Cow<'static, str>,
    columns: Vec<Cow<'static, str>>,
    scope: StatementScope,
    filters: Vec<String>,
    order_by: Vec<(String, Order)>,
    limit: Option<u32>,
}

impl SelectCommandBuilder {
    pub fn new(mapping: &TypeMapping) -> Self {
        Self {
            table: mapping.table.clone(),
            columns: Vec::new(),
            scope: StatementScope::new(mapping),
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
        }
    }

    pub fn scope(&self) -> &StatementScope {
        &self.scope
    }

    /// Adds a predicate, ANDed with the previous ones.
    pub fn add_where(&mut self, compiler: &ExpressionCompiler, expr: &Expr) -> Result<&mut Self> {
        let mut scope = self.scope.clone();
        let fragment = compiler.compile(
            expr,
            &mut scope,
            Context::new(Fragment::SqlSelectWhere, true),
        )?;
        self.scope = scope;
        self.filters.push(fragment);
        Ok(self)
    }

    pub fn add_order_by(
        &mut self,
        compiler: &ExpressionCompiler,
        expr: &Expr,
        order: Order,
    ) -> Result<&mut Self> {
        let mut scope = self.scope.clone();
        let fragment = compiler.compile(
            expr,
            &mut scope,
            Context::new(Fragment::SqlSelectOrderBy, true),
        )?;
        self.scope = scope;
        self.order_by.push((fragment, order));
        Ok(self)
    }

    pub fn set_limit(&mut self, limit: Option<u32>) -> &mut Self {
        self.limit = limit;
        self
    }
}

impl CommandBuilder for SelectCommandBuilder {
    fn set_table_name(&mut self, table: Cow<'static, str>) {
        self.scope.set_table(table.clone());
        self.table = table;
    }

    fn add_contribution(&mut self, field: FieldContribution) {
        self.columns.push(field.name);
    }

    fn build(&self, writer: &dyn SqlWriter) -> Result<Statement> {
        if self.table.is_empty() {
            return Err(statement_state_error("SELECT without a table name"));
        }
        if self.columns.is_empty() {
            return Err(statement_state_error(format!(
                "SELECT from `{}` without columns",
                self.table
            )));
        }
        let mut sql = String::new();
        writer.write_select(
            &mut sql,
            &SelectFragments {
                table: &self.table,
                alias: self.scope.root_alias(),
                columns: &self.columns,
                joins: self.scope.joins(),
                filters: &self.filters,
                order_by: &self.order_by,
                limit: self.limit,
            },
        );
        log::debug!("Built select: {}", truncate_long!(sql));
        Ok(Statement::new(sql, self.scope.parameters().to_vec()))
    }
}
