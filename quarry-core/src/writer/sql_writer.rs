use crate::{
    BinaryOpType, ColumnSlots, DEFAULT_RULES, DeleteFragments, ExpressionRule, Fragment, InsertFragments,
    JoinClause, JoinType, KeyStrategies, Order, ReadBack, SelectFragments, Slot, UnaryOpType,
    UpdateFragments, separated_by, writer::Context,
};
use std::fmt::Write;

/// Dialect printer converting statement fragments into concrete SQL strings.
///
/// Every method has a default rendering close to ANSI SQL, dialects override what differs.
/// Values never appear in the text: they are parameters, only `NULL` is written literally.
pub trait SqlWriter: Send + Sync {
    fn as_dyn(&self) -> &dyn SqlWriter;

    /// Ordered rule table of the expression compiler.
    fn expression_rules(&self) -> &[&'static dyn ExpressionRule] {
        DEFAULT_RULES
    }

    /// Key initialization strategies, by key value type.
    fn key_strategies(&self) -> &KeyStrategies;

    /// Escape occurrences of `search` char with `replace` while copying into buffer.
    fn write_escaped(
        &self,
        _context: &mut Context,
        out: &mut String,
        value: &str,
        search: char,
        replace: &str,
    ) {
        let mut position = 0;
        for (i, c) in value.char_indices() {
            if c == search {
                out.push_str(&value[position..i]);
                out.push_str(replace);
                position = i + c.len_utf8();
            }
        }
        out.push_str(&value[position..]);
    }

    /// Quote identifiers ("name") doubling inner quotes.
    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('"');
        self.write_escaped(context, out, value, '"', "\"\"");
        out.push('"');
    }

    /// Render a table reference with optional alias.
    fn write_table_ref(
        &self,
        context: &mut Context,
        out: &mut String,
        table: &str,
        alias: Option<&str>,
    ) {
        self.write_identifier_quoted(context, out, table);
        if let Some(alias) = alias.filter(|a| !a.is_empty()) {
            out.push(' ');
            out.push_str(alias);
        }
    }

    /// Render a column, prefixed by its alias when the context qualifies columns.
    fn write_column_ref(&self, context: &mut Context, out: &mut String, alias: &str, column: &str) {
        if context.qualify_columns && !alias.is_empty() {
            out.push_str(alias);
            out.push('.');
        }
        self.write_identifier_quoted(context, out, column);
    }

    /// Placeholder of the parameter at `index` (zero based).
    fn write_parameter(&self, _context: &mut Context, out: &mut String, index: usize) {
        let _ = write!(out, "@p{}", index);
    }

    /// Statement local variable holding a generated key.
    fn key_variable(&self, index: usize) -> String {
        format!("@k{}", index)
    }

    fn write_slot(&self, context: &mut Context, out: &mut String, slot: &Slot) {
        match slot {
            Slot::Parameter(index) => self.write_parameter(context, out, *index),
            Slot::Null => self.write_value_none(context, out),
            Slot::Sql(sql) => out.push_str(sql),
        }
    }

    /// Render NULL literal.
    fn write_value_none(&self, _context: &mut Context, out: &mut String) {
        out.push_str("NULL");
    }

    fn write_is_null(&self, _context: &mut Context, out: &mut String, negated: bool) {
        out.push_str(if negated { " IS NOT NULL" } else { " IS NULL" });
    }

    fn write_membership(&self, _context: &mut Context, out: &mut String) {
        out.push_str(" IN ");
    }

    /// Membership in an empty collection, always false.
    fn write_empty_membership(&self, _context: &mut Context, out: &mut String) {
        out.push_str("1 = 0");
    }

    /// Precedence table for unary operators.
    fn expression_unary_op_precedence(&self, value: &UnaryOpType) -> i32 {
        match value {
            UnaryOpType::Negative => 1250,
            UnaryOpType::Not => 250,
        }
    }

    /// Precedence table for binary operators.
    fn expression_binary_op_precedence(&self, value: &BinaryOpType) -> i32 {
        match value {
            BinaryOpType::Or => 100,
            BinaryOpType::And => 200,
            BinaryOpType::Equal => 300,
            BinaryOpType::NotEqual => 300,
            BinaryOpType::Less => 300,
            BinaryOpType::Greater => 300,
            BinaryOpType::LessEqual => 300,
            BinaryOpType::GreaterEqual => 300,
            BinaryOpType::Like => 400,
            BinaryOpType::NotLike => 400,
            BinaryOpType::BitwiseOr => 500,
            BinaryOpType::BitwiseAnd => 600,
            BinaryOpType::Subtraction => 800,
            BinaryOpType::Addition => 800,
            BinaryOpType::Multiplication => 900,
            BinaryOpType::Division => 900,
            BinaryOpType::Remainder => 900,
        }
    }

    fn write_unary_op(&self, _context: &mut Context, out: &mut String, op: &UnaryOpType) {
        out.push_str(match op {
            UnaryOpType::Negative => "-",
            UnaryOpType::Not => "NOT ",
        });
    }

    fn write_binary_op(&self, _context: &mut Context, out: &mut String, op: &BinaryOpType) {
        out.push_str(match op {
            BinaryOpType::Multiplication => " * ",
            BinaryOpType::Division => " / ",
            BinaryOpType::Remainder => " % ",
            BinaryOpType::Addition => " + ",
            BinaryOpType::Subtraction => " - ",
            BinaryOpType::BitwiseAnd => " & ",
            BinaryOpType::BitwiseOr => " | ",
            BinaryOpType::Like => " LIKE ",
            BinaryOpType::NotLike => " NOT LIKE ",
            BinaryOpType::Equal => " = ",
            BinaryOpType::NotEqual => " != ",
            BinaryOpType::Less => " < ",
            BinaryOpType::Greater => " > ",
            BinaryOpType::LessEqual => " <= ",
            BinaryOpType::GreaterEqual => " >= ",
            BinaryOpType::And => " AND ",
            BinaryOpType::Or => " OR ",
        });
    }

    fn write_order(&self, _context: &mut Context, out: &mut String, order: Order) {
        out.push_str(match order {
            Order::ASC => " ASC",
            Order::DESC => " DESC",
        });
    }

    /// Render join keyword(s) for the given join type.
    fn write_join_type(&self, _context: &mut Context, out: &mut String, join_type: &JoinType) {
        out.push_str(match join_type {
            JoinType::Inner => "INNER JOIN",
            JoinType::Left => "LEFT OUTER JOIN",
        });
    }

    /// Render a JOIN clause.
    fn write_join(&self, context: &mut Context, out: &mut String, join: &JoinClause) {
        let mut context = context.switch_fragment(Fragment::SqlJoin);
        context.qualify_columns = true;
        self.write_join_type(&mut context, out, &join.join);
        out.push(' ');
        self.write_table_ref(&mut context, out, &join.table, Some(&join.alias));
        out.push_str(" ON ");
        self.write_column_ref(&mut context, out, &join.left_alias, &join.left_column);
        out.push_str(" = ");
        self.write_column_ref(&mut context, out, &join.alias, &join.right_column);
    }

    /// Row limit written right after SELECT.
    fn write_select_limit_prefix(&self, _context: &mut Context, _out: &mut String, _limit: u32) {}

    /// Row limit written at the end of the statement.
    fn write_select_limit_suffix(&self, _context: &mut Context, out: &mut String, limit: u32) {
        let _ = write!(out, "\nLIMIT {}", limit);
    }

    /// Emit SELECT statement (projection, FROM, JOIN, WHERE, ORDER, LIMIT).
    fn write_select(&self, out: &mut String, select: &SelectFragments) {
        out.reserve(128 + select.columns.len() * 32);
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str("SELECT ");
        let mut context = Context::new(Fragment::SqlSelect, true);
        if let Some(limit) = select.limit {
            self.write_select_limit_prefix(&mut context, out, limit);
        }
        separated_by(
            out,
            select.columns,
            |out, column| {
                self.write_column_ref(&mut context, out, select.alias, column);
            },
            ", ",
        );
        out.push_str("\nFROM ");
        let mut from = context.switch_fragment(Fragment::SqlSelectFrom);
        self.write_table_ref(&mut from, out, select.table, Some(select.alias));
        for join in select.joins {
            out.push('\n');
            self.write_join(&mut from, out, join);
        }
        if !select.filters.is_empty() {
            out.push_str("\nWHERE ");
            let parenthesize = select.filters.len() > 1;
            separated_by(
                out,
                select.filters,
                |out, filter| {
                    if parenthesize {
                        out.push('(');
                        out.push_str(filter);
                        out.push(')');
                    } else {
                        out.push_str(filter);
                    }
                },
                " AND ",
            );
        }
        if !select.order_by.is_empty() {
            out.push_str("\nORDER BY ");
            let mut order_context = context.switch_fragment(Fragment::SqlSelectOrderBy);
            separated_by(
                out,
                select.order_by,
                |out, (expression, order)| {
                    out.push_str(expression);
                    self.write_order(&mut order_context, out, *order);
                },
                ", ",
            );
        }
        if let Some(limit) = select.limit {
            self.write_select_limit_suffix(&mut context, out, limit);
        }
        out.push(';');
    }

    fn insert_keyword(&self) -> &'static str {
        "INSERT INTO "
    }

    fn delete_keyword(&self) -> &'static str {
        "DELETE FROM "
    }

    /// Substitutes `{key}`, `{column}` and `{table}` in a key initialization template.
    fn render_key_template(
        &self,
        template: &str,
        key_index: usize,
        column: &str,
        table: &str,
    ) -> String {
        let mut context = Context::new(Fragment::SqlKeyInitialization, false);
        let mut quoted_column = String::new();
        self.write_identifier_quoted(&mut context, &mut quoted_column, column);
        let mut quoted_table = String::new();
        self.write_identifier_quoted(&mut context, &mut quoted_table, table);
        template
            .replace("{key}", &self.key_variable(key_index))
            .replace("{column}", &quoted_column)
            .replace("{table}", &quoted_table)
    }

    /// `"a" = @p0 AND "b" IS NULL`
    fn write_key_predicate(
        &self,
        context: &mut Context,
        out: &mut String,
        predicate: &ColumnSlots,
    ) {
        separated_by(
            out,
            predicate,
            |out, (column, slot)| {
                self.write_identifier_quoted(context, out, column);
                if *slot == Slot::Null {
                    self.write_is_null(context, out, false);
                } else {
                    out.push_str(" = ");
                    self.write_slot(context, out, slot);
                }
            },
            " AND ",
        );
    }

    /// SELECT of the affected row, following INSERT and UPDATE.
    fn write_read_back(&self, out: &mut String, read_back: &ReadBack) {
        if !out.is_empty() {
            out.push('\n');
        }
        let mut context = Context::new(Fragment::SqlReadBack, false);
        out.push_str("SELECT ");
        separated_by(
            out,
            read_back.columns,
            |out, column| {
                self.write_identifier_quoted(&mut context, out, column);
            },
            ", ",
        );
        out.push_str(" FROM ");
        self.write_table_ref(&mut context, out, read_back.table, None);
        if !read_back.key_predicate.is_empty() {
            out.push_str(" WHERE ");
            self.write_key_predicate(&mut context, out, read_back.key_predicate);
        }
        out.push(';');
    }

    /// Emit the INSERT batch: key initialization, INSERT, read back.
    fn write_insert(&self, out: &mut String, insert: &InsertFragments) {
        out.reserve(128 + insert.values.len() * 48);
        for snippet in insert.pre_insert {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(snippet);
            out.push(';');
        }
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(self.insert_keyword());
        let mut context = Context::new(Fragment::SqlInsertInto, false);
        self.write_table_ref(&mut context, out, insert.table, None);
        if insert.values.is_empty() {
            out.push_str(" DEFAULT VALUES;");
        } else {
            out.push_str(" (");
            separated_by(
                out,
                insert.values,
                |out, (column, _)| {
                    self.write_identifier_quoted(&mut context, out, column);
                },
                ", ",
            );
            out.push_str(") VALUES (");
            let mut context = context.switch_fragment(Fragment::SqlInsertIntoValues);
            separated_by(
                out,
                insert.values,
                |out, (_, slot)| {
                    self.write_slot(&mut context, out, slot);
                },
                ", ",
            );
            out.push_str(");");
        }
        for snippet in insert.post_insert {
            out.push('\n');
            out.push_str(snippet);
            out.push(';');
        }
        self.write_read_back(out, &insert.read_back);
    }

    /// Emit UPDATE followed by its read back, or only the read back without assignments.
    fn write_update(&self, out: &mut String, update: &UpdateFragments) {
        if !update.assignments.is_empty() {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str("UPDATE ");
            let mut context = Context::new(Fragment::SqlUpdate, false);
            self.write_table_ref(&mut context, out, update.table, None);
            out.push_str(" SET ");
            let mut set = context.switch_fragment(Fragment::SqlUpdateSet);
            separated_by(
                out,
                update.assignments,
                |out, (column, slot)| {
                    self.write_identifier_quoted(&mut set, out, column);
                    out.push_str(" = ");
                    self.write_slot(&mut set, out, slot);
                },
                ", ",
            );
            if !update.key_predicate.is_empty() {
                out.push_str(" WHERE ");
                self.write_key_predicate(&mut context, out, update.key_predicate);
            }
            out.push(';');
        }
        self.write_read_back(out, &update.read_back);
    }

    /// Emit DELETE statement with WHERE clause.
    fn write_delete(&self, out: &mut String, delete: &DeleteFragments) {
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(self.delete_keyword());
        let mut context = Context::new(Fragment::SqlDeleteFrom, false);
        self.write_table_ref(&mut context, out, delete.table, None);
        if !delete.key_predicate.is_empty() {
            out.push_str(" WHERE ");
            self.write_key_predicate(&mut context, out, delete.key_predicate);
        }
        out.push(';');
    }
}
