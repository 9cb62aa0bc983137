use crate::{JoinClause, Order, Value};
use std::borrow::Cow;

/// Value position of a column in generated SQL.
#[derive(Debug, Clone, PartialEq)]
pub enum Slot {
    /// Parameter placeholder at this index.
    Parameter(usize),
    /// The `NULL` literal.
    Null,
    /// Dialect SQL, such as a generated key variable.
    Sql(String),
}

/// Appends `value` to the parameters, `NULL` is the only value written literally.
pub fn parameter_slot(parameters: &mut Vec<Value>, value: Value) -> Slot {
    if value.is_null() {
        return Slot::Null;
    }
    parameters.push(value);
    Slot::Parameter(parameters.len() - 1)
}

pub type ColumnSlots = [(Cow<'static, str>, Slot)];

pub struct SelectFragments<'a> {
    pub table: &'a str,
    pub alias: &'a str,
    pub columns: &'a [Cow<'static, str>],
    pub joins: &'a [JoinClause],
    /// Compiled predicates, ANDed.
    pub filters: &'a [String],
    pub order_by: &'a [(String, Order)],
    pub limit: Option<u32>,
}

/// SELECT of one row by key, emitted after INSERT and UPDATE.
pub struct ReadBack<'a> {
    pub table: &'a str,
    pub columns: &'a [Cow<'static, str>],
    pub key_predicate: &'a ColumnSlots,
}

pub struct InsertFragments<'a> {
    pub table: &'a str,
    pub pre_insert: &'a [String],
    pub values: &'a ColumnSlots,
    pub post_insert: &'a [String],
    pub read_back: ReadBack<'a>,
}

pub struct UpdateFragments<'a> {
    pub table: &'a str,
    pub assignments: &'a ColumnSlots,
    pub key_predicate: &'a ColumnSlots,
    pub read_back: ReadBack<'a>,
}

pub struct DeleteFragments<'a> {
    pub table: &'a str,
    pub key_predicate: &'a ColumnSlots,
}
