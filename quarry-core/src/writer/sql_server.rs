use crate::{
    KeyInitialization, KeyStrategies, SqlWriter, ValueType, is_empty_integer, is_empty_uuid,
    writer::Context,
};
use std::{fmt::Write, sync::LazyLock};

static KEY_STRATEGIES: LazyLock<KeyStrategies> = LazyLock::new(|| {
    let identity = |value_type| {
        KeyInitialization::server_generated(value_type, "{key}")
            .pre_insert("DECLARE {key} BIGINT")
            .post_insert("SET {key} = SCOPE_IDENTITY()")
            .is_empty(is_empty_integer)
    };
    KeyStrategies::new()
        .register(identity(ValueType::Int16))
        .register(identity(ValueType::Int32))
        .register(identity(ValueType::Int64))
        .register(
            KeyInitialization::server_generated(ValueType::Uuid, "{key}")
                .pre_insert("DECLARE {key} UNIQUEIDENTIFIER = NEWID()")
                .set_value_during_insert(true)
                .is_empty(is_empty_uuid),
        )
});

/// SQL Server dialect: `[bracketed]` identifiers, `TOP n`, identity read back through
/// `SCOPE_IDENTITY()` and `NEWID()` keys.
#[derive(Default, Debug, Clone, Copy)]
pub struct SqlServerSqlWriter;

impl SqlWriter for SqlServerSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn key_strategies(&self) -> &KeyStrategies {
        &KEY_STRATEGIES
    }

    fn write_identifier_quoted(&self, context: &mut Context, out: &mut String, value: &str) {
        out.push('[');
        self.write_escaped(context, out, value, ']', "]]");
        out.push(']');
    }

    fn write_select_limit_prefix(&self, _context: &mut Context, out: &mut String, limit: u32) {
        let _ = write!(out, "TOP {} ", limit);
    }

    fn write_select_limit_suffix(&self, _context: &mut Context, _out: &mut String, _limit: u32) {}

    fn insert_keyword(&self) -> &'static str {
        "INSERT "
    }

    fn delete_keyword(&self) -> &'static str {
        "DELETE "
    }
}
