use crate::{
    KeyInitialization, KeyStrategies, SqlWriter, ValueType, generate_uuid, is_empty_integer,
    is_empty_uuid, writer::Context,
};
use std::{fmt::Write, sync::LazyLock};

static KEY_STRATEGIES: LazyLock<KeyStrategies> = LazyLock::new(|| {
    let sequence = |value_type| {
        KeyInitialization::server_generated(value_type, "lastval()").is_empty(is_empty_integer)
    };
    KeyStrategies::new()
        .register(sequence(ValueType::Int16))
        .register(sequence(ValueType::Int32))
        .register(sequence(ValueType::Int64))
        .register(
            KeyInitialization::client_generated(ValueType::Uuid, generate_uuid)
                .is_empty(is_empty_uuid),
        )
});

/// PostgreSQL dialect, positional `$1` parameters.
#[derive(Default, Debug, Clone, Copy)]
pub struct PostgresSqlWriter;

impl SqlWriter for PostgresSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn key_strategies(&self) -> &KeyStrategies {
        &KEY_STRATEGIES
    }

    fn write_parameter(&self, _context: &mut Context, out: &mut String, index: usize) {
        let _ = write!(out, "${}", index + 1);
    }
}
