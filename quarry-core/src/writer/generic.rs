use crate::{
    KeyInitialization, KeyStrategies, SqlWriter, ValueType, generate_uuid, is_empty_integer,
    is_empty_uuid,
};
use std::sync::LazyLock;

static KEY_STRATEGIES: LazyLock<KeyStrategies> = LazyLock::new(|| {
    let integer = |value_type| {
        KeyInitialization::server_generated(value_type, "last_insert_rowid()")
            .is_empty(is_empty_integer)
    };
    KeyStrategies::new()
        .register(integer(ValueType::Int16))
        .register(integer(ValueType::Int32))
        .register(integer(ValueType::Int64))
        .register(
            KeyInitialization::client_generated(ValueType::Uuid, generate_uuid)
                .is_empty(is_empty_uuid),
        )
});

/// Fallback generic SQL writer: `"quoted"` identifiers, `@p0` parameters, trailing `LIMIT`.
#[derive(Default, Debug, Clone, Copy)]
pub struct GenericSqlWriter;

impl GenericSqlWriter {
    /// Construct a new generic writer.
    pub fn new() -> Self {
        Self
    }
}

impl SqlWriter for GenericSqlWriter {
    fn as_dyn(&self) -> &dyn SqlWriter {
        self
    }

    fn key_strategies(&self) -> &KeyStrategies {
        &KEY_STRATEGIES
    }
}
