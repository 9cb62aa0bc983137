use crate::{Value, ValueType};
use std::{collections::HashMap, sync::Arc};

/// How an empty primary key gets its value during an insert.
///
/// Templates may reference `{key}` (the statement local key variable), `{column}` and
/// `{table}` (both quoted by the dialect).
#[derive(Debug, Clone)]
pub struct KeyInitialization {
    pub value_type: ValueType,
    /// Emitted before the INSERT.
    pub pre_insert: Option<&'static str>,
    /// Emitted right after the INSERT.
    pub post_insert: Option<&'static str>,
    /// Expression yielding the key once the INSERT ran, used to read the row back.
    pub key_reference: &'static str,
    /// The key column is part of the INSERT, valued with `key_reference`.
    pub set_value_during_insert: bool,
    pub is_empty: fn(&Value) -> bool,
    /// Client side generator, takes precedence over the SQL templates.
    pub generate: Option<fn() -> Value>,
}

impl KeyInitialization {
    /// Key read back from the database after the insert.
    pub fn server_generated(value_type: ValueType, key_reference: &'static str) -> Self {
        Self {
            value_type,
            pre_insert: None,
            post_insert: None,
            key_reference,
            set_value_during_insert: false,
            is_empty: is_empty_default,
            generate: None,
        }
    }

    /// Key generated in process before the insert.
    pub fn client_generated(value_type: ValueType, generate: fn() -> Value) -> Self {
        Self {
            value_type,
            pre_insert: None,
            post_insert: None,
            key_reference: "",
            set_value_during_insert: true,
            is_empty: is_empty_default,
            generate: Some(generate),
        }
    }

    pub fn pre_insert(mut self, template: &'static str) -> Self {
        self.pre_insert = Some(template);
        self
    }
    pub fn post_insert(mut self, template: &'static str) -> Self {
        self.post_insert = Some(template);
        self
    }
    pub fn set_value_during_insert(mut self, value: bool) -> Self {
        self.set_value_during_insert = value;
        self
    }
    pub fn is_empty(mut self, is_empty: fn(&Value) -> bool) -> Self {
        self.is_empty = is_empty;
        self
    }
}

/// Null is the only empty value.
pub fn is_empty_default(value: &Value) -> bool {
    value.is_null()
}

/// Null or zero.
pub fn is_empty_integer(value: &Value) -> bool {
    match value {
        Value::Int16(Some(v)) => *v == 0,
        Value::Int32(Some(v)) => *v == 0,
        Value::Int64(Some(v)) => *v == 0,
        v => v.is_null(),
    }
}

/// Null or the nil UUID.
pub fn is_empty_uuid(value: &Value) -> bool {
    match value {
        Value::Uuid(Some(v)) => v.is_nil(),
        v => v.is_null(),
    }
}

pub fn generate_uuid() -> Value {
    Value::Uuid(Some(uuid::Uuid::new_v4()))
}

/// Key initialization strategies of one dialect, keyed by key value type.
#[derive(Default, Debug, Clone)]
pub struct KeyStrategies {
    strategies: HashMap<ValueType, Arc<KeyInitialization>>,
}

impl KeyStrategies {
    pub fn new() -> Self {
        Default::default()
    }
    pub fn register(mut self, strategy: KeyInitialization) -> Self {
        self.strategies
            .insert(strategy.value_type, Arc::new(strategy));
        self
    }
    pub fn get(&self, value_type: ValueType) -> Option<Arc<KeyInitialization>> {
        self.strategies.get(&value_type).cloned()
    }
    pub fn len(&self) -> usize {
        self.strategies.len()
    }
    pub fn is_empty(&self) -> bool {
        self.strategies.is_empty()
    }
}
