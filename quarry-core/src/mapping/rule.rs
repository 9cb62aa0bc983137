use crate::EntityType;
use convert_case::{Case, Casing};
use std::borrow::Cow;

/// Naming convention consulted while resolving a type mapping.
///
/// Rules are asked in registration order, the first one returning `Some` decides. Columns
/// declared explicitly on a member are never rewritten.
pub trait MappingRule: Send + Sync {
    fn table_name(&self, _entity: EntityType, _declared: &str) -> Option<Cow<'static, str>> {
        None
    }
    fn column_name(&self, _entity: EntityType, _member: &str) -> Option<Cow<'static, str>> {
        None
    }
}

/// Converts table and column names to `snake_case`.
#[derive(Default, Debug, Clone, Copy)]
pub struct SnakeCaseRule;

impl MappingRule for SnakeCaseRule {
    fn table_name(&self, _entity: EntityType, declared: &str) -> Option<Cow<'static, str>> {
        Some(snake_case(declared).into())
    }
    fn column_name(&self, _entity: EntityType, member: &str) -> Option<Cow<'static, str>> {
        Some(snake_case(member).into())
    }
}

/// `EmployeeRecord` and `employeeRecord` become `employee_record`, acronyms stay together
/// (`HTTPStatus` is `http_status`).
pub fn snake_case(value: &str) -> String {
    value.to_case(Case::Snake)
}
