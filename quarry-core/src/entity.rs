use crate::{EntityDeclaration, MemberDeclaration, TrackedField, Value};
use std::{
    any::{self, TypeId},
    fmt::{self, Debug, Formatter},
    hash::{Hash, Hasher},
};

/// Runtime handle identifying an entity type.
#[derive(Clone, Copy)]
pub struct EntityType {
    id: TypeId,
    name: &'static str,
    declare: fn() -> EntityDeclaration,
}

impl EntityType {
    pub fn of<E: Entity>() -> Self {
        Self {
            id: TypeId::of::<E>(),
            name: any::type_name::<E>(),
            declare: E::declare,
        }
    }
    pub fn id(&self) -> TypeId {
        self.id
    }
    /// Fully qualified Rust type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
    /// Type name without the module path.
    pub fn short_name(&self) -> &'static str {
        self.name.rsplit("::").next().unwrap_or(self.name)
    }
    pub fn declaration(&self) -> EntityDeclaration {
        (self.declare)()
    }
}

impl PartialEq for EntityType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for EntityType {}

impl Hash for EntityType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl Debug for EntityType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// A mapped domain object backed by one table row.
///
/// Implementations expose one [`TrackedField`] per field or foreign object member named in
/// [`Entity::declare`]. `Default` produces the detached instance rows are loaded into.
pub trait Entity: Default + Send + Sync + 'static {
    /// Declarative mapping facts of this type.
    fn declare() -> EntityDeclaration;

    /// Tracked value of a member, `None` for unknown names and reference lists.
    fn field(&self, name: &str) -> Option<&dyn TrackedField>;

    fn field_mut(&mut self, name: &str) -> Option<&mut dyn TrackedField>;

    fn entity_type() -> EntityType
    where
        Self: Sized,
    {
        EntityType::of::<Self>()
    }

    /// Current values of the primary key members, in declaration order.
    fn key_values(&self) -> Vec<Value> {
        Self::declare()
            .members
            .iter()
            .filter(|m| m.is_primary_key())
            .filter_map(|m| self.field(m.name()).map(TrackedField::value))
            .collect()
    }

    fn is_changed(&self) -> bool {
        tracked_names::<Self>()
            .iter()
            .any(|name| self.field(name).is_some_and(|f| f.is_changed()))
    }

    /// Commits every tracked member, returns how many were dirty.
    fn commit_all(&mut self) -> usize {
        let mut committed = 0;
        for name in tracked_names::<Self>() {
            if let Some(field) = self.field_mut(&name)
                && field.commit()
            {
                committed += 1;
            }
        }
        committed
    }

    /// Rolls back every tracked member, returns how many were dirty.
    fn rollback_all(&mut self) -> usize {
        let mut reverted = 0;
        for name in tracked_names::<Self>() {
            if let Some(field) = self.field_mut(&name)
                && field.rollback()
            {
                reverted += 1;
            }
        }
        reverted
    }
}

fn tracked_names<E: Entity>() -> Vec<String> {
    E::declare()
        .members
        .iter()
        .filter(|m| !matches!(m, MemberDeclaration::ReferenceList(..)))
        .map(|m| m.name().to_owned())
        .collect()
}

/// Implements [`Entity::field`] and [`Entity::field_mut`] inside an `impl Entity` block, for
/// members stored in struct fields of the same name.
///
/// ```rust,ignore
/// impl Entity for Manager {
///     fn declare() -> EntityDeclaration { ... }
///     quarry::tracked_fields!(id, name, department);
/// }
/// ```
#[macro_export]
macro_rules! tracked_fields {
    ($($member:ident),+ $(,)?) => {
        fn field(&self, name: &str) -> Option<&dyn $crate::TrackedField> {
            match name {
                $(stringify!($member) => Some(&self.$member),)+
                _ => None,
            }
        }
        fn field_mut(&mut self, name: &str) -> Option<&mut dyn $crate::TrackedField> {
            match name {
                $(stringify!($member) => Some(&mut self.$member),)+
                _ => None,
            }
        }
    };
}
