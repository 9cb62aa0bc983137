use crate::{AsValue, EntityType, ValueType};
use std::borrow::Cow;

/// How rows of an entity type are loaded by queries.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadBehavior {
    /// Every mapped column is selected.
    #[default]
    Full,
    /// Only the key columns are selected, the rest is read on reload.
    OnDemand,
    /// The type can only be queried explicitly forced.
    ForceOnly,
}

/// Cascade flags of a reference list.
#[derive(Default, Debug, Clone, Copy, PartialEq, Eq)]
pub struct Cascade {
    pub delete: bool,
    pub save: bool,
    pub drop_changes: bool,
}

impl Cascade {
    pub const NONE: Cascade = Cascade {
        delete: false,
        save: false,
        drop_changes: false,
    };
    pub const ALL: Cascade = Cascade {
        delete: true,
        save: true,
        drop_changes: true,
    };
    pub const DELETE: Cascade = Cascade {
        delete: true,
        save: false,
        drop_changes: false,
    };
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDeclaration {
    pub name: Cow<'static, str>,
    /// Explicit column name, bypasses the naming rules.
    pub column: Option<Cow<'static, str>>,
    pub value_type: ValueType,
    pub primary_key: bool,
    pub insertable: bool,
    pub updateable: bool,
}

impl FieldDeclaration {
    /// Field holding values of `T`.
    pub fn new<T: AsValue>(name: impl Into<Cow<'static, str>>) -> Self {
        Self::of(name, T::as_empty_value().value_type())
    }
    pub fn of(name: impl Into<Cow<'static, str>>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            column: None,
            value_type,
            primary_key: false,
            insertable: true,
            updateable: true,
        }
    }
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
    pub fn column(mut self, column: impl Into<Cow<'static, str>>) -> Self {
        self.column = Some(column.into());
        self
    }
    pub fn read_only(mut self) -> Self {
        self.insertable = false;
        self.updateable = false;
        self
    }
    pub fn insert_only(mut self) -> Self {
        self.insertable = true;
        self.updateable = false;
        self
    }
    pub fn update_only(mut self) -> Self {
        self.insertable = false;
        self.updateable = true;
        self
    }
}

/// Member holding the key of another entity.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignObjectDeclaration {
    pub name: Cow<'static, str>,
    pub column: Option<Cow<'static, str>>,
    pub target: EntityType,
    pub primary_key: bool,
    pub insertable: bool,
    pub updateable: bool,
}

impl ForeignObjectDeclaration {
    pub fn new(name: impl Into<Cow<'static, str>>, target: EntityType) -> Self {
        Self {
            name: name.into(),
            column: None,
            target,
            primary_key: false,
            insertable: true,
            updateable: true,
        }
    }
    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }
    pub fn column(mut self, column: impl Into<Cow<'static, str>>) -> Self {
        self.column = Some(column.into());
        self
    }
    pub fn read_only(mut self) -> Self {
        self.insertable = false;
        self.updateable = false;
        self
    }
}

/// Inverse side of a foreign object declared on `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceListDeclaration {
    pub name: Cow<'static, str>,
    pub target: EntityType,
    /// Foreign object member of `target` pointing back at the declaring type.
    pub target_field: Cow<'static, str>,
    pub cascade: Cascade,
}

impl ReferenceListDeclaration {
    pub fn new(
        name: impl Into<Cow<'static, str>>,
        target: EntityType,
        target_field: impl Into<Cow<'static, str>>,
    ) -> Self {
        Self {
            name: name.into(),
            target,
            target_field: target_field.into(),
            cascade: Cascade::NONE,
        }
    }
    pub fn cascade(mut self, cascade: Cascade) -> Self {
        self.cascade = cascade;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberDeclaration {
    Field(FieldDeclaration),
    ForeignObject(ForeignObjectDeclaration),
    ReferenceList(ReferenceListDeclaration),
}

impl MemberDeclaration {
    pub fn name(&self) -> &str {
        match self {
            MemberDeclaration::Field(v) => &v.name,
            MemberDeclaration::ForeignObject(v) => &v.name,
            MemberDeclaration::ReferenceList(v) => &v.name,
        }
    }
    pub fn is_primary_key(&self) -> bool {
        match self {
            MemberDeclaration::Field(v) => v.primary_key,
            MemberDeclaration::ForeignObject(v) => v.primary_key,
            MemberDeclaration::ReferenceList(..) => false,
        }
    }
}

/// Declarative mapping facts of one entity type, as produced by [`crate::Entity::declare`].
///
/// ```rust
/// use quarry_core::{EntityDeclaration, FieldDeclaration, LoadBehavior};
/// let declaration = EntityDeclaration::table("managers")
///     .load(LoadBehavior::Full)
///     .field(FieldDeclaration::new::<i64>("id").primary_key())
///     .field(FieldDeclaration::new::<String>("name"));
/// assert_eq!(declaration.members.len(), 2);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct EntityDeclaration {
    pub table: Cow<'static, str>,
    pub load: LoadBehavior,
    pub members: Vec<MemberDeclaration>,
}

impl EntityDeclaration {
    pub fn table(name: impl Into<Cow<'static, str>>) -> Self {
        Self {
            table: name.into(),
            load: LoadBehavior::Full,
            members: Vec::new(),
        }
    }
    pub fn load(mut self, load: LoadBehavior) -> Self {
        self.load = load;
        self
    }
    pub fn field(mut self, field: FieldDeclaration) -> Self {
        self.members.push(MemberDeclaration::Field(field));
        self
    }
    pub fn foreign(mut self, foreign: ForeignObjectDeclaration) -> Self {
        self.members.push(MemberDeclaration::ForeignObject(foreign));
        self
    }
    pub fn reference_list(mut self, list: ReferenceListDeclaration) -> Self {
        self.members.push(MemberDeclaration::ReferenceList(list));
        self
    }
    pub fn member(&self, name: &str) -> Option<&MemberDeclaration> {
        self.members.iter().find(|m| m.name() == name)
    }
}
