use crate::{Cascade, EntityType, LoadBehavior, ValueType};
use std::borrow::Cow;

/// How a column takes part in INSERT and UPDATE statements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldRole {
    /// Primary key: WHERE of UPDATE/DELETE, never SET.
    KeyField,
    /// Inserted and updated.
    Writeable,
    Insertable,
    Updateable,
    /// Selected only.
    ReadOnly,
}

impl FieldRole {
    pub fn from_flags(primary_key: bool, insertable: bool, updateable: bool) -> Self {
        match (primary_key, insertable, updateable) {
            (true, ..) => FieldRole::KeyField,
            (false, true, true) => FieldRole::Writeable,
            (false, true, false) => FieldRole::Insertable,
            (false, false, true) => FieldRole::Updateable,
            (false, false, false) => FieldRole::ReadOnly,
        }
    }
    pub fn is_insertable(self) -> bool {
        matches!(self, FieldRole::Writeable | FieldRole::Insertable)
    }
    pub fn is_updateable(self) -> bool {
        matches!(self, FieldRole::Writeable | FieldRole::Updateable)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldMapping {
    pub name: Cow<'static, str>,
    pub column: Cow<'static, str>,
    pub value_type: ValueType,
    pub primary_key: bool,
    pub insertable: bool,
    pub updateable: bool,
}

/// Resolved foreign object: a column holding the single primary key of `target`.
#[derive(Debug, Clone, PartialEq)]
pub struct ForeignObjectMapping {
    pub name: Cow<'static, str>,
    pub column: Cow<'static, str>,
    pub target: EntityType,
    pub target_table: Cow<'static, str>,
    /// Member name of the referenced primary key.
    pub target_key: Cow<'static, str>,
    pub target_key_column: Cow<'static, str>,
    /// Type of the referenced key, followed through foreign primary keys.
    pub value_type: ValueType,
    /// The key type has no NULL of its own, the column is therefore a nullable value.
    pub nullable: bool,
    pub primary_key: bool,
    pub insertable: bool,
    pub updateable: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReferenceListMapping {
    pub name: Cow<'static, str>,
    pub target: EntityType,
    pub target_table: Cow<'static, str>,
    pub target_field: Cow<'static, str>,
    /// Column of `target_field` on the target table.
    pub target_column: Cow<'static, str>,
    pub cascade: Cascade,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MemberMapping {
    Field(FieldMapping),
    ForeignObject(ForeignObjectMapping),
    ReferenceList(ReferenceListMapping),
}

impl MemberMapping {
    pub fn name(&self) -> &str {
        match self {
            MemberMapping::Field(v) => &v.name,
            MemberMapping::ForeignObject(v) => &v.name,
            MemberMapping::ReferenceList(v) => &v.name,
        }
    }
    /// Column backing the member, reference lists have none.
    pub fn column(&self) -> Option<&str> {
        match self {
            MemberMapping::Field(v) => Some(&v.column),
            MemberMapping::ForeignObject(v) => Some(&v.column),
            MemberMapping::ReferenceList(..) => None,
        }
    }
    pub fn is_primary_key(&self) -> bool {
        match self {
            MemberMapping::Field(v) => v.primary_key,
            MemberMapping::ForeignObject(v) => v.primary_key,
            MemberMapping::ReferenceList(..) => false,
        }
    }
    pub fn value_type(&self) -> Option<ValueType> {
        match self {
            MemberMapping::Field(v) => Some(v.value_type),
            MemberMapping::ForeignObject(v) => Some(v.value_type),
            MemberMapping::ReferenceList(..) => None,
        }
    }
    pub fn role(&self) -> Option<FieldRole> {
        match self {
            MemberMapping::Field(v) => Some(FieldRole::from_flags(
                v.primary_key,
                v.insertable,
                v.updateable,
            )),
            MemberMapping::ForeignObject(v) => Some(FieldRole::from_flags(
                v.primary_key,
                v.insertable,
                v.updateable,
            )),
            MemberMapping::ReferenceList(..) => None,
        }
    }
}

/// Resolved schema contract of one entity type. Immutable once built.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeMapping {
    pub entity: EntityType,
    pub table: Cow<'static, str>,
    pub load: LoadBehavior,
    pub members: Vec<MemberMapping>,
}

impl TypeMapping {
    pub fn member(&self, name: &str) -> Option<&MemberMapping> {
        self.members.iter().find(|m| m.name() == name)
    }
    pub fn primary_keys(&self) -> impl Iterator<Item = &MemberMapping> + Clone {
        self.members.iter().filter(|m| m.is_primary_key())
    }
    /// Members backed by a column, in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &MemberMapping> + Clone {
        self.members.iter().filter(|m| m.column().is_some())
    }
    pub fn reference_lists(&self) -> impl Iterator<Item = &ReferenceListMapping> {
        self.members.iter().filter_map(|m| match m {
            MemberMapping::ReferenceList(v) => Some(v),
            _ => None,
        })
    }
    /// Member backed by `column`.
    pub fn member_by_column(&self, column: &str) -> Option<&MemberMapping> {
        self.members.iter().find(|m| m.column() == Some(column))
    }
}
