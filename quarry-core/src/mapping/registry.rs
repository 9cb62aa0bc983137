use crate::{
    Entity, EntityType, FieldMapping, ForeignObjectDeclaration, ForeignObjectMapping,
    MappingRule, MemberDeclaration, MemberMapping, ReferenceListMapping, Result, TypeMapping,
    ValueType, configuration_error,
};
use std::{
    any::TypeId,
    borrow::Cow,
    collections::{HashMap, HashSet},
    sync::{
        Arc, PoisonError, RwLock,
        atomic::{AtomicBool, Ordering},
    },
};

/// Process scoped cache of resolved [`TypeMapping`]s.
///
/// Naming rules can be registered until the first resolution, which freezes the registry.
/// Resolution errors are configuration defects, they are returned at the first request and
/// never cached.
#[derive(Default)]
pub struct MappingRegistry {
    rules: RwLock<Vec<Arc<dyn MappingRule>>>,
    frozen: AtomicBool,
    types: RwLock<HashMap<EntityType, Arc<TypeMapping>>>,
}

impl MappingRegistry {
    pub fn new() -> Self {
        Default::default()
    }

    pub fn register_rule(&self, rule: impl MappingRule + 'static) -> Result<()> {
        let mut rules = self.rules.write().unwrap_or_else(PoisonError::into_inner);
        if self.frozen.load(Ordering::Acquire) {
            return Err(configuration_error(
                "Cannot register a mapping rule after the first type mapping was resolved",
            ));
        }
        rules.push(Arc::new(rule));
        Ok(())
    }

    pub fn is_frozen(&self) -> bool {
        self.frozen.load(Ordering::Acquire)
    }

    pub fn type_mapping<E: Entity>(&self) -> Result<Arc<TypeMapping>> {
        self.type_mapping_of(EntityType::of::<E>())
    }

    pub fn type_mapping_of(&self, entity: EntityType) -> Result<Arc<TypeMapping>> {
        if let Some(mapping) = self
            .types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&entity)
        {
            return Ok(mapping.clone());
        }
        let rules = self.rules.read().unwrap_or_else(PoisonError::into_inner);
        if !self.frozen.swap(true, Ordering::AcqRel) {
            log::debug!("Mapping registry frozen with {} rule(s)", rules.len());
        }
        let mapping = Arc::new(Resolver { rules: &rules }.resolve(entity)?);
        drop(rules);
        let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
        Ok(types.entry(entity).or_insert(mapping).clone())
    }

    pub fn member_mapping(&self, entity: EntityType, member: &str) -> Result<MemberMapping> {
        self.type_mapping_of(entity)?
            .member(member)
            .cloned()
            .ok_or_else(|| {
                configuration_error(format!("Entity {entity:?} has no mapped member `{member}`"))
            })
    }
}

struct ResolvedKey {
    name: Cow<'static, str>,
    column: Cow<'static, str>,
    value_type: ValueType,
}

struct Resolver<'a> {
    rules: &'a [Arc<dyn MappingRule>],
}

impl Resolver<'_> {
    fn table_name(&self, entity: EntityType, declared: &Cow<'static, str>) -> Cow<'static, str> {
        self.rules
            .iter()
            .find_map(|r| r.table_name(entity, declared))
            .unwrap_or_else(|| declared.clone())
    }

    fn column_name(
        &self,
        entity: EntityType,
        name: &Cow<'static, str>,
        explicit: &Option<Cow<'static, str>>,
    ) -> Cow<'static, str> {
        if let Some(column) = explicit {
            return column.clone();
        }
        self.rules
            .iter()
            .find_map(|r| r.column_name(entity, name))
            .unwrap_or_else(|| name.clone())
    }

    fn resolve(&self, entity: EntityType) -> Result<TypeMapping> {
        let declaration = entity.declaration();
        let table = self.table_name(entity, &declaration.table);
        if table.is_empty() {
            return Err(configuration_error(format!(
                "Entity {entity:?} has an empty table name"
            )));
        }
        let mut names = HashSet::new();
        let mut columns = HashSet::new();
        let mut members = Vec::with_capacity(declaration.members.len());
        for member in &declaration.members {
            if !names.insert(member.name().to_owned()) {
                return Err(configuration_error(format!(
                    "Entity {entity:?} declares member `{}` more than once",
                    member.name()
                )));
            }
            let resolved = match member {
                MemberDeclaration::Field(field) => MemberMapping::Field(FieldMapping {
                    name: field.name.clone(),
                    column: self.column_name(entity, &field.name, &field.column),
                    value_type: field.value_type,
                    primary_key: field.primary_key,
                    insertable: field.insertable,
                    updateable: field.updateable,
                }),
                MemberDeclaration::ForeignObject(foreign) => {
                    MemberMapping::ForeignObject(self.resolve_foreign(entity, foreign)?)
                }
                MemberDeclaration::ReferenceList(list) => {
                    let target = list.target.declaration();
                    let target_column = match target.member(&list.target_field) {
                        Some(MemberDeclaration::ForeignObject(f)) if f.target == entity => {
                            self.column_name(list.target, &f.name, &f.column)
                        }
                        _ => {
                            return Err(configuration_error(format!(
                                "Reference list `{}` of {entity:?}: {:?}.{} is not a foreign object referencing {entity:?}",
                                list.name, list.target, list.target_field,
                            )));
                        }
                    };
                    MemberMapping::ReferenceList(ReferenceListMapping {
                        name: list.name.clone(),
                        target: list.target,
                        target_table: self.table_name(list.target, &target.table),
                        target_field: list.target_field.clone(),
                        target_column,
                        cascade: list.cascade,
                    })
                }
            };
            if let Some(column) = resolved.column()
                && !columns.insert(column.to_owned())
            {
                return Err(configuration_error(format!(
                    "Entity {entity:?} maps column `{column}` more than once"
                )));
            }
            members.push(resolved);
        }
        Ok(TypeMapping {
            entity,
            table,
            load: declaration.load,
            members,
        })
    }

    fn resolve_foreign(
        &self,
        entity: EntityType,
        foreign: &ForeignObjectDeclaration,
    ) -> Result<ForeignObjectMapping> {
        // A key made of a foreign object must not lead back to its own type
        let mut visited = if foreign.primary_key {
            vec![entity.id()]
        } else {
            Vec::new()
        };
        let key = self.resolve_key(foreign.target, &mut visited)?;
        let target = foreign.target.declaration();
        Ok(ForeignObjectMapping {
            name: foreign.name.clone(),
            column: self.column_name(entity, &foreign.name, &foreign.column),
            target: foreign.target,
            target_table: self.table_name(foreign.target, &target.table),
            target_key: key.name,
            target_key_column: key.column,
            value_type: key.value_type,
            nullable: key.value_type.is_value_type(),
            primary_key: foreign.primary_key,
            insertable: foreign.insertable,
            updateable: foreign.updateable,
        })
    }

    fn resolve_key(&self, target: EntityType, visited: &mut Vec<TypeId>) -> Result<ResolvedKey> {
        if visited.contains(&target.id()) {
            return Err(configuration_error(format!(
                "Cyclic foreign key chain through {target:?}"
            )));
        }
        visited.push(target.id());
        let declaration = target.declaration();
        let keys: Vec<_> = declaration
            .members
            .iter()
            .filter(|m| m.is_primary_key())
            .collect();
        let [key] = keys.as_slice() else {
            return Err(configuration_error(format!(
                "{target:?} is referenced by a foreign object and must declare exactly one primary key, found {}",
                keys.len()
            )));
        };
        match key {
            MemberDeclaration::Field(field) => Ok(ResolvedKey {
                name: field.name.clone(),
                column: self.column_name(target, &field.name, &field.column),
                value_type: field.value_type,
            }),
            MemberDeclaration::ForeignObject(foreign) => {
                let inner = self.resolve_key(foreign.target, visited)?;
                Ok(ResolvedKey {
                    name: foreign.name.clone(),
                    column: self.column_name(target, &foreign.name, &foreign.column),
                    value_type: inner.value_type,
                })
            }
            MemberDeclaration::ReferenceList(list) => Err(configuration_error(format!(
                "Reference list `{}` of {target:?} cannot be a primary key",
                list.name
            ))),
        }
    }
}
