#[cfg(test)]
mod tests {
    use quarry_core::{
        Cascade, Entity, EntityDeclaration, EntityType, FieldDeclaration, FieldRole,
        ForeignObjectDeclaration, LoadBehavior, MappingRegistry, MemberMapping, OrmError,
        ReferenceListDeclaration, SnakeCaseRule, TrackedField, ValueType, snake_case,
    };
    use std::sync::Arc;

    macro_rules! declared {
        ($name:ident, $declaration:expr) => {
            #[derive(Default)]
            struct $name;
            impl Entity for $name {
                fn declare() -> EntityDeclaration {
                    $declaration
                }
                fn field(&self, _name: &str) -> Option<&dyn TrackedField> {
                    None
                }
                fn field_mut(&mut self, _name: &str) -> Option<&mut dyn TrackedField> {
                    None
                }
            }
        };
    }

    declared!(
        Team,
        EntityDeclaration::table("Teams")
            .field(FieldDeclaration::new::<i32>("id").primary_key())
            .field(FieldDeclaration::new::<String>("displayName"))
            .reference_list(
                ReferenceListDeclaration::new("players", EntityType::of::<Player>(), "team")
                    .cascade(Cascade::DELETE)
            )
    );
    declared!(
        Player,
        EntityDeclaration::table("PlayerStats")
            .load(LoadBehavior::OnDemand)
            .field(FieldDeclaration::new::<i64>("id").primary_key())
            .field(FieldDeclaration::new::<String>("nickName").column("Nick"))
            .field(FieldDeclaration::new::<i32>("goalsScored").read_only())
            .foreign(ForeignObjectDeclaration::new("team", EntityType::of::<Team>()))
    );
    declared!(
        Badge,
        EntityDeclaration::table("badges")
            .foreign(ForeignObjectDeclaration::new("player", EntityType::of::<Player>()).primary_key())
            .field(FieldDeclaration::new::<String>("label"))
    );

    fn error_kind(error: &quarry_core::Error) -> &OrmError {
        error
            .downcast_ref::<OrmError>()
            .expect("Expected an OrmError")
    }

    #[test]
    fn resolve_members() {
        let registry = MappingRegistry::new();
        let mapping = registry.type_mapping::<Player>().unwrap();
        assert_eq!(mapping.table, "PlayerStats");
        assert_eq!(mapping.load, LoadBehavior::OnDemand);
        let columns: Vec<_> = mapping.columns().filter_map(|m| m.column()).collect();
        assert_eq!(columns, ["id", "Nick", "goalsScored", "team"]);
        let keys: Vec<_> = mapping.primary_keys().map(|m| m.name()).collect();
        assert_eq!(keys, ["id"]);
        assert_eq!(
            mapping.member("goalsScored").and_then(MemberMapping::role),
            Some(FieldRole::ReadOnly)
        );
        let Some(MemberMapping::ForeignObject(team)) = mapping.member("team") else {
            panic!("team must be a foreign object");
        };
        assert_eq!(team.target, EntityType::of::<Team>());
        assert_eq!(team.target_table, "Teams");
        assert_eq!(team.target_key, "id");
        assert_eq!(team.value_type, ValueType::Int32);
        assert!(team.nullable);
        assert_eq!(mapping.member_by_column("Nick").map(|m| m.name()), Some("nickName"));
    }

    #[test]
    fn memoized_and_frozen() {
        let registry = MappingRegistry::new();
        assert!(!registry.is_frozen());
        registry.register_rule(SnakeCaseRule).unwrap();
        let first = registry.type_mapping::<Team>().unwrap();
        let second = registry.type_mapping::<Team>().unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(registry.is_frozen());
        let error = registry.register_rule(SnakeCaseRule).unwrap_err();
        assert!(error_kind(&error).is_configuration());
    }

    #[test]
    fn naming_rules() {
        let registry = MappingRegistry::new();
        registry.register_rule(SnakeCaseRule).unwrap();
        let mapping = registry.type_mapping::<Player>().unwrap();
        assert_eq!(mapping.table, "player_stats");
        let columns: Vec<_> = mapping.columns().filter_map(|m| m.column()).collect();
        // Explicit columns are kept
        assert_eq!(columns, ["id", "Nick", "goals_scored", "team"]);

        assert_eq!(snake_case("EmployeeRecord"), "employee_record");
        assert_eq!(snake_case("employeeRecord"), "employee_record");
        assert_eq!(snake_case("HTTPStatus"), "http_status");
        assert_eq!(snake_case("already_snake"), "already_snake");
    }

    #[test]
    fn reference_lists() {
        let registry = MappingRegistry::new();
        let mapping = registry.type_mapping::<Team>().unwrap();
        let lists: Vec<_> = mapping.reference_lists().collect();
        assert_eq!(lists.len(), 1);
        assert_eq!(lists[0].target_table, "PlayerStats");
        assert_eq!(lists[0].target_column, "team");
        assert!(lists[0].cascade.delete);
        assert!(!lists[0].cascade.save);
        assert_eq!(mapping.member("players").and_then(|m| m.column()), None);
    }

    #[test]
    fn foreign_primary_key() {
        let registry = MappingRegistry::new();
        let mapping = registry.type_mapping::<Badge>().unwrap();
        let member = registry
            .member_mapping(EntityType::of::<Badge>(), "player")
            .unwrap();
        assert!(member.is_primary_key());
        assert_eq!(member.value_type(), Some(ValueType::Int64));
        assert_eq!(mapping.primary_keys().count(), 1);
        let error = registry
            .member_mapping(EntityType::of::<Badge>(), "missing")
            .unwrap_err();
        assert!(error_kind(&error).is_configuration());
    }

    declared!(
        Duplicated,
        EntityDeclaration::table("duplicated")
            .field(FieldDeclaration::new::<i64>("id").primary_key())
            .field(FieldDeclaration::new::<String>("name"))
            .field(FieldDeclaration::new::<String>("name"))
    );
    declared!(
        SameColumn,
        EntityDeclaration::table("same_column")
            .field(FieldDeclaration::new::<i64>("id").primary_key())
            .field(FieldDeclaration::new::<String>("a").column("x"))
            .field(FieldDeclaration::new::<String>("b").column("x"))
    );
    declared!(
        NoTable,
        EntityDeclaration::table("").field(FieldDeclaration::new::<i64>("id").primary_key())
    );
    declared!(
        TwoKeys,
        EntityDeclaration::table("two_keys")
            .field(FieldDeclaration::new::<i64>("a").primary_key())
            .field(FieldDeclaration::new::<i64>("b").primary_key())
    );
    declared!(
        PointsToTwoKeys,
        EntityDeclaration::table("points")
            .field(FieldDeclaration::new::<i64>("id").primary_key())
            .foreign(ForeignObjectDeclaration::new("target", EntityType::of::<TwoKeys>()))
    );
    declared!(
        CycleA,
        EntityDeclaration::table("cycle_a")
            .foreign(ForeignObjectDeclaration::new("b", EntityType::of::<CycleB>()).primary_key())
    );
    declared!(
        CycleB,
        EntityDeclaration::table("cycle_b")
            .foreign(ForeignObjectDeclaration::new("a", EntityType::of::<CycleA>()).primary_key())
    );
    declared!(
        WrongList,
        EntityDeclaration::table("wrong_list")
            .field(FieldDeclaration::new::<i64>("id").primary_key())
            .reference_list(ReferenceListDeclaration::new(
                "players",
                EntityType::of::<Player>(),
                "nickName"
            ))
    );

    #[test]
    fn configuration_errors() {
        let registry = MappingRegistry::new();
        let errors = [
            registry.type_mapping::<Duplicated>().unwrap_err(),
            registry.type_mapping::<SameColumn>().unwrap_err(),
            registry.type_mapping::<NoTable>().unwrap_err(),
            registry.type_mapping::<PointsToTwoKeys>().unwrap_err(),
            registry.type_mapping::<CycleA>().unwrap_err(),
            registry.type_mapping::<WrongList>().unwrap_err(),
        ];
        for error in &errors {
            assert!(error_kind(error).is_configuration(), "{error:#}");
        }
        assert!(errors[4].to_string().contains("Cyclic"));
        // Failures are not cached
        assert!(registry.type_mapping::<Duplicated>().is_err());
        // Entities with several keys are fine as long as nobody references them
        assert_eq!(
            registry
                .type_mapping::<TwoKeys>()
                .unwrap()
                .primary_keys()
                .count(),
            2
        );
    }

    #[test]
    fn field_roles() {
        assert_eq!(FieldRole::from_flags(true, false, false), FieldRole::KeyField);
        assert_eq!(FieldRole::from_flags(false, true, true), FieldRole::Writeable);
        assert_eq!(FieldRole::from_flags(false, true, false), FieldRole::Insertable);
        assert_eq!(FieldRole::from_flags(false, false, true), FieldRole::Updateable);
        assert_eq!(FieldRole::from_flags(false, false, false), FieldRole::ReadOnly);
        assert!(FieldRole::Insertable.is_insertable());
        assert!(!FieldRole::Insertable.is_updateable());
        assert!(!FieldRole::KeyField.is_updateable());
    }
}
