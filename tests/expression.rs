#[cfg(test)]
mod tests {
    use quarry::{
        BinaryOpType, Compilation, Context, Expr, ExpressionCompiler, ExpressionRule,
        Fragment, GenericSqlWriter, JoinClause, JoinType, KeyStrategies, LambdaRule,
        MappingRegistry, OrmError, Result, SqlWriter, StatementScope, Value, ValueType,
    };
    use quarry_tests::{Employee, Manager, init_logs};
    use std::sync::LazyLock;

    fn compile_with(
        writer: &dyn SqlWriter,
        expr: &Expr,
    ) -> Result<(String, Vec<Value>, Vec<JoinClause>)> {
        let registry = MappingRegistry::new();
        let mapping = registry.type_mapping::<Employee>()?;
        let compiler = ExpressionCompiler::new(writer, &registry);
        let mut scope = StatementScope::new(&mapping);
        let sql = compiler.compile(
            expr,
            &mut scope,
            Context::new(Fragment::SqlSelectWhere, true),
        )?;
        Ok((sql, scope.parameters().to_vec(), scope.joins().to_vec()))
    }

    fn compile(expr: &Expr) -> Result<(String, Vec<Value>, Vec<JoinClause>)> {
        compile_with(&GenericSqlWriter, expr)
    }

    fn render(expr: Expr) -> String {
        compile(&expr).unwrap().0
    }

    fn employee(body: impl FnOnce(Expr) -> Expr) -> Expr {
        Expr::lambda::<Employee>("x", body)
    }

    fn is_not_compilable(expr: Expr) -> bool {
        compile(&expr)
            .unwrap_err()
            .downcast_ref::<OrmError>()
            .is_some_and(OrmError::is_not_compilable)
    }

    #[test]
    fn comparison() {
        init_logs();
        let (sql, parameters, joins) =
            compile(&employee(|x| x.field("salary").greater(5000.0))).unwrap();
        assert_eq!(sql, r#"t0."salary" > @p0"#);
        assert_eq!(parameters, [Value::Float64(Some(5000.0))]);
        assert!(joins.is_empty());

        assert_eq!(
            render(employee(|x| x.field("name").not_equal("Ann"))),
            r#"t0."name" != @p0"#
        );
        assert_eq!(
            render(employee(|x| x.field("salary").less_equal(10))),
            r#"t0."salary" <= @p0"#
        );
        assert_eq!(
            render(employee(|x| x.field("name").like("A%"))),
            r#"t0."name" LIKE @p0"#
        );
        assert_eq!(
            render(employee(|x| x.field("name").not_like("A%"))),
            r#"t0."name" NOT LIKE @p0"#
        );
    }

    #[test]
    fn logical_precedence() {
        let (sql, parameters, _) = compile(&employee(|x| {
            x.clone()
                .field("name")
                .equal("Ann")
                .or(x.clone().field("name").equal("Bob"))
                .and(x.field("active"))
        }))
        .unwrap();
        assert_eq!(
            sql,
            r#"(t0."name" = @p0 OR t0."name" = @p1) AND t0."active" = @p2"#
        );
        assert_eq!(
            parameters,
            [Value::from("Ann"), Value::from("Bob"), Value::from(true)]
        );

        assert_eq!(
            render(employee(|x| {
                x.clone()
                    .field("active")
                    .and(x.clone().field("salary").greater(1))
                    .or(x.field("name").equal("Root"))
            })),
            r#"t0."active" = @p0 AND t0."salary" > @p1 OR t0."name" = @p2"#
        );
    }

    #[test]
    fn arithmetic_precedence() {
        assert_eq!(
            render(employee(|x| {
                (x.clone().field("salary") - 100.0 - 1.0).greater(x.field("salary"))
            })),
            r#"t0."salary" - @p0 - @p1 > t0."salary""#
        );
        assert_eq!(
            render(employee(|x| {
                (x.clone().field("salary") - (x.clone().field("salary") - 1.0))
                    .less(x.field("salary"))
            })),
            r#"t0."salary" - (t0."salary" - @p0) < t0."salary""#
        );
        assert_eq!(
            render(employee(|x| ((x.field("salary") + 100.0) * 2.0).greater(0))),
            r#"(t0."salary" + @p0) * @p1 > @p2"#
        );
        assert_eq!(
            render(employee(|x| (-x.field("salary")).greater(0))),
            r#"-t0."salary" > @p0"#
        );
        assert_eq!(
            render(employee(|x| (-(x.field("salary") + 1.0)).greater(0))),
            r#"-(t0."salary" + @p0) > @p1"#
        );
        assert_eq!(
            render(employee(|x| x.field("id").bitwise_and(4).equal(4))),
            r#"t0."id" & @p0 = @p1"#
        );
    }

    #[test]
    fn null_comparison() {
        let (sql, parameters, _) =
            compile(&employee(|x| x.field("manager").equal(Expr::null()))).unwrap();
        assert_eq!(sql, r#"t0."manager_id" IS NULL"#);
        assert!(parameters.is_empty());
        assert_eq!(
            render(employee(|x| x.field("manager").not_equal(Expr::null()))),
            r#"t0."manager_id" IS NOT NULL"#
        );
        assert_eq!(
            render(employee(|x| Expr::null().equal(x.field("name")))),
            r#"t0."name" IS NULL"#
        );
        assert_eq!(
            render(employee(|x| (x.field("salary") + 1.0).equal(Expr::null()))),
            r#"t0."salary" + @p0 IS NULL"#
        );
    }

    #[test]
    fn membership() {
        let (sql, parameters, _) =
            compile(&employee(|x| x.field("id").is_in(Expr::list([1i64, 2, 3])))).unwrap();
        assert_eq!(sql, r#"t0."id" IN (@p0, @p1, @p2)"#);
        assert_eq!(
            parameters,
            [
                Value::Int64(Some(1)),
                Value::Int64(Some(2)),
                Value::Int64(Some(3))
            ]
        );

        let (sql, parameters, _) = compile(&employee(|x| {
            x.clone()
                .field("active")
                .and(x.field("id").is_in(Expr::list(Vec::<i64>::new())))
        }))
        .unwrap();
        assert_eq!(sql, r#"t0."active" = @p0 AND 1 = 0"#);
        assert_eq!(parameters, [Value::Boolean(Some(true))]);

        assert_eq!(
            render(employee(|x| {
                Expr::list(["Ann", "Bob"].map(String::from)).contains(x.field("name"))
            })),
            r#"t0."name" IN (@p0, @p1)"#
        );
    }

    #[test]
    fn foreign_navigation() {
        let (sql, parameters, joins) =
            compile(&employee(|x| x.field("manager").field("name").equal("Ann"))).unwrap();
        assert_eq!(sql, r#"t1."name" = @p0"#);
        assert_eq!(parameters, [Value::from("Ann")]);
        assert_eq!(
            joins,
            [JoinClause {
                path: "t0.manager".into(),
                join: JoinType::Left,
                table: "managers".into(),
                alias: "t1".into(),
                left_alias: "t0".into(),
                left_column: "manager_id".into(),
                right_column: "id".into(),
            }]
        );

        // The referenced key is read from the foreign key column
        let (sql, _, joins) =
            compile(&employee(|x| x.field("manager").field("id").equal(5i64))).unwrap();
        assert_eq!(sql, r#"t0."manager_id" = @p0"#);
        assert!(joins.is_empty());
    }

    #[test]
    fn join_reuse() {
        let (sql, _, joins) = compile(&employee(|x| {
            x.clone()
                .field("manager")
                .field("name")
                .equal("Ann")
                .or(x.field("manager").field("name").like("B%"))
        }))
        .unwrap();
        assert_eq!(joins.len(), 1);
        let manager = &joins[0].alias;
        assert_eq!(
            sql,
            format!(r#"{manager}."name" = @p0 OR {manager}."name" LIKE @p1"#)
        );

        let (sql, _, joins) = compile(&employee(|x| {
            x.clone()
                .field("manager")
                .field("department")
                .field("name")
                .equal(x.field("department").field("name"))
        }))
        .unwrap();
        let by_path = |path: &str| {
            joins
                .iter()
                .find(|j| j.path.ends_with(path))
                .unwrap_or_else(|| panic!("No join for `{path}`"))
        };
        assert_eq!(joins.len(), 3);
        let manager = by_path(".manager");
        let manager_department = by_path(".manager.department");
        let department = joins
            .iter()
            .find(|j| j.path.ends_with(".department") && !j.path.contains(".manager"))
            .unwrap();
        assert_eq!(
            (&*manager.table, &*manager.left_column),
            ("managers", "manager_id")
        );
        assert_eq!(
            (&*manager_department.table, &*manager_department.left_column),
            ("departments", "department_id")
        );
        assert_eq!(
            (&*department.table, &*department.left_column),
            ("departments", "department_id")
        );
        // The nested navigation starts from the manager join, the others from the root
        assert_eq!(manager_department.left_alias, manager.alias);
        assert_eq!(department.left_alias, manager.left_alias);
        assert_ne!(manager_department.alias, department.alias);
        assert_eq!(
            sql,
            format!(
                r#"{}."name" = {}."name""#,
                manager_department.alias, department.alias
            )
        );

        let (sql, _, joins) =
            compile(&employee(|x| x.field("mentor").field("name").equal("Ann"))).unwrap();
        assert_eq!(sql, format!(r#"{}."name" = @p0"#, joins[0].alias));
        assert_eq!(joins[0].table, "employees");
    }

    #[test]
    fn negation() {
        let (sql, parameters, _) = compile(&employee(|x| !x.field("active"))).unwrap();
        assert_eq!(sql, r#"NOT t0."active" = @p0"#);
        assert_eq!(parameters, [Value::Boolean(Some(true))]);
        assert_eq!(
            render(employee(|x| !x.field("salary").greater(10))),
            r#"NOT t0."salary" > @p0"#
        );
        assert_eq!(
            render(employee(|x| {
                !x.clone()
                    .field("active")
                    .or(x.field("salary").greater(10))
            })),
            r#"NOT (t0."active" = @p0 OR t0."salary" > @p1)"#
        );
    }

    #[test]
    fn boolean_member_outside_conditions() {
        // Compared explicitly, the member stays a plain column
        assert_eq!(
            render(employee(|x| x.field("active").equal(false))),
            r#"t0."active" = @p0"#
        );
        let registry = MappingRegistry::new();
        let mapping = registry.type_mapping::<Employee>().unwrap();
        let compiler = ExpressionCompiler::new(&GenericSqlWriter, &registry);
        let mut scope = StatementScope::new(&mapping);
        let sql = compiler
            .compile(
                &employee(|x| x.field("active")),
                &mut scope,
                Context::new(Fragment::SqlSelectOrderBy, true),
            )
            .unwrap();
        assert_eq!(sql, r#"t0."active""#);
    }

    #[test]
    fn constants_and_parameters() {
        let mut manager = Manager::default();
        manager.id.set(7);
        let (sql, parameters, _) =
            compile(&employee(|x| x.field("manager").equal(Expr::entity(&manager)))).unwrap();
        assert_eq!(sql, r#"t0."manager_id" = @p0"#);
        assert_eq!(parameters, [Value::Int64(Some(7))]);

        // The parameter alone stands for its key
        assert_eq!(render(employee(|x| x.equal(3i64))), r#"t0."id" = @p0"#);

        // Unbound parameters of the root type refer to the root table
        assert_eq!(
            render(Expr::parameter::<Employee>("e")
                .field("salary")
                .greater(1.0)),
            r#"t0."salary" > @p0"#
        );

        assert_eq!(
            render(employee(|x| x
                .field("salary")
                .convert(ValueType::Int64)
                .greater(3i64))),
            r#"t0."salary" > @p0"#
        );
        assert_eq!(
            render(employee(|x| x.field("name").equal(Expr::value(Value::Varchar(None))))),
            r#"t0."name" IS NULL"#
        );
    }

    #[test]
    fn not_compilable() {
        assert!(is_not_compilable(employee(|x| x
            .field("nickname")
            .equal(1))));
        assert!(is_not_compilable(employee(|x| x
            .field("name")
            .field("length")
            .equal(1))));
        assert!(is_not_compilable(Expr::lambda::<Manager>("m", |m| m
            .field("name")
            .equal("Ann"))));
        assert!(is_not_compilable(
            Expr::parameter::<Manager>("m").field("name").equal("Ann")
        ));
        assert!(is_not_compilable(Expr::value(1).field("x").equal(1)));
        assert!(is_not_compilable(Expr::parameter::<Manager>("m").equal(1)));

        // A referenced entity that was never saved has no usable key
        let unsaved = Manager::default();
        assert!(is_not_compilable(employee(|x| x
            .field("manager")
            .equal(Expr::entity(&unsaved)))));
    }

    struct LowerLikeRule;
    impl ExpressionRule for LowerLikeRule {
        fn name(&self) -> &'static str {
            "lower like"
        }
        fn matches(&self, node: &Expr, _compilation: &Compilation<'_, '_>) -> bool {
            matches!(
                node,
                Expr::Binary {
                    op: BinaryOpType::Like,
                    ..
                }
            )
        }
        fn compile<'e>(
            &self,
            node: &'e Expr,
            compilation: &mut Compilation<'_, 'e>,
        ) -> Result<()> {
            let Expr::Binary { lhs, rhs, .. } = node else {
                unreachable!();
            };
            compilation.out.push_str("LOWER(");
            compilation.parse_child(lhs)?;
            compilation.out.push_str(") LIKE LOWER(");
            compilation.parse_child(rhs)?;
            compilation.out.push(')');
            Ok(())
        }
    }

    static RULES: LazyLock<Vec<&'static dyn ExpressionRule>> = LazyLock::new(|| {
        let mut rules: Vec<&'static dyn ExpressionRule> = Vec::new();
        rules.push(&LowerLikeRule);
        rules.extend(GenericSqlWriter.expression_rules().iter().copied());
        rules
    });
    static LAMBDA_ONLY: &[&dyn ExpressionRule] = &[&LambdaRule];
    static STRATEGIES: LazyLock<KeyStrategies> = LazyLock::new(KeyStrategies::new);

    struct LowerLikeWriter;
    impl SqlWriter for LowerLikeWriter {
        fn as_dyn(&self) -> &dyn SqlWriter {
            self
        }
        fn expression_rules(&self) -> &[&'static dyn ExpressionRule] {
            &RULES
        }
        fn key_strategies(&self) -> &KeyStrategies {
            &STRATEGIES
        }
    }

    struct LambdaOnlyWriter;
    impl SqlWriter for LambdaOnlyWriter {
        fn as_dyn(&self) -> &dyn SqlWriter {
            self
        }
        fn expression_rules(&self) -> &[&'static dyn ExpressionRule] {
            LAMBDA_ONLY
        }
        fn key_strategies(&self) -> &KeyStrategies {
            &STRATEGIES
        }
    }

    #[test]
    fn custom_rule_table() {
        let (sql, parameters, _) = compile_with(
            &LowerLikeWriter,
            &employee(|x| {
                x.clone()
                    .field("name")
                    .like("a%")
                    .and(x.field("salary").greater(1))
            }),
        )
        .unwrap();
        assert_eq!(
            sql,
            r#"LOWER(t0."name") LIKE LOWER(@p0) AND t0."salary" > @p1"#
        );
        assert_eq!(parameters.len(), 2);

        let error = compile_with(&LambdaOnlyWriter, &employee(|x| x.field("active")))
            .unwrap_err();
        assert!(
            error
                .downcast_ref::<OrmError>()
                .is_some_and(OrmError::is_not_compilable)
        );
    }
}
