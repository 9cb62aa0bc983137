#[cfg(test)]
mod tests {
    use indoc::indoc;
    use quarry::{
        CommandBuilder, DeleteCommandBuilder, Expr, ExpressionCompiler, FieldRole,
        InsertCommandBuilder, MappingRegistry, Order, PostgresSqlWriter, SelectCommandBuilder,
        SqlServerSqlWriter, SqlWriter, UpdateCommandBuilder, Value, ValueType,
    };
    use quarry_tests::{Employee, init_logs};
    use uuid::Uuid;

    fn employee(body: impl FnOnce(Expr) -> Expr) -> Expr {
        Expr::lambda::<Employee>("x", body)
    }

    fn select(writer: &dyn SqlWriter, limit: Option<u32>) -> String {
        let registry = MappingRegistry::new();
        let mapping = registry.type_mapping::<Employee>().unwrap();
        let compiler = ExpressionCompiler::new(writer, &registry);
        let mut select = SelectCommandBuilder::new(&mapping);
        select.add_field_declaration("id".into(), FieldRole::KeyField);
        select.add_field_declaration("name".into(), FieldRole::Writeable);
        select
            .add_where(
                &compiler,
                &employee(|x| {
                    x.clone()
                        .field("salary")
                        .greater(100.0)
                        .and(x.field("name").like("A%"))
                }),
            )
            .unwrap()
            .add_order_by(&compiler, &employee(|x| x.field("name")), Order::ASC)
            .unwrap()
            .set_limit(limit);
        select.build(writer).unwrap().sql
    }

    #[test]
    fn postgres_select() {
        init_logs();
        assert_eq!(
            select(&PostgresSqlWriter, Some(3)),
            indoc! {r#"
                SELECT t0."id", t0."name"
                FROM "employees" t0
                WHERE t0."salary" > $1 AND t0."name" LIKE $2
                ORDER BY t0."name" ASC
                LIMIT 3;
            "#}
            .trim()
        );
    }

    #[test]
    fn postgres_insert() {
        let writer = PostgresSqlWriter;
        let mut insert = InsertCommandBuilder::new();
        insert.set_table_name("employees".into());
        insert.add_field(
            "id".into(),
            Value::Int64(None),
            FieldRole::KeyField,
            writer.key_strategies().get(ValueType::Int64),
            false,
        );
        insert.add_field("name".into(), "Ann".into(), FieldRole::Writeable, None, true);
        assert_eq!(
            insert.build(&writer).unwrap().sql,
            indoc! {r#"
                INSERT INTO "employees" ("name") VALUES ($1);
                SELECT "id", "name" FROM "employees" WHERE "id" = lastval();
            "#}
            .trim()
        );

        let mut update = UpdateCommandBuilder::new();
        update.set_table_name("employees".into());
        update.add_field(
            "id".into(),
            Value::Int64(Some(1)),
            FieldRole::KeyField,
            None,
            false,
        );
        update.add_field("name".into(), "Bob".into(), FieldRole::Writeable, None, true);
        assert_eq!(
            update.build(&writer).unwrap().sql,
            indoc! {r#"
                UPDATE "employees" SET "name" = $1 WHERE "id" = $2;
                SELECT "id", "name" FROM "employees" WHERE "id" = $2;
            "#}
            .trim()
        );
    }

    #[test]
    fn sql_server_select() {
        assert_eq!(
            select(&SqlServerSqlWriter, Some(5)),
            indoc! {r#"
                SELECT TOP 5 t0.[id], t0.[name]
                FROM [employees] t0
                WHERE t0.[salary] > @p0 AND t0.[name] LIKE @p1
                ORDER BY t0.[name] ASC;
            "#}
            .trim()
        );
        assert_eq!(
            select(&SqlServerSqlWriter, None),
            indoc! {r#"
                SELECT t0.[id], t0.[name]
                FROM [employees] t0
                WHERE t0.[salary] > @p0 AND t0.[name] LIKE @p1
                ORDER BY t0.[name] ASC;
            "#}
            .trim()
        );
    }

    #[test]
    fn sql_server_identity() {
        let writer = SqlServerSqlWriter;
        let mut insert = InsertCommandBuilder::new();
        insert.set_table_name("employees".into());
        insert.add_field(
            "id".into(),
            Value::Int64(Some(0)),
            FieldRole::KeyField,
            writer.key_strategies().get(ValueType::Int64),
            false,
        );
        insert.add_field("name".into(), "Ann".into(), FieldRole::Writeable, None, true);
        let statement = insert.build(&writer).unwrap();
        assert_eq!(
            statement.sql,
            indoc! {"
                DECLARE @k0 BIGINT;
                INSERT [employees] ([name]) VALUES (@p0);
                SET @k0 = SCOPE_IDENTITY();
                SELECT [id], [name] FROM [employees] WHERE [id] = @k0;
            "}
            .trim()
        );
        assert_eq!(statement.parameters, [Value::from("Ann")]);
    }

    #[test]
    fn sql_server_generated_uuid() {
        let writer = SqlServerSqlWriter;
        let mut insert = InsertCommandBuilder::new();
        insert.set_table_name("documents".into());
        insert.add_field(
            "id".into(),
            Value::Uuid(Some(Uuid::nil())),
            FieldRole::KeyField,
            writer.key_strategies().get(ValueType::Uuid),
            false,
        );
        insert.add_field("title".into(), "Notes".into(), FieldRole::Writeable, None, true);
        insert.add_field(
            "revision".into(),
            Value::Int64(None),
            FieldRole::ReadOnly,
            None,
            false,
        );
        let statement = insert.build(&writer).unwrap();
        assert_eq!(
            statement.sql,
            indoc! {"
                DECLARE @k0 UNIQUEIDENTIFIER = NEWID();
                INSERT [documents] ([id], [title]) VALUES (@k0, @p0);
                SELECT [id], [title], [revision] FROM [documents] WHERE [id] = @k0;
            "}
            .trim()
        );
        assert_eq!(statement.parameters, [Value::from("Notes")]);
    }

    #[test]
    fn sql_server_composite_identity() {
        let writer = SqlServerSqlWriter;
        let mut insert = InsertCommandBuilder::new();
        insert.set_table_name("pairs".into());
        for key in ["a", "b"] {
            insert.add_field(
                key.into(),
                Value::Int32(None),
                FieldRole::KeyField,
                writer.key_strategies().get(ValueType::Int32),
                false,
            );
        }
        assert_eq!(
            insert.build(&writer).unwrap().sql,
            indoc! {"
                DECLARE @k0 BIGINT;
                DECLARE @k1 BIGINT;
                INSERT [pairs] DEFAULT VALUES;
                SET @k0 = SCOPE_IDENTITY();
                SET @k1 = SCOPE_IDENTITY();
                SELECT [a], [b] FROM [pairs] WHERE [a] = @k0 AND [b] = @k1;
            "}
            .trim()
        );
    }

    #[test]
    fn sql_server_delete() {
        let writer = SqlServerSqlWriter;
        let mut delete = DeleteCommandBuilder::new();
        delete.set_table_name("odd]table".into());
        delete.add_field(
            "id".into(),
            Value::Int64(Some(1)),
            FieldRole::KeyField,
            None,
            false,
        );
        assert_eq!(
            delete.build(&writer).unwrap().sql,
            "DELETE [odd]]table] WHERE [id] = @p0;"
        );
    }
}
