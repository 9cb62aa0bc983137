use async_stream::try_stream;
use quarry_core::{
    CommandBuilder, ConnectionString, Driver, Entity, Error, Executor, Expr, ExpressionCompiler,
    FieldContribution, FieldRole, LeaseManager, LoadBehavior, MappingRegistry, MemberMapping,
    Order, Ordered, Result, RowLabeled, RowsAffected, SqlWriter, Statement, TypeMapping, Value,
    configuration_error, statement_state_error,
    stream::{Stream, TryStreamExt},
};
use std::{borrow::Cow, marker::PhantomData, pin::pin, sync::Arc};

/// Typed access to the rows of the table mapped by `E`.
///
/// Every operation acquires a connection lease for its duration and releases it on every exit
/// path. Rows read back from the database are loaded into the instances, which end clean.
pub struct Collection<E: Entity, D: Driver> {
    registry: Arc<MappingRegistry>,
    leases: LeaseManager<D::Connection>,
    connection_string: ConnectionString,
    driver: D,
    _entity: PhantomData<fn() -> E>,
}

impl<E: Entity, D: Driver> Collection<E, D> {
    pub fn new(
        registry: Arc<MappingRegistry>,
        leases: LeaseManager<D::Connection>,
        connection_string: &str,
    ) -> Result<Self> {
        Ok(Self {
            registry,
            leases,
            connection_string: ConnectionString::for_driver::<D>(connection_string)?,
            driver: D::default(),
            _entity: PhantomData,
        })
    }

    pub fn registry(&self) -> &Arc<MappingRegistry> {
        &self.registry
    }
    pub fn leases(&self) -> &LeaseManager<D::Connection> {
        &self.leases
    }
    pub fn connection_string(&self) -> &ConnectionString {
        &self.connection_string
    }
    pub fn driver(&self) -> &D {
        &self.driver
    }

    pub fn mapping(&self) -> Result<Arc<TypeMapping>> {
        self.registry.type_mapping::<E>()
    }

    pub fn query(&self) -> CollectionQuery<'_, E, D> {
        CollectionQuery {
            collection: self,
            filters: Vec::new(),
            order_by: Vec::new(),
            limit: None,
            force: false,
        }
    }

    pub async fn find(&self, predicate: Expr) -> Result<Vec<E>> {
        self.query().filter(predicate).fetch_all().await
    }

    pub async fn find_one(&self, predicate: Expr) -> Result<Option<E>> {
        self.query().filter(predicate).fetch_one().await
    }

    /// Inserts `entity`, then loads the row read back (generated keys included) into it.
    pub async fn insert(&self, entity: &mut E) -> Result<()> {
        let result: Result<()> = async {
            let mapping = self.mapping()?;
            let writer = self.driver.sql_writer();
            let mut builder = self.driver.insert_command_builder();
            builder.set_table_name(mapping.table.clone());
            for field in contributions(entity, &mapping, writer.as_dyn(), false)? {
                builder.add_contribution(field);
            }
            let statement = builder.build(writer.as_dyn())?;
            let row = self.read_back(statement).await?.ok_or_else(|| {
                Error::msg(format!(
                    "INSERT into `{}` did not return the inserted row",
                    mapping.table
                ))
            })?;
            entity.commit_all();
            load_row(entity, &mapping, &row)
        }
        .await;
        result.inspect_err(|e| log::error!("{:#}", e))
    }

    /// Writes the changed members of `entity`. Returns `false` without touching the database
    /// when nothing changed. Modified keys are rejected.
    pub async fn update(&self, entity: &mut E) -> Result<bool> {
        let result: Result<bool> = async {
            let mapping = self.mapping()?;
            let writer = self.driver.sql_writer();
            if let Some(key) = mapping
                .primary_keys()
                .find(|m| entity.field(m.name()).is_some_and(|f| f.is_changed()))
            {
                return Err(statement_state_error(format!(
                    "Key `{}` of {:?} was modified, the key of a stored row cannot be updated",
                    key.name(),
                    mapping.entity
                )));
            }
            let mut builder = self.driver.update_command_builder();
            builder.set_table_name(mapping.table.clone());
            for field in contributions(entity, &mapping, writer.as_dyn(), true)? {
                builder.add_contribution(field);
            }
            if !builder.has_changes() {
                log::debug!("No change to write for {:?}", mapping.entity);
                return Ok(false);
            }
            let statement = builder.build(writer.as_dyn())?;
            let Some(row) = self.read_back(statement).await? else {
                return Err(Error::msg(format!(
                    "UPDATE of `{}` did not find the row",
                    mapping.table
                )));
            };
            entity.commit_all();
            load_row(entity, &mapping, &row)?;
            Ok(true)
        }
        .await;
        result.inspect_err(|e| log::error!("{:#}", e))
    }

    /// Deletes the row of `entity`, identified by its committed key. Rows referencing it
    /// through a reference list with `cascade.delete` are deleted first.
    pub async fn delete(&self, entity: &E) -> Result<RowsAffected> {
        let result: Result<RowsAffected> = async {
            let mapping = self.mapping()?;
            let writer = self.driver.sql_writer();
            let keys = key_values(entity, &mapping)?;
            let mut cascades = Vec::new();
            for list in mapping.reference_lists().filter(|l| l.cascade.delete) {
                let [(_, key)] = keys.as_slice() else {
                    return Err(configuration_error(format!(
                        "Reference list `{}` requires {:?} to have a single key",
                        list.name, mapping.entity
                    )));
                };
                let mut builder = self.driver.delete_command_builder();
                builder.set_table_name(list.target_table.clone());
                builder.add_field(
                    list.target_column.clone(),
                    key.clone(),
                    FieldRole::KeyField,
                    None,
                    false,
                );
                cascades.push((list.name.clone(), builder.build(writer.as_dyn())?));
            }
            let mut builder = self.driver.delete_command_builder();
            builder.set_table_name(mapping.table.clone());
            for (column, value) in keys {
                builder.add_field(column, value, FieldRole::KeyField, None, false);
            }
            let statement = builder.build(writer.as_dyn())?;
            let lease = self.leases.acquire(&self.connection_string).await?;
            for (name, cascade) in cascades {
                let affected = lease.execute(cascade).await?;
                log::debug!(
                    "Cascade delete of `{name}` removed {} rows",
                    affected.rows_affected
                );
            }
            lease.execute(statement).await
        }
        .await;
        result.inspect_err(|e| log::error!("{:#}", e))
    }

    /// Reads every column of `entity` again by key. Returns `false` when the row is gone.
    pub async fn reload(&self, entity: &mut E) -> Result<bool> {
        let result: Result<bool> = async {
            let mapping = self.mapping()?;
            let mut query = self.query().force();
            for (name, value) in key_members(entity, &mapping)? {
                query = query.filter(Expr::lambda::<E>("x", |x| {
                    x.field(name).equal(Expr::value(value))
                }));
            }
            let statement = query.statement()?;
            let Some(row) = self.read_back(statement).await? else {
                return Ok(false);
            };
            load_row(entity, &mapping, &row)?;
            Ok(true)
        }
        .await;
        result.inspect_err(|e| log::error!("{:#}", e))
    }

    /// First row produced by `statement`, the statements before it may produce none.
    async fn read_back(&self, statement: Statement) -> Result<Option<RowLabeled>> {
        let lease = self.leases.acquire(&self.connection_string).await?;
        let mut source = lease.value_source(statement);
        if !source.next().await? {
            return Ok(None);
        }
        Ok(source.row().cloned())
    }
}

/// Query over a [`Collection`], built fluently and executed with one of the `fetch` methods.
pub struct CollectionQuery<'c, E: Entity, D: Driver> {
    collection: &'c Collection<E, D>,
    filters: Vec<Expr>,
    order_by: Vec<Ordered>,
    limit: Option<u32>,
    force: bool,
}

impl<'c, E: Entity, D: Driver> CollectionQuery<'c, E, D> {
    /// Adds a predicate, ANDed with the previous ones.
    pub fn filter(mut self, predicate: impl Into<Expr>) -> Self {
        self.filters.push(predicate.into());
        self
    }

    pub fn order_by(mut self, expression: Expr, order: Order) -> Self {
        self.order_by.push(Ordered { order, expression });
        self
    }

    pub fn limit(mut self, limit: u32) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Loads every column regardless of the load behavior of `E`.
    pub fn force(mut self) -> Self {
        self.force = true;
        self
    }

    pub fn statement(&self) -> Result<Statement> {
        let collection = self.collection;
        let mapping = collection.mapping()?;
        if mapping.load == LoadBehavior::ForceOnly && !self.force {
            return Err(statement_state_error(format!(
                "{:?} can only be queried with force()",
                mapping.entity
            )));
        }
        let keys_only = mapping.load == LoadBehavior::OnDemand && !self.force;
        let writer = collection.driver.sql_writer();
        let compiler = ExpressionCompiler::new(writer.as_dyn(), &collection.registry);
        let mut builder = collection.driver.select_command_builder(&mapping);
        for member in mapping
            .columns()
            .filter(|m| !keys_only || m.is_primary_key())
        {
            if let (Some(column), Some(role)) = (column_of(member), member.role()) {
                builder.add_field_declaration(column, role);
            }
        }
        for filter in &self.filters {
            builder.add_where(&compiler, filter)?;
        }
        for ordered in &self.order_by {
            builder.add_order_by(&compiler, &ordered.expression, ordered.order)?;
        }
        builder.set_limit(self.limit);
        builder.build(writer.as_dyn())
    }

    /// Matching rows, loaded into detached instances as they arrive.
    pub fn stream(self) -> impl Stream<Item = Result<E>> + Send + 'c {
        try_stream! {
            let statement = self.statement()?;
            let mapping = self.collection.mapping()?;
            let lease = self
                .collection
                .leases
                .acquire(&self.collection.connection_string)
                .await?;
            let mut rows = pin!(lease.fetch(statement));
            while let Some(row) = rows.try_next().await? {
                let mut entity = E::default();
                load_row(&mut entity, &mapping, &row)?;
                yield entity;
            }
        }
    }

    pub async fn fetch_all(self) -> Result<Vec<E>> {
        self.stream()
            .try_collect()
            .await
            .inspect_err(|e| log::error!("{:#}", e))
    }

    pub async fn fetch_one(self) -> Result<Option<E>> {
        let rows = self.limit(1).stream();
        pin!(rows)
            .try_next()
            .await
            .inspect_err(|e| log::error!("{:#}", e))
    }
}

fn column_of(member: &MemberMapping) -> Option<Cow<'static, str>> {
    match member {
        MemberMapping::Field(v) => Some(v.column.clone()),
        MemberMapping::ForeignObject(v) => Some(v.column.clone()),
        MemberMapping::ReferenceList(..) => None,
    }
}

fn missing_member(mapping: &TypeMapping, name: &str) -> Error {
    configuration_error(format!(
        "{:?} declares `{name}` but does not expose it as a tracked field",
        mapping.entity
    ))
}

/// One contribution per column of `mapping`, valued from `entity`. With `stored`, keys take
/// their committed value so the statement targets the row the instance was loaded from.
fn contributions<E: Entity>(
    entity: &E,
    mapping: &TypeMapping,
    writer: &dyn SqlWriter,
    stored: bool,
) -> Result<Vec<FieldContribution>> {
    let mut result = Vec::with_capacity(mapping.members.len());
    for member in &mapping.members {
        let (Some(column), Some(role), Some(value_type)) =
            (column_of(member), member.role(), member.value_type())
        else {
            continue;
        };
        let field = entity
            .field(member.name())
            .ok_or_else(|| missing_member(mapping, member.name()))?;
        let value = if stored && role == FieldRole::KeyField {
            field.committed_value()
        } else {
            field.value()
        };
        result.push(FieldContribution {
            name: column,
            value: Some(value),
            role,
            key_strategy: if role == FieldRole::KeyField {
                writer.key_strategies().get(value_type)
            } else {
                None
            },
            changed: field.is_changed(),
        });
    }
    Ok(result)
}

/// Member name and committed value of each primary key.
fn key_members<E: Entity>(
    entity: &E,
    mapping: &TypeMapping,
) -> Result<Vec<(Cow<'static, str>, Value)>> {
    let mut result = Vec::new();
    for member in mapping.primary_keys() {
        let field = entity
            .field(member.name())
            .ok_or_else(|| missing_member(mapping, member.name()))?;
        let value = field.committed_value();
        if value.is_null() {
            return Err(statement_state_error(format!(
                "Key `{}` of {:?} is empty",
                member.name(),
                mapping.entity
            )));
        }
        result.push((Cow::Owned(member.name().to_owned()), value));
    }
    Ok(result)
}

/// Column and committed value of each primary key.
fn key_values<E: Entity>(
    entity: &E,
    mapping: &TypeMapping,
) -> Result<Vec<(Cow<'static, str>, Value)>> {
    let mut result = Vec::new();
    for ((_, value), member) in key_members(entity, mapping)?
        .into_iter()
        .zip(mapping.primary_keys())
    {
        if let Some(column) = column_of(member) {
            result.push((column, value));
        }
    }
    Ok(result)
}

/// Pushes the columns of `row` into the matching members of `entity`.
fn load_row<E: Entity>(entity: &mut E, mapping: &TypeMapping, row: &RowLabeled) -> Result<()> {
    for (label, value) in row.names().iter().zip(row.values()) {
        let Some(member) = mapping.member_by_column(label) else {
            log::warn!("Column `{label}` is not mapped on {:?}", mapping.entity);
            continue;
        };
        let field = entity
            .field_mut(member.name())
            .ok_or_else(|| missing_member(mapping, member.name()))?;
        field.load(value.clone())?;
    }
    Ok(())
}
