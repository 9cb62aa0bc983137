use crate::{
    BinaryOpType, Context, EntityType, Expr, MappingRegistry, MemberMapping, Result,
    StatementScope, Value, ValueType, not_compilable, writer::SqlWriter,
};
use std::borrow::Cow;

/// Column reached by a member access.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedMember {
    pub alias: String,
    pub column: Cow<'static, str>,
    pub value_type: Option<ValueType>,
}

/// State of one compilation: output buffer, statement scope and the stack of the nodes
/// being compiled (the last one is the current node).
pub struct Compilation<'a, 'e> {
    pub writer: &'a dyn SqlWriter,
    pub registry: &'a MappingRegistry,
    pub scope: &'a mut StatementScope,
    pub context: Context,
    pub out: String,
    stack: Vec<&'e Expr>,
}

impl<'a, 'e> Compilation<'a, 'e> {
    pub fn new(
        writer: &'a dyn SqlWriter,
        registry: &'a MappingRegistry,
        scope: &'a mut StatementScope,
        context: Context,
    ) -> Self {
        Self {
            writer,
            registry,
            scope,
            context,
            out: String::with_capacity(64),
            stack: Vec::new(),
        }
    }

    /// Compiles `node` with the first rule of the dialect that accepts it.
    pub fn parse_child(&mut self, node: &'e Expr) -> Result<()> {
        let writer = self.writer;
        self.stack.push(node);
        let rule = writer
            .expression_rules()
            .iter()
            .find(|rule| rule.matches(node, self))
            .copied();
        let result = match rule {
            Some(rule) => rule.compile(node, self),
            None => Err(not_compilable(node, "no rule accepts this node")),
        };
        self.stack.pop();
        result
    }

    /// Node being compiled.
    pub fn current(&self) -> Option<&'e Expr> {
        self.stack.last().copied()
    }

    /// Immediate parent of the node being compiled.
    pub fn parent(&self) -> Option<&'e Expr> {
        self.stack.iter().rev().nth(1).copied()
    }

    pub fn write_parameter(&mut self, value: Value) {
        let index = self.scope.add_parameter(value);
        self.writer
            .write_parameter(&mut self.context, &mut self.out, index);
    }

    pub fn write_column(&mut self, alias: &str, column: &str) {
        self.writer
            .write_column_ref(&mut self.context, &mut self.out, alias, column);
    }

    /// Binding precedence of the SQL produced by `node`.
    pub fn precedence(&self, node: &Expr) -> i32 {
        match node {
            Expr::Binary { op, .. } => self.writer.expression_binary_op_precedence(op),
            Expr::Unary { op, .. } => self.writer.expression_unary_op_precedence(op),
            Expr::Convert { arg, .. } => self.precedence(arg),
            Expr::Lambda { body, .. } => self.precedence(body),
            Expr::Contains { .. } => self
                .writer
                .expression_binary_op_precedence(&BinaryOpType::Equal),
            _ => i32::MAX,
        }
    }

    /// Alias bound to a lambda parameter.
    pub fn parameter_alias(&self, node: &Expr) -> Result<String> {
        let Expr::Parameter { name, entity } = node.unwrap_convert() else {
            return Err(not_compilable(node, "not a parameter"));
        };
        if let Some(alias) = self.scope.binding(name) {
            return Ok(alias.to_owned());
        }
        if *entity == self.scope.root_entity() {
            return Ok(self.scope.root_alias().to_owned());
        }
        Err(not_compilable(
            node,
            format!(
                "parameter `{name}` of type {entity:?} is not bound in a statement over {:?}",
                self.scope.root_entity()
            ),
        ))
    }

    /// Resolves a member access, requesting one join per foreign object navigation.
    pub fn resolve_member(&mut self, node: &Expr) -> Result<ResolvedMember> {
        let Some((parameter, entity, path)) = member_path(node) else {
            return Err(not_compilable(
                node,
                "member access must start from a lambda parameter",
            ));
        };
        let Some((last, navigations)) = path.split_last() else {
            return Err(not_compilable(node, "not a member access"));
        };
        let mut alias = self.parameter_alias(parameter)?;
        let mut navigation = alias.clone();
        let mut entity = entity;
        for (i, segment) in navigations.iter().enumerate() {
            let mapping = self.registry.type_mapping_of(entity)?;
            let Some(MemberMapping::ForeignObject(foreign)) = mapping.member(segment) else {
                return Err(not_compilable(
                    node,
                    format!("`{segment}` of {entity:?} is not a foreign object"),
                ));
            };
            if i + 1 == navigations.len() && foreign.target_key == *last {
                // The referenced key is the foreign key column itself
                return Ok(ResolvedMember {
                    alias,
                    column: foreign.column.clone(),
                    value_type: Some(foreign.value_type),
                });
            }
            navigation.push('.');
            navigation.push_str(segment);
            alias = self.scope.require_join(
                navigation.clone(),
                foreign.target_table.clone(),
                &alias,
                foreign.column.clone(),
                foreign.target_key_column.clone(),
            );
            entity = foreign.target;
        }
        let mapping = self.registry.type_mapping_of(entity)?;
        let (column, value_type) = match mapping.member(last) {
            Some(MemberMapping::Field(field)) => (field.column.clone(), field.value_type),
            Some(MemberMapping::ForeignObject(foreign)) => {
                (foreign.column.clone(), foreign.value_type)
            }
            Some(MemberMapping::ReferenceList(..)) => {
                return Err(not_compilable(
                    node,
                    format!("reference list `{last}` of {entity:?} has no column"),
                ));
            }
            None => {
                return Err(not_compilable(
                    node,
                    format!("{entity:?} has no mapped member `{last}`"),
                ));
            }
        };
        Ok(ResolvedMember {
            alias,
            column,
            value_type: Some(value_type),
        })
    }

    /// Value type of a member access, without requesting joins.
    pub fn peek_member_type(&self, node: &Expr) -> Option<ValueType> {
        let (_, mut entity, path) = member_path(node)?;
        let (last, navigations) = path.split_last()?;
        for segment in navigations {
            let mapping = self.registry.type_mapping_of(entity).ok()?;
            let Some(MemberMapping::ForeignObject(foreign)) = mapping.member(segment) else {
                return None;
            };
            entity = foreign.target;
        }
        self.registry
            .type_mapping_of(entity)
            .ok()?
            .member(last)?
            .value_type()
    }
}

/// Parameter node, its entity and the member names leading from it to `node`.
fn member_path(node: &Expr) -> Option<(&Expr, EntityType, Vec<&str>)> {
    let mut path = Vec::new();
    let mut current = node.unwrap_convert();
    loop {
        match current {
            Expr::Member { target, member } => {
                path.push(member.as_ref());
                current = target.unwrap_convert();
            }
            Expr::Parameter { entity, .. } => {
                path.reverse();
                return Some((current, *entity, path));
            }
            _ => return None,
        }
    }
}

/// Translates expression graphs into SQL fragments for one dialect.
///
/// Each call compiles into the given [`StatementScope`], which collects the parameters and
/// the joins requested by foreign object navigation.
pub struct ExpressionCompiler<'a> {
    writer: &'a dyn SqlWriter,
    registry: &'a MappingRegistry,
}

impl<'a> ExpressionCompiler<'a> {
    pub fn new(writer: &'a dyn SqlWriter, registry: &'a MappingRegistry) -> Self {
        Self { writer, registry }
    }

    pub fn writer(&self) -> &'a dyn SqlWriter {
        self.writer
    }

    pub fn registry(&self) -> &'a MappingRegistry {
        self.registry
    }

    pub fn compile(
        &self,
        expr: &Expr,
        scope: &mut StatementScope,
        context: Context,
    ) -> Result<String> {
        let mut compilation = Compilation::new(self.writer, self.registry, scope, context);
        compilation.parse_child(expr)?;
        Ok(compilation.out)
    }
}
