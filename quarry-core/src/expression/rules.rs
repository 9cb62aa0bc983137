use crate::{
    BinaryOpType, Compilation, Constant, Expr, Fragment, MemberMapping, Result, UnaryOpType,
    Value, ValueType, is_empty_default, not_compilable, possibly_parenthesized, separated_by,
};

/// One translation rule of the expression compiler.
///
/// Dialects expose an ordered rule table through [`crate::SqlWriter::expression_rules`], the
/// first rule whose `matches` returns true compiles the node. Rules visit children only
/// through [`Compilation::parse_child`].
pub trait ExpressionRule: Send + Sync {
    fn name(&self) -> &'static str;
    fn matches(&self, node: &Expr, compilation: &Compilation<'_, '_>) -> bool;
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()>;
}

/// Default rule table, most specific shapes first.
pub static DEFAULT_RULES: &[&dyn ExpressionRule] = &[
    &LambdaRule,
    &NullComparisonRule,
    &MembershipRule,
    &CollectionConstantRule,
    &EntityConstantRule,
    &BooleanMemberRule,
    &ConstantRule,
    &ForeignMemberRule,
    &EntityMemberRule,
    &ParameterRule,
    &ConvertRule,
    &UnaryRule,
    &BinaryRule,
];

/// `x => body`: binds `x` to the root alias and compiles the body.
pub struct LambdaRule;
impl ExpressionRule for LambdaRule {
    fn name(&self) -> &'static str {
        "lambda"
    }
    fn matches(&self, node: &Expr, _compilation: &Compilation<'_, '_>) -> bool {
        matches!(node, Expr::Lambda { .. })
    }
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()> {
        let Expr::Lambda { parameter, body } = node else {
            return Err(not_compilable(node, "expected a lambda"));
        };
        let Expr::Parameter { name, entity } = parameter.as_ref() else {
            return Err(not_compilable(node, "lambda parameter must be a parameter node"));
        };
        if *entity != compilation.scope.root_entity() {
            return Err(not_compilable(
                node,
                format!(
                    "lambda over {entity:?} used in a statement over {:?}",
                    compilation.scope.root_entity()
                ),
            ));
        }
        let alias = compilation.scope.root_alias().to_owned();
        compilation.scope.bind(name.clone(), alias);
        compilation.parse_child(body)
    }
}

/// `a == null` and `a != null` become `a IS [NOT] NULL`.
pub struct NullComparisonRule;
impl ExpressionRule for NullComparisonRule {
    fn name(&self) -> &'static str {
        "null comparison"
    }
    fn matches(&self, node: &Expr, _compilation: &Compilation<'_, '_>) -> bool {
        matches!(
            node,
            Expr::Binary { op: BinaryOpType::Equal | BinaryOpType::NotEqual, lhs, rhs }
                if lhs.is_null_constant() || rhs.is_null_constant()
        )
    }
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()> {
        let Expr::Binary { op, lhs, rhs } = node else {
            return Err(not_compilable(node, "expected a comparison"));
        };
        let operand: &'e Expr = if lhs.is_null_constant() { &**rhs } else { &**lhs };
        let precedence = compilation
            .writer
            .expression_binary_op_precedence(&BinaryOpType::Equal);
        possibly_parenthesized!(
            compilation.out,
            compilation.precedence(operand) <= precedence,
            compilation.parse_child(operand)?
        );
        compilation.writer.write_is_null(
            &mut compilation.context,
            &mut compilation.out,
            *op == BinaryOpType::NotEqual,
        );
        Ok(())
    }
}

/// `list.contains(item)` becomes `item IN (...)`.
pub struct MembershipRule;
impl ExpressionRule for MembershipRule {
    fn name(&self) -> &'static str {
        "membership"
    }
    fn matches(&self, node: &Expr, _compilation: &Compilation<'_, '_>) -> bool {
        matches!(
            node,
            Expr::Contains { collection, .. }
                if matches!(collection.unwrap_convert(), Expr::Constant(Constant::List(..)))
        )
    }
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()> {
        let Expr::Contains { collection, item } = node else {
            return Err(not_compilable(node, "expected a membership test"));
        };
        if let Expr::Constant(Constant::List(values)) = collection.unwrap_convert()
            && values.is_empty()
        {
            compilation
                .writer
                .write_empty_membership(&mut compilation.context, &mut compilation.out);
            return Ok(());
        }
        let precedence = compilation
            .writer
            .expression_binary_op_precedence(&BinaryOpType::Equal);
        possibly_parenthesized!(
            compilation.out,
            compilation.precedence(item) <= precedence,
            compilation.parse_child(item)?
        );
        compilation
            .writer
            .write_membership(&mut compilation.context, &mut compilation.out);
        compilation.parse_child(collection)
    }
}

/// Collection constant: one parameter per item.
pub struct CollectionConstantRule;
impl ExpressionRule for CollectionConstantRule {
    fn name(&self) -> &'static str {
        "collection constant"
    }
    fn matches(&self, node: &Expr, _compilation: &Compilation<'_, '_>) -> bool {
        matches!(node, Expr::Constant(Constant::List(..)))
    }
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()> {
        let Expr::Constant(Constant::List(values)) = node else {
            return Err(not_compilable(node, "expected a collection"));
        };
        if values.is_empty() {
            compilation.out.push('(');
            compilation
                .writer
                .write_value_none(&mut compilation.context, &mut compilation.out);
            compilation.out.push(')');
        } else {
            write_parameter_list(compilation, values);
        }
        Ok(())
    }
}

/// Referenced entity constant: its single key.
pub struct EntityConstantRule;
impl ExpressionRule for EntityConstantRule {
    fn name(&self) -> &'static str {
        "entity constant"
    }
    fn matches(&self, node: &Expr, _compilation: &Compilation<'_, '_>) -> bool {
        matches!(node, Expr::Constant(Constant::Entity { .. }))
    }
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()> {
        let Expr::Constant(Constant::Entity { keys, .. }) = node else {
            return Err(not_compilable(node, "expected an entity constant"));
        };
        let [key] = keys.as_slice() else {
            return Err(not_compilable(
                node,
                format!("entity constants need exactly one key, found {}", keys.len()),
            ));
        };
        let is_empty = compilation
            .writer
            .key_strategies()
            .get(key.value_type())
            .map_or(is_empty_default as fn(&Value) -> bool, |strategy| {
                strategy.is_empty
            });
        if is_empty(key) {
            return Err(not_compilable(
                node,
                "referenced entity has an empty key, it must be saved first",
            ));
        }
        compilation.write_parameter(key.clone());
        Ok(())
    }
}

/// Boolean member used as a condition: `x.active` becomes `x.active = true`.
pub struct BooleanMemberRule;
impl ExpressionRule for BooleanMemberRule {
    fn name(&self) -> &'static str {
        "boolean member"
    }
    fn matches(&self, node: &Expr, compilation: &Compilation<'_, '_>) -> bool {
        if !matches!(node, Expr::Member { .. })
            || compilation.context.fragment != Fragment::SqlSelectWhere
        {
            return false;
        }
        let condition = match compilation.parent().map(Expr::unwrap_convert) {
            None | Some(Expr::Lambda { .. }) => true,
            Some(Expr::Binary { op, .. }) => op.is_logical(),
            Some(Expr::Unary { op, .. }) => *op == UnaryOpType::Not,
            _ => false,
        };
        condition && compilation.peek_member_type(node) == Some(ValueType::Boolean)
    }
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()> {
        let member = compilation.resolve_member(node)?;
        compilation.write_column(&member.alias, &member.column);
        compilation.out.push_str(" = ");
        compilation.write_parameter(Value::Boolean(Some(true)));
        Ok(())
    }
}

/// Scalar constant: a parameter, or the `NULL` literal.
pub struct ConstantRule;
impl ExpressionRule for ConstantRule {
    fn name(&self) -> &'static str {
        "constant"
    }
    fn matches(&self, node: &Expr, _compilation: &Compilation<'_, '_>) -> bool {
        matches!(node, Expr::Constant(Constant::Value(..)))
    }
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()> {
        let Expr::Constant(Constant::Value(value)) = node else {
            return Err(not_compilable(node, "expected a constant"));
        };
        if value.is_null() {
            compilation
                .writer
                .write_value_none(&mut compilation.context, &mut compilation.out);
        } else {
            compilation.write_parameter(value.clone());
        }
        Ok(())
    }
}

/// Member reached through foreign objects: `x.manager.name`.
pub struct ForeignMemberRule;
impl ExpressionRule for ForeignMemberRule {
    fn name(&self) -> &'static str {
        "foreign member"
    }
    fn matches(&self, node: &Expr, _compilation: &Compilation<'_, '_>) -> bool {
        matches!(
            node,
            Expr::Member { target, .. } if matches!(target.unwrap_convert(), Expr::Member { .. })
        )
    }
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()> {
        let member = compilation.resolve_member(node)?;
        compilation.write_column(&member.alias, &member.column);
        Ok(())
    }
}

/// Member of the lambda parameter: `x.name`.
pub struct EntityMemberRule;
impl ExpressionRule for EntityMemberRule {
    fn name(&self) -> &'static str {
        "entity member"
    }
    fn matches(&self, node: &Expr, _compilation: &Compilation<'_, '_>) -> bool {
        matches!(
            node,
            Expr::Member { target, .. } if matches!(target.unwrap_convert(), Expr::Parameter { .. })
        )
    }
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()> {
        let member = compilation.resolve_member(node)?;
        compilation.write_column(&member.alias, &member.column);
        Ok(())
    }
}

/// The lambda parameter itself stands for its single key column.
pub struct ParameterRule;
impl ExpressionRule for ParameterRule {
    fn name(&self) -> &'static str {
        "parameter"
    }
    fn matches(&self, node: &Expr, _compilation: &Compilation<'_, '_>) -> bool {
        matches!(node, Expr::Parameter { .. })
    }
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()> {
        let Expr::Parameter { entity, .. } = node else {
            return Err(not_compilable(node, "expected a parameter"));
        };
        let alias = compilation.parameter_alias(node)?;
        let mapping = compilation.registry.type_mapping_of(*entity)?;
        let keys: Vec<&MemberMapping> = mapping.primary_keys().collect();
        let [key] = keys.as_slice() else {
            return Err(not_compilable(
                node,
                format!(
                    "{entity:?} can be compared as a whole only with exactly one key, found {}",
                    keys.len()
                ),
            ));
        };
        let column = key.column().unwrap_or_default().to_owned();
        compilation.write_column(&alias, &column);
        Ok(())
    }
}

/// Conversions are transparent.
pub struct ConvertRule;
impl ExpressionRule for ConvertRule {
    fn name(&self) -> &'static str {
        "convert"
    }
    fn matches(&self, node: &Expr, _compilation: &Compilation<'_, '_>) -> bool {
        matches!(node, Expr::Convert { .. })
    }
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()> {
        let Expr::Convert { arg, .. } = node else {
            return Err(not_compilable(node, "expected a conversion"));
        };
        compilation.parse_child(arg)
    }
}

pub struct UnaryRule;
impl ExpressionRule for UnaryRule {
    fn name(&self) -> &'static str {
        "unary"
    }
    fn matches(&self, node: &Expr, _compilation: &Compilation<'_, '_>) -> bool {
        matches!(node, Expr::Unary { .. })
    }
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()> {
        let Expr::Unary { op, arg } = node else {
            return Err(not_compilable(node, "expected a unary operation"));
        };
        compilation
            .writer
            .write_unary_op(&mut compilation.context, &mut compilation.out, op);
        let precedence = compilation.writer.expression_unary_op_precedence(op);
        possibly_parenthesized!(
            compilation.out,
            compilation.precedence(arg) <= precedence,
            compilation.parse_child(arg)?
        );
        Ok(())
    }
}

/// Arithmetic, comparison and logical operators, parenthesized by precedence.
pub struct BinaryRule;
impl ExpressionRule for BinaryRule {
    fn name(&self) -> &'static str {
        "binary"
    }
    fn matches(&self, node: &Expr, _compilation: &Compilation<'_, '_>) -> bool {
        matches!(node, Expr::Binary { .. })
    }
    fn compile<'e>(&self, node: &'e Expr, compilation: &mut Compilation<'_, 'e>) -> Result<()> {
        let Expr::Binary { op, lhs, rhs } = node else {
            return Err(not_compilable(node, "expected a binary operation"));
        };
        let precedence = compilation.writer.expression_binary_op_precedence(op);
        possibly_parenthesized!(
            compilation.out,
            compilation.precedence(lhs) < precedence,
            compilation.parse_child(lhs)?
        );
        compilation
            .writer
            .write_binary_op(&mut compilation.context, &mut compilation.out, op);
        possibly_parenthesized!(
            compilation.out,
            compilation.precedence(rhs) <= precedence,
            compilation.parse_child(rhs)?
        );
        Ok(())
    }
}

fn write_parameter_list(compilation: &mut Compilation<'_, '_>, values: &[Value]) {
    let mut out = std::mem::take(&mut compilation.out);
    out.push('(');
    separated_by(
        &mut out,
        values,
        |out, value| {
            let index = compilation.scope.add_parameter(value.clone());
            compilation
                .writer
                .write_parameter(&mut compilation.context, out, index);
        },
        ", ",
    );
    out.push(')');
    compilation.out = out;
}
