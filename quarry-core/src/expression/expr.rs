use crate::{BinaryOpType, EntityType, Order, UnaryOpType, Value, ValueType};
use std::borrow::Cow;

/// Predicate and projection graph compiled into SQL by [`crate::ExpressionCompiler`].
///
/// Graphs are usually built with the helpers in this module:
///
/// ```rust,ignore
/// let rich = Expr::lambda::<Employee>("x", |x| x.field("salary").greater(5000));
/// ```
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    /// `parameter => body`, `parameter` is an [`Expr::Parameter`].
    Lambda {
        parameter: Box<Expr>,
        body: Box<Expr>,
    },
    /// Entity row placeholder.
    Parameter {
        name: Cow<'static, str>,
        entity: EntityType,
    },
    /// Access to a mapped member of `target`.
    Member {
        target: Box<Expr>,
        member: Cow<'static, str>,
    },
    Constant(Constant),
    Unary {
        op: UnaryOpType,
        arg: Box<Expr>,
    },
    Binary {
        op: BinaryOpType,
        lhs: Box<Expr>,
        rhs: Box<Expr>,
    },
    /// Type conversion, transparent in SQL.
    Convert {
        arg: Box<Expr>,
        to: ValueType,
    },
    /// `collection` contains `item`.
    Contains {
        collection: Box<Expr>,
        item: Box<Expr>,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    Value(Value),
    List(Vec<Value>),
    /// A loaded entity, represented by its key values.
    Entity {
        entity: EntityType,
        keys: Vec<Value>,
    },
}

impl Expr {
    pub fn is_null_constant(&self) -> bool {
        matches!(self, Expr::Constant(Constant::Value(v)) if v.is_null())
    }

    /// Strips conversions.
    pub fn unwrap_convert(&self) -> &Expr {
        let mut node = self;
        while let Expr::Convert { arg, .. } = node {
            node = arg;
        }
        node
    }
}

/// Expression with a sort direction.
#[derive(Debug, Clone, PartialEq)]
pub struct Ordered {
    pub order: Order,
    pub expression: Expr,
}
