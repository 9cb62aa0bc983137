use crate::{
    AsValue, BinaryOpType, Constant, Entity, EntityType, Expr, Order, Ordered, UnaryOpType,
    Value, ValueType,
};
use std::{
    borrow::Cow,
    ops::{Add, Div, Mul, Neg, Not, Rem, Sub},
};

impl Expr {
    pub fn parameter<E: Entity>(name: impl Into<Cow<'static, str>>) -> Expr {
        Expr::Parameter {
            name: name.into(),
            entity: EntityType::of::<E>(),
        }
    }

    /// `name => body(name)` over rows of `E`.
    pub fn lambda<E: Entity>(
        name: impl Into<Cow<'static, str>>,
        body: impl FnOnce(Expr) -> Expr,
    ) -> Expr {
        let parameter = Expr::parameter::<E>(name);
        Expr::Lambda {
            body: body(parameter.clone()).into(),
            parameter: parameter.into(),
        }
    }

    /// Member access, chain it to navigate foreign objects.
    pub fn field(self, member: impl Into<Cow<'static, str>>) -> Expr {
        Expr::Member {
            target: self.into(),
            member: member.into(),
        }
    }

    pub fn value(value: impl Into<Value>) -> Expr {
        Expr::Constant(Constant::Value(value.into()))
    }

    pub fn null() -> Expr {
        Expr::Constant(Constant::Value(Value::Null))
    }

    pub fn list<T: AsValue>(items: impl IntoIterator<Item = T>) -> Expr {
        Expr::Constant(Constant::List(
            items.into_iter().map(AsValue::as_value).collect(),
        ))
    }

    /// Constant referencing a loaded entity through its key.
    pub fn entity<E: Entity>(entity: &E) -> Expr {
        Expr::Constant(Constant::Entity {
            entity: EntityType::of::<E>(),
            keys: entity.key_values(),
        })
    }

    pub fn binary(self, op: BinaryOpType, rhs: impl Into<Expr>) -> Expr {
        Expr::Binary {
            op,
            lhs: self.into(),
            rhs: Box::new(rhs.into()),
        }
    }

    pub fn equal(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOpType::Equal, rhs)
    }
    pub fn not_equal(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOpType::NotEqual, rhs)
    }
    pub fn less(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOpType::Less, rhs)
    }
    pub fn less_equal(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOpType::LessEqual, rhs)
    }
    pub fn greater(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOpType::Greater, rhs)
    }
    pub fn greater_equal(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOpType::GreaterEqual, rhs)
    }
    pub fn like(self, pattern: impl Into<Expr>) -> Expr {
        self.binary(BinaryOpType::Like, pattern)
    }
    pub fn not_like(self, pattern: impl Into<Expr>) -> Expr {
        self.binary(BinaryOpType::NotLike, pattern)
    }
    pub fn and(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOpType::And, rhs)
    }
    pub fn or(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOpType::Or, rhs)
    }
    pub fn bitwise_and(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOpType::BitwiseAnd, rhs)
    }
    pub fn bitwise_or(self, rhs: impl Into<Expr>) -> Expr {
        self.binary(BinaryOpType::BitwiseOr, rhs)
    }

    pub fn convert(self, to: ValueType) -> Expr {
        Expr::Convert {
            arg: self.into(),
            to,
        }
    }

    /// `self` (a collection) contains `item`.
    pub fn contains(self, item: impl Into<Expr>) -> Expr {
        Expr::Contains {
            collection: self.into(),
            item: Box::new(item.into()),
        }
    }

    /// `self` is one of the items of `collection`.
    pub fn is_in(self, collection: impl Into<Expr>) -> Expr {
        collection.into().contains(self)
    }

    pub fn asc(self) -> Ordered {
        Ordered {
            order: Order::ASC,
            expression: self,
        }
    }
    pub fn desc(self) -> Ordered {
        Ordered {
            order: Order::DESC,
            expression: self,
        }
    }
}

impl<T: AsValue> From<T> for Expr {
    fn from(value: T) -> Self {
        Expr::value(value)
    }
}

impl From<&str> for Expr {
    fn from(value: &str) -> Self {
        Expr::value(value)
    }
}

macro_rules! impl_binary_operator {
    ($trait:ident, $method:ident, $op:path) => {
        impl<R: Into<Expr>> $trait<R> for Expr {
            type Output = Expr;
            fn $method(self, rhs: R) -> Expr {
                self.binary($op, rhs)
            }
        }
    };
}

impl_binary_operator!(Add, add, BinaryOpType::Addition);
impl_binary_operator!(Sub, sub, BinaryOpType::Subtraction);
impl_binary_operator!(Mul, mul, BinaryOpType::Multiplication);
impl_binary_operator!(Div, div, BinaryOpType::Division);
impl_binary_operator!(Rem, rem, BinaryOpType::Remainder);

impl Neg for Expr {
    type Output = Expr;
    fn neg(self) -> Expr {
        Expr::Unary {
            op: UnaryOpType::Negative,
            arg: self.into(),
        }
    }
}

impl Not for Expr {
    type Output = Expr;
    fn not(self) -> Expr {
        Expr::Unary {
            op: UnaryOpType::Not,
            arg: self.into(),
        }
    }
}
