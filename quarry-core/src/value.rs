use rust_decimal::Decimal;
use std::fmt::{self, Display, Formatter};
use time::{Date, PrimitiveDateTime};
use uuid::Uuid;

/// Dynamically typed value exchanged with the database.
///
/// Every variant but `Null` carries an optional payload so that a typed NULL (for example
/// `Value::Int64(None)`) can still describe the column type it belongs to.
#[derive(Default, Debug, Clone)]
pub enum Value {
    #[default]
    Null,
    Boolean(Option<bool>),
    Int16(Option<i16>),
    Int32(Option<i32>),
    Int64(Option<i64>),
    Float32(Option<f32>),
    Float64(Option<f64>),
    Decimal(Option<Decimal>),
    Varchar(Option<String>),
    Blob(Option<Box<[u8]>>),
    Date(Option<Date>),
    Timestamp(Option<PrimitiveDateTime>),
    Uuid(Option<Uuid>),
}

/// Payload-less discriminant of [`Value`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    Null,
    Boolean,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    Decimal,
    Varchar,
    Blob,
    Date,
    Timestamp,
    Uuid,
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Boolean(l), Self::Boolean(r)) => l == r,
            (Self::Int16(l), Self::Int16(r)) => l == r,
            (Self::Int32(l), Self::Int32(r)) => l == r,
            (Self::Int64(l), Self::Int64(r)) => l == r,
            (Self::Float32(l), Self::Float32(r)) => l == r,
            (Self::Float64(l), Self::Float64(r)) => l == r,
            (Self::Decimal(l), Self::Decimal(r)) => l == r,
            (Self::Varchar(l), Self::Varchar(r)) => l == r,
            (Self::Blob(l), Self::Blob(r)) => l == r,
            (Self::Date(l), Self::Date(r)) => l == r,
            (Self::Timestamp(l), Self::Timestamp(r)) => l == r,
            (Self::Uuid(l), Self::Uuid(r)) => l == r,
            _ => core::mem::discriminant(self) == core::mem::discriminant(other),
        }
    }
}

impl Value {
    pub fn same_type(&self, other: &Self) -> bool {
        self.value_type() == other.value_type()
    }

    pub fn is_null(&self) -> bool {
        match self {
            Value::Null => true,
            Value::Boolean(v) => v.is_none(),
            Value::Int16(v) => v.is_none(),
            Value::Int32(v) => v.is_none(),
            Value::Int64(v) => v.is_none(),
            Value::Float32(v) => v.is_none(),
            Value::Float64(v) => v.is_none(),
            Value::Decimal(v) => v.is_none(),
            Value::Varchar(v) => v.is_none(),
            Value::Blob(v) => v.is_none(),
            Value::Date(v) => v.is_none(),
            Value::Timestamp(v) => v.is_none(),
            Value::Uuid(v) => v.is_none(),
        }
    }

    pub fn value_type(&self) -> ValueType {
        match self {
            Value::Null => ValueType::Null,
            Value::Boolean(..) => ValueType::Boolean,
            Value::Int16(..) => ValueType::Int16,
            Value::Int32(..) => ValueType::Int32,
            Value::Int64(..) => ValueType::Int64,
            Value::Float32(..) => ValueType::Float32,
            Value::Float64(..) => ValueType::Float64,
            Value::Decimal(..) => ValueType::Decimal,
            Value::Varchar(..) => ValueType::Varchar,
            Value::Blob(..) => ValueType::Blob,
            Value::Date(..) => ValueType::Date,
            Value::Timestamp(..) => ValueType::Timestamp,
            Value::Uuid(..) => ValueType::Uuid,
        }
    }
}

impl ValueType {
    /// Typed NULL of this type.
    pub fn empty_value(self) -> Value {
        match self {
            ValueType::Null => Value::Null,
            ValueType::Boolean => Value::Boolean(None),
            ValueType::Int16 => Value::Int16(None),
            ValueType::Int32 => Value::Int32(None),
            ValueType::Int64 => Value::Int64(None),
            ValueType::Float32 => Value::Float32(None),
            ValueType::Float64 => Value::Float64(None),
            ValueType::Decimal => Value::Decimal(None),
            ValueType::Varchar => Value::Varchar(None),
            ValueType::Blob => Value::Blob(None),
            ValueType::Date => Value::Date(None),
            ValueType::Timestamp => Value::Timestamp(None),
            ValueType::Uuid => Value::Uuid(None),
        }
    }

    /// Whether values of this type are plain values that need an explicit NULL state when
    /// used as foreign keys (strings and blobs already admit NULL).
    pub fn is_value_type(self) -> bool {
        !matches!(self, ValueType::Null | ValueType::Varchar | ValueType::Blob)
    }
}

impl Display for ValueType {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(self, f)
    }
}
