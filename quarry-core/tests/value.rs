#[cfg(test)]
mod tests {
    use quarry_core::{AsValue, Value, ValueType};
    use rust_decimal::Decimal;
    use std::str::FromStr;
    use time::macros::{date, datetime};
    use uuid::Uuid;

    #[test]
    fn value_none() {
        assert_eq!(Value::Null, Value::Null);
        assert_ne!(Value::Float32(Some(1.0)), Value::Null);
        assert_ne!(Value::Int64(None), Value::Null);
        assert_eq!(Value::Int64(None), Value::Int64(None));
        assert!(Value::Null.is_null());
        assert!(Value::Varchar(None).is_null());
        assert!(!Value::Varchar(Some("".into())).is_null());
    }

    #[test]
    fn value_bool() {
        let val: Value = true.into();
        assert_eq!(val, Value::Boolean(Some(true)));
        assert_ne!(val, Value::Boolean(Some(false)));
        assert_ne!(val, Value::Boolean(None));
        assert_ne!(val, Value::Varchar(Some("true".into())));
        assert!(bool::try_from_value(val).unwrap());
        assert!(bool::try_from_value(Value::Int32(Some(1))).is_err());
    }

    #[test]
    fn value_integers() {
        let val: Value = 77i16.into();
        assert_eq!(val, Value::Int16(Some(77)));
        assert_eq!(i64::try_from_value(val.clone()).unwrap(), 77);
        assert_eq!(i32::try_from_value(val).unwrap(), 77);

        assert_eq!(i16::try_from_value(Value::Int64(Some(-3))).unwrap(), -3);
        assert!(i16::try_from_value(Value::Int64(Some(40_000))).is_err());
        assert!(i32::try_from_value(Value::Int64(Some(i64::MAX))).is_err());
        assert!(i64::try_from_value(Value::Float64(Some(1.0))).is_err());
        assert!(i64::try_from_value(Value::Int64(None)).is_err());
    }

    #[test]
    fn value_floats() {
        let val: Value = 1.5f32.into();
        assert_eq!(val, Value::Float32(Some(1.5)));
        assert_eq!(f64::try_from_value(val).unwrap(), 1.5);
        assert!(f32::try_from_value(Value::Float64(Some(1.5))).is_err());
    }

    #[test]
    fn value_decimal_and_text() {
        let decimal = Decimal::from_str("12.345").unwrap();
        let val: Value = decimal.into();
        assert_eq!(val.value_type(), ValueType::Decimal);
        assert_eq!(Decimal::try_from_value(val).unwrap(), decimal);

        let val: Value = "hello".into();
        assert_eq!(val, Value::Varchar(Some("hello".into())));
        assert_eq!(String::try_from_value(val).unwrap(), "hello");

        let val: Value = vec![1u8, 2, 3].into();
        assert_eq!(val, Value::Blob(Some(vec![1u8, 2, 3].into_boxed_slice())));
        assert_eq!(Vec::<u8>::try_from_value(val).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn value_time_and_uuid() {
        let val: Value = date!(2024 - 02 - 29).into();
        assert_eq!(val.value_type(), ValueType::Date);
        let val: Value = datetime!(2024-02-29 13:45:00).into();
        assert_eq!(val.value_type(), ValueType::Timestamp);

        let id = Uuid::parse_str("5e915574-bb30-4430-98cf-c5854f61fbbd").unwrap();
        let val: Value = id.into();
        assert_eq!(val, Value::Uuid(Some(id)));
        assert_eq!(Uuid::try_from_value(val).unwrap(), id);
    }

    #[test]
    fn value_option() {
        let val: Value = Option::<i64>::None.into();
        assert_eq!(val, Value::Int64(None));
        assert_eq!(Option::<i64>::try_from_value(val).unwrap(), None);
        assert_eq!(Option::<i64>::try_from_value(Value::Null).unwrap(), None);
        assert_eq!(
            Option::<i64>::try_from_value(Value::Int32(Some(4))).unwrap(),
            Some(4)
        );
        assert_eq!(Option::<String>::as_empty_value(), Value::Varchar(None));
    }

    #[test]
    fn value_types() {
        assert!(Value::Int64(Some(1)).same_type(&Value::Int64(None)));
        assert!(!Value::Int64(Some(1)).same_type(&Value::Int32(Some(1))));
        assert_eq!(ValueType::Uuid.empty_value(), Value::Uuid(None));
        assert!(ValueType::Int64.is_value_type());
        assert!(!ValueType::Varchar.is_value_type());
        assert_eq!(ValueType::Timestamp.to_string(), "Timestamp");
    }
}
