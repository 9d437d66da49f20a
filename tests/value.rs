#[cfg(test)]
mod tests {
    use silo::{AsValue, Value};

    #[test]
    fn value_null() {
        assert_eq!(Value::Null, Value::Null);
        assert!(Value::Null.is_null());
        assert_ne!(Value::Integer(0), Value::Null);
        assert_eq!(Value::default(), Value::Null);
    }

    #[test]
    fn value_bool() {
        let val: Value = true.into();
        assert_eq!(val, Value::Boolean(true));
        assert_ne!(val, Value::Boolean(false));
        let var: bool = AsValue::try_from_value(val).unwrap();
        assert_eq!(var, true);
        assert_eq!(bool::try_from_value(Value::Integer(1)).unwrap(), true);
        assert_eq!(bool::try_from_value(Value::Integer(0)).unwrap(), false);
        assert_eq!(bool::try_from_value(Value::Integer(9)).unwrap(), true);
        assert!(bool::try_from_value(Value::Float(0.5)).is_err());
        assert!(bool::try_from_value(Value::Text("true".into())).is_err());
    }

    #[test]
    fn value_integers() {
        let val: Value = (42 as i32).into();
        assert_eq!(val, Value::Integer(42));
        let var: i32 = AsValue::try_from_value(val).unwrap();
        assert_eq!(var, 42);
        assert_eq!(i8::try_from_value(Value::Integer(127)).unwrap(), 127);
        assert!(i8::try_from_value(Value::Integer(128)).is_err());
        assert_eq!(u8::try_from_value(Value::Integer(255)).unwrap(), 255);
        assert!(u8::try_from_value(Value::Integer(-1)).is_err());
        assert_eq!(
            i64::try_from_value(Value::Integer(i64::MIN)).unwrap(),
            i64::MIN
        );
        assert!(i16::try_from_value(Value::Text("7".into())).is_err());
        assert!(u32::try_from_value(Value::Null).is_err());
    }

    #[test]
    fn value_floats() {
        let val: Value = (1.5 as f64).into();
        assert_eq!(val, Value::Float(1.5));
        let var: f64 = AsValue::try_from_value(val).unwrap();
        assert_eq!(var, 1.5);
        assert_eq!(f64::try_from_value(Value::Integer(3)).unwrap(), 3.0);
        assert_eq!(f32::try_from_value(Value::Float(0.25)).unwrap(), 0.25);
        assert!(f64::try_from_value(Value::Boolean(true)).is_err());
    }

    #[test]
    fn value_text() {
        let val: Value = "hello".into();
        assert_eq!(val, Value::Text("hello".into()));
        let val: Value = String::from("hello").into();
        let var: String = AsValue::try_from_value(val).unwrap();
        assert_eq!(var, "hello");
        assert!(String::try_from_value(Value::Integer(1)).is_err());
    }

    #[test]
    fn value_option() {
        let val: Value = Option::<i32>::None.into();
        assert_eq!(val, Value::Null);
        let val: Value = Some(7 as i64).into();
        assert_eq!(val, Value::Integer(7));
        let var: Option<i64> = AsValue::try_from_value(Value::Null).unwrap();
        assert_eq!(var, None);
        let var: Option<String> = AsValue::try_from_value(Value::Text("x".into())).unwrap();
        assert_eq!(var, Some("x".into()));
    }
}
