use crate::{Error, Result};
use std::any;

/// Dynamically typed cell value moved between entities and the engine.
///
/// The variant set is deliberately closed: every column an entity carries is
/// one of these, query parameters are slices of these, and rows come back as
/// boxed slices of these. Numbers keep two lanes so engine generated 64 bit
/// row identifiers survive without precision loss.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Value {
    #[default]
    Null,
    Boolean(bool),
    Integer(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }
}

/// Conversion seam between native Rust types and the dynamically typed
/// [`Value`] representation used for query parameters and row decoding.
///
/// `try_from_value` accepts the canonical variant for the type and performs
/// range checked narrowing where an alternate numeric width is reasonable.
pub trait AsValue {
    /// The NULL-like value standing in for an absent `Self`.
    fn as_empty_value() -> Value;
    fn as_value(self) -> Value;
    fn try_from_value(value: Value) -> Result<Self>
    where
        Self: Sized;
}

impl<T: AsValue> From<T> for Value {
    fn from(value: T) -> Self {
        value.as_value()
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Text(value.into())
    }
}

macro_rules! impl_as_value {
    ($source:ty) => {
        impl AsValue for $source {
            fn as_empty_value() -> Value {
                Value::Null
            }
            fn as_value(self) -> Value {
                Value::Integer(self as i64)
            }
            fn try_from_value(value: Value) -> Result<Self> {
                match value {
                    Value::Integer(v) => <$source>::try_from(v).map_err(|_| {
                        Error::msg(format!(
                            "Value {v}: i64 is out of range for {}",
                            any::type_name::<Self>(),
                        ))
                    }),
                    _ => Err(Error::msg(format!(
                        "Cannot convert {value:?} to {}",
                        any::type_name::<Self>(),
                    ))),
                }
            }
        }
    };
}
impl_as_value!(i8);
impl_as_value!(i16);
impl_as_value!(i32);
impl_as_value!(i64);
impl_as_value!(u8);
impl_as_value!(u16);
impl_as_value!(u32);

impl AsValue for bool {
    fn as_empty_value() -> Value {
        Value::Null
    }
    fn as_value(self) -> Value {
        Value::Boolean(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Boolean(v) => Ok(v),
            // Engines that lack a boolean type hand the stored 1 or 0 back.
            Value::Integer(v) => Ok(v != 0),
            _ => Err(Error::msg(format!(
                "Cannot convert {value:?} to {}",
                any::type_name::<Self>(),
            ))),
        }
    }
}

impl AsValue for f64 {
    fn as_empty_value() -> Value {
        Value::Null
    }
    fn as_value(self) -> Value {
        Value::Float(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Float(v) => Ok(v),
            Value::Integer(v) => Ok(v as _),
            _ => Err(Error::msg(format!(
                "Cannot convert {value:?} to {}",
                any::type_name::<Self>(),
            ))),
        }
    }
}

impl AsValue for f32 {
    fn as_empty_value() -> Value {
        Value::Null
    }
    fn as_value(self) -> Value {
        Value::Float(self as _)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        f64::try_from_value(value).map(|v| v as _)
    }
}

impl AsValue for String {
    fn as_empty_value() -> Value {
        Value::Null
    }
    fn as_value(self) -> Value {
        Value::Text(self)
    }
    fn try_from_value(value: Value) -> Result<Self> {
        match value {
            Value::Text(v) => Ok(v),
            _ => Err(Error::msg(format!(
                "Cannot convert {value:?} to {}",
                any::type_name::<Self>(),
            ))),
        }
    }
}

impl<T: AsValue> AsValue for Option<T> {
    fn as_empty_value() -> Value {
        T::as_empty_value()
    }
    fn as_value(self) -> Value {
        match self {
            Some(v) => v.as_value(),
            None => T::as_empty_value(),
        }
    }
    fn try_from_value(value: Value) -> Result<Self> {
        Ok(if value.is_null() {
            None
        } else {
            Some(<T as AsValue>::try_from_value(value)?)
        })
    }
}
