//! Mapping between Rust types and configuration values

use super::{Value, ValueError, ValueResult, ValueType};

/// A Rust type that can be stored in a configuration property
pub trait ConfigValue: Sized {
    /// Declared type used when a property is defined from this Rust type
    const VALUE_TYPE: ValueType;

    fn into_value(self) -> Value;

    fn from_value(value: Value) -> ValueResult<Self>;
}

fn mismatch(value: &Value, to: &'static str) -> ValueError {
    ValueError::Conversion {
        from: value.type_name(),
        to,
        reason: "unexpected value after coercion".to_string(),
    }
}

impl ConfigValue for Value {
    const VALUE_TYPE: ValueType = ValueType::Any;

    fn into_value(self) -> Value {
        self
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        Ok(value)
    }
}

impl ConfigValue for bool {
    const VALUE_TYPE: ValueType = ValueType::Boolean;

    fn into_value(self) -> Value {
        Value::Boolean(self)
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        match value.coerce(ValueType::Boolean)? {
            Value::Boolean(b) => Ok(b),
            other => Err(mismatch(&other, "bool")),
        }
    }
}

impl ConfigValue for i64 {
    const VALUE_TYPE: ValueType = ValueType::Integer;

    fn into_value(self) -> Value {
        Value::Integer(self)
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        match value.coerce(ValueType::Integer)? {
            Value::Integer(i) => Ok(i),
            other => Err(mismatch(&other, "i64")),
        }
    }
}

macro_rules! narrow_integer {
    ($($ty:ty),*) => {
        $(
            impl ConfigValue for $ty {
                const VALUE_TYPE: ValueType = ValueType::Integer;

                fn into_value(self) -> Value {
                    Value::Integer(self as i64)
                }

                fn from_value(value: Value) -> ValueResult<Self> {
                    let wide = i64::from_value(value)?;
                    <$ty>::try_from(wide).map_err(|_| ValueError::OutOfRange {
                        value: wide.to_string(),
                        target: stringify!($ty),
                    })
                }
            }
        )*
    };
}

narrow_integer!(i32, u16, u32, usize);

impl ConfigValue for u64 {
    const VALUE_TYPE: ValueType = ValueType::Integer;

    fn into_value(self) -> Value {
        Value::Integer(i64::try_from(self).unwrap_or(i64::MAX))
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        let wide = i64::from_value(value)?;
        u64::try_from(wide).map_err(|_| ValueError::OutOfRange {
            value: wide.to_string(),
            target: "u64",
        })
    }
}

impl ConfigValue for f64 {
    const VALUE_TYPE: ValueType = ValueType::Float;

    fn into_value(self) -> Value {
        Value::Float(self)
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        match value.coerce(ValueType::Float)? {
            Value::Float(x) => Ok(x),
            other => Err(mismatch(&other, "f64")),
        }
    }
}

impl ConfigValue for String {
    const VALUE_TYPE: ValueType = ValueType::String;

    fn into_value(self) -> Value {
        Value::String(self)
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        match value.coerce(ValueType::String)? {
            Value::String(s) => Ok(s),
            Value::Nil => Ok(String::new()),
            other => Err(mismatch(&other, "String")),
        }
    }
}

impl ConfigValue for Vec<String> {
    const VALUE_TYPE: ValueType = ValueType::List;

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(Value::String).collect())
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        match value.coerce(ValueType::List)? {
            Value::List(items) => items.into_iter().map(String::from_value).collect(),
            Value::Nil => Ok(Vec::new()),
            other => Err(mismatch(&other, "Vec<String>")),
        }
    }
}

impl<T: ConfigValue> ConfigValue for Option<T> {
    const VALUE_TYPE: ValueType = T::VALUE_TYPE;

    fn into_value(self) -> Value {
        match self {
            Some(v) => v.into_value(),
            None => Value::Nil,
        }
    }

    fn from_value(value: Value) -> ValueResult<Self> {
        if value.is_nil() {
            Ok(None)
        } else {
            T::from_value(value).map(Some)
        }
    }
}
