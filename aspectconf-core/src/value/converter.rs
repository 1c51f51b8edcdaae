//! Pluggable value converters

use super::{Value, ValueError, ValueResult, ValueType};
use std::fmt;

/// Overrides the built-in coercion for a single property
pub trait ValueConverter: Send + Sync {
    /// Name used to reference the converter from manifests
    fn name(&self) -> &str;

    /// Convert `value` into the property's declared type
    fn convert(&self, value: &Value, target: ValueType) -> ValueResult<Value>;
}

impl fmt::Debug for dyn ValueConverter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ValueConverter({})", self.name())
    }
}

/// Stores lists as a single separated string, e.g. `a;b;c`
#[derive(Debug, Clone)]
pub struct SeparatedListConverter {
    name: String,
    separator: char,
}

impl SeparatedListConverter {
    pub fn new(separator: char) -> Self {
        Self {
            name: format!("separated-list({})", separator),
            separator,
        }
    }

    /// Register under a custom name instead of `separated-list(<sep>)`
    pub fn named(name: impl Into<String>, separator: char) -> Self {
        Self {
            name: name.into(),
            separator,
        }
    }
}

impl Default for SeparatedListConverter {
    fn default() -> Self {
        Self::new(';')
    }
}

impl ValueConverter for SeparatedListConverter {
    fn name(&self) -> &str {
        &self.name
    }

    fn convert(&self, value: &Value, target: ValueType) -> ValueResult<Value> {
        match (target, value) {
            (ValueType::List, Value::String(s)) => Ok(Value::List(
                s.split(self.separator)
                    .map(str::trim)
                    .filter(|part| !part.is_empty())
                    .map(|part| Value::String(part.to_string()))
                    .collect(),
            )),
            (ValueType::String, Value::List(items)) => {
                let sep = self.separator.to_string();
                Ok(Value::String(
                    items
                        .iter()
                        .map(|item| item.to_string())
                        .collect::<Vec<_>>()
                        .join(&sep),
                ))
            }
            (ValueType::List | ValueType::String | ValueType::Any, _) => value.coerce(target),
            _ => Err(ValueError::Conversion {
                from: value.type_name(),
                to: target.name(),
                reason: format!("{} only handles lists and strings", self.name),
            }),
        }
    }
}
