//! Per-property declarative metadata

use crate::error::{Error, Result};
use crate::value::{ConfigValue, Value, ValueConverter, ValueType};
use rustc_hash::FxHashMap;
use std::fmt;
use std::sync::Arc;

/// Resolved, immutable metadata for one property of a contract
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    value_type: ValueType,
    default: Option<Value>,
    description: Option<String>,
    category: Option<String>,
    tags: FxHashMap<String, Option<Value>>,
    suppress_read: bool,
    suppress_write: bool,
    rename: Option<String>,
    converter: Option<Arc<dyn ValueConverter>>,
    ignore_errors: bool,
}

impl PropertyDescriptor {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn value_type(&self) -> ValueType {
        self.value_type
    }

    /// Declared default, unconverted
    pub fn default_value(&self) -> Option<&Value> {
        self.default.as_ref()
    }

    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    pub fn category(&self) -> Option<&str> {
        self.category.as_deref()
    }

    pub fn tags(&self) -> &FxHashMap<String, Option<Value>> {
        &self.tags
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.contains_key(tag)
    }

    /// `None` if the tag is absent, `Some(None)` if it carries no value
    pub fn tag_value(&self, tag: &str) -> Option<Option<&Value>> {
        self.tags.get(tag).map(Option::as_ref)
    }

    /// Backing stores should not load this property
    pub fn suppress_read(&self) -> bool {
        self.suppress_read
    }

    /// Backing stores should not persist this property
    pub fn suppress_write(&self) -> bool {
        self.suppress_write
    }

    /// Name used by backing stores: the rename if present, otherwise the property name
    pub fn external_name(&self) -> &str {
        self.rename.as_deref().unwrap_or(&self.name)
    }

    pub fn converter(&self) -> Option<&Arc<dyn ValueConverter>> {
        self.converter.as_ref()
    }

    pub fn ignore_errors(&self) -> bool {
        self.ignore_errors
    }

    /// Coerce a value into this property's declared type
    pub fn coerce(&self, value: &Value) -> Result<Value> {
        let converted = match &self.converter {
            Some(converter) => converter.convert(value, self.value_type),
            None => value.coerce(self.value_type),
        };
        converted.map_err(|e| Error::conversion(&self.name, e))
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("default", &self.default)
            .field("tags", &self.tags.len())
            .field("rename", &self.rename)
            .field("converter", &self.converter.as_ref().map(|c| c.name().to_string()))
            .finish()
    }
}

/// Declaration of a property, as written by the application
#[derive(Clone)]
pub struct PropertySpec {
    name: String,
    value_type: ValueType,
    default: Option<Value>,
    description: Option<String>,
    category: Option<String>,
    tags: Vec<(String, Option<Value>)>,
    suppress_read: bool,
    suppress_write: bool,
    rename: Option<String>,
    converter: Option<Arc<dyn ValueConverter>>,
    ignore_errors: bool,
}

impl PropertySpec {
    pub fn new(name: impl Into<String>, value_type: ValueType) -> Self {
        Self {
            name: name.into(),
            value_type,
            default: None,
            description: None,
            category: None,
            tags: Vec::new(),
            suppress_read: false,
            suppress_write: false,
            rename: None,
            converter: None,
            ignore_errors: false,
        }
    }

    /// Declare a property whose type follows a Rust type
    pub fn typed<T: ConfigValue>(name: impl Into<String>) -> Self {
        Self::new(name, T::VALUE_TYPE)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn default(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn description(mut self, text: impl Into<String>) -> Self {
        self.description = Some(text.into());
        self
    }

    pub fn category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Tag without a value
    pub fn tag(mut self, key: impl Into<String>) -> Self {
        self.tags.push((key.into(), None));
        self
    }

    pub fn tag_value(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.tags.push((key.into(), Some(value.into())));
        self
    }

    pub fn suppress_read(mut self) -> Self {
        self.suppress_read = true;
        self
    }

    pub fn suppress_write(mut self) -> Self {
        self.suppress_write = true;
        self
    }

    pub fn rename(mut self, external_name: impl Into<String>) -> Self {
        self.rename = Some(external_name.into());
        self
    }

    pub fn converter(mut self, converter: Arc<dyn ValueConverter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Initializer failures for this property leave it unset instead of failing construction
    pub fn ignore_errors(mut self) -> Self {
        self.ignore_errors = true;
        self
    }

    /// Package the declaration into a descriptor; repeated tag keys keep the last value
    pub fn to_descriptor(&self) -> PropertyDescriptor {
        let mut tags = FxHashMap::default();
        for (key, value) in &self.tags {
            tags.insert(key.clone(), value.clone());
        }

        PropertyDescriptor {
            name: self.name.clone(),
            value_type: self.value_type,
            default: self.default.clone(),
            description: self.description.clone(),
            category: self.category.clone(),
            tags,
            suppress_read: self.suppress_read,
            suppress_write: self.suppress_write,
            rename: self.rename.clone(),
            converter: self.converter.clone(),
            ignore_errors: self.ignore_errors,
        }
    }
}

impl fmt::Debug for PropertySpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertySpec")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .finish_non_exhaustive()
    }
}
