//! Default values declared on properties

use crate::{call_unit, capability};
use aspectconf_core::engine::RESTORE_TO_DEFAULT;
use aspectconf_core::{
    ConfigObject, Engine, Error, Extension, InvokeContext, PropertyDescriptor, Result, Value,
};
use std::any::Any;
use std::sync::Arc;
use tracing::trace;

/// Method returning the converted default of a property
pub const DEFAULT_VALUE_FOR: &str = "DefaultValueFor";
/// Method restoring every property to its default
pub const RESTORE_ALL_TO_DEFAULTS: &str = "RestoreAllToDefaults";

/// Stores each property's declared default when the configuration object is built
#[derive(Debug, Default)]
pub struct DefaultValue;

impl DefaultValue {
    /// Create the extension
    pub fn new() -> Self {
        Self
    }

    /// Declared default converted to the property's type; `None` if nothing is declared
    pub fn default_for(descriptor: &PropertyDescriptor) -> Result<Option<Value>> {
        descriptor
            .default_value()
            .map(|value| descriptor.coerce(value))
            .transpose()
    }

    fn restore(engine: &Engine, name: &str) -> Result<()> {
        let descriptor = engine
            .property_table()
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownProperty(name.to_string()))?;
        let value = Self::default_for(&descriptor)?
            .unwrap_or_else(|| descriptor.value_type().empty());
        engine.set(descriptor.name(), value)?;
        Ok(())
    }
}

fn default_value_for(engine: &Engine, ctx: &mut InvokeContext) -> Result<()> {
    let name = ctx.str_arg(0)?;
    let descriptor = engine
        .property_table()
        .get(name)
        .cloned()
        .ok_or_else(|| Error::UnknownProperty(name.to_string()))?;
    ctx.result = DefaultValue::default_for(&descriptor)?.unwrap_or(Value::Nil);
    Ok(())
}

fn restore_to_default(engine: &Engine, ctx: &mut InvokeContext) -> Result<()> {
    let name = ctx.str_arg(0)?.to_string();
    if let Err(err) = DefaultValue::restore(engine, &name) {
        ctx.fail(err);
    }
    Ok(())
}

fn restore_all(engine: &Engine, ctx: &mut InvokeContext) -> Result<()> {
    let names: Vec<String> = engine
        .property_table()
        .iter()
        .filter(|d| d.default_value().is_some())
        .map(|d| d.name().to_string())
        .collect();
    for name in names {
        if let Err(err) = DefaultValue::restore(engine, &name) {
            ctx.fail(err);
            break;
        }
    }
    Ok(())
}

impl Extension for DefaultValue {
    fn name(&self) -> &str {
        capability::DEFAULT_VALUE
    }

    fn init_order(&self) -> i32 {
        -100
    }

    fn attach(self: Arc<Self>, engine: &Engine) -> Result<()> {
        engine.register_method(DEFAULT_VALUE_FOR, default_value_for);
        engine.register_method(RESTORE_TO_DEFAULT, restore_to_default);
        engine.register_method(RESTORE_ALL_TO_DEFAULTS, restore_all);
        Ok(())
    }

    fn initialize_property(&self, engine: &Engine, descriptor: &PropertyDescriptor) -> Result<()> {
        if let Some(value) = Self::default_for(descriptor)? {
            trace!("Default for {}: {}", descriptor.name(), value);
            engine.store_value(descriptor.name(), value)?;
        }
        Ok(())
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Default-value methods on any configuration object
pub trait DefaultValueExt: ConfigObject {
    /// Declared default of `name`, converted to its type (`Nil` if none)
    fn default_value_for(&self, name: &str) -> Result<Value> {
        self.call(DEFAULT_VALUE_FOR, vec![Value::from(name)])
    }

    /// Write the declared default of `name` through the set pipeline
    fn restore_to_default(&self, name: &str) -> Result<()> {
        call_unit(self, RESTORE_TO_DEFAULT, vec![Value::from(name)])
    }

    /// Restore every property that declares a default
    fn restore_all_to_defaults(&self) -> Result<()> {
        call_unit(self, RESTORE_ALL_TO_DEFAULTS, vec![])
    }
}

impl<T: ConfigObject + ?Sized> DefaultValueExt for T {}

#[cfg(test)]
mod tests {
    use super::*;
    use aspectconf_core::metadata::{resolve, skip_infrastructure};
    use aspectconf_core::{ContractDefinition, PropertySpec, ValueType};

    fn engine() -> Engine {
        let contract = ContractDefinition::builder("IPerson")
            .property(PropertySpec::new("Age", ValueType::Integer).default("21"))
            .property(PropertySpec::new("Name", ValueType::String))
            .property(PropertySpec::new("Ratio", ValueType::Float).default(0.5))
            .build()
            .unwrap();
        let engine = Engine::new(Arc::new(resolve(&contract, &skip_infrastructure)));
        engine.attach(Arc::new(DefaultValue::new())).unwrap();
        engine.initialize().unwrap();
        engine
    }

    #[test]
    fn test_defaults_are_stored_typed() {
        let engine = engine();
        assert_eq!(engine.get_value("Age").unwrap(), Value::Integer(21));
        assert_eq!(engine.get_value("Ratio").unwrap(), Value::Float(0.5));
        assert!(!engine.has_value("Name"));
    }

    #[test]
    fn test_restore_to_default() {
        let engine = engine();
        engine.set("Age", 40).unwrap();
        engine.restore_to_default("age").unwrap();
        assert_eq!(engine.get_value("Age").unwrap(), Value::Integer(21));
    }

    #[test]
    fn test_restore_without_default_uses_empty_value() {
        let engine = engine();
        engine.set("Name", "Robin").unwrap();
        engine.restore_to_default("Name").unwrap();
        assert_eq!(engine.get_value("Name").unwrap(), Value::Nil);
    }

    #[test]
    fn test_default_value_for() {
        let engine = engine();
        assert_eq!(
            engine
                .invoke(DEFAULT_VALUE_FOR, vec![Value::from("Age")])
                .unwrap(),
            Value::Integer(21)
        );
        assert_eq!(
            engine
                .invoke(DEFAULT_VALUE_FOR, vec![Value::from("Name")])
                .unwrap(),
            Value::Nil
        );
        assert!(matches!(
            engine.invoke(DEFAULT_VALUE_FOR, vec![Value::from("Nope")]),
            Err(Error::UnknownProperty(_))
        ));
    }

    #[test]
    fn test_restore_all() {
        let engine = engine();
        engine.set("Age", 1).unwrap();
        engine.set("Ratio", 2.0).unwrap();
        engine.invoke(RESTORE_ALL_TO_DEFAULTS, vec![]).unwrap();
        assert_eq!(engine.get_value("Age").unwrap(), Value::Integer(21));
        assert_eq!(engine.get_value("Ratio").unwrap(), Value::Float(0.5));
    }

    #[test]
    fn test_unconvertible_default_fails_initialization() {
        let contract = ContractDefinition::builder("IBroken")
            .property(PropertySpec::new("Port", ValueType::Integer).default("eighty"))
            .build()
            .unwrap();
        let engine = Engine::new(Arc::new(resolve(&contract, &skip_infrastructure)));
        engine.attach(Arc::new(DefaultValue::new())).unwrap();

        let err = engine.initialize().unwrap_err();
        assert!(matches!(err, Error::Initialization { ref property, .. } if property == "Port"));
        assert!(!engine.has_value("Port"));
    }
}
