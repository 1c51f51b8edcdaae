//! Description and tag lookup

use crate::{call_flag, capability};
use aspectconf_core::{
    ConfigObject, ConfigValue, Engine, Error, Extension, InvokeContext, PropertyDescriptor,
    Result, Value,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::any::Any;
use std::sync::Arc;

/// Method returning a property's description
pub const DESCRIPTION_FOR: &str = "DescriptionFor";
/// Method testing whether a property carries a tag
pub const IS_TAGGED_WITH: &str = "IsTaggedWith";
/// Method returning a tag's value
pub const GET_TAG_VALUE: &str = "GetTagValue";
/// Method listing the properties carrying a tag
pub const PROPERTIES_TAGGED_WITH: &str = "PropertiesTaggedWith";

/// Pure metadata lookup; registers no interceptors
#[derive(Debug, Default)]
pub struct Description {
    /// tag → property names, in table order
    tag_index: RwLock<FxHashMap<String, Vec<String>>>,
}

impl Description {
    /// Create the extension
    pub fn new() -> Self {
        Self::default()
    }

    /// Properties carrying `tag`
    pub fn tagged_with(&self, tag: &str) -> Vec<String> {
        self.tag_index
            .read()
            .get(tag)
            .cloned()
            .unwrap_or_default()
    }
}

fn lookup(engine: &Engine, name: &str) -> Result<Arc<PropertyDescriptor>> {
    engine
        .property_table()
        .get(name)
        .cloned()
        .ok_or_else(|| Error::UnknownProperty(name.to_string()))
}

fn description_for(engine: &Engine, ctx: &mut InvokeContext) -> Result<()> {
    let descriptor = lookup(engine, ctx.str_arg(0)?)?;
    ctx.result = descriptor
        .description()
        .map(Value::from)
        .unwrap_or(Value::Nil);
    Ok(())
}

fn is_tagged_with(engine: &Engine, ctx: &mut InvokeContext) -> Result<()> {
    let descriptor = lookup(engine, ctx.str_arg(0)?)?;
    let tagged = descriptor.has_tag(ctx.str_arg(1)?);
    ctx.result = Value::Boolean(tagged);
    Ok(())
}

fn get_tag_value(engine: &Engine, ctx: &mut InvokeContext) -> Result<()> {
    let descriptor = lookup(engine, ctx.str_arg(0)?)?;
    let value = descriptor
        .tag_value(ctx.str_arg(1)?)
        .flatten()
        .cloned()
        .unwrap_or(Value::Nil);
    ctx.result = value;
    Ok(())
}

impl Extension for Description {
    fn name(&self) -> &str {
        capability::DESCRIPTION
    }

    fn init_order(&self) -> i32 {
        -50
    }

    fn attach(self: Arc<Self>, engine: &Engine) -> Result<()> {
        engine.register_method(DESCRIPTION_FOR, description_for);
        engine.register_method(IS_TAGGED_WITH, is_tagged_with);
        engine.register_method(GET_TAG_VALUE, get_tag_value);
        engine.register_method(PROPERTIES_TAGGED_WITH, move |_, ctx| {
            let names = self.tagged_with(ctx.str_arg(0)?);
            ctx.result = Value::List(names.into_iter().map(Value::String).collect());
            Ok(())
        });
        Ok(())
    }

    fn initialize_property(&self, _engine: &Engine, descriptor: &PropertyDescriptor) -> Result<()> {
        let mut index = self.tag_index.write();
        for tag in descriptor.tags().keys() {
            index
                .entry(tag.clone())
                .or_default()
                .push(descriptor.name().to_string());
        }
        Ok(())
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

/// Description and tag methods on any configuration object
pub trait DescriptionExt: ConfigObject {
    /// Declared description of `name`
    fn description_for(&self, name: &str) -> Result<Option<String>> {
        let value = self.call(DESCRIPTION_FOR, vec![Value::from(name)])?;
        Option::<String>::from_value(value).map_err(|e| Error::conversion(name, e))
    }

    /// Whether `name` carries `tag`
    fn is_tagged_with(&self, name: &str, tag: &str) -> Result<bool> {
        call_flag(self, IS_TAGGED_WITH, vec![Value::from(name), Value::from(tag)])
    }

    /// Value of `tag` on `name`; `Nil` if the tag is absent or has no value
    fn get_tag_value(&self, name: &str, tag: &str) -> Result<Value> {
        self.call(GET_TAG_VALUE, vec![Value::from(name), Value::from(tag)])
    }

    /// Names of the properties carrying `tag`
    fn properties_tagged_with(&self, tag: &str) -> Result<Vec<String>> {
        let value = self.call(PROPERTIES_TAGGED_WITH, vec![Value::from(tag)])?;
        Vec::<String>::from_value(value).map_err(|e| Error::conversion(tag, e))
    }
}

impl<T: ConfigObject + ?Sized> DescriptionExt for T {}
