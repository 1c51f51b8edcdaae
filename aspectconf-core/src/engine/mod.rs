//! The interception engine
//!
//! One [`Engine`] backs one configuration object. It owns the value store and
//! runs every property read and write through ordered interceptor pipelines:
//!
//! - `get` builds a [`GetContext`] from the store and runs the get pipeline
//! - `set` builds a [`SetContext`] with the old value and runs the set pipeline;
//!   the terminal setter at [`order::TERMINAL`] coerces and stores the value
//! - `invoke` runs every handler chained under a method name
//!
//! An interceptor stops its pipeline by halting or failing the context. Failing
//! is the expected way to reject a call; returning `Err` aborts the call as an
//! unexpected failure. Neither rolls back what earlier interceptors did.

mod context;
mod pipeline;

pub use context::{GetContext, InvokeContext, SetContext};
pub use pipeline::{
    order, GetInterceptor, InterceptorEntry, MethodHandler, Pipeline, SetInterceptor,
};

use crate::error::{Error, Result};
use crate::extension::Extension;
use crate::metadata::{property_key, PropertyDescriptor, PropertyTable};
use crate::value::Value;
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace, warn};

/// Method registered by the default-value extension and exposed on the engine surface
pub const RESTORE_TO_DEFAULT: &str = "RestoreToDefault";

/// Per-instance interception engine
pub struct Engine {
    table: Arc<PropertyTable>,
    store: RwLock<FxHashMap<String, Value>>,
    get_pipeline: RwLock<Pipeline<GetInterceptor>>,
    set_pipeline: RwLock<Pipeline<SetInterceptor>>,
    methods: RwLock<FxHashMap<String, Vec<MethodHandler>>>,
    extensions: RwLock<Vec<Arc<dyn Extension>>>,
}

impl Engine {
    /// Create an engine over a resolved property table, with the terminal get/set installed
    pub fn new(table: Arc<PropertyTable>) -> Self {
        let engine = Self {
            table,
            store: RwLock::new(FxHashMap::default()),
            get_pipeline: RwLock::new(Pipeline::new()),
            set_pipeline: RwLock::new(Pipeline::new()),
            methods: RwLock::new(FxHashMap::default()),
            extensions: RwLock::new(Vec::new()),
        };
        engine.register_get_interceptor(order::TERMINAL, terminal_get);
        engine.register_set_interceptor(order::TERMINAL, terminal_set);
        engine
    }

    /// The resolved property table
    pub fn property_table(&self) -> &Arc<PropertyTable> {
        &self.table
    }

    fn descriptor(&self, name: &str) -> Result<Arc<PropertyDescriptor>> {
        self.table
            .get(name)
            .cloned()
            .ok_or_else(|| Error::UnknownProperty(name.to_string()))
    }

    /// Read a property through the get pipeline
    pub fn get(&self, name: &str) -> Result<GetContext> {
        let descriptor = self.descriptor(name)?;
        let stored = self.store.read().get(&property_key(name)).cloned();
        let mut ctx = GetContext::new(descriptor, stored);

        let interceptors = self.get_pipeline.read().snapshot();
        for interceptor in interceptors {
            interceptor(self, &mut ctx)?;
            if let Some(err) = ctx.take_error() {
                trace!("get {} failed: {}", ctx.name(), err);
                return Err(err);
            }
            if ctx.is_halted() {
                trace!("get {} halted", ctx.name());
                break;
            }
        }
        Ok(ctx)
    }

    /// Shorthand for `get(name)?.value`
    pub fn get_value(&self, name: &str) -> Result<Value> {
        self.get(name).map(|ctx| ctx.value)
    }

    /// Write a property through the set pipeline
    pub fn set(&self, name: &str, value: impl Into<Value>) -> Result<SetContext> {
        let descriptor = self.descriptor(name)?;
        let old = self.store.read().get(&property_key(name)).cloned();
        let mut ctx = SetContext::new(descriptor, old, value.into());

        let interceptors = self.set_pipeline.read().snapshot();
        for interceptor in interceptors {
            interceptor(self, &mut ctx)?;
            if let Some(err) = ctx.take_error() {
                trace!("set {} failed: {}", ctx.name(), err);
                return Err(err);
            }
            if ctx.is_halted() {
                trace!("set {} halted", ctx.name());
                break;
            }
        }
        Ok(ctx)
    }

    /// Run every handler chained under `name`, in registration order
    pub fn invoke(&self, name: &str, args: Vec<Value>) -> Result<Value> {
        let handlers = self
            .methods
            .read()
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| Error::NotSupported(format!("method '{}' is not registered", name)))?;

        let mut ctx = InvokeContext::new(name, args);
        for handler in handlers {
            ctx.result = Value::Nil;
            handler(self, &mut ctx)?;
            if let Some(err) = ctx.take_error() {
                trace!("invoke {} failed: {}", name, err);
                return Err(err);
            }
        }
        Ok(ctx.result)
    }

    pub fn has_method(&self, name: &str) -> bool {
        self.methods
            .read()
            .contains_key(&name.to_ascii_lowercase())
    }

    pub fn register_get_interceptor<F>(&self, order: i32, interceptor: F)
    where
        F: Fn(&Engine, &mut GetContext) -> Result<()> + Send + Sync + 'static,
    {
        debug!("Registering get interceptor at order {}", order);
        self.get_pipeline.write().insert(order, Arc::new(interceptor));
    }

    pub fn register_set_interceptor<F>(&self, order: i32, interceptor: F)
    where
        F: Fn(&Engine, &mut SetContext) -> Result<()> + Send + Sync + 'static,
    {
        debug!("Registering set interceptor at order {}", order);
        self.set_pipeline.write().insert(order, Arc::new(interceptor));
    }

    /// Register a method handler; handlers under the same name chain together
    pub fn register_method<F>(&self, name: &str, handler: F)
    where
        F: Fn(&Engine, &mut InvokeContext) -> Result<()> + Send + Sync + 'static,
    {
        debug!("Registering method {}", name);
        self.methods
            .write()
            .entry(name.to_ascii_lowercase())
            .or_default()
            .push(Arc::new(handler));
    }

    /// Orders of the registered get interceptors, ascending
    pub fn get_orders(&self) -> Vec<i32> {
        self.get_pipeline.read().orders()
    }

    /// Orders of the registered set interceptors, ascending
    pub fn set_orders(&self) -> Vec<i32> {
        self.set_pipeline.read().orders()
    }

    /// Snapshot of the value store, keyed by declared property name
    pub fn properties(&self) -> BTreeMap<String, Value> {
        let store = self.store.read();
        self.table
            .iter()
            .filter_map(|d| {
                store
                    .get(&property_key(d.name()))
                    .map(|v| (d.name().to_string(), v.clone()))
            })
            .collect()
    }

    /// Merge values into the store key by key, bypassing the pipelines.
    ///
    /// Keys absent from `values` keep their current value. Every key is validated
    /// and coerced before anything is written.
    pub fn properties_bulk_assign<I, K>(&self, values: I) -> Result<()>
    where
        I: IntoIterator<Item = (K, Value)>,
        K: AsRef<str>,
    {
        let mut staged = Vec::new();
        for (name, value) in values {
            let descriptor = self.descriptor(name.as_ref())?;
            let coerced = descriptor.coerce(&value)?;
            staged.push((property_key(descriptor.name()), coerced));
        }

        let mut store = self.store.write();
        for (key, value) in staged {
            store.insert(key, value);
        }
        Ok(())
    }

    /// Restore a property to its declared default
    pub fn restore_to_default(&self, name: &str) -> Result<()> {
        self.invoke(RESTORE_TO_DEFAULT, vec![Value::from(name)])
            .map(|_| ())
    }

    /// Whether the store holds a value for `name`
    pub fn has_value(&self, name: &str) -> bool {
        self.store.read().contains_key(&property_key(name))
    }

    /// Write the store directly; for extensions that must bypass the pipelines
    pub fn store_value(&self, name: &str, value: Value) -> Result<()> {
        let descriptor = self.descriptor(name)?;
        let coerced = descriptor.coerce(&value)?;
        self.store.write().insert(property_key(name), coerced);
        Ok(())
    }

    /// Attach an extension: it registers its interceptors and methods
    pub fn attach(&self, extension: Arc<dyn Extension>) -> Result<()> {
        debug!("Attaching extension {}", extension.name());
        Arc::clone(&extension).attach(self)?;

        let mut extensions = self.extensions.write();
        let index = extensions.partition_point(|e| e.init_order() <= extension.init_order());
        extensions.insert(index, extension);
        Ok(())
    }

    /// Run per-property initializers, then the "all properties initialized" hooks.
    ///
    /// Every extension sees every property. A property's first failure is
    /// recorded; one declared with `ignore_errors` swallows its failure and is
    /// left unset. The earliest recorded failure is returned once all hooks ran.
    pub fn initialize(&self) -> Result<()> {
        let extensions = self.extensions.read().clone();
        let mut first_error = None;

        for descriptor in self.table.iter() {
            let mut property_error = None;
            for extension in &extensions {
                if let Err(err) = extension.initialize_property(self, descriptor) {
                    property_error.get_or_insert(err);
                }
            }
            let Some(err) = property_error else { continue };
            if descriptor.ignore_errors() {
                warn!(
                    "Ignoring initialization error for {}: {}",
                    descriptor.name(),
                    err
                );
            } else if first_error.is_none() {
                first_error = Some(Error::initialization(descriptor.name(), err));
            }
        }

        for extension in &extensions {
            if let Err(err) = extension.properties_initialized(self) {
                first_error.get_or_insert(err);
            }
        }

        match first_error {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Attached extensions in init order
    pub fn extensions(&self) -> Vec<Arc<dyn Extension>> {
        self.extensions.read().clone()
    }

    /// Typed handle to an attached extension
    pub fn extension<T: Extension>(&self) -> Option<Arc<T>> {
        self.extensions
            .read()
            .iter()
            .find_map(|e| Arc::clone(e).into_any().downcast::<T>().ok())
    }
}

fn terminal_get(engine: &Engine, ctx: &mut GetContext) -> Result<()> {
    if let Some(value) = engine.store.read().get(&property_key(ctx.name())) {
        ctx.value = value.clone();
        ctx.has_value = true;
    }
    Ok(())
}

fn terminal_set(engine: &Engine, ctx: &mut SetContext) -> Result<()> {
    match ctx.descriptor().coerce(&ctx.new_value) {
        Ok(coerced) => {
            ctx.new_value = coerced.clone();
            engine
                .store
                .write()
                .insert(property_key(ctx.name()), coerced);
            ctx.mark_stored();
        }
        Err(err) => ctx.fail(err),
    }
    Ok(())
}

impl fmt::Debug for Engine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Engine")
            .field("contract", &self.table.contract())
            .field("properties", &self.table.len())
            .field("stored", &self.store.read().len())
            .field("extensions", &self.extensions.read().len())
            .finish()
    }
}
