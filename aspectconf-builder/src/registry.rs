//! Extension registry: capability markers mapped to extension factories

use aspectconf_core::{Error, Extension, Result, ValueConverter};
use aspectconf_core::value::SeparatedListConverter;
use aspectconf_extensions::{
    capability, DefaultValue, Description, HasChanges, NotifyChanged, NotifyChanging,
    Transaction, WriteProtect,
};
use parking_lot::RwLock;
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::debug;

/// Creates a fresh extension instance for one engine
pub type ExtensionFactory = Arc<dyn Fn() -> Arc<dyn Extension> + Send + Sync>;

/// Maps capability markers to extension factories and names to value converters.
///
/// Lookups are case-insensitive. A registry is an explicit object passed to the
/// builder; there is no process-wide instance.
pub struct ExtensionRegistry {
    /// Lower-cased capability → (declared capability, factory)
    factories: RwLock<FxHashMap<String, (String, ExtensionFactory)>>,
    /// Lower-cased converter name → converter
    converters: RwLock<FxHashMap<String, Arc<dyn ValueConverter>>>,
}

impl ExtensionRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            factories: RwLock::new(FxHashMap::default()),
            converters: RwLock::new(FxHashMap::default()),
        }
    }

    /// Registry holding every built-in extension and the default list converter
    pub fn with_defaults() -> Self {
        let registry = Self::new();
        registry.register(capability::DEFAULT_VALUE, || Arc::new(DefaultValue::new()));
        registry.register(capability::DESCRIPTION, || Arc::new(Description::new()));
        registry.register(capability::WRITE_PROTECT, || Arc::new(WriteProtect::new()));
        registry.register(capability::TRANSACTION, || Arc::new(Transaction::new()));
        registry.register(capability::HAS_CHANGES, || Arc::new(HasChanges::new()));
        registry.register(capability::NOTIFY_CHANGING, || Arc::new(NotifyChanging::new()));
        registry.register(capability::NOTIFY_CHANGED, || Arc::new(NotifyChanged::new()));
        registry.register_converter(Arc::new(SeparatedListConverter::named("separated-list", ';')));
        registry
    }

    /// Register (or replace) the factory for `capability`
    pub fn register<F>(&self, capability: &str, factory: F)
    where
        F: Fn() -> Arc<dyn Extension> + Send + Sync + 'static,
    {
        debug!("Registering extension for capability {}", capability);
        self.factories.write().insert(
            capability.to_ascii_lowercase(),
            (capability.to_string(), Arc::new(factory)),
        );
    }

    /// Register (or replace) a converter under its own name
    pub fn register_converter(&self, converter: Arc<dyn ValueConverter>) {
        debug!("Registering converter {}", converter.name());
        self.converters
            .write()
            .insert(converter.name().to_ascii_lowercase(), converter);
    }

    /// Whether a factory is registered for `capability`
    pub fn contains(&self, capability: &str) -> bool {
        self.factories
            .read()
            .contains_key(&capability.to_ascii_lowercase())
    }

    /// Registered capability markers, sorted
    pub fn capabilities(&self) -> Vec<String> {
        let mut names: Vec<String> = self
            .factories
            .read()
            .values()
            .map(|(name, _)| name.clone())
            .collect();
        names.sort();
        names
    }

    /// Instantiate the extension for `capability`
    pub fn create(&self, capability: &str) -> Result<Arc<dyn Extension>> {
        let factory = self
            .factories
            .read()
            .get(&capability.to_ascii_lowercase())
            .map(|(_, factory)| Arc::clone(factory))
            .ok_or_else(|| {
                Error::NotSupported(format!("no extension registered for capability '{}'", capability))
            })?;
        Ok(factory())
    }

    /// Converter registered under `name`
    pub fn converter(&self, name: &str) -> Result<Arc<dyn ValueConverter>> {
        self.converters
            .read()
            .get(&name.to_ascii_lowercase())
            .cloned()
            .ok_or_else(|| Error::NotSupported(format!("no converter named '{}'", name)))
    }
}

impl Default for ExtensionRegistry {
    fn default() -> Self {
        Self::with_defaults()
    }
}

impl std::fmt::Debug for ExtensionRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExtensionRegistry")
            .field("capabilities", &self.capabilities())
            .field("converters", &self.converters.read().len())
            .finish()
    }
}
