//! Configuration object construction
//!
//! For a contract, the builder resolves (or reuses) its property table, creates
//! an engine, attaches one fresh extension per capability marker the contract
//! graph declares, runs the per-property initializers and hands back a proxy.

use crate::registry::ExtensionRegistry;
use aspectconf_core::{
    ConfigContract, ContractDefinition, ContractKey, ContractProxy, Engine, Error,
    MetadataResolver, Result,
};
use std::sync::Arc;
use tracing::{debug, info};

/// A built configuration object together with the earliest initialization error.
///
/// The object is usable even when `error` is set; the failing properties are
/// left without a value.
#[derive(Debug)]
pub struct BuildOutcome<C> {
    /// The configuration object
    pub config: C,
    /// Earliest initializer failure, if any
    pub error: Option<Error>,
}

impl<C> BuildOutcome<C> {
    /// The object, or the initialization error if there was one
    pub fn into_result(self) -> Result<C> {
        match self.error {
            Some(err) => Err(err),
            None => Ok(self.config),
        }
    }
}

/// Builds configuration objects from contracts using an [`ExtensionRegistry`]
#[derive(Debug)]
pub struct ConfigBuilder<'a> {
    registry: &'a ExtensionRegistry,
    resolver: MetadataResolver,
}

impl<'a> ConfigBuilder<'a> {
    /// Builder over `registry`, skipping infrastructure contracts when resolving
    pub fn new(registry: &'a ExtensionRegistry) -> Self {
        Self::with_resolver(registry, MetadataResolver::new())
    }

    /// Builder with a custom resolver (e.g. a different exclusion filter)
    pub fn with_resolver(registry: &'a ExtensionRegistry, resolver: MetadataResolver) -> Self {
        Self { registry, resolver }
    }

    /// Number of property tables resolved so far
    pub fn cached_tables(&self) -> usize {
        self.resolver.cached()
    }

    /// Build a typed configuration object
    pub fn build<C: ConfigContract>(&self) -> Result<C> {
        self.build_with_report::<C>()?.into_result()
    }

    /// Build a typed configuration object, reporting initialization errors alongside it
    pub fn build_with_report<C: ConfigContract>(&self) -> Result<BuildOutcome<C>> {
        let outcome = self.assemble(C::contract_key(), C::definition())?;
        Ok(BuildOutcome {
            config: C::from_proxy(outcome.config),
            error: outcome.error,
        })
    }

    /// Build a dynamic configuration object for a runtime definition
    pub fn build_definition(&self, definition: &Arc<ContractDefinition>) -> Result<ContractProxy> {
        self.build_definition_with_report(definition)?.into_result()
    }

    /// Build a dynamic configuration object, reporting initialization errors alongside it.
    ///
    /// Runtime definitions are cached by identity: clones of one `Arc` share a
    /// table, separately built definitions never do.
    pub fn build_definition_with_report(
        &self,
        definition: &Arc<ContractDefinition>,
    ) -> Result<BuildOutcome<ContractProxy>> {
        let key = ContractKey::of(definition);
        self.assemble(key, Arc::clone(definition))
    }

    fn assemble(
        &self,
        key: ContractKey,
        definition: Arc<ContractDefinition>,
    ) -> Result<BuildOutcome<ContractProxy>> {
        let table = self.resolver.resolve_cached(key, &definition);
        let engine = Arc::new(Engine::new(table));

        for capability in definition.all_capabilities() {
            let extension = self.registry.create(&capability)?;
            debug!("{}: attaching {}", definition.name(), extension.name());
            engine.attach(extension)?;
        }

        let error = engine.initialize().err();
        info!(
            "Built configuration object for {} ({} properties, {} extensions)",
            definition.name(),
            engine.property_table().len(),
            engine.extensions().len()
        );

        Ok(BuildOutcome {
            config: ContractProxy::new(engine, definition),
            error,
        })
    }
}
