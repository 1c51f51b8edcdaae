//! Shared fixtures for the pipeline benchmarks

use aspectconf_builder::{ConfigBuilder, ExtensionRegistry};
use aspectconf_core::metadata::{resolve, skip_infrastructure, ContractBuilder};
use aspectconf_core::{
    ContractDefinition, ContractProxy, Engine, PropertySpec, Result, ValueType,
};
use aspectconf_extensions::contracts;
use std::sync::Arc;

/// Number of integer properties in the benchmark contract
pub const PROPERTY_COUNT: usize = 32;

/// Property name at `index`
pub fn property_name(index: usize) -> String {
    format!("Setting{}", index)
}

fn properties(builder: ContractBuilder) -> ContractBuilder {
    (0..PROPERTY_COUNT).fold(builder, |builder, i| {
        builder.property(
            PropertySpec::new(property_name(i), ValueType::Integer)
                .default(i as i64)
                .tag("Bench"),
        )
    })
}

/// Contract without capabilities
pub fn plain_contract() -> Arc<ContractDefinition> {
    properties(ContractDefinition::builder("IPlain")).finish()
}

/// Contract extending every built-in infrastructure contract
pub fn full_contract() -> Arc<ContractDefinition> {
    properties(
        ContractDefinition::builder("IFull")
            .extends(contracts::default_value_contract())
            .extends(contracts::description_contract())
            .extends(contracts::write_protect_contract())
            .extends(contracts::transaction_contract())
            .extends(contracts::has_changes_contract())
            .extends(contracts::notify_changing_contract())
            .extends(contracts::notify_changed_contract()),
    )
    .finish()
}

/// Bare engine with only the terminal get/set installed
pub fn plain_engine() -> Engine {
    Engine::new(Arc::new(resolve(&plain_contract(), &skip_infrastructure)))
}

/// Configuration object with every built-in extension attached
pub fn full_config(registry: &ExtensionRegistry) -> Result<ContractProxy> {
    ConfigBuilder::new(registry).build_definition(&full_contract())
}
