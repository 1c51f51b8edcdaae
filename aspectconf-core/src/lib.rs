//! Core of the AspectConf configuration engine
//!
//! This crate provides the building blocks every configuration object is made of:
//! - Value representation and type coercion
//! - Contract definitions and the metadata resolver
//! - The interception engine and its get/set/invoke pipelines
//! - The extension contract
//! - Contract proxies and the `config_contract!` macro

pub mod engine;
pub mod error;
pub mod extension;
pub mod metadata;
pub mod proxy;
pub mod value;

pub use engine::{order, Engine, GetContext, InvokeContext, SetContext};
pub use error::{Error, Result};
pub use extension::Extension;
pub use metadata::{
    ContractDefinition, ContractKey, MetadataResolver, PropertyDescriptor, PropertySpec,
    PropertyTable,
};
pub use proxy::{ConfigContract, ConfigObject, ContractProxy};
pub use value::{ConfigValue, Value, ValueConverter, ValueType};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::{
        config_contract, ConfigContract, ConfigObject, ContractDefinition, ContractProxy, Engine,
        Error, Extension, PropertySpec, Result, Value, ValueType,
    };
}
