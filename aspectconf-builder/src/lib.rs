//! Discovery and construction of AspectConf configuration objects
//!
//! - [`ExtensionRegistry`] maps capability markers to extension factories
//! - [`ConfigBuilder`] turns a contract into a live configuration object
//! - [`ContractManifest`] declares contracts in TOML or JSON
//!
//! ```ignore
//! let registry = ExtensionRegistry::with_defaults();
//! let person: PersonSettings = ConfigBuilder::new(&registry).build()?;
//! person.set_age(30)?;
//! ```

#![warn(missing_docs)]

pub mod builder;
pub mod manifest;
pub mod registry;

pub use builder::{BuildOutcome, ConfigBuilder};
pub use manifest::{ContractEntry, ContractManifest, PropertyEntry, TagEntry};
pub use registry::{ExtensionFactory, ExtensionRegistry};

pub use aspectconf_core::{Error, Result};
