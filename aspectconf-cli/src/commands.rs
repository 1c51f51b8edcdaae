//! Command implementations
//!
//! Each command returns its output as a string so `main` only has to print it.

use crate::config::OutputFormat;
use anyhow::{anyhow, bail, Context, Result};
use aspectconf_builder::{ConfigBuilder, ContractManifest, ExtensionRegistry};
use aspectconf_core::metadata::{resolve, skip_infrastructure};
use aspectconf_core::{ConfigObject, ContractDefinition, ContractProxy, Value};
use std::fmt::Write as _;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Parse a `Name=value` assignment
pub fn parse_assignment(input: &str) -> Result<(String, String), String> {
    match input.split_once('=') {
        Some((name, value)) if !name.trim().is_empty() => {
            Ok((name.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected NAME=VALUE, got '{}'", input)),
    }
}

/// A manifest loaded together with the registry used to build from it
pub struct Workspace {
    manifest: ContractManifest,
    registry: ExtensionRegistry,
}

impl Workspace {
    pub fn load(path: &Path) -> Result<Self> {
        let manifest = ContractManifest::from_path(path)
            .with_context(|| format!("Failed to load manifest {}", path.display()))?;
        debug!("Loaded {} contracts from {}", manifest.contracts.len(), path.display());
        Ok(Self::new(manifest))
    }

    pub fn new(manifest: ContractManifest) -> Self {
        Self {
            manifest,
            registry: ExtensionRegistry::with_defaults(),
        }
    }

    fn definition(&self, contract: &str) -> Result<Arc<ContractDefinition>> {
        Ok(self.manifest.definition(contract, &self.registry)?)
    }

    fn build(&self, contract: &str) -> Result<ContractProxy> {
        let definition = self.definition(contract)?;
        let outcome = ConfigBuilder::new(&self.registry).build_definition_with_report(&definition)?;
        if let Some(err) = &outcome.error {
            warn!("{}: {}", contract, err);
        }
        Ok(outcome.config)
    }

    /// List the contracts, or describe one contract's resolved properties
    pub fn inspect(&self, contract: Option<&str>) -> Result<String> {
        let mut out = String::new();
        let Some(contract) = contract else {
            for entry in &self.manifest.contracts {
                writeln!(
                    out,
                    "{} ({} properties{})",
                    entry.name,
                    entry.properties.len(),
                    if entry.infrastructure { ", infrastructure" } else { "" }
                )?;
            }
            return Ok(out);
        };

        let definition = self.definition(contract)?;
        let table = resolve(&definition, &skip_infrastructure);
        writeln!(out, "contract {}", definition.name())?;
        let capabilities = definition.all_capabilities();
        if !capabilities.is_empty() {
            writeln!(out, "capabilities: {}", capabilities.join(", "))?;
        }
        for descriptor in table.iter() {
            write!(out, "  {}: {}", descriptor.name(), descriptor.value_type())?;
            if let Some(default) = descriptor.default_value() {
                write!(out, " = {}", default)?;
            }
            if descriptor.external_name() != descriptor.name() {
                write!(out, " (as {})", descriptor.external_name())?;
            }
            let mut tags: Vec<String> = descriptor
                .tags()
                .iter()
                .map(|(tag, value)| match value {
                    Some(value) => format!("{}={}", tag, value),
                    None => tag.clone(),
                })
                .collect();
            tags.sort();
            if !tags.is_empty() {
                write!(out, " [{}]", tags.join(", "))?;
            }
            if let Some(description) = descriptor.description() {
                write!(out, " - {}", description)?;
            }
            writeln!(out)?;
        }
        Ok(out)
    }

    /// Build an object, apply assignments through the set pipeline and dump its values
    pub fn dump(
        &self,
        contract: &str,
        assignments: &[(String, String)],
        format: OutputFormat,
        pretty: bool,
    ) -> Result<String> {
        let config = self.build(contract)?;
        for (name, value) in assignments {
            config
                .set_item(name, value.as_str())
                .with_context(|| format!("Failed to set {}", name))?;
        }
        let values = config.engine().properties();
        let text = match (format, pretty) {
            (OutputFormat::Json, true) => serde_json::to_string_pretty(&values)?,
            (OutputFormat::Json, false) => serde_json::to_string(&values)?,
            (OutputFormat::Toml, true) => toml::to_string_pretty(&values)?,
            (OutputFormat::Toml, false) => toml::to_string(&values)?,
        };
        Ok(text)
    }

    /// Read one property of a freshly built object
    pub fn get(&self, contract: &str, property: &str) -> Result<String> {
        let config = self.build(contract)?;
        Ok(config.get_item(property)?.to_string())
    }

    /// Invoke a declared method on a freshly built object
    pub fn invoke(&self, contract: &str, method: &str, args: &[String]) -> Result<String> {
        let config = self.build(contract)?;
        let args = args.iter().map(|a| Value::from(a.as_str())).collect();
        Ok(config.invoke(method, args)?.to_string())
    }
}

/// Resolve the contract to use from the command line or the configuration
pub fn pick_contract(explicit: Option<String>, configured: Option<String>) -> Result<String> {
    explicit
        .or(configured)
        .ok_or_else(|| anyhow!("no contract given; pass --contract or set default_contract"))
}

/// Capabilities known to the default registry
pub fn capabilities() -> String {
    ExtensionRegistry::with_defaults().capabilities().join("\n")
}

/// Check a manifest: every contract must build
pub fn check(path: &Path) -> Result<String> {
    let workspace = Workspace::load(path)?;
    let definitions = workspace.manifest.definitions(&workspace.registry)?;
    let builder = ConfigBuilder::new(&workspace.registry);
    let mut failures = Vec::new();
    for entry in &workspace.manifest.contracts {
        let Some(definition) = definitions.get(&entry.name.to_ascii_lowercase()) else {
            continue;
        };
        if let Err(err) = builder.build_definition(definition) {
            failures.push(format!("{}: {}", entry.name, err));
        }
    }
    if !failures.is_empty() {
        bail!("{}", failures.join("\n"));
    }
    Ok(format!("{} contracts OK", definitions.len()))
}
