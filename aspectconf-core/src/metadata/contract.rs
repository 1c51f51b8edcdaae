//! Contract definitions: the property and method surface an application declares

use super::PropertySpec;
use crate::error::{Error, Result};
use rustc_hash::FxHashSet;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

static NEXT_DEFINITION_ID: AtomicU64 = AtomicU64::new(1);

/// An application-declared contract, possibly extending other contracts
#[derive(Debug)]
pub struct ContractDefinition {
    id: u64,
    name: String,
    parents: Vec<Arc<ContractDefinition>>,
    properties: Vec<PropertySpec>,
    methods: Vec<String>,
    capabilities: Vec<String>,
    infrastructure: bool,
}

impl ContractDefinition {
    pub fn builder(name: impl Into<String>) -> ContractBuilder {
        ContractBuilder::new(name)
    }

    /// Process-unique identity of this definition
    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn parents(&self) -> &[Arc<ContractDefinition>] {
        &self.parents
    }

    /// Properties declared directly on this contract
    pub fn properties(&self) -> &[PropertySpec] {
        &self.properties
    }

    /// Methods declared directly on this contract
    pub fn methods(&self) -> &[String] {
        &self.methods
    }

    /// Capability markers declared directly on this contract
    pub fn capabilities(&self) -> &[String] {
        &self.capabilities
    }

    /// Infrastructure contracts carry capabilities and methods but no configurable properties
    pub fn is_infrastructure(&self) -> bool {
        self.infrastructure
    }

    /// Depth-first, pre-order walk of the contract graph; each contract is visited once
    pub fn walk<F>(&self, visit: &mut F)
    where
        F: FnMut(&ContractDefinition) -> bool,
    {
        let mut seen = FxHashSet::default();
        self.walk_inner(&mut seen, visit);
    }

    fn walk_inner<'a, F>(&'a self, seen: &mut FxHashSet<&'a str>, visit: &mut F)
    where
        F: FnMut(&ContractDefinition) -> bool,
    {
        if !seen.insert(self.name.as_str()) {
            return;
        }
        if !visit(self) {
            return;
        }
        for parent in &self.parents {
            parent.walk_inner(seen, visit);
        }
    }

    /// Capability markers across the whole graph, first occurrence first
    pub fn all_capabilities(&self) -> Vec<String> {
        let mut seen = FxHashSet::default();
        let mut out = Vec::new();
        self.walk(&mut |contract: &ContractDefinition| {
            for cap in &contract.capabilities {
                if seen.insert(cap.to_ascii_lowercase()) {
                    out.push(cap.clone());
                }
            }
            true
        });
        out
    }

    /// Whether `method` is declared anywhere in the graph (case-insensitive)
    pub fn declares_method(&self, method: &str) -> bool {
        let mut found = false;
        self.walk(&mut |contract: &ContractDefinition| {
            if contract
                .methods
                .iter()
                .any(|m| m.eq_ignore_ascii_case(method))
            {
                found = true;
            }
            !found
        });
        found
    }
}

/// Builder for [`ContractDefinition`]
#[derive(Debug)]
pub struct ContractBuilder {
    name: String,
    parents: Vec<Arc<ContractDefinition>>,
    properties: Vec<PropertySpec>,
    methods: Vec<String>,
    capabilities: Vec<String>,
    infrastructure: bool,
}

impl ContractBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            parents: Vec::new(),
            properties: Vec::new(),
            methods: Vec::new(),
            capabilities: Vec::new(),
            infrastructure: false,
        }
    }

    pub fn extends(mut self, parent: Arc<ContractDefinition>) -> Self {
        self.parents.push(parent);
        self
    }

    pub fn property(mut self, spec: PropertySpec) -> Self {
        self.properties.push(spec);
        self
    }

    pub fn method(mut self, name: impl Into<String>) -> Self {
        self.methods.push(name.into());
        self
    }

    pub fn capability(mut self, marker: impl Into<String>) -> Self {
        self.capabilities.push(marker.into());
        self
    }

    pub fn infrastructure(mut self) -> Self {
        self.infrastructure = true;
        self
    }

    /// Validate and build the definition
    pub fn build(self) -> Result<Arc<ContractDefinition>> {
        if self.name.trim().is_empty() {
            return Err(Error::InvalidContract("contract name is empty".to_string()));
        }
        if let Some(spec) = self.properties.iter().find(|p| p.name().trim().is_empty()) {
            return Err(Error::InvalidContract(format!(
                "{}: property with empty name ({:?})",
                self.name, spec
            )));
        }

        let mut methods = FxHashSet::default();
        for method in &self.methods {
            if !methods.insert(method.to_ascii_lowercase()) {
                return Err(Error::InvalidContract(format!(
                    "{}: method '{}' declared twice",
                    self.name, method
                )));
            }
        }

        Ok(self.finish())
    }

    /// Build without validation, for statically declared contracts
    pub fn finish(self) -> Arc<ContractDefinition> {
        Arc::new(ContractDefinition {
            id: NEXT_DEFINITION_ID.fetch_add(1, Ordering::Relaxed),
            name: self.name,
            parents: self.parents,
            properties: self.properties,
            methods: self.methods,
            capabilities: self.capabilities,
            infrastructure: self.infrastructure,
        })
    }
}
