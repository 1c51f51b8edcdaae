//! Metadata resolution: flattening a contract graph into a property table

use super::{ContractDefinition, PropertyTable};
use dashmap::DashMap;
use std::any::TypeId;
use std::sync::Arc;
use tracing::{debug, trace};

/// Identity under which a resolved table is cached
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ContractKey {
    /// A contract declared by a Rust type
    Type(TypeId),
    /// A contract defined at runtime, identified by its definition
    Definition(u64),
}

impl ContractKey {
    /// Key of a runtime definition; distinct definitions never share a key
    pub fn of(contract: &ContractDefinition) -> Self {
        ContractKey::Definition(contract.id())
    }
}

/// Predicate selecting contracts whose properties are skipped during discovery
pub type ContractFilter = dyn Fn(&ContractDefinition) -> bool + Send + Sync;

/// Default filter: skip infrastructure contracts
pub fn skip_infrastructure(contract: &ContractDefinition) -> bool {
    contract.is_infrastructure()
}

/// Resolves contract graphs into property tables and caches the result per contract
pub struct MetadataResolver {
    cache: DashMap<ContractKey, Arc<PropertyTable>>,
    exclude: Box<ContractFilter>,
}

impl MetadataResolver {
    pub fn new() -> Self {
        Self::with_filter(skip_infrastructure)
    }

    pub fn with_filter<F>(exclude: F) -> Self
    where
        F: Fn(&ContractDefinition) -> bool + Send + Sync + 'static,
    {
        Self {
            cache: DashMap::new(),
            exclude: Box::new(exclude),
        }
    }

    /// Resolve a contract, reusing the cached table for `key` if present
    pub fn resolve_cached(
        &self,
        key: ContractKey,
        contract: &ContractDefinition,
    ) -> Arc<PropertyTable> {
        if let Some(table) = self.cache.get(&key) {
            trace!("Property table cache hit for {}", contract.name());
            return Arc::clone(table.value());
        }

        let table = Arc::new(resolve(contract, self.exclude.as_ref()));
        Arc::clone(self.cache.entry(key).or_insert(table).value())
    }

    /// Number of cached tables
    pub fn cached(&self) -> usize {
        self.cache.len()
    }
}

impl Default for MetadataResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for MetadataResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetadataResolver")
            .field("cached", &self.cache.len())
            .finish()
    }
}

/// Flatten `contract` and its ancestors into a property table.
///
/// The walk is depth-first and pre-order over declared parents, so the first
/// occurrence of a property name wins and diamonds are visited once.
/// Contracts for which `exclude` returns true are skipped together with their parents.
pub fn resolve(contract: &ContractDefinition, exclude: &ContractFilter) -> PropertyTable {
    let mut table = PropertyTable::new(contract.name());
    let mut shadowed = 0usize;

    contract.walk(&mut |node: &ContractDefinition| {
        if exclude(node) {
            return false;
        }
        for spec in node.properties() {
            if !table.insert_first(spec.to_descriptor()) {
                shadowed += 1;
            }
        }
        true
    });

    debug!(
        "Resolved contract {}: {} properties ({} shadowed)",
        contract.name(),
        table.len(),
        shadowed
    );
    table
}
