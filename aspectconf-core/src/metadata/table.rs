//! Flattened, immutable property table of a contract

use super::PropertyDescriptor;
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// Case-insensitive lookup key for property names
pub(crate) fn property_key(name: &str) -> String {
    name.to_ascii_lowercase()
}

/// Name → descriptor map for one contract, shared by every instance of it
#[derive(Debug, Default)]
pub struct PropertyTable {
    contract: String,
    descriptors: FxHashMap<String, Arc<PropertyDescriptor>>,
    order: Vec<Arc<PropertyDescriptor>>,
}

impl PropertyTable {
    pub(crate) fn new(contract: impl Into<String>) -> Self {
        Self {
            contract: contract.into(),
            descriptors: FxHashMap::default(),
            order: Vec::new(),
        }
    }

    /// Insert unless a property with the same (case-insensitive) name exists.
    /// Returns whether the descriptor was added.
    pub(crate) fn insert_first(&mut self, descriptor: PropertyDescriptor) -> bool {
        let key = property_key(descriptor.name());
        if self.descriptors.contains_key(&key) {
            return false;
        }
        let descriptor = Arc::new(descriptor);
        self.descriptors.insert(key, Arc::clone(&descriptor));
        self.order.push(descriptor);
        true
    }

    /// Name of the contract the table was resolved from
    pub fn contract(&self) -> &str {
        &self.contract
    }

    pub fn get(&self, name: &str) -> Option<&Arc<PropertyDescriptor>> {
        self.descriptors.get(&property_key(name))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.descriptors.contains_key(&property_key(name))
    }

    /// Descriptors in resolution order
    pub fn iter(&self) -> impl Iterator<Item = &Arc<PropertyDescriptor>> {
        self.order.iter()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(|d| d.name())
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}
