//! Contract metadata: declarations, descriptors and the resolver

mod contract;
mod descriptor;
mod resolver;
mod table;

pub use contract::{ContractBuilder, ContractDefinition};
pub use descriptor::{PropertyDescriptor, PropertySpec};
pub use resolver::{resolve, skip_infrastructure, ContractFilter, ContractKey, MetadataResolver};
pub use table::PropertyTable;

pub(crate) use table::property_key;
