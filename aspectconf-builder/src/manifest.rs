//! Declarative contract manifests
//!
//! A manifest declares contracts without Rust types, for configuration objects
//! assembled at runtime. Example:
//!
//! ```toml
//! [[contracts]]
//! name = "IPerson"
//! extends = ["IDefaultValue", "ITransaction"]
//!
//! [[contracts.properties]]
//! name = "Age"
//! type = "integer"
//! default = 21
//! tags = ["Expert"]
//!
//! [[contracts.properties]]
//! name = "FirstName"
//! type = "string"
//! tags = [{ name = "Tag1", value = "Robin" }]
//! ```
//!
//! `extends` may name other contracts of the same manifest or the built-in
//! infrastructure contracts (`IDefaultValue`, `ITransaction`, ...).

use crate::registry::ExtensionRegistry;
use aspectconf_core::{ContractDefinition, Error, PropertySpec, Result, Value, ValueType};
use aspectconf_extensions::contracts;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

/// A set of contract declarations
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ContractManifest {
    /// Declared contracts
    #[serde(default)]
    pub contracts: Vec<ContractEntry>,
}

/// One declared contract
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContractEntry {
    /// Contract name
    pub name: String,
    /// Parent contract names
    #[serde(default)]
    pub extends: Vec<String>,
    /// Capability markers declared directly
    #[serde(default)]
    pub capabilities: Vec<String>,
    /// Method names declared directly
    #[serde(default)]
    pub methods: Vec<String>,
    /// Whether the contract's properties are skipped by the resolver
    #[serde(default)]
    pub infrastructure: bool,
    /// Declared properties
    #[serde(default)]
    pub properties: Vec<PropertyEntry>,
}

/// One declared property
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PropertyEntry {
    /// Property name
    pub name: String,
    /// Declared type
    #[serde(rename = "type", default = "default_type")]
    pub value_type: ValueType,
    /// Default value, converted to `value_type` at initialization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    /// Description text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Category
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    /// Hidden from backing-store readers
    #[serde(default)]
    pub suppress_read: bool,
    /// Hidden from backing-store writers
    #[serde(default)]
    pub suppress_write: bool,
    /// Name used by backing stores
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rename: Option<String>,
    /// Name of a registered converter
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub converter: Option<String>,
    /// Suppress initialization errors for this property
    #[serde(default)]
    pub ignore_errors: bool,
    /// Tags, bare or with a value
    #[serde(default)]
    pub tags: Vec<TagEntry>,
}

fn default_type() -> ValueType {
    ValueType::String
}

/// A tag, either bare (`"Expert"`) or with a value (`{ name = "Tag1", value = "Robin" }`)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum TagEntry {
    /// Tag without a value
    Bare(String),
    /// Tag carrying a value
    Valued {
        /// Tag key
        name: String,
        /// Tag value
        value: Value,
    },
}

impl ContractManifest {
    /// Load a manifest from TOML
    pub fn from_toml(toml_str: &str) -> Result<Self> {
        toml::from_str(toml_str)
            .map_err(|e| Error::Manifest(format!("Failed to parse TOML: {}", e)))
    }

    /// Load a manifest from JSON
    pub fn from_json(json_str: &str) -> Result<Self> {
        serde_json::from_str(json_str)
            .map_err(|e| Error::Manifest(format!("Failed to parse JSON: {}", e)))
    }

    /// Load a manifest from a `.toml` or `.json` file
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| Error::Manifest(format!("Failed to read {}: {}", path.display(), e)))?;
        match path.extension().and_then(|ext| ext.to_str()) {
            Some(ext) if ext.eq_ignore_ascii_case("json") => Self::from_json(&text),
            Some(ext) if ext.eq_ignore_ascii_case("toml") => Self::from_toml(&text),
            _ => Err(Error::Manifest(format!(
                "{}: expected a .toml or .json file",
                path.display()
            ))),
        }
    }

    /// Serialize the manifest as TOML
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Manifest(format!("Failed to write TOML: {}", e)))
    }

    /// Build every declared contract, keyed by lower-cased name.
    ///
    /// Parents may be declared anywhere in the manifest or be built-in
    /// infrastructure contracts. Unknown parents and inheritance cycles are
    /// rejected with [`Error::InvalidContract`].
    pub fn definitions(
        &self,
        registry: &ExtensionRegistry,
    ) -> Result<FxHashMap<String, Arc<ContractDefinition>>> {
        let mut entries = FxHashMap::default();
        for entry in &self.contracts {
            if entries
                .insert(entry.name.to_ascii_lowercase(), entry)
                .is_some()
            {
                return Err(Error::InvalidContract(format!(
                    "contract '{}' declared twice",
                    entry.name
                )));
            }
        }

        let mut built = FxHashMap::default();
        for entry in &self.contracts {
            let mut visiting = FxHashSet::default();
            build_entry(entry, &entries, registry, &mut built, &mut visiting)?;
        }
        debug!("Built {} contracts from manifest", built.len());
        Ok(built)
    }

    /// Build the contract named `name`
    pub fn definition(
        &self,
        name: &str,
        registry: &ExtensionRegistry,
    ) -> Result<Arc<ContractDefinition>> {
        self.definitions(registry)?
            .remove(&name.to_ascii_lowercase())
            .ok_or_else(|| Error::InvalidContract(format!("no contract named '{}'", name)))
    }
}

fn build_entry(
    entry: &ContractEntry,
    entries: &FxHashMap<String, &ContractEntry>,
    registry: &ExtensionRegistry,
    built: &mut FxHashMap<String, Arc<ContractDefinition>>,
    visiting: &mut FxHashSet<String>,
) -> Result<Arc<ContractDefinition>> {
    let key = entry.name.to_ascii_lowercase();
    if let Some(done) = built.get(&key) {
        return Ok(Arc::clone(done));
    }
    if !visiting.insert(key.clone()) {
        return Err(Error::InvalidContract(format!(
            "inheritance cycle through '{}'",
            entry.name
        )));
    }

    let mut builder = ContractDefinition::builder(entry.name.as_str());
    for parent in &entry.extends {
        let parent = match entries.get(&parent.to_ascii_lowercase()) {
            Some(parent_entry) => build_entry(parent_entry, entries, registry, built, visiting)?,
            None => builtin_contract(parent).ok_or_else(|| {
                Error::InvalidContract(format!(
                    "{}: unknown parent contract '{}'",
                    entry.name, parent
                ))
            })?,
        };
        builder = builder.extends(parent);
    }
    for capability in &entry.capabilities {
        builder = builder.capability(capability.as_str());
    }
    for method in &entry.methods {
        builder = builder.method(method.as_str());
    }
    if entry.infrastructure {
        builder = builder.infrastructure();
    }
    for property in &entry.properties {
        builder = builder.property(property_spec(property, registry)?);
    }

    let definition = builder.build()?;
    visiting.remove(&key);
    built.insert(key, Arc::clone(&definition));
    Ok(definition)
}

fn property_spec(entry: &PropertyEntry, registry: &ExtensionRegistry) -> Result<PropertySpec> {
    let mut spec = PropertySpec::new(entry.name.as_str(), entry.value_type);
    if let Some(default) = &entry.default {
        spec = spec.default(default.clone());
    }
    if let Some(description) = &entry.description {
        spec = spec.description(description.as_str());
    }
    if let Some(category) = &entry.category {
        spec = spec.category(category.as_str());
    }
    for tag in &entry.tags {
        spec = match tag {
            TagEntry::Bare(name) => spec.tag(name.as_str()),
            TagEntry::Valued { name, value } => spec.tag_value(name.as_str(), value.clone()),
        };
    }
    if entry.suppress_read {
        spec = spec.suppress_read();
    }
    if entry.suppress_write {
        spec = spec.suppress_write();
    }
    if let Some(rename) = &entry.rename {
        spec = spec.rename(rename.as_str());
    }
    if let Some(name) = &entry.converter {
        spec = spec.converter(registry.converter(name).map_err(|_| {
            Error::InvalidContract(format!(
                "{}: unknown converter '{}'",
                entry.name, name
            ))
        })?);
    }
    if entry.ignore_errors {
        spec = spec.ignore_errors();
    }
    Ok(spec)
}

fn builtin_contract(name: &str) -> Option<Arc<ContractDefinition>> {
    [
        contracts::default_value_contract(),
        contracts::description_contract(),
        contracts::write_protect_contract(),
        contracts::transaction_contract(),
        contracts::has_changes_contract(),
        contracts::notify_changing_contract(),
        contracts::notify_changed_contract(),
    ]
    .into_iter()
    .find(|contract| contract.name().eq_ignore_ascii_case(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use aspectconf_core::metadata::{resolve, skip_infrastructure};

    const PERSON: &str = r#"
[[contracts]]
name = "IBase"

[[contracts.properties]]
name = "Id"
type = "integer"

[[contracts]]
name = "IPerson"
extends = ["IBase", "IDefaultValue", "IDescription"]
methods = ["Describe"]

[[contracts.properties]]
name = "Age"
type = "integer"
default = 21
description = "Age in years"
tags = ["Expert"]

[[contracts.properties]]
name = "FirstName"
tags = [{ name = "Tag1", value = "Robin" }]

[[contracts.properties]]
name = "Aliases"
type = "list"
converter = "separated-list"
rename = "aka"
"#;

    #[test]
    fn test_parse_toml() {
        let manifest = ContractManifest::from_toml(PERSON).unwrap();
        assert_eq!(manifest.contracts.len(), 2);
        let person = &manifest.contracts[1];
        assert_eq!(person.properties[0].default, Some(Value::Integer(21)));
        assert_eq!(person.properties[1].value_type, ValueType::String);
        assert!(matches!(
            &person.properties[1].tags[0],
            TagEntry::Valued { name, value } if name == "Tag1" && *value == Value::from("Robin")
        ));
    }

    #[test]
    fn test_definitions_resolve_parents() {
        let registry = ExtensionRegistry::with_defaults();
        let manifest = ContractManifest::from_toml(PERSON).unwrap();
        let person = manifest.definition("iperson", &registry).unwrap();

        assert_eq!(
            person.all_capabilities(),
            vec!["DefaultValue".to_string(), "Description".to_string()]
        );
        assert!(person.declares_method("RestoreToDefault"));
        assert!(person.declares_method("Describe"));

        let table = resolve(&person, &skip_infrastructure);
        let names: Vec<&str> = table.names().collect();
        assert_eq!(names, vec!["Age", "FirstName", "Aliases", "Id"]);
        let aliases = table.get("Aliases").unwrap();
        assert_eq!(aliases.external_name(), "aka");
        assert_eq!(
            aliases.coerce(&Value::from("a;b")).unwrap(),
            Value::List(vec![Value::from("a"), Value::from("b")])
        );
    }

    #[test]
    fn test_parse_json() {
        let manifest = ContractManifest::from_json(
            r#"{"contracts":[{"name":"IFlags","properties":[{"name":"On","type":"boolean","default":true}]}]}"#,
        )
        .unwrap();
        let registry = ExtensionRegistry::with_defaults();
        let flags = manifest.definition("IFlags", &registry).unwrap();
        assert_eq!(flags.properties()[0].name(), "On");
    }

    #[test]
    fn test_unknown_parent_and_cycle() {
        let registry = ExtensionRegistry::with_defaults();
        let unknown = ContractManifest::from_toml(
            "[[contracts]]\nname = \"IA\"\nextends = [\"IMissing\"]\n",
        )
        .unwrap();
        assert!(matches!(
            unknown.definitions(&registry),
            Err(Error::InvalidContract(_))
        ));

        let cycle = ContractManifest::from_toml(
            "[[contracts]]\nname = \"IA\"\nextends = [\"IB\"]\n\n[[contracts]]\nname = \"IB\"\nextends = [\"IA\"]\n",
        )
        .unwrap();
        let err = cycle.definitions(&registry).unwrap_err();
        assert!(err.to_string().contains("cycle"));
    }

    #[test]
    fn test_unknown_converter() {
        let registry = ExtensionRegistry::with_defaults();
        let manifest = ContractManifest::from_toml(
            "[[contracts]]\nname = \"IA\"\n\n[[contracts.properties]]\nname = \"L\"\nconverter = \"csv\"\n",
        )
        .unwrap();
        assert!(manifest.definitions(&registry).is_err());
    }

    #[test]
    fn test_malformed_input() {
        assert!(matches!(
            ContractManifest::from_toml("contracts = 5"),
            Err(Error::Manifest(_))
        ));
        assert!(matches!(
            ContractManifest::from_json("{"),
            Err(Error::Manifest(_))
        ));
    }

    #[test]
    fn test_from_path_and_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("person.toml");
        std::fs::write(&path, PERSON).unwrap();

        let manifest = ContractManifest::from_path(&path).unwrap();
        let reparsed = ContractManifest::from_toml(&manifest.to_toml().unwrap()).unwrap();
        assert_eq!(reparsed.contracts.len(), 2);
        assert_eq!(reparsed.contracts[1].properties.len(), 3);

        let other = dir.path().join("person.yaml");
        std::fs::write(&other, "").unwrap();
        assert!(ContractManifest::from_path(&other).is_err());
    }
}
