//! Component argument storage
//!
//! Many components share one flat property list per entity. An argument is
//! stored as `<prefix><import-path><separator><argument-name>` and the ordered
//! list of attached import paths lives in the manifest property. This module
//! parses that key space back into per-component groups and merges stored
//! overrides with declared defaults.

use super::component::{ArgumentDefaults, Arguments};
use super::property::PropertyStore;
use crate::core::config::{NamingConvention, ParsePolicy};
use crate::value::{codec, union, CodecError};
use indexmap::IndexMap;
use thiserror::Error;

/// Stored argument text by argument name, in first-seen order
pub type ArgumentGroup = IndexMap<String, String>;

/// Argument groups by import path, in first-seen order
pub type ArgumentGroups = IndexMap<String, ArgumentGroup>;

const MANIFEST_SEPARATOR: char = ',';

/// Argument grouping and merging errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ArgumentError {
    /// Property carries the argument prefix but does not follow the convention
    #[error("malformed argument property {name:?}: {reason}")]
    Parse {
        /// Property name
        name: String,
        /// What is missing
        reason: &'static str,
    },

    /// Stored override for an argument the behavior does not declare
    #[error("component {component:?} declares no argument {argument:?}")]
    UnknownArgument {
        /// Import path
        component: String,
        /// Argument name
        argument: String,
    },

    /// Stored override does not decode as the declared kind
    #[error("argument {argument:?} of component {component:?}: {source}")]
    Codec {
        /// Import path
        component: String,
        /// Argument name
        argument: String,
        /// Decode failure
        #[source]
        source: CodecError,
    },
}

/// Parses and builds argument property names
#[derive(Debug, Clone, Default)]
pub struct ArgumentStore {
    naming: NamingConvention,
}

impl ArgumentStore {
    /// Create a store for a naming convention
    pub fn new(naming: NamingConvention) -> Self {
        Self { naming }
    }

    /// Naming convention in use
    pub fn naming(&self) -> &NamingConvention {
        &self.naming
    }

    /// Property name for one argument of one component
    pub fn property_name(&self, import_path: &str, argument: &str) -> String {
        format!("{}{argument}", self.component_prefix(import_path))
    }

    /// Name prefix shared by every argument of a component
    pub fn component_prefix(&self, import_path: &str) -> String {
        format!("{}{import_path}{}", self.naming.prefix, self.naming.separator)
    }

    /// Split a property name into `(import_path, argument)`
    ///
    /// Returns `Ok(None)` for names that are not argument properties.
    pub fn parse_name<'n>(&self, name: &'n str) -> Result<Option<(&'n str, &'n str)>, ArgumentError> {
        if name == self.naming.manifest_property || union::is_sibling_key(name) {
            return Ok(None);
        }
        let Some(rest) = name.strip_prefix(self.naming.prefix.as_str()) else {
            return Ok(None);
        };
        let parse_error = |reason| ArgumentError::Parse {
            name: name.to_string(),
            reason,
        };

        let (import_path, argument) = rest
            .rsplit_once(self.naming.separator.as_str())
            .ok_or_else(|| parse_error("separator missing"))?;
        if import_path.is_empty() {
            return Err(parse_error("empty import path"));
        }
        if argument.is_empty() {
            return Err(parse_error("empty argument name"));
        }
        Ok(Some((import_path, argument)))
    }

    /// Group argument properties by component, aborting on the first malformed name
    pub fn group(&self, properties: &PropertyStore) -> Result<ArgumentGroups, ArgumentError> {
        self.group_with(properties, ParsePolicy::Abort)
    }

    /// Group argument properties by component
    pub fn group_with(
        &self,
        properties: &PropertyStore,
        policy: ParsePolicy,
    ) -> Result<ArgumentGroups, ArgumentError> {
        let mut groups = ArgumentGroups::new();
        for (name, value) in properties.iter() {
            match self.parse_name(name) {
                Ok(Some((import_path, argument))) => {
                    groups
                        .entry(import_path.to_string())
                        .or_default()
                        .insert(argument.to_string(), value.to_string());
                }
                Ok(None) => {}
                Err(err) => match policy {
                    ParsePolicy::Abort => return Err(err),
                    ParsePolicy::SkipAndLog => log::warn!("Skipping property: {err}"),
                },
            }
        }
        Ok(groups)
    }

    /// Import paths listed in the manifest, in order
    pub fn manifest(&self, properties: &PropertyStore) -> Vec<String> {
        properties
            .get(&self.naming.manifest_property)
            .map(parse_manifest)
            .unwrap_or_default()
    }

    /// Overwrite the manifest; an empty list removes the property
    pub fn write_manifest(&self, properties: &mut PropertyStore, import_paths: &[String]) {
        if import_paths.is_empty() {
            properties.remove(&self.naming.manifest_property);
        } else {
            properties.set(
                self.naming.manifest_property.clone(),
                import_paths.join(&MANIFEST_SEPARATOR.to_string()),
            );
        }
    }

    /// Every attached import path: manifest order first, then paths that
    /// only appear through stored arguments
    pub fn component_paths(
        &self,
        properties: &PropertyStore,
        policy: ParsePolicy,
    ) -> Result<(Vec<String>, ArgumentGroups), ArgumentError> {
        let groups = self.group_with(properties, policy)?;
        let mut paths = self.manifest(properties);
        for import_path in groups.keys() {
            if !paths.contains(import_path) {
                paths.push(import_path.clone());
            }
        }
        Ok((paths, groups))
    }

    /// Whether an entity carries any component data
    pub fn has_component_data(&self, properties: &PropertyStore) -> bool {
        properties.names().any(|name| {
            name == self.naming.manifest_property || matches!(self.parse_name(name), Ok(Some(_)) | Err(_))
        })
    }

    /// Remove every argument property of a component, along with union
    /// sibling properties bound to those names
    pub fn remove_component_properties(&self, properties: &mut PropertyStore, import_path: &str) -> usize {
        let names: Vec<String> = properties
            .names()
            .filter(|name| matches!(self.parse_name(name), Ok(Some((path, _))) if path == import_path))
            .map(str::to_string)
            .collect();
        for name in &names {
            union::remove(properties, name);
        }
        names.len()
    }
}

fn parse_manifest(text: &str) -> Vec<String> {
    text.trim()
        .split(MANIFEST_SEPARATOR)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(str::to_string)
        .collect()
}

/// Merge declared defaults with stored overrides
///
/// Overrides are decoded as the declared kind and win over defaults. The
/// result follows declaration order.
pub fn merge_arguments(
    import_path: &str,
    defaults: &ArgumentDefaults,
    stored: Option<&ArgumentGroup>,
) -> Result<Arguments, ArgumentError> {
    let mut overrides = IndexMap::new();
    for (argument, text) in stored.into_iter().flatten() {
        let declared = defaults.get(argument).ok_or_else(|| ArgumentError::UnknownArgument {
            component: import_path.to_string(),
            argument: argument.clone(),
        })?;
        let value = codec::decode(declared.kind(), text, declared.choices()).map_err(|source| {
            ArgumentError::Codec {
                component: import_path.to_string(),
                argument: argument.clone(),
                source,
            }
        })?;
        overrides.insert(argument.as_str(), value);
    }

    let mut arguments = Arguments::new();
    for (name, declared) in defaults.iter() {
        let value = overrides
            .swap_remove(name)
            .unwrap_or_else(|| declared.value().clone());
        arguments.insert(name, value);
    }
    Ok(arguments)
}
