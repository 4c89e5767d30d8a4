//! # Runtime Configuration
//!
//! Configuration for the component runtime: the logic rate that fixes the
//! simulation tick, the property naming convention that multiplexes component
//! arguments into an entity's flat property list, and the failure policies the
//! loop applies when a component misbehaves.
//!
//! All fields have defaults, so a config file only needs the values it
//! changes:
//!
//! ```toml
//! logic_rate = 30
//! failure_policy = "fail_fast"
//!
//! [naming]
//! prefix = "@"
//! ```

use serde::{Serialize, Deserialize};

pub use crate::config::{Config, ConfigError};

/// What the loop does when a start or update hook fails
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailurePolicy {
    /// Abort the current pass and return the error
    FailFast,
    /// Log the error and carry on with the next component and entity
    IsolateAndContinue,
}

/// What argument grouping does with a property that looks like an argument
/// but cannot be parsed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsePolicy {
    /// Stop the scan and return the parse error
    Abort,
    /// Log a warning and ignore the property
    SkipAndLog,
}

/// # Naming Convention
///
/// Component arguments are stored as entity properties named
/// `<prefix><import-path><separator><argument-name>`. The ordered list of
/// attached import paths lives in the `manifest_property`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingConvention {
    /// Tag that marks a property as a component argument
    pub prefix: String,
    /// Separator between the import path and the argument name
    pub separator: String,
    /// Property holding the comma separated list of attached import paths
    pub manifest_property: String,
}

impl NamingConvention {
    /// Create a convention with the default manifest property
    pub fn new(prefix: impl Into<String>, separator: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            separator: separator.into(),
            ..Self::default()
        }
    }

    /// Set the manifest property name
    pub fn with_manifest_property(mut self, name: impl Into<String>) -> Self {
        self.manifest_property = name.into();
        self
    }

    /// Validate the convention
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.prefix.is_empty() {
            return Err(ConfigError::Invalid("argument prefix cannot be empty".to_string()));
        }
        if self.separator.is_empty() {
            return Err(ConfigError::Invalid("naming separator cannot be empty".to_string()));
        }
        if self.separator.contains('.') {
            return Err(ConfigError::Invalid(format!(
                "naming separator {:?} collides with the import path separator '.'",
                self.separator
            )));
        }
        if self.manifest_property.is_empty() {
            return Err(ConfigError::Invalid("manifest property name cannot be empty".to_string()));
        }
        if self.manifest_property.starts_with(&self.prefix) {
            return Err(ConfigError::Invalid(format!(
                "manifest property {:?} would be parsed as a component argument",
                self.manifest_property
            )));
        }
        Ok(())
    }
}

impl Default for NamingConvention {
    fn default() -> Self {
        Self {
            prefix: "$".to_string(),
            separator: ":".to_string(),
            manifest_property: "_component_paths".to_string(),
        }
    }
}

/// # Runtime Configuration
///
/// Top-level configuration for the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RuntimeConfig {
    /// Simulation ticks per second
    pub logic_rate: u32,
    /// Property naming convention
    pub naming: NamingConvention,
    /// Hook failure handling
    pub failure_policy: FailurePolicy,
    /// Malformed argument property handling
    pub parse_policy: ParsePolicy,
    /// Fallback log level when `RUST_LOG` is unset
    pub log_level: String,
}

impl RuntimeConfig {
    /// Create a configuration with defaults
    pub fn new() -> Self {
        Self {
            logic_rate: 60,
            naming: NamingConvention::default(),
            failure_policy: FailurePolicy::IsolateAndContinue,
            parse_policy: ParsePolicy::SkipAndLog,
            log_level: "info".to_string(),
        }
    }

    /// Set the logic rate
    pub fn with_logic_rate(mut self, rate: u32) -> Self {
        self.logic_rate = rate;
        self
    }

    /// Set the naming convention
    pub fn with_naming(mut self, naming: NamingConvention) -> Self {
        self.naming = naming;
        self
    }

    /// Set the failure policy
    pub fn with_failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.failure_policy = policy;
        self
    }

    /// Set the parse policy
    pub fn with_parse_policy(mut self, policy: ParsePolicy) -> Self {
        self.parse_policy = policy;
        self
    }

    /// Duration of one simulation tick in seconds
    pub fn tick_duration(&self) -> f64 {
        1.0 / f64::from(self.logic_rate.max(1))
    }

    /// Validate the entire configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.logic_rate == 0 {
            return Err(ConfigError::Invalid("logic rate must be at least 1".to_string()));
        }
        self.naming.validate()
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new()
    }
}

impl Config for RuntimeConfig {}
