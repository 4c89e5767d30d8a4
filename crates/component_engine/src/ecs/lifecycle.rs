//! Component lifecycle
//!
//! An entity's components are built the first time it is ticked: every
//! attached import path is loaded, its declared defaults are merged with the
//! entity's stored overrides and a fresh behavior is started with the result.
//! The started list is cached on the entity so later ticks only run updates.
//! Construction is all or nothing; if any component fails the entity is
//! marked failed and none of its components run until it is reset.

use super::arguments::{merge_arguments, ArgumentError, ArgumentGroup, ArgumentStore};
use super::component::{BehaviorError, BehaviorType, ComponentInstance};
use super::entity::{ComponentSlot, Entity};
use super::loader::{ComponentLoader, HostEnvironment, LoadError};
use super::scheduler::TickInfo;
use crate::core::config::{FailurePolicy, ParsePolicy, RuntimeConfig};
use thiserror::Error;

/// Lifecycle errors
#[derive(Error, Debug)]
pub enum LifecycleError {
    /// Import path could not be resolved
    #[error("cannot load component {path:?}: {source}")]
    Load {
        /// Import path
        path: String,
        /// Loader failure
        #[source]
        source: LoadError,
    },

    /// Stored arguments could not be grouped or merged
    #[error(transparent)]
    Arguments(#[from] ArgumentError),

    /// Start hook failed
    #[error("component {path:?} failed to start: {source}")]
    Start {
        /// Import path
        path: String,
        /// Hook failure
        #[source]
        source: BehaviorError,
    },

    /// Update hook failed
    #[error("component {path:?} failed to update: {source}")]
    Update {
        /// Import path
        path: String,
        /// Hook failure
        #[source]
        source: BehaviorError,
    },
}

/// Outcome of one update pass over an entity
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct UpdateSummary {
    /// Hooks that returned successfully
    pub updated: usize,
    /// Hooks that failed and were isolated
    pub failed: usize,
}

/// Starts, updates and resets entity components
#[derive(Debug)]
pub struct ComponentLifecycleManager {
    loader: ComponentLoader,
    arguments: ArgumentStore,
    host: HostEnvironment,
    failure_policy: FailurePolicy,
    parse_policy: ParsePolicy,
    tick: TickInfo,
}

impl ComponentLifecycleManager {
    /// Create a manager using the configured naming convention and policies
    pub fn new(loader: ComponentLoader, config: &RuntimeConfig) -> Self {
        Self {
            loader,
            arguments: ArgumentStore::new(config.naming.clone()),
            host: HostEnvironment::runtime(),
            failure_policy: config.failure_policy,
            parse_policy: config.parse_policy,
            tick: TickInfo {
                frame: 0,
                tick_duration: config.tick_duration(),
            },
        }
    }

    /// Set the host environment components are loaded with
    pub fn with_host(mut self, host: HostEnvironment) -> Self {
        self.host = host;
        self
    }

    /// Argument naming
    pub fn arguments(&self) -> &ArgumentStore {
        &self.arguments
    }

    /// Component loader
    pub fn loader(&self) -> &ComponentLoader {
        &self.loader
    }

    /// Mutable component loader
    pub fn loader_mut(&mut self) -> &mut ComponentLoader {
        &mut self.loader
    }

    /// Hook failure policy
    pub fn failure_policy(&self) -> FailurePolicy {
        self.failure_policy
    }

    /// Malformed property policy
    pub fn parse_policy(&self) -> ParsePolicy {
        self.parse_policy
    }

    /// Tick handed to hooks
    pub fn current_tick(&self) -> TickInfo {
        self.tick
    }

    /// Record the tick about to run
    pub fn begin_tick(&mut self, tick: TickInfo) {
        self.tick = tick;
    }

    /// Attached import paths: manifest order, then paths only found in
    /// stored arguments
    pub fn component_paths(&self, entity: &Entity) -> Result<Vec<String>, ArgumentError> {
        self.arguments
            .component_paths(entity.properties(), self.parse_policy)
            .map(|(paths, _)| paths)
    }

    /// Whether the entity has anything for this manager to do
    pub fn has_component_data(&self, entity: &Entity) -> bool {
        self.arguments.has_component_data(entity.properties())
    }

    /// Build and start the entity's components unless already done
    ///
    /// Returns `true` if components were started by this call. Entities that
    /// are live or failed are left untouched.
    pub fn ensure_initialized(&mut self, entity: &mut Entity) -> Result<bool, LifecycleError> {
        if !matches!(entity.components, ComponentSlot::Uninitialized) {
            return Ok(false);
        }
        match self.build(entity) {
            Ok(instances) => {
                log::debug!("Started {} component(s) on {:?}", instances.len(), entity.name());
                entity.components = ComponentSlot::Live(instances);
                Ok(true)
            }
            Err(err) => {
                entity.components = ComponentSlot::Failed;
                Err(err)
            }
        }
    }

    fn build(&mut self, entity: &mut Entity) -> Result<Vec<ComponentInstance>, LifecycleError> {
        let (paths, groups) = self
            .arguments
            .component_paths(entity.properties(), self.parse_policy)?;
        let mut instances = Vec::with_capacity(paths.len());
        for path in &paths {
            instances.push(self.start_instance(entity, path, groups.get(path))?);
        }
        Ok(instances)
    }

    /// Load, merge and start one component without attaching it
    pub(crate) fn start_instance(
        &mut self,
        entity: &mut Entity,
        path: &str,
        stored: Option<&ArgumentGroup>,
    ) -> Result<ComponentInstance, LifecycleError> {
        let behavior_type = self
            .loader
            .load(path, &self.host)
            .map_err(|source| LifecycleError::Load {
                path: path.to_string(),
                source,
            })?;
        self.instantiate(entity, path, behavior_type.as_ref(), stored)
    }

    /// Merge and start one component of an already resolved type
    pub(crate) fn instantiate(
        &self,
        entity: &mut Entity,
        path: &str,
        behavior_type: &dyn BehaviorType,
        stored: Option<&ArgumentGroup>,
    ) -> Result<ComponentInstance, LifecycleError> {
        let arguments = merge_arguments(path, &behavior_type.declared_defaults(), stored)?;
        let mut behavior = behavior_type.instantiate();
        behavior
            .start(&mut entity.context(&self.tick), &arguments)
            .map_err(|source| LifecycleError::Start {
                path: path.to_string(),
                source,
            })?;
        log::debug!("Started {path} on {:?}", entity.name());
        Ok(ComponentInstance::new(path, arguments, behavior))
    }

    /// Run every live component's update hook in list order
    ///
    /// Under [`FailurePolicy::FailFast`] the first failure is returned. Under
    /// [`FailurePolicy::IsolateAndContinue`] failures are logged and counted
    /// and the remaining hooks still run.
    pub fn update(&mut self, entity: &mut Entity) -> Result<UpdateSummary, LifecycleError> {
        let mut summary = UpdateSummary::default();
        let (mut ctx, slot) = entity.split(&self.tick);
        let ComponentSlot::Live(instances) = slot else {
            return Ok(summary);
        };

        for instance in instances.iter_mut() {
            match instance.behavior_mut().update(&mut ctx) {
                Ok(()) => summary.updated += 1,
                Err(source) => {
                    let err = LifecycleError::Update {
                        path: instance.import_path().to_string(),
                        source,
                    };
                    match self.failure_policy {
                        FailurePolicy::FailFast => return Err(err),
                        FailurePolicy::IsolateAndContinue => {
                            log::error!("{:?}: {err}", ctx.entity_name);
                            summary.failed += 1;
                        }
                    }
                }
            }
        }
        Ok(summary)
    }

    /// Drop the entity's components, or its failed marker, so the next
    /// [`ensure_initialized`](Self::ensure_initialized) rebuilds them
    pub fn reset(&self, entity: &mut Entity) {
        entity.reset_components();
    }
}
