//! Editor operations on an entity's component set
//!
//! Adding a component appends it to the manifest and writes every declared
//! default as a bound union property, so a host editor can present typed
//! fields. Removing a component clears its manifest entry, argument
//! properties and union kind tags. Reloading re-resolves the behavior type
//! and reconciles stored arguments with the new declarations. Changes to a
//! live entity are applied to its component list in place.

use super::arguments::{ArgumentError, ArgumentGroup, ArgumentStore};
use super::component::{ArgumentDefaults, BehaviorType, ComponentInstance};
use super::entity::{ComponentSlot, Entity};
use super::lifecycle::{ComponentLifecycleManager, LifecycleError};
use super::loader::{HostEnvironment, LoadError};
use super::property::PropertyStore;
use crate::value::{codec, union, UnionError, UnionValue};
use std::rc::Rc;
use thiserror::Error;

/// Editor errors
#[derive(Error, Debug)]
pub enum EditorError {
    /// Component is already part of the entity
    #[error("{entity:?} already has component {path:?}")]
    AlreadyAttached {
        /// Entity name
        entity: String,
        /// Import path
        path: String,
    },

    /// Component is not part of the entity
    #[error("{entity:?} has no component {path:?}")]
    NotAttached {
        /// Entity name
        entity: String,
        /// Import path
        path: String,
    },

    /// Behavior type could not be resolved
    #[error(transparent)]
    Load(#[from] LoadError),

    /// Stored arguments could not be parsed
    #[error(transparent)]
    Arguments(#[from] ArgumentError),

    /// Argument property could not be written
    #[error(transparent)]
    Union(#[from] UnionError),

    /// Live component could not be started
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),
}

/// Add, remove and reload components on entities
pub struct ComponentEditor<'m> {
    manager: &'m mut ComponentLifecycleManager,
    host: HostEnvironment,
}

impl<'m> ComponentEditor<'m> {
    /// Editor resolving behaviors in a sandboxed host environment
    pub fn new(manager: &'m mut ComponentLifecycleManager) -> Self {
        Self {
            manager,
            host: HostEnvironment::sandbox(),
        }
    }

    /// Resolve behaviors with another host environment
    pub fn with_host(mut self, host: HostEnvironment) -> Self {
        self.host = host;
        self
    }

    /// Declared default arguments of a behavior type
    pub fn describe(&mut self, path: &str) -> Result<ArgumentDefaults, EditorError> {
        Ok(self.load(path)?.declared_defaults())
    }

    /// Attach a component and write its default arguments
    ///
    /// On a live entity the component is started right away. If it fails to
    /// start, the entity's properties are restored and the error is returned.
    pub fn add_component(&mut self, entity: &mut Entity, path: &str) -> Result<(), EditorError> {
        let behavior_type = self.load(path)?;
        let mut paths = self.manager.component_paths(entity)?;
        if paths.iter().any(|attached| attached == path) {
            return Err(EditorError::AlreadyAttached {
                entity: entity.name().to_string(),
                path: path.to_string(),
            });
        }
        paths.push(path.to_string());

        let started = restore_on_error(entity, |entity| {
            let store = self.manager.arguments();
            let stored = self.stored_arguments(entity, path)?;
            write_arguments(
                store,
                entity.properties_mut(),
                path,
                &behavior_type.declared_defaults(),
                stored.as_ref(),
            )?;
            store.write_manifest(entity.properties_mut(), &paths);
            self.start_if_live(entity, path, behavior_type.as_ref())
        })?;
        log::debug!("Added {path} to {:?}", entity.name());

        match started {
            Some(instance) => {
                if let ComponentSlot::Live(instances) = &mut entity.components {
                    instances.push(instance);
                }
            }
            None => entity.reset_components(),
        }
        Ok(())
    }

    /// Detach a component and delete its argument properties
    pub fn remove_component(&mut self, entity: &mut Entity, path: &str) -> Result<(), EditorError> {
        let mut paths = self.manager.component_paths(entity)?;
        let Some(index) = paths.iter().position(|attached| attached == path) else {
            return Err(EditorError::NotAttached {
                entity: entity.name().to_string(),
                path: path.to_string(),
            });
        };
        paths.remove(index);

        let store = self.manager.arguments();
        store.write_manifest(entity.properties_mut(), &paths);
        let removed = store.remove_component_properties(entity.properties_mut(), path);
        log::debug!("Removed {path} from {:?} with {removed} argument(s)", entity.name());

        if entity.is_failed() {
            entity.reset_components();
        }
        if let ComponentSlot::Live(instances) = &mut entity.components {
            instances.retain(|instance| instance.import_path() != path);
        }
        Ok(())
    }

    /// Re-resolve a component and reconcile its arguments with the new
    /// declarations
    ///
    /// Stored values of arguments that are still declared with a compatible
    /// kind are kept, new arguments get their defaults and arguments that are
    /// no longer declared are deleted. A live instance is replaced at the same
    /// position in the component list. If the replacement fails to start, the
    /// properties are restored and the old instance keeps running.
    pub fn reload_component(&mut self, entity: &mut Entity, path: &str) -> Result<(), EditorError> {
        let paths = self.manager.component_paths(entity)?;
        if !paths.iter().any(|attached| attached == path) {
            return Err(EditorError::NotAttached {
                entity: entity.name().to_string(),
                path: path.to_string(),
            });
        }

        let behavior_type = self.load(path)?;
        let started = restore_on_error(entity, |entity| {
            let defaults = behavior_type.declared_defaults();
            let store = self.manager.arguments();
            let stored = self.stored_arguments(entity, path)?;
            for argument in stored.iter().flat_map(|group| group.keys()) {
                if !defaults.contains(argument) {
                    union::remove(entity.properties_mut(), &store.property_name(path, argument));
                }
            }
            write_arguments(store, entity.properties_mut(), path, &defaults, stored.as_ref())?;
            self.start_if_live(entity, path, behavior_type.as_ref())
        })?;
        log::debug!("Reloaded {path} on {:?}", entity.name());

        match started {
            Some(instance) => {
                if let ComponentSlot::Live(instances) = &mut entity.components {
                    match instances.iter().position(|live| live.import_path() == path) {
                        Some(index) => instances[index] = instance,
                        None => instances.push(instance),
                    }
                }
            }
            None => entity.reset_components(),
        }
        Ok(())
    }

    // Start a new instance when the entity already runs its components
    fn start_if_live(
        &self,
        entity: &mut Entity,
        path: &str,
        behavior_type: &dyn BehaviorType,
    ) -> Result<Option<ComponentInstance>, EditorError> {
        if !entity.is_initialized() {
            return Ok(None);
        }
        let stored = self.stored_arguments(entity, path)?;
        let instance = self.manager.instantiate(entity, path, behavior_type, stored.as_ref())?;
        Ok(Some(instance))
    }

    fn load(&mut self, path: &str) -> Result<Rc<dyn BehaviorType>, LoadError> {
        self.manager.loader_mut().load(path, &self.host)
    }

    fn stored_arguments(&self, entity: &Entity, path: &str) -> Result<Option<ArgumentGroup>, ArgumentError> {
        let mut groups = self
            .manager
            .arguments()
            .group_with(entity.properties(), self.manager.parse_policy())?;
        Ok(groups.swap_remove(path))
    }
}

// Run a property edit, putting the properties back as they were if it fails.
fn restore_on_error<T>(
    entity: &mut Entity,
    edit: impl FnOnce(&mut Entity) -> Result<T, EditorError>,
) -> Result<T, EditorError> {
    let snapshot = entity.properties().clone();
    match edit(&mut *entity) {
        Ok(value) => Ok(value),
        Err(err) => {
            *entity.properties_mut() = snapshot;
            Err(err)
        }
    }
}

// Write every declared argument as a bound union. A stored value is kept when
// it still decodes as the declared kind; otherwise the default is written.
fn write_arguments(
    store: &ArgumentStore,
    properties: &mut PropertyStore,
    path: &str,
    defaults: &ArgumentDefaults,
    stored: Option<&ArgumentGroup>,
) -> Result<(), UnionError> {
    for (argument, declared) in defaults.iter() {
        let name = store.property_name(path, argument);
        let kept = stored
            .and_then(|group| group.get(argument))
            .and_then(|text| codec::decode(declared.kind(), text, declared.choices()).ok());

        if declared.choices().is_none() {
            properties.remove(&union::choices_key(&name));
        }
        let mut value = UnionValue::new(name.as_str(), properties);
        value.reset();
        if let Some(choices) = declared.choices() {
            value.set_choices(choices);
        }
        value.set(kept.unwrap_or_else(|| declared.value().clone()))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::RuntimeConfig;
    use crate::ecs::loader::{ComponentLoader, Module, ModuleRegistry};
    use crate::ecs::scene::Scene;
    use crate::ecs::testing::{self, drain, path, recorder, Fault, Journal, MODULE};
    use crate::value::{Value, ValueKind};
    use std::cell::RefCell;

    fn manager_over(registry: Rc<RefCell<ModuleRegistry>>) -> ComponentLifecycleManager {
        ComponentLifecycleManager::new(ComponentLoader::new(registry), &RuntimeConfig::default())
            .with_host(HostEnvironment::sandbox())
    }

    fn manager(journal: &Journal) -> ComponentLifecycleManager {
        manager_over(Rc::new(RefCell::new(testing::registry(journal))))
    }

    fn arg(member: &str, argument: &str) -> String {
        format!("${}:{argument}", path(member))
    }

    #[test]
    fn test_describe_lists_defaults() {
        let journal = testing::journal();
        let mut manager = manager(&journal);
        let defaults = ComponentEditor::new(&mut manager)
            .describe(&path("Spinner"))
            .expect("describe");
        let names: Vec<_> = defaults.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["rate", "mode"]);
        assert!(manager.loader().cache().is_empty());
    }

    #[test]
    fn test_add_writes_typed_defaults() {
        let journal = testing::journal();
        let mut manager = manager(&journal);
        let mut scene = Scene::new("s");
        let id = scene.spawn("ship");
        let entity = scene.get_mut(id).expect("spawned");

        let mut editor = ComponentEditor::new(&mut manager);
        editor.add_component(entity, &path("Mover")).expect("add");
        editor.add_component(entity, &path("Spinner")).expect("add");

        let props = entity.properties();
        assert_eq!(
            props.get("_component_paths"),
            Some(format!("{},{}", path("Mover"), path("Spinner")).as_str())
        );
        assert_eq!(props.get(&arg("Mover", "speed")), Some("1.0"));
        assert_eq!(props.get(&union::kind_key(&arg("Mover", "speed"))), Some("float"));
        assert_eq!(props.get(&arg("Mover", "name")), Some("\"bot\""));
        assert_eq!(props.get(&union::choices_key(&arg("Spinner", "mode"))), Some("[\"slow\",\"fast\"]"));

        let mode = entity.union(arg("Spinner", "mode"));
        assert_eq!(mode.get(), Ok((ValueKind::Choice, Value::choice("slow"))));
        assert!(!entity.is_initialized());
        assert!(drain(&journal).is_empty());
    }

    #[test]
    fn test_add_twice_is_rejected() {
        let journal = testing::journal();
        let mut manager = manager(&journal);
        let mut scene = Scene::new("s");
        let id = scene.spawn("ship");
        let entity = scene.get_mut(id).expect("spawned");

        let mut editor = ComponentEditor::new(&mut manager);
        editor.add_component(entity, &path("Mover")).expect("add");
        assert!(matches!(
            editor.add_component(entity, &path("Mover")),
            Err(EditorError::AlreadyAttached { .. })
        ));
        assert!(matches!(
            editor.add_component(entity, "test.behaviors.Nope"),
            Err(EditorError::Load(LoadError::MemberNotFound { .. }))
        ));
    }

    #[test]
    fn test_add_to_live_entity_starts_component() {
        let journal = testing::journal();
        let mut manager = manager(&journal);
        let mut scene = Scene::new("s");
        let id = scene.spawn("ship");
        let entity = scene.get_mut(id).expect("spawned");

        ComponentEditor::new(&mut manager)
            .add_component(entity, &path("Mover"))
            .expect("add");
        manager.ensure_initialized(entity).expect("start");
        ComponentEditor::new(&mut manager)
            .add_component(entity, &path("Spinner"))
            .expect("add");

        let live: Vec<_> = entity.live_components().iter().map(|c| c.import_path()).collect();
        assert_eq!(live, vec![path("Mover"), path("Spinner")]);
        assert_eq!(
            drain(&journal),
            vec![
                "start ship Mover speed=1.0,name=\"bot\"",
                "start ship Spinner rate=2,mode=\"slow\"",
            ]
        );
    }

    #[test]
    fn test_remove_isolation() {
        let journal = testing::journal();
        let mut manager = manager(&journal);
        let mut scene = Scene::new("s");
        let id = scene.spawn_with("ship", [("hp", "3")].into_iter().collect());
        let entity = scene.get_mut(id).expect("spawned");

        let mut editor = ComponentEditor::new(&mut manager);
        editor.add_component(entity, &path("Mover")).expect("add");
        editor.add_component(entity, &path("Spinner")).expect("add");
        manager.ensure_initialized(entity).expect("start");
        let spinner_props: Vec<_> = entity
            .properties()
            .iter()
            .filter(|(name, _)| name.contains("Spinner"))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();

        ComponentEditor::new(&mut manager)
            .remove_component(entity, &path("Mover"))
            .expect("remove");

        let remaining: Vec<_> = entity
            .properties()
            .iter()
            .filter(|(name, _)| name.contains("Spinner"))
            .map(|(name, value)| (name.to_string(), value.to_string()))
            .collect();
        assert_eq!(remaining, spinner_props);
        assert!(entity.properties().names().all(|name| !name.contains("Mover")));
        assert_eq!(entity.properties().get("hp"), Some("3"));
        assert_eq!(entity.properties().get("_component_paths"), Some(path("Spinner").as_str()));

        let live: Vec<_> = entity.live_components().iter().map(|c| c.import_path()).collect();
        assert_eq!(live, vec![path("Spinner")]);
        assert_eq!(entity.live_components()[0].arguments().get_integer("rate"), Some(2));
    }

    #[test]
    fn test_remove_unattached() {
        let journal = testing::journal();
        let mut manager = manager(&journal);
        let mut scene = Scene::new("s");
        let id = scene.spawn("ship");
        let entity = scene.get_mut(id).expect("spawned");
        assert!(matches!(
            ComponentEditor::new(&mut manager).remove_component(entity, &path("Mover")),
            Err(EditorError::NotAttached { .. })
        ));
    }

    #[test]
    fn test_edits_reset_failed_entities() {
        let journal = testing::journal();
        let mut manager = manager(&journal);
        let mut scene = Scene::new("s");
        let id = scene.spawn("ship");
        let entity = scene.get_mut(id).expect("spawned");

        let mut editor = ComponentEditor::new(&mut manager);
        editor.add_component(entity, &path("Broken")).expect("add");
        assert!(manager.ensure_initialized(entity).is_err());
        assert!(entity.is_failed());

        ComponentEditor::new(&mut manager)
            .remove_component(entity, &path("Broken"))
            .expect("remove");
        assert!(!entity.is_failed());
        assert!(manager.ensure_initialized(entity).expect("nothing left to fail"));
    }

    #[test]
    fn test_reload_reconciles_arguments() {
        let journal = testing::journal();
        let registry = Rc::new(RefCell::new(testing::registry(&journal)));
        let mut manager = manager_over(Rc::clone(&registry));
        let mut scene = Scene::new("s");
        let id = scene.spawn("ship");
        let entity = scene.get_mut(id).expect("spawned");

        let mut editor = ComponentEditor::new(&mut manager);
        editor.add_component(entity, &path("Spinner")).expect("add");
        editor.add_component(entity, &path("Mover")).expect("add");
        entity.union(arg("Mover", "speed")).set(2.5).expect("override");
        manager.ensure_initialized(entity).expect("start");
        drain(&journal);

        let recorded = Rc::clone(&journal);
        registry.borrow_mut().register(MODULE, move || {
            Module::new(MODULE)
                .with_behavior(recorder(
                    "Mover",
                    &recorded,
                    ArgumentDefaults::new().with("speed", 1.0).with("boost", false),
                    Fault::None,
                ))
                .with_behavior(recorder(
                    "Spinner",
                    &recorded,
                    ArgumentDefaults::new().with("rate", 2),
                    Fault::None,
                ))
        });

        ComponentEditor::new(&mut manager)
            .reload_component(entity, &path("Mover"))
            .expect("reload");

        let props = entity.properties();
        assert_eq!(props.get(&arg("Mover", "speed")), Some("2.5"));
        assert_eq!(props.get(&arg("Mover", "boost")), Some("false"));
        assert!(!props.contains(&arg("Mover", "name")));
        assert!(!props.contains(&union::kind_key(&arg("Mover", "name"))));

        let live: Vec<_> = entity.live_components().iter().map(|c| c.import_path()).collect();
        assert_eq!(live, vec![path("Spinner"), path("Mover")]);
        assert_eq!(drain(&journal), vec!["start ship Mover speed=2.5,boost=false"]);
    }

    #[test]
    fn test_reload_replaces_values_of_changed_kind() {
        let journal = testing::journal();
        let registry = Rc::new(RefCell::new(testing::registry(&journal)));
        let mut manager = manager_over(Rc::clone(&registry));
        let mut scene = Scene::new("s");
        let id = scene.spawn("ship");
        let entity = scene.get_mut(id).expect("spawned");

        ComponentEditor::new(&mut manager)
            .add_component(entity, &path("Mover"))
            .expect("add");

        let recorded = Rc::clone(&journal);
        registry.borrow_mut().register(MODULE, move || {
            Module::new(MODULE).with_behavior(recorder(
                "Mover",
                &recorded,
                ArgumentDefaults::new().with_choice("speed", ["slow", "fast"], "fast"),
                Fault::None,
            ))
        });
        ComponentEditor::new(&mut manager)
            .reload_component(entity, &path("Mover"))
            .expect("reload");

        let speed = entity.union(arg("Mover", "speed"));
        assert_eq!(speed.get_choice(), Ok("fast".to_string()));
    }

    #[test]
    fn test_failed_start_on_live_entity_leaves_it_unchanged() {
        let journal = testing::journal();
        let mut manager = manager(&journal);
        let mut scene = Scene::new("s");
        let id = scene.spawn("ship");
        let entity = scene.get_mut(id).expect("spawned");

        ComponentEditor::new(&mut manager)
            .add_component(entity, &path("Mover"))
            .expect("add");
        manager.ensure_initialized(entity).expect("start");
        let before = entity.properties().clone();
        drain(&journal);

        let result = ComponentEditor::new(&mut manager).add_component(entity, &path("Broken"));
        assert!(matches!(
            result,
            Err(EditorError::Lifecycle(LifecycleError::Start { .. }))
        ));
        assert_eq!(entity.properties(), &before);
        assert_eq!(manager.component_paths(entity).expect("paths"), vec![path("Mover")]);
        let live: Vec<_> = entity.live_components().iter().map(|c| c.import_path()).collect();
        assert_eq!(live, vec![path("Mover")]);
        assert!(entity.is_initialized());
        assert_eq!(drain(&journal), vec!["start ship Broken "]);

        ComponentEditor::new(&mut manager)
            .add_component(entity, &path("Spinner"))
            .expect("the failed add left nothing behind");
    }

    #[test]
    fn test_failed_reload_keeps_old_instance_and_arguments() {
        let journal = testing::journal();
        let registry = Rc::new(RefCell::new(testing::registry(&journal)));
        let mut manager = manager_over(Rc::clone(&registry));
        let mut scene = Scene::new("s");
        let id = scene.spawn("ship");
        let entity = scene.get_mut(id).expect("spawned");

        ComponentEditor::new(&mut manager)
            .add_component(entity, &path("Mover"))
            .expect("add");
        manager.ensure_initialized(entity).expect("start");
        let before = entity.properties().clone();
        drain(&journal);

        let recorded = Rc::clone(&journal);
        registry.borrow_mut().register(MODULE, move || {
            Module::new(MODULE).with_behavior(recorder(
                "Mover",
                &recorded,
                ArgumentDefaults::new().with("speed", 1.0).with("boost", false),
                Fault::Start,
            ))
        });

        let result = ComponentEditor::new(&mut manager).reload_component(entity, &path("Mover"));
        assert!(matches!(
            result,
            Err(EditorError::Lifecycle(LifecycleError::Start { .. }))
        ));
        assert_eq!(entity.properties(), &before);
        assert_eq!(entity.live_components().len(), 1);
        assert!(entity.live_components()[0].arguments().get("boost").is_none());
        assert_eq!(drain(&journal), vec!["start ship Mover speed=1.0,boost=false"]);

        manager.update(entity).expect("old instance still runs");
        assert_eq!(drain(&journal), vec!["update ship Mover 0"]);
    }
}
