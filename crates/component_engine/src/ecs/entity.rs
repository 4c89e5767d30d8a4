//! Entity implementation

use super::component::{ComponentContext, ComponentInstance};
use super::property::PropertyStore;
use super::scheduler::TickInfo;
use crate::value::UnionValue;

slotmap::new_key_type! {
    /// Entity identifier, stable while the entity lives in its scene
    pub struct EntityId;
}

/// Lifecycle state of an entity's component list
#[derive(Debug, Default)]
pub enum ComponentSlot {
    /// Components have not been started yet
    #[default]
    Uninitialized,
    /// Started components in manifest order
    Live(Vec<ComponentInstance>),
    /// Initialization failed; nothing is attached until the entity is reset
    Failed,
}

/// A scene object carrying persisted properties and live components
#[derive(Debug)]
pub struct Entity {
    id: EntityId,
    name: String,
    pub(crate) properties: PropertyStore,
    pub(crate) components: ComponentSlot,
}

impl Entity {
    pub(super) fn new(id: EntityId, name: impl Into<String>, properties: PropertyStore) -> Self {
        Self {
            id,
            name: name.into(),
            properties,
            components: ComponentSlot::Uninitialized,
        }
    }

    /// Entity identifier
    pub fn id(&self) -> EntityId {
        self.id
    }

    /// Entity name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Persisted properties
    pub fn properties(&self) -> &PropertyStore {
        &self.properties
    }

    /// Mutable persisted properties
    ///
    /// Edits to argument properties take effect the next time the entity's
    /// components are started.
    pub fn properties_mut(&mut self) -> &mut PropertyStore {
        &mut self.properties
    }

    /// Union view over one of this entity's properties
    pub fn union(&mut self, name: impl Into<String>) -> UnionValue<'_> {
        UnionValue::new(name, &mut self.properties)
    }

    /// Component lifecycle state
    pub fn component_slot(&self) -> &ComponentSlot {
        &self.components
    }

    /// Started components, empty unless the entity is live
    pub fn live_components(&self) -> &[ComponentInstance] {
        match &self.components {
            ComponentSlot::Live(instances) => instances,
            _ => &[],
        }
    }

    /// Whether the components have been started
    pub fn is_initialized(&self) -> bool {
        matches!(self.components, ComponentSlot::Live(_))
    }

    /// Whether initialization failed
    pub fn is_failed(&self) -> bool {
        matches!(self.components, ComponentSlot::Failed)
    }

    /// Drop live components so they are started again on the next tick
    pub fn reset_components(&mut self) {
        self.components = ComponentSlot::Uninitialized;
    }

    pub(crate) fn context(&mut self, tick: &TickInfo) -> ComponentContext<'_> {
        self.split(tick).0
    }

    // Hook context alongside the component list it is handed to
    pub(crate) fn split(&mut self, tick: &TickInfo) -> (ComponentContext<'_>, &mut ComponentSlot) {
        let ctx = ComponentContext {
            entity: self.id,
            entity_name: &self.name,
            properties: &mut self.properties,
            frame: tick.frame,
            tick_duration: tick.tick_duration,
        };
        (ctx, &mut self.components)
    }
}
