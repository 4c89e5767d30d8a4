//! Scene: an ordered collection of entities

use super::entity::{Entity, EntityId};
use super::property::PropertyStore;
use slotmap::SlotMap;

/// A named set of entities
///
/// Entities are visited in spawn order. Only active scenes are ticked.
#[derive(Debug)]
pub struct Scene {
    name: String,
    active: bool,
    entities: SlotMap<EntityId, Entity>,
    order: Vec<EntityId>,
}

impl Scene {
    /// Create an empty, active scene
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            active: true,
            entities: SlotMap::with_key(),
            order: Vec::new(),
        }
    }

    /// Scene name
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Whether the scene is ticked
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Enable or disable ticking
    pub fn set_active(&mut self, active: bool) {
        self.active = active;
    }

    /// Spawn an entity with no properties
    pub fn spawn(&mut self, name: impl Into<String>) -> EntityId {
        self.spawn_with(name, PropertyStore::new())
    }

    /// Spawn an entity with persisted properties
    pub fn spawn_with(&mut self, name: impl Into<String>, properties: PropertyStore) -> EntityId {
        let name = name.into();
        let id = self
            .entities
            .insert_with_key(|id| Entity::new(id, name, properties));
        self.order.push(id);
        id
    }

    /// Remove an entity and its live components
    pub fn despawn(&mut self, id: EntityId) -> Option<Entity> {
        let entity = self.entities.remove(id)?;
        self.order.retain(|other| *other != id);
        Some(entity)
    }

    /// Look up an entity
    pub fn get(&self, id: EntityId) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Look up an entity mutably
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut Entity> {
        self.entities.get_mut(id)
    }

    /// Find the first entity with a name
    pub fn find(&self, name: &str) -> Option<EntityId> {
        self.iter().find(|e| e.name() == name).map(Entity::id)
    }

    /// Entity identifiers in spawn order
    pub fn entity_ids(&self) -> Vec<EntityId> {
        self.order.clone()
    }

    /// Entities in spawn order
    pub fn iter(&self) -> impl Iterator<Item = &Entity> {
        self.order.iter().filter_map(|id| self.entities.get(*id))
    }

    /// Number of entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the scene has no entities
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }
}
