//! In-memory entity store read by behaviours and written by the integrator.
//!
//! The world replaces any process-wide registry: whoever drives the ticks
//! owns it and lends it to behaviours for the duration of a calculation.

use hashbrown::HashMap;
use log::debug;

use crate::entity::{EntityId, MovingEntity};

/// Arena of entities keyed by [`EntityId`].
#[derive(Debug, Default, Clone)]
pub struct World {
    entities: HashMap<EntityId, MovingEntity>,
    next_id: u64,
}

impl World {
    /// Create an empty world.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert an entity and return its freshly allocated identifier.
    pub fn spawn(&mut self, entity: MovingEntity) -> EntityId {
        let id = EntityId(self.next_id);
        self.next_id += 1;
        debug!("spawned {:?} {id:?} at {:?}", entity.kind, entity.position);
        self.entities.insert(id, entity);
        id
    }

    /// Remove an entity, returning it if it existed.
    pub fn remove(&mut self, id: EntityId) -> Option<MovingEntity> {
        let removed = self.entities.remove(&id);
        if removed.is_some() {
            debug!("removed entity {id:?}");
        }
        removed
    }

    /// Look up an entity.
    #[must_use]
    pub fn get(&self, id: EntityId) -> Option<&MovingEntity> {
        self.entities.get(&id)
    }

    /// Look up an entity for mutation.
    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut MovingEntity> {
        self.entities.get_mut(&id)
    }

    /// Whether `id` refers to a live entity.
    #[must_use]
    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Number of live entities.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    /// Whether the world holds no entities.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    /// Identifiers of all live entities in ascending order.
    #[must_use]
    pub fn ids(&self) -> Vec<EntityId> {
        let mut ids: Vec<EntityId> = self.entities.keys().copied().collect();
        ids.sort_unstable();
        ids
    }

    /// Iterate over the entities listed in `ids`, skipping any that no longer
    /// exist and the entity `exclude`.
    pub fn resolve<'w: 'i, 'i>(
        &'w self,
        ids: &'i [EntityId],
        exclude: EntityId,
    ) -> impl Iterator<Item = (EntityId, &'w MovingEntity)> + 'i {
        ids.iter()
            .copied()
            .filter(move |id| *id != exclude)
            .filter_map(move |id| self.get(id).map(|entity| (id, entity)))
    }
}
