//! Simulation context driving behaviour ticks.
//!
//! A [`Simulation`] owns the [`World`], the random source and the behaviours
//! attached to entities, and stands in for any process-wide agent registry.
//! Each entity has at most one attached top-level behaviour; compose several
//! with a [`Compound`](crate::steering::Compound).

use glam::Vec3;
use hashbrown::HashMap;
use log::{debug, info, warn};
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;

use crate::entity::EntityId;
use crate::steering::SteeringBehaviour;
use crate::world::World;

/// A world, its random source and the behaviours steering its entities.
pub struct Simulation {
    world: World,
    rng: ChaCha8Rng,
    behaviours: Vec<Box<dyn SteeringBehaviour>>,
    names: HashMap<String, EntityId>,
    ticks: u64,
    elapsed: f32,
}

impl std::fmt::Debug for Simulation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Simulation")
            .field("world", &self.world)
            .field("rng", &self.rng)
            .field("behaviours", &self.behaviours.len())
            .field("names", &self.names)
            .field("ticks", &self.ticks)
            .field("elapsed", &self.elapsed)
            .finish()
    }
}

impl Simulation {
    /// Wrap `world`, seeding the random source with `seed`.
    #[must_use]
    pub fn new(world: World, seed: u64) -> Self {
        Self {
            world,
            rng: ChaCha8Rng::seed_from_u64(seed),
            behaviours: Vec::new(),
            names: HashMap::new(),
            ticks: 0,
            elapsed: 0.0,
        }
    }

    /// The simulated world.
    #[must_use]
    pub const fn world(&self) -> &World {
        &self.world
    }

    /// The simulated world, for edits between ticks.
    pub fn world_mut(&mut self) -> &mut World {
        &mut self.world
    }

    /// Give `id` a human-readable name, replacing any earlier holder of it.
    pub fn name(&mut self, id: EntityId, name: impl Into<String>) {
        self.names.insert(name.into(), id);
    }

    /// Entity registered under `name`.
    #[must_use]
    pub fn lookup(&self, name: &str) -> Option<EntityId> {
        self.names.get(name).copied()
    }

    /// Name registered for `id`, if any.
    #[must_use]
    pub fn label(&self, id: EntityId) -> Option<&str> {
        label_in(&self.names, id)
    }

    /// Attach `behaviour` to its entity, returning the behaviour it replaces.
    pub fn attach(
        &mut self,
        behaviour: Box<dyn SteeringBehaviour>,
    ) -> Option<Box<dyn SteeringBehaviour>> {
        let id = behaviour.entity();
        match self.world.get(id) {
            None => warn!("attaching behaviour to unknown entity {id:?}"),
            Some(entity) if !entity.kind.is_movable() => {
                warn!("attaching behaviour to static entity {id:?}; it will not move");
            }
            Some(_) => {}
        }
        let previous = self.detach(id);
        debug!("attached behaviour to {id:?}");
        self.behaviours.push(behaviour);
        previous
    }

    /// Detach and return the behaviour steering `id`.
    pub fn detach(&mut self, id: EntityId) -> Option<Box<dyn SteeringBehaviour>> {
        let index = self
            .behaviours
            .iter()
            .position(|behaviour| behaviour.entity() == id)?;
        Some(self.behaviours.remove(index))
    }

    /// Whether a behaviour is attached to `id`.
    #[must_use]
    pub fn is_attached(&self, id: EntityId) -> bool {
        self.behaviours.iter().any(|behaviour| behaviour.entity() == id)
    }

    /// Number of attached behaviours.
    #[must_use]
    pub fn active(&self) -> usize {
        self.behaviours.len()
    }

    /// Ticks run so far.
    #[must_use]
    pub const fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated seconds so far.
    #[must_use]
    pub const fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Advance every attached behaviour by `dt` seconds, in attachment order.
    ///
    /// Returns the force applied to each steered entity. Behaviours that
    /// report themselves finished afterwards are detached.
    pub fn step(&mut self, dt: f32) -> Vec<(EntityId, Vec3)> {
        let applied = self
            .behaviours
            .iter_mut()
            .map(|behaviour| {
                let force = behaviour.tick(&mut self.world, &mut self.rng, dt);
                (behaviour.entity(), force)
            })
            .collect();

        let names = &self.names;
        self.behaviours.retain(|behaviour| {
            let finished = behaviour.is_finished();
            if finished {
                let id = behaviour.entity();
                let label = label_in(names, id).unwrap_or("unnamed");
                info!("behaviour for {label} ({id:?}) finished");
            }
            !finished
        });

        self.ticks += 1;
        self.elapsed += dt;
        applied
    }

    /// Run `ticks` steps of `dt`, stopping early once nothing is attached.
    ///
    /// Returns the number of steps actually taken.
    pub fn run(&mut self, ticks: u64, dt: f32) -> u64 {
        for taken in 0..ticks {
            if self.behaviours.is_empty() {
                return taken;
            }
            self.step(dt);
        }
        ticks
    }
}

fn label_in(names: &HashMap<String, EntityId>, id: EntityId) -> Option<&str> {
    names
        .iter()
        .find_map(|(name, named)| (*named == id).then_some(name.as_str()))
}
