//! Shared fixtures for the integration tests.
//!
//! Builders for worlds and agents, a deterministic random source and a
//! behaviour that emits a fixed force.
use glam::Vec3;
use rand::SeedableRng;
use rand_chacha::ChaCha8Rng;
use steerage::{
    EntityId, EntityKind, MovingEntity, MovingEntityConfig, SteeringBehaviour, SteeringContext,
    World,
};

/// Seed used by [`steer`] and [`rng`].
pub const SEED: u64 = 0x5EED;

/// Deterministic random source.
pub fn rng() -> ChaCha8Rng {
    ChaCha8Rng::seed_from_u64(SEED)
}

/// Agent with default limits at `position`.
pub fn agent(position: Vec3) -> MovingEntity {
    MovingEntity::new(EntityKind::Agent, position)
}

/// Agent with the given limits, position and velocity.
///
/// # Panics
/// Panics if `limits` fail validation.
pub fn agent_with(position: Vec3, velocity: Vec3, limits: &MovingEntityConfig) -> MovingEntity {
    let mut entity = MovingEntity::from_config(EntityKind::Agent, position, limits)
        .expect("test limits should be valid");
    entity.velocity = velocity;
    entity
}

/// Stationary obstacle of `radius` at `position`.
///
/// # Panics
/// Panics if `radius` is negative.
pub fn obstacle(position: Vec3, radius: f32) -> MovingEntity {
    let mut entity = MovingEntity::new(EntityKind::Obstacle, position);
    entity.set_radius(radius).expect("radius should be valid");
    entity
}

/// World populated with `entities`, returning their ids in order.
pub fn world_of(entities: impl IntoIterator<Item = MovingEntity>) -> (World, Vec<EntityId>) {
    let mut world = World::new();
    let ids = entities.into_iter().map(|entity| world.spawn(entity)).collect();
    (world, ids)
}

/// Ask `behaviour` for its force once, with a fresh seeded random source.
pub fn steer(world: &World, behaviour: &mut dyn SteeringBehaviour) -> Vec3 {
    let mut source = rng();
    let mut ctx = SteeringContext::new(world, &mut source, 0.1);
    behaviour.calculate_steering(&mut ctx)
}

/// Behaviour returning the same force every tick.
#[derive(Debug, Clone)]
pub struct FixedForce {
    entity: EntityId,
    force: Vec3,
}

impl FixedForce {
    /// Emit `force` on behalf of `entity`.
    pub fn new(entity: EntityId, force: Vec3) -> Self {
        Self { entity, force }
    }
}

impl SteeringBehaviour for FixedForce {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, _ctx: &mut SteeringContext<'_>) -> Vec3 {
        self.force
    }
}
