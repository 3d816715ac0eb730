//! Steering behaviours and the machinery that composes them.
//!
//! A behaviour is bound to one entity and turns the current world state into
//! a steering force each tick. Forces can be throttled with a
//! [`Throttled`] wrapper, summed or balanced by [`Compound`], and finally
//! applied through [`SteeringBehaviour::tick`], which delegates to the
//! [integrator](crate::integrator).
//!
//! Behaviours read the world through a [`SteeringContext`] and never mutate
//! shared state while calculating. A target or neighbour that has vanished
//! from the world simply yields a zero force for that tick.

use glam::Vec3;
use log::trace;
use rand::RngCore;
use serde::{Deserialize, Serialize};

use crate::entity::{EntityId, MovingEntity};
use crate::integrator::integrate;
use crate::vector_math::vec_normalize;
use crate::world::World;

pub mod arrive;
pub mod avoidance;
pub mod compound;
pub mod containment;
pub mod explore;
pub mod flocking;
pub mod hide;
pub mod leader;
pub mod path;
pub mod pursuit;
pub mod queuing;
pub mod seek;
pub mod strength;
pub mod wall;
pub mod wander;

pub use arrive::{Arrive, ArriveConfig};
pub use avoidance::{
    ObstacleAvoidance, ObstacleAvoidanceConfig, UnalignedCollisionAvoidance,
    UnalignedCollisionAvoidanceConfig,
};
pub use compound::{BalancedCompound, Compound};
pub use containment::{Containment, ContainmentConfig};
pub use explore::{BoxExplore, BoxExploreConfig, SphereExplore, SphereExploreConfig};
pub use flocking::{Alignment, Cohesion, NeighbourhoodConfig, Separation};
pub use hide::{Hide, HideConfig};
pub use leader::{LeaderFollowing, LeaderFollowingConfig};
pub use path::{PathFollow, PathFollowConfig};
pub use pursuit::{Evade, Pursuit, PursuitConfig};
pub use queuing::{Queuing, QueuingConfig};
pub use seek::{Flee, Seek};
pub use strength::{Strength, StrengthHandle, Throttled};
pub use wall::{WallApproach, WallApproachConfig};
pub use wander::{SphereWander, SphereWanderConfig, Wander, WanderConfig};

/// Everything a behaviour may consult while computing a force.
pub struct SteeringContext<'a> {
    /// Read-only view of all entities.
    pub world: &'a World,
    /// Random source for behaviours that need one.
    pub rng: &'a mut dyn RngCore,
    /// Length of the current tick in seconds.
    pub dt: f32,
}

impl<'a> SteeringContext<'a> {
    /// Bundle the collaborators for one tick.
    pub fn new(world: &'a World, rng: &'a mut dyn RngCore, dt: f32) -> Self {
        Self { world, rng, dt }
    }

    /// Look up an entity, logging when it is missing.
    #[must_use]
    pub fn entity(&self, id: EntityId) -> Option<&'a MovingEntity> {
        let found = self.world.get(id);
        if found.is_none() {
            trace!("entity {id:?} missing from world; steering with zero force");
        }
        found
    }
}

/// A unit of steering bound to a single entity.
pub trait SteeringBehaviour {
    /// The entity this behaviour steers.
    fn entity(&self) -> EntityId;

    /// Desired steering force for this tick.
    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3;

    /// Whether the behaviour has nothing left to do.
    fn is_finished(&self) -> bool {
        false
    }

    /// Calculate the force and integrate it into the bound entity.
    ///
    /// Returns the force actually applied after clamping, or zero when the
    /// bound entity no longer exists.
    fn tick(&mut self, world: &mut World, rng: &mut dyn RngCore, dt: f32) -> Vec3 {
        let id = self.entity();
        let force = {
            let mut ctx = SteeringContext::new(world, rng, dt);
            self.calculate_steering(&mut ctx)
        };
        world
            .get_mut(id)
            .map_or(Vec3::ZERO, |entity| integrate(entity, force, dt))
    }
}

impl<B: SteeringBehaviour + ?Sized> SteeringBehaviour for Box<B> {
    fn entity(&self) -> EntityId {
        (**self).entity()
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        (**self).calculate_steering(ctx)
    }

    fn is_finished(&self) -> bool {
        (**self).is_finished()
    }
}

/// What a behaviour steers relative to.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Target {
    /// Another entity, tracked as it moves.
    Entity(EntityId),
    /// A fixed point in space.
    Point(Vec3),
}

/// Kinematic snapshot of a resolved [`Target`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TargetState {
    /// Current position.
    pub position: Vec3,
    /// Current velocity; zero for points.
    pub velocity: Vec3,
    /// Bounding radius; zero for points.
    pub radius: f32,
}

impl Target {
    /// Resolve against the world; `None` if the entity has gone.
    #[must_use]
    pub fn resolve(&self, world: &World) -> Option<TargetState> {
        match *self {
            Self::Point(position) => Some(TargetState {
                position,
                velocity: Vec3::ZERO,
                radius: 0.0,
            }),
            Self::Entity(id) => world.get(id).map(|entity| TargetState {
                position: entity.position,
                velocity: entity.velocity,
                radius: entity.radius(),
            }),
        }
    }
}

impl From<EntityId> for Target {
    fn from(id: EntityId) -> Self {
        Self::Entity(id)
    }
}

impl From<Vec3> for Target {
    fn from(point: Vec3) -> Self {
        Self::Point(point)
    }
}

/// Force steering `agent` toward `point` at its cruising speed.
#[must_use]
pub fn seek_force(agent: &MovingEntity, point: Vec3) -> Vec3 {
    vec_normalize(point - agent.position) * agent.move_speed() - agent.velocity
}

/// Force steering `agent` away from `point` at its cruising speed.
#[must_use]
pub fn flee_force(agent: &MovingEntity, point: Vec3) -> Vec3 {
    vec_normalize(agent.position - point) * agent.move_speed() - agent.velocity
}
