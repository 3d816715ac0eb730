//! Seek and flee: the primitives most other behaviours are built from.

use glam::Vec3;

use super::{flee_force, seek_force, SteeringBehaviour, SteeringContext, Target};
use crate::entity::EntityId;

/// Steers toward a target at the entity's cruising speed.
///
/// The target is re-resolved every tick, so a moving entity target is
/// tracked. Without a target the force is zero.
#[derive(Debug, Clone, PartialEq)]
pub struct Seek {
    entity: EntityId,
    target: Option<Target>,
}

impl Seek {
    /// Seek `target` on behalf of `entity`.
    #[must_use]
    pub const fn new(entity: EntityId, target: Option<Target>) -> Self {
        Self { entity, target }
    }

    /// Current target.
    #[must_use]
    pub const fn target(&self) -> Option<Target> {
        self.target
    }

    /// Replace the target.
    pub fn set_target(&mut self, target: impl Into<Target>) {
        self.target = Some(target.into());
    }

    /// Drop the target; subsequent ticks produce no force.
    pub fn clear_target(&mut self) {
        self.target = None;
    }
}

impl SteeringBehaviour for Seek {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        self.target
            .and_then(|target| target.resolve(ctx.world))
            .map_or(Vec3::ZERO, |state| seek_force(agent, state.position))
    }
}

/// Steers directly away from a target at the entity's cruising speed.
#[derive(Debug, Clone, PartialEq)]
pub struct Flee {
    entity: EntityId,
    target: Option<Target>,
}

impl Flee {
    /// Flee `target` on behalf of `entity`.
    #[must_use]
    pub const fn new(entity: EntityId, target: Option<Target>) -> Self {
        Self { entity, target }
    }

    /// Current target.
    #[must_use]
    pub const fn target(&self) -> Option<Target> {
        self.target
    }

    /// Replace the target.
    pub fn set_target(&mut self, target: impl Into<Target>) {
        self.target = Some(target.into());
    }

    /// Drop the target; subsequent ticks produce no force.
    pub fn clear_target(&mut self) {
        self.target = None;
    }
}

impl SteeringBehaviour for Flee {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        self.target
            .and_then(|target| target.resolve(ctx.world))
            .map_or(Vec3::ZERO, |state| flee_force(agent, state.position))
    }
}
