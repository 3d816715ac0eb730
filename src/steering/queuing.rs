//! Braking behind slower agents, as in a queue through a doorway.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{SteeringBehaviour, SteeringContext, StrengthHandle};
use crate::entity::{EntityGroup, EntityId, MovingEntity};
use crate::error::{non_negative, ConfigResult};

/// Tuning for [`Queuing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueuingConfig {
    /// Neighbours further ahead than this are ignored.
    pub min_distance: f32,
}

impl Default for QueuingConfig {
    fn default() -> Self {
        Self { min_distance: 2.0 }
    }
}

/// Throttles another behaviour while a slower neighbour is close ahead.
///
/// Produces no force of its own. Each tick it writes a braking factor into
/// the container handle, or clears the handle when the way is free.
#[derive(Debug, Clone)]
pub struct Queuing {
    entity: EntityId,
    neighbours: EntityGroup,
    container: StrengthHandle,
    min_distance: f32,
}

impl Queuing {
    /// Brake `entity` behind members of `neighbours` by writing into
    /// `container`.
    ///
    /// # Errors
    /// Rejects a negative distance.
    pub fn new(
        entity: EntityId,
        neighbours: EntityGroup,
        container: StrengthHandle,
        config: &QueuingConfig,
    ) -> ConfigResult<Self> {
        Ok(Self {
            entity,
            neighbours,
            container,
            min_distance: non_negative("min_distance", config.min_distance)?,
        })
    }

    /// Replace the neighbour group.
    pub fn set_group(&mut self, neighbours: EntityGroup) {
        self.neighbours = neighbours;
    }

    /// Handle receiving the braking factor.
    #[must_use]
    pub fn container(&self) -> StrengthHandle {
        self.container.clone()
    }

    /// Braking factor imposed by `other`, if it is close ahead and slower.
    fn brake_for(&self, agent: &MovingEntity, forward: Vec3, other: &MovingEntity) -> Option<f32> {
        let offset = other.position - agent.position;
        let distance = offset.length();
        if distance > self.min_distance || offset.dot(forward) <= 0.0 {
            return None;
        }
        let speed = agent.speed();
        if other.speed() >= speed {
            return None;
        }
        let speed_ratio = other.speed() / speed;
        Some(((distance / self.min_distance + speed_ratio) * 0.5).clamp(0.0, 1.0))
    }
}

impl SteeringBehaviour for Queuing {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        let forward = agent.forward();
        let members = self.neighbours.members();
        let brake = ctx
            .world
            .resolve(&members, self.entity)
            .filter_map(|(_, other)| self.brake_for(agent, forward, other))
            .reduce(f32::min);
        brake.map_or_else(
            || self.container.turn_off(),
            |factor| self.container.set_scalar(factor),
        );
        Vec3::ZERO
    }
}
