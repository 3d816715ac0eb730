//! Boid flocking: separation, cohesion and alignment over a caller-managed
//! group of neighbours.
//!
//! Groups are scanned linearly; any broad-phase culling is up to the caller.

use std::f32::consts::PI;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{seek_force, SteeringBehaviour, SteeringContext};
use crate::entity::{EntityGroup, EntityId, MovingEntity};
use crate::error::{non_negative, within, ConfigResult};
use crate::world::World;

/// Which group members count as neighbours.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NeighbourhoodConfig {
    /// Members closer than this always count, whatever their bearing.
    pub min_distance: f32,
    /// Members further than this never count.
    pub max_distance: f32,
    /// Half-angle of the field of view in radians, in `[0, π]`.
    pub max_angle: f32,
}

impl Default for NeighbourhoodConfig {
    fn default() -> Self {
        Self {
            min_distance: 0.0,
            max_distance: 10.0,
            max_angle: PI,
        }
    }
}

impl NeighbourhoodConfig {
    fn validated(&self) -> ConfigResult<Self> {
        Ok(Self {
            min_distance: non_negative("min_distance", self.min_distance)?,
            max_distance: non_negative("max_distance", self.max_distance)?,
            max_angle: within("max_angle", self.max_angle, 0.0, PI)?,
        })
    }

    fn neighbours<'w>(
        &self,
        world: &'w World,
        agent: &'w MovingEntity,
        members: &'w [EntityId],
        exclude: EntityId,
    ) -> impl Iterator<Item = &'w MovingEntity> + 'w {
        let config = self.clone();
        world
            .resolve(members, exclude)
            .map(|(_, other)| other)
            .filter(move |other| {
                agent.in_neighbourhood(
                    other,
                    config.min_distance,
                    config.max_distance,
                    config.max_angle,
                )
            })
    }
}

/// Pushes away from every other group member, weighted by inverse square
/// distance.
#[derive(Debug, Clone)]
pub struct Separation {
    entity: EntityId,
    group: EntityGroup,
}

impl Separation {
    /// Separate `entity` from the members of `group`.
    #[must_use]
    pub const fn new(entity: EntityId, group: EntityGroup) -> Self {
        Self { entity, group }
    }

    /// Replace the group.
    pub fn set_group(&mut self, group: EntityGroup) {
        self.group = group;
    }
}

impl SteeringBehaviour for Separation {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        let members = self.group.members();
        ctx.world
            .resolve(&members, self.entity)
            .filter_map(|(_, other)| {
                let offset = other.position - agent.position;
                let distance_squared = offset.length_squared();
                (distance_squared > f32::EPSILON)
                    .then(|| -offset.normalize() / distance_squared)
            })
            .sum()
    }
}

/// Seeks the centroid of the neighbours in view.
#[derive(Debug, Clone)]
pub struct Cohesion {
    entity: EntityId,
    group: EntityGroup,
    neighbourhood: NeighbourhoodConfig,
}

impl Cohesion {
    /// Draw `entity` toward the neighbours among `group`.
    ///
    /// # Errors
    /// Rejects negative distances and angles outside `[0, π]`.
    pub fn new(
        entity: EntityId,
        group: EntityGroup,
        neighbourhood: &NeighbourhoodConfig,
    ) -> ConfigResult<Self> {
        Ok(Self {
            entity,
            group,
            neighbourhood: neighbourhood.validated()?,
        })
    }

    /// Replace the group.
    pub fn set_group(&mut self, group: EntityGroup) {
        self.group = group;
    }
}

impl SteeringBehaviour for Cohesion {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        let members = self.group.members();
        let (sum, count) = self
            .neighbourhood
            .neighbours(ctx.world, agent, &members, self.entity)
            .fold((Vec3::ZERO, 0_u32), |(sum, count), other| {
                (sum + other.position, count + 1)
            });
        if count == 0 {
            return Vec3::ZERO;
        }
        #[expect(clippy::cast_precision_loss, reason = "neighbour counts are small")]
        let centroid = sum / count as f32;
        seek_force(agent, centroid)
    }
}

/// Turns toward the average heading of the neighbours in view.
#[derive(Debug, Clone)]
pub struct Alignment {
    entity: EntityId,
    group: EntityGroup,
    neighbourhood: NeighbourhoodConfig,
}

impl Alignment {
    /// Align `entity` with the neighbours among `group`.
    ///
    /// # Errors
    /// Rejects negative distances and angles outside `[0, π]`.
    pub fn new(
        entity: EntityId,
        group: EntityGroup,
        neighbourhood: &NeighbourhoodConfig,
    ) -> ConfigResult<Self> {
        Ok(Self {
            entity,
            group,
            neighbourhood: neighbourhood.validated()?,
        })
    }

    /// Replace the group.
    pub fn set_group(&mut self, group: EntityGroup) {
        self.group = group;
    }
}

impl SteeringBehaviour for Alignment {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        let members = self.group.members();
        let (sum, count) = self
            .neighbourhood
            .neighbours(ctx.world, agent, &members, self.entity)
            .fold((Vec3::ZERO, 0_u32), |(sum, count), other| {
                (sum + other.forward(), count + 1)
            });
        if count == 0 {
            return Vec3::ZERO;
        }
        #[expect(clippy::cast_precision_loss, reason = "neighbour counts are small")]
        let average = sum / count as f32;
        (average - agent.forward()) * agent.move_speed()
    }
}
