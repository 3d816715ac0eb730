//! Following a leader without getting in its way.

use std::f32::consts::FRAC_PI_4;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::arrive::arrival_strength;
use super::pursuit::predicted_position;
use super::{flee_force, seek_force, SteeringBehaviour, SteeringContext, TargetState};
use crate::entity::EntityId;
use crate::error::{non_negative, ConfigError, ConfigResult};
use crate::world::World;

/// Tuning for [`LeaderFollowing`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LeaderFollowingConfig {
    /// Followers closer than this and in front of the leader step aside.
    pub distance_to_evade: f32,
    /// Distance at which the focus has fully shifted to the leader's
    /// predicted position.
    pub distance_to_change_focus: f32,
    /// Half-angle in radians of the cone ahead of the leader that followers
    /// must keep clear of.
    pub minimum_angle: f32,
    /// Distance from the focus point at which followers start slowing.
    pub slowing_distance: f32,
}

impl Default for LeaderFollowingConfig {
    fn default() -> Self {
        Self {
            distance_to_evade: 2.0,
            distance_to_change_focus: 5.0,
            minimum_angle: FRAC_PI_4,
            slowing_distance: 3.0,
        }
    }
}

/// Arrives at a focus point near the leader and evades it when blocking
/// its path.
///
/// Close followers focus on where the leader is; distant ones on where it
/// will be. The blend is linear in distance up to
/// `distance_to_change_focus`.
#[derive(Debug, Clone)]
pub struct LeaderFollowing {
    entity: EntityId,
    leader: EntityId,
    config: LeaderFollowingConfig,
}

impl LeaderFollowing {
    /// Follow `leader` on behalf of `entity`.
    ///
    /// # Errors
    /// The leader must exist in `world`; negative distances and angles are
    /// rejected.
    pub fn new(
        entity: EntityId,
        leader: EntityId,
        world: &World,
        config: &LeaderFollowingConfig,
    ) -> ConfigResult<Self> {
        if !world.contains(leader) {
            return Err(ConfigError::UnknownEntity {
                role: "leader",
                id: leader,
            });
        }
        let validated = LeaderFollowingConfig {
            distance_to_evade: non_negative("distance_to_evade", config.distance_to_evade)?,
            distance_to_change_focus: non_negative(
                "distance_to_change_focus",
                config.distance_to_change_focus,
            )?,
            minimum_angle: non_negative("minimum_angle", config.minimum_angle)?,
            slowing_distance: non_negative("slowing_distance", config.slowing_distance)?,
        };
        Ok(Self {
            entity,
            leader,
            config: validated,
        })
    }

    /// The entity being followed.
    #[must_use]
    pub const fn leader(&self) -> EntityId {
        self.leader
    }

    fn focus_factor(&self, distance: f32) -> f32 {
        if self.config.distance_to_change_focus <= 0.0 {
            1.0
        } else {
            (distance / self.config.distance_to_change_focus).clamp(0.0, 1.0)
        }
    }
}

impl SteeringBehaviour for LeaderFollowing {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        let Some(body) = ctx.entity(self.leader) else {
            return Vec3::ZERO;
        };
        let leader = TargetState {
            position: body.position,
            velocity: body.velocity,
            radius: body.radius(),
        };

        let distance = agent.position.distance(leader.position);
        let predicted = predicted_position(agent, &leader, None);
        let focus = leader
            .position
            .lerp(predicted, self.focus_factor(distance));
        let strength = arrival_strength(
            agent.position.distance(focus),
            self.config.slowing_distance,
            leader.radius + agent.radius(),
        );
        let mut force = seek_force(agent, focus) * strength;

        let blocking = body.speed() > f32::EPSILON
            && body.forwardness(agent.position) >= self.config.minimum_angle.cos();
        if distance < self.config.distance_to_evade && blocking {
            force += flee_force(agent, predicted);
        }
        force
    }
}
