//! Avoiding obstacles ahead and other movers on a collision course.

use glam::Vec3;
use log::trace;
use serde::{Deserialize, Serialize};

use super::{SteeringBehaviour, SteeringContext};
use crate::entity::{EntityGroup, EntityId, MovingEntity};
use crate::error::{non_negative, positive, ConfigResult};
use crate::vector_math::{perpendicular_component, random_unit_in_plane, vec_normalize};
use crate::{ERROR_FACTOR, PARALLEL_COSINE};

/// Tuning for [`ObstacleAvoidance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ObstacleAvoidanceConfig {
    /// Seconds of travel the detection cylinder covers.
    pub min_time_to_collision: f32,
    /// Clearance kept between the agent and obstacle surfaces.
    pub min_distance: f32,
}

impl Default for ObstacleAvoidanceConfig {
    fn default() -> Self {
        Self {
            min_time_to_collision: 2.0,
            min_distance: 0.5,
        }
    }
}

/// Sweeps a cylinder ahead of the agent and escapes sideways from the most
/// threatening obstacle inside it.
///
/// The cylinder is `speed * min_time_to_collision` long and as wide as the
/// agent's radius plus each obstacle's radius plus `min_distance`. Only the
/// strongest escape force is kept; on ties the first obstacle in the group
/// wins. A stationary agent never avoids.
#[derive(Debug, Clone)]
pub struct ObstacleAvoidance {
    entity: EntityId,
    obstacles: EntityGroup,
    min_time_to_collision: f32,
    min_distance: f32,
}

impl ObstacleAvoidance {
    /// Avoid members of `obstacles` on behalf of `entity`.
    ///
    /// # Errors
    /// Rejects a non-positive lookahead time and a negative clearance.
    pub fn new(
        entity: EntityId,
        obstacles: EntityGroup,
        config: &ObstacleAvoidanceConfig,
    ) -> ConfigResult<Self> {
        Ok(Self {
            entity,
            obstacles,
            min_time_to_collision: positive("min_time_to_collision", config.min_time_to_collision)?,
            min_distance: non_negative("min_distance", config.min_distance)?,
        })
    }

    /// Replace the obstacle group.
    pub fn set_obstacles(&mut self, obstacles: EntityGroup) {
        self.obstacles = obstacles;
    }

    fn escape_from(&self, agent: &MovingEntity, obstacle: &MovingEntity, forward: Vec3) -> Option<Vec3> {
        let reach = agent.speed() * self.min_time_to_collision + obstacle.radius();
        let offset = obstacle.position - agent.position;
        let ahead = offset.dot(forward);
        if ahead <= 0.0 || ahead > reach {
            return None;
        }

        let lateral = perpendicular_component(offset, forward);
        let lateral_distance = lateral.length();
        let danger = agent.radius() + obstacle.radius() + self.min_distance;
        if lateral_distance >= danger {
            return None;
        }

        let away = vec_normalize(-lateral);
        let direction = if away == Vec3::ZERO { agent.side() } else { away };
        let overlap = (danger - lateral_distance) / danger;
        let proximity = 1.0 - ahead / reach;
        Some(direction * (agent.move_speed() * overlap * (1.0 + proximity)))
    }
}

impl SteeringBehaviour for ObstacleAvoidance {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        if agent.speed() <= f32::EPSILON {
            return Vec3::ZERO;
        }
        let forward = agent.forward();
        let members = self.obstacles.members();
        ctx.world
            .resolve(&members, self.entity)
            .filter_map(|(_, obstacle)| self.escape_from(agent, obstacle, forward))
            .reduce(|strongest, force| {
                if force.length_squared() > strongest.length_squared() {
                    force
                } else {
                    strongest
                }
            })
            .unwrap_or(Vec3::ZERO)
    }
}

/// Tuning for [`UnalignedCollisionAvoidance`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UnalignedCollisionAvoidanceConfig {
    /// Collisions predicted further ahead than this, in seconds, are ignored.
    pub min_time_to_collision: f32,
}

impl Default for UnalignedCollisionAvoidanceConfig {
    fn default() -> Self {
        Self {
            min_time_to_collision: 3.0,
        }
    }
}

struct Threat<'w> {
    entity: &'w MovingEntity,
    mine: Vec3,
    theirs: Vec3,
}

/// Steers clear of the soonest predicted collision with another mover.
///
/// Courses are classified by the cosine between headings against
/// [`PARALLEL_COSINE`]. Head-on and parallel courses steer sideways away from
/// the threat; crossing courses steer away from the predicted point of
/// collision. A threat dead ahead gives no side to prefer, so a random
/// direction in the plane of travel is chosen. Point-sized movers collide
/// when their nearest approach falls within [`ERROR_FACTOR`].
#[derive(Debug, Clone)]
pub struct UnalignedCollisionAvoidance {
    entity: EntityId,
    others: EntityGroup,
    min_time_to_collision: f32,
}

impl UnalignedCollisionAvoidance {
    /// Avoid members of `others` on behalf of `entity`.
    ///
    /// # Errors
    /// Rejects a non-positive horizon.
    pub fn new(
        entity: EntityId,
        others: EntityGroup,
        config: &UnalignedCollisionAvoidanceConfig,
    ) -> ConfigResult<Self> {
        Ok(Self {
            entity,
            others,
            min_time_to_collision: positive("min_time_to_collision", config.min_time_to_collision)?,
        })
    }

    /// Replace the group of movers to avoid.
    pub fn set_obstacles(&mut self, others: EntityGroup) {
        self.others = others;
    }

    fn soonest_threat<'w>(
        &self,
        ctx: &SteeringContext<'w>,
        agent: &'w MovingEntity,
    ) -> Option<Threat<'w>> {
        let members = self.others.members();
        let mut soonest: Option<(f32, Threat<'w>)> = None;
        for (_, other) in ctx.world.resolve(&members, self.entity) {
            let time = agent.predict_nearest_approach_time(other);
            if time < 0.0 || time >= self.min_time_to_collision {
                continue;
            }
            let (mine, theirs) = agent.nearest_approach_positions(other, time);
            let danger = (agent.radius() + other.radius()).max(ERROR_FACTOR);
            if mine.distance(theirs) >= danger {
                continue;
            }
            if soonest.as_ref().map_or(true, |(best, _)| time < *best) {
                soonest = Some((
                    time,
                    Threat {
                        entity: other,
                        mine,
                        theirs,
                    },
                ));
            }
        }
        soonest.map(|(_, threat)| threat)
    }
}

fn sideways(agent: &MovingEntity, offset: Vec3) -> Option<Vec3> {
    let side = agent.side();
    let side_dot = offset.dot(side);
    (side_dot != 0.0).then(|| side * -side_dot.signum())
}

impl SteeringBehaviour for UnalignedCollisionAvoidance {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        let Some(threat) = self.soonest_threat(ctx, agent) else {
            return Vec3::ZERO;
        };

        let forward = agent.forward();
        let parallelness = forward.dot(threat.entity.forward());
        let escape = if parallelness < -PARALLEL_COSINE {
            sideways(agent, threat.theirs - agent.position)
        } else if parallelness > PARALLEL_COSINE {
            sideways(agent, threat.entity.position - agent.position)
        } else {
            let away = vec_normalize(threat.mine - threat.theirs);
            if away == Vec3::ZERO {
                sideways(agent, threat.entity.velocity)
            } else {
                Some(away)
            }
        };

        let direction = escape.unwrap_or_else(|| {
            trace!("threat dead ahead of {:?}; escaping at random", self.entity);
            random_unit_in_plane(forward, ctx.rng)
        });
        direction * agent.move_speed()
    }
}
