//! Hiding behind obstacles from a threat.

use glam::Vec3;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use super::{seek_force, SteeringBehaviour, SteeringContext};
use crate::entity::{EntityGroup, EntityId, MovingEntity};
use crate::error::{non_negative, ConfigError, ConfigResult};
use crate::vector_math::vec_normalize;
use crate::world::World;

/// Tuning for [`Hide`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HideConfig {
    /// Gap kept between the hiding spot and the obstacle's surface.
    pub separation: f32,
}

impl Default for HideConfig {
    fn default() -> Self {
        Self { separation: 1.0 }
    }
}

/// Seeks the far side of the nearest obstacle that can cover the agent.
///
/// An obstacle qualifies when it is at least as large as the agent and the
/// agent is closer to it than the threat is. Without one the force is zero.
#[derive(Debug, Clone)]
pub struct Hide {
    entity: EntityId,
    threat: EntityId,
    obstacles: EntityGroup,
    separation: f32,
}

impl Hide {
    /// Hide `entity` from `threat` behind members of `obstacles`.
    ///
    /// # Errors
    /// The threat must exist in `world`; a negative separation is rejected.
    pub fn new(
        entity: EntityId,
        threat: EntityId,
        obstacles: EntityGroup,
        world: &World,
        config: &HideConfig,
    ) -> ConfigResult<Self> {
        if !world.contains(threat) {
            return Err(ConfigError::UnknownEntity {
                role: "threat",
                id: threat,
            });
        }
        Ok(Self {
            entity,
            threat,
            obstacles,
            separation: non_negative("separation", config.separation)?,
        })
    }

    /// Replace the obstacle group.
    pub fn set_obstacles(&mut self, obstacles: EntityGroup) {
        self.obstacles = obstacles;
    }

    /// Spot behind `obstacle` as seen from `threat`.
    #[must_use]
    pub fn hiding_spot(&self, obstacle: &MovingEntity, threat: &MovingEntity) -> Vec3 {
        let away = vec_normalize(obstacle.position - threat.position);
        obstacle.position + away * (obstacle.radius() + self.separation)
    }
}

impl SteeringBehaviour for Hide {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        let Some(threat) = ctx.entity(self.threat) else {
            return Vec3::ZERO;
        };
        let members = self.obstacles.members();
        ctx.world
            .resolve(&members, self.entity)
            .map(|(_, obstacle)| obstacle)
            .filter(|obstacle| {
                obstacle.radius() >= agent.radius()
                    && agent.distance_to(obstacle) < threat.distance_to(obstacle)
            })
            .min_by_key(|obstacle| OrderedFloat(agent.distance_to(obstacle)))
            .map_or(Vec3::ZERO, |cover| {
                seek_force(agent, self.hiding_spot(cover, threat))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn rock(position: Vec3, radius: f32) -> MovingEntity {
        let mut entity = MovingEntity::new(EntityKind::Obstacle, position);
        entity.set_radius(radius).unwrap();
        entity
    }

    fn hide_among(obstacles: Vec<MovingEntity>) -> Vec3 {
        let mut world = World::new();
        let mut my_body = MovingEntity::new(EntityKind::Agent, Vec3::ZERO);
        my_body.set_radius(0.5).unwrap();
        let me = world.spawn(my_body);
        let threat = world.spawn(MovingEntity::new(EntityKind::Agent, Vec3::new(0.0, 0.0, -10.0)));
        let group: EntityGroup = obstacles.into_iter().map(|o| world.spawn(o)).collect();

        let mut hide = Hide::new(me, threat, group, &world, &HideConfig::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = SteeringContext::new(&world, &mut rng, 0.1);
        hide.calculate_steering(&mut ctx)
    }

    #[test]
    fn seeks_spot_behind_nearest_cover() {
        let near = rock(Vec3::new(0.0, 0.0, 3.0), 1.0);
        let far = rock(Vec3::new(8.0, 0.0, 0.0), 1.0);
        let force = hide_among(vec![far, near]);
        assert!(force.abs_diff_eq(Vec3::Z, 1e-6), "{force:?}");
    }

    #[test]
    fn ignores_cover_too_small_or_nearer_the_threat() {
        let pebble = rock(Vec3::new(0.0, 0.0, 3.0), 0.1);
        let exposed = rock(Vec3::new(0.0, 0.0, -8.0), 2.0);
        assert_eq!(hide_among(vec![pebble, exposed]), Vec3::ZERO);
    }

    #[test]
    fn threat_must_exist() {
        let world = World::new();
        assert!(matches!(
            Hide::new(
                EntityId(0),
                EntityId(3),
                EntityGroup::default(),
                &world,
                &HideConfig::default()
            ),
            Err(ConfigError::UnknownEntity { role: "threat", .. })
        ));
    }
}
