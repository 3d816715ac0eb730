//! Keeping an agent inside a bounding volume.

use std::fmt;
use std::rc::Rc;

use glam::Vec3;
use log::trace;
use serde::{Deserialize, Serialize};

use super::{seek_force, SteeringBehaviour, SteeringContext};
use crate::entity::{EntityId, MovingEntity};
use crate::error::{non_negative, ConfigError, ConfigResult};
use crate::spatial::BoundingVolume;
use crate::vector_math::vec_normalize;
use crate::DEFAULT_CONTAINMENT_LOOKAHEAD;

/// Tuning for [`Containment`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContainmentConfig {
    /// Seconds ahead the agent's position is predicted.
    pub lookahead: f32,
}

impl Default for ContainmentConfig {
    fn default() -> Self {
        Self {
            lookahead: DEFAULT_CONTAINMENT_LOOKAHEAD,
        }
    }
}

/// Turns an agent back before its predicted position leaves a volume.
///
/// When the prediction exits, a ray along the velocity finds the exit
/// surface and the agent is pushed along the inward normal in proportion to
/// how far the prediction overshoots. An agent already outside heads back
/// through the last exit surface, or toward the volume's centre if it never
/// left through a known one.
pub struct Containment {
    entity: EntityId,
    volume: Rc<dyn BoundingVolume>,
    lookahead: f32,
    last_exit_normal: Option<Vec3>,
}

impl fmt::Debug for Containment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Containment")
            .field("entity", &self.entity)
            .field("lookahead", &self.lookahead)
            .field("last_exit_normal", &self.last_exit_normal)
            .finish_non_exhaustive()
    }
}

impl Containment {
    /// Keep `entity` inside `volume`.
    ///
    /// # Errors
    /// Rejects unbounded volumes and a negative lookahead.
    pub fn new(
        entity: EntityId,
        volume: Rc<dyn BoundingVolume>,
        config: &ContainmentConfig,
    ) -> ConfigResult<Self> {
        if !volume.is_bounded() {
            return Err(ConfigError::UnboundedVolume);
        }
        Ok(Self {
            entity,
            volume,
            lookahead: non_negative("lookahead", config.lookahead)?,
            last_exit_normal: None,
        })
    }

    /// Outward normal of the surface the agent was last predicted to cross.
    #[must_use]
    pub const fn last_exit_normal(&self) -> Option<Vec3> {
        self.last_exit_normal
    }

    fn steer_home(&self, agent: &MovingEntity) -> Vec3 {
        self.last_exit_normal.map_or_else(
            || seek_force(agent, self.volume.center()),
            |outward| -outward * agent.move_speed() - agent.velocity,
        )
    }
}

impl SteeringBehaviour for Containment {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        if !self.volume.contains(agent.position) {
            trace!("{:?} outside its containment volume", self.entity);
            return self.steer_home(agent);
        }

        let predicted = agent.predict_position(self.lookahead);
        if self.volume.contains(predicted) {
            return Vec3::ZERO;
        }

        let Some(hit) = self.volume.cast_ray(agent.position, agent.velocity) else {
            return seek_force(agent, self.volume.center());
        };
        let normal = hit
            .normal
            .unwrap_or_else(|| vec_normalize(hit.point - self.volume.center()));
        let inward = if normal.dot(agent.velocity) > 0.0 {
            -normal
        } else {
            normal
        };
        self.last_exit_normal = Some(-inward);
        let overshoot = (predicted - hit.point).dot(-inward).max(0.0);
        inward * overshoot
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::spatial::{Aabb, RayCaster, RayHit};
    use crate::world::World;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rstest::rstest;

    /// Half-space `x <= 5` whose exit ray reports a fixed normal.
    struct Wall {
        normal: Option<Vec3>,
    }

    impl RayCaster for Wall {
        fn cast_ray(&self, _origin: Vec3, _direction: Vec3) -> Option<RayHit> {
            Some(RayHit {
                point: Vec3::new(5.0, 0.0, 0.0),
                normal: self.normal,
                distance: 1.0,
            })
        }
    }

    impl BoundingVolume for Wall {
        fn contains(&self, point: Vec3) -> bool {
            point.x <= 5.0
        }

        fn center(&self) -> Vec3 {
            Vec3::ZERO
        }
    }

    fn arena() -> Rc<dyn BoundingVolume> {
        Rc::new(Aabb::new(Vec3::splat(-5.0), Vec3::splat(5.0)).unwrap())
    }

    fn setup(position: Vec3, velocity: Vec3) -> (World, Containment) {
        let mut world = World::new();
        let mut agent = MovingEntity::new(EntityKind::Agent, position);
        agent.velocity = velocity;
        let id = world.spawn(agent);
        let containment = Containment::new(id, arena(), &ContainmentConfig::default()).unwrap();
        (world, containment)
    }

    fn steer(world: &World, containment: &mut Containment) -> Vec3 {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = SteeringContext::new(world, &mut rng, 0.1);
        containment.calculate_steering(&mut ctx)
    }

    #[test]
    fn rejects_unbounded_volume() {
        let open = Aabb::new(Vec3::splat(f32::NEG_INFINITY), Vec3::splat(f32::INFINITY)).unwrap();
        let err = Containment::new(EntityId(0), Rc::new(open), &ContainmentConfig::default())
            .unwrap_err();
        assert_eq!(err, ConfigError::UnboundedVolume);
    }

    #[test]
    fn safe_course_needs_no_correction() {
        let (world, mut containment) = setup(Vec3::ZERO, Vec3::new(2.0, 0.0, 0.0));
        assert_eq!(steer(&world, &mut containment), Vec3::ZERO);
    }

    #[test]
    fn predicted_exit_pushes_back_and_remembers_surface() {
        let (mut world, mut containment) = setup(Vec3::new(4.0, 0.0, 0.0), Vec3::new(2.0, 0.0, 0.0));
        let force = steer(&world, &mut containment);
        assert!(force.abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-5), "{force:?}");
        assert_eq!(containment.last_exit_normal(), Some(Vec3::X));

        let id = containment.entity();
        if let Some(agent) = world.get_mut(id) {
            agent.position = Vec3::new(7.0, 0.0, 0.0);
        }
        let home = steer(&world, &mut containment);
        assert!(home.abs_diff_eq(Vec3::new(-3.0, 0.0, 0.0), 1e-5), "{home:?}");
    }

    #[test]
    fn stray_without_history_heads_for_centre() {
        let (world, mut containment) = setup(Vec3::new(0.0, 0.0, 9.0), Vec3::ZERO);
        assert!(steer(&world, &mut containment).abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[rstest]
    #[case::outward_normal(Some(Vec3::X))]
    #[case::inward_normal(Some(Vec3::NEG_X))]
    #[case::no_normal(None)]
    fn exit_push_always_points_inward(#[case] normal: Option<Vec3>) {
        let mut world = World::new();
        let mut agent = MovingEntity::new(EntityKind::Agent, Vec3::new(4.0, 0.0, 0.0));
        agent.velocity = Vec3::new(2.0, 0.0, 0.0);
        let id = world.spawn(agent);
        let mut containment =
            Containment::new(id, Rc::new(Wall { normal }), &ContainmentConfig::default()).unwrap();

        let force = steer(&world, &mut containment);
        assert!(force.abs_diff_eq(Vec3::NEG_X, 1e-5), "{force:?}");
        assert_eq!(containment.last_exit_normal(), Some(Vec3::X));
    }
}
