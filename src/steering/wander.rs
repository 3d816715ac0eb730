//! Random roaming, either between points in an area or along a sphere held
//! ahead of the agent.

use std::fmt;
use std::rc::Rc;

use glam::{Vec2, Vec3};
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use super::{seek_force, SteeringBehaviour, SteeringContext};
use crate::entity::{EntityId, MovingEntity};
use crate::error::{non_negative, positive, within, ConfigResult};
use crate::spatial::{Aabb, RayCaster};

/// Tuning for [`Wander`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WanderConfig {
    /// Seconds between picking new destinations.
    pub time_interval: f32,
}

impl Default for WanderConfig {
    fn default() -> Self {
        Self { time_interval: 1.0 }
    }
}

/// Seeks a random point inside an area, replaced every `time_interval`.
#[derive(Debug, Clone)]
pub struct Wander {
    entity: EntityId,
    area: Aabb,
    time_interval: f32,
    elapsed: f32,
    destination: Option<Vec3>,
}

impl Wander {
    /// Wander within `area` on behalf of `entity`.
    ///
    /// # Errors
    /// Rejects a non-positive interval.
    pub fn new(entity: EntityId, area: Aabb, config: &WanderConfig) -> ConfigResult<Self> {
        Ok(Self {
            entity,
            area,
            time_interval: positive("time_interval", config.time_interval)?,
            elapsed: 0.0,
            destination: None,
        })
    }

    /// Replace the area; a new destination is chosen on the next tick.
    pub fn set_area(&mut self, area: Aabb) {
        self.area = area;
        self.destination = None;
    }

    /// Area destinations are drawn from.
    #[must_use]
    pub const fn area(&self) -> &Aabb {
        &self.area
    }

    /// Destination currently being sought.
    #[must_use]
    pub const fn destination(&self) -> Option<Vec3> {
        self.destination
    }
}

impl SteeringBehaviour for Wander {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        self.elapsed += ctx.dt;
        let destination = match self.destination {
            Some(point) if self.elapsed < self.time_interval => point,
            _ => {
                self.elapsed = 0.0;
                let point = self.area.random_point(ctx.rng);
                self.destination = Some(point);
                point
            }
        };
        seek_force(agent, destination)
    }
}

/// Tuning for [`SphereWander`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereWanderConfig {
    /// Radius of the wander sphere.
    pub sphere_radius: f32,
    /// How far ahead of the agent the sphere is centred.
    pub sphere_distance: f32,
    /// Seconds between perturbations of the wander direction.
    pub time_interval: f32,
    /// Amount of random jitter per perturbation, in `[0, 1]`.
    pub random_factor: f32,
    /// Cap on a single perturbation relative to the radius, in `[0, 1]`.
    pub rotation_factor: f32,
}

impl Default for SphereWanderConfig {
    fn default() -> Self {
        Self {
            sphere_radius: 1.0,
            sphere_distance: 2.0,
            time_interval: 0.5,
            random_factor: 0.5,
            rotation_factor: 0.5,
        }
    }
}

/// Wanders by steering toward a point on a sphere held ahead of the agent.
///
/// The point is described by a 2-D direction across the sphere, nudged at
/// random every interval. With an occluder, a target hidden behind geometry
/// flips the direction to the opposite side of the sphere.
pub struct SphereWander {
    entity: EntityId,
    config: SphereWanderConfig,
    direction: Vec2,
    elapsed: f32,
    occluder: Option<Rc<dyn RayCaster>>,
}

impl fmt::Debug for SphereWander {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SphereWander")
            .field("entity", &self.entity)
            .field("config", &self.config)
            .field("direction", &self.direction)
            .field("occluded", &self.occluder.is_some())
            .finish_non_exhaustive()
    }
}

impl SphereWander {
    /// Sphere-wander on behalf of `entity`.
    ///
    /// # Errors
    /// Rejects a non-positive radius or interval, a negative sphere distance,
    /// and factors outside `[0, 1]`.
    pub fn new(entity: EntityId, config: &SphereWanderConfig) -> ConfigResult<Self> {
        let validated = SphereWanderConfig {
            sphere_radius: positive("sphere_radius", config.sphere_radius)?,
            sphere_distance: non_negative("sphere_distance", config.sphere_distance)?,
            time_interval: positive("time_interval", config.time_interval)?,
            random_factor: within("random_factor", config.random_factor, 0.0, 1.0)?,
            rotation_factor: within("rotation_factor", config.rotation_factor, 0.0, 1.0)?,
        };
        Ok(Self {
            entity,
            config: validated,
            direction: Vec2::X,
            elapsed: 0.0,
            occluder: None,
        })
    }

    /// Flip away from targets this oracle reports as hidden.
    #[must_use]
    pub fn with_occluder(mut self, occluder: Rc<dyn RayCaster>) -> Self {
        self.occluder = Some(occluder);
        self
    }

    /// Current unit direction across the sphere.
    #[must_use]
    pub const fn direction(&self) -> Vec2 {
        self.direction
    }

    /// Point on the sphere for `agent` given the current direction.
    #[must_use]
    pub fn target_for(&self, agent: &MovingEntity) -> Vec3 {
        let forward = agent.forward();
        let side = agent.side();
        let up = forward.cross(side);
        let center = agent.position + forward * self.config.sphere_distance;
        center + (side * self.direction.x + up * self.direction.y) * self.config.sphere_radius
    }

    fn perturb(&mut self, rng: &mut dyn RngCore) {
        let radius = self.config.sphere_radius;
        let jitter = Vec2::new(rng.gen_range(-1.0..=1.0), rng.gen_range(-1.0..=1.0))
            * (self.config.random_factor * radius);
        let step = jitter.clamp_length_max(self.config.rotation_factor * radius);
        let moved = (self.direction * radius + step).normalize_or_zero();
        if moved != Vec2::ZERO {
            self.direction = moved;
        }
    }

    fn is_occluded(&self, agent: &MovingEntity, target: Vec3) -> bool {
        let Some(occluder) = &self.occluder else {
            return false;
        };
        let offset = target - agent.position;
        occluder
            .cast_ray(agent.position, offset)
            .is_some_and(|hit| hit.distance < offset.length())
    }
}

impl SteeringBehaviour for SphereWander {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        self.elapsed += ctx.dt;
        if self.elapsed >= self.config.time_interval {
            self.elapsed = 0.0;
            self.perturb(ctx.rng);
        }

        let mut target = self.target_for(agent);
        if self.is_occluded(agent, target) {
            self.direction = -self.direction;
            target = self.target_for(agent);
        }
        seek_force(agent, target)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::error::ConfigError;
    use crate::spatial::{BoundingVolume, MockRayCaster, RayHit};
    use crate::world::World;
    use approx::assert_relative_eq;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rstest::rstest;

    fn agent_world() -> (World, EntityId) {
        let mut world = World::new();
        let mut agent = MovingEntity::new(EntityKind::Agent, Vec3::ZERO);
        agent.velocity = Vec3::Z;
        let id = world.spawn(agent);
        (world, id)
    }

    #[test]
    fn wander_picks_points_inside_area_and_renews_them() {
        let (world, id) = agent_world();
        let area = Aabb::new(Vec3::new(-5.0, 0.0, -5.0), Vec3::new(5.0, 0.0, 5.0)).unwrap();
        let mut wander = Wander::new(id, area, &WanderConfig { time_interval: 1.0 }).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(11);
        let mut ctx = SteeringContext::new(&world, &mut rng, 0.4);

        wander.calculate_steering(&mut ctx);
        let first = wander.destination().unwrap();
        assert!(area.contains(first));

        wander.calculate_steering(&mut ctx);
        assert_eq!(wander.destination(), Some(first));

        wander.calculate_steering(&mut ctx);
        wander.calculate_steering(&mut ctx);
        let second = wander.destination().unwrap();
        assert!(area.contains(second));
        assert_ne!(first, second);
    }

    #[test]
    fn wander_rejects_zero_interval() {
        let area = Aabb::new(Vec3::ZERO, Vec3::ONE).unwrap();
        assert!(matches!(
            Wander::new(EntityId(0), area, &WanderConfig { time_interval: 0.0 }),
            Err(ConfigError::NotPositive { .. })
        ));
    }

    #[rstest]
    #[case::zero_radius(SphereWanderConfig { sphere_radius: 0.0, ..SphereWanderConfig::default() })]
    #[case::random_above_one(SphereWanderConfig { random_factor: 1.5, ..SphereWanderConfig::default() })]
    #[case::rotation_below_zero(SphereWanderConfig { rotation_factor: -0.1, ..SphereWanderConfig::default() })]
    #[case::zero_interval(SphereWanderConfig { time_interval: 0.0, ..SphereWanderConfig::default() })]
    fn sphere_wander_validation(#[case] config: SphereWanderConfig) {
        assert!(SphereWander::new(EntityId(0), &config).is_err());
    }

    #[test]
    fn sphere_target_stays_on_sphere() {
        let (world, id) = agent_world();
        let config = SphereWanderConfig {
            time_interval: 0.1,
            random_factor: 1.0,
            rotation_factor: 1.0,
            ..SphereWanderConfig::default()
        };
        let mut wander = SphereWander::new(id, &config).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut ctx = SteeringContext::new(&world, &mut rng, 0.1);
        let agent = world.get(id).unwrap();
        let center = Vec3::new(0.0, 0.0, 2.0);

        for _ in 0..10 {
            wander.calculate_steering(&mut ctx);
            assert_relative_eq!(wander.direction().length(), 1.0, epsilon = 1e-5);
            let target = wander.target_for(agent);
            assert_relative_eq!(target.distance(center), 1.0, epsilon = 1e-5);
        }
    }

    #[test]
    fn occluded_target_flips_direction() {
        let (world, id) = agent_world();
        let mut occluder = MockRayCaster::new();
        occluder.expect_cast_ray().returning(|origin, _| {
            Some(RayHit {
                point: origin,
                normal: None,
                distance: 0.1,
            })
        });
        let config = SphereWanderConfig {
            random_factor: 0.0,
            ..SphereWanderConfig::default()
        };
        let mut wander = SphereWander::new(id, &config)
            .unwrap()
            .with_occluder(Rc::new(occluder));
        let mut rng = ChaCha8Rng::seed_from_u64(5);
        let mut ctx = SteeringContext::new(&world, &mut rng, 0.1);

        wander.calculate_steering(&mut ctx);
        assert_eq!(wander.direction(), Vec2::NEG_X);
    }
}
