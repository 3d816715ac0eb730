//! Sweeping a volume by visiting a grid of waypoints.
//!
//! The grid is laid out once at construction with one point at the centre of
//! each `subdivision`-sized cell. Every tick the points within half a
//! subdivision of the agent count as visited and are dropped; the agent then
//! seeks the nearest point left. The behaviour finishes once none remain.

use glam::Vec3;
use log::debug;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use super::{seek_force, SteeringBehaviour, SteeringContext};
use crate::constants::MAX_EXPLORE_WAYPOINTS;
use crate::entity::{EntityId, MovingEntity};
use crate::error::{non_negative, positive, ConfigError, ConfigResult};
use crate::numeric::{cell_count, index_to_f32};

/// Tuning for [`BoxExplore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoxExploreConfig {
    /// Centre of the box.
    pub center: Vec3,
    /// Extent along x.
    pub width_x: f32,
    /// Extent along z.
    pub width_z: f32,
    /// Extent along y.
    pub height: f32,
    /// Spacing between waypoints.
    pub subdivision: f32,
}

impl Default for BoxExploreConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            width_x: 10.0,
            width_z: 10.0,
            height: 10.0,
            subdivision: 5.0,
        }
    }
}

/// Tuning for [`SphereExplore`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SphereExploreConfig {
    /// Centre of the sphere.
    pub center: Vec3,
    /// Radius of the sphere.
    pub radius: f32,
    /// Spacing between waypoints.
    pub subdivision: f32,
}

impl Default for SphereExploreConfig {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            radius: 5.0,
            subdivision: 2.5,
        }
    }
}

fn axis_centres(min: f32, extent: f32, cells: usize) -> Vec<f32> {
    let cell = extent / index_to_f32(cells);
    (0..cells)
        .map(|index| min + (index_to_f32(index) + 0.5) * cell)
        .collect()
}

fn grid(center: Vec3, size: Vec3, subdivision: f32) -> ConfigResult<Vec<Vec3>> {
    let [across, tall, deep] = size.to_array().map(|extent| cell_count(extent, subdivision));
    let total = across
        .checked_mul(tall)
        .and_then(|plane| plane.checked_mul(deep))
        .filter(|&count| count <= MAX_EXPLORE_WAYPOINTS)
        .ok_or(ConfigError::TooManyWaypoints {
            limit: MAX_EXPLORE_WAYPOINTS,
        })?;
    let min = center - size * 0.5;
    let xs = axis_centres(min.x, size.x, across);
    let ys = axis_centres(min.y, size.y, tall);
    let zs = axis_centres(min.z, size.z, deep);
    let mut points = Vec::with_capacity(total);
    for &x in &xs {
        for &y in &ys {
            for &z in &zs {
                points.push(Vec3::new(x, y, z));
            }
        }
    }
    Ok(points)
}

#[derive(Debug, Clone)]
struct Waypoints {
    entity: EntityId,
    remaining: Vec<Vec3>,
    visit_radius: f32,
}

impl Waypoints {
    fn steer(&mut self, agent: &MovingEntity) -> Vec3 {
        let before = self.remaining.len();
        let visit_radius = self.visit_radius;
        self.remaining
            .retain(|point| point.distance(agent.position) > visit_radius);
        if self.remaining.len() != before {
            debug!(
                "{:?} visited {} waypoints, {} left",
                self.entity,
                before - self.remaining.len(),
                self.remaining.len()
            );
        }
        self.remaining
            .iter()
            .min_by_key(|point| OrderedFloat(point.distance_squared(agent.position)))
            .map_or(Vec3::ZERO, |&nearest| seek_force(agent, nearest))
    }
}

/// Visits a grid of waypoints filling an axis-aligned box.
#[derive(Debug, Clone)]
pub struct BoxExplore {
    waypoints: Waypoints,
}

impl BoxExplore {
    /// Explore the configured box on behalf of `entity`.
    ///
    /// # Errors
    /// Rejects a non-positive subdivision and negative dimensions, and grids
    /// with more than [`MAX_EXPLORE_WAYPOINTS`] points.
    pub fn new(entity: EntityId, config: &BoxExploreConfig) -> ConfigResult<Self> {
        let subdivision = positive("subdivision", config.subdivision)?;
        let size = Vec3::new(
            non_negative("width_x", config.width_x)?,
            non_negative("height", config.height)?,
            non_negative("width_z", config.width_z)?,
        );
        Ok(Self {
            waypoints: Waypoints {
                entity,
                remaining: grid(config.center, size, subdivision)?,
                visit_radius: subdivision * 0.5,
            },
        })
    }

    /// Waypoints not yet visited.
    #[must_use]
    pub fn remaining(&self) -> &[Vec3] {
        &self.waypoints.remaining
    }
}

impl SteeringBehaviour for BoxExplore {
    fn entity(&self) -> EntityId {
        self.waypoints.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        ctx.entity(self.waypoints.entity)
            .map_or(Vec3::ZERO, |agent| self.waypoints.steer(agent))
    }

    fn is_finished(&self) -> bool {
        self.waypoints.remaining.is_empty()
    }
}

/// Visits the grid waypoints lying inside a sphere.
#[derive(Debug, Clone)]
pub struct SphereExplore {
    waypoints: Waypoints,
}

impl SphereExplore {
    /// Explore the configured sphere on behalf of `entity`.
    ///
    /// A sphere too small to contain any grid point is explored through its
    /// centre alone.
    ///
    /// # Errors
    /// Rejects a non-positive subdivision, a negative radius and grids with
    /// more than [`MAX_EXPLORE_WAYPOINTS`] points.
    pub fn new(entity: EntityId, config: &SphereExploreConfig) -> ConfigResult<Self> {
        let subdivision = positive("subdivision", config.subdivision)?;
        let radius = non_negative("radius", config.radius)?;
        let mut remaining: Vec<Vec3> = grid(config.center, Vec3::splat(radius * 2.0), subdivision)?
            .into_iter()
            .filter(|point| point.distance(config.center) <= radius)
            .collect();
        if remaining.is_empty() {
            remaining.push(config.center);
        }
        Ok(Self {
            waypoints: Waypoints {
                entity,
                remaining,
                visit_radius: subdivision * 0.5,
            },
        })
    }

    /// Waypoints not yet visited.
    #[must_use]
    pub fn remaining(&self) -> &[Vec3] {
        &self.waypoints.remaining
    }
}

impl SteeringBehaviour for SphereExplore {
    fn entity(&self) -> EntityId {
        self.waypoints.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        ctx.entity(self.waypoints.entity)
            .map_or(Vec3::ZERO, |agent| self.waypoints.steer(agent))
    }

    fn is_finished(&self) -> bool {
        self.waypoints.remaining.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::world::World;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use rstest::rstest;

    #[test]
    fn box_grid_has_a_point_per_cell() {
        let explore = BoxExplore::new(EntityId(0), &BoxExploreConfig::default()).unwrap();
        assert_eq!(explore.remaining().len(), 8);
        assert!(explore
            .remaining()
            .iter()
            .all(|p| p.abs().abs_diff_eq(Vec3::splat(2.5), 1e-6)));
    }

    #[test]
    fn flat_box_collapses_to_one_layer() {
        let config = BoxExploreConfig {
            height: 0.0,
            ..BoxExploreConfig::default()
        };
        let explore = BoxExplore::new(EntityId(0), &config).unwrap();
        assert_eq!(explore.remaining().len(), 4);
        assert!(explore.remaining().iter().all(|p| p.y == 0.0));
    }

    #[rstest]
    #[case::zero_subdivision(BoxExploreConfig { subdivision: 0.0, ..BoxExploreConfig::default() })]
    #[case::negative_subdivision(BoxExploreConfig { subdivision: -5.0, ..BoxExploreConfig::default() })]
    #[case::negative_width(BoxExploreConfig { width_x: -1.0, ..BoxExploreConfig::default() })]
    #[case::negative_depth(BoxExploreConfig { width_z: -1.0, ..BoxExploreConfig::default() })]
    #[case::negative_height(BoxExploreConfig { height: -1.0, ..BoxExploreConfig::default() })]
    fn box_validation(#[case] config: BoxExploreConfig) {
        assert!(BoxExplore::new(EntityId(0), &config).is_err());
    }

    #[test]
    fn seeks_nearest_unvisited_point() {
        let mut world = World::new();
        let id = world.spawn(MovingEntity::new(EntityKind::Agent, Vec3::new(2.5, 2.5, 2.5)));
        let mut explore = BoxExplore::new(id, &BoxExploreConfig::default()).unwrap();
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = SteeringContext::new(&world, &mut rng, 0.1);

        let force = explore.calculate_steering(&mut ctx);
        assert_eq!(explore.remaining().len(), 7);
        assert_eq!(force.length(), 1.0);
    }

    #[test]
    fn sphere_keeps_points_inside() {
        let explore = SphereExplore::new(EntityId(0), &SphereExploreConfig::default()).unwrap();
        assert!(!explore.remaining().is_empty());
        assert!(explore.remaining().iter().all(|p| p.length() <= 5.0));
    }

    #[test]
    fn tiny_sphere_explores_its_centre() {
        let config = SphereExploreConfig {
            center: Vec3::new(1.0, 2.0, 3.0),
            radius: 0.0,
            subdivision: 1.0,
        };
        let explore = SphereExplore::new(EntityId(0), &config).unwrap();
        assert_eq!(explore.remaining(), &[Vec3::new(1.0, 2.0, 3.0)]);
    }

    #[test]
    fn sphere_rejects_negative_radius() {
        let config = SphereExploreConfig {
            radius: -1.0,
            ..SphereExploreConfig::default()
        };
        assert!(matches!(
            SphereExplore::new(EntityId(0), &config),
            Err(ConfigError::Negative { parameter: "radius", .. })
        ));
    }

    #[test]
    fn huge_sphere_is_rejected_before_allocating() {
        let config = SphereExploreConfig {
            radius: 1e6,
            subdivision: 1.0,
            ..SphereExploreConfig::default()
        };
        assert_eq!(
            SphereExplore::new(EntityId(0), &config).unwrap_err(),
            ConfigError::TooManyWaypoints {
                limit: MAX_EXPLORE_WAYPOINTS
            }
        );
    }
}
