//! Approaching a wall and holding a standoff distance from it.

use std::fmt;
use std::rc::Rc;

use glam::Vec3;
use once_cell::sync::Lazy;
use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use super::{seek_force, SteeringBehaviour, SteeringContext};
use crate::entity::EntityId;
use crate::error::{non_negative, ConfigResult};
use crate::numeric::index_to_f32;
use crate::spatial::{RayCaster, RayHit};
use crate::vector_math::vec_normalize;
use crate::{CLOSE_HIT_FACTOR, WALL_RAY_COUNT};

/// Probe directions: the six axes and the eight cube diagonals.
static PROBES: Lazy<[Vec3; WALL_RAY_COUNT]> = Lazy::new(|| {
    let d = 1.0 / 3.0_f32.sqrt();
    [
        Vec3::X,
        Vec3::NEG_X,
        Vec3::Y,
        Vec3::NEG_Y,
        Vec3::Z,
        Vec3::NEG_Z,
        Vec3::new(d, d, d),
        Vec3::new(d, d, -d),
        Vec3::new(d, -d, d),
        Vec3::new(d, -d, -d),
        Vec3::new(-d, d, d),
        Vec3::new(-d, d, -d),
        Vec3::new(-d, -d, d),
        Vec3::new(-d, -d, -d),
    ]
});

/// Tuning for [`WallApproach`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WallApproachConfig {
    /// Distance to keep from the wall surface.
    pub offset: f32,
}

impl Default for WallApproachConfig {
    fn default() -> Self {
        Self { offset: 1.0 }
    }
}

/// Seeks a point `offset` in front of the nearest wall surface.
///
/// The surface is approximated by probing in fourteen directions and
/// averaging the hits no further than [`CLOSE_HIT_FACTOR`] times the nearest
/// one. No hits means no force.
pub struct WallApproach {
    entity: EntityId,
    wall: Rc<dyn RayCaster>,
    offset: f32,
}

impl fmt::Debug for WallApproach {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WallApproach")
            .field("entity", &self.entity)
            .field("offset", &self.offset)
            .finish_non_exhaustive()
    }
}

impl WallApproach {
    /// Approach `wall` on behalf of `entity`.
    ///
    /// # Errors
    /// Rejects a negative offset.
    pub fn new(entity: EntityId, wall: Rc<dyn RayCaster>, config: &WallApproachConfig) -> ConfigResult<Self> {
        Ok(Self {
            entity,
            wall,
            offset: non_negative("offset", config.offset)?,
        })
    }

    /// Estimated surface point and outward normal around `position`.
    #[must_use]
    pub fn approximate_surface(&self, position: Vec3) -> Option<(Vec3, Vec3)> {
        let hits: Vec<(Vec3, RayHit)> = PROBES
            .iter()
            .filter_map(|&direction| {
                self.wall
                    .cast_ray(position, direction)
                    .map(|hit| (direction, hit))
            })
            .collect();
        let nearest = hits
            .iter()
            .map(|(_, hit)| OrderedFloat(hit.distance))
            .min()?
            .into_inner();

        let close: Vec<&(Vec3, RayHit)> = hits
            .iter()
            .filter(|(_, hit)| hit.distance <= nearest * CLOSE_HIT_FACTOR)
            .collect();
        let count = index_to_f32(close.len());
        let point = close.iter().map(|(_, hit)| hit.point).sum::<Vec3>() / count;
        let normal_sum: Vec3 = close
            .iter()
            .map(|(direction, hit)| hit.normal.unwrap_or(-*direction))
            .sum();
        let averaged = vec_normalize(normal_sum);
        let normal = if averaged == Vec3::ZERO {
            vec_normalize(position - point)
        } else {
            averaged
        };
        Some((point, normal))
    }
}

impl SteeringBehaviour for WallApproach {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        self.approximate_surface(agent.position)
            .map_or(Vec3::ZERO, |(point, normal)| {
                seek_force(agent, point + normal * self.offset)
            })
    }
}
