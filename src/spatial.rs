//! Spatial query oracles consumed by behaviours.
//!
//! Behaviours never resolve collisions; they only ask where a ray meets
//! scene geometry and whether a point lies inside a volume. Applications back
//! these traits with their physics engine. [`Aabb`] and [`Sphere`] are simple
//! analytic implementations used for explore volumes, containment and tests.

use glam::Vec3;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

use crate::error::{non_negative, ConfigError, ConfigResult};
use crate::vector_math::vec_normalize;

/// Where a ray first met a surface.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RayHit {
    /// World-space contact point.
    pub point: Vec3,
    /// Outward surface normal at the contact, when the oracle knows it.
    pub normal: Option<Vec3>,
    /// Distance travelled along the normalised ray direction.
    pub distance: f32,
}

/// Ray queries against scene geometry.
#[cfg_attr(test, mockall::automock)]
pub trait RayCaster {
    /// Nearest intersection of the ray from `origin` along `direction`, if any.
    ///
    /// `direction` need not be normalised. A zero direction never hits.
    fn cast_ray(&self, origin: Vec3, direction: Vec3) -> Option<RayHit>;
}

/// A closed region that can answer containment queries.
pub trait BoundingVolume: RayCaster {
    /// Whether `point` lies inside or on the boundary.
    fn contains(&self, point: Vec3) -> bool;

    /// A point well inside the volume used as a homing target.
    fn center(&self) -> Vec3;

    /// Whether the volume has finite extent.
    fn is_bounded(&self) -> bool {
        true
    }
}

/// Axis-aligned box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "AabbBounds")]
pub struct Aabb {
    min: Vec3,
    max: Vec3,
}

#[derive(Deserialize)]
struct AabbBounds {
    min: Vec3,
    max: Vec3,
}

impl TryFrom<AabbBounds> for Aabb {
    type Error = ConfigError;

    fn try_from(bounds: AabbBounds) -> ConfigResult<Self> {
        Self::new(bounds.min, bounds.max)
    }
}

impl Aabb {
    /// Box spanning `min..=max`. Infinite corners are accepted; such boxes
    /// report themselves as unbounded.
    ///
    /// # Errors
    /// Returns [`ConfigError::InvalidArea`] when a minimum exceeds its
    /// maximum or a coordinate is NaN.
    pub fn new(min: Vec3, max: Vec3) -> ConfigResult<Self> {
        if min.is_nan() || max.is_nan() || min.cmpgt(max).any() {
            return Err(ConfigError::InvalidArea);
        }
        Ok(Self { min, max })
    }

    /// Box of the given full `size` centred on `center`.
    ///
    /// # Errors
    /// Rejects negative or non-finite sizes.
    pub fn from_center(center: Vec3, size: Vec3) -> ConfigResult<Self> {
        let half = Vec3::new(
            non_negative("size.x", size.x)?,
            non_negative("size.y", size.y)?,
            non_negative("size.z", size.z)?,
        ) * 0.5;
        Self::new(center - half, center + half)
    }

    /// Minimum corner.
    #[must_use]
    pub const fn min(&self) -> Vec3 {
        self.min
    }

    /// Maximum corner.
    #[must_use]
    pub const fn max(&self) -> Vec3 {
        self.max
    }

    /// Extent along each axis.
    #[must_use]
    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Uniformly distributed point inside the box.
    pub fn random_point(&self, rng: &mut dyn RngCore) -> Vec3 {
        let t = Vec3::new(rng.gen(), rng.gen(), rng.gen());
        self.min + self.size() * t
    }
}

impl RayCaster for Aabb {
    fn cast_ray(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        let dir = vec_normalize(direction);
        if dir == Vec3::ZERO {
            return None;
        }

        let mut t_enter = f32::NEG_INFINITY;
        let mut t_exit = f32::INFINITY;
        let mut enter_normal = Vec3::ZERO;
        let mut exit_normal = Vec3::ZERO;

        for axis in 0..3 {
            let o = origin[axis];
            let d = dir[axis];
            let (lo, hi) = (self.min[axis], self.max[axis]);
            if d.abs() <= f32::EPSILON {
                if o < lo || o > hi {
                    return None;
                }
                continue;
            }
            let mut near = (lo - o) / d;
            let mut far = (hi - o) / d;
            let mut outward = Vec3::ZERO;
            outward[axis] = -d.signum();
            if near > far {
                std::mem::swap(&mut near, &mut far);
            }
            if near > t_enter {
                t_enter = near;
                enter_normal = outward;
            }
            if far < t_exit {
                t_exit = far;
                exit_normal = -outward;
            }
        }

        if t_exit < t_enter.max(0.0) {
            return None;
        }
        let (distance, normal) = if t_enter >= 0.0 {
            (t_enter, enter_normal)
        } else {
            (t_exit, exit_normal)
        };
        Some(RayHit {
            point: origin + dir * distance,
            normal: Some(normal),
            distance,
        })
    }
}

impl BoundingVolume for Aabb {
    fn contains(&self, point: Vec3) -> bool {
        point.cmpge(self.min).all() && point.cmple(self.max).all()
    }

    fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    fn is_bounded(&self) -> bool {
        self.min.is_finite() && self.max.is_finite()
    }
}

/// Solid sphere.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "SphereShape")]
pub struct Sphere {
    center: Vec3,
    radius: f32,
}

#[derive(Deserialize)]
struct SphereShape {
    center: Vec3,
    radius: f32,
}

impl TryFrom<SphereShape> for Sphere {
    type Error = ConfigError;

    fn try_from(shape: SphereShape) -> ConfigResult<Self> {
        Self::new(shape.center, shape.radius)
    }
}

impl Sphere {
    /// Sphere of `radius` around `center`.
    ///
    /// # Errors
    /// Rejects negative or non-finite radii.
    pub fn new(center: Vec3, radius: f32) -> ConfigResult<Self> {
        Ok(Self {
            center,
            radius: non_negative("radius", radius)?,
        })
    }

    /// Radius.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }
}

impl RayCaster for Sphere {
    fn cast_ray(&self, origin: Vec3, direction: Vec3) -> Option<RayHit> {
        let dir = vec_normalize(direction);
        if dir == Vec3::ZERO {
            return None;
        }
        let offset = origin - self.center;
        let b = dir.dot(offset);
        let c = offset.length_squared() - self.radius * self.radius;
        let discriminant = b * b - c;
        if discriminant < 0.0 {
            return None;
        }
        let root = discriminant.sqrt();
        let near = -b - root;
        let far = -b + root;
        let distance = if near >= 0.0 {
            near
        } else if far >= 0.0 {
            far
        } else {
            return None;
        };
        let point = origin + dir * distance;
        Some(RayHit {
            point,
            normal: Some(vec_normalize(point - self.center)),
            distance,
        })
    }
}

impl BoundingVolume for Sphere {
    fn contains(&self, point: Vec3) -> bool {
        point.distance_squared(self.center) <= self.radius * self.radius
    }

    fn center(&self) -> Vec3 {
        self.center
    }

    fn is_bounded(&self) -> bool {
        self.center.is_finite()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_box() -> Aabb {
        Aabb::new(Vec3::splat(-1.0), Vec3::splat(1.0)).unwrap()
    }

    #[test]
    fn rejects_inverted_box() {
        assert_eq!(
            Aabb::new(Vec3::ONE, Vec3::ZERO),
            Err(ConfigError::InvalidArea)
        );
    }

    #[test]
    fn ray_from_outside_hits_near_face() {
        let hit = unit_box()
            .cast_ray(Vec3::new(-5.0, 0.0, 0.0), Vec3::X)
            .unwrap();
        assert_relative_eq!(hit.distance, 4.0);
        assert_eq!(hit.normal, Some(Vec3::NEG_X));
        assert!(hit.point.abs_diff_eq(Vec3::new(-1.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn ray_from_inside_hits_exit_face() {
        let hit = unit_box().cast_ray(Vec3::ZERO, Vec3::Z).unwrap();
        assert_relative_eq!(hit.distance, 1.0);
        assert_eq!(hit.normal, Some(Vec3::Z));
    }

    #[test]
    fn ray_missing_box() {
        assert!(unit_box()
            .cast_ray(Vec3::new(0.0, 5.0, -5.0), Vec3::Z)
            .is_none());
        assert!(unit_box()
            .cast_ray(Vec3::new(-5.0, 0.0, 0.0), Vec3::NEG_X)
            .is_none());
    }

    #[test]
    fn box_from_center_spans_half_size_each_way() {
        let area = Aabb::from_center(Vec3::new(1.0, 0.0, -1.0), Vec3::new(4.0, 2.0, 0.0)).unwrap();
        assert_eq!(area.min(), Vec3::new(-1.0, -1.0, -1.0));
        assert_eq!(area.max(), Vec3::new(3.0, 1.0, -1.0));
        assert!(Aabb::from_center(Vec3::ZERO, Vec3::new(-1.0, 1.0, 1.0)).is_err());
    }

    #[test]
    fn infinite_box_is_unbounded() {
        let open = Aabb::new(Vec3::splat(f32::NEG_INFINITY), Vec3::splat(f32::INFINITY)).unwrap();
        assert!(!open.is_bounded());
        assert!(unit_box().is_bounded());
    }

    #[test]
    fn sphere_ray_from_inside() {
        let sphere = Sphere::new(Vec3::ZERO, 2.0).unwrap();
        let hit = sphere.cast_ray(Vec3::ZERO, Vec3::new(0.0, 3.0, 0.0)).unwrap();
        assert_relative_eq!(hit.distance, 2.0);
        assert!(hit.normal.unwrap().abs_diff_eq(Vec3::Y, 1e-6));
        assert!(sphere.contains(Vec3::new(0.0, 1.9, 0.0)));
        assert!(!sphere.contains(Vec3::new(0.0, 2.1, 0.0)));
    }

    #[test]
    fn random_points_stay_inside() {
        use rand::SeedableRng;
        let mut rng = rand_chacha::ChaCha8Rng::seed_from_u64(3);
        let area = Aabb::new(Vec3::ZERO, Vec3::new(10.0, 0.0, 4.0)).unwrap();
        for _ in 0..32 {
            assert!(area.contains(area.random_point(&mut rng)));
        }
    }

    #[test]
    fn deserialised_sphere_is_validated() {
        let sphere: Sphere = serde_json::from_str(r#"{"center": [1, 2, 3], "radius": 4}"#).unwrap();
        assert_eq!(sphere, Sphere::new(Vec3::new(1.0, 2.0, 3.0), 4.0).unwrap());

        let error = serde_json::from_str::<Sphere>(r#"{"center": [0, 0, 0], "radius": -1}"#)
            .unwrap_err()
            .to_string();
        assert!(error.contains("radius must not be negative"), "{error}");
    }
}
