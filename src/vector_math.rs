//! Vector helpers shared by the steering behaviours.
//!
//! `glam` supplies the arithmetic; these functions add the guarded
//! operations steering code needs repeatedly: normalising without producing
//! NaNs, splitting a vector against an axis, and picking directions in a plane.
use glam::Vec3;
use rand::{Rng, RngCore};

/// Local forward axis of an entity with identity orientation.
pub const FORWARD: Vec3 = Vec3::Z;
/// World up axis used for side vectors and look rotations.
pub const UP: Vec3 = Vec3::Y;

/// Returns the unit vector in the direction of `vector`.
///
/// The function checks that all components are finite and the vector is
/// non-zero before normalising. If the input is invalid or the zero vector,
/// it returns [`Vec3::ZERO`].
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use steerage::vec_normalize;
/// let n = vec_normalize(Vec3::new(3.0, 0.0, 4.0));
/// assert!((n.x - 0.6).abs() < 1e-6);
/// assert!((n.z - 0.8).abs() < 1e-6);
///
/// assert_eq!(vec_normalize(Vec3::ZERO), Vec3::ZERO);
/// ```
#[must_use]
pub fn vec_normalize(vector: Vec3) -> Vec3 {
    if !vector.is_finite() {
        return Vec3::ZERO;
    }
    vector.try_normalize().unwrap_or(Vec3::ZERO)
}

/// Shortens `vector` to at most `max_length`, keeping its direction.
///
/// Negative limits are treated as zero.
#[must_use]
pub fn truncate(vector: Vec3, max_length: f32) -> Vec3 {
    let limit = max_length.max(0.0);
    if vector.length_squared() > limit * limit {
        vec_normalize(vector) * limit
    } else {
        vector
    }
}

/// Component of `vector` along the unit vector `axis`.
#[must_use]
pub fn parallel_component(vector: Vec3, axis: Vec3) -> Vec3 {
    axis * vector.dot(axis)
}

/// Component of `vector` orthogonal to the unit vector `axis`.
#[must_use]
pub fn perpendicular_component(vector: Vec3, axis: Vec3) -> Vec3 {
    vector - parallel_component(vector, axis)
}

/// Closest point to `point` on the segment `start..end`, with the clamped
/// segment parameter in `[0, 1]`.
#[must_use]
pub fn closest_point_on_segment(point: Vec3, start: Vec3, end: Vec3) -> (Vec3, f32) {
    let segment = end - start;
    let length_squared = segment.length_squared();
    if length_squared <= f32::EPSILON {
        return (start, 0.0);
    }
    let t = ((point - start).dot(segment) / length_squared).clamp(0.0, 1.0);
    (start + segment * t, t)
}

/// Two unit vectors completing `normal` into an orthonormal basis.
///
/// `normal` does not need to be normalised; a zero normal is treated as
/// [`UP`].
#[must_use]
pub fn orthonormal_basis(normal: Vec3) -> (Vec3, Vec3) {
    let normalised = vec_normalize(normal);
    let axis = if normalised == Vec3::ZERO { UP } else { normalised };
    let helper = if axis.x.abs() < 0.9 { Vec3::X } else { Vec3::Y };
    let first = vec_normalize(axis.cross(helper));
    let second = axis.cross(first);
    (first, second)
}

/// Random unit vector lying in the plane orthogonal to `normal`.
pub fn random_unit_in_plane(normal: Vec3, rng: &mut dyn RngCore) -> Vec3 {
    let (first, second) = orthonormal_basis(normal);
    let angle = rng.gen_range(0.0..std::f32::consts::TAU);
    first * angle.cos() + second * angle.sin()
}
