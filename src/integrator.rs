//! Turns steering forces into motion.
//!
//! Every behaviour funnels its force through [`integrate`]: the force is
//! clamped, divided by the entity's total mass, accumulated into the entity's
//! velocity, and the velocity is applied to position and heading. Velocity is
//! stored on the entity, so any number of behaviours acting on the same
//! entity share one velocity history.

use glam::{Mat3, Quat, Vec3};
use log::{trace, warn};

use crate::entity::MovingEntity;
use crate::vector_math::{truncate, vec_normalize, FORWARD, UP};
use crate::MIN_MASS;

/// Computes acceleration from a force vector and mass.
///
/// Returns `None` if `mass` is non-positive or effectively zero (see
/// [`MIN_MASS`]).
///
/// # Examples
///
/// ```
/// use glam::Vec3;
/// use steerage::applied_acceleration;
/// let a = applied_acceleration(Vec3::new(7.0, -14.0, 21.0), 7.0).unwrap();
/// assert!((a - Vec3::new(1.0, -2.0, 3.0)).length() < 1e-6);
/// assert!(applied_acceleration(Vec3::X, 0.0).is_none());
/// ```
#[must_use]
pub fn applied_acceleration(force: Vec3, mass: f32) -> Option<Vec3> {
    (mass > MIN_MASS).then(|| force / mass)
}

/// Rotation whose forward axis points along `direction` with `up` as the
/// preferred vertical.
///
/// Returns `None` for a zero direction, where a look rotation is undefined.
/// When `direction` is parallel to `up` the shortest arc from [`FORWARD`] is
/// used instead.
#[must_use]
pub fn look_rotation(direction: Vec3, up: Vec3) -> Option<Quat> {
    let forward = vec_normalize(direction);
    if forward == Vec3::ZERO {
        return None;
    }
    let right = vec_normalize(up.cross(forward));
    if right == Vec3::ZERO {
        return Some(Quat::from_rotation_arc(FORWARD, forward));
    }
    let true_up = forward.cross(right);
    Some(Quat::from_mat3(&Mat3::from_cols(right, true_up, forward)).normalize())
}

/// Apply `force` to `entity` for a tick of `dt` seconds.
///
/// The force is truncated to the entity's max force, converted to an
/// acceleration by total mass, added to velocity, and the velocity truncated
/// to the max move speed. Position advances by `velocity * dt` and the
/// orientation slerps toward the velocity direction by
/// `rotation_speed * dt`. A zero velocity leaves the orientation alone.
///
/// Returns the force actually applied after clamping. Static entities ignore
/// the force and keep their state.
pub fn integrate(entity: &mut MovingEntity, force: Vec3, dt: f32) -> Vec3 {
    if !entity.kind.is_movable() {
        trace!("force ignored for static entity at {}", entity.position);
        return Vec3::ZERO;
    }
    let applied = truncate(force, entity.max_force());
    let Some(acceleration) = applied_acceleration(applied, entity.total_mass()) else {
        warn!(
            "force ignored for entity with invalid mass {}",
            entity.total_mass()
        );
        return Vec3::ZERO;
    };

    entity.acceleration = acceleration;
    entity.velocity = truncate(entity.velocity + acceleration, entity.max_move_speed());
    entity.position += entity.velocity * dt;

    if let Some(heading) = look_rotation(entity.velocity, UP) {
        let step = (entity.rotation_speed() * dt).clamp(0.0, 1.0);
        entity.orientation = entity.orientation.slerp(heading, step).normalize();
    }

    applied
}
