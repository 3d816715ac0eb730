//! Seek that slows to a halt at the target.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{seek_force, SteeringBehaviour, SteeringContext, StrengthHandle, Target};
use crate::entity::EntityId;
use crate::error::{non_negative, ConfigResult};
use crate::{DEFAULT_SLOWING_FRACTION, ERROR_FACTOR};

/// Tuning for [`Arrive`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ArriveConfig {
    /// Distance at which slowing starts. Defaults to
    /// [`DEFAULT_SLOWING_FRACTION`] of the distance at the first tick.
    pub slowing_distance: Option<f32>,
    /// Radius around the target counted as arrived. Defaults to the target
    /// entity's radius, or zero for a point.
    pub target_radius: Option<f32>,
}

/// Strength multiplier for an agent `distance` away from a target.
///
/// Zero within `target_radius + ERROR_FACTOR`, one at or beyond
/// `slowing_distance`, and `distance / slowing_distance` in between.
///
/// # Examples
/// ```
/// use steerage::steering::arrive::arrival_strength;
///
/// assert_eq!(arrival_strength(20.0, 10.0, 1.0), 1.0);
/// assert_eq!(arrival_strength(5.0, 10.0, 1.0), 0.5);
/// assert_eq!(arrival_strength(1.0, 10.0, 1.0), 0.0);
/// ```
#[must_use]
pub fn arrival_strength(distance: f32, slowing_distance: f32, target_radius: f32) -> f32 {
    if distance <= target_radius + ERROR_FACTOR {
        0.0
    } else if slowing_distance <= 0.0 || distance >= slowing_distance {
        1.0
    } else {
        distance / slowing_distance
    }
}

/// Seeks a target, ramping its force down inside the slowing distance.
///
/// With a container handle the ramp is written into the handle and the
/// unscaled seek force returned, so the ramp throttles whichever behaviour
/// reads that handle.
#[derive(Debug, Clone)]
pub struct Arrive {
    entity: EntityId,
    target: Option<Target>,
    configured_slowing: Option<f32>,
    slowing_distance: Option<f32>,
    target_radius: Option<f32>,
    container: Option<StrengthHandle>,
}

impl Arrive {
    /// Arrive at `target` on behalf of `entity`.
    ///
    /// # Errors
    /// Rejects negative slowing distances and radii.
    pub fn new(entity: EntityId, target: Option<Target>, config: &ArriveConfig) -> ConfigResult<Self> {
        let slowing = config
            .slowing_distance
            .map(|distance| non_negative("slowing_distance", distance))
            .transpose()?;
        let target_radius = config
            .target_radius
            .map(|radius| non_negative("target_radius", radius))
            .transpose()?;
        Ok(Self {
            entity,
            target,
            configured_slowing: slowing,
            slowing_distance: slowing,
            target_radius,
            container: None,
        })
    }

    /// Write the ramp into `container` instead of scaling the own force.
    #[must_use]
    pub fn with_container(mut self, container: StrengthHandle) -> Self {
        self.container = Some(container);
        self
    }

    /// Replace the target. A derived slowing distance is recomputed on the
    /// next tick.
    pub fn set_target(&mut self, target: impl Into<Target>) {
        self.target = Some(target.into());
        self.slowing_distance = self.configured_slowing;
    }

    /// Slowing distance in effect, if already known.
    #[must_use]
    pub const fn slowing_distance(&self) -> Option<f32> {
        self.slowing_distance
    }

    /// Strength this behaviour applies at `distance` from a target of
    /// `target_radius`.
    #[must_use]
    pub fn strength_for_distance(&self, distance: f32, target_radius: f32) -> f32 {
        arrival_strength(
            distance,
            self.slowing_distance.unwrap_or(0.0),
            self.target_radius.unwrap_or(target_radius),
        )
    }
}

impl SteeringBehaviour for Arrive {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        let Some(state) = self.target.and_then(|target| target.resolve(ctx.world)) else {
            return Vec3::ZERO;
        };

        let distance = agent.position.distance(state.position);
        self.slowing_distance
            .get_or_insert(DEFAULT_SLOWING_FRACTION * distance);
        let strength = self.strength_for_distance(distance, state.radius);
        let force = seek_force(agent, state.position);

        self.container.as_ref().map_or(force * strength, |container| {
            container.set_scalar(strength);
            force
        })
    }
}
