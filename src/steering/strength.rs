//! Strength scaling of a behaviour's intrinsic force.
//!
//! A [`Throttled`] behaviour multiplies the force of the behaviour it wraps by
//! the current [`Strength`]. The strength lives behind a shared
//! [`StrengthHandle`], so other behaviours (arrive's slow-down ramp, queuing's
//! braking) can modulate it without touching the wrapped behaviour.

use std::cell::Cell;
use std::rc::Rc;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{SteeringBehaviour, SteeringContext};
use crate::entity::EntityId;

/// Multiplier applied to a steering force.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Strength {
    /// No scaling.
    #[default]
    Full,
    /// Uniform scale.
    Scalar(f32),
    /// Independent scale per axis.
    PerAxis(Vec3),
}

impl Strength {
    /// Scale `force` by this strength.
    ///
    /// # Examples
    /// ```
    /// use glam::Vec3;
    /// use steerage::steering::Strength;
    ///
    /// let force = Vec3::new(2.0, 4.0, 6.0);
    /// assert_eq!(Strength::Full.apply(force), force);
    /// assert_eq!(Strength::Scalar(0.5).apply(force), Vec3::new(1.0, 2.0, 3.0));
    /// assert_eq!(
    ///     Strength::PerAxis(Vec3::new(1.0, 0.0, 0.5)).apply(force),
    ///     Vec3::new(2.0, 0.0, 3.0)
    /// );
    /// ```
    #[must_use]
    pub fn apply(self, force: Vec3) -> Vec3 {
        match self {
            Self::Full => force,
            Self::Scalar(scale) => force * scale,
            Self::PerAxis(scales) => force * scales,
        }
    }
}

/// Shared, writable strength slot.
///
/// Clones refer to the same slot. Setting a scalar clears any per-axis
/// multiplier and vice versa.
#[derive(Debug, Clone, Default)]
pub struct StrengthHandle(Rc<Cell<Strength>>);

impl StrengthHandle {
    /// New slot with no scaling.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current strength.
    #[must_use]
    pub fn get(&self) -> Strength {
        self.0.get()
    }

    /// Replace the strength outright.
    pub fn set(&self, strength: Strength) {
        self.0.set(strength);
    }

    /// Scale uniformly by `scale`.
    pub fn set_scalar(&self, scale: f32) {
        self.set(Strength::Scalar(scale));
    }

    /// Scale each axis independently.
    pub fn set_per_axis(&self, scales: Vec3) {
        self.set(Strength::PerAxis(scales));
    }

    /// Remove any scaling.
    pub fn turn_off(&self) {
        self.set(Strength::Full);
    }

    /// Whether two handles refer to the same slot.
    #[must_use]
    pub fn same_slot(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.0, &other.0)
    }
}

/// A behaviour whose output is scaled by a shared strength.
#[derive(Debug)]
pub struct Throttled<B> {
    inner: B,
    strength: StrengthHandle,
}

impl<B: SteeringBehaviour> Throttled<B> {
    /// Wrap `inner` with its own unscaled strength slot.
    pub fn new(inner: B) -> Self {
        Self::with_handle(inner, StrengthHandle::new())
    }

    /// Wrap `inner`, reading its strength from `strength`.
    pub const fn with_handle(inner: B, strength: StrengthHandle) -> Self {
        Self { inner, strength }
    }

    /// Handle other behaviours may write to throttle this one.
    #[must_use]
    pub fn strength_handle(&self) -> StrengthHandle {
        self.strength.clone()
    }

    /// Uniformly scale the output.
    pub fn set_velocity_strength(&mut self, scale: f32) {
        self.strength.set_scalar(scale);
    }

    /// Scale each output axis independently.
    pub fn set_axis_strength(&mut self, x: f32, y: f32, z: f32) {
        self.strength.set_per_axis(Vec3::new(x, y, z));
    }

    /// Let the intrinsic force through unchanged.
    pub fn turn_off_strength_control(&mut self) {
        self.strength.turn_off();
    }

    /// The wrapped behaviour's force before scaling.
    pub fn full_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        self.inner.calculate_steering(ctx)
    }

    /// The wrapped behaviour.
    pub const fn inner(&self) -> &B {
        &self.inner
    }

    /// The wrapped behaviour, mutably.
    pub fn inner_mut(&mut self) -> &mut B {
        &mut self.inner
    }
}

impl<B: SteeringBehaviour> SteeringBehaviour for Throttled<B> {
    fn entity(&self) -> EntityId {
        self.inner.entity()
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let full = self.full_steering(ctx);
        self.strength.get().apply(full)
    }

    fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}
