//! Aggregation of several behaviours into one force.

use glam::Vec3;
use log::trace;

use super::{SteeringBehaviour, SteeringContext};
use crate::entity::EntityId;
use crate::vector_math::vec_normalize;

/// Sum of its children's forces.
///
/// Children are evaluated once each per tick, in insertion order.
pub struct Compound {
    entity: EntityId,
    children: Vec<Box<dyn SteeringBehaviour>>,
}

impl Compound {
    /// Empty compound steering `entity`.
    #[must_use]
    pub fn new(entity: EntityId) -> Self {
        Self {
            entity,
            children: Vec::new(),
        }
    }

    /// Append a child behaviour.
    pub fn push(&mut self, child: Box<dyn SteeringBehaviour>) {
        if child.entity() != self.entity {
            trace!(
                "compound for {:?} adopting child bound to {:?}",
                self.entity,
                child.entity()
            );
        }
        self.children.push(child);
    }

    /// Builder form of [`Compound::push`].
    #[must_use]
    pub fn with(mut self, child: impl SteeringBehaviour + 'static) -> Self {
        self.push(Box::new(child));
        self
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.children.len()
    }

    /// Whether the compound has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.children.is_empty()
    }

    /// Each child's force for this tick, in order.
    pub fn partials(&mut self, ctx: &mut SteeringContext<'_>) -> Vec<Vec3> {
        self.children
            .iter_mut()
            .map(|child| child.calculate_steering(ctx))
            .collect()
    }
}

impl SteeringBehaviour for Compound {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        self.children
            .iter_mut()
            .map(|child| child.calculate_steering(ctx))
            .sum()
    }

    fn is_finished(&self) -> bool {
        !self.children.is_empty() && self.children.iter().all(|child| child.is_finished())
    }
}

/// Compound that redistributes its total force among children.
///
/// Each partial `p_i` contributes with weight `|p_i| / Σ|p_j|`, so strong
/// forces dominate the direction of the result more than in a plain sum. The
/// weighted direction is then rescaled to the magnitude of the plain sum:
/// balancing changes direction, never total magnitude. A zero plain sum is
/// returned as is.
pub struct BalancedCompound {
    inner: Compound,
    balancing: bool,
}

impl BalancedCompound {
    /// Empty balanced compound steering `entity`, with balancing enabled.
    #[must_use]
    pub fn new(entity: EntityId) -> Self {
        Self {
            inner: Compound::new(entity),
            balancing: true,
        }
    }

    /// Append a child behaviour.
    pub fn push(&mut self, child: Box<dyn SteeringBehaviour>) {
        self.inner.push(child);
    }

    /// Builder form of [`BalancedCompound::push`].
    #[must_use]
    pub fn with(mut self, child: impl SteeringBehaviour + 'static) -> Self {
        self.push(Box::new(child));
        self
    }

    /// Enable or disable balancing; disabled behaves as a plain [`Compound`].
    pub fn set_balancing(&mut self, enabled: bool) {
        self.balancing = enabled;
    }

    /// Whether balancing is enabled.
    #[must_use]
    pub const fn is_balancing(&self) -> bool {
        self.balancing
    }

    /// Number of children.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    /// Whether the compound has no children.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

/// Balance `partials` as described on [`BalancedCompound`].
///
/// # Examples
/// ```
/// use glam::Vec3;
/// use steerage::steering::compound::balance;
///
/// let partials = [Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0)];
/// let raw: Vec3 = partials.iter().sum();
/// let balanced = balance(&partials);
/// assert!((balanced.length() - raw.length()).abs() < 1e-5);
/// assert!(balanced.x / balanced.y > raw.x / raw.y);
/// ```
#[must_use]
pub fn balance(partials: &[Vec3]) -> Vec3 {
    let raw: Vec3 = partials.iter().sum();
    let total_magnitude: f32 = partials.iter().map(|partial| partial.length()).sum();
    if raw == Vec3::ZERO || total_magnitude <= f32::EPSILON {
        return raw;
    }
    let weighted: Vec3 = partials
        .iter()
        .map(|partial| *partial * (partial.length() / total_magnitude))
        .sum();
    let direction = vec_normalize(weighted);
    if direction == Vec3::ZERO {
        return raw;
    }
    direction * raw.length()
}

impl SteeringBehaviour for BalancedCompound {
    fn entity(&self) -> EntityId {
        self.inner.entity()
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        if !self.balancing {
            return self.inner.calculate_steering(ctx);
        }
        let partials = self.inner.partials(ctx);
        balance(&partials)
    }

    fn is_finished(&self) -> bool {
        self.inner.is_finished()
    }
}
