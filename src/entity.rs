//! Moving entities and the handles behaviours use to refer to them.
//!
//! Behaviours never own an entity. They hold an [`EntityId`] and read the
//! entity out of the [`World`](crate::world::World) each tick, so the
//! application stays free to move, retune or remove entities between ticks.
use std::cell::{Ref, RefCell};
use std::rc::Rc;

use glam::{Quat, Vec3};
use serde::{Deserialize, Serialize};

use crate::error::{non_negative, positive, ConfigResult};
use crate::vector_math::{orthonormal_basis, vec_normalize, FORWARD, UP};
use crate::DEFAULT_MASS;

/// Entity identifier with type safety.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EntityId(pub u64);

impl From<u64> for EntityId {
    fn from(id: u64) -> Self {
        Self(id)
    }
}

impl EntityId {
    /// Raw numeric value.
    #[must_use]
    pub const fn into_inner(self) -> u64 {
        self.0
    }
}

/// What an entity represents to the behaviours observing it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    /// A steered character.
    #[default]
    Agent,
    /// Something to avoid or hide behind; may still move.
    Obstacle,
    /// Immovable scenery.
    Static,
}

impl EntityKind {
    /// Whether steering forces may move entities of this kind.
    #[must_use]
    pub const fn is_movable(self) -> bool {
        !matches!(self, Self::Static)
    }
}

/// Tunable limits of a [`MovingEntity`], validated together.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MovingEntityConfig {
    /// Body mass; must be positive.
    pub mass: f32,
    /// Mass of carried equipment added to the body mass when integrating.
    pub equipment_mass: f32,
    /// Cruising speed behaviours aim for.
    pub move_speed: f32,
    /// Hard cap on velocity magnitude.
    pub max_move_speed: f32,
    /// Hard cap on steering force magnitude.
    pub max_force: f32,
    /// Fraction of the way toward the heading covered per second.
    pub rotation_speed: f32,
    /// Bounding radius used for neighbourhood and collision estimates.
    pub radius: f32,
}

impl Default for MovingEntityConfig {
    fn default() -> Self {
        Self {
            mass: DEFAULT_MASS,
            equipment_mass: 0.0,
            move_speed: 1.0,
            max_move_speed: 1.0,
            max_force: 1.0,
            rotation_speed: 1.0,
            radius: 0.0,
        }
    }
}

/// Kinematic state of something that can be steered or observed.
#[derive(Debug, Clone, PartialEq)]
pub struct MovingEntity {
    /// What the entity represents; [`EntityKind::Static`] entities are never
    /// moved by the integrator.
    pub kind: EntityKind,
    /// World-space position.
    pub position: Vec3,
    /// World-space orientation; [`FORWARD`] rotated by it is the facing.
    pub orientation: Quat,
    /// Current velocity shared by every behaviour acting on the entity.
    pub velocity: Vec3,
    /// Acceleration applied during the most recent integration.
    pub acceleration: Vec3,
    mass: f32,
    equipment_mass: f32,
    move_speed: f32,
    max_move_speed: f32,
    max_force: f32,
    rotation_speed: f32,
    radius: f32,
}

impl MovingEntity {
    /// Create an entity with default limits.
    #[must_use]
    pub fn new(kind: EntityKind, position: Vec3) -> Self {
        let defaults = MovingEntityConfig::default();
        Self {
            kind,
            position,
            orientation: Quat::IDENTITY,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            mass: defaults.mass,
            equipment_mass: defaults.equipment_mass,
            move_speed: defaults.move_speed,
            max_move_speed: defaults.max_move_speed,
            max_force: defaults.max_force,
            rotation_speed: defaults.rotation_speed,
            radius: defaults.radius,
        }
    }

    /// Create an entity and apply `config` in one validated step.
    ///
    /// # Errors
    /// Fails when the mass is not positive or any other limit is negative.
    ///
    /// # Examples
    /// ```
    /// use glam::Vec3;
    /// use steerage::entity::{EntityKind, MovingEntity, MovingEntityConfig};
    ///
    /// let config = MovingEntityConfig { move_speed: 3.0, ..Default::default() };
    /// let agent = MovingEntity::from_config(EntityKind::Agent, Vec3::ZERO, &config).unwrap();
    /// assert_eq!(agent.max_move_speed(), 3.0);
    /// ```
    pub fn from_config(
        kind: EntityKind,
        position: Vec3,
        config: &MovingEntityConfig,
    ) -> ConfigResult<Self> {
        let mut entity = Self::new(kind, position);
        entity.set_mass(config.mass)?;
        entity.set_equipment_mass(config.equipment_mass)?;
        entity.set_max_move_speed(config.max_move_speed)?;
        entity.set_move_speed(config.move_speed)?;
        entity.set_max_force(config.max_force)?;
        entity.set_rotation_speed(config.rotation_speed)?;
        entity.set_radius(config.radius)?;
        Ok(entity)
    }

    /// Body mass.
    #[must_use]
    pub const fn mass(&self) -> f32 {
        self.mass
    }

    /// Set the body mass.
    ///
    /// # Errors
    /// Rejects zero, negative and non-finite masses.
    pub fn set_mass(&mut self, mass: f32) -> ConfigResult<()> {
        self.mass = positive("mass", mass)?;
        Ok(())
    }

    /// Mass of carried equipment.
    #[must_use]
    pub const fn equipment_mass(&self) -> f32 {
        self.equipment_mass
    }

    /// Set the carried equipment mass.
    ///
    /// # Errors
    /// Rejects negative and non-finite masses.
    pub fn set_equipment_mass(&mut self, mass: f32) -> ConfigResult<()> {
        self.equipment_mass = non_negative("equipment_mass", mass)?;
        Ok(())
    }

    /// Body mass plus equipment mass; always positive.
    #[must_use]
    pub fn total_mass(&self) -> f32 {
        self.mass + self.equipment_mass
    }

    /// Cruising speed.
    #[must_use]
    pub const fn move_speed(&self) -> f32 {
        self.move_speed
    }

    /// Set the cruising speed, raising the maximum speed if it would be
    /// exceeded.
    ///
    /// # Errors
    /// Rejects negative and non-finite speeds.
    pub fn set_move_speed(&mut self, speed: f32) -> ConfigResult<()> {
        self.move_speed = non_negative("move_speed", speed)?;
        if self.max_move_speed < self.move_speed {
            self.max_move_speed = self.move_speed;
        }
        Ok(())
    }

    /// Velocity magnitude cap.
    #[must_use]
    pub const fn max_move_speed(&self) -> f32 {
        self.max_move_speed
    }

    /// Set the velocity magnitude cap.
    ///
    /// # Errors
    /// Rejects negative and non-finite speeds.
    pub fn set_max_move_speed(&mut self, speed: f32) -> ConfigResult<()> {
        self.max_move_speed = non_negative("max_move_speed", speed)?;
        Ok(())
    }

    /// Steering force cap.
    #[must_use]
    pub const fn max_force(&self) -> f32 {
        self.max_force
    }

    /// Set the steering force cap.
    ///
    /// # Errors
    /// Rejects negative and non-finite forces.
    pub fn set_max_force(&mut self, force: f32) -> ConfigResult<()> {
        self.max_force = non_negative("max_force", force)?;
        Ok(())
    }

    /// Heading interpolation rate per second.
    #[must_use]
    pub const fn rotation_speed(&self) -> f32 {
        self.rotation_speed
    }

    /// Set the heading interpolation rate.
    ///
    /// # Errors
    /// Rejects negative and non-finite rates.
    pub fn set_rotation_speed(&mut self, speed: f32) -> ConfigResult<()> {
        self.rotation_speed = non_negative("rotation_speed", speed)?;
        Ok(())
    }

    /// Bounding radius.
    #[must_use]
    pub const fn radius(&self) -> f32 {
        self.radius
    }

    /// Set the bounding radius.
    ///
    /// # Errors
    /// Rejects negative and non-finite radii.
    pub fn set_radius(&mut self, radius: f32) -> ConfigResult<()> {
        self.radius = non_negative("radius", radius)?;
        Ok(())
    }

    /// Current speed.
    #[must_use]
    pub fn speed(&self) -> f32 {
        self.velocity.length()
    }

    /// Unit heading: the velocity direction while moving, otherwise the
    /// orientation's forward axis.
    #[must_use]
    pub fn forward(&self) -> Vec3 {
        let moving = vec_normalize(self.velocity);
        if moving == Vec3::ZERO {
            vec_normalize(self.orientation * FORWARD)
        } else {
            moving
        }
    }

    /// Unit vector to the entity's side, perpendicular to forward and up.
    #[must_use]
    pub fn side(&self) -> Vec3 {
        let forward = self.forward();
        let side = vec_normalize(UP.cross(forward));
        if side == Vec3::ZERO {
            orthonormal_basis(forward).0
        } else {
            side
        }
    }

    /// Cosine of the angle between the heading and the direction to `point`.
    ///
    /// Positive means ahead, negative behind, zero when `point` coincides
    /// with the entity.
    #[must_use]
    pub fn forwardness(&self, point: Vec3) -> f32 {
        self.forward().dot(vec_normalize(point - self.position))
    }

    /// Distance between the two entity centres.
    #[must_use]
    pub fn distance_to(&self, other: &Self) -> f32 {
        self.position.distance(other.position)
    }

    /// Position after travelling `time` seconds at the current velocity.
    #[must_use]
    pub fn predict_position(&self, time: f32) -> Vec3 {
        self.position + self.velocity * time
    }

    /// Time at which `self` and `other` are closest assuming both keep their
    /// velocities. Negative values mean the closest approach is in the past.
    #[must_use]
    pub fn predict_nearest_approach_time(&self, other: &Self) -> f32 {
        let relative_velocity = other.velocity - self.velocity;
        let relative_speed = relative_velocity.length();
        if relative_speed <= f32::EPSILON {
            return 0.0;
        }
        let tangent = relative_velocity / relative_speed;
        let relative_position = self.position - other.position;
        tangent.dot(relative_position) / relative_speed
    }

    /// Predicted positions of `self` and `other` after `time` seconds.
    #[must_use]
    pub fn nearest_approach_positions(&self, other: &Self, time: f32) -> (Vec3, Vec3) {
        (self.predict_position(time), other.predict_position(time))
    }

    /// Boid neighbourhood test: anything closer than `min_distance` counts,
    /// anything beyond `max_distance` does not, and in between `other` must
    /// lie within `max_angle` radians of the heading.
    #[must_use]
    pub fn in_neighbourhood(
        &self,
        other: &Self,
        min_distance: f32,
        max_distance: f32,
        max_angle: f32,
    ) -> bool {
        let offset = other.position - self.position;
        let distance = offset.length();
        if distance < min_distance {
            return true;
        }
        if distance > max_distance {
            return false;
        }
        self.forward().dot(vec_normalize(offset)) >= max_angle.cos()
    }
}

/// Shared, caller-managed list of entities such as neighbours or obstacles.
///
/// Cloning the group clones the handle, not the list: every behaviour holding
/// a clone observes edits the caller makes between ticks.
#[derive(Debug, Clone, Default)]
pub struct EntityGroup(Rc<RefCell<Vec<EntityId>>>);

impl EntityGroup {
    /// Create a group from an initial membership.
    #[must_use]
    pub fn new(members: Vec<EntityId>) -> Self {
        Self(Rc::new(RefCell::new(members)))
    }

    /// Add a member.
    pub fn push(&self, id: EntityId) {
        self.0.borrow_mut().push(id);
    }

    /// Remove every occurrence of `id`.
    pub fn remove(&self, id: EntityId) {
        self.0.borrow_mut().retain(|member| *member != id);
    }

    /// Replace the whole membership.
    pub fn replace(&self, members: Vec<EntityId>) {
        *self.0.borrow_mut() = members;
    }

    /// Borrow the current membership.
    ///
    /// # Panics
    /// Panics if the group is being mutated at the same time, which a
    /// single-threaded tick never does.
    #[must_use]
    pub fn members(&self) -> Ref<'_, [EntityId]> {
        Ref::map(self.0.borrow(), Vec::as_slice)
    }

    /// Number of members.
    #[must_use]
    pub fn len(&self) -> usize {
        self.0.borrow().len()
    }

    /// Whether the group has no members.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.borrow().is_empty()
    }
}

impl FromIterator<EntityId> for EntityGroup {
    fn from_iter<I: IntoIterator<Item = EntityId>>(iter: I) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
