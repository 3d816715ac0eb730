//! Pursuit and evasion of a moving target by linear prediction.

use glam::Vec3;
use serde::{Deserialize, Serialize};

use super::{flee_force, seek_force, SteeringBehaviour, SteeringContext, Target, TargetState};
use crate::entity::{EntityId, MovingEntity};
use crate::error::{non_negative, ConfigResult};

/// Tuning shared by [`Pursuit`] and [`Evade`].
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PursuitConfig {
    /// Upper bound on how far ahead, in seconds, the target is extrapolated.
    pub max_prediction_time: Option<f32>,
}

impl PursuitConfig {
    fn validated(&self) -> ConfigResult<Option<f32>> {
        self.max_prediction_time
            .map(|time| non_negative("max_prediction_time", time))
            .transpose()
    }
}

/// Where `target` will be by the time `agent` could reach it.
///
/// The closing time is the current distance divided by the agent's cruising
/// speed; an agent that cannot move predicts no movement. A stationary
/// target is predicted where it stands.
#[must_use]
pub fn predicted_position(agent: &MovingEntity, target: &TargetState, cap: Option<f32>) -> Vec3 {
    let speed = agent.move_speed();
    if speed <= f32::EPSILON {
        return target.position;
    }
    let closing = agent.position.distance(target.position) / speed;
    let time = cap.map_or(closing, |limit| closing.min(limit));
    target.position + target.velocity * time
}

/// Seeks the target's predicted future position.
#[derive(Debug, Clone, PartialEq)]
pub struct Pursuit {
    entity: EntityId,
    target: Option<Target>,
    max_prediction_time: Option<f32>,
}

impl Pursuit {
    /// Pursue `target` on behalf of `entity`.
    ///
    /// # Errors
    /// Rejects a negative prediction cap.
    pub fn new(entity: EntityId, target: Option<Target>, config: &PursuitConfig) -> ConfigResult<Self> {
        Ok(Self {
            entity,
            target,
            max_prediction_time: config.validated()?,
        })
    }

    /// Replace the target.
    pub fn set_target(&mut self, target: impl Into<Target>) {
        self.target = Some(target.into());
    }
}

impl SteeringBehaviour for Pursuit {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        self.target
            .and_then(|target| target.resolve(ctx.world))
            .map_or(Vec3::ZERO, |state| {
                seek_force(agent, predicted_position(agent, &state, self.max_prediction_time))
            })
    }
}

/// Flees the target's predicted future position.
#[derive(Debug, Clone, PartialEq)]
pub struct Evade {
    entity: EntityId,
    target: Option<Target>,
    max_prediction_time: Option<f32>,
}

impl Evade {
    /// Evade `target` on behalf of `entity`.
    ///
    /// # Errors
    /// Rejects a negative prediction cap.
    pub fn new(entity: EntityId, target: Option<Target>, config: &PursuitConfig) -> ConfigResult<Self> {
        Ok(Self {
            entity,
            target,
            max_prediction_time: config.validated()?,
        })
    }

    /// Replace the target.
    pub fn set_target(&mut self, target: impl Into<Target>) {
        self.target = Some(target.into());
    }
}

impl SteeringBehaviour for Evade {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        self.target
            .and_then(|target| target.resolve(ctx.world))
            .map_or(Vec3::ZERO, |state| {
                flee_force(agent, predicted_position(agent, &state, self.max_prediction_time))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::EntityKind;
    use crate::error::ConfigError;
    use crate::world::World;
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;

    fn chase(prey_velocity: Vec3, config: &PursuitConfig) -> (Vec3, Vec3) {
        let mut world = World::new();
        let hunter = world.spawn(MovingEntity::new(EntityKind::Agent, Vec3::ZERO));
        let mut prey_body = MovingEntity::new(EntityKind::Agent, Vec3::new(0.0, 0.0, 4.0));
        prey_body.velocity = prey_velocity;
        let prey = world.spawn(prey_body);

        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = SteeringContext::new(&world, &mut rng, 0.1);
        let mut pursuit = Pursuit::new(hunter, Some(prey.into()), config).unwrap();
        let mut evade = Evade::new(hunter, Some(prey.into()), config).unwrap();
        (
            pursuit.calculate_steering(&mut ctx),
            evade.calculate_steering(&mut ctx),
        )
    }

    #[test]
    fn stationary_target_is_sought_directly() {
        let (pursue, evade) = chase(Vec3::ZERO, &PursuitConfig::default());
        assert!(pursue.abs_diff_eq(Vec3::Z, 1e-6));
        assert!(evade.abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn leads_a_moving_target() {
        // Closing time is 4 s at unit speed, so the prey is expected at (4, 0, 4).
        let (pursue, _) = chase(Vec3::X, &PursuitConfig::default());
        let expected = Vec3::new(4.0, 0.0, 4.0).normalize();
        assert!(pursue.abs_diff_eq(expected, 1e-5), "{pursue:?}");
    }

    #[test]
    fn prediction_cap_limits_lead() {
        let config = PursuitConfig {
            max_prediction_time: Some(0.0),
        };
        let (pursue, _) = chase(Vec3::X, &config);
        assert!(pursue.abs_diff_eq(Vec3::Z, 1e-6));
    }

    #[test]
    fn rejects_negative_cap() {
        let config = PursuitConfig {
            max_prediction_time: Some(-1.0),
        };
        assert!(matches!(
            Pursuit::new(EntityId(0), None, &config),
            Err(ConfigError::Negative { .. })
        ));
    }
}
