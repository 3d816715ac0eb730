//! Following a polyline corridor.

use glam::Vec3;
use log::debug;
use serde::{Deserialize, Serialize};

use super::{seek_force, SteeringBehaviour, SteeringContext};
use crate::entity::{EntityId, MovingEntity};
use crate::error::{non_negative, ConfigError, ConfigResult};
use crate::vector_math::{closest_point_on_segment, vec_normalize};

/// Tuning for [`PathFollow`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PathFollowConfig {
    /// Radius of the tube around the spine.
    pub radius: f32,
    /// Strength of the pull toward the spine while inside the tube.
    pub cohesion: f32,
}

impl Default for PathFollowConfig {
    fn default() -> Self {
        Self {
            radius: 1.0,
            cohesion: 0.5,
        }
    }
}

/// Walks a polyline segment by segment.
///
/// The cursor moves to the next segment once the agent crosses the plane
/// through the current segment's end, perpendicular to the segment. Outside
/// the tube the agent seeks the closest spine point; inside it runs along the
/// segment with a pull toward the spine. Passing the last segment finishes
/// the behaviour.
#[derive(Debug, Clone)]
pub struct PathFollow {
    entity: EntityId,
    points: Vec<Vec3>,
    radius: f32,
    cohesion: f32,
    segment: usize,
}

impl PathFollow {
    /// Follow `points` in order on behalf of `entity`.
    ///
    /// # Errors
    /// Needs at least two points; rejects a negative radius or cohesion.
    pub fn new(entity: EntityId, points: Vec<Vec3>, config: &PathFollowConfig) -> ConfigResult<Self> {
        if points.len() < 2 {
            return Err(ConfigError::InsufficientPathPoints {
                found: points.len(),
            });
        }
        Ok(Self {
            entity,
            points,
            radius: non_negative("radius", config.radius)?,
            cohesion: non_negative("cohesion", config.cohesion)?,
            segment: 0,
        })
    }

    /// The path's points.
    #[must_use]
    pub fn points(&self) -> &[Vec3] {
        &self.points
    }

    /// Index of the segment currently being followed.
    #[must_use]
    pub const fn current_segment(&self) -> usize {
        self.segment
    }

    /// Number of segments in the path.
    #[must_use]
    pub fn segment_count(&self) -> usize {
        self.points.len() - 1
    }

    /// Restart from the first segment.
    pub fn reset(&mut self) {
        self.segment = 0;
    }

    fn segment_at(&self, index: usize) -> Option<(Vec3, Vec3)> {
        self.points
            .get(index)
            .copied()
            .zip(self.points.get(index + 1).copied())
    }

    fn advance(&mut self, position: Vec3) {
        while let Some((start, end)) = self.segment_at(self.segment) {
            let direction = vec_normalize(end - start);
            if (position - end).dot(direction) < 0.0 {
                break;
            }
            self.segment += 1;
            debug!("{:?} reached path segment {}", self.entity, self.segment);
        }
    }

    fn steer_along(&self, agent: &MovingEntity, start: Vec3, end: Vec3) -> Vec3 {
        let (closest, _) = closest_point_on_segment(agent.position, start, end);
        let to_spine = closest - agent.position;
        if to_spine.length() > self.radius {
            return seek_force(agent, closest);
        }
        let desired = vec_normalize(end - start) * agent.move_speed() + to_spine * self.cohesion;
        desired - agent.velocity
    }
}

impl SteeringBehaviour for PathFollow {
    fn entity(&self) -> EntityId {
        self.entity
    }

    fn calculate_steering(&mut self, ctx: &mut SteeringContext<'_>) -> Vec3 {
        let Some(agent) = ctx.entity(self.entity) else {
            return Vec3::ZERO;
        };
        self.advance(agent.position);
        self.segment_at(self.segment)
            .map_or(Vec3::ZERO, |(start, end)| self.steer_along(agent, start, end))
    }

    fn is_finished(&self) -> bool {
        self.segment >= self.segment_count()
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

    fn steer(world: &World, path: &mut PathFollow) -> Vec3 {
        let mut rng = ChaCha8Rng::seed_from_u64(0);
        let mut ctx = SteeringContext::new(world, &mut rng, 0.1);
        path.calculate_steering(&mut ctx)
    }

    #[rstest]
    #[case::empty(vec![])]
    #[case::single(vec![Vec3::ZERO])]
    fn needs_two_points(#[case] points: Vec<Vec3>) {
        let found = points.len();
        assert_eq!(
            PathFollow::new(EntityId(0), points, &PathFollowConfig::default()).unwrap_err(),
            ConfigError::InsufficientPathPoints { found }
        );
    }

    #[test]
    fn rejects_negative_radius() {
        let config = PathFollowConfig {
            radius: -1.0,
            ..PathFollowConfig::default()
        };
        assert!(PathFollow::new(EntityId(0), vec![Vec3::ZERO, Vec3::X], &config).is_err());
    }

    #[test]
    fn outside_tube_seeks_spine() {
        let mut world = World::new();
        let id = world.spawn(MovingEntity::new(EntityKind::Agent, Vec3::new(5.0, 0.0, 4.0)));
        let mut path = PathFollow::new(
            id,
            vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)],
            &PathFollowConfig::default(),
        )
        .unwrap();
        assert!(steer(&world, &mut path).abs_diff_eq(Vec3::NEG_Z, 1e-6));
    }

    #[test]
    fn inside_tube_runs_along_segment() {
        let mut world = World::new();
        let id = world.spawn(MovingEntity::new(EntityKind::Agent, Vec3::new(2.0, 0.0, 0.5)));
        let config = PathFollowConfig {
            radius: 1.0,
            cohesion: 1.0,
        };
        let mut path =
            PathFollow::new(id, vec![Vec3::ZERO, Vec3::new(10.0, 0.0, 0.0)], &config).unwrap();
        let force = steer(&world, &mut path);
        assert!(force.abs_diff_eq(Vec3::new(1.0, 0.0, -0.5), 1e-6), "{force:?}");
    }

    #[test]
    fn finishes_after_last_exit_plane() {
        let mut world = World::new();
        let id = world.spawn(MovingEntity::new(EntityKind::Agent, Vec3::new(0.0, 0.0, 0.0)));
        let mut path = PathFollow::new(
            id,
            vec![Vec3::ZERO, Vec3::X, Vec3::new(1.0, 0.0, 1.0)],
            &PathFollowConfig::default(),
        )
        .unwrap();

        if let Some(agent) = world.get_mut(id) {
            agent.position = Vec3::new(1.0, 0.0, 0.5);
        }
        steer(&world, &mut path);
        assert_eq!(path.current_segment(), 1);
        assert!(!path.is_finished());

        if let Some(agent) = world.get_mut(id) {
            agent.position = Vec3::new(1.0, 0.0, 2.0);
        }
        assert_eq!(steer(&world, &mut path), Vec3::ZERO);
        assert!(path.is_finished());
    }
}
