//! Constructor validation.
//!
//! Bad parameters are rejected with a typed error at construction and never
//! silently clamped.
use std::rc::Rc;

use glam::Vec3;
use rstest::rstest;
use steerage::steering::{
    BoxExplore, BoxExploreConfig, Cohesion, Containment, ContainmentConfig, Hide, HideConfig,
    LeaderFollowing, LeaderFollowingConfig, NeighbourhoodConfig, PathFollow, PathFollowConfig,
    SphereWander, SphereWanderConfig, WallApproach, WallApproachConfig,
};
use steerage::{
    Aabb, ConfigError, EntityGroup, EntityId, EntityKind, MovingEntity, MovingEntityConfig,
    MAX_EXPLORE_WAYPOINTS,
};
use test_utils::{agent, world_of};

#[rstest]
#[case::negative_subdivision(
    BoxExploreConfig { subdivision: -1.0, ..BoxExploreConfig::default() },
    ConfigError::NotPositive { parameter: "subdivision", value: -1.0 }
)]
#[case::negative_width_x(
    BoxExploreConfig { width_x: -2.0, ..BoxExploreConfig::default() },
    ConfigError::Negative { parameter: "width_x", value: -2.0 }
)]
#[case::negative_width_z(
    BoxExploreConfig { width_z: -2.0, ..BoxExploreConfig::default() },
    ConfigError::Negative { parameter: "width_z", value: -2.0 }
)]
#[case::negative_height(
    BoxExploreConfig { height: -3.0, ..BoxExploreConfig::default() },
    ConfigError::Negative { parameter: "height", value: -3.0 }
)]
#[case::grid_past_the_cap(
    BoxExploreConfig { width_x: 1e6, width_z: 1e6, height: 1e6, subdivision: 1.0, ..BoxExploreConfig::default() },
    ConfigError::TooManyWaypoints { limit: MAX_EXPLORE_WAYPOINTS }
)]
#[case::cell_count_overflows(
    BoxExploreConfig { width_x: 1e30, width_z: 1e30, height: 1e30, subdivision: 1.0, ..BoxExploreConfig::default() },
    ConfigError::TooManyWaypoints { limit: MAX_EXPLORE_WAYPOINTS }
)]
fn box_explore_rejects(#[case] config: BoxExploreConfig, #[case] expected: ConfigError) {
    assert_eq!(BoxExplore::new(EntityId(0), &config).unwrap_err(), expected);
}

#[rstest]
#[case::random_factor_high(SphereWanderConfig { random_factor: 1.5, ..SphereWanderConfig::default() }, "random_factor")]
#[case::random_factor_low(SphereWanderConfig { random_factor: -0.1, ..SphereWanderConfig::default() }, "random_factor")]
#[case::rotation_factor_high(SphereWanderConfig { rotation_factor: 2.0, ..SphereWanderConfig::default() }, "rotation_factor")]
fn sphere_wander_rejects_factors_outside_unit_range(
    #[case] config: SphereWanderConfig,
    #[case] name: &str,
) {
    let error = SphereWander::new(EntityId(0), &config).unwrap_err();
    assert!(
        matches!(error, ConfigError::OutOfRange { parameter, .. } if parameter == name),
        "{error}"
    );
}

#[rstest]
#[case::empty(vec![])]
#[case::single(vec![Vec3::ONE])]
fn path_needs_two_points(#[case] points: Vec<Vec3>) {
    let found = points.len();
    assert_eq!(
        PathFollow::new(EntityId(0), points, &PathFollowConfig::default()).unwrap_err(),
        ConfigError::InsufficientPathPoints { found }
    );
}

#[test]
fn path_rejects_negative_radius() {
    let config = PathFollowConfig {
        radius: -1.0,
        ..PathFollowConfig::default()
    };
    assert!(PathFollow::new(EntityId(0), vec![Vec3::ZERO, Vec3::X], &config).is_err());
}

#[test]
fn neighbourhood_rejects_negative_distances() {
    let config = NeighbourhoodConfig {
        min_distance: -5.0,
        ..NeighbourhoodConfig::default()
    };
    assert!(Cohesion::new(EntityId(0), EntityGroup::default(), &config).is_err());
}

#[test]
fn leader_and_threat_must_exist() {
    let (world, ids) = world_of([agent(Vec3::ZERO)]);
    let ghost = EntityId(99);
    assert_eq!(
        LeaderFollowing::new(ids[0], ghost, &world, &LeaderFollowingConfig::default())
            .unwrap_err(),
        ConfigError::UnknownEntity {
            role: "leader",
            id: ghost
        }
    );
    assert!(matches!(
        Hide::new(ids[0], ghost, EntityGroup::default(), &world, &HideConfig::default()),
        Err(ConfigError::UnknownEntity { role: "threat", .. })
    ));
}

#[test]
fn containment_needs_a_bounded_volume() {
    let open = Aabb::new(Vec3::splat(f32::NEG_INFINITY), Vec3::splat(f32::INFINITY)).unwrap();
    assert_eq!(
        Containment::new(EntityId(0), Rc::new(open), &ContainmentConfig::default()).unwrap_err(),
        ConfigError::UnboundedVolume
    );
}

#[test]
fn wall_offset_must_not_be_negative() {
    let wall = Rc::new(Aabb::new(Vec3::ZERO, Vec3::ONE).unwrap());
    let config = WallApproachConfig { offset: -0.5 };
    assert!(WallApproach::new(EntityId(0), wall, &config).is_err());
}

#[test]
fn inverted_area_is_rejected() {
    assert_eq!(
        Aabb::new(Vec3::ONE, Vec3::ZERO).unwrap_err(),
        ConfigError::InvalidArea
    );
}

#[rstest]
#[case::zero_mass(MovingEntityConfig { mass: 0.0, ..MovingEntityConfig::default() })]
#[case::negative_speed(MovingEntityConfig { move_speed: -1.0, ..MovingEntityConfig::default() })]
#[case::negative_force(MovingEntityConfig { max_force: -1.0, ..MovingEntityConfig::default() })]
#[case::nan_radius(MovingEntityConfig { radius: f32::NAN, ..MovingEntityConfig::default() })]
fn entity_limits_are_validated(#[case] limits: MovingEntityConfig) {
    assert!(MovingEntity::from_config(EntityKind::Agent, Vec3::ZERO, &limits).is_err());
}
