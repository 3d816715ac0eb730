//! Behaviours that modulate one another through a shared strength handle.
use glam::Vec3;
use rstest::rstest;
use steerage::steering::{
    Arrive, ArriveConfig, Compound, Queuing, QueuingConfig, Seek, Strength, StrengthHandle,
    Throttled,
};
use steerage::{EntityGroup, MovingEntityConfig, SteeringBehaviour};
use test_utils::{agent, agent_with, rng, steer, world_of};

fn cruiser() -> MovingEntityConfig {
    MovingEntityConfig {
        move_speed: 2.0,
        max_move_speed: 2.0,
        max_force: 10.0,
        ..MovingEntityConfig::default()
    }
}

#[rstest]
#[case::stopped_ahead(Vec3::ZERO, 0.25)]
#[case::slower_ahead(Vec3::new(0.0, 0.0, 1.0), 0.5)]
fn queuing_brakes_the_throttled_sibling(#[case] front_velocity: Vec3, #[case] brake: f32) {
    let (world, ids) = world_of([
        agent_with(Vec3::ZERO, Vec3::new(0.0, 0.0, 2.0), &cruiser()),
        agent_with(Vec3::new(0.0, 0.0, 1.0), front_velocity, &cruiser()),
    ]);
    let (me, front) = (ids[0], ids[1]);
    let goal = Vec3::new(20.0, 0.0, 0.0);
    let handle = StrengthHandle::new();
    let mut queue = Compound::new(me)
        .with(
            Queuing::new(
                me,
                EntityGroup::new(vec![front]),
                handle.clone(),
                &QueuingConfig::default(),
            )
            .unwrap(),
        )
        .with(Throttled::with_handle(
            Seek::new(me, Some(goal.into())),
            handle.clone(),
        ));

    let unbraked = steer(&world, &mut Seek::new(me, Some(goal.into())));
    assert_ne!(unbraked, Vec3::ZERO);
    let braked = steer(&world, &mut queue);
    assert_eq!(handle.get(), Strength::Scalar(brake));
    assert!(braked.abs_diff_eq(unbraked * brake, 1e-6), "{braked}");
}

#[test]
fn queuing_releases_the_brake_once_clear() {
    let (mut world, ids) = world_of([
        agent_with(Vec3::ZERO, Vec3::new(0.0, 0.0, 1.0), &cruiser()),
        agent(Vec3::new(0.0, 0.0, 1.0)),
    ]);
    let handle = StrengthHandle::new();
    let mut queuing = Queuing::new(
        ids[0],
        EntityGroup::new(vec![ids[1]]),
        handle.clone(),
        &QueuingConfig::default(),
    )
    .unwrap();

    steer(&world, &mut queuing);
    assert_ne!(handle.get(), Strength::Full);
    world.get_mut(ids[1]).unwrap().position = Vec3::new(0.0, 0.0, 50.0);
    steer(&world, &mut queuing);
    assert_eq!(handle.get(), Strength::Full);
}

#[test]
fn arrive_ramp_throttles_a_sibling() {
    let (world, ids) = world_of([agent(Vec3::ZERO)]);
    let me = ids[0];
    let handle = StrengthHandle::new();
    let config = ArriveConfig {
        slowing_distance: Some(8.0),
        target_radius: Some(0.5),
    };
    let goal = Vec3::new(4.0, 0.0, 0.0);
    let mut approach = Compound::new(me)
        .with(
            Arrive::new(me, Some(goal.into()), &config)
                .unwrap()
                .with_container(handle.clone()),
        )
        .with(Throttled::with_handle(
            Seek::new(me, Some(Vec3::new(0.0, 0.0, 4.0).into())),
            handle,
        ));
    // Arrive contributes its unscaled seek; the sibling is halved.
    let force = steer(&world, &mut approach);
    assert!(force.abs_diff_eq(Vec3::new(1.0, 0.0, 0.5), 1e-6), "{force}");
}

#[test]
fn shared_handles_are_the_same_slot() {
    let inner = Throttled::new(Seek::new(steerage::EntityId(0), None));
    let handle = inner.strength_handle();
    assert!(handle.same_slot(&inner.strength_handle()));
    assert!(!handle.same_slot(&StrengthHandle::new()));
}

#[test]
fn throttled_tick_integrates_scaled_force() {
    let (mut world, ids) = world_of([agent(Vec3::ZERO)]);
    let mut throttled = Throttled::new(Seek::new(ids[0], Some(Vec3::new(10.0, 0.0, 0.0).into())));
    throttled.set_velocity_strength(0.5);
    let mut source = rng();
    let applied = throttled.tick(&mut world, &mut source, 1.0);
    assert!(applied.abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
    assert!(world
        .get(ids[0])
        .unwrap()
        .position
        .abs_diff_eq(Vec3::new(0.5, 0.0, 0.0), 1e-6));
}
