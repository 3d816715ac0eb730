//! Behavioural guarantees shared by every steering behaviour.
//!
//! Covers zero-input idempotence, force and speed clamping, compound
//! additivity, balanced magnitude preservation and the strength round trip.
use approx::assert_relative_eq;
use glam::Vec3;
use rstest::rstest;
use steerage::steering::{
    compound::balance, BalancedCompound, Compound, Evade, Flee, Pursuit, PursuitConfig, Seek,
    Throttled,
};
use steerage::{EntityId, MovingEntityConfig, SteeringBehaviour, Target};
use test_utils::{agent, agent_with, rng, steer, world_of, FixedForce};

fn at_own_position(id: EntityId, which: &str) -> Box<dyn SteeringBehaviour> {
    let here = Some(Target::Point(Vec3::new(3.0, 0.0, -2.0)));
    match which {
        "seek" => Box::new(Seek::new(id, here)),
        "flee" => Box::new(Flee::new(id, here)),
        "pursuit" => Box::new(Pursuit::new(id, here, &PursuitConfig::default()).unwrap()),
        "evade" => Box::new(Evade::new(id, here, &PursuitConfig::default()).unwrap()),
        other => panic!("unknown behaviour {other}"),
    }
}

#[rstest]
#[case::seek("seek")]
#[case::flee("flee")]
#[case::pursuit("pursuit")]
#[case::evade("evade")]
fn stationary_target_at_agent_gives_zero_force(#[case] which: &str) {
    let (world, ids) = world_of([agent(Vec3::new(3.0, 0.0, -2.0))]);
    let mut behaviour = at_own_position(ids[0], which);
    assert_eq!(steer(&world, behaviour.as_mut()), Vec3::ZERO);
}

#[rstest]
#[case::seek_far(Vec3::new(1_000.0, 0.0, 0.0))]
#[case::seek_behind(Vec3::new(-50.0, 20.0, -50.0))]
fn tick_clamps_force_and_speed(#[case] goal: Vec3) {
    let limits = MovingEntityConfig {
        move_speed: 50.0,
        max_move_speed: 2.0,
        max_force: 0.5,
        ..MovingEntityConfig::default()
    };
    let (mut world, ids) = world_of([agent_with(Vec3::ZERO, Vec3::ZERO, &limits)]);
    let mut seek = Seek::new(ids[0], Some(goal.into()));
    let mut source = rng();
    for _ in 0..50 {
        let applied = seek.tick(&mut world, &mut source, 0.1);
        assert!(applied.length() <= 0.5 + 1e-5);
        assert!(world.get(ids[0]).unwrap().speed() <= 2.0 + 1e-5);
    }
}

#[test]
fn huge_fixed_force_is_clamped() {
    let (mut world, ids) = world_of([agent(Vec3::ZERO)]);
    let mut push = FixedForce::new(ids[0], Vec3::new(1e6, -1e6, 1e6));
    let mut source = rng();
    let applied = push.tick(&mut world, &mut source, 1.0);
    assert_relative_eq!(applied.length(), 1.0, epsilon = 1e-5);
    assert_relative_eq!(world.get(ids[0]).unwrap().speed(), 1.0, epsilon = 1e-5);
}

#[test]
fn compound_sums_children() {
    let (world, ids) = world_of([agent(Vec3::ZERO), agent(Vec3::new(4.0, 0.0, 3.0))]);
    let me = ids[0];
    let goal = Vec3::new(0.0, 0.0, 10.0);
    let mut compound = Compound::new(me)
        .with(Seek::new(me, Some(goal.into())))
        .with(Flee::new(me, Some(Target::Entity(ids[1]))))
        .with(FixedForce::new(me, Vec3::new(0.25, 0.5, 0.0)));

    let expected = steer(&world, &mut Seek::new(me, Some(goal.into())))
        + steer(&world, &mut Flee::new(me, Some(Target::Entity(ids[1]))))
        + Vec3::new(0.25, 0.5, 0.0);
    let total = steer(&world, &mut compound);
    assert!(total.abs_diff_eq(expected, 1e-5), "{total} != {expected}");
}

#[rstest]
#[case::three(vec![Vec3::new(3.0, 0.0, 0.0), Vec3::new(0.0, 1.0, 0.0), Vec3::new(0.0, 0.0, -0.5)])]
#[case::four(vec![
    Vec3::new(10.0, 0.0, 0.0),
    Vec3::new(-1.0, 2.0, 0.0),
    Vec3::new(0.0, 0.0, 4.0),
    Vec3::new(0.5, 0.5, 0.5),
])]
fn balanced_compound_preserves_total_magnitude(#[case] forces: Vec<Vec3>) {
    let (world, ids) = world_of([agent(Vec3::ZERO)]);
    let raw: Vec3 = forces.iter().copied().sum();
    let mut compound = forces
        .iter()
        .fold(BalancedCompound::new(ids[0]), |compound, &force| {
            compound.with(FixedForce::new(ids[0], force))
        });

    let balanced = steer(&world, &mut compound);
    assert_relative_eq!(balanced.length(), raw.length(), epsilon = 1e-4);
    assert!(!balanced.abs_diff_eq(raw, 1e-3));
    assert_eq!(balance(&forces), balanced);
}

#[test]
fn balancing_disabled_is_a_plain_sum() {
    let (world, ids) = world_of([agent(Vec3::ZERO)]);
    let mut compound = BalancedCompound::new(ids[0])
        .with(FixedForce::new(ids[0], Vec3::X * 3.0))
        .with(FixedForce::new(ids[0], Vec3::Y))
        .with(FixedForce::new(ids[0], Vec3::Z));
    compound.set_balancing(false);
    assert_eq!(steer(&world, &mut compound), Vec3::new(3.0, 1.0, 1.0));
}

#[test]
fn clearing_strength_restores_full_steering() {
    let (world, ids) = world_of([agent(Vec3::ZERO)]);
    let goal = Vec3::new(2.0, 0.0, 7.0);
    let mut throttled = Throttled::new(Seek::new(ids[0], Some(goal.into())));
    let mut source = rng();
    let mut ctx = steerage::SteeringContext::new(&world, &mut source, 0.1);
    let full = throttled.full_steering(&mut ctx);

    throttled.set_velocity_strength(0.3);
    assert!(throttled.calculate_steering(&mut ctx).abs_diff_eq(full * 0.3, 1e-6));
    throttled.set_axis_strength(1.0, 0.0, 0.5);
    assert_eq!(
        throttled.calculate_steering(&mut ctx),
        full * Vec3::new(1.0, 0.0, 0.5)
    );
    throttled.turn_off_strength_control();
    assert_eq!(throttled.calculate_steering(&mut ctx), full);
}
