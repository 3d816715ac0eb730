//! Steering constants used across behaviours.
//!
//! These values are tuning defaults rather than configuration; behaviours that
//! expose a knob for one of them take it through their config struct.

/// Mass given to freshly created entities.
pub const DEFAULT_MASS: f32 = 1.0;
/// Smallest mass accepted by the integrator before a force is ignored.
pub const MIN_MASS: f32 = 1e-6;
/// Tolerance added to arrival radii so agents settle instead of oscillating.
pub const ERROR_FACTOR: f32 = 0.001;
/// Fraction of the initial target distance used as the default slowing
/// distance for arrive.
pub const DEFAULT_SLOWING_FRACTION: f32 = 0.1;
/// Cosine separating "parallel" from "perpendicular" courses in unaligned
/// collision avoidance (roughly 45 degrees).
pub const PARALLEL_COSINE: f32 = 0.707;
/// Close hits in wall approach are those within this multiple of the nearest
/// hit distance.
pub const CLOSE_HIT_FACTOR: f32 = 1.5;
/// Number of rays cast by wall approach.
pub const WALL_RAY_COUNT: usize = 14;
/// Default look-ahead used by containment to predict the next position.
pub const DEFAULT_CONTAINMENT_LOOKAHEAD: f32 = 1.0;
/// Upper bound on the waypoint grid laid out by box and sphere explore.
pub const MAX_EXPLORE_WAYPOINTS: usize = 1 << 20;
