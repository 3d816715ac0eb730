#![cfg_attr(docsrs, feature(doc_cfg))]
//! Library crate providing composable steering behaviours for game
//! characters.
//!
//! Behaviours turn the state of a [`World`] into per-tick steering forces;
//! the [`integrator`] turns those forces into motion. A [`Simulation`] ties a
//! world, a seeded random source and the attached behaviours together, and
//! [`scenario`] builds one from a JSON description.
pub mod constants;
pub mod entity;
pub mod error;
pub mod integrator;
pub mod logging;
pub mod numeric;
pub mod scenario;
pub mod simulation;
pub mod spatial;
pub mod steering;
pub mod vector_math;
pub mod world;
pub use constants::*;

// Re-export commonly used items
pub use entity::{EntityGroup, EntityId, EntityKind, MovingEntity, MovingEntityConfig};
pub use error::{ConfigError, ConfigResult};
pub use integrator::{applied_acceleration, integrate, look_rotation};
pub use logging::init as init_logging;
pub use scenario::{Scenario, ScenarioError};
pub use simulation::Simulation;
pub use spatial::{Aabb, BoundingVolume, RayCaster, RayHit, Sphere};
pub use steering::{SteeringBehaviour, SteeringContext, Target};
pub use vector_math::{vec_normalize, FORWARD, UP};
pub use world::World;

pub mod prelude {
    //! Prelude exports used in documentation examples.
    //!
    //! ```rust,no_run
    //! use steerage::prelude::*;
    //! ```

    pub use crate::entity::{EntityGroup, EntityId, EntityKind, MovingEntity};
    pub use crate::simulation::Simulation;
    pub use crate::steering::{
        Arrive, Compound, Seek, SteeringBehaviour, SteeringContext, Target, Throttled,
    };
    pub use crate::world::World;
    pub use glam::Vec3;
    pub use ordered_float::OrderedFloat;
}
