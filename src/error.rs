//! Configuration errors raised when assembling behaviours.
//!
//! Every behaviour validates its parameters once, in its constructor, and
//! reports the first problem it finds. Nothing here is raised during a tick:
//! runtime gaps such as a missing target resolve to a zero force instead.

use thiserror::Error;

use crate::entity::EntityId;

/// Reason a behaviour or entity could not be configured.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    /// A parameter that must be zero or greater was negative.
    #[error("{parameter} must not be negative (got {value})")]
    Negative {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Value supplied by the caller.
        value: f32,
    },
    /// A parameter that must be strictly positive was zero or negative.
    #[error("{parameter} must be greater than zero (got {value})")]
    NotPositive {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Value supplied by the caller.
        value: f32,
    },
    /// A parameter fell outside its closed range.
    #[error("{parameter} must lie within [{min}, {max}] (got {value})")]
    OutOfRange {
        /// Name of the offending parameter.
        parameter: &'static str,
        /// Value supplied by the caller.
        value: f32,
        /// Inclusive lower bound.
        min: f32,
        /// Inclusive upper bound.
        max: f32,
    },
    /// A parameter was NaN or infinite.
    #[error("{parameter} must be finite")]
    NotFinite {
        /// Name of the offending parameter.
        parameter: &'static str,
    },
    /// A path needs at least two points to form a segment.
    #[error("a path needs at least 2 points (got {found})")]
    InsufficientPathPoints {
        /// Number of points supplied.
        found: usize,
    },
    /// A required entity reference is not present in the world.
    #[error("{role} entity {id:?} does not exist")]
    UnknownEntity {
        /// What the entity was meant to be, e.g. "leader".
        role: &'static str,
        /// Identifier that failed to resolve.
        id: EntityId,
    },
    /// A containment volume without finite bounds.
    #[error("containment volume must be bounded")]
    UnboundedVolume,
    /// An axis-aligned area whose minimum corner exceeds its maximum.
    #[error("area minimum corner must not exceed its maximum corner")]
    InvalidArea,
    /// An explore grid would hold more waypoints than allowed.
    #[error("explore grid exceeds {limit} waypoints")]
    TooManyWaypoints {
        /// Largest accepted waypoint count.
        limit: usize,
    },
}

/// Result alias used by constructors and setters.
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Rejects NaN/infinite and negative values.
///
/// # Errors
/// Returns [`ConfigError::NotFinite`] or [`ConfigError::Negative`].
pub fn non_negative(parameter: &'static str, value: f32) -> ConfigResult<f32> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { parameter });
    }
    if value < 0.0 {
        return Err(ConfigError::Negative { parameter, value });
    }
    Ok(value)
}

/// Rejects NaN/infinite, zero and negative values.
///
/// # Errors
/// Returns [`ConfigError::NotFinite`] or [`ConfigError::NotPositive`].
pub fn positive(parameter: &'static str, value: f32) -> ConfigResult<f32> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { parameter });
    }
    if value <= 0.0 {
        return Err(ConfigError::NotPositive { parameter, value });
    }
    Ok(value)
}

/// Rejects values outside `[min, max]`.
///
/// # Errors
/// Returns [`ConfigError::NotFinite`] or [`ConfigError::OutOfRange`].
pub fn within(parameter: &'static str, value: f32, min: f32, max: f32) -> ConfigResult<f32> {
    if !value.is_finite() {
        return Err(ConfigError::NotFinite { parameter });
    }
    if value < min || value > max {
        return Err(ConfigError::OutOfRange {
            parameter,
            value,
            min,
            max,
        });
    }
    Ok(value)
}
