//! Numeric conversion helpers used across the project.
//!
//! These utilities guard conversions between floating-point and integer
//! domains when behaviours size grids from world dimensions.

/// Number of whole `step`-sized cells that fit in `extent`, never less than one.
///
/// Non-finite inputs collapse to a single cell so a degenerate volume still
/// yields a target at its centre.
///
/// # Examples
/// ```
/// use steerage::numeric::cell_count;
/// assert_eq!(cell_count(10.0, 5.0), 2);
/// assert_eq!(cell_count(0.0, 5.0), 1);
/// assert_eq!(cell_count(12.0, 5.0), 2);
/// ```
#[expect(
    clippy::cast_possible_truncation,
    clippy::cast_sign_loss,
    reason = "The floored ratio is checked to be finite and at least one."
)]
#[must_use]
pub fn cell_count(extent: f32, step: f32) -> usize {
    let ratio = (extent / step).floor();
    if !ratio.is_finite() || ratio < 1.0 {
        return 1;
    }
    ratio as usize
}

/// Convert a grid index back into `f32` space.
#[expect(
    clippy::cast_precision_loss,
    reason = "Grid sizes stay far below the f32 mantissa limit."
)]
#[must_use]
pub fn index_to_f32(index: usize) -> f32 {
    index as f32
}
