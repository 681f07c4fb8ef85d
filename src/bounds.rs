use std::error;
use std::fmt;

use nalgebra::Point3;

/// Upper bound on the number of floats reserved up front for a mesh buffer.
///
/// The per-cell estimate grows with the cube of the resolution, so small step
/// sizes would otherwise reserve gigabytes before a single cell is visited.
const MAX_RESERVED_FLOATS: usize = 1 << 24;

/// Rough number of floats a single cell contributes to a mesh buffer. Most
/// cells emit nothing, the ones on the surface emit 1-2 triangles.
const FLOATS_PER_CELL_HINT: usize = 12;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Axis::X => write!(f, "x"),
            Axis::Y => write!(f, "y"),
            Axis::Z => write!(f, "z"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BoundsError {
    NonPositiveStep(f32),
    StepBelowPrecision { axis: Axis, step_size: f32 },
    NonFiniteParameter,
    InvertedAxis { axis: Axis, min: f32, max: f32 },
}

impl error::Error for BoundsError {}

impl fmt::Display for BoundsError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            BoundsError::NonPositiveStep(step_size) => write!(
                f,
                "Step size must be greater than zero, got {}.",
                step_size
            ),
            BoundsError::StepBelowPrecision { axis, step_size } => write!(
                f,
                "Step size {} is too small to advance along the {} axis.",
                step_size, axis
            ),
            BoundsError::NonFiniteParameter => {
                write!(f, "Volume bounds and step size must be finite numbers.")
            }
            BoundsError::InvertedAxis { axis, min, max } => write!(
                f,
                "Maximum of the {} axis ({}) must be greater than its minimum ({}).",
                axis, max, min
            ),
        }
    }
}

/// Axis-aligned block of space swept by the marching cubes, together with the
/// edge length of a single (cubic) cell.
///
/// The volume is half-open: cell origins start at `minimum_point` and advance
/// by `step_size` while they stay below `maximum_point`. The last cell on each
/// axis may therefore reach past the maximum by less than one step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VolumeBounds {
    minimum_point: Point3<f32>,
    maximum_point: Point3<f32>,
    step_size: f32,
}

impl VolumeBounds {
    /// Creates new volume bounds, rejecting parameters for which the sweep
    /// would never terminate or never start.
    pub fn new(
        minimum_point: Point3<f32>,
        maximum_point: Point3<f32>,
        step_size: f32,
    ) -> Result<Self, BoundsError> {
        let all_finite = minimum_point.iter().all(|c| c.is_finite())
            && maximum_point.iter().all(|c| c.is_finite())
            && step_size.is_finite();
        if !all_finite {
            return Err(BoundsError::NonFiniteParameter);
        }

        if step_size <= 0.0 {
            return Err(BoundsError::NonPositiveStep(step_size));
        }

        for (axis, min, max) in [
            (Axis::X, minimum_point.x, maximum_point.x),
            (Axis::Y, minimum_point.y, maximum_point.y),
            (Axis::Z, minimum_point.z, maximum_point.z),
        ]
        .iter()
        .copied()
        {
            if max <= min {
                return Err(BoundsError::InvertedAxis { axis, min, max });
            }

            // The sweep advances by repeated addition, which stalls once the
            // step drops below the precision of the coordinate. The coordinate
            // with the largest magnitude is always one of the endpoints.
            let largest = if min.abs() > max.abs() { min } else { max };
            if largest + step_size <= largest {
                return Err(BoundsError::StepBelowPrecision { axis, step_size });
            }
        }

        Ok(VolumeBounds {
            minimum_point,
            maximum_point,
            step_size,
        })
    }

    /// Creates a cube-shaped volume with the same `[min, max)` range on all
    /// three axes.
    pub fn cube(min: f32, max: f32, step_size: f32) -> Result<Self, BoundsError> {
        Self::new(
            Point3::new(min, min, min),
            Point3::new(max, max, max),
            step_size,
        )
    }

    pub fn minimum_point(&self) -> Point3<f32> {
        self.minimum_point
    }

    pub fn maximum_point(&self) -> Point3<f32> {
        self.maximum_point
    }

    pub fn step_size(&self) -> f32 {
        self.step_size
    }

    /// Number of cells along each axis, counting the trailing partial cell.
    pub fn cell_counts(&self) -> [usize; 3] {
        let span = self.maximum_point - self.minimum_point;
        // Float to int `as` casts saturate, which is what we want here.
        [
            (span.x / self.step_size).ceil() as usize,
            (span.y / self.step_size).ceil() as usize,
            (span.z / self.step_size).ceil() as usize,
        ]
    }

    /// Heuristic number of floats to reserve for a vertex (or normal) buffer
    /// of a mesh built from this volume.
    pub fn estimated_float_capacity(&self) -> usize {
        let [x, y, z] = self.cell_counts();

        x.saturating_mul(y)
            .saturating_mul(z)
            .saturating_mul(FLOATS_PER_CELL_HINT)
            .min(MAX_RESERVED_FLOATS)
    }
}
