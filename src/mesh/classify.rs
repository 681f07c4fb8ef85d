use bitflags::bitflags;
use nalgebra::Point3;

use crate::field::ScalarField;

bitflags! {
    /// Set of cell corners whose sampled value lies strictly below the
    /// isovalue.
    ///
    /// "Near" corners sit at `z + step`, "top" corners at `y + step` and
    /// "right" corners at `x + step`. The bit values index the triangulation
    /// table and must not change.
    pub struct ConfigurationCode: u8 {
        const FAR_BOTTOM_LEFT = 1;
        const FAR_BOTTOM_RIGHT = 2;
        const NEAR_BOTTOM_RIGHT = 4;
        const NEAR_BOTTOM_LEFT = 8;
        const FAR_TOP_LEFT = 16;
        const FAR_TOP_RIGHT = 32;
        const NEAR_TOP_RIGHT = 64;
        const NEAR_TOP_LEFT = 128;
    }
}

/// Corner offsets (in steps, relative to the cell origin) in bit order of the
/// configuration code.
pub const CORNER_OFFSETS: [[u8; 3]; 8] = [
    [0, 0, 0],
    [1, 0, 0],
    [1, 0, 1],
    [0, 0, 1],
    [0, 1, 0],
    [1, 1, 0],
    [1, 1, 1],
    [0, 1, 1],
];

/// Field samples at the 8 corners of a single cubic cell.
///
/// Samples are stored in bit order of [`ConfigurationCode`], so sample `i`
/// contributes bit `1 << i`.
///
/// [`ConfigurationCode`]: struct.ConfigurationCode.html
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CubeCell {
    samples: [f32; 8],
}

impl CubeCell {
    pub fn from_samples(samples: [f32; 8]) -> Self {
        CubeCell { samples }
    }

    /// Evaluates `field` once at each corner of the cell starting at `origin`
    /// with edge length `step_size`.
    pub fn sample<F>(field: &F, origin: Point3<f32>, step_size: f32) -> Self
    where
        F: ScalarField + ?Sized,
    {
        let near = [origin.x, origin.y, origin.z];
        let far = [
            origin.x + step_size,
            origin.y + step_size,
            origin.z + step_size,
        ];

        let mut samples = [0.0; 8];
        for (sample, offset) in samples.iter_mut().zip(CORNER_OFFSETS.iter()) {
            let pick = |axis: usize| {
                if offset[axis] == 0 {
                    near[axis]
                } else {
                    far[axis]
                }
            };
            *sample = field.value_at(pick(0), pick(1), pick(2));
        }

        CubeCell { samples }
    }

    pub fn samples(&self) -> &[f32; 8] {
        &self.samples
    }
}

/// Reduces the corner samples of `cell` to its configuration code. A corner is
/// inside when its sample is strictly less than `isovalue`; NaN samples are
/// never inside.
pub fn classify(cell: &CubeCell, isovalue: f32) -> ConfigurationCode {
    let bits = cell
        .samples
        .iter()
        .enumerate()
        .filter(|(_, sample)| **sample < isovalue)
        .fold(0u8, |bits, (i, _)| bits | 1 << i);

    ConfigurationCode::from_bits_truncate(bits)
}
