use std::fmt;

use nalgebra::{Point3, Vector3};

/// A continuous scalar function of a position in space, sampled by the
/// marching cubes at cell corners.
///
/// Implementations are expected to be pure: the same position always yields
/// the same value. Any `Fn(f32, f32, f32) -> f32` closure is a scalar field.
#[cfg_attr(test, mockall::automock)]
pub trait ScalarField {
    fn value_at(&self, x: f32, y: f32, z: f32) -> f32;
}

impl<F> ScalarField for F
where
    F: Fn(f32, f32, f32) -> f32,
{
    fn value_at(&self, x: f32, y: f32, z: f32) -> f32 {
        self(x, y, z)
    }
}

/// Catalogue of the built-in closed-form fields.
///
/// Each field can also be selected by its one-based numeric selector (see
/// [`FieldKind::from_selector`]).
///
/// [`FieldKind::from_selector`]: enum.FieldKind.html#method.from_selector
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    clap::ValueEnum,
    serde::Deserialize,
)]
pub enum FieldKind {
    /// `x² + y² + z²`
    Sphere,
    /// `y - sin(x) cos(z)`
    Sinusoid,
    /// `x² - y² - z² - z`
    HyperbolicParaboloid,
    /// Torus with major radius 3 and tube radius 1 around the z axis.
    Torus,
    /// `x² - y² - z³`
    Saddle,
    /// Product of distances to spheres of radius 3 and 1, negative between
    /// them.
    ShelledSphere,
    /// Torus whose tube is displaced along z by `sin(x + y + z)`.
    TwistedTorus,
    /// Strip twisting around the z axis.
    Mobius,
}

const TORUS_MAJOR_RADIUS: f32 = 3.0;
const TORUS_TUBE_RADIUS: f32 = 1.0;
const SHELL_OUTER_RADIUS: f32 = 3.0;
const SHELL_INNER_RADIUS: f32 = 1.0;
const MOBIUS_WIDTH: f32 = 0.5;
const MOBIUS_LOOP_RADIUS: f32 = 2.0;

impl FieldKind {
    pub const ALL: [FieldKind; 8] = [
        FieldKind::Sphere,
        FieldKind::Sinusoid,
        FieldKind::HyperbolicParaboloid,
        FieldKind::Torus,
        FieldKind::Saddle,
        FieldKind::ShelledSphere,
        FieldKind::TwistedTorus,
        FieldKind::Mobius,
    ];

    /// Picks a field by its one-based selector. Unknown selectors fall back to
    /// the sphere.
    pub fn from_selector(selector: u32) -> Self {
        match selector {
            2 => FieldKind::Sinusoid,
            3 => FieldKind::HyperbolicParaboloid,
            4 => FieldKind::Torus,
            5 => FieldKind::Saddle,
            6 => FieldKind::ShelledSphere,
            7 => FieldKind::TwistedTorus,
            8 => FieldKind::Mobius,
            _ => FieldKind::Sphere,
        }
    }

    pub fn selector(self) -> u32 {
        match self {
            FieldKind::Sphere => 1,
            FieldKind::Sinusoid => 2,
            FieldKind::HyperbolicParaboloid => 3,
            FieldKind::Torus => 4,
            FieldKind::Saddle => 5,
            FieldKind::ShelledSphere => 6,
            FieldKind::TwistedTorus => 7,
            FieldKind::Mobius => 8,
        }
    }
}

impl Default for FieldKind {
    fn default() -> Self {
        FieldKind::Sphere
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            FieldKind::Sphere => write!(f, "sphere"),
            FieldKind::Sinusoid => write!(f, "sinusoid"),
            FieldKind::HyperbolicParaboloid => write!(f, "hyperbolic paraboloid"),
            FieldKind::Torus => write!(f, "torus"),
            FieldKind::Saddle => write!(f, "saddle"),
            FieldKind::ShelledSphere => write!(f, "shelled sphere"),
            FieldKind::TwistedTorus => write!(f, "twisted torus"),
            FieldKind::Mobius => write!(f, "mobius strip"),
        }
    }
}

impl ScalarField for FieldKind {
    fn value_at(&self, x: f32, y: f32, z: f32) -> f32 {
        match self {
            FieldKind::Sphere => x * x + y * y + z * z,
            FieldKind::Sinusoid => y - x.sin() * z.cos(),
            FieldKind::HyperbolicParaboloid => x * x - y * y - z * z - z,
            FieldKind::Torus => {
                let d = (x * x + y * y).sqrt();
                (TORUS_MAJOR_RADIUS - d).powi(2) + z * z - TORUS_TUBE_RADIUS.powi(2)
            }
            FieldKind::Saddle => x * x - y * y - z * z * z,
            FieldKind::ShelledSphere => {
                let d = (x * x + y * y + z * z).sqrt();
                (d - SHELL_OUTER_RADIUS) * (d - SHELL_INNER_RADIUS)
            }
            FieldKind::TwistedTorus => {
                let d = (x * x + y * y).sqrt();
                let twist = (x + y + z).sin();
                (TORUS_MAJOR_RADIUS - d).powi(2) + (z - twist).powi(2)
                    - TORUS_TUBE_RADIUS.powi(2)
            }
            FieldKind::Mobius => {
                let (sin_z, cos_z) = z.sin_cos();
                let u = x * cos_z + y * sin_z;
                let v = -x * sin_z + y * cos_z;
                v * v - MOBIUS_LOOP_RADIUS * MOBIUS_LOOP_RADIUS + MOBIUS_WIDTH * u
            }
        }
    }
}

/// Field `field` moved by `offset`: the value at `p` is the inner field's value
/// at `p - offset`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Translated<F> {
    field: F,
    offset: Vector3<f32>,
}

impl<F: ScalarField> Translated<F> {
    pub fn new(field: F, offset: Vector3<f32>) -> Self {
        Translated { field, offset }
    }
}

impl<F: ScalarField> ScalarField for Translated<F> {
    fn value_at(&self, x: f32, y: f32, z: f32) -> f32 {
        let p = Point3::new(x, y, z) - self.offset;
        self.field.value_at(p.x, p.y, p.z)
    }
}
