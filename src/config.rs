use std::error;
use std::fmt;
use std::fs::File;
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use nalgebra::Point3;

use crate::bounds::{BoundsError, VolumeBounds};
use crate::field::FieldKind;
use crate::ply::{PlyDestination, DEFAULT_FILE_NAME, DEFAULT_OUTPUT_DIRECTORY};

pub const DEFAULT_STEP_SIZE: f32 = 0.1;
pub const DEFAULT_MIN: f32 = -5.0;
pub const DEFAULT_MAX: f32 = 5.0;
pub const DEFAULT_ISOVALUE: f32 = 1.0;

#[derive(Debug, Clone)]
pub enum ConfigError {
    DeserializingError(ron::de::Error),
    FileNotFound,
    PermissionDenied,
    InvalidBounds(BoundsError),
    UnexpectedError,
}

impl error::Error for ConfigError {}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ConfigError::DeserializingError(err) => write!(
                f,
                "An error occurred while deserializing parameter file: {}",
                err
            ),
            ConfigError::FileNotFound => write!(f, "File was not found."),
            ConfigError::PermissionDenied => {
                write!(f, "Permission denied while accessing the file.")
            }
            ConfigError::InvalidBounds(err) => write!(f, "Invalid volume bounds: {}", err),
            ConfigError::UnexpectedError => write!(f, "An unexpected error occurred."),
        }
    }
}

impl From<ron::de::Error> for ConfigError {
    fn from(err: ron::de::Error) -> Self {
        ConfigError::DeserializingError(err)
    }
}

impl From<io::Error> for ConfigError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => ConfigError::FileNotFound,
            io::ErrorKind::PermissionDenied => ConfigError::PermissionDenied,
            _ => ConfigError::UnexpectedError,
        }
    }
}

impl From<BoundsError> for ConfigError {
    fn from(err: BoundsError) -> Self {
        ConfigError::InvalidBounds(err)
    }
}

/// Everything a single run needs to know.
///
/// The `[min, max)` range applies to all three axes unless `y_range` or
/// `z_range` override it. Missing fields take their default values when
/// deserialized.
#[derive(Debug, Clone, PartialEq, serde::Deserialize)]
#[serde(default)]
pub struct RunParameters {
    pub step_size: f32,
    pub min: f32,
    pub max: f32,
    pub y_range: Option<(f32, f32)>,
    pub z_range: Option<(f32, f32)>,
    pub isovalue: f32,
    pub field: FieldKind,
    pub output_directory: PathBuf,
    pub file_name: String,
}

impl Default for RunParameters {
    fn default() -> Self {
        RunParameters {
            step_size: DEFAULT_STEP_SIZE,
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
            y_range: None,
            z_range: None,
            isovalue: DEFAULT_ISOVALUE,
            field: FieldKind::default(),
            output_directory: PathBuf::from(DEFAULT_OUTPUT_DIRECTORY),
            file_name: String::from(DEFAULT_FILE_NAME),
        }
    }
}

impl RunParameters {
    pub fn from_ron_str(source: &str) -> Result<Self, ConfigError> {
        let parameters = ron::de::from_str(source)?;

        Ok(parameters)
    }

    /// Validates the ranges and step size.
    pub fn volume_bounds(&self) -> Result<VolumeBounds, ConfigError> {
        let (y_min, y_max) = self.y_range.unwrap_or((self.min, self.max));
        let (z_min, z_max) = self.z_range.unwrap_or((self.min, self.max));

        let bounds = VolumeBounds::new(
            Point3::new(self.min, y_min, z_min),
            Point3::new(self.max, y_max, z_max),
            self.step_size,
        )?;

        Ok(bounds)
    }

    pub fn destination(&self) -> PlyDestination {
        PlyDestination::new(self.output_directory.clone(), self.file_name.clone())
    }
}

/// Loads run parameters from a RON file.
pub fn open<P: AsRef<Path>>(path: P) -> Result<RunParameters, ConfigError> {
    let file = File::open(path)?;
    let buf_reader = BufReader::new(file);
    let parameters = ron::de::from_reader(buf_reader)?;

    Ok(parameters)
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::fs;
    use std::process;

    use crate::bounds::Axis;

    use super::*;

    #[test]
    fn test_run_parameters_default() {
        let parameters = RunParameters::default();
        let bounds = parameters.volume_bounds().unwrap();

        assert_eq!(bounds.minimum_point(), Point3::new(-5.0, -5.0, -5.0));
        assert_eq!(bounds.maximum_point(), Point3::new(5.0, 5.0, 5.0));
        assert_eq!(bounds.step_size(), 0.1);
        assert_eq!(parameters.isovalue, 1.0);
        assert_eq!(parameters.field, FieldKind::Sphere);
        assert_eq!(parameters.destination(), PlyDestination::default());
    }

    #[test]
    fn test_run_parameters_from_ron_str_fills_defaults() {
        let parameters =
            RunParameters::from_ron_str("(step_size: 0.25, field: Torus, isovalue: 0.0)").unwrap();

        assert_eq!(parameters.step_size, 0.25);
        assert_eq!(parameters.field, FieldKind::Torus);
        assert_eq!(parameters.isovalue, 0.0);
        assert_eq!(parameters.min, DEFAULT_MIN);
        assert_eq!(parameters.file_name, DEFAULT_FILE_NAME);
    }

    #[test]
    fn test_run_parameters_axis_overrides() {
        let parameters = RunParameters::from_ron_str(
            "(min: -1.0, max: 1.0, y_range: Some((0.0, 4.0)), z_range: Some((-2.0, 2.0)))",
        )
        .unwrap();
        let bounds = parameters.volume_bounds().unwrap();

        assert_eq!(bounds.minimum_point(), Point3::new(-1.0, 0.0, -2.0));
        assert_eq!(bounds.maximum_point(), Point3::new(1.0, 4.0, 2.0));
    }

    #[test]
    fn test_run_parameters_from_ron_str_rejects_garbage() {
        let result = RunParameters::from_ron_str("(step_size: \"fast\")");

        assert!(matches!(result, Err(ConfigError::DeserializingError(_))));
    }

    #[test]
    fn test_run_parameters_invalid_bounds() {
        let parameters = RunParameters {
            y_range: Some((3.0, 1.0)),
            ..RunParameters::default()
        };

        assert!(matches!(
            parameters.volume_bounds(),
            Err(ConfigError::InvalidBounds(BoundsError::InvertedAxis {
                axis: Axis::Y,
                ..
            }))
        ));
    }

    #[test]
    fn test_run_parameters_invalid_step() {
        let parameters = RunParameters {
            step_size: 0.0,
            ..RunParameters::default()
        };

        assert!(matches!(
            parameters.volume_bounds(),
            Err(ConfigError::InvalidBounds(BoundsError::NonPositiveStep(_)))
        ));
    }

    #[test]
    fn test_open_missing_file() {
        let result = open("this/file/does/not/exist.ron");

        assert!(matches!(result, Err(ConfigError::FileNotFound)));
    }

    #[test]
    fn test_open_reads_file() {
        let path = env::temp_dir().join(format!("isosurface_mesher_config_{}.ron", process::id()));
        fs::write(&path, "(field: Mobius, file_name: \"mobius.ply\")").unwrap();

        let parameters = open(&path).unwrap();

        assert_eq!(parameters.field, FieldKind::Mobius);
        assert_eq!(parameters.destination().path(), Path::new("OutputPLYFiles/mobius.ply"));

        fs::remove_file(&path).unwrap();
    }
}
