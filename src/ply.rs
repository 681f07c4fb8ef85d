use std::error;
use std::fmt;
use std::fs::{self, File};
use std::io::{self, BufWriter, Write};
use std::path::PathBuf;

use crate::mesh::{Mesh, FLOATS_PER_TRIANGLE, FLOATS_PER_VERTEX};

pub const DEFAULT_OUTPUT_DIRECTORY: &str = "OutputPLYFiles";
pub const DEFAULT_FILE_NAME: &str = "output.ply";

#[derive(Debug, Clone, PartialEq)]
pub enum PlyError {
    LengthMismatch { vertices: usize, normals: usize },
    NotTriangleAligned(usize),
    DirectoryNotFound,
    PermissionDenied,
    UnexpectedError,
}

impl error::Error for PlyError {}

impl fmt::Display for PlyError {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            PlyError::LengthMismatch { vertices, normals } => write!(
                f,
                "Vertex buffer ({} floats) and normal buffer ({} floats) differ in length.",
                vertices, normals
            ),
            PlyError::NotTriangleAligned(len) => write!(
                f,
                "Vertex buffer of {} floats does not contain whole triangles.",
                len
            ),
            PlyError::DirectoryNotFound => write!(f, "Output directory was not found."),
            PlyError::PermissionDenied => {
                write!(f, "Permission denied while writing the PLY file.")
            }
            PlyError::UnexpectedError => {
                write!(f, "An unexpected error occurred while writing the PLY file.")
            }
        }
    }
}

impl From<io::Error> for PlyError {
    fn from(err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => PlyError::DirectoryNotFound,
            io::ErrorKind::PermissionDenied => PlyError::PermissionDenied,
            _ => PlyError::UnexpectedError,
        }
    }
}

/// Where a finished mesh gets written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlyDestination {
    pub directory: PathBuf,
    pub file_name: String,
}

impl PlyDestination {
    pub fn new<P: Into<PathBuf>, S: Into<String>>(directory: P, file_name: S) -> Self {
        PlyDestination {
            directory: directory.into(),
            file_name: file_name.into(),
        }
    }

    pub fn path(&self) -> PathBuf {
        self.directory.join(&self.file_name)
    }
}

impl Default for PlyDestination {
    fn default() -> Self {
        PlyDestination::new(DEFAULT_OUTPUT_DIRECTORY, DEFAULT_FILE_NAME)
    }
}

/// Write a flat triangle list serialized in ASCII PLY format to provided
/// output writer.
///
/// Each vertex is written on its own line together with its normal, followed
/// by one face per 3 consecutive vertices. Floats use their shortest
/// representation that parses back to the same value.
///
/// The buffers are validated before anything is written. Flushes `writer` at
/// least once - after all data has been written.
pub fn export_ply<W: Write>(
    writer: &mut W,
    vertices: &[f32],
    normals: &[f32],
) -> Result<(), PlyError> {
    if vertices.len() != normals.len() {
        return Err(PlyError::LengthMismatch {
            vertices: vertices.len(),
            normals: normals.len(),
        });
    }
    if vertices.len() % FLOATS_PER_TRIANGLE != 0 {
        return Err(PlyError::NotTriangleAligned(vertices.len()));
    }

    let vertex_count = vertices.len() / FLOATS_PER_VERTEX;
    let face_count = vertices.len() / FLOATS_PER_TRIANGLE;

    writeln!(writer, "ply")?;
    writeln!(writer, "format ascii 1.0")?;
    writeln!(writer, "element vertex {}", vertex_count)?;
    writeln!(writer, "property float x")?;
    writeln!(writer, "property float y")?;
    writeln!(writer, "property float z")?;
    writeln!(writer, "property float nx")?;
    writeln!(writer, "property float ny")?;
    writeln!(writer, "property float nz")?;
    writeln!(writer, "element face {}", face_count)?;
    writeln!(writer, "property list uchar int vertex_indices")?;
    writeln!(writer, "end_header")?;

    for (vertex, normal) in vertices
        .chunks_exact(FLOATS_PER_VERTEX)
        .zip(normals.chunks_exact(FLOATS_PER_VERTEX))
    {
        writeln!(
            writer,
            "{} {} {} {} {} {}",
            vertex[0], vertex[1], vertex[2], normal[0], normal[1], normal[2],
        )?;
    }

    for face in 0..face_count {
        let first = face * 3;
        writeln!(writer, "3 {} {} {}", first, first + 1, first + 2)?;
    }

    writer.flush()?;

    Ok(())
}

/// Writes `mesh` as a PLY file to `destination`, creating the output
/// directory if it doesn't exist yet. Returns the path of the written file.
pub fn write_ply_file(destination: &PlyDestination, mesh: &Mesh) -> Result<PathBuf, PlyError> {
    let path = destination.path();
    log::info!("Writing to PLY file {}", path.display());

    fs::create_dir_all(&destination.directory)?;
    let file = File::create(&path)?;
    let mut writer = BufWriter::new(file);

    export_ply(&mut writer, mesh.vertices(), mesh.normals())?;

    log::info!(
        "Finished {} ({} triangles)",
        path.display(),
        mesh.triangle_count(),
    );

    Ok(path)
}

#[cfg(test)]
mod tests {
    use std::env;
    use std::process;

    use super::*;

    #[test]
    fn test_export_ply_single_triangle() {
        let vertices = [-0.3, -0.3, 0.0, 0.3, -0.3, 0.0, 0.0, 0.4, 0.0];
        let normals = [0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0];

        let expected_output: &[u8] = b"\
            ply\n\
            format ascii 1.0\n\
            element vertex 3\n\
            property float x\n\
            property float y\n\
            property float z\n\
            property float nx\n\
            property float ny\n\
            property float nz\n\
            element face 1\n\
            property list uchar int vertex_indices\n\
            end_header\n\
            -0.3 -0.3 0 0 0 1\n\
            0.3 -0.3 0 0 0 1\n\
            0 0.4 0 0 0 1\n\
            3 0 1 2\n";

        let mut output = Vec::new();
        export_ply(&mut output, &vertices, &normals).unwrap();

        assert_eq!(output, Vec::from(expected_output));
    }

    #[test]
    fn test_export_ply_face_indices_are_sequential() {
        let vertices = vec![0.5; 27];
        let normals = vec![1.0; 27];

        let mut output = Vec::new();
        export_ply(&mut output, &vertices, &normals).unwrap();
        let output = String::from_utf8(output).unwrap();

        let faces: Vec<&str> = output.lines().skip(12 + 9).collect();
        assert_eq!(faces, vec!["3 0 1 2", "3 3 4 5", "3 6 7 8"]);
    }

    #[test]
    fn test_export_ply_empty_mesh() {
        let mut output = Vec::new();
        export_ply(&mut output, &[], &[]).unwrap();
        let output = String::from_utf8(output).unwrap();

        insta::assert_snapshot!("ply_empty_mesh", output);
    }

    #[test]
    fn test_export_ply_rejects_length_mismatch() {
        let mut output = Vec::new();
        let result = export_ply(&mut output, &[0.0; 9], &[0.0; 18]);

        assert_eq!(
            result,
            Err(PlyError::LengthMismatch {
                vertices: 9,
                normals: 18,
            })
        );
        assert!(output.is_empty());
    }

    #[test]
    fn test_export_ply_rejects_partial_triangle() {
        let mut output = Vec::new();
        let result = export_ply(&mut output, &[0.0; 12], &[0.0; 12]);

        assert_eq!(result, Err(PlyError::NotTriangleAligned(12)));
        assert!(output.is_empty());
    }

    #[test]
    fn test_ply_error_from_io_error() {
        let not_found = io::Error::new(io::ErrorKind::NotFound, "missing");
        let denied = io::Error::new(io::ErrorKind::PermissionDenied, "denied");
        let other = io::Error::new(io::ErrorKind::Other, "other");

        assert_eq!(PlyError::from(not_found), PlyError::DirectoryNotFound);
        assert_eq!(PlyError::from(denied), PlyError::PermissionDenied);
        assert_eq!(PlyError::from(other), PlyError::UnexpectedError);
    }

    #[test]
    fn test_ply_destination_default_path() {
        let destination = PlyDestination::default();

        assert_eq!(
            destination.path(),
            PathBuf::from("OutputPLYFiles").join("output.ply")
        );
    }

    #[test]
    fn test_write_ply_file_creates_directory() {
        let directory = env::temp_dir()
            .join(format!("isosurface_mesher_ply_{}", process::id()))
            .join("nested");
        let destination = PlyDestination::new(&directory, "triangle.ply");
        let mesh = Mesh::from_buffers(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        );

        let path = write_ply_file(&destination, &mesh).unwrap();
        let contents = fs::read_to_string(&path).unwrap();

        assert_eq!(path, directory.join("triangle.ply"));
        assert!(contents.starts_with("ply\nformat ascii 1.0\nelement vertex 3\n"));
        assert!(contents.ends_with(
            "end_header\n0 0 0 0 0 1\n1 0 0 0 0 1\n0 1 0 0 0 1\n3 0 1 2\n"
        ));

        fs::remove_dir_all(directory.parent().unwrap()).unwrap();
    }
}
