use nalgebra::{Point3, Vector3};
use static_assertions::const_assert_eq;

pub use self::builder::{build, sweep};
pub use self::classify::{classify, ConfigurationCode, CubeCell};
pub use self::normals::{compute_normals, compute_triangle_normal};

pub mod builder;
pub mod classify;
pub mod normals;
pub mod tables;

pub const FLOATS_PER_VERTEX: usize = 3;
pub const VERTICES_PER_TRIANGLE: usize = 3;
pub const FLOATS_PER_TRIANGLE: usize = 9;

const_assert_eq!(FLOATS_PER_TRIANGLE, FLOATS_PER_VERTEX * VERTICES_PER_TRIANGLE);

/// Triangles produced by all cells sharing one x origin of the sweep.
///
/// A slab is the unit in which the mesh grows: its normals are already
/// computed and it is appended to the mesh as a whole.
#[derive(Debug, Clone, PartialEq)]
pub struct Slab {
    /// Sequence number of the slab, starting at 0 for the minimum x.
    pub index: usize,
    /// The x origin shared by all cells of the slab.
    pub x: f32,
    pub vertices: Vec<f32>,
    pub normals: Vec<f32>,
}

impl Slab {
    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_TRIANGLE
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }
}

/// Non-indexed triangle mesh stored as two parallel flat buffers.
///
/// Each vertex takes 3 consecutive floats in `vertices`, and its normal the
/// same 3 positions in `normals`. Every 3 consecutive vertices form a
/// triangle; vertices shared between triangles are duplicated. The buffers
/// therefore always have equal length, divisible by 9.
///
/// The layout matches what a renderer uploads as two vertex attribute
/// buffers drawn as a plain triangle list.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<f32>,
    normals: Vec<f32>,
}

impl Mesh {
    pub fn new() -> Self {
        Default::default()
    }

    /// Creates an empty mesh with room for `float_capacity` floats in each
    /// buffer.
    pub fn with_capacity(float_capacity: usize) -> Self {
        Mesh {
            vertices: Vec::with_capacity(float_capacity),
            normals: Vec::with_capacity(float_capacity),
        }
    }

    /// Creates a mesh from existing vertex and normal buffers.
    ///
    /// # Panics
    /// Panics if the buffers differ in length or don't describe whole
    /// triangles.
    pub fn from_buffers(vertices: Vec<f32>, normals: Vec<f32>) -> Self {
        assert_eq!(
            vertices.len(),
            normals.len(),
            "Vertex and normal buffers must have equal length",
        );
        assert_eq!(
            vertices.len() % FLOATS_PER_TRIANGLE,
            0,
            "Vertex buffer must contain whole triangles",
        );

        Mesh { vertices, normals }
    }

    pub fn vertices(&self) -> &[f32] {
        &self.vertices
    }

    pub fn normals(&self) -> &[f32] {
        &self.normals
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_VERTEX
    }

    pub fn triangle_count(&self) -> usize {
        self.vertices.len() / FLOATS_PER_TRIANGLE
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty()
    }

    /// Appends all triangles of `slab` to the end of the mesh.
    ///
    /// # Panics
    /// Panics if the slab buffers differ in length or don't describe whole
    /// triangles.
    pub fn append_slab(&mut self, slab: &Slab) {
        assert_eq!(
            slab.vertices.len(),
            slab.normals.len(),
            "Slab vertex and normal buffers must have equal length",
        );
        assert_eq!(
            slab.vertices.len() % FLOATS_PER_TRIANGLE,
            0,
            "Slab must contain whole triangles",
        );

        self.vertices.extend_from_slice(&slab.vertices);
        self.normals.extend_from_slice(&slab.normals);
    }

    /// Iterates over vertex positions in buffer order.
    pub fn positions(&self) -> impl Iterator<Item = Point3<f32>> + '_ {
        self.vertices
            .chunks_exact(FLOATS_PER_VERTEX)
            .map(|v| Point3::new(v[0], v[1], v[2]))
    }

    /// Iterates over one normal per triangle.
    pub fn face_normals(&self) -> impl Iterator<Item = Vector3<f32>> + '_ {
        self.normals
            .chunks_exact(FLOATS_PER_TRIANGLE)
            .map(|n| Vector3::new(n[0], n[1], n[2]))
    }

    /// Iterates over triangles as triples of vertex positions.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3<f32>; 3]> + '_ {
        self.vertices.chunks_exact(FLOATS_PER_TRIANGLE).map(|t| {
            [
                Point3::new(t[0], t[1], t[2]),
                Point3::new(t[3], t[4], t[5]),
                Point3::new(t[6], t[7], t[8]),
            ]
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn slab(index: usize, triangles: usize) -> Slab {
        let vertices: Vec<f32> = (0..triangles * FLOATS_PER_TRIANGLE)
            .map(|i| (index * 100 + i) as f32)
            .collect();
        let normals = vec![0.0; vertices.len()];

        Slab {
            index,
            x: index as f32,
            vertices,
            normals,
        }
    }

    #[test]
    fn test_mesh_append_slab_preserves_order() {
        let mut mesh = Mesh::new();
        let first = slab(0, 2);
        let second = slab(1, 1);

        mesh.append_slab(&first);
        mesh.append_slab(&second);

        assert_eq!(mesh.triangle_count(), 3);
        assert_eq!(mesh.vertex_count(), 9);
        assert_eq!(&mesh.vertices()[..18], first.vertices.as_slice());
        assert_eq!(&mesh.vertices()[18..], second.vertices.as_slice());
        assert_eq!(mesh.vertices().len(), mesh.normals().len());
    }

    #[test]
    fn test_mesh_append_empty_slab() {
        let mut mesh = Mesh::new();

        mesh.append_slab(&slab(0, 0));

        assert!(mesh.is_empty());
    }

    #[test]
    #[should_panic(expected = "Slab must contain whole triangles")]
    fn test_mesh_append_slab_rejects_partial_triangle() {
        let mut mesh = Mesh::new();
        let partial = Slab {
            index: 0,
            x: 0.0,
            vertices: vec![0.0; 6],
            normals: vec![0.0; 6],
        };

        mesh.append_slab(&partial);
    }

    #[test]
    #[should_panic(expected = "Vertex and normal buffers must have equal length")]
    fn test_mesh_from_buffers_rejects_length_mismatch() {
        Mesh::from_buffers(vec![0.0; 9], vec![0.0; 18]);
    }

    #[test]
    fn test_mesh_iterators() {
        let mesh = Mesh::from_buffers(
            vec![0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0],
            vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
        );

        let positions: Vec<_> = mesh.positions().collect();
        let triangles: Vec<_> = mesh.triangles().collect();
        let face_normals: Vec<_> = mesh.face_normals().collect();

        assert_eq!(positions.len(), 3);
        assert_eq!(positions[1], Point3::new(1.0, 0.0, 0.0));
        assert_eq!(triangles.len(), 1);
        assert_eq!(triangles[0][2], Point3::new(0.0, 1.0, 0.0));
        assert_eq!(face_normals, vec![Vector3::new(0.0, 0.0, 1.0)]);
    }
}
