use nalgebra::{Point3, Vector3};

use super::{FLOATS_PER_TRIANGLE, FLOATS_PER_VERTEX};

/// Computes the flat normal of a triangle from its vertices.
///
/// The direction follows the winding order. Degenerate (zero-area) triangles
/// produce a non-finite normal.
pub fn compute_triangle_normal(
    v1: &Point3<f32>,
    v2: &Point3<f32>,
    v3: &Point3<f32>,
) -> Vector3<f32> {
    let diff1 = v1 - v2;
    let diff2 = v1 - v3;

    diff1.cross(&diff2).normalize()
}

/// Computes one normal per vertex of a flat, non-indexed triangle buffer.
///
/// Every 9 consecutive floats form one triangle; its normal is repeated for
/// all three vertices. Trailing floats that don't form a whole triangle get
/// zero normals.
pub fn compute_normals(vertices: &[f32]) -> Vec<f32> {
    let mut normals = vec![0.0; vertices.len()];

    for (triangle, triangle_normals) in vertices
        .chunks_exact(FLOATS_PER_TRIANGLE)
        .zip(normals.chunks_exact_mut(FLOATS_PER_TRIANGLE))
    {
        let point = |i: usize| {
            let start = i * FLOATS_PER_VERTEX;
            Point3::new(triangle[start], triangle[start + 1], triangle[start + 2])
        };
        let normal = compute_triangle_normal(&point(0), &point(1), &point(2));

        for vertex_normal in triangle_normals.chunks_exact_mut(FLOATS_PER_VERTEX) {
            vertex_normal.copy_from_slice(normal.as_slice());
        }
    }

    normals
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;

    use super::*;

    #[test]
    fn test_compute_normals_single_triangle() {
        let vertices = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0];

        let normals = compute_normals(&vertices);

        // cross((0,-1,0), (-1,0,0)) = (0,0,-1)
        assert_eq!(normals.len(), vertices.len());
        for normal in normals.chunks_exact(3) {
            assert_relative_eq!(normal[0], 0.0);
            assert_relative_eq!(normal[1], 0.0);
            assert_relative_eq!(normal[2], -1.0);
        }
    }

    #[test]
    fn test_compute_normals_follows_winding() {
        let forward = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
        let backward = [0.0, 0.0, 0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0];

        let forward_normals = compute_normals(&forward);
        let backward_normals = compute_normals(&backward);

        for (f, b) in forward_normals.iter().zip(backward_normals.iter()) {
            assert_relative_eq!(*f, -*b);
        }
    }

    #[test]
    fn test_compute_normals_are_unit_length() {
        let vertices = [
            0.5, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.5, //
            1.0, 0.5, 1.0, 0.5, 1.0, 1.0, 1.0, 1.0, 0.5, //
            3.0, -2.0, 7.5, 0.1, 0.2, 0.3, -4.0, 8.0, 1.0,
        ];

        let normals = compute_normals(&vertices);

        for normal in normals.chunks_exact(3) {
            let length = Vector3::new(normal[0], normal[1], normal[2]).norm();
            assert!((length - 1.0).abs() < 1e-4);
        }
    }

    #[test]
    fn test_compute_normals_broadcasts_per_triangle() {
        let vertices = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
            0.0, 0.0, 0.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0,
        ];

        let normals = compute_normals(&vertices);

        assert_eq!(&normals[0..3], &normals[3..6]);
        assert_eq!(&normals[0..3], &normals[6..9]);
        assert_eq!(&normals[9..12], &normals[12..15]);
        assert_eq!(&normals[9..12], &normals[15..18]);
        assert_ne!(&normals[0..3], &normals[9..12]);
    }

    #[test]
    fn test_compute_normals_degenerate_triangle_is_not_finite() {
        let vertices = [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 2.0, 2.0, 2.0];

        let normals = compute_normals(&vertices);

        assert!(normals.iter().all(|n| !n.is_finite()));
    }

    #[test]
    fn test_compute_normals_partial_triangle_gets_zero_normals() {
        let vertices = [
            0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0, //
            5.0, 5.0, 5.0,
        ];

        let normals = compute_normals(&vertices);

        assert_eq!(normals.len(), 12);
        assert_eq!(&normals[9..], &[0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_compute_normals_empty() {
        assert!(compute_normals(&[]).is_empty());
    }
}
