use nalgebra::Point3;

use crate::bounds::VolumeBounds;
use crate::field::ScalarField;

use super::classify::{classify, ConfigurationCode, CubeCell};
use super::normals::compute_normals;
use super::tables;
use super::{Mesh, Slab};

/// Extracts the isosurface `field = isovalue` from the volume described by
/// `bounds` into a new mesh.
///
/// Equivalent to [`sweep`] appending every slab to a mesh pre-sized by
/// [`VolumeBounds::estimated_float_capacity`].
///
/// [`sweep`]: fn.sweep.html
/// [`VolumeBounds::estimated_float_capacity`]: ../bounds/struct.VolumeBounds.html#method.estimated_float_capacity
pub fn build<F>(field: &F, isovalue: f32, bounds: &VolumeBounds) -> Mesh
where
    F: ScalarField + ?Sized,
{
    let mut mesh = Mesh::with_capacity(bounds.estimated_float_capacity());
    sweep(field, isovalue, bounds, |slab| mesh.append_slab(&slab));

    mesh
}

/// Marches over all cells of `bounds` and hands each finished x slab to
/// `on_slab`. Returns the number of slabs produced.
///
/// Cell origins are visited x (outer), then y, then z (inner). Each coordinate
/// starts at its minimum and advances by repeated addition of the step size
/// while it stays below its maximum. Slabs are handed over in increasing x
/// order, each with its normals already computed. Slabs without any triangles
/// are handed over too.
pub fn sweep<F, S>(field: &F, isovalue: f32, bounds: &VolumeBounds, mut on_slab: S) -> usize
where
    F: ScalarField + ?Sized,
    S: FnMut(Slab),
{
    let min = bounds.minimum_point();
    let max = bounds.maximum_point();
    let step_size = bounds.step_size();

    log::debug!(
        "Sweeping {:?} cells of size {} for isovalue {}",
        bounds.cell_counts(),
        step_size,
        isovalue,
    );

    let mut slab_index = 0;
    let mut x = min.x;
    while x < max.x {
        let mut vertices = Vec::new();

        let mut y = min.y;
        while y < max.y {
            let mut z = min.z;
            while z < max.z {
                let origin = Point3::new(x, y, z);
                let cell = CubeCell::sample(field, origin, step_size);
                let code = classify(&cell, isovalue);

                emit_triangles(&mut vertices, &origin, step_size, code);

                z += step_size;
            }
            y += step_size;
        }

        let normals = compute_normals(&vertices);
        let slab = Slab {
            index: slab_index,
            x,
            vertices,
            normals,
        };

        log::trace!(
            "Slab {} at x = {} produced {} triangles",
            slab.index,
            slab.x,
            slab.triangle_count(),
        );

        on_slab(slab);

        slab_index += 1;
        x += step_size;
    }

    log::debug!("Sweep finished after {} slabs", slab_index);

    slab_index
}

/// Appends the vertices of all triangles of a cell with configuration `code`,
/// in triangulation table order.
fn emit_triangles(
    vertices: &mut Vec<f32>,
    origin: &Point3<f32>,
    step_size: f32,
    code: ConfigurationCode,
) {
    for triangle in tables::triangles(code.bits()).iter() {
        for &index in triangle {
            let offset = tables::VERTEX_TABLE[index];
            vertices.extend_from_slice(&[
                origin.x + step_size * offset[0],
                origin.y + step_size * offset[1],
                origin.z + step_size * offset[2],
            ]);
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::field::FieldKind;
    use crate::mesh::FLOATS_PER_TRIANGLE;

    use super::*;

    #[test]
    fn test_build_constant_field_is_empty() {
        let bounds = VolumeBounds::cube(-1.0, 1.0, 0.5).expect("Bounds should be valid");
        let field = |_: f32, _: f32, _: f32| 0.0;

        let mesh = build(&field, 1.0, &bounds);

        assert!(mesh.is_empty());
        assert!(mesh.normals().is_empty());
    }

    #[test]
    fn test_build_single_cell_single_corner() {
        // Only the far-bottom-left corner (the cell origin) is inside.
        let bounds = VolumeBounds::cube(0.0, 1.0, 1.0).expect("Bounds should be valid");
        let field = |x: f32, y: f32, z: f32| x + y + z;

        let mesh = build(&field, 0.5, &bounds);

        // Triangle [0, 8, 3]: bottom-front edge, vertical edge, bottom-left edge.
        assert_eq!(
            mesh.vertices(),
            &[0.5, 0.0, 0.0, 0.0, 0.5, 0.0, 0.0, 0.0, 0.5]
        );
    }

    #[test]
    fn test_build_scales_and_offsets_vertices() {
        let bounds = VolumeBounds::cube(2.0, 2.5, 0.5).expect("Bounds should be valid");
        let field = |x: f32, y: f32, z: f32| (x - 2.0) + (y - 2.0) + (z - 2.0);

        let mesh = build(&field, 0.1, &bounds);

        assert_eq!(
            mesh.vertices(),
            &[2.25, 2.0, 2.0, 2.0, 2.25, 2.0, 2.0, 2.0, 2.25]
        );
    }

    #[test]
    fn test_build_uniform_cells_emit_nothing() {
        let bounds = VolumeBounds::cube(-3.0, 3.0, 0.5).expect("Bounds should be valid");

        // Everything inside.
        let below = build(&|_: f32, _: f32, _: f32| -1.0, 0.0, &bounds);
        // Everything outside.
        let above = build(&|_: f32, _: f32, _: f32| 1.0, 0.0, &bounds);

        assert!(below.is_empty());
        assert!(above.is_empty());
    }

    #[test]
    fn test_sweep_visits_slabs_in_increasing_x() {
        let bounds = VolumeBounds::cube(-1.0, 1.0, 0.5).expect("Bounds should be valid");
        let mut xs = Vec::new();

        let slab_count = sweep(&FieldKind::Sphere, 0.5, &bounds, |slab| {
            assert_eq!(slab.index, xs.len());
            xs.push(slab.x);
        });

        assert_eq!(slab_count, 4);
        assert_eq!(xs, vec![-1.0, -0.5, 0.0, 0.5]);
    }

    #[test]
    fn test_sweep_processes_trailing_partial_cell() {
        let bounds = VolumeBounds::new(
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(0.9, 0.25, 0.25),
            0.25,
        )
        .expect("Bounds should be valid");

        let slab_count = sweep(&FieldKind::Sphere, 1.0, &bounds, |_| {});

        assert_eq!(slab_count, 4);
    }

    #[test]
    fn test_sweep_slabs_have_whole_triangles_and_normals() {
        let bounds = VolumeBounds::cube(-4.0, 4.0, 0.5).expect("Bounds should be valid");

        sweep(&FieldKind::Torus, 0.0, &bounds, |slab| {
            assert_eq!(slab.vertices.len(), slab.normals.len());
            assert_eq!(slab.vertices.len() % FLOATS_PER_TRIANGLE, 0);
        });
    }

    #[test]
    fn test_sweep_samples_every_corner_of_every_cell() {
        let bounds = VolumeBounds::cube(0.0, 1.0, 0.5).expect("Bounds should be valid");
        let samples = std::cell::Cell::new(0);
        let field = |_: f32, _: f32, _: f32| {
            samples.set(samples.get() + 1);
            0.0
        };

        sweep(&field, 1.0, &bounds, |_| {});

        assert_eq!(samples.get(), 8 * 8);
    }

    #[test]
    fn test_build_matches_concatenated_sweep() {
        let bounds = VolumeBounds::cube(-2.0, 2.0, 0.25).expect("Bounds should be valid");
        let mut vertices = Vec::new();
        let mut normals = Vec::new();

        sweep(&FieldKind::Saddle, 0.5, &bounds, |slab| {
            vertices.extend(slab.vertices);
            normals.extend(slab.normals);
        });
        let mesh = build(&FieldKind::Saddle, 0.5, &bounds);

        assert_eq!(mesh.vertices(), vertices.as_slice());
        assert_eq!(mesh.normals(), normals.as_slice());
    }
}
