//! Rotation of real-space quantities sampled on uniform grids.

use itertools::iproduct;
use nalgebra::Matrix3;

use crate::transformation::TransformationError;

// =================
// Trait definitions
// =================

/// Trait for routines that rotate a real-space quantity sampled on a uniform grid.
///
/// Grids are flat buffers in C order, so that the grid point $`(i, j, k)`$ of a mesh
/// $`(n_1, n_2, n_3)`$ is stored at $`(i n_2 + j) n_3 + k`$.
pub trait GridRotation {
    /// Rotates `input` by `op` and accumulates the result into `out`.
    ///
    /// # Arguments
    ///
    /// * `out` - The output buffer, whose length must be the product of `mesh`.
    /// * `input` - The input buffer, whose length must be the product of `mesh`.
    /// * `op` - The integer rotation matrix acting on grid coordinates.
    /// * `mesh` - The numbers of grid points along the three lattice vectors.
    ///
    /// # Errors
    ///
    /// Errors with [`TransformationError::GridShapeMismatch`] if either buffer has the wrong
    /// length. Implementations must check this before touching either buffer.
    fn rotate_grid(
        &self,
        out: &mut [f64],
        input: &[f64],
        op: &Matrix3<i32>,
        mesh: [usize; 3],
    ) -> Result<(), TransformationError>;
}

// ==================
// Struct definitions
// ==================

/// Native grid rotation for integer rotation matrices.
///
/// The grid point $`\mathbf{r} = (i, j, k)`$ is sent to $`\mathbf{r} \mathbf{U}`$ with each
/// component wrapped periodically into the mesh.
#[derive(Clone, Copy, Debug, Default)]
pub struct IntegerGridRotation;

impl GridRotation for IntegerGridRotation {
    fn rotate_grid(
        &self,
        out: &mut [f64],
        input: &[f64],
        op: &Matrix3<i32>,
        mesh: [usize; 3],
    ) -> Result<(), TransformationError> {
        let ngrids = check_grid_length(input, mesh)?;
        check_grid_length(out, mesh)?;
        if ngrids == 0 {
            return Ok(());
        }
        let [n0, n1, n2] = mesh;
        let wrap = |x: i64, n: usize| x.rem_euclid(n as i64) as usize;
        for (i, j, k) in iproduct!(0..n0, 0..n1, 0..n2) {
            let r = [i as i64, j as i64, k as i64];
            let rotated = |c: usize| {
                (0..3)
                    .map(|d| r[d] * i64::from(op[(d, c)]))
                    .sum::<i64>()
            };
            let dest =
                (wrap(rotated(0), n0) * n1 + wrap(rotated(1), n1)) * n2 + wrap(rotated(2), n2);
            out[dest] += input[(i * n1 + j) * n2 + k];
        }
        Ok(())
    }
}

// =========
// Functions
// =========

/// Checks that a flat grid buffer matches a mesh and returns the number of grid points.
pub(crate) fn check_grid_length(
    buffer: &[f64],
    mesh: [usize; 3],
) -> Result<usize, TransformationError> {
    let ngrids = mesh.iter().product::<usize>();
    if buffer.len() == ngrids {
        Ok(ngrids)
    } else {
        Err(TransformationError::GridShapeMismatch {
            mesh,
            expected: ngrids,
            found: buffer.len(),
        })
    }
}
