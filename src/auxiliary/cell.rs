//! Lattice cells and conversions between absolute and scaled $`\mathbf{k}`$-points.

use std::f64::consts::PI;
use std::fmt;

use itertools::{iproduct, Itertools};
use nalgebra::Matrix3;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::kpoints::KPointSymmetryError;

#[cfg(test)]
#[path = "cell_tests.rs"]
mod cell_tests;

// ==================
// Struct definitions
// ==================

/// Structure describing a three-dimensional lattice cell.
///
/// The cell is only used here to interconvert absolute and scaled (fractional)
/// $`\mathbf{k}`$-point coordinates.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Cell {
    /// The real-space lattice vectors $`\mathbf{a}_i`$ stored as the rows of a matrix.
    lattice_vectors: Matrix3<f64>,

    /// The reciprocal lattice vectors $`\mathbf{b}_i`$ stored as the rows of a matrix, such that
    /// $`\mathbf{a}_i \cdot \mathbf{b}_j = 2\pi \delta_{ij}`$.
    reciprocal_vectors: Matrix3<f64>,
}

impl Cell {
    /// Constructs a cell from its lattice vectors.
    ///
    /// # Arguments
    ///
    /// * `lattice_vectors` - The real-space lattice vectors as the rows of a matrix.
    ///
    /// # Returns
    ///
    /// The cell, or an error if the lattice vectors are linearly dependent.
    pub fn new(lattice_vectors: Matrix3<f64>) -> Result<Self, KPointSymmetryError> {
        let det = lattice_vectors.determinant();
        if !det.is_finite() || det.abs() < f64::EPSILON {
            return Err(KPointSymmetryError::SingularCell(det));
        }
        let inverse = lattice_vectors
            .try_inverse()
            .ok_or(KPointSymmetryError::SingularCell(det))?;
        Ok(Self {
            lattice_vectors,
            reciprocal_vectors: inverse.transpose() * (2.0 * PI),
        })
    }

    /// Constructs a cell from three lattice vectors given as rows.
    pub fn from_rows(rows: &[[f64; 3]; 3]) -> Result<Self, KPointSymmetryError> {
        Self::new(Matrix3::from_fn(|i, j| rows[i][j]))
    }

    /// Returns the real-space lattice vectors as the rows of a matrix.
    pub fn lattice_vectors(&self) -> &Matrix3<f64> {
        &self.lattice_vectors
    }

    /// Returns the reciprocal lattice vectors as the rows of a matrix.
    pub fn reciprocal_vectors(&self) -> &Matrix3<f64> {
        &self.reciprocal_vectors
    }

    /// Converts absolute $`\mathbf{k}`$-points into scaled coordinates with respect to the
    /// reciprocal lattice vectors.
    ///
    /// # Arguments
    ///
    /// * `kpts_abs` - An $`N \times 3`$ array of absolute $`\mathbf{k}`$-points.
    ///
    /// # Returns
    ///
    /// An $`N \times 3`$ array of scaled $`\mathbf{k}`$-points.
    pub fn get_scaled_kpts(
        &self,
        kpts_abs: &Array2<f64>,
    ) -> Result<Array2<f64>, KPointSymmetryError> {
        check_kpoint_dimension(kpts_abs)?;
        let a_t = to_array(&self.lattice_vectors.transpose());
        Ok(kpts_abs.dot(&a_t) / (2.0 * PI))
    }

    /// Converts scaled $`\mathbf{k}`$-points into absolute coordinates.
    ///
    /// # Arguments
    ///
    /// * `kpts_scaled` - An $`N \times 3`$ array of scaled $`\mathbf{k}`$-points.
    ///
    /// # Returns
    ///
    /// An $`N \times 3`$ array of absolute $`\mathbf{k}`$-points.
    pub fn get_abs_kpts(
        &self,
        kpts_scaled: &Array2<f64>,
    ) -> Result<Array2<f64>, KPointSymmetryError> {
        check_kpoint_dimension(kpts_scaled)?;
        Ok(kpts_scaled.dot(&to_array(&self.reciprocal_vectors)))
    }
}

impl fmt::Display for Cell {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Lattice vectors:")?;
        for (i, row) in self.lattice_vectors.row_iter().enumerate() {
            writeln!(
                f,
                "  a{}: ({})",
                i + 1,
                row.iter().map(|x| format!("{x:+.6}")).join(", ")
            )?;
        }
        Ok(())
    }
}

// =========
// Functions
// =========

/// Generates a Monkhorst--Pack grid of scaled $`\mathbf{k}`$-points.
///
/// Along each axis with $`n`$ divisions, the scaled coordinates are
/// $`(2i - n - 1) / (2n)`$ for $`i = 1, \ldots, n`$. The grid is closed under negation and under
/// all point-group rotations of the lattice, so that every rotated grid point is again an exact
/// member of the grid.
///
/// # Arguments
///
/// * `mesh` - The numbers of divisions along the three reciprocal lattice vectors.
///
/// # Returns
///
/// An $`(n_1 n_2 n_3) \times 3`$ array of scaled $`\mathbf{k}`$-points in C order.
#[must_use]
pub fn monkhorst_pack(mesh: [usize; 3]) -> Array2<f64> {
    let axis = |n: usize| {
        (1..=n)
            .map(|i| (2.0 * i as f64 - n as f64 - 1.0) / (2.0 * n as f64))
            .collect_vec()
    };
    let (xs, ys, zs) = (axis(mesh[0]), axis(mesh[1]), axis(mesh[2]));
    let points = iproduct!(xs.iter(), ys.iter(), zs.iter())
        .map(|(x, y, z)| [*x, *y, *z])
        .collect_vec();
    Array2::from_shape_fn((points.len(), 3), |(i, c)| points[i][c])
}

/// Checks that a $`\mathbf{k}`$-point array has three columns.
pub(crate) fn check_kpoint_dimension(kpts: &Array2<f64>) -> Result<(), KPointSymmetryError> {
    if kpts.ncols() != 3 {
        Err(KPointSymmetryError::KPointDimensionMismatch {
            expected: 3,
            found: kpts.ncols(),
        })
    } else {
        Ok(())
    }
}

fn to_array(mat: &Matrix3<f64>) -> Array2<f64> {
    Array2::from_shape_fn((3, 3), |(i, j)| mat[(i, j)])
}
