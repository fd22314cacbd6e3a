//! Back-transformation of IBZ-resolved quantities onto the full Brillouin zone.

use std::fmt;

use log;
use nalgebra::Matrix3;
use ndarray::{Array1, Array2, ArrayView1};
use num_complex::ComplexFloat;
use thiserror::Error;

use crate::kpoints::KPoints;
use crate::symmetry::space_group::{format_rotation, RotationKind};

pub mod basis_rotation;
pub mod grid_rotation;

use basis_rotation::BasisRotation;
use grid_rotation::{check_grid_length, GridRotation};


// ================
// Enum definitions
// ================

/// Enumerated type for errors arising from back-transformations.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TransformationError {
    /// A flat grid buffer does not match the mesh.
    #[error("Grid buffer of length {found} does not match mesh {mesh:?} of {expected} points.")]
    GridShapeMismatch {
        mesh: [usize; 3],
        expected: usize,
        found: usize,
    },

    /// The number of IBZ-resolved inputs does not match the number of IBZ
    /// $`\mathbf{k}`$-points.
    #[error("{found} IBZ-resolved inputs supplied, but there are {expected} IBZ k-points.")]
    IbzCountMismatch { expected: usize, found: usize },

    /// An array passed to a rotation routine has the wrong shape.
    #[error("Array of shape {found:?} supplied, but shape {expected:?} is required.")]
    ArrayShapeMismatch {
        expected: Vec<usize>,
        found: Vec<usize>,
    },

    /// No representation matrix is available for an operator.
    #[error("No representation matrix is available for operation {0}.")]
    MissingRepresentation(String),

    /// An IBZ index is out of range.
    #[error("IBZ index {index} is out of range for {nibzk} IBZ k-points.")]
    IbzIndexOutOfRange { index: usize, nibzk: usize },

    /// An operator index is out of range.
    #[error("Operator index {index} is out of range for {nops} operators.")]
    OperatorIndexOutOfRange { index: usize, nops: usize },
}

// ==================
// Struct definitions
// ==================

/// Structure describing how an operator of a [`KPoints`] container acts on a physical quantity.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SymmetryDispatch {
    /// The underlying rotation, with any time-reversal negation undone.
    pub op: Matrix3<i32>,

    /// Boolean indicating if the operator is time-reversal-paired, in which case its action is
    /// accompanied by complex conjugation.
    pub time_reversal: bool,

    /// The classification of [`Self::op`].
    pub kind: RotationKind,
}

impl fmt::Display for SymmetryDispatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} {}{}",
            self.kind,
            format_rotation(&self.op),
            if self.time_reversal {
                " with time reversal"
            } else {
                ""
            }
        )
    }
}

impl KPoints {
    /// Determines how the operator at index `iop` of [`KPoints::op_rot`] acts on a physical
    /// quantity.
    ///
    /// Operators at or beyond [`KPoints::nrot`] are the negations of time-reversal-paired
    /// rotations. For these, the negation is undone and the time-reversal flag is set.
    pub fn symmetry_dispatch(&self, iop: usize) -> Result<SymmetryDispatch, TransformationError> {
        let op = self
            .op_rot()
            .get(iop)
            .ok_or(TransformationError::OperatorIndexOutOfRange {
                index: iop,
                nops: self.op_rot().len(),
            })?;
        let (op, time_reversal) = if iop >= self.nrot() {
            (-op, true)
        } else {
            (*op, false)
        };
        Ok(SymmetryDispatch {
            op,
            time_reversal,
            kind: RotationKind::classify(&op),
        })
    }
}

// =========
// Functions
// =========

/// Sums a real-space density over the orbit of an IBZ $`\mathbf{k}`$-point.
///
/// For every operator in [`KPoints::sym_group`] of `ibz_index`, the identity and the inversion
/// contribute the input grid unchanged, since a real density at $`-\mathbf{k}`$ is the same as
/// at $`\mathbf{k}`$. Every other operator contributes the grid rotated by `kernel`. The sum is
/// not normalised: dividing by the orbit size gives the average.
///
/// # Arguments
///
/// * `kpts` - The symmetrised $`\mathbf{k}`$-point container.
/// * `rhor_k` - The density of the IBZ $`\mathbf{k}`$-point as a flat grid in C order.
/// * `ibz_index` - The index of the IBZ $`\mathbf{k}`$-point.
/// * `mesh` - The numbers of grid points along the three lattice vectors.
/// * `kernel` - The grid-rotation routine.
///
/// # Returns
///
/// The summed density on the same grid.
pub fn symmetrise_density<G>(
    kpts: &KPoints,
    rhor_k: &[f64],
    ibz_index: usize,
    mesh: [usize; 3],
    kernel: &G,
) -> Result<Array1<f64>, TransformationError>
where
    G: GridRotation + ?Sized,
{
    let ngrids = check_grid_length(rhor_k, mesh)?;
    let sym_group = kpts
        .sym_group()
        .get(ibz_index)
        .ok_or(TransformationError::IbzIndexOutOfRange {
            index: ibz_index,
            nibzk: kpts.nibzk(),
        })?;
    let rhor_k_view = ArrayView1::from(rhor_k);
    let mut rhor = Array1::<f64>::zeros(ngrids);
    let mut scratch = vec![0.0; ngrids];
    for &iop in sym_group.iter() {
        let dispatch = kpts.symmetry_dispatch(iop)?;
        match dispatch.kind {
            RotationKind::Identity | RotationKind::Inversion => {
                rhor += &rhor_k_view;
            }
            RotationKind::General => {
                scratch.fill(0.0);
                kernel.rotate_grid(&mut scratch, rhor_k, &dispatch.op, mesh)?;
                rhor += &ArrayView1::from(&scratch[..]);
            }
        }
    }
    log::debug!(
        "Density of IBZ k-point {ibz_index} summed over {} operations.",
        sym_group.len()
    );
    Ok(rhor)
}

/// Maps the molecular-orbital coefficients of the IBZ $`\mathbf{k}`$-points onto every BZ
/// $`\mathbf{k}`$-point.
///
/// The coefficients of BZ $`\mathbf{k}`$-point $`k`$ are obtained from those of its IBZ
/// representative by the operator [`KPoints::sym_conn`]`[k]`: the identity passes them through,
/// the inversion conjugates them, and any other rotation is applied by `rotator`. A
/// time-reversal-paired operator conjugates the result, except for the inversion whose
/// conjugation already accounts for it.
///
/// # Arguments
///
/// * `kpts` - The symmetrised $`\mathbf{k}`$-point container.
/// * `mo_coeff_ibz` - The coefficient matrices of the IBZ $`\mathbf{k}`$-points in IBZ order.
/// * `rotator` - The basis-rotation routine.
///
/// # Returns
///
/// The coefficient matrices of all BZ $`\mathbf{k}`$-points in BZ order.
pub fn transform_mo_coeff<T, R>(
    kpts: &KPoints,
    mo_coeff_ibz: &[Array2<T>],
    rotator: &R,
) -> Result<Vec<Array2<T>>, TransformationError>
where
    T: ComplexFloat,
    R: BasisRotation<T> + ?Sized,
{
    transform_to_bz(kpts, mo_coeff_ibz, |mo_coeff, op| {
        rotator.rotate_mo_coeff(kpts, mo_coeff, op)
    })
}

/// Maps the density matrices of the IBZ $`\mathbf{k}`$-points onto every BZ
/// $`\mathbf{k}`$-point.
///
/// The operator dispatch is the same as for [`transform_mo_coeff`].
///
/// # Arguments
///
/// * `kpts` - The symmetrised $`\mathbf{k}`$-point container.
/// * `dm_ibz` - The density matrices of the IBZ $`\mathbf{k}`$-points in IBZ order.
/// * `rotator` - The basis-rotation routine.
///
/// # Returns
///
/// The density matrices of all BZ $`\mathbf{k}`$-points in BZ order.
pub fn transform_dm<T, R>(
    kpts: &KPoints,
    dm_ibz: &[Array2<T>],
    rotator: &R,
) -> Result<Vec<Array2<T>>, TransformationError>
where
    T: ComplexFloat,
    R: BasisRotation<T> + ?Sized,
{
    transform_to_bz(kpts, dm_ibz, |dm, op| {
        rotator.rotate_density_matrix(kpts, dm, op)
    })
}

fn transform_to_bz<T, F>(
    kpts: &KPoints,
    quantities_ibz: &[Array2<T>],
    rotate: F,
) -> Result<Vec<Array2<T>>, TransformationError>
where
    T: ComplexFloat,
    F: Fn(&Array2<T>, &Matrix3<i32>) -> Result<Array2<T>, TransformationError>,
{
    if quantities_ibz.len() != kpts.nibzk() {
        return Err(TransformationError::IbzCountMismatch {
            expected: kpts.nibzk(),
            found: quantities_ibz.len(),
        });
    }
    kpts.bz2ibz()
        .iter()
        .zip(kpts.sym_conn().iter())
        .map(|(&ibz_index, &iop)| {
            let quantity = &quantities_ibz[ibz_index];
            let dispatch = kpts.symmetry_dispatch(iop)?;
            match (dispatch.kind, dispatch.time_reversal) {
                (RotationKind::Identity, false) => Ok(quantity.clone()),
                (RotationKind::Identity, true) | (RotationKind::Inversion, _) => {
                    Ok(conjugate(quantity))
                }
                (RotationKind::General, false) => rotate(quantity, &dispatch.op),
                (RotationKind::General, true) => Ok(conjugate(&rotate(quantity, &dispatch.op)?)),
            }
        })
        .collect()
}

fn conjugate<T: ComplexFloat>(arr: &Array2<T>) -> Array2<T> {
    arr.mapv(|x| x.conj())
}
