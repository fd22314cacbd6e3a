//! Rotation of molecular-orbital coefficients and density matrices in an atomic-orbital basis.

use derive_builder::Builder;
use nalgebra::Matrix3;
use ndarray::{Array2, LinalgScalar};
use num_complex::ComplexFloat;
use serde::{Deserialize, Serialize};

use crate::kpoints::KPoints;
use crate::symmetry::space_group::format_rotation;
use crate::transformation::TransformationError;

// =================
// Trait definitions
// =================

/// Trait for routines that rotate $`\mathbf{k}`$-resolved quantities expressed in an
/// atomic-orbital basis.
pub trait BasisRotation<T> {
    /// Rotates the molecular-orbital coefficients at one $`\mathbf{k}`$-point.
    ///
    /// # Arguments
    ///
    /// * `kpts` - The $`\mathbf{k}`$-point container the operator belongs to.
    /// * `mo_coeff` - The coefficient matrix, with basis functions along the rows and orbitals
    ///   along the columns.
    /// * `op` - The rotation operator.
    ///
    /// # Returns
    ///
    /// The rotated coefficient matrix.
    fn rotate_mo_coeff(
        &self,
        kpts: &KPoints,
        mo_coeff: &Array2<T>,
        op: &Matrix3<i32>,
    ) -> Result<Array2<T>, TransformationError>;

    /// Rotates the density matrix at one $`\mathbf{k}`$-point.
    ///
    /// # Arguments
    ///
    /// * `kpts` - The $`\mathbf{k}`$-point container the operator belongs to.
    /// * `dm` - The square density matrix.
    /// * `op` - The rotation operator.
    ///
    /// # Returns
    ///
    /// The rotated density matrix.
    fn rotate_density_matrix(
        &self,
        kpts: &KPoints,
        dm: &Array2<T>,
        op: &Matrix3<i32>,
    ) -> Result<Array2<T>, TransformationError>;
}

// ==================
// Struct definitions
// ==================

/// Structure holding the real representation matrices of rotation operators in an
/// atomic-orbital basis.
///
/// A rotation $`\hat{R}`$ acts on coefficients by $`\mathbf{C} \mapsto \mathbf{D}(\hat{R})
/// \mathbf{C}`$ and on density matrices by $`\mathbf{P} \mapsto \mathbf{D}(\hat{R}) \mathbf{P}
/// \mathbf{D}(\hat{R})^{\mathsf{T}}`$.
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct AoRepresentations {
    /// The number of basis functions.
    nbas: usize,

    /// The rotation operators paired with their $`n_{\mathrm{bas}} \times n_{\mathrm{bas}}`$
    /// representation matrices.
    representations: Vec<(Matrix3<i32>, Array2<f64>)>,
}

impl AoRepresentationsBuilder {
    fn validate(&self) -> Result<(), String> {
        let nbas = self.nbas.ok_or("No basis size found.".to_string())?;
        let representations = self
            .representations
            .as_ref()
            .ok_or("No representation matrices found.".to_string())?;
        if let Some((op, mat)) = representations
            .iter()
            .find(|(_, mat)| mat.shape() != [nbas, nbas])
        {
            Err(format!(
                "The representation matrix of {} has shape {:?}, but {nbas} × {nbas} is required.",
                format_rotation(op),
                mat.shape()
            ))
        } else {
            Ok(())
        }
    }
}

impl AoRepresentations {
    /// Returns a builder to construct a new [`AoRepresentations`].
    pub fn builder() -> AoRepresentationsBuilder {
        AoRepresentationsBuilder::default()
    }

    /// Returns the number of basis functions.
    pub fn nbas(&self) -> usize {
        self.nbas
    }

    /// Returns the representation matrix of a rotation operator.
    pub fn representation(&self, op: &Matrix3<i32>) -> Result<&Array2<f64>, TransformationError> {
        self.representations
            .iter()
            .find_map(|(rep_op, mat)| if rep_op == op { Some(mat) } else { None })
            .ok_or_else(|| TransformationError::MissingRepresentation(format_rotation(op)))
    }

    fn representation_as<T>(&self, op: &Matrix3<i32>) -> Result<Array2<T>, TransformationError>
    where
        T: ComplexFloat,
        f64: Into<T>,
    {
        Ok(self.representation(op)?.mapv(|x| x.into()))
    }

    fn check_rows<T>(&self, arr: &Array2<T>, square: bool) -> Result<(), TransformationError> {
        let ncols = if square { self.nbas } else { arr.ncols() };
        if arr.shape() == [self.nbas, ncols] {
            Ok(())
        } else {
            Err(TransformationError::ArrayShapeMismatch {
                expected: vec![self.nbas, ncols],
                found: arr.shape().to_vec(),
            })
        }
    }
}

impl<T> BasisRotation<T> for AoRepresentations
where
    T: ComplexFloat + LinalgScalar,
    f64: Into<T>,
{
    fn rotate_mo_coeff(
        &self,
        _: &KPoints,
        mo_coeff: &Array2<T>,
        op: &Matrix3<i32>,
    ) -> Result<Array2<T>, TransformationError> {
        self.check_rows(mo_coeff, false)?;
        let dmat = self.representation_as::<T>(op)?;
        Ok(dmat.dot(mo_coeff))
    }

    fn rotate_density_matrix(
        &self,
        _: &KPoints,
        dm: &Array2<T>,
        op: &Matrix3<i32>,
    ) -> Result<Array2<T>, TransformationError> {
        self.check_rows(dm, true)?;
        let dmat = self.representation_as::<T>(op)?;
        // The representation is real, so its transpose is its adjoint.
        Ok(dmat.dot(dm).dot(&dmat.t()))
    }
}
