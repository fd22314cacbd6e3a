//! Space groups, their symmorphic rotations, and classification of rotation operators.

use std::fmt;

use approx::abs_diff_eq;
use derive_builder::Builder;
use itertools::Itertools;
use log;
use nalgebra::{Matrix3, Vector3};
use ndarray::{Array1, Array2, ArrayView1};
use serde::{Deserialize, Serialize};

use crate::auxiliary::cell::Cell;
use crate::kpoints::KPointSymmetryError;

#[cfg(test)]
#[path = "space_group_tests.rs"]
mod space_group_tests;

// ================
// Enum definitions
// ================

/// Enumerated type classifying a rotation operator for the purpose of back-transformations.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RotationKind {
    /// The identity operator $`\mathbf{E}`$.
    Identity,

    /// The spatial inversion operator $`-\mathbf{E}`$.
    Inversion,

    /// Any other rotation operator, proper or improper.
    General,
}

impl RotationKind {
    /// Classifies an integer rotation matrix.
    #[must_use]
    pub fn classify(op: &Matrix3<i32>) -> Self {
        if is_identity(op) {
            RotationKind::Identity
        } else if is_inversion(op) {
            RotationKind::Inversion
        } else {
            RotationKind::General
        }
    }
}

impl fmt::Display for RotationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => write!(f, "identity"),
            Self::Inversion => write!(f, "inversion"),
            Self::General => write!(f, "general rotation"),
        }
    }
}

// ==================
// Struct definitions
// ==================

/// Structure containing the operations of a space group as an ordered list of rotation
/// matrices paired with translation vectors.
#[derive(Builder, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct SpaceGroup {
    /// The rotation parts of the operations, as integer matrices acting on scaled coordinates.
    rotations: Vec<Matrix3<i32>>,

    /// The translation parts of the operations, in scaled coordinates. The $`i`$th translation
    /// is paired with the $`i`$th rotation.
    translations: Vec<Vector3<f64>>,
}

impl SpaceGroupBuilder {
    fn validate(&self) -> Result<(), String> {
        let rotations = self
            .rotations
            .as_ref()
            .ok_or("No rotations found.".to_string())?;
        let translations = self
            .translations
            .as_ref()
            .ok_or("No translations found.".to_string())?;
        if rotations.len() != translations.len() {
            Err(format!(
                "{} {} but {} {} found.",
                rotations.len(),
                if rotations.len() == 1 {
                    "rotation"
                } else {
                    "rotations"
                },
                translations.len(),
                if translations.len() == 1 {
                    "translation"
                } else {
                    "translations"
                },
            ))
        } else {
            Ok(())
        }
    }
}

impl SpaceGroup {
    /// Returns a builder to construct a new [`SpaceGroup`].
    pub fn builder() -> SpaceGroupBuilder {
        SpaceGroupBuilder::default()
    }

    /// Constructs a space group consisting of purely symmorphic operations with zero
    /// translations.
    ///
    /// # Arguments
    ///
    /// * `rotations` - The rotation matrices.
    pub fn from_rotations(rotations: &[Matrix3<i32>]) -> Self {
        Self {
            rotations: rotations.to_vec(),
            translations: vec![Vector3::zeros(); rotations.len()],
        }
    }

    /// Returns the trivial space group containing only the identity.
    pub fn trivial() -> Self {
        Self::from_rotations(&[Matrix3::identity()])
    }

    /// Returns the rotation parts of the operations.
    pub fn rotations(&self) -> &[Matrix3<i32>] {
        &self.rotations
    }

    /// Returns the translation parts of the operations.
    pub fn translations(&self) -> &[Vector3<f64>] {
        &self.translations
    }

    /// Returns the number of operations in the space group.
    pub fn n_operations(&self) -> usize {
        self.rotations.len()
    }

    /// Returns the rotations of all symmorphic operations, *i.e.* those whose translation vector
    /// vanishes, in their original order.
    ///
    /// # Arguments
    ///
    /// * `tolerance` - The tolerance for considering a translation component to be zero.
    pub fn symmorphic_rotations(&self, tolerance: f64) -> Vec<Matrix3<i32>> {
        let symmorphic = self
            .rotations
            .iter()
            .zip(self.translations.iter())
            .filter_map(|(rot, trans)| {
                if trans
                    .iter()
                    .all(|t| abs_diff_eq!(*t, 0.0, epsilon = tolerance))
                {
                    Some(*rot)
                } else {
                    None
                }
            })
            .collect_vec();
        let ndropped = self.n_operations() - symmorphic.len();
        if ndropped > 0 {
            log::debug!(
                "{ndropped} non-symmorphic {} discarded from the space group.",
                if ndropped == 1 {
                    "operation"
                } else {
                    "operations"
                }
            );
        }
        symmorphic
    }
}

impl fmt::Display for SpaceGroup {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "SpaceGroup[{} {}]",
            self.n_operations(),
            if self.n_operations() == 1 {
                "operation"
            } else {
                "operations"
            }
        )
    }
}

// =================
// Trait definitions
// =================

/// Trait for sources of space-group operations.
///
/// Space-group discovery from a crystal structure is outside the scope of this crate; any
/// external symmetry finder can be plugged in by implementing this trait.
pub trait SpaceGroupProvider {
    /// Determines the space group of a cell.
    ///
    /// # Arguments
    ///
    /// * `cell` - The cell whose space group is required.
    ///
    /// # Returns
    ///
    /// The space group, with rotations and translations expressed in scaled coordinates.
    fn space_group(&self, cell: &Cell) -> Result<SpaceGroup, KPointSymmetryError>;
}

impl SpaceGroupProvider for SpaceGroup {
    /// Returns a copy of this space group regardless of the cell.
    fn space_group(&self, _: &Cell) -> Result<SpaceGroup, KPointSymmetryError> {
        Ok(self.clone())
    }
}

// =========
// Functions
// =========

/// Determines if a rotation matrix is the identity.
#[must_use]
pub fn is_identity(op: &Matrix3<i32>) -> bool {
    *op == Matrix3::identity()
}

/// Determines if a rotation matrix is the spatial inversion.
#[must_use]
pub fn is_inversion(op: &Matrix3<i32>) -> bool {
    *op == -Matrix3::<i32>::identity()
}

/// Appends the negation of every operator to a list of operators.
///
/// The $`i`$th operator of the input is paired with the $`(i + n)`$th operator of the output,
/// where $`n`$ is the number of input operators.
#[must_use]
pub fn with_time_reversal(ops: &[Matrix3<i32>]) -> Vec<Matrix3<i32>> {
    ops.iter().cloned().chain(ops.iter().map(|op| -op)).collect_vec()
}

/// Verifies that a set of rotation operators forms a group.
///
/// The IBZ construction only links each $`\mathbf{k}`$-point to its direct images and relies on
/// closure under composition to reach every member of an orbit from its representative. Sets
/// that are not closed would silently produce incomplete orbits.
///
/// # Arguments
///
/// * `ops` - The rotation operators.
///
/// # Returns
///
/// An error describing the first violation found, if any.
pub fn verify_group_closure(ops: &[Matrix3<i32>]) -> Result<(), KPointSymmetryError> {
    if !ops.iter().any(is_identity) {
        return Err(KPointSymmetryError::GroupNotClosed(
            "the identity operation is absent".to_string(),
        ));
    }
    for (i, j) in (0..ops.len()).cartesian_product(0..ops.len()) {
        let product = ops[i] * ops[j];
        if !ops.contains(&product) {
            return Err(KPointSymmetryError::GroupNotClosed(format!(
                "the product of operations {i} and {j} ({}) is absent",
                format_rotation(&product)
            )));
        }
    }
    Ok(())
}

/// Converts an integer rotation matrix into a floating-point array.
pub fn rotation_to_array(op: &Matrix3<i32>) -> Array2<f64> {
    Array2::from_shape_fn((3, 3), |(i, j)| f64::from(op[(i, j)]))
}

/// Applies a rotation operator to a single scaled $`\mathbf{k}`$-point, giving
/// $`\mathbf{k} \mathbf{U}^{\mathsf{T}}`$.
pub fn rotate_kpoint(op: &Matrix3<i32>, kpt: ArrayView1<f64>) -> Array1<f64> {
    Array1::from_shape_fn(3, |c| {
        (0..3)
            .map(|d| f64::from(op[(c, d)]) * kpt[d])
            .sum::<f64>()
    })
}

/// Formats an integer rotation matrix compactly, row by row.
pub fn format_rotation(op: &Matrix3<i32>) -> String {
    format!(
        "[{}]",
        op.row_iter()
            .map(|row| format!("[{}]", row.iter().map(|x| format!("{x:+}")).join(", ")))
            .join(", ")
    )
}
