//! Brillouin-zone $`\mathbf{k}`$-point samplings and their symmetry reduction.

use std::fmt;

use derive_builder::Builder;
use itertools::Itertools;
use nalgebra::Matrix3;
use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::auxiliary::cell::{check_kpoint_dimension, Cell};
use crate::io::format::{format_kpoint, nice_bool, write_subtitle};
use crate::symmetry::space_group::{SpaceGroup, SpaceGroupProvider};

pub mod agglomeration;
pub mod ibz;
pub mod kpoint_mapping;

#[cfg(test)]
#[path = "kpoints_tests.rs"]
mod kpoints_tests;

/// Default tolerance for comparing $`\mathbf{k}`$-point coordinates.
pub const KPT_DIFF_TOL: f64 = 1e-6;

/// Tolerance for the sum of IBZ weights.
const WEIGHT_SUM_TOL: f64 = 1e-10;

// ================
// Enum definitions
// ================

/// Enumerated type for errors arising from $`\mathbf{k}`$-point symmetry handling.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum KPointSymmetryError {
    /// No $`\mathbf{k}`$-points have been supplied.
    #[error("No k-points have been supplied.")]
    EmptyKPoints,

    /// The comparison tolerance is not a finite positive number.
    #[error("Invalid comparison tolerance {0:.3e}: a finite positive value is required.")]
    InvalidTolerance(f64),

    /// A $`\mathbf{k}`$-point array does not have the expected number of components.
    #[error("K-point array has {found} columns, but {expected} are required.")]
    KPointDimensionMismatch { expected: usize, found: usize },

    /// The lattice vectors of a cell are linearly dependent.
    #[error("Singular lattice: the lattice vectors have determinant {0:.3e}.")]
    SingularCell(f64),

    /// The space-group provider has failed.
    #[error("Unable to obtain the space group: {0}")]
    SpaceGroupUnavailable(String),

    /// A pair of coincident points found during $`\mathbf{k}`$-point mapping does not consist of
    /// one original point and one rotated image. This means the rotation does not map the list
    /// of $`\mathbf{k}`$-points onto itself consistently (or the list contains duplicates).
    #[error(
        "Inconsistent k-point mapping under operation {operator}: coincident points {first} and \
        {second} are not an (original, image) pair for {nbzk} BZ k-points."
    )]
    EquivalenceInvariantViolation {
        operator: usize,
        first: usize,
        second: usize,
        nbzk: usize,
    },

    /// The admitted rotation operators do not form a group.
    #[error("The admitted rotations do not form a group: {0}.")]
    GroupNotClosed(String),

    /// No admitted operation maps the IBZ representative of a BZ $`\mathbf{k}`$-point onto it.
    #[error(
        "No admitted operation maps IBZ k-point {ibz_index} onto BZ k-point {bz_index} at {} \
        within tolerance {tolerance:.3e}.",
        format_kpoint(.bz_k_scaled.iter())
    )]
    UnresolvedSymmetryConnection {
        bz_index: usize,
        ibz_index: usize,
        bz_k_scaled: Vec<f64>,
        tolerance: f64,
    },

    /// The bookkeeping of a $`\mathbf{k}`$-point container is inconsistent.
    #[error("Invalid k-point container: {0}")]
    InvalidContainer(String),
}

/// Enumerated type for the symmetrisation state of a [`KPoints`] container.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum SymmetrisationState {
    /// Every BZ $`\mathbf{k}`$-point is its own IBZ $`\mathbf{k}`$-point and the only operation
    /// is the identity.
    Unsymmetrised,

    /// The IBZ has been constructed from the symmetry operations of the space group.
    Symmetrised,
}

impl fmt::Display for SymmetrisationState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unsymmetrised => write!(f, "unsymmetrised"),
            Self::Symmetrised => write!(f, "symmetrised"),
        }
    }
}

// ==================
// Struct definitions
// ==================

/// Structure holding a BZ $`\mathbf{k}`$-point sampling together with its IBZ bookkeeping.
///
/// A [`KPoints`] container is immutable. It is first constructed in the
/// [`SymmetrisationState::Unsymmetrised`] state by [`KPoints::new`] or
/// [`KPoints::from_scaled`]; the symmetry-reduced container is a separate value returned by
/// [`KPoints::make_ibz_k`].
#[derive(Builder, Clone, Debug, Serialize, Deserialize)]
#[builder(build_fn(validate = "Self::validate"))]
pub struct KPoints {
    /// The lattice cell.
    cell: Cell,

    /// The space group of the cell.
    space_group: SpaceGroup,

    /// The tolerance for comparing $`\mathbf{k}`$-point coordinates.
    tolerance: f64,

    /// The symmetrisation state of this container.
    state: SymmetrisationState,

    /// The absolute BZ $`\mathbf{k}`$-points, one per row.
    bz_k: Array2<f64>,

    /// The scaled BZ $`\mathbf{k}`$-points, one per row, in the same order as [`Self::bz_k`].
    bz_k_scaled: Array2<f64>,

    /// The uniform quadrature weights of the BZ $`\mathbf{k}`$-points.
    bz_weight: Array1<f64>,

    /// The admitted rotation operators. If time reversal is considered, the second half of this
    /// list contains the negations of the first half.
    op_rot: Vec<Matrix3<i32>>,

    /// The number of admitted rotation operators before any time-reversal doubling.
    nrot: usize,

    /// Boolean indicating if time reversal has been considered.
    time_reversal: bool,

    /// The IBZ index of each BZ $`\mathbf{k}`$-point.
    bz2ibz: Vec<usize>,

    /// The representative BZ index of each IBZ $`\mathbf{k}`$-point.
    ibz2bz: Vec<usize>,

    /// The weights of the IBZ $`\mathbf{k}`$-points, given by the orbit sizes divided by the
    /// number of BZ $`\mathbf{k}`$-points.
    ibz_weight: Array1<f64>,

    /// The absolute IBZ $`\mathbf{k}`$-points, one per row.
    ibz_k: Array2<f64>,

    /// The scaled IBZ $`\mathbf{k}`$-points, one per row.
    ibz_k_scaled: Array2<f64>,

    /// For each BZ $`\mathbf{k}`$-point, the index in [`Self::op_rot`] of the operator mapping
    /// its IBZ representative onto it.
    sym_conn: Vec<usize>,

    /// For each IBZ $`\mathbf{k}`$-point, the indices in [`Self::op_rot`] of the operators
    /// connecting the representative to the members of its orbit, parallel to
    /// [`Self::bz_k_group`].
    sym_group: Vec<Vec<usize>>,

    /// For each IBZ $`\mathbf{k}`$-point, the BZ indices of the members of its orbit in
    /// ascending order.
    bz_k_group: Vec<Vec<usize>>,
}

impl KPointsBuilder {
    fn validate(&self) -> Result<(), String> {
        let tolerance = self.tolerance.ok_or("No tolerance found.".to_string())?;
        if !(tolerance.is_finite() && tolerance > 0.0) {
            return Err(format!("Invalid tolerance {tolerance:.3e}."));
        }
        let bz_k = self.bz_k.as_ref().ok_or("No BZ k-points found.".to_string())?;
        let bz_k_scaled = self
            .bz_k_scaled
            .as_ref()
            .ok_or("No scaled BZ k-points found.".to_string())?;
        let bz_weight = self
            .bz_weight
            .as_ref()
            .ok_or("No BZ weights found.".to_string())?;
        let nbzk = bz_k.nrows();
        if nbzk == 0 {
            return Err("No BZ k-points found.".to_string());
        }
        if bz_k.shape() != bz_k_scaled.shape() || bz_k.ncols() != 3 || bz_weight.len() != nbzk {
            return Err(format!(
                "Inconsistent BZ array shapes: absolute {:?}, scaled {:?}, weights {:?}.",
                bz_k.shape(),
                bz_k_scaled.shape(),
                bz_weight.shape()
            ));
        }

        let op_rot = self
            .op_rot
            .as_ref()
            .ok_or("No rotation operators found.".to_string())?;
        let nrot = self.nrot.ok_or("No rotation count found.".to_string())?;
        let time_reversal = self
            .time_reversal
            .ok_or("No time-reversal flag found.".to_string())?;
        let expected_nops = if time_reversal { 2 * nrot } else { nrot };
        if nrot == 0 || op_rot.len() != expected_nops {
            return Err(format!(
                "{} rotation operators found, but {expected_nops} expected from {nrot} \
                rotations with time reversal {}.",
                op_rot.len(),
                nice_bool(time_reversal)
            ));
        }

        let bz2ibz = self
            .bz2ibz
            .as_ref()
            .ok_or("No BZ-to-IBZ mapping found.".to_string())?;
        let ibz2bz = self
            .ibz2bz
            .as_ref()
            .ok_or("No IBZ-to-BZ mapping found.".to_string())?;
        let nibzk = ibz2bz.len();
        if bz2ibz.len() != nbzk || bz2ibz.iter().any(|&i| i >= nibzk) {
            return Err("The BZ-to-IBZ mapping is inconsistent with the IBZ.".to_string());
        }
        if let Some((i, _)) = ibz2bz
            .iter()
            .enumerate()
            .find(|(i, &k)| k >= nbzk || bz2ibz[k] != *i)
        {
            return Err(format!(
                "IBZ k-point {i} is not mapped back onto itself by its BZ representative."
            ));
        }

        let ibz_weight = self
            .ibz_weight
            .as_ref()
            .ok_or("No IBZ weights found.".to_string())?;
        if ibz_weight.len() != nibzk {
            return Err("The number of IBZ weights does not match the IBZ.".to_string());
        }
        let weight_sum = ibz_weight.sum();
        if (weight_sum - 1.0).abs() > WEIGHT_SUM_TOL {
            return Err(format!("The IBZ weights sum to {weight_sum}, not 1."));
        }
        let ibz_k = self
            .ibz_k
            .as_ref()
            .ok_or("No IBZ k-points found.".to_string())?;
        let ibz_k_scaled = self
            .ibz_k_scaled
            .as_ref()
            .ok_or("No scaled IBZ k-points found.".to_string())?;
        if ibz_k.shape() != [nibzk, 3] || ibz_k_scaled.shape() != [nibzk, 3] {
            return Err("The IBZ k-point arrays do not match the IBZ.".to_string());
        }

        let sym_conn = self
            .sym_conn
            .as_ref()
            .ok_or("No symmetry connections found.".to_string())?;
        if sym_conn.len() != nbzk || sym_conn.iter().any(|&iop| iop >= op_rot.len()) {
            return Err("The symmetry connections are inconsistent.".to_string());
        }
        let sym_group = self
            .sym_group
            .as_ref()
            .ok_or("No symmetry groups found.".to_string())?;
        let bz_k_group = self
            .bz_k_group
            .as_ref()
            .ok_or("No BZ k-point groups found.".to_string())?;
        if sym_group.len() != nibzk || bz_k_group.len() != nibzk {
            return Err("The orbit bookkeeping does not match the IBZ.".to_string());
        }
        let orbits_consistent = sym_group
            .iter()
            .zip(bz_k_group.iter())
            .enumerate()
            .all(|(i, (ops, members))| {
                ops.len() == members.len()
                    && ops.iter().all(|&iop| iop < op_rot.len())
                    && members.iter().all(|&k| k < nbzk && bz2ibz[k] == i)
            });
        if !orbits_consistent {
            return Err("The orbit bookkeeping is inconsistent.".to_string());
        }
        Ok(())
    }
}

impl KPoints {
    /// Returns a builder to construct a new [`KPoints`].
    fn builder() -> KPointsBuilder {
        KPointsBuilder::default()
    }

    /// Constructs an unsymmetrised container from absolute BZ $`\mathbf{k}`$-points.
    ///
    /// # Arguments
    ///
    /// * `cell` - The lattice cell.
    /// * `kpts` - An $`N \times 3`$ array of absolute BZ $`\mathbf{k}`$-points.
    /// * `provider` - The source of the space group of `cell`.
    /// * `tolerance` - The tolerance for comparing $`\mathbf{k}`$-point coordinates, usually
    ///   [`KPT_DIFF_TOL`].
    ///
    /// # Returns
    ///
    /// The unsymmetrised container in which every BZ $`\mathbf{k}`$-point is its own IBZ
    /// $`\mathbf{k}`$-point.
    pub fn new<P>(
        cell: &Cell,
        kpts: &Array2<f64>,
        provider: &P,
        tolerance: f64,
    ) -> Result<Self, KPointSymmetryError>
    where
        P: SpaceGroupProvider + ?Sized,
    {
        let bz_k_scaled = cell.get_scaled_kpts(kpts)?;
        Self::unsymmetrised(cell, kpts.clone(), bz_k_scaled, provider, tolerance)
    }

    /// Constructs an unsymmetrised container from scaled BZ $`\mathbf{k}`$-points.
    ///
    /// # Arguments
    ///
    /// * `cell` - The lattice cell.
    /// * `kpts_scaled` - An $`N \times 3`$ array of scaled BZ $`\mathbf{k}`$-points.
    /// * `provider` - The source of the space group of `cell`.
    /// * `tolerance` - The tolerance for comparing $`\mathbf{k}`$-point coordinates.
    pub fn from_scaled<P>(
        cell: &Cell,
        kpts_scaled: &Array2<f64>,
        provider: &P,
        tolerance: f64,
    ) -> Result<Self, KPointSymmetryError>
    where
        P: SpaceGroupProvider + ?Sized,
    {
        let bz_k = cell.get_abs_kpts(kpts_scaled)?;
        Self::unsymmetrised(cell, bz_k, kpts_scaled.clone(), provider, tolerance)
    }

    fn unsymmetrised<P>(
        cell: &Cell,
        bz_k: Array2<f64>,
        bz_k_scaled: Array2<f64>,
        provider: &P,
        tolerance: f64,
    ) -> Result<Self, KPointSymmetryError>
    where
        P: SpaceGroupProvider + ?Sized,
    {
        check_tolerance(tolerance)?;
        check_kpoint_dimension(&bz_k)?;
        let nbzk = bz_k.nrows();
        if nbzk == 0 {
            return Err(KPointSymmetryError::EmptyKPoints);
        }
        let space_group = provider.space_group(cell)?;
        let weight = Array1::from_elem(nbzk, 1.0 / nbzk as f64);
        Self::builder()
            .cell(cell.clone())
            .space_group(space_group)
            .tolerance(tolerance)
            .state(SymmetrisationState::Unsymmetrised)
            .ibz_k(bz_k.clone())
            .ibz_k_scaled(bz_k_scaled.clone())
            .bz_k(bz_k)
            .bz_k_scaled(bz_k_scaled)
            .bz_weight(weight.clone())
            .op_rot(vec![Matrix3::identity()])
            .nrot(1)
            .time_reversal(false)
            .bz2ibz((0..nbzk).collect_vec())
            .ibz2bz((0..nbzk).collect_vec())
            .ibz_weight(weight)
            .sym_conn(vec![0; nbzk])
            .sym_group(vec![vec![0]; nbzk])
            .bz_k_group((0..nbzk).map(|k| vec![k]).collect_vec())
            .build()
            .map_err(|err| KPointSymmetryError::InvalidContainer(err.to_string()))
    }

    /// Returns the lattice cell.
    pub fn cell(&self) -> &Cell {
        &self.cell
    }

    /// Returns the space group of the cell.
    pub fn space_group(&self) -> &SpaceGroup {
        &self.space_group
    }

    /// Returns the tolerance for comparing $`\mathbf{k}`$-point coordinates.
    pub fn tolerance(&self) -> f64 {
        self.tolerance
    }

    /// Returns the symmetrisation state.
    pub fn state(&self) -> SymmetrisationState {
        self.state
    }

    /// Returns the number of BZ $`\mathbf{k}`$-points.
    pub fn nbzk(&self) -> usize {
        self.bz_k.nrows()
    }

    /// Returns the number of IBZ $`\mathbf{k}`$-points.
    pub fn nibzk(&self) -> usize {
        self.ibz2bz.len()
    }

    pub fn bz_k(&self) -> &Array2<f64> {
        &self.bz_k
    }

    pub fn bz_k_scaled(&self) -> &Array2<f64> {
        &self.bz_k_scaled
    }

    pub fn bz_weight(&self) -> &Array1<f64> {
        &self.bz_weight
    }

    /// Returns the admitted rotation operators, doubled by time reversal if considered.
    pub fn op_rot(&self) -> &[Matrix3<i32>] {
        &self.op_rot
    }

    /// Returns the number of admitted rotation operators before time-reversal doubling.
    /// Operator indices at or beyond this number are time-reversal-paired.
    pub fn nrot(&self) -> usize {
        self.nrot
    }

    /// Returns a boolean indicating if time reversal has been considered.
    pub fn time_reversal(&self) -> bool {
        self.time_reversal
    }

    pub fn bz2ibz(&self) -> &[usize] {
        &self.bz2ibz
    }

    pub fn ibz2bz(&self) -> &[usize] {
        &self.ibz2bz
    }

    pub fn ibz_weight(&self) -> &Array1<f64> {
        &self.ibz_weight
    }

    pub fn ibz_k(&self) -> &Array2<f64> {
        &self.ibz_k
    }

    pub fn ibz_k_scaled(&self) -> &Array2<f64> {
        &self.ibz_k_scaled
    }

    pub fn sym_conn(&self) -> &[usize] {
        &self.sym_conn
    }

    pub fn sym_group(&self) -> &[Vec<usize>] {
        &self.sym_group
    }

    pub fn bz_k_group(&self) -> &[Vec<usize>] {
        &self.bz_k_group
    }
}

impl fmt::Display for KPoints {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write_subtitle(f, "K-point symmetry summary")?;
        writeln!(f, "State: {}", self.state)?;
        writeln!(f, "Tolerance: {:.3e}", self.tolerance)?;
        writeln!(f, "BZ k-points: {}", self.nbzk())?;
        writeln!(f, "IBZ k-points: {}", self.nibzk())?;
        writeln!(f, "Rotations admitted: {}", self.nrot)?;
        writeln!(f, "Time reversal considered: {}", nice_bool(self.time_reversal))?;
        writeln!(f)?;

        let width = self.nibzk().max(self.nbzk()).to_string().len().max(3);
        writeln!(f, "{}", "┈".repeat(width * 2 + 60))?;
        writeln!(
            f,
            "{:>width$} {:>width$}  {:^37} {:>10} {:>6}",
            "IBZ",
            "BZ",
            "Scaled k-point",
            "Weight",
            "Orbit",
        )?;
        writeln!(f, "{}", "┈".repeat(width * 2 + 60))?;
        for (i, (k, kpt)) in self
            .ibz2bz
            .iter()
            .zip(self.ibz_k_scaled.rows())
            .enumerate()
        {
            writeln!(
                f,
                "{i:>width$} {k:>width$}  {:^37} {:>10.6} {:>6}",
                format_kpoint(kpt.iter()),
                self.ibz_weight[i],
                self.bz_k_group[i].len(),
            )?;
        }
        writeln!(f, "{}", "┈".repeat(width * 2 + 60))?;
        Ok(())
    }
}

// =========
// Functions
// =========

/// Checks that a comparison tolerance is finite and positive.
pub(crate) fn check_tolerance(tolerance: f64) -> Result<(), KPointSymmetryError> {
    if tolerance.is_finite() && tolerance > 0.0 {
        Ok(())
    } else {
        Err(KPointSymmetryError::InvalidTolerance(tolerance))
    }
}
