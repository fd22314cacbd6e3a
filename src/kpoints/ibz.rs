//! Construction of the irreducible Brillouin zone.

use std::fmt;

use derive_builder::Builder;
use itertools::Itertools;
use log;
use nalgebra::Matrix3;
use ndarray::{Array1, Axis};
use serde::{Deserialize, Serialize};

use crate::io::format::nice_bool;
use crate::kpoints::kpoint_mapping::map_k_points;
use crate::kpoints::{KPointSymmetryError, KPoints, SymmetrisationState};
use crate::symmetry::space_group::{
    is_identity, rotate_kpoint, verify_group_closure, with_time_reversal,
};

#[cfg(test)]
#[path = "ibz_tests.rs"]
mod ibz_tests;

// ==================
// Struct definitions
// ==================

/// Structure containing the options controlling the IBZ construction.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IbzParams {
    /// Boolean indicating if time-reversal symmetry is to be considered, in which case
    /// $`\mathbf{k}`$ and $`-\mathbf{k}`$ are treated as equivalent.
    #[builder(default = "true")]
    pub time_reversal: bool,

    /// Boolean indicating if the symmorphic rotations of the space group are to be admitted. If
    /// `false`, only the identity is admitted.
    #[builder(default = "true")]
    pub point_group: bool,

    /// Boolean indicating if the admitted rotations are to be checked for closure under
    /// composition before use.
    #[builder(default = "true")]
    pub verify_group_closure: bool,
}

impl IbzParams {
    /// Returns a builder to construct a new [`IbzParams`].
    pub fn builder() -> IbzParamsBuilder {
        IbzParamsBuilder::default()
    }
}

impl Default for IbzParams {
    fn default() -> Self {
        Self {
            time_reversal: true,
            point_group: true,
            verify_group_closure: true,
        }
    }
}

impl fmt::Display for IbzParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Time reversal: {}", nice_bool(self.time_reversal))?;
        writeln!(f, "Point-group rotations: {}", nice_bool(self.point_group))?;
        writeln!(
            f,
            "Group closure verification: {}",
            nice_bool(self.verify_group_closure)
        )?;
        Ok(())
    }
}

impl KPoints {
    /// Constructs the irreducible Brillouin zone of this $`\mathbf{k}`$-point sampling.
    ///
    /// The BZ $`\mathbf{k}`$-points are scanned from the highest index down to the lowest. Every
    /// point not yet assigned to an orbit becomes the representative of a new IBZ
    /// $`\mathbf{k}`$-point, and all of its images under the admitted operators are assigned to
    /// it. The IBZ is then listed in ascending order of representative index.
    ///
    /// # Arguments
    ///
    /// * `params` - The options controlling the construction.
    ///
    /// # Returns
    ///
    /// A new container in the [`SymmetrisationState::Symmetrised`] state. This container is left
    /// unchanged.
    ///
    /// # Errors
    ///
    /// Errors if no rotation is admitted, if the admitted rotations are not closed under
    /// composition (when checked), if the $`\mathbf{k}`$-point mapping is inconsistent, or if
    /// some BZ $`\mathbf{k}`$-point cannot be linked back to its IBZ representative.
    pub fn make_ibz_k(&self, params: &IbzParams) -> Result<KPoints, KPointSymmetryError> {
        let tolerance = self.tolerance();
        let admitted = if params.point_group {
            self.space_group().symmorphic_rotations(tolerance)
        } else {
            self.space_group()
                .rotations()
                .iter()
                .filter(|op| is_identity(op))
                .take(1)
                .cloned()
                .collect_vec()
        };
        if admitted.is_empty() {
            return Err(KPointSymmetryError::SpaceGroupUnavailable(
                "no symmorphic rotation is available".to_string(),
            ));
        }
        if params.verify_group_closure {
            verify_group_closure(&admitted)?;
        }
        let nrot = admitted.len();
        let op_rot = if params.time_reversal {
            with_time_reversal(&admitted)
        } else {
            admitted.clone()
        };
        log::debug!(
            "{nrot} rotations admitted, {} operators in total.",
            op_rot.len()
        );

        let nbzk = self.nbzk();
        let bz2bz_ks = map_k_points(
            self.bz_k_scaled(),
            &admitted,
            params.time_reversal,
            tolerance,
        )?;

        let mut representative: Vec<Option<usize>> = vec![None; nbzk];
        let mut ibz2bz = Vec::with_capacity(nbzk);
        for k in (0..nbzk).rev() {
            if representative[k].is_some() {
                continue;
            }
            representative[k] = Some(k);
            for image in bz2bz_ks.row(k).iter().flatten() {
                if representative[*image].is_none() {
                    representative[*image] = Some(k);
                }
            }
            ibz2bz.push(k);
        }
        ibz2bz.reverse();
        let nibzk = ibz2bz.len();

        let mut ibz_index = vec![0; nbzk];
        for (i, &k) in ibz2bz.iter().enumerate() {
            ibz_index[k] = i;
        }
        let bz2ibz = representative
            .iter()
            .map(|rep| {
                rep.map(|k| ibz_index[k]).ok_or_else(|| {
                    KPointSymmetryError::InvalidContainer(
                        "a BZ k-point has been left without a representative".to_string(),
                    )
                })
            })
            .collect::<Result<Vec<_>, _>>()?;

        let mut orbit_sizes = vec![0usize; nibzk];
        for &i in bz2ibz.iter() {
            orbit_sizes[i] += 1;
        }
        let ibz_weight = Array1::from_shape_fn(nibzk, |i| orbit_sizes[i] as f64 / nbzk as f64);
        let ibz_k_scaled = self.bz_k_scaled().select(Axis(0), &ibz2bz);
        let ibz_k = self.bz_k().select(Axis(0), &ibz2bz);

        let sym_conn = (0..nbzk)
            .map(|k| find_symmetry_connection(self, &op_rot, k, &ibz2bz, &bz2ibz))
            .collect::<Result<Vec<_>, _>>()?;

        let mut sym_group = vec![vec![]; nibzk];
        let mut bz_k_group = vec![vec![]; nibzk];
        for (k, &i) in bz2ibz.iter().enumerate() {
            sym_group[i].push(sym_conn[k]);
            bz_k_group[i].push(k);
        }
        log::debug!("{nbzk} BZ k-points reduced to {nibzk} IBZ k-points.");

        KPoints::builder()
            .cell(self.cell().clone())
            .space_group(self.space_group().clone())
            .tolerance(tolerance)
            .state(SymmetrisationState::Symmetrised)
            .bz_k(self.bz_k().clone())
            .bz_k_scaled(self.bz_k_scaled().clone())
            .bz_weight(self.bz_weight().clone())
            .op_rot(op_rot)
            .nrot(nrot)
            .time_reversal(params.time_reversal)
            .bz2ibz(bz2ibz)
            .ibz2bz(ibz2bz)
            .ibz_weight(ibz_weight)
            .ibz_k(ibz_k)
            .ibz_k_scaled(ibz_k_scaled)
            .sym_conn(sym_conn)
            .sym_group(sym_group)
            .bz_k_group(bz_k_group)
            .build()
            .map_err(|err| KPointSymmetryError::InvalidContainer(err.to_string()))
    }
}

// =========
// Functions
// =========

/// Finds the first operator mapping the IBZ representative of BZ $`\mathbf{k}`$-point `k` onto
/// it, compared component-wise within the tolerance of `kpts`.
fn find_symmetry_connection(
    kpts: &KPoints,
    op_rot: &[Matrix3<i32>],
    k: usize,
    ibz2bz: &[usize],
    bz2ibz: &[usize],
) -> Result<usize, KPointSymmetryError> {
    let tolerance = kpts.tolerance();
    let target = kpts.bz_k_scaled().row(k);
    let ibz_index = bz2ibz[k];
    let rep = kpts.bz_k_scaled().row(ibz2bz[ibz_index]);
    op_rot
        .iter()
        .position(|op| {
            rotate_kpoint(op, rep)
                .iter()
                .zip(target.iter())
                .all(|(a, b)| (a - b).abs() < tolerance)
        })
        .ok_or_else(|| KPointSymmetryError::UnresolvedSymmetryConnection {
            bz_index: k,
            ibz_index,
            bz_k_scaled: target.to_vec(),
            tolerance,
        })
}
