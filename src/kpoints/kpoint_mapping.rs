//! Symmetry relations between $`\mathbf{k}`$-points.

use std::cmp::Ordering;

use itertools::Itertools;
use log;
use nalgebra::Matrix3;
use ndarray::{s, Array2};

use crate::auxiliary::cell::check_kpoint_dimension;
use crate::kpoints::agglomeration::agglomerate_points;
use crate::kpoints::{check_tolerance, KPointSymmetryError};
use crate::symmetry::space_group::{format_rotation, rotation_to_array, with_time_reversal};

#[cfg(test)]
#[path = "kpoint_mapping_tests.rs"]
mod kpoint_mapping_tests;

/// Finds the symmetry relations between a list of $`\mathbf{k}`$-points.
///
/// For every $`\mathbf{k}`$-point $`\mathbf{k}_a`$ and every operator $`\mathbf{U}_s`$, the
/// returned table contains at `[a, s]` the index $`b`$ such that
/// $`\mathbf{k}_a \mathbf{U}_s^{\mathsf{T}} = \mathbf{k}_b`$, or `None` if the image is not in
/// the list. Images are matched exactly after denoising, not modulo reciprocal lattice vectors.
///
/// For each operator, the original points and their images are stacked, agglomerated with
/// [`agglomerate_points`], rounded to $`-\log_{10}(\textrm{tolerance})`$ decimal places, and sorted
/// lexicographically. Adjacent identical rows are then equivalent pairs, each of which must
/// consist of one original point and one image.
///
/// # Arguments
///
/// * `bz_k_scaled` - An $`N \times 3`$ array of scaled $`\mathbf{k}`$-points.
/// * `ops` - The rotation operators.
/// * `time_reversal` - Boolean indicating if the negated operators are to be appended.
/// * `tolerance` - The tolerance for comparing $`\mathbf{k}`$-point coordinates.
///
/// # Returns
///
/// An $`N \times S'`$ table where $`S'`$ is the number of operators, doubled if `time_reversal`
/// is `true`.
///
/// # Errors
///
/// Errors with [`KPointSymmetryError::EquivalenceInvariantViolation`] if two original points or
/// two images coincide, which happens when an operator does not map the list of
/// $`\mathbf{k}`$-points onto itself consistently or when the list contains duplicates.
pub fn map_k_points(
    bz_k_scaled: &Array2<f64>,
    ops: &[Matrix3<i32>],
    time_reversal: bool,
    tolerance: f64,
) -> Result<Array2<Option<usize>>, KPointSymmetryError> {
    check_tolerance(tolerance)?;
    check_kpoint_dimension(bz_k_scaled)?;
    let nbzk = bz_k_scaled.nrows();
    let all_ops = if time_reversal {
        with_time_reversal(ops)
    } else {
        ops.to_vec()
    };
    let scale = 10f64.powi(rounding_decimals(tolerance));

    let mut bz2bz_ks = Array2::from_elem((nbzk, all_ops.len()), None);
    for (s, op) in all_ops.iter().enumerate() {
        let mut k_kc = Array2::<f64>::zeros((2 * nbzk, 3));
        k_kc.slice_mut(s![..nbzk, ..]).assign(bz_k_scaled);
        k_kc.slice_mut(s![nbzk.., ..])
            .assign(&bz_k_scaled.dot(&rotation_to_array(op).t()));
        agglomerate_points(&mut k_kc, tolerance);

        let keys = k_kc
            .rows()
            .into_iter()
            .map(|row| row.iter().map(|x| (x * scale).round() as i64).collect_vec())
            .collect_vec();
        let order = (0..2 * nbzk)
            .sorted_by(|&i, &j| lexicographic_cmp(&keys[i], &keys[j]))
            .collect_vec();

        let mut nmatches = 0;
        for (&first, &second) in order.iter().tuple_windows() {
            if keys[first] != keys[second] {
                continue;
            }
            if first >= nbzk || second < nbzk {
                return Err(KPointSymmetryError::EquivalenceInvariantViolation {
                    operator: s,
                    first,
                    second,
                    nbzk,
                });
            }
            bz2bz_ks[[second - nbzk, s]] = Some(first);
            nmatches += 1;
        }

        if nmatches == 0 {
            log::warn!(
                "Operation {s} {} maps no k-point onto another one in the list.",
                format_rotation(op)
            );
        } else {
            log::debug!("Operation {s}: {nmatches} of {nbzk} k-points mapped.");
        }
    }
    Ok(bz2bz_ks)
}

/// Returns the number of decimal places retained when rounding coordinates for exact
/// comparison.
pub(crate) fn rounding_decimals(tolerance: f64) -> i32 {
    (-tolerance.log10()).round() as i32
}

/// Compares two rows lexicographically with the last component as the primary key.
fn lexicographic_cmp(a: &[i64], b: &[i64]) -> Ordering {
    a.iter().rev().cmp(b.iter().rev())
}
