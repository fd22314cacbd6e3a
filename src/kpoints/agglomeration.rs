//! Agglomeration of nearly coincident coordinates.

use itertools::Itertools;
use ndarray::{Array2, Axis};

#[cfg(test)]
#[path = "agglomeration_tests.rs"]
mod agglomeration_tests;

/// Snaps nearly coincident coordinate values together in place to remove numerical noise.
///
/// Each dimension is treated independently. The values along a dimension are sorted and walked
/// in order; a new cluster starts whenever the gap between two consecutive sorted values exceeds
/// `tolerance`, and every value in a cluster is overwritten by the first (smallest) value of
/// that cluster.
///
/// This is a single-pass heuristic rather than a true clustering: it assumes that noise is
/// smaller than `tolerance` and that genuinely distinct values differ by more than
/// `tolerance`. Chains of values each within `tolerance` of the next collapse into a single
/// cluster. Applying it a second time with the same tolerance leaves the values unchanged.
///
/// # Arguments
///
/// * `points` - An $`N \times D`$ array of points, one per row, modified in place.
/// * `tolerance` - The largest gap between consecutive sorted values within a cluster.
pub fn agglomerate_points(points: &mut Array2<f64>, tolerance: f64) {
    let npoints = points.nrows();
    if npoints == 0 {
        return;
    }
    for mut column in points.axis_iter_mut(Axis(1)) {
        let order = (0..npoints)
            .sorted_by(|&i, &j| column[i].total_cmp(&column[j]))
            .collect_vec();
        let sorted_values = order.iter().map(|&i| column[i]).collect_vec();
        let mut cluster_value = sorted_values[0];
        for (pos, &i) in order.iter().enumerate() {
            if pos > 0 && sorted_values[pos] - sorted_values[pos - 1] > tolerance {
                cluster_value = sorted_values[pos];
            }
            column[i] = cluster_value;
        }
    }
}
