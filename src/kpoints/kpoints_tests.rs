use std::f64::consts::PI;

use approx::assert_relative_eq;
use nalgebra::Matrix3;
use ndarray::{array, Array2};

use crate::auxiliary::cell::Cell;
use crate::kpoints::{KPointSymmetryError, KPoints, SymmetrisationState, KPT_DIFF_TOL};
use crate::symmetry::space_group::{SpaceGroup, SpaceGroupProvider};

struct FailingProvider;

impl SpaceGroupProvider for FailingProvider {
    fn space_group(&self, _: &Cell) -> Result<SpaceGroup, KPointSymmetryError> {
        Err(KPointSymmetryError::SpaceGroupUnavailable(
            "symmetry finder unavailable".to_string(),
        ))
    }
}

fn cell() -> Cell {
    Cell::from_rows(&[[2.0, 0.0, 0.0], [0.0, 2.0, 0.0], [0.0, 0.0, 4.0]]).unwrap()
}

#[test]
fn test_kpoints_unsymmetrised_state() {
    let kpts_scaled = array![[0.0, 0.0, 0.0], [0.5, 0.0, 0.0], [0.0, 0.5, 0.25]];
    let kpts =
        KPoints::from_scaled(&cell(), &kpts_scaled, &SpaceGroup::trivial(), KPT_DIFF_TOL).unwrap();
    assert_eq!(kpts.state(), SymmetrisationState::Unsymmetrised);
    assert_eq!(kpts.nbzk(), 3);
    assert_eq!(kpts.nibzk(), 3);
    assert_eq!(kpts.nrot(), 1);
    assert!(!kpts.time_reversal());
    assert_eq!(kpts.op_rot(), &[Matrix3::identity()]);
    assert_eq!(kpts.bz2ibz(), &[0, 1, 2]);
    assert_eq!(kpts.ibz2bz(), &[0, 1, 2]);
    assert_eq!(kpts.sym_conn(), &[0, 0, 0]);
    assert_eq!(kpts.sym_group(), &[vec![0], vec![0], vec![0]]);
    assert_eq!(kpts.bz_k_group(), &[vec![0], vec![1], vec![2]]);
    assert_eq!(kpts.ibz_k_scaled(), &kpts_scaled);
    assert_relative_eq!(kpts.bz_weight().sum(), 1.0);
    assert_relative_eq!(kpts.ibz_weight()[1], 1.0 / 3.0);
    assert_relative_eq!(kpts.bz_k()[[1, 0]], PI / 2.0);
    assert_relative_eq!(kpts.bz_k()[[2, 2]], PI / 8.0);
}

#[test]
fn test_kpoints_absolute_and_scaled_agree() {
    let kpts_abs = array![[PI / 2.0, 0.0, 0.0], [0.0, -PI / 2.0, PI / 4.0]];
    let from_abs = KPoints::new(&cell(), &kpts_abs, &SpaceGroup::trivial(), KPT_DIFF_TOL).unwrap();
    let from_scaled = KPoints::from_scaled(
        &cell(),
        from_abs.bz_k_scaled(),
        &SpaceGroup::trivial(),
        KPT_DIFF_TOL,
    )
    .unwrap();
    assert_relative_eq!(
        from_abs.bz_k_scaled(),
        &array![[0.5, 0.0, 0.0], [0.0, -0.5, 0.5]],
        epsilon = 1e-12
    );
    assert_relative_eq!(from_abs.bz_k(), from_scaled.bz_k(), epsilon = 1e-12);
}

#[test]
fn test_kpoints_invalid_inputs() {
    let sg = SpaceGroup::trivial();
    assert_eq!(
        KPoints::from_scaled(&cell(), &Array2::zeros((0, 3)), &sg, KPT_DIFF_TOL).unwrap_err(),
        KPointSymmetryError::EmptyKPoints
    );
    assert_eq!(
        KPoints::from_scaled(&cell(), &Array2::zeros((2, 2)), &sg, KPT_DIFF_TOL).unwrap_err(),
        KPointSymmetryError::KPointDimensionMismatch {
            expected: 3,
            found: 2
        }
    );
    assert_eq!(
        KPoints::from_scaled(&cell(), &Array2::zeros((1, 3)), &sg, 0.0).unwrap_err(),
        KPointSymmetryError::InvalidTolerance(0.0)
    );
    assert!(matches!(
        KPoints::from_scaled(&cell(), &Array2::zeros((1, 3)), &sg, f64::NAN),
        Err(KPointSymmetryError::InvalidTolerance(_))
    ));
}

#[test]
fn test_kpoints_provider_failure() {
    let err = KPoints::from_scaled(
        &cell(),
        &array![[0.0, 0.0, 0.0]],
        &FailingProvider,
        KPT_DIFF_TOL,
    )
    .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Unable to obtain the space group: symmetry finder unavailable"
    );
}

#[test]
fn test_kpoints_display() {
    let kpts = KPoints::from_scaled(
        &cell(),
        &array![[0.0, 0.0, 0.0], [0.25, 0.0, 0.0]],
        &SpaceGroup::trivial(),
        KPT_DIFF_TOL,
    )
    .unwrap();
    let output = kpts.to_string();
    assert!(output.contains("State: unsymmetrised"));
    assert!(output.contains("IBZ k-points: 2"));
    assert!(output.contains("(+0.250000, +0.000000, +0.000000)"));
}

#[test]
fn test_kpoints_error_messages() {
    let err = KPointSymmetryError::UnresolvedSymmetryConnection {
        bz_index: 3,
        ibz_index: 1,
        bz_k_scaled: vec![0.25, -0.5, 0.0],
        tolerance: 1e-6,
    };
    assert_eq!(
        err.to_string(),
        "No admitted operation maps IBZ k-point 1 onto BZ k-point 3 at \
        (+0.250000, -0.500000, +0.000000) within tolerance 1.000e-6."
    );
}
