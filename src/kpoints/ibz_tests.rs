use approx::assert_relative_eq;
use itertools::Itertools;
use nalgebra::{Matrix3, Vector3};
use ndarray::{array, Array2};

use crate::auxiliary::cell::{monkhorst_pack, Cell};
use crate::kpoints::ibz::IbzParams;
use crate::kpoints::{KPointSymmetryError, KPoints, SymmetrisationState, KPT_DIFF_TOL};
use crate::symmetry::space_group::{rotate_kpoint, SpaceGroup};

fn cubic_cell() -> Cell {
    Cell::from_rows(&[[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 5.0]]).unwrap()
}

fn c2z() -> Matrix3<i32> {
    Matrix3::from_diagonal(&Vector3::new(-1, -1, 1))
}

fn c4v() -> Vec<Matrix3<i32>> {
    vec![
        Matrix3::identity(),
        Matrix3::new(0, -1, 0, 1, 0, 0, 0, 0, 1),
        c2z(),
        Matrix3::new(0, 1, 0, -1, 0, 0, 0, 0, 1),
        Matrix3::from_diagonal(&Vector3::new(-1, 1, 1)),
        Matrix3::from_diagonal(&Vector3::new(1, -1, 1)),
        Matrix3::new(0, 1, 0, 1, 0, 0, 0, 0, 1),
        Matrix3::new(0, -1, 0, -1, 0, 0, 0, 0, 1),
    ]
}

fn params(time_reversal: bool, point_group: bool) -> IbzParams {
    IbzParams::builder()
        .time_reversal(time_reversal)
        .point_group(point_group)
        .build()
        .unwrap()
}

fn assert_connections_consistent(ibz: &KPoints) {
    for k in 0..ibz.nbzk() {
        let i = ibz.bz2ibz()[k];
        let op = &ibz.op_rot()[ibz.sym_conn()[k]];
        let image = rotate_kpoint(op, ibz.ibz_k_scaled().row(i));
        for (a, b) in image.iter().zip(ibz.bz_k_scaled().row(k).iter()) {
            assert!((a - b).abs() < ibz.tolerance());
        }
    }
}

#[test]
fn test_ibz_params_defaults() {
    let default_params = IbzParams::default();
    assert!(default_params.time_reversal);
    assert!(default_params.point_group);
    assert!(default_params.verify_group_closure);
    assert_eq!(IbzParams::builder().build().unwrap(), default_params);

    let yaml_params: IbzParams = serde_yaml::from_str("time_reversal: false").unwrap();
    assert!(!yaml_params.time_reversal);
    assert!(yaml_params.point_group);
}

#[test]
fn test_ibz_c2_four_points() {
    let kpts_scaled = array![
        [-0.25, 0.0, 0.0],
        [0.0, -0.25, 0.0],
        [0.0, 0.25, 0.0],
        [0.25, 0.0, 0.0]
    ];
    let sg = SpaceGroup::from_rotations(&[Matrix3::identity(), c2z()]);
    let kpts = KPoints::from_scaled(&cubic_cell(), &kpts_scaled, &sg, KPT_DIFF_TOL).unwrap();
    let ibz = kpts.make_ibz_k(&params(false, true)).unwrap();

    assert_eq!(ibz.state(), SymmetrisationState::Symmetrised);
    assert_eq!(kpts.state(), SymmetrisationState::Unsymmetrised);
    assert_eq!(ibz.nrot(), 2);
    assert_eq!(ibz.op_rot().len(), 2);
    assert_eq!(ibz.ibz2bz(), &[2, 3]);
    assert_eq!(ibz.bz2ibz(), &[1, 0, 0, 1]);
    assert_relative_eq!(ibz.ibz_weight()[0], 0.5);
    assert_relative_eq!(ibz.ibz_weight()[1], 0.5);
    assert_eq!(ibz.sym_conn(), &[1, 1, 0, 0]);
    assert_eq!(ibz.sym_group(), &[vec![1, 0], vec![1, 0]]);
    assert_eq!(ibz.bz_k_group(), &[vec![1, 2], vec![0, 3]]);
    assert_eq!(ibz.ibz_k_scaled(), &array![[0.0, 0.25, 0.0], [0.25, 0.0, 0.0]]);
    assert_eq!(ibz.ibz_k().row(1), kpts.bz_k().row(3));
    assert_connections_consistent(&ibz);
}

#[test]
fn test_ibz_c4v_monkhorst_pack() {
    let sg = SpaceGroup::from_rotations(&c4v());
    let kpts =
        KPoints::from_scaled(&cubic_cell(), &monkhorst_pack([4, 4, 1]), &sg, KPT_DIFF_TOL)
            .unwrap();
    for time_reversal in [false, true] {
        let ibz = kpts.make_ibz_k(&params(time_reversal, true)).unwrap();
        assert_eq!(ibz.nrot(), 8);
        assert_eq!(ibz.op_rot().len(), if time_reversal { 16 } else { 8 });
        assert_eq!(ibz.time_reversal(), time_reversal);
        assert_eq!(ibz.ibz2bz(), &[10, 14, 15]);
        assert_relative_eq!(ibz.ibz_weight(), &array![0.25, 0.5, 0.25]);
        assert_relative_eq!(ibz.ibz_k_scaled(), &array![
            [0.125, 0.125, 0.0],
            [0.375, 0.125, 0.0],
            [0.375, 0.375, 0.0]
        ]);
        assert_eq!(ibz.bz_k_group()[2], vec![0, 3, 12, 15]);
        assert_eq!(
            ibz.bz_k_group().iter().map(|members| members.len()).collect_vec(),
            vec![4, 8, 4]
        );
        for (ops, members) in ibz.sym_group().iter().zip(ibz.bz_k_group().iter()) {
            assert_eq!(ops.len(), members.len());
        }
        assert_connections_consistent(&ibz);
    }
}

#[test]
fn test_ibz_time_reversal_only() {
    let sg = SpaceGroup::from_rotations(&c4v());
    let kpts =
        KPoints::from_scaled(&cubic_cell(), &monkhorst_pack([4, 4, 1]), &sg, KPT_DIFF_TOL)
            .unwrap();
    let ibz = kpts.make_ibz_k(&params(true, false)).unwrap();
    assert_eq!(ibz.nrot(), 1);
    assert_eq!(ibz.op_rot(), &[Matrix3::identity(), -Matrix3::<i32>::identity()]);
    assert_eq!(ibz.ibz2bz(), &(8..16).collect_vec()[..]);
    assert_relative_eq!(ibz.ibz_weight().sum(), 1.0);
    assert!(ibz.ibz_weight().iter().all(|&w| (w - 0.125).abs() < 1e-12));
    for k in 0..8 {
        assert_eq!(ibz.bz2ibz()[k], 7 - k);
        assert_eq!(ibz.sym_conn()[k], 1);
        assert_eq!(ibz.sym_conn()[15 - k], 0);
    }
    assert_connections_consistent(&ibz);
}

#[test]
fn test_ibz_no_symmetry() {
    let sg = SpaceGroup::from_rotations(&c4v());
    let kpts =
        KPoints::from_scaled(&cubic_cell(), &monkhorst_pack([4, 4, 1]), &sg, KPT_DIFF_TOL)
            .unwrap();
    let ibz = kpts.make_ibz_k(&params(false, false)).unwrap();
    assert_eq!(ibz.nibzk(), 16);
    assert_eq!(ibz.ibz2bz(), &(0..16).collect_vec()[..]);
    assert_eq!(ibz.bz2ibz(), &(0..16).collect_vec()[..]);
    assert_eq!(ibz.sym_conn(), &[0; 16]);
    assert_eq!(ibz.ibz_k_scaled(), ibz.bz_k_scaled());
}

#[test]
fn test_ibz_two_points_time_reversal() {
    let kpts_scaled = array![[-0.25, 0.0, 0.0], [0.25, 0.0, 0.0]];
    let kpts =
        KPoints::from_scaled(&cubic_cell(), &kpts_scaled, &SpaceGroup::trivial(), KPT_DIFF_TOL)
            .unwrap();
    let ibz = kpts.make_ibz_k(&params(true, false)).unwrap();
    assert_eq!(ibz.ibz2bz(), &[1]);
    assert_eq!(ibz.bz2ibz(), &[0, 0]);
    assert_eq!(ibz.sym_conn(), &[1, 0]);
    assert_relative_eq!(ibz.ibz_weight()[0], 1.0);
}

#[test]
fn test_ibz_non_symmorphic_operations_dropped() {
    let sg = SpaceGroup::builder()
        .rotations(vec![Matrix3::identity(), c2z()])
        .translations(vec![Vector3::zeros(), Vector3::new(0.0, 0.0, 0.5)])
        .build()
        .unwrap();
    let kpts_scaled = array![[-0.25, 0.0, 0.0], [0.25, 0.0, 0.0]];
    let kpts = KPoints::from_scaled(&cubic_cell(), &kpts_scaled, &sg, KPT_DIFF_TOL).unwrap();
    let ibz = kpts.make_ibz_k(&params(false, true)).unwrap();
    assert_eq!(ibz.nrot(), 1);
    assert_eq!(ibz.nibzk(), 2);
}

#[test]
fn test_ibz_no_identity() {
    let kpts_scaled = array![[-0.25, 0.0, 0.0], [0.25, 0.0, 0.0]];
    let sg = SpaceGroup::from_rotations(&[c2z()]);
    let kpts = KPoints::from_scaled(&cubic_cell(), &kpts_scaled, &sg, KPT_DIFF_TOL).unwrap();
    assert!(matches!(
        kpts.make_ibz_k(&params(true, false)),
        Err(KPointSymmetryError::SpaceGroupUnavailable(_))
    ));
}

#[test]
fn test_ibz_group_not_closed() {
    let kpts_scaled = array![
        [-0.25, 0.0, 0.0],
        [0.0, -0.25, 0.0],
        [0.0, 0.25, 0.0],
        [0.25, 0.0, 0.0]
    ];
    let c4 = Matrix3::new(0, -1, 0, 1, 0, 0, 0, 0, 1);
    let sg = SpaceGroup::from_rotations(&[Matrix3::identity(), c4]);
    let kpts = KPoints::from_scaled(&cubic_cell(), &kpts_scaled, &sg, KPT_DIFF_TOL).unwrap();
    assert!(matches!(
        kpts.make_ibz_k(&params(false, true)),
        Err(KPointSymmetryError::GroupNotClosed(_))
    ));
}

#[test]
fn test_ibz_unresolved_symmetry_connection() {
    // The second point maps onto the first only after agglomeration with the third point,
    // so the direct comparison against the tolerance fails.
    let kpts_scaled: Array2<f64> = array![
        [-0.100_001_8, 0.0, 0.0],
        [0.1, 0.0, 0.0],
        [-0.100_000_9, 0.3, 0.0]
    ];
    let sg = SpaceGroup::from_rotations(&[Matrix3::identity(), c2z()]);
    let kpts = KPoints::from_scaled(&cubic_cell(), &kpts_scaled, &sg, KPT_DIFF_TOL).unwrap();
    let err = kpts.make_ibz_k(&params(false, true)).unwrap_err();
    assert!(matches!(
        err,
        KPointSymmetryError::UnresolvedSymmetryConnection {
            bz_index: 0,
            ibz_index: 0,
            ..
        }
    ));
}
