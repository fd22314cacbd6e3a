use approx::assert_relative_eq;
use nalgebra::{Matrix3, Vector3};
use ndarray::Array2;
use num_complex::Complex;

use kpsym::auxiliary::cell::{monkhorst_pack, Cell};
use kpsym::kpoints::ibz::IbzParams;
use kpsym::kpoints::{KPoints, SymmetrisationState, KPT_DIFF_TOL};
use kpsym::symmetry::space_group::{rotate_kpoint, SpaceGroup};
use kpsym::transformation::basis_rotation::AoRepresentations;
use kpsym::transformation::grid_rotation::IntegerGridRotation;
use kpsym::transformation::{symmetrise_density, transform_dm, transform_mo_coeff};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn c4v() -> Vec<Matrix3<i32>> {
    vec![
        Matrix3::identity(),
        Matrix3::new(0, -1, 0, 1, 0, 0, 0, 0, 1),
        Matrix3::from_diagonal(&Vector3::new(-1, -1, 1)),
        Matrix3::new(0, 1, 0, -1, 0, 0, 0, 0, 1),
        Matrix3::from_diagonal(&Vector3::new(-1, 1, 1)),
        Matrix3::from_diagonal(&Vector3::new(1, -1, 1)),
        Matrix3::new(0, 1, 0, 1, 0, 0, 0, 0, 1),
        Matrix3::new(0, -1, 0, -1, 0, 0, 0, 0, 1),
    ]
}

fn square_lattice_ibz(time_reversal: bool) -> KPoints {
    let cell = Cell::from_rows(&[[3.0, 0.0, 0.0], [0.0, 3.0, 0.0], [0.0, 0.0, 5.0]]).unwrap();
    let sg = SpaceGroup::from_rotations(&c4v());
    let params = IbzParams::builder()
        .time_reversal(time_reversal)
        .build()
        .unwrap();
    KPoints::from_scaled(&cell, &monkhorst_pack([4, 4, 2]), &sg, KPT_DIFF_TOL)
        .unwrap()
        .make_ibz_k(&params)
        .unwrap()
}

#[test]
fn test_ibz_orbits_are_consistent() {
    init_logger();
    for time_reversal in [true, false] {
        let kpts = square_lattice_ibz(time_reversal);
        assert_eq!(kpts.state(), SymmetrisationState::Symmetrised);
        assert_eq!(kpts.nbzk(), 32);
        assert!(kpts.nibzk() < kpts.nbzk());
        assert_relative_eq!(kpts.ibz_weight().sum(), 1.0, epsilon = 1e-12);

        let mut covered = vec![false; kpts.nbzk()];
        for (i, group) in kpts.bz_k_group().iter().enumerate() {
            assert_eq!(kpts.bz2ibz()[kpts.ibz2bz()[i]], i);
            assert_relative_eq!(
                kpts.ibz_weight()[i],
                group.len() as f64 / kpts.nbzk() as f64,
                epsilon = 1e-12
            );
            for &k in group.iter() {
                assert!(!covered[k]);
                covered[k] = true;
            }
        }
        assert!(covered.into_iter().all(|c| c));

        for k in 0..kpts.nbzk() {
            let op = &kpts.op_rot()[kpts.sym_conn()[k]];
            let rep = kpts.ibz_k_scaled().row(kpts.bz2ibz()[k]);
            let image = rotate_kpoint(op, rep);
            for (a, b) in image.iter().zip(kpts.bz_k_scaled().row(k).iter()) {
                assert_relative_eq!(*a, *b, epsilon = 1e-10);
            }
        }
    }
}

#[test]
fn test_density_orbit_sum_of_uniform_grid() {
    init_logger();
    let kpts = square_lattice_ibz(true);
    let mesh = [4, 4, 3];
    let rhor_k = vec![0.5; 48];
    let mut total = vec![0.0; 48];
    for i in 0..kpts.nibzk() {
        let rhor = symmetrise_density(&kpts, &rhor_k, i, mesh, &IntegerGridRotation).unwrap();
        total.iter_mut().zip(rhor.iter()).for_each(|(t, r)| *t += r);
    }
    total
        .iter()
        .for_each(|t| assert_relative_eq!(*t, 0.5 * kpts.nbzk() as f64, epsilon = 1e-12));
}

#[test]
fn test_mo_and_dm_back_transformation() {
    init_logger();
    let kpts = square_lattice_ibz(true);
    let reps = AoRepresentations::builder()
        .nbas(2)
        .representations(
            c4v()
                .into_iter()
                .map(|op| (op, Array2::<f64>::eye(2)))
                .collect(),
        )
        .build()
        .unwrap();

    let mo_ibz = (0..kpts.nibzk())
        .map(|i| {
            Array2::from_shape_fn((2, 2), |(r, c)| {
                Complex::new((i + r) as f64, (c + 1) as f64)
            })
        })
        .collect::<Vec<_>>();
    let mo_bz = transform_mo_coeff(&kpts, &mo_ibz, &reps).unwrap();
    let dm_bz = transform_dm(&kpts, &mo_ibz, &reps).unwrap();
    assert_eq!(mo_bz.len(), kpts.nbzk());
    assert_eq!(dm_bz.len(), kpts.nbzk());
    for k in 0..kpts.nbzk() {
        let rep = &mo_ibz[kpts.bz2ibz()[k]];
        let expected = if kpts.symmetry_dispatch(kpts.sym_conn()[k]).unwrap().time_reversal {
            rep.mapv(|x| x.conj())
        } else {
            rep.clone()
        };
        assert_eq!(mo_bz[k], expected);
        assert_eq!(dm_bz[k], expected);
    }

    let real_mo_ibz = (0..kpts.nibzk())
        .map(|i| Array2::from_elem((2, 1), i as f64))
        .collect::<Vec<_>>();
    let real_mo_bz = transform_mo_coeff(&kpts, &real_mo_ibz, &reps).unwrap();
    for k in 0..kpts.nbzk() {
        assert_eq!(real_mo_bz[k], real_mo_ibz[kpts.bz2ibz()[k]]);
    }
}
