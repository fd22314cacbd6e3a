use nalgebra::{Matrix3, Vector3};
use ndarray::array;

use crate::auxiliary::cell::Cell;
use crate::kpoints::KPointSymmetryError;
use crate::symmetry::space_group::{
    format_rotation, rotate_kpoint, verify_group_closure, with_time_reversal, RotationKind,
    SpaceGroup, SpaceGroupProvider,
};

fn c4z() -> Matrix3<i32> {
    Matrix3::new(0, -1, 0, 1, 0, 0, 0, 0, 1)
}

#[test]
fn test_rotation_classification() {
    assert_eq!(
        RotationKind::classify(&Matrix3::identity()),
        RotationKind::Identity
    );
    assert_eq!(
        RotationKind::classify(&-Matrix3::<i32>::identity()),
        RotationKind::Inversion
    );
    assert_eq!(RotationKind::classify(&c4z()), RotationKind::General);
    assert_eq!(
        RotationKind::classify(&Matrix3::from_diagonal(&Vector3::new(-1, -1, 1))),
        RotationKind::General
    );
}

#[test]
fn test_space_group_builder() {
    let sg = SpaceGroup::builder()
        .rotations(vec![Matrix3::identity(), c4z()])
        .translations(vec![Vector3::zeros(), Vector3::new(0.0, 0.0, 0.25)])
        .build()
        .unwrap();
    assert_eq!(sg.n_operations(), 2);
    assert_eq!(sg.symmorphic_rotations(1e-6), vec![Matrix3::identity()]);
    assert_eq!(sg.to_string(), "SpaceGroup[2 operations]");

    assert!(SpaceGroup::builder()
        .rotations(vec![Matrix3::identity(), c4z()])
        .translations(vec![Vector3::zeros()])
        .build()
        .is_err());
}

#[test]
fn test_space_group_provider() {
    let cell = Cell::new(Matrix3::identity()).unwrap();
    let sg = SpaceGroup::from_rotations(&[Matrix3::identity(), c4z()]);
    assert_eq!(sg.space_group(&cell).unwrap(), sg);
    assert_eq!(sg.symmorphic_rotations(1e-6).len(), 2);
    assert_eq!(SpaceGroup::trivial().rotations(), &[Matrix3::identity()]);
}

#[test]
fn test_time_reversal_doubling() {
    let ops = vec![Matrix3::identity(), c4z()];
    let doubled = with_time_reversal(&ops);
    assert_eq!(doubled.len(), 4);
    assert_eq!(&doubled[..2], &ops[..]);
    assert_eq!(doubled[2], -Matrix3::<i32>::identity());
    assert_eq!(doubled[3], -c4z());
}

#[test]
fn test_group_closure() {
    let c4_group = (0..4)
        .map(|n| {
            (0..n).fold(Matrix3::<i32>::identity(), |acc, _| acc * c4z())
        })
        .collect::<Vec<_>>();
    assert!(verify_group_closure(&c4_group).is_ok());
    assert!(matches!(
        verify_group_closure(&[Matrix3::identity(), c4z()]),
        Err(KPointSymmetryError::GroupNotClosed(_))
    ));
    assert!(matches!(
        verify_group_closure(&[-Matrix3::<i32>::identity()]),
        Err(KPointSymmetryError::GroupNotClosed(_))
    ));
}

#[test]
fn test_rotate_kpoint() {
    let kpt = array![0.25, 0.125, 0.5];
    assert_eq!(rotate_kpoint(&c4z(), kpt.view()), array![-0.125, 0.25, 0.5]);
    assert_eq!(
        rotate_kpoint(&-Matrix3::<i32>::identity(), kpt.view()),
        array![-0.25, -0.125, -0.5]
    );
}

#[test]
fn test_format_rotation() {
    assert_eq!(
        format_rotation(&c4z()),
        "[[+0, -1, +0], [+1, +0, +0], [+0, +0, +1]]"
    );
}
