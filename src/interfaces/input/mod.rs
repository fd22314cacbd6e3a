//! YAML input specification of the `kpsym` binary.

use anyhow::{self, format_err};
use itertools::Itertools;
use nalgebra::{Matrix3, Vector3};
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::auxiliary::cell::{monkhorst_pack, Cell};
use crate::drivers::ibz_construction::{
    IbzConstructionDriver, IbzConstructionParams, KPointCoordinates,
};
use crate::drivers::KPSymDriver;
use crate::interfaces::InputHandle;
use crate::io::format::kpsym_error;
use crate::symmetry::space_group::SpaceGroup;


// ================
// Enum definitions
// ================

/// An enumerated type representing the ways $`\mathbf{k}`$-points can be specified in a YAML
/// input file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub enum KPointsInputKind {
    /// Explicit $`\mathbf{k}`$-points in absolute coordinates.
    Absolute(Vec<[f64; 3]>),

    /// Explicit $`\mathbf{k}`$-points in coordinates scaled by the reciprocal lattice vectors.
    Scaled(Vec<[f64; 3]>),

    /// A Monkhorst--Pack grid with the given numbers of divisions along the three reciprocal
    /// lattice vectors.
    MonkhorstPack([usize; 3]),
}

impl KPointsInputKind {
    /// Returns the $`\mathbf{k}`$-points as an $`N \times 3`$ array together with their
    /// coordinate system.
    pub fn to_array(&self) -> (Array2<f64>, KPointCoordinates) {
        let rows_to_array = |rows: &[[f64; 3]]| {
            Array2::from_shape_fn((rows.len(), 3), |(i, c)| rows[i][c])
        };
        match self {
            Self::Absolute(rows) => (rows_to_array(rows), KPointCoordinates::Absolute),
            Self::Scaled(rows) => (rows_to_array(rows), KPointCoordinates::Scaled),
            Self::MonkhorstPack(mesh) => (monkhorst_pack(*mesh), KPointCoordinates::Scaled),
        }
    }
}

// ==================
// Struct definitions
// ==================

/// A structure specifying the lattice cell in a YAML input file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CellInput {
    /// The real-space lattice vectors, one per row.
    pub lattice_vectors: [[f64; 3]; 3],
}

/// A structure specifying the space-group operations in a YAML input file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SpaceGroupInput {
    /// The rotation matrices acting on scaled coordinates, each given row by row.
    pub rotations: Vec<[[i32; 3]; 3]>,

    /// The translation vectors in scaled coordinates. If not specified, all operations are taken
    /// to be symmorphic.
    #[serde(default)]
    pub translations: Option<Vec<[f64; 3]>>,
}

impl SpaceGroupInput {
    /// Constructs the [`SpaceGroup`] described by this specification.
    pub fn to_space_group(&self) -> Result<SpaceGroup, anyhow::Error> {
        let rotations = self
            .rotations
            .iter()
            .map(|rot| Matrix3::from_fn(|i, j| rot[i][j]))
            .collect_vec();
        let translations = match self.translations.as_ref() {
            Some(translations) => translations
                .iter()
                .map(|t| Vector3::new(t[0], t[1], t[2]))
                .collect_vec(),
            None => vec![Vector3::zeros(); rotations.len()],
        };
        SpaceGroup::builder()
            .rotations(rotations)
            .translations(translations)
            .build()
            .map_err(|err| format_err!("Invalid space-group specification: {err}"))
    }
}

/// A structure containing `kpsym` input parameters which can be serialised into and
/// deserialised from a YAML input file.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Input {
    /// Specification of the lattice cell.
    pub cell: CellInput,

    /// Specification of the BZ $`\mathbf{k}`$-point sampling.
    pub kpoints: KPointsInputKind,

    /// Specification of the space group of the cell.
    pub space_group: SpaceGroupInput,

    /// Parameters for the IBZ construction.
    ///
    /// # Default
    ///
    /// If not specified, the defaults of [`IbzConstructionParams`] are used.
    #[serde(default)]
    pub ibz_construction: IbzConstructionParams,
}

impl InputHandle for Input {
    /// Handles the `kpsym` input specification and runs the IBZ construction.
    fn handle(&self) -> Result<(), anyhow::Error> {
        let cell = Cell::from_rows(&self.cell.lattice_vectors).map_err(|err| {
            kpsym_error!("{err}");
            format_err!(err)
        })?;
        let space_group = self.space_group.to_space_group().map_err(|err| {
            kpsym_error!("{err}");
            err
        })?;
        let (kpts, coordinates) = self.kpoints.to_array();
        let mut driver = IbzConstructionDriver::builder()
            .parameters(&self.ibz_construction)
            .cell(&cell)
            .kpoints(&kpts)
            .coordinates(coordinates)
            .space_group(&space_group)
            .build()
            .map_err(|err| format_err!(err))?;
        driver.run().map_err(|err| {
            kpsym_error!("{err}");
            err
        })
    }
}
