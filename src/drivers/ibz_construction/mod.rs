//! Driver for the construction of the irreducible Brillouin zone.

use std::fmt;

use anyhow::{self, format_err};
use derive_builder::Builder;
use ndarray::Array2;
use serde::{Deserialize, Serialize};

use crate::auxiliary::cell::Cell;
use crate::drivers::KPSymDriver;
use crate::io::format::{
    kpsym_output, kpsym_warn, log_subtitle, log_title, nice_bool, KPSymOutput,
};
use crate::io::{write_kpsym_binary, KPSymFileType};
use crate::kpoints::ibz::IbzParams;
use crate::kpoints::{KPoints, KPT_DIFF_TOL};
use crate::symmetry::space_group::SpaceGroupProvider;


// ================
// Enum definitions
// ================

/// Enumerated type for the coordinate system in which $`\mathbf{k}`$-points are given.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum KPointCoordinates {
    /// Absolute coordinates in reciprocal space.
    Absolute,

    /// Scaled coordinates with respect to the reciprocal lattice vectors.
    Scaled,
}

impl fmt::Display for KPointCoordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Absolute => write!(f, "absolute"),
            Self::Scaled => write!(f, "scaled"),
        }
    }
}

// ==================
// Struct definitions
// ==================

// ----------
// Parameters
// ----------

/// A structure containing control parameters for IBZ construction.
#[derive(Clone, Builder, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IbzConstructionParams {
    /// Boolean indicating if time reversal is to be taken into account.
    #[builder(default = "true")]
    pub time_reversal: bool,

    /// Boolean indicating if the symmorphic point-group rotations of the space group are to be
    /// used. If `false`, only time reversal can reduce the sampling.
    #[builder(default = "true")]
    pub point_group: bool,

    /// Boolean indicating if the admitted rotations are to be checked for closure.
    #[builder(default = "true")]
    pub verify_group_closure: bool,

    /// The tolerance for comparing $`\mathbf{k}`$-point coordinates.
    #[builder(default = "KPT_DIFF_TOL")]
    pub tolerance: f64,

    /// Optional name for saving the result as a binary file of type [`KPSymFileType::Ibz`]. If
    /// `None`, the result will not be saved.
    #[builder(default = "None")]
    pub result_save_name: Option<String>,
}

impl IbzConstructionParams {
    /// Returns a builder to construct a [`IbzConstructionParams`] structure.
    pub fn builder() -> IbzConstructionParamsBuilder {
        IbzConstructionParamsBuilder::default()
    }

    /// Returns the options for [`KPoints::make_ibz_k`].
    pub fn ibz_params(&self) -> IbzParams {
        IbzParams {
            time_reversal: self.time_reversal,
            point_group: self.point_group,
            verify_group_closure: self.verify_group_closure,
        }
    }
}

impl Default for IbzConstructionParams {
    fn default() -> Self {
        Self {
            time_reversal: true,
            point_group: true,
            verify_group_closure: true,
            tolerance: KPT_DIFF_TOL,
            result_save_name: None,
        }
    }
}

impl fmt::Display for IbzConstructionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.ibz_params())?;
        writeln!(f, "K-point comparison tolerance: {:.3e}", self.tolerance)?;
        writeln!(
            f,
            "Save IBZ construction results to file: {}",
            if let Some(name) = self.result_save_name.as_ref() {
                format!("{name}.{}", KPSymFileType::Ibz.ext())
            } else {
                nice_bool(false)
            }
        )?;
        Ok(())
    }
}

// ------
// Result
// ------

/// A structure to contain IBZ construction results.
#[derive(Clone, Builder, Debug, Serialize, Deserialize)]
pub struct IbzConstructionResult {
    /// The control parameters used to obtain this set of results.
    pub parameters: IbzConstructionParams,

    /// The symmetrised $`\mathbf{k}`$-point container.
    pub kpoints: KPoints,
}

impl IbzConstructionResult {
    /// Returns a builder to construct a [`IbzConstructionResult`] structure.
    fn builder() -> IbzConstructionResultBuilder {
        IbzConstructionResultBuilder::default()
    }
}

impl fmt::Display for IbzConstructionResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.kpoints)?;
        let reduction = self.kpoints.nbzk() as f64 / self.kpoints.nibzk() as f64;
        writeln!(f, "Reduction factor: {reduction:.3}")?;
        Ok(())
    }
}

// ------
// Driver
// ------

/// A driver for IBZ construction.
#[derive(Clone, Builder)]
pub struct IbzConstructionDriver<'a> {
    /// The control parameters for IBZ construction.
    parameters: &'a IbzConstructionParams,

    /// The lattice cell.
    cell: &'a Cell,

    /// The BZ $`\mathbf{k}`$-points, one per row.
    kpoints: &'a Array2<f64>,

    /// The coordinate system of [`Self::kpoints`].
    #[builder(default = "KPointCoordinates::Scaled")]
    coordinates: KPointCoordinates,

    /// The source of the space group of [`Self::cell`].
    space_group: &'a dyn SpaceGroupProvider,

    /// The result of the IBZ construction.
    #[builder(setter(skip), default = "None")]
    result: Option<IbzConstructionResult>,
}

impl<'a> IbzConstructionDriver<'a> {
    /// Returns a builder to construct a [`IbzConstructionDriver`] structure.
    pub fn builder() -> IbzConstructionDriverBuilder<'a> {
        IbzConstructionDriverBuilder::default()
    }

    /// Executes IBZ construction.
    fn construct_ibz(&mut self) -> Result<(), anyhow::Error> {
        log_title("Irreducible Brillouin-Zone Construction");
        kpsym_output!("");
        let params = self.parameters;
        params.log_output_display();
        kpsym_output!("");

        kpsym_output!("Cell for IBZ construction:");
        self.cell.log_output_display();
        kpsym_output!(
            "{} BZ k-points supplied in {} coordinates.",
            self.kpoints.nrows(),
            self.coordinates
        );
        kpsym_output!("");

        let bz_kpts = match self.coordinates {
            KPointCoordinates::Absolute => {
                KPoints::new(self.cell, self.kpoints, self.space_group, params.tolerance)
            }
            KPointCoordinates::Scaled => {
                KPoints::from_scaled(self.cell, self.kpoints, self.space_group, params.tolerance)
            }
        }
        .map_err(|err| format_err!(err))?;
        kpsym_output!(
            "Space group with {} operations obtained.",
            bz_kpts.space_group().n_operations()
        );
        kpsym_output!("");

        log_subtitle("Symmetry reduction");
        kpsym_output!("");
        let ibz_kpts = bz_kpts
            .make_ibz_k(&params.ibz_params())
            .map_err(|err| format_err!(err))?;
        if ibz_kpts.nibzk() == ibz_kpts.nbzk() && ibz_kpts.op_rot().len() > 1 {
            kpsym_warn!(
                "No reduction achieved: the k-point sampling may not be symmetric under the \
                admitted operations."
            );
        }

        let result = IbzConstructionResult::builder()
            .parameters(params.clone())
            .kpoints(ibz_kpts)
            .build()
            .map_err(|err| format_err!(err))?;
        result.log_output_display();
        kpsym_output!("");

        if let Some(name) = params.result_save_name.as_ref() {
            write_kpsym_binary(name, KPSymFileType::Ibz, &result)?;
            kpsym_output!(
                "IBZ construction results saved as {name}.{}.",
                KPSymFileType::Ibz.ext()
            );
            kpsym_output!("");
        }
        self.result = Some(result);
        Ok(())
    }
}

impl KPSymDriver for IbzConstructionDriver<'_> {
    type Params = IbzConstructionParams;

    type Outcome = IbzConstructionResult;

    fn run(&mut self) -> Result<(), anyhow::Error> {
        self.construct_ibz()
    }

    fn result(&self) -> Result<&Self::Outcome, anyhow::Error> {
        self.result
            .as_ref()
            .ok_or_else(|| format_err!("No IBZ construction results found."))
    }
}
