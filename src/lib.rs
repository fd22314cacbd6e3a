//! # kpsym: k-point symmetry for periodic calculations
//!
//! `kpsym` reduces a full Brillouin-zone (BZ) sampling of $`\mathbf{k}`$-points to its
//! irreducible wedge (IBZ) using the symmorphic point-group operations of a crystal's space group,
//! optionally augmented by time reversal, and maps IBZ-resolved quantities back onto the full
//! BZ:
//! - real-space densities defined on a uniform grid,
//! - molecular-orbital coefficients, and
//! - density matrices.
//!
//! The crate is organised as follows:
//! - [`auxiliary`] contains the lattice cell and conversions between absolute and scaled
//!   $`\mathbf{k}`$-point coordinates,
//! - [`symmetry`] contains the space-group data model and the classification of rotation
//!   operators,
//! - [`kpoints`] contains the $`\mathbf{k}`$-point container and the IBZ construction
//!   machinery,
//! - [`transformation`] contains the back-transformation of IBZ-resolved quantities,
//! - [`drivers`] and [`interfaces`] expose the above to the `kpsym` binary.
//!
//! ## Conventions
//!
//! Rotation operators are $`3 \times 3`$ integer matrices $`\mathbf{U}`$ acting on scaled
//! $`\mathbf{k}`$-points stored as row vectors, so that $`\mathbf{k}' = \mathbf{k}
//! \mathbf{U}^{\mathsf{T}}`$. When time reversal is considered, the operator list is doubled
//! with the negated operators appended; an operator index at or beyond the number of rotations
//! denotes a time-reversal-paired operation whose action on a physical quantity is accompanied
//! by complex conjugation.
//!
//! All comparisons use an explicit numerical tolerance, defaulting to
//! [`kpoints::KPT_DIFF_TOL`].

pub mod auxiliary;
pub mod drivers;
pub mod interfaces;
pub mod io;
pub mod kpoints;
pub mod symmetry;
pub mod transformation;
