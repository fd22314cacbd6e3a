//! Space-group symmetry operations acting on $`\mathbf{k}`$-points.

pub mod space_group;
