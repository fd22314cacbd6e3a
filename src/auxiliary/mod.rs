//! Auxiliary structures for describing periodic systems.

pub mod cell;
