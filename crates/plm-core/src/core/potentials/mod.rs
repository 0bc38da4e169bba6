//! Structured potential tensors and their canonical flat-vector layout.
//!
//! Gradient-based optimizers see one contiguous `f64` vector; everything else
//! in the library reasons about single-site, pairwise and triplet blocks.
//! [`layout::ParameterLayout`] is the single source of truth for the
//! correspondence between the two, including the packed upper-triangular
//! pair enumeration and the gap-category projection applied on every pack.

pub mod layout;
pub mod structured;
