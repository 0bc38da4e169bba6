//! Provides interchange types between the fitting engine and downstream tooling.
//!
//! This module contains the structured result record produced after a fit
//! converges and the tab-separated triplet report format used to exchange
//! candidate couplings between selection runs. Byte-level persistence of full
//! potential sets is left to callers; the types here cover the artifacts that
//! cross tool boundaries.

pub mod record;
pub mod report;
