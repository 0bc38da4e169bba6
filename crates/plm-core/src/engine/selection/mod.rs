//! Triplet candidate selection from fitted pair couplings.
//!
//! Given the dense pair coupling tensor of a converged pairwise fit, this
//! module ranks column triples (and optionally full amino-acid assignments)
//! as candidates for a follow-up fit with explicit triplet terms. Exhaustive
//! strategies stream the candidate space through a bounded top-N collector
//! so the cubic (or larger) candidate set is never materialized; the random
//! strategy draws exactly uniformly from the valid triple universe. All
//! strategies enforce a minimum pairwise column separation.

pub mod scan;
pub mod topk;

use itertools::Itertools;
use thiserror::Error;

use crate::core::io::report::TripletReport;
use crate::core::triplets::{ColumnTriplet, ScalarTriplet, TripletError, TripletKind, TripletSet};

pub use scan::select;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectionError {
    #[error(
        "No valid triples: {ncol} columns cannot hold three sites separated by {min_separation}"
    )]
    EmptyUniverse { ncol: usize, min_separation: usize },

    #[error("Coupling tensor has shape {shape:?}, expected a square L x L x 21 x 21 tensor")]
    TensorShape { shape: Vec<usize> },
}

/// Converts a ranked report into a frozen descriptor set of the given kind.
///
/// 3-index rows cannot seed a per-assignment (`Scalar`) model; 6-index rows
/// seeding an `AaFull` model collapse duplicate column triples, keeping the
/// first-occurrence order.
pub fn triplet_set_from_report(
    report: &TripletReport,
    kind: TripletKind,
) -> Result<TripletSet, TripletError> {
    let set = match (report, kind) {
        (TripletReport::Triplets(_), TripletKind::Scalar) => {
            return Err(TripletError::MissingAssignment);
        }
        (TripletReport::Triplets(rows), TripletKind::AaFull) => TripletSet::AaFull(
            rows.iter()
                .map(|r| ColumnTriplet::new(r.i, r.j, r.k))
                .collect(),
        ),
        (TripletReport::Assignments(rows), TripletKind::Scalar) => TripletSet::Scalar(
            rows.iter()
                .map(|r| ScalarTriplet::new(ColumnTriplet::new(r.i, r.j, r.k), [r.a, r.b, r.c]))
                .collect(),
        ),
        (TripletReport::Assignments(rows), TripletKind::AaFull) => TripletSet::AaFull(
            rows.iter()
                .map(|r| ColumnTriplet::new(r.i, r.j, r.k))
                .unique()
                .collect(),
        ),
    };
    Ok(set)
}
