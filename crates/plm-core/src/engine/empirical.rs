use ndarray::{Array1, Array2, Array4};

use crate::core::alignment::Alignment;
use crate::core::alphabet::N_ALPHA;
use crate::core::counts::{scalar_triplet_counts, triplet_counts};
use crate::core::potentials::layout::{ParameterLayout, pair_dense_to_packed};
use crate::core::potentials::structured::{Potentials, TripletValues};
use crate::core::triplets::TripletSet;

use super::error::EngineError;

/// Builds the empirical-counts offset subtracted from the kernel gradient.
///
/// Single counts are recovered from the supplied frequencies scaled by Neff.
/// Pair counts carry an additional factor of two and triplet counts a factor
/// of three: each pair block appears in two site conditionals and each triplet
/// block in three, so the empirical term must be scaled to match the kernel's
/// expectation accounting slot for slot. Gap-category and diagonal entries
/// are dropped by the packing step.
pub fn counts_offset(
    msa: &Alignment,
    single_freq: &Array2<f64>,
    pair_freq: &Array4<f64>,
    triplets: &TripletSet,
    layout: &ParameterLayout,
) -> Result<Array1<f64>, EngineError> {
    let l = msa.ncol();
    if single_freq.dim() != (l, N_ALPHA) {
        return Err(EngineError::FrequencyShape {
            expected: vec![l, N_ALPHA],
            actual: single_freq.shape().to_vec(),
        });
    }
    if pair_freq.dim() != (l, l, N_ALPHA, N_ALPHA) {
        return Err(EngineError::FrequencyShape {
            expected: vec![l, l, N_ALPHA, N_ALPHA],
            actual: pair_freq.shape().to_vec(),
        });
    }
    triplets.validate(l)?;

    let neff = msa.neff();
    let single = single_freq * neff;
    let pair = pair_dense_to_packed(&(pair_freq * (2.0 * neff)))?;
    let triplet = match triplets {
        TripletSet::Scalar(list) => TripletValues::Scalar(scalar_triplet_counts(msa, list) * 3.0),
        TripletSet::AaFull(list) => TripletValues::AaFull(triplet_counts(msa, list) * 3.0),
    };

    let counts = Potentials {
        single,
        pair,
        triplet,
    };
    Ok(layout.pack(&counts)?)
}
