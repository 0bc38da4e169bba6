use std::collections::HashMap;

use ndarray::{Array1, Array2, Array4};
use thiserror::Error;

use crate::core::alphabet::{N_ALPHA, N_AMINO};
use crate::core::triplets::TripletSet;

#[derive(Debug, Error, PartialEq)]
pub enum RecordError {
    #[error("Single potential block is {rows}x{cols}, expected one 20-state row per column")]
    SingleShape { rows: usize, cols: usize },

    #[error("Pair tensor shape {shape:?} does not match {ncol} columns")]
    PairShape { shape: Vec<usize>, ncol: usize },

    #[error("Triplet values hold {values} entries, expected {expected} for {descriptors} descriptors")]
    TripletLength {
        values: usize,
        expected: usize,
        descriptors: usize,
    },
}

/// Fitted triplet terms attached to a record: the frozen descriptor set plus
/// one flat value block per descriptor, in descriptor order.
#[derive(Debug, Clone, PartialEq)]
pub struct TripletResults {
    pub descriptors: TripletSet,
    pub values: Array1<f64>,
}

impl TripletResults {
    pub fn new(descriptors: TripletSet, values: Array1<f64>) -> Result<Self, RecordError> {
        let expected = descriptors.nvar();
        if values.len() != expected {
            return Err(RecordError::TripletLength {
                values: values.len(),
                expected,
                descriptors: descriptors.len(),
            });
        }
        Ok(Self {
            descriptors,
            values,
        })
    }
}

/// The logical product of a finished fit: per-column single potentials
/// without the gap state, the dense symmetric pair tensor, free-form
/// provenance metadata, and optionally the fitted triplet terms.
#[derive(Debug, Clone, PartialEq)]
pub struct PotentialRecord {
    pub ncol: usize,
    pub single: Array2<f64>,
    pub pair: Array4<f64>,
    pub metadata: HashMap<String, String>,
    pub extra: Option<TripletResults>,
}

impl PotentialRecord {
    pub fn new(single: Array2<f64>, pair: Array4<f64>) -> Result<Self, RecordError> {
        let (ncol, states) = single.dim();
        if states != N_AMINO {
            return Err(RecordError::SingleShape {
                rows: ncol,
                cols: states,
            });
        }
        if pair.dim() != (ncol, ncol, N_ALPHA, N_ALPHA) {
            return Err(RecordError::PairShape {
                shape: pair.shape().to_vec(),
                ncol,
            });
        }
        Ok(Self {
            ncol,
            single,
            pair,
            metadata: HashMap::new(),
            extra: None,
        })
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }

    pub fn with_triplets(mut self, extra: TripletResults) -> Self {
        self.extra = Some(extra);
        self
    }
}
