use ndarray::{Array1, Array2};
use thiserror::Error;

use super::alphabet::N_ALPHA;

#[derive(Debug, Error, PartialEq)]
pub enum AlignmentError {
    #[error("Alignment has no sequences or no columns")]
    Empty,

    #[error("Sequence {row}, column {col} holds category {value}, outside the 21-letter alphabet")]
    CategoryOutOfRange { row: usize, col: usize, value: u8 },

    #[error("Weight vector has {weights} entries for {rows} sequences")]
    WeightLengthMismatch { weights: usize, rows: usize },

    #[error("Weight {value} for sequence {row} is negative or not finite")]
    InvalidWeight { row: usize, value: f64 },
}

/// An immutable multiple sequence alignment in index form, together with one
/// non-negative weight per sequence. The weight sum is the effective number of
/// sequences (Neff) used to scale empirical frequencies back into counts.
#[derive(Debug, Clone, PartialEq)]
pub struct Alignment {
    seqs: Array2<u8>,
    weights: Array1<f64>,
}

impl Alignment {
    pub fn new(seqs: Array2<u8>, weights: Array1<f64>) -> Result<Self, AlignmentError> {
        let (nrow, ncol) = seqs.dim();
        if nrow == 0 || ncol == 0 {
            return Err(AlignmentError::Empty);
        }
        if weights.len() != nrow {
            return Err(AlignmentError::WeightLengthMismatch {
                weights: weights.len(),
                rows: nrow,
            });
        }
        if let Some(((row, col), &value)) =
            seqs.indexed_iter().find(|&(_, &v)| v >= N_ALPHA as u8)
        {
            return Err(AlignmentError::CategoryOutOfRange { row, col, value });
        }
        if let Some((row, &value)) = weights
            .iter()
            .enumerate()
            .find(|&(_, &w)| w < 0.0 || !w.is_finite())
        {
            return Err(AlignmentError::InvalidWeight { row, value });
        }
        Ok(Self { seqs, weights })
    }

    /// Builds an alignment with every sequence weighted 1.0, so Neff equals
    /// the raw sequence count.
    pub fn with_uniform_weights(seqs: Array2<u8>) -> Result<Self, AlignmentError> {
        let nrow = seqs.nrows();
        Self::new(seqs, Array1::ones(nrow))
    }

    pub fn nrow(&self) -> usize {
        self.seqs.nrows()
    }

    pub fn ncol(&self) -> usize {
        self.seqs.ncols()
    }

    pub fn seqs(&self) -> &Array2<u8> {
        &self.seqs
    }

    pub fn weights(&self) -> &Array1<f64> {
        &self.weights
    }

    pub fn weight(&self, row: usize) -> f64 {
        self.weights[row]
    }

    pub fn get(&self, row: usize, col: usize) -> u8 {
        self.seqs[[row, col]]
    }

    pub fn neff(&self) -> f64 {
        self.weights.sum()
    }
}
