use thiserror::Error;

use super::alphabet::{N_ALPHA, N_AMINO};

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum TripletError {
    #[error("Triplet columns ({i}, {j}, {k}) are not strictly increasing")]
    ColumnsNotIncreasing { i: usize, j: usize, k: usize },

    #[error("Triplet column {col} is out of range for an alignment of {ncol} columns")]
    ColumnOutOfRange { col: usize, ncol: usize },

    #[error("Amino-acid index {index} is not a valid non-gap category")]
    AminoOutOfRange { index: u8 },

    #[error("Per-assignment triplets need amino-acid indices, but the input carries none")]
    MissingAssignment,
}

/// An ordered column triple (i < j < k) selecting three alignment positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ColumnTriplet {
    pub i: usize,
    pub j: usize,
    pub k: usize,
}

impl ColumnTriplet {
    pub fn new(i: usize, j: usize, k: usize) -> Self {
        Self { i, j, k }
    }

    fn validate(&self, ncol: usize) -> Result<(), TripletError> {
        if !(self.i < self.j && self.j < self.k) {
            return Err(TripletError::ColumnsNotIncreasing {
                i: self.i,
                j: self.j,
                k: self.k,
            });
        }
        if self.k >= ncol {
            return Err(TripletError::ColumnOutOfRange {
                col: self.k,
                ncol,
            });
        }
        Ok(())
    }
}

/// A column triple bound to one specific amino-acid assignment (a, b, c).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScalarTriplet {
    pub cols: ColumnTriplet,
    pub aminos: [u8; 3],
}

impl ScalarTriplet {
    pub fn new(cols: ColumnTriplet, aminos: [u8; 3]) -> Self {
        Self { cols, aminos }
    }
}

/// The shape of the triplet potential block, fixed per model instance.
///
/// `Scalar` carries one parameter per selected (column, assignment) 6-tuple;
/// `AaFull` carries a full 21x21x21 tensor per selected column triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TripletKind {
    Scalar,
    AaFull,
}

impl TripletKind {
    /// Number of parameters contributed by a single descriptor.
    pub fn block_len(&self) -> usize {
        match self {
            TripletKind::Scalar => 1,
            TripletKind::AaFull => N_ALPHA * N_ALPHA * N_ALPHA,
        }
    }
}

/// The frozen triplet universe of one model: which column triples carry
/// higher-order terms, and in which of the two shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum TripletSet {
    Scalar(Vec<ScalarTriplet>),
    AaFull(Vec<ColumnTriplet>),
}

impl TripletSet {
    /// A model without any triplet terms.
    pub fn empty() -> Self {
        TripletSet::AaFull(Vec::new())
    }

    pub fn kind(&self) -> TripletKind {
        match self {
            TripletSet::Scalar(_) => TripletKind::Scalar,
            TripletSet::AaFull(_) => TripletKind::AaFull,
        }
    }

    /// Number of descriptors (not parameters).
    pub fn len(&self) -> usize {
        match self {
            TripletSet::Scalar(v) => v.len(),
            TripletSet::AaFull(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Total number of triplet parameters under this set's shape.
    pub fn nvar(&self) -> usize {
        self.len() * self.kind().block_len()
    }

    /// Column triples in descriptor order, assignment stripped for `Scalar`.
    pub fn columns(&self) -> impl Iterator<Item = ColumnTriplet> + '_ {
        let scalar = match self {
            TripletSet::Scalar(v) => Some(v.iter().map(|t| t.cols)),
            TripletSet::AaFull(_) => None,
        };
        let full = match self {
            TripletSet::AaFull(v) => Some(v.iter().copied()),
            TripletSet::Scalar(_) => None,
        };
        scalar.into_iter().flatten().chain(full.into_iter().flatten())
    }

    /// Checks every descriptor against an alignment width: columns strictly
    /// increasing and in range, amino indices below the gap category.
    pub fn validate(&self, ncol: usize) -> Result<(), TripletError> {
        match self {
            TripletSet::Scalar(list) => {
                for t in list {
                    t.cols.validate(ncol)?;
                    if let Some(&index) = t.aminos.iter().find(|&&a| a >= N_AMINO as u8) {
                        return Err(TripletError::AminoOutOfRange { index });
                    }
                }
            }
            TripletSet::AaFull(list) => {
                for cols in list {
                    cols.validate(ncol)?;
                }
            }
        }
        Ok(())
    }
}
