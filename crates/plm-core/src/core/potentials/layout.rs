use ndarray::{Array1, Array3, Array4, Axis};
use thiserror::Error;

use super::structured::{Potentials, PotentialsView, TripletValues, TripletValuesView};
use crate::core::alphabet::{GAP, N_ALPHA};
use crate::core::triplets::{TripletKind, TripletSet};

#[derive(Debug, Error, PartialEq)]
pub enum LayoutError {
    #[error("Parameter vector has {actual} entries, expected {expected}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("{block} block has shape {actual:?}, expected {expected:?}")]
    BlockShape {
        block: &'static str,
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Triplet block is {actual:?}, but the layout expects {expected:?}")]
    KindMismatch {
        expected: TripletKind,
        actual: TripletKind,
    },

    #[error("Pair tensor shape {shape:?} is not {expected}")]
    PairTensorShape {
        shape: Vec<usize>,
        expected: &'static str,
    },
}

pub fn pair_block_count(ncol: usize) -> usize {
    ncol * ncol.saturating_sub(1) / 2
}

/// Index of the (i, j) block, i < j, in the packed upper-triangular pair
/// enumeration (0,1), (0,2), ..., (0,L-1), (1,2), ...
pub fn pair_block_index(ncol: usize, i: usize, j: usize) -> usize {
    debug_assert!(i < j && j < ncol);
    i * (2 * ncol - i - 1) / 2 + (j - i - 1)
}

/// Collapses a dense symmetric (L, L, 21, 21) pair tensor into packed form,
/// keeping the upper-triangular (i < j) blocks as authoritative.
pub fn pair_dense_to_packed(dense: &Array4<f64>) -> Result<Array3<f64>, LayoutError> {
    let (l, l2, a, b) = dense.dim();
    if l != l2 || a != N_ALPHA || b != N_ALPHA {
        return Err(LayoutError::PairTensorShape {
            shape: dense.shape().to_vec(),
            expected: "(L, L, 21, 21)",
        });
    }
    let mut packed = Array3::zeros((pair_block_count(l), N_ALPHA, N_ALPHA));
    for i in 0..l {
        for j in (i + 1)..l {
            let blk = pair_block_index(l, i, j);
            for a in 0..N_ALPHA {
                for b in 0..N_ALPHA {
                    packed[[blk, a, b]] = dense[[i, j, a, b]];
                }
            }
        }
    }
    Ok(packed)
}

/// Expands packed pair blocks into the dense symmetric form, writing each
/// block and its transpose; diagonal blocks stay zero.
pub fn pair_packed_to_dense(packed: &Array3<f64>, ncol: usize) -> Result<Array4<f64>, LayoutError> {
    let dim = packed.dim();
    if dim != (pair_block_count(ncol), N_ALPHA, N_ALPHA) {
        return Err(LayoutError::PairTensorShape {
            shape: packed.shape().to_vec(),
            expected: "(L(L-1)/2, 21, 21)",
        });
    }
    let mut dense = Array4::zeros((ncol, ncol, N_ALPHA, N_ALPHA));
    for i in 0..ncol {
        for j in (i + 1)..ncol {
            let blk = pair_block_index(ncol, i, j);
            for a in 0..N_ALPHA {
                for b in 0..N_ALPHA {
                    let v = packed[[blk, a, b]];
                    dense[[i, j, a, b]] = v;
                    dense[[j, i, b, a]] = v;
                }
            }
        }
    }
    Ok(dense)
}

/// The canonical correspondence between one flat parameter (or gradient)
/// vector and its structured single/pair/triplet blocks.
///
/// Flat order is [single][pair][triplet]: `x[i*21 + a]` for singles,
/// `x[nsingle + (block*21 + a)*21 + b]` for packed pair blocks, and the
/// triplet tail in descriptor order (one value per descriptor for `Scalar`,
/// a row-major 21x21x21 tensor per descriptor for `AaFull`).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ParameterLayout {
    ncol: usize,
    kind: TripletKind,
    ntriplets: usize,
}

impl ParameterLayout {
    pub fn new(ncol: usize, kind: TripletKind, ntriplets: usize) -> Self {
        Self {
            ncol,
            kind,
            ntriplets,
        }
    }

    pub fn for_set(ncol: usize, triplets: &TripletSet) -> Self {
        Self::new(ncol, triplets.kind(), triplets.len())
    }

    pub fn ncol(&self) -> usize {
        self.ncol
    }

    pub fn kind(&self) -> TripletKind {
        self.kind
    }

    pub fn ntriplets(&self) -> usize {
        self.ntriplets
    }

    pub fn npair_blocks(&self) -> usize {
        pair_block_count(self.ncol)
    }

    pub fn nsingle(&self) -> usize {
        self.ncol * N_ALPHA
    }

    pub fn npair(&self) -> usize {
        self.npair_blocks() * N_ALPHA * N_ALPHA
    }

    pub fn ntriplet_values(&self) -> usize {
        self.ntriplets * self.kind.block_len()
    }

    pub fn nvar(&self) -> usize {
        self.nsingle() + self.npair() + self.ntriplet_values()
    }

    pub fn single_index(&self, i: usize, a: usize) -> usize {
        i * N_ALPHA + a
    }

    pub fn pair_block(&self, i: usize, j: usize) -> usize {
        pair_block_index(self.ncol, i, j)
    }

    pub fn pair_index(&self, block: usize, a: usize, b: usize) -> usize {
        self.nsingle() + (block * N_ALPHA + a) * N_ALPHA + b
    }

    pub fn triplet_scalar_index(&self, t: usize) -> usize {
        self.nsingle() + self.npair() + t
    }

    pub fn triplet_aa_index(&self, t: usize, a: usize, b: usize, c: usize) -> usize {
        self.nsingle() + self.npair() + ((t * N_ALPHA + a) * N_ALPHA + b) * N_ALPHA + c
    }

    pub fn zeros(&self) -> Potentials {
        Potentials::zeros(self.ncol, self.kind, self.ntriplets)
    }

    /// Splits a flat vector into borrowed structured blocks.
    ///
    /// # Errors
    ///
    /// Fails with `LayoutError::LengthMismatch` when the vector length is not
    /// exactly the layout's total parameter count.
    pub fn split<'a>(&self, x: &'a Array1<f64>) -> Result<PotentialsView<'a>, LayoutError> {
        if x.len() != self.nvar() {
            return Err(LayoutError::LengthMismatch {
                expected: self.nvar(),
                actual: x.len(),
            });
        }
        let (single_flat, rest) = x.view().split_at(Axis(0), self.nsingle());
        let (pair_flat, triplet_flat) = rest.split_at(Axis(0), self.npair());
        let single = single_flat
            .into_shape_with_order((self.ncol, N_ALPHA))
            .unwrap();
        let pair = pair_flat
            .into_shape_with_order((self.npair_blocks(), N_ALPHA, N_ALPHA))
            .unwrap();
        let triplet = match self.kind {
            TripletKind::Scalar => TripletValuesView::Scalar(triplet_flat),
            TripletKind::AaFull => TripletValuesView::AaFull(
                triplet_flat
                    .into_shape_with_order((self.ntriplets, N_ALPHA, N_ALPHA, N_ALPHA))
                    .unwrap(),
            ),
        };
        Ok(PotentialsView {
            single,
            pair,
            triplet,
        })
    }

    /// Owned counterpart of [`split`](Self::split).
    pub fn unpack(&self, x: &Array1<f64>) -> Result<Potentials, LayoutError> {
        Ok(self.split(x)?.to_owned())
    }

    /// Writes structured blocks back into one flat vector in canonical order.
    ///
    /// Gap-category slots are forced to zero on write, whatever the input
    /// holds: the flat vector is the optimizer's space, and gap directions
    /// are not part of the model.
    pub fn pack(&self, p: &Potentials) -> Result<Array1<f64>, LayoutError> {
        self.check_shapes(p)?;
        let mut x = Array1::zeros(self.nvar());
        {
            let (single_flat, rest) = x.view_mut().split_at(Axis(0), self.nsingle());
            let (pair_flat, triplet_flat) = rest.split_at(Axis(0), self.npair());
            single_flat
                .into_shape_with_order((self.ncol, N_ALPHA))
                .unwrap()
                .assign(&p.single);
            pair_flat
                .into_shape_with_order((self.npair_blocks(), N_ALPHA, N_ALPHA))
                .unwrap()
                .assign(&p.pair);
            match &p.triplet {
                TripletValues::Scalar(v) => {
                    let mut t = triplet_flat;
                    t.assign(v);
                }
                TripletValues::AaFull(v) => {
                    triplet_flat
                        .into_shape_with_order((self.ntriplets, N_ALPHA, N_ALPHA, N_ALPHA))
                        .unwrap()
                        .assign(v);
                }
            }
        }
        self.zero_gap_slots(&mut x);
        Ok(x)
    }

    fn zero_gap_slots(&self, x: &mut Array1<f64>) {
        let g = GAP as usize;
        for i in 0..self.ncol {
            x[self.single_index(i, g)] = 0.0;
        }
        for blk in 0..self.npair_blocks() {
            for a in 0..N_ALPHA {
                x[self.pair_index(blk, a, g)] = 0.0;
                x[self.pair_index(blk, g, a)] = 0.0;
            }
        }
        if self.kind == TripletKind::AaFull {
            for t in 0..self.ntriplets {
                for a in 0..N_ALPHA {
                    for b in 0..N_ALPHA {
                        x[self.triplet_aa_index(t, g, a, b)] = 0.0;
                        x[self.triplet_aa_index(t, a, g, b)] = 0.0;
                        x[self.triplet_aa_index(t, a, b, g)] = 0.0;
                    }
                }
            }
        }
    }

    fn check_shapes(&self, p: &Potentials) -> Result<(), LayoutError> {
        if p.single.dim() != (self.ncol, N_ALPHA) {
            return Err(LayoutError::BlockShape {
                block: "single",
                expected: vec![self.ncol, N_ALPHA],
                actual: p.single.shape().to_vec(),
            });
        }
        if p.pair.dim() != (self.npair_blocks(), N_ALPHA, N_ALPHA) {
            return Err(LayoutError::BlockShape {
                block: "pair",
                expected: vec![self.npair_blocks(), N_ALPHA, N_ALPHA],
                actual: p.pair.shape().to_vec(),
            });
        }
        if p.triplet.kind() != self.kind {
            return Err(LayoutError::KindMismatch {
                expected: self.kind,
                actual: p.triplet.kind(),
            });
        }
        let expected_triplet = match self.kind {
            TripletKind::Scalar => vec![self.ntriplets],
            TripletKind::AaFull => vec![self.ntriplets, N_ALPHA, N_ALPHA, N_ALPHA],
        };
        let actual_triplet = match &p.triplet {
            TripletValues::Scalar(v) => vec![v.len()],
            TripletValues::AaFull(v) => v.shape().to_vec(),
        };
        if expected_triplet != actual_triplet {
            return Err(LayoutError::BlockShape {
                block: "triplet",
                expected: expected_triplet,
                actual: actual_triplet,
            });
        }
        Ok(())
    }
}
