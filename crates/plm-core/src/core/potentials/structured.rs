use ndarray::{Array1, Array2, Array3, Array4, ArrayView1, ArrayView2, ArrayView3, ArrayView4, s};

use super::layout::pair_block_count;
use crate::core::alphabet::{GAP, N_ALPHA};
use crate::core::triplets::TripletKind;

/// Owned triplet potential block in one of the two supported shapes.
#[derive(Debug, Clone, PartialEq)]
pub enum TripletValues {
    /// One value per (column triple, assignment) descriptor.
    Scalar(Array1<f64>),
    /// One 21x21x21 tensor per column triple, shape (T, 21, 21, 21).
    AaFull(Array4<f64>),
}

impl TripletValues {
    pub fn kind(&self) -> TripletKind {
        match self {
            TripletValues::Scalar(_) => TripletKind::Scalar,
            TripletValues::AaFull(_) => TripletKind::AaFull,
        }
    }

    pub fn descriptor_count(&self) -> usize {
        match self {
            TripletValues::Scalar(v) => v.len(),
            TripletValues::AaFull(v) => v.dim().0,
        }
    }

    pub fn value_count(&self) -> usize {
        match self {
            TripletValues::Scalar(v) => v.len(),
            TripletValues::AaFull(v) => v.len(),
        }
    }

    pub fn view(&self) -> TripletValuesView<'_> {
        match self {
            TripletValues::Scalar(v) => TripletValuesView::Scalar(v.view()),
            TripletValues::AaFull(v) => TripletValuesView::AaFull(v.view()),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum TripletValuesView<'a> {
    Scalar(ArrayView1<'a, f64>),
    AaFull(ArrayView4<'a, f64>),
}

impl TripletValuesView<'_> {
    pub fn kind(&self) -> TripletKind {
        match self {
            TripletValuesView::Scalar(_) => TripletKind::Scalar,
            TripletValuesView::AaFull(_) => TripletKind::AaFull,
        }
    }

    pub fn value_count(&self) -> usize {
        match self {
            TripletValuesView::Scalar(v) => v.len(),
            TripletValuesView::AaFull(v) => v.len(),
        }
    }

    pub fn to_owned(&self) -> TripletValues {
        match self {
            TripletValuesView::Scalar(v) => TripletValues::Scalar(v.to_owned()),
            TripletValuesView::AaFull(v) => TripletValues::AaFull(v.to_owned()),
        }
    }
}

/// One full structured parameter (or gradient) set: single potentials
/// (L, 21), packed pair potentials (L(L-1)/2, 21, 21) and the triplet block.
#[derive(Debug, Clone, PartialEq)]
pub struct Potentials {
    pub single: Array2<f64>,
    pub pair: Array3<f64>,
    pub triplet: TripletValues,
}

impl Potentials {
    pub fn zeros(ncol: usize, kind: TripletKind, ntriplets: usize) -> Self {
        let triplet = match kind {
            TripletKind::Scalar => TripletValues::Scalar(Array1::zeros(ntriplets)),
            TripletKind::AaFull => {
                TripletValues::AaFull(Array4::zeros((ntriplets, N_ALPHA, N_ALPHA, N_ALPHA)))
            }
        };
        Self {
            single: Array2::zeros((ncol, N_ALPHA)),
            pair: Array3::zeros((pair_block_count(ncol), N_ALPHA, N_ALPHA)),
            triplet,
        }
    }

    pub fn ncol(&self) -> usize {
        self.single.nrows()
    }

    /// Forces every gap-category entry to zero: the single gap column, the
    /// gap row and column of every pair block, and any triplet entry indexed
    /// by the gap category.
    pub fn project_gaps(&mut self) {
        let g = GAP as usize;
        self.single.column_mut(g).fill(0.0);
        self.pair.slice_mut(s![.., g, ..]).fill(0.0);
        self.pair.slice_mut(s![.., .., g]).fill(0.0);
        if let TripletValues::AaFull(v) = &mut self.triplet {
            v.slice_mut(s![.., g, .., ..]).fill(0.0);
            v.slice_mut(s![.., .., g, ..]).fill(0.0);
            v.slice_mut(s![.., .., .., g]).fill(0.0);
        }
    }

    pub fn view(&self) -> PotentialsView<'_> {
        PotentialsView {
            single: self.single.view(),
            pair: self.pair.view(),
            triplet: self.triplet.view(),
        }
    }
}

/// Borrowed structured windows into one flat parameter vector.
#[derive(Debug, Clone, Copy)]
pub struct PotentialsView<'a> {
    pub single: ArrayView2<'a, f64>,
    pub pair: ArrayView3<'a, f64>,
    pub triplet: TripletValuesView<'a>,
}

impl PotentialsView<'_> {
    pub fn to_owned(&self) -> Potentials {
        Potentials {
            single: self.single.to_owned(),
            pair: self.pair.to_owned(),
            triplet: self.triplet.to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zeros_allocates_the_expected_shapes() {
        let p = Potentials::zeros(5, TripletKind::AaFull, 2);
        assert_eq!(p.single.dim(), (5, 21));
        assert_eq!(p.pair.dim(), (10, 21, 21));
        match &p.triplet {
            TripletValues::AaFull(v) => assert_eq!(v.dim(), (2, 21, 21, 21)),
            TripletValues::Scalar(_) => panic!("expected the full tensor shape"),
        }
        assert_eq!(p.triplet.value_count(), 2 * 21 * 21 * 21);
        assert_eq!(p.triplet.descriptor_count(), 2);
    }

    #[test]
    fn project_gaps_clears_every_gap_slot() {
        let mut p = Potentials::zeros(3, TripletKind::AaFull, 1);
        p.single.fill(1.0);
        p.pair.fill(1.0);
        if let TripletValues::AaFull(v) = &mut p.triplet {
            v.fill(1.0);
        }
        p.project_gaps();

        let g = GAP as usize;
        assert_eq!(p.single[[1, g]], 0.0);
        assert_eq!(p.single[[1, 0]], 1.0);
        assert_eq!(p.pair[[0, g, 3]], 0.0);
        assert_eq!(p.pair[[0, 3, g]], 0.0);
        assert_eq!(p.pair[[0, 3, 4]], 1.0);
        if let TripletValues::AaFull(v) = &p.triplet {
            assert_eq!(v[[0, g, 0, 0]], 0.0);
            assert_eq!(v[[0, 0, g, 0]], 0.0);
            assert_eq!(v[[0, 0, 0, g]], 0.0);
            assert_eq!(v[[0, 1, 2, 3]], 1.0);
        }
    }

    #[test]
    fn scalar_blocks_are_untouched_by_gap_projection() {
        let mut p = Potentials::zeros(3, TripletKind::Scalar, 4);
        if let TripletValues::Scalar(v) = &mut p.triplet {
            v.fill(2.0);
        }
        p.project_gaps();
        if let TripletValues::Scalar(v) = &p.triplet {
            assert!(v.iter().all(|&x| x == 2.0));
        }
    }
}
