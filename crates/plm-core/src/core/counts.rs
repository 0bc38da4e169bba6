use ndarray::{Array1, Array2, Array4};

use super::alignment::Alignment;
use super::alphabet::N_ALPHA;
use super::triplets::{ColumnTriplet, ScalarTriplet};

/// Weighted per-column category counts, shape (L, 21). Gap occurrences are
/// counted like any other category; downstream projections decide what to do
/// with them.
pub fn single_counts(msa: &Alignment) -> Array2<f64> {
    let mut counts = Array2::zeros((msa.ncol(), N_ALPHA));
    for (n, row) in msa.seqs().outer_iter().enumerate() {
        let w = msa.weight(n);
        for (i, &a) in row.iter().enumerate() {
            counts[[i, a as usize]] += w;
        }
    }
    counts
}

/// Weighted pairwise joint counts, shape (L, L, 21, 21), filled for every
/// ordered column pair including the diagonal, so that
/// `counts[[i, j, a, b]] == counts[[j, i, b, a]]` and the diagonal blocks
/// carry the single counts on their (a, a) entries.
pub fn pair_counts(msa: &Alignment) -> Array4<f64> {
    let l = msa.ncol();
    let mut counts = Array4::zeros((l, l, N_ALPHA, N_ALPHA));
    for (n, row) in msa.seqs().outer_iter().enumerate() {
        let w = msa.weight(n);
        for i in 0..l {
            let a = row[i] as usize;
            for j in 0..l {
                counts[[i, j, a, row[j] as usize]] += w;
            }
        }
    }
    counts
}

/// Weighted joint counts over the given column triples, shape (T, 21, 21, 21).
pub fn triplet_counts(msa: &Alignment, triplets: &[ColumnTriplet]) -> Array4<f64> {
    let mut counts = Array4::zeros((triplets.len(), N_ALPHA, N_ALPHA, N_ALPHA));
    for (n, row) in msa.seqs().outer_iter().enumerate() {
        let w = msa.weight(n);
        for (t, cols) in triplets.iter().enumerate() {
            counts[[
                t,
                row[cols.i] as usize,
                row[cols.j] as usize,
                row[cols.k] as usize,
            ]] += w;
        }
    }
    counts
}

/// Weighted match counts for assignment-bound triplets: entry t is the total
/// weight of sequences whose categories at (i, j, k) equal the descriptor's
/// (a, b, c) exactly.
pub fn scalar_triplet_counts(msa: &Alignment, triplets: &[ScalarTriplet]) -> Array1<f64> {
    let mut counts = Array1::zeros(triplets.len());
    for (n, row) in msa.seqs().outer_iter().enumerate() {
        let w = msa.weight(n);
        for (t, trip) in triplets.iter().enumerate() {
            let ColumnTriplet { i, j, k } = trip.cols;
            if row[i] == trip.aminos[0] && row[j] == trip.aminos[1] && row[k] == trip.aminos[2] {
                counts[t] += w;
            }
        }
    }
    counts
}

/// Per-column category frequencies: single counts normalized by Neff.
pub fn single_frequencies(msa: &Alignment) -> Array2<f64> {
    single_counts(msa) / msa.neff()
}

/// Pairwise joint frequencies: pair counts normalized by Neff.
pub fn pair_frequencies(msa: &Alignment) -> Array4<f64> {
    pair_counts(msa) / msa.neff()
}
