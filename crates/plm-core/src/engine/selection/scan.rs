use itertools::iproduct;
use ndarray::{Array2, Array4, s};
use rand::Rng;

use crate::core::alphabet::{N_ALPHA, N_AMINO};
use crate::core::io::report::{AssignmentRow, TripletReport, TripletRow};
use crate::engine::config::{PairTransform, SelectionConfig, SelectionStrategy};

use super::SelectionError;
use super::topk::{Scored, TopK};

/// Ranks column triples from a dense pair coupling tensor.
///
/// The tensor must be square `L x L x 21 x 21`; only upper-triangle blocks
/// (`i < j`) are read. Scored strategies return at most `count` records
/// sorted from greatest to least score with ties in scan order; the random
/// strategy returns uniformly drawn distinct triples with score zero, sorted
/// by coordinates. Fails when no triple can satisfy the separation
/// constraint.
pub fn select(
    w: &Array4<f64>,
    config: &SelectionConfig,
    rng: &mut impl Rng,
) -> Result<TripletReport, SelectionError> {
    let (l, l2, na, nb) = w.dim();
    if l != l2 || na != N_ALPHA || nb != N_ALPHA {
        return Err(SelectionError::TensorShape {
            shape: w.shape().to_vec(),
        });
    }
    if l < 2 * config.min_separation + 1 {
        return Err(SelectionError::EmptyUniverse {
            ncol: l,
            min_separation: config.min_separation,
        });
    }

    let transformed;
    let w = match config.transform {
        PairTransform::Identity => w,
        t => {
            transformed = w.mapv(|v| t.apply(v));
            &transformed
        }
    };

    Ok(match config.strategy {
        SelectionStrategy::Random => TripletReport::Assignments(random_triples(l, config, rng)),
        SelectionStrategy::BestIjk => TripletReport::Triplets(best_by_pair_sums(w, config)),
        SelectionStrategy::BestIjkAbc => TripletReport::Assignments(best_assignments(w, config)),
    })
}

/// Per-face coupling totals over the twenty amino-acid categories.
fn face_sums(w: &Array4<f64>) -> Array2<f64> {
    let l = w.dim().0;
    let mut sums = Array2::zeros((l, l));
    for i in 0..l {
        for j in (i + 1)..l {
            sums[[i, j]] = w.slice(s![i, j, ..N_AMINO, ..N_AMINO]).sum();
        }
    }
    sums
}

fn best_by_pair_sums(w: &Array4<f64>, config: &SelectionConfig) -> Vec<TripletRow> {
    let l = w.dim().0;
    let sep = config.min_separation;
    let sums = face_sums(w);

    #[cfg(feature = "parallel")]
    let top = {
        use rayon::prelude::*;
        (0..l)
            .into_par_iter()
            .fold(
                || TopK::new(config.count),
                |mut top, i| {
                    scan_triples_from(&sums, i, sep, &mut top);
                    top
                },
            )
            .reduce(
                || TopK::new(config.count),
                |mut left, right| {
                    left.merge(right);
                    left
                },
            )
    };
    #[cfg(not(feature = "parallel"))]
    let top = {
        let mut top = TopK::new(config.count);
        for i in 0..l {
            scan_triples_from(&sums, i, sep, &mut top);
        }
        top
    };

    top.into_sorted()
        .into_iter()
        .map(|item| TripletRow {
            i: item.coord.0,
            j: item.coord.1,
            k: item.coord.2,
            score: item.score,
        })
        .collect()
}

fn scan_triples_from(
    sums: &Array2<f64>,
    i: usize,
    sep: usize,
    top: &mut TopK<Scored<(usize, usize, usize)>>,
) {
    let l = sums.nrows();
    for j in (i + sep)..l {
        for k in (j + sep)..l {
            top.push(Scored {
                score: sums[[i, j]] + sums[[j, k]] + sums[[i, k]],
                coord: (i, j, k),
            });
        }
    }
}

fn best_assignments(w: &Array4<f64>, config: &SelectionConfig) -> Vec<AssignmentRow> {
    let l = w.dim().0;
    let sep = config.min_separation;

    #[cfg(feature = "parallel")]
    let top = {
        use rayon::prelude::*;
        (0..l)
            .into_par_iter()
            .fold(
                || TopK::new(config.count),
                |mut top, i| {
                    scan_assignments_from(w, i, sep, &mut top);
                    top
                },
            )
            .reduce(
                || TopK::new(config.count),
                |mut left, right| {
                    left.merge(right);
                    left
                },
            )
    };
    #[cfg(not(feature = "parallel"))]
    let top = {
        let mut top = TopK::new(config.count);
        for i in 0..l {
            scan_assignments_from(w, i, sep, &mut top);
        }
        top
    };

    top.into_sorted()
        .into_iter()
        .map(|item| AssignmentRow {
            i: item.coord.0,
            j: item.coord.1,
            k: item.coord.2,
            a: item.coord.3 as u8,
            b: item.coord.4 as u8,
            c: item.coord.5 as u8,
            score: item.score,
        })
        .collect()
}

fn scan_assignments_from(
    w: &Array4<f64>,
    i: usize,
    sep: usize,
    top: &mut TopK<Scored<(usize, usize, usize, usize, usize, usize)>>,
) {
    let l = w.dim().0;
    for j in (i + sep)..l {
        for k in (j + sep)..l {
            for (a, b, c) in iproduct!(0..N_AMINO, 0..N_AMINO, 0..N_AMINO) {
                top.push(Scored {
                    score: w[[i, j, a, b]] + w[[j, k, b, c]] + w[[i, k, a, c]],
                    coord: (i, j, k, a, b, c),
                });
            }
        }
    }
}

/// Uniform sampling over the valid triple universe.
///
/// Triples at separation `s` biject onto 3-combinations of a contracted
/// range of `L - 2(s - 1)` indices, so drawing distinct combination ranks
/// and unranking them yields exactly uniform distinct triples without
/// rejection. A universe no larger than the requested count is returned
/// whole. Each triple gets one uniformly drawn amino-acid assignment.
fn random_triples(ncol: usize, config: &SelectionConfig, rng: &mut impl Rng) -> Vec<AssignmentRow> {
    let sep = config.min_separation;
    let m = ncol - 2 * (sep - 1);
    let universe = binom3(m);

    let mut rows: Vec<AssignmentRow> = if universe <= config.count {
        let mut rows = Vec::with_capacity(universe);
        for x in 0..m {
            for y in (x + 1)..m {
                for z in (y + 1)..m {
                    rows.push(assignment_row(x, y, z, sep, rng));
                }
            }
        }
        rows
    } else {
        rand::seq::index::sample(rng, universe, config.count)
            .iter()
            .map(|rank| {
                let (x, y, z) = unrank_combination(rank);
                assignment_row(x, y, z, sep, rng)
            })
            .collect()
    };
    rows.sort_by_key(|r| (r.i, r.j, r.k, r.a, r.b, r.c));
    rows
}

fn assignment_row(x: usize, y: usize, z: usize, sep: usize, rng: &mut impl Rng) -> AssignmentRow {
    AssignmentRow {
        i: x,
        j: y + (sep - 1),
        k: z + 2 * (sep - 1),
        a: rng.gen_range(0..N_AMINO) as u8,
        b: rng.gen_range(0..N_AMINO) as u8,
        c: rng.gen_range(0..N_AMINO) as u8,
        score: 0.0,
    }
}

fn binom2(n: usize) -> usize {
    n * n.saturating_sub(1) / 2
}

fn binom3(n: usize) -> usize {
    binom2(n) * n.saturating_sub(2) / 3
}

/// Colex unranking of a 3-combination: rank -> (x, y, z) with x < y < z.
fn unrank_combination(rank: usize) -> (usize, usize, usize) {
    let mut r = rank;
    let mut z = 2;
    while binom3(z + 1) <= r {
        z += 1;
    }
    r -= binom3(z);
    let mut y = 1;
    while binom2(y + 1) <= r {
        y += 1;
    }
    r -= binom2(y);
    (r, y, z)
}
