use ndarray::{Array1, aview1};

#[cfg(feature = "parallel")]
use std::sync::Arc;

use crate::core::alignment::Alignment;
use crate::core::alphabet::{GAP, N_ALPHA, N_AMINO};
use crate::core::potentials::layout::{LayoutError, ParameterLayout};
use crate::core::triplets::TripletSet;

#[cfg(feature = "parallel")]
use super::error::EngineError;

/// Computes the pseudo-likelihood value and its expectation gradient.
///
/// `evaluate` fills `grad` with the model-expectation term only, in the exact
/// flat layout; subtracting the empirical counts offset and adding the
/// regularizer gradient is the caller's job. Descriptor columns must lie
/// within the layout's column count.
pub trait PllKernel: Send + Sync {
    fn evaluate(
        &self,
        x: &Array1<f64>,
        grad: &mut Array1<f64>,
        msa: &Alignment,
        triplets: &TripletSet,
        layout: &ParameterLayout,
    ) -> Result<f64, LayoutError>;
}

/// Native kernel iterating sequence by sequence, site by site.
///
/// Each non-gap site contributes `log Z_i - sumpot_i(x_ni)` to the value,
/// where `Z_i` sums `exp(sumpot_i(a))` over the twenty amino-acid categories
/// and `sumpot_i(a)` collects the single, pair, and triplet potentials seen
/// by site `i` with category `a` against the observed rest of the sequence.
/// Gap sites are excluded from the value and carry zero conditionals.
#[derive(Debug, Default)]
pub struct SitewiseKernel {
    #[cfg(feature = "parallel")]
    pool: Option<Arc<rayon::ThreadPool>>,
}

impl SitewiseKernel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a kernel running on a dedicated pool of `threads` workers.
    #[cfg(feature = "parallel")]
    pub fn with_threads(threads: usize) -> Result<Self, EngineError> {
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build()
            .map_err(|e| EngineError::ThreadPool {
                message: e.to_string(),
            })?;
        Ok(Self {
            pool: Some(Arc::new(pool)),
        })
    }

    #[cfg(feature = "parallel")]
    fn accumulate(
        &self,
        xs: &[f64],
        seqs: &[u8],
        msa: &Alignment,
        triplets: &TripletSet,
        layout: &ParameterLayout,
    ) -> Accum {
        use rayon::prelude::*;

        let l = layout.ncol();
        let run = || {
            (0..msa.nrow())
                .into_par_iter()
                .fold(
                    || Accum::new(layout.nvar(), l),
                    |mut acc, n| {
                        process_row(
                            &mut acc,
                            xs,
                            &seqs[n * l..(n + 1) * l],
                            msa.weight(n),
                            triplets,
                            layout,
                        );
                        acc
                    },
                )
                .reduce(|| Accum::new(layout.nvar(), l), Accum::merge)
        };
        match &self.pool {
            Some(pool) => pool.install(run),
            None => run(),
        }
    }

    #[cfg(not(feature = "parallel"))]
    fn accumulate(
        &self,
        xs: &[f64],
        seqs: &[u8],
        msa: &Alignment,
        triplets: &TripletSet,
        layout: &ParameterLayout,
    ) -> Accum {
        let l = layout.ncol();
        let mut acc = Accum::new(layout.nvar(), l);
        for n in 0..msa.nrow() {
            process_row(
                &mut acc,
                xs,
                &seqs[n * l..(n + 1) * l],
                msa.weight(n),
                triplets,
                layout,
            );
        }
        acc
    }
}

impl PllKernel for SitewiseKernel {
    fn evaluate(
        &self,
        x: &Array1<f64>,
        grad: &mut Array1<f64>,
        msa: &Alignment,
        triplets: &TripletSet,
        layout: &ParameterLayout,
    ) -> Result<f64, LayoutError> {
        if x.len() != layout.nvar() {
            return Err(LayoutError::LengthMismatch {
                expected: layout.nvar(),
                actual: x.len(),
            });
        }
        if grad.len() != layout.nvar() {
            return Err(LayoutError::LengthMismatch {
                expected: layout.nvar(),
                actual: grad.len(),
            });
        }
        debug_assert_eq!(msa.ncol(), layout.ncol());
        debug_assert!(triplets.validate(layout.ncol()).is_ok());

        let x_storage;
        let xs: &[f64] = match x.as_slice() {
            Some(s) => s,
            None => {
                x_storage = x.iter().copied().collect::<Vec<f64>>();
                &x_storage
            }
        };
        let seq_storage;
        let seqs: &[u8] = match msa.seqs().as_slice() {
            Some(s) => s,
            None => {
                seq_storage = msa.seqs().iter().copied().collect::<Vec<u8>>();
                &seq_storage
            }
        };

        let acc = self.accumulate(xs, seqs, msa, triplets, layout);
        grad.assign(&aview1(&acc.grad));
        Ok(acc.fx)
    }
}

/// Per-worker accumulator with scratch space reused across rows.
struct Accum {
    fx: f64,
    grad: Vec<f64>,
    sumpot: Vec<f64>,
    pcond: Vec<f64>,
}

impl Accum {
    fn new(nvar: usize, ncol: usize) -> Self {
        Self {
            fx: 0.0,
            grad: vec![0.0; nvar],
            sumpot: vec![0.0; ncol * N_AMINO],
            pcond: vec![0.0; ncol * N_AMINO],
        }
    }

    #[cfg(feature = "parallel")]
    fn merge(mut self, other: Self) -> Self {
        self.fx += other.fx;
        for (g, o) in self.grad.iter_mut().zip(&other.grad) {
            *g += o;
        }
        self
    }
}

fn process_row(
    acc: &mut Accum,
    xs: &[f64],
    seq: &[u8],
    w: f64,
    triplets: &TripletSet,
    layout: &ParameterLayout,
) {
    const Q: usize = N_AMINO;
    let l = layout.ncol();
    let gap = GAP as usize;
    let Accum {
        fx,
        grad,
        sumpot,
        pcond,
    } = acc;

    for i in 0..l {
        let base = layout.single_index(i, 0);
        for a in 0..Q {
            sumpot[i * Q + a] = xs[base + a];
        }
    }

    // Pair potentials read at gap partner categories are invariantly zero,
    // so the sums below need no gap branches.
    for i in 0..l {
        let xi = seq[i] as usize;
        for j in (i + 1)..l {
            let xj = seq[j] as usize;
            let base = layout.pair_index(layout.pair_block(i, j), 0, 0);
            for a in 0..Q {
                sumpot[i * Q + a] += xs[base + a * N_ALPHA + xj];
                sumpot[j * Q + a] += xs[base + xi * N_ALPHA + a];
            }
        }
    }
    match triplets {
        TripletSet::Scalar(list) => {
            for (t, trip) in list.iter().enumerate() {
                let v = xs[layout.triplet_scalar_index(t)];
                let (xi, xj, xk) = (seq[trip.cols.i], seq[trip.cols.j], seq[trip.cols.k]);
                let [a, b, c] = trip.aminos;
                if xj == b && xk == c {
                    sumpot[trip.cols.i * Q + a as usize] += v;
                }
                if xi == a && xk == c {
                    sumpot[trip.cols.j * Q + b as usize] += v;
                }
                if xi == a && xj == b {
                    sumpot[trip.cols.k * Q + c as usize] += v;
                }
            }
        }
        TripletSet::AaFull(list) => {
            for (t, cols) in list.iter().enumerate() {
                let (xi, xj, xk) = (seq[cols.i] as usize, seq[cols.j] as usize, seq[cols.k] as usize);
                let base = layout.triplet_aa_index(t, 0, 0, 0);
                for a in 0..Q {
                    sumpot[cols.i * Q + a] += xs[base + (a * N_ALPHA + xj) * N_ALPHA + xk];
                    sumpot[cols.j * Q + a] += xs[base + (xi * N_ALPHA + a) * N_ALPHA + xk];
                    sumpot[cols.k * Q + a] += xs[base + (xi * N_ALPHA + xj) * N_ALPHA + a];
                }
            }
        }
    }

    for i in 0..l {
        let xi = seq[i] as usize;
        if xi == gap {
            pcond[i * Q..(i + 1) * Q].fill(0.0);
            continue;
        }
        let mut z = 0.0;
        for a in 0..Q {
            z += sumpot[i * Q + a].exp();
        }
        *fx += w * (z.ln() - sumpot[i * Q + xi]);
        let scale = w / z;
        for a in 0..Q {
            pcond[i * Q + a] = sumpot[i * Q + a].exp() * scale;
        }
    }

    for i in 0..l {
        if seq[i] == GAP {
            continue;
        }
        let base = layout.single_index(i, 0);
        for a in 0..Q {
            grad[base + a] += pcond[i * Q + a];
        }
    }

    // A pair with a gap on either side contributes nothing: the gap side has
    // no conditional and the other side's slot is a gap coordinate.
    for i in 0..l {
        let xi = seq[i] as usize;
        if xi == gap {
            continue;
        }
        for j in (i + 1)..l {
            let xj = seq[j] as usize;
            if xj == gap {
                continue;
            }
            let base = layout.pair_index(layout.pair_block(i, j), 0, 0);
            for a in 0..Q {
                grad[base + a * N_ALPHA + xj] += pcond[i * Q + a];
                grad[base + xi * N_ALPHA + a] += pcond[j * Q + a];
            }
        }
    }
    match triplets {
        TripletSet::Scalar(list) => {
            for (t, trip) in list.iter().enumerate() {
                let (xi, xj, xk) = (seq[trip.cols.i], seq[trip.cols.j], seq[trip.cols.k]);
                let [a, b, c] = trip.aminos;
                let mut g = 0.0;
                if xj == b && xk == c {
                    g += pcond[trip.cols.i * Q + a as usize];
                }
                if xi == a && xk == c {
                    g += pcond[trip.cols.j * Q + b as usize];
                }
                if xi == a && xj == b {
                    g += pcond[trip.cols.k * Q + c as usize];
                }
                grad[layout.triplet_scalar_index(t)] += g;
            }
        }
        TripletSet::AaFull(list) => {
            for (t, cols) in list.iter().enumerate() {
                let (xi, xj, xk) = (seq[cols.i] as usize, seq[cols.j] as usize, seq[cols.k] as usize);
                if xi == gap || xj == gap || xk == gap {
                    continue;
                }
                let base = layout.triplet_aa_index(t, 0, 0, 0);
                for a in 0..Q {
                    grad[base + (a * N_ALPHA + xj) * N_ALPHA + xk] += pcond[cols.i * Q + a];
                    grad[base + (xi * N_ALPHA + a) * N_ALPHA + xk] += pcond[cols.j * Q + a];
                    grad[base + (xi * N_ALPHA + xj) * N_ALPHA + a] += pcond[cols.k * Q + a];
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::triplets::{ColumnTriplet, ScalarTriplet};
    use ndarray::array;

    fn create_gap_free_alignment() -> Alignment {
        Alignment::new(array![[0u8, 1, 2], [3, 4, 5]], array![1.0, 2.0]).unwrap()
    }

    fn evaluate_at(
        x: &Array1<f64>,
        msa: &Alignment,
        triplets: &TripletSet,
        layout: &ParameterLayout,
    ) -> (f64, Array1<f64>) {
        let kernel = SitewiseKernel::new();
        let mut grad = Array1::zeros(layout.nvar());
        let fx = kernel.evaluate(x, &mut grad, msa, triplets, layout).unwrap();
        (fx, grad)
    }

    #[test]
    fn zero_parameters_give_uniform_conditionals() {
        let msa = create_gap_free_alignment();
        let triplets = TripletSet::empty();
        let layout = ParameterLayout::for_set(msa.ncol(), &triplets);

        let (fx, grad) = evaluate_at(&Array1::zeros(layout.nvar()), &msa, &triplets, &layout);

        // Every site of every sequence contributes ln 20.
        let expected = msa.neff() * 3.0 * 20.0_f64.ln();
        assert!((fx - expected).abs() < 1e-9);

        // Uniform conditionals spread each sequence weight evenly.
        for i in 0..3 {
            for a in 0..N_AMINO {
                assert!((grad[layout.single_index(i, a)] - msa.neff() / 20.0).abs() < 1e-9);
            }
        }
        // Pair slot (a, b) collects category counts from both sides.
        let blk = layout.pair_block(0, 1);
        assert!((grad[layout.pair_index(blk, 0, 1)] - 2.0 / 20.0).abs() < 1e-9);
        assert!((grad[layout.pair_index(blk, 3, 4)] - 4.0 / 20.0).abs() < 1e-9);
        assert!((grad[layout.pair_index(blk, 0, 4)] - 3.0 / 20.0).abs() < 1e-9);
        assert!((grad[layout.pair_index(blk, 7, 9)]).abs() < 1e-9);
    }

    #[test]
    fn gap_sites_are_excluded_from_value_and_gradient() {
        let msa = Alignment::new(array![[0u8, 1, 2], [0, 20, 2]], array![1.0, 1.0]).unwrap();
        let triplets = TripletSet::empty();
        let layout = ParameterLayout::for_set(msa.ncol(), &triplets);

        let (fx, grad) = evaluate_at(&Array1::zeros(layout.nvar()), &msa, &triplets, &layout);

        // Five non-gap sites across the two sequences.
        assert!((fx - 5.0 * 20.0_f64.ln()).abs() < 1e-9);
        // Only the first sequence has a conditional at column 1.
        assert!((grad[layout.single_index(1, 0)] - 1.0 / 20.0).abs() < 1e-9);
        assert_eq!(grad[layout.single_index(1, 20)], 0.0);

        // The (0, 1) pair sees one gap-free sequence, the (0, 2) pair two.
        let blk01 = layout.pair_block(0, 1);
        assert!((grad[layout.pair_index(blk01, 0, 1)] - 2.0 / 20.0).abs() < 1e-9);
        assert!((grad[layout.pair_index(blk01, 5, 1)] - 1.0 / 20.0).abs() < 1e-9);
        assert_eq!(grad[layout.pair_index(blk01, 0, 20)], 0.0);
        let blk02 = layout.pair_block(0, 2);
        assert!((grad[layout.pair_index(blk02, 0, 2)] - 4.0 / 20.0).abs() < 1e-9);
    }

    #[test]
    fn scalar_triplet_term_shifts_matching_conditionals() {
        let msa = Alignment::new(array![[0u8, 1, 2]], array![1.0]).unwrap();
        let triplets = TripletSet::Scalar(vec![ScalarTriplet::new(
            ColumnTriplet::new(0, 1, 2),
            [0, 1, 2],
        )]);
        let layout = ParameterLayout::for_set(msa.ncol(), &triplets);

        let v = 2.0_f64.ln();
        let mut x = Array1::zeros(layout.nvar());
        x[layout.triplet_scalar_index(0)] = v;

        let (fx, grad) = evaluate_at(&x, &msa, &triplets, &layout);

        // Each site's partition becomes e^v + 19 = 21 with the observed
        // category boosted by v.
        let expected = 3.0 * (21.0_f64.ln() - v);
        assert!((fx - expected).abs() < 1e-12);

        // The triplet gradient collects the matching conditional at all
        // three sites: 3 * (2 / 21).
        assert!((grad[layout.triplet_scalar_index(0)] - 6.0 / 21.0).abs() < 1e-12);
        assert!((grad[layout.single_index(0, 0)] - 2.0 / 21.0).abs() < 1e-12);
        assert!((grad[layout.single_index(0, 5)] - 1.0 / 21.0).abs() < 1e-12);
    }

    #[test]
    fn aa_full_triplet_gradient_skips_gapped_sequences() {
        let msa = Alignment::new(array![[0u8, 1, 2], [0, 1, 20]], array![1.0, 1.0]).unwrap();
        let triplets = TripletSet::AaFull(vec![ColumnTriplet::new(0, 1, 2)]);
        let layout = ParameterLayout::for_set(msa.ncol(), &triplets);

        let (fx, grad) = evaluate_at(&Array1::zeros(layout.nvar()), &msa, &triplets, &layout);

        assert!((fx - 5.0 * 20.0_f64.ln()).abs() < 1e-9);
        // Only the gap-free sequence reaches the triplet block; the observed
        // slot collects all three conditionals.
        assert!((grad[layout.triplet_aa_index(0, 0, 1, 2)] - 3.0 / 20.0).abs() < 1e-9);
        assert!((grad[layout.triplet_aa_index(0, 5, 1, 2)] - 1.0 / 20.0).abs() < 1e-9);
        assert_eq!(grad[layout.triplet_aa_index(0, 0, 1, 20)], 0.0);
    }

    #[test]
    fn rejects_wrong_parameter_length() {
        let msa = create_gap_free_alignment();
        let triplets = TripletSet::empty();
        let layout = ParameterLayout::for_set(msa.ncol(), &triplets);
        let kernel = SitewiseKernel::new();

        let x = Array1::zeros(layout.nvar() + 1);
        let mut grad = Array1::zeros(layout.nvar());
        let result = kernel.evaluate(&x, &mut grad, &msa, &triplets, &layout);
        assert!(matches!(result, Err(LayoutError::LengthMismatch { .. })));
    }

    #[cfg(feature = "parallel")]
    #[test]
    fn dedicated_pool_matches_default_results() {
        let msa = create_gap_free_alignment();
        let triplets = TripletSet::empty();
        let layout = ParameterLayout::for_set(msa.ncol(), &triplets);

        let x = Array1::from_elem(layout.nvar(), 0.01);
        let default_kernel = SitewiseKernel::new();
        let pooled_kernel = SitewiseKernel::with_threads(2).unwrap();

        let mut g1 = Array1::zeros(layout.nvar());
        let mut g2 = Array1::zeros(layout.nvar());
        let fx1 = default_kernel
            .evaluate(&x, &mut g1, &msa, &triplets, &layout)
            .unwrap();
        let fx2 = pooled_kernel
            .evaluate(&x, &mut g2, &msa, &triplets, &layout)
            .unwrap();

        assert!((fx1 - fx2).abs() < 1e-9);
        for (a, b) in g1.iter().zip(g2.iter()) {
            assert!((a - b).abs() < 1e-9);
        }
    }
}
