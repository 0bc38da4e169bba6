use ndarray::Array1;
use rand::Rng;
use tracing::debug;

use crate::core::triplets::TripletKind;

use super::error::EngineError;
use super::objective::PseudoLikelihood;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParamBlock {
    Single,
    Pair,
    Triplet,
}

/// One finite-difference probe of the analytic gradient.
#[derive(Debug, Clone, Copy)]
pub struct GradientSample {
    pub block: ParamBlock,
    pub index: usize,
    pub analytic: f64,
    pub numeric: f64,
}

impl GradientSample {
    pub fn deviation(&self) -> f64 {
        (self.analytic - self.numeric).abs()
    }
}

/// Randomized centered-difference oracle for the analytic gradient.
///
/// Each sample perturbs one uniformly chosen coordinate of one uniformly
/// chosen parameter block by plus and minus epsilon and compares the value
/// difference against the analytic gradient entry. Coordinates are drawn
/// from the twenty amino-acid categories only; gap slots are not model
/// directions. There is no termination criterion: callers decide how many
/// samples to draw.
#[derive(Debug, Clone, Copy)]
pub struct GradientChecker {
    pub epsilon: f64,
}

impl Default for GradientChecker {
    fn default() -> Self {
        Self { epsilon: 1e-5 }
    }
}

impl GradientChecker {
    pub fn new(epsilon: f64) -> Self {
        Self { epsilon }
    }

    pub fn sample(
        &self,
        objective: &mut PseudoLikelihood,
        x: &Array1<f64>,
        rng: &mut impl Rng,
    ) -> Result<GradientSample, EngineError> {
        let layout = *objective.layout();

        let mut blocks = vec![ParamBlock::Single, ParamBlock::Pair];
        if layout.ntriplet_values() > 0 {
            blocks.push(ParamBlock::Triplet);
        }
        let block = blocks[rng.gen_range(0..blocks.len())];

        let index = match block {
            ParamBlock::Single => {
                let i = rng.gen_range(0..layout.ncol());
                let a = rng.gen_range(0..20);
                layout.single_index(i, a)
            }
            ParamBlock::Pair => {
                let blk = rng.gen_range(0..layout.npair_blocks());
                let a = rng.gen_range(0..20);
                let b = rng.gen_range(0..20);
                layout.pair_index(blk, a, b)
            }
            ParamBlock::Triplet => {
                let t = rng.gen_range(0..layout.ntriplets());
                match layout.kind() {
                    TripletKind::Scalar => layout.triplet_scalar_index(t),
                    TripletKind::AaFull => {
                        let a = rng.gen_range(0..20);
                        let b = rng.gen_range(0..20);
                        let c = rng.gen_range(0..20);
                        layout.triplet_aa_index(t, a, b, c)
                    }
                }
            }
        };

        let (_, grad) = objective.evaluate(x)?;
        let analytic = grad[index];

        let mut probe = x.clone();
        probe[index] = x[index] + self.epsilon;
        let (fx_plus, _) = objective.evaluate(&probe)?;
        probe[index] = x[index] - self.epsilon;
        let (fx_minus, _) = objective.evaluate(&probe)?;
        let numeric = (fx_plus - fx_minus) / (2.0 * self.epsilon);

        let sample = GradientSample {
            block,
            index,
            analytic,
            numeric,
        };
        debug!(
            block = ?sample.block,
            index = sample.index,
            analytic = sample.analytic,
            numeric = sample.numeric,
            "gradient probe"
        );
        Ok(sample)
    }

    pub fn run(
        &self,
        objective: &mut PseudoLikelihood,
        x: &Array1<f64>,
        rng: &mut impl Rng,
        samples: usize,
    ) -> Result<Vec<GradientSample>, EngineError> {
        (0..samples)
            .map(|_| self.sample(objective, x, rng))
            .collect()
    }
}
