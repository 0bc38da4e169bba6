use ndarray::{Array1, Array2, Array4, s};
use tracing::info;

use crate::core::alignment::Alignment;
use crate::core::alphabet::{N_ALPHA, N_AMINO};
use crate::core::counts;
use crate::core::io::record::{PotentialRecord, TripletResults};
use crate::core::potentials::layout::{
    ParameterLayout, pair_dense_to_packed, pair_packed_to_dense,
};
use crate::core::potentials::structured::{Potentials, TripletValues};
use crate::core::regularization::{L2, RegularizationError};
use crate::core::triplets::{TripletKind, TripletSet};

use super::empirical::counts_offset;
use super::error::EngineError;
use super::kernel::{PllKernel, SitewiseKernel};

/// Regularized pseudo-likelihood objective over a weighted alignment.
///
/// Owns the alignment, the frozen triplet set, the regularizer, and the
/// cached empirical-counts offset; `evaluate` produces the (value, gradient)
/// pair consumed by an outer gradient-based optimizer, reusing one internal
/// gradient buffer that is fully overwritten per call.
pub struct PseudoLikelihood {
    msa: Alignment,
    triplets: TripletSet,
    regularization: L2,
    layout: ParameterLayout,
    kernel: Box<dyn PllKernel>,
    g_init: Array1<f64>,
    grad: Array1<f64>,
}

impl PseudoLikelihood {
    /// Builds the objective from pre-computed empirical frequencies.
    ///
    /// Fails when the triplet descriptors do not fit the alignment, when a
    /// non-empty triplet set lacks a triplet regularization weight, or when
    /// the centering matrix does not match the alignment's columns.
    pub fn new(
        msa: Alignment,
        single_freq: &Array2<f64>,
        pair_freq: &Array4<f64>,
        regularization: L2,
        triplets: TripletSet,
    ) -> Result<Self, EngineError> {
        let ncol = msa.ncol();
        triplets.validate(ncol)?;
        if !triplets.is_empty() && regularization.lambda_triplet.is_none() {
            return Err(RegularizationError::MissingTripletWeight.into());
        }
        if let Some(center) = regularization.center() {
            if center.dim() != (ncol, N_ALPHA) {
                return Err(RegularizationError::CenterShape {
                    expected: vec![ncol, N_ALPHA],
                    actual: center.shape().to_vec(),
                }
                .into());
            }
        }

        let layout = ParameterLayout::for_set(ncol, &triplets);
        let g_init = counts_offset(&msa, single_freq, pair_freq, &triplets, &layout)?;
        let grad = Array1::zeros(layout.nvar());
        info!(
            ncol,
            nvar = layout.nvar(),
            neff = msa.neff(),
            ntriplets = triplets.len(),
            "initialized pseudo-likelihood objective"
        );
        Ok(Self {
            msa,
            triplets,
            regularization,
            layout,
            kernel: Box::new(SitewiseKernel::new()),
            g_init,
            grad,
        })
    }

    /// Convenience constructor computing the empirical frequencies itself.
    pub fn from_alignment(
        msa: Alignment,
        regularization: L2,
        triplets: TripletSet,
    ) -> Result<Self, EngineError> {
        let single_freq = counts::single_frequencies(&msa);
        let pair_freq = counts::pair_frequencies(&msa);
        Self::new(msa, &single_freq, &pair_freq, regularization, triplets)
    }

    pub fn with_kernel(mut self, kernel: Box<dyn PllKernel>) -> Self {
        self.kernel = kernel;
        self
    }

    pub fn layout(&self) -> &ParameterLayout {
        &self.layout
    }

    pub fn alignment(&self) -> &Alignment {
        &self.msa
    }

    pub fn triplets(&self) -> &TripletSet {
        &self.triplets
    }

    /// Evaluates value and gradient at `x`.
    ///
    /// The gradient is `expectation - counts + regularization`; the returned
    /// borrow points into the internal buffer and is valid until the next
    /// call. Non-finite values propagate unchanged.
    pub fn evaluate(&mut self, x: &Array1<f64>) -> Result<(f64, &Array1<f64>), EngineError> {
        let raw = self
            .kernel
            .evaluate(x, &mut self.grad, &self.msa, &self.triplets, &self.layout)?;
        self.grad -= &self.g_init;

        let views = self.layout.split(x)?;
        let (penalty, reg_grad) = self.regularization.apply(&views)?;
        self.grad += &self.layout.pack(&reg_grad)?;

        Ok((raw + penalty, &self.grad))
    }

    /// Packages optimized parameters into a portable result record.
    ///
    /// The single block drops its gap column, the pair block expands to the
    /// dense symmetric form, and a non-empty triplet set attaches its fitted
    /// values in descriptor order.
    pub fn finalize(&self, x: &Array1<f64>) -> Result<PotentialRecord, EngineError> {
        let mut p = self.layout.unpack(x)?;
        p.project_gaps();

        let single = p.single.slice(s![.., ..N_AMINO]).to_owned();
        let pair = pair_packed_to_dense(&p.pair, self.layout.ncol())?;
        let mut record = PotentialRecord::new(single, pair)?
            .with_metadata("neff", self.msa.neff().to_string())
            .with_metadata("ntriplets", self.triplets.len().to_string());

        if !self.triplets.is_empty() {
            let values = match &p.triplet {
                TripletValues::Scalar(v) => v.clone(),
                TripletValues::AaFull(v) => Array1::from_iter(v.iter().copied()),
            };
            record = record.with_triplets(TripletResults::new(self.triplets.clone(), values)?);
        }
        Ok(record)
    }

    /// Starting vector: zeros, or the regularizer's centering singles.
    pub fn initial_point(&self) -> Array1<f64> {
        let mut x = Array1::zeros(self.layout.nvar());
        if let Some(center) = self.regularization.center() {
            for i in 0..self.layout.ncol() {
                for a in 0..N_AMINO {
                    x[self.layout.single_index(i, a)] = center[[i, a]];
                }
            }
        }
        x
    }

    /// Starting vector from a previously fitted record.
    ///
    /// Single and pair potentials are taken from the record; triplet values
    /// start at zero, which is how a pairwise fit seeds a triplet fit. Fails
    /// when the record covers a different number of columns.
    pub fn warm_start(&self, record: &PotentialRecord) -> Result<Array1<f64>, EngineError> {
        let ncol = self.layout.ncol();
        if record.ncol != ncol {
            return Err(EngineError::ColumnMismatch {
                record: record.ncol,
                alignment: ncol,
            });
        }
        let mut single = Array2::zeros((ncol, N_ALPHA));
        single.slice_mut(s![.., ..N_AMINO]).assign(&record.single);
        let pair = pair_dense_to_packed(&record.pair)?;
        let triplet = match self.layout.kind() {
            TripletKind::Scalar => TripletValues::Scalar(Array1::zeros(self.layout.ntriplets())),
            TripletKind::AaFull => TripletValues::AaFull(ndarray::Array4::zeros((
                self.layout.ntriplets(),
                N_ALPHA,
                N_ALPHA,
                N_ALPHA,
            ))),
        };
        let p = Potentials {
            single,
            pair,
            triplet,
        };
        Ok(self.layout.pack(&p)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::triplets::{ColumnTriplet, ScalarTriplet};
    use ndarray::array;

    fn create_test_objective() -> PseudoLikelihood {
        let msa = Alignment::new(
            array![
                [0u8, 1, 2, 3, 4, 5, 6, 7, 8, 9],
                [1, 2, 3, 4, 5, 6, 7, 8, 9, 10],
                [0, 1, 2, 3, 4, 5, 6, 7, 8, 9],
            ],
            array![1.0, 1.0, 1.0],
        )
        .unwrap();
        PseudoLikelihood::from_alignment(msa, L2::new(0.0, 0.0), TripletSet::empty()).unwrap()
    }

    #[test]
    fn zero_point_matches_uniform_model_closed_form() {
        let mut obj = create_test_objective();
        let layout = *obj.layout();
        let msa_counts = counts::single_counts(obj.alignment());
        let neff = obj.alignment().neff();

        let x = Array1::zeros(layout.nvar());
        let (fx, grad) = obj.evaluate(&x).unwrap();

        // Gap-free data: every site of every sequence contributes ln 20.
        assert!((fx - neff * 10.0 * 20.0_f64.ln()).abs() < 1e-9);

        // Gradient is the uniform expectation minus the empirical counts.
        for i in 0..10 {
            for a in 0..N_AMINO {
                let expected = neff / 20.0 - msa_counts[[i, a]];
                assert!((grad[layout.single_index(i, a)] - expected).abs() < 1e-9);
            }
        }
    }

    #[test]
    fn regularization_contributes_value_and_gradient() {
        let msa = Alignment::new(array![[0u8, 1, 2], [2, 1, 0]], array![1.0, 1.0]).unwrap();
        let mut plain =
            PseudoLikelihood::from_alignment(msa.clone(), L2::new(0.0, 0.0), TripletSet::empty())
                .unwrap();
        let mut ridged =
            PseudoLikelihood::from_alignment(msa, L2::new(0.5, 0.0), TripletSet::empty()).unwrap();

        let layout = *plain.layout();
        let mut x = Array1::zeros(layout.nvar());
        x[layout.single_index(1, 3)] = 2.0;

        let (fx_plain, grad_plain) = plain.evaluate(&x).unwrap();
        let g_plain = grad_plain[layout.single_index(1, 3)];
        let (fx_ridged, grad_ridged) = ridged.evaluate(&x).unwrap();

        assert!((fx_ridged - fx_plain - 0.5 * 4.0).abs() < 1e-9);
        let g_ridged = grad_ridged[layout.single_index(1, 3)];
        assert!((g_ridged - g_plain - 2.0 * 0.5 * 2.0).abs() < 1e-9);
    }

    #[test]
    fn construction_requires_triplet_weight_for_triplet_sets() {
        let msa = Alignment::new(array![[0u8, 1, 2], [2, 1, 0]], array![1.0, 1.0]).unwrap();
        let triplets = TripletSet::Scalar(vec![ScalarTriplet::new(
            ColumnTriplet::new(0, 1, 2),
            [0, 1, 2],
        )]);

        let result = PseudoLikelihood::from_alignment(msa, L2::new(0.1, 0.1), triplets);
        assert!(matches!(
            result,
            Err(EngineError::Regularization {
                source: RegularizationError::MissingTripletWeight
            })
        ));
    }

    #[test]
    fn construction_rejects_out_of_range_triplet_columns() {
        let msa = Alignment::new(array![[0u8, 1, 2], [2, 1, 0]], array![1.0, 1.0]).unwrap();
        let triplets = TripletSet::AaFull(vec![ColumnTriplet::new(0, 1, 5)]);

        let result =
            PseudoLikelihood::from_alignment(msa, L2::new(0.1, 0.1).with_triplet(0.1), triplets);
        assert!(matches!(result, Err(EngineError::Triplet { .. })));
    }

    #[test]
    fn evaluate_rejects_wrong_vector_length() {
        let mut obj = create_test_objective();
        let x = Array1::zeros(obj.layout().nvar() + 3);
        assert!(matches!(
            obj.evaluate(&x),
            Err(EngineError::Layout { .. })
        ));
    }

    #[test]
    fn finalize_produces_symmetric_dense_record() {
        let msa = Alignment::new(array![[0u8, 1, 2], [2, 1, 0]], array![1.0, 1.0]).unwrap();
        let obj =
            PseudoLikelihood::from_alignment(msa, L2::new(0.1, 0.1), TripletSet::empty()).unwrap();
        let layout = *obj.layout();

        let mut x = Array1::zeros(layout.nvar());
        x[layout.single_index(0, 4)] = 1.5;
        let blk = layout.pair_block(0, 2);
        x[layout.pair_index(blk, 3, 7)] = -0.25;

        let record = obj.finalize(&x).unwrap();
        assert_eq!(record.ncol, 3);
        assert_eq!(record.single.dim(), (3, 20));
        assert_eq!(record.single[[0, 4]], 1.5);
        assert_eq!(record.pair[[0, 2, 3, 7]], -0.25);
        assert_eq!(record.pair[[2, 0, 7, 3]], -0.25);
        assert!(record.extra.is_none());
        assert!(record.metadata.contains_key("neff"));
    }

    #[test]
    fn finalize_attaches_triplet_values_in_descriptor_order() {
        let msa = Alignment::new(array![[0u8, 1, 2], [2, 1, 0]], array![1.0, 1.0]).unwrap();
        let triplets = TripletSet::Scalar(vec![
            ScalarTriplet::new(ColumnTriplet::new(0, 1, 2), [0, 1, 2]),
            ScalarTriplet::new(ColumnTriplet::new(0, 1, 2), [2, 1, 0]),
        ]);
        let obj = PseudoLikelihood::from_alignment(
            msa,
            L2::new(0.1, 0.1).with_triplet(0.1),
            triplets,
        )
        .unwrap();
        let layout = *obj.layout();

        let mut x = Array1::zeros(layout.nvar());
        x[layout.triplet_scalar_index(0)] = 0.5;
        x[layout.triplet_scalar_index(1)] = -0.5;

        let record = obj.finalize(&x).unwrap();
        let extra = record.extra.unwrap();
        assert_eq!(extra.values, array![0.5, -0.5]);
    }

    #[test]
    fn warm_start_round_trips_through_finalize() {
        let msa = Alignment::new(array![[0u8, 1, 2], [2, 1, 0]], array![1.0, 1.0]).unwrap();
        let obj =
            PseudoLikelihood::from_alignment(msa, L2::new(0.1, 0.1), TripletSet::empty()).unwrap();
        let layout = *obj.layout();

        // A vector produced by pack already has zero gap slots.
        let mut p = layout.zeros();
        p.single[[1, 2]] = 0.75;
        p.pair[[layout.pair_block(1, 2), 4, 6]] = -1.25;
        let x = layout.pack(&p).unwrap();

        let restarted = obj.warm_start(&obj.finalize(&x).unwrap()).unwrap();
        assert_eq!(restarted.len(), x.len());
        for (a, b) in restarted.iter().zip(x.iter()) {
            assert!((a - b).abs() < 1e-12);
        }
    }

    #[test]
    fn warm_start_rejects_column_mismatch() {
        let msa = Alignment::new(array![[0u8, 1, 2], [2, 1, 0]], array![1.0, 1.0]).unwrap();
        let obj =
            PseudoLikelihood::from_alignment(msa, L2::new(0.1, 0.1), TripletSet::empty()).unwrap();

        let single = Array2::zeros((4, N_AMINO));
        let pair = Array4::zeros((4, 4, N_ALPHA, N_ALPHA));
        let record = PotentialRecord::new(single, pair).unwrap();

        assert!(matches!(
            obj.warm_start(&record),
            Err(EngineError::ColumnMismatch {
                record: 4,
                alignment: 3
            })
        ));
    }

    #[test]
    fn initial_point_uses_centering_singles() {
        let msa = Alignment::new(array![[0u8, 1, 2], [2, 1, 0]], array![1.0, 1.0]).unwrap();
        let mut center = Array2::zeros((3, N_ALPHA));
        center[[0, 0]] = 0.5;
        center[[2, 19]] = -0.5;
        let obj = PseudoLikelihood::from_alignment(
            msa,
            L2::new(0.1, 0.1).with_center(center),
            TripletSet::empty(),
        )
        .unwrap();
        let layout = *obj.layout();

        let x = obj.initial_point();
        assert_eq!(x[layout.single_index(0, 0)], 0.5);
        assert_eq!(x[layout.single_index(2, 19)], -0.5);
        assert_eq!(x[layout.single_index(1, 5)], 0.0);
        let blk = layout.pair_block(0, 1);
        assert_eq!(x[layout.pair_index(blk, 0, 0)], 0.0);
    }
}
