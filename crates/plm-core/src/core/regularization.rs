use ndarray::Array2;
use thiserror::Error;

use super::alphabet::{GAP, N_ALPHA};
use super::potentials::structured::{Potentials, PotentialsView, TripletValues, TripletValuesView};

#[derive(Debug, Error, PartialEq)]
pub enum RegularizationError {
    #[error("Centering matrix has shape {actual:?}, expected {expected:?}")]
    CenterShape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Triplet potentials are present but no triplet weight is configured")]
    MissingTripletWeight,
}

/// Quadratic penalty on every potential block.
///
/// The penalty is `λs·Σ(single − center)² + λp·Σpair² (+ λt·Σtriplet²)` and
/// the returned gradients are its exact derivatives, `2λ·(x − center)` for
/// singles and `2λ·x` elsewhere. The triplet term participates only when a
/// triplet block is present, and then its weight must be configured
/// explicitly. Centering is fixed at construction; its gap column is
/// projected to zero so the penalty never pulls gap slots off zero.
#[derive(Debug, Clone, PartialEq)]
pub struct L2 {
    pub lambda_single: f64,
    pub lambda_pair: f64,
    pub lambda_triplet: Option<f64>,
    center: Option<Array2<f64>>,
}

impl L2 {
    pub fn new(lambda_single: f64, lambda_pair: f64) -> Self {
        Self {
            lambda_single,
            lambda_pair,
            lambda_triplet: None,
            center: None,
        }
    }

    pub fn with_triplet(mut self, lambda_triplet: f64) -> Self {
        self.lambda_triplet = Some(lambda_triplet);
        self
    }

    pub fn with_center(mut self, mut center: Array2<f64>) -> Self {
        if center.ncols() == N_ALPHA {
            center.column_mut(GAP as usize).fill(0.0);
        }
        self.center = Some(center);
        self
    }

    pub fn center(&self) -> Option<&Array2<f64>> {
        self.center.as_ref()
    }

    /// Evaluates the penalty and its structured gradient at `x`.
    ///
    /// # Errors
    ///
    /// Fails when a configured centering matrix does not match the single
    /// block's shape, or when `x` carries triplet values but no
    /// `lambda_triplet` was configured.
    pub fn apply(&self, x: &PotentialsView<'_>) -> Result<(f64, Potentials), RegularizationError> {
        let mut penalty = 0.0;

        let single = match &self.center {
            Some(center) => {
                if center.dim() != x.single.dim() {
                    return Err(RegularizationError::CenterShape {
                        expected: x.single.shape().to_vec(),
                        actual: center.shape().to_vec(),
                    });
                }
                let diff = &x.single - center;
                penalty += self.lambda_single * diff.fold(0.0, |acc, &v| acc + v * v);
                diff * (2.0 * self.lambda_single)
            }
            None => {
                penalty += self.lambda_single * x.single.fold(0.0, |acc, &v| acc + v * v);
                x.single.mapv(|v| 2.0 * self.lambda_single * v)
            }
        };

        penalty += self.lambda_pair * x.pair.fold(0.0, |acc, &v| acc + v * v);
        let pair = x.pair.mapv(|v| 2.0 * self.lambda_pair * v);

        let triplet = if x.triplet.value_count() == 0 {
            x.triplet.to_owned()
        } else {
            let lt = self
                .lambda_triplet
                .ok_or(RegularizationError::MissingTripletWeight)?;
            match x.triplet {
                TripletValuesView::Scalar(v) => {
                    penalty += lt * v.fold(0.0, |acc, &u| acc + u * u);
                    TripletValues::Scalar(v.mapv(|u| 2.0 * lt * u))
                }
                TripletValuesView::AaFull(v) => {
                    penalty += lt * v.fold(0.0, |acc, &u| acc + u * u);
                    TripletValues::AaFull(v.mapv(|u| 2.0 * lt * u))
                }
            }
        };

        Ok((
            penalty,
            Potentials {
                single,
                pair,
                triplet,
            },
        ))
    }
}
