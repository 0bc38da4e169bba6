//! # Engine Module
//!
//! This module implements the pseudo-likelihood fitting engine, providing the
//! computational framework for estimating Markov random field potentials from
//! weighted multiple sequence alignments.
//!
//! ## Overview
//!
//! The engine module turns an alignment plus a (possibly empty) triplet
//! descriptor set into a smooth objective that numerical optimizers can drive.
//! It evaluates the negative regularized pseudo-log-likelihood and its exact
//! gradient, seeds the gradient with precomputed empirical counts, and ranks
//! candidate column triples from converged pairwise couplings for staged
//! refinement runs.
//!
//! ## Architecture
//!
//! The module is organized into specialized submodules that handle different
//! aspects of the fitting process:
//!
//! - **Configuration** ([`config`]) - Selection strategies, regularization profiles, and settings
//! - **Empirical Counts** ([`empirical`]) - Weighted count offsets subtracted from model expectations
//! - **Evaluation Kernel** ([`kernel`]) - Per-sequence conditional likelihood and gradient accumulation
//! - **Objective Assembly** ([`objective`]) - Regularized value/gradient evaluation and result packaging
//! - **Gradient Verification** ([`gradcheck`]) - Spot checks of analytic against numeric derivatives
//! - **Triplet Selection** ([`selection`]) - Bounded top-N ranking of candidate column triples
//! - **Error Handling** ([`error`]) - Engine-specific error types and error propagation
//!
//! ## Key Capabilities
//!
//! - **Exact gradients** matching the objective value to machine precision
//! - **Parallel computation** across alignment sequences and scan partitions
//! - **Two triplet parameterizations** (scalar per assignment, full 21^3 blocks)
//! - **Warm starting** from previously fitted pairwise potential records
//! - **Reproducible randomized selection** driven by caller-supplied generators
//! - **Comprehensive error handling** with detailed diagnostic information

pub mod config;
pub mod empirical;
pub mod error;
pub mod gradcheck;
pub mod kernel;
pub mod objective;
pub mod selection;
