//! # plmfit Core Library
//!
//! A library for fitting Markov random field potentials to weighted protein
//! multiple sequence alignments by regularized pseudo-likelihood maximization,
//! with staged selection of third-order coupling candidates.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a
//! clear separation of concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models
//!   (`Alignment`, `TripletSet`), pure mathematical representations of the
//!   model (`potentials`, `regularization`, counting kernels), and I/O
//!   utilities for fitted records and triplet reports.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer carries the fitting
//!   machinery: the pseudo-likelihood evaluation kernel, the objective that an
//!   outer optimizer drives, empirical count offsets, the finite-difference
//!   gradient checker, and the bounded top-N triplet selector.
//!
//! - **[`workflows`]: The Public API.** This is the highest-level, user-facing
//!   layer. It ties the `engine` and `core` together to execute complete
//!   procedures, such as ranking triplet candidates from a converged pairwise
//!   fit. It provides a simple and powerful entry point for end-users of the
//!   library.

pub mod core;
pub mod engine;
pub mod workflows;
