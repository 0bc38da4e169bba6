//! # Core Module
//!
//! This module provides the fundamental building blocks for fitting Markov
//! random field models to multiple sequence alignments in plmfit, serving as
//! the computational core of the library.
//!
//! ## Overview
//!
//! The core module implements the essential data structures and numerical
//! primitives required for pseudo-likelihood training of sequence models with
//! single-site, pairwise, and higher-order coupling terms. It provides a
//! complete framework for representing alignments, accumulating weighted
//! statistics, and mapping between flat optimizer vectors and structured
//! potential tensors.
//!
//! ## Architecture
//!
//! The module is organized into specialized submodules that handle different
//! aspects of the model:
//!
//! - **Sequence Representation** ([`alphabet`], [`alignment`]) - The categorical
//!   alphabet and validated, weighted alignment matrices
//! - **Weighted Statistics** ([`counts`]) - Single, pairwise, and triplet count
//!   accumulation over alignment columns
//! - **Coupling Descriptors** ([`triplets`]) - Column and assignment triplet
//!   descriptors with their validation rules
//! - **Parameter Layout** ([`potentials`]) - Structured potential tensors and
//!   the flat vector layout shared with the optimizer
//! - **Regularization** ([`regularization`]) - Quadratic penalties with optional
//!   centering of the single-site block
//! - **File I/O** ([`io`]) - Result records and the tab-separated triplet
//!   report format
//!
//! ## Key Capabilities
//!
//! - **Validated alignment construction** with per-sequence weights
//! - **Weighted marginal statistics** over arbitrary column combinations
//! - **Bidirectional flat/structured parameter mapping** with gap projection
//! - **Configurable quadratic regularization** for all parameter blocks
//! - **Portable result interchange** via records and triplet reports
//!
//! ## Scientific Foundation
//!
//! The core module implements primitives used throughout statistical sequence
//! analysis:
//!
//! - **Markov random fields** over aligned categorical sequences
//! - **Sequence reweighting** to correct for sampling bias in alignments
//! - **Pseudo-likelihood statistics** collected per site and per column pair
//! - **Higher-order couplings** restricted to selected column triplets

pub mod alignment;
pub mod alphabet;
pub mod counts;
pub mod io;
pub mod potentials;
pub mod regularization;
pub mod triplets;
