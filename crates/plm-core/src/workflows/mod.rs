//! # Workflows Module
//!
//! This module provides the high-level entry points that orchestrate complete
//! fitting-support procedures on top of the engine layer.
//!
//! ## Overview
//!
//! Workflows are the top-level API for users of the crate. They wire engine
//! components together, validate configuration, and report progress through
//! structured logging, so callers get a single function per procedure instead
//! of assembling kernels, layouts, and selectors by hand.
//!
//! ## Architecture
//!
//! The module is organized around specific procedures:
//!
//! - **Triplet Search** ([`select`]) - Ranks candidate column triples from a
//!   fitted pairwise coupling record and freezes winners into descriptor sets
//!   that seed a follow-up triplet-aware fit.
//!
//! ## Key Capabilities
//!
//! - **Strategy dispatch** over random, per-triple, and per-assignment ranking
//! - **Deterministic replay** through caller-supplied random generators
//! - **Report post-processing** including 3-index to 6-index expansion
//! - **Error handling** with comprehensive diagnostic information

pub mod select;
