use thiserror::Error;

use crate::core::alignment::AlignmentError;
use crate::core::io::record::RecordError;
use crate::core::io::report::ReportError;
use crate::core::potentials::layout::LayoutError;
use crate::core::regularization::RegularizationError;
use crate::core::triplets::TripletError;

use super::config::ConfigError;
use super::selection::SelectionError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Alignment error: {source}")]
    Alignment {
        #[from]
        source: AlignmentError,
    },

    #[error("Parameter layout error: {source}")]
    Layout {
        #[from]
        source: LayoutError,
    },

    #[error("Triplet descriptor error: {source}")]
    Triplet {
        #[from]
        source: TripletError,
    },

    #[error("Regularization error: {source}")]
    Regularization {
        #[from]
        source: RegularizationError,
    },

    #[error("Configuration error: {source}")]
    Config {
        #[from]
        source: ConfigError,
    },

    #[error("Triplet selection error: {source}")]
    Selection {
        #[from]
        source: SelectionError,
    },

    #[error("Result record error: {source}")]
    Record {
        #[from]
        source: RecordError,
    },

    #[error("Report error: {source}")]
    Report {
        #[from]
        source: ReportError,
    },

    #[error("Frequency tensor has shape {actual:?}, expected {expected:?}")]
    FrequencyShape {
        expected: Vec<usize>,
        actual: Vec<usize>,
    },

    #[error("Record covers {record} columns but the alignment has {alignment}")]
    ColumnMismatch { record: usize, alignment: usize },

    #[error("Failed to build compute thread pool: {message}")]
    ThreadPool { message: String },
}
