use rand::Rng;
use tracing::{info, instrument};

use crate::core::io::record::PotentialRecord;
use crate::core::io::report::TripletReport;
use crate::core::triplets::{TripletKind, TripletSet};
use crate::engine::config::SelectionConfig;
use crate::engine::error::EngineError;
use crate::engine::selection;

/// Ranks candidate column triples from the pair couplings of a fitted record.
///
/// Scores come from `record.pair` under the configured transform and
/// strategy. When `config.expand` is set, 3-index winners are exploded into
/// their 8000 amino-acid assignment rows before the report is returned.
#[instrument(skip_all, name = "triplet_search_workflow")]
pub fn run(
    record: &PotentialRecord,
    config: &SelectionConfig,
    rng: &mut impl Rng,
) -> Result<TripletReport, EngineError> {
    info!(
        ncol = record.ncol,
        strategy = ?config.strategy,
        count = config.count,
        min_separation = config.min_separation,
        "Starting triplet search over fitted pair couplings."
    );

    let ranked = selection::select(&record.pair, config, rng)?;
    let report = if config.expand { ranked.expand() } else { ranked };

    info!(rows = report.len(), "Triplet search complete.");
    Ok(report)
}

/// Runs the search and freezes the winners into a descriptor set that can
/// seed a triplet-aware objective on the same alignment.
pub fn propose_triplet_set(
    record: &PotentialRecord,
    config: &SelectionConfig,
    kind: TripletKind,
    rng: &mut impl Rng,
) -> Result<TripletSet, EngineError> {
    let report = run(record, config, rng)?;
    Ok(selection::triplet_set_from_report(&report, kind)?)
}
