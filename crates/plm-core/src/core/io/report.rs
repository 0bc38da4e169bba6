use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Write};
use std::path::Path;

use itertools::iproduct;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::core::alphabet::N_AMINO;

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("Report write failed: {source}")]
    Write {
        #[from]
        source: std::io::Error,
    },

    #[error("Report parsing failed: {source}")]
    Csv {
        #[from]
        source: csv::Error,
    },

    #[error("Row {row} has {fields} fields, expected 4 (i j k score) or 7 (i j k a b c score)")]
    RowShape { row: usize, fields: usize },

    #[error("Report mixes 3-index and 6-index rows")]
    MixedRows,
}

/// One ranked column triple.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TripletRow {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub score: f64,
}

/// One ranked column triple bound to an amino-acid assignment.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssignmentRow {
    pub i: usize,
    pub j: usize,
    pub k: usize,
    pub a: u8,
    pub b: u8,
    pub c: u8,
    pub score: f64,
}

/// A ranked triplet report: the text interchange format between the
/// selection machinery and downstream tooling.
///
/// The on-disk form is a `# <count>` header followed by one tab-separated
/// row per record, coordinates first and the score last in scientific
/// notation with 8 significant digits. Rows carry either 3 or 6 coordinate
/// fields; a single report never mixes the two widths.
#[derive(Debug, Clone, PartialEq)]
pub enum TripletReport {
    Triplets(Vec<TripletRow>),
    Assignments(Vec<AssignmentRow>),
}

impl TripletReport {
    pub fn len(&self) -> usize {
        match self {
            TripletReport::Triplets(rows) => rows.len(),
            TripletReport::Assignments(rows) => rows.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn scores(&self) -> Vec<f64> {
        match self {
            TripletReport::Triplets(rows) => rows.iter().map(|r| r.score).collect(),
            TripletReport::Assignments(rows) => rows.iter().map(|r| r.score).collect(),
        }
    }

    /// Explodes every 3-index row into the 8000 non-gap assignment rows
    /// sharing its score. Assignment reports pass through unchanged.
    pub fn expand(&self) -> TripletReport {
        match self {
            TripletReport::Assignments(rows) => TripletReport::Assignments(rows.clone()),
            TripletReport::Triplets(rows) => TripletReport::Assignments(
                rows.iter()
                    .flat_map(|r| {
                        iproduct!(0..N_AMINO, 0..N_AMINO, 0..N_AMINO).map(move |(a, b, c)| {
                            AssignmentRow {
                                i: r.i,
                                j: r.j,
                                k: r.k,
                                a: a as u8,
                                b: b as u8,
                                c: c as u8,
                                score: r.score,
                            }
                        })
                    })
                    .collect(),
            ),
        }
    }

    /// Writes the report in its text form.
    ///
    /// # Errors
    ///
    /// Returns an error when the underlying writer fails.
    pub fn write_to(&self, writer: &mut impl Write) -> Result<(), ReportError> {
        writeln!(writer, "# {}", self.len())?;
        match self {
            TripletReport::Triplets(rows) => {
                for r in rows {
                    writeln!(writer, "{}\t{}\t{}\t{:.7e}", r.i, r.j, r.k, r.score)?;
                }
            }
            TripletReport::Assignments(rows) => {
                for r in rows {
                    writeln!(
                        writer,
                        "{}\t{}\t{}\t{}\t{}\t{}\t{:.7e}",
                        r.i, r.j, r.k, r.a, r.b, r.c, r.score
                    )?;
                }
            }
        }
        Ok(())
    }

    /// Parses a report, auto-detecting the row width and skipping `#`
    /// comment lines (including the count header).
    ///
    /// # Errors
    ///
    /// Returns an error for unreadable input, malformed numbers, rows whose
    /// field count is neither 4 nor 7, or a mix of both widths.
    pub fn read_from(reader: impl Read) -> Result<Self, ReportError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .delimiter(b'\t')
            .comment(Some(b'#'))
            .has_headers(false)
            .flexible(true)
            .from_reader(reader);

        let mut triplets = Vec::new();
        let mut assignments = Vec::new();
        for (idx, record) in csv_reader.records().enumerate() {
            let record = record?;
            match record.len() {
                4 => triplets.push(record.deserialize::<TripletRow>(None)?),
                7 => assignments.push(record.deserialize::<AssignmentRow>(None)?),
                fields => {
                    return Err(ReportError::RowShape {
                        row: idx + 1,
                        fields,
                    });
                }
            }
        }
        match (triplets.is_empty(), assignments.is_empty()) {
            (false, false) => Err(ReportError::MixedRows),
            (_, true) => Ok(TripletReport::Triplets(triplets)),
            (true, false) => Ok(TripletReport::Assignments(assignments)),
        }
    }

    pub fn write_to_path<P: AsRef<Path>>(&self, path: P) -> Result<(), ReportError> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|e| ReportError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        let mut writer = BufWriter::new(file);
        self.write_to(&mut writer)
    }

    pub fn read_from_path<P: AsRef<Path>>(path: P) -> Result<Self, ReportError> {
        let path = path.as_ref();
        let file = File::open(path).map_err(|e| ReportError::Io {
            path: path.to_string_lossy().to_string(),
            source: e,
        })?;
        Self::read_from(BufReader::new(file))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn create_test_rows() -> Vec<TripletRow> {
        vec![
            TripletRow {
                i: 0,
                j: 2,
                k: 4,
                score: 12.25,
            },
            TripletRow {
                i: 1,
                j: 3,
                k: 5,
                score: 0.0012345678,
            },
        ]
    }

    #[test]
    fn write_produces_the_tab_separated_form() {
        let report = TripletReport::Triplets(create_test_rows());
        let mut buf = Vec::new();
        report.write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "# 2\n0\t2\t4\t1.2250000e1\n1\t3\t5\t1.2345678e-3\n");
    }

    #[test]
    fn write_includes_assignment_columns() {
        let report = TripletReport::Assignments(vec![AssignmentRow {
            i: 3,
            j: 9,
            k: 14,
            a: 0,
            b: 19,
            c: 7,
            score: -1.5,
        }]);
        let mut buf = Vec::new();
        report.write_to(&mut buf).unwrap();
        let text = String::from_utf8(buf).unwrap();
        assert_eq!(text, "# 1\n3\t9\t14\t0\t19\t7\t-1.5000000e0\n");
    }

    #[test]
    fn read_skips_comments_and_detects_triplet_rows() {
        let text = "# 2\n0\t2\t4\t1.25e1\n1\t3\t5\t-2.0e0\n";
        let report = TripletReport::read_from(text.as_bytes()).unwrap();
        match report {
            TripletReport::Triplets(rows) => {
                assert_eq!(rows.len(), 2);
                assert_eq!(rows[0].i, 0);
                assert!((rows[0].score - 12.5).abs() < 1e-12);
                assert!((rows[1].score + 2.0).abs() < 1e-12);
            }
            TripletReport::Assignments(_) => panic!("expected 3-index rows"),
        }
    }

    #[test]
    fn read_detects_assignment_rows() {
        let text = "# 1\n0\t2\t4\t5\t6\t7\t1.0e0\n";
        let report = TripletReport::read_from(text.as_bytes()).unwrap();
        match report {
            TripletReport::Assignments(rows) => {
                assert_eq!(rows.len(), 1);
                assert_eq!((rows[0].a, rows[0].b, rows[0].c), (5, 6, 7));
            }
            TripletReport::Triplets(_) => panic!("expected 6-index rows"),
        }
    }

    #[test]
    fn read_rejects_other_row_widths() {
        let text = "0\t2\t4\t5\t1.0e0\n";
        match TripletReport::read_from(text.as_bytes()).unwrap_err() {
            ReportError::RowShape { row, fields } => {
                assert_eq!(row, 1);
                assert_eq!(fields, 5);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn read_rejects_mixed_row_widths() {
        let text = "0\t2\t4\t1.0e0\n0\t2\t4\t5\t6\t7\t1.0e0\n";
        assert!(matches!(
            TripletReport::read_from(text.as_bytes()).unwrap_err(),
            ReportError::MixedRows
        ));
    }

    #[test]
    fn empty_reports_round_trip() {
        let report = TripletReport::Triplets(Vec::new());
        let mut buf = Vec::new();
        report.write_to(&mut buf).unwrap();
        assert_eq!(String::from_utf8(buf.clone()).unwrap(), "# 0\n");
        let back = TripletReport::read_from(buf.as_slice()).unwrap();
        assert!(back.is_empty());
    }

    #[test]
    fn path_round_trip_preserves_rows() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("triplets.tsv");
        let report = TripletReport::Triplets(create_test_rows());
        report.write_to_path(&path).unwrap();
        let back = TripletReport::read_from_path(&path).unwrap();
        assert_eq!(back, report);
    }

    #[test]
    fn expand_explodes_each_triple_into_all_assignments() {
        let report = TripletReport::Triplets(vec![TripletRow {
            i: 0,
            j: 2,
            k: 4,
            score: 3.5,
        }]);
        match report.expand() {
            TripletReport::Assignments(rows) => {
                assert_eq!(rows.len(), 8000);
                assert_eq!((rows[0].a, rows[0].b, rows[0].c), (0, 0, 0));
                assert_eq!(
                    (rows[7999].a, rows[7999].b, rows[7999].c),
                    (19, 19, 19)
                );
                assert!(rows.iter().all(|r| (r.score - 3.5).abs() < 1e-12));
                assert!(rows.iter().all(|r| (r.i, r.j, r.k) == (0, 2, 4)));
            }
            TripletReport::Triplets(_) => panic!("expected expansion"),
        }
    }
}
