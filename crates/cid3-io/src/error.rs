//! I/O error types for cid3-io.

use std::path::PathBuf;

use cid3_tree::TreeError;

/// Errors from reading names/data/cases files and writing outputs.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    /// Returned when an input file does not exist or is unreadable.
    #[error("file not found: {path}")]
    FileNotFound {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when a names file declares no attributes.
    #[error("no attributes declared in {path}")]
    NoAttributes {
        /// Path to the names file.
        path: PathBuf,
    },

    /// Returned when the CSV parser encounters a malformed record.
    #[error("CSV parse error in {path} at line {line}")]
    CsvParse {
        /// Path to the data file.
        path: PathBuf,
        /// One-based line in the file.
        line: u64,
        /// Underlying CSV error.
        source: csv::Error,
    },

    /// Returned when the parsed records do not line up with the input lines.
    #[error("{path}: {lines} record lines parsed into {records} records")]
    RecordLines {
        /// Path to the data file.
        path: PathBuf,
        /// Record lines kept from the file.
        lines: usize,
        /// Records produced by the parser.
        records: usize,
    },

    /// Returned when a record does not carry one field per attribute.
    #[error("{path}:{line}: record has {got} fields, expected {expected}")]
    FieldCount {
        /// Path to the data file.
        path: PathBuf,
        /// One-based line in the file.
        line: u64,
        /// Number of fields the schema requires.
        expected: usize,
        /// Number of fields found.
        got: usize,
    },

    /// Returned when a record cannot be encoded or classified.
    #[error("{path}:{line}: invalid record")]
    Record {
        /// Path to the data file.
        path: PathBuf,
        /// One-based line in the file.
        line: u64,
        /// Underlying encoding error.
        source: TreeError,
    },

    /// Returned when a data file holds no records.
    #[error("empty dataset (no records) in {path}")]
    EmptyDataset {
        /// Path to the data file.
        path: PathBuf,
    },

    /// Returned when JSON encoding or decoding fails.
    #[error("invalid JSON in {path}")]
    Json {
        /// Path to the JSON file.
        path: PathBuf,
        /// Underlying serde_json error.
        source: serde_json::Error,
    },

    /// Returned when an output file cannot be written.
    #[error("cannot write file {path}")]
    WriteFile {
        /// Path that was attempted.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
