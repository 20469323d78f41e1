use std::path::PathBuf;

/// Errors from tree induction, evaluation, and model persistence.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// Returned when the forest is asked to grow zero trees.
    #[error("n_trees must be at least 1, got {n_trees}")]
    InvalidTreeCount {
        /// The invalid tree count.
        n_trees: usize,
    },

    /// Returned when training starts with no rows.
    #[error("training dataset has zero rows")]
    EmptyDataset,

    /// Returned when a schema has no attributes besides the class.
    #[error("schema declares no attributes besides the class")]
    NoAttributes,

    /// Returned when there are fewer rows than cross-validation folds.
    #[error("cross-validation needs at least {n_folds} rows, got {n_rows}")]
    TooFewRowsForFolds {
        /// Number of rows available.
        n_rows: usize,
        /// Number of folds requested.
        n_folds: usize,
    },

    /// Returned when a record does not carry one field per expected attribute.
    #[error("record has {got} fields, expected {expected}")]
    FieldCount {
        /// Number of fields the schema requires.
        expected: usize,
        /// Number of fields found in the record.
        got: usize,
    },

    /// Returned when a continuous field is neither a number nor a missing marker.
    #[error("attribute \"{attribute}\" expects a number, got \"{raw}\"")]
    InvalidNumber {
        /// Name of the continuous attribute.
        attribute: String,
        /// The raw text that failed to parse.
        raw: String,
    },

    /// Returned when a criterion name is not one of certainty, entropy, or gini.
    #[error("unknown criterion \"{name}\" (expected c, e, or g)")]
    UnknownCriterion {
        /// The unrecognized name.
        name: String,
    },

    /// Returned when a class label was never seen during training.
    #[error("unknown class code {code}")]
    UnknownClass {
        /// The class code with no decoded value.
        code: usize,
    },

    /// Returned when model serialization fails.
    #[error("failed to serialize model")]
    SerializeModel {
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when zstd compression of the serialized model fails.
    #[error("failed to compress model")]
    CompressModel {
        /// The underlying I/O error from the encoder.
        source: std::io::Error,
    },

    /// Returned when writing the model file fails.
    #[error("failed to write model to {path}")]
    WriteModel {
        /// Path to the file that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when reading the model file fails.
    #[error("failed to read model from {path}")]
    ReadModel {
        /// Path to the file that could not be read.
        path: PathBuf,
        /// The underlying I/O error.
        source: std::io::Error,
    },

    /// Returned when the model file is not a valid zstd frame.
    #[error("failed to decompress model from {path}")]
    DecompressModel {
        /// Path to the corrupt model file.
        path: PathBuf,
        /// The underlying I/O error from the decoder.
        source: std::io::Error,
    },

    /// Returned when model deserialization fails.
    #[error("failed to deserialize model from {path}")]
    DeserializeModel {
        /// Path to the model file that could not be deserialized.
        path: PathBuf,
        /// The underlying bincode error.
        source: Box<bincode::ErrorKind>,
    },

    /// Returned when loading a model with an incompatible format version.
    #[error("incompatible model version in {path}: expected {expected}, found {found}")]
    IncompatibleModelVersion {
        /// The model format version this build expects.
        expected: u32,
        /// The model format version found in the file.
        found: u32,
        /// Path to the model file with the incompatible version.
        path: PathBuf,
    },
}
