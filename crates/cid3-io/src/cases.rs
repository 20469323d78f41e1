//! Unlabeled cases: batch scoring and the scored output file.

use std::path::{Path, PathBuf};

use cid3_tree::Model;
use tracing::{info, instrument};

use crate::IoError;
use crate::data::read_records;

/// A cases line with the label the model assigned to it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ScoredCase {
    /// The input line as read.
    pub text: String,
    /// Predicted class label.
    pub label: String,
}

/// Reads a cases file (data format without the class column) and scores it.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::RecordLines`] | Parsed records do not match the input lines |
/// | [`IoError::Record`] | Wrong field count or unparseable number |
pub struct CasesReader {
    path: PathBuf,
}

impl CasesReader {
    /// Create a new reader for the given cases file.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Classify every case with `model`.
    ///
    /// Missing markers take the model's imputed values; unseen values are
    /// added to the model's symbol tables.
    #[instrument(skip(self, model), fields(path = %self.path.display()))]
    pub fn score(&self, model: &mut Model) -> Result<Vec<ScoredCase>, IoError> {
        let records = read_records(&self.path)?;
        let mut scored = Vec::with_capacity(records.len());
        for record in records {
            let label = model
                .classify_case(&record.field_refs())
                .map_err(|e| IoError::Record {
                    path: self.path.clone(),
                    line: record.line,
                    source: e,
                })?;
            scored.push(ScoredCase {
                text: record.text,
                label: label.to_string(),
            });
        }
        info!(n_cases = scored.len(), "cases scored");
        Ok(scored)
    }
}

/// Writes scored cases as `<line>,<label>`, one per line.
pub struct CasesWriter {
    path: PathBuf,
}

impl CasesWriter {
    /// Create a new writer targeting `path`.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Write all cases, replacing any existing file.
    ///
    /// # Errors
    ///
    /// Returns [`IoError::WriteFile`] if the file cannot be written.
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn write(&self, cases: &[ScoredCase]) -> Result<(), IoError> {
        let out: String = cases
            .iter()
            .map(|case| format!("{},{}\n", case.text, case.label))
            .collect();
        std::fs::write(&self.path, out).map_err(|e| IoError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;
        info!(n_cases = cases.len(), "scored cases written");
        Ok(())
    }

    /// Return the output path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use cid3_tree::{
        Attribute, AttributeKind, Classifier, Dataset, Partition, Schema, TreeConfig, TreeError,
    };
    use tempfile::{NamedTempFile, TempDir};

    fn model() -> Model {
        let schema = Schema::new(vec![
            Attribute::new("age", AttributeKind::Continuous),
            Attribute::new("color", AttributeKind::Discrete),
        ])
        .unwrap();
        let mut ds = Dataset::new(schema);
        for r in [["25", "red", "yes"], ["30", "blue", "no"], ["26", "red", "yes"]] {
            ds.push_record(&r, Partition::Train).unwrap();
        }
        let imputation = ds.impute();
        let tree = TreeConfig::new().fit(&ds, ds.train_rows()).unwrap();
        Model::new(ds, imputation, Classifier::Tree(tree))
    }

    fn write_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn cases_are_scored_and_written() {
        let f = write_file("// cases\n25,red\n35, blue\n?,?\n");
        let mut model = model();
        let scored = CasesReader::new(f.path()).score(&mut model).unwrap();
        let labels: Vec<&str> = scored.iter().map(|c| c.label.as_str()).collect();
        assert_eq!(labels, vec!["yes", "no", "yes"]);

        let dir = TempDir::new().unwrap();
        let out = dir.path().join("golf.tmp");
        CasesWriter::new(&out).write(&scored).unwrap();
        let written = std::fs::read_to_string(&out).unwrap();
        assert_eq!(written, "25,red,yes\n35, blue,no\n?,?,yes\n");
    }

    #[test]
    fn no_cases_writes_empty_file() {
        let dir = TempDir::new().unwrap();
        let out = dir.path().join("empty.tmp");
        let writer = CasesWriter::new(&out);
        writer.write(&[]).unwrap();
        assert_eq!(writer.path(), out.as_path());
        assert_eq!(std::fs::read_to_string(&out).unwrap(), "");
    }

    #[test]
    fn wrong_field_count_reports_line() {
        let f = write_file("25,red\n25,red,yes\n");
        let err = CasesReader::new(f.path()).score(&mut model()).unwrap_err();
        assert!(matches!(
            err,
            IoError::Record {
                line: 2,
                source: TreeError::FieldCount { expected: 2, got: 3 },
                ..
            }
        ));
    }
}
