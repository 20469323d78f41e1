//! Comma-separated record reader for data, test, and cases files.

use std::path::{Path, PathBuf};

use cid3_tree::{Dataset, Partition};
use tracing::{debug, info, instrument};

use crate::IoError;

/// One retained input line and its parsed fields.
#[derive(Debug, Clone)]
pub struct RawRecord {
    /// One-based line in the source file.
    pub line: u64,
    /// The line as read, without its terminator.
    pub text: String,
    /// Trimmed comma-separated fields.
    pub fields: Vec<String>,
}

impl RawRecord {
    /// Borrow the fields as string slices.
    #[must_use]
    pub fn field_refs(&self) -> Vec<&str> {
        self.fields.iter().map(String::as_str).collect()
    }
}

/// Read the record lines of `path`.
///
/// Lines starting with `//` are skipped, as are blank lines before the
/// first record; the first blank line after a record ends the stream.
/// Quotes are ordinary characters, so every kept line is one record.
pub(crate) fn read_records(path: &Path) -> Result<Vec<RawRecord>, IoError> {
    let text = std::fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;

    let mut kept: Vec<(u64, &str)> = Vec::new();
    for (i, line) in text.lines().enumerate() {
        if line.starts_with("//") {
            continue;
        }
        if line.trim().is_empty() {
            if kept.is_empty() {
                continue;
            }
            break;
        }
        kept.push((i as u64 + 1, line));
    }

    let joined = kept.iter().map(|(_, l)| *l).collect::<Vec<_>>().join("\n");
    let mut rdr = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .quoting(false)
        .trim(csv::Trim::All)
        .from_reader(joined.as_bytes());

    let parsed: Vec<csv::StringRecord> = rdr
        .records()
        .enumerate()
        .map(|(i, result)| {
            result.map_err(|e| IoError::CsvParse {
                path: path.to_path_buf(),
                line: kept.get(i).map_or(0, |&(line, _)| line),
                source: e,
            })
        })
        .collect::<Result<_, _>>()?;
    if parsed.len() != kept.len() {
        return Err(IoError::RecordLines {
            path: path.to_path_buf(),
            lines: kept.len(),
            records: parsed.len(),
        });
    }

    let mut records = Vec::with_capacity(kept.len());
    for (record, &(line, text)) in parsed.iter().zip(&kept) {
        records.push(RawRecord {
            line,
            text: text.to_string(),
            fields: record.iter().map(String::from).collect(),
        });
    }
    debug!(n_records = records.len(), "record lines read");
    Ok(records)
}

/// Reads a data or test file into a [`Dataset`].
///
/// Every record must carry one field per schema attribute, class last.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::CsvParse`] | Malformed CSV record |
/// | [`IoError::RecordLines`] | Parsed records do not match the input lines |
/// | [`IoError::FieldCount`] | Record has the wrong number of fields |
/// | [`IoError::Record`] | A continuous field is not a number |
/// | [`IoError::EmptyDataset`] | No records |
pub struct DataReader {
    path: PathBuf,
}

impl DataReader {
    /// Create a new reader for the given file.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Encode every record into `dataset` under `partition`, returning the count.
    #[instrument(skip(self, dataset), fields(path = %self.path.display(), partition = ?partition))]
    pub fn read_into(&self, dataset: &mut Dataset, partition: Partition) -> Result<usize, IoError> {
        let records = read_records(&self.path)?;
        if records.is_empty() {
            return Err(IoError::EmptyDataset {
                path: self.path.clone(),
            });
        }

        let expected = dataset.schema().len();
        for record in &records {
            if record.fields.len() != expected {
                return Err(IoError::FieldCount {
                    path: self.path.clone(),
                    line: record.line,
                    expected,
                    got: record.fields.len(),
                });
            }
            dataset
                .push_record(&record.field_refs(), partition)
                .map_err(|e| IoError::Record {
                    path: self.path.clone(),
                    line: record.line,
                    source: e,
                })?;
        }

        info!(n_records = records.len(), "records encoded");
        Ok(records.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    use cid3_tree::{Attribute, AttributeIndex, AttributeKind, Schema, Value};
    use tempfile::NamedTempFile;

    fn write_file(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    fn dataset() -> Dataset {
        Dataset::new(
            Schema::new(vec![
                Attribute::new("age", AttributeKind::Continuous),
                Attribute::new("color", AttributeKind::Discrete),
            ])
            .unwrap(),
        )
    }

    #[test]
    fn comments_and_leading_blanks_skipped() {
        let f = write_file("\n// header comment\n\n25, red, yes\n// inline\n30,blue,no\n");
        let records = read_records(f.path()).unwrap();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].line, 4);
        assert_eq!(records[0].fields, vec!["25", "red", "yes"]);
        assert_eq!(records[0].text, "25, red, yes");
        assert_eq!(records[1].line, 6);
    }

    #[test]
    fn quotes_do_not_join_lines() {
        let f = write_file("25,\"red,yes\n30,blue\",no\n26,red,yes\n");
        let records = read_records(f.path()).unwrap();
        assert_eq!(records.len(), 3);
        assert_eq!(records[0].fields, vec!["25", "\"red", "yes"]);
        assert_eq!(records[1].fields, vec!["30", "blue\"", "no"]);
        assert_eq!(records[2].line, 3);
        assert_eq!(records[2].text, "26,red,yes");
    }

    #[test]
    fn quoted_field_keeps_its_quotes() {
        let f = write_file("25,\"red\",yes\n");
        let mut ds = dataset();
        DataReader::new(f.path()).read_into(&mut ds, Partition::Train).unwrap();
        let color = AttributeIndex::new(1);
        assert_eq!(
            ds.domains().get(color).decode(ds.points()[0].code(color)),
            Some(&Value::Symbol("\"red\"".into()))
        );
    }

    #[test]
    fn blank_line_ends_stream() {
        let f = write_file("25,red,yes\n\n30,blue,no\n");
        let records = read_records(f.path()).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn records_are_encoded() {
        let f = write_file("25,red,yes\n?,blue,no\nNaN,?,yes\n");
        let mut ds = dataset();
        let n = DataReader::new(f.path()).read_into(&mut ds, Partition::Train).unwrap();
        assert_eq!(n, 3);
        assert_eq!(ds.class_counts(), &[2, 1]);
        let age = AttributeIndex::new(0);
        let color = AttributeIndex::new(1);
        assert_eq!(ds.domains().get(age).decode(ds.points()[1].code(age)), Some(&Value::Missing));
        assert_eq!(ds.points()[1].code(age), ds.points()[2].code(age));
        assert_eq!(ds.domains().get(color).decode(ds.points()[2].code(color)), Some(&Value::Missing));
    }

    #[test]
    fn field_count_mismatch_reports_line() {
        let f = write_file("25,red,yes\n30,blue\n");
        let err = DataReader::new(f.path())
            .read_into(&mut dataset(), Partition::Train)
            .unwrap_err();
        assert!(matches!(err, IoError::FieldCount { line: 2, expected: 3, got: 2, .. }));
    }

    #[test]
    fn bad_number_reports_line() {
        let f = write_file("// c\nold,red,yes\n");
        let err = DataReader::new(f.path())
            .read_into(&mut dataset(), Partition::Train)
            .unwrap_err();
        assert!(matches!(err, IoError::Record { line: 2, .. }));
    }

    #[test]
    fn empty_file_error() {
        let f = write_file("// nothing\n\n");
        let err = DataReader::new(f.path())
            .read_into(&mut dataset(), Partition::Train)
            .unwrap_err();
        assert!(matches!(err, IoError::EmptyDataset { .. }));
    }

    #[test]
    fn missing_file_error() {
        let err = DataReader::new(Path::new("/nonexistent/x.data"))
            .read_into(&mut dataset(), Partition::Train)
            .unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
