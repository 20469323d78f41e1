//! Attribute declarations reader.

use std::path::{Path, PathBuf};

use cid3_tree::{Attribute, AttributeKind, Schema};
use tracing::{debug, instrument};

use crate::IoError;

/// Reads a names file into a [`Schema`].
///
/// Expected format:
/// - Line 1 is skipped (it lists class values)
/// - Lines starting with `|` are comments
/// - `name: continuous.` declares a continuous attribute, `name: ignore.`
///   an ignored one, any other kind a discrete one
/// - Lines that do not split into exactly two parts on `:` are skipped
///
/// The class attribute is appended after the declared ones.
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::NoAttributes`] | No attribute declarations |
pub struct NamesReader {
    path: PathBuf,
}

impl NamesReader {
    /// Create a new reader for the given names file.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Read the declarations.
    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub fn read(&self) -> Result<Schema, IoError> {
        let text = std::fs::read_to_string(&self.path).map_err(|e| IoError::FileNotFound {
            path: self.path.clone(),
            source: e,
        })?;

        let declared: Vec<Attribute> = text
            .lines()
            .skip(1)
            .filter(|line| !line.starts_with('|'))
            .filter_map(parse_declaration)
            .collect();
        debug!(n_declared = declared.len(), "attribute declarations read");

        Schema::new(declared).map_err(|_| IoError::NoAttributes {
            path: self.path.clone(),
        })
    }
}

fn parse_declaration(line: &str) -> Option<Attribute> {
    let parts: Vec<&str> = line.split(':').collect();
    let [name, kind] = parts.as_slice() else {
        return None;
    };
    let kind = match kind.trim() {
        "continuous." => AttributeKind::Continuous,
        "ignore." => AttributeKind::Ignore,
        _ => AttributeKind::Discrete,
    };
    Some(Attribute::new(name.trim(), kind))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    fn write_names(content: &str) -> NamedTempFile {
        let mut f = NamedTempFile::new().unwrap();
        f.write_all(content.as_bytes()).unwrap();
        f.flush().unwrap();
        f
    }

    #[test]
    fn kinds_are_recognized() {
        let f = write_names(
            "yes, no.\n| a comment: continuous.\nage: continuous.\ncolor: red, blue.\nid: ignore.\n",
        );
        let schema = NamesReader::new(f.path()).read().unwrap();
        let kinds: Vec<(&str, AttributeKind)> = schema
            .attributes()
            .iter()
            .map(|a| (a.name(), a.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("age", AttributeKind::Continuous),
                ("color", AttributeKind::Discrete),
                ("id", AttributeKind::Ignore),
                ("Class", AttributeKind::Discrete),
            ]
        );
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let f = write_names("classes\n\nno colon here\na: b: c\n  width :  continuous.  \n");
        let schema = NamesReader::new(f.path()).read().unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.attributes()[0].name(), "width");
        assert_eq!(schema.attributes()[0].kind(), AttributeKind::Continuous);
    }

    #[test]
    fn first_line_is_never_a_declaration() {
        let f = write_names("x: continuous.\ny: continuous.\n");
        let schema = NamesReader::new(f.path()).read().unwrap();
        assert_eq!(schema.len(), 2);
        assert_eq!(schema.attributes()[0].name(), "y");
    }

    #[test]
    fn no_declarations_error() {
        let f = write_names("yes, no.\n| only a comment\n");
        let err = NamesReader::new(f.path()).read().unwrap_err();
        assert!(matches!(err, IoError::NoAttributes { .. }));
    }

    #[test]
    fn missing_file_error() {
        let err = NamesReader::new(Path::new("/nonexistent/x.names")).read().unwrap_err();
        assert!(matches!(err, IoError::FileNotFound { .. }));
    }
}
