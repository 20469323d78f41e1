//! JSON storage for exported rule trees.

use std::path::{Path, PathBuf};

use cid3_tree::RuleTree;
use tracing::{debug, info, instrument};

use crate::IoError;

/// Writes a [`RuleTree`] as pretty-printed JSON.
pub struct RuleWriter {
    path: PathBuf,
}

impl RuleWriter {
    /// Create a new writer targeting `path`.
    pub fn new(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
        }
    }

    /// Write `rules`, replacing any existing file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`IoError::Json`] | Encoding failed |
    /// | [`IoError::WriteFile`] | The file cannot be written |
    #[instrument(skip_all, fields(path = %self.path.display()))]
    pub fn write(&self, rules: &RuleTree) -> Result<(), IoError> {
        let json = serde_json::to_string_pretty(rules).map_err(|e| IoError::Json {
            path: self.path.clone(),
            source: e,
        })?;
        std::fs::write(&self.path, &json).map_err(|e| IoError::WriteFile {
            path: self.path.clone(),
            source: e,
        })?;
        info!(n_rules = rules.n_rules(), "rules written");
        Ok(())
    }
}

/// Read a rule tree written by [`RuleWriter`].
///
/// # Errors
///
/// | Variant | Condition |
/// |---|---|
/// | [`IoError::FileNotFound`] | File doesn't exist or is unreadable |
/// | [`IoError::Json`] | Not a rule tree |
#[instrument(fields(path = %path.display()))]
pub fn read_rules(path: &Path) -> Result<RuleTree, IoError> {
    let text = std::fs::read_to_string(path).map_err(|e| IoError::FileNotFound {
        path: path.to_path_buf(),
        source: e,
    })?;
    let rules: RuleTree = serde_json::from_str(&text).map_err(|e| IoError::Json {
        path: path.to_path_buf(),
        source: e,
    })?;
    debug!(n_rules = rules.n_rules(), "rules read");
    Ok(rules)
}
