//! Paths derived from the data file name, and whole-run dataset loading.

use std::path::{Path, PathBuf};

use cid3_tree::{Dataset, Partition};
use tracing::{info, instrument};

use crate::IoError;
use crate::data::DataReader;
use crate::names::NamesReader;

/// The family of files that belong to one data file `x.data`:
/// `x.names`, `x.test`, and saved models `x.tree` / `x.forest`.
#[derive(Debug, Clone)]
pub struct DataFiles {
    data: PathBuf,
}

impl DataFiles {
    /// Anchor the family on a data file path.
    pub fn new(data: impl Into<PathBuf>) -> Self {
        Self { data: data.into() }
    }

    /// The data file itself.
    #[must_use]
    pub fn data(&self) -> &Path {
        &self.data
    }

    /// The attribute declarations.
    #[must_use]
    pub fn names(&self) -> PathBuf {
        self.data.with_extension("names")
    }

    /// The optional held-out test file.
    #[must_use]
    pub fn test(&self) -> PathBuf {
        self.data.with_extension("test")
    }

    /// A saved model with the given extension.
    #[must_use]
    pub fn model(&self, extension: &str) -> PathBuf {
        self.data.with_extension(extension)
    }

    /// Read the names file, the training rows, and the test file if present.
    ///
    /// Test rows share the training symbol tables; training class counts
    /// grow to cover classes first seen in the test file.
    ///
    /// # Errors
    ///
    /// Propagates the failures of [`NamesReader::read`] and [`DataReader::read_into`].
    #[instrument(skip(self), fields(data = %self.data.display()))]
    pub fn load(&self) -> Result<Dataset, IoError> {
        let schema = NamesReader::new(&self.names()).read()?;
        let mut dataset = Dataset::new(schema);
        DataReader::new(&self.data).read_into(&mut dataset, Partition::Train)?;

        let test = self.test();
        if test.is_file() {
            DataReader::new(&test).read_into(&mut dataset, Partition::Test)?;
            dataset.sync_class_counts();
        }

        info!(
            n_attributes = dataset.schema().len(),
            n_train = dataset.train_rows().len(),
            n_test = dataset.test_rows().len(),
            n_classes = dataset.n_classes(),
            "dataset loaded"
        );
        Ok(dataset)
    }
}

/// Output path for scored cases: `x.cases` becomes `x.tmp`; any other
/// name gets `.tmp` appended.
#[must_use]
pub fn scored_cases_path(cases: &Path) -> PathBuf {
    if cases.extension().is_some_and(|e| e == "cases") {
        cases.with_extension("tmp")
    } else {
        let mut name = cases.as_os_str().to_owned();
        name.push(".tmp");
        PathBuf::from(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn derived_paths() {
        let files = DataFiles::new("dir/golf.data");
        assert_eq!(files.names(), PathBuf::from("dir/golf.names"));
        assert_eq!(files.test(), PathBuf::from("dir/golf.test"));
        assert_eq!(files.model("tree"), PathBuf::from("dir/golf.tree"));
        assert_eq!(files.model("forest"), PathBuf::from("dir/golf.forest"));
    }

    #[test]
    fn scored_cases_paths() {
        assert_eq!(scored_cases_path(Path::new("a/golf.cases")), PathBuf::from("a/golf.tmp"));
        assert_eq!(scored_cases_path(Path::new("a/golf.txt")), PathBuf::from("a/golf.txt.tmp"));
        assert_eq!(scored_cases_path(Path::new("golf")), PathBuf::from("golf.tmp"));
    }
}
