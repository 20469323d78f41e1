//! Model persistence: bincode inside a versioned envelope, zstd-compressed.

use std::path::Path;

use tracing::{debug, info, instrument};

use crate::error::TreeError;
use crate::model::{Classifier, Model};

/// Current binary format version.
const FORMAT_VERSION: u32 = 1;

/// zstd level used when writing models.
const COMPRESSION_LEVEL: i32 = 3;

/// Owned envelope, decoded on load.
#[derive(serde::Deserialize)]
struct ModelEnvelope {
    format_version: u32,
    model: Model,
}

/// Borrowed envelope, encoded on save. Same wire layout as [`ModelEnvelope`].
#[derive(serde::Serialize)]
struct ModelEnvelopeRef<'a> {
    format_version: u32,
    model: &'a Model,
}

impl Model {
    /// Save the model to a compressed binary file.
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::SerializeModel`] | bincode encoding failed |
    /// | [`TreeError::CompressModel`] | zstd compression failed |
    /// | [`TreeError::WriteModel`] | file write failed |
    #[instrument(skip(self), fields(path = %path.as_ref().display()))]
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), TreeError> {
        let path = path.as_ref();

        let envelope = ModelEnvelopeRef {
            format_version: FORMAT_VERSION,
            model: self,
        };

        let bytes = bincode::serialize(&envelope).map_err(|e| TreeError::SerializeModel {
            source: e,
        })?;
        let compressed = zstd::encode_all(bytes.as_slice(), COMPRESSION_LEVEL)
            .map_err(|e| TreeError::CompressModel { source: e })?;

        std::fs::write(path, &compressed).map_err(|e| TreeError::WriteModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        info!(
            raw_bytes = bytes.len(),
            size_bytes = compressed.len(),
            kind = self.classifier.extension(),
            "model saved"
        );

        Ok(())
    }

    /// Load a model saved by [`Model::save`].
    ///
    /// # Errors
    ///
    /// | Variant | Condition |
    /// |---|---|
    /// | [`TreeError::ReadModel`] | file read failed |
    /// | [`TreeError::DecompressModel`] | the file is not a zstd frame |
    /// | [`TreeError::DeserializeModel`] | bincode decoding failed |
    /// | [`TreeError::IncompatibleModelVersion`] | format version mismatch |
    #[instrument(fields(path = %path.as_ref().display()))]
    pub fn load(path: impl AsRef<Path>) -> Result<Self, TreeError> {
        let path = path.as_ref();

        let compressed = std::fs::read(path).map_err(|e| TreeError::ReadModel {
            path: path.to_path_buf(),
            source: e,
        })?;

        let bytes = zstd::decode_all(compressed.as_slice()).map_err(|e| {
            TreeError::DecompressModel {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        let envelope: ModelEnvelope = bincode::deserialize(&bytes).map_err(|e| {
            TreeError::DeserializeModel {
                path: path.to_path_buf(),
                source: e,
            }
        })?;

        if envelope.format_version != FORMAT_VERSION {
            return Err(TreeError::IncompatibleModelVersion {
                expected: FORMAT_VERSION,
                found: envelope.format_version,
                path: path.to_path_buf(),
            });
        }

        let model = envelope.model;
        match &model.classifier {
            Classifier::Tree(tree) => debug!(n_nodes = tree.n_nodes(), "tree loaded"),
            Classifier::Forest(forest) => debug!(n_trees = forest.n_trees(), "forest loaded"),
        }
        info!(kind = model.classifier.extension(), "model loaded");

        Ok(model)
    }
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::dataset::{Dataset, Partition};
    use crate::forest::ForestConfig;
    use crate::schema::{Attribute, AttributeKind, Schema};
    use crate::tree::TreeConfig;

    fn dataset() -> Dataset {
        let schema = Schema::new(vec![
            Attribute::new("x", AttributeKind::Continuous),
            Attribute::new("shade", AttributeKind::Discrete),
        ])
        .unwrap();
        let mut ds = Dataset::new(schema);
        for i in 0..20 {
            let x = (i as f64 * 1.5).to_string();
            let shade = ["dark", "light"][i % 2];
            let label = if i < 10 { "a" } else { "b" };
            ds.push_record(&[&x, shade, label], Partition::Train).unwrap();
        }
        ds.push_record(&["?", "dark", "a"], Partition::Train).unwrap();
        ds
    }

    fn assert_same_predictions(a: &Model, b: &Model, cases: &[[&str; 2]]) {
        let mut a = a.clone();
        let mut b = b.clone();
        for case in cases {
            assert_eq!(
                a.classify_case(case).unwrap(),
                b.classify_case(case).unwrap(),
                "case {case:?}"
            );
        }
    }

    const CASES: [[&str; 2]; 4] = [["1.0", "dark"], ["20", "light"], ["?", "?"], ["14", "dusk"]];

    #[test]
    fn tree_round_trip_identical_predictions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weather.tree");

        let mut ds = dataset();
        let imputation = ds.impute();
        let tree = TreeConfig::new().fit(&ds, ds.train_rows()).unwrap();
        let model = Model::new(ds, imputation, Classifier::Tree(tree));

        model.save(&path).unwrap();
        let loaded = Model::load(&path).unwrap();

        assert_eq!(loaded.classifier(), model.classifier());
        assert_eq!(loaded.imputation(), model.imputation());
        assert_same_predictions(&model, &loaded, &CASES);
    }

    #[test]
    fn forest_round_trip_identical_predictions() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("weather.forest");

        let mut ds = dataset();
        let imputation = ds.impute();
        let forest = ForestConfig::new(4).unwrap().fit(&ds, ds.train_rows()).unwrap();
        let model = Model::new(ds, imputation, Classifier::Forest(forest));

        model.save(&path).unwrap();
        let loaded = Model::load(&path).unwrap();

        assert_eq!(loaded.classifier(), model.classifier());
        assert_same_predictions(&model, &loaded, &CASES);
    }

    #[test]
    fn borrowed_envelope_decodes_as_owned() {
        let mut ds = dataset();
        let imputation = ds.impute();
        let tree = TreeConfig::new().fit(&ds, ds.train_rows()).unwrap();
        let model = Model::new(ds, imputation, Classifier::Tree(tree));
        let bytes = bincode::serialize(&ModelEnvelopeRef {
            format_version: FORMAT_VERSION,
            model: &model,
        })
        .unwrap();
        let envelope: ModelEnvelope = bincode::deserialize(&bytes).unwrap();
        assert_eq!(envelope.format_version, FORMAT_VERSION);
        assert_eq!(envelope.model.classifier(), model.classifier());
        assert_eq!(envelope.model.schema(), model.schema());
    }

    #[test]
    fn load_nonexistent_file_error() {
        let dir = TempDir::new().unwrap();
        let err = Model::load(dir.path().join("missing.tree")).unwrap_err();
        assert!(matches!(err, TreeError::ReadModel { .. }));
    }

    #[test]
    fn load_uncompressed_file_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.tree");
        std::fs::write(&path, b"not a valid model file").unwrap();
        let err = Model::load(&path).unwrap_err();
        assert!(matches!(err, TreeError::DecompressModel { .. }));
    }

    #[test]
    fn load_corrupt_payload_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("corrupt.tree");
        let compressed = zstd::encode_all(&b"\x01\x00\x00\x00garbage"[..], COMPRESSION_LEVEL).unwrap();
        std::fs::write(&path, compressed).unwrap();
        let err = Model::load(&path).unwrap_err();
        assert!(matches!(err, TreeError::DeserializeModel { .. }));
    }

    #[test]
    fn version_mismatch_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("future.tree");

        let mut ds = dataset();
        let imputation = ds.impute();
        let tree = TreeConfig::new().fit(&ds, ds.train_rows()).unwrap();
        let model = Model::new(ds, imputation, Classifier::Tree(tree));
        let envelope = ModelEnvelopeRef {
            format_version: FORMAT_VERSION + 1,
            model: &model,
        };
        let bytes = bincode::serialize(&envelope).unwrap();
        std::fs::write(&path, zstd::encode_all(bytes.as_slice(), COMPRESSION_LEVEL).unwrap()).unwrap();

        let err = Model::load(&path).unwrap_err();
        assert!(matches!(
            err,
            TreeError::IncompatibleModelVersion { expected: 1, found: 2, .. }
        ));
    }
}
