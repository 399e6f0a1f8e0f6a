//! Staged artifact writes.
//!
//! Each artifact is written to a temporary file next to its final path. Only
//! after every artifact of the run has been written are they renamed into
//! place, so a run that fails midway leaves the previous run's files untouched.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tempfile::NamedTempFile;

use super::TrainError;

pub(crate) struct ArtifactWriter {
    dir: PathBuf,
    staged: Vec<(NamedTempFile, PathBuf)>,
}

impl ArtifactWriter {
    /// Prepare `dir` (creating it if needed) for a new set of artifacts.
    pub(crate) fn new(dir: &Path) -> Result<Self, TrainError> {
        std::fs::create_dir_all(dir).map_err(|source| TrainError::Artifact {
            path: dir.to_path_buf(),
            source,
        })?;
        Ok(Self {
            dir: dir.to_path_buf(),
            staged: Vec::new(),
        })
    }

    /// Stage `value` as pretty JSON under `name`; returns the final path.
    pub(crate) fn json<T: Serialize>(
        &mut self,
        name: &str,
        value: &T,
    ) -> Result<PathBuf, TrainError> {
        let target = self.dir.join(name);
        let bytes = serde_json::to_vec_pretty(value).map_err(|source| TrainError::Serialize {
            path: target.clone(),
            source,
        })?;
        let mut file = self.temp_for(&target)?;
        file.write_all(&bytes)
            .map_err(|source| artifact_error(&target, source))?;
        self.staged.push((file, target.clone()));
        Ok(target)
    }

    /// Stage a CSV with `header` and `rows` under `name`; returns the final path.
    pub(crate) fn csv<I, R>(
        &mut self,
        name: &str,
        header: &[&str],
        rows: I,
    ) -> Result<PathBuf, TrainError>
    where
        I: IntoIterator<Item = R>,
        R: IntoIterator<Item = String>,
    {
        let target = self.dir.join(name);
        let mut file = self.temp_for(&target)?;
        {
            let mut writer = csv::Writer::from_writer(file.as_file_mut());
            writer
                .write_record(header)
                .map_err(|err| artifact_error(&target, std::io::Error::other(err)))?;
            for row in rows {
                writer
                    .write_record(row)
                    .map_err(|err| artifact_error(&target, std::io::Error::other(err)))?;
            }
            writer
                .flush()
                .map_err(|source| artifact_error(&target, source))?;
        }
        self.staged.push((file, target.clone()));
        Ok(target)
    }

    /// Move every staged file to its final path, replacing earlier runs.
    pub(crate) fn commit(self) -> Result<Vec<PathBuf>, TrainError> {
        let mut written = Vec::with_capacity(self.staged.len());
        for (file, target) in self.staged {
            file.persist(&target)
                .map_err(|err| artifact_error(&target, err.error))?;
            written.push(target);
        }
        Ok(written)
    }

    fn temp_for(&self, target: &Path) -> Result<NamedTempFile, TrainError> {
        tempfile::Builder::new()
            .prefix(".staged-")
            .suffix(".tmp")
            .tempfile_in(&self.dir)
            .map_err(|source| artifact_error(target, source))
    }
}

fn artifact_error(path: &Path, source: std::io::Error) -> TrainError {
    TrainError::Artifact {
        path: path.to_path_buf(),
        source,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn nothing_is_visible_before_commit() {
        let dir = tempdir().unwrap();
        let mut writer = ArtifactWriter::new(dir.path()).unwrap();
        let json = writer.json("metrics.json", &serde_json::json!({"mae": 1.5})).unwrap();
        let csv = writer
            .csv(
                "predictions.csv",
                &["actual", "predicted"],
                vec![vec!["1".to_string(), "2".to_string()]],
            )
            .unwrap();
        assert!(!json.exists());
        assert!(!csv.exists());

        let written = writer.commit().unwrap();
        assert_eq!(written, vec![json.clone(), csv.clone()]);
        assert_eq!(
            std::fs::read_to_string(&csv).unwrap(),
            "actual,predicted\n1,2\n"
        );
        let value: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&json).unwrap()).unwrap();
        assert_eq!(value["mae"], 1.5);

        let leftovers = std::fs::read_dir(dir.path())
            .unwrap()
            .filter(|entry| {
                entry
                    .as_ref()
                    .unwrap()
                    .file_name()
                    .to_string_lossy()
                    .starts_with(".staged-")
            })
            .count();
        assert_eq!(leftovers, 0);
    }

    #[test]
    fn dropped_writer_leaves_previous_files() {
        let dir = tempdir().unwrap();
        let target = dir.path().join("model.json");
        std::fs::write(&target, "previous").unwrap();

        let mut writer = ArtifactWriter::new(dir.path()).unwrap();
        writer.json("model.json", &serde_json::json!({"new": true})).unwrap();
        drop(writer);

        assert_eq!(std::fs::read_to_string(&target).unwrap(), "previous");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }
}
