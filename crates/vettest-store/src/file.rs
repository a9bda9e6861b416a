//! JSON file store.
//!
//! One pretty-printed file per record, named
//! `evaluacion_<timestamp>_<id>.json`, in a single directory. Records are
//! written to a hidden `.tmp` file first and renamed into place, so a failed
//! write never leaves a half-written record behind.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures::future::join_all;
use tokio::io::AsyncWriteExt;
use uuid::Uuid;

use vettest_core::error::StoreError;
use vettest_core::traits::{EvaluationRecord, ResultStore};

const FILE_PREFIX: &str = "evaluacion_";

/// Stores each evaluation as a JSON file.
#[derive(Debug, Clone)]
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    /// The directory is created on first save.
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn file_name(record: &EvaluationRecord) -> String {
        format!(
            "{FILE_PREFIX}{}_{}.json",
            record.created_at.format("%Y%m%dT%H%M%S%3fZ"),
            record.id
        )
    }

    /// Scratch path a record is written to before it is renamed into place.
    /// The leading dot keeps it out of [`FileStore::record_paths`].
    fn temp_path(&self, record: &EvaluationRecord) -> PathBuf {
        self.dir.join(format!(".{}.tmp", Self::file_name(record)))
    }

    /// Paths of every record file in the directory. A missing directory
    /// holds no records.
    async fn record_paths(&self) -> Result<Vec<PathBuf>, StoreError> {
        let mut entries = match tokio::fs::read_dir(&self.dir).await {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut paths = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            let is_record = path
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(FILE_PREFIX) && n.ends_with(".json"));
            if is_record {
                paths.push(path);
            }
        }
        Ok(paths)
    }

    async fn find(&self, id: &Uuid) -> Result<Option<PathBuf>, StoreError> {
        let suffix = format!("_{id}.json");
        Ok(self
            .record_paths()
            .await?
            .into_iter()
            .find(|p| p.to_string_lossy().ends_with(&suffix)))
    }
}

async fn write_then_rename(tmp: &Path, path: &Path, bytes: &[u8]) -> std::io::Result<()> {
    let mut file = tokio::fs::File::create(tmp).await?;
    file.write_all(bytes).await?;
    file.sync_all().await?;
    drop(file);
    tokio::fs::rename(tmp, path).await
}

async fn read_record(path: &Path) -> Result<EvaluationRecord, StoreError> {
    let content = tokio::fs::read_to_string(path).await?;
    Ok(serde_json::from_str(&content)?)
}

#[async_trait]
impl ResultStore for FileStore {
    fn name(&self) -> &str {
        "file"
    }

    async fn save(&self, record: &EvaluationRecord) -> Result<(), StoreError> {
        tokio::fs::create_dir_all(&self.dir).await?;

        if self.find(&record.id).await?.is_some() {
            return Err(StoreError::Conflict(record.id.to_string()));
        }

        let json = serde_json::to_string_pretty(record)?;
        let path = self.dir.join(Self::file_name(record));
        let tmp = self.temp_path(record);
        if let Err(e) = write_then_rename(&tmp, &path, json.as_bytes()).await {
            if let Err(cleanup) = tokio::fs::remove_file(&tmp).await {
                tracing::debug!("could not remove {}: {}", tmp.display(), cleanup);
            }
            return Err(e.into());
        }

        tracing::info!(id = %record.id, path = %path.display(), "saved evaluation");
        Ok(())
    }

    async fn get(&self, id: &Uuid) -> Result<EvaluationRecord, StoreError> {
        match self.find(id).await? {
            Some(path) => read_record(&path).await,
            None => Err(StoreError::NotFound(id.to_string())),
        }
    }

    async fn list(&self) -> Result<Vec<EvaluationRecord>, StoreError> {
        let paths = self.record_paths().await?;
        let loaded = join_all(paths.iter().map(|p| read_record(p))).await;

        let mut records = Vec::with_capacity(loaded.len());
        for (path, result) in paths.iter().zip(loaded) {
            match result {
                Ok(record) => records.push(record),
                Err(e) => tracing::warn!("skipping {}: {}", path.display(), e),
            }
        }

        records.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(records)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;
    use vettest_core::model::{Answer, AnswerKey, AnswerSet, Catalog, Question, Section};
    use vettest_core::{evaluate, ApprovalPolicy};

    fn record(name: &str) -> EvaluationRecord {
        let catalog = Catalog {
            id: "c".into(),
            title: "File store".into(),
            role: "r".into(),
            kind: "personal".into(),
            sections: vec![Section::new("A", 100.0, vec![Question::open("a", "x")])],
        };
        let answers = AnswerSet::new().with(AnswerKey::position("r", 0, 0), Answer::yes());
        let report = evaluate(
            &catalog.sections,
            &catalog.role,
            &answers,
            &ApprovalPolicy::default(),
        );
        EvaluationRecord::new(name, &catalog, answers, report)
    }

    #[tokio::test]
    async fn save_then_get() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("results"));
        let rec = record("Ana");

        store.save(&rec).await.unwrap();
        let loaded = store.get(&rec.id).await.unwrap();
        assert_eq!(loaded, rec);

        let files: Vec<_> = std::fs::read_dir(store.dir()).unwrap().collect();
        assert_eq!(files.len(), 1);
        let name = files[0].as_ref().unwrap().file_name();
        let name = name.to_string_lossy();
        assert!(name.starts_with("evaluacion_"));
        assert!(name.ends_with(&format!("_{}.json", rec.id)));
    }

    #[tokio::test]
    async fn duplicate_id_conflicts() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let rec = record("Ana");

        store.save(&rec).await.unwrap();
        let err = store.save(&rec).await.unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
        assert!(err.is_permanent());
    }

    #[tokio::test]
    async fn leftover_partial_write_does_not_block_save() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let rec = record("Ana");

        // An earlier attempt died halfway through writing.
        let tmp = store.temp_path(&rec);
        std::fs::write(&tmp, "{\"id\": \"trunc").unwrap();
        assert!(store.list().await.unwrap().is_empty());
        assert!(matches!(
            store.get(&rec.id).await.unwrap_err(),
            StoreError::NotFound(_)
        ));

        store.save(&rec).await.unwrap();
        assert_eq!(store.get(&rec.id).await.unwrap(), rec);
        assert_eq!(store.list().await.unwrap().len(), 1);
        assert!(!tmp.exists());
    }

    #[tokio::test]
    async fn get_missing_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());
        let err = store.get(&Uuid::new_v4()).await.unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[tokio::test]
    async fn list_is_newest_first_and_skips_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path());

        let mut older = record("Older");
        older.created_at -= Duration::hours(1);
        let newer = record("Newer");
        store.save(&older).await.unwrap();
        store.save(&newer).await.unwrap();
        std::fs::write(dir.path().join("evaluacion_broken.json"), "{not json").unwrap();
        std::fs::write(dir.path().join("unrelated.json"), "{}").unwrap();

        let records = store.list().await.unwrap();
        let names: Vec<_> = records.iter().map(|r| r.respondent.as_str()).collect();
        assert_eq!(names, vec!["Newer", "Older"]);
    }

    #[tokio::test]
    async fn list_missing_directory_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileStore::new(dir.path().join("never-created"));
        assert!(store.list().await.unwrap().is_empty());
    }
}
