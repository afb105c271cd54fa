//! Named JSON snapshots of the raw and parsed stages.
//!
//! Replacing a snapshot is two independent steps: copy the current file
//! byte-for-byte into the archive folder, then write the new collection under
//! the canonical name. A crash between the two leaves the archive copy and no
//! canonical file; the data can be recovered by renaming the archive.

use crate::domain::model::{PageRecord, ParsedPageRecord};
use crate::domain::ports::Storage;
use crate::utils::error::{InfoboxError, Result};
use chrono::NaiveDateTime;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Lexicographically sortable, second resolution.
pub const ARCHIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%d-%H%M%S";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Raw,
    Parsed,
}

/// `chembox_raw_html.json` becomes `chembox_raw_html_archived-2024-01-31-235959.json`.
/// The stem ends at the first dot; a name without a dot gets no extension.
pub fn archive_file_name(file_name: &str, timestamp: &NaiveDateTime) -> String {
    let (stem, extension) = match file_name.find('.') {
        Some(dot) => file_name.split_at(dot),
        None => (file_name, ""),
    };
    format!(
        "{}_archived-{}{}",
        stem,
        timestamp.format(ARCHIVE_TIMESTAMP_FORMAT),
        extension
    )
}

/// What happened to a canonical snapshot during a commit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// Collection did not grow; the file on disk was left untouched.
    Unchanged { path: String },
    Written {
        path: String,
        archived: Option<String>,
    },
}

pub struct SnapshotStore<S: Storage> {
    storage: S,
    raw_folder: String,
    parsed_folder: String,
    archive_folder: String,
}

impl<S: Storage> SnapshotStore<S> {
    pub fn new(
        storage: S,
        raw_folder: impl Into<String>,
        parsed_folder: impl Into<String>,
        archive_folder: impl Into<String>,
    ) -> Self {
        Self {
            storage,
            raw_folder: raw_folder.into(),
            parsed_folder: parsed_folder.into(),
            archive_folder: archive_folder.into(),
        }
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    fn folder(&self, stage: Stage) -> &str {
        match stage {
            Stage::Raw => &self.raw_folder,
            Stage::Parsed => &self.parsed_folder,
        }
    }

    pub fn path(&self, stage: Stage, file_name: &str) -> String {
        format!("{}/{}", self.folder(stage), file_name)
    }

    pub fn archive_path(&self, stage: Stage, file_name: &str, timestamp: &NaiveDateTime) -> String {
        format!(
            "{}/{}/{}",
            self.folder(stage),
            self.archive_folder,
            archive_file_name(file_name, timestamp)
        )
    }

    /// `Ok(None)` when the snapshot does not exist yet.
    pub async fn load<T: DeserializeOwned>(
        &self,
        stage: Stage,
        file_name: &str,
    ) -> Result<Option<Vec<T>>> {
        let path = self.path(stage, file_name);
        let bytes = match self.storage.read_file(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let items = serde_json::from_slice(&bytes)?;
        Ok(Some(items))
    }

    pub async fn load_raw(&self, file_name: &str) -> Result<Option<Vec<PageRecord>>> {
        self.load(Stage::Raw, file_name).await
    }

    pub async fn load_parsed(&self, file_name: &str) -> Result<Option<Vec<ParsedPageRecord>>> {
        self.load(Stage::Parsed, file_name).await
    }

    pub async fn save<T: Serialize + Sync>(
        &self,
        stage: Stage,
        file_name: &str,
        items: &[T],
    ) -> Result<String> {
        let path = self.path(stage, file_name);
        let json = serde_json::to_vec_pretty(items)?;
        self.storage.write_file(&path, &json).await?;
        Ok(path)
    }

    pub async fn save_raw(&self, file_name: &str, pages: &[PageRecord]) -> Result<String> {
        self.save(Stage::Raw, file_name, pages).await
    }

    pub async fn save_parsed(&self, file_name: &str, pages: &[ParsedPageRecord]) -> Result<String> {
        self.save(Stage::Parsed, file_name, pages).await
    }

    /// Copy the current snapshot unchanged into the archive folder.
    /// Returns the archive path, or `None` if there was nothing to archive.
    pub async fn archive(
        &self,
        stage: Stage,
        file_name: &str,
        timestamp: &NaiveDateTime,
    ) -> Result<Option<String>> {
        let bytes = match self.storage.read_file(&self.path(stage, file_name)).await {
            Ok(bytes) => bytes,
            Err(e) if e.is_not_found() => return Ok(None),
            Err(e) => return Err(e),
        };

        let archive_path = self.archive_path(stage, file_name, timestamp);
        self.storage.write_file(&archive_path, &bytes).await?;
        tracing::info!("Archived previous snapshot to {}", archive_path);
        Ok(Some(archive_path))
    }

    /// Archive the existing snapshot (if any), then overwrite it.
    pub async fn replace<T: Serialize + Sync>(
        &self,
        stage: Stage,
        file_name: &str,
        items: &[T],
        timestamp: &NaiveDateTime,
    ) -> Result<CommitOutcome> {
        let archived = self.archive(stage, file_name, timestamp).await?;

        let path = match self.save(stage, file_name, items).await {
            Ok(path) => path,
            Err(e) => {
                return Err(match &archived {
                    Some(archive_path) => InfoboxError::SnapshotError {
                        path: self.path(stage, file_name),
                        message: format!(
                            "write failed after archiving to {}: {}",
                            archive_path, e
                        ),
                    },
                    None => e,
                })
            }
        };

        Ok(CommitOutcome::Written { path, archived })
    }

    /// Replace the snapshot only if the collection grew or `force` is set.
    /// An unchanged collection leaves the canonical file byte-for-byte intact
    /// and creates no archive.
    pub async fn commit<T: Serialize + Sync>(
        &self,
        stage: Stage,
        file_name: &str,
        items: &[T],
        existing_count: usize,
        force: bool,
    ) -> Result<CommitOutcome> {
        if !force && items.len() == existing_count {
            tracing::info!(
                "No new entries for {}, keeping existing snapshot",
                self.path(stage, file_name)
            );
            return Ok(CommitOutcome::Unchanged {
                path: self.path(stage, file_name),
            });
        }

        let timestamp = chrono::Local::now().naive_local();
        self.replace(stage, file_name, items, &timestamp).await
    }
}
