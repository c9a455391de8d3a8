use std::{
    fs,
    io::{ErrorKind, Write},
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use tempfile::NamedTempFile;

use crate::domain::{content_preview, ClassificationResult, HistoryEntry, SessionInfo};

use super::HistoryError;

const ORIGIN: &str = concat!("mail-verdict/", env!("CARGO_PKG_VERSION"));

/// Append-ordered classification log backed by one JSON array on disk.
///
/// Every mutation rewrites the whole document. The in-memory sequence is
/// authoritative for the running process: a failed write is reported to the
/// caller but the mutation is kept, so memory and disk can differ until the
/// next successful write.
#[derive(Debug)]
pub struct HistoryStore {
    path: PathBuf,
    tz: Tz,
    entries: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HistoryStats {
    pub total: usize,
    pub spam: usize,
}

impl HistoryStats {
    pub fn from_entries(entries: &[HistoryEntry]) -> Self {
        Self {
            total: entries.len(),
            spam: entries
                .iter()
                .filter(|entry| entry.result.classification.is_spam())
                .count(),
        }
    }

    pub fn legitimate(&self) -> usize {
        self.total - self.spam
    }

    pub fn spam_percentage(&self) -> Option<f64> {
        (self.total > 0).then(|| self.spam as f64 / self.total as f64 * 100.0)
    }

    pub fn legitimate_percentage(&self) -> Option<f64> {
        self.spam_percentage().map(|spam| 100.0 - spam)
    }
}

impl HistoryStore {
    /// Creates an empty store for `path`; call [`HistoryStore::load`] to read it.
    pub fn new(path: impl Into<PathBuf>, tz: Tz) -> Self {
        Self {
            path: path.into(),
            tz,
            entries: Vec::new(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn entries(&self) -> &[HistoryEntry] {
        &self.entries
    }

    pub fn get(&self, id: u64) -> Option<&HistoryEntry> {
        self.entries.iter().find(|entry| entry.id == id)
    }

    /// Newest first.
    pub fn recent(&self, limit: usize) -> impl Iterator<Item = &HistoryEntry> {
        self.entries.iter().rev().take(limit)
    }

    pub fn stats(&self) -> HistoryStats {
        HistoryStats::from_entries(&self.entries)
    }

    pub fn document_size(&self) -> Option<u64> {
        fs::metadata(&self.path).ok().map(|meta| meta.len())
    }

    /// Replaces the in-memory sequence with the backing document.
    ///
    /// A missing document yields an empty history. On a read or parse error the
    /// store is left empty and the error is returned for reporting.
    pub fn load(&mut self) -> Result<&[HistoryEntry], HistoryError> {
        self.entries.clear();
        match read_document(&self.path) {
            Ok(entries) => {
                tracing::info!(
                    target: "history",
                    path = %self.path.display(),
                    entries = entries.len(),
                    "history loaded"
                );
                self.entries = entries;
                Ok(&self.entries)
            }
            Err(err) => {
                tracing::error!(target: "history", error = %err, "failed to load history");
                Err(err)
            }
        }
    }

    /// Records a classification and rewrites the document.
    ///
    /// On `Err` the entry is still part of the in-memory history.
    pub fn append(
        &mut self,
        email_content: &str,
        result: ClassificationResult,
    ) -> Result<HistoryEntry, HistoryError> {
        self.append_at(email_content, result, Utc::now())
    }

    fn append_at(
        &mut self,
        email_content: &str,
        result: ClassificationResult,
        now: DateTime<Utc>,
    ) -> Result<HistoryEntry, HistoryError> {
        let entry = HistoryEntry {
            id: self.entries.len() as u64 + 1,
            timestamp: now,
            email_content: email_content.to_string(),
            content_preview: content_preview(email_content),
            result,
            session_info: SessionInfo {
                user_agent: Some(ORIGIN.to_string()),
                classification_time: now
                    .with_timezone(&self.tz)
                    .format("%Y-%m-%d %H:%M:%S")
                    .to_string(),
            },
        };
        self.entries.push(entry.clone());

        tracing::info!(
            target: "history",
            id = entry.id,
            classification = %entry.result.classification,
            "history entry appended"
        );
        self.persist()?;
        Ok(entry)
    }

    /// Empties the history. Confirmation is the caller's job.
    pub fn clear(&mut self) -> Result<(), HistoryError> {
        let removed = self.entries.len();
        self.entries.clear();
        tracing::info!(target: "history", removed, "history cleared");
        self.persist()
    }

    /// The whole history in the on-disk document format.
    pub fn export(&self) -> Result<String, HistoryError> {
        Ok(serde_json::to_string_pretty(&self.entries)?)
    }

    fn persist(&self) -> Result<(), HistoryError> {
        let result = write_document(&self.path, &self.entries);
        if let Err(err) = &result {
            tracing::error!(target: "history", error = %err, "failed to save history");
        }
        result
    }
}

pub fn read_document(path: &Path) -> Result<Vec<HistoryEntry>, HistoryError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(err) if err.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(HistoryError::Read {
                path: path.to_path_buf(),
                source,
            })
        }
    };
    serde_json::from_str(&raw).map_err(|source| HistoryError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Writes through a sibling temp file so a crash never leaves a truncated document.
fn write_document(path: &Path, entries: &[HistoryEntry]) -> Result<(), HistoryError> {
    let write_err = |source| HistoryError::Write {
        path: path.to_path_buf(),
        source,
    };
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut document = serde_json::to_vec_pretty(entries)?;
    document.push(b'\n');

    let mut tmp = NamedTempFile::new_in(dir).map_err(write_err)?;
    tmp.write_all(&document).map_err(write_err)?;
    tmp.flush().map_err(write_err)?;
    tmp.persist(path).map_err(|err| write_err(err.error))?;
    Ok(())
}

pub fn export_file_name(now: &DateTime<Tz>) -> String {
    format!("email_classifications_{}.json", now.format("%Y%m%d_%H%M%S"))
}
