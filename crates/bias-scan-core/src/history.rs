use std::{collections::VecDeque, fs, io::ErrorKind, path::PathBuf};

use anyhow::{Context, Result};
use tracing::{debug, warn};

use crate::scanner::AnalysisResult;

pub const DEFAULT_HISTORY_CAPACITY: usize = 10;

/// Bounded, newest-first list of past analyses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnalysisHistory {
    entries: VecDeque<AnalysisResult>,
    capacity: usize,
}

impl Default for AnalysisHistory {
    fn default() -> Self {
        Self::with_capacity(DEFAULT_HISTORY_CAPACITY)
    }
}

impl AnalysisHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// A capacity of zero is treated as one.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            entries: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    /// Build from stored entries (newest first), keeping at most `capacity`.
    pub fn from_entries(entries: Vec<AnalysisResult>, capacity: usize) -> Self {
        let mut history = Self::with_capacity(capacity);
        history.entries.extend(entries.into_iter().take(history.capacity));
        history
    }

    /// Insert `result` as the newest entry, dropping the oldest past capacity.
    pub fn record(&mut self, result: AnalysisResult) {
        self.entries.push_front(result);
        self.entries.truncate(self.capacity);
    }

    pub fn entries(&self) -> impl Iterator<Item = &AnalysisResult> {
        self.entries.iter()
    }

    pub fn latest(&self) -> Option<&AnalysisResult> {
        self.entries.front()
    }

    pub fn get(&self, idx: usize) -> Option<&AnalysisResult> {
        self.entries.get(idx)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}

/// Durable JSON file holding an [`AnalysisHistory`].
pub struct HistoryStore {
    path: PathBuf,
    capacity: usize,
}

impl HistoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self::with_capacity(path, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(path: impl Into<PathBuf>, capacity: usize) -> Self {
        Self {
            path: path.into(),
            capacity,
        }
    }

    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    /// Load stored history. Missing, unreadable, or corrupt files yield an
    /// empty history.
    pub fn load(&self) -> AnalysisHistory {
        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                debug!(path = %self.path.display(), "no stored history");
                return AnalysisHistory::with_capacity(self.capacity);
            }
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to read history, starting empty");
                return AnalysisHistory::with_capacity(self.capacity);
            }
        };
        match serde_json::from_str::<Vec<AnalysisResult>>(&raw) {
            Ok(entries) => AnalysisHistory::from_entries(entries, self.capacity),
            Err(err) => {
                warn!(path = %self.path.display(), error = %err, "failed to load history, starting empty");
                AnalysisHistory::with_capacity(self.capacity)
            }
        }
    }

    /// Persist `history`. An empty history leaves the file untouched; use
    /// [`HistoryStore::clear`] to remove it.
    pub fn save(&self, history: &AnalysisHistory) -> Result<()> {
        if history.is_empty() {
            return Ok(());
        }
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).with_context(|| {
                format!("failed to create history directory {}", parent.display())
            })?;
        }
        let entries: Vec<&AnalysisResult> = history.entries().collect();
        let json = serde_json::to_string(&entries).context("failed to serialize history")?;
        fs::write(&self.path, json)
            .with_context(|| format!("failed to write history to {}", self.path.display()))?;
        debug!(entries = history.len(), path = %self.path.display(), "history saved");
        Ok(())
    }

    /// Load, record `result`, and save in one step.
    pub fn append(&self, result: AnalysisResult) -> Result<AnalysisHistory> {
        let mut history = self.load();
        history.record(result);
        self.save(&history)?;
        Ok(history)
    }

    pub fn clear(&self) -> Result<()> {
        match fs::remove_file(&self.path) {
            Ok(()) => Ok(()),
            Err(err) if err.kind() == ErrorKind::NotFound => Ok(()),
            Err(err) => Err(err)
                .with_context(|| format!("failed to remove history at {}", self.path.display())),
        }
    }
}
