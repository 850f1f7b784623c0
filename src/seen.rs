//! Durable set of listing ids that were already notified or baselined.
//!
//! Ids keep insertion order so the growth bound can drop the oldest ones.
//! The whole collection is rewritten after every mutation, through a
//! sibling temp file and a rename so a crash never leaves half a document.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::error::SniperError;

pub const SEEN_CEILING: usize = 1000;
pub const SEEN_KEEP: usize = 500;

#[derive(Debug)]
pub struct SeenSet {
    path: PathBuf,
    order: Vec<String>,
    index: HashSet<String>,
}

impl SeenSet {
    /// Loads the stored ids. A missing file is an empty set; an unreadable
    /// or malformed one is logged and also treated as empty.
    pub fn load(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let ids = match read_ids(&path) {
            Ok(ids) => ids,
            Err(e) => {
                warn!(error = %e, "could not load seen listings; starting empty");
                Vec::new()
            }
        };
        let mut set = Self::empty(path);
        for id in ids {
            set.insert(id);
        }
        info!(count = set.len(), path = %set.path.display(), "loaded seen listings");
        set
    }

    fn empty(path: PathBuf) -> Self {
        Self {
            path,
            order: Vec::new(),
            index: HashSet::new(),
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    #[must_use]
    pub fn is_new(&self, id: &str) -> bool {
        !self.index.contains(id)
    }

    #[must_use]
    pub fn ids(&self) -> &[String] {
        &self.order
    }

    fn insert(&mut self, id: String) -> bool {
        if self.index.contains(&id) {
            return false;
        }
        self.index.insert(id.clone());
        self.order.push(id);
        true
    }

    /// Records one id and persists immediately.
    pub fn mark_seen(&mut self, id: &str) {
        if self.insert(id.to_string()) {
            self.persist_or_warn();
        }
    }

    /// Records a batch of ids with a single write. Returns how many were new.
    pub fn mark_all<I, S>(&mut self, ids: I) -> usize
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut added = 0;
        for id in ids {
            if self.insert(id.into()) {
                added += 1;
            }
        }
        self.persist_or_warn();
        added
    }

    /// Once above `ceiling`, keeps only the `keep` most recently added ids.
    /// Returns whether anything was dropped.
    pub fn enforce_bound(&mut self, ceiling: usize, keep: usize) -> bool {
        if self.order.len() <= ceiling {
            return false;
        }
        let dropped = self.order.len().saturating_sub(keep);
        self.order.drain(..dropped);
        self.index = self.order.iter().cloned().collect();
        self.persist_or_warn();
        info!(dropped, kept = self.order.len(), "trimmed seen listings");
        true
    }

    /// Writes the full id list as a JSON array.
    ///
    /// # Errors
    ///
    /// [`SniperError::Serialize`] or [`SniperError::Persist`] when the
    /// document cannot be produced or written.
    pub fn persist(&self) -> Result<(), SniperError> {
        let json = serde_json::to_string_pretty(&self.order)?;
        write_atomic(&self.path, json.as_bytes())
    }

    fn persist_or_warn(&self) {
        if let Err(e) = self.persist() {
            warn!(error = %e, "could not save seen listings; continuing in memory");
        }
    }
}

fn read_ids(path: &Path) -> Result<Vec<String>, SniperError> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(source) => {
            return Err(SniperError::Persist {
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if raw.trim().is_empty() {
        return Ok(Vec::new());
    }
    Ok(serde_json::from_str(&raw)?)
}

fn write_atomic(path: &Path, bytes: &[u8]) -> Result<(), SniperError> {
    let persist_err = |source| SniperError::Persist {
        path: path.to_path_buf(),
        source,
    };
    if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
        fs::create_dir_all(dir).map_err(persist_err)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);
    fs::write(&tmp, bytes).map_err(persist_err)?;
    fs::rename(&tmp, path).map_err(persist_err)
}
