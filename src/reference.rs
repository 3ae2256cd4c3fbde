//! Ground-truth doctor notes, keyed by file name.

use std::collections::BTreeMap;
use std::fs;
use std::path::Path;
use tracing::{debug, info, warn};

use crate::error::{EvalError, Result};

/// Reference notes held in lexicographic key order.
///
/// Iteration order is the tie-break order used by the matcher, so it must
/// stay sorted.
#[derive(Debug, Clone, Default)]
pub struct ReferenceSet {
    documents: BTreeMap<String, String>,
}

impl ReferenceSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Load every file in `dir` whose extension is in `extensions`.
    ///
    /// Subdirectories are not searched. A missing directory is fatal.
    pub fn load_dir(dir: &Path, extensions: &[String]) -> Result<Self> {
        if !dir.is_dir() {
            return Err(EvalError::InputNotFound {
                path: dir.to_path_buf(),
            });
        }

        let mut set = Self::new();
        for entry in fs::read_dir(dir)? {
            let path = entry?.path();
            if !path.is_file() || !has_extension(&path, extensions) {
                continue;
            }
            let Some(key) = path.file_name().and_then(|n| n.to_str()) else {
                warn!("Skipping reference with non UTF-8 name: {:?}", path);
                continue;
            };
            let text = fs::read_to_string(&path).map_err(|source| EvalError::Read {
                path: path.clone(),
                source,
            })?;
            debug!("Loaded reference {} ({} chars)", key, text.chars().count());
            set.insert(key.to_string(), text);
        }

        if set.is_empty() {
            warn!("No reference documents found in {}", dir.display());
        } else {
            info!("Loaded {} reference documents from {}", set.len(), dir.display());
        }
        Ok(set)
    }

    pub fn insert(&mut self, key: impl Into<String>, text: impl Into<String>) {
        self.documents.insert(key.into(), text.into());
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }

    /// (key, text) pairs in sorted key order
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.documents.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for ReferenceSet {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (k, v) in iter {
            set.insert(k, v);
        }
        set
    }
}

fn has_extension(path: &Path, extensions: &[String]) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .map(|ext| extensions.iter().any(|want| want.eq_ignore_ascii_case(ext)))
        .unwrap_or(false)
}
