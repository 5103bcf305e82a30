use std::collections::{BTreeMap, BTreeSet};
use std::fs;
use std::path::{Path, PathBuf};

use parity_canonical::ParseError;
use tracing::{debug, warn};

use crate::error::{BatchError, BatchResult};

/// Named raw artifacts keyed by file stem.
///
/// A name whose file could not be turned into text keeps its slot and carries
/// the reason instead, so it is reported against that item.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Collection {
    texts: BTreeMap<String, String>,
    unreadable: BTreeMap<String, String>,
}

impl Collection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, name: impl Into<String>, text: impl Into<String>) {
        let name = name.into();
        self.unreadable.remove(&name);
        self.texts.insert(name, text.into());
    }

    /// Record a name whose artifact could not be read.
    pub fn insert_unreadable(&mut self, name: impl Into<String>, reason: impl Into<String>) {
        let name = name.into();
        self.texts.remove(&name);
        self.unreadable.insert(name, reason.into());
    }

    /// The artifact text, or the reason it is unavailable.
    pub fn get(&self, name: &str) -> Option<Result<&str, &str>> {
        if let Some(text) = self.texts.get(name) {
            return Some(Ok(text.as_str()));
        }
        self.unreadable.get(name).map(|reason| Err(reason.as_str()))
    }

    /// Every name, readable or not.
    pub fn names(&self) -> BTreeSet<&str> {
        self.texts
            .keys()
            .chain(self.unreadable.keys())
            .map(String::as_str)
            .collect()
    }

    pub fn unreadable(&self) -> &BTreeMap<String, String> {
        &self.unreadable
    }

    pub fn len(&self) -> usize {
        self.texts.len() + self.unreadable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl FromIterator<(String, String)> for Collection {
    fn from_iter<I: IntoIterator<Item = (String, String)>>(iter: I) -> Self {
        let mut collection = Collection::new();
        for (name, text) in iter {
            collection.insert(name, text);
        }
        collection
    }
}

/// Read every `*.{extension}` file in `dir` (not recursive).
///
/// Only a missing or unlistable directory fails the load. A file with a
/// non-UTF-8 name or body, an unreadable file, and stems shared by several
/// files (`x.xml` and `x.XML`) are recorded as unreadable names.
pub fn load_collection(dir: &Path, extension: &str) -> BatchResult<Collection> {
    if !dir.is_dir() {
        return Err(BatchError::NotADirectory {
            path: dir.to_path_buf(),
        });
    }
    let io_error = |source: std::io::Error| BatchError::Io {
        path: dir.to_path_buf(),
        source,
    };

    let mut by_stem: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
    for entry in fs::read_dir(dir).map_err(io_error)? {
        let path = entry.map_err(io_error)?.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case(extension));
        if !matches || !path.is_file() {
            continue;
        }
        let Some(stem) = path.file_stem() else {
            continue;
        };
        by_stem
            .entry(stem.to_string_lossy().into_owned())
            .or_default()
            .push(path);
    }

    let mut collection = Collection::new();
    for (name, mut paths) in by_stem {
        let outcome = match paths.as_slice() {
            [path] => read_artifact(path),
            _ => {
                paths.sort();
                let files: Vec<String> = paths.iter().map(|p| file_label(p)).collect();
                Err(format!("ambiguous name, matched by {}", files.join(", ")))
            }
        };
        match outcome {
            Ok(text) => collection.insert(name, text),
            Err(reason) => {
                warn!(dir = %dir.display(), name = %name, reason = %reason, "unreadable artifact");
                collection.insert_unreadable(name, reason);
            }
        }
    }
    debug!(
        dir = %dir.display(),
        items = collection.len(),
        unreadable = collection.unreadable().len(),
        "loaded collection"
    );
    Ok(collection)
}

fn file_label(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

fn read_artifact(path: &Path) -> Result<String, String> {
    let label = file_label(path);
    if path.file_stem().and_then(|s| s.to_str()).is_none() {
        return Err(ParseError::Utf8 {
            context: format!("file name {}", label),
        }
        .to_string());
    }
    let bytes = fs::read(path).map_err(|e| format!("failed to read {}: {}", label, e))?;
    String::from_utf8(bytes).map_err(|_| ParseError::Utf8 { context: label }.to_string())
}
