//! Index of the files an include directive may refer to.
//!
//! Directives usually name a file by its bare file name (`{{#include db.rs:setup}}`),
//! which only works while that name is unique inside the project. The index
//! maps every file name to all the relative paths it occurs at, so lookups can
//! tell "missing" apart from "ambiguous".

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};

use glob::Pattern;
use serde::Serialize;
use walkdir::{DirEntry, WalkDir};

use crate::error::IncludeError;

/// Filters applied while walking the project tree.
#[derive(Debug, Clone, Default)]
pub struct ScanOptions {
    /// File extensions to index, without the leading dot. Empty means all files.
    pub extensions: Vec<String>,
    /// Glob patterns matched against paths relative to the root.
    pub ignore: Vec<Pattern>,
}

impl ScanOptions {
    fn is_ignored(&self, rel: &Path) -> bool {
        self.ignore.iter().any(|p| p.matches_path(rel))
    }

    fn extension_allowed(&self, path: &Path) -> bool {
        if self.extensions.is_empty() {
            return true;
        }
        path.extension()
            .and_then(|e| e.to_str())
            .is_some_and(|ext| self.extensions.iter().any(|allowed| allowed == ext))
    }
}

/// A file name that occurs at more than one place in the project.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateFile {
    pub name: String,
    pub paths: Vec<PathBuf>,
}

#[derive(Debug, Clone)]
pub struct ProjectIndex {
    root: PathBuf,
    files: BTreeMap<String, Vec<PathBuf>>,
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry.depth() > 0
        && entry
            .file_name()
            .to_str()
            .is_some_and(|name| name.starts_with('.'))
}

impl ProjectIndex {
    /// Walk `root` and index every file that passes `options`.
    pub fn scan(root: &Path, options: &ScanOptions) -> Result<Self, IncludeError> {
        if !root.is_dir() {
            return Err(IncludeError::FileNotFound {
                reference: root.display().to_string(),
            });
        }

        let mut files: BTreeMap<String, Vec<PathBuf>> = BTreeMap::new();
        let walker = WalkDir::new(root)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if is_hidden(entry) {
                    return false;
                }
                match entry.path().strip_prefix(root) {
                    Ok(rel) if !rel.as_os_str().is_empty() => !options.is_ignored(rel),
                    _ => true,
                }
            });

        for entry in walker {
            let entry = match entry {
                Ok(entry) => entry,
                Err(err) => {
                    tracing::debug!(error = %err, "skipping unreadable entry");
                    continue;
                }
            };
            if !entry.file_type().is_file() || !options.extension_allowed(entry.path()) {
                continue;
            }
            let Some(name) = entry.file_name().to_str() else {
                continue;
            };
            let Ok(rel) = entry.path().strip_prefix(root) else {
                continue;
            };
            files
                .entry(name.to_string())
                .or_default()
                .push(rel.to_path_buf());
        }

        tracing::debug!(root = %root.display(), names = files.len(), "indexed project");
        Ok(Self {
            root: root.to_path_buf(),
            files,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Number of indexed files.
    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    /// Every indexed path, relative to the root, sorted.
    pub fn paths(&self) -> Vec<PathBuf> {
        let mut out: Vec<PathBuf> = self.files.values().flatten().cloned().collect();
        out.sort();
        out
    }

    /// Resolve a directive's file reference to an absolute path.
    ///
    /// References containing a separator are taken relative to the root and
    /// must name an indexed file. Bare names are looked up in the index and
    /// must be unique.
    pub fn resolve(&self, reference: &str) -> Result<PathBuf, IncludeError> {
        let not_found = || IncludeError::FileNotFound {
            reference: reference.to_string(),
        };

        if reference.contains('/') || reference.contains('\\') {
            let normalized = reference.replace('\\', "/");
            let mut rel = PathBuf::new();
            for component in Path::new(&normalized).components() {
                match component {
                    Component::Normal(part) => rel.push(part),
                    Component::CurDir => {}
                    _ => return Err(not_found()),
                }
            }
            // Only indexed paths resolve, so hidden, ignored and filtered
            // files stay out, as does anything reached through a symlink.
            let name = rel
                .file_name()
                .and_then(|n| n.to_str())
                .ok_or_else(not_found)?;
            return match self.files.get(name) {
                Some(paths) if paths.contains(&rel) => Ok(self.root.join(&rel)),
                _ => Err(not_found()),
            };
        }

        match self.files.get(reference).map(Vec::as_slice) {
            Some([only]) => Ok(self.root.join(only)),
            Some(many) if many.len() > 1 => Err(IncludeError::AmbiguousFile {
                reference: reference.to_string(),
                candidates: many.to_vec(),
            }),
            _ => Err(not_found()),
        }
    }

    /// File names that occur at more than one path, sorted by name.
    pub fn duplicate_files(&self) -> Vec<DuplicateFile> {
        self.files
            .iter()
            .filter(|(_, paths)| paths.len() > 1)
            .map(|(name, paths)| DuplicateFile {
                name: name.clone(),
                paths: paths.clone(),
            })
            .collect()
    }
}
