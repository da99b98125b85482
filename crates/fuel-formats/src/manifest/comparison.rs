//! Manifest comparison
//!
//! Classifies the files of a new manifest against an installed one by path.
//! Only the first package of each manifest takes part.

use crate::manifest::{FileEntry, Manifest};
use std::collections::HashMap;
use tracing::debug;

/// Difference between a new manifest and the installed one
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comparison {
    /// Files whose path is not installed
    pub new: Vec<FileEntry>,
    /// Installed files whose path is gone from the new manifest
    pub removed: Vec<FileEntry>,
    /// `(installed, new)` pairs sharing a path but not a hash
    pub updated: Vec<(FileEntry, FileEntry)>,
}

impl Comparison {
    /// Compare `new` against `old`; without `old` every file is new
    pub fn compare(new: &Manifest, old: Option<&Manifest>) -> Self {
        Self::compare_files(new.files(), old.map(Manifest::files))
    }

    /// Compare two file lists
    ///
    /// `new` and `updated` follow the order of `new`; `removed` follows the
    /// order of `old`.
    pub fn compare_files(new: &[FileEntry], old: Option<&[FileEntry]>) -> Self {
        let Some(old) = old else {
            return Self {
                new: new.to_vec(),
                ..Self::default()
            };
        };

        // last occurrence wins for duplicated paths
        let index: HashMap<&str, usize> = old
            .iter()
            .enumerate()
            .map(|(i, f)| (f.path.as_str(), i))
            .collect();
        let mut matched = vec![false; old.len()];

        let mut comparison = Self::default();
        for file in new {
            match index.get(file.path.as_str()) {
                Some(&i) if !matched[i] => {
                    matched[i] = true;
                    if old[i].hash != file.hash {
                        comparison.updated.push((old[i].clone(), file.clone()));
                    }
                }
                _ => comparison.new.push(file.clone()),
            }
        }

        comparison.removed = old
            .iter()
            .enumerate()
            .filter(|(i, f)| !matched[*i] && index.get(f.path.as_str()) == Some(i))
            .map(|(_, f)| f.clone())
            .collect();

        debug!(
            new = comparison.new.len(),
            updated = comparison.updated.len(),
            removed = comparison.removed.len(),
            "Compared manifests"
        );
        comparison
    }

    /// True when nothing needs to be downloaded or removed
    pub fn is_empty(&self) -> bool {
        self.new.is_empty() && self.removed.is_empty() && self.updated.is_empty()
    }

    /// Number of files that must be fetched
    pub fn download_count(&self) -> usize {
        self.new.len() + self.updated.len()
    }
}
