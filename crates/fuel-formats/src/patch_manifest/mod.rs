//! Patch plans
//!
//! A [`PatchManifest`] is the work list for one install or update pass:
//! every directory to create and every file to fetch, each with the
//! download location, expected hashes and patch type the distribution
//! service returned.

mod error;
mod hash_pairs;

pub use error::{PlanError, PlanResult};
pub use hash_pairs::{HashPair, HashPairs, MAX_HASH_PAIRS_PER_REQUEST};

use crate::manifest::{Comparison, FileEntry};
use fuel_crypto::ContentHash;
use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use tracing::{debug, warn};

/// Encoding of a downloadable body
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum PatchType {
    /// The body is the complete file
    #[default]
    None,
    /// The body is a FUEL_PATCH delta against the installed file
    FuelPatch,
}

impl PatchType {
    /// Name used by the patch lookup service
    pub fn wire_name(self) -> &'static str {
        match self {
            Self::None => "NONE",
            Self::FuelPatch => "FUEL_PATCH",
        }
    }

    /// Parse a service name; anything but `NONE` is a delta
    pub fn from_wire_name(name: &str) -> Self {
        if name.eq_ignore_ascii_case("NONE") {
            Self::None
        } else {
            Self::FuelPatch
        }
    }
}

impl fmt::Display for PatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.wire_name())
    }
}

/// Answer of the patch lookup service for one target hash
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchDescriptor {
    /// Download locations, first one preferred
    pub urls: Vec<String>,
    /// Size of the downloadable body
    pub size: u64,
    /// Hash of the downloadable body, if the service supplied one
    pub patch_hash: Option<ContentHash>,
    /// Hash of the file after download (and patching)
    pub target_hash: ContentHash,
    /// Body encoding
    pub patch_type: PatchType,
}

/// One file to fetch
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchFile {
    /// File name without directory
    pub filename: String,
    /// Parent directory in manifest form (`\`-separated, may be empty)
    pub path: String,
    /// Hash of the finished file
    pub target_hash: ContentHash,
    /// Hash of the delta body; only set for FUEL_PATCH downloads
    pub patch_hash: Option<ContentHash>,
    /// Body encoding
    pub patch_type: PatchType,
    /// Download locations, first one preferred
    pub urls: Vec<String>,
    /// Bytes to download
    pub download_size: u64,
}

impl PatchFile {
    /// Full manifest path of the file
    pub fn manifest_path(&self) -> String {
        if self.path.is_empty() {
            self.filename.clone()
        } else {
            format!("{}\\{}", self.path, self.filename)
        }
    }

    /// True when the body is a delta to apply to the installed file
    pub fn is_delta(&self) -> bool {
        self.patch_hash.is_some()
    }
}

/// Work list of one install or update pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PatchManifest {
    /// Directories to create, parents before children
    pub dirs: BTreeSet<String>,
    /// Files to fetch: updated files first, then new files
    pub files: Vec<PatchFile>,
}

impl PatchManifest {
    /// Assemble a plan from a comparison and the lookup answers
    ///
    /// Descriptors are matched by target hash value, so several paths with
    /// identical content share one descriptor. Each path is planned once:
    /// the first entry for a path wins and later ones are dropped.
    pub fn build(comparison: &Comparison, descriptors: &[PatchDescriptor]) -> PlanResult<Self> {
        let by_target: HashMap<&[u8], &PatchDescriptor> = descriptors
            .iter()
            .map(|d| (d.target_hash.value(), d))
            .collect();

        let mut planned = HashSet::new();
        let mut first_for_path = |file: &FileEntry| {
            let fresh = planned.insert(file.path.replace('/', "\\"));
            if !fresh {
                warn!(path = %file.path, "Path listed twice, keeping the first entry");
            }
            fresh
        };

        let mut plan = Self::default();
        for (_, file) in &comparison.updated {
            if !first_for_path(file) {
                continue;
            }
            let descriptor = lookup(&by_target, file)?;
            let patch_hash = match descriptor.patch_type {
                PatchType::None => None,
                PatchType::FuelPatch => descriptor.patch_hash.clone(),
            };
            plan.push(file, descriptor, patch_hash);
        }
        for file in &comparison.new {
            if !first_for_path(file) {
                continue;
            }
            let descriptor = lookup(&by_target, file)?;
            plan.push(file, descriptor, None);
        }

        debug!(
            files = plan.files.len(),
            dirs = plan.dirs.len(),
            download_size = plan.total_download_size(),
            "Built patch manifest"
        );
        Ok(plan)
    }

    fn push(
        &mut self,
        file: &FileEntry,
        descriptor: &PatchDescriptor,
        patch_hash: Option<ContentHash>,
    ) {
        let (path, filename) = split_manifest_path(&file.path);
        if !path.is_empty() {
            self.dirs.insert(path.to_string());
        }
        let patch_type = if patch_hash.is_some() {
            descriptor.patch_type
        } else {
            PatchType::None
        };
        self.files.push(PatchFile {
            filename: filename.to_string(),
            path: path.to_string(),
            target_hash: file.hash.clone(),
            patch_hash,
            patch_type,
            urls: descriptor.urls.clone(),
            download_size: descriptor.size,
        });
    }

    /// Bytes to download over the whole plan
    pub fn total_download_size(&self) -> u64 {
        self.files.iter().map(|f| f.download_size).sum()
    }

    /// True when there is nothing to fetch
    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

fn lookup<'a>(
    by_target: &HashMap<&[u8], &'a PatchDescriptor>,
    file: &FileEntry,
) -> PlanResult<&'a PatchDescriptor> {
    by_target
        .get(file.hash.value())
        .copied()
        .ok_or_else(|| PlanError::MissingDescriptor {
            path: file.path.clone(),
            target_hash: file.hash.to_hex(),
        })
}

/// Split a manifest path into parent directory and file name
///
/// Both `\` and `/` separate components.
pub fn split_manifest_path(path: &str) -> (&str, &str) {
    match path.rfind(['\\', '/']) {
        Some(i) => (&path[..i], &path[i + 1..]),
        None => ("", path),
    }
}
