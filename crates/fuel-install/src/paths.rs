//! Mapping manifest paths onto the install directory

use crate::error::{InstallError, InstallResult};
use std::path::{Component, Path, PathBuf};

/// Resolve a `\`-separated manifest path below `root`
///
/// Absolute paths, drive prefixes and `..` components are rejected so a
/// manifest can never write outside the install directory. Empty and `.`
/// components are dropped; an empty path resolves to `root` itself.
pub fn resolve(root: &Path, manifest_path: &str) -> InstallResult<PathBuf> {
    if manifest_path.starts_with(['\\', '/']) {
        return Err(InstallError::InvalidPath(manifest_path.to_string()));
    }

    let mut resolved = root.to_path_buf();
    for part in manifest_path.split(['\\', '/']) {
        if part.is_empty() || part == "." {
            continue;
        }
        let mut components = Path::new(part).components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) => resolved.push(name),
            _ => return Err(InstallError::InvalidPath(manifest_path.to_string())),
        }
    }
    Ok(resolved)
}

/// Sibling path with an extra extension, e.g. `a.bin` -> `a.bin.patch`
pub fn with_suffix(path: &Path, suffix: &str) -> PathBuf {
    let mut name = path.as_os_str().to_os_string();
    name.push(suffix);
    PathBuf::from(name)
}
