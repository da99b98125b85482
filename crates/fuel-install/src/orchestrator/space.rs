//! Free space checks for the target volume

use crate::error::{InstallError, InstallResult};
use std::path::Path;
use sysinfo::Disks;
use tracing::{debug, warn};

/// Free bytes on the volume holding `path`
///
/// Picks the mounted disk with the longest mount point containing the
/// canonical path. Returns `None` when no disk matches, e.g. inside some
/// containers.
pub fn available_space(path: &Path) -> Option<u64> {
    let path = path.canonicalize().ok()?;
    let disks = Disks::new_with_refreshed_list();
    let disk = disks
        .list()
        .iter()
        .filter(|disk| path.starts_with(disk.mount_point()))
        .max_by_key(|disk| disk.mount_point().as_os_str().len())?;

    debug!(
        mount_point = %disk.mount_point().display(),
        available = disk.available_space(),
        "Queried free space"
    );
    Some(disk.available_space())
}

/// Fail when a transfer of `required` bytes would not fit
///
/// An unknown capacity is not an error.
pub fn ensure_space(required: u64, available: Option<u64>) -> InstallResult<()> {
    match available {
        Some(available) if required > 0 && required >= available => {
            Err(InstallError::InsufficientSpace {
                required,
                available,
            })
        }
        Some(_) => Ok(()),
        None => {
            warn!(required, "Free space unknown, skipping check");
            Ok(())
        }
    }
}

#[cfg(test)]
#[allow(clippy::expect_used, clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_ensure_space() {
        assert!(ensure_space(10, Some(11)).is_ok());
        assert!(ensure_space(0, Some(0)).is_ok());
        assert!(ensure_space(u64::MAX, None).is_ok());
        assert!(matches!(
            ensure_space(11, Some(11)),
            Err(InstallError::InsufficientSpace {
                required: 11,
                available: 11
            })
        ));
    }

    #[test]
    fn test_available_space_of_missing_path() {
        assert_eq!(available_space(Path::new("/definitely/not/here")), None);
    }
}
