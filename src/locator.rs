use std::collections::BTreeMap;
use std::fs;
use std::path::{Component, Path, PathBuf};

use log::{debug, warn};

use crate::constants::get_block_dev_dir;
use crate::error::{Error, Result};

/// Disk device and GPT entry number of one partition
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionLocation {
    pub disk: PathBuf,
    pub index: u32,
}

/// Label to device path map, captured once and handed to the locator
#[derive(Debug, Clone, Default)]
pub struct LabelSnapshot {
    source: Option<PathBuf>,
    entries: BTreeMap<String, PathBuf>,
}

impl LabelSnapshot {
    pub fn from_entries<I, L, P>(entries: I) -> Self
    where
        I: IntoIterator<Item = (L, P)>,
        L: Into<String>,
        P: Into<PathBuf>,
    {
        LabelSnapshot {
            source: None,
            entries: entries.into_iter().map(|(l, p)| (l.into(), p.into())).collect(),
        }
    }

    /// Read every symlink of a by-name directory
    pub fn capture(dir: &Path) -> Result<Self> {
        Ok(LabelSnapshot {
            source: Some(dir.to_path_buf()),
            entries: read_label_links(dir)?,
        })
    }

    /// Capture from the first existing candidate directory
    pub fn discover(candidates: &[PathBuf]) -> Result<Self> {
        let dir = get_block_dev_dir(candidates).ok_or_else(|| {
            Error::Lookup(format!("no partition label directory among {:?}", candidates))
        })?;
        debug!("Using label directory {}", dir.display());
        LabelSnapshot::capture(&dir)
    }

    /// Re-read the source directory, snapshots built from entries are left as is
    pub fn refresh(&mut self) -> Result<()> {
        if let Some(dir) = &self.source {
            self.entries = read_label_links(dir)?;
        }
        Ok(())
    }

    pub fn get(&self, label: &str) -> Option<&Path> {
        self.entries.get(label).map(PathBuf::as_path)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

fn read_label_links(dir: &Path) -> Result<BTreeMap<String, PathBuf>> {
    let mut entries = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let entry = entry?;
        if !entry.file_type()?.is_symlink() {
            continue;
        }
        let label = match entry.file_name().to_str() {
            Some(name) => name.to_string(),
            None => {
                warn!("skip non utf-8 label {:?}", entry.file_name());
                continue;
            }
        };
        let target = PathBuf::from(nix::fcntl::readlink(entry.path().as_path()).map_err(std::io::Error::from)?);
        entries.insert(label, resolve_link_target(dir, &target));
    }
    debug!("Captured {} partition labels from {}", entries.len(), dir.display());
    Ok(entries)
}

/// Relative link targets (`../../mmcblk0p7`) are joined to the link dir and
/// normalized lexically, the device node need not exist
fn resolve_link_target(dir: &Path, target: &Path) -> PathBuf {
    if target.is_absolute() {
        return target.to_path_buf();
    }
    let mut resolved = PathBuf::new();
    for component in dir.join(target).components() {
        match component {
            Component::ParentDir => {
                resolved.pop();
            }
            Component::CurDir => {}
            other => resolved.push(other.as_os_str()),
        }
    }
    resolved
}

/// Split a partition device path into disk and partition number,
/// `/dev/sda7` -> (`/dev/sda`, 7), `/dev/mmcblk0p12` -> (`/dev/mmcblk0`, 12)
pub fn split_device_path(device: &Path) -> Result<PartitionLocation> {
    let path = device
        .to_str()
        .ok_or_else(|| Error::Lookup(format!("non utf-8 device path {:?}", device)))?;
    let prefix = path.trim_end_matches(|c: char| c.is_ascii_digit());
    let digits = &path[prefix.len()..];
    if digits.is_empty() || prefix.is_empty() {
        return Err(Error::Lookup(format!("device path {} has no partition number", path)));
    }
    let index = digits
        .parse()
        .map_err(|_| Error::Lookup(format!("partition number {} out of range", digits)))?;
    // disks whose name ends in a digit separate the partition number with 'p'
    let disk = match prefix.strip_suffix('p') {
        Some(disk) if disk.ends_with(|c: char| c.is_ascii_digit()) => disk,
        _ => prefix,
    };
    Ok(PartitionLocation { disk: PathBuf::from(disk), index })
}

pub struct PartitionLocator {
    snapshot: LabelSnapshot,
}

impl PartitionLocator {
    pub fn new(snapshot: LabelSnapshot) -> Self {
        PartitionLocator { snapshot }
    }

    pub fn resolve(&self, label: &str) -> Result<PartitionLocation> {
        let device = self
            .snapshot
            .get(label)
            .ok_or_else(|| Error::Lookup(format!("partition label {} not found", label)))?;
        let location = split_device_path(device)?;
        debug!("Resolved {} -> {} partition {}", label, location.disk.display(), location.index);
        Ok(location)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::os::unix::fs::symlink;

    fn location(disk: &str, index: u32) -> PartitionLocation {
        PartitionLocation { disk: PathBuf::from(disk), index }
    }

    #[test]
    fn test_split_mmc_multi_digit() {
        assert_eq!(split_device_path(Path::new("/dev/mmcblk0p7")).unwrap(), location("/dev/mmcblk0", 7));
        assert_eq!(split_device_path(Path::new("/dev/mmcblk0p12")).unwrap(), location("/dev/mmcblk0", 12));
        assert_ne!(split_device_path(Path::new("/dev/mmcblk0p7")).unwrap().disk, PathBuf::from("/dev/mmcblk0p"));
    }

    #[test]
    fn test_split_scsi_and_nvme() {
        assert_eq!(split_device_path(Path::new("/dev/sda7")).unwrap(), location("/dev/sda", 7));
        assert_eq!(split_device_path(Path::new("/dev/block/sde12")).unwrap(), location("/dev/block/sde", 12));
        assert_eq!(split_device_path(Path::new("/dev/nvme0n1p3")).unwrap(), location("/dev/nvme0n1", 3));
    }

    #[test]
    fn test_split_without_number() {
        assert!(matches!(split_device_path(Path::new("/dev/sda")), Err(Error::Lookup(_))));
        assert!(matches!(split_device_path(Path::new("1234")), Err(Error::Lookup(_))));
    }

    #[test]
    fn test_resolve_unknown_label() {
        let locator = PartitionLocator::new(LabelSnapshot::from_entries([("boot_a", "/dev/sde12")]));
        assert_eq!(locator.resolve("boot_a").unwrap(), location("/dev/sde", 12));
        assert!(matches!(locator.resolve("boot_b"), Err(Error::Lookup(_))));
    }

    #[test]
    fn test_capture_and_refresh() {
        let dir = tempfile::tempdir().unwrap();
        symlink("/dev/mmcblk0p7", dir.path().join("boot_a")).unwrap();
        symlink("../../mmcblk0p8", dir.path().join("boot_b")).unwrap();
        fs::write(dir.path().join("not_a_link"), b"").unwrap();

        let mut snapshot = LabelSnapshot::capture(dir.path()).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.get("boot_a"), Some(Path::new("/dev/mmcblk0p7")));
        let expected_b = dir.path().parent().unwrap().parent().unwrap().join("mmcblk0p8");
        assert_eq!(snapshot.get("boot_b"), Some(expected_b.as_path()));

        symlink("/dev/mmcblk0p9", dir.path().join("system_a")).unwrap();
        assert!(snapshot.get("system_a").is_none());
        snapshot.refresh().unwrap();
        assert_eq!(snapshot.get("system_a"), Some(Path::new("/dev/mmcblk0p9")));
    }

    #[test]
    fn test_discover_skips_missing_dirs() {
        let dir = tempfile::tempdir().unwrap();
        symlink("/dev/sda3", dir.path().join("boot_b")).unwrap();
        let candidates = vec![dir.path().join("missing"), dir.path().to_path_buf()];
        let snapshot = LabelSnapshot::discover(&candidates).unwrap();
        assert_eq!(snapshot.get("boot_b"), Some(Path::new("/dev/sda3")));
        assert!(LabelSnapshot::discover(&[dir.path().join("missing")]).is_err());
    }
}
