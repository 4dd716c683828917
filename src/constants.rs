use std::fs;
use std::path::PathBuf;

pub const SGDISK_PROGRAM: &str = "sgdisk";
pub const KERNEL_CMDLINE_PATH: &str = "/proc/cmdline";
pub const SYSFS_BLOCK_DIR: &str = "/sys/class/block";

pub const BLOCK_DEV_NAME_PARTLABEL: &str = "/dev/disk/by-partlabel/";
pub const BLOCK_DEV_NAME_MAPPER: &str = "/dev/block/by-name/";
pub const BLOCK_DEV_NAME_BOOT: &str = "/dev/block/bootdevice/by-name/";

pub const SLOT_SUFFIX_PARAM: &str = "androidboot.slot_suffix";
pub const SLOT_PARAM: &str = "androidboot.slot";

/// Label directories probed in order when no config overrides them
pub fn default_label_dirs() -> Vec<PathBuf> {
    [BLOCK_DEV_NAME_PARTLABEL, BLOCK_DEV_NAME_MAPPER, BLOCK_DEV_NAME_BOOT]
        .iter()
        .map(PathBuf::from)
        .collect()
}

/// Get the first label directory that exists
pub fn get_block_dev_dir(candidates: &[PathBuf]) -> Option<PathBuf> {
    candidates
        .iter()
        .find(|dir| fs::metadata(dir).map(|m| m.is_dir()).unwrap_or(false))
        .cloned()
}
