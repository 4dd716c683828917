use std::fs;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::constants::{default_label_dirs, KERNEL_CMDLINE_PATH, SGDISK_PROGRAM};
use crate::error::Result;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Backend {
    /// spawn sgdisk for every read and write
    #[default]
    Sgdisk,
    /// read and write the gpt directly
    Native,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub backend: Backend,
    pub sgdisk: PathBuf,
    pub label_dirs: Vec<PathBuf>,
    pub boot_params: PathBuf,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            backend: Backend::default(),
            sgdisk: PathBuf::from(SGDISK_PROGRAM),
            label_dirs: default_label_dirs(),
            boot_params: PathBuf::from(KERNEL_CMDLINE_PATH),
        }
    }
}

impl Config {
    pub fn from_toml(path: &str) -> Result<Self> {
        let data = fs::read_to_string(path)?;
        Ok(toml::from_str(&data)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: Config = toml::from_str("backend = \"native\"\nsgdisk = \"/system/bin/sgdisk\"\n").unwrap();
        assert_eq!(config.backend, Backend::Native);
        assert_eq!(config.sgdisk, PathBuf::from("/system/bin/sgdisk"));
        assert_eq!(config.label_dirs, default_label_dirs());
        assert_eq!(config.boot_params, PathBuf::from("/proc/cmdline"));
    }

    #[test]
    fn test_from_toml_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bootctl.toml");
        fs::write(&path, "label_dirs = [\"/dev/block/by-name\"]\n").unwrap();
        let config = Config::from_toml(path.to_str().unwrap()).unwrap();
        assert_eq!(config.backend, Backend::Sgdisk);
        assert_eq!(config.label_dirs, vec![PathBuf::from("/dev/block/by-name")]);

        fs::write(&path, "backend = \"fastboot\"\n").unwrap();
        assert!(matches!(Config::from_toml(path.to_str().unwrap()), Err(Error::Config(_))));
    }
}
