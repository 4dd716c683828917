use std::fs;
use std::path::PathBuf;

use crate::bootctrl::BOOT_PARTITION_PREFIX;
use crate::constants::{KERNEL_CMDLINE_PATH, SLOT_PARAM, SLOT_SUFFIX_PARAM};
use crate::error::{Error, Result};

/// Source of the kernel boot parameter line
pub trait BootParamSource {
    fn read_params(&self) -> Result<String>;
}

/// Reads `/proc/cmdline` or any file with the same format
pub struct KernelCmdline {
    path: PathBuf,
}

impl KernelCmdline {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        KernelCmdline { path: path.into() }
    }
}

impl Default for KernelCmdline {
    fn default() -> Self {
        KernelCmdline::new(KERNEL_CMDLINE_PATH)
    }
}

impl BootParamSource for KernelCmdline {
    fn read_params(&self) -> Result<String> {
        Ok(fs::read_to_string(&self.path)?)
    }
}

/// Fixed parameter line, handy when the caller already has it
impl BootParamSource for String {
    fn read_params(&self) -> Result<String> {
        Ok(self.clone())
    }
}

/// Value of `key` either as a `key=value` cmdline token or as a
/// bootconfig line `key = "value"`, an empty value counts as absent
fn find_param<'a>(params: &'a str, key: &str) -> Option<&'a str> {
    let token = params
        .split_whitespace()
        .find_map(|token| token.strip_prefix(key)?.strip_prefix('='))
        .filter(|v| !v.is_empty());
    if token.is_some() {
        return token;
    }
    params
        .lines()
        .find_map(|line| {
            let (k, v) = line.split_once('=')?;
            if k.trim() != key {
                return None;
            }
            Some(v.trim().trim_matches('"'))
        })
        .filter(|v| !v.is_empty())
}

/// Slot suffix the running system was booted from, e.g. `_a`
pub fn booted_slot_suffix(params: &str) -> Result<String> {
    if let Some(suffix) = find_param(params, SLOT_SUFFIX_PARAM) {
        return Ok(suffix.to_string());
    }
    // older bootloaders only pass the slot letter
    if let Some(slot) = find_param(params, SLOT_PARAM) {
        return Ok(format!("_{}", slot));
    }
    Err(Error::Lookup(format!("{} missing from boot parameters", SLOT_SUFFIX_PARAM)))
}

pub struct ActiveSlotResolver<P: BootParamSource> {
    source: P,
}

impl<P: BootParamSource> ActiveSlotResolver<P> {
    pub fn new(source: P) -> Self {
        ActiveSlotResolver { source }
    }

    pub fn booted_slot_suffix(&self) -> Result<String> {
        booted_slot_suffix(&self.source.read_params()?)
    }

    /// `boot` partition label of the booted slot
    pub fn active_label(&self) -> Result<String> {
        Ok(format!("{}{}", BOOT_PARTITION_PREFIX, self.booted_slot_suffix()?))
    }
}
