use std::fs;
use std::path::{Path, PathBuf};

use gpt::disk::LogicalBlockSize;
use gpt::partition::Partition;
use gpt::{GptConfig, GptDisk};
use log::debug;

use crate::bitfield::Bitfield;
use crate::constants::SYSFS_BLOCK_DIR;
use crate::error::{Error, Result};
use crate::gateway::AttributeGateway;
use crate::locator::PartitionLocation;
use crate::partition_info::PartitionInfo;

/// Gateway that edits the GPT entry in place through the gpt crate
pub struct GptGateway {
    sysfs_block_dir: PathBuf,
}

impl Default for GptGateway {
    fn default() -> Self {
        GptGateway { sysfs_block_dir: PathBuf::from(SYSFS_BLOCK_DIR) }
    }
}

impl GptGateway {
    pub fn with_sysfs(sysfs_block_dir: impl Into<PathBuf>) -> Self {
        GptGateway { sysfs_block_dir: sysfs_block_dir.into() }
    }

    /// get disk sector size via /sys/class/block/<disk>/queue/logical_block_size
    pub fn get_disk_sector_size(&self, disk: &Path) -> Result<u64> {
        let disk_name = disk
            .file_name()
            .ok_or_else(|| Error::Lookup(format!("invalid disk path {}", disk.display())))?;
        let path = self.sysfs_block_dir.join(disk_name).join("queue/logical_block_size");
        let size_str = fs::read_to_string(&path)?;
        size_str
            .trim()
            .parse()
            .map_err(|_| Error::Parse(format!("invalid sector size '{}' in {}", size_str.trim(), path.display())))
    }

    /// try get disk lba, only 512 and 4096 byte sectors exist on these devices
    pub fn try_get_disk_lba(&self, disk: &Path) -> Result<LogicalBlockSize> {
        match self.get_disk_sector_size(disk)? {
            512 => Ok(LogicalBlockSize::Lb512),
            4096 => Ok(LogicalBlockSize::Lb4096),
            other => Err(Error::Parse(format!("unsupported sector size {}", other))),
        }
    }

    fn get_gpt_disk(&self, disk: &Path, writable: bool) -> Result<GptDisk<fs::File>> {
        let sector = self.try_get_disk_lba(disk)?;
        GptConfig::new()
            .writable(writable)
            .logical_block_size(sector)
            .open(disk)
            .map_err(|e| Error::Invocation(format!("open gpt on {}: {:?}", disk.display(), e)))
    }
}

/// Convert a gpt entry, rejecting entries that end before they start
fn partition_info(index: u32, part: &Partition) -> Result<PartitionInfo> {
    if part.first_lba > part.last_lba {
        return Err(Error::Parse(format!(
            "gpt entry {} first lba {} after last lba {}",
            index, part.first_lba, part.last_lba
        )));
    }
    Ok(PartitionInfo {
        guid: part.part_type_guid.guid,
        uuid: part.part_guid,
        first_sector: part.first_lba,
        last_sector: part.last_lba,
        size_sectors: part.last_lba - part.first_lba + 1,
        attributes: Bitfield::from(part.flags),
        name: part.name.clone(),
    })
}

impl AttributeGateway for GptGateway {
    fn read(&self, location: &PartitionLocation) -> Result<PartitionInfo> {
        let disk = self.get_gpt_disk(&location.disk, false)?;
        let part = disk
            .partitions()
            .get(&location.index)
            .filter(|p| p.is_used())
            .ok_or_else(|| Error::Lookup(format!("no gpt entry {} on {}", location.index, location.disk.display())))?;
        partition_info(location.index, part)
    }

    fn set_attribute_bit(&self, location: &PartitionLocation, bit_index: u32) -> Result<()> {
        if bit_index >= u64::BITS {
            return Err(Error::Range { index: bit_index, width: u64::BITS });
        }
        let mut disk = self.get_gpt_disk(&location.disk, true)?;
        let mut partitions = disk.partitions().clone();
        let part = partitions
            .get_mut(&location.index)
            .filter(|p| p.is_used())
            .ok_or_else(|| Error::Lookup(format!("no gpt entry {} on {}", location.index, location.disk.display())))?;
        part.flags |= 1 << bit_index;
        debug!("Writing flags {:#018x} to {} entry {}", part.flags, location.disk.display(), location.index);
        disk.update_partitions(partitions)
            .map_err(|e| Error::Invocation(format!("update gpt: {:?}", e)))?;
        disk.write()
            .map_err(|e| Error::Invocation(format!("write gpt on {}: {:?}", location.disk.display(), e)))?;
        Ok(())
    }
}
