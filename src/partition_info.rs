use std::collections::HashMap;
use std::fmt;

use uuid::Uuid;

use crate::bitfield::Bitfield;
use crate::error::{Error, Result};

pub const KEY_TYPE_GUID: &str = "Partition GUID code";
pub const KEY_UNIQUE_GUID: &str = "Partition unique GUID";
pub const KEY_FIRST_SECTOR: &str = "First sector";
pub const KEY_LAST_SECTOR: &str = "Last sector";
pub const KEY_SIZE: &str = "Partition size";
pub const KEY_ATTRIBUTES: &str = "Attribute flags";
pub const KEY_NAME: &str = "Partition name";

/// One partition entry as reported by the partition table tool
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionInfo {
    /// partition type guid
    pub guid: Uuid,
    /// unique partition guid
    pub uuid: Uuid,
    pub first_sector: u64,
    pub last_sector: u64,
    pub size_sectors: u64,
    pub attributes: Bitfield,
    pub name: String,
}

impl PartitionInfo {
    /// Parse the `--info` report of sgdisk, e.g.
    /// ```text
    /// Partition GUID code: 0FC63DAF-8483-4772-8E79-3D69D8477DE4 (Linux filesystem)
    /// First sector: 2048 (at 1024.0 KiB)
    /// Attribute flags: 003B000000000000
    /// Partition name: 'boot_a'
    /// ```
    pub fn parse_report(report: &str) -> Result<Self> {
        let fields = parse_fields(report);
        let info = PartitionInfo {
            guid: parse_guid(&fields, KEY_TYPE_GUID)?,
            uuid: parse_guid(&fields, KEY_UNIQUE_GUID)?,
            first_sector: parse_u64(&fields, KEY_FIRST_SECTOR)?,
            last_sector: parse_u64(&fields, KEY_LAST_SECTOR)?,
            size_sectors: parse_u64(&fields, KEY_SIZE)?,
            attributes: Bitfield::from(parse_attribute_flags(first_token(&fields, KEY_ATTRIBUTES)?)?),
            name: require(&fields, KEY_NAME)?.trim_matches('\'').to_string(),
        };
        if info.first_sector > info.last_sector {
            return Err(Error::Parse(format!(
                "first sector {} after last sector {}",
                info.first_sector, info.last_sector
            )));
        }
        Ok(info)
    }
}

impl fmt::Display for PartitionInfo {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Partition Name: {}\nType GUID: {}\nUnique GUID: {}\nFirst Sector: {}\nLast Sector: {}\nSize: {} sectors\nAttributes: {}\n",
               self.name, self.guid, self.uuid, self.first_sector, self.last_sector, self.size_sectors, self.attributes)
    }
}

/// Parse the hex attribute string, a `0x` prefix is tolerated
pub fn parse_attribute_flags(hex: &str) -> Result<u64> {
    let digits = hex.trim_start_matches("0x").trim_start_matches("0X");
    u64::from_str_radix(digits, 16)
        .map_err(|_| Error::Parse(format!("invalid attribute flags '{}'", hex)))
}

/// split `key: value` lines on the first colon, lines without one are ignored
fn parse_fields(report: &str) -> HashMap<&str, &str> {
    report
        .lines()
        .filter_map(|line| line.split_once(':'))
        .map(|(key, value)| (key.trim(), value.trim()))
        .collect()
}

fn require<'a>(fields: &HashMap<&str, &'a str>, key: &str) -> Result<&'a str> {
    fields
        .get(key)
        .copied()
        .ok_or_else(|| Error::Parse(format!("missing '{}' in partition report", key)))
}

fn first_token<'a>(fields: &HashMap<&str, &'a str>, key: &str) -> Result<&'a str> {
    require(fields, key)?
        .split_whitespace()
        .next()
        .ok_or_else(|| Error::Parse(format!("empty '{}' in partition report", key)))
}

fn parse_u64(fields: &HashMap<&str, &str>, key: &str) -> Result<u64> {
    let token = first_token(fields, key)?;
    token
        .parse()
        .map_err(|_| Error::Parse(format!("invalid {} '{}'", key, token)))
}

fn parse_guid(fields: &HashMap<&str, &str>, key: &str) -> Result<Uuid> {
    let token = first_token(fields, key)?;
    Uuid::parse_str(token).map_err(|_| Error::Parse(format!("invalid {} '{}'", key, token)))
}

#[cfg(test)]
mod tests {
    use super::*;

    const BOOT_A_REPORT: &str = "Partition GUID code: 20117F86-E985-4357-B9EE-374BC1D8487D (Android boot 1)
Partition unique GUID: 6D1B7E53-8F3C-4B0A-9A4E-2C3F1D5E7A90
First sector: 24576 (at 96.0 MiB)
Last sector: 40959 (at 160.0 MiB)
Partition size: 16384 sectors (64.0 MiB)
Attribute flags: 003B000000000000
Partition name: 'boot_a'
";

    #[test]
    fn test_parse_report() {
        let info = PartitionInfo::parse_report(BOOT_A_REPORT).unwrap();
        assert_eq!(info.name, "boot_a");
        assert_eq!(info.first_sector, 24576);
        assert_eq!(info.last_sector, 40959);
        assert_eq!(info.size_sectors, 16384);
        assert_eq!(info.attributes.to_integer(), 0x003B_0000_0000_0000);
        assert_eq!(info.attributes.width(), 64);
        assert_eq!(
            info.guid,
            Uuid::parse_str("20117f86-e985-4357-b9ee-374bc1d8487d").unwrap()
        );
    }

    #[test]
    fn test_missing_attribute_flags() {
        let report: String = BOOT_A_REPORT
            .lines()
            .filter(|line| !line.starts_with(KEY_ATTRIBUTES))
            .map(|line| format!("{}\n", line))
            .collect();
        assert!(matches!(
            PartitionInfo::parse_report(&report),
            Err(Error::Parse(_))
        ));
    }

    #[test]
    fn test_empty_report_is_parse_error() {
        assert!(matches!(PartitionInfo::parse_report(""), Err(Error::Parse(_))));
    }

    #[test]
    fn test_non_hex_attribute_flags() {
        let report = BOOT_A_REPORT.replace("003B000000000000", "00ZZ000000000000");
        assert!(matches!(
            PartitionInfo::parse_report(&report),
            Err(Error::Parse(_))
        ));
        assert_eq!(parse_attribute_flags("0x8000000000000000").unwrap(), 1 << 63);
    }

    #[test]
    fn test_display_lists_fields() {
        let info = PartitionInfo::parse_report(BOOT_A_REPORT).unwrap();
        let text = info.to_string();
        assert!(text.starts_with("Partition Name: boot_a\n"));
        assert!(text.contains("Unique GUID: 6d1b7e53-8f3c-4b0a-9a4e-2c3f1d5e7a90\n"));
        assert!(text.contains("Size: 16384 sectors\n"));
        assert!(text.ends_with("Attributes: 00000000 00111011 00000000 00000000 00000000 00000000 00000000 00000000\n"));
    }

    #[test]
    fn test_sector_order_checked() {
        let report = BOOT_A_REPORT.replace("First sector: 24576", "First sector: 50000");
        assert!(PartitionInfo::parse_report(&report).is_err());
    }
}
