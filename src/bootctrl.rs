use std::fmt;

use crate::bitfield::Bitfield;

/// from android-13-r43
/******************************************************************************
 * AB RELATED DEFINES
 ******************************************************************************/
// Bit 48 onwards in the attribute field are the ones where we are allowed to
// store our AB attributes.
pub const AB_FLAG_OFFSET: u32 = 48;
pub const AB_FLAG_WIDTH: u32 = 8;
pub const AB_PARTITION_ATTR_SLOT_ACTIVE: u8 = 0x1 << 2;
pub const AB_PARTITION_ATTR_BOOT_SUCCESSFUL: u8 = 0x1 << 6;
pub const AB_PARTITION_ATTR_UNBOOTABLE: u8 = 0x1 << 7;
pub const AB_PARTITION_ATTR_TRIES_SHIFT: u32 = 3;
pub const AB_PARTITION_ATTR_TRIES_MASK: u8 = 0x7;
pub const AB_SLOT_MAX_TRIES: u8 = AB_PARTITION_ATTR_TRIES_MASK;

/// Position of the successful flag in the full 64 bit attribute field
pub const ATTR_BOOT_SUCCESSFUL_BIT: u32 = AB_FLAG_OFFSET + AB_PARTITION_ATTR_BOOT_SUCCESSFUL.trailing_zeros();

pub const AB_SLOT_A_SUFFIX: &str = "_a";
pub const AB_SLOT_B_SUFFIX: &str = "_b";
pub const BOOT_PARTITION_PREFIX: &str = "boot";

/// Boot state of one slot, always derived from the attribute flags
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SlotState {
    pub active: bool,
    pub successful: bool,
    pub unbootable: bool,
    pub tries_remaining: u8,
}

/// Extract bits 48-55, the byte reserved for the bootloader
pub fn private_byte(attributes: u64) -> u8 {
    ((attributes >> AB_FLAG_OFFSET) & 0xFF) as u8
}

impl SlotState {
    /// Bits 0-1 of the private byte are reserved and ignored
    pub fn decode(attributes: u64) -> Self {
        let byte = private_byte(attributes);
        SlotState {
            active: byte & AB_PARTITION_ATTR_SLOT_ACTIVE != 0,
            successful: byte & AB_PARTITION_ATTR_BOOT_SUCCESSFUL != 0,
            unbootable: byte & AB_PARTITION_ATTR_UNBOOTABLE != 0,
            tries_remaining: (byte >> AB_PARTITION_ATTR_TRIES_SHIFT) & AB_PARTITION_ATTR_TRIES_MASK,
        }
    }

    pub fn from_attributes(attributes: &Bitfield) -> Self {
        SlotState::decode(attributes.to_integer())
    }
}

impl fmt::Display for SlotState {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "Tries remaining: {}\nUnbootable: {}\nActive: {}\nSuccessful: {}",
               self.tries_remaining, self.unbootable, self.active, self.successful)
    }
}
