use std::fmt;

use crate::error::{Error, Result};

/// Fixed width view over an unsigned integer, bit 0 is the least significant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Bitfield {
    value: u64,
    width: u32,
}

impl Bitfield {
    /// The value is stored as given, bits above `width` are not checked
    /// ## Panics
    /// If width is zero or larger than 64
    pub fn new(value: u64, width: u32) -> Self {
        assert!(width > 0 && width <= 64, "width must be within 1..=64");
        Bitfield { value, width }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn get_bit(&self, n: u32) -> Result<u8> {
        if n >= self.width {
            return Err(Error::Range { index: n, width: self.width });
        }
        Ok(((self.value >> n) & 1) as u8)
    }

    pub fn to_integer(&self) -> u64 {
        self.value
    }

    /// Binary rendering zero padded to the width, most significant octet first
    pub fn format_octets(&self, delimiter: &str) -> String {
        let bits = format!("{:0width$b}", self.value, width = self.width as usize);
        let head = bits.len() % 8;
        let mut octets = Vec::new();
        if head != 0 {
            octets.push(&bits[..head]);
        }
        let mut pos = head;
        while pos < bits.len() {
            octets.push(&bits[pos..pos + 8]);
            pos += 8;
        }
        octets.join(delimiter)
    }
}

impl From<u64> for Bitfield {
    fn from(value: u64) -> Self {
        Bitfield::new(value, 64)
    }
}

impl fmt::Display for Bitfield {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.format_octets(" "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_get_bit_lsb_first() {
        let field = Bitfield::new(0b0111_0111, 8);
        assert_eq!(field.get_bit(0).unwrap(), 1);
        assert_eq!(field.get_bit(3).unwrap(), 0);
        assert_eq!(field.get_bit(6).unwrap(), 1);
        assert_eq!(field.get_bit(7).unwrap(), 0);
        assert_eq!(field.to_integer(), 119);
    }

    #[test]
    fn test_get_bit_out_of_range() {
        let field = Bitfield::new(0xFF, 8);
        for n in [8, 9, 63, 64, u32::MAX] {
            assert!(matches!(
                field.get_bit(n),
                Err(Error::Range { width: 8, .. })
            ));
        }
        let wide = Bitfield::from(u64::MAX);
        assert_eq!(wide.get_bit(63).unwrap(), 1);
        assert!(wide.get_bit(64).is_err());
    }

    #[test]
    fn test_format_octets() {
        let field = Bitfield::from(0x003B_0000_0000_0001);
        assert_eq!(
            field.to_string(),
            "00000000 00111011 00000000 00000000 00000000 00000000 00000000 00000001"
        );
        assert_eq!(Bitfield::new(0b101, 3).format_octets("|"), "101");
        assert_eq!(Bitfield::new(0x1FF, 12).format_octets("_"), "0001_11111111");
    }

    #[test]
    #[should_panic]
    fn test_zero_width_panics() {
        Bitfield::new(0, 0);
    }
}
