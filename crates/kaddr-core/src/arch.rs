//! Target architecture variants.
//!
//! The supported firmware ships as two materially different families, one per
//! pointer width. The active variant selects which registry entries apply and
//! how wide each word of the offset cache record is.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString, IntoStaticStr};

#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    EnumString,
    EnumIter,
    IntoStaticStr,
    Display,
)]
pub enum Arch {
    #[strum(serialize = "arm32")]
    Arm32,
    #[strum(serialize = "arm64")]
    Arm64,
}

impl Arch {
    /// Variant matching the pointer width of the build target
    pub fn native() -> Self {
        if cfg!(target_pointer_width = "64") {
            Self::Arm64
        } else {
            Self::Arm32
        }
    }

    /// Width of a kernel address in bytes
    pub fn word_size(&self) -> usize {
        match self {
            Self::Arm32 => 4,
            Self::Arm64 => 8,
        }
    }

    /// Mask bounding address arithmetic to the word width
    pub fn mask(&self) -> u64 {
        match self {
            Self::Arm32 => u64::from(u32::MAX),
            Self::Arm64 => u64::MAX,
        }
    }

    /// Add `slide` to `addr`, wrapping at the word width
    pub fn slide(&self, addr: u64, slide: u64) -> u64 {
        addr.wrapping_add(slide) & self.mask()
    }

    /// Subtract `slide` from `addr`, wrapping at the word width
    pub fn unslide(&self, addr: u64, slide: u64) -> u64 {
        addr.wrapping_sub(slide) & self.mask()
    }

    /// Encode one word in cache byte order
    pub fn encode_word(&self, value: u64, out: &mut Vec<u8>) {
        match self {
            Self::Arm32 => out.extend_from_slice(&(value as u32).to_le_bytes()),
            Self::Arm64 => out.extend_from_slice(&value.to_le_bytes()),
        }
    }

    /// Decode one word; `bytes` must be exactly `word_size()` long
    pub fn decode_word(&self, bytes: &[u8]) -> u64 {
        match self {
            Self::Arm32 => {
                let mut buf = [0u8; 4];
                buf.copy_from_slice(bytes);
                u64::from(u32::from_le_bytes(buf))
            }
            Self::Arm64 => {
                let mut buf = [0u8; 8];
                buf.copy_from_slice(bytes);
                u64::from_le_bytes(buf)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn test_parse_and_display() {
        assert_eq!(Arch::from_str("arm64").unwrap(), Arch::Arm64);
        assert_eq!(Arch::from_str("arm32").unwrap(), Arch::Arm32);
        assert!(Arch::from_str("ARM64").is_err());
        assert_eq!(Arch::Arm32.to_string(), "arm32");
    }

    #[test]
    fn test_slide_wraps_at_word_width() {
        assert_eq!(Arch::Arm32.slide(0xffff_f000, 0x2000), 0x1000);
        assert_eq!(Arch::Arm32.unslide(0x1000, 0x2000), 0xffff_f000);
        assert_eq!(
            Arch::Arm64.slide(0xffff_ff80_0400_0000, 0x0200_0000),
            0xffff_ff80_0600_0000
        );
    }

    #[test]
    fn test_word_encoding() {
        let mut out = Vec::new();
        Arch::Arm32.encode_word(0x1_8000_0001, &mut out);
        assert_eq!(out, [0x01, 0x00, 0x00, 0x80]);
        assert_eq!(Arch::Arm32.decode_word(&out), 0x8000_0001);

        out.clear();
        Arch::Arm64.encode_word(0xffff_ff80_0453_a000, &mut out);
        assert_eq!(out.len(), 8);
        assert_eq!(Arch::Arm64.decode_word(&out), 0xffff_ff80_0453_a000);
    }
}
