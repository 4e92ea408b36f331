//! Presence signatures
//!
//! A signature records which optional observables a record populates. Bit `i`
//! corresponds to the `i`-th optional observable in declaration order. The
//! textual form is one `T`/`F` character per optional observable, bit 0 first.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Signature {
    mask: u32,
    width: u8,
}

impl Signature {
    pub fn new(mask: u32, width: usize) -> Self {
        let width = width.min(32) as u8;
        let mask = if width == 32 {
            mask
        } else {
            mask & ((1u32 << width) - 1)
        };
        Self { mask, width }
    }

    /// All optional observables absent
    pub fn empty(width: usize) -> Self {
        Self::new(0, width)
    }

    pub fn mask(&self) -> u32 {
        self.mask
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn bit(&self, slot: usize) -> bool {
        slot < self.width() && self.mask & (1 << slot) != 0
    }

    pub fn with_bit(&self, slot: usize, present: bool) -> Self {
        let mask = if present {
            self.mask | (1 << slot)
        } else {
            self.mask & !(1 << slot)
        };
        Self::new(mask, self.width())
    }

    pub fn count_present(&self) -> u32 {
        self.mask.count_ones()
    }
}

impl fmt::Display for Signature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for slot in 0..self.width() {
            f.write_str(if self.bit(slot) { "T" } else { "F" })?;
        }
        Ok(())
    }
}

impl FromStr for Signature {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if s.len() > 32 {
            return Err(format!("signature too long: {} characters", s.len()));
        }
        let mut mask = 0u32;
        for (slot, c) in s.chars().enumerate() {
            match c {
                'T' => mask |= 1 << slot,
                'F' => {}
                other => return Err(format!("invalid signature character '{}' in {}", other, s)),
            }
        }
        Ok(Signature::new(mask, s.len()))
    }
}

impl Serialize for Signature {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for Signature {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        text.parse().map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_bit_zero_first() {
        let signature = Signature::new(0b101, 4);
        assert_eq!(signature.to_string(), "TFTF");
        assert!(signature.bit(0));
        assert!(!signature.bit(1));
        assert!(!signature.bit(7));
    }

    #[test]
    fn test_parse() {
        let signature: Signature = "FTT".parse().unwrap();
        assert_eq!(signature.mask(), 0b110);
        assert_eq!(signature.width(), 3);
        assert!("FTX".parse::<Signature>().is_err());
    }

    #[test]
    fn test_mask_truncated_to_width() {
        assert_eq!(Signature::new(0xFF, 3).mask(), 0b111);
    }

    #[test]
    fn test_with_bit() {
        let signature = Signature::empty(3).with_bit(2, true);
        assert_eq!(signature.to_string(), "FFT");
        assert_eq!(signature.with_bit(2, false), Signature::empty(3));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&Signature::new(0b01, 2)).unwrap();
        assert_eq!(json, "\"TF\"");
        let back: Signature = serde_json::from_str(&json).unwrap();
        assert_eq!(back, Signature::new(0b01, 2));
    }
}
