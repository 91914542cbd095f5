//! The value domain carried by ports and links.

use serde::{Deserialize, Serialize};
use std::fmt;

/// A four-bit word, or nothing at all.
///
/// `BinData` is either *disconnected* (no driver) or an unsigned value
/// in `0..=15`. Disconnected is a real state, not a synonym for zero:
/// equality treats them as distinct, and only an explicit [`get_uint`]
/// collapses disconnected to zero for selection-style arithmetic.
///
/// [`get_uint`]: BinData::get_uint
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Default, Serialize, Deserialize)]
pub struct BinData {
    bits: Option<u8>,
}

impl BinData {
    pub const WIDTH: usize = 4;

    /// A defined value; anything above four bits is masked off.
    pub fn new(val: u8) -> Self {
        BinData {
            bits: Some(val & 0xF),
        }
    }

    /// The absent value. Also what `Default` yields.
    pub fn disconnected() -> Self {
        BinData { bits: None }
    }

    pub fn from_bits(bits: [bool; Self::WIDTH]) -> Self {
        let mut v = 0u8;
        for (i, on) in bits.iter().enumerate() {
            if *on {
                v |= 1 << i;
            }
        }
        BinData::new(v)
    }

    pub fn is_disconnected(&self) -> bool {
        self.bits.is_none()
    }

    /// The numeric value. Disconnected reads as zero here, and only
    /// here: callers that care about the distinction check
    /// [`is_disconnected`](BinData::is_disconnected) first.
    pub fn get_uint(&self) -> u8 {
        self.bits.unwrap_or(0)
    }

    /// Bit `i` (0 = LSB), or `None` when disconnected.
    pub fn get_bit(&self, i: usize) -> Option<bool> {
        debug_assert!(i < Self::WIDTH);
        self.bits.map(|b| (b >> i) & 1 == 1)
    }

    /// Sets bit `i`. A disconnected value materializes as zero first.
    pub fn set_bit(&mut self, i: usize, on: bool) {
        debug_assert!(i < Self::WIDTH);
        let mut b = self.bits.unwrap_or(0);
        if on {
            b |= 1 << i;
        } else {
            b &= !(1 << i);
        }
        self.bits = Some(b & 0xF);
    }
}

impl fmt::Display for BinData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.bits {
            Some(b) => write!(f, "{:04b}", b),
            None => write!(f, "----"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn construction_masks_to_four_bits() {
        assert_eq!(BinData::new(0x1F), BinData::new(0xF));
        assert_eq!(BinData::new(16), BinData::new(0));
    }

    #[test]
    fn disconnected_is_not_zero() {
        assert_ne!(BinData::disconnected(), BinData::new(0));
        assert_eq!(BinData::disconnected(), BinData::disconnected());
        assert_eq!(BinData::default(), BinData::disconnected());
    }

    #[test]
    fn get_uint_collapses_disconnected_to_zero() {
        assert_eq!(BinData::disconnected().get_uint(), 0);
        assert_eq!(BinData::new(9).get_uint(), 9);
    }

    #[test]
    fn bit_access() {
        let v = BinData::new(0b1010);
        assert_eq!(v.get_bit(0), Some(false));
        assert_eq!(v.get_bit(1), Some(true));
        assert_eq!(v.get_bit(3), Some(true));
        assert_eq!(BinData::disconnected().get_bit(2), None);
    }

    #[test]
    fn set_bit_materializes_disconnected() {
        let mut v = BinData::disconnected();
        v.set_bit(2, true);
        assert_eq!(v, BinData::new(0b0100));
        v.set_bit(2, false);
        assert_eq!(v, BinData::new(0));
    }

    #[test]
    fn from_bits_is_lsb_first() {
        assert_eq!(BinData::from_bits([true, false, true, false]), BinData::new(0b0101));
    }

    #[test]
    fn display_renders_bits_or_dashes() {
        assert_eq!(BinData::new(0b0101).to_string(), "0101");
        assert_eq!(BinData::disconnected().to_string(), "----");
    }
}
