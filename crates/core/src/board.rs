// LabWired - GPIO Loopback Tester
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of pins wired through the loopback fixture on either board.
pub const LOOPED_PINS: u32 = 27;
/// Single-bank comparisons only look at the looped pins.
pub const SINGLE_BANK_MASK: u32 = (1 << LOOPED_PINS) - 1;
/// Width of the status-combined loopback path on the third bank.
pub const STATUS_LOOPBACK_MASK: u32 = 0x00FF_FFFF;
/// Status bit the third bank always reports alongside the looped pins.
pub const STATUS_BIT: u32 = 0x2;
/// Only pins below this index are routed through the status-combined path.
pub const STATUS_LOOPBACK_PINS: u32 = 24;

/// How a readback is compared with the value that was driven.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    /// Both sides are masked before comparing.
    Masked(u32),
    /// Full-width equality.
    Exact,
    /// Low 24 bits of the readback against the written low 24 bits with
    /// [`STATUS_BIT`] forced on.
    StatusCombined,
}

/// One input register sampled after every write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InputCheck {
    /// Register offset in 32-bit words.
    pub offset: usize,
    /// Added to the pin index when reporting a mismatch on this bank.
    pub pin_offset: u32,
    pub comparison: Comparison,
    /// The check only runs for pins below this index.
    pub pin_limit: u32,
}

impl InputCheck {
    pub fn applies_to(&self, pin: u32) -> bool {
        pin < self.pin_limit
    }

    /// The value the masked readback must equal.
    pub fn expected(&self, written: u32) -> u32 {
        match self.comparison {
            Comparison::Masked(mask) => written & mask,
            Comparison::Exact => written,
            Comparison::StatusCombined => (written & STATUS_LOOPBACK_MASK) | STATUS_BIT,
        }
    }

    /// The part of a raw readback that takes part in the comparison.
    pub fn observed(&self, read: u32) -> u32 {
        match self.comparison {
            Comparison::Masked(mask) => read & mask,
            Comparison::Exact => read,
            Comparison::StatusCombined => read & STATUS_LOOPBACK_MASK,
        }
    }

    pub fn matches(&self, written: u32, read: u32) -> bool {
        self.observed(read) == self.expected(written)
    }
}

const SINGLE_BANK_OUTPUTS: [usize; 1] = [0x101];
const SINGLE_BANK_INPUTS: [InputCheck; 1] = [InputCheck {
    offset: 0x102,
    pin_offset: 0,
    comparison: Comparison::Masked(SINGLE_BANK_MASK),
    pin_limit: LOOPED_PINS,
}];

const TRIPLE_BANK_OUTPUTS: [usize; 3] = [0x101, 0x111, 0x121];
const TRIPLE_BANK_INPUTS: [InputCheck; 3] = [
    InputCheck {
        offset: 0x102,
        pin_offset: 0,
        comparison: Comparison::Exact,
        pin_limit: LOOPED_PINS,
    },
    InputCheck {
        offset: 0x112,
        pin_offset: 32,
        comparison: Comparison::Exact,
        pin_limit: LOOPED_PINS,
    },
    InputCheck {
        offset: 0x122,
        pin_offset: 64,
        comparison: Comparison::StatusCombined,
        pin_limit: STATUS_LOOPBACK_PINS,
    },
];

/// GPIO layout of the breakout board under test.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoardVariant {
    /// One output and one input register (pzsdr1 breakout).
    #[default]
    SingleBank,
    /// Three parallel banks, the third sharing its register with a status
    /// bit (pzsdr2 breakout).
    TripleBank,
}

impl BoardVariant {
    pub fn pin_count(&self) -> u32 {
        LOOPED_PINS
    }

    /// Output registers that are all driven with the same pattern.
    pub fn output_offsets(&self) -> &'static [usize] {
        match self {
            Self::SingleBank => &SINGLE_BANK_OUTPUTS,
            Self::TripleBank => &TRIPLE_BANK_OUTPUTS,
        }
    }

    pub fn input_checks(&self) -> &'static [InputCheck] {
        match self {
            Self::SingleBank => &SINGLE_BANK_INPUTS,
            Self::TripleBank => &TRIPLE_BANK_INPUTS,
        }
    }

    pub fn bank_count(&self) -> usize {
        self.output_offsets().len()
    }

    /// Highest register offset the variant touches.
    pub fn max_offset(&self) -> usize {
        self.output_offsets()
            .iter()
            .copied()
            .chain(self.input_checks().iter().map(|c| c.offset))
            .max()
            .unwrap_or(0)
    }
}

impl fmt::Display for BoardVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SingleBank => write!(f, "single-bank"),
            Self::TripleBank => write!(f, "triple-bank"),
        }
    }
}

impl FromStr for BoardVariant {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let v = value.trim().to_ascii_lowercase();
        match v.as_str() {
            "a" | "single" | "single-bank" | "single_bank" | "pzsdr1" => Ok(Self::SingleBank),
            "b" | "triple" | "triple-bank" | "triple_bank" | "pzsdr2" => Ok(Self::TripleBank),
            _ => Err(format!(
                "unsupported board variant '{}'; supported: a (single-bank), b (triple-bank)",
                value
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_aliases() {
        assert_eq!("a".parse::<BoardVariant>().unwrap(), BoardVariant::SingleBank);
        assert_eq!("PZSDR1".parse::<BoardVariant>().unwrap(), BoardVariant::SingleBank);
        assert_eq!(" b ".parse::<BoardVariant>().unwrap(), BoardVariant::TripleBank);
        assert_eq!(
            "triple-bank".parse::<BoardVariant>().unwrap(),
            BoardVariant::TripleBank
        );
        assert!("c".parse::<BoardVariant>().is_err());
    }

    #[test]
    fn test_register_offsets() {
        let a = BoardVariant::SingleBank;
        assert_eq!(a.output_offsets(), &[0x101]);
        assert_eq!(a.input_checks().len(), 1);
        assert_eq!(a.input_checks()[0].offset, 0x102);
        assert_eq!(a.max_offset(), 0x102);

        let b = BoardVariant::TripleBank;
        assert_eq!(b.output_offsets(), &[0x101, 0x111, 0x121]);
        let inputs: Vec<usize> = b.input_checks().iter().map(|c| c.offset).collect();
        assert_eq!(inputs, vec![0x102, 0x112, 0x122]);
        assert_eq!(b.bank_count(), 3);
        assert_eq!(b.max_offset(), 0x122);
    }

    #[test]
    fn test_single_bank_masks_to_looped_pins() {
        let check = BoardVariant::SingleBank.input_checks()[0];
        assert_eq!(SINGLE_BANK_MASK, 0x07FF_FFFF);
        // Upper bits are ignored on both sides.
        assert!(check.matches(0xFFFF_FFFE, 0x07FF_FFFE));
        assert!(!check.matches(0x0000_0001, 0x0000_0000));
    }

    #[test]
    fn test_triple_bank_primary_banks_are_full_width() {
        let checks = BoardVariant::TripleBank.input_checks();
        assert!(checks[0].matches(0xFFFF_FFFE, 0xFFFF_FFFE));
        assert!(!checks[0].matches(0xFFFF_FFFE, 0x07FF_FFFE));
        assert_eq!(checks[1].pin_offset, 32);
    }

    #[test]
    fn test_status_combined_rule() {
        let check = BoardVariant::TripleBank.input_checks()[2];
        assert_eq!(check.pin_offset, 64);
        assert!(check.applies_to(23));
        assert!(!check.applies_to(24));
        assert!(!check.applies_to(26));

        for pin in 0..STATUS_LOOPBACK_PINS {
            let one = 1u32 << pin;
            assert_eq!(check.expected(one), (one & 0xFF_FFFF) | 0x2);
            assert_eq!(check.expected(!one), (!one & 0xFF_FFFF) | 0x2);
        }
        // Upper byte of the readback is not compared.
        assert!(check.matches(0x0000_0001, 0xAB00_0003));
    }

    #[test]
    fn test_variant_serializes_snake_case() {
        let json = serde_json::to_string(&BoardVariant::TripleBank).unwrap();
        assert_eq!(json, "\"triple_bank\"");
    }
}
