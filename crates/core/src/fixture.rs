// LabWired - GPIO Loopback Tester
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::board::{Comparison, STATUS_BIT, STATUS_LOOPBACK_MASK};
use crate::mmio::WINDOW_SIZE;
use crate::{BoardVariant, LoopbackResult, RegisterAccess};

/// In-memory model of a breakout board sitting in the loopback fixture.
///
/// Every input register reads back whatever was last written to the output
/// register one word below it. The third bank of the triple-bank board only
/// loops the low 24 pins and reports the status bit alongside them.
#[derive(Debug, Clone)]
pub struct SimulatedFixture {
    variant: BoardVariant,
    regs: Vec<u32>,
    stuck_low: u32,
    stuck_high: u32,
}

impl SimulatedFixture {
    pub fn new(variant: BoardVariant) -> Self {
        Self {
            variant,
            regs: vec![0; WINDOW_SIZE / std::mem::size_of::<u32>()],
            stuck_low: 0,
            stuck_high: 0,
        }
    }

    /// Holds `bit` low on every input bank.
    pub fn with_stuck_low(mut self, bit: u32) -> Self {
        self.stuck_low |= 1u32.checked_shl(bit).unwrap_or(0);
        self
    }

    /// Holds `bit` high on every input bank.
    pub fn with_stuck_high(mut self, bit: u32) -> Self {
        self.stuck_high |= 1u32.checked_shl(bit).unwrap_or(0);
        self
    }

    pub fn variant(&self) -> BoardVariant {
        self.variant
    }

    fn loopback(&self, offset: usize) -> Option<u32> {
        let check = self
            .variant
            .input_checks()
            .iter()
            .find(|c| c.offset == offset)?;
        let driven = self.regs[offset - 1];
        let looped = match check.comparison {
            Comparison::StatusCombined => (driven & STATUS_LOOPBACK_MASK) | STATUS_BIT,
            Comparison::Masked(_) | Comparison::Exact => driven,
        };
        Some((looped & !self.stuck_low) | self.stuck_high)
    }
}

impl RegisterAccess for SimulatedFixture {
    fn len_words(&self) -> usize {
        self.regs.len()
    }

    fn read32(&mut self, offset: usize) -> LoopbackResult<u32> {
        self.check_offset(offset)?;
        Ok(self.loopback(offset).unwrap_or(self.regs[offset]))
    }

    fn write32(&mut self, offset: usize, value: u32) -> LoopbackResult<()> {
        self.check_offset(offset)?;
        self.regs[offset] = value;
        Ok(())
    }
}
