// LabWired - GPIO Loopback Tester
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{BoardVariant, TestPattern};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const RESULT_SCHEMA_VERSION: &str = "1.0";

/// A single failed sub-check.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mismatch {
    pub pattern: TestPattern,
    /// Pin under test.
    pub pin: u32,
    /// Pin number as printed, shifted by the bank's offset.
    pub reported_pin: u32,
    /// Input register offset in 32-bit words.
    pub offset: usize,
    pub written: u32,
    pub read: u32,
    /// What the masked readback should have been.
    pub expected: u32,
}

impl fmt::Display for Mismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Loopback error on pin {}: wrote 0x{:08x}, read 0x{:08x}",
            self.reported_pin, self.written, self.read
        )
    }
}

/// Outcome of one pattern write and its readback.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinResult {
    pub pattern: TestPattern,
    pub pin: u32,
    pub written: u32,
    /// Raw readbacks, one per sub-check performed, in bank order.
    pub reads: Vec<u32>,
    pub mismatches: Vec<Mismatch>,
}

impl PinResult {
    pub fn passed(&self) -> bool {
        self.mismatches.is_empty()
    }

    pub fn checks_performed(&self) -> usize {
        self.reads.len()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Pass,
    Fail,
}

/// Aggregate result of a full walking-one/walking-zero run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub result_schema_version: String,
    pub status: RunStatus,
    pub variant: BoardVariant,
    pub pin_count: u32,
    pub checks_performed: usize,
    pub failure_count: usize,
    pub pins: Vec<PinResult>,
}

impl RunReport {
    pub fn new(variant: BoardVariant, pins: Vec<PinResult>) -> Self {
        let checks_performed = pins.iter().map(PinResult::checks_performed).sum();
        let failure_count = pins.iter().map(|p| p.mismatches.len()).sum();
        let status = if failure_count == 0 {
            RunStatus::Pass
        } else {
            RunStatus::Fail
        };

        Self {
            result_schema_version: RESULT_SCHEMA_VERSION.to_string(),
            status,
            variant,
            pin_count: variant.pin_count(),
            checks_performed,
            failure_count,
            pins,
        }
    }

    pub fn passed(&self) -> bool {
        self.status == RunStatus::Pass
    }

    pub fn mismatches(&self) -> impl Iterator<Item = &Mismatch> {
        self.pins.iter().flat_map(|p| p.mismatches.iter())
    }

    /// Pin steps with at least one failed sub-check, in run order.
    pub fn failed_pins(&self) -> impl Iterator<Item = &PinResult> {
        self.pins.iter().filter(|p| !p.passed())
    }
}
