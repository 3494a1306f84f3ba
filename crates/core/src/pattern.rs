// LabWired - GPIO Loopback Tester
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Walking-bit pattern generators.
///
/// Walking one drives a single pin high against a low background, walking
/// zero drives a single pin low against a high background. Together they
/// expose stuck-low, stuck-high and adjacent-pin shorts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TestPattern {
    WalkingOne,
    WalkingZero,
}

impl TestPattern {
    /// Run order.
    pub const ALL: [TestPattern; 2] = [TestPattern::WalkingOne, TestPattern::WalkingZero];

    pub fn value(&self, pin: u32) -> u32 {
        let bit = 1u32 << pin;
        match self {
            Self::WalkingOne => bit,
            Self::WalkingZero => !bit,
        }
    }

    /// `(pin, value)` for every pin in `[0, pin_count)`.
    pub fn values(self, pin_count: u32) -> impl Iterator<Item = (u32, u32)> {
        (0..pin_count).map(move |pin| (pin, self.value(pin)))
    }
}

impl fmt::Display for TestPattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::WalkingOne => write!(f, "walking 1"),
            Self::WalkingZero => write!(f, "walking 0"),
        }
    }
}
