// LabWired - GPIO Loopback Tester
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::mmio::{DEFAULT_DEVICE, WINDOW_SIZE};
use crate::BoardVariant;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoopbackConfig {
    /// UIO device backing the GPIO register block.
    pub device: PathBuf,
    /// Bytes mapped from the device.
    pub map_size: usize,
    pub variant: BoardVariant,
}

impl Default for LoopbackConfig {
    fn default() -> Self {
        Self {
            device: PathBuf::from(DEFAULT_DEVICE),
            map_size: WINDOW_SIZE,
            variant: BoardVariant::SingleBank,
        }
    }
}
