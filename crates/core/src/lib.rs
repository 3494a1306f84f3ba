// LabWired - GPIO Loopback Tester
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

pub mod board;
pub mod config;
pub mod fixture;
pub mod mmio;
pub mod pattern;
pub mod report;
pub mod tester;

use std::path::PathBuf;
use std::time::Duration;

pub use board::BoardVariant;
pub use config::LoopbackConfig;
pub use fixture::SimulatedFixture;
pub use mmio::RegisterWindow;
pub use pattern::TestPattern;
pub use report::{Mismatch, PinResult, RunReport};
pub use tester::LoopbackTester;

#[derive(Debug, thiserror::Error)]
pub enum LoopbackError {
    #[error("failed opening {}", .path.display())]
    DeviceOpen {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed mmap-ing {} ({:#x} bytes)", .path.display(), .size)]
    Mapping {
        path: PathBuf,
        size: usize,
        #[source]
        source: std::io::Error,
    },
    #[error("register offset {offset:#x} outside window of {len_words:#x} words")]
    OffsetOutOfRange { offset: usize, len_words: usize },
}

pub type LoopbackResult<T> = Result<T, LoopbackError>;

/// 32-bit register access into a device window.
///
/// Offsets are in 32-bit words from the window base. Every call is a bus
/// transaction with side effects on the hardware, which is why reads take
/// `&mut self` as well.
pub trait RegisterAccess {
    /// Window length in 32-bit words.
    fn len_words(&self) -> usize;
    fn read32(&mut self, offset: usize) -> LoopbackResult<u32>;
    fn write32(&mut self, offset: usize, value: u32) -> LoopbackResult<()>;

    fn check_offset(&self, offset: usize) -> LoopbackResult<()> {
        let len_words = self.len_words();
        if offset < len_words {
            Ok(())
        } else {
            Err(LoopbackError::OffsetOutOfRange { offset, len_words })
        }
    }
}

/// Blocking wait between driving the outputs and sampling the inputs.
pub trait Settle {
    fn settle(&mut self, duration: Duration);
}

/// Sleeps the calling thread for the full duration.
#[derive(Debug, Default, Clone, Copy)]
pub struct ThreadSleep;

impl Settle for ThreadSleep {
    fn settle(&mut self, duration: Duration) {
        std::thread::sleep(duration);
    }
}

/// Hooks for following a run as it happens.
pub trait LoopbackObserver: std::fmt::Debug + Send + Sync {
    fn on_run_start(&self, _variant: BoardVariant) {}
    fn on_pattern_start(&self, _pattern: TestPattern) {}
    fn on_mismatch(&self, _mismatch: &Mismatch) {}
    fn on_pin_checked(&self, _result: &PinResult) {}
    fn on_run_end(&self, _report: &RunReport) {}
}
