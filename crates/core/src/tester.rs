// LabWired - GPIO Loopback Tester
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{
    BoardVariant, LoopbackObserver, LoopbackResult, Mismatch, PinResult, RegisterAccess,
    RunReport, Settle, TestPattern, ThreadSleep,
};
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

/// Settling time between driving the outputs and sampling the inputs,
/// fixed by characterization of the loopback fixture.
pub const PROPAGATION_DELAY: Duration = Duration::from_millis(5);

/// Drives walking-bit patterns through the fixture and checks the loopback.
///
/// The tester owns the register window. It is released when [`run`] returns,
/// or when the tester is dropped on any earlier path.
///
/// [`run`]: LoopbackTester::run
pub struct LoopbackTester<W: RegisterAccess, S: Settle = ThreadSleep> {
    window: W,
    variant: BoardVariant,
    settle: S,
    observers: Vec<Arc<dyn LoopbackObserver>>,
}

impl<W: RegisterAccess> LoopbackTester<W, ThreadSleep> {
    pub fn new(window: W, variant: BoardVariant) -> LoopbackResult<Self> {
        Self::with_settle(window, variant, ThreadSleep)
    }
}

impl<W: RegisterAccess, S: Settle> LoopbackTester<W, S> {
    /// Fails if the window is too small for the variant's register map.
    pub fn with_settle(window: W, variant: BoardVariant, settle: S) -> LoopbackResult<Self> {
        window.check_offset(variant.max_offset())?;
        Ok(Self {
            window,
            variant,
            settle,
            observers: Vec::new(),
        })
    }

    pub fn add_observer(&mut self, observer: Arc<dyn LoopbackObserver>) {
        self.observers.push(observer);
    }

    pub fn variant(&self) -> BoardVariant {
        self.variant
    }

    /// Drives `value` onto every output bank of the board.
    pub fn write_outputs(&mut self, value: u32) -> LoopbackResult<()> {
        for &offset in self.variant.output_offsets() {
            self.window.write32(offset, value)?;
        }
        Ok(())
    }

    pub fn wait_for_propagation(&mut self) {
        self.settle.settle(PROPAGATION_DELAY);
    }

    /// Samples every input bank that loops `pin` and compares it with
    /// `expected`. All sub-checks run even after one has failed.
    pub fn read_and_verify(
        &mut self,
        pattern: TestPattern,
        pin: u32,
        expected: u32,
    ) -> LoopbackResult<PinResult> {
        let mut reads = Vec::with_capacity(self.variant.input_checks().len());
        let mut mismatches = Vec::new();

        for check in self.variant.input_checks() {
            if !check.applies_to(pin) {
                continue;
            }

            let read = self.window.read32(check.offset)?;
            reads.push(read);

            if !check.matches(expected, read) {
                let mismatch = Mismatch {
                    pattern,
                    pin,
                    reported_pin: pin + check.pin_offset,
                    offset: check.offset,
                    written: expected,
                    read,
                    expected: check.expected(expected),
                };
                warn!("{}", mismatch);
                for observer in &self.observers {
                    observer.on_mismatch(&mismatch);
                }
                mismatches.push(mismatch);
            }
        }

        let result = PinResult {
            pattern,
            pin,
            written: expected,
            reads,
            mismatches,
        };
        debug!(
            "{} pin {}: wrote {:#010x}, {}",
            pattern,
            pin,
            expected,
            if result.passed() { "ok" } else { "FAILED" }
        );
        for observer in &self.observers {
            observer.on_pin_checked(&result);
        }
        Ok(result)
    }

    /// Runs walking one then walking zero over every pin, then releases the
    /// register window.
    pub fn run(mut self) -> LoopbackResult<RunReport> {
        let pin_count = self.variant.pin_count();
        info!(
            "Starting loopback test: {} board, {} pins",
            self.variant, pin_count
        );
        for observer in &self.observers {
            observer.on_run_start(self.variant);
        }

        let mut pins = Vec::with_capacity(TestPattern::ALL.len() * pin_count as usize);
        for pattern in TestPattern::ALL {
            info!("Running {} pattern", pattern);
            for observer in &self.observers {
                observer.on_pattern_start(pattern);
            }

            for (pin, value) in pattern.values(pin_count) {
                self.write_outputs(value)?;
                self.wait_for_propagation();
                pins.push(self.read_and_verify(pattern, pin, value)?);
            }
        }

        let report = RunReport::new(self.variant, pins);
        let LoopbackTester {
            window, observers, ..
        } = self;
        drop(window);

        info!(
            "Loopback test {}: {} checks, {} failed",
            if report.passed() { "passed" } else { "failed" },
            report.checks_performed,
            report.failure_count
        );
        for observer in &observers {
            observer.on_run_end(&report);
        }
        Ok(report)
    }
}
