// LabWired - GPIO Loopback Tester
// Copyright (C) 2026 Andrii Shylenko
//
// This software is released under the MIT License.
// See the LICENSE file in the project root for full license information.

use crate::{LoopbackError, LoopbackResult, RegisterAccess};
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// UIO device exposing the FPGA GPIO block.
pub const DEFAULT_DEVICE: &str = "/dev/uio0";
/// Size of the register window mapped from the device (64 KiB).
pub const WINDOW_SIZE: usize = 0x10000;

const WORD_BYTES: usize = std::mem::size_of::<u32>();

/// Shared read/write mapping of a device's register space.
///
/// The mapping is owned exclusively for the lifetime of the value and is
/// unmapped exactly once when it is dropped or explicitly released.
#[derive(Debug)]
pub struct RegisterWindow {
    path: PathBuf,
    map: MmapMut,
}

impl RegisterWindow {
    /// Opens `path` read/write and maps `size` bytes from offset 0 as a
    /// shared mapping.
    pub fn acquire(path: impl AsRef<Path>, size: usize) -> LoopbackResult<Self> {
        let path = path.as_ref().to_path_buf();

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(&path)
            .map_err(|source| LoopbackError::DeviceOpen {
                path: path.clone(),
                source,
            })?;

        if size == 0 || size % WORD_BYTES != 0 {
            return Err(LoopbackError::Mapping {
                path,
                size,
                source: io::Error::new(
                    io::ErrorKind::InvalidInput,
                    "window size must be a non-zero multiple of 4 bytes",
                ),
            });
        }

        // UIO character devices report a zero file length, so the map length
        // is always given explicitly.
        let map = unsafe { MmapOptions::new().offset(0).len(size).map_mut(&file) }.map_err(
            |source| LoopbackError::Mapping {
                path: path.clone(),
                size,
                source,
            },
        )?;

        info!("Mapped register window {} ({:#x} bytes)", path.display(), size);
        Ok(Self { path, map })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn size(&self) -> usize {
        self.map.len()
    }

    /// Unmaps the window now instead of at end of scope.
    pub fn release(self) {
        drop(self);
    }

    fn word_ptr(&mut self, offset: usize) -> LoopbackResult<*mut u32> {
        self.check_offset(offset)?;
        // The mapping is page aligned and `offset` is bounds checked above.
        Ok(unsafe { self.map.as_mut_ptr().cast::<u32>().add(offset) })
    }
}

impl RegisterAccess for RegisterWindow {
    fn len_words(&self) -> usize {
        self.map.len() / WORD_BYTES
    }

    fn read32(&mut self, offset: usize) -> LoopbackResult<u32> {
        let ptr = self.word_ptr(offset)?;
        Ok(unsafe { std::ptr::read_volatile(ptr) })
    }

    fn write32(&mut self, offset: usize, value: u32) -> LoopbackResult<()> {
        let ptr = self.word_ptr(offset)?;
        unsafe { std::ptr::write_volatile(ptr, value) };
        Ok(())
    }
}

impl Drop for RegisterWindow {
    fn drop(&mut self) {
        debug!("Releasing register window {}", self.path.display());
    }
}
