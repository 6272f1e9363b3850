// Copyright (C) 2026 Michael Wilson <mike@mdwn.dev>
//
// This program is free software: you can redistribute it and/or modify it under
// the terms of the GNU General Public License as published by the Free Software
// Foundation, version 3.
//
// This program is distributed in the hope that it will be useful, but WITHOUT
// ANY WARRANTY; without even the implied warranty of MERCHANTABILITY or FITNESS
// FOR A PARTICULAR PURPOSE. See the GNU General Public License for more details.
//
// You should have received a copy of the GNU General Public License along with
// this program. If not, see <https://www.gnu.org/licenses/>.
//

//! Bank directory I/O: discovering each channel's sample file, decoding or
//! defaulting its embedded record, and writing records back.

pub mod loader;
pub mod saver;

use std::path::{Path, PathBuf};

use crate::chunk::ChunkError;
use crate::model::BankMetadata;

pub use loader::{load_bank, LoadOutcome};
pub use saver::{save_bank, save_channel, SaveError};

/// Name of the sibling file carrying the bank's display name.
pub const BANK_NAME_FILE: &str = "info.txt";

/// Errors from loading one channel out of a bank directory. These are
/// contained per channel: one bad channel never aborts the other seven.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("channel sample file missing: {0}")]
    FileMissing(PathBuf),

    #[error("unsupported sample format: {0}")]
    UnsupportedAudioFormat(PathBuf),

    #[error("legacy sample migration failed for {path}: {source}")]
    Migration {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("chunk error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Observer for the bank load state sequence:
/// `load_begin`, then per channel `channel_load_begin` /
/// `channel_load_complete`, then `load_complete`.
pub trait LoadObserver {
    fn load_begin(&mut self, _bank_dir: &Path) {}
    fn channel_load_begin(&mut self, _channel: usize) {}
    fn channel_load_complete(&mut self, _channel: usize) {}
    fn load_complete(&mut self, _bank: &BankMetadata) {}
}

/// No-op observer for callers that only need the result.
impl LoadObserver for () {}
