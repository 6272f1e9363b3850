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

//! Writing records back into channel sample files. The chunk splice is
//! atomic (temp file plus rename), so a crash mid-save leaves either the old
//! or the new file intact, never a partial one.

use std::fs;
use std::path::Path;

use tracing::{debug, info, warn};

use super::loader::RECORD_TAG;
use super::BANK_NAME_FILE;
use crate::chunk::{self, ChunkError};
use crate::model::{BankMetadata, ChannelMetadata};
use crate::record;

/// Errors from saving a channel or bank.
#[derive(Debug, thiserror::Error)]
pub enum SaveError {
    #[error("channel {0} has no sample file to carry the record")]
    NoSampleFile(usize),

    #[error("chunk error: {0}")]
    Chunk(#[from] ChunkError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Encodes the channel's record and embeds it in the channel's sample file,
/// replacing any existing record chunk.
pub fn save_channel(channel: &ChannelMetadata) -> Result<(), SaveError> {
    let Some(file_name) = channel.file_name() else {
        return Err(SaveError::NoSampleFile(channel.index()));
    };

    let bytes = record::encode(channel);
    chunk::replace_chunk(Path::new(file_name), RECORD_TAG, &bytes)?;
    info!(
        channel = channel.index() + 1,
        file = file_name,
        record_len = bytes.len(),
        "Record saved"
    );
    Ok(())
}

/// Saves the whole bank: the display name into `info.txt` and every channel
/// that has a sample file to carry its record. Channel failures are contained
/// the same way the loader contains them, so one unwritable file never blocks
/// the other seven; a name-file failure aborts, since nothing was written yet.
pub fn save_bank(dir: &Path, bank: &BankMetadata) -> Result<Vec<(usize, SaveError)>, SaveError> {
    fs::write(dir.join(BANK_NAME_FILE), format!("{}\n", bank.name()))?;

    let mut errors = Vec::new();
    for channel in bank.channels() {
        if channel.file_name().is_none() {
            debug!(channel = channel.index() + 1, "No sample file, nothing to save");
            continue;
        }
        if let Err(e) = save_channel(channel) {
            warn!(channel = channel.index() + 1, error = %e, "Channel failed to save");
            errors.push((channel.index(), e));
        }
    }
    info!(bank = ?dir, name = bank.name(), failed = errors.len(), "Bank saved");
    Ok(errors)
}
