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

//! Reader/writer for the fixed-layout binary record embedded in each
//! channel's sample file (the `busy` chunk).
//!
//! This is a best-effort legacy-format codec, not a defensive parser: only
//! the signature word and the minimum length are validated. Everything else
//! is fixed-width little-endian fields at offsets given by the layout table.

pub(crate) mod layout;

use tracing::{debug, warn};

use crate::model::cue::{CueSet, MAX_CUE_SETS};
use crate::model::cv::{CvAssignment, CV_INPUTS};
use crate::model::{ChannelMetadata, Param};
use layout::{off, Layout, SIGNATURE};

/// Version byte written into freshly encoded records.
pub const NEWEST_VERSION: u8 = 2;

/// Record decode failures. Anything here is fatal for the channel's decode;
/// the caller falls back to bare-file defaults.
#[derive(Debug, thiserror::Error)]
pub enum RecordError {
    #[error("unrecognized record signature {found:#010x}")]
    BadSignature { found: u32 },

    #[error("record truncated: {actual} bytes, layout v{version} needs {expected}")]
    Truncated {
        version: u8,
        expected: usize,
        actual: usize,
    },
}

/// Decodes a record blob into a channel description. The layout is selected
/// once from the signature word; an unknown version byte is tolerated (with
/// a log line) and read with the newest layout, since the two supported
/// revisions differ only in CV-table width and trailing reserved padding.
pub fn decode(bytes: &[u8]) -> Result<ChannelMetadata, RecordError> {
    if bytes.len() < 4 {
        return Err(RecordError::BadSignature { found: 0 });
    }
    let word = read_u32(bytes, 0);
    if word >> 8 != SIGNATURE {
        return Err(RecordError::BadSignature { found: word });
    }

    let version = (word & 0xFF) as u8;
    let layout = match Layout::from_version(version) {
        Some(layout) => layout,
        None => {
            warn!(version, "Unknown record version, reading with the newest layout");
            Layout::newest()
        }
    };
    if bytes.len() < layout.record_len() {
        return Err(RecordError::Truncated {
            version: layout.version(),
            expected: layout.record_len(),
            actual: bytes.len(),
        });
    }

    let mut channel = ChannelMetadata::new(0);
    channel.set_format_version(layout.version());

    channel.set_attack(read_u16(bytes, off::ATTACK));
    channel.set_decay(read_u16(bytes, off::DECAY));
    channel.set_level(read_u16(bytes, off::LEVEL));
    channel.set_speed(read_u16(bytes, off::SPEED));
    channel.set_bit_depth(bytes[off::BIT_DEPTH]);
    channel.set_rate(bytes[off::RATE]);

    // Filter type and frequency share one packed 16-bit field.
    let filter = read_u16(bytes, off::FILTER);
    channel.set_filter_type((filter & 0xF) as u8);
    channel.set_filter_frequency(filter >> 4);

    channel.set_resonance(read_u16(bytes, off::RESONANCE));
    channel.set_loop_mode(bytes[off::LOOP_MODE]);
    channel.set_quant_mode(bytes[off::QUANT_MODE]);
    channel.set_reverse(bytes[off::REVERSE] != 0);
    channel.set_crossfade(bytes[off::CROSSFADE]);
    channel.set_step_trigger_count(bytes[off::STEP_TRIGGER_COUNT]);
    channel.set_external_trigger_mode(bytes[off::EXTERNAL_TRIGGER_MODE]);
    channel.set_choke_group(bytes[off::CHOKE_GROUP]);
    channel.set_channel_source(bytes[off::CHANNEL_SOURCE]);
    channel.set_record_destination(bytes[off::RECORD_DESTINATION]);
    channel.set_channel_flags(read_u16(bytes, off::CHANNEL_FLAGS));

    decode_cue_sets(bytes, layout, &mut channel);
    decode_cv_table(bytes, layout, &mut channel);

    for (index, (offset, length)) in layout.reserved().into_iter().enumerate() {
        channel.set_reserved_bytes(index, &bytes[offset..offset + length]);
    }

    Ok(channel)
}

fn decode_cue_sets(bytes: &[u8], layout: Layout, channel: &mut ChannelMetadata) {
    let cue_base = layout.cue_base();
    let count = (bytes[cue_base] as usize).min(MAX_CUE_SETS);
    let selected = bytes[cue_base + 1] as usize;

    let mut sets = Vec::with_capacity(count.max(1));
    if count == 0 {
        // No cue table: synthesize cue set 0 from the legacy scalars.
        sets.push(CueSet::clamped(
            1,
            read_u32(bytes, off::START),
            read_u32(bytes, off::LOOP),
            read_u32(bytes, off::END),
        ));
    } else {
        for i in 0..count {
            let base = layout.cue_entry(i);
            // On-disk field order is start/end/loop, not start/loop/end.
            let start = read_u32(bytes, base);
            let end = read_u32(bytes, base + 4);
            let loop_point = read_u32(bytes, base + 8);
            sets.push(CueSet::clamped(i as u32 + 1, start, loop_point, end));
        }
    }
    channel.replace_cue_sets(sets, selected);
}

fn decode_cv_table(bytes: &[u8], layout: Layout, channel: &mut ChannelMetadata) {
    for input in 0..CV_INPUTS {
        let row = layout.cv_row(input);
        // Bit n+1 of the mask means parameter n is CV-enabled.
        let mask = read_u16(bytes, row);
        for param in 0..layout.cv_params() {
            let pair = row + 2 + param * 4;
            let enabled = mask & (1 << (param + 1)) != 0;
            let offset = read_u16(bytes, pair);
            let attenuation = read_u16(bytes, pair + 2);
            channel.set_cv_assignment(input, param, CvAssignment::new(enabled, attenuation, offset));
        }
    }
}

/// Encodes a channel description back into a record blob. The exact inverse
/// of [`decode`]: the enabled bitmask is re-derived from the CV matrix, cue
/// entries are written in disk field order, and the reserved ranges are
/// replayed verbatim.
pub fn encode(channel: &ChannelMetadata) -> Vec<u8> {
    let layout = match Layout::from_version(channel.format_version()) {
        Some(layout) => layout,
        None => {
            warn!(
                version = channel.format_version(),
                "Unknown channel format version, encoding with the newest layout"
            );
            Layout::newest()
        }
    };

    let mut bytes = vec![0u8; layout.record_len()];
    write_u32(&mut bytes, 0, (SIGNATURE << 8) | u32::from(layout.version()));

    write_u16(&mut bytes, off::ATTACK, channel.attack());
    write_u16(&mut bytes, off::DECAY, channel.decay());
    write_u16(&mut bytes, off::LEVEL, channel.level());
    write_u16(&mut bytes, off::SPEED, channel.speed());
    bytes[off::BIT_DEPTH] = channel.bit_depth();
    bytes[off::RATE] = channel.rate();

    let filter =
        ((channel.filter_frequency() & 0x0FFF) << 4) | u16::from(channel.filter_type() & 0xF);
    write_u16(&mut bytes, off::FILTER, filter);

    write_u16(&mut bytes, off::RESONANCE, channel.resonance());
    bytes[off::LOOP_MODE] = channel.loop_mode();
    bytes[off::QUANT_MODE] = channel.quant_mode();
    bytes[off::REVERSE] = channel.reverse() as u8;
    bytes[off::CROSSFADE] = channel.crossfade();
    bytes[off::STEP_TRIGGER_COUNT] = channel.step_trigger_count();
    bytes[off::EXTERNAL_TRIGGER_MODE] = channel.external_trigger_mode();
    bytes[off::CHOKE_GROUP] = channel.choke_group();
    bytes[off::CHANNEL_SOURCE] = channel.channel_source();
    bytes[off::RECORD_DESTINATION] = channel.record_destination();
    write_u16(&mut bytes, off::CHANNEL_FLAGS, channel.channel_flags());

    // Legacy single-cue scalars mirror cue set 0, in disk field order.
    write_u32(&mut bytes, off::START, channel.start_point());
    write_u32(&mut bytes, off::END, channel.end_point());
    write_u32(&mut bytes, off::LOOP, channel.loop_point());

    encode_cue_sets(&mut bytes, layout, channel);
    encode_cv_table(&mut bytes, layout, channel);

    for (index, (offset, length)) in layout.reserved().into_iter().enumerate() {
        let data = channel.reserved_bytes(index);
        if !data.is_empty() && data.len() != length {
            warn!(
                index,
                stored = data.len(),
                expected = length,
                "Reserved range length mismatch, writing what fits"
            );
        }
        let n = data.len().min(length);
        bytes[offset..offset + n].copy_from_slice(&data[..n]);
    }

    bytes
}

fn encode_cue_sets(bytes: &mut [u8], layout: Layout, channel: &ChannelMetadata) {
    let cue_base = layout.cue_base();
    bytes[cue_base] = channel.num_cue_sets() as u8;
    bytes[cue_base + 1] = channel.current_cue_set() as u8;
    for (i, cue) in channel.cue_sets().iter().enumerate() {
        let base = layout.cue_entry(i);
        write_u32(bytes, base, cue.start());
        write_u32(bytes, base + 4, cue.end());
        write_u32(bytes, base + 8, cue.loop_point());
    }
}

fn encode_cv_table(bytes: &mut [u8], layout: Layout, channel: &ChannelMetadata) {
    for input in 0..CV_INPUTS {
        let row = layout.cv_row(input);
        let mut mask = 0u16;
        for param in 0..layout.cv_params() {
            let assignment = channel.cv_assignment(input, param);
            if assignment.enabled() {
                mask |= 1 << (param + 1);
            }
            let pair = row + 2 + param * 4;
            write_u16(bytes, pair, assignment.offset());
            write_u16(bytes, pair + 2, assignment.attenuation());
        }
        write_u16(bytes, row, mask);

        // A v1 record has no room for the last parameter slots.
        for param in layout.cv_params()..crate::model::CV_PARAMS {
            let assignment = channel.cv_assignment(input, param);
            if assignment.enabled() {
                let name = Param::from_index(param).map_or("?", Param::display_name);
                debug!(input, param = name, "CV assignment dropped by v1 record layout");
            }
        }
    }
}

fn read_u16(bytes: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([bytes[offset], bytes[offset + 1]])
}

fn read_u32(bytes: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([
        bytes[offset],
        bytes[offset + 1],
        bytes[offset + 2],
        bytes[offset + 3],
    ])
}

fn write_u16(bytes: &mut [u8], offset: usize, value: u16) {
    bytes[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn write_u32(bytes: &mut [u8], offset: usize, value: u32) {
    bytes[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}
