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

//! Field-offset tables for the two supported on-disk record revisions.
//!
//! The layout is chosen once from the signature word at decode time; decode
//! and encode never branch on version beyond this table.

use crate::model::cue::MAX_CUE_SETS;
use crate::model::cv::CV_INPUTS;
use crate::model::RESERVED_RANGES;

/// High three bytes of the signature word at offset 0. The low byte carries
/// the layout version.
pub(crate) const SIGNATURE: u32 = 0x0044_5153;

/// Offset of the first CV input row. Everything before this is the common
/// scalar block, which is identical in both revisions.
const CV_BASE: usize = 64;

/// Size of one on-disk cue entry: three u32s in start/end/loop order.
pub(crate) const CUE_ENTRY_SIZE: usize = 12;

/// Byte offsets of the scalar fields within the common block.
pub(crate) mod off {
    pub const ATTACK: usize = 4;
    pub const DECAY: usize = 6;
    pub const LEVEL: usize = 8;
    pub const SPEED: usize = 10;
    pub const BIT_DEPTH: usize = 12;
    pub const RATE: usize = 13;
    /// Packed filter word: type in the low 4 bits, frequency in the high 12.
    pub const FILTER: usize = 14;
    pub const RESONANCE: usize = 16;
    pub const LOOP_MODE: usize = 18;
    pub const QUANT_MODE: usize = 19;
    pub const REVERSE: usize = 20;
    pub const CROSSFADE: usize = 21;
    pub const STEP_TRIGGER_COUNT: usize = 22;
    pub const EXTERNAL_TRIGGER_MODE: usize = 23;
    pub const CHOKE_GROUP: usize = 24;
    pub const CHANNEL_SOURCE: usize = 25;
    pub const RECORD_DESTINATION: usize = 26;
    pub const CHANNEL_FLAGS: usize = 28;
    /// Legacy single-cue scalars, mirrored by cue set 0. Disk order is
    /// start/end/loop, matching the cue table entries.
    pub const START: usize = 30;
    pub const END: usize = 34;
    pub const LOOP: usize = 38;
}

/// One on-disk record revision. The two revisions differ only in how many CV
/// parameter slots each input row carries and in the length of the trailing
/// reserved range.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Layout {
    /// Original firmware layout: 13 CV parameter slots per input.
    V1,
    /// Current layout: 15 CV parameter slots per input.
    V2,
}

impl Layout {
    /// The newest revision, used to encode fresh records and to make a best
    /// effort of reading records with an unknown version byte.
    pub fn newest() -> Layout {
        Layout::V2
    }

    pub fn from_version(version: u8) -> Option<Layout> {
        match version {
            1 => Some(Layout::V1),
            2 => Some(Layout::V2),
            _ => None,
        }
    }

    pub fn version(self) -> u8 {
        match self {
            Layout::V1 => 1,
            Layout::V2 => 2,
        }
    }

    /// Number of CV parameter slots carried per input row.
    pub fn cv_params(self) -> usize {
        match self {
            Layout::V1 => 13,
            Layout::V2 => 15,
        }
    }

    fn trailing_reserved(self) -> usize {
        match self {
            Layout::V1 => 64,
            Layout::V2 => 32,
        }
    }

    /// Stride of one CV input row: a u16 enabled bitmask followed by an
    /// {offset: u16, attenuation: u16} pair per parameter slot.
    pub fn cv_row_stride(self) -> usize {
        2 + 4 * self.cv_params()
    }

    /// Offset of the enabled bitmask for the given input.
    pub fn cv_row(self, input: usize) -> usize {
        CV_BASE + input * self.cv_row_stride()
    }

    /// Offset of the cue region: a count byte, a selected-index byte, a
    /// reserved gap, then the fixed 64-entry cue table.
    pub fn cue_base(self) -> usize {
        CV_BASE + CV_INPUTS * self.cv_row_stride()
    }

    /// Offset of the cue entry at `index` within the fixed cue table.
    pub fn cue_entry(self, index: usize) -> usize {
        self.cue_base() + 8 + index * CUE_ENTRY_SIZE
    }

    /// The thirteen opaque reserved ranges as (offset, length) pairs, in
    /// model order. Future fields are added by narrowing one of these, never
    /// by reinterpreting an existing one.
    pub fn reserved(self) -> [(usize, usize); RESERVED_RANGES] {
        let cue_base = self.cue_base();
        let tail = self.cue_entry(MAX_CUE_SETS);
        [
            (27, 1),
            (42, 6),
            (48, 8),
            (56, 4),
            (60, 4),
            (cue_base + 2, 6),
            (tail, 16),
            (tail + 16, 4),
            (tail + 20, 4),
            (tail + 24, 8),
            (tail + 32, 2),
            (tail + 34, 6),
            (tail + 40, self.trailing_reserved()),
        ]
    }

    /// Total record length for this revision.
    pub fn record_len(self) -> usize {
        let (offset, length) = self.reserved()[RESERVED_RANGES - 1];
        offset + length
    }
}
