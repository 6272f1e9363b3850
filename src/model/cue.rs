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

/// Maximum number of cue sets a channel can carry.
pub const MAX_CUE_SETS: usize = 64;

/// One {start, loop, end} triple of byte offsets into the sample data.
///
/// Invariant: `start <= loop < end`, except the all-zero degenerate set used
/// for an empty sample. In-memory order is start/loop/end; the on-disk record
/// stores start/end/loop, and the codec permutes between the two.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CueSet {
    id: u32,
    start: u32,
    loop_point: u32,
    end: u32,
}

impl CueSet {
    /// Builds a cue set, clamping the loop point into `start..end`. The
    /// all-zero set is kept as-is.
    pub fn clamped(id: u32, start: u32, loop_point: u32, end: u32) -> CueSet {
        if start == 0 && loop_point == 0 && end == 0 {
            return CueSet {
                id,
                start: 0,
                loop_point: 0,
                end: 0,
            };
        }
        let end = end.max(start.saturating_add(1));
        let loop_point = loop_point.clamp(start, end - 1);
        CueSet {
            id,
            start,
            loop_point,
            end,
        }
    }

    /// Display id, contiguous from 1 within a channel's cue list.
    pub fn id(&self) -> u32 {
        self.id
    }

    /// Playback start, as a byte offset.
    pub fn start(&self) -> u32 {
        self.start
    }

    /// Loop point, as a byte offset.
    pub fn loop_point(&self) -> u32 {
        self.loop_point
    }

    /// Playback end, as a byte offset.
    pub fn end(&self) -> u32 {
        self.end
    }

    pub(crate) fn set_id(&mut self, id: u32) {
        self.id = id;
    }

    /// Whether this is the degenerate all-zero set of an empty sample.
    pub fn is_empty(&self) -> bool {
        self.start == 0 && self.loop_point == 0 && self.end == 0
    }
}
