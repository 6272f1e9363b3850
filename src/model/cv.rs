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

/// Number of modulation inputs on the hardware.
pub const CV_INPUTS: usize = 8;

/// Number of assignable parameters per modulation input.
pub const CV_PARAMS: usize = 15;

/// The full 8x15 assignment matrix of one channel.
pub type CvMatrix = [[CvAssignment; CV_PARAMS]; CV_INPUTS];

/// Routing of one modulation input to one channel parameter.
///
/// Attenuation is kept in the hardware's internal 0..=199 encoding, where
/// values above 99 stand for negative percentages. The asymmetric encoding
/// is preserved exactly so records round-trip byte-for-byte.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CvAssignment {
    enabled: bool,
    attenuation: u16,
    offset: u16,
}

impl CvAssignment {
    pub fn new(enabled: bool, attenuation: u16, offset: u16) -> CvAssignment {
        CvAssignment {
            enabled,
            attenuation,
            offset,
        }
    }

    pub fn enabled(&self) -> bool {
        self.enabled
    }

    /// Attenuation in the internal 0..=199 encoding.
    pub fn attenuation(&self) -> u16 {
        self.attenuation
    }

    /// Attenuation as the signed percentage shown to the user.
    pub fn attenuation_percent(&self) -> i32 {
        attenuation_percent(self.attenuation)
    }

    /// u16 percentage offset applied after attenuation.
    pub fn offset(&self) -> u16 {
        self.offset
    }

    pub(crate) fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub(crate) fn set_attenuation(&mut self, attenuation: u16) {
        self.attenuation = attenuation;
    }

    pub(crate) fn set_offset(&mut self, offset: u16) {
        self.offset = offset;
    }
}

/// Maps the internal 0..=199 attenuation encoding to a signed percentage:
/// values above 99 encode negatives as `100 - internal`.
pub fn attenuation_percent(internal: u16) -> i32 {
    if internal > 99 {
        100 - i32::from(internal)
    } else {
        i32::from(internal)
    }
}

/// Maps a signed percentage back to the internal encoding. The input is
/// clamped to the displayable -99..=99 range; the result never leaves
/// 0..=199.
pub fn attenuation_internal(percent: i32) -> u16 {
    let percent = percent.clamp(-99, 99);
    if percent < 0 {
        (100 - percent) as u16
    } else {
        percent as u16
    }
}
