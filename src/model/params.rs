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

use std::fmt;

use super::cv::CV_PARAMS;

/// The fixed index table of CV-assignable parameters. The order matches the
/// per-parameter rows of the record's CV table; v1 records predate the last
/// two slots.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Level,
    Attack,
    Decay,
    Speed,
    BitDepth,
    Rate,
    FilterFrequency,
    Resonance,
    StartPoint,
    EndPoint,
    LoopPoint,
    Crossfade,
    QuantMode,
    StepCount,
    Reverse,
}

impl Param {
    /// All assignable parameters in CV-table row order.
    pub const ALL: [Param; CV_PARAMS] = [
        Param::Level,
        Param::Attack,
        Param::Decay,
        Param::Speed,
        Param::BitDepth,
        Param::Rate,
        Param::FilterFrequency,
        Param::Resonance,
        Param::StartPoint,
        Param::EndPoint,
        Param::LoopPoint,
        Param::Crossfade,
        Param::QuantMode,
        Param::StepCount,
        Param::Reverse,
    ];

    /// The parameter's row index within the CV table.
    pub fn index(self) -> usize {
        Param::ALL
            .iter()
            .position(|p| *p == self)
            .unwrap_or_default()
    }

    pub fn from_index(index: usize) -> Option<Param> {
        Param::ALL.get(index).copied()
    }

    /// Display name for the UI's assignment table.
    pub fn display_name(self) -> &'static str {
        match self {
            Param::Level => "Level",
            Param::Attack => "Attack",
            Param::Decay => "Decay",
            Param::Speed => "Speed",
            Param::BitDepth => "Bits",
            Param::Rate => "Rate",
            Param::FilterFrequency => "Filter",
            Param::Resonance => "Res",
            Param::StartPoint => "Start",
            Param::EndPoint => "End",
            Param::LoopPoint => "Loop",
            Param::Crossfade => "Xfade",
            Param::QuantMode => "Quant",
            Param::StepCount => "Steps",
            Param::Reverse => "Reverse",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_index_round_trip() {
        for (i, param) in Param::ALL.iter().enumerate() {
            assert_eq!(param.index(), i);
            assert_eq!(Param::from_index(i), Some(*param));
        }
        assert_eq!(Param::from_index(CV_PARAMS), None);
    }

    #[test]
    fn test_display_names_are_unique() {
        for a in Param::ALL {
            for b in Param::ALL {
                if a != b {
                    assert_ne!(a.display_name(), b.display_name());
                }
            }
        }
    }
}
