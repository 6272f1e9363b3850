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

//! The in-memory metadata model: channels, banks, cue sets, CV assignments
//! and change notification.

pub mod bank;
pub mod channel;
pub mod cue;
pub mod cv;
pub mod observer;
pub mod params;

pub use bank::{BankMetadata, MAX_BANK_NAME, NUM_CHANNELS};
pub use channel::ChannelMetadata;
pub use cue::{CueSet, MAX_CUE_SETS};
pub use cv::{CvAssignment, CV_INPUTS, CV_PARAMS};
pub use observer::{Change, ChannelEvent, ScalarField};
pub use params::Param;

/// Number of opaque reserved byte ranges carried through the model.
pub const RESERVED_RANGES: usize = 13;
