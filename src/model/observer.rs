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

//! Change notification for the metadata model. Storage is decoupled from
//! whoever renders it: setters publish typed events through registered
//! channel senders, so the model is fully testable without a UI attached.

use crossbeam_channel::{unbounded, Receiver, Sender};

/// A change to one channel's metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEvent {
    /// The hardware channel index (0-7).
    pub channel: usize,
    pub change: Change,
}

/// What changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Change {
    /// A single scalar parameter changed.
    Scalar(ScalarField),
    /// The sample file name changed.
    FileName,
    /// One cue set's points changed.
    Cue { index: usize },
    /// Cue sets were added or removed.
    CueList,
    /// One CV assignment changed.
    Cv { input: usize, param: usize },
    /// Everything was replaced (load, defaults, paste).
    All,
}

/// Scalar fields addressable in change events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScalarField {
    Attack,
    Decay,
    Level,
    Speed,
    BitDepth,
    Rate,
    FilterType,
    FilterFrequency,
    Resonance,
    LoopMode,
    QuantMode,
    Reverse,
    Crossfade,
    StepTriggerCount,
    ExternalTriggerMode,
    ChokeGroup,
    ChannelSource,
    RecordDestination,
    ChannelFlags,
    CurrentCueSet,
}

/// Listener list for one channel's change events.
#[derive(Debug, Default)]
pub struct Notifier {
    senders: Vec<Sender<ChannelEvent>>,
}

impl Notifier {
    /// Registers a new subscriber and returns its receiving end.
    pub fn subscribe(&mut self) -> Receiver<ChannelEvent> {
        let (sender, receiver) = unbounded();
        self.senders.push(sender);
        receiver
    }

    /// Publishes an event to all live subscribers. Subscribers whose
    /// receiving end has been dropped fall out of the list here.
    pub fn notify(&mut self, event: ChannelEvent) {
        self.senders.retain(|sender| sender.send(event).is_ok());
    }

    pub fn subscriber_count(&self) -> usize {
        self.senders.len()
    }
}
