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

//! In-memory model of one hardware channel's full configuration.

use base64::engine::general_purpose::STANDARD as BASE64;
use base64::Engine as _;
use crossbeam_channel::Receiver;
use tracing::warn;

use super::bank::NUM_CHANNELS;
use super::cue::{CueSet, MAX_CUE_SETS};
use super::cv::{CvAssignment, CvMatrix, CV_INPUTS, CV_PARAMS};
use super::observer::{Change, ChannelEvent, Notifier, ScalarField};
use super::RESERVED_RANGES;

/// One hardware channel's configuration: scalar playback parameters, the
/// cue-set list, the CV assignment matrix, and the opaque reserved ranges
/// carried for forward/backward record compatibility.
///
/// Setters return whether the value actually changed and publish typed change
/// events to subscribers. Out-of-range cue/CV indices are programming errors
/// and fail fast; indices are always internally generated.
#[derive(Debug)]
pub struct ChannelMetadata {
    index: usize,
    format_version: u8,
    file_name: Option<String>,
    attack: u16,
    decay: u16,
    level: u16,
    speed: u16,
    bit_depth: u8,
    rate: u8,
    filter_type: u8,
    filter_frequency: u16,
    resonance: u16,
    loop_mode: u8,
    quant_mode: u8,
    reverse: bool,
    crossfade: u8,
    step_trigger_count: u8,
    external_trigger_mode: u8,
    choke_group: u8,
    channel_source: u8,
    record_destination: u8,
    channel_flags: u16,
    cue_sets: Vec<CueSet>,
    current_cue_set: usize,
    cv: CvMatrix,
    /// The thirteen opaque reserved byte ranges, base64 text in memory.
    reserved: [String; RESERVED_RANGES],
    notifier: Notifier,
}

macro_rules! scalar_accessors {
    ($(#[$doc:meta])* $get:ident / $set:ident: $ty:ty => $field:ident, $tag:ident) => {
        $(#[$doc])*
        pub fn $get(&self) -> $ty {
            self.$field
        }

        pub fn $set(&mut self, value: $ty) -> bool {
            if self.$field == value {
                return false;
            }
            self.$field = value;
            self.notify(Change::Scalar(ScalarField::$tag));
            true
        }
    };
}

impl ChannelMetadata {
    /// Creates a channel with the hardware defaults. Source, choke group and
    /// record destination default to the channel's own index.
    pub fn new(index: usize) -> ChannelMetadata {
        assert!(index < NUM_CHANNELS, "channel index {} out of range", index);
        ChannelMetadata {
            index,
            format_version: crate::record::NEWEST_VERSION,
            file_name: None,
            attack: 0,
            decay: 0,
            level: 99,
            speed: 50,
            bit_depth: 16,
            rate: 1,
            filter_type: 0,
            filter_frequency: 0,
            resonance: 0,
            loop_mode: 0,
            quant_mode: 0,
            reverse: false,
            crossfade: 0,
            step_trigger_count: 0,
            external_trigger_mode: 0,
            choke_group: index as u8,
            channel_source: index as u8,
            record_destination: index as u8,
            channel_flags: 0,
            cue_sets: vec![CueSet::clamped(1, 0, 0, 0)],
            current_cue_set: 0,
            cv: CvMatrix::default(),
            reserved: std::array::from_fn(|_| String::new()),
            notifier: Notifier::default(),
        }
    }

    /// Registers a subscriber for this channel's change events.
    pub fn subscribe(&mut self) -> Receiver<ChannelEvent> {
        self.notifier.subscribe()
    }

    /// The hardware channel index (0-7).
    pub fn index(&self) -> usize {
        self.index
    }

    /// The record layout version this channel was decoded from (or will be
    /// encoded with).
    pub fn format_version(&self) -> u8 {
        self.format_version
    }

    pub(crate) fn set_format_version(&mut self, version: u8) {
        self.format_version = version;
    }

    /// The channel's sample file, as resolved by the bank loader.
    pub fn file_name(&self) -> Option<&str> {
        self.file_name.as_deref()
    }

    pub fn set_file_name(&mut self, file_name: Option<String>) -> bool {
        if self.file_name == file_name {
            return false;
        }
        self.file_name = file_name;
        self.notify(Change::FileName);
        true
    }

    scalar_accessors!(
        /// Envelope attack amount.
        attack / set_attack: u16 => attack, Attack
    );
    scalar_accessors!(
        /// Envelope decay amount.
        decay / set_decay: u16 => decay, Decay
    );
    scalar_accessors!(
        /// Playback level.
        level / set_level: u16 => level, Level
    );
    scalar_accessors!(
        /// Pitch/rate control.
        speed / set_speed: u16 => speed, Speed
    );
    scalar_accessors!(
        /// Playback bit depth, 1-16.
        bit_depth / set_bit_depth: u8 => bit_depth, BitDepth
    );
    scalar_accessors!(
        /// Sample-rate divider.
        rate / set_rate: u8 => rate, Rate
    );
    scalar_accessors!(
        /// Filter type, 0-4.
        filter_type / set_filter_type: u8 => filter_type, FilterType
    );
    scalar_accessors!(
        /// Filter cutoff frequency (12-bit, shares a packed record field
        /// with the filter type).
        filter_frequency / set_filter_frequency: u16 => filter_frequency, FilterFrequency
    );
    scalar_accessors!(
        /// Filter resonance.
        resonance / set_resonance: u16 => resonance, Resonance
    );
    scalar_accessors!(
        /// Loop mode, 0-4.
        loop_mode / set_loop_mode: u8 => loop_mode, LoopMode
    );
    scalar_accessors!(
        /// Quantization mode, 0-14.
        quant_mode / set_quant_mode: u8 => quant_mode, QuantMode
    );
    scalar_accessors!(
        /// Reverse playback flag.
        reverse / set_reverse: bool => reverse, Reverse
    );
    scalar_accessors!(
        /// Crossfade amount.
        crossfade / set_crossfade: u8 => crossfade, Crossfade
    );
    scalar_accessors!(
        /// Step-trigger count.
        step_trigger_count / set_step_trigger_count: u8 => step_trigger_count, StepTriggerCount
    );
    scalar_accessors!(
        /// External trigger mode.
        external_trigger_mode / set_external_trigger_mode: u8 => external_trigger_mode, ExternalTriggerMode
    );
    scalar_accessors!(
        /// Choke group.
        choke_group / set_choke_group: u8 => choke_group, ChokeGroup
    );
    scalar_accessors!(
        /// Channel input source index.
        channel_source / set_channel_source: u8 => channel_source, ChannelSource
    );
    scalar_accessors!(
        /// Record destination index.
        record_destination / set_record_destination: u8 => record_destination, RecordDestination
    );
    scalar_accessors!(
        /// Channel flags bitset.
        channel_flags / set_channel_flags: u16 => channel_flags, ChannelFlags
    );

    // --- Cue sets ---------------------------------------------------------

    /// Number of cue sets, 1..=64.
    pub fn num_cue_sets(&self) -> usize {
        self.cue_sets.len()
    }

    pub fn cue_set(&self, index: usize) -> &CueSet {
        assert!(
            index < self.cue_sets.len(),
            "cue set index {} out of range",
            index
        );
        &self.cue_sets[index]
    }

    pub fn cue_sets(&self) -> &[CueSet] {
        &self.cue_sets
    }

    /// Index of the currently selected cue set.
    pub fn current_cue_set(&self) -> usize {
        self.current_cue_set
    }

    pub fn set_current_cue_set(&mut self, index: usize) -> bool {
        assert!(
            index < self.cue_sets.len(),
            "cue set index {} out of range",
            index
        );
        if self.current_cue_set == index {
            return false;
        }
        self.current_cue_set = index;
        self.notify(Change::Scalar(ScalarField::CurrentCueSet));
        true
    }

    /// Sets the points of an existing cue set, or appends a new one when
    /// `index` equals the current count. The loop point is clamped to keep
    /// `start <= loop < end`. Appending past the 64-set ceiling is refused.
    pub fn set_cue_points(&mut self, index: usize, start: u32, loop_point: u32, end: u32) -> bool {
        assert!(
            index <= self.cue_sets.len(),
            "cue set index {} out of range",
            index
        );

        if index == self.cue_sets.len() {
            if self.cue_sets.len() == MAX_CUE_SETS {
                warn!(channel = self.index, "Cue set ceiling reached, not appending");
                return false;
            }
            let cue = CueSet::clamped(index as u32 + 1, start, loop_point, end);
            self.cue_sets.push(cue);
            self.notify(Change::CueList);
            return true;
        }

        let cue = CueSet::clamped(self.cue_sets[index].id(), start, loop_point, end);
        if self.cue_sets[index] == cue {
            return false;
        }
        self.cue_sets[index] = cue;
        self.notify(Change::Cue { index });
        true
    }

    /// Removes a cue set and renumbers the remaining ids contiguously from 1.
    /// Refuses (returning false) when only one cue set remains; the current
    /// index is clamped if the removed set was the last one.
    pub fn remove_cue_set(&mut self, index: usize) -> bool {
        if self.cue_sets.len() == 1 {
            return false;
        }
        assert!(
            index < self.cue_sets.len(),
            "cue set index {} out of range",
            index
        );

        self.cue_sets.remove(index);
        for (i, cue) in self.cue_sets.iter_mut().enumerate() {
            cue.set_id(i as u32 + 1);
        }
        self.current_cue_set = self.current_cue_set.min(self.cue_sets.len() - 1);
        self.notify(Change::CueList);
        true
    }

    /// Replaces the whole cue list, used by the codec and the bank loader.
    /// An empty list collapses to the single all-zero set.
    pub(crate) fn replace_cue_sets(&mut self, mut sets: Vec<CueSet>, selected: usize) {
        if sets.is_empty() {
            sets.push(CueSet::clamped(1, 0, 0, 0));
        }
        sets.truncate(MAX_CUE_SETS);
        for (i, cue) in sets.iter_mut().enumerate() {
            cue.set_id(i as u32 + 1);
        }
        self.current_cue_set = selected.min(sets.len() - 1);
        self.cue_sets = sets;
        self.notify(Change::CueList);
    }

    // Cue set 0 mirrors the legacy start/loop/end scalars for callers
    // unaware of multi-cue-sets.

    /// Legacy playback start, a byte offset (cue set 0).
    pub fn start_point(&self) -> u32 {
        self.cue_sets[0].start()
    }

    /// Legacy loop point, a byte offset (cue set 0).
    pub fn loop_point(&self) -> u32 {
        self.cue_sets[0].loop_point()
    }

    /// Legacy playback end, a byte offset (cue set 0).
    pub fn end_point(&self) -> u32 {
        self.cue_sets[0].end()
    }

    pub fn set_start_point(&mut self, start: u32) -> bool {
        let cue = self.cue_sets[0];
        self.set_cue_points(0, start, cue.loop_point(), cue.end())
    }

    pub fn set_loop_point(&mut self, loop_point: u32) -> bool {
        let cue = self.cue_sets[0];
        self.set_cue_points(0, cue.start(), loop_point, cue.end())
    }

    pub fn set_end_point(&mut self, end: u32) -> bool {
        let cue = self.cue_sets[0];
        self.set_cue_points(0, cue.start(), cue.loop_point(), end)
    }

    // --- CV assignments ---------------------------------------------------

    fn assert_cv_bounds(input: usize, param: usize) {
        assert!(input < CV_INPUTS, "CV input {} out of range", input);
        assert!(param < CV_PARAMS, "CV parameter {} out of range", param);
    }

    pub fn cv_assignment(&self, input: usize, param: usize) -> CvAssignment {
        Self::assert_cv_bounds(input, param);
        self.cv[input][param]
    }

    pub fn set_cv_assignment(&mut self, input: usize, param: usize, value: CvAssignment) -> bool {
        Self::assert_cv_bounds(input, param);
        if self.cv[input][param] == value {
            return false;
        }
        self.cv[input][param] = value;
        self.notify(Change::Cv { input, param });
        true
    }

    pub fn set_cv_enabled(&mut self, input: usize, param: usize, enabled: bool) -> bool {
        let mut value = self.cv_assignment(input, param);
        value.set_enabled(enabled);
        self.set_cv_assignment(input, param, value)
    }

    /// Sets the attenuation in the internal 0..=199 encoding.
    pub fn set_cv_attenuation(&mut self, input: usize, param: usize, attenuation: u16) -> bool {
        let mut value = self.cv_assignment(input, param);
        value.set_attenuation(attenuation);
        self.set_cv_assignment(input, param, value)
    }

    pub fn set_cv_offset(&mut self, input: usize, param: usize, offset: u16) -> bool {
        let mut value = self.cv_assignment(input, param);
        value.set_offset(offset);
        self.set_cv_assignment(input, param, value)
    }

    // --- Reserved ranges --------------------------------------------------

    /// The reserved range at `index` as base64 text. Never interpreted.
    pub fn reserved(&self, index: usize) -> &str {
        assert!(
            index < RESERVED_RANGES,
            "reserved range index {} out of range",
            index
        );
        &self.reserved[index]
    }

    /// The reserved range at `index` decoded back to raw bytes.
    pub fn reserved_bytes(&self, index: usize) -> Vec<u8> {
        let text = self.reserved(index);
        match BASE64.decode(text) {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!(channel = self.index, index, error = %e, "Undecodable reserved range");
                Vec::new()
            }
        }
    }

    pub(crate) fn set_reserved_bytes(&mut self, index: usize, bytes: &[u8]) {
        assert!(
            index < RESERVED_RANGES,
            "reserved range index {} out of range",
            index
        );
        self.reserved[index] = BASE64.encode(bytes);
    }

    // --- Whole-channel operations -----------------------------------------

    /// Deep-replaces this channel's configuration from another: CV matrix,
    /// cue-set list, scalars and reserved ranges. Used both for "load
    /// defaults" and for paste-from-clipboard. The channel index, sample
    /// file name and subscriber list are kept.
    pub fn copy_from(&mut self, source: &ChannelMetadata) {
        self.format_version = source.format_version;
        self.attack = source.attack;
        self.decay = source.decay;
        self.level = source.level;
        self.speed = source.speed;
        self.bit_depth = source.bit_depth;
        self.rate = source.rate;
        self.filter_type = source.filter_type;
        self.filter_frequency = source.filter_frequency;
        self.resonance = source.resonance;
        self.loop_mode = source.loop_mode;
        self.quant_mode = source.quant_mode;
        self.reverse = source.reverse;
        self.crossfade = source.crossfade;
        self.step_trigger_count = source.step_trigger_count;
        self.external_trigger_mode = source.external_trigger_mode;
        self.choke_group = source.choke_group;
        self.channel_source = source.channel_source;
        self.record_destination = source.record_destination;
        self.channel_flags = source.channel_flags;
        self.cue_sets = source.cue_sets.clone();
        self.current_cue_set = source.current_cue_set;
        self.cv = source.cv;
        self.reserved = source.reserved.clone();
        self.notify(Change::All);
    }

    fn notify(&mut self, change: Change) {
        let event = ChannelEvent {
            channel: self.index,
            change,
        };
        self.notifier.notify(event);
    }
}

impl Clone for ChannelMetadata {
    /// Deep copy of the configuration. The clone starts with no subscribers:
    /// the "unedited" twin taken at load time must not re-notify the
    /// original's observers.
    fn clone(&self) -> ChannelMetadata {
        ChannelMetadata {
            index: self.index,
            format_version: self.format_version,
            file_name: self.file_name.clone(),
            attack: self.attack,
            decay: self.decay,
            level: self.level,
            speed: self.speed,
            bit_depth: self.bit_depth,
            rate: self.rate,
            filter_type: self.filter_type,
            filter_frequency: self.filter_frequency,
            resonance: self.resonance,
            loop_mode: self.loop_mode,
            quant_mode: self.quant_mode,
            reverse: self.reverse,
            crossfade: self.crossfade,
            step_trigger_count: self.step_trigger_count,
            external_trigger_mode: self.external_trigger_mode,
            choke_group: self.choke_group,
            channel_source: self.channel_source,
            record_destination: self.record_destination,
            channel_flags: self.channel_flags,
            cue_sets: self.cue_sets.clone(),
            current_cue_set: self.current_cue_set,
            cv: self.cv,
            reserved: self.reserved.clone(),
            notifier: Notifier::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_setter_reports_change() {
        let mut channel = ChannelMetadata::new(0);
        assert!(channel.set_filter_frequency(2048));
        assert!(!channel.set_filter_frequency(2048));
        assert_eq!(channel.filter_frequency(), 2048);
    }

    #[test]
    fn test_setter_publishes_event() {
        let mut channel = ChannelMetadata::new(3);
        let events = channel.subscribe();

        channel.set_level(42);
        assert_eq!(
            events.try_recv().unwrap(),
            ChannelEvent {
                channel: 3,
                change: Change::Scalar(ScalarField::Level),
            }
        );

        // An unchanged value publishes nothing.
        channel.set_level(42);
        assert!(events.try_recv().is_err());
    }

    #[test]
    fn test_set_cue_points_appends_at_count() {
        let mut channel = ChannelMetadata::new(0);
        assert_eq!(channel.num_cue_sets(), 1);

        assert!(channel.set_cue_points(1, 0, 100, 400));
        assert_eq!(channel.num_cue_sets(), 2);
        assert_eq!(channel.cue_set(1).id(), 2);
        assert_eq!(channel.cue_set(1).loop_point(), 100);
    }

    #[test]
    fn test_set_cue_points_overwrites_existing() {
        let mut channel = ChannelMetadata::new(0);
        channel.set_cue_points(0, 10, 20, 30);
        assert_eq!(channel.cue_set(0).start(), 10);
        assert!(!channel.set_cue_points(0, 10, 20, 30));
    }

    #[test]
    #[should_panic(expected = "out of range")]
    fn test_set_cue_points_past_count_panics() {
        let mut channel = ChannelMetadata::new(0);
        channel.set_cue_points(2, 0, 0, 100);
    }

    #[test]
    fn test_cue_set_ceiling() {
        let mut channel = ChannelMetadata::new(0);
        for i in 1..MAX_CUE_SETS {
            assert!(channel.set_cue_points(i, 0, 0, (i as u32 + 1) * 10));
        }
        assert_eq!(channel.num_cue_sets(), MAX_CUE_SETS);
        assert!(!channel.set_cue_points(MAX_CUE_SETS, 0, 0, 10));
    }

    #[test]
    fn test_remove_cue_set_refuses_last() {
        let mut channel = ChannelMetadata::new(0);
        assert!(!channel.remove_cue_set(0));
        assert_eq!(channel.num_cue_sets(), 1);
    }

    #[test]
    fn test_remove_cue_set_renumbers_contiguously() {
        let mut channel = ChannelMetadata::new(0);
        for i in 1..4 {
            channel.set_cue_points(i, 0, 0, (i as u32 + 1) * 100);
        }
        channel.set_current_cue_set(3);

        assert!(channel.remove_cue_set(1));
        assert_eq!(channel.num_cue_sets(), 3);
        let ids: Vec<u32> = channel.cue_sets().iter().map(|c| c.id()).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        // Current index clamped back into range.
        assert_eq!(channel.current_cue_set(), 2);
    }

    #[test]
    fn test_cue_set_zero_mirrors_legacy_scalars() {
        let mut channel = ChannelMetadata::new(0);
        channel.set_cue_points(0, 100, 200, 400);
        assert_eq!(channel.start_point(), 100);
        assert_eq!(channel.loop_point(), 200);
        assert_eq!(channel.end_point(), 400);

        channel.set_loop_point(300);
        assert_eq!(channel.cue_set(0).loop_point(), 300);
    }

    #[test]
    #[should_panic(expected = "CV parameter")]
    fn test_cv_bounds_are_programming_errors() {
        let channel = ChannelMetadata::new(0);
        channel.cv_assignment(0, CV_PARAMS);
    }

    #[test]
    fn test_copy_from_is_deep_replace() {
        let mut source = ChannelMetadata::new(5);
        source.set_attack(77);
        source.set_cue_points(1, 0, 50, 500);
        source.set_cv_enabled(2, 3, true);
        source.set_reserved_bytes(4, &[1, 2, 3]);
        source.set_file_name(Some("source.wav".to_string()));

        let mut target = ChannelMetadata::new(1);
        target.set_file_name(Some("target.wav".to_string()));
        target.copy_from(&source);

        assert_eq!(target.attack(), 77);
        assert_eq!(target.num_cue_sets(), 2);
        assert!(target.cv_assignment(2, 3).enabled());
        assert_eq!(target.reserved_bytes(4), vec![1, 2, 3]);
        // Index and file name are not part of the copy.
        assert_eq!(target.index(), 1);
        assert_eq!(target.file_name(), Some("target.wav"));
    }

    #[test]
    fn test_clone_drops_subscribers() {
        let mut channel = ChannelMetadata::new(0);
        let events = channel.subscribe();

        let mut twin = channel.clone();
        twin.set_level(7);
        assert!(events.try_recv().is_err());
    }
}
