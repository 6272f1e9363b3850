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

//! Deep structural comparison between bank/channel snapshots, used to detect
//! unsaved edits against the "unedited" twin taken at load time. Boolean
//! results only; comparison short-circuits on the first mismatch.

use crate::model::{BankMetadata, ChannelMetadata, CV_INPUTS, CV_PARAMS, NUM_CHANNELS};

/// Whether two channel snapshots are structurally equal: the full CV matrix,
/// then the cue-set list, then the ordered scalar fields.
pub fn channels_equal(a: &ChannelMetadata, b: &ChannelMetadata) -> bool {
    for input in 0..CV_INPUTS {
        for param in 0..CV_PARAMS {
            if a.cv_assignment(input, param) != b.cv_assignment(input, param) {
                return false;
            }
        }
    }

    if a.num_cue_sets() != b.num_cue_sets() {
        return false;
    }
    for index in 0..a.num_cue_sets() {
        let (ca, cb) = (a.cue_set(index), b.cue_set(index));
        if ca.start() != cb.start() || ca.loop_point() != cb.loop_point() || ca.end() != cb.end() {
            return false;
        }
    }

    a.attack() == b.attack()
        && a.decay() == b.decay()
        && a.level() == b.level()
        && a.speed() == b.speed()
        && a.bit_depth() == b.bit_depth()
        && a.rate() == b.rate()
        && a.filter_type() == b.filter_type()
        && a.filter_frequency() == b.filter_frequency()
        && a.resonance() == b.resonance()
        && a.loop_mode() == b.loop_mode()
        && a.quant_mode() == b.quant_mode()
        && a.reverse() == b.reverse()
        && a.crossfade() == b.crossfade()
        && a.step_trigger_count() == b.step_trigger_count()
        && a.external_trigger_mode() == b.external_trigger_mode()
        && a.choke_group() == b.choke_group()
        && a.channel_source() == b.channel_source()
        && a.record_destination() == b.record_destination()
        && a.channel_flags() == b.channel_flags()
        && a.current_cue_set() == b.current_cue_set()
        && a.file_name() == b.file_name()
}

/// Whether two banks are equal at the bank level: display name only.
pub fn banks_equal(a: &BankMetadata, b: &BankMetadata) -> bool {
    a.name() == b.name()
}

/// Whether two banks are entirely equal: bank equality and all eight
/// channels.
pub fn entire_banks_equal(a: &BankMetadata, b: &BankMetadata) -> bool {
    if !banks_equal(a, b) {
        return false;
    }
    (0..NUM_CHANNELS).all(|index| channels_equal(a.channel(index), b.channel(index)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testutil::rich_channel;

    #[test]
    fn test_identical_channels_are_equal() {
        let a = rich_channel(2);
        assert!(channels_equal(&a, &a.clone()));
    }

    #[test]
    fn test_scalar_difference_breaks_equality() {
        let a = rich_channel(0);
        let mut b = a.clone();
        b.set_filter_frequency(a.filter_frequency() + 1);
        assert!(!channels_equal(&a, &b));
    }

    #[test]
    fn test_cv_difference_breaks_equality() {
        let a = rich_channel(0);
        let mut b = a.clone();
        b.set_cv_offset(7, 14, 55);
        assert!(!channels_equal(&a, &b));
    }

    #[test]
    fn test_cue_list_difference_breaks_equality() {
        let a = rich_channel(0);
        let mut b = a.clone();
        b.set_cue_points(b.num_cue_sets(), 0, 0, 999);
        assert!(!channels_equal(&a, &b));
    }

    #[test]
    fn test_entire_banks_equal_on_copies() {
        let mut bank = BankMetadata::new("MyBank");
        bank.channel_mut(4).copy_from(&rich_channel(4));
        let twin = bank.clone();

        assert!(entire_banks_equal(&bank, &twin));

        bank.channel_mut(4).set_filter_frequency(123);
        assert!(!entire_banks_equal(&bank, &twin));
        // Bank-level equality only looks at the name.
        assert!(banks_equal(&bank, &twin));
    }

    #[test]
    fn test_name_difference_breaks_bank_equality() {
        let a = BankMetadata::new("One");
        let b = BankMetadata::new("Two");
        assert!(!banks_equal(&a, &b));
        assert!(!entire_banks_equal(&a, &b));
    }
}
