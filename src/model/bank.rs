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

use super::channel::ChannelMetadata;

/// Number of sample-playback channels on the hardware module.
pub const NUM_CHANNELS: usize = 8;

/// Maximum length of a bank's display name.
pub const MAX_BANK_NAME: usize = 11;

/// A bank: a display name plus exactly eight channels, addressed by index.
/// A bank is created when a bank directory is loaded and replaced wholesale
/// on each load.
#[derive(Debug, Clone)]
pub struct BankMetadata {
    name: String,
    channels: [ChannelMetadata; NUM_CHANNELS],
}

impl BankMetadata {
    /// Creates a bank of default channels. The name is truncated to the
    /// display limit.
    pub fn new(name: &str) -> BankMetadata {
        BankMetadata {
            name: truncate_name(name),
            channels: std::array::from_fn(ChannelMetadata::new),
        }
    }

    /// The bank's display name.
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn set_name(&mut self, name: &str) -> bool {
        let name = truncate_name(name);
        if self.name == name {
            return false;
        }
        self.name = name;
        true
    }

    pub fn channel(&self, index: usize) -> &ChannelMetadata {
        assert!(index < NUM_CHANNELS, "channel index {} out of range", index);
        &self.channels[index]
    }

    pub fn channel_mut(&mut self, index: usize) -> &mut ChannelMetadata {
        assert!(index < NUM_CHANNELS, "channel index {} out of range", index);
        &mut self.channels[index]
    }

    pub fn channels(&self) -> &[ChannelMetadata] {
        &self.channels
    }
}

fn truncate_name(name: &str) -> String {
    name.chars().take(MAX_BANK_NAME).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_bank_has_eight_default_channels() {
        let bank = BankMetadata::new("MyBank");
        assert_eq!(bank.channels().len(), NUM_CHANNELS);
        for (i, channel) in bank.channels().iter().enumerate() {
            assert_eq!(channel.index(), i);
        }
    }

    #[test]
    fn test_name_is_truncated_to_display_limit() {
        let bank = BankMetadata::new("A name well past eleven");
        assert_eq!(bank.name(), "A name well");
        assert_eq!(bank.name().chars().count(), MAX_BANK_NAME);
    }

    #[test]
    fn test_set_name_reports_change() {
        let mut bank = BankMetadata::new("One");
        assert!(bank.set_name("Two"));
        assert!(!bank.set_name("Two"));
    }
}
