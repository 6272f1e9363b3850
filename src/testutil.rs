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

//! Shared test fixtures.

use std::path::Path;

use hound::{SampleFormat, WavSpec, WavWriter};

use crate::model::cv::CvAssignment;
use crate::model::ChannelMetadata;
use crate::record::layout::Layout;

/// Writes a 16-bit mono wav file with the given samples.
pub fn write_mono_wav(path: &Path, samples: &[i16], sample_rate: u32) {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec).expect("unable to create wav");
    for sample in samples {
        writer.write_sample(*sample).expect("unable to write sample");
    }
    writer.finalize().expect("unable to finalize wav");
}

/// A channel with every kind of state populated: non-default scalars, several
/// cue sets, a handful of CV assignments and distinct bytes in each reserved
/// range. No sample file name is set.
pub fn rich_channel(index: usize) -> ChannelMetadata {
    let mut channel = ChannelMetadata::new(index);

    channel.set_attack(12);
    channel.set_decay(34);
    channel.set_level(80);
    channel.set_speed(62);
    channel.set_bit_depth(12);
    channel.set_rate(2);
    channel.set_filter_type(2);
    channel.set_filter_frequency(0x0123);
    channel.set_resonance(77);
    channel.set_loop_mode(1);
    channel.set_quant_mode(3);
    channel.set_reverse(true);
    channel.set_crossfade(9);
    channel.set_step_trigger_count(4);
    channel.set_external_trigger_mode(1);
    channel.set_choke_group(5);
    channel.set_channel_source(2);
    channel.set_record_destination(6);
    channel.set_channel_flags(0b1010_0001);

    channel.set_cue_points(0, 100, 200, 400);
    channel.set_cue_points(1, 500, 600, 900);
    channel.set_cue_points(2, 1000, 1000, 2000);
    channel.set_current_cue_set(1);

    channel.set_cv_assignment(0, 0, CvAssignment::new(true, 150, 40));
    channel.set_cv_assignment(3, 7, CvAssignment::new(true, 25, 0));
    channel.set_cv_assignment(7, 14, CvAssignment::new(true, 199, 99));
    channel.set_cv_assignment(5, 2, CvAssignment::new(false, 10, 10));

    for (i, (_, length)) in Layout::V2.reserved().into_iter().enumerate() {
        let bytes: Vec<u8> = (0..length)
            .map(|j| (i as u8).wrapping_mul(31).wrapping_add(j as u8))
            .collect();
        channel.set_reserved_bytes(i, &bytes);
    }

    channel
}
