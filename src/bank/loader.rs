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

//! Directory-based bank loading.
//!
//! Each of the eight channels resolves its sample file from the per-channel
//! subfolder convention (`<bank>/<1..8>/<name>.wav`), migrating legacy flat
//! `chan-00N.wav` files into a subfolder on first sight. The embedded record
//! is decoded when present; otherwise the channel is defaulted from the raw
//! audio file's facts.

use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use super::{LoadError, LoadObserver, BANK_NAME_FILE};
use crate::cache::{DecodedSample, SampleCache, SampleStatus};
use crate::chunk::{self, ChunkError};
use crate::model::cue::CueSet;
use crate::model::{BankMetadata, ChannelMetadata, NUM_CHANNELS};
use crate::record::{self, RecordError};

/// Tag of the embedded record chunk.
pub(crate) const RECORD_TAG: [u8; 4] = *b"busy";

/// The result of a bank load: the live bank, its "unedited" deep-copy twin
/// taken at load time for dirty-checking and revert, and whatever
/// per-channel failures were contained along the way.
pub struct LoadOutcome {
    pub bank: BankMetadata,
    pub unedited: BankMetadata,
    pub errors: Vec<(usize, LoadError)>,
}

/// Loads a bank directory: resolves each channel's sample file, decodes its
/// embedded record or applies bare-file defaults, and reads the bank name
/// from `info.txt`. Channel failures are contained so one bad channel never
/// blocks the other seven.
pub fn load_bank(
    dir: &Path,
    cache: &SampleCache,
    observer: &mut dyn LoadObserver,
) -> LoadOutcome {
    observer.load_begin(dir);
    info!(bank = ?dir, "Loading bank");

    let mut bank = BankMetadata::new(&bank_name(dir));
    let mut errors = Vec::new();

    for index in 0..NUM_CHANNELS {
        observer.channel_load_begin(index);
        if let Err(e) = load_channel(dir, index, bank.channel_mut(index), cache) {
            warn!(channel = index + 1, error = %e, "Channel failed to load, keeping defaults");
            errors.push((index, e));
        }
        observer.channel_load_complete(index);
    }

    observer.load_complete(&bank);
    let unedited = bank.clone();
    LoadOutcome {
        bank,
        unedited,
        errors,
    }
}

/// Reads the bank display name from the first line of `info.txt`, falling
/// back to the directory name.
fn bank_name(dir: &Path) -> String {
    match fs::read_to_string(dir.join(BANK_NAME_FILE)) {
        Ok(contents) => contents.lines().next().unwrap_or("").trim_end().to_string(),
        Err(e) => {
            debug!(bank = ?dir, error = %e, "No readable bank name file");
            dir.file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("Bank")
                .to_string()
        }
    }
}

fn load_channel(
    dir: &Path,
    index: usize,
    channel: &mut ChannelMetadata,
    cache: &SampleCache,
) -> Result<(), LoadError> {
    let Some(path) = resolve_sample_file(dir, index)? else {
        debug!(channel = index + 1, "No sample file, channel left empty");
        return Ok(());
    };

    // The loader only needs the decoded facts; residency is driven by the
    // callers that reference the file afterwards. The open is balanced with
    // a close before returning so repeated loads never pin cache entries.
    let decoded = cache.open(&path);
    let result = configure_channel(&path, index, channel, &decoded);
    cache.close(&path);
    result
}

fn configure_channel(
    path: &Path,
    index: usize,
    channel: &mut ChannelMetadata,
    decoded: &DecodedSample,
) -> Result<(), LoadError> {
    match decoded.status() {
        SampleStatus::DoesNotExist => return Err(LoadError::FileMissing(path.to_path_buf())),
        // A rejected file leaves the channel empty, with no file name.
        SampleStatus::WrongFormat => {
            return Err(LoadError::UnsupportedAudioFormat(path.to_path_buf()))
        }
        SampleStatus::Exists => {}
    }
    channel.set_file_name(Some(path.to_string_lossy().into_owned()));

    match read_record(path) {
        Ok(bytes) => match record::decode(&bytes) {
            Ok(source) => {
                channel.copy_from(&source);
                debug!(channel = index + 1, version = channel.format_version(), "Record decoded");
                return Ok(());
            }
            Err(e @ RecordError::BadSignature { .. }) => {
                warn!(channel = index + 1, error = %e, "Record unrecognized, using bare defaults");
            }
            Err(e) => {
                warn!(channel = index + 1, error = %e, "Record unreadable, using bare defaults");
            }
        },
        Err(ChunkError::NotFound(_)) => {
            debug!(channel = index + 1, "No embedded record, using bare defaults");
        }
        Err(e) => return Err(e.into()),
    }

    apply_bare_defaults(channel, index, decoded);
    Ok(())
}

/// Resolves a channel's sample file. Current convention is a subfolder named
/// by channel number holding exactly one wav; a legacy flat `chan-00N.wav`
/// is migrated into a freshly created subfolder on first sight. A failed
/// copy is reported, not retried.
fn resolve_sample_file(dir: &Path, index: usize) -> Result<Option<PathBuf>, LoadError> {
    let subdir = dir.join((index + 1).to_string());
    if let Some(found) = wav_in_dir(&subdir)? {
        return Ok(Some(found));
    }

    let legacy_name = format!("chan-00{}.wav", index + 1);
    let legacy = dir.join(&legacy_name);
    if !legacy.is_file() {
        return Ok(None);
    }

    info!(channel = index + 1, file = %legacy_name, "Migrating legacy channel file");
    let target = subdir.join(&legacy_name);
    fs::create_dir_all(&subdir)
        .and_then(|_| fs::copy(&legacy, &target).map(|_| ()))
        .map_err(|source| LoadError::Migration {
            path: legacy,
            source,
        })?;
    Ok(Some(target))
}

fn wav_in_dir(dir: &Path) -> Result<Option<PathBuf>, LoadError> {
    if !dir.is_dir() {
        return Ok(None);
    }
    let mut wavs: Vec<PathBuf> = fs::read_dir(dir)?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|e| e.to_str())
                    .map(|e| e.eq_ignore_ascii_case("wav"))
                    .unwrap_or(false)
        })
        .collect();
    wavs.sort();

    if wavs.len() > 1 {
        warn!(dir = ?dir, count = wavs.len(), "Multiple wavs in channel folder, using the first");
    }
    Ok(wavs.into_iter().next())
}

/// Finds and reads the embedded record chunk out of a channel's WAV file.
pub(crate) fn read_record(path: &Path) -> Result<Vec<u8>, ChunkError> {
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let mut riff = [0u8; 12];
    reader.read_exact(&mut riff)?;
    if &riff[..4] != b"RIFF" || &riff[8..12] != b"WAVE" {
        return Err(ChunkError::NotRiff);
    }

    let length = chunk::locate(&mut reader, RECORD_TAG)? as usize;
    let mut bytes = vec![0u8; length];
    reader.read_exact(&mut bytes)?;
    Ok(bytes)
}

/// Defaults a channel from file-derived facts only: one cue set spanning the
/// sample (offsets are stored in bytes for 16-bit mono data, so samples x 2)
/// and channel-index-derived source, choke and record-destination values.
fn apply_bare_defaults(channel: &mut ChannelMetadata, index: usize, decoded: &DecodedSample) {
    let end = decoded.length_in_samples() * 2;
    channel.replace_cue_sets(vec![CueSet::clamped(1, 0, 0, end)], 0);
    channel.set_channel_source(index as u8);
    channel.set_choke_group(index as u8);
    channel.set_record_destination(index as u8);
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use super::*;
    use crate::testutil::{rich_channel, write_mono_wav};

    struct StageRecorder(Vec<String>);

    impl LoadObserver for StageRecorder {
        fn load_begin(&mut self, _bank_dir: &Path) {
            self.0.push("load_begin".to_string());
        }
        fn channel_load_begin(&mut self, channel: usize) {
            self.0.push(format!("begin {}", channel));
        }
        fn channel_load_complete(&mut self, channel: usize) {
            self.0.push(format!("complete {}", channel));
        }
        fn load_complete(&mut self, _bank: &BankMetadata) {
            self.0.push("load_complete".to_string());
        }
    }

    fn channel_wav(bank: &Path, number: usize, name: &str, samples: usize) -> PathBuf {
        let subdir = bank.join(number.to_string());
        fs::create_dir_all(&subdir).unwrap();
        let path = subdir.join(name);
        write_mono_wav(&path, &vec![1000i16; samples], 44_100);
        path
    }

    #[test]
    fn test_bare_sample_defaults_from_decoded_length() {
        let _ = tracing_subscriber::fmt::try_init();
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(BANK_NAME_FILE), "MyBank\nsecond line\n").unwrap();
        channel_wav(dir.path(), 3, "pad.wav", 88_200);

        let cache = SampleCache::new();
        let outcome = load_bank(dir.path(), &cache, &mut ());
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.bank.name(), "MyBank");

        let channel = outcome.bank.channel(2);
        assert_eq!(channel.num_cue_sets(), 1);
        assert_eq!(channel.end_point(), 176_400);
        assert_eq!(channel.channel_source(), 2);
        assert!(channel.file_name().unwrap().ends_with("pad.wav"));

        // Channels without a sample stay empty defaults.
        assert!(outcome.bank.channel(0).file_name().is_none());
    }

    #[test]
    fn test_bank_name_is_truncated() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(BANK_NAME_FILE), "A bank name that rambles\n").unwrap();

        let cache = SampleCache::new();
        let outcome = load_bank(dir.path(), &cache, &mut ());
        assert_eq!(outcome.bank.name(), "A bank name");
    }

    #[test]
    fn test_legacy_file_is_migrated_into_subfolder() {
        let dir = tempfile::tempdir().unwrap();
        let legacy = dir.path().join("chan-001.wav");
        write_mono_wav(&legacy, &vec![0i16; 64], 44_100);

        let cache = SampleCache::new();
        let outcome = load_bank(dir.path(), &cache, &mut ());
        assert!(outcome.errors.is_empty());

        let migrated = dir.path().join("1").join("chan-001.wav");
        assert!(migrated.is_file());
        // The flat original is copied, not moved.
        assert!(legacy.is_file());
        assert_eq!(
            outcome.bank.channel(0).file_name(),
            Some(migrated.to_string_lossy().as_ref())
        );
    }

    #[test]
    fn test_embedded_record_wins_over_bare_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = channel_wav(dir.path(), 5, "keys.wav", 500);

        let mut source = rich_channel(0);
        source.set_attack(321);
        chunk::replace_chunk(&path, RECORD_TAG, &record::encode(&source)).unwrap();

        let cache = SampleCache::new();
        let outcome = load_bank(dir.path(), &cache, &mut ());
        assert!(outcome.errors.is_empty());

        let channel = outcome.bank.channel(4);
        assert_eq!(channel.attack(), 321);
        assert_eq!(channel.index(), 4);
        // Cue sets come from the record, not the file length.
        assert_eq!(channel.num_cue_sets(), source.num_cue_sets());
    }

    #[test]
    fn test_bad_signature_falls_back_to_bare_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = channel_wav(dir.path(), 2, "noise.wav", 300);

        let mut bytes = record::encode(&ChannelMetadata::new(0));
        bytes[1] = b'!';
        bytes[2] = b'!';
        chunk::replace_chunk(&path, RECORD_TAG, &bytes).unwrap();

        let cache = SampleCache::new();
        let outcome = load_bank(dir.path(), &cache, &mut ());
        assert!(outcome.errors.is_empty());
        assert_eq!(outcome.bank.channel(1).end_point(), 600);
    }

    #[test]
    fn test_reload_releases_cache_references() {
        let dir = tempfile::tempdir().unwrap();
        let path = channel_wav(dir.path(), 1, "one.wav", 64);

        let cache = SampleCache::new();
        let first = load_bank(dir.path(), &cache, &mut ());
        let second = load_bank(dir.path(), &cache, &mut ());
        assert!(first.errors.is_empty());
        assert!(second.errors.is_empty());

        // Loading takes no lasting references, so nothing stays resident.
        assert_eq!(cache.use_count(&path), None);
        assert_eq!(cache.resident_count(), 0);
    }

    #[test]
    fn test_wrong_format_sample_is_reported_and_left_empty() {
        let dir = tempfile::tempdir().unwrap();
        let subdir = dir.path().join("2");
        fs::create_dir_all(&subdir).unwrap();
        let path = subdir.join("stereo.wav");
        let spec = hound::WavSpec {
            channels: 2,
            sample_rate: 44_100,
            bits_per_sample: 16,
            sample_format: hound::SampleFormat::Int,
        };
        let mut writer = hound::WavWriter::create(&path, spec).unwrap();
        for _ in 0..32 {
            writer.write_sample(0i16).unwrap();
            writer.write_sample(0i16).unwrap();
        }
        writer.finalize().unwrap();

        let cache = SampleCache::new();
        let outcome = load_bank(dir.path(), &cache, &mut ());

        assert_eq!(outcome.errors.len(), 1);
        assert_eq!(outcome.errors[0].0, 1);
        assert!(matches!(
            outcome.errors[0].1,
            LoadError::UnsupportedAudioFormat(_)
        ));

        // The rejected file never attaches to the channel.
        let channel = outcome.bank.channel(1);
        assert!(channel.file_name().is_none());
        assert_eq!(channel.end_point(), 0);
    }

    #[test]
    fn test_observer_sees_the_full_state_sequence() {
        let dir = tempfile::tempdir().unwrap();
        let mut recorder = StageRecorder(Vec::new());
        let cache = SampleCache::new();
        load_bank(dir.path(), &cache, &mut recorder);

        assert_eq!(recorder.0.first().map(String::as_str), Some("load_begin"));
        assert_eq!(
            recorder.0.last().map(String::as_str),
            Some("load_complete")
        );
        assert_eq!(recorder.0.len(), 2 + 2 * NUM_CHANNELS);
        assert_eq!(recorder.0[1], "begin 0");
        assert_eq!(recorder.0[2], "complete 0");
    }

    #[test]
    fn test_unedited_twin_matches_loaded_bank() {
        let dir = tempfile::tempdir().unwrap();
        channel_wav(dir.path(), 1, "one.wav", 100);

        let cache = SampleCache::new();
        let outcome = load_bank(dir.path(), &cache, &mut ());
        assert!(crate::compare::entire_banks_equal(
            &outcome.bank,
            &outcome.unedited
        ));
    }
}
