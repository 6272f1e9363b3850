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

//! Reference-counted pool of decoded audio buffers, keyed by file name and
//! shared across channels that reference the same file. Decoding happens
//! lazily on first open; entries are evicted when their use count reaches
//! zero and re-decoded on explicit invalidation.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info, warn};

/// Sample rate accepted for channel samples.
const SUPPORTED_SAMPLE_RATE: u32 = 44_100;

/// Outcome of decoding a sample file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SampleStatus {
    /// Decoded successfully.
    Exists,
    /// The file exists but is not a supported channel sample.
    WrongFormat,
    /// The file is missing.
    DoesNotExist,
}

/// One decoded audio file. Immutable after decode; shared (never owned) by
/// every channel currently referencing the file name.
#[derive(Debug)]
pub struct DecodedSample {
    status: SampleStatus,
    bits_per_sample: u16,
    sample_rate: u32,
    num_channels: u16,
    length_in_samples: u32,
    audio: Vec<f32>,
}

impl DecodedSample {
    pub fn status(&self) -> SampleStatus {
        self.status
    }

    pub fn bits_per_sample(&self) -> u16 {
        self.bits_per_sample
    }

    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    pub fn num_channels(&self) -> u16 {
        self.num_channels
    }

    /// Length in samples (frames; channel samples are mono).
    pub fn length_in_samples(&self) -> u32 {
        self.length_in_samples
    }

    /// The decoded audio, scaled to [-1.0, 1.0].
    pub fn audio(&self) -> &[f32] {
        &self.audio
    }

    fn missing() -> DecodedSample {
        DecodedSample {
            status: SampleStatus::DoesNotExist,
            bits_per_sample: 0,
            sample_rate: 0,
            num_channels: 0,
            length_in_samples: 0,
            audio: Vec::new(),
        }
    }

    fn wrong_format(spec: Option<hound::WavSpec>) -> DecodedSample {
        DecodedSample {
            status: SampleStatus::WrongFormat,
            bits_per_sample: spec.map(|s| s.bits_per_sample).unwrap_or_default(),
            sample_rate: spec.map(|s| s.sample_rate).unwrap_or_default(),
            num_channels: spec.map(|s| s.channels).unwrap_or_default(),
            length_in_samples: 0,
            audio: Vec::new(),
        }
    }
}

struct Entry {
    use_count: usize,
    sample: Arc<DecodedSample>,
}

/// The decoded-sample pool. The table mutex guards only insert, increment,
/// decrement and eviction; decode I/O always happens outside it.
#[derive(Default)]
pub struct SampleCache {
    entries: Mutex<HashMap<String, Entry>>,
}

impl SampleCache {
    pub fn new() -> SampleCache {
        SampleCache::default()
    }

    /// Opens a sample: increments the use count if the file is already
    /// resident, otherwise decodes it synchronously and caches the result
    /// with a use count of one. Decode failures are cached too, with the
    /// failure recorded in the sample's status.
    pub fn open(&self, path: &Path) -> Arc<DecodedSample> {
        let key = cache_key(path);

        {
            let mut entries = self.entries.lock();
            if let Some(entry) = entries.get_mut(&key) {
                entry.use_count += 1;
                debug!(file = %key, use_count = entry.use_count, "Sample already resident");
                return entry.sample.clone();
            }
        }

        // Not resident: decode outside the lock, then insert. A racing open
        // may have beaten us to the insert, in which case its decode wins.
        let decoded = Arc::new(decode_file(path));
        info!(file = %key, status = ?decoded.status(), "Decoded sample");

        let mut entries = self.entries.lock();
        let entry = entries.entry(key).or_insert_with(|| Entry {
            use_count: 0,
            sample: decoded,
        });
        entry.use_count += 1;
        entry.sample.clone()
    }

    /// Closes a sample: decrements the use count and evicts the decoded
    /// buffer when it reaches zero.
    pub fn close(&self, path: &Path) {
        let key = cache_key(path);
        let mut entries = self.entries.lock();
        match entries.get_mut(&key) {
            Some(entry) => {
                entry.use_count -= 1;
                if entry.use_count == 0 {
                    debug!(file = %key, "Evicting sample");
                    entries.remove(&key);
                }
            }
            None => warn!(file = %key, "Close without matching open"),
        }
    }

    /// Looks up a resident sample without touching its use count.
    pub fn resident(&self, path: &Path) -> Option<Arc<DecodedSample>> {
        let entries = self.entries.lock();
        entries.get(&cache_key(path)).map(|e| e.sample.clone())
    }

    /// Re-decodes every resident entry in place, used after an external
    /// file-system change. Use counts are preserved. Returns the republished
    /// entries so callers can refresh per-channel cached attributes.
    pub fn update(&self) -> Vec<(String, Arc<DecodedSample>)> {
        let keys: Vec<String> = self.entries.lock().keys().cloned().collect();
        let mut republished = Vec::with_capacity(keys.len());
        for key in keys {
            let decoded = Arc::new(decode_file(Path::new(&key)));
            let mut entries = self.entries.lock();
            if let Some(entry) = entries.get_mut(&key) {
                entry.sample = decoded.clone();
                republished.push((key, decoded));
            }
        }
        republished
    }

    /// Number of resident entries.
    pub fn resident_count(&self) -> usize {
        self.entries.lock().len()
    }

    /// The use count of a resident entry, if any.
    pub fn use_count(&self, path: &Path) -> Option<usize> {
        self.entries.lock().get(&cache_key(path)).map(|e| e.use_count)
    }
}

impl std::fmt::Debug for SampleCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SampleCache")
            .field("resident", &self.resident_count())
            .finish()
    }
}

fn cache_key(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}

/// Whether the file is acceptable as a channel sample: a mono, 16- or
/// 24-bit integer, 44.1 kHz WAV. Anything else is rejected at this
/// boundary, never partially loaded.
pub fn is_supported_audio_file(path: &Path) -> bool {
    let is_wav = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.eq_ignore_ascii_case("wav"))
        .unwrap_or(false);
    if !is_wav {
        return false;
    }
    match hound::WavReader::open(path) {
        Ok(reader) => is_supported_spec(&reader.spec()),
        Err(_) => false,
    }
}

fn is_supported_spec(spec: &hound::WavSpec) -> bool {
    spec.channels == 1
        && spec.sample_format == hound::SampleFormat::Int
        && (spec.bits_per_sample == 16 || spec.bits_per_sample == 24)
        && spec.sample_rate == SUPPORTED_SAMPLE_RATE
}

fn decode_file(path: &Path) -> DecodedSample {
    let mut reader = match hound::WavReader::open(path) {
        Ok(reader) => reader,
        Err(hound::Error::IoError(e)) if e.kind() == std::io::ErrorKind::NotFound => {
            warn!(file = ?path, "Sample file does not exist");
            return DecodedSample::missing();
        }
        Err(e) => {
            warn!(file = ?path, error = %e, "Sample file is not readable as WAV");
            return DecodedSample::wrong_format(None);
        }
    };

    let spec = reader.spec();
    if !is_supported_spec(&spec) {
        warn!(
            file = ?path,
            channels = spec.channels,
            bits = spec.bits_per_sample,
            rate = spec.sample_rate,
            "Unsupported sample format"
        );
        return DecodedSample::wrong_format(Some(spec));
    }

    let scale = 1.0 / (1i64 << (spec.bits_per_sample - 1)) as f32;
    let mut audio = Vec::with_capacity(reader.duration() as usize);
    for sample in reader.samples::<i32>() {
        match sample {
            Ok(sample) => audio.push(sample as f32 * scale),
            Err(e) => {
                warn!(file = ?path, error = %e, "Sample data ends early");
                break;
            }
        }
    }

    DecodedSample {
        status: SampleStatus::Exists,
        bits_per_sample: spec.bits_per_sample,
        sample_rate: spec.sample_rate,
        num_channels: spec.channels,
        length_in_samples: audio.len() as u32,
        audio,
    }
}
