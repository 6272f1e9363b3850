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

//! Minimal RIFF chunk walking: just enough to find one named chunk inside a
//! WAV container, read the marker list, and splice a replacement chunk back
//! in. This is not a general container parser.

use std::fs;
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use tempfile::NamedTempFile;
use tracing::debug;

/// Size of a standard cue-point record inside a `cue ` chunk.
const CUE_POINT_SIZE: usize = 24;

/// Errors from walking the chunks of a RIFF container.
#[derive(Debug, thiserror::Error)]
pub enum ChunkError {
    /// The requested tag is absent. For the record chunk this signals
    /// "no embedded record", not corruption.
    #[error("chunk '{0}' not found")]
    NotFound(String),

    #[error("not a RIFF/WAVE container")]
    NotRiff,

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Scans chunk headers from the reader's current position until `tag` is
/// found, returning the chunk length with the reader positioned at the chunk
/// body. Unmatched chunks are skipped, with odd lengths rounded up to the
/// next even byte per the RIFF padding rule.
pub fn locate<R: Read + Seek>(reader: &mut R, tag: [u8; 4]) -> Result<u32, ChunkError> {
    loop {
        let mut header = [0u8; 8];
        if let Err(e) = reader.read_exact(&mut header) {
            if e.kind() == std::io::ErrorKind::UnexpectedEof {
                return Err(ChunkError::NotFound(
                    String::from_utf8_lossy(&tag).into_owned(),
                ));
            }
            return Err(ChunkError::Io(e));
        }

        let length = u32::from_le_bytes([header[4], header[5], header[6], header[7]]);
        if header[..4] == tag {
            return Ok(length);
        }

        debug!(
            tag = %String::from_utf8_lossy(&header[..4]),
            length,
            "Skipping chunk"
        );
        let skip = u64::from(length) + u64::from(length & 1);
        reader.seek(SeekFrom::Current(skip as i64))?;
    }
}

/// Reads the sample offsets out of a container's `cue ` chunk. The reader
/// must be positioned at the start of the file; the RIFF/WAVE header pair is
/// validated before the chunk walk.
pub fn read_marker_list<R: Read + Seek>(reader: &mut R) -> Result<Vec<u32>, ChunkError> {
    let mut riff = [0u8; 12];
    reader.read_exact(&mut riff)?;
    if &riff[..4] != b"RIFF" || &riff[8..12] != b"WAVE" {
        return Err(ChunkError::NotRiff);
    }

    let length = locate(reader, *b"cue ")? as usize;
    let mut body = vec![0u8; length];
    reader.read_exact(&mut body)?;
    if body.len() < 4 {
        return Ok(Vec::new());
    }

    let count = u32::from_le_bytes([body[0], body[1], body[2], body[3]]) as usize;
    let mut offsets = Vec::with_capacity(count);
    for i in 0..count {
        let base = 4 + i * CUE_POINT_SIZE;
        if base + CUE_POINT_SIZE > body.len() {
            break;
        }
        // Only the per-marker sample offset (the final field of the record)
        // is retained.
        offsets.push(u32::from_le_bytes([
            body[base + 20],
            body[base + 21],
            body[base + 22],
            body[base + 23],
        ]));
    }
    Ok(offsets)
}

/// Replaces the named chunk's payload inside the container at `path`, or
/// appends the chunk after the existing ones when absent. The RIFF size field
/// is corrected and the result is written to a uniquely named temporary file
/// in the same directory, then renamed over the original so a crash leaves
/// either the old or the new file intact, never a partial one.
pub fn replace_chunk(path: &Path, tag: [u8; 4], payload: &[u8]) -> Result<(), ChunkError> {
    let original = fs::read(path)?;
    if original.len() < 12 || &original[..4] != b"RIFF" || &original[8..12] != b"WAVE" {
        return Err(ChunkError::NotRiff);
    }

    let mut out = Vec::with_capacity(original.len() + payload.len() + 8);
    out.extend_from_slice(&original[..12]);

    let mut pos = 12usize;
    let mut replaced = false;
    while pos + 8 <= original.len() {
        let length = u32::from_le_bytes([
            original[pos + 4],
            original[pos + 5],
            original[pos + 6],
            original[pos + 7],
        ]) as usize;
        let body_end = (pos + 8 + length).min(original.len());

        if original[pos..pos + 4] == tag {
            append_chunk(&mut out, tag, payload);
            replaced = true;
        } else {
            out.extend_from_slice(&original[pos..body_end]);
            if length & 1 == 1 && body_end == pos + 8 + length {
                out.push(0);
            }
        }

        pos += 8 + length + (length & 1);
    }

    if !replaced {
        append_chunk(&mut out, tag, payload);
    }

    let riff_length = (out.len() - 8) as u32;
    out[4..8].copy_from_slice(&riff_length.to_le_bytes());

    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(&out)?;
    tmp.persist(path).map_err(|e| ChunkError::Io(e.error))?;
    Ok(())
}

fn append_chunk(out: &mut Vec<u8>, tag: [u8; 4], payload: &[u8]) {
    out.extend_from_slice(&tag);
    out.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    out.extend_from_slice(payload);
    if payload.len() & 1 == 1 {
        out.push(0);
    }
}

#[cfg(test)]
mod tests {
    use std::io::Cursor;

    use super::*;

    fn container(chunks: &[([u8; 4], &[u8])]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"RIFF\0\0\0\0WAVE");
        for (tag, payload) in chunks {
            append_chunk(&mut data, *tag, payload);
        }
        let riff_length = (data.len() - 8) as u32;
        data[4..8].copy_from_slice(&riff_length.to_le_bytes());
        data
    }

    #[test]
    fn test_locate_skips_odd_length_chunk_padding() {
        // Chunk A has an odd length of 5, so a pad byte sits between its
        // body and chunk B's header.
        let data = container(&[(*b"AAAA", &[1, 2, 3, 4, 5]), (*b"BBBB", &[9, 9])]);
        let mut reader = Cursor::new(&data[12..]);

        let length = locate(&mut reader, *b"BBBB").unwrap();
        assert_eq!(length, 2);

        let mut body = [0u8; 2];
        reader.read_exact(&mut body).unwrap();
        assert_eq!(body, [9, 9]);
    }

    #[test]
    fn test_locate_not_found_at_end_of_stream() {
        let data = container(&[(*b"AAAA", &[0; 4])]);
        let mut reader = Cursor::new(&data[12..]);

        let result = locate(&mut reader, *b"ZZZZ");
        assert!(matches!(result, Err(ChunkError::NotFound(_))));
    }

    #[test]
    fn test_read_marker_list() {
        let mut cue_body = Vec::new();
        cue_body.extend_from_slice(&2u32.to_le_bytes());
        for (name, offset) in [(0u32, 4410u32), (1, 88200)] {
            cue_body.extend_from_slice(&name.to_le_bytes());
            cue_body.extend_from_slice(&offset.to_le_bytes()); // dwPosition
            cue_body.extend_from_slice(b"data");
            cue_body.extend_from_slice(&0u32.to_le_bytes());
            cue_body.extend_from_slice(&0u32.to_le_bytes());
            cue_body.extend_from_slice(&offset.to_le_bytes()); // dwSampleOffset
        }
        let data = container(&[(*b"fmt ", &[0; 16]), (*b"cue ", &cue_body)]);

        let offsets = read_marker_list(&mut Cursor::new(data)).unwrap();
        assert_eq!(offsets, vec![4410, 88200]);
    }

    #[test]
    fn test_read_marker_list_rejects_non_riff() {
        let result = read_marker_list(&mut Cursor::new(vec![0u8; 32]));
        assert!(matches!(result, Err(ChunkError::NotRiff)));
    }

    #[test]
    fn test_replace_chunk_appends_when_absent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.wav");
        fs::write(&path, container(&[(*b"data", &[0; 8])])).unwrap();

        replace_chunk(&path, *b"busy", &[7; 6]).unwrap();

        let data = fs::read(&path).unwrap();
        assert_eq!(&data[..4], b"RIFF");
        let riff_length = u32::from_le_bytes([data[4], data[5], data[6], data[7]]);
        assert_eq!(riff_length as usize, data.len() - 8);

        let mut reader = Cursor::new(&data[12..]);
        let length = locate(&mut reader, *b"busy").unwrap();
        assert_eq!(length, 6);
    }

    #[test]
    fn test_replace_chunk_leaves_sibling_files_alone() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.wav");
        fs::write(&path, container(&[(*b"data", &[0; 8])])).unwrap();

        // A user file sharing the stem must never be clobbered by the
        // replacement's scratch file.
        let sibling = dir.path().join("sample.tmp");
        fs::write(&sibling, b"not ours").unwrap();

        replace_chunk(&path, *b"busy", &[7; 6]).unwrap();

        assert_eq!(fs::read(&sibling).unwrap(), b"not ours");
        let data = fs::read(&path).unwrap();
        let mut reader = Cursor::new(&data[12..]);
        assert_eq!(locate(&mut reader, *b"busy").unwrap(), 6);
    }

    #[test]
    fn test_replace_chunk_overwrites_in_place() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("sample.wav");
        fs::write(
            &path,
            container(&[(*b"busy", &[1; 4]), (*b"data", &[0; 8])]),
        )
        .unwrap();

        replace_chunk(&path, *b"busy", &[2; 10]).unwrap();

        let data = fs::read(&path).unwrap();
        let mut reader = Cursor::new(&data[12..]);
        let length = locate(&mut reader, *b"busy").unwrap();
        assert_eq!(length, 10);
        let mut body = vec![0u8; 10];
        reader.read_exact(&mut body).unwrap();
        assert_eq!(body, vec![2; 10]);

        // The data chunk survived the splice.
        let mut reader = Cursor::new(&data[12..]);
        assert_eq!(locate(&mut reader, *b"data").unwrap(), 8);
    }
}
