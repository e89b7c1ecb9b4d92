//! Length-prefixed entry framing.
//!
//! Each entry is stored as an 8-byte frame header followed by the encoded
//! payload:
//!
//! ```text
//! [payload len: u32 LE][crc32(payload): u32 LE][payload bytes]
//! ```
//!
//! The length prefix lets the reader find entry boundaries without
//! delimiters; the checksum turns a damaged frame into a reported error
//! instead of a silently desynchronized cursor. Zero-length payloads are
//! framed identically (length 0, CRC of the empty slice, no body).

use std::fs::File;
use std::io::{Read, Seek, SeekFrom};

use crate::error::{Error, Result};

/// Bytes occupied by the frame header (length + checksum).
pub(crate) const FRAME_HEADER_LEN: u64 = 8;

/// Upper bound on a single encoded entry (256 MiB).
///
/// Also serves as a sanity bound during recovery: a length prefix above it
/// means the file is damaged, not that someone queued a quarter-terabyte
/// task.
pub(crate) const MAX_ENTRY_LEN: usize = 256 * 1024 * 1024;

pub(crate) fn checksum(payload: &[u8]) -> u32 {
    let mut hasher = crc32fast::Hasher::new();
    hasher.update(payload);
    hasher.finalize()
}

/// Frame a payload for appending: header and body in one buffer so the
/// write below it is a single syscall.
pub(crate) fn encode_frame(payload: &[u8]) -> Result<Vec<u8>> {
    if payload.len() > MAX_ENTRY_LEN {
        return Err(Error::EntryTooLarge(payload.len()));
    }
    let mut buf = Vec::with_capacity(FRAME_HEADER_LEN as usize + payload.len());
    buf.extend_from_slice(&(payload.len() as u32).to_le_bytes());
    buf.extend_from_slice(&checksum(payload).to_le_bytes());
    buf.extend_from_slice(payload);
    Ok(buf)
}

/// Read and verify one frame from `reader`.
///
/// `segment` and `offset` locate the frame for error reporting only; the
/// reader is expected to already be positioned at the frame start.
pub(crate) fn read_entry<R: Read>(reader: &mut R, segment: u64, offset: u64) -> Result<Vec<u8>> {
    let mut header = [0u8; FRAME_HEADER_LEN as usize];
    reader
        .read_exact(&mut header)
        .map_err(|err| map_read_err(err, segment, offset))?;

    let len = u32::from_le_bytes(header[0..4].try_into().expect("slice length")) as usize;
    let crc = u32::from_le_bytes(header[4..8].try_into().expect("slice length"));
    if len > MAX_ENTRY_LEN {
        return Err(Error::Corrupt {
            segment,
            offset,
            reason: "entry length out of range",
        });
    }

    let mut payload = vec![0u8; len];
    reader
        .read_exact(&mut payload)
        .map_err(|err| map_read_err(err, segment, offset))?;

    if checksum(&payload) != crc {
        return Err(Error::Corrupt {
            segment,
            offset,
            reason: "payload checksum mismatch",
        });
    }
    Ok(payload)
}

fn map_read_err(err: std::io::Error, segment: u64, offset: u64) -> Error {
    // The caller's counters said an entry exists here, so running out of
    // bytes is damage rather than a normal end-of-queue condition.
    if err.kind() == std::io::ErrorKind::UnexpectedEof {
        Error::Corrupt {
            segment,
            offset,
            reason: "entry truncated",
        }
    } else {
        Error::Io(err)
    }
}

/// Result of walking a segment's frames during recovery.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SegmentScan {
    /// Complete frames found.
    pub entries: u64,
    /// Byte length covered by complete frames.
    pub valid_len: u64,
    /// Whether trailing bytes after the last complete frame were found.
    pub truncated: bool,
}

/// Walk the frame chain of a segment file, counting complete entries.
///
/// Payloads are skipped over rather than read; checksums are verified
/// lazily when the entry is actually removed. An in-range chain that ends
/// mid-frame is reported via `truncated`, not as an error; a length prefix
/// beyond [`MAX_ENTRY_LEN`] is corruption.
pub(crate) fn scan_segment(file: &mut File, segment: u64) -> Result<SegmentScan> {
    let file_len = file.metadata()?.len();
    let mut offset = 0u64;
    let mut entries = 0u64;

    while offset < file_len {
        if offset + FRAME_HEADER_LEN > file_len {
            return Ok(SegmentScan {
                entries,
                valid_len: offset,
                truncated: true,
            });
        }
        file.seek(SeekFrom::Start(offset))?;
        let mut header = [0u8; FRAME_HEADER_LEN as usize];
        file.read_exact(&mut header)?;
        let len = u32::from_le_bytes(header[0..4].try_into().expect("slice length")) as u64;
        if len > MAX_ENTRY_LEN as u64 {
            return Err(Error::Corrupt {
                segment,
                offset,
                reason: "entry length out of range",
            });
        }
        if offset + FRAME_HEADER_LEN + len > file_len {
            return Ok(SegmentScan {
                entries,
                valid_len: offset,
                truncated: true,
            });
        }
        offset += FRAME_HEADER_LEN + len;
        entries += 1;
    }

    Ok(SegmentScan {
        entries,
        valid_len: offset,
        truncated: false,
    })
}
