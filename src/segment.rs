//! Segment file naming, discovery, and recovery.
//!
//! A segment is one flat file holding a contiguous ordered run of framed
//! entries, named `tasks-<seq>`. Sequence numbers strictly increase in
//! creation order and are never reused, so lexical directory contents can
//! always be reduced to a totally ordered chain.

use std::fs::{File, OpenOptions};
use std::path::{Path, PathBuf};

use log::warn;

use crate::error::{Error, Result};
use crate::frame;
use crate::lock::LOCK_FILE;

/// Filename prefix for segment files.
pub const FILENAME_PREFIX: &str = "tasks-";

/// Generate a segment filename from its sequence number (e.g. `tasks-42`).
pub fn segment_filename(seq: u64) -> String {
    format!("{FILENAME_PREFIX}{seq}")
}

/// Path of a segment file inside the queue directory.
pub fn segment_path(dir: &Path, seq: u64) -> PathBuf {
    dir.join(segment_filename(seq))
}

/// Parse a segment filename back to its sequence number.
///
/// Accepts any valid decimal rendering, zero-padded included; the writer
/// itself never pads. Returns `None` for names the queue does not manage.
pub fn parse_segment_filename(name: &str) -> Option<u64> {
    let digits = name.strip_prefix(FILENAME_PREFIX)?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    digits.parse::<u64>().ok()
}

/// Enumerate the segment files in a directory, sorted by sequence number.
///
/// Foreign files are ignored with a warning; the queue's own `LOCK` file is
/// expected and skipped silently. Two renderings of the same sequence
/// number (`tasks-7` next to `tasks-007`) make the chain ambiguous and are
/// rejected.
pub fn discover_segments(dir: &Path) -> Result<Vec<u64>> {
    let mut segments = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let entry = entry?;
        let name = entry.file_name();
        let name = match name.to_str() {
            Some(name) => name,
            None => {
                warn!("ignoring non-UTF-8 file in queue directory {}", dir.display());
                continue;
            }
        };
        if name == LOCK_FILE {
            continue;
        }
        match parse_segment_filename(name) {
            Some(seq) => segments.push(seq),
            None => warn!("ignoring foreign file in queue directory: {name}"),
        }
    }
    segments.sort_unstable();
    if segments.windows(2).any(|pair| pair[0] == pair[1]) {
        return Err(Error::Config(
            "queue directory contains duplicate segment sequence numbers",
        ));
    }
    Ok(segments)
}

/// Per-segment bookkeeping held by the queue.
#[derive(Debug)]
pub(crate) struct SegmentState {
    pub seq: u64,
    /// Entries appended to this segment.
    pub written: u64,
    /// Entries removed from this segment.
    pub consumed: u64,
}

impl SegmentState {
    pub(crate) fn new(seq: u64) -> Self {
        Self {
            seq,
            written: 0,
            consumed: 0,
        }
    }

    pub(crate) fn is_drained(&self) -> bool {
        self.consumed == self.written
    }
}

/// Rebuild a recovered segment's written count by walking its frames.
///
/// Only the tail may legally end mid-frame (a torn final append); the torn
/// bytes are truncated away so appends can resume at a clean boundary. The
/// same damage in any earlier segment is fatal: those files were complete
/// when the tail rolled past them.
pub(crate) fn recover_segment(dir: &Path, seq: u64, is_tail: bool) -> Result<u64> {
    let path = segment_path(dir, seq);
    let mut file = File::open(&path)?;
    let scan = frame::scan_segment(&mut file, seq)?;
    drop(file);

    if scan.truncated {
        if !is_tail {
            return Err(Error::Corrupt {
                segment: seq,
                offset: scan.valid_len,
                reason: "truncated entry in sealed segment",
            });
        }
        warn!(
            "discarding torn write at end of segment {seq}: truncating {} to {} bytes",
            path.display(),
            scan.valid_len
        );
        let file = OpenOptions::new().write(true).open(&path)?;
        file.set_len(scan.valid_len)?;
        file.sync_data()?;
    }
    Ok(scan.entries)
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use tempfile::tempdir;

    use super::*;

    #[test]
    fn filename_round_trip() {
        assert_eq!(segment_filename(0), "tasks-0");
        assert_eq!(segment_filename(42), "tasks-42");
        assert_eq!(parse_segment_filename("tasks-0"), Some(0));
        assert_eq!(parse_segment_filename("tasks-42"), Some(42));
    }

    #[test]
    fn parse_tolerates_any_integer_rendering() {
        assert_eq!(parse_segment_filename("tasks-007"), Some(7));
        assert_eq!(parse_segment_filename("tasks-000000000"), Some(0));
    }

    #[test]
    fn parse_rejects_foreign_names() {
        assert_eq!(parse_segment_filename("tasks-"), None);
        assert_eq!(parse_segment_filename("tasks-abc"), None);
        assert_eq!(parse_segment_filename("tasks-1x"), None);
        assert_eq!(parse_segment_filename("tasks-1 "), None);
        assert_eq!(parse_segment_filename("task-1"), None);
        assert_eq!(parse_segment_filename("LOCK"), None);
        assert_eq!(parse_segment_filename("tasks--1"), None);
    }

    #[test]
    fn discovery_sorts_and_ignores_foreign_files() {
        let dir = tempdir().expect("tempdir");
        for name in ["tasks-10", "tasks-2", "tasks-0", "notes.txt", "LOCK"] {
            File::create(dir.path().join(name)).expect("create");
        }
        let segments = discover_segments(dir.path()).expect("discover");
        assert_eq!(segments, vec![0, 2, 10]);
    }

    #[test]
    fn discovery_rejects_ambiguous_renderings() {
        let dir = tempdir().expect("tempdir");
        File::create(dir.path().join("tasks-7")).expect("create");
        File::create(dir.path().join("tasks-007")).expect("create");
        let err = discover_segments(dir.path()).expect_err("ambiguous");
        assert!(matches!(err, Error::Config(_)));
    }

    #[test]
    fn recover_counts_entries() {
        let dir = tempdir().expect("tempdir");
        let path = segment_path(dir.path(), 3);
        let mut file = File::create(&path).expect("create");
        for payload in [b"one".as_slice(), b"two", b"three"] {
            file.write_all(&frame::encode_frame(payload).expect("encode"))
                .expect("write");
        }
        drop(file);

        assert_eq!(recover_segment(dir.path(), 3, false).expect("recover"), 3);
    }

    #[test]
    fn recover_repairs_torn_tail() {
        let dir = tempdir().expect("tempdir");
        let path = segment_path(dir.path(), 0);
        let mut file = File::create(&path).expect("create");
        let whole = frame::encode_frame(b"whole").expect("encode");
        file.write_all(&whole).expect("write");
        let torn = frame::encode_frame(b"torn").expect("encode");
        file.write_all(&torn[..torn.len() - 2]).expect("write");
        drop(file);

        assert_eq!(recover_segment(dir.path(), 0, true).expect("recover"), 1);
        let len = std::fs::metadata(&path).expect("meta").len();
        assert_eq!(len, whole.len() as u64);
    }

    #[test]
    fn recover_rejects_torn_sealed_segment() {
        let dir = tempdir().expect("tempdir");
        let path = segment_path(dir.path(), 0);
        let mut file = File::create(&path).expect("create");
        let torn = frame::encode_frame(b"torn").expect("encode");
        file.write_all(&torn[..torn.len() - 2]).expect("write");
        drop(file);

        let err = recover_segment(dir.path(), 0, false).expect_err("sealed damage");
        assert!(matches!(
            err,
            Error::Corrupt {
                segment: 0,
                offset: 0,
                reason: "truncated entry in sealed segment",
            }
        ));
    }
}
