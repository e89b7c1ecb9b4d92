//! Head reader: owns the segment currently open for sequential removal.
//!
//! Reads entries in written order from its own read-only handle, so the
//! single-file case (head == tail) never shares a file description with
//! the writer. Advancing past a drained segment deletes its file; that is
//! the only place the queue ever reclaims disk space.

use std::fs::File;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Result;
use crate::frame;
use crate::segment::segment_path;

pub(crate) struct HeadReader {
    dir: PathBuf,
    seq: u64,
    file: File,
    /// Byte offset of the next unread frame, tracked for error reporting.
    offset: u64,
}

impl HeadReader {
    pub(crate) fn open(dir: &Path, seq: u64) -> Result<Self> {
        let file = File::open(segment_path(dir, seq))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            seq,
            file,
            offset: 0,
        })
    }

    /// Read the next framed entry. The caller guarantees (via the shared
    /// counters) that one exists in this segment.
    pub(crate) fn next_entry(&mut self) -> Result<Vec<u8>> {
        let payload = frame::read_entry(&mut self.file, self.seq, self.offset)?;
        self.offset += frame::FRAME_HEADER_LEN + payload.len() as u64;
        Ok(payload)
    }

    /// Delete the drained head segment and open the next one.
    ///
    /// The reader's position only changes after every fallible step has
    /// succeeded, so a failed advance leaves it where it was and the call
    /// can simply be retried.
    pub(crate) fn advance_to(&mut self, next_seq: u64) -> Result<()> {
        let next = HeadReader::open(&self.dir, next_seq)?;
        let drained = segment_path(&self.dir, self.seq);
        std::fs::remove_file(&drained)?;
        debug!(
            "segment {} drained, deleted {} and advanced to {next_seq}",
            self.seq,
            drained.display()
        );
        *self = next;
        Ok(())
    }
}
