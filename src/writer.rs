//! Tail writer: owns the segment currently open for append.
//!
//! The writer only performs file I/O; entry counting and the decision to
//! roll live with the queue's shared state so they stay coordinated with
//! the reader.

use std::fs::OpenOptions;
use std::path::{Path, PathBuf};

use log::debug;

use crate::error::Result;
use crate::frame;
use crate::segment::segment_path;

pub(crate) struct TailWriter {
    dir: PathBuf,
    seq: u64,
    file: std::fs::File,
}

impl TailWriter {
    /// Create a fresh tail segment. The sequence number must be unused;
    /// an existing file of the same name is an error, not something to
    /// overwrite.
    pub(crate) fn create(dir: &Path, seq: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .create_new(true)
            .append(true)
            .open(segment_path(dir, seq))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            seq,
            file,
        })
    }

    /// Reopen a recovered tail segment for further appends.
    pub(crate) fn open_existing(dir: &Path, seq: u64) -> Result<Self> {
        let file = OpenOptions::new()
            .append(true)
            .open(segment_path(dir, seq))?;
        Ok(Self {
            dir: dir.to_path_buf(),
            seq,
            file,
        })
    }

    /// Append one framed entry. The frame reaches the file in a single
    /// write with no userspace buffering, so the entry is visible to the
    /// read path as soon as this returns.
    pub(crate) fn append(&mut self, payload: &[u8]) -> Result<()> {
        use std::io::Write;

        let buf = frame::encode_frame(payload)?;
        self.file.write_all(&buf)?;
        Ok(())
    }

    /// Close the current tail and start a new segment at the next sequence
    /// number. Never deletes the outgoing file; draining it is the reader's
    /// business.
    pub(crate) fn roll(&mut self) -> Result<u64> {
        let next = TailWriter::create(&self.dir, self.seq + 1)?;
        debug!("rolled tail segment {} -> {}", self.seq, next.seq);
        *self = next;
        Ok(self.seq)
    }

    /// Force the tail's contents to stable storage.
    pub(crate) fn sync(&self) -> Result<()> {
        self.file.sync_all()?;
        Ok(())
    }
}
