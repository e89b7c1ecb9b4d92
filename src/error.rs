use std::path::PathBuf;

use thiserror::Error;

/// Errors surfaced by queue operations.
///
/// Every failure is returned through the calling operation; nothing is
/// downgraded to a log line.
#[derive(Debug, Error)]
pub enum Error {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid construction parameters. Fatal, detected before any file is
    /// touched.
    #[error("invalid configuration: {0}")]
    Config(&'static str),

    /// The queue directory is already owned by a live collection, in this
    /// process or another.
    #[error("queue directory already locked: {}", .0.display())]
    Locked(PathBuf),

    /// On-disk framing damage. Names the segment and byte offset so the
    /// caller can tell which file is bad.
    #[error("corrupt entry in segment {segment} at offset {offset}: {reason}")]
    Corrupt {
        segment: u64,
        offset: u64,
        reason: &'static str,
    },

    /// Encode or decode failure for a single entry. The entry's frame has
    /// already been accounted for, so the read cursor stays consistent.
    #[error("codec failure: {0}")]
    Codec(#[source] Box<dyn std::error::Error + Send + Sync>),

    /// A single encoded entry exceeded the maximum frame size.
    #[error("encoded entry of {0} bytes exceeds the maximum entry size")]
    EntryTooLarge(usize),

    /// `remove` was called on an empty queue. Check `is_empty` first.
    #[error("queue is empty")]
    Empty,

    /// Operation on a queue after `close`.
    #[error("queue is closed")]
    Closed,
}

pub type Result<T> = std::result::Result<T, Error>;
