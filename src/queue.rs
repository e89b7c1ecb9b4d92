//! The queue façade combining tail writer and head reader over one
//! segment chain.
//!
//! # Concurrency
//!
//! Built for single-producer/single-consumer use. Append and removal each
//! serialize behind their own handle lock and only meet on the shared
//! counter state, which is held for counter updates and lifecycle
//! decisions, never across file I/O. Lock order is handle lock first, then
//! chain state; `is_empty`/`len` touch nothing but an atomic counter.

use std::collections::VecDeque;
use std::marker::PhantomData;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};

use log::debug;
use parking_lot::Mutex;

use crate::codec::Codec;
use crate::error::{Error, Result};
use crate::lock::DirLock;
use crate::reader::HeadReader;
use crate::segment::{discover_segments, recover_segment, segment_path, SegmentState};
use crate::writer::TailWriter;

const CHAIN_NONEMPTY: &str = "segment chain is never empty";

/// A durable FIFO collection of work items spilled to disk across a
/// rolling chain of flat-file segments.
///
/// Items are appended to the tail segment and removed from the head
/// segment in strict insertion order. Once the tail holds `roll_size`
/// entries the next `add` starts a new segment; once every entry of a
/// non-tail head segment has been removed its file is deleted. Unread
/// entries survive `close` and are re-delivered when the directory is
/// reopened.
///
/// The collection takes exclusive ownership of its directory for the
/// lifetime of the value; a second `open` on the same directory fails
/// with [`Error::Locked`].
pub struct FlatFileTaskCollection<T, C: Codec<T>> {
    dir: PathBuf,
    codec: C,
    roll_size: u64,
    /// Aggregate unread count across the whole chain.
    unread: AtomicU64,
    /// Shared bookkeeping: per-segment written/consumed counts, head at
    /// the front, tail at the back. Never empty.
    chain: Mutex<VecDeque<SegmentState>>,
    /// Tail append handle; `None` once closed.
    writer: Mutex<Option<TailWriter>>,
    /// Head read handle; `None` once closed.
    reader: Mutex<Option<HeadReader>>,
    _lock: DirLock,
    _marker: PhantomData<fn() -> T>,
}

impl<T, C: Codec<T>> FlatFileTaskCollection<T, C> {
    /// Open a queue over `dir`, creating the directory if its final
    /// component is missing.
    ///
    /// A directory holding segments from an earlier run is resumed: files
    /// are ordered by sequence number, written counts are rebuilt by
    /// scanning their frames, the lowest-numbered becomes the head and the
    /// highest-numbered is reopened for append. Consumed counts are not
    /// persisted, so entries never drained from disk are delivered again.
    ///
    /// # Errors
    ///
    /// - [`Error::Config`] for a zero roll size, a path that exists but is
    ///   not a directory, or an ambiguous segment chain.
    /// - [`Error::Locked`] if another live collection owns the directory.
    /// - [`Error::Corrupt`] if a sealed segment fails the recovery scan.
    pub fn open(dir: impl AsRef<Path>, codec: C, roll_size: u64) -> Result<Self> {
        let dir = dir.as_ref();
        if roll_size == 0 {
            return Err(Error::Config("roll size must be positive"));
        }
        if !dir.exists() {
            std::fs::create_dir(dir)?;
        } else if !dir.is_dir() {
            return Err(Error::Config("queue path is not a directory"));
        }
        let lock = DirLock::acquire(dir)?;

        let found = discover_segments(dir)?;
        let mut chain = VecDeque::new();
        let mut unread = 0u64;
        let (writer, reader) = match found.split_last() {
            None => {
                let writer = TailWriter::create(dir, 0)?;
                let reader = HeadReader::open(dir, 0)?;
                chain.push_back(SegmentState::new(0));
                (writer, reader)
            }
            Some((&tail_seq, _)) => {
                for &seq in &found {
                    let written = recover_segment(dir, seq, seq == tail_seq)?;
                    unread += written;
                    chain.push_back(SegmentState {
                        seq,
                        written,
                        consumed: 0,
                    });
                }
                debug!(
                    "recovered {} segments with {} unread entries from {}",
                    found.len(),
                    unread,
                    dir.display()
                );
                let writer = TailWriter::open_existing(dir, tail_seq)?;
                let head_seq = chain.front().expect(CHAIN_NONEMPTY).seq;
                let reader = HeadReader::open(dir, head_seq)?;
                (writer, reader)
            }
        };

        Ok(Self {
            dir: dir.to_path_buf(),
            codec,
            roll_size,
            unread: AtomicU64::new(unread),
            chain: Mutex::new(chain),
            writer: Mutex::new(Some(writer)),
            reader: Mutex::new(Some(reader)),
            _lock: lock,
            _marker: PhantomData,
        })
    }

    /// Append an item to the tail of the queue.
    ///
    /// Rolls to a new segment first if the tail already holds `roll_size`
    /// entries. The encoded frame reaches the file before this returns;
    /// use [`sync`](Self::sync) when a checkpoint needs it on stable
    /// storage as well. Never deletes a file.
    pub fn add(&self, item: &T) -> Result<()> {
        let encoded = self.codec.encode(item)?;

        let mut writer_slot = self.writer.lock();
        let writer = writer_slot.as_mut().ok_or(Error::Closed)?;

        let must_roll = {
            let chain = self.chain.lock();
            chain.back().expect(CHAIN_NONEMPTY).written >= self.roll_size
        };
        if must_roll {
            let next = writer.roll()?;
            self.chain.lock().push_back(SegmentState::new(next));
        }

        writer.append(&encoded)?;
        self.chain
            .lock()
            .back_mut()
            .expect(CHAIN_NONEMPTY)
            .written += 1;
        self.unread.fetch_add(1, Ordering::Release);
        Ok(())
    }

    /// Remove and return the oldest item in the queue.
    ///
    /// When this removal drains a non-tail head segment, the segment's
    /// file is deleted and the head advances before returning. A drained
    /// segment that is still the tail stays in place to receive future
    /// appends.
    ///
    /// # Errors
    ///
    /// - [`Error::Empty`] if the queue holds no unread entries; callers
    ///   are expected to consult [`is_empty`](Self::is_empty).
    /// - [`Error::Corrupt`] if the entry's frame is damaged.
    /// - [`Error::Codec`] if the payload fails to decode; the entry is
    ///   still consumed so later removals stay in order.
    pub fn remove(&self) -> Result<T> {
        let payload = self.remove_encoded()?;
        self.codec.decode(&payload)
    }

    fn remove_encoded(&self) -> Result<Vec<u8>> {
        let mut reader_slot = self.reader.lock();
        let reader = reader_slot.as_mut().ok_or(Error::Closed)?;

        if self.unread.load(Ordering::Acquire) == 0 {
            return Err(Error::Empty);
        }

        // A drained head can linger: recovered chains may hold empty
        // segments, and a drained tail only becomes deletable once a
        // later roll strips its tail status. Step past them first. The
        // chain entry is popped only after the advance succeeded, so a
        // failed advance leaves everything consistent for a retry.
        loop {
            let next_seq = {
                let chain = self.chain.lock();
                let head_drained = chain.front().expect(CHAIN_NONEMPTY).is_drained();
                if head_drained {
                    chain.get(1).map(|next| next.seq)
                } else {
                    None
                }
            };
            match next_seq {
                Some(seq) => {
                    reader.advance_to(seq)?;
                    self.chain.lock().pop_front();
                }
                None => break,
            }
        }

        let payload = reader.next_entry()?;

        let next_seq = {
            let mut chain = self.chain.lock();
            chain.front_mut().expect(CHAIN_NONEMPTY).consumed += 1;
            let head_drained = chain.front().expect(CHAIN_NONEMPTY).is_drained();
            if head_drained {
                chain.get(1).map(|next| next.seq)
            } else {
                None
            }
        };
        self.unread.fetch_sub(1, Ordering::Release);
        if let Some(seq) = next_seq {
            reader.advance_to(seq)?;
            self.chain.lock().pop_front();
        }
        Ok(payload)
    }

    /// Number of unread entries across all live segments.
    ///
    /// Pure counter read; performs no I/O and takes no lock.
    pub fn len(&self) -> u64 {
        self.unread.load(Ordering::Acquire)
    }

    /// Whether the queue holds no unread entries.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drop every entry and segment file and start a fresh tail at the
    /// next sequence number. The queue remains usable afterwards.
    pub fn clear(&self) -> Result<()> {
        let mut writer_slot = self.writer.lock();
        let mut reader_slot = self.reader.lock();
        let writer = writer_slot.as_mut().ok_or(Error::Closed)?;
        let reader = reader_slot.as_mut().ok_or(Error::Closed)?;

        let (old, next_seq) = {
            let chain = self.chain.lock();
            let old: Vec<u64> = chain.iter().map(|seg| seg.seq).collect();
            let next_seq = chain.back().expect(CHAIN_NONEMPTY).seq + 1;
            (old, next_seq)
        };

        // Swap both handles onto the fresh segment before deleting
        // anything, so no handle ever points at a removed file.
        *writer = TailWriter::create(&self.dir, next_seq)?;
        *reader = HeadReader::open(&self.dir, next_seq)?;
        {
            let mut chain = self.chain.lock();
            chain.clear();
            chain.push_back(SegmentState::new(next_seq));
        }
        self.unread.store(0, Ordering::Release);

        for seq in old {
            std::fs::remove_file(segment_path(&self.dir, seq))?;
        }
        Ok(())
    }

    /// Force the tail segment's contents to stable storage.
    pub fn sync(&self) -> Result<()> {
        let writer_slot = self.writer.lock();
        writer_slot.as_ref().ok_or(Error::Closed)?.sync()
    }

    /// Release the queue's file handles without deleting anything.
    ///
    /// The tail is fsynced first, so unread entries survive a controlled
    /// shutdown. Idempotent; later `add`/`remove`/`clear` calls fail with
    /// [`Error::Closed`]. The directory lock is released only when the
    /// value itself is dropped.
    pub fn close(&self) -> Result<()> {
        let mut writer_slot = self.writer.lock();
        let mut reader_slot = self.reader.lock();
        if let Some(writer) = writer_slot.take() {
            writer.sync()?;
        }
        reader_slot.take();
        Ok(())
    }
}
