//! Disk-backed FIFO task queue over rolling flat-file segments.
//!
//! Long-running pipelines use this to decouple a producer that discovers
//! work faster than a consumer can process it: items spill to a chain of
//! flat files instead of accumulating in memory, survive a controlled
//! shutdown, and come back in exactly the order they went in. The chain
//! rolls to a new file every `roll_size` entries and deletes each file as
//! soon as it is fully drained, so space is reclaimed without ever
//! rewriting data.
//!
//! ```
//! use taskq::{BytesCodec, FlatFileTaskCollection};
//!
//! let dir = tempfile::tempdir()?;
//! let queue = FlatFileTaskCollection::open(dir.path().join("queue"), BytesCodec, 1000)?;
//!
//! queue.add(&vec![0u8, 1, 2])?;
//! assert_eq!(queue.remove()?, vec![0u8, 1, 2]);
//! assert!(queue.is_empty());
//!
//! queue.close()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod codec;
pub mod error;
mod frame;
mod lock;
mod queue;
mod reader;
pub mod segment;
mod task;
mod writer;

#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use codec::{BytesCodec, Codec};
pub use error::{Error, Result};
pub use queue::FlatFileTaskCollection;
pub use task::Task;
