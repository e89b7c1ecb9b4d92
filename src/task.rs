//! Task handles with explicit completion and failure.
//!
//! The core queue delivers each entry exactly once per process lifetime.
//! Pipelines that want at-least-once semantics (a consumer that can hand
//! an item back after a failed attempt) get them here as a layer above
//! the segment mechanics: failing a task re-appends its item at the tail.

use crate::codec::Codec;
use crate::error::Result;
use crate::queue::FlatFileTaskCollection;

/// A removed item with its fate still undecided.
///
/// Dropping the handle counts as completion; redelivery is strictly
/// opt-in through [`mark_failed`](Self::mark_failed). A re-added item goes
/// to the back of the queue, not its original position.
pub struct Task<'q, T, C: Codec<T>> {
    queue: &'q FlatFileTaskCollection<T, C>,
    data: T,
}

impl<'q, T, C: Codec<T>> Task<'q, T, C> {
    pub fn data(&self) -> &T {
        &self.data
    }

    pub fn into_data(self) -> T {
        self.data
    }

    /// Acknowledge the task as done.
    pub fn mark_completed(self) {}

    /// Hand the item back to the queue for a later attempt.
    pub fn mark_failed(self) -> Result<()> {
        self.queue.add(&self.data)
    }
}

impl<T, C: Codec<T>> FlatFileTaskCollection<T, C> {
    /// Remove the oldest item wrapped in a [`Task`] handle.
    ///
    /// Same contract as [`remove`](Self::remove), including the
    /// empty-queue error.
    pub fn remove_task(&self) -> Result<Task<'_, T, C>> {
        Ok(Task {
            queue: self,
            data: self.remove()?,
        })
    }
}

#[cfg(test)]
mod tests {
    use tempfile::tempdir;

    use crate::codec::BytesCodec;
    use crate::queue::FlatFileTaskCollection;

    #[test]
    fn failed_task_is_redelivered_at_the_tail() {
        let dir = tempdir().expect("tempdir");
        let queue = FlatFileTaskCollection::open(dir.path().join("queue"), BytesCodec, 10)
            .expect("open");

        queue.add(&b"first".to_vec()).expect("add");
        queue.add(&b"second".to_vec()).expect("add");

        let task = queue.remove_task().expect("remove");
        assert_eq!(task.data(), b"first");
        task.mark_failed().expect("fail");

        // The failed item re-enters behind everything already queued.
        assert_eq!(queue.remove().expect("remove"), b"second");
        assert_eq!(queue.remove().expect("remove"), b"first");
        assert!(queue.is_empty());
    }

    #[test]
    fn completed_task_is_gone() {
        let dir = tempdir().expect("tempdir");
        let queue = FlatFileTaskCollection::open(dir.path().join("queue"), BytesCodec, 10)
            .expect("open");

        queue.add(&b"only".to_vec()).expect("add");
        let task = queue.remove_task().expect("remove");
        assert_eq!(task.into_data(), b"only");
        assert!(queue.is_empty());
    }
}
