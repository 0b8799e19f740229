//! The row-stream contract shared by every format-specific reader, and the
//! one-slot producer/consumer handoff the readers deliver rows through.

use std::sync::mpsc::{Receiver, SyncSender, sync_channel};
use std::thread::JoinHandle;

use anyhow::Result;

use crate::data::{Column, Row};

/// Uniform streaming-reader capability. New formats plug in by implementing
/// this trait; the profiler never branches on the concrete format.
///
/// Lifecycle: construct, call [`RowStream::initialize`] exactly once, read
/// [`RowStream::columns`]/[`RowStream::describe`], then consume the stream
/// via [`RowStream::into_rows`]. The row sequence is single-pass; re-reading
/// a file means constructing a fresh stream.
pub trait RowStream {
    /// Identifier of the underlying file, for reporting only.
    fn file_name(&self) -> &str;

    /// One-time setup: opens the resource, reads or infers the schema.
    /// Fatal if the resource is unreadable or no schema can be determined.
    fn initialize(&mut self) -> Result<()>;

    /// Column names and types, stable for the stream's remaining life.
    /// Only valid after `initialize`.
    fn columns(&self) -> &[Column];

    /// Human-readable one-line description (format, column count, codec).
    fn describe(&self) -> String;

    /// Consumes the stream and starts the decoder, returning the row
    /// channel. Each delivered row matches `columns()` in length and order.
    fn into_rows(self: Box<Self>) -> Result<RowChannel>;
}

/// Sender half handed to a format decoder running on its own thread.
pub type RowSender = SyncSender<Result<Row>>;

/// Lazy, single-pass, ordered sequence of decoded rows.
///
/// One row is in flight at a time: the decoder blocks until the consumer
/// has taken the previous row, so there is no unbounded buffering between
/// decoding and aggregation. Dropping the channel before exhaustion
/// disconnects the decoder, which exits and releases its file handle.
pub struct RowChannel {
    receiver: Option<Receiver<Result<Row>>>,
    producer: Option<JoinHandle<()>>,
}

impl RowChannel {
    /// Spawns `decode` on a producer thread connected by a one-slot channel.
    /// The decoder sends `Ok(row)` per row, one trailing `Err` on failure,
    /// and returns when the consumer hangs up.
    pub fn spawn<F>(decode: F) -> Self
    where
        F: FnOnce(RowSender) + Send + 'static,
    {
        let (sender, receiver) = sync_channel(1);
        let producer = std::thread::spawn(move || decode(sender));
        Self {
            receiver: Some(receiver),
            producer: Some(producer),
        }
    }
}

impl Iterator for RowChannel {
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        self.receiver.as_ref().and_then(|rx| rx.recv().ok())
    }
}

impl Drop for RowChannel {
    fn drop(&mut self) {
        // Hang up first so a mid-stream producer unblocks, then reap it.
        drop(self.receiver.take());
        if let Some(handle) = self.producer.take() {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::Value;
    use anyhow::anyhow;

    #[test]
    fn channel_delivers_rows_in_order() {
        let channel = RowChannel::spawn(|sender| {
            for i in 0..5 {
                if sender.send(Ok(vec![Some(Value::Integer(i))])).is_err() {
                    return;
                }
            }
        });
        let rows: Vec<Row> = channel.map(|row| row.expect("row")).collect();
        assert_eq!(rows.len(), 5);
        assert_eq!(rows[4][0], Some(Value::Integer(4)));
    }

    #[test]
    fn channel_surfaces_producer_errors() {
        let mut channel = RowChannel::spawn(|sender| {
            let _ = sender.send(Ok(vec![None]));
            let _ = sender.send(Err(anyhow!("decode failed")));
        });
        assert!(channel.next().expect("first").is_ok());
        let err = channel.next().expect("second").expect_err("error row");
        assert!(err.to_string().contains("decode failed"));
        assert!(channel.next().is_none());
    }

    #[test]
    fn dropping_channel_unblocks_producer() {
        let mut channel = RowChannel::spawn(|sender| {
            // The hangup turns send into an Err, which ends the loop.
            while sender.send(Ok(vec![None])).is_ok() {}
        });
        let _ = channel.next();
        drop(channel); // must not hang
    }
}
