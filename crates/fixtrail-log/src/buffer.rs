//! Append-only fix buffer shared between the producer and the writer task.
//!
//! The producer side never takes a lock: appends go through an unbounded
//! channel and bump an atomic counter. The reader side drains the channel
//! into its own vector, so the element set it hands out is always a prefix
//! of the append order and never contains a partially built fix.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use tokio::sync::mpsc;

use fixtrail_proto::fix::Fix;

use crate::error::LogError;

/// Creates an empty buffer, returning its producer and reader halves.
pub fn fix_buffer() -> (FixBuffer, BufferReader) {
    let (tx, rx) = mpsc::unbounded_channel();
    let appended = Arc::new(AtomicUsize::new(0));
    (
        FixBuffer { tx, appended: appended.clone() },
        BufferReader { rx, appended, fixes: Vec::new() },
    )
}

/// Producer half.
#[derive(Debug)]
pub struct FixBuffer {
    tx: mpsc::UnboundedSender<Arc<Fix>>,
    appended: Arc<AtomicUsize>,
}

impl FixBuffer {
    /// Adds `fix` at the end. Fails only once the reader is gone.
    pub fn append(&self, fix: Fix) -> Result<(), LogError> {
        self.tx.send(Arc::new(fix)).map_err(|_| LogError::Stopped)?;
        self.appended.fetch_add(1, Ordering::Release);
        Ok(())
    }

    pub fn size(&self) -> usize {
        self.appended.load(Ordering::Acquire)
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Reader half, owned by the writer task.
#[derive(Debug)]
pub struct BufferReader {
    rx: mpsc::UnboundedReceiver<Arc<Fix>>,
    appended: Arc<AtomicUsize>,
    fixes: Vec<Arc<Fix>>,
}

impl BufferReader {
    /// Number of fixes appended so far. May run one append ahead of or
    /// behind what the next snapshot contains.
    pub fn size(&self) -> usize {
        self.appended.load(Ordering::Acquire)
    }

    /// Independent, ordered copy of every fix received so far.
    pub fn snapshot(&mut self) -> Vec<Arc<Fix>> {
        while let Ok(fix) = self.rx.try_recv() {
            self.fixes.push(fix);
        }
        self.fixes.clone()
    }
}
