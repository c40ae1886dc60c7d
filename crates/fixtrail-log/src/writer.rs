//! Background task that keeps the text file in sync with the fix buffer.
//!
//! Every poll interval the task compares the number of appended fixes with
//! the number it last wrote. When they differ it takes a snapshot and
//! rewrites the whole file: header first, then one line per fix in append
//! order. Cancellation is cooperative; after the token fires the task makes
//! one more pass so nothing submitted before the stop is left out.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use fixtrail_proto::fix::Fix;

use crate::buffer::BufferReader;
use crate::format::{format_record, header_line};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum WriterState {
    Idle = 0,
    Running = 1,
    Stopping = 2,
    Terminated = 3,
}

impl WriterState {
    fn from_u8(v: u8) -> Self {
        match v {
            0 => WriterState::Idle,
            1 => WriterState::Running,
            2 => WriterState::Stopping,
            _ => WriterState::Terminated,
        }
    }
}

/// Writer state readable from any thread.
#[derive(Debug, Clone)]
pub(crate) struct SharedState(Arc<AtomicU8>);

impl SharedState {
    pub(crate) fn new() -> Self {
        Self(Arc::new(AtomicU8::new(WriterState::Idle as u8)))
    }

    pub(crate) fn get(&self) -> WriterState {
        WriterState::from_u8(self.0.load(Ordering::Acquire))
    }

    pub(crate) fn set(&self, s: WriterState) {
        self.0.store(s as u8, Ordering::Release);
    }

    /// Moves `from` -> `to`, returning false if the state was something else.
    pub(crate) fn transition(&self, from: WriterState, to: WriterState) -> bool {
        self.0
            .compare_exchange(from as u8, to as u8, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

/// Rewrites `path` from scratch with the header and every renderable fix.
///
/// Fixes that cannot be rendered are logged and left out. Returns the
/// number of record lines written.
pub async fn flush(path: &Path, fixes: &[Arc<Fix>]) -> std::io::Result<usize> {
    let file = File::create(path).await?;
    let mut out = BufWriter::new(file);

    out.write_all(header_line().as_bytes()).await?;

    let mut written = 0;
    for (i, fix) in fixes.iter().enumerate() {
        match format_record(fix) {
            Ok(line) => {
                out.write_all(line.as_bytes()).await?;
                written += 1;
            }
            Err(e) => warn!(position = i, "skipping fix: {}", e),
        }
    }

    out.flush().await?;
    Ok(written)
}

pub(crate) struct WriterTask {
    path: PathBuf,
    reader: BufferReader,
    poll_interval: Duration,
    state: SharedState,
    cancel: CancellationToken,
    last_flushed: usize,
}

impl WriterTask {
    pub(crate) fn new(
        path: PathBuf,
        reader: BufferReader,
        poll_interval: Duration,
        state: SharedState,
        cancel: CancellationToken,
    ) -> Self {
        Self { path, reader, poll_interval, state, cancel, last_flushed: 0 }
    }

    pub(crate) fn spawn(self) -> JoinHandle<()> {
        tokio::spawn(self.run())
    }

    async fn run(mut self) {
        // Stays Stopping if a stop raced the spawn.
        self.state.transition(WriterState::Idle, WriterState::Running);
        info!(path = %self.path.display(), interval_ms = self.poll_interval.as_millis() as u64, "fix log writer started");

        let mut ticker = tokio::time::interval(self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let cancel = self.cancel.clone();

        loop {
            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = ticker.tick() => {
                    self.flush_if_changed().await;
                }
            }
        }

        self.state.set(WriterState::Stopping);
        self.flush_if_changed().await;
        self.state.set(WriterState::Terminated);
        info!(path = %self.path.display(), records = self.last_flushed, "fix log writer stopped");
    }

    /// One comparison-and-flush pass. The count only advances on success so
    /// a failed write is retried on the next tick.
    async fn flush_if_changed(&mut self) {
        if self.reader.size() == self.last_flushed {
            return;
        }

        let snapshot = self.reader.snapshot();
        match flush(&self.path, &snapshot).await {
            Ok(written) => {
                self.last_flushed = snapshot.len();
                debug!(records = snapshot.len(), written, "fix log rewritten");
            }
            Err(e) => {
                warn!(path = %self.path.display(), "fix log flush failed: {:#}", e);
            }
        }
    }
}
