use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::info;

use fixtrail_proto::fix::Fix;

use crate::buffer::{fix_buffer, FixBuffer};
use crate::config::WriterConfig;
use crate::error::LogError;
use crate::format::{echo_line, header_line};
use crate::writer::{SharedState, WriterState, WriterTask};

/// Producer-facing handle of a running fix log.
///
/// `submit` never touches the file; the writer task picks new fixes up on
/// its next poll. Dropping the handle cancels the writer; its final flush
/// then only happens if the runtime keeps running. `request_stop` followed
/// by `join` is the way to make sure the last fixes reach the file.
#[derive(Debug)]
pub struct FixLog {
    path: PathBuf,
    buffer: FixBuffer,
    state: SharedState,
    cancel: CancellationToken,
    debug: AtomicBool,
    task: Option<JoinHandle<()>>,
}

impl FixLog {
    /// Creates (or truncates) `path`, writes the header and starts the writer.
    ///
    /// Must be called from within a tokio runtime. A zero poll interval is
    /// rejected before the file is touched.
    pub async fn open(path: impl Into<PathBuf>, cfg: &WriterConfig) -> Result<Self, LogError> {
        let path = path.into();
        if cfg.poll_interval().is_zero() {
            return Err(LogError::ZeroPollInterval);
        }
        tokio::fs::write(&path, header_line())
            .await
            .map_err(|source| LogError::Open { path: path.clone(), source })?;

        let (buffer, reader) = fix_buffer();
        let state = SharedState::new();
        let cancel = CancellationToken::new();

        let task = WriterTask::new(
            path.clone(),
            reader,
            cfg.poll_interval(),
            state.clone(),
            cancel.clone(),
        );
        state.set(WriterState::Running);
        let task = task.spawn();

        Ok(Self {
            path,
            buffer,
            state,
            cancel,
            debug: AtomicBool::new(cfg.debug),
            task: Some(task),
        })
    }

    /// Queues `fix` for the next flush.
    ///
    /// A submit racing `request_stop` from another thread may return `Ok`
    /// after the writer's final drain, in which case the fix is not written.
    /// Producers must stop submitting before they request the stop.
    pub fn submit(&self, fix: Fix) -> Result<(), LogError> {
        if self.cancel.is_cancelled() {
            return Err(LogError::Stopped);
        }
        if self.is_debug() {
            info!(target: "fixtrail::echo", "{}", echo_line(&fix));
        }
        self.buffer.append(fix)
    }

    /// Asks the writer to do its final flush and exit. Returns immediately.
    pub fn request_stop(&self) {
        if self.state.transition(WriterState::Running, WriterState::Stopping) {
            info!(path = %self.path.display(), submitted = self.buffer.size(), "fix log stop requested");
        }
        self.cancel.cancel();
    }

    /// Waits until the writer task has terminated, final flush included.
    /// Only returns once a stop has been requested.
    pub async fn join(mut self) -> Result<(), LogError> {
        if let Some(task) = self.task.take() {
            task.await?;
        }
        Ok(())
    }

    pub fn set_debug(&self, debug: bool) {
        self.debug.store(debug, Ordering::Relaxed);
    }

    pub fn is_debug(&self) -> bool {
        self.debug.load(Ordering::Relaxed)
    }

    pub fn state(&self) -> WriterState {
        self.state.get()
    }

    /// Fixes accepted so far.
    pub fn submitted(&self) -> usize {
        self.buffer.size()
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for FixLog {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}
