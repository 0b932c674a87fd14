//! Flush scheduler
//!
//! Runs flush passes on a dedicated worker thread so callers delivering
//! merges never wait on disk I/O. Requests that pile up while a pass runs are
//! drained together and answered by a single further pass.

use super::{PassReport, Reconciler};
use crate::error::ApiError;
use parking_lot::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;
use tracing::{debug, error, info};

enum Message {
    Flush,
    Shutdown,
}

#[derive(Default)]
struct SchedulerStats {
    passes: AtomicU64,
    last_report: Mutex<Option<PassReport>>,
    last_error: Mutex<Option<String>>,
}

pub struct FlushScheduler {
    sender: mpsc::Sender<Message>,
    stats: Arc<SchedulerStats>,
    worker: Option<JoinHandle<()>>,
}

impl FlushScheduler {
    /// Start the worker. With an interval, an idle worker also flushes on its own.
    pub fn spawn(reconciler: Arc<Reconciler>, interval: Option<Duration>) -> Result<Self, ApiError> {
        let (sender, receiver) = mpsc::channel();
        let stats = Arc::new(SchedulerStats::default());
        let worker_stats = Arc::clone(&stats);

        let worker = std::thread::Builder::new()
            .name("vellum-flush".to_string())
            .spawn(move || run_worker(reconciler, receiver, worker_stats, interval))
            .map_err(|e| ApiError::SchedulerError(format!("Failed to spawn flush worker: {}", e)))?;

        info!(interval = ?interval, "Flush scheduler started");
        Ok(Self {
            sender,
            stats,
            worker: Some(worker),
        })
    }

    /// Ask for a flush. Never blocks.
    pub fn request(&self) -> Result<(), ApiError> {
        self.sender
            .send(Message::Flush)
            .map_err(|_| ApiError::SchedulerError("Flush worker has stopped".to_string()))
    }

    /// Completed passes, successful or not
    pub fn passes(&self) -> u64 {
        self.stats.passes.load(Ordering::SeqCst)
    }

    pub fn last_report(&self) -> Option<PassReport> {
        self.stats.last_report.lock().clone()
    }

    pub fn last_error(&self) -> Option<String> {
        self.stats.last_error.lock().clone()
    }

    /// Stop the worker after any in-flight or pending pass, then join it.
    pub fn shutdown(mut self) -> Result<(), ApiError> {
        self.stop()
    }

    fn stop(&mut self) -> Result<(), ApiError> {
        let Some(worker) = self.worker.take() else {
            return Ok(());
        };
        // The worker may already be gone; join reports that.
        let _ = self.sender.send(Message::Shutdown);
        worker
            .join()
            .map_err(|_| ApiError::SchedulerError("Flush worker panicked".to_string()))?;
        info!(passes = self.passes(), "Flush scheduler stopped");
        Ok(())
    }
}

impl Drop for FlushScheduler {
    fn drop(&mut self) {
        if let Err(e) = self.stop() {
            error!(error = %e, "Flush scheduler did not stop cleanly");
        }
    }
}

fn run_worker(
    reconciler: Arc<Reconciler>,
    receiver: mpsc::Receiver<Message>,
    stats: Arc<SchedulerStats>,
    interval: Option<Duration>,
) {
    loop {
        let first = match interval {
            Some(interval) => match receiver.recv_timeout(interval) {
                Ok(message) => message,
                Err(mpsc::RecvTimeoutError::Timeout) => {
                    debug!("Periodic flush");
                    Message::Flush
                }
                Err(mpsc::RecvTimeoutError::Disconnected) => break,
            },
            None => match receiver.recv() {
                Ok(message) => message,
                Err(_) => break,
            },
        };

        // Everything queued so far is answered by one pass.
        let mut flush = false;
        let mut shutdown = false;
        for message in std::iter::once(first).chain(receiver.try_iter()) {
            match message {
                Message::Flush => flush = true,
                Message::Shutdown => shutdown = true,
            }
        }

        if flush {
            run_pass(&reconciler, &stats);
        }
        if shutdown {
            break;
        }
    }
    debug!("Flush worker exiting");
}

fn run_pass(reconciler: &Reconciler, stats: &SchedulerStats) {
    match reconciler.flush() {
        Ok(report) => {
            *stats.last_report.lock() = Some(report);
            *stats.last_error.lock() = None;
        }
        Err(e) => {
            error!(error = %e, "Scheduled flush failed");
            *stats.last_error.lock() = Some(e.to_string());
        }
    }
    stats.passes.fetch_add(1, Ordering::SeqCst);
}
