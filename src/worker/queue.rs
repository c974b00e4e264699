//! Side-effect queue for contact submissions
//!
//! Requests enqueue work with a non-blocking send and return immediately. A
//! worker task drains the queue and handles each item on a task of its own; a
//! failure is logged without touching any other item or any request.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{mpsc, Semaphore};
use tokio::task::{JoinError, JoinHandle, JoinSet};
use tracing::{debug, error, info, warn};

use crate::db::schemas::ContactDoc;
use crate::services::{AnalyticsService, NewEvent, Notifier};

/// Work deferred past the response
#[derive(Debug, Clone)]
pub enum SideEffect {
    /// Send the admin alert and auto-reply for a contact
    Notify(ContactDoc),
    /// Record an analytics event
    Track(NewEvent),
}

impl SideEffect {
    fn kind(&self) -> &'static str {
        match self {
            SideEffect::Notify(_) => "notify",
            SideEffect::Track(_) => "track",
        }
    }
}

/// Sending half, cloned into every service that defers work
#[derive(Clone)]
pub struct SideEffectQueue {
    tx: mpsc::Sender<SideEffect>,
    dropped: Arc<AtomicU64>,
}

impl SideEffectQueue {
    /// Bounded queue holding at most `capacity` pending items
    pub fn new(capacity: usize) -> (Self, mpsc::Receiver<SideEffect>) {
        let (tx, rx) = mpsc::channel(capacity.max(1));
        (
            Self {
                tx,
                dropped: Arc::new(AtomicU64::new(0)),
            },
            rx,
        )
    }

    /// Queue `effect` without waiting. Returns false if it was dropped.
    pub fn enqueue(&self, effect: SideEffect) -> bool {
        let kind = effect.kind();
        match self.tx.try_send(effect) {
            Ok(()) => {
                debug!(kind, "Side effect queued");
                true
            }
            Err(TrySendError::Full(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(kind, "Side-effect queue full, dropping item");
                false
            }
            Err(TrySendError::Closed(_)) => {
                self.dropped.fetch_add(1, Ordering::Relaxed);
                warn!(kind, "Side-effect worker stopped, dropping item");
                false
            }
        }
    }

    /// Items dropped since startup
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Items handled at the same time
pub const MAX_CONCURRENT_EFFECTS: usize = 8;

/// Consumes the queue
#[derive(Clone)]
pub struct SideEffectWorker {
    notifier: Arc<dyn Notifier>,
    analytics: AnalyticsService,
}

impl SideEffectWorker {
    pub fn new(notifier: Arc<dyn Notifier>, analytics: AnalyticsService) -> Self {
        Self { notifier, analytics }
    }

    /// Carry out one item
    pub async fn handle(&self, effect: SideEffect) {
        match effect {
            SideEffect::Notify(contact) => {
                if let Err(e) = self.notifier.notify_contact(&contact).await {
                    warn!(
                        contact_id = %contact._id,
                        error = %e,
                        "Error sending contact notification"
                    );
                }
            }
            SideEffect::Track(event) => self.analytics.record(event).await,
        }
    }

    /// Drain the queue until every sender is gone
    ///
    /// Each item runs on its own task, at most [`MAX_CONCURRENT_EFFECTS`] at
    /// once. A slow relay does not hold up tracking, and a panicking item is
    /// logged without stopping the worker. Returns once in-flight items finish.
    pub async fn run(self, mut rx: mpsc::Receiver<SideEffect>) {
        info!("Side-effect worker started");
        let permits = Arc::new(Semaphore::new(MAX_CONCURRENT_EFFECTS));
        let mut tasks = JoinSet::new();

        while let Some(effect) = rx.recv().await {
            let Ok(permit) = Arc::clone(&permits).acquire_owned().await else {
                break;
            };
            let worker = self.clone();
            tasks.spawn(async move {
                let _permit = permit;
                worker.handle(effect).await;
            });

            while let Some(finished) = tasks.try_join_next() {
                log_task_result(finished);
            }
        }

        while let Some(finished) = tasks.join_next().await {
            log_task_result(finished);
        }
        info!("Side-effect worker stopped");
    }

    /// Run on a detached task
    pub fn spawn(self, rx: mpsc::Receiver<SideEffect>) -> JoinHandle<()> {
        tokio::spawn(self.run(rx))
    }
}

fn log_task_result(result: std::result::Result<(), JoinError>) {
    if let Err(e) = result {
        error!(error = %e, "Side-effect task aborted");
    }
}
