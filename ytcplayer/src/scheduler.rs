//! Per-destination sequential playback scheduler.
//!
//! Every destination with pending work owns exactly one drain task. The
//! task pops jobs in FIFO order, keeps a single voice connection for the
//! destination (reconnecting when the requester's channel differs), plays
//! each job to its terminal event and always deletes the job's resource.
//! When the queue runs dry the connection is destroyed and the destination
//! entry removed.
//!
//! # State per destination
//!
//! ```text
//! Idle ──enqueue──▶ Connecting ──▶ Playing ──▶ Advancing ──▶ Idle
//!                       ▲                         │
//!                       └──────── next job ───────┘
//! ```
//!
//! `enqueue` and the drain task's "queue is empty, remove the entry" step
//! run under the same lock, so a job is never left behind without a drain
//! task and two drain tasks never run for one destination.

use crate::{
    Announcer, ChannelId, ConnectionProvider, DestinationId, Error, JobErrorKind, JobPayload,
    PlayEvent, PlayEvents, PlayableResource, PlaybackJob, RequesterId, ResourceMaterializer,
    Result, VoiceConnection,
};
use futures::{FutureExt, StreamExt};
use std::any::Any;
use std::collections::hash_map::Entry;
use std::collections::{HashMap, VecDeque};
use std::panic::AssertUnwindSafe;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::broadcast;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

/// Lifecycle phase of one destination
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestinationPhase {
    /// No queue entry exists
    Idle,
    /// Joining the requester's channel
    Connecting,
    /// A job is being materialized or played
    Playing,
    /// Job done, checking for the next one or tearing down
    Advancing,
}

/// Notifications emitted by the scheduler.
#[derive(Debug, Clone)]
pub enum PlaybackEvent {
    JobQueued {
        destination: DestinationId,
        job_id: Uuid,
        position: usize,
    },
    JobStarted {
        destination: DestinationId,
        job_id: Uuid,
        title: String,
    },
    JobFinished {
        destination: DestinationId,
        job_id: Uuid,
    },
    JobFailed {
        destination: DestinationId,
        job_id: Uuid,
        kind: JobErrorKind,
        message: String,
    },
    ResourceDeleted {
        destination: DestinationId,
        job_id: Uuid,
    },
    ConnectionOpened {
        destination: DestinationId,
        channel: ChannelId,
    },
    ConnectionClosed {
        destination: DestinationId,
        channel: ChannelId,
    },
    DestinationIdle {
        destination: DestinationId,
    },
}

struct DestinationQueue {
    jobs: VecDeque<PlaybackJob>,
    phase: DestinationPhase,
}

struct SchedulerInner {
    provider: Arc<dyn ConnectionProvider>,
    materializer: Arc<dyn ResourceMaterializer>,
    announcer: Option<Announcer>,
    queues: Mutex<HashMap<DestinationId, DestinationQueue>>,
    event_tx: broadcast::Sender<PlaybackEvent>,
}

/// Registry of destination queues and their drain tasks.
///
/// Cloning is cheap and shares the same registry.
#[derive(Clone)]
pub struct PlaybackScheduler {
    inner: Arc<SchedulerInner>,
}

impl PlaybackScheduler {
    pub fn new(
        provider: Arc<dyn ConnectionProvider>,
        materializer: Arc<dyn ResourceMaterializer>,
        announcer: Option<Announcer>,
    ) -> Self {
        Self {
            inner: Arc::new(SchedulerInner {
                provider,
                materializer,
                announcer,
                queues: Mutex::new(HashMap::new()),
                event_tx: broadcast::channel(256).0,
            }),
        }
    }

    /// Appends `job` to the destination's queue.
    ///
    /// Starts the drain task when the destination had no queue. Returns the
    /// number of jobs waiting ahead of this one (the job currently playing
    /// is not counted). Must be called from within a tokio runtime.
    pub fn enqueue(&self, destination: DestinationId, job: PlaybackJob) -> usize {
        let job_id = job.id;
        let (position, start_drain) = {
            let mut queues = self.inner.lock_queues();
            match queues.entry(destination.clone()) {
                Entry::Occupied(mut entry) => {
                    let queue = entry.get_mut();
                    queue.jobs.push_back(job);
                    (queue.jobs.len() - 1, false)
                }
                Entry::Vacant(entry) => {
                    entry.insert(DestinationQueue {
                        jobs: VecDeque::from([job]),
                        phase: DestinationPhase::Connecting,
                    });
                    (0, true)
                }
            }
        };

        debug!(destination = %destination, job = %job_id, position, "Job queued");
        self.inner.emit(PlaybackEvent::JobQueued {
            destination: destination.clone(),
            job_id,
            position,
        });

        if start_drain {
            let inner = self.inner.clone();
            tokio::spawn(async move {
                inner.drain(destination).await;
            });
        }
        position
    }

    /// Subscribes to scheduler notifications.
    pub fn subscribe(&self) -> broadcast::Receiver<PlaybackEvent> {
        self.inner.event_tx.subscribe()
    }

    pub fn phase(&self, destination: &DestinationId) -> DestinationPhase {
        self.inner
            .lock_queues()
            .get(destination)
            .map_or(DestinationPhase::Idle, |q| q.phase)
    }

    /// Jobs waiting in the destination's queue, excluding the one in flight
    pub fn queue_len(&self, destination: &DestinationId) -> usize {
        self.inner
            .lock_queues()
            .get(destination)
            .map_or(0, |q| q.jobs.len())
    }

    pub fn active_destinations(&self) -> Vec<DestinationId> {
        self.inner.lock_queues().keys().cloned().collect()
    }

    pub fn announcer(&self) -> Option<&Announcer> {
        self.inner.announcer.as_ref()
    }
}

impl SchedulerInner {
    fn lock_queues(&self) -> MutexGuard<'_, HashMap<DestinationId, DestinationQueue>> {
        self.queues.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: PlaybackEvent) {
        // Ignoré si aucun abonné
        let _ = self.event_tx.send(event);
    }

    fn set_phase(&self, destination: &DestinationId, phase: DestinationPhase) {
        if let Some(queue) = self.lock_queues().get_mut(destination) {
            queue.phase = phase;
        }
    }

    fn next_job(&self, destination: &DestinationId) -> Option<PlaybackJob> {
        let mut queues = self.lock_queues();
        let queue = queues.get_mut(destination)?;
        let job = queue.jobs.pop_front();
        if job.is_none() {
            queue.phase = DestinationPhase::Advancing;
        }
        job
    }

    /// Removes the destination entry if nothing was enqueued meanwhile.
    fn release_if_empty(&self, destination: &DestinationId) -> bool {
        let mut queues = self.lock_queues();
        match queues.get(destination) {
            Some(queue) if !queue.jobs.is_empty() => false,
            _ => {
                queues.remove(destination);
                true
            }
        }
    }

    async fn drain(self: Arc<Self>, destination: DestinationId) {
        info!(destination = %destination, "▶️ Drain loop started");
        let mut connection: Option<Box<dyn VoiceConnection>> = None;

        loop {
            let Some(job) = self.next_job(&destination) else {
                // File vide : on libère la connexion avant de retirer l'entrée
                if let Some(conn) = connection.take() {
                    self.close(&destination, conn).await;
                }
                if self.release_if_empty(&destination) {
                    break;
                }
                debug!(destination = %destination, "Job arrived during teardown, continuing");
                continue;
            };

            self.run_job(&destination, job, &mut connection).await;
            self.set_phase(&destination, DestinationPhase::Advancing);
        }

        info!(destination = %destination, "⏹️ Queue drained, destination idle");
        self.emit(PlaybackEvent::DestinationIdle { destination });
    }

    async fn run_job(
        &self,
        destination: &DestinationId,
        job: PlaybackJob,
        connection: &mut Option<Box<dyn VoiceConnection>>,
    ) {
        let PlaybackJob {
            id: job_id,
            requester,
            title,
            payload,
            ..
        } = job;

        self.set_phase(destination, DestinationPhase::Playing);
        info!(destination = %destination, job = %job_id, title = %title, "Starting job");
        self.emit(PlaybackEvent::JobStarted {
            destination: destination.clone(),
            job_id,
            title: title.clone(),
        });

        let resource = match payload {
            JobPayload::Resource(resource) => resource,
            JobPayload::Selection(selection) => {
                let materialized = AssertUnwindSafe(self.materializer.materialize(&selection))
                    .catch_unwind()
                    .await
                    .unwrap_or_else(|panic| Err(Error::Panic(panic_message(panic))));
                match materialized {
                    Ok(resource) => resource,
                    Err(e) => {
                        self.report_failure(destination, job_id, &e);
                        return;
                    }
                }
            }
        };

        let played = AssertUnwindSafe(self.play_on(
            destination,
            &requester,
            &title,
            resource.as_ref(),
            connection,
        ))
        .catch_unwind()
        .await;
        let outcome = match played {
            Ok(outcome) => outcome,
            Err(panic) => {
                // État de la connexion inconnu : on repartira d'une connexion neuve
                if let Some(conn) = connection.take() {
                    self.close(destination, conn).await;
                }
                Err(Error::Panic(panic_message(panic)))
            }
        };

        let deleted = AssertUnwindSafe(resource.delete())
            .catch_unwind()
            .await
            .unwrap_or_else(|panic| Err(Error::Panic(panic_message(panic))));
        match deleted {
            Ok(()) => self.emit(PlaybackEvent::ResourceDeleted {
                destination: destination.clone(),
                job_id,
            }),
            Err(e) => warn!(
                destination = %destination,
                job = %job_id,
                kind = %e.kind(),
                "Trouble deleting clip resource: {}",
                e
            ),
        }

        match outcome {
            Ok(()) => {
                debug!(destination = %destination, job = %job_id, "Job finished");
                self.emit(PlaybackEvent::JobFinished {
                    destination: destination.clone(),
                    job_id,
                });
            }
            Err(e) => self.report_failure(destination, job_id, &e),
        }
    }

    async fn play_on(
        &self,
        destination: &DestinationId,
        requester: &RequesterId,
        title: &str,
        resource: &dyn PlayableResource,
        connection: &mut Option<Box<dyn VoiceConnection>>,
    ) -> Result<()> {
        let channel = self
            .provider
            .locate(destination, requester)
            .await
            .ok_or_else(|| Error::RequesterAbsent(requester.to_string()))?;

        let reuse = connection
            .as_ref()
            .is_some_and(|conn| conn.channel() == &channel);
        if !reuse {
            if let Some(previous) = connection.take() {
                debug!(
                    destination = %destination,
                    from = %previous.channel(),
                    to = %channel,
                    "Requester moved, switching channel"
                );
                self.close(destination, previous).await;
            }
            self.set_phase(destination, DestinationPhase::Connecting);
            info!(destination = %destination, channel = %channel, "Creating voice connection");
            let fresh = self.provider.connect(destination, &channel).await?;
            self.emit(PlaybackEvent::ConnectionOpened {
                destination: destination.clone(),
                channel: channel.clone(),
            });
            *connection = Some(fresh);
        }

        let Some(conn) = connection.as_mut() else {
            return Err(Error::Connection(format!("no connection to {}", channel)));
        };

        self.set_phase(destination, DestinationPhase::Playing);
        if let Some(announcer) = &self.announcer {
            announcer.announce(title);
        }

        let events = conn.play(resource).await?;
        wait_terminal(events).await
    }

    async fn close(&self, destination: &DestinationId, connection: Box<dyn VoiceConnection>) {
        let channel = connection.channel().clone();
        if let Err(panic) = AssertUnwindSafe(connection.destroy()).catch_unwind().await {
            warn!(
                destination = %destination,
                channel = %channel,
                "Voice connection panicked while closing: {}",
                panic_message(panic)
            );
        }
        debug!(destination = %destination, channel = %channel, "Voice connection destroyed");
        self.emit(PlaybackEvent::ConnectionClosed {
            destination: destination.clone(),
            channel,
        });
    }

    fn report_failure(&self, destination: &DestinationId, job_id: Uuid, err: &Error) {
        error!(
            destination = %destination,
            job = %job_id,
            kind = %err.kind(),
            "Job failed: {}",
            err
        );
        self.emit(PlaybackEvent::JobFailed {
            destination: destination.clone(),
            job_id,
            kind: err.kind(),
            message: err.to_string(),
        });
    }
}

fn panic_message(panic: Box<dyn Any + Send>) -> String {
    panic
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| panic.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string())
}

/// Waits for `Finished` or `Error`, ignoring intermediate events.
///
/// A stream ending without a terminal event counts as finished.
async fn wait_terminal(mut events: PlayEvents) -> Result<()> {
    while let Some(event) = events.next().await {
        match event {
            PlayEvent::Finished => return Ok(()),
            PlayEvent::Error(message) => return Err(Error::Playback(message)),
            PlayEvent::Started => trace!("Playback started"),
            PlayEvent::Progress { position } => trace!(?position, "Playback progress"),
        }
    }
    warn!("Play event stream ended without a terminal event");
    Ok(())
}
