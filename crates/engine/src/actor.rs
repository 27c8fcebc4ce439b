//! Channel worker actor.
//!
//! An actor owns a bounded mailbox and a single processing task. The task
//! drains the mailbox in FIFO order, hands each action to the delivery
//! collaborator for its channel, and stamps a heartbeat on a fixed period so
//! the supervisor can tell whether the loop is still making progress.
//!
//! Occupancy and both timestamps are atomics: they are written by the actor
//! task and read by the supervisor when it decides who gets the next action.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, mpsc};
use tokio::time::{Instant, MissedTickBehavior};
use uuid::Uuid;

use relay_common::types::{Action, Channel};
use relay_notifier::{EmailSender, SmsSender};

use crate::error::MailboxError;

/// Default mailbox capacity per actor.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 10;

/// Default heartbeat period.
pub const DEFAULT_HEARTBEAT_INTERVAL: Duration = Duration::from_secs(60);

/// An actor whose last heartbeat is older than this is dead.
pub const DEFAULT_ALIVE_WINDOW: Duration = Duration::from_secs(5 * 60);

/// An actor that processed nothing for this long reports idle.
pub const DEFAULT_IDLE_WINDOW: Duration = Duration::from_secs(60);

/// Tunables shared by every actor in a pool.
#[derive(Debug, Clone)]
pub struct ActorConfig {
    pub mailbox_capacity: usize,
    pub heartbeat_interval: Duration,
    pub alive_window: Duration,
    pub idle_window: Duration,
}

impl Default for ActorConfig {
    fn default() -> Self {
        Self {
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
            heartbeat_interval: DEFAULT_HEARTBEAT_INTERVAL,
            alive_window: DEFAULT_ALIVE_WINDOW,
            idle_window: DEFAULT_IDLE_WINDOW,
        }
    }
}

/// Delivery collaborators injected into every actor.
#[derive(Clone)]
pub struct Delivery {
    pub email: Arc<dyn EmailSender>,
    pub sms: Arc<dyn SmsSender>,
}

impl Delivery {
    pub fn new(email: Arc<dyn EmailSender>, sms: Arc<dyn SmsSender>) -> Self {
        Self { email, sms }
    }
}

/// Point-in-time view of an actor, as reported by the status endpoint.
#[derive(Debug, Clone, Serialize)]
pub struct ActorStatus {
    pub name: String,
    pub channel: Channel,
    pub occupancy: usize,
    pub capacity: usize,
    pub alive: bool,
    pub idle: bool,
    pub closed: bool,
    pub last_heartbeat_secs: u64,
    pub last_action_secs: u64,
}

/// A worker serving one channel kind.
pub struct Actor {
    name: String,
    channel: Channel,
    config: ActorConfig,
    capacity: usize,
    mailbox: mpsc::Sender<Action>,
    /// Actions accepted and not yet finished processing, in-flight one included.
    occupancy: AtomicUsize,
    /// Base for the millisecond timestamps below.
    origin: Instant,
    last_heartbeat: AtomicI64,
    last_action: AtomicI64,
    closed: AtomicBool,
    shutdown: Notify,
}

impl Actor {
    /// Create an actor and start its processing task on the current runtime.
    pub fn spawn(channel: Channel, config: ActorConfig, delivery: Delivery) -> Arc<Self> {
        let capacity = config.mailbox_capacity.max(1);
        let (tx, rx) = mpsc::channel(capacity);

        let actor = Arc::new(Self {
            name: Uuid::new_v4().to_string(),
            channel,
            config,
            capacity,
            mailbox: tx,
            occupancy: AtomicUsize::new(0),
            origin: Instant::now(),
            last_heartbeat: AtomicI64::new(0),
            last_action: AtomicI64::new(0),
            closed: AtomicBool::new(false),
            shutdown: Notify::new(),
        });

        tracing::info!(
            actor = %actor.name,
            channel = %channel,
            capacity,
            "Actor started"
        );

        tokio::spawn(Arc::clone(&actor).run(rx, delivery));
        actor
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn channel(&self) -> Channel {
        self.channel
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn occupancy(&self) -> usize {
        self.occupancy.load(Ordering::Acquire)
    }

    pub fn is_full(&self) -> bool {
        self.occupancy() >= self.capacity
    }

    /// True while the last heartbeat is no older than the alive window.
    pub fn is_alive(&self) -> bool {
        self.age(&self.last_heartbeat) <= self.config.alive_window
    }

    /// True once no action has finished within the idle window.
    pub fn is_idle(&self) -> bool {
        self.age(&self.last_action) > self.config.idle_window
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    /// Enqueue without waiting.
    ///
    /// A slot is reserved on the occupancy counter before the channel send, so
    /// the counter can never run past capacity even with concurrent callers.
    /// Liveness is the caller's concern and is not checked here.
    pub fn try_add(&self, action: Action) -> Result<(), MailboxError> {
        if self.is_closed() {
            return Err(MailboxError::Closed);
        }

        self.occupancy
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| {
                (n < self.capacity).then_some(n + 1)
            })
            .map_err(|_| MailboxError::Full)?;

        // A shutdown may have landed while the slot was being taken.
        if self.is_closed() {
            self.occupancy.fetch_sub(1, Ordering::AcqRel);
            return Err(MailboxError::Closed);
        }

        match self.mailbox.try_send(action) {
            Ok(()) => Ok(()),
            Err(e) => {
                self.occupancy.fetch_sub(1, Ordering::AcqRel);
                match e {
                    TrySendError::Full(_) => Err(MailboxError::Full),
                    TrySendError::Closed(_) => Err(MailboxError::Closed),
                }
            }
        }
    }

    /// Stop the processing task. Queued actions are discarded undelivered.
    pub fn shutdown(&self) -> Result<(), MailboxError> {
        if self.closed.swap(true, Ordering::AcqRel) {
            return Err(MailboxError::AlreadyShutdown);
        }
        self.shutdown.notify_one();
        Ok(())
    }

    pub fn snapshot(&self) -> ActorStatus {
        ActorStatus {
            name: self.name.clone(),
            channel: self.channel,
            occupancy: self.occupancy(),
            capacity: self.capacity,
            alive: self.is_alive(),
            idle: self.is_idle(),
            closed: self.is_closed(),
            last_heartbeat_secs: self.age(&self.last_heartbeat).as_secs(),
            last_action_secs: self.age(&self.last_action).as_secs(),
        }
    }

    async fn run(self: Arc<Self>, mut mailbox: mpsc::Receiver<Action>, delivery: Delivery) {
        let period = self.config.heartbeat_interval.max(Duration::from_millis(1));
        let mut heartbeat = tokio::time::interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                _ = self.shutdown.notified() => break,
                action = mailbox.recv() => match action {
                    Some(action) => self.process(action, &delivery).await,
                    None => break,
                },
                tick = heartbeat.tick() => {
                    self.last_heartbeat.store(self.millis_at(tick), Ordering::Release);
                }
            }
        }

        // Queued actions are discarded, not delivered; their slots are released.
        mailbox.close();
        let mut dropped = 0usize;
        while mailbox.try_recv().is_ok() {
            self.occupancy.fetch_sub(1, Ordering::AcqRel);
            dropped += 1;
        }
        tracing::info!(
            actor = %self.name,
            channel = %self.channel,
            dropped,
            "Actor stopped"
        );
    }

    async fn process(&self, action: Action, delivery: &Delivery) {
        match action.channel {
            Channel::Email => {
                match delivery
                    .email
                    .send(&action.to, &action.from, &action.payload, &action.title)
                    .await
                {
                    Ok(delivered) => {
                        tracing::info!(actor = %self.name, to = %action.to, delivered, "Email sent")
                    }
                    Err(e) => {
                        tracing::error!(actor = %self.name, to = %action.to, error = %e, "Email delivery failed")
                    }
                }
            }
            Channel::Sms => {
                match delivery
                    .sms
                    .send(&action.to, &action.from, &action.payload)
                    .await
                {
                    Ok(delivered) => {
                        tracing::info!(actor = %self.name, to = %action.to, delivered, "SMS sent")
                    }
                    Err(e) => {
                        tracing::error!(actor = %self.name, to = %action.to, error = %e, "SMS delivery failed")
                    }
                }
            }
            // Push delivery has no transport yet; acceptance is all we record.
            Channel::Push => {
                tracing::info!(actor = %self.name, to = %action.to, "Push notification accepted")
            }
        }

        self.last_action
            .store(self.millis_at(Instant::now()), Ordering::Release);
        self.occupancy.fetch_sub(1, Ordering::AcqRel);
    }

    fn millis_at(&self, at: Instant) -> i64 {
        at.saturating_duration_since(self.origin).as_millis() as i64
    }

    fn age(&self, stamp: &AtomicI64) -> Duration {
        let elapsed = self.millis_at(Instant::now()) - stamp.load(Ordering::Acquire);
        Duration::from_millis(elapsed.max(0) as u64)
    }
}
