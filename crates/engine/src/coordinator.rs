//! Coordinator — bounded ingress queue plus the supervisor that fans actions
//! out to channel actors.
//!
//! The directory is built once before the supervisor starts and is never
//! mutated afterwards, so the supervisor reads it through a plain `Arc`.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;

use relay_common::config::AppConfig;
use relay_common::types::{Action, Channel};

use crate::actor::{Actor, ActorConfig, ActorStatus, Delivery};
use crate::error::DispatchError;

/// Default ingress queue capacity.
pub const DEFAULT_INGRESS_CAPACITY: usize = 1000;

#[derive(Debug, Clone)]
pub struct CoordinatorConfig {
    pub ingress_capacity: usize,
    pub actor: ActorConfig,
}

impl Default for CoordinatorConfig {
    fn default() -> Self {
        Self {
            ingress_capacity: DEFAULT_INGRESS_CAPACITY,
            actor: ActorConfig::default(),
        }
    }
}

impl From<&AppConfig> for CoordinatorConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            ingress_capacity: config.ingress_capacity,
            actor: ActorConfig {
                mailbox_capacity: config.mailbox_capacity,
                heartbeat_interval: Duration::from_secs(config.heartbeat_interval_secs),
                alive_window: Duration::from_secs(config.actor_alive_window_secs),
                idle_window: Duration::from_secs(config.actor_idle_window_secs),
            },
        }
    }
}

/// Channel kind → ordered list of actors.
#[derive(Default)]
pub struct Directory {
    actors: HashMap<Channel, Vec<Arc<Actor>>>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    /// One actor per channel kind.
    pub fn with_default_pool(config: &ActorConfig, delivery: &Delivery) -> Self {
        let mut directory = Self::new();
        for channel in Channel::ALL {
            directory.register(Actor::spawn(channel, config.clone(), delivery.clone()));
        }
        directory
    }

    /// Append an actor to the list for its channel.
    pub fn register(&mut self, actor: Arc<Actor>) {
        self.actors.entry(actor.channel()).or_default().push(actor);
    }

    pub fn actors(&self, channel: Channel) -> &[Arc<Actor>] {
        self.actors.get(&channel).map(Vec::as_slice).unwrap_or(&[])
    }

    /// All actors, grouped in `Channel::ALL` order.
    pub fn iter(&self) -> impl Iterator<Item = &Arc<Actor>> {
        Channel::ALL
            .into_iter()
            .flat_map(move |channel| self.actors(channel).iter())
    }

    pub fn len(&self) -> usize {
        self.actors.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Counters updated by `send` and the supervisor.
#[derive(Debug, Default)]
struct DispatchStats {
    accepted: AtomicU64,
    rejected: AtomicU64,
    routed: AtomicU64,
    dropped: AtomicU64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    /// Requests placed on the ingress queue.
    pub accepted: u64,
    /// Requests refused because the ingress queue was full.
    pub rejected: u64,
    /// Actions handed to at least one actor.
    pub routed: u64,
    /// Actions no actor could take.
    pub dropped: u64,
}

impl DispatchStats {
    fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            accepted: self.accepted.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            routed: self.routed.load(Ordering::Relaxed),
            dropped: self.dropped.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct CoordinatorStatus {
    pub started_at: DateTime<Utc>,
    pub queued: usize,
    pub capacity: usize,
    pub stats: StatsSnapshot,
    pub actors: Vec<ActorStatus>,
}

/// Entry point for notification requests.
pub struct Coordinator {
    directory: Arc<Directory>,
    ingress: mpsc::Sender<Action>,
    stats: Arc<DispatchStats>,
    started_at: DateTime<Utc>,
}

impl Coordinator {
    /// Build the default pool (one actor per channel) and start the supervisor.
    pub fn new(config: CoordinatorConfig, delivery: Delivery) -> Self {
        let directory = Directory::with_default_pool(&config.actor, &delivery);
        Self::start(directory, config.ingress_capacity)
    }

    /// Start the supervisor over an already populated directory.
    pub fn start(directory: Directory, ingress_capacity: usize) -> Self {
        let (tx, rx) = mpsc::channel(ingress_capacity.max(1));
        let directory = Arc::new(directory);
        let stats = Arc::new(DispatchStats::default());

        tracing::info!(
            actors = directory.len(),
            ingress_capacity = tx.max_capacity(),
            "Coordinator started"
        );

        tokio::spawn(supervise(Arc::clone(&directory), rx, Arc::clone(&stats)));

        Self {
            directory,
            ingress: tx,
            stats,
            started_at: Utc::now(),
        }
    }

    /// Queue a notification request.
    ///
    /// Never waits: a full ingress queue is reported as
    /// [`DispatchError::Overloaded`] and nothing is enqueued. `Ok` means the
    /// request was queued, not that it was delivered.
    pub fn send(
        &self,
        channel: Channel,
        to: &str,
        from: &str,
        payload: &str,
        title: &str,
    ) -> Result<(), DispatchError> {
        self.submit(Action::new(channel, to, from, payload, title))
    }

    pub fn submit(&self, action: Action) -> Result<(), DispatchError> {
        match self.ingress.try_send(action) {
            Ok(()) => {
                self.stats.accepted.fetch_add(1, Ordering::Relaxed);
                Ok(())
            }
            Err(TrySendError::Full(action)) => {
                self.stats.rejected.fetch_add(1, Ordering::Relaxed);
                tracing::warn!(
                    channel = %action.channel,
                    capacity = self.capacity(),
                    "Ingress queue full, rejecting request"
                );
                Err(DispatchError::Overloaded)
            }
            Err(TrySendError::Closed(_)) => Err(DispatchError::Stopped),
        }
    }

    /// Actions waiting for the supervisor.
    pub fn queued(&self) -> usize {
        self.ingress.max_capacity() - self.ingress.capacity()
    }

    pub fn capacity(&self) -> usize {
        self.ingress.max_capacity()
    }

    pub fn directory(&self) -> &Directory {
        &self.directory
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    pub fn status(&self) -> CoordinatorStatus {
        CoordinatorStatus {
            started_at: self.started_at,
            queued: self.queued(),
            capacity: self.capacity(),
            stats: self.stats(),
            actors: self.directory.iter().map(|a| a.snapshot()).collect(),
        }
    }

    /// Stop every actor. Returns how many were running.
    pub fn shutdown(&self) -> usize {
        self.directory
            .iter()
            .filter(|actor| actor.shutdown().is_ok())
            .count()
    }
}

async fn supervise(
    directory: Arc<Directory>,
    mut ingress: mpsc::Receiver<Action>,
    stats: Arc<DispatchStats>,
) {
    tracing::info!("Supervisor started");

    while let Some(action) = ingress.recv().await {
        if route(&directory, action) > 0 {
            stats.routed.fetch_add(1, Ordering::Relaxed);
        } else {
            stats.dropped.fetch_add(1, Ordering::Relaxed);
        }
    }

    tracing::info!("Supervisor stopped");
}

/// Hand `action` to every alive, non-full actor of its channel.
///
/// Returns the number of actors that took it. Zero means the action was
/// dropped: unknown channel, or every actor dead or full.
fn route(directory: &Directory, action: Action) -> usize {
    let mut taken = 0;

    for actor in directory.actors(action.channel) {
        if !actor.is_alive() || actor.is_full() {
            tracing::debug!(
                actor = actor.name(),
                alive = actor.is_alive(),
                occupancy = actor.occupancy(),
                "Skipping ineligible actor"
            );
            continue;
        }

        match actor.try_add(action.clone()) {
            Ok(()) => taken += 1,
            Err(e) => {
                tracing::warn!(actor = actor.name(), error = %e, "Actor refused action")
            }
        }
    }

    if taken == 0 {
        tracing::warn!(
            channel = %action.channel,
            to = %action.to,
            "No eligible actor, dropping action"
        );
    }

    taken
}
