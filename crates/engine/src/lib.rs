//! Actor-pool dispatch engine.
//!
//! Requests enter a bounded ingress queue through [`Coordinator::send`]. A
//! single supervisor task fans each one out to the alive, non-full actors of
//! its channel, and every [`Actor`] drains its own bounded mailbox into the
//! matching delivery collaborator.

pub mod actor;
pub mod coordinator;
pub mod error;

pub use actor::{Actor, ActorConfig, ActorStatus, Delivery};
pub use coordinator::{
    Coordinator, CoordinatorConfig, CoordinatorStatus, Directory, StatsSnapshot,
};
pub use error::{DispatchError, MailboxError};
