use thiserror::Error;

/// Rejections returned synchronously by [`crate::Coordinator::send`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("node is loaded please retry after some time")]
    Overloaded,

    #[error("dispatcher is not running")]
    Stopped,
}

/// Failures of a non-blocking enqueue into an actor mailbox.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MailboxError {
    #[error("mailbox is full")]
    Full,

    #[error("mailbox is closed")]
    Closed,

    #[error("actor is already shut down")]
    AlreadyShutdown,
}
