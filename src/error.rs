//! Error surface of the channel operations.

/// Error type for channel operations.
///
/// `WouldBlock` and `Interrupted` are control-flow signals rather than
/// channel failures: the channel state is untouched and the operation
/// may be retried at the caller's discretion. Short reads and writes
/// are not errors at all; they complete with the transferred count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum ChannelError {
    /// Non-blocking mode and the operation cannot proceed right now
    #[error("operation would block")]
    WouldBlock,

    /// A blocked wait was cancelled by an interrupt; nothing was transferred
    #[error("wait interrupted")]
    Interrupted,

    /// Malformed request, rejected before touching shared state
    #[error("invalid argument: {0}")]
    InvalidArgument(&'static str),

    /// The channel or the owning session has been torn down
    #[error("channel is closed")]
    Closed,
}
