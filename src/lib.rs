pub mod channel;
pub mod error;
pub mod idgen;
pub mod interrupt;
pub mod notifications;
pub mod session;
pub mod store;
pub mod wait_queue;

// Re-export channel types for convenience
pub use channel::{Channel, Interest, Readiness};

// Re-export error type for convenience
pub use error::ChannelError;

// Re-export idgen types for convenience
pub use idgen::{Handle, IdGen};

// Re-export interrupt handle for convenience
pub use interrupt::Interrupt;

// Re-export notification types for convenience
pub use notifications::{ChannelEvent, NotificationRegistry};

// Re-export session type for convenience
pub use session::Session;

// Re-export store types for convenience
pub use store::{BufferStore, CompactingStore, RingStore};
