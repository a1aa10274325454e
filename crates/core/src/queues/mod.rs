pub mod fifo_drop_oldest_queue;
pub mod isolated_forwarder;
pub mod unbounded_queue;

pub use fifo_drop_oldest_queue::*;
pub use isolated_forwarder::*;
pub use unbounded_queue::*;

/// How a subscriber's inbox for one event type behaves when it backs up.
pub enum QueueKind {
    /// No bound, nothing dropped.
    Unbounded,
    /// Bounded; a full queue overwrites its oldest item.
    FifoDropOldest { capacity: usize },
    /// Forwarded by a drain task into a bounded channel; a full inbox drops the newest item.
    Isolated { output_buffer: usize },
}
