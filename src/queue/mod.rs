//! On-disk event queue
//!
//! Outbound events are persisted one file per event in a dedicated
//! directory, replayed oldest first by a flush pass, and removed once the
//! remote side has either accepted or permanently rejected them.

pub mod entry;
pub mod flusher;
pub mod lock;
pub mod store;

pub use entry::{EventRecord, QueueEntry};
pub use flusher::{FlushStatus, QueueFlusher};
pub use lock::QueueLock;
pub use store::EventFileStore;
