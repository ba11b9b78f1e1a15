//! Coda di conversione
//!
//! Elementi in ordine di inserimento, conversione sequenziale, notifiche via broadcast.

mod core;
mod handles;
mod processor;
mod stream;

// Re-export public items
pub use self::core::{create_queue, EventSender, QueueManager, SharedQueue};
pub use handles::HandleRegistry;
pub use processor::{convert_all, PROGRESS_DECODED, PROGRESS_RENDERED, PROGRESS_STARTED};
pub use stream::ItemEventStream;
