//! Quadro: converte immagini in JPEG quadrati con bande bianche.
//!
//! [`services::converter::ConversionEngine`] esegue la conversione del singolo
//! file; [`services::queue`] gestisce la coda, lo stato degli elementi e le
//! notifiche verso la presentazione.

pub mod config;
pub mod error;
pub mod handlers;
pub mod models;
pub mod services;
pub mod utils;

pub use config::Config;
pub use error::{AppError, Result};
pub use models::{BatchSummary, Download, ItemSnapshot, ItemStatus, QueueEvent, SourceFile};
pub use services::converter::{ConversionEngine, EncodedImage};
pub use services::queue::{convert_all, create_queue, QueueManager, SharedQueue};
