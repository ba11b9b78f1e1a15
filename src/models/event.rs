use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BlobHandle, ItemSnapshot, ItemStatus};

/// Notifiche inviate dalla coda al livello di presentazione
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum QueueEvent {
    ItemAdded {
        item: ItemSnapshot,
    },
    ItemStatusChanged {
        id: Uuid,
        status: ItemStatus,
        progress: u8,
    },
    PreviewChanged {
        id: Uuid,
        preview: BlobHandle,
    },
    ItemRemoved {
        id: Uuid,
    },
    QueueCleared,
    /// Avanzamento complessivo della coda (0-100)
    QueueProgress {
        processed: usize,
        total: usize,
        percent: u8,
    },
    BatchSummary {
        success: usize,
        failed: usize,
    },
    FileRejected {
        name: String,
        reason: String,
    },
    NothingToConvert,
}

impl QueueEvent {
    pub fn item_id(&self) -> Option<Uuid> {
        match self {
            QueueEvent::ItemAdded { item } => Some(item.id),
            QueueEvent::ItemStatusChanged { id, .. }
            | QueueEvent::PreviewChanged { id, .. }
            | QueueEvent::ItemRemoved { id } => Some(*id),
            _ => None,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}
