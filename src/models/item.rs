use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{BlobHandle, QueueEvent, SourceFile};
use crate::utils::{declared_content_type, format_file_size};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ItemStatus {
    Idle,
    Processing,
    Completed,
    Errored,
}

impl ItemStatus {
    /// Etichetta mostrata accanto all'elemento
    pub fn label(&self) -> &'static str {
        match self {
            ItemStatus::Idle => "Idle…",
            ItemStatus::Processing => "Processing…",
            ItemStatus::Completed => "Done!",
            ItemStatus::Errored => "Error!",
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Errored)
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Idle => write!(f, "idle"),
            ItemStatus::Processing => write!(f, "processing"),
            ItemStatus::Completed => write!(f, "completed"),
            ItemStatus::Errored => write!(f, "errored"),
        }
    }
}

/// Vista di sola lettura di un elemento, per il livello di presentazione
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ItemSnapshot {
    pub id: Uuid,
    pub name: String,
    pub size: u64,
    pub size_label: String,
    pub content_type: String,
    pub status: ItemStatus,
    pub status_label: String,
    pub progress: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview: Option<BlobHandle>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct QueueItem {
    id: Uuid,
    source: SourceFile,
    status: ItemStatus,
    progress: u8,
    preview: Option<BlobHandle>,
    output: Option<(BlobHandle, String)>,
    error: Option<String>,
    created_at: DateTime<Utc>,
    completed_at: Option<DateTime<Utc>>,
}

impl QueueItem {
    pub fn new(source: SourceFile, preview: BlobHandle) -> Self {
        Self {
            id: Uuid::new_v4(),
            source,
            status: ItemStatus::Idle,
            progress: 0,
            preview: Some(preview),
            output: None,
            error: None,
            created_at: Utc::now(),
            completed_at: None,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    pub fn source(&self) -> &SourceFile {
        &self.source
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn progress(&self) -> u8 {
        self.progress
    }

    pub fn preview(&self) -> Option<BlobHandle> {
        self.preview
    }

    pub fn output(&self) -> Option<BlobHandle> {
        self.output.as_ref().map(|(handle, _)| *handle)
    }

    pub fn output_name(&self) -> Option<&str> {
        self.output.as_ref().map(|(_, name)| name.as_str())
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn completed_at(&self) -> Option<DateTime<Utc>> {
        self.completed_at
    }

    /// Nuovo tentativo: il progress riparte da zero
    pub(crate) fn mark_processing(&mut self) {
        self.status = ItemStatus::Processing;
        self.progress = 0;
        self.error = None;
    }

    /// Il progress non scende mai durante un tentativo
    pub(crate) fn update_progress(&mut self, progress: u8) {
        self.progress = progress.min(100).max(self.progress);
    }

    /// Sostituisce l'anteprima e restituisce quella precedente, da rilasciare
    pub(crate) fn replace_preview(&mut self, preview: BlobHandle) -> Option<BlobHandle> {
        self.preview.replace(preview)
    }

    /// Restituisce l'output precedente (se presente), da rilasciare
    pub(crate) fn mark_completed(
        &mut self,
        output: BlobHandle,
        output_name: String,
    ) -> Option<BlobHandle> {
        let previous = self.output.replace((output, output_name));
        self.status = ItemStatus::Completed;
        self.progress = 100;
        self.completed_at = Some(Utc::now());
        previous.map(|(handle, _)| handle)
    }

    pub(crate) fn mark_failed(&mut self, error: String) {
        self.status = ItemStatus::Errored;
        self.progress = 0;
        self.error = Some(error);
    }

    /// Sgancia tutti gli handle posseduti dall'elemento
    pub(crate) fn take_handles(&mut self) -> Vec<BlobHandle> {
        let mut handles = Vec::with_capacity(2);
        if let Some(preview) = self.preview.take() {
            handles.push(preview);
        }
        if let Some((output, _)) = self.output.take() {
            handles.push(output);
        }
        handles
    }

    pub fn to_snapshot(&self) -> ItemSnapshot {
        ItemSnapshot {
            id: self.id,
            name: self.source.name.clone(),
            size: self.source.size,
            size_label: format_file_size(self.source.size),
            content_type: declared_content_type(self.source.content_type.as_deref()).to_string(),
            status: self.status,
            status_label: self.status.label().to_string(),
            progress: self.progress,
            preview: self.preview,
            output_name: self.output_name().map(str::to_string),
            error: self.error.clone(),
            created_at: self.created_at,
        }
    }

    pub fn to_status_event(&self) -> QueueEvent {
        QueueEvent::ItemStatusChanged {
            id: self.id,
            status: self.status,
            progress: self.progress,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn item() -> QueueItem {
        let source = SourceFile::from_bytes("photo.png", Some("image/png"), vec![0u8; 2048]);
        QueueItem::new(source, BlobHandle::new())
    }

    #[test]
    fn test_new_item_is_idle() {
        let item = item();
        assert_eq!(item.status(), ItemStatus::Idle);
        assert_eq!(item.progress(), 0);
        assert!(item.preview().is_some());
        assert!(item.output().is_none());
        assert!(item.output_name().is_none());
    }

    #[test]
    fn test_progress_is_monotonic_within_attempt() {
        let mut item = item();
        item.mark_processing();
        item.update_progress(25);
        item.update_progress(5);
        assert_eq!(item.progress(), 25);
        item.update_progress(250);
        assert_eq!(item.progress(), 100);

        item.mark_processing();
        assert_eq!(item.progress(), 0);
    }

    #[test]
    fn test_output_and_name_set_together() {
        let mut item = item();
        let output = BlobHandle::new();
        assert!(item.mark_completed(output, "photo_4000.jpg".into()).is_none());
        assert_eq!(item.output(), Some(output));
        assert_eq!(item.output_name(), Some("photo_4000.jpg"));
        assert_eq!(item.status(), ItemStatus::Completed);
        assert!(item.completed_at().is_some());

        let handles = item.take_handles();
        assert_eq!(handles.len(), 2);
        assert!(item.output().is_none());
        assert!(item.output_name().is_none());
        assert!(item.take_handles().is_empty());
    }

    #[test]
    fn test_failed_resets_progress() {
        let mut item = item();
        item.mark_processing();
        item.update_progress(70);
        item.mark_failed("boom".into());
        assert_eq!(item.status(), ItemStatus::Errored);
        assert_eq!(item.progress(), 0);
        assert_eq!(item.error(), Some("boom"));
    }

    #[test]
    fn test_snapshot_labels() {
        let snapshot = item().to_snapshot();
        assert_eq!(snapshot.status_label, "Idle…");
        assert_eq!(snapshot.size_label, "2 KB");
        assert_eq!(snapshot.content_type, "image/png");
    }

    #[test]
    fn test_status_labels() {
        assert_eq!(ItemStatus::Processing.label(), "Processing…");
        assert_eq!(ItemStatus::Completed.label(), "Done!");
        assert_eq!(ItemStatus::Errored.label(), "Error!");
        assert!(ItemStatus::Errored.is_terminal());
        assert!(!ItemStatus::Idle.is_terminal());
    }
}
