//! Stato della coda: elementi in ordine di inserimento, handle, notifiche

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;

use crate::config::{formats, Config};
use crate::error::{AppError, Result};
use crate::models::{
    Blob, Download, FileContent, ItemSnapshot, ItemStatus, QueueEvent, QueueItem, SourceFile,
    FALLBACK_DOWNLOAD_NAME,
};
use crate::services::converter::{ConversionEngine, EncodedImage};
use crate::utils::{declared_content_type, get_content_type, validate_image_file};

use super::handles::HandleRegistry;

pub type SharedQueue = Arc<RwLock<QueueManager>>;

/// Sender per le notifiche verso la presentazione
pub type EventSender = broadcast::Sender<QueueEvent>;

pub fn create_queue(config: Config) -> Result<SharedQueue> {
    Ok(Arc::new(RwLock::new(QueueManager::new(config)?)))
}

/// Esito dell'avvio di un tentativo su un elemento
#[derive(Debug)]
pub(crate) enum Attempt {
    Start(SourceFile),
    AlreadyCompleted,
    Missing,
}

/// Segnala una conversione in corso; si azzera quando viene rilasciato
#[derive(Debug)]
pub(crate) struct BatchGuard(Arc<AtomicBool>);

impl Drop for BatchGuard {
    fn drop(&mut self) {
        self.0.store(false, Ordering::SeqCst);
    }
}

pub struct QueueManager {
    engine: ConversionEngine,
    items: Vec<QueueItem>,
    handles: HandleRegistry,
    events_tx: EventSender,
    converting: Arc<AtomicBool>,
}

impl std::fmt::Debug for QueueManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueueManager")
            .field("items", &self.items.len())
            .field("live_handles", &self.handles.live_count())
            .field("converting", &self.is_converting())
            .finish()
    }
}

impl QueueManager {
    pub fn new(config: Config) -> Result<Self> {
        config.validate()?;
        let (events_tx, _) = broadcast::channel(config.event_capacity);

        Ok(Self {
            engine: ConversionEngine::new(&config),
            items: Vec::new(),
            handles: HandleRegistry::new(),
            events_tx,
            converting: Arc::new(AtomicBool::new(false)),
        })
    }

    /// Invia una notifica via broadcast
    pub fn send_event(&self, event: QueueEvent) {
        // Ignora errore se nessun receiver
        let _ = self.events_tx.send(event);
    }

    pub fn subscribe(&self) -> broadcast::Receiver<QueueEvent> {
        self.events_tx.subscribe()
    }

    pub fn engine(&self) -> ConversionEngine {
        self.engine
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[QueueItem] {
        &self.items
    }

    pub fn get(&self, id: Uuid) -> Option<&QueueItem> {
        self.items.iter().find(|item| item.id() == id)
    }

    pub fn snapshots(&self) -> Vec<ItemSnapshot> {
        self.items.iter().map(QueueItem::to_snapshot).collect()
    }

    pub fn handles(&self) -> &HandleRegistry {
        &self.handles
    }

    pub fn is_converting(&self) -> bool {
        self.converting.load(Ordering::SeqCst)
    }

    /// Aggiunge i file supportati in coda; quelli non supportati vengono
    /// notificati singolarmente senza interrompere gli altri.
    /// Restituisce gli id degli elementi creati.
    pub fn submit<I>(&mut self, files: I) -> Vec<Uuid>
    where
        I: IntoIterator<Item = SourceFile>,
    {
        let mut added = Vec::new();

        for file in files {
            if let Err(e) = validate_image_file(&file.name, file.content_type.as_deref()) {
                tracing::warn!("File rifiutato: {} ({})", file.name, e);
                self.send_event(QueueEvent::FileRejected {
                    name: file.name.clone(),
                    reason: e.to_string(),
                });
                continue;
            }

            // L'anteprima iniziale punta alla sorgente
            let preview = self.handles.create(Blob {
                content: file.content.clone(),
                content_type: declared_content_type(file.content_type.as_deref()).to_string(),
            });
            let item = QueueItem::new(file, preview);
            let snapshot = item.to_snapshot();

            tracing::debug!("Elemento {} in coda: {}", item.id(), snapshot.name);
            added.push(item.id());
            self.items.push(item);
            self.send_event(QueueEvent::ItemAdded { item: snapshot });
        }

        if !added.is_empty() {
            tracing::info!(
                "{} file aggiunti, {} elementi in coda",
                added.len(),
                self.items.len()
            );
        }

        added
    }

    /// Rimuove un elemento rilasciandone gli handle. `false` se non esiste.
    pub fn remove(&mut self, id: Uuid) -> bool {
        let Some(pos) = self.items.iter().position(|item| item.id() == id) else {
            tracing::debug!("Rimozione di un elemento inesistente: {}", id);
            return false;
        };

        let mut item = self.items.remove(pos);
        for handle in item.take_handles() {
            self.handles.release(handle);
        }

        tracing::info!("Elemento rimosso: {} ({})", id, item.source().name);
        self.send_event(QueueEvent::ItemRemoved { id });
        true
    }

    /// Svuota la coda se `confirm` lo conferma. Con coda vuota non chiede nulla.
    pub fn clear<F>(&mut self, confirm: F) -> bool
    where
        F: FnOnce() -> bool,
    {
        if self.items.is_empty() {
            return false;
        }

        if !confirm() {
            tracing::debug!("Svuotamento coda annullato");
            return false;
        }

        let count = self.items.len();
        for mut item in self.items.drain(..) {
            for handle in item.take_handles() {
                self.handles.release(handle);
            }
        }

        tracing::info!("Coda svuotata: {} elementi rimossi", count);
        self.send_event(QueueEvent::QueueCleared);
        true
    }

    /// Output pronto per il salvataggio; `None` se l'elemento non è convertito
    pub fn download(&self, id: Uuid) -> Option<Download> {
        let item = self.get(id)?;
        let blob = self.handles.resolve(item.output()?)?;

        let FileContent::Memory(data) = &blob.content else {
            return None;
        };

        Some(Download {
            file_name: item
                .output_name()
                .unwrap_or(FALLBACK_DOWNLOAD_NAME)
                .to_string(),
            content_type: get_content_type(formats::OUTPUT_EXTENSION),
            data: data.clone(),
        })
    }

    pub(crate) fn try_begin_batch(&self) -> Result<BatchGuard> {
        if self.items.is_empty() {
            tracing::info!("Nessuna immagine da convertire");
            self.send_event(QueueEvent::NothingToConvert);
            return Err(AppError::EmptyQueue);
        }

        if self.converting.swap(true, Ordering::SeqCst) {
            return Err(AppError::ConversionInProgress);
        }

        Ok(BatchGuard(self.converting.clone()))
    }

    pub(crate) fn item_ids(&self) -> Vec<Uuid> {
        self.items.iter().map(QueueItem::id).collect()
    }

    pub(crate) fn begin_attempt(&mut self, id: Uuid, initial_progress: u8) -> Attempt {
        let Some(item) = self.items.iter_mut().find(|item| item.id() == id) else {
            return Attempt::Missing;
        };

        if item.status() == ItemStatus::Completed {
            return Attempt::AlreadyCompleted;
        }

        item.mark_processing();
        item.update_progress(initial_progress);
        let source = item.source().clone();
        let event = item.to_status_event();
        self.send_event(event);

        Attempt::Start(source)
    }

    /// Aggiorna il progress di un elemento in elaborazione, se esiste ancora
    pub(crate) fn advance(&mut self, id: Uuid, progress: u8) {
        let Some(item) = self.items.iter_mut().find(|item| item.id() == id) else {
            return;
        };

        if item.status() == ItemStatus::Processing {
            item.update_progress(progress);
            let event = item.to_status_event();
            self.send_event(event);
        }
    }

    /// Registra il risultato. `false` se l'elemento è stato rimosso nel frattempo:
    /// il risultato viene scartato senza allocare handle.
    pub(crate) fn complete_item(&mut self, id: Uuid, encoded: EncodedImage) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id() == id) else {
            return false;
        };

        let blob = Blob {
            content: FileContent::Memory(encoded.data.clone()),
            content_type: encoded.content_type().to_string(),
        };

        let preview = self.handles.create(blob.clone());
        if let Some(previous) = item.replace_preview(preview) {
            self.handles.release(previous);
        }

        let output = self.handles.create(blob);
        let output_name = self.engine.output_name(&item.source().name);
        if let Some(previous) = item.mark_completed(output, output_name) {
            self.handles.release(previous);
        }

        tracing::info!(
            "Convertito: {} -> {} ({} bytes)",
            item.source().name,
            item.output_name().unwrap_or_default(),
            encoded.data.len()
        );

        let status = item.to_status_event();
        self.send_event(QueueEvent::PreviewChanged { id, preview });
        self.send_event(status);
        true
    }

    /// Chiude il tentativo in errore. `false` se l'elemento non esiste più.
    pub(crate) fn fail_item(&mut self, id: Uuid, error: &AppError) -> bool {
        let Some(item) = self.items.iter_mut().find(|item| item.id() == id) else {
            return false;
        };

        tracing::error!("Conversione fallita per {}: {}", item.source().name, error);
        item.mark_failed(error.to_string());
        let event = item.to_status_event();
        self.send_event(event);
        true
    }

    pub(crate) fn report_progress(&self, processed: usize, total: usize) {
        let percent = if total == 0 {
            100
        } else {
            ((processed as f64 / total as f64) * 100.0).round() as u8
        };
        self.send_event(QueueEvent::QueueProgress {
            processed,
            total,
            percent,
        });
    }

    pub(crate) fn count_completed(&self) -> usize {
        self.items
            .iter()
            .filter(|item| item.status() == ItemStatus::Completed)
            .count()
    }
}

impl Drop for QueueManager {
    fn drop(&mut self) {
        let released = self.handles.release_all();
        if released > 0 {
            tracing::debug!("Rilasciati {} handle alla chiusura della coda", released);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;
    use tokio::sync::broadcast::error::TryRecvError;

    fn manager() -> QueueManager {
        QueueManager::new(Config::default().with_target_size(16)).unwrap()
    }

    fn png(name: &str) -> SourceFile {
        SourceFile::from_bytes(name, Some("image/png"), vec![0u8; 4])
    }

    fn drain(rx: &mut broadcast::Receiver<QueueEvent>) -> Vec<QueueEvent> {
        let mut events = Vec::new();
        loop {
            match rx.try_recv() {
                Ok(event) => events.push(event),
                Err(TryRecvError::Empty) | Err(TryRecvError::Closed) => break,
                Err(TryRecvError::Lagged(_)) => continue,
            }
        }
        events
    }

    fn encoded() -> EncodedImage {
        EncodedImage {
            data: Bytes::from_static(b"\xFF\xD8jpeg"),
            size: 16,
            placement: crate::handlers::image::Placement::fit(16, 8, 16),
        }
    }

    #[test]
    fn test_new_rejects_invalid_config() {
        assert!(QueueManager::new(Config::default().with_target_size(0)).is_err());
    }

    #[test]
    fn test_submit_accepts_and_rejects_individually() {
        let mut queue = manager();
        let mut rx = queue.subscribe();

        let files = vec![
            png("a.png"),
            SourceFile::from_bytes("notes.txt", Some("text/plain"), vec![1u8]),
            SourceFile::from_bytes("b.HEIC", None, vec![1u8]),
        ];
        let added = queue.submit(files);

        assert_eq!(added.len(), 2);
        assert_eq!(queue.len(), 2);
        assert_eq!(queue.handles().live_count(), 2);
        assert_eq!(queue.items()[0].source().name, "a.png");
        assert_eq!(queue.items()[1].source().name, "b.HEIC");

        let events = drain(&mut rx);
        assert_eq!(events.len(), 3);
        assert!(matches!(&events[1], QueueEvent::FileRejected { name, .. } if name == "notes.txt"));
        assert!(matches!(&events[2], QueueEvent::ItemAdded { item } if item.content_type == "image/*"));
    }

    #[test]
    fn test_ids_are_unique() {
        let mut queue = manager();
        let added = queue.submit((0..20).map(|i| png(&format!("{i}.png"))));
        let mut unique = added.clone();
        unique.sort();
        unique.dedup();
        assert_eq!(unique.len(), 20);
    }

    #[test]
    fn test_preview_resolves_to_source() {
        let mut queue = manager();
        let id = queue.submit([png("a.png")])[0];
        let preview = queue.get(id).unwrap().preview().unwrap();
        let blob = queue.handles().resolve(preview).unwrap();
        assert_eq!(blob.content_type, "image/png");
    }

    #[test]
    fn test_remove_releases_handles() {
        let mut queue = manager();
        let ids = queue.submit([png("a.png"), png("b.png")]);
        let preview = queue.get(ids[0]).unwrap().preview().unwrap();

        assert!(queue.remove(ids[0]));
        assert!(!queue.handles().is_live(preview));
        assert_eq!(queue.handles().live_count(), 1);
        assert_eq!(queue.len(), 1);

        assert!(!queue.remove(ids[0]));
    }

    #[test]
    fn test_clear_requires_confirmation() {
        let mut queue = manager();
        let mut rx = queue.subscribe();
        queue.submit([png("a.png"), png("b.png")]);

        assert!(!queue.clear(|| false));
        assert_eq!(queue.len(), 2);

        assert!(queue.clear(|| true));
        assert!(queue.is_empty());
        assert_eq!(queue.handles().live_count(), 0);
        assert_eq!(drain(&mut rx).last(), Some(&QueueEvent::QueueCleared));
    }

    #[test]
    fn test_clear_on_empty_queue_does_not_ask() {
        let mut queue = manager();
        let asked = std::cell::Cell::new(false);
        assert!(!queue.clear(|| {
            asked.set(true);
            true
        }));
        assert!(!asked.get());
    }

    #[test]
    fn test_complete_replaces_preview_and_sets_output() {
        let mut queue = manager();
        let id = queue.submit([png("photo.png")])[0];
        let original_preview = queue.get(id).unwrap().preview().unwrap();

        assert!(matches!(queue.begin_attempt(id, 5), Attempt::Start(_)));
        assert!(queue.complete_item(id, encoded()));

        let item = queue.get(id).unwrap();
        assert_eq!(item.status(), ItemStatus::Completed);
        assert_eq!(item.progress(), 100);
        assert_eq!(item.output_name(), Some("photo_16.jpg"));
        assert!(!queue.handles().is_live(original_preview));
        assert!(queue.handles().is_live(item.preview().unwrap()));
        assert_eq!(queue.handles().live_count(), 2);

        let download = queue.download(id).unwrap();
        assert_eq!(download.file_name, "photo_16.jpg");
        assert_eq!(download.content_type, "image/jpeg");
        assert_eq!(download.data.as_ref(), b"\xFF\xD8jpeg");

        assert!(matches!(queue.begin_attempt(id, 5), Attempt::AlreadyCompleted));
    }

    #[test]
    fn test_download_without_output_is_none() {
        let mut queue = manager();
        let id = queue.submit([png("a.png")])[0];
        assert!(queue.download(id).is_none());
        assert!(queue.download(Uuid::new_v4()).is_none());
    }

    #[test]
    fn test_result_discarded_after_removal() {
        let mut queue = manager();
        let id = queue.submit([png("a.png")])[0];
        assert!(matches!(queue.begin_attempt(id, 5), Attempt::Start(_)));

        queue.remove(id);
        assert!(!queue.complete_item(id, encoded()));
        assert!(!queue.fail_item(id, &AppError::Decode("x".into())));
        assert_eq!(queue.handles().live_count(), 0);
        assert!(matches!(queue.begin_attempt(id, 5), Attempt::Missing));
    }

    #[test]
    fn test_batch_guard() {
        let mut queue = manager();
        assert!(matches!(queue.try_begin_batch(), Err(AppError::EmptyQueue)));

        queue.submit([png("a.png")]);
        let guard = queue.try_begin_batch().unwrap();
        assert!(queue.is_converting());
        assert!(matches!(
            queue.try_begin_batch(),
            Err(AppError::ConversionInProgress)
        ));

        drop(guard);
        assert!(!queue.is_converting());
    }
}
