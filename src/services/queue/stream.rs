//! Stream di notifiche per un singolo elemento

use std::pin::Pin;
use std::task::{Context, Poll};
use tokio_stream::wrappers::BroadcastStream;
use tokio_stream::Stream;
use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::QueueEvent;

use super::core::QueueManager;

/// Stream degli eventi di un elemento: parte dallo stato corrente e si chiude
/// quando l'elemento arriva a uno stato finale o esce dalla coda.
///
/// Se il ricevitore resta indietro e perde eventi lo stream si chiude: lo
/// stato finale potrebbe essere tra quelli persi. Per lo stato aggiornato
/// usare `QueueManager::get`.
pub struct ItemEventStream {
    item_id: Uuid,
    rx: BroadcastStream<QueueEvent>,
    initial_event: Option<QueueEvent>,
    terminated: bool,
}

impl ItemEventStream {
    fn is_terminal(&self, event: &QueueEvent) -> bool {
        match event {
            QueueEvent::ItemStatusChanged { status, .. } => status.is_terminal(),
            QueueEvent::ItemRemoved { .. } | QueueEvent::QueueCleared => true,
            _ => false,
        }
    }

    fn concerns_item(&self, event: &QueueEvent) -> bool {
        matches!(event, QueueEvent::QueueCleared) || event.item_id() == Some(self.item_id)
    }
}

impl Stream for ItemEventStream {
    type Item = QueueEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if self.terminated {
            return Poll::Ready(None);
        }

        // Prima lo stato corrente
        if let Some(event) = self.initial_event.take() {
            if self.is_terminal(&event) {
                self.terminated = true;
            }
            return Poll::Ready(Some(event));
        }

        loop {
            let rx = Pin::new(&mut self.rx);
            match rx.poll_next(cx) {
                Poll::Ready(Some(Ok(event))) => {
                    if !self.concerns_item(&event) {
                        continue;
                    }
                    if self.is_terminal(&event) {
                        self.terminated = true;
                    }
                    return Poll::Ready(Some(event));
                }
                // Ricevitore in ritardo: eventi persi, non si può più seguire l'elemento
                Poll::Ready(Some(Err(_))) => {
                    self.terminated = true;
                    return Poll::Ready(None);
                }
                Poll::Ready(None) => return Poll::Ready(None),
                Poll::Pending => return Poll::Pending,
            }
        }
    }
}

impl QueueManager {
    pub fn item_stream(&self, id: Uuid) -> Result<ItemEventStream> {
        let item = self.get(id).ok_or(AppError::ItemNotFound(id))?;

        Ok(ItemEventStream {
            item_id: id,
            rx: BroadcastStream::new(self.subscribe()),
            initial_event: Some(item.to_status_event()),
            terminated: false,
        })
    }
}
