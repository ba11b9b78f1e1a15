//! Conversione sequenziale dell'intera coda

use uuid::Uuid;

use crate::error::{AppError, Result};
use crate::models::{BatchSummary, QueueEvent, SourceFile};
use crate::services::converter::{ConversionEngine, EncodedImage};

use super::core::{Attempt, SharedQueue};

/// Tappe di avanzamento del singolo elemento
pub const PROGRESS_STARTED: u8 = 5;
pub const PROGRESS_DECODED: u8 = 25;
pub const PROGRESS_RENDERED: u8 = 70;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ItemOutcome {
    Converted,
    Failed,
    Skipped,
    Discarded,
}

/// Converte in ordine tutti gli elementi non ancora completati.
///
/// Gli elementi vengono elaborati uno alla volta sulla coda così com'era
/// all'avvio. Un errore su un elemento lo porta in stato Errored senza
/// fermare gli altri. Il lock viene tenuto solo tra una fase e l'altra,
/// quindi submit/remove restano possibili durante la conversione: un
/// elemento rimosso nel frattempo viene saltato e il suo risultato scartato.
pub async fn convert_all(queue: &SharedQueue) -> Result<BatchSummary> {
    let (_guard, ids, engine) = {
        let q = queue.read().await;
        let guard = q.try_begin_batch()?;
        (guard, q.item_ids(), q.engine())
    };

    let total = ids.len();
    tracing::info!("Avvio conversione di {} elementi", total);

    let mut processed = 0;
    let mut failed = 0;

    for id in ids {
        let outcome = convert_item(queue, &engine, id).await;
        if outcome == ItemOutcome::Failed {
            failed += 1;
        }
        if outcome == ItemOutcome::Discarded {
            tracing::debug!("Elemento {} rimosso durante la conversione, risultato scartato", id);
        }

        processed += 1;
        queue.read().await.report_progress(processed, total);
    }

    let summary = {
        let q = queue.read().await;
        let summary = BatchSummary {
            success: q.count_completed(),
            failed,
        };
        q.send_event(QueueEvent::BatchSummary {
            success: summary.success,
            failed: summary.failed,
        });
        summary
    };

    tracing::info!(
        "Conversione terminata: {} completati, {} falliti",
        summary.success,
        summary.failed
    );

    Ok(summary)
}

async fn convert_item(queue: &SharedQueue, engine: &ConversionEngine, id: Uuid) -> ItemOutcome {
    let source = {
        let mut q = queue.write().await;
        match q.begin_attempt(id, PROGRESS_STARTED) {
            Attempt::Start(source) => source,
            Attempt::AlreadyCompleted => return ItemOutcome::Skipped,
            Attempt::Missing => return ItemOutcome::Discarded,
        }
    };

    tracing::debug!("Conversione di {} ({})", source.name, id);
    let result = run_phases(queue, engine, id, &source).await;

    let mut q = queue.write().await;
    match result {
        Ok(encoded) => {
            if q.complete_item(id, encoded) {
                ItemOutcome::Converted
            } else {
                ItemOutcome::Discarded
            }
        }
        Err(e) => {
            if q.fail_item(id, &e) {
                ItemOutcome::Failed
            } else {
                ItemOutcome::Discarded
            }
        }
    }
}

/// Lettura, decodifica, letterbox e codifica, con avanzamento tra le fasi
async fn run_phases(
    queue: &SharedQueue,
    engine: &ConversionEngine,
    id: Uuid,
    source: &SourceFile,
) -> Result<EncodedImage> {
    let data = source.read().await?;

    let engine = *engine;
    let decoded = blocking(move || engine.decode(&data)).await??;
    queue.write().await.advance(id, PROGRESS_DECODED);

    let (canvas, placement) = blocking(move || engine.render(&decoded)).await?;
    queue.write().await.advance(id, PROGRESS_RENDERED);

    blocking(move || engine.encode(&canvas, placement)).await?
}

async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| AppError::Internal(format!("Task di conversione interrotto: {}", e)))
}
