use bytes::Bytes;
use serde::Serialize;
use std::path::{Path, PathBuf};

use crate::error::Result;

/// Nome usato quando l'output non ha un nome derivato
pub const FALLBACK_DOWNLOAD_NAME: &str = "converted.jpg";

/// Esito di un passaggio completo sulla coda
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq, Eq)]
pub struct BatchSummary {
    /// Elementi in stato Completed al termine del passaggio
    pub success: usize,
    /// Elementi falliti durante questo passaggio
    pub failed: usize,
}

impl BatchSummary {
    /// Messaggio riepilogativo per l'utente, `None` se non c'è nulla da dire
    pub fn message(&self) -> Option<String> {
        let mut lines = Vec::new();
        if self.success > 0 {
            lines.push(format!("{} immagini convertite con successo!", self.success));
        }
        if self.failed > 0 {
            lines.push(format!("{} immagini non convertite.", self.failed));
        }
        (!lines.is_empty()).then(|| lines.join("\n"))
    }
}

/// Output pronto per il salvataggio lato client
#[derive(Debug, Clone)]
pub struct Download {
    pub file_name: String,
    pub content_type: &'static str,
    pub data: Bytes,
}

impl Download {
    /// Salva l'output nella directory indicata e restituisce il percorso scritto
    pub async fn save_in(&self, dir: impl AsRef<Path>) -> Result<PathBuf> {
        let name = Path::new(&self.file_name)
            .file_name()
            .and_then(|n| n.to_str())
            .filter(|n| !n.is_empty())
            .unwrap_or(FALLBACK_DOWNLOAD_NAME);

        tokio::fs::create_dir_all(dir.as_ref()).await?;
        let path = dir.as_ref().join(name);
        tokio::fs::write(&path, &self.data).await?;

        tracing::info!("Download salvato: {} ({} bytes)", path.display(), self.data.len());
        Ok(path)
    }
}
