use bytes::Bytes;
use std::path::{Path, PathBuf};

use crate::error::{AppError, Result};
use crate::utils::get_mime_type;

/// Contenuto di un file: in memoria oppure su disco
#[derive(Debug, Clone, PartialEq)]
pub enum FileContent {
    Memory(Bytes),
    Path(PathBuf),
}

/// File sorgente inviato alla coda (nome, dimensione, content-type dichiarato, contenuto)
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub name: String,
    pub size: u64,
    pub content_type: Option<String>,
    pub content: FileContent,
}

impl SourceFile {
    pub fn from_bytes(
        name: impl Into<String>,
        content_type: Option<&str>,
        data: impl Into<Bytes>,
    ) -> Self {
        let data = data.into();
        Self {
            name: name.into(),
            size: data.len() as u64,
            content_type: content_type
                .filter(|ct| !ct.is_empty())
                .map(str::to_string),
            content: FileContent::Memory(data),
        }
    }

    /// Riferimento a un file su disco; il contenuto viene letto solo durante la conversione
    pub async fn from_path(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let metadata = tokio::fs::metadata(path).await.map_err(AppError::Read)?;

        let name = path
            .file_name()
            .and_then(|n| n.to_str())
            .unwrap_or("image")
            .to_string();

        let guessed = get_mime_type(&name);
        let content_type = (guessed != "application/octet-stream").then_some(guessed);

        Ok(Self {
            name,
            size: metadata.len(),
            content_type,
            content: FileContent::Path(path.to_path_buf()),
        })
    }

    pub async fn read(&self) -> Result<Bytes> {
        match &self.content {
            FileContent::Memory(data) => Ok(data.clone()),
            FileContent::Path(path) => tokio::fs::read(path)
                .await
                .map(Bytes::from)
                .map_err(AppError::Read),
        }
    }
}
