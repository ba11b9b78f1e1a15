use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::FileContent;

/// Riferimento a dati immagine visualizzabili o scaricabili, valido finché non viene rilasciato
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlobHandle(Uuid);

impl BlobHandle {
    pub(crate) fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl std::fmt::Display for BlobHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "blob:{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Blob {
    pub content: FileContent,
    pub content_type: String,
}
