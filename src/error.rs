use thiserror::Error;
use uuid::Uuid;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("Formato non supportato: {0}")]
    UnsupportedFormat(String),

    #[error("Impossibile leggere il file: {0}")]
    Read(#[source] std::io::Error),

    #[error("Impossibile decodificare l'immagine: {0}")]
    Decode(String),

    #[error("Impossibile codificare l'immagine: {0}")]
    Encode(String),

    #[error("Nessuna immagine in coda")]
    EmptyQueue,

    #[error("Elemento non trovato: {0}")]
    ItemNotFound(Uuid),

    #[error("Conversione già in corso")]
    ConversionInProgress,

    #[error("Configurazione non valida: {0}")]
    InvalidConfig(String),

    #[error("Errore di I/O: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Errore interno: {0}")]
    Internal(String),
}

impl AppError {
    /// Errori che chiudono un singolo elemento in stato Errored
    pub fn is_conversion_error(&self) -> bool {
        matches!(
            self,
            AppError::Read(_) | AppError::Decode(_) | AppError::Encode(_)
        )
    }
}

pub type Result<T> = std::result::Result<T, AppError>;
