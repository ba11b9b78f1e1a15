//! Registro degli handle verso dati immagine (anteprime e output)

use std::collections::HashMap;

use crate::models::{Blob, BlobHandle};

#[derive(Debug, Default)]
pub struct HandleRegistry {
    blobs: HashMap<BlobHandle, Blob>,
}

impl HandleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&mut self, blob: Blob) -> BlobHandle {
        let handle = BlobHandle::new();
        self.blobs.insert(handle, blob);
        handle
    }

    pub fn resolve(&self, handle: BlobHandle) -> Option<&Blob> {
        self.blobs.get(&handle)
    }

    /// Rilascia un handle; rilasciarlo di nuovo non ha effetto
    pub fn release(&mut self, handle: BlobHandle) -> bool {
        self.blobs.remove(&handle).is_some()
    }

    pub fn is_live(&self, handle: BlobHandle) -> bool {
        self.blobs.contains_key(&handle)
    }

    pub fn live_count(&self) -> usize {
        self.blobs.len()
    }

    pub fn release_all(&mut self) -> usize {
        let count = self.blobs.len();
        self.blobs.clear();
        count
    }
}
