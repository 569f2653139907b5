use std::sync::Arc;

use sha2::{Digest, Sha256};

use crate::derive::derive_all;
use crate::error::IngestError;
use crate::ingest::{self, SourceFormat};
use crate::models::DerivedRequest;

/// Identity of one ingest pass: the file content, how it is decoded, and where its header sits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContentKey {
    digest: String,
    format: SourceFormat,
    header_row: usize,
}

impl ContentKey {
    pub fn new(bytes: &[u8], format: SourceFormat, header_row: usize) -> Self {
        Self {
            digest: hex::encode(Sha256::digest(bytes)),
            format,
            header_row,
        }
    }

    pub fn digest(&self) -> &str {
        &self.digest
    }
}

/// Single-slot memo of the last derived table. A new key replaces the slot.
#[derive(Debug, Default)]
pub struct TransformCache {
    slot: Option<(ContentKey, Arc<Vec<DerivedRequest>>)>,
    hits: u64,
    misses: u64,
}

impl TransformCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get_or_load(
        &mut self,
        bytes: &[u8],
        format: SourceFormat,
        header_row: usize,
    ) -> Result<Arc<Vec<DerivedRequest>>, IngestError> {
        let key = ContentKey::new(bytes, format, header_row);

        if let Some((cached_key, rows)) = &self.slot {
            if *cached_key == key {
                self.hits += 1;
                tracing::debug!(digest = key.digest(), "transform cache hit");
                return Ok(Arc::clone(rows));
            }
        }

        self.misses += 1;
        tracing::debug!(digest = key.digest(), "transform cache miss");
        // a failed load leaves nothing cached
        self.slot = None;
        let rows = Arc::new(derive_all(ingest::load_bytes(bytes, format, header_row)?));
        self.slot = Some((key, Arc::clone(&rows)));
        Ok(rows)
    }

    #[cfg(test)]
    pub fn is_cached(&self, bytes: &[u8], format: SourceFormat, header_row: usize) -> bool {
        let key = ContentKey::new(bytes, format, header_row);
        matches!(&self.slot, Some((cached, _)) if *cached == key)
    }

    pub fn hits(&self) -> u64 {
        self.hits
    }

    pub fn misses(&self) -> u64 {
        self.misses
    }
}
