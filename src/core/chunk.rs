use serde::{Deserialize, Serialize};

use crate::core::timebase::{Tick, TrackId};

pub const CHUNK_ID_MARKER: &str = "-chunk-";

/// One contiguous run of an entity between two portal traversals.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub id: String,
    pub track_id: TrackId,
    pub tick: Tick,
    pub duration: Tick,
    /// Ticks of the source entity consumed before this chunk starts.
    pub offset: Tick,
}

impl Chunk {
    pub fn end_offset(&self) -> Tick {
        self.offset.saturating_add(self.duration)
    }

    pub fn original_id(&self) -> &str {
        original_id_of(&self.id)
    }
}

pub fn chunk_id(base_id: &str, ordinal: usize) -> String {
    format!("{base_id}{CHUNK_ID_MARKER}{ordinal}")
}

/// Strips the trailing `-chunk-<n>` suffix. Ids without one come back as-is.
///
/// Only the last marker is removed, so a source id that itself contains
/// `-chunk-` still survives a chunking pass.
pub fn original_id_of(chunk_id: &str) -> &str {
    match chunk_id.rfind(CHUNK_ID_MARKER) {
        Some(at) => &chunk_id[..at],
        None => chunk_id,
    }
}

/// Collects chunks for one entity, numbering them in emission order.
#[derive(Debug)]
pub struct ChunkEmitter<'a> {
    base_id: &'a str,
    base_offset: Tick,
    chunks: Vec<Chunk>,
}

impl<'a> ChunkEmitter<'a> {
    pub fn new(base_id: &'a str, base_offset: Tick) -> Self {
        Self {
            base_id,
            base_offset,
            chunks: Vec::new(),
        }
    }

    /// Closes a run of `duration` ticks that began after `consumed_before`
    /// ticks of the entity. Empty runs are dropped.
    pub fn emit(&mut self, track_id: &str, tick: Tick, duration: Tick, consumed_before: Tick) {
        if duration == 0 {
            return;
        }
        let ordinal = self.chunks.len() + 1;
        self.chunks.push(Chunk {
            id: chunk_id(self.base_id, ordinal),
            track_id: track_id.to_string(),
            tick,
            duration,
            offset: self.base_offset.saturating_add(consumed_before),
        });
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn finish(self) -> Vec<Chunk> {
        self.chunks
    }
}
