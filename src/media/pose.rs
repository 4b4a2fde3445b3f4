use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::chunk::Chunk;
use crate::core::portal::PortalLookup;
use crate::core::timebase::{Span, Tick, TrackId};
use crate::core::walker::Origin;
use crate::media::Routable;

/// Parameter snapshot held on a track. Without a duration it lasts until
/// the next pose and is never split.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pose {
    pub id: String,
    pub track_id: TrackId,
    pub tick: Tick,
    #[serde(default)]
    pub duration: Span,
    #[serde(default)]
    pub vector: BTreeMap<String, f64>,
}

impl Pose {
    pub fn new(id: impl Into<String>, track_id: impl Into<TrackId>, tick: Tick) -> Self {
        Self {
            id: id.into(),
            track_id: track_id.into(),
            tick,
            duration: Span::Unbounded,
            vector: BTreeMap::new(),
        }
    }

    pub fn with_duration(mut self, duration: Span) -> Self {
        self.duration = duration;
        self
    }

    pub fn with_value(mut self, key: impl Into<String>, value: f64) -> Self {
        self.vector.insert(key.into(), value);
        self
    }

    pub fn chunk<L>(&self, portals: &L) -> Vec<Pose>
    where
        L: PortalLookup + ?Sized,
    {
        super::chunk_one(self, self.duration, portals)
    }
}

impl Routable for Pose {
    fn origin(&self) -> Origin<'_> {
        Origin {
            id: &self.id,
            track_id: &self.track_id,
            tick: self.tick,
            offset: 0,
        }
    }

    fn rewrap(&self, chunk: &Chunk) -> Self {
        Self {
            id: chunk.id.clone(),
            track_id: chunk.track_id.clone(),
            tick: chunk.tick,
            duration: Span::Finite(chunk.duration),
            vector: self.vector.clone(),
        }
    }

    fn unrouted(&self) -> Vec<Self> {
        vec![self.clone()]
    }
}
