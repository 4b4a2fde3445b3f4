use serde::{Deserialize, Serialize};

use crate::core::chunk::Chunk;
use crate::core::portal::PortalLookup;
use crate::core::timebase::{deserialize_clip_ticks, Span, Tick, TrackId};
use crate::core::walker::Origin;
use crate::media::Routable;

/// A placed reference to pattern content.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Clip {
    pub id: String,
    pub track_id: TrackId,
    pub tick: Tick,
    /// Position inside the referenced pattern where playback starts.
    #[serde(default)]
    pub offset: Tick,
    /// Explicit length; when absent the caller derives one from the pattern.
    /// Negative lengths read as zero.
    #[serde(
        default,
        deserialize_with = "deserialize_clip_ticks",
        skip_serializing_if = "Option::is_none"
    )]
    pub duration: Option<Tick>,
    pub pattern_id: String,
}

impl Clip {
    pub fn new(
        id: impl Into<String>,
        track_id: impl Into<TrackId>,
        tick: Tick,
        pattern_id: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            track_id: track_id.into(),
            tick,
            offset: 0,
            duration: None,
            pattern_id: pattern_id.into(),
        }
    }

    pub fn with_offset(mut self, offset: Tick) -> Self {
        self.offset = offset;
        self
    }

    pub fn with_duration(mut self, duration: Tick) -> Self {
        self.duration = Some(duration);
        self
    }

    /// The clip's own duration, treating a missing one as nothing to play.
    pub fn span(&self) -> Span {
        Span::Finite(self.duration.unwrap_or(0))
    }

    pub fn chunk<L>(&self, portals: &L) -> Vec<Clip>
    where
        L: PortalLookup + ?Sized,
    {
        super::chunk_one(self, self.span(), portals)
    }
}

impl Routable for Clip {
    fn origin(&self) -> Origin<'_> {
        Origin {
            id: &self.id,
            track_id: &self.track_id,
            tick: self.tick,
            offset: self.offset,
        }
    }

    fn rewrap(&self, chunk: &Chunk) -> Self {
        Self {
            id: chunk.id.clone(),
            track_id: chunk.track_id.clone(),
            tick: chunk.tick,
            offset: chunk.offset,
            duration: Some(chunk.duration),
            pattern_id: self.pattern_id.clone(),
        }
    }

    fn unrouted(&self) -> Vec<Self> {
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::chunk::original_id_of;
    use crate::core::portal::Portal;

    #[test]
    fn chunks_keep_pattern_and_thread_offset() {
        let portals = vec![Portal::new("p", "A", 6, "B", 0)];
        let clip = Clip::new("clip", "A", 4, "bassline")
            .with_offset(8)
            .with_duration(6);
        let chunks = clip.chunk(&portals);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].offset, 8);
        assert_eq!(chunks[0].duration, Some(2));
        assert_eq!(chunks[1].track_id, "B");
        assert_eq!(chunks[1].offset, 10);
        assert_eq!(chunks[1].duration, Some(4));
        for chunk in &chunks {
            assert_eq!(chunk.pattern_id, "bassline");
            assert_eq!(original_id_of(&chunk.id), "clip");
        }
    }

    #[test]
    fn clip_without_duration_yields_nothing() {
        let portals: Vec<Portal> = Vec::new();
        let clip = Clip::new("clip", "A", 0, "pat");
        assert!(clip.chunk(&portals).is_empty());
        assert!(super::super::chunk_one(&clip, Span::Unbounded, &portals).is_empty());
    }

    #[test]
    fn clip_reads_camel_case_fields() {
        let json = r#"{"id":"c","trackId":"A","tick":3,"patternId":"pat","duration":4}"#;
        let clip: Clip = serde_json::from_str(json).unwrap();
        assert_eq!(clip.offset, 0);
        assert_eq!(clip.span(), Span::Finite(4));
    }

    #[test]
    fn clip_duration_accepts_loose_numbers() {
        let negative: Clip = serde_json::from_str(
            r#"{"id":"c","trackId":"A","tick":0,"duration":-4,"patternId":"p"}"#,
        )
        .unwrap();
        assert_eq!(negative.duration, Some(0));
        assert_eq!(negative.span().routable_ticks(), None);

        let float: Clip = serde_json::from_str(
            r#"{"id":"c","trackId":"A","tick":0,"duration":6.0,"patternId":"p"}"#,
        )
        .unwrap();
        assert_eq!(float.duration, Some(6));
    }
}
