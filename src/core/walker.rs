//! Tick-by-tick simulation that splits an entity at every portal it crosses.
//!
//! The loop is driven by the entity's own duration, never by the portal
//! graph, so cyclic portals can only produce more (shorter) chunks.

use tracing::trace;

use crate::core::chunk::{Chunk, ChunkEmitter};
use crate::core::portal::PortalLookup;
use crate::core::timebase::{Span, Tick};

/// The parts of an entity the walker reads.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Origin<'a> {
    pub id: &'a str,
    pub track_id: &'a str,
    pub tick: Tick,
    pub offset: Tick,
}

/// Where the entity currently sits while the walk proceeds.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Fragment<'a> {
    pub track_id: &'a str,
    pub tick: Tick,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct WalkStats {
    /// Loop iterations; always equals the routed duration.
    pub steps: Tick,
    /// Portal traversals.
    pub jumps: Tick,
}

#[derive(Debug)]
pub struct WalkState<'a> {
    fragment: Fragment<'a>,
    chunk_length: Tick,
    consumed: Tick,
    emitter: ChunkEmitter<'a>,
    stats: WalkStats,
}

impl<'a> WalkState<'a> {
    pub fn new(origin: Origin<'a>) -> Self {
        Self {
            fragment: Fragment {
                track_id: origin.track_id,
                tick: origin.tick,
            },
            chunk_length: 0,
            consumed: 0,
            emitter: ChunkEmitter::new(origin.id, origin.offset),
            stats: WalkStats::default(),
        }
    }

    pub fn fragment(&self) -> Fragment<'a> {
        self.fragment
    }

    pub fn consumed(&self) -> Tick {
        self.consumed
    }

    /// Advances one tick of the entity.
    pub fn step<L>(mut self, portals: &'a L) -> Self
    where
        L: PortalLookup + ?Sized,
    {
        self.stats.steps += 1;
        let here = self.fragment.tick.saturating_add(self.chunk_length);
        match portals.portal_at(self.fragment.track_id, here) {
            None => {
                self.chunk_length += 1;
            }
            Some(portal) => {
                trace!(
                    portal = %portal.id,
                    from_track = self.fragment.track_id,
                    from_tick = here,
                    to_track = %portal.portaled_track_id,
                    to_tick = portal.portaled_tick,
                    "portal traversal"
                );
                self.close_fragment();
                self.fragment = Fragment {
                    track_id: portal.portaled_track_id.as_str(),
                    tick: portal.portaled_tick,
                };
                // The tick that hit the portal already plays at the destination.
                self.chunk_length = 1;
                self.stats.jumps += 1;
            }
        }
        self.consumed += 1;
        self
    }

    fn close_fragment(&mut self) {
        let consumed_before = self.consumed - self.chunk_length;
        self.emitter.emit(
            self.fragment.track_id,
            self.fragment.tick,
            self.chunk_length,
            consumed_before,
        );
    }

    pub fn finish(mut self) -> (Vec<Chunk>, WalkStats) {
        self.close_fragment();
        (self.emitter.finish(), self.stats)
    }
}

/// Splits `origin` into chunks. Returns nothing for zero or unbounded spans.
pub fn chunk<'a, L>(origin: Origin<'a>, span: Span, portals: &'a L) -> Vec<Chunk>
where
    L: PortalLookup + ?Sized,
{
    chunk_with_stats(origin, span, portals).0
}

pub fn chunk_with_stats<'a, L>(
    origin: Origin<'a>,
    span: Span,
    portals: &'a L,
) -> (Vec<Chunk>, WalkStats)
where
    L: PortalLookup + ?Sized,
{
    let Some(duration) = span.routable_ticks() else {
        return (Vec::new(), WalkStats::default());
    };
    (0..duration)
        .fold(WalkState::new(origin), |state, _| state.step(portals))
        .finish()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::portal::Portal;

    fn origin(track: &str, tick: Tick) -> Origin<'_> {
        Origin {
            id: "clip",
            track_id: track,
            tick,
            offset: 0,
        }
    }

    fn shape(chunks: &[Chunk]) -> Vec<(&str, Tick, Tick, Tick)> {
        chunks
            .iter()
            .map(|c| (c.track_id.as_str(), c.tick, c.duration, c.offset))
            .collect()
    }

    #[test]
    fn no_portals_yields_one_chunk() {
        let portals: Vec<Portal> = Vec::new();
        let chunks = chunk(origin("A", 0), Span::Finite(10), &portals);
        assert_eq!(shape(&chunks), vec![("A", 0, 10, 0)]);
        assert_eq!(chunks[0].id, "clip-chunk-1");
    }

    #[test]
    fn zero_and_unbounded_spans_skip_the_walk() {
        let portals = vec![Portal::new("p", "A", 0, "B", 0)];
        let (chunks, stats) = chunk_with_stats(origin("A", 0), Span::Finite(0), &portals);
        assert!(chunks.is_empty());
        assert_eq!(stats, WalkStats::default());
        assert!(chunk(origin("A", 0), Span::Unbounded, &portals).is_empty());
    }

    #[test]
    fn split_at_portal() {
        let portals = vec![Portal::new("p", "A", 5, "B", 10)];
        let chunks = chunk(origin("A", 0), Span::Finite(10), &portals);
        assert_eq!(shape(&chunks), vec![("A", 0, 5, 0), ("B", 10, 5, 5)]);
    }

    #[test]
    fn portal_past_the_end_never_fires() {
        let portals = vec![Portal::new("p", "A", 10, "B", 0)];
        let chunks = chunk(origin("A", 0), Span::Finite(10), &portals);
        assert_eq!(shape(&chunks), vec![("A", 0, 10, 0)]);
    }

    #[test]
    fn portal_on_first_tick_jumps_without_empty_chunk() {
        let portals = vec![Portal::new("p", "A", 3, "B", 40)];
        let (chunks, stats) = chunk_with_stats(origin("A", 3), Span::Finite(4), &portals);
        assert_eq!(shape(&chunks), vec![("B", 40, 4, 0)]);
        assert_eq!(chunks[0].id, "clip-chunk-1");
        assert_eq!(stats.jumps, 1);
    }

    #[test]
    fn self_loop_portal_produces_unit_chunks() {
        let portals = vec![Portal::new("loop", "A", 2, "A", 1)];
        let (chunks, stats) = chunk_with_stats(origin("A", 0), Span::Finite(6), &portals);
        // Every tick after the first jump lands on A:2 again and loops back.
        assert_eq!(
            shape(&chunks),
            vec![
                ("A", 0, 2, 0),
                ("A", 1, 1, 2),
                ("A", 1, 1, 3),
                ("A", 1, 1, 4),
                ("A", 1, 1, 5),
            ]
        );
        assert_eq!(stats.steps, 6);
        assert_eq!(stats.jumps, 4);
    }

    #[test]
    fn entity_offset_threads_through_chunks() {
        let portals = vec![Portal::new("p", "A", 3, "B", 0)];
        let o = Origin {
            id: "clip",
            track_id: "A",
            tick: 0,
            offset: 32,
        };
        let chunks = chunk(o, Span::Finite(5), &portals);
        assert_eq!(shape(&chunks), vec![("A", 0, 3, 32), ("B", 0, 2, 35)]);
    }

    #[test]
    fn step_by_step_state_is_observable() {
        let portals = vec![Portal::new("p", "A", 1, "B", 7)];
        let state = WalkState::new(origin("A", 0));
        let state = state.step(&portals);
        assert_eq!(state.fragment(), Fragment { track_id: "A", tick: 0 });
        let state = state.step(&portals);
        assert_eq!(state.fragment(), Fragment { track_id: "B", tick: 7 });
        assert_eq!(state.consumed(), 2);
    }
}
