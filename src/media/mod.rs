//! Type-specific wrapping around the walker: clips always route, poses only
//! when they have a finite length.

pub mod clip;
pub mod pose;

pub use clip::Clip;
pub use pose::Pose;

use thiserror::Error;
use tracing::debug;

use crate::core::chunk::Chunk;
use crate::core::portal::PortalLookup;
use crate::core::timebase::Span;
use crate::core::walker::{self, Origin};

#[derive(Debug, Error, PartialEq, Eq)]
pub enum MediaError {
    #[error("{entities} entities but {durations} durations")]
    LengthMismatch { entities: usize, durations: usize },
}

/// A timeline entity the walker can split.
pub trait Routable: Clone {
    fn origin(&self) -> Origin<'_>;

    /// Copy of `self` repositioned onto `chunk`.
    fn rewrap(&self, chunk: &Chunk) -> Self;

    /// Result when there is nothing to route (zero or unbounded duration).
    fn unrouted(&self) -> Vec<Self>;
}

pub fn chunk_one<E, L>(entity: &E, span: Span, portals: &L) -> Vec<E>
where
    E: Routable,
    L: PortalLookup + ?Sized,
{
    if span.routable_ticks().is_none() {
        debug!(entity = entity.origin().id, %span, "nothing to route");
        return entity.unrouted();
    }
    let (chunks, stats) = walker::chunk_with_stats(entity.origin(), span, portals);
    debug!(
        entity = entity.origin().id,
        %span,
        chunks = chunks.len(),
        jumps = stats.jumps,
        "routed through portals"
    );
    chunks.iter().map(|chunk| entity.rewrap(chunk)).collect()
}

/// Routes `entities[i]` with `spans[i]`; the output is index aligned.
pub fn chunk_many<E, L>(
    entities: &[E],
    spans: &[Span],
    portals: &L,
) -> Result<Vec<Vec<E>>, MediaError>
where
    E: Routable,
    L: PortalLookup + ?Sized,
{
    if entities.len() != spans.len() {
        return Err(MediaError::LengthMismatch {
            entities: entities.len(),
            durations: spans.len(),
        });
    }
    Ok(entities
        .iter()
        .zip(spans)
        .map(|(entity, span)| chunk_one(entity, *span, portals))
        .collect())
}
