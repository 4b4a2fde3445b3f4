use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::warn;

use crate::core::timebase::{Tick, TrackId};

/// Directed edge that moves anything reaching `(track_id, tick)` to
/// `(portaled_track_id, portaled_tick)`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Portal {
    pub id: String,
    pub track_id: TrackId,
    pub tick: Tick,
    pub portaled_track_id: TrackId,
    pub portaled_tick: Tick,
}

impl Portal {
    pub fn new(
        id: impl Into<String>,
        track_id: impl Into<TrackId>,
        tick: Tick,
        portaled_track_id: impl Into<TrackId>,
        portaled_tick: Tick,
    ) -> Self {
        Self {
            id: id.into(),
            track_id: track_id.into(),
            tick,
            portaled_track_id: portaled_track_id.into(),
            portaled_tick,
        }
    }

    pub fn is_source(&self, track_id: &str, tick: Tick) -> bool {
        self.tick == tick && self.track_id == track_id
    }
}

/// Portal as it arrives from outside (scene files, editors). Nothing here
/// is trusted until it passes `Portal::try_from`.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PortalRecord {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub track_id: Option<String>,
    #[serde(default)]
    pub tick: Option<i64>,
    #[serde(default)]
    pub portaled_track_id: Option<String>,
    #[serde(default)]
    pub portaled_tick: Option<i64>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum PortalError {
    #[error("portal `{portal}` is missing `{field}`")]
    MissingField { portal: String, field: &'static str },
    #[error("portal `{portal}` has an empty `{field}`")]
    EmptyField { portal: String, field: &'static str },
    #[error("portal `{portal}` has negative `{field}` ({value})")]
    NegativeTick {
        portal: String,
        field: &'static str,
        value: i64,
    },
    #[error("portals `{first}` and `{second}` share the source ({track_id}, {tick})")]
    DuplicateSource {
        first: String,
        second: String,
        track_id: TrackId,
        tick: Tick,
    },
}

impl TryFrom<PortalRecord> for Portal {
    type Error = PortalError;

    fn try_from(record: PortalRecord) -> Result<Self, Self::Error> {
        let id = match record.id {
            Some(id) if !id.trim().is_empty() => id,
            Some(_) => {
                return Err(PortalError::EmptyField {
                    portal: "<unnamed>".to_string(),
                    field: "id",
                })
            }
            None => {
                return Err(PortalError::MissingField {
                    portal: "<unnamed>".to_string(),
                    field: "id",
                })
            }
        };
        let track_id = required_track(&id, "trackId", record.track_id)?;
        let tick = required_tick(&id, "tick", record.tick)?;
        let portaled_track_id = required_track(&id, "portaledTrackId", record.portaled_track_id)?;
        let portaled_tick = required_tick(&id, "portaledTick", record.portaled_tick)?;
        Ok(Portal {
            id,
            track_id,
            tick,
            portaled_track_id,
            portaled_tick,
        })
    }
}

impl From<&Portal> for PortalRecord {
    fn from(portal: &Portal) -> Self {
        Self {
            id: Some(portal.id.clone()),
            track_id: Some(portal.track_id.clone()),
            tick: Some(portal.tick.min(i64::MAX as Tick) as i64),
            portaled_track_id: Some(portal.portaled_track_id.clone()),
            portaled_tick: Some(portal.portaled_tick.min(i64::MAX as Tick) as i64),
        }
    }
}

fn required_track(
    portal: &str,
    field: &'static str,
    value: Option<String>,
) -> Result<TrackId, PortalError> {
    match value {
        Some(track) if !track.trim().is_empty() => Ok(track),
        Some(_) => Err(PortalError::EmptyField {
            portal: portal.to_string(),
            field,
        }),
        None => Err(PortalError::MissingField {
            portal: portal.to_string(),
            field,
        }),
    }
}

fn required_tick(
    portal: &str,
    field: &'static str,
    value: Option<i64>,
) -> Result<Tick, PortalError> {
    match value {
        Some(tick) if tick >= 0 => Ok(tick as Tick),
        Some(tick) => Err(PortalError::NegativeTick {
            portal: portal.to_string(),
            field,
            value: tick,
        }),
        None => Err(PortalError::MissingField {
            portal: portal.to_string(),
            field,
        }),
    }
}

/// Validates a batch of boundary records, stopping at the first bad one.
pub fn validate_records(
    records: impl IntoIterator<Item = PortalRecord>,
) -> Result<Vec<Portal>, PortalError> {
    records.into_iter().map(Portal::try_from).collect()
}

/// First portal in iteration order whose source is `(track_id, tick)`.
pub fn find_portal_at<'a>(
    portals: &'a [Portal],
    track_id: &str,
    tick: Tick,
) -> Option<&'a Portal> {
    portals.iter().find(|portal| portal.is_source(track_id, tick))
}

/// Source-key lookup consulted by the walker on every tick.
pub trait PortalLookup {
    fn portal_at(&self, track_id: &str, tick: Tick) -> Option<&Portal>;
}

impl PortalLookup for [Portal] {
    fn portal_at(&self, track_id: &str, tick: Tick) -> Option<&Portal> {
        find_portal_at(self, track_id, tick)
    }
}

impl PortalLookup for Vec<Portal> {
    fn portal_at(&self, track_id: &str, tick: Tick) -> Option<&Portal> {
        find_portal_at(self, track_id, tick)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DuplicatePolicy {
    /// Earliest declared portal shadows later ones with the same source.
    #[default]
    FirstWins,
    /// Any shared source is an ingestion error.
    Reject,
}

/// A later portal hidden behind an earlier one with the same source key.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ShadowedPortal {
    pub kept: String,
    pub shadowed: String,
    pub track_id: TrackId,
    pub tick: Tick,
}

pub fn duplicate_sources(portals: &[Portal]) -> Vec<ShadowedPortal> {
    let mut seen: HashMap<(&str, Tick), &str> = HashMap::with_capacity(portals.len());
    let mut shadowed = Vec::new();
    for portal in portals {
        let key = (portal.track_id.as_str(), portal.tick);
        if let Some(kept) = seen.get(&key).copied() {
            shadowed.push(ShadowedPortal {
                kept: kept.to_string(),
                shadowed: portal.id.clone(),
                track_id: portal.track_id.clone(),
                tick: portal.tick,
            });
        } else {
            seen.insert(key, portal.id.as_str());
        }
    }
    shadowed
}

/// Portals keyed by source track, then source tick.
#[derive(Clone, Debug, Default)]
pub struct PortalIndex {
    by_track: HashMap<TrackId, HashMap<Tick, Portal>>,
    len: usize,
}

impl PortalIndex {
    pub fn build(portals: &[Portal], policy: DuplicatePolicy) -> Result<Self, PortalError> {
        let mut index = Self::default();
        for portal in portals {
            let slots = index.by_track.entry(portal.track_id.clone()).or_default();
            if let Some(kept) = slots.get(&portal.tick) {
                match policy {
                    DuplicatePolicy::Reject => {
                        return Err(PortalError::DuplicateSource {
                            first: kept.id.clone(),
                            second: portal.id.clone(),
                            track_id: portal.track_id.clone(),
                            tick: portal.tick,
                        });
                    }
                    DuplicatePolicy::FirstWins => {
                        warn!(
                            kept = %kept.id,
                            shadowed = %portal.id,
                            track = %portal.track_id,
                            tick = portal.tick,
                            "duplicate portal source; keeping the first"
                        );
                        continue;
                    }
                }
            }
            slots.insert(portal.tick, portal.clone());
            index.len += 1;
        }
        Ok(index)
    }

    /// Number of reachable portals (shadowed duplicates excluded).
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}

impl PortalLookup for PortalIndex {
    fn portal_at(&self, track_id: &str, tick: Tick) -> Option<&Portal> {
        self.by_track.get(track_id)?.get(&tick)
    }
}
