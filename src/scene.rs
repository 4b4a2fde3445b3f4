//! Scene files: a portal set plus the clips and poses to route through it.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::config::RoutingConfig;
use crate::core::portal::{
    duplicate_sources, validate_records, DuplicatePolicy, Portal, PortalError, PortalIndex,
    PortalLookup, PortalRecord,
};
use crate::core::timebase::Span;
use crate::media::{chunk_many, Clip, MediaError, Pose};

#[derive(Debug, Error)]
pub enum SceneError {
    #[error("failed to read scene {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("unsupported scene format `{0}` (expected .toml or .json)")]
    UnsupportedFormat(String),
    #[error("invalid TOML scene: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid JSON scene: {0}")]
    Json(#[from] serde_json::Error),
    #[error(transparent)]
    Portal(#[from] PortalError),
    #[error("{kind} #{index} has an empty id")]
    EmptyEntityId { kind: &'static str, index: usize },
    #[error(transparent)]
    Media(#[from] MediaError),
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Scene {
    #[serde(default)]
    pub portals: Vec<PortalRecord>,
    #[serde(default)]
    pub clips: Vec<Clip>,
    #[serde(default)]
    pub poses: Vec<Pose>,
}

impl Scene {
    pub fn load(path: &Path) -> Result<Self, SceneError> {
        let ext = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        let text = fs::read_to_string(path).map_err(|source| SceneError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        match ext.as_str() {
            "toml" => Self::from_toml_str(&text),
            "json" => Self::from_json_str(&text),
            other => Err(SceneError::UnsupportedFormat(other.to_string())),
        }
    }

    pub fn from_toml_str(text: &str) -> Result<Self, SceneError> {
        Ok(toml::from_str(text)?)
    }

    pub fn from_json_str(text: &str) -> Result<Self, SceneError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Boundary check: nothing malformed reaches the walker.
    pub fn validate(self) -> Result<ValidatedScene, SceneError> {
        let portals = validate_records(self.portals)?;
        if let Some(index) = self.clips.iter().position(|c| c.id.trim().is_empty()) {
            return Err(SceneError::EmptyEntityId { kind: "clip", index });
        }
        if let Some(index) = self.poses.iter().position(|p| p.id.trim().is_empty()) {
            return Err(SceneError::EmptyEntityId { kind: "pose", index });
        }
        debug!(
            portals = portals.len(),
            clips = self.clips.len(),
            poses = self.poses.len(),
            "scene validated"
        );
        Ok(ValidatedScene {
            portals,
            clips: self.clips,
            poses: self.poses,
        })
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedScene {
    pub portals: Vec<Portal>,
    pub clips: Vec<Clip>,
    pub poses: Vec<Pose>,
}

impl ValidatedScene {
    pub fn route(&self, routing: &RoutingConfig) -> Result<SceneChunks, SceneError> {
        let routed = if routing.index_portals {
            let index = PortalIndex::build(&self.portals, routing.duplicate_policy)?;
            self.route_with(&index)?
        } else {
            if routing.duplicate_policy == DuplicatePolicy::Reject {
                if let Some(dup) = duplicate_sources(&self.portals).into_iter().next() {
                    return Err(PortalError::DuplicateSource {
                        first: dup.kept,
                        second: dup.shadowed,
                        track_id: dup.track_id,
                        tick: dup.tick,
                    }
                    .into());
                }
            }
            self.route_with(self.portals.as_slice())?
        };
        info!(
            clips = self.clips.len(),
            poses = self.poses.len(),
            chunks = routed.chunk_count(),
            indexed = routing.index_portals,
            "scene routed"
        );
        Ok(routed)
    }

    fn route_with<L>(&self, portals: &L) -> Result<SceneChunks, SceneError>
    where
        L: PortalLookup + ?Sized,
    {
        let clip_spans: Vec<Span> = self.clips.iter().map(Clip::span).collect();
        let pose_spans: Vec<Span> = self.poses.iter().map(|pose| pose.duration).collect();
        Ok(SceneChunks {
            clips: chunk_many(&self.clips, &clip_spans, portals)?,
            poses: chunk_many(&self.poses, &pose_spans, portals)?,
        })
    }
}

/// Routed output, index aligned with the scene's `clips` and `poses`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SceneChunks {
    pub clips: Vec<Vec<Clip>>,
    pub poses: Vec<Vec<Pose>>,
}

impl SceneChunks {
    pub fn chunk_count(&self) -> usize {
        let clips: usize = self.clips.iter().map(Vec::len).sum();
        let poses: usize = self.poses.iter().map(Vec::len).sum();
        clips + poses
    }
}
