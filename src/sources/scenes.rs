use std::path::PathBuf;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Result, SourceError};
use crate::sources::SceneSource;
use crate::visual::SceneBoundary;

/// Scene source backed by a JSON fixture file
///
/// The fixture is an array of `{start_seconds, end_seconds, score?}`
/// objects, the score being the detector's content-change reading at the
/// scene's opening cut. Boundaries scored below the requested threshold
/// are dropped; unscored boundaries always pass. An absent fixture file
/// simply yields no scenes, which zeroes the scene features downstream.
pub struct FixtureSceneSource {
    path: Option<PathBuf>,
}

impl FixtureSceneSource {
    /// Create a source reading from the given fixture file.
    pub fn new<P: Into<PathBuf>>(path: P) -> Self {
        Self {
            path: Some(path.into()),
        }
    }

    /// Create a source with no fixture at all; always yields no scenes.
    pub fn empty() -> Self {
        Self { path: None }
    }
}

#[derive(Debug, Deserialize)]
struct FixtureScene {
    start_seconds: f64,
    end_seconds: f64,
    #[serde(default)]
    score: Option<f64>,
}

#[async_trait]
impl SceneSource for FixtureSceneSource {
    async fn scenes(&self, threshold: f64) -> Result<Vec<SceneBoundary>> {
        let path = match &self.path {
            Some(path) => path,
            None => return Ok(Vec::new()),
        };

        if !path.is_file() {
            debug!("No scene fixture at {:?}, reporting no scenes", path);
            return Ok(Vec::new());
        }

        let content = std::fs::read_to_string(path)?;
        let entries: Vec<FixtureScene> =
            serde_json::from_str(&content).map_err(|e| SourceError::MalformedFixture {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        let mut boundaries: Vec<SceneBoundary> = entries
            .into_iter()
            .filter(|entry| entry.score.map_or(true, |score| score >= threshold))
            .map(|entry| SceneBoundary::new(entry.start_seconds, entry.end_seconds))
            .collect();
        boundaries.sort_by(|a, b| a.start_seconds.total_cmp(&b.start_seconds));

        debug!("Loaded {} scene boundaries from {:?}", boundaries.len(), path);
        Ok(boundaries)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn threshold_filters_scored_boundaries() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenes.json");
        std::fs::write(
            &path,
            r#"[
                {"start_seconds": 2.0, "end_seconds": 5.0, "score": 45.0},
                {"start_seconds": 5.0, "end_seconds": 9.0, "score": 10.0},
                {"start_seconds": 0.0, "end_seconds": 2.0}
            ]"#,
        )
        .unwrap();

        let scenes = FixtureSceneSource::new(&path).scenes(30.0).await.unwrap();
        assert_eq!(scenes.len(), 2);
        // The surviving boundaries come back ordered by start time.
        assert_eq!(scenes[0].start_seconds, 0.0);
        assert_eq!(scenes[1].start_seconds, 2.0);
    }

    #[tokio::test]
    async fn absent_fixture_yields_no_scenes() {
        let scenes = FixtureSceneSource::new("does/not/exist.json")
            .scenes(30.0)
            .await
            .unwrap();
        assert!(scenes.is_empty());

        let scenes = FixtureSceneSource::empty().scenes(30.0).await.unwrap();
        assert!(scenes.is_empty());
    }

    #[tokio::test]
    async fn malformed_fixture_is_a_recoverable_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("scenes.json");
        std::fs::write(&path, "not json").unwrap();

        let err = FixtureSceneSource::new(&path)
            .scenes(30.0)
            .await
            .unwrap_err();
        assert!(err.is_recoverable());
        assert!(matches!(
            err,
            crate::error::SignalError::Source(SourceError::MalformedFixture { .. })
        ));
    }
}
