use std::fs;
use std::path::PathBuf;

use tracing::info;

use crate::errors::PipelineError;
use crate::geo::FeatureCollection;
use crate::source::GeographicSource;
use crate::types::SourceId;

/// GeoJSON `FeatureCollection` file on disk.
#[derive(Clone, Debug)]
pub struct GeoJsonFileSource {
    source_id: SourceId,
    path: PathBuf,
}

impl GeoJsonFileSource {
    /// Source reading the GeoJSON file at `path`.
    pub fn new(source_id: impl Into<SourceId>, path: impl Into<PathBuf>) -> Self {
        Self {
            source_id: source_id.into(),
            path: path.into(),
        }
    }

    /// File the collection is read from.
    pub fn path(&self) -> &PathBuf {
        &self.path
    }
}

impl GeographicSource for GeoJsonFileSource {
    fn id(&self) -> &str {
        &self.source_id
    }

    fn load(&self) -> Result<FeatureCollection, PipelineError> {
        let text =
            fs::read_to_string(&self.path).map_err(|err| PipelineError::SourceUnavailable {
                source_id: self.source_id.clone(),
                reason: format!("failed to read {}: {err}", self.path.display()),
            })?;
        let collection = FeatureCollection::from_json_str(&self.source_id, &text)?;
        info!(
            "[regionpulse:geojson] loaded {} features from {}",
            collection.len(),
            self.path.display()
        );
        Ok(collection)
    }
}

/// GeoJSON document held in memory.
#[derive(Clone, Debug)]
pub struct GeoJsonTextSource {
    source_id: SourceId,
    text: String,
}

impl GeoJsonTextSource {
    /// Source over GeoJSON text already in memory.
    pub fn new(source_id: impl Into<SourceId>, text: impl Into<String>) -> Self {
        Self {
            source_id: source_id.into(),
            text: text.into(),
        }
    }
}

impl GeographicSource for GeoJsonTextSource {
    fn id(&self) -> &str {
        &self.source_id
    }

    fn load(&self) -> Result<FeatureCollection, PipelineError> {
        FeatureCollection::from_json_str(&self.source_id, &self.text)
    }
}
