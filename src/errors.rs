use std::io;

use thiserror::Error;

use crate::types::SourceId;

/// Error type for data acquisition, configuration, and publishing failures.
///
/// Per-record anomalies never surface here; they are recovered with documented
/// defaults inside the normalizer and aggregation engine.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// A source could not be reached or opened.
    #[error("data source '{source_id}' is unavailable: {reason}")]
    SourceUnavailable {
        /// Identifier of the failing source.
        source_id: SourceId,
        /// Underlying failure.
        reason: String,
    },
    /// A source answered with data of the wrong shape.
    #[error("data source '{source_id}' returned inconsistent data: {details}")]
    SourceInconsistent {
        /// Identifier of the failing source.
        source_id: SourceId,
        /// What was wrong with the payload.
        details: String,
    },
    /// Malformed CSV.
    #[error(transparent)]
    Csv(#[from] csv::Error),
    /// Malformed GeoJSON or a serialization failure.
    #[error(transparent)]
    GeoJson(#[from] serde_json::Error),
    /// Filesystem or writer failure.
    #[error(transparent)]
    Io(#[from] io::Error),
    /// Configuration the pipeline cannot render.
    #[error("configuration error: {0}")]
    Configuration(String),
    /// A presentation surface refused an update.
    #[error("{surface} surface rejected update: {reason}")]
    Surface {
        /// Which surface failed (`kpi`, `chart` or `map`).
        surface: &'static str,
        /// Failure reported by the surface.
        reason: String,
    },
}
