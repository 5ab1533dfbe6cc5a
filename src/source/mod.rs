//! Data acquisition interfaces.
//!
//! Sources are the only fallible, IO-bound part of the pipeline. They run once,
//! before a [`crate::pipeline::DashboardSession`] is built; a failure here is
//! fatal for the session and the refresh pipeline never sees partial data.

use crate::data::RawTable;
use crate::errors::PipelineError;
use crate::geo::FeatureCollection;
use crate::types::SourceId;

/// Source implementation modules.
pub mod sources;

pub use sources::csv_source::{CsvFileSource, CsvTextSource};
pub use sources::geojson_source::{GeoJsonFileSource, GeoJsonTextSource};

/// Supplier of the parsed tabular dataset (rows plus header list).
pub trait TabularSource: Send + Sync {
    /// Stable source identifier used in diagnostics and errors.
    fn id(&self) -> &str;
    /// Load and parse the whole table.
    fn load(&self) -> Result<RawTable, PipelineError>;
}

/// Supplier of the geographic boundary dataset.
pub trait GeographicSource: Send + Sync {
    /// Stable source identifier used in diagnostics and errors.
    fn id(&self) -> &str;
    /// Load and parse the whole feature collection.
    fn load(&self) -> Result<FeatureCollection, PipelineError>;
}

/// Tabular source backed by an already-parsed table.
#[derive(Clone, Debug)]
pub struct InMemoryTable {
    id: SourceId,
    table: RawTable,
}

impl InMemoryTable {
    /// In-memory table source.
    pub fn new(id: impl Into<SourceId>, table: RawTable) -> Self {
        Self {
            id: id.into(),
            table,
        }
    }
}

impl TabularSource for InMemoryTable {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> Result<RawTable, PipelineError> {
        Ok(self.table.clone())
    }
}

/// Geographic source backed by an already-parsed collection.
#[derive(Clone, Debug)]
pub struct InMemoryGeography {
    id: SourceId,
    features: FeatureCollection,
}

impl InMemoryGeography {
    /// In-memory geography source.
    pub fn new(id: impl Into<SourceId>, features: FeatureCollection) -> Self {
        Self {
            id: id.into(),
            features,
        }
    }
}

impl GeographicSource for InMemoryGeography {
    fn id(&self) -> &str {
        &self.id
    }

    fn load(&self) -> Result<FeatureCollection, PipelineError> {
        Ok(self.features.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DashboardConfig;
    use crate::data::RawRecord;
    use crate::pipeline::DashboardSession;

    #[test]
    fn in_memory_sources_build_a_session() {
        let table = RawTable::new(
            vec!["date".to_string(), "state".to_string(), "cases".to_string()],
            vec![RawRecord::from_pairs([
                ("date", "2021-01-08"),
                ("state", "Texas"),
                ("cases", "12"),
            ])],
        );
        let features = FeatureCollection::from_json_str(
            "states",
            r#"{"type": "FeatureCollection", "features": []}"#,
        )
        .unwrap();
        let tabular = InMemoryTable::new("covid", table);
        let geographic = InMemoryGeography::new("states", features);
        assert_eq!(tabular.id(), "covid");
        assert_eq!(geographic.id(), "states");

        let session =
            DashboardSession::from_sources(&tabular, &geographic, DashboardConfig::default())
                .unwrap();
        assert_eq!(session.records().len(), 1);
        assert_eq!(session.records()[0].metric("cases"), 12.0);
        assert!(session.geography().is_empty());
    }
}
