#![doc = include_str!("../README.md")]
#![warn(missing_docs)]

/// Counting, summing and windowed growth over canonical records.
pub mod aggregate;
/// Column mappings, joins, palettes and aggregation plans.
pub mod config;
/// Centralized constants used across normalization, ranking, scale and labels.
pub mod constants;
/// Raw and canonical record types.
pub mod data;
/// Date parsing for record fields and filter bounds.
pub mod dates;
/// Tolerant category, year and date-range filtering.
pub mod filter;
/// Number formatting for summary text.
pub mod format;
/// GeoJSON feature collections and the value join.
pub mod geo;
/// Single-key partitioning of records.
pub mod grouping;
/// Summary statistics over aggregate maps.
pub mod metrics;
/// Column resolution and raw-to-canonical conversion.
pub mod normalize;
/// Session context and refresh orchestration.
pub mod pipeline;
/// Top-K ranking.
pub mod ranking;
/// Command-line report runner shared by the demos.
pub mod report_apps;
/// Choropleth color scales.
pub mod scale;
/// Tabular and geographic data sources.
pub mod source;
/// KPI, chart and map surface contracts.
pub mod surfaces;
/// Shared type aliases.
pub mod types;

mod errors;

pub use aggregate::{AggregateMap, WindowBounds, WindowDelta};
pub use config::{AggregationPlan, ColumnMapping, DashboardConfig, GeoJoin, RankingConfig};
pub use data::{CanonicalRecord, RawRecord, RawTable};
pub use errors::PipelineError;
pub use filter::{CategoryFilter, DateRange, FilterSpec};
pub use geo::{Feature, FeatureCollection};
pub use grouping::GroupField;
pub use normalize::{ColumnResolution, Normalizer};
pub use pipeline::{
    DashboardFrame, DashboardSession, RefreshOrchestrator, RefreshState, compute_frame,
};
pub use ranking::RankedEntry;
pub use scale::{ColorScale, Palette};
pub use source::{
    CsvFileSource, CsvTextSource, GeoJsonFileSource, GeoJsonTextSource, GeographicSource,
    InMemoryGeography, InMemoryTable, TabularSource,
};
pub use surfaces::{
    ChartSeries, ChartSurface, KpiSummary, KpiSurface, MapSurface, MapUpdate, RecordingSurfaces,
    SurfaceSet, Surfaces, TextReportSurfaces,
};
pub use types::{AggregateKey, CategoryId, DateKey, LocationKey, MetricName, SourceId};
