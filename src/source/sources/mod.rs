/// CSV-backed tabular sources.
pub mod csv_source;
/// GeoJSON-backed geographic sources.
pub mod geojson_source;
