/// Region join key shared by records and geographic features.
/// Examples: `California`, `New York`, `1A2`
pub type LocationKey = String;
/// Category label carried by a record (a race, an incident type, a fixed metric name).
/// Examples: `Black`, `White`, `cases`
pub type CategoryId = String;
/// ISO-8601 calendar date used as a time bucket key.
/// Examples: `2021-01-01`, `2020-03-15`
pub type DateKey = String;
/// Name of a numeric field on a canonical record.
/// Examples: `cases`, `deaths`
pub type MetricName = String;
/// Column header as it appears in the tabular source.
/// Examples: `date`, `Race`, `DATE_TIME`, `Beat`
pub type ColumnName = String;
/// Key of an aggregate map entry (a location or a category).
/// Examples: `Texas`, `Hispanic`
pub type AggregateKey = String;
/// Hex color string used by palettes and paint expressions.
/// Examples: `#f7fbff`, `#08306b`
pub type HexColor = String;
/// Identifier for a tabular or geographic source.
/// Examples: `us-states-covid.csv`, `us-states.geojson`
pub type SourceId = String;
