/// Constants used by column resolution and record normalization.
pub mod normalize {
    /// Default date column for the time series variant.
    pub const DATE_COLUMN: &str = "date";
    /// Default free-form timestamp column for the incident log variant.
    pub const TIMESTAMP_COLUMN: &str = "DATE_TIME";
    /// Lowercase tokens a header must all contain to be picked as a timestamp column.
    pub const TIMESTAMP_HEURISTIC_TOKENS: [&str; 2] = ["date", "time"];
    /// Default location column for the time series variant.
    pub const STATE_COLUMN: &str = "state";
    /// Default location column for the incident log variant.
    pub const BEAT_COLUMN: &str = "beat";
    /// Default category column for the incident log variant.
    pub const RACE_COLUMN: &str = "race";
    /// Metric column holding cumulative case counts.
    pub const CASES_METRIC: &str = "cases";
    /// Metric column holding cumulative death counts.
    pub const DEATHS_METRIC: &str = "deaths";
}

/// Constants used by the aggregation engine.
pub mod aggregate {
    /// Number of date buckets between the latest bucket and its delta baseline.
    pub const DEFAULT_LOOKBACK_WINDOW: usize = 7;
}

/// Constants used by ranking and KPI output.
pub mod ranking {
    /// Number of bars shown in the ranked chart.
    pub const CHART_TOP_K: usize = 10;
    /// Number of entries shown in the textual leaderboard.
    pub const LEADERBOARD_TOP_K: usize = 5;
    /// Placeholder rendered when there is nothing to rank.
    pub const NO_DATA_LABEL: &str = "-";
}

/// Constants used by choropleth scale derivation.
pub mod scale {
    /// Fractions of the aggregate maximum used as scale break points.
    pub const BREAK_FRACTIONS: [f64; 5] = [0.0, 0.10, 0.30, 0.60, 1.00];
    /// Sequential light-to-dark palette paired with `BREAK_FRACTIONS`.
    pub const DEFAULT_PALETTE: [&str; 5] = ["#f7fbff", "#c6dbef", "#6baed6", "#2171b5", "#08306b"];
    /// Lower bound applied to the aggregate maximum before scaling.
    pub const MIN_SCALE_MAX: f64 = 1.0;
}

/// Constants used by the geographic join.
pub mod geo {
    /// Feature property holding state names in the US states boundary file.
    pub const STATE_NAME_PROPERTY: &str = "name";
    /// Feature property holding police beat codes in the beats boundary file.
    pub const BEAT_PROPERTY: &str = "beat";
    /// Derived property attached for delta aggregates.
    pub const VALUE_PROPERTY: &str = "value";
    /// Derived property attached for count aggregates.
    pub const COUNT_PROPERTY: &str = "count";
}

/// Labels used by presentation payloads.
pub mod labels {
    /// Suffix appended to the lookback window for the time series chart label (`7-day new`).
    pub const DELTA_SERIES_SUFFIX: &str = "-day new";
    /// Series label for the incident log chart.
    pub const COUNT_SERIES: &str = "Incidents";
    /// Label used for an unrestricted category filter.
    pub const ALL_CATEGORIES: &str = "all categories";
    /// Label used for an unrestricted year filter.
    pub const ALL_YEARS: &str = "all years";
    /// Separator between filter description parts.
    pub const FILTER_SEPARATOR: &str = " · ";
}

/// Control values that select "no category restriction".
pub const WILDCARD_CONTROL_VALUES: [&str; 3] = ["", "all", "*"];
