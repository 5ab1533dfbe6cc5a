use crate::constants::aggregate::DEFAULT_LOOKBACK_WINDOW;
use crate::constants::geo::{BEAT_PROPERTY, COUNT_PROPERTY, STATE_NAME_PROPERTY, VALUE_PROPERTY};
use crate::constants::normalize::{
    BEAT_COLUMN, CASES_METRIC, DATE_COLUMN, DEATHS_METRIC, RACE_COLUMN, STATE_COLUMN,
    TIMESTAMP_COLUMN, TIMESTAMP_HEURISTIC_TOKENS,
};
use crate::constants::ranking::{CHART_TOP_K, LEADERBOARD_TOP_K};
use crate::errors::PipelineError;
use crate::grouping::GroupField;
use crate::scale::Palette;
use crate::types::{ColumnName, MetricName};

/// Expected column names for the tabular source.
///
/// Each name is resolved against the real headers with the fallback chain in
/// [`crate::normalize::resolve_column`]; a `None` column is never resolved.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ColumnMapping {
    /// ISO date column used as the time bucket key.
    pub date: Option<ColumnName>,
    /// Lowercase tokens a header must all contain to stand in for a missing date column.
    pub date_tokens: Vec<String>,
    /// Free-form timestamp column used to derive the record year.
    pub timestamp: Option<ColumnName>,
    /// Lowercase tokens a header must all contain to stand in for a missing timestamp column.
    pub timestamp_tokens: Vec<String>,
    /// Category column.
    pub category: Option<ColumnName>,
    /// Location (join key) column.
    pub location: Option<ColumnName>,
    /// Numeric columns copied into `CanonicalRecord::metrics`.
    pub metrics: Vec<MetricName>,
}

fn heuristic_tokens() -> Vec<String> {
    TIMESTAMP_HEURISTIC_TOKENS
        .iter()
        .map(|token| token.to_string())
        .collect()
}

impl ColumnMapping {
    /// Columns of the daily per-state case/death time series.
    pub fn time_series() -> Self {
        Self {
            date: Some(DATE_COLUMN.to_string()),
            date_tokens: heuristic_tokens(),
            timestamp: None,
            timestamp_tokens: Vec::new(),
            category: None,
            location: Some(STATE_COLUMN.to_string()),
            metrics: vec![CASES_METRIC.to_string(), DEATHS_METRIC.to_string()],
        }
    }

    /// Columns of the police incident log.
    pub fn incident_log() -> Self {
        Self {
            date: None,
            date_tokens: heuristic_tokens(),
            timestamp: Some(TIMESTAMP_COLUMN.to_string()),
            timestamp_tokens: heuristic_tokens(),
            category: Some(RACE_COLUMN.to_string()),
            location: Some(BEAT_COLUMN.to_string()),
            metrics: Vec::new(),
        }
    }
}

impl Default for ColumnMapping {
    fn default() -> Self {
        Self::time_series()
    }
}

/// How records join to geographic features.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeoJoin {
    /// Feature property compared with `CanonicalRecord::location`.
    pub join_property: String,
    /// Derived property attached to each feature on refresh.
    pub value_property: String,
}

impl Default for GeoJoin {
    fn default() -> Self {
        Self {
            join_property: STATE_NAME_PROPERTY.to_string(),
            value_property: VALUE_PROPERTY.to_string(),
        }
    }
}

/// Top-K sizes for ranked outputs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RankingConfig {
    /// Bars in the ranked chart.
    pub chart_top_k: usize,
    /// Entries in the textual leaderboard.
    pub leaderboard_top_k: usize,
}

impl Default for RankingConfig {
    fn default() -> Self {
        Self {
            chart_top_k: CHART_TOP_K,
            leaderboard_top_k: LEADERBOARD_TOP_K,
        }
    }
}

/// Which aggregates a refresh computes.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum AggregationPlan {
    /// Growth of `metric` per location between the latest date and `window` dates earlier.
    WindowDelta {
        /// Metric column to difference.
        metric: MetricName,
        /// Lookback window in date buckets.
        window: usize,
    },
    /// Record counts per location for the map, and per `chart_key` for the chart.
    Counts {
        /// Field the ranked chart is keyed by.
        chart_key: GroupField,
    },
}

impl Default for AggregationPlan {
    fn default() -> Self {
        AggregationPlan::WindowDelta {
            metric: CASES_METRIC.to_string(),
            window: DEFAULT_LOOKBACK_WINDOW,
        }
    }
}

/// Top-level dashboard configuration.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardConfig {
    /// Tabular column names.
    pub columns: ColumnMapping,
    /// Record-to-feature join.
    pub join: GeoJoin,
    /// Ranked output sizes.
    pub ranking: RankingConfig,
    /// Choropleth palette, light to dark.
    pub palette: Palette,
    /// Aggregates computed on refresh.
    pub plan: AggregationPlan,
}

impl DashboardConfig {
    /// Time series dashboard showing the windowed growth of `metric` per state.
    pub fn time_series(metric: impl Into<MetricName>) -> Self {
        Self {
            columns: ColumnMapping::time_series(),
            join: GeoJoin::default(),
            ranking: RankingConfig::default(),
            palette: Palette::default(),
            plan: AggregationPlan::WindowDelta {
                metric: metric.into(),
                window: DEFAULT_LOOKBACK_WINDOW,
            },
        }
    }

    /// Incident log dashboard showing counts per beat and per race.
    pub fn incident_log() -> Self {
        Self {
            columns: ColumnMapping::incident_log(),
            join: GeoJoin {
                join_property: BEAT_PROPERTY.to_string(),
                value_property: COUNT_PROPERTY.to_string(),
            },
            ranking: RankingConfig::default(),
            palette: Palette::default(),
            plan: AggregationPlan::Counts {
                chart_key: GroupField::Category,
            },
        }
    }

    /// Override the lookback window of a window-delta plan. No-op for count plans.
    pub fn with_window(mut self, window: usize) -> Self {
        if let AggregationPlan::WindowDelta { window: current, .. } = &mut self.plan {
            *current = window;
        }
        self
    }

    /// Reject configurations the pipeline cannot render.
    pub fn validate(&self) -> Result<(), PipelineError> {
        if self.ranking.chart_top_k == 0 {
            return Err(PipelineError::Configuration(
                "chart_top_k must be greater than zero".to_string(),
            ));
        }
        if self.ranking.leaderboard_top_k == 0 {
            return Err(PipelineError::Configuration(
                "leaderboard_top_k must be greater than zero".to_string(),
            ));
        }
        self.palette.validate()?;
        if self.columns.location.is_none() {
            return Err(PipelineError::Configuration(
                "a location column is required for the geographic join".to_string(),
            ));
        }
        if self.join.join_property.trim().is_empty() || self.join.value_property.trim().is_empty()
        {
            return Err(PipelineError::Configuration(
                "join and value properties must be non-empty".to_string(),
            ));
        }
        if let AggregationPlan::WindowDelta { metric, .. } = &self.plan {
            if !self.columns.metrics.iter().any(|name| name == metric) {
                return Err(PipelineError::Configuration(format!(
                    "window delta metric '{metric}' is not a configured metric column"
                )));
            }
            if self.columns.date.is_none() {
                return Err(PipelineError::Configuration(
                    "window delta plans need a date column".to_string(),
                ));
            }
        }
        Ok(())
    }
}

impl Default for DashboardConfig {
    fn default() -> Self {
        Self::time_series(CASES_METRIC)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn presets_validate() {
        DashboardConfig::default().validate().unwrap();
        DashboardConfig::time_series("deaths").validate().unwrap();
        DashboardConfig::incident_log().validate().unwrap();
    }

    #[test]
    fn window_override_only_touches_delta_plans() {
        let config = DashboardConfig::time_series("cases").with_window(14);
        assert_eq!(
            config.plan,
            AggregationPlan::WindowDelta {
                metric: "cases".to_string(),
                window: 14
            }
        );

        let counts = DashboardConfig::incident_log().with_window(14);
        assert_eq!(
            counts.plan,
            AggregationPlan::Counts {
                chart_key: GroupField::Category
            }
        );
    }

    #[test]
    fn validate_rejects_unrenderable_settings() {
        let mut config = DashboardConfig::default();
        config.ranking.chart_top_k = 0;
        assert!(matches!(
            config.validate(),
            Err(PipelineError::Configuration(_))
        ));

        let config = DashboardConfig::time_series("hospitalized");
        assert!(config.validate().is_err());

        let mut config = DashboardConfig::incident_log();
        config.columns.location = None;
        assert!(config.validate().is_err());
    }
}
