//! Session context and the refresh orchestrator.
//!
//! A [`DashboardSession`] holds everything that stays resident once the data
//! has been acquired: canonical records, the base feature collection and the
//! configuration. Every refresh derives a brand new [`DashboardFrame`] from
//! that context and the current [`FilterSpec`]; nothing computed by one
//! refresh feeds the next.

use std::sync::Arc;

use tracing::debug;

use crate::aggregate::{AggregateMap, WindowBounds, count_by_field, window_delta};
use crate::config::{AggregationPlan, DashboardConfig};
use crate::constants::labels::{COUNT_SERIES, DELTA_SERIES_SUFFIX};
use crate::constants::ranking::NO_DATA_LABEL;
use crate::data::{CanonicalRecord, RawTable};
use crate::errors::PipelineError;
use crate::filter::{FilterSpec, apply_filter, distinct_categories, distinct_years};
use crate::geo::FeatureCollection;
use crate::grouping::GroupField;
use crate::normalize::{ResolvedColumns, normalize_table};
use crate::ranking::{top_entry, top_k, total};
use crate::scale::ColorScale;
use crate::source::{GeographicSource, TabularSource};
use crate::surfaces::{ChartSeries, KpiSummary, MapUpdate, Surfaces};
use crate::types::{AggregateKey, CategoryId};

/// Resident data for one dashboard.
///
/// Cloning is cheap: records and geometry are shared.
#[derive(Clone, Debug)]
pub struct DashboardSession {
    records: Arc<[CanonicalRecord]>,
    geography: Arc<FeatureCollection>,
    config: DashboardConfig,
    columns: Option<ResolvedColumns>,
}

impl DashboardSession {
    /// Session over already normalized records.
    pub fn new(
        records: Vec<CanonicalRecord>,
        geography: FeatureCollection,
        config: DashboardConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        Ok(Self {
            records: records.into(),
            geography: Arc::new(geography),
            config,
            columns: None,
        })
    }

    /// Normalize `table` with the configured column mapping and build a session.
    pub fn from_table(
        table: &RawTable,
        geography: FeatureCollection,
        config: DashboardConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let normalized = normalize_table(table, &config.columns);
        Ok(Self {
            records: normalized.records.into(),
            geography: Arc::new(geography),
            config,
            columns: Some(normalized.columns),
        })
    }

    /// Load both sources and build a session. Acquisition errors are returned as is.
    pub fn from_sources(
        tabular: &dyn TabularSource,
        geographic: &dyn GeographicSource,
        config: DashboardConfig,
    ) -> Result<Self, PipelineError> {
        config.validate()?;
        let table = tabular.load()?;
        let geography = geographic.load()?;
        debug!(
            "[regionpulse:pipeline] sources '{}' ({} rows) and '{}' ({} features) resident",
            tabular.id(),
            table.len(),
            geographic.id(),
            geography.len()
        );
        Self::from_table(&table, geography, config)
    }

    /// Normalized records in source order.
    pub fn records(&self) -> &[CanonicalRecord] {
        &self.records
    }

    /// Base feature collection. Never mutated by refreshes.
    pub fn geography(&self) -> &FeatureCollection {
        &self.geography
    }

    /// Configuration the session was built with.
    pub fn config(&self) -> &DashboardConfig {
        &self.config
    }

    /// Column resolutions, when the session normalized a raw table itself.
    pub fn columns(&self) -> Option<&ResolvedColumns> {
        self.columns.as_ref()
    }

    /// Category options for a filter control, sorted.
    pub fn categories(&self) -> Vec<CategoryId> {
        distinct_categories(&self.records)
    }

    /// Year options for a filter control, ascending.
    pub fn years(&self) -> Vec<i32> {
        distinct_years(&self.records)
    }
}

/// Everything one refresh produced.
#[derive(Clone, Debug, PartialEq)]
pub struct DashboardFrame {
    /// Refresh counter value this frame was computed for (0 outside an orchestrator).
    pub generation: u64,
    /// Filter the frame was computed under.
    pub filter: FilterSpec,
    /// Records that passed the filter.
    pub filtered_records: usize,
    /// Per-location values joined onto the map.
    pub map_values: AggregateMap,
    /// Values behind the chart, before ranking.
    pub chart_values: AggregateMap,
    /// Dates compared by a window-delta plan.
    pub window: Option<WindowBounds>,
    /// KPI payload.
    pub kpis: KpiSummary,
    /// Ranked chart payload.
    pub chart: ChartSeries,
    /// Map payload.
    pub map: MapUpdate,
    /// Features that received an aggregate value.
    pub matched_features: usize,
    /// Aggregate keys with no feature on the map.
    pub unmatched_keys: Vec<AggregateKey>,
}

/// Filter, aggregate, rank and scale for `spec` without publishing anything.
pub fn compute_frame(session: &DashboardSession, spec: &FilterSpec) -> DashboardFrame {
    let config = &session.config;
    let filtered = apply_filter(session.records.iter(), spec);

    let (map_values, chart_values, window, kpi_total, reference_label, chart_label) =
        match &config.plan {
            AggregationPlan::WindowDelta { metric, window } => {
                let delta = window_delta(filtered.iter().copied(), metric, *window);
                let reference_label = delta
                    .bounds
                    .as_ref()
                    .map(|bounds| bounds.latest.clone())
                    .unwrap_or_else(|| NO_DATA_LABEL.to_string());
                (
                    delta.deltas.clone(),
                    delta.deltas.clone(),
                    delta.bounds,
                    total(&delta.deltas),
                    reference_label,
                    format!("{window}{DELTA_SERIES_SUFFIX}"),
                )
            }
            AggregationPlan::Counts { chart_key } => (
                count_by_field(filtered.iter().copied(), GroupField::Location),
                count_by_field(filtered.iter().copied(), *chart_key),
                None,
                filtered.len() as f64,
                spec.to_string(),
                COUNT_SERIES.to_string(),
            ),
        };

    let kpis = KpiSummary {
        total: kpi_total,
        top_entry: top_entry(&map_values),
        reference_label,
        leaderboard: top_k(&map_values, config.ranking.leaderboard_top_k),
    };
    let chart = ChartSeries {
        label: chart_label,
        entries: top_k(&chart_values, config.ranking.chart_top_k),
    };

    let joined = session.geography.with_values(&map_values, &config.join);
    let map = MapUpdate {
        features: joined.features,
        scale: ColorScale::derive(&map_values, &config.palette),
        value_property: config.join.value_property.clone(),
    };

    DashboardFrame {
        generation: 0,
        filter: spec.clone(),
        filtered_records: filtered.len(),
        map_values,
        chart_values,
        window,
        kpis,
        chart,
        map,
        matched_features: joined.matched,
        unmatched_keys: joined.unmatched_keys,
    }
}

/// Whether a refresh is in flight.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RefreshState {
    /// No refresh in flight.
    #[default]
    Idle,
    /// A refresh is computing or publishing.
    Computing,
}

/// Drives refreshes of one session against a set of surfaces.
#[derive(Debug)]
pub struct RefreshOrchestrator {
    session: DashboardSession,
    state: RefreshState,
    generation: u64,
    last_frame: Option<DashboardFrame>,
}

impl RefreshOrchestrator {
    /// Orchestrator over `session` in the idle state.
    pub fn new(session: DashboardSession) -> Self {
        Self {
            session,
            state: RefreshState::Idle,
            generation: 0,
            last_frame: None,
        }
    }

    /// Session the orchestrator refreshes from.
    pub fn session(&self) -> &DashboardSession {
        &self.session
    }

    /// Current refresh state.
    pub fn state(&self) -> RefreshState {
        self.state
    }

    /// Number of refreshes started so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Frame published by the most recent refresh.
    pub fn last_frame(&self) -> Option<&DashboardFrame> {
        self.last_frame.as_ref()
    }

    /// Recompute everything for `spec` and publish KPI, chart and map.
    ///
    /// The frame replaces the previous one whether or not publishing succeeds.
    /// The orchestrator is back to [`RefreshState::Idle`] before any surface
    /// error is returned.
    pub fn refresh(
        &mut self,
        spec: &FilterSpec,
        surfaces: &mut dyn Surfaces,
    ) -> Result<&DashboardFrame, PipelineError> {
        self.state = RefreshState::Computing;
        self.generation += 1;

        let mut frame = compute_frame(&self.session, spec);
        frame.generation = self.generation;
        debug!(
            "[regionpulse:pipeline] refresh #{} filter='{}' records={} map_keys={} chart_keys={} unmatched={}",
            frame.generation,
            frame.filter,
            frame.filtered_records,
            frame.map_values.len(),
            frame.chart_values.len(),
            frame.unmatched_keys.len()
        );

        let published = publish(&frame, surfaces);
        self.state = RefreshState::Idle;
        let frame = self.last_frame.insert(frame);
        published?;
        Ok(frame)
    }

    /// Refresh from raw control values (see [`FilterSpec::from_controls`]).
    pub fn refresh_controls(
        &mut self,
        category: &str,
        year: &str,
        surfaces: &mut dyn Surfaces,
    ) -> Result<&DashboardFrame, PipelineError> {
        let spec = FilterSpec::from_controls(category, year);
        self.refresh(&spec, surfaces)
    }
}

fn publish(frame: &DashboardFrame, surfaces: &mut dyn Surfaces) -> Result<(), PipelineError> {
    surfaces.publish_kpis(&frame.kpis)?;
    surfaces.publish_chart(&frame.chart)?;
    surfaces.publish_map(&frame.map)
}
