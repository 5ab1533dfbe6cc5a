//! Presentation surface contracts and payloads.
//!
//! Surfaces own any retained rendering state (chart handles, map sources). The
//! pipeline only hands them fresh, fully computed payloads and never assumes a
//! previous publish happened.

use std::io::Write;

use serde::Serialize;
use serde_json::Value;

use crate::constants::ranking::NO_DATA_LABEL;
use crate::errors::PipelineError;
use crate::format::format_number;
use crate::geo::FeatureCollection;
use crate::ranking::RankedEntry;
use crate::scale::ColorScale;

/// Summary counters.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct KpiSummary {
    /// Sum of the headline aggregate (deltas, or filtered record count).
    pub total: f64,
    /// Highest-ranked location, `None` when nothing matched.
    pub top_entry: Option<RankedEntry>,
    /// Context for the numbers: the latest date or the active filter.
    pub reference_label: String,
    /// Top locations for the textual leaderboard.
    pub leaderboard: Vec<RankedEntry>,
}

impl KpiSummary {
    /// Total rendered with thousands separators.
    pub fn total_label(&self) -> String {
        format_number(self.total)
    }

    /// `key (value)` for the top entry, or the no-data sentinel.
    pub fn top_entry_label(&self) -> String {
        match &self.top_entry {
            Some(entry) => format!("{} ({})", entry.key, format_number(entry.value)),
            None => NO_DATA_LABEL.to_string(),
        }
    }
}

/// Ranked bar chart payload, already sorted and truncated.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ChartSeries {
    /// Series (value axis) label.
    pub label: String,
    /// Ranked entries, largest first.
    pub entries: Vec<RankedEntry>,
}

impl ChartSeries {
    /// Category axis labels in bar order.
    pub fn categories(&self) -> Vec<&str> {
        self.entries.iter().map(|entry| entry.key.as_str()).collect()
    }

    /// Bar heights in bar order.
    pub fn values(&self) -> Vec<f64> {
        self.entries.iter().map(|entry| entry.value).collect()
    }
}

/// Choropleth payload: derived features plus the scale to paint them with.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MapUpdate {
    /// Feature collection carrying the joined values.
    pub features: FeatureCollection,
    /// Color scale for the value property.
    pub scale: ColorScale,
    /// Feature property carrying the derived value.
    pub value_property: String,
}

impl MapUpdate {
    /// Fill-color paint expression for map widgets.
    pub fn paint_expression(&self) -> Value {
        self.scale.to_interpolate_expression(&self.value_property)
    }
}

/// Receives summary counters.
pub trait KpiSurface {
    /// Publish the KPI summary.
    fn publish_kpis(&mut self, kpis: &KpiSummary) -> Result<(), PipelineError>;
}

/// Receives the ranked chart series.
pub trait ChartSurface {
    /// Publish the ranked chart series.
    fn publish_chart(&mut self, chart: &ChartSeries) -> Result<(), PipelineError>;
}

/// Receives the derived feature collection and color scale.
pub trait MapSurface {
    /// Publish the joined features and scale.
    fn publish_map(&mut self, update: &MapUpdate) -> Result<(), PipelineError>;
}

/// All three presentation collaborators.
pub trait Surfaces: KpiSurface + ChartSurface + MapSurface {}

impl<T: KpiSurface + ChartSurface + MapSurface> Surfaces for T {}

/// Bundles three independent collaborators into one [`Surfaces`].
pub struct SurfaceSet<'a> {
    /// KPI collaborator.
    pub kpi: &'a mut dyn KpiSurface,
    /// Chart collaborator.
    pub chart: &'a mut dyn ChartSurface,
    /// Map collaborator.
    pub map: &'a mut dyn MapSurface,
}

impl KpiSurface for SurfaceSet<'_> {
    fn publish_kpis(&mut self, kpis: &KpiSummary) -> Result<(), PipelineError> {
        self.kpi.publish_kpis(kpis)
    }
}

impl ChartSurface for SurfaceSet<'_> {
    fn publish_chart(&mut self, chart: &ChartSeries) -> Result<(), PipelineError> {
        self.chart.publish_chart(chart)
    }
}

impl MapSurface for SurfaceSet<'_> {
    fn publish_map(&mut self, update: &MapUpdate) -> Result<(), PipelineError> {
        self.map.publish_map(update)
    }
}

/// Keeps the most recent payload of each kind. Useful headless and in tests.
#[derive(Clone, Debug, Default)]
pub struct RecordingSurfaces {
    /// Last published KPI summary.
    pub kpis: Option<KpiSummary>,
    /// Last published chart series.
    pub chart: Option<ChartSeries>,
    /// Last published map update.
    pub map: Option<MapUpdate>,
    /// Total publish calls received across all three surfaces.
    pub publishes: usize,
}

impl KpiSurface for RecordingSurfaces {
    fn publish_kpis(&mut self, kpis: &KpiSummary) -> Result<(), PipelineError> {
        self.kpis = Some(kpis.clone());
        self.publishes += 1;
        Ok(())
    }
}

impl ChartSurface for RecordingSurfaces {
    fn publish_chart(&mut self, chart: &ChartSeries) -> Result<(), PipelineError> {
        self.chart = Some(chart.clone());
        self.publishes += 1;
        Ok(())
    }
}

impl MapSurface for RecordingSurfaces {
    fn publish_map(&mut self, update: &MapUpdate) -> Result<(), PipelineError> {
        self.map = Some(update.clone());
        self.publishes += 1;
        Ok(())
    }
}

/// Renders every payload as plain text lines.
pub struct TextReportSurfaces<W: Write> {
    out: W,
}

impl<W: Write> TextReportSurfaces<W> {
    /// Report writer over `out`.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Underlying writer.
    pub fn into_inner(self) -> W {
        self.out
    }

    fn write_lines(&mut self, surface: &'static str, lines: &[String]) -> Result<(), PipelineError> {
        for line in lines {
            writeln!(self.out, "{line}").map_err(|err| PipelineError::Surface {
                surface,
                reason: err.to_string(),
            })?;
        }
        Ok(())
    }
}

impl<W: Write> KpiSurface for TextReportSurfaces<W> {
    fn publish_kpis(&mut self, kpis: &KpiSummary) -> Result<(), PipelineError> {
        let mut lines = vec![
            "[KPI]".to_string(),
            format!("  total     : {}", kpis.total_label()),
            format!("  top       : {}", kpis.top_entry_label()),
            format!("  reference : {}", kpis.reference_label),
        ];
        if !kpis.leaderboard.is_empty() {
            lines.push("  leaderboard:".to_string());
            for (idx, entry) in kpis.leaderboard.iter().enumerate() {
                lines.push(format!(
                    "    {}. {} ({})",
                    idx + 1,
                    entry.key,
                    format_number(entry.value)
                ));
            }
        }
        self.write_lines("kpi", &lines)
    }
}

impl<W: Write> ChartSurface for TextReportSurfaces<W> {
    fn publish_chart(&mut self, chart: &ChartSeries) -> Result<(), PipelineError> {
        let mut lines = vec![format!("[CHART] {}", chart.label)];
        if chart.entries.is_empty() {
            lines.push(format!("  {NO_DATA_LABEL}"));
        }
        let width = chart
            .entries
            .iter()
            .map(|entry| entry.key.chars().count())
            .max()
            .unwrap_or(0);
        for entry in &chart.entries {
            lines.push(format!(
                "  {:<width$}  {}",
                entry.key,
                format_number(entry.value)
            ));
        }
        self.write_lines("chart", &lines)
    }
}

impl<W: Write> MapSurface for TextReportSurfaces<W> {
    fn publish_map(&mut self, update: &MapUpdate) -> Result<(), PipelineError> {
        let mut lines = vec![format!(
            "[MAP] {} features, property '{}'",
            update.features.len(),
            update.value_property
        )];
        for stop in &update.scale.stops {
            lines.push(format!("  {:>12}  {}", format_number(stop.value), stop.color));
        }
        self.write_lines("map", &lines)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::aggregate::AggregateMap;
    use crate::scale::Palette;

    fn kpis(top: Option<RankedEntry>) -> KpiSummary {
        KpiSummary {
            total: 1500.0,
            top_entry: top,
            reference_label: "2021-01-08".to_string(),
            leaderboard: Vec::new(),
        }
    }

    #[test]
    fn top_entry_label_uses_sentinel_when_empty() {
        assert_eq!(kpis(None).top_entry_label(), "-");
        assert_eq!(
            kpis(Some(RankedEntry::new("Texas", 1200.0))).top_entry_label(),
            "Texas (1,200)"
        );
        assert_eq!(kpis(None).total_label(), "1,500");
    }

    #[test]
    fn chart_series_exposes_axes() {
        let chart = ChartSeries {
            label: "7-day new".to_string(),
            entries: vec![RankedEntry::new("CA", 50.0), RankedEntry::new("TX", 20.0)],
        };
        assert_eq!(chart.categories(), vec!["CA", "TX"]);
        assert_eq!(chart.values(), vec![50.0, 20.0]);
    }

    #[test]
    fn text_report_renders_all_surfaces() {
        let mut surfaces = TextReportSurfaces::new(Vec::new());
        surfaces
            .publish_kpis(&kpis(Some(RankedEntry::new("Texas", 1200.0))))
            .unwrap();
        surfaces
            .publish_chart(&ChartSeries {
                label: "Incidents".to_string(),
                entries: Vec::new(),
            })
            .unwrap();
        surfaces
            .publish_map(&MapUpdate {
                features: serde_json::from_str(r#"{"type": "FeatureCollection", "features": []}"#)
                    .unwrap(),
                scale: ColorScale::derive(&AggregateMap::new(), &Palette::default()),
                value_property: "value".to_string(),
            })
            .unwrap();
        let text = String::from_utf8(surfaces.into_inner()).unwrap();
        assert!(text.contains("top       : Texas (1,200)"));
        assert!(text.contains("[CHART] Incidents\n  -"));
        assert!(text.contains("[MAP] 0 features, property 'value'"));
        assert!(text.contains("#08306b"));
    }

    #[test]
    fn surface_set_forwards_to_each_collaborator() {
        let mut kpi = RecordingSurfaces::default();
        let mut chart = RecordingSurfaces::default();
        let mut map = RecordingSurfaces::default();
        {
            let mut set = SurfaceSet {
                kpi: &mut kpi,
                chart: &mut chart,
                map: &mut map,
            };
            set.publish_kpis(&kpis(None)).unwrap();
            set.publish_chart(&ChartSeries {
                label: "x".to_string(),
                entries: Vec::new(),
            })
            .unwrap();
        }
        assert_eq!(kpi.publishes, 1);
        assert!(kpi.kpis.is_some());
        assert_eq!(chart.publishes, 1);
        assert_eq!(map.publishes, 0);
    }
}
