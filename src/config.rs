use serde::Deserialize;

pub const DEFAULT_ARTIFACT_PREFIX: &str = "water-consumption-analytics";
pub const DEFAULT_ATTRIBUTION: &str = "Water Metering Operations Dashboard - Analytics Report";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartKind {
    #[default]
    Bar,
    Line,
}

/// Raster size and decoration of the embedded chart.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub kind: ChartKind,
    /// Left plot margin in pixels; callers pick 40 to 64 depending on how
    /// wide their y-axis labels get.
    pub left_margin: u32,
    pub top_margin: u32,
    pub title: String,
    pub x_axis_title: String,
    pub metric_name: String,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 800,
            height: 400,
            kind: ChartKind::Bar,
            left_margin: 64,
            top_margin: 30,
            title: "Water Consumption".to_string(),
            x_axis_title: "Time".to_string(),
            metric_name: "Consumption (L)".to_string(),
        }
    }
}

/// Knobs shared by both builders. Loaded by the driver from an optional
/// JSON file; the engine itself reads no environment.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ReportConfig {
    pub artifact_prefix: String,
    pub attribution: String,
    pub chart: ChartOptions,
    /// Vertical space (mm) that must remain before a chart is placed.
    pub min_chart_space_mm: f32,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            artifact_prefix: DEFAULT_ARTIFACT_PREFIX.to_string(),
            attribution: DEFAULT_ATTRIBUTION.to_string(),
            chart: ChartOptions::default(),
            min_chart_space_mm: 80.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let cfg: ReportConfig =
            serde_json::from_str(r#"{"chart": {"kind": "line", "left_margin": 40}}"#).unwrap();
        assert_eq!(cfg.chart.kind, ChartKind::Line);
        assert_eq!(cfg.chart.left_margin, 40);
        assert_eq!(cfg.chart.width, 800);
        assert_eq!(cfg.artifact_prefix, DEFAULT_ARTIFACT_PREFIX);
        assert_eq!(cfg.min_chart_space_mm, 80.0);
    }
}
