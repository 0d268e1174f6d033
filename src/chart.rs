//! Declarative bubble-chart description
//!
//! The chart is drawn in the browser by D3.js; this module only decides
//! *what* is drawn. [`Chart`] is serialized to JSON and embedded in the page,
//! where the script reads axes, bubbles, legend, labels and the slider from
//! it.
//!
//! The slider drives the live row only: for a slider value `v` the browser
//! sets `cases = v`, `deaths = mortality * v` and `size = deaths / 5000`.
//! By default that client-side size is *not* clamped to `[1, 200]`, so the
//! bubble keeps growing to show what the live outbreak would look like at
//! that scale. `clamp_slider_size` turns the clamp on.

use crate::metrics::{MetricRow, DEATHS_PER_SIZE_UNIT, MAX_BUBBLE_SIZE, MIN_BUBBLE_SIZE};
use log::warn;
use serde::{Deserialize, Serialize};

/// Chart knobs exposed in the config file.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartConfig {
    pub width: u32,
    pub height: u32,
    /// Upper bound of the cases slider
    pub slider_max: u64,
    /// Apply the `[1, 200]` size clamp in the browser as well
    pub clamp_slider_size: bool,
}

impl Default for ChartConfig {
    fn default() -> Self {
        Self {
            width: 800,
            height: 600,
            slider_max: 100_000_000,
            clamp_slider_size: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Scale {
    Linear,
    Log,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Axis {
    pub title: String,
    pub scale: Scale,
    /// Numeral-style tick format: `0,0` or `0%`
    pub format: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Theme {
    pub background: String,
    pub grid: String,
    pub text: String,
}

impl Default for Theme {
    fn default() -> Self {
        Self {
            background: "#383838".to_string(),
            grid: "#464646".to_string(),
            text: "#eeeeee".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct BubbleStyle {
    pub alpha: f64,
    pub hover_alpha: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LegendEntry {
    pub label: String,
    pub color: &'static str,
}

/// Free-floating text placed in data coordinates.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Annotation {
    pub x: f64,
    pub y: f64,
    pub text: String,
    pub x_offset: i32,
    pub y_offset: i32,
    pub font_size: String,
    pub bold: bool,
}

/// Range control bound to the live row.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Slider {
    pub title: String,
    pub start: u64,
    pub end: u64,
    pub value: u64,
    pub step: u64,
    pub format: String,
    /// Index into `rows` of the row the slider recomputes
    pub row: usize,
    pub deaths_per_size_unit: f64,
    pub clamp_size: bool,
    pub min_size: f64,
    pub max_size: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Chart {
    pub width: u32,
    pub height: u32,
    pub x_axis: Axis,
    pub y_axis: Axis,
    pub theme: Theme,
    pub bubbles: BubbleStyle,
    pub legend: Vec<LegendEntry>,
    pub annotations: Vec<Annotation>,
    pub slider: Option<Slider>,
    pub rows: Vec<MetricRow>,
}

impl Chart {
    pub fn build(rows: Vec<MetricRow>, config: &ChartConfig) -> Self {
        let slider = rows.iter().position(|r| r.live).map(|i| {
            let start = rows[i].cases;
            let end = if config.slider_max < start {
                warn!(
                    "Slider maximum {} is below the live case count {}; using the case count",
                    config.slider_max, start
                );
                start
            } else {
                config.slider_max
            };
            Slider {
                title: "Cases".to_string(),
                start,
                end,
                value: start,
                step: 1,
                format: "0,0".to_string(),
                row: i,
                deaths_per_size_unit: DEATHS_PER_SIZE_UNIT,
                clamp_size: config.clamp_slider_size,
                min_size: MIN_BUBBLE_SIZE,
                max_size: MAX_BUBBLE_SIZE,
            }
        });

        let annotations = vec![Annotation {
            x: 100_000_000.0,
            y: 0.425,
            text: "Bubble size = Number of deaths".to_string(),
            x_offset: -60,
            y_offset: 0,
            font_size: "10pt".to_string(),
            bold: true,
        }];

        Self {
            width: config.width,
            height: config.height,
            x_axis: Axis {
                title: "Number of Cases (logarithmic scale)".to_string(),
                scale: Scale::Log,
                format: "0,0".to_string(),
            },
            y_axis: Axis {
                title: "Mortality Rate".to_string(),
                scale: Scale::Linear,
                format: "0%".to_string(),
            },
            theme: Theme::default(),
            bubbles: BubbleStyle { alpha: 0.5, hover_alpha: 0.7 },
            legend: legend(&rows),
            annotations,
            slider,
            rows,
        }
    }

    pub fn live_row(&self) -> Option<&MetricRow> {
        self.slider.as_ref().map(|s| &self.rows[s.row])
    }
}

/// One entry per disease type, in order of first appearance.
fn legend(rows: &[MetricRow]) -> Vec<LegendEntry> {
    let mut entries: Vec<LegendEntry> = Vec::new();
    for r in rows {
        let label = r.disease_type.as_str();
        if !entries.iter().any(|e| e.label == label) {
            entries.push(LegendEntry {
                label: label.to_string(),
                color: r.color,
            });
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::DiseaseType;
    use crate::metrics::{display_color, UNKNOWN_COLOR};

    fn row(name: &str, t: DiseaseType, cases: u64, live: bool) -> MetricRow {
        MetricRow {
            name: name.to_string(),
            color: display_color(&t),
            disease_type: t,
            cases,
            deaths: cases / 10,
            source: String::new(),
            mortality: 0.1,
            size: 1.0,
            label: None,
            live,
        }
    }

    fn rows() -> Vec<MetricRow> {
        vec![
            row("Seasonal Influenza", DiseaseType::Influenza, 1_000_000_000, false),
            row("SARS", DiseaseType::Coronavirus, 8096, false),
            row("Swine Flu", DiseaseType::Influenza, 60_800_000, false),
            row("Measles", DiseaseType::Other("Morbillivirus".into()), 9_000_000, false),
            row("Covid-19", DiseaseType::Coronavirus, 1234, true),
        ]
    }

    #[test]
    fn test_slider_bounds_from_live_row() {
        let chart = Chart::build(rows(), &ChartConfig::default());
        let slider = chart.slider.as_ref().unwrap();

        assert_eq!(slider.start, 1234);
        assert_eq!(slider.end, 100_000_000);
        assert_eq!(slider.row, 4);
        assert!(!slider.clamp_size, "client clamp is off unless configured");
        assert_eq!(chart.live_row().unwrap().name, "Covid-19");
    }

    #[test]
    fn test_slider_end_never_below_start() {
        let config = ChartConfig { slider_max: 100, ..ChartConfig::default() };
        let slider = Chart::build(rows(), &config).slider.unwrap();
        assert_eq!(slider.end, slider.start);
    }

    #[test]
    fn test_no_live_row_no_slider() {
        let mut rows = rows();
        rows.pop();
        assert!(Chart::build(rows, &ChartConfig::default()).slider.is_none());
    }

    #[test]
    fn test_legend_grouped_by_type() {
        let chart = Chart::build(rows(), &ChartConfig::default());
        let labels: Vec<_> = chart.legend.iter().map(|e| e.label.as_str()).collect();

        assert_eq!(labels, vec!["Influenza", "Coronavirus", "Morbillivirus"]);
        assert_eq!(chart.legend[2].color, UNKNOWN_COLOR);
    }

    #[test]
    fn test_chart_json_shape() {
        let chart = Chart::build(rows(), &ChartConfig { clamp_slider_size: true, ..Default::default() });
        let json = serde_json::to_value(&chart).unwrap();

        assert_eq!(json["x_axis"]["scale"], "log");
        assert_eq!(json["y_axis"]["format"], "0%");
        assert_eq!(json["slider"]["clamp_size"], true);
        assert_eq!(json["rows"][4]["disease"], "Covid-19");
        assert_eq!(json["rows"][3]["type"], "Morbillivirus");
    }
}
