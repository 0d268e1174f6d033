//! Derived per-record metrics
//!
//! For each merged record this computes:
//!
//! - **mortality**: `deaths / cases`. Zero cases is an error, never NaN.
//! - **colour**: fixed by disease type, with a grey sentinel for types
//!   outside the palette.
//! - **size**: bubble diameter, `deaths / 5000` clamped to `[1, 200]`.
//! - **label**: the on-chart annotation, resolved from a [`LabelTable`].
//!
//! Everything here is pure: the same records and label table always give
//! the same rows.

use crate::dataset::{live_index, DiseaseRecord, DiseaseType};
use crate::error::MetricError;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Deaths represented by one unit of bubble size
pub const DEATHS_PER_SIZE_UNIT: f64 = 5000.0;
pub const MIN_BUBBLE_SIZE: f64 = 1.0;
pub const MAX_BUBBLE_SIZE: f64 = 200.0;

pub const INFLUENZA_COLOR: &str = "#ff0052";
pub const CORONAVIRUS_COLOR: &str = "#ffff00";
pub const EBOLAVIRUS_COLOR: &str = "#009ce6";
/// Colour for disease types outside the palette
pub const UNKNOWN_COLOR: &str = "#9e9e9e";

pub fn display_color(disease_type: &DiseaseType) -> &'static str {
    match disease_type {
        DiseaseType::Influenza => INFLUENZA_COLOR,
        DiseaseType::Coronavirus => CORONAVIRUS_COLOR,
        DiseaseType::Ebolavirus => EBOLAVIRUS_COLOR,
        DiseaseType::Other(_) => UNKNOWN_COLOR,
    }
}

pub fn mortality(record: &DiseaseRecord) -> Result<f64, MetricError> {
    if record.cases == 0 {
        return Err(MetricError::UndefinedMortality {
            name: record.name.clone(),
        });
    }
    Ok(record.deaths as f64 / record.cases as f64)
}

pub fn bubble_size(deaths: u64) -> f64 {
    (deaths as f64 / DEATHS_PER_SIZE_UNIT).clamp(MIN_BUBBLE_SIZE, MAX_BUBBLE_SIZE)
}

// ============================================================================
// Labels
// ============================================================================

/// How one record is annotated on the chart.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LabelStyle {
    /// Replacement text; the record name when absent
    pub text: Option<String>,
    pub x_offset: i32,
    pub y_offset: i32,
    pub font_size: String,
    pub bold: bool,
    pub hidden: bool,
}

impl Default for LabelStyle {
    fn default() -> Self {
        Self {
            text: None,
            x_offset: 0,
            y_offset: 0,
            font_size: "8pt".to_string(),
            bold: false,
            hidden: false,
        }
    }
}

/// One `[[labels]]` entry of the config file. Unset fields keep whatever
/// the table already holds for that record.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct LabelOverride {
    pub name: String,
    pub text: Option<String>,
    pub x_offset: Option<i32>,
    pub y_offset: Option<i32>,
    pub font_size: Option<String>,
    pub bold: Option<bool>,
    pub hidden: Option<bool>,
}

/// Resolved annotation carried in the chart data.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Label {
    pub text: String,
    pub x_offset: i32,
    pub y_offset: i32,
    pub font_size: String,
    pub bold: bool,
}

/// Per-record label placement, keyed by record name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LabelTable {
    pub default: LabelStyle,
    overrides: BTreeMap<String, LabelStyle>,
}

impl LabelTable {
    /// Placement tuned for the bundled reference dataset.
    pub fn builtin(live_name: &str) -> Self {
        let mut table = Self::default();
        table.set(
            "Seasonal Influenza",
            LabelStyle {
                text: Some("Seasonal Flu".to_string()),
                x_offset: -30,
                y_offset: -6,
                ..LabelStyle::default()
            },
        );
        table.set(
            "Swine Flu",
            LabelStyle {
                x_offset: -110,
                y_offset: 30,
                ..LabelStyle::default()
            },
        );
        table.set(
            live_name,
            LabelStyle {
                x_offset: -20,
                y_offset: 10,
                font_size: "11pt".to_string(),
                bold: true,
                ..LabelStyle::default()
            },
        );
        table
    }

    pub fn set(&mut self, name: &str, style: LabelStyle) {
        self.overrides.insert(name.to_string(), style);
    }

    pub fn apply(&mut self, o: &LabelOverride) {
        let mut style = self.style_for(&o.name).clone();
        if let Some(ref text) = o.text {
            style.text = Some(text.clone());
        }
        if let Some(x) = o.x_offset {
            style.x_offset = x;
        }
        if let Some(y) = o.y_offset {
            style.y_offset = y;
        }
        if let Some(ref size) = o.font_size {
            style.font_size = size.clone();
        }
        if let Some(bold) = o.bold {
            style.bold = bold;
        }
        if let Some(hidden) = o.hidden {
            style.hidden = hidden;
        }
        self.set(&o.name, style);
    }

    pub fn style_for(&self, name: &str) -> &LabelStyle {
        self.overrides.get(name).unwrap_or(&self.default)
    }

    pub fn resolve(&self, name: &str) -> Option<Label> {
        label_for(name, self.style_for(name))
    }

    /// Label in the table's default style, ignoring any override for `name`.
    pub fn resolve_default(&self, name: &str) -> Option<Label> {
        label_for(name, &self.default)
    }
}

fn label_for(name: &str, style: &LabelStyle) -> Option<Label> {
    if style.hidden {
        return None;
    }
    Some(Label {
        text: style.text.clone().unwrap_or_else(|| name.to_string()),
        x_offset: style.x_offset,
        y_offset: style.y_offset,
        font_size: style.font_size.clone(),
        bold: style.bold,
    })
}

// ============================================================================
// Rows
// ============================================================================

/// A merged record plus its derived metrics.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricRow {
    #[serde(rename = "disease")]
    pub name: String,
    #[serde(rename = "type")]
    pub disease_type: DiseaseType,
    pub cases: u64,
    pub deaths: u64,
    pub source: String,
    pub mortality: f64,
    pub color: &'static str,
    pub size: f64,
    pub label: Option<Label>,
    /// True for the row the slider drives
    pub live: bool,
}

/// Compute every derived column. Fails on the first record whose mortality
/// is undefined.
pub fn calculate(
    records: &[DiseaseRecord],
    labels: &LabelTable,
    live_name: &str,
) -> Result<Vec<MetricRow>, MetricError> {
    let live = live_index(records, live_name);

    records
        .iter()
        .enumerate()
        .map(|(i, r)| {
            let is_live = Some(i) == live;
            // An older row sharing the live name must not take the live style
            let label = if !is_live && r.name == live_name {
                labels.resolve_default(&r.name)
            } else {
                labels.resolve(&r.name)
            };
            Ok(MetricRow {
                name: r.name.clone(),
                disease_type: r.disease_type.clone(),
                cases: r.cases,
                deaths: r.deaths,
                source: r.source.clone(),
                mortality: mortality(r)?,
                color: display_color(&r.disease_type),
                size: bubble_size(r.deaths),
                label,
                live: is_live,
            })
        })
        .collect()
}
