//! Report generation for the merged outbreak table
//!
//! This module provides output formatters in multiple formats:
//!
//! - **HTML**: The interactive page with the D3.js bubble chart and slider
//! - **JSON**: The chart description, for re-use by other front ends
//! - **CSV**: The merged table with derived columns
//!
//! # Usage
//!
//! ```ignore
//! use outbreak_viz::report;
//!
//! // Automatically picks format based on extension
//! report::generate("covidvis.html", &page)?;  // HTML
//! report::generate("covidvis.json", &page)?;  // JSON
//! report::generate("covidvis.csv", &page)?;   // CSV
//! ```
//!
//! Every format is rendered fully into memory before the file is created,
//! so a failed render never leaves a truncated report behind.

pub mod csv;
pub mod html;
pub mod json;

use crate::chart::Chart;
use serde::Serialize;
use std::io;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    Html,
    Json,
    Csv,
}

impl Format {
    pub fn from_path(path: &Path) -> Self {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("")
            .to_lowercase();

        match ext.as_str() {
            "html" | "htm" => Format::Html,
            "json" => Format::Json,
            _ => Format::Csv,
        }
    }
}

/// Headline figures shown above the chart
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Summary {
    pub records: usize,
    pub live_name: String,
    pub live_cases: u64,
    pub live_deaths: u64,
    pub live_mortality: f64,
}

impl Summary {
    pub fn from_chart(chart: &Chart) -> Self {
        let mut summary = Self {
            records: chart.rows.len(),
            ..Self::default()
        };

        if let Some(live) = chart.live_row() {
            summary.live_name = live.name.clone();
            summary.live_cases = live.cases;
            summary.live_deaths = live.deaths;
            summary.live_mortality = live.mortality;
        }

        summary
    }
}

/// One entry of the page's source list.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Citation {
    /// Records backed by this source, in table order
    pub names: Vec<String>,
    pub url: String,
}

/// Build the source list: one entry per distinct source, first-seen order.
pub fn citations(chart: &Chart) -> Vec<Citation> {
    let mut out: Vec<Citation> = Vec::new();
    for row in chart.rows.iter().filter(|r| !r.source.is_empty()) {
        match out.iter_mut().find(|c| c.url == row.source) {
            Some(c) => c.names.push(row.name.clone()),
            None => out.push(Citation {
                names: vec![row.name.clone()],
                url: row.source.clone(),
            }),
        }
    }
    out
}

/// Everything a report needs.
#[derive(Debug, Clone, Serialize)]
pub struct Page {
    pub title: String,
    pub description: String,
    /// Canonical URL for the sharing metadata, when published
    pub page_url: Option<String>,
    pub generated: String,
    pub summary: Summary,
    pub citations: Vec<Citation>,
    pub chart: Chart,
}

impl Page {
    pub fn new(title: impl Into<String>, description: impl Into<String>, chart: Chart) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            page_url: None,
            generated: chrono::Local::now().format("%Y-%m-%d %H:%M").to_string(),
            summary: Summary::from_chart(&chart),
            citations: citations(&chart),
            chart,
        }
    }

    pub fn with_page_url(mut self, url: Option<String>) -> Self {
        self.page_url = url;
        self
    }
}

/// Render a page in the given format.
pub fn render(format: Format, page: &Page) -> io::Result<Vec<u8>> {
    let mut buf = Vec::new();
    match format {
        Format::Html => html::write(&mut buf, page)?,
        Format::Json => json::write(&mut buf, page)?,
        Format::Csv => csv::write(&mut buf, &page.chart.rows)?,
    }
    Ok(buf)
}

/// Generate a report in the appropriate format based on file extension.
/// Missing parent directories are created once rendering has succeeded.
pub fn generate<P: AsRef<Path>>(path: P, page: &Page) -> io::Result<()> {
    let path = path.as_ref();
    let bytes = render(Format::from_path(path), page)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, bytes)
}
