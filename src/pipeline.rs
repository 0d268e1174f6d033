//! End-to-end run: load → fetch → merge → compute → chart → write
//!
//! Each stage takes and returns its data explicitly. The report is rendered
//! in memory and only written once every stage has succeeded, so a failed
//! run leaves no output file behind.

use crate::chart::Chart;
use crate::config::Config;
use crate::dataset;
use crate::error::PipelineError;
use crate::metrics::{self, MetricRow};
use crate::report::{self, Page};
use crate::scrape::{LiveFigures, LiveSource};
use log::info;
use std::path::PathBuf;

/// Fetch the live page and extract its figures.
pub fn fetch_live<S: LiveSource + ?Sized>(config: &Config, source: &S) -> Result<LiveFigures, PipelineError> {
    let html = source.fetch_document()?;
    let figures = config.scraper().extract(&html)?;
    info!(
        "Live figures for {}: {} cases, {} deaths",
        config.live.name, figures.cases, figures.deaths
    );
    Ok(figures)
}

/// Every stage up to the derived table.
pub fn compute<S: LiveSource + ?Sized>(config: &Config, source: &S) -> Result<Vec<MetricRow>, PipelineError> {
    let reference = dataset::load(&config.dataset)?;
    let figures = fetch_live(config, source)?;

    let live = config.live.to_record(figures, &source.describe());
    let merged = dataset::merge(reference, live);

    let rows = metrics::calculate(&merged, &config.label_table(), &config.live.name)?;
    Ok(rows)
}

/// Every stage up to the page model.
pub fn build_page<S: LiveSource + ?Sized>(config: &Config, source: &S) -> Result<Page, PipelineError> {
    let rows = compute(config, source)?;
    let chart = Chart::build(rows, &config.chart);

    Ok(Page::new(&config.page.title, &config.page.description, chart)
        .with_page_url(config.page.url.clone()))
}

/// Full run; returns the path written.
pub fn run<S: LiveSource + ?Sized>(config: &Config, source: &S) -> Result<PathBuf, PipelineError> {
    let page = build_page(config, source)?;

    let path = config.output.clone();
    report::generate(&path, &page).map_err(|source| PipelineError::Output {
        path: path.clone(),
        source,
    })?;

    info!("Wrote {} ({} records)", path.display(), page.summary.records);
    Ok(path)
}
