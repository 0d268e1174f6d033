//! outbreak-viz - Chart a live outbreak against historical epidemics
//!
//! outbreak-viz reads a reference table of past epidemics (seasonal flu,
//! SARS, Ebola, ...), scrapes the current cumulative case and death counts
//! of a live outbreak from a public web page, and renders both as one
//! interactive bubble chart in a standalone HTML page.
//!
//! # Overview
//!
//! Each disease becomes a bubble:
//!
//! - **x**: number of cases (log scale)
//! - **y**: mortality, `deaths / cases`
//! - **size**: deaths, `deaths / 5000` clamped to `[1, 200]`
//! - **colour**: disease family (influenza, coronavirus, ebolavirus)
//!
//! A slider under the chart lets the reader push the live outbreak's case
//! count up to 100 million and watch its bubble grow at the current
//! mortality. That recompute happens in the browser only.
//!
//! # Quick Start
//!
//! ```no_run
//! use outbreak_viz::{pipeline, Config, HttpSource};
//!
//! let config = Config::default();
//! let source = HttpSource::new(&config.url);
//!
//! match pipeline::run(&config, &source) {
//!     Ok(path) => println!("Chart written to {}", path.display()),
//!     Err(e) => eprintln!("No chart produced: {}", e),
//! }
//! ```
//!
//! # Modules
//!
//! - [`dataset`]: Reference table loading and live-record merging
//! - [`scrape`]: Live page fetching and figure extraction
//! - [`metrics`]: Mortality, colour, bubble size and label placement
//! - [`chart`]: Declarative chart description consumed by the page script
//! - [`report`]: Output formatters (HTML, JSON, CSV)
//! - [`pipeline`]: The stages wired together

pub mod chart;
pub mod config;
pub mod dataset;
pub mod error;
pub mod metrics;
pub mod pipeline;
pub mod report;
pub mod scrape;

pub use config::Config;
pub use dataset::{DiseaseRecord, DiseaseType};
pub use error::{ConfigError, DatasetError, FetchError, MetricError, PipelineError, ScrapeLayoutError};
pub use metrics::MetricRow;
pub use scrape::{Extraction, FileSource, HttpSource, LiveFigures, LiveSource, Scraper};

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // PUBLIC API TESTS
    // ==========================================================================
    //
    // These tests verify the public API surface is correct and documented.
    // ==========================================================================

    #[test]
    fn test_public_exports() {
        let _: DiseaseType = DiseaseType::Influenza;
        let _config = Config::default();
        let _scraper = Scraper::new();
    }

    #[test]
    fn test_default_scraper_uses_header_columns() {
        let scraper = Scraper::new();
        assert!(matches!(scraper.extraction, Extraction::HeaderColumns { .. }));
        assert_eq!(scraper.table_class, "wikitable");
    }

    #[test]
    fn test_sources_are_live_sources() {
        fn accepts(_: &dyn LiveSource) {}
        accepts(&HttpSource::new("https://example.org"));
        accepts(&FileSource::new("page.html"));
    }
}
