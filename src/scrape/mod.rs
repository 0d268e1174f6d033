//! Live figure extraction
//!
//! The live page is a semi-structured external document, so locating the
//! two figures (cumulative cases and deaths) is isolated here behind an
//! [`Extraction`] strategy:
//!
//! | Strategy | Looks at | Breaks when |
//! |----------|----------|-------------|
//! | `HeaderColumns` | header text of the data table, then the first row below it | a column is renamed |
//! | `HeaderCells` | n-th `th` cell of the data table | any header cell is added or removed |
//! | `BoldText` | n-th `b` element of the data table | bold markup moves |
//!
//! `HeaderColumns` is the default. The positional strategies are kept for
//! page revisions where the totals only exist as header or bold cells.
//!
//! Fetching the document is a separate concern, see [`source`].

pub mod source;
pub mod table;

use crate::error::ScrapeLayoutError;
use log::debug;
use scraper::Html;
use serde::{Deserialize, Serialize};

pub use source::{FileSource, HttpSource, LiveSource};
pub use table::{probe, ProbeReport};

/// Table class Wikipedia puts on its data tables
pub const DEFAULT_TABLE_CLASS: &str = "wikitable";

/// Cumulative figures pulled from the live page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LiveFigures {
    pub cases: u64,
    pub deaths: u64,
}

/// How the two figures are located inside the data table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Extraction {
    /// Find the columns whose header contains these labels and read the
    /// first row below the header row.
    HeaderColumns { cases: String, deaths: String },
    /// Zero-based index into the table's `th` cells.
    HeaderCells { cases: usize, deaths: usize },
    /// Zero-based index into the table's `b` elements.
    BoldText { cases: usize, deaths: usize },
}

impl Default for Extraction {
    fn default() -> Self {
        Extraction::HeaderColumns {
            cases: "Cases".to_string(),
            deaths: "Deaths".to_string(),
        }
    }
}

impl Extraction {
    /// The `th` layout the page used when totals sat in the header block.
    pub fn header_cells() -> Self {
        Extraction::HeaderCells { cases: 7, deaths: 8 }
    }

    /// The older layout where the totals were the 2nd and 3rd bold items.
    pub fn bold_text() -> Self {
        Extraction::BoldText { cases: 1, deaths: 2 }
    }
}

/// Extracts [`LiveFigures`] from an HTML document.
#[derive(Debug, Clone)]
pub struct Scraper {
    pub extraction: Extraction,
    pub table_class: String,
}

impl Default for Scraper {
    fn default() -> Self {
        Self::new()
    }
}

impl Scraper {
    pub fn new() -> Self {
        Self {
            extraction: Extraction::default(),
            table_class: DEFAULT_TABLE_CLASS.to_string(),
        }
    }

    pub fn with_extraction(mut self, extraction: Extraction) -> Self {
        self.extraction = extraction;
        self
    }

    pub fn with_table_class(mut self, class: impl Into<String>) -> Self {
        self.table_class = class.into();
        self
    }

    /// Locate and parse the two figures.
    pub fn extract(&self, html: &str) -> Result<LiveFigures, ScrapeLayoutError> {
        let document = Html::parse_document(html);
        let table = table::find_table(&document, &self.table_class)?;

        let (cases, deaths) = match &self.extraction {
            Extraction::HeaderColumns { cases, deaths } => {
                let rows = table::expanded_rows(table);
                by_header(&rows, cases, deaths)?
            }
            Extraction::HeaderCells { cases, deaths } => {
                let cells = table::tag_texts(table, "th");
                (at(&cells, "th", *cases)?, at(&cells, "th", *deaths)?)
            }
            Extraction::BoldText { cases, deaths } => {
                let cells = table::tag_texts(table, "b");
                (at(&cells, "b", *cases)?, at(&cells, "b", *deaths)?)
            }
        };
        debug!("Raw live cells: cases={:?} deaths={:?}", cases, deaths);

        Ok(LiveFigures {
            cases: table::parse_count("cases", &cases)?,
            deaths: table::parse_count("deaths", &deaths)?,
        })
    }
}

fn at(cells: &[String], kind: &'static str, index: usize) -> Result<String, ScrapeLayoutError> {
    cells.get(index).cloned().ok_or(ScrapeLayoutError::MissingCell {
        kind,
        index,
        found: cells.len(),
    })
}

/// Column of `label` in `row`, matched case-insensitively. With `exact`
/// only whole-cell matches count; otherwise an exact match still wins over
/// a substring match, so "Deaths" is preferred to "Deaths / million".
fn column_of(row: &[String], label: &str, skip: Option<usize>, exact: bool) -> Option<usize> {
    let label = label.to_lowercase();
    let candidates = || {
        row.iter()
            .enumerate()
            .filter(move |(i, _)| Some(*i) != skip)
            .map(|(i, cell)| (i, cell.to_lowercase()))
    };
    let whole = candidates().find(|(_, cell)| *cell == label);
    if exact {
        return whole.map(|(i, _)| i);
    }
    whole
        .or_else(|| candidates().find(|(_, cell)| cell.contains(&label)))
        .map(|(i, _)| i)
}

/// Header row and column positions of the two labels. Rows whose cells
/// match the labels exactly are tried before substring matches, so a table
/// caption spanning every column never wins over the real header row.
fn header_columns(
    rows: &[Vec<String>],
    cases_label: &str,
    deaths_label: &str,
) -> Option<(usize, usize, usize)> {
    for exact in [true, false] {
        for (r, row) in rows.iter().enumerate() {
            let Some(ci) = column_of(row, cases_label, None, exact) else { continue };
            let Some(di) = column_of(row, deaths_label, Some(ci), exact) else { continue };
            if row[ci] == row[di] {
                debug!("Row {} matches both labels in one spanned cell, skipping", r);
                continue;
            }
            return Some((r, ci, di));
        }
    }
    None
}

fn by_header(
    rows: &[Vec<String>],
    cases_label: &str,
    deaths_label: &str,
) -> Result<(String, String), ScrapeLayoutError> {
    let Some((r, ci, di)) = header_columns(rows, cases_label, deaths_label) else {
        let has_cases = rows.iter().any(|row| column_of(row, cases_label, None, false).is_some());
        let label = if has_cases { deaths_label } else { cases_label };
        return Err(ScrapeLayoutError::MissingColumn { label: label.to_string() });
    };
    debug!("Header row {}: cases column {}, deaths column {}", r, ci, di);

    let needed = ci.max(di);
    let data = rows[r + 1..]
        .iter()
        .find(|row| row.len() > needed)
        .ok_or(ScrapeLayoutError::MissingRow)?;
    Ok((data[ci].clone(), data[di].clone()))
}

#[cfg(test)]
mod tests {
    use super::*;

    // ==========================================================================
    // POSITIONAL STRATEGIES
    // ==========================================================================
    //
    // These reproduce the two layouts the live page has had. The indices are
    // counted over every th / b element of the first wikitable.
    // ==========================================================================

    const HEADER_PAGE: &str = r#"<table class="wikitable">
        <tr><th colspan="2">Location</th><th>Cases</th><th>Deaths</th><th>Recov.</th><th>Ref.</th></tr>
        <tr><th></th><th>World</th><th>1,234</th><th>56</th><th>789</th><th></th></tr>
    </table>"#;

    const BOLD_PAGE: &str = r#"<table class="wikitable">
        <tr><td><b>World</b></td><td><b>2,000,000</b></td><td><b>130,000</b></td></tr>
    </table>"#;

    #[test]
    fn test_header_cells_eighth_and_ninth() {
        let scraper = Scraper::new().with_extraction(Extraction::header_cells());
        let figures = scraper.extract(HEADER_PAGE).unwrap();

        assert_eq!(figures, LiveFigures { cases: 1234, deaths: 56 });
    }

    #[test]
    fn test_header_cells_index_out_of_range() {
        let scraper = Scraper::new().with_extraction(Extraction::HeaderCells { cases: 7, deaths: 40 });
        assert_eq!(
            scraper.extract(HEADER_PAGE).unwrap_err(),
            ScrapeLayoutError::MissingCell { kind: "th", index: 40, found: 11 }
        );
    }

    #[test]
    fn test_header_cells_non_numeric() {
        // Index 1 is the "Cases" label itself
        let scraper = Scraper::new().with_extraction(Extraction::HeaderCells { cases: 1, deaths: 8 });
        assert!(matches!(
            scraper.extract(HEADER_PAGE),
            Err(ScrapeLayoutError::NotNumeric { field: "cases", .. })
        ));
    }

    #[test]
    fn test_bold_text_second_and_third() {
        let scraper = Scraper::new().with_extraction(Extraction::bold_text());
        let figures = scraper.extract(BOLD_PAGE).unwrap();

        assert_eq!(figures, LiveFigures { cases: 2_000_000, deaths: 130_000 });
    }

    // ==========================================================================
    // NAMED-COLUMN STRATEGY
    // ==========================================================================

    #[test]
    fn test_header_columns_default() {
        let figures = Scraper::new().extract(HEADER_PAGE).unwrap();
        assert_eq!(figures, LiveFigures { cases: 1234, deaths: 56 });
    }

    #[test]
    fn test_header_columns_survives_inserted_column() {
        let page = r#"<table class="wikitable">
            <tr><th>Location</th><th>Deaths / million</th><th>Deaths</th><th>Cases</th></tr>
            <tr><th>World</th><td>12</td><td>99</td><td>4,321</td></tr>
        </table>"#;
        let figures = Scraper::new().extract(page).unwrap();

        assert_eq!(figures, LiveFigures { cases: 4321, deaths: 99 });
    }

    #[test]
    fn test_header_columns_case_insensitive_labels() {
        let scraper = Scraper::new().with_extraction(Extraction::HeaderColumns {
            cases: "confirmed".into(),
            deaths: "DEATHS".into(),
        });
        let page = r#"<table class="wikitable">
            <tr><th>Region</th><th>Confirmed cases</th><th>Deaths</th></tr>
            <tr><td>All</td><td>10</td><td>1</td></tr>
        </table>"#;

        assert_eq!(scraper.extract(page).unwrap(), LiveFigures { cases: 10, deaths: 1 });
    }

    #[test]
    fn test_header_columns_missing_label() {
        let scraper = Scraper::new().with_extraction(Extraction::HeaderColumns {
            cases: "Cases".into(),
            deaths: "Fatalities".into(),
        });
        assert_eq!(
            scraper.extract(HEADER_PAGE).unwrap_err(),
            ScrapeLayoutError::MissingColumn { label: "Fatalities".into() }
        );
    }

    #[test]
    fn test_header_columns_skips_spanning_title_row() {
        let page = r#"<table class="wikitable">
            <tr><th colspan="3">COVID-19 cases and deaths by location</th></tr>
            <tr><th>Location</th><th>Cases</th><th>Deaths</th></tr>
            <tr><th>World</th><td>1,234</td><td>56</td></tr>
        </table>"#;

        assert_eq!(Scraper::new().extract(page).unwrap(), LiveFigures { cases: 1234, deaths: 56 });
    }

    #[test]
    fn test_header_columns_spanning_title_with_partial_labels() {
        // "deaths" only matches by substring, so the title row is a candidate too
        let scraper = Scraper::new().with_extraction(Extraction::HeaderColumns {
            cases: "confirmed".into(),
            deaths: "deaths".into(),
        });
        let page = r#"<table class="wikitable">
            <tr><th colspan="3">Confirmed cases and deaths</th></tr>
            <tr><th>Location</th><th>Confirmed</th><th>Deaths (total)</th></tr>
            <tr><th>World</th><td>2,000</td><td>80</td></tr>
        </table>"#;

        assert_eq!(scraper.extract(page).unwrap(), LiveFigures { cases: 2000, deaths: 80 });
    }

    #[test]
    fn test_header_columns_without_data_row() {
        let page = r#"<table class="wikitable"><tr><th>Cases</th><th>Deaths</th></tr></table>"#;
        assert_eq!(Scraper::new().extract(page).unwrap_err(), ScrapeLayoutError::MissingRow);
    }

    // ==========================================================================
    // TABLE LOOKUP
    // ==========================================================================

    #[test]
    fn test_missing_table_is_layout_error() {
        let err = Scraper::new().extract("<html><body><p>moved</p></body></html>").unwrap_err();
        assert_eq!(err, ScrapeLayoutError::MissingTable("wikitable".into()));
    }

    #[test]
    fn test_custom_table_class() {
        let page = HEADER_PAGE.replace("wikitable", "stats");
        let scraper = Scraper::new().with_table_class("stats");
        assert_eq!(scraper.extract(&page).unwrap().cases, 1234);
    }

    #[test]
    fn test_extraction_from_toml() {
        #[derive(Deserialize)]
        struct Wrapper {
            extraction: Extraction,
        }
        let w: Wrapper = toml::from_str("[extraction]\nstrategy = \"header_cells\"\ncases = 7\ndeaths = 8\n").unwrap();
        assert_eq!(w.extraction, Extraction::header_cells());
    }
}
