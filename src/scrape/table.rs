//! Cell-level access to the data table of the live page
//!
//! Everything here works on an already parsed [`Html`] document and walks
//! the element tree directly. Wikipedia tables carry footnote markers
//! (`1,234[a]`), `colspan` headers and implicit `<tbody>` elements, all of
//! which are handled here so the strategies in [`super`] only deal with
//! indices and labels.

use crate::error::ScrapeLayoutError;
use scraper::{ElementRef, Html};
use serde::Serialize;

/// First `<table>` carrying `class` (in document order).
pub fn find_table<'a>(document: &'a Html, class: &str) -> Result<ElementRef<'a>, ScrapeLayoutError> {
    document
        .root_element()
        .descendants()
        .filter_map(ElementRef::wrap)
        .find(|e| e.value().name() == "table" && e.value().classes().any(|c| c == class))
        .ok_or_else(|| ScrapeLayoutError::MissingTable(class.to_string()))
}

/// Text of every `tag` element inside the table, in document order.
pub fn tag_texts(table: ElementRef<'_>, tag: &str) -> Vec<String> {
    table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == tag)
        .map(cell_text)
        .collect()
}

/// Rows of the table with each cell repeated `colspan` times, so that a
/// column index means the same thing in every row.
pub fn expanded_rows(table: ElementRef<'_>) -> Vec<Vec<String>> {
    table
        .descendants()
        .filter_map(ElementRef::wrap)
        .filter(|e| e.value().name() == "tr")
        .map(|row| {
            let mut cells = Vec::new();
            for cell in row
                .children()
                .filter_map(ElementRef::wrap)
                .filter(|c| matches!(c.value().name(), "th" | "td"))
            {
                let span = cell
                    .value()
                    .attr("colspan")
                    .and_then(|s| s.trim().parse::<usize>().ok())
                    .filter(|&n| n > 0)
                    .unwrap_or(1);
                let text = cell_text(cell);
                for _ in 0..span {
                    cells.push(text.clone());
                }
            }
            cells
        })
        .collect()
}

/// Visible text of a cell with footnote markers removed and whitespace
/// collapsed.
pub fn cell_text(cell: ElementRef<'_>) -> String {
    let raw: String = cell.text().collect();
    let stripped = strip_footnotes(&raw);
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Remove `[...]` footnote markers.
fn strip_footnotes(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut depth = 0usize;
    for ch in s.chars() {
        match ch {
            '[' => depth += 1,
            ']' if depth > 0 => depth -= 1,
            _ if depth == 0 => out.push(ch),
            _ => {}
        }
    }
    out
}

/// Parse a cumulative count such as `"1,234"` or `"1 234"`.
pub fn parse_count(field: &'static str, text: &str) -> Result<u64, ScrapeLayoutError> {
    let digits: String = strip_footnotes(text)
        .chars()
        .filter(|c| !matches!(c, ',' | ' ' | '\u{a0}' | '\u{2009}' | '\u{202f}'))
        .collect();

    digits.trim().parse::<u64>().map_err(|_| ScrapeLayoutError::NotNumeric {
        field,
        text: text.trim().to_string(),
    })
}

/// What the `probe` command shows about the data table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ProbeReport {
    /// Text of every `th` cell (the positional header-cell strategy indexes this)
    pub header_cells: Vec<String>,
    /// Text of every `b` element (the bold-text strategy indexes this)
    pub bold_cells: Vec<String>,
    /// First few rows after colspan expansion
    pub rows: Vec<Vec<String>>,
}

const PROBE_ROWS: usize = 4;

/// Describe the data table so extraction indices can be re-derived.
pub fn probe(html: &str, class: &str) -> Result<ProbeReport, ScrapeLayoutError> {
    let document = Html::parse_document(html);
    let table = find_table(&document, class)?;

    Ok(ProbeReport {
        header_cells: tag_texts(table, "th"),
        bold_cells: tag_texts(table, "b"),
        rows: expanded_rows(table).into_iter().take(PROBE_ROWS).collect(),
    })
}
