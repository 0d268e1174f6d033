//! CSV report: the merged table with its derived columns

use crate::metrics::MetricRow;
use serde::Serialize;
use std::io::{self, Write};

#[derive(Serialize)]
struct CsvRow<'a> {
    disease: &'a str,
    #[serde(rename = "type")]
    disease_type: &'a str,
    cases: u64,
    deaths: u64,
    mortality: f64,
    color: &'a str,
    size: f64,
    live: bool,
    source: &'a str,
}

pub fn write<W: Write>(writer: &mut W, rows: &[MetricRow]) -> io::Result<()> {
    let mut out = csv::Writer::from_writer(writer);
    for r in rows {
        out.serialize(CsvRow {
            disease: &r.name,
            disease_type: r.disease_type.as_str(),
            cases: r.cases,
            deaths: r.deaths,
            mortality: r.mortality,
            color: r.color,
            size: r.size,
            live: r.live,
            source: &r.source,
        })?;
    }
    out.flush()
}
