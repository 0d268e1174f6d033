//! Reference dataset loading and live-record merging
//!
//! The reference table is a CSV of historical epidemics with the columns
//! `disease,type,cases,deaths,source`. Headers are matched by name, so extra
//! columns are ignored and column order does not matter.

use crate::error::DatasetError;
use log::{debug, info, warn};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::path::Path;

/// Disease family, used for colouring and legend grouping.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum DiseaseType {
    Influenza,
    Coronavirus,
    Ebolavirus,
    Other(String),
}

impl DiseaseType {
    pub fn as_str(&self) -> &str {
        match self {
            DiseaseType::Influenza => "Influenza",
            DiseaseType::Coronavirus => "Coronavirus",
            DiseaseType::Ebolavirus => "Ebolavirus",
            DiseaseType::Other(s) => s,
        }
    }
}

impl From<&str> for DiseaseType {
    fn from(s: &str) -> Self {
        match s.trim() {
            "Influenza" => DiseaseType::Influenza,
            "Coronavirus" => DiseaseType::Coronavirus,
            "Ebolavirus" => DiseaseType::Ebolavirus,
            other => DiseaseType::Other(other.to_string()),
        }
    }
}

impl fmt::Display for DiseaseType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for DiseaseType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for DiseaseType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(DiseaseType::from(s.as_str()))
    }
}

/// One row of the reference table, or the live record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiseaseRecord {
    #[serde(rename = "disease")]
    pub name: String,
    #[serde(rename = "type")]
    pub disease_type: DiseaseType,
    pub cases: u64,
    pub deaths: u64,
    #[serde(default)]
    pub source: String,
}

/// Load the reference table from a CSV file.
///
/// Any unreadable file or malformed row aborts the load; there is no
/// partial result.
pub fn load<P: AsRef<Path>>(path: P) -> Result<Vec<DiseaseRecord>, DatasetError> {
    let path = path.as_ref();
    let file = std::fs::File::open(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let records = read(file)?;
    if records.is_empty() {
        return Err(DatasetError::Empty(path.to_path_buf()));
    }

    info!("Loaded {} reference records from {}", records.len(), path.display());
    Ok(records)
}

/// Parse reference records from any CSV reader.
pub fn read<R: std::io::Read>(reader: R) -> Result<Vec<DiseaseRecord>, DatasetError> {
    let mut reader = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);

    let mut records = Vec::new();
    for row in reader.deserialize() {
        let record: DiseaseRecord = row.map_err(|e| DatasetError::Malformed {
            line: e.position().map(|p| p.line()).unwrap_or(0),
            message: e.to_string(),
        })?;
        debug!("  {} ({}): {} cases, {} deaths", record.name, record.disease_type, record.cases, record.deaths);
        records.push(record);
    }

    Ok(records)
}

/// Append the live record to the reference table.
///
/// No deduplication happens here. A name collision is only logged; every
/// consumer treats the last row with the live name as the live row.
pub fn merge(mut reference: Vec<DiseaseRecord>, live: DiseaseRecord) -> Vec<DiseaseRecord> {
    if reference.iter().any(|r| r.name == live.name) {
        warn!("Reference table already has a `{}` row; the live row takes precedence", live.name);
    }
    reference.push(live);
    reference
}

/// Index of the row treated as the live record (the last one with that name).
pub fn live_index(records: &[DiseaseRecord], live_name: &str) -> Option<usize> {
    records.iter().rposition(|r| r.name == live_name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const SAMPLE: &str = "\
disease,type,cases,deaths,source
Seasonal Influenza,Influenza,1000000000,400000,https://www.who.int/flu
SARS,Coronavirus,8096,774,https://www.who.int/sars
Ebola,Ebolavirus,28646,11323,https://www.who.int/ebola
";

    fn record(name: &str, cases: u64, deaths: u64) -> DiseaseRecord {
        DiseaseRecord {
            name: name.to_string(),
            disease_type: DiseaseType::Coronavirus,
            cases,
            deaths,
            source: String::new(),
        }
    }

    // ==========================================================================
    // LOADER TESTS
    // ==========================================================================

    #[test]
    fn test_read_sample() {
        let records = read(SAMPLE.as_bytes()).unwrap();

        assert_eq!(records.len(), 3);
        assert_eq!(records[0].name, "Seasonal Influenza");
        assert_eq!(records[0].disease_type, DiseaseType::Influenza);
        assert_eq!(records[1].cases, 8096);
        assert_eq!(records[2].deaths, 11323);
        assert_eq!(records[2].source, "https://www.who.int/ebola");
    }

    #[test]
    fn test_read_reordered_and_extra_columns() {
        let csv = "source,deaths,cases,disease,type,notes\nx,10,100,Measles,Morbillivirus,ignored\n";
        let records = read(csv.as_bytes()).unwrap();

        assert_eq!(records[0].name, "Measles");
        assert_eq!(records[0].disease_type, DiseaseType::Other("Morbillivirus".into()));
        assert_eq!(records[0].cases, 100);
    }

    #[test]
    fn test_read_non_numeric_count_is_malformed() {
        let csv = "disease,type,cases,deaths,source\nSARS,Coronavirus,lots,774,x\n";
        match read(csv.as_bytes()) {
            Err(DatasetError::Malformed { line, .. }) => assert_eq!(line, 2),
            other => panic!("expected Malformed, got {:?}", other),
        }
    }

    #[test]
    fn test_read_missing_column_is_malformed() {
        let csv = "disease,type,cases\nSARS,Coronavirus,8096\n";
        assert!(matches!(read(csv.as_bytes()), Err(DatasetError::Malformed { .. })));
    }

    #[test]
    fn test_load_missing_file() {
        let err = load("/definitely/not/here.csv").unwrap_err();
        assert!(matches!(err, DatasetError::Io { .. }));
    }

    #[test]
    fn test_load_empty_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "disease,type,cases,deaths,source").unwrap();

        assert!(matches!(load(file.path()), Err(DatasetError::Empty(_))));
    }

    #[test]
    fn test_load_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(SAMPLE.as_bytes()).unwrap();

        let records = load(file.path()).unwrap();
        assert_eq!(records.len(), 3);
    }

    // ==========================================================================
    // MERGER TESTS
    // ==========================================================================

    #[test]
    fn test_merge_appends_exactly_one() {
        let reference = read(SAMPLE.as_bytes()).unwrap();
        let before = reference.len();

        let merged = merge(reference, record("Covid-19", 1234, 56));

        assert_eq!(merged.len(), before + 1);
        assert_eq!(merged.last().unwrap().name, "Covid-19");
    }

    #[test]
    fn test_merge_keeps_collisions_and_last_wins() {
        let reference = vec![record("Covid-19", 10, 1), record("SARS", 8096, 774)];
        let merged = merge(reference, record("Covid-19", 1234, 56));

        assert_eq!(merged.len(), 3);
        assert_eq!(live_index(&merged, "Covid-19"), Some(2));
    }

    #[test]
    fn test_live_index_absent() {
        let records = vec![record("SARS", 8096, 774)];
        assert_eq!(live_index(&records, "Covid-19"), None);
    }

    #[test]
    fn test_disease_type_round_trip_names() {
        for name in ["Influenza", "Coronavirus", "Ebolavirus", "Paramyxovirus"] {
            assert_eq!(DiseaseType::from(name).as_str(), name);
        }
    }
}
