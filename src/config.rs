//! Run configuration
//!
//! Precedence is built-in defaults, then the optional TOML file, then CLI
//! flags (applied in `main`). A minimal config file:
//!
//! ```toml
//! url = "https://en.wikipedia.org/wiki/COVID-19_pandemic_by_country_and_territory"
//!
//! [extraction]
//! strategy = "header_cells"
//! cases = 7
//! deaths = 8
//!
//! [[labels]]
//! name = "Swine Flu"
//! x_offset = -110
//! y_offset = 30
//! ```

use crate::chart::ChartConfig;
use crate::dataset::{DiseaseRecord, DiseaseType};
use crate::error::ConfigError;
use crate::metrics::{LabelOverride, LabelTable};
use crate::scrape::source::DEFAULT_URL;
use crate::scrape::{Extraction, LiveFigures, Scraper, DEFAULT_TABLE_CLASS};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Identity of the record built from the live figures.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LiveRecord {
    pub name: String,
    #[serde(rename = "type")]
    pub disease_type: DiseaseType,
    /// Citation for the live row; the fetch origin when unset
    pub source: Option<String>,
}

impl Default for LiveRecord {
    fn default() -> Self {
        Self {
            name: "Covid-19".to_string(),
            disease_type: DiseaseType::Coronavirus,
            source: None,
        }
    }
}

impl LiveRecord {
    pub fn to_record(&self, figures: LiveFigures, origin: &str) -> DiseaseRecord {
        DiseaseRecord {
            name: self.name.clone(),
            disease_type: self.disease_type.clone(),
            cases: figures.cases,
            deaths: figures.deaths,
            source: self.source.clone().unwrap_or_else(|| origin.to_string()),
        }
    }
}

/// Page text and sharing metadata.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PageConfig {
    pub title: String,
    pub description: String,
    pub url: Option<String>,
}

impl Default for PageConfig {
    fn default() -> Self {
        Self {
            title: "Why Covid-19 is different".to_string(),
            description: "Covid-19 cases and mortality compared with past epidemics".to_string(),
            url: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub dataset: PathBuf,
    pub output: PathBuf,
    pub url: String,
    pub timeout_secs: u64,
    pub table_class: String,
    pub extraction: Extraction,
    pub live: LiveRecord,
    pub page: PageConfig,
    pub chart: ChartConfig,
    pub labels: Vec<LabelOverride>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dataset: PathBuf::from("data/diseases.csv"),
            output: PathBuf::from("covidvis.html"),
            url: DEFAULT_URL.to_string(),
            timeout_secs: 30,
            table_class: DEFAULT_TABLE_CLASS.to_string(),
            extraction: Extraction::default(),
            live: LiveRecord::default(),
            page: PageConfig::default(),
            chart: ChartConfig::default(),
            labels: Vec::new(),
        }
    }
}

impl Config {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config: Config = toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.live.name.trim().is_empty() {
            return Err(ConfigError::Invalid("live.name must not be empty".into()));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".into()));
        }
        if self.table_class.trim().is_empty() {
            return Err(ConfigError::Invalid("table_class must not be empty".into()));
        }
        if self.chart.slider_max == 0 {
            return Err(ConfigError::Invalid("chart.slider_max must be positive".into()));
        }
        match &self.extraction {
            Extraction::HeaderColumns { cases, deaths } => {
                if cases.trim().is_empty() || deaths.trim().is_empty() {
                    return Err(ConfigError::Invalid("extraction labels must not be empty".into()));
                }
            }
            Extraction::HeaderCells { cases, deaths } | Extraction::BoldText { cases, deaths } => {
                if cases == deaths {
                    return Err(ConfigError::Invalid(format!(
                        "extraction reads cases and deaths from the same index {}",
                        cases
                    )));
                }
            }
        }
        if let Some(o) = self.labels.iter().find(|o| o.name.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("label override without a name: {:?}", o)));
        }
        Ok(())
    }

    pub fn scraper(&self) -> Scraper {
        Scraper::new()
            .with_extraction(self.extraction.clone())
            .with_table_class(self.table_class.clone())
    }

    /// Built-in label placement with the file's overrides applied on top.
    pub fn label_table(&self) -> LabelTable {
        let mut table = LabelTable::builtin(&self.live.name);
        for o in &self.labels {
            table.apply(o);
        }
        table
    }
}
