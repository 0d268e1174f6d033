use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use log::{error, LevelFilter};
use outbreak_viz::error::FetchError;
use outbreak_viz::scrape::{self, LiveSource};
use outbreak_viz::{pipeline, Config, FileSource, HttpSource, PipelineError};
use simple_logger::SimpleLogger;
use std::path::PathBuf;
use std::time::Duration;

#[derive(Parser, Debug)]
#[command(name = "outbreak-viz")]
#[command(author, version, about = "Chart live outbreak figures against historical epidemics")]
struct Args {
    #[command(subcommand)]
    command: Option<Command>,

    /// Reference dataset (CSV: disease,type,cases,deaths,source)
    #[arg(short, long)]
    dataset: Option<PathBuf>,

    /// Output file (.html, .json, .csv)
    #[arg(short, long)]
    output: Option<PathBuf>,

    /// TOML config file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Read the live page from a saved HTML file instead of the network
    #[arg(long, global = true)]
    fixture: Option<PathBuf>,

    /// Live page URL
    #[arg(long, global = true)]
    url: Option<String>,

    /// Open the report when done
    #[arg(long)]
    open: bool,

    /// Show debug logging
    #[arg(short, long)]
    verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long)]
    quiet: bool,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List the cells of the live page's data table with their indices
    Probe {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },
}

/// Shows a spinner while the wrapped source is fetching.
struct Spinner<S> {
    inner: S,
    enabled: bool,
}

impl<S: LiveSource> LiveSource for Spinner<S> {
    fn fetch_document(&self) -> Result<String, FetchError> {
        if !self.enabled {
            return self.inner.fetch_document();
        }

        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.green} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(format!("Fetching {}", self.inner.describe()));
        pb.enable_steady_tick(Duration::from_millis(100));

        let result = self.inner.fetch_document();
        pb.finish_and_clear();
        result
    }

    fn describe(&self) -> String {
        self.inner.describe()
    }
}

fn main() {
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::Debug
    } else if args.quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    };
    SimpleLogger::new()
        .with_level(level)
        .with_module_level("html5ever", LevelFilter::Warn)
        .with_module_level("selectors", LevelFilter::Warn)
        .with_module_level("reqwest", LevelFilter::Warn)
        .init()
        .ok();

    if let Err(e) = run(args) {
        error!("{}", e);
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), PipelineError> {
    let mut config = match args.config {
        Some(ref path) => Config::load(path)?,
        None => Config::default(),
    };
    if let Some(dataset) = args.dataset {
        config.dataset = dataset;
    }
    if let Some(output) = args.output {
        config.output = output;
    }
    if let Some(url) = args.url {
        config.url = url;
    }
    config.validate()?;

    let inner: Box<dyn LiveSource> = match args.fixture {
        Some(path) => Box::new(FileSource::new(path)),
        None => Box::new(
            HttpSource::new(config.url.clone()).with_timeout(Duration::from_secs(config.timeout_secs)),
        ),
    };
    let source = Spinner {
        inner,
        enabled: !args.quiet,
    };

    if let Some(Command::Probe { json }) = args.command {
        return probe(&config, &source, json);
    }

    let path = pipeline::run(&config, &source)?;
    if !args.quiet {
        eprintln!("\n\x1b[32mChart saved: {}\x1b[0m", path.display());
    }

    if args.open {
        if let Err(e) = open::that(&path) {
            eprintln!("Failed to open report: {}", e);
        }
    }

    Ok(())
}

fn probe<S: LiveSource>(config: &Config, source: &S, json: bool) -> Result<(), PipelineError> {
    let html = source.fetch_document()?;
    let report = scrape::probe(&html, &config.table_class)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
        return Ok(());
    }

    println!("{:<5} {:<30} {}", "IDX", "HEADER CELL (th)", "BOLD (b)");
    println!("{}", "-".repeat(60));
    let n = report.header_cells.len().max(report.bold_cells.len());
    for i in 0..n {
        println!(
            "{:<5} {:<30} {}",
            i,
            truncate(report.header_cells.get(i).map(String::as_str).unwrap_or(""), 30),
            truncate(report.bold_cells.get(i).map(String::as_str).unwrap_or(""), 30)
        );
    }

    println!("\nFirst rows (colspan expanded):");
    for (r, row) in report.rows.iter().enumerate() {
        println!("  [{}] {}", r, row.join(" | "));
    }

    Ok(())
}

fn truncate(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let head: String = s.chars().take(max_len - 3).collect();
        format!("{}...", head)
    }
}
