use log::{info, warn};

use initiative_scoring::*;
use snafu::{prelude::*, Snafu};

use std::fs;

use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::pipeline::config_reader::*;

pub mod ai;
pub mod auth;
pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod io_excel;
pub mod io_http;
pub mod report;
pub mod report_pdf;

#[derive(Debug, Snafu)]
pub enum AnalysisError {
    #[snafu(display("Error opening workbook {path}"))]
    OpeningExcel {
        source: calamine::XlsxError,
        path: String,
    },
    #[snafu(display("The workbook has no usable worksheet"))]
    EmptyExcel {},
    #[snafu(display("Error opening {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Invalid JSON"))]
    ParsingJson { source: serde_json::Error },
    #[snafu(display("CSV error in {path}"))]
    Csv { source: csv::Error, path: String },
    #[snafu(display("CSV record {lineno} could not be parsed"))]
    CsvLineParse { source: csv::Error, lineno: usize },
    #[snafu(display("Fetching {url}"))]
    HttpFetch { source: reqwest::Error, url: String },
    #[snafu(display(
        "All export URLs failed for sheet {sheet_id}. Check that the sheet is shared as \
         'anyone with the link can view' and that the id is correct, or load a local file instead"
    ))]
    SheetUnavailable { sheet_id: String },
    #[snafu(display("The table could not be scored: {source}"))]
    Scoring { source: ScoringErrors },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error assembling the PDF report"))]
    PdfBuild { source: lopdf::Error },
    #[snafu(display("Unknown user or wrong password"))]
    CredentialsRejected {},

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Output destinations and credentials for one run, as resolved from the
/// command line. These override the corresponding configuration entries.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RunOptions {
    /// A file path, "stdout", or nothing (also stdout).
    pub summary_out: Option<String>,
    pub csv_out: Option<String>,
    pub pdf_out: Option<String>,
    /// Reference summary to compare against; a difference fails the run.
    pub reference: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

fn load_table(
    config: &AnalysisConfig,
    cache: &mut io_http::SourceCache,
) -> AnalysisResult<RawTable> {
    let source = &config.source;
    match source.provider.as_str() {
        "csv" => {
            let path = source.file_path()?;
            io_csv::read_csv_table(&path)
        }
        "excel" => {
            let path = source.file_path()?;
            io_excel::read_excel_table(&path, source.excel_worksheet_name.as_deref())
        }
        "googleSheet" => {
            let sheet_id = source.sheet_id()?;
            let body = io_http::fetch_sheet_csv(cache, &sheet_id)?;
            io_csv::read_csv_str(&body)
        }
        x => {
            whatever!("Source provider not implemented {:?}", x)
        }
    }
}

fn check_credentials(config: &AnalysisConfig, options: &RunOptions) -> AnalysisResult<()> {
    let store_path = match &config.credential_store {
        Some(p) => p,
        None => return Ok(()),
    };
    let store = auth::read_store(store_path)?;
    let (username, password) = match (&options.username, &options.password) {
        (Some(u), Some(p)) => (u, p),
        _ => {
            whatever!("This configuration is credential-gated: pass --username and --password")
        }
    };
    if !auth::verify(&store, username, password) {
        return CredentialsRejectedSnafu {}.fail();
    }
    Ok(())
}

fn compare_reference(reference_path: &str, summary: &JSValue) -> AnalysisResult<()> {
    let contents = fs::read_to_string(reference_path).context(OpeningFileSnafu {
        path: reference_path,
    })?;
    let reference: JSValue = serde_json::from_str(&contents).context(ParsingJsonSnafu {})?;
    let pretty_reference = serde_json::to_string_pretty(&reference).context(ParsingJsonSnafu {})?;
    let pretty_summary = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    if pretty_reference != pretty_summary {
        warn!("Found differences with the reference summary");
        print_diff(pretty_reference.as_str(), pretty_summary.as_str(), "\n");
        whatever!("Difference detected between computed summary and reference summary")
    }
    Ok(())
}

fn write_summary(destination: Option<&str>, summary: &JSValue) -> AnalysisResult<()> {
    let pretty = serde_json::to_string_pretty(summary).context(ParsingJsonSnafu {})?;
    match destination {
        None | Some("stdout") => {
            println!("{}", pretty);
        }
        Some(path) => {
            fs::write(path, pretty).context(WritingOutputSnafu { path })?;
            info!("write_summary: wrote {}", path);
        }
    }
    Ok(())
}

// Output paths: an explicit flag wins, otherwise the configured output
// directory with a fixed file name.
fn artifact_path(
    explicit: &Option<String>,
    config: &AnalysisConfig,
    enabled: bool,
    file_name: &str,
) -> Option<String> {
    if let Some(p) = explicit {
        return Some(p.clone());
    }
    if !enabled {
        return None;
    }
    let dir = config
        .output_settings
        .output_directory
        .clone()
        .unwrap_or_else(|| ".".to_string());
    Some(format!("{}/{}", dir, file_name))
}

/// Runs the whole pipeline for one load attempt: credential gate, load,
/// normalize, score, filter, optional semantic annotation, artifacts,
/// reference check. A failure anywhere halts this attempt only; the caller
/// stays free to retry with another source.
pub fn run_analysis(
    config: &AnalysisConfig,
    cache: &mut io_http::SourceCache,
    options: &RunOptions,
) -> AnalysisResult<()> {
    check_credentials(config, options)?;

    let rules = validate_rules(&config.rules)?;

    let table = load_table(config, cache)?;
    info!(
        "run_analysis: loaded {} rows, digest {}",
        table.rows.len(),
        table_digest(&table)
    );

    let (records, stats) = normalize_table(&table, rules.schema_mode).context(ScoringSnafu {})?;
    for name in &stats.zero_filled {
        warn!("run_analysis: column {:?} was absent and scored as zeros", name);
    }

    let mut result = run_scoring_stats(&records, &rules).context(ScoringSnafu {})?;

    if let Some(filter_settings) = &config.filters {
        let filters = validate_filters(filter_settings)?;
        let kept: Vec<InitiativeRecord> = apply_filters(&result.initiatives, &filters)
            .iter()
            .map(|s| s.record.clone())
            .collect();
        info!(
            "run_analysis: filters kept {} of {} initiatives",
            kept.len(),
            result.initiatives.len()
        );
        // Ranks and aggregates are recomputed within the selection.
        result = run_scoring_stats(&kept, &rules).context(ScoringSnafu {})?;
    }

    if result.initiatives.is_empty() {
        warn!("run_analysis: no valid initiatives survived loading and filtering");
    }

    let analyses = config
        .semantic_scoring
        .as_ref()
        .map(|settings| ai::annotate(settings, &result.initiatives));

    let summary = report::build_summary_js(config, &rules, &result, &stats, analyses.as_deref());

    if let Some(path) = artifact_path(
        &options.csv_out,
        config,
        config.output_settings.generate_csv.unwrap_or(false),
        "initiatives.csv",
    ) {
        report::write_csv_export(&path, &result)?;
        info!("run_analysis: wrote {}", path);
    }

    if let Some(path) = artifact_path(
        &options.pdf_out,
        config,
        config.output_settings.generate_pdf.unwrap_or(false),
        "executive_report.pdf",
    ) {
        report_pdf::write_pdf_report(&path, &config.output_settings.report_title, &result)?;
        info!("run_analysis: wrote {}", path);
    }

    write_summary(options.summary_out.as_deref(), &summary)?;

    if let Some(reference_path) = &options.reference {
        compare_reference(reference_path, &summary)?;
    }

    Ok(())
}
