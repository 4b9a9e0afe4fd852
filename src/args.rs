use clap::Parser;

/// This is an analysis and prioritization program for innovation-initiative
/// surveys.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) JSON analysis configuration. For the format,
    /// read the repository documentation.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A local CSV or XLSX survey export to analyze. Overrides
    /// the source that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default csv) The type of the input: csv or excel. Inferred from the
    /// file extension when not specified.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (sheet id) Fetch the table from a public Google Sheets document
    /// instead of a local file. The sheet must be shared as "anyone with
    /// the link can view".
    #[clap(long, value_parser)]
    pub sheet_id: Option<String>,

    /// (default weightedAverage) The scoring variant: weightedAverage or
    /// effortImpact.
    #[clap(long, value_parser)]
    pub variant: Option<String>,

    /// (default strict) Policy for missing required columns: strict or
    /// lenient.
    #[clap(long, value_parser)]
    pub schema_mode: Option<String>,

    /// (file path, 'stdout' or empty) Where the JSON summary of the
    /// analysis is written.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, inirank
    /// will check that the computed summary matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path) Write the scored table as a CSV export.
    #[clap(long, value_parser)]
    pub csv_out: Option<String>,

    /// (file path) Write the executive report as a PDF document.
    #[clap(long, value_parser)]
    pub pdf_out: Option<String>,

    /// When reading an Excel file, indicates the name of the worksheet to
    /// use. Not needed for single-worksheet workbooks.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// Username for a credential-gated configuration.
    #[clap(long, value_parser)]
    pub username: Option<String>,

    /// Password for a credential-gated configuration.
    #[clap(long, value_parser)]
    pub password: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
