mod args;
mod pipeline;

use clap::Parser;
use log::{info, warn};
use snafu::{prelude::*, ErrorCompat};

use crate::args::Args;
use crate::pipeline::config_reader::{
    read_config, AnalysisConfig, OutputSettings, RulesSettings, SourceSettings,
};
use crate::pipeline::io_common::simplify_file_name;
use crate::pipeline::io_http::SourceCache;
use crate::pipeline::{run_analysis, AnalysisResult, RunOptions};

// Builds a configuration when no config file was given: one local file or
// one public sheet, default rules unless flags say otherwise.
fn config_from_args(args: &Args) -> AnalysisResult<AnalysisConfig> {
    let mut report_title = "Innovation initiative analysis".to_string();
    let source = if let Some(input) = &args.input {
        report_title = format!("Innovation initiative analysis - {}", simplify_file_name(input));
        let provider = match args.input_type.as_deref() {
            Some("csv") => "csv",
            Some("excel") => "excel",
            Some(x) => {
                whatever!("Unknown input type {:?}", x)
            }
            None if input.ends_with(".xlsx") || input.ends_with(".xls") => "excel",
            None => "csv",
        };
        SourceSettings {
            provider: provider.to_string(),
            file_path: Some(input.clone()),
            sheet_id: None,
            excel_worksheet_name: args.excel_worksheet_name.clone(),
        }
    } else if let Some(sheet_id) = &args.sheet_id {
        SourceSettings {
            provider: "googleSheet".to_string(),
            file_path: None,
            sheet_id: Some(sheet_id.clone()),
            excel_worksheet_name: None,
        }
    } else {
        whatever!("No data source: pass --config, --input or --sheet-id")
    };

    Ok(AnalysisConfig {
        output_settings: OutputSettings {
            report_title,
            output_directory: None,
            generate_csv: None,
            generate_pdf: None,
        },
        source,
        rules: RulesSettings {
            scoring_variant: "weightedAverage".to_string(),
            schema_mode: "strict".to_string(),
            weights: None,
        },
        filters: None,
        credential_store: None,
        semantic_scoring: None,
    })
}

fn assemble_config(args: &Args) -> AnalysisResult<AnalysisConfig> {
    let mut config = match &args.config {
        Some(path) => read_config(path)?,
        None => config_from_args(args)?,
    };
    // Flags override the file where both are given.
    if let Some(input) = &args.input {
        if args.config.is_some() {
            let from_args = config_from_args(args)?;
            info!("assemble_config: --input {:?} overrides the configured source", input);
            config.source = from_args.source;
        }
    }
    if let Some(variant) = &args.variant {
        config.rules.scoring_variant = variant.clone();
    }
    if let Some(mode) = &args.schema_mode {
        config.rules.schema_mode = mode.clone();
    }
    Ok(config)
}

fn main() {
    let args = Args::parse();
    if args.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .init();
    } else {
        env_logger::init();
    }

    let options = RunOptions {
        summary_out: args.out.clone(),
        csv_out: args.csv_out.clone(),
        pdf_out: args.pdf_out.clone(),
        reference: args.reference.clone(),
        username: args.username.clone(),
        password: args.password.clone(),
    };

    let mut cache = SourceCache::new(SourceCache::DEFAULT_TTL);
    let res = assemble_config(&args).and_then(|config| run_analysis(&config, &mut cache, &options));
    if let Err(e) = res {
        warn!("Error occured {:?}", e);
        eprintln!("An error occured {}", e);
        if let Some(bt) = ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        std::process::exit(1);
    }
}
