use crate::pipeline::*;

use initiative_scoring::{
    CriterionWeights, FilterSpec, PriorityTier, Quadrant, SchemaMode, ScoringRules, ScoringVariant,
};
use serde::{Deserialize, Serialize};
use snafu::prelude::*;
use std::fs;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "reportTitle")]
    pub report_title: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "generateCsv")]
    pub generate_csv: Option<bool>,
    #[serde(rename = "generatePdf")]
    pub generate_pdf: Option<bool>,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SourceSettings {
    /// One of "csv", "excel" or "googleSheet".
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: Option<String>,
    #[serde(rename = "sheetId")]
    pub sheet_id: Option<String>,
    #[serde(rename = "excelWorksheetName")]
    pub excel_worksheet_name: Option<String>,
}

impl SourceSettings {
    pub fn file_path(&self) -> AnalysisResult<String> {
        match &self.file_path {
            Some(p) => Ok(p.clone()),
            None => whatever!("The {:?} provider needs a filePath entry", self.provider),
        }
    }

    pub fn sheet_id(&self) -> AnalysisResult<String> {
        match &self.sheet_id {
            Some(id) => Ok(id.clone()),
            None => whatever!("The googleSheet provider needs a sheetId entry"),
        }
    }
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct WeightSettings {
    #[serde(rename = "strategicValue")]
    pub strategic_value: f64,
    pub impact: f64,
    pub feasibility: f64,
    #[serde(rename = "costBenefit")]
    pub cost_benefit: f64,
    pub innovation: f64,
    pub scalability: f64,
    #[serde(rename = "implementationTime")]
    pub implementation_time: f64,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct RulesSettings {
    #[serde(rename = "scoringVariant")]
    pub scoring_variant: String,
    #[serde(rename = "schemaMode")]
    pub schema_mode: String,
    /// Optional override of the default criterion weights. Must sum to 1.
    pub weights: Option<WeightSettings>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FilterSettings {
    pub areas: Option<Vec<String>>,
    pub tiers: Option<Vec<String>>,
    pub quadrants: Option<Vec<String>>,
    pub processes: Option<Vec<String>>,
    #[serde(rename = "minScore")]
    pub min_score: Option<f64>,
    #[serde(rename = "maxScore")]
    pub max_score: Option<f64>,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct SemanticScoringSettings {
    /// Chat-completions endpoint URL.
    pub endpoint: String,
    pub model: String,
    /// Name of the environment variable holding the API key. The key itself
    /// never goes in the configuration file.
    #[serde(rename = "apiKeyEnv")]
    pub api_key_env: String,
}

#[derive(PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    pub source: SourceSettings,
    pub rules: RulesSettings,
    pub filters: Option<FilterSettings>,
    #[serde(rename = "credentialStore")]
    pub credential_store: Option<String>,
    #[serde(rename = "semanticScoring")]
    pub semantic_scoring: Option<SemanticScoringSettings>,
}

pub fn read_config(path: &str) -> AnalysisResult<AnalysisConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let config: AnalysisConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu {})?;
    Ok(config)
}

pub fn validate_rules(settings: &RulesSettings) -> AnalysisResult<ScoringRules> {
    let res = ScoringRules {
        variant: match settings.scoring_variant.as_str() {
            "weightedAverage" => ScoringVariant::WeightedAverage,
            "effortImpact" => ScoringVariant::EffortImpact,
            x => {
                whatever!("Unknown scoring variant {:?}", x)
            }
        },
        schema_mode: match settings.schema_mode.as_str() {
            "strict" => SchemaMode::Strict,
            "lenient" => SchemaMode::Lenient,
            x => {
                whatever!("Unknown schema mode {:?}", x)
            }
        },
        weights: match &settings.weights {
            Some(w) => CriterionWeights {
                strategic_value: w.strategic_value,
                impact: w.impact,
                feasibility: w.feasibility,
                cost_benefit: w.cost_benefit,
                innovation: w.innovation,
                scalability: w.scalability,
                implementation_time: w.implementation_time,
            },
            None => CriterionWeights::DEFAULT,
        },
    };
    Ok(res)
}

fn parse_tier(label: &str) -> AnalysisResult<PriorityTier> {
    match label {
        "high" => Ok(PriorityTier::High),
        "medium" => Ok(PriorityTier::Medium),
        "low" => Ok(PriorityTier::Low),
        x => whatever!("Unknown priority tier {:?}", x),
    }
}

fn parse_quadrant(label: &str) -> AnalysisResult<Quadrant> {
    match label {
        "quickWin" => Ok(Quadrant::QuickWin),
        "strategic" => Ok(Quadrant::Strategic),
        "filler" => Ok(Quadrant::Filler),
        "lowPriority" => Ok(Quadrant::LowPriority),
        x => whatever!("Unknown quadrant {:?}", x),
    }
}

pub fn validate_filters(settings: &FilterSettings) -> AnalysisResult<FilterSpec> {
    let tiers = match &settings.tiers {
        Some(labels) => Some(
            labels
                .iter()
                .map(|l| parse_tier(l))
                .collect::<AnalysisResult<Vec<_>>>()?,
        ),
        None => None,
    };
    let quadrants = match &settings.quadrants {
        Some(labels) => Some(
            labels
                .iter()
                .map(|l| parse_quadrant(l))
                .collect::<AnalysisResult<Vec<_>>>()?,
        ),
        None => None,
    };
    let score_range = match (settings.min_score, settings.max_score) {
        (None, None) => None,
        (lo, hi) => Some((lo.unwrap_or(0.0), hi.unwrap_or(5.0))),
    };
    Ok(FilterSpec {
        areas: settings.areas.clone(),
        tiers,
        quadrants,
        processes: settings.processes.clone(),
        score_range,
    })
}
