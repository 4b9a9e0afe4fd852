// Optional semantic scoring through a chat-completions endpoint. One call
// per initiative, strictly sequential, no retry: a failed row degrades to
// the default analysis and the loop keeps going.

use log::{info, warn};
use serde_json::json;
use snafu::prelude::*;

use crate::pipeline::config_reader::SemanticScoringSettings;
use crate::pipeline::*;
use initiative_scoring::ScoredInitiative;

/// What one semantic-scoring call produced for one initiative.
#[derive(PartialEq, Debug, Clone)]
pub struct SemanticAnalysis {
    pub initiative: String,
    pub assessment: String,
    /// The model's priority suggestion on the [0, 5] scale. `None` when the
    /// reply was unusable.
    pub suggested_priority: Option<f64>,
}

const DEFAULT_ASSESSMENT: &str = "Semantic analysis unavailable for this initiative";

const SYSTEM_PROMPT: &str = "You assess innovation initiatives. Reply with one line: \
a priority score between 0 and 5 with one decimal, a '|' separator, then a one-sentence \
assessment of the initiative.";

fn default_analysis(initiative: &ScoredInitiative) -> SemanticAnalysis {
    SemanticAnalysis {
        initiative: initiative.record.initiative.clone(),
        assessment: DEFAULT_ASSESSMENT.to_string(),
        suggested_priority: None,
    }
}

/// Annotates every initiative in order. Requires the API key in the
/// configured environment variable; without it every row gets the default
/// analysis and the pipeline stays alive.
pub fn annotate(
    settings: &SemanticScoringSettings,
    initiatives: &[ScoredInitiative],
) -> Vec<SemanticAnalysis> {
    let api_key = std::env::var(&settings.api_key_env).unwrap_or_default();
    if api_key.is_empty() {
        warn!(
            "annotate: {} is not set, skipping semantic scoring",
            settings.api_key_env
        );
        return initiatives.iter().map(default_analysis).collect();
    }

    let client = reqwest::blocking::Client::new();
    let total = initiatives.len();
    initiatives
        .iter()
        .enumerate()
        .map(|(idx, initiative)| {
            info!(
                "annotate: scoring initiative {}/{}: {}",
                idx + 1,
                total,
                initiative.record.initiative
            );
            match analyze_one(&client, settings, &api_key, initiative) {
                Ok(analysis) => analysis,
                Err(e) => {
                    warn!(
                        "annotate: {} failed ({}), using the default analysis",
                        initiative.record.initiative, e
                    );
                    default_analysis(initiative)
                }
            }
        })
        .collect()
}

fn user_prompt(initiative: &ScoredInitiative) -> String {
    format!(
        "Initiative: {}\nProblem: {}\nProposal: {}\nExpected benefits: {}",
        initiative.record.initiative,
        initiative.record.problem,
        initiative.record.proposal,
        initiative.record.benefits
    )
}

fn analyze_one(
    client: &reqwest::blocking::Client,
    settings: &SemanticScoringSettings,
    api_key: &str,
    initiative: &ScoredInitiative,
) -> AnalysisResult<SemanticAnalysis> {
    let body = json!({
        "model": settings.model,
        "messages": [
            { "role": "system", "content": SYSTEM_PROMPT },
            { "role": "user", "content": user_prompt(initiative) }
        ],
        "max_tokens": 200,
        "temperature": 0.2,
    });
    let url = settings.endpoint.as_str();
    let response = client
        .post(url)
        .bearer_auth(api_key)
        .json(&body)
        .send()
        .context(HttpFetchSnafu { url })?;
    let response = response.error_for_status().context(HttpFetchSnafu { url })?;
    let reply: serde_json::Value = response.json().context(HttpFetchSnafu { url })?;

    let content = match reply["choices"][0]["message"]["content"].as_str() {
        Some(c) => c.trim(),
        None => {
            whatever!("Malformed completion reply: {}", reply)
        }
    };
    parse_reply(&initiative.record.initiative, content)
}

// Expected reply shape: "3.5 | One-sentence assessment".
fn parse_reply(initiative: &str, content: &str) -> AnalysisResult<SemanticAnalysis> {
    let (score_part, assessment) = match content.split_once('|') {
        Some((s, a)) => (s.trim(), a.trim()),
        None => {
            whatever!("Reply has no score separator: {:?}", content)
        }
    };
    let score = match score_part.parse::<f64>() {
        Ok(x) if x.is_finite() => x.clamp(0.0, 5.0),
        _ => {
            whatever!("Reply score is not numeric: {:?}", score_part)
        }
    };
    if assessment.is_empty() {
        whatever!("Reply has an empty assessment: {:?}", content)
    }
    Ok(SemanticAnalysis {
        initiative: initiative.to_string(),
        assessment: assessment.to_string(),
        suggested_priority: Some(score),
    })
}
