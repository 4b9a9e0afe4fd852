// Rendering of the analysis artifacts: the CSV export of the scored table,
// the JSON summary, and the recommendation strings shared with the PDF
// report.

use csv::Writer;
use log::debug;
use serde_json::{json, Value as JSValue};
use snafu::prelude::*;

use crate::pipeline::ai::SemanticAnalysis;
use crate::pipeline::config_reader::AnalysisConfig;
use crate::pipeline::io_common::truncate_chars;
use crate::pipeline::*;
use initiative_scoring::*;

/// Canonical + derived header row of the CSV export.
const EXPORT_HEADERS: [&str; 21] = [
    "rank",
    "initiative",
    "proposer",
    "area",
    "processes",
    "problem",
    "proposal",
    "benefits",
    "strategic_value",
    "impact",
    "feasibility",
    "cost_benefit",
    "innovation",
    "scalability",
    "implementation_time",
    "total",
    "weighted",
    "tier",
    "ease_of_implementation",
    "effort_impact_score",
    "quadrant",
];

fn fmt2(x: f64) -> String {
    format!("{:.2}", x)
}

pub fn write_csv_export(path: &str, result: &ScoringResult) -> AnalysisResult<()> {
    let mut writer = Writer::from_path(path).context(CsvSnafu { path })?;
    writer.write_record(EXPORT_HEADERS).context(CsvSnafu { path })?;
    for s in &result.initiatives {
        let r = &s.record;
        let c = &r.scores;
        writer
            .write_record([
                s.rank.to_string(),
                r.initiative.clone(),
                r.proposer.clone(),
                r.area.clone(),
                r.processes.clone(),
                r.problem.clone(),
                r.proposal.clone(),
                r.benefits.clone(),
                fmt2(c.strategic_value),
                fmt2(c.impact),
                fmt2(c.feasibility),
                fmt2(c.cost_benefit),
                fmt2(c.innovation),
                fmt2(c.scalability),
                fmt2(c.implementation_time),
                fmt2(s.total),
                fmt2(s.weighted),
                s.tier.label().to_string(),
                fmt2(s.ease_of_implementation),
                fmt2(s.effort_impact_score),
                s.quadrant.label().to_string(),
            ])
            .context(CsvSnafu { path })?;
    }
    writer.flush().context(WritingOutputSnafu { path })?;
    Ok(())
}

/// Count-driven recommendation strings, shared by the JSON summary and the
/// PDF report.
pub fn recommendations(result: &ScoringResult) -> Vec<String> {
    let mut recs: Vec<String> = Vec::new();
    let breakdown = &result.tier_breakdown;
    if breakdown.high > 0 {
        recs.push(format!(
            "Prioritize the {} high-priority initiatives for immediate implementation",
            breakdown.high
        ));
    }
    if breakdown.medium > 0 {
        recs.push(format!(
            "Schedule a detailed review of the {} medium-priority initiatives",
            breakdown.medium
        ));
    }
    let low_feasibility = result
        .initiatives
        .iter()
        .filter(|s| s.record.scores.feasibility < 3.0)
        .count();
    if low_feasibility > 0 {
        recs.push(format!(
            "{} initiatives face technical feasibility challenges and need capability building",
            low_feasibility
        ));
    }
    let high_scalability = result
        .initiatives
        .iter()
        .filter(|s| s.record.scores.scalability >= 4.0)
        .count();
    if high_scalability > 0 {
        recs.push(format!(
            "{} initiatives show high potential for replication across areas",
            high_scalability
        ));
    }
    if let Some(top_area) = result.areas.iter().max_by_key(|g| g.count) {
        recs.push(format!(
            "Recognize the '{}' area for the highest participation ({} proposals)",
            top_area.name, top_area.count
        ));
    }
    recs
}

fn tier_js(result: &ScoringResult, tier: PriorityTier) -> JSValue {
    let breakdown = &result.tier_breakdown;
    json!({
        "count": breakdown.count(tier),
        "percentage": fmt2(breakdown.percentage(tier)),
    })
}

fn top_js(result: &ScoringResult) -> Vec<JSValue> {
    result
        .initiatives
        .iter()
        .take(5)
        .map(|s| {
            json!({
                "rank": s.rank,
                "initiative": s.record.initiative,
                "proposer": s.record.proposer,
                "area": s.record.area,
                "score": fmt2(s.weighted),
                "effortImpactScore": fmt2(s.effort_impact_score),
                "tier": s.tier.label(),
                "quadrant": s.quadrant.label(),
                "problem": truncate_chars(&s.record.problem, 150),
                "proposal": truncate_chars(&s.record.proposal, 150),
            })
        })
        .collect()
}

/// Assembles the run summary. Deliberately free of timestamps so a summary
/// can serve as a reference for later runs.
pub fn build_summary_js(
    config: &AnalysisConfig,
    rules: &ScoringRules,
    result: &ScoringResult,
    stats: &NormalizeStats,
    analyses: Option<&[SemanticAnalysis]>,
) -> JSValue {
    debug!("build_summary_js: {} initiatives", result.initiatives.len());
    let areas: Vec<JSValue> = result
        .areas
        .iter()
        .map(|g| {
            json!({
                "name": g.name,
                "count": g.count,
                "meanScore": fmt2(g.mean_score),
            })
        })
        .collect();
    let processes: Vec<JSValue> = result
        .processes
        .iter()
        .map(|g| {
            json!({
                "name": g.name,
                "count": g.count,
                "meanScore": fmt2(g.mean_score),
            })
        })
        .collect();

    let mut summary = json!({
        "config": {
            "title": config.output_settings.report_title,
            "variant": match rules.variant {
                ScoringVariant::WeightedAverage => "weightedAverage",
                ScoringVariant::EffortImpact => "effortImpact",
            },
        },
        "table": {
            "initiatives": result.initiatives.len(),
            "droppedRows": stats.dropped_rows,
            "zeroFilledColumns": stats.zero_filled,
            "meanScore": fmt2(result.mean_score),
        },
        "tiers": {
            "high": tier_js(result, PriorityTier::High),
            "medium": tier_js(result, PriorityTier::Medium),
            "low": tier_js(result, PriorityTier::Low),
        },
        "top": top_js(result),
        "areas": areas,
        "processes": processes,
        "recommendations": recommendations(result),
    });

    if let Some(analyses) = analyses {
        let js: Vec<JSValue> = analyses
            .iter()
            .map(|a| {
                json!({
                    "initiative": a.initiative,
                    "assessment": a.assessment,
                    "suggestedPriority": a.suggested_priority.map(fmt2),
                })
            })
            .collect();
        summary["semanticAnalyses"] = JSValue::Array(js);
    }
    summary
}
