mod builder;
mod columns;
mod config;
mod encoding;
use log::{debug, info, warn};

use std::collections::HashMap;

pub use crate::builder::Builder;
pub use crate::columns::{resolve_header, resolve_headers, CanonicalField, Resolution};
pub use crate::config::*;
pub use crate::encoding::fix_encoding;

// **** Private structures ****

// Accumulator for one group (area or process).
#[derive(Debug, Clone, Default)]
struct GroupAcc {
    count: usize,
    score_sum: f64,
    criteria_sum: [f64; 7],
}

/// Parses one numeric criterion cell. Missing or unparseable input scores 0,
/// everything else is clamped to the [0, 5] marking scale before any
/// arithmetic sees it.
pub fn coerce_score(raw: &str) -> f64 {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return 0.0;
    }
    // Some sheet locales export a decimal comma.
    let parsed = trimmed
        .parse::<f64>()
        .or_else(|_| trimmed.replace(',', ".").parse::<f64>());
    match parsed {
        Ok(x) if x.is_finite() => x.clamp(0.0, 5.0),
        _ => 0.0,
    }
}

/// Content hash of a raw table, usable as a cache key: the same headers and
/// rows always produce the same digest.
pub fn table_digest(table: &RawTable) -> String {
    let mut buf = String::new();
    for header in &table.headers {
        buf.push_str(header);
        buf.push('\u{1f}');
    }
    buf.push('\n');
    for row in &table.rows {
        for cell in row {
            buf.push_str(cell);
            buf.push('\u{1f}');
        }
        buf.push('\n');
    }
    sha256::digest(buf)
}

/// What `normalize_table` had to do beyond the happy path.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct NormalizeStats {
    /// Rows dropped for an empty proposer or initiative name.
    pub dropped_rows: usize,
    /// Canonical fields substituted with zero columns in lenient mode.
    pub zero_filled: Vec<String>,
}

/// Turns a raw table into normalized records: headers resolved, free text
/// repaired, criteria coerced, invalid rows dropped.
///
/// In strict mode a missing required column fails the whole load with the
/// explicit list of absences; in lenient mode the column reads as zeros and
/// the substitution is reported in the stats.
pub fn normalize_table(
    table: &RawTable,
    mode: SchemaMode,
) -> Result<(Vec<InitiativeRecord>, NormalizeStats), ScoringErrors> {
    let resolution = columns::resolve_headers(&table.headers);
    let mut stats = NormalizeStats::default();

    let missing = resolution.missing_required();
    if !missing.is_empty() {
        let names: Vec<String> = missing.iter().map(|f| f.name().to_string()).collect();
        match mode {
            SchemaMode::Strict => {
                return Err(ScoringErrors::MissingColumns(names));
            }
            SchemaMode::Lenient => {
                warn!("normalize_table: substituting zero columns for {:?}", names);
                stats.zero_filled = names;
            }
        }
    }

    let cell = |row: &Vec<String>, field: CanonicalField| -> String {
        resolution
            .position(field)
            .and_then(|idx| row.get(idx))
            .map(|s| s.trim().to_string())
            .unwrap_or_default()
    };

    let mut records: Vec<InitiativeRecord> = Vec::with_capacity(table.rows.len());
    for (idx, row) in table.rows.iter().enumerate() {
        let proposer = fix_encoding(&cell(row, CanonicalField::Proposer));
        let initiative = fix_encoding(&cell(row, CanonicalField::Initiative));
        if proposer.trim().is_empty() || initiative.trim().is_empty() {
            debug!("normalize_table: dropping row {} with empty identity", idx);
            stats.dropped_rows += 1;
            continue;
        }
        records.push(InitiativeRecord {
            proposer,
            email: cell(row, CanonicalField::Email),
            role: fix_encoding(&cell(row, CanonicalField::Role)),
            area: fix_encoding(&cell(row, CanonicalField::Area)),
            initiative,
            problem: fix_encoding(&cell(row, CanonicalField::Problem)),
            proposal: fix_encoding(&cell(row, CanonicalField::Proposal)),
            benefits: fix_encoding(&cell(row, CanonicalField::Benefits)),
            processes: fix_encoding(&cell(row, CanonicalField::Processes)),
            scores: CriterionScores {
                strategic_value: coerce_score(&cell(row, CanonicalField::StrategicValue)),
                impact: coerce_score(&cell(row, CanonicalField::Impact)),
                feasibility: coerce_score(&cell(row, CanonicalField::Feasibility)),
                cost_benefit: coerce_score(&cell(row, CanonicalField::CostBenefit)),
                innovation: coerce_score(&cell(row, CanonicalField::Innovation)),
                scalability: coerce_score(&cell(row, CanonicalField::Scalability)),
                implementation_time: coerce_score(&cell(row, CanonicalField::ImplementationTime)),
            },
        });
    }
    info!(
        "normalize_table: {} rows kept, {} dropped",
        records.len(),
        stats.dropped_rows
    );
    Ok((records, stats))
}

fn weighted_score(scores: &CriterionScores, weights: &CriterionWeights) -> f64 {
    scores.strategic_value * weights.strategic_value
        + scores.impact * weights.impact
        + scores.feasibility * weights.feasibility
        + scores.cost_benefit * weights.cost_benefit
        + scores.innovation * weights.innovation
        + scores.scalability * weights.scalability
        + scores.implementation_time * weights.implementation_time
}

// Boundary values belong to the higher tier.
fn tier_for(weighted: f64) -> PriorityTier {
    if weighted >= 3.5 {
        PriorityTier::High
    } else if weighted >= 2.5 {
        PriorityTier::Medium
    } else {
        PriorityTier::Low
    }
}

fn quadrant_for(impact: f64, ease: f64) -> Quadrant {
    match (impact >= 4.0, ease >= 4.0) {
        (true, true) => Quadrant::QuickWin,
        (true, false) => Quadrant::Strategic,
        (false, true) => Quadrant::Filler,
        (false, false) => Quadrant::LowPriority,
    }
}

fn score_record(record: &InitiativeRecord, rules: &ScoringRules) -> ScoredInitiative {
    let s = &record.scores;
    let total: f64 = s.as_array().iter().sum();
    let weighted = weighted_score(s, &rules.weights);
    let ease = (6.0 - s.implementation_time).clamp(0.0, 5.0);
    // The summed variant replaces raw time with inverted ease and leaves
    // innovation out, keeping the [0, 30] range exact.
    let effort_impact_score =
        s.strategic_value + s.impact + s.feasibility + s.cost_benefit + s.scalability + ease;
    ScoredInitiative {
        record: record.clone(),
        total,
        weighted,
        tier: tier_for(weighted),
        ease_of_implementation: (s.feasibility + s.cost_benefit + s.implementation_time) / 3.0,
        ease,
        effort_impact_score,
        quadrant: quadrant_for(s.impact, ease),
        rank: 0,
    }
}

fn ranking_score(initiative: &ScoredInitiative, variant: ScoringVariant) -> f64 {
    match variant {
        ScoringVariant::WeightedAverage => initiative.weighted,
        ScoringVariant::EffortImpact => initiative.effort_impact_score,
    }
}

// Sorts by the variant score descending (stable, so ties keep their input
// order) and assigns dense ranks: equal scores share a rank, the next
// distinct score takes the next rank.
fn assign_dense_ranks(scored: &mut Vec<ScoredInitiative>, variant: ScoringVariant) {
    scored.sort_by(|a, b| {
        ranking_score(b, variant)
            .partial_cmp(&ranking_score(a, variant))
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    let mut rank: u32 = 0;
    let mut previous: Option<f64> = None;
    for initiative in scored.iter_mut() {
        let score = ranking_score(initiative, variant);
        if previous != Some(score) {
            rank += 1;
            previous = Some(score);
        }
        initiative.rank = rank;
    }
}

fn accumulate(groups: &mut HashMap<String, GroupAcc>, key: &str, initiative: &ScoredInitiative, variant: ScoringVariant) {
    let acc = groups.entry(key.to_string()).or_default();
    acc.count += 1;
    acc.score_sum += ranking_score(initiative, variant);
    for (sum, value) in acc
        .criteria_sum
        .iter_mut()
        .zip(initiative.record.scores.as_array())
    {
        *sum += value;
    }
}

fn finish_groups(groups: HashMap<String, GroupAcc>) -> Vec<GroupStats> {
    groups
        .into_iter()
        .map(|(name, acc)| {
            let n = acc.count as f64;
            let c = acc.criteria_sum;
            GroupStats {
                name,
                count: acc.count,
                mean_score: acc.score_sum / n,
                mean_criteria: CriterionScores {
                    strategic_value: c[0] / n,
                    impact: c[1] / n,
                    feasibility: c[2] / n,
                    cost_benefit: c[3] / n,
                    innovation: c[4] / n,
                    scalability: c[5] / n,
                    implementation_time: c[6] / n,
                },
            }
        })
        .collect()
}

fn area_stats(scored: &[ScoredInitiative], variant: ScoringVariant) -> Vec<GroupStats> {
    let mut groups: HashMap<String, GroupAcc> = HashMap::new();
    for initiative in scored {
        if !initiative.record.area.is_empty() {
            accumulate(&mut groups, &initiative.record.area, initiative, variant);
        }
    }
    let mut stats = finish_groups(groups);
    stats.sort_by(|a, b| a.name.cmp(&b.name));
    stats
}

// A row naming several comma-separated processes counts once per process.
fn process_stats(scored: &[ScoredInitiative], variant: ScoringVariant) -> Vec<GroupStats> {
    let mut groups: HashMap<String, GroupAcc> = HashMap::new();
    for initiative in scored {
        for process in initiative.record.processes.split(',') {
            let process = process.trim();
            if !process.is_empty() {
                accumulate(&mut groups, process, initiative, variant);
            }
        }
    }
    let mut stats = finish_groups(groups);
    stats.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    stats
}

/// Runs one scoring pass with the given rules over normalized records.
///
/// Arguments:
/// * `records` the normalized survey rows to score
/// * `rules` the variant and weights that govern this pass
///
/// Every derived field is a pure function of its own row, so the result is
/// invariant under reordering of the input apart from tie order in the
/// ranking, which follows input order.
pub fn run_scoring_stats(
    records: &[InitiativeRecord],
    rules: &ScoringRules,
) -> Result<ScoringResult, ScoringErrors> {
    if !rules.weights.is_normalized() {
        return Err(ScoringErrors::InvalidWeights);
    }
    info!(
        "run_scoring_stats: processing {:?} initiatives, variant {:?}",
        records.len(),
        rules.variant
    );

    let mut scored: Vec<ScoredInitiative> =
        records.iter().map(|r| score_record(r, rules)).collect();
    assign_dense_ranks(&mut scored, rules.variant);

    let mut tier_breakdown = TierBreakdown::default();
    let mut score_sum = 0.0;
    for initiative in scored.iter() {
        match initiative.tier {
            PriorityTier::High => tier_breakdown.high += 1,
            PriorityTier::Medium => tier_breakdown.medium += 1,
            PriorityTier::Low => tier_breakdown.low += 1,
        }
        score_sum += ranking_score(initiative, rules.variant);
    }
    let mean_score = if scored.is_empty() {
        0.0
    } else {
        score_sum / scored.len() as f64
    };

    let areas = area_stats(&scored, rules.variant);
    let processes = process_stats(&scored, rules.variant);
    debug!(
        "run_scoring_stats: {} areas, {} processes",
        areas.len(),
        processes.len()
    );

    Ok(ScoringResult {
        initiatives: scored,
        tier_breakdown,
        mean_score,
        areas,
        processes,
    })
}

/// Applies a selection to a scored set. `None` dimensions are no-ops; an
/// explicitly empty list selects nothing, matching the behavior of the
/// multi-select surface this feeds.
pub fn apply_filters(scored: &[ScoredInitiative], filters: &FilterSpec) -> Vec<ScoredInitiative> {
    scored
        .iter()
        .filter(|s| {
            if let Some(areas) = &filters.areas {
                if !areas.iter().any(|a| *a == s.record.area) {
                    return false;
                }
            }
            if let Some(tiers) = &filters.tiers {
                if !tiers.contains(&s.tier) {
                    return false;
                }
            }
            if let Some(quadrants) = &filters.quadrants {
                if !quadrants.contains(&s.quadrant) {
                    return false;
                }
            }
            if let Some(processes) = &filters.processes {
                let haystack = s.record.processes.to_lowercase();
                if !processes
                    .iter()
                    .any(|p| haystack.contains(&p.to_lowercase()))
                {
                    return false;
                }
            }
            if let Some((lo, hi)) = filters.score_range {
                if s.weighted < lo || s.weighted > hi {
                    return false;
                }
            }
            true
        })
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(name: &str, scores: [f64; 7]) -> InitiativeRecord {
        InitiativeRecord {
            proposer: "Ana García".to_string(),
            area: "IT".to_string(),
            initiative: name.to_string(),
            scores: CriterionScores {
                strategic_value: scores[0],
                impact: scores[1],
                feasibility: scores[2],
                cost_benefit: scores[3],
                innovation: scores[4],
                scalability: scores[5],
                implementation_time: scores[6],
            },
            ..InitiativeRecord::default()
        }
    }

    fn survey_table() -> RawTable {
        RawTable {
            headers: vec![
                "Marca temporal".to_string(),
                "Nombre completo".to_string(),
                "Selecciona el área o proceso al cual perteneces ".to_string(),
                "Nombre de la idea o iniciativa  ".to_string(),
                "Valor estratégico".to_string(),
                "Nivel de impacto".to_string(),
                "Viabilidad técnica".to_string(),
                "Costo-beneficio".to_string(),
                "Innovación / disrupción ".to_string(),
                "Escalabilidad / transversalidad ".to_string(),
                "Tiempo de implementación ".to_string(),
            ],
            rows: vec![vec![
                "2024-01-01".to_string(),
                "Ana García".to_string(),
                "IT".to_string(),
                "CRM con IA".to_string(),
                "5".to_string(),
                "5".to_string(),
                "4".to_string(),
                "4".to_string(),
                "3".to_string(),
                "3".to_string(),
                "2".to_string(),
            ]],
        }
    }

    #[test]
    fn coercion_clamps_and_defaults() {
        assert_eq!(coerce_score("3"), 3.0);
        assert_eq!(coerce_score("4,5"), 4.5);
        assert_eq!(coerce_score("7"), 5.0);
        assert_eq!(coerce_score("-1"), 0.0);
        assert_eq!(coerce_score(""), 0.0);
        assert_eq!(coerce_score("n/a"), 0.0);
        assert_eq!(coerce_score("NaN"), 0.0);
    }

    #[test]
    fn end_to_end_survey_row() {
        let (records, stats) = normalize_table(&survey_table(), SchemaMode::Strict).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(stats.dropped_rows, 0);
        let result = run_scoring_stats(&records, &ScoringRules::DEFAULT_RULES).unwrap();
        let top = &result.initiatives[0];
        assert!((top.weighted - 4.0).abs() < 1e-9);
        assert_eq!(top.tier, PriorityTier::High);
        assert_eq!(top.total, 26.0);
        assert_eq!(top.rank, 1);
    }

    #[test]
    fn rows_with_empty_identity_are_dropped() {
        let mut table = survey_table();
        table.rows[0][1] = "   ".to_string();
        let (records, stats) = normalize_table(&table, SchemaMode::Strict).unwrap();
        assert!(records.is_empty());
        assert_eq!(stats.dropped_rows, 1);
    }

    #[test]
    fn strict_mode_fails_on_missing_columns() {
        let table = RawTable {
            headers: vec!["Nombre completo".to_string(), "Nombre de la idea".to_string()],
            rows: vec![vec!["Ana".to_string(), "X".to_string()]],
        };
        match normalize_table(&table, SchemaMode::Strict) {
            Err(ScoringErrors::MissingColumns(names)) => {
                assert!(names.contains(&"area".to_string()));
                assert!(names.contains(&"impact".to_string()));
            }
            other => panic!("expected MissingColumns, got {:?}", other),
        }
    }

    #[test]
    fn lenient_mode_zero_fills_missing_columns() {
        let table = RawTable {
            headers: vec!["Nombre completo".to_string(), "Nombre de la idea".to_string()],
            rows: vec![vec!["Ana".to_string(), "X".to_string()]],
        };
        let (records, stats) = normalize_table(&table, SchemaMode::Lenient).unwrap();
        assert_eq!(records.len(), 1);
        assert!(stats.zero_filled.contains(&"strategic_value".to_string()));
        assert_eq!(records[0].scores.as_array(), [0.0; 7]);
    }

    #[test]
    fn total_matches_weighted_numerator_fields() {
        let r = record("a", [1.0, 2.0, 3.0, 4.0, 5.0, 1.5, 2.5]);
        let result = run_scoring_stats(&[r.clone()], &ScoringRules::DEFAULT_RULES).unwrap();
        let scored = &result.initiatives[0];
        let independent: f64 = r.scores.as_array().iter().sum();
        assert_eq!(scored.total, independent);
    }

    #[test]
    fn tier_is_monotonic_with_exact_boundaries() {
        assert_eq!(tier_for(3.5), PriorityTier::High);
        assert_eq!(tier_for(3.499_999), PriorityTier::Medium);
        assert_eq!(tier_for(2.5), PriorityTier::Medium);
        assert_eq!(tier_for(2.499_999), PriorityTier::Low);
        let mut previous = PriorityTier::Low;
        for step in 0..=50 {
            let tier = tier_for(step as f64 * 0.1);
            // PriorityTier orders High < Medium < Low, so the tier may only
            // move toward High as the score grows.
            assert!(tier <= previous);
            previous = tier;
        }
    }

    #[test]
    fn quadrant_decision_table_at_boundaries() {
        // ease = 6 - time, so time 2 sits exactly on the ease = 4 boundary.
        assert_eq!(quadrant_for(4.0, 4.0), Quadrant::QuickWin);
        assert_eq!(quadrant_for(4.0, 3.9), Quadrant::Strategic);
        assert_eq!(quadrant_for(3.9, 4.0), Quadrant::Filler);
        assert_eq!(quadrant_for(3.9, 3.9), Quadrant::LowPriority);
        let r = record("boundary", [3.0, 4.0, 3.0, 3.0, 3.0, 3.0, 2.0]);
        let result = run_scoring_stats(&[r], &ScoringRules::DEFAULT_RULES).unwrap();
        assert_eq!(result.initiatives[0].quadrant, Quadrant::QuickWin);
    }

    #[test]
    fn weighted_score_is_reorder_invariant() {
        let a = record("a", [5.0, 4.0, 3.0, 2.0, 1.0, 0.0, 5.0]);
        let b = record("b", [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let forward = run_scoring_stats(&[a.clone(), b.clone()], &ScoringRules::DEFAULT_RULES).unwrap();
        let backward = run_scoring_stats(&[b, a], &ScoringRules::DEFAULT_RULES).unwrap();
        let weight_of = |result: &ScoringResult, name: &str| {
            result
                .initiatives
                .iter()
                .find(|s| s.record.initiative == name)
                .map(|s| s.weighted)
                .unwrap()
        };
        assert_eq!(weight_of(&forward, "a"), weight_of(&backward, "a"));
        assert_eq!(weight_of(&forward, "b"), weight_of(&backward, "b"));
    }

    #[test]
    fn dense_ranks_share_on_ties_and_keep_input_order() {
        let a = record("first", [5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0]);
        let b = record("also-first", [5.0, 5.0, 5.0, 5.0, 5.0, 5.0, 5.0]);
        let c = record("third", [1.0, 1.0, 1.0, 1.0, 1.0, 1.0, 1.0]);
        let result = run_scoring_stats(&[a, b, c], &ScoringRules::DEFAULT_RULES).unwrap();
        let ranks: Vec<(String, u32)> = result
            .initiatives
            .iter()
            .map(|s| (s.record.initiative.clone(), s.rank))
            .collect();
        assert_eq!(
            ranks,
            vec![
                ("first".to_string(), 1),
                ("also-first".to_string(), 1),
                ("third".to_string(), 2),
            ]
        );
    }

    #[test]
    fn effort_impact_variant_ranks_on_summed_score() {
        // Low time boosts the summed score through the inverted ease term.
        let quick = record("quick", [3.0, 4.0, 4.0, 4.0, 0.0, 4.0, 1.0]);
        let slow = record("slow", [4.0, 4.0, 4.0, 4.0, 5.0, 4.0, 5.0]);
        let rules = ScoringRules {
            variant: ScoringVariant::EffortImpact,
            ..ScoringRules::DEFAULT_RULES
        };
        let result = run_scoring_stats(&[slow.clone(), quick.clone()], &rules).unwrap();
        assert_eq!(result.initiatives[0].record.initiative, "quick");
        assert_eq!(result.initiatives[0].effort_impact_score, 24.0);
        assert_eq!(result.initiatives[0].quadrant, Quadrant::QuickWin);
        assert_eq!(result.initiatives[1].quadrant, Quadrant::Strategic);
    }

    #[test]
    fn invalid_weights_are_rejected() {
        let mut rules = ScoringRules::DEFAULT_RULES;
        rules.weights.impact = 0.5;
        let r = record("a", [1.0; 7]);
        assert_eq!(
            run_scoring_stats(&[r], &rules),
            Err(ScoringErrors::InvalidWeights)
        );
    }

    #[test]
    fn area_and_process_aggregates() {
        let mut a = record("a", [4.0; 7]);
        a.processes = "Logística, Compras".to_string();
        let mut b = record("b", [2.0; 7]);
        b.area = "Operaciones".to_string();
        b.processes = "Compras".to_string();
        let result = run_scoring_stats(&[a, b], &ScoringRules::DEFAULT_RULES).unwrap();
        assert_eq!(result.areas.len(), 2);
        assert_eq!(result.areas[0].name, "IT");
        assert_eq!(result.areas[0].count, 1);
        let compras = result
            .processes
            .iter()
            .find(|g| g.name == "Compras")
            .unwrap();
        assert_eq!(compras.count, 2);
        assert!((compras.mean_score - 3.0).abs() < 1e-9);
        assert_eq!(result.processes[0].name, "Compras");
    }

    #[test]
    fn filters_respect_empty_and_absent_selections() {
        let a = record("a", [5.0; 7]);
        let result = run_scoring_stats(&[a], &ScoringRules::DEFAULT_RULES).unwrap();
        let all = apply_filters(&result.initiatives, &FilterSpec::default());
        assert_eq!(all.len(), 1);
        let none = apply_filters(
            &result.initiatives,
            &FilterSpec {
                areas: Some(vec![]),
                ..FilterSpec::default()
            },
        );
        assert!(none.is_empty());
        let ranged = apply_filters(
            &result.initiatives,
            &FilterSpec {
                score_range: Some((0.0, 3.0)),
                ..FilterSpec::default()
            },
        );
        assert!(ranged.is_empty());
    }

    #[test]
    fn filters_match_processes_case_insensitively() {
        let mut a = record("a", [3.0; 7]);
        a.processes = "Logística, Compras".to_string();
        let result = run_scoring_stats(&[a], &ScoringRules::DEFAULT_RULES).unwrap();
        let hits = apply_filters(
            &result.initiatives,
            &FilterSpec {
                processes: Some(vec!["compras".to_string()]),
                ..FilterSpec::default()
            },
        );
        assert_eq!(hits.len(), 1);
    }

    #[test]
    fn table_digest_is_content_addressed() {
        let table = survey_table();
        let d1 = table_digest(&table);
        let d2 = table_digest(&table.clone());
        assert_eq!(d1, d2);
        let mut changed = table;
        changed.rows[0][4] = "4".to_string();
        assert_ne!(d1, table_digest(&changed));
    }
}
