//! Header resolution: mapping the raw, inconsistently encoded column names
//! of a survey export onto stable canonical field names.

use log::debug;
use std::collections::HashMap;

/// The canonical fields an export can carry. Narrative fields beyond the
/// required set are optional; an export without them still scores.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum CanonicalField {
    Timestamp,
    Proposer,
    Email,
    Role,
    Area,
    Initiative,
    Problem,
    Proposal,
    Processes,
    Benefits,
    SeenElsewhere,
    SeenWhere,
    CurrentResources,
    StrategicValue,
    Impact,
    Feasibility,
    CostBenefit,
    Innovation,
    Scalability,
    ImplementationTime,
}

impl CanonicalField {
    pub fn name(&self) -> &'static str {
        match self {
            CanonicalField::Timestamp => "timestamp",
            CanonicalField::Proposer => "proposer",
            CanonicalField::Email => "email",
            CanonicalField::Role => "role",
            CanonicalField::Area => "area",
            CanonicalField::Initiative => "initiative",
            CanonicalField::Problem => "problem",
            CanonicalField::Proposal => "proposal",
            CanonicalField::Processes => "processes",
            CanonicalField::Benefits => "benefits",
            CanonicalField::SeenElsewhere => "seen_elsewhere",
            CanonicalField::SeenWhere => "seen_where",
            CanonicalField::CurrentResources => "current_resources",
            CanonicalField::StrategicValue => "strategic_value",
            CanonicalField::Impact => "impact",
            CanonicalField::Feasibility => "feasibility",
            CanonicalField::CostBenefit => "cost_benefit",
            CanonicalField::Innovation => "innovation",
            CanonicalField::Scalability => "scalability",
            CanonicalField::ImplementationTime => "implementation_time",
        }
    }

    pub const ALL: [CanonicalField; 20] = [
        CanonicalField::Timestamp,
        CanonicalField::Proposer,
        CanonicalField::Email,
        CanonicalField::Role,
        CanonicalField::Area,
        CanonicalField::Initiative,
        CanonicalField::Problem,
        CanonicalField::Proposal,
        CanonicalField::Processes,
        CanonicalField::Benefits,
        CanonicalField::SeenElsewhere,
        CanonicalField::SeenWhere,
        CanonicalField::CurrentResources,
        CanonicalField::StrategicValue,
        CanonicalField::Impact,
        CanonicalField::Feasibility,
        CanonicalField::CostBenefit,
        CanonicalField::Innovation,
        CanonicalField::Scalability,
        CanonicalField::ImplementationTime,
    ];

    /// The seven numeric criteria, in scoring order.
    pub const NUMERIC: [CanonicalField; 7] = [
        CanonicalField::StrategicValue,
        CanonicalField::Impact,
        CanonicalField::Feasibility,
        CanonicalField::CostBenefit,
        CanonicalField::Innovation,
        CanonicalField::Scalability,
        CanonicalField::ImplementationTime,
    ];

    /// Fields a load cannot score without.
    pub const REQUIRED: [CanonicalField; 10] = [
        CanonicalField::Proposer,
        CanonicalField::Initiative,
        CanonicalField::Area,
        CanonicalField::StrategicValue,
        CanonicalField::Impact,
        CanonicalField::Feasibility,
        CanonicalField::CostBenefit,
        CanonicalField::Innovation,
        CanonicalField::Scalability,
        CanonicalField::ImplementationTime,
    ];
}

struct HeaderRule {
    needles: &'static [&'static str],
    field: CanonicalField,
}

/// Ordered rule table; the first rule whose needles are all contained in the
/// trimmed header wins. The needles deliberately stop short of the accented
/// characters so both the clean and the mojibake spellings match
/// ("Valor estratégico" as well as "Valor estratÃ©gico").
const HEADER_RULES: &[HeaderRule] = &[
    HeaderRule { needles: &["Marca temporal"], field: CanonicalField::Timestamp },
    HeaderRule { needles: &["Nombre completo"], field: CanonicalField::Proposer },
    HeaderRule { needles: &["Correo electr"], field: CanonicalField::Email },
    HeaderRule { needles: &["Rol o relaci"], field: CanonicalField::Role },
    HeaderRule { needles: &["rea o proceso"], field: CanonicalField::Area },
    HeaderRule { needles: &["Nombre de la idea"], field: CanonicalField::Initiative },
    HeaderRule { needles: &["problema, necesidad"], field: CanonicalField::Problem },
    HeaderRule { needles: &["Cu", "l es tu propuesta"], field: CanonicalField::Proposal },
    HeaderRule { needles: &["proceso/s crees"], field: CanonicalField::Processes },
    HeaderRule { needles: &["beneficios esperas"], field: CanonicalField::Benefits },
    HeaderRule { needles: &["idea la has visto"], field: CanonicalField::SeenElsewhere },
    HeaderRule { needles: &["respuesta anterior"], field: CanonicalField::SeenWhere },
    HeaderRule { needles: &["puede implementarse"], field: CanonicalField::CurrentResources },
    HeaderRule { needles: &["Valor estrat"], field: CanonicalField::StrategicValue },
    HeaderRule { needles: &["Nivel de impacto"], field: CanonicalField::Impact },
    HeaderRule { needles: &["Viabilidad t"], field: CanonicalField::Feasibility },
    HeaderRule { needles: &["Costo-beneficio"], field: CanonicalField::CostBenefit },
    HeaderRule { needles: &["Innovaci", "disrupci"], field: CanonicalField::Innovation },
    HeaderRule { needles: &["Escalabilidad", "transversalidad"], field: CanonicalField::Scalability },
    HeaderRule { needles: &["Tiempo de implementaci"], field: CanonicalField::ImplementationTime },
];

/// Resolves one raw header. A header that already carries a canonical name
/// maps to itself, which makes resolution idempotent; otherwise the rule
/// table decides. `None` means the header passes through unchanged.
pub fn resolve_header(raw: &str) -> Option<CanonicalField> {
    let trimmed = raw.trim();
    for field in CanonicalField::ALL {
        if trimmed == field.name() {
            return Some(field);
        }
    }
    HEADER_RULES
        .iter()
        .find(|rule| rule.needles.iter().all(|needle| trimmed.contains(needle)))
        .map(|rule| rule.field)
}

/// The outcome of resolving a header row.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Resolution {
    /// The header row after the rename, same order and length as the input.
    pub renamed: Vec<String>,
    positions: HashMap<CanonicalField, usize>,
}

impl Resolution {
    pub fn position(&self, field: CanonicalField) -> Option<usize> {
        self.positions.get(&field).copied()
    }

    /// The required canonical fields this header row does not provide.
    pub fn missing_required(&self) -> Vec<CanonicalField> {
        CanonicalField::REQUIRED
            .iter()
            .filter(|field| !self.positions.contains_key(field))
            .copied()
            .collect()
    }
}

/// Resolves a header row. Applied as a rename, never a copy: column order is
/// preserved, unmatched headers pass through unchanged, and when two raw
/// headers resolve to the same field only the first one is renamed.
/// Resolution never fails; only the caller decides whether a missing
/// required field is fatal.
pub fn resolve_headers(raw: &[String]) -> Resolution {
    let mut renamed: Vec<String> = Vec::with_capacity(raw.len());
    let mut positions: HashMap<CanonicalField, usize> = HashMap::new();
    for (idx, header) in raw.iter().enumerate() {
        match resolve_header(header) {
            Some(field) if !positions.contains_key(&field) => {
                debug!("resolve_headers: {:?} -> {:?}", header, field.name());
                positions.insert(field, idx);
                renamed.push(field.name().to_string());
            }
            _ => {
                renamed.push(header.clone());
            }
        }
    }
    Resolution { renamed, positions }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn headers(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn resolves_survey_export_headers() {
        let raw = headers(&[
            "Marca temporal",
            "Nombre completo",
            "Selecciona el área o proceso al cual perteneces ",
            "Nombre de la idea o iniciativa  ",
            "Valor estratégico",
            "Nivel de impacto",
            "Viabilidad técnica",
            "Costo-beneficio",
            "Innovación / disrupción ",
            "Escalabilidad / transversalidad ",
            "Tiempo de implementación ",
        ]);
        let res = resolve_headers(&raw);
        assert!(res.missing_required().is_empty());
        assert_eq!(res.position(CanonicalField::StrategicValue), Some(4));
        assert_eq!(res.position(CanonicalField::ImplementationTime), Some(10));
        assert_eq!(res.renamed[1], "proposer");
    }

    #[test]
    fn resolves_mojibake_headers() {
        assert_eq!(
            resolve_header("Valor estratÃ©gico"),
            Some(CanonicalField::StrategicValue)
        );
        assert_eq!(
            resolve_header("InnovaciÃ³n / disrupciÃ³n "),
            Some(CanonicalField::Innovation)
        );
        assert_eq!(
            resolve_header("Â¿CuÃ¡l es tu propuesta?"),
            Some(CanonicalField::Proposal)
        );
    }

    #[test]
    fn resolution_is_idempotent() {
        let raw = headers(&["proposer", "initiative", "area", "strategic_value"]);
        let res = resolve_headers(&raw);
        assert_eq!(res.renamed, raw);
        let again = resolve_headers(&res.renamed);
        assert_eq!(again.renamed, raw);
    }

    #[test]
    fn unmatched_headers_pass_through() {
        let raw = headers(&["Una columna libre", "Nombre completo"]);
        let res = resolve_headers(&raw);
        assert_eq!(res.renamed[0], "Una columna libre");
        assert_eq!(res.renamed[1], "proposer");
    }

    #[test]
    fn first_match_wins_on_duplicates() {
        let raw = headers(&["Nombre completo", "Nombre completo (otra vez)"]);
        let res = resolve_headers(&raw);
        assert_eq!(res.position(CanonicalField::Proposer), Some(0));
        assert_eq!(res.renamed[1], "Nombre completo (otra vez)");
    }

    #[test]
    fn reports_missing_required_fields() {
        let raw = headers(&["Nombre completo", "Nombre de la idea"]);
        let res = resolve_headers(&raw);
        let missing = res.missing_required();
        assert!(missing.contains(&CanonicalField::Area));
        assert!(missing.contains(&CanonicalField::StrategicValue));
        assert!(!missing.contains(&CanonicalField::Proposer));
    }
}
