// ********* Input data structures ***********

use std::error::Error;
use std::fmt::Display;

/// A raw table as produced by the readers: one header row and the data rows,
/// all cells rendered to strings. Rows may be ragged; missing cells read as
/// empty.
#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

/// The seven evaluation criteria of an initiative, each on the [0, 5]
/// marking scale.
#[derive(PartialEq, Debug, Clone, Copy, Default)]
pub struct CriterionScores {
    pub strategic_value: f64,
    pub impact: f64,
    pub feasibility: f64,
    pub cost_benefit: f64,
    pub innovation: f64,
    pub scalability: f64,
    pub implementation_time: f64,
}

impl CriterionScores {
    pub fn as_array(&self) -> [f64; 7] {
        [
            self.strategic_value,
            self.impact,
            self.feasibility,
            self.cost_benefit,
            self.innovation,
            self.scalability,
            self.implementation_time,
        ]
    }
}

/// One survey row after normalization: identity and narrative fields with
/// encodings repaired, criteria coerced and clamped.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct InitiativeRecord {
    pub proposer: String,
    pub email: String,
    pub role: String,
    pub area: String,
    pub initiative: String,
    pub problem: String,
    pub proposal: String,
    pub benefits: String,
    /// Comma-separated list of business processes the proposer named.
    pub processes: String,
    pub scores: CriterionScores,
}

// ******** Output data structures *********

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum PriorityTier {
    High,
    Medium,
    Low,
}

impl PriorityTier {
    pub fn label(&self) -> &'static str {
        match self {
            PriorityTier::High => "High",
            PriorityTier::Medium => "Medium",
            PriorityTier::Low => "Low",
        }
    }
}

/// Effort-impact quadrant of an initiative.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum Quadrant {
    QuickWin,
    Strategic,
    Filler,
    LowPriority,
}

impl Quadrant {
    pub fn label(&self) -> &'static str {
        match self {
            Quadrant::QuickWin => "Quick Win",
            Quadrant::Strategic => "Strategic",
            Quadrant::Filler => "Filler",
            Quadrant::LowPriority => "Low Priority",
        }
    }
}

/// An initiative with every derived field filled in. Both classification
/// models are computed on each row; the scoring variant only decides which
/// score the rank is taken from.
#[derive(PartialEq, Debug, Clone)]
pub struct ScoredInitiative {
    pub record: InitiativeRecord,
    /// Sum of the seven criteria, range [0, 35].
    pub total: f64,
    /// Convex combination of the seven criteria, range [0, 5].
    pub weighted: f64,
    pub tier: PriorityTier,
    /// Mean of feasibility, cost-benefit and implementation time. The x axis
    /// of the matrix plot.
    pub ease_of_implementation: f64,
    /// Inverted implementation time (6 - time, clamped to [0, 5]) used by
    /// the quadrant model.
    pub ease: f64,
    /// Six-factor sum of the effort-impact variant, range [0, 30].
    pub effort_impact_score: f64,
    pub quadrant: Quadrant,
    /// Dense rank on the variant score, descending, starting at 1. Equal
    /// scores share a rank.
    pub rank: u32,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct TierBreakdown {
    pub high: usize,
    pub medium: usize,
    pub low: usize,
}

impl TierBreakdown {
    pub fn total(&self) -> usize {
        self.high + self.medium + self.low
    }

    pub fn count(&self, tier: PriorityTier) -> usize {
        match tier {
            PriorityTier::High => self.high,
            PriorityTier::Medium => self.medium,
            PriorityTier::Low => self.low,
        }
    }

    /// Share of a tier in percent. Zero when the breakdown is empty.
    pub fn percentage(&self, tier: PriorityTier) -> f64 {
        if self.total() == 0 {
            0.0
        } else {
            self.count(tier) as f64 * 100.0 / self.total() as f64
        }
    }
}

/// Aggregate statistics for one group of initiatives (an organizational
/// area or a business process).
#[derive(PartialEq, Debug, Clone)]
pub struct GroupStats {
    pub name: String,
    pub count: usize,
    /// Mean of the variant score over the group.
    pub mean_score: f64,
    /// Per-criterion means over the group.
    pub mean_criteria: CriterionScores,
}

/// Everything one scoring pass produces.
#[derive(PartialEq, Debug, Clone)]
pub struct ScoringResult {
    /// All surviving initiatives in rank order.
    pub initiatives: Vec<ScoredInitiative>,
    pub tier_breakdown: TierBreakdown,
    /// Mean of the variant score over all initiatives, 0 when empty.
    pub mean_score: f64,
    /// Per-area statistics, sorted by area name.
    pub areas: Vec<GroupStats>,
    /// Per-process statistics, sorted by descending count. A row naming
    /// several processes counts once per process.
    pub processes: Vec<GroupStats>,
}

/// Errors that prevent a scoring pass from completing.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum ScoringErrors {
    /// Required canonical columns absent after resolution, in strict mode.
    MissingColumns(Vec<String>),
    /// The configured weights do not sum to 1.
    InvalidWeights,
}

impl Error for ScoringErrors {}

impl Display for ScoringErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ScoringErrors::MissingColumns(names) => {
                write!(f, "required columns missing after resolution: {}", names.join(", "))
            }
            ScoringErrors::InvalidWeights => {
                write!(f, "criterion weights must sum to 1.0")
            }
        }
    }
}

// ********* Configuration **********

/// The two scoring models observed in the survey deployments. Both are
/// always computed; the variant selects the ranking score and the headline
/// classification.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum ScoringVariant {
    /// Seven-factor convex combination in [0, 5] with High/Medium/Low tiers.
    WeightedAverage,
    /// Six-factor sum in [0, 30] with inverted time and quadrant labels.
    EffortImpact,
}

/// Policy for required columns that are absent after header resolution.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum SchemaMode {
    /// Fail the load, listing the missing canonical fields.
    Strict,
    /// Substitute a zero-filled column and keep going.
    Lenient,
}

/// Weights of the seven criteria in the weighted-average variant. Must sum
/// to 1.
#[derive(PartialEq, Debug, Clone, Copy)]
pub struct CriterionWeights {
    pub strategic_value: f64,
    pub impact: f64,
    pub feasibility: f64,
    pub cost_benefit: f64,
    pub innovation: f64,
    pub scalability: f64,
    pub implementation_time: f64,
}

impl CriterionWeights {
    pub const DEFAULT: CriterionWeights = CriterionWeights {
        strategic_value: 0.20,
        impact: 0.20,
        feasibility: 0.15,
        cost_benefit: 0.15,
        innovation: 0.10,
        scalability: 0.10,
        implementation_time: 0.10,
    };

    pub fn sum(&self) -> f64 {
        self.strategic_value
            + self.impact
            + self.feasibility
            + self.cost_benefit
            + self.innovation
            + self.scalability
            + self.implementation_time
    }

    pub fn is_normalized(&self) -> bool {
        (self.sum() - 1.0).abs() < 1e-6
    }
}

#[derive(PartialEq, Debug, Clone)]
pub struct ScoringRules {
    pub variant: ScoringVariant,
    pub schema_mode: SchemaMode,
    pub weights: CriterionWeights,
}

impl ScoringRules {
    pub const DEFAULT_RULES: ScoringRules = ScoringRules {
        variant: ScoringVariant::WeightedAverage,
        schema_mode: SchemaMode::Strict,
        weights: CriterionWeights::DEFAULT,
    };
}

/// Selection applied to a scored set before display or export. `None` means
/// "no filter on this dimension"; an explicitly empty list selects nothing.
#[derive(PartialEq, Debug, Clone, Default)]
pub struct FilterSpec {
    pub areas: Option<Vec<String>>,
    pub tiers: Option<Vec<PriorityTier>>,
    pub quadrants: Option<Vec<Quadrant>>,
    /// Case-insensitive substring match against the process list.
    pub processes: Option<Vec<String>>,
    /// Inclusive range on the weighted score.
    pub score_range: Option<(f64, f64)>,
}
