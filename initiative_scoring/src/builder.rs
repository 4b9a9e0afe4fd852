pub use crate::config::*;
use crate::{normalize_table, run_scoring_stats};

/// A builder for assembling a survey table by hand.
///
/// Header strings go through the same resolution as file input, so both
/// canonical names and raw export spellings work.
///
/// ```
/// pub use initiative_scoring::Builder;
/// pub use initiative_scoring::ScoringRules;
/// # use initiative_scoring::ScoringErrors;
///
/// let mut builder = Builder::new(&ScoringRules::DEFAULT_RULES)?
///     .headers(&[
///         "proposer", "initiative", "area", "strategic_value", "impact",
///         "feasibility", "cost_benefit", "innovation", "scalability",
///         "implementation_time",
///     ]);
///
/// builder.add_row(&["Ana", "CRM", "IT", "5", "5", "4", "4", "3", "3", "2"]);
/// let result = builder.score()?;
/// assert_eq!(result.initiatives.len(), 1);
///
/// # Ok::<(), ScoringErrors>(())
/// ```
pub struct Builder {
    pub(crate) _rules: ScoringRules,
    pub(crate) _table: RawTable,
}

impl Builder {
    pub fn new(rules: &ScoringRules) -> Result<Builder, ScoringErrors> {
        if !rules.weights.is_normalized() {
            return Err(ScoringErrors::InvalidWeights);
        }
        Ok(Builder {
            _rules: rules.clone(),
            _table: RawTable::default(),
        })
    }

    pub fn headers(self, headers: &[&str]) -> Builder {
        Builder {
            _rules: self._rules,
            _table: RawTable {
                headers: headers.iter().map(|s| s.to_string()).collect(),
                rows: Vec::new(),
            },
        }
    }

    /// Adds one row of cells, in header order. Short rows read as empty on
    /// the right.
    pub fn add_row(&mut self, cells: &[&str]) {
        self._table
            .rows
            .push(cells.iter().map(|s| s.to_string()).collect());
    }

    /// Normalizes and scores everything added so far.
    pub fn score(&self) -> Result<ScoringResult, ScoringErrors> {
        let (records, _stats) = normalize_table(&self._table, self._rules.schema_mode)?;
        run_scoring_stats(&records, &self._rules)
    }
}
