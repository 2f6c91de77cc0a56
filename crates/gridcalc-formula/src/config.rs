//! Evaluation settings

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// How whole-column (`A:A`) and whole-row (`1:1`) references are materialised
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FullReferencePolicy {
    /// Stop at the last populated row/column of the sheet
    #[default]
    UsedExtent,
    /// Enumerate up to the host limits, subject to `max_range_cells`
    SheetLimits,
}

/// Limits and policies for one evaluator
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EvaluationConfig {
    /// Nested cell evaluations allowed in one call tree; the cell past the
    /// ceiling evaluates to `#NUM!`
    pub max_depth: usize,
    /// Cells materialised for a single range; larger ranges yield `#NUM!`
    pub max_range_cells: usize,
    pub full_reference_policy: FullReferencePolicy,
}

impl EvaluationConfig {
    pub const DEFAULT_MAX_DEPTH: usize = 10_000;
    pub const DEFAULT_MAX_RANGE_CELLS: usize = 4 * 1024 * 1024;

    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn with_max_range_cells(mut self, max_range_cells: usize) -> Self {
        self.max_range_cells = max_range_cells;
        self
    }

    pub fn with_full_reference_policy(mut self, policy: FullReferencePolicy) -> Self {
        self.full_reference_policy = policy;
        self
    }
}

impl Default for EvaluationConfig {
    fn default() -> Self {
        Self {
            max_depth: Self::DEFAULT_MAX_DEPTH,
            max_range_cells: Self::DEFAULT_MAX_RANGE_CELLS,
            full_reference_policy: FullReferencePolicy::UsedExtent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = EvaluationConfig::default();
        assert_eq!(config.max_depth, 10_000);
        assert_eq!(config.max_range_cells, 4_194_304);
        assert_eq!(config.full_reference_policy, FullReferencePolicy::UsedExtent);
    }

    #[test]
    fn test_builders() {
        let config = EvaluationConfig::default()
            .with_max_depth(8)
            .with_full_reference_policy(FullReferencePolicy::SheetLimits);
        assert_eq!(config.max_depth, 8);
        assert_eq!(config.full_reference_policy, FullReferencePolicy::SheetLimits);
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_deserialize_partial() {
        let config: EvaluationConfig =
            serde_json::from_str(r#"{"full_reference_policy":"sheet_limits"}"#).unwrap();
        assert_eq!(config.max_depth, EvaluationConfig::DEFAULT_MAX_DEPTH);
        assert_eq!(config.full_reference_policy, FullReferencePolicy::SheetLimits);
    }
}
