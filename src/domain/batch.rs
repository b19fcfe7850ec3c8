use serde::{Deserialize, Serialize};

use super::technique::Technique;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchMockup {
    pub style_id: u64,
    pub placement: String,
    pub asset_url: String,
    pub cached: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchFailure {
    pub style_id: u64,
    pub placement: String,
    pub reason: String,
}

/// Overall classification callers use to decide what to show.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BatchOutcome {
    AllSucceeded,
    /// Some combinations failed; the successful ones are usable.
    Partial,
    AllFailed,
    /// No style exposes a placement usable with the requested technique.
    NoCompatibleCombinations,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchResult {
    pub technique: Technique,
    pub outcome: BatchOutcome,
    pub attempted: usize,
    pub failed: usize,
    pub succeeded: Vec<BatchMockup>,
    pub failures: Vec<BatchFailure>,
}

impl BatchResult {
    pub fn no_compatible_combinations(technique: Technique) -> Self {
        Self {
            technique,
            outcome: BatchOutcome::NoCompatibleCombinations,
            attempted: 0,
            failed: 0,
            succeeded: Vec::new(),
            failures: Vec::new(),
        }
    }

    pub fn from_parts(
        technique: Technique,
        succeeded: Vec<BatchMockup>,
        failures: Vec<BatchFailure>,
    ) -> Self {
        let outcome = match (succeeded.is_empty(), failures.is_empty()) {
            (true, true) => BatchOutcome::NoCompatibleCombinations,
            (false, true) => BatchOutcome::AllSucceeded,
            (false, false) => BatchOutcome::Partial,
            (true, false) => BatchOutcome::AllFailed,
        };
        Self {
            technique,
            outcome,
            attempted: succeeded.len() + failures.len(),
            failed: failures.len(),
            succeeded,
            failures,
        }
    }

    pub fn has_compatible_combinations(&self) -> bool {
        self.outcome != BatchOutcome::NoCompatibleCombinations
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mockup(style_id: u64) -> BatchMockup {
        BatchMockup {
            style_id,
            placement: "front".to_string(),
            asset_url: format!("https://cdn.example/{style_id}.png"),
            cached: false,
        }
    }

    fn failure(style_id: u64) -> BatchFailure {
        BatchFailure {
            style_id,
            placement: "back".to_string(),
            reason: "boom".to_string(),
        }
    }

    #[test]
    fn classifies_partial_results() {
        let result =
            BatchResult::from_parts(Technique::DirectToGarment, vec![mockup(1)], vec![failure(2)]);
        assert_eq!(result.outcome, BatchOutcome::Partial);
        assert_eq!(result.attempted, 2);
        assert_eq!(result.failed, 1);
    }

    #[test]
    fn classifies_total_failure() {
        let result = BatchResult::from_parts(Technique::Embroidery, Vec::new(), vec![failure(2)]);
        assert_eq!(result.outcome, BatchOutcome::AllFailed);
        assert!(result.has_compatible_combinations());
    }

    #[test]
    fn empty_compatibility_has_no_attempts() {
        let result = BatchResult::no_compatible_combinations(Technique::Embroidery);
        assert_eq!(result.attempted, 0);
        assert!(!result.has_compatible_combinations());
    }
}
