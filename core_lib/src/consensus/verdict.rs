use super::aggregator::HeightSet;
use crate::error::{AppError, Result};
use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Verdict {
    pub local_height: i64,
    pub threshold: i64,
    pub external_max: i64,
    /// `external_max - (local_height + threshold)`. Zero or negative is in sync.
    pub lag_blocks: i64,
    pub in_sync: bool,
}

impl Verdict {
    pub fn evaluate(local_height: i64, threshold: i64, external_max: i64) -> Self {
        let lag_blocks = external_max.saturating_sub(local_height.saturating_add(threshold));
        Self {
            local_height,
            threshold,
            external_max,
            lag_blocks,
            in_sync: lag_blocks <= 0,
        }
    }

    pub fn message(&self) -> String {
        if self.in_sync {
            "The node is fully in sync.".to_string()
        } else {
            format!("The node is {} blocks behind!", self.lag_blocks)
        }
    }
}

impl HeightSet {
    /// Fails when no external source produced a height; an empty external
    /// view is never treated as in sync.
    pub fn verdict(&self, threshold: i64) -> Result<Verdict> {
        let external_max = self
            .max_external()
            .ok_or(AppError::InsufficientExternalData {
                attempted: self.attempted(),
                responded: self.responded(),
            })?;

        Ok(Verdict::evaluate(self.local_height, threshold, external_max))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::consensus::aggregator::HeightReading;

    fn height_set(local: i64, external: &[Option<i64>]) -> HeightSet {
        let mut set = HeightSet::new("node", local);
        set.external = external
            .iter()
            .enumerate()
            .map(|(i, height)| HeightReading {
                source: format!("source-{i}"),
                height: *height,
            })
            .collect();
        set
    }

    #[test]
    fn test_in_sync_when_ahead_of_threshold() {
        let verdict = height_set(100, &[Some(105), Some(98), Some(102)]).verdict(10).unwrap();
        assert_eq!(verdict.external_max, 105);
        assert_eq!(verdict.lag_blocks, -5);
        assert!(verdict.in_sync);
        assert_eq!(verdict.message(), "The node is fully in sync.");
    }

    #[test]
    fn test_behind_with_partial_failures() {
        let verdict = height_set(100, &[None, Some(130), None]).verdict(10).unwrap();
        assert_eq!(verdict.lag_blocks, 20);
        assert!(!verdict.in_sync);
        assert_eq!(verdict.message(), "The node is 20 blocks behind!");
    }

    #[test]
    fn test_all_failed_is_insufficient_data() {
        let result = height_set(100, &[None, None, None]).verdict(10);
        assert!(matches!(
            result,
            Err(AppError::InsufficientExternalData { attempted: 3, responded: 0 })
        ));

        let result = height_set(100, &[]).verdict(10);
        assert!(matches!(result, Err(AppError::InsufficientExternalData { .. })));
    }

    #[test]
    fn test_equality_counts_as_in_sync() {
        let verdict = Verdict::evaluate(100, 0, 100);
        assert_eq!(verdict.lag_blocks, 0);
        assert!(verdict.in_sync);

        let verdict = Verdict::evaluate(100, 0, 101);
        assert_eq!(verdict.lag_blocks, 1);
        assert!(!verdict.in_sync);
    }

    #[test]
    fn test_negative_threshold_requires_lead() {
        let verdict = Verdict::evaluate(100, -2, 100);
        assert_eq!(verdict.lag_blocks, 2);
        assert!(!verdict.in_sync);

        let verdict = Verdict::evaluate(102, -2, 100);
        assert!(verdict.in_sync);
    }

    #[test]
    fn test_lag_formula_over_grid() {
        for local in [0i64, 1, 99, 1_000_000] {
            for threshold in [-10i64, 0, 10, 64] {
                for external in [0i64, 50, 1_000_010, 1_000_100] {
                    let verdict = Verdict::evaluate(local, threshold, external);
                    assert_eq!(verdict.lag_blocks, external - (local + threshold));
                    assert_eq!(verdict.in_sync, verdict.lag_blocks <= 0);
                }
            }
        }
    }

    #[test]
    fn test_single_failure_does_not_change_verdict() {
        let all = height_set(100, &[Some(120), Some(120), Some(90)]).verdict(10).unwrap();
        let one_failed = height_set(100, &[Some(120), None, Some(90)]).verdict(10).unwrap();
        assert_eq!(all, one_failed);
    }
}
