//! Result scoring and normalization.
//!
//! Generated concepts arrive with sub-scores on an unknown scale; this module
//! normalizes every sub-score into the fixed `[1, 5]` range and derives a
//! composite score that is exactly reproducible from the stored sub-scores
//! alone. No hidden state participates in the computation.

use serde::{Deserialize, Serialize};

use crate::model::SubScores;

/// Raw, un-normalized sub-scores as returned by the generation service.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RawScores {
    pub relevance: f64,
    pub feasibility: f64,
    pub impact: f64,
    pub novelty: f64,
}

/// Optional weighting scheme for the composite score.
///
/// When no weights are supplied the composite is the plain arithmetic mean.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoreWeights {
    pub relevance: f64,
    pub feasibility: f64,
    pub impact: f64,
    pub novelty: f64,
}

impl ScoreWeights {
    fn as_array(&self) -> [f64; 4] {
        [self.relevance, self.feasibility, self.impact, self.novelty]
    }

    /// Returns true if every weight is positive and finite.
    pub fn is_valid(&self) -> bool {
        self.as_array().iter().all(|w| w.is_finite() && *w > 0.0)
    }
}

/// Rounds half away from zero, the rounding rule used throughout scoring.
fn round_half_away(value: f64) -> f64 {
    value.round()
}

/// Normalizes a raw sub-score into the `[1, 5]` integer range.
///
/// - Values below 1 clamp to 1.
/// - Values already in `[1, 5]` round to the nearest integer.
/// - Values above 5 are assumed to be on a 10-point scale and rescale via
///   `round(value / 10 * 5)`, then clamp into range.
pub fn normalize_sub_score(raw: f64) -> i16 {
    if !raw.is_finite() || raw < 1.0 {
        return 1;
    }
    let scaled = if raw > 5.0 {
        round_half_away(raw / 10.0 * 5.0)
    } else {
        round_half_away(raw)
    };
    scaled.clamp(1.0, 5.0) as i16
}

/// Normalizes all four sub-scores.
pub fn normalize(raw: &RawScores) -> SubScores {
    SubScores {
        relevance: normalize_sub_score(raw.relevance),
        feasibility: normalize_sub_score(raw.feasibility),
        impact: normalize_sub_score(raw.impact),
        novelty: normalize_sub_score(raw.novelty),
    }
}

/// Computes the composite score from normalized sub-scores.
///
/// Arithmetic mean (or weighted mean when weights are supplied), rounded half
/// away from zero to two decimals. Deterministic: the same sub-scores always
/// produce the same composite.
pub fn composite_score(scores: &SubScores, weights: Option<&ScoreWeights>) -> f64 {
    let values = scores.as_array();
    let mean = match weights {
        Some(w) if w.is_valid() => {
            let w = w.as_array();
            let weighted: f64 = values
                .iter()
                .zip(w.iter())
                .map(|(v, w)| f64::from(*v) * w)
                .sum();
            weighted / w.iter().sum::<f64>()
        }
        _ => values.iter().map(|v| f64::from(*v)).sum::<f64>() / values.len() as f64,
    };
    round_half_away(mean * 100.0) / 100.0
}

/// Normalizes raw scores and derives the composite in one step.
pub fn score(raw: &RawScores, weights: Option<&ScoreWeights>) -> (SubScores, f64) {
    let normalized = normalize(raw);
    let composite = composite_score(&normalized, weights);
    (normalized, composite)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_ten_point_scale() {
        // 8 on an assumed 10-point scale: round(8 / 10 * 5) = 4.
        assert_eq!(normalize_sub_score(8.0), 4);
        assert_eq!(normalize_sub_score(10.0), 5);
        assert_eq!(normalize_sub_score(6.0), 3);
    }

    #[test]
    fn test_normalize_clamps_low_values() {
        assert_eq!(normalize_sub_score(0.0), 1);
        assert_eq!(normalize_sub_score(-3.0), 1);
        assert_eq!(normalize_sub_score(0.9), 1);
    }

    #[test]
    fn test_normalize_in_range_rounds() {
        assert_eq!(normalize_sub_score(3.0), 3);
        assert_eq!(normalize_sub_score(3.4), 3);
        assert_eq!(normalize_sub_score(3.5), 4);
        assert_eq!(normalize_sub_score(5.0), 5);
        assert_eq!(normalize_sub_score(1.0), 1);
    }

    #[test]
    fn test_normalize_non_finite_clamps() {
        assert_eq!(normalize_sub_score(f64::NAN), 1);
        assert_eq!(normalize_sub_score(f64::INFINITY), 1);
    }

    #[test]
    fn test_composite_is_mean() {
        let scores = SubScores {
            relevance: 4,
            feasibility: 3,
            impact: 5,
            novelty: 2,
        };
        assert_eq!(composite_score(&scores, None), 3.5);
    }

    #[test]
    fn test_composite_is_deterministic() {
        let scores = SubScores {
            relevance: 5,
            feasibility: 4,
            impact: 4,
            novelty: 3,
        };
        let first = composite_score(&scores, None);
        for _ in 0..10 {
            assert_eq!(composite_score(&scores, None), first);
        }
        assert_eq!(first, 4.0);
    }

    #[test]
    fn test_composite_rounds_to_two_decimals() {
        let scores = SubScores {
            relevance: 5,
            feasibility: 5,
            impact: 5,
            novelty: 4,
        };
        // 19 / 4 = 4.75
        assert_eq!(composite_score(&scores, None), 4.75);

        let scores = SubScores {
            relevance: 2,
            feasibility: 2,
            impact: 2,
            novelty: 3,
        };
        // 9 / 4 = 2.25
        assert_eq!(composite_score(&scores, None), 2.25);
    }

    #[test]
    fn test_weighted_composite() {
        let scores = SubScores {
            relevance: 5,
            feasibility: 1,
            impact: 1,
            novelty: 1,
        };
        let weights = ScoreWeights {
            relevance: 2.0,
            feasibility: 1.0,
            impact: 1.0,
            novelty: 1.0,
        };
        // (5*2 + 1 + 1 + 1) / 5 = 2.6
        assert_eq!(composite_score(&scores, Some(&weights)), 2.6);
    }

    #[test]
    fn test_invalid_weights_fall_back_to_mean() {
        let scores = SubScores {
            relevance: 4,
            feasibility: 4,
            impact: 4,
            novelty: 4,
        };
        let weights = ScoreWeights {
            relevance: 0.0,
            feasibility: 1.0,
            impact: 1.0,
            novelty: 1.0,
        };
        assert_eq!(composite_score(&scores, Some(&weights)), 4.0);
    }

    #[test]
    fn test_score_end_to_end() {
        let raw = RawScores {
            relevance: 8.0,
            feasibility: 3.0,
            impact: 0.0,
            novelty: 4.6,
        };
        let (normalized, composite) = score(&raw, None);
        assert_eq!(normalized.relevance, 4);
        assert_eq!(normalized.feasibility, 3);
        assert_eq!(normalized.impact, 1);
        assert_eq!(normalized.novelty, 5);
        // (4 + 3 + 1 + 5) / 4 = 3.25
        assert_eq!(composite, 3.25);
    }
}
