use serde::{Deserialize, Serialize};

use crate::categories::CategoryScores;

/// Exponent of the ease-in curve. Mediocre scores stay close to the range
/// floor; only high scores approach the ceiling.
pub const CURVE_POWER: f64 = 3.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MultiplierRange {
    pub min: f64,
    pub max: f64,
}

pub const PRODUCTIVITY_RANGE: MultiplierRange = MultiplierRange {
    min: 0.10,
    max: 0.20,
};

pub const COST_SAVINGS_RANGE: MultiplierRange = MultiplierRange {
    min: 0.10,
    max: 0.30,
};

pub const PERFORMANCE_RANGE: MultiplierRange = MultiplierRange {
    min: 0.02,
    max: 0.05,
};

pub const AVAILABILITY_RANGE: MultiplierRange = MultiplierRange {
    min: 0.01,
    max: 0.03,
};

impl MultiplierRange {
    /// `min + (score / 100)^3 * (max - min)`.
    pub fn apply(&self, score: f64) -> f64 {
        let normalized = (score / 100.0).powf(CURVE_POWER);
        self.min + normalized * (self.max - self.min)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryMultipliers {
    pub productivity: f64,
    pub cost_savings: f64,
    pub performance: f64,
    pub availability: f64,
}

pub fn category_multipliers(scores: &CategoryScores) -> CategoryMultipliers {
    CategoryMultipliers {
        productivity: PRODUCTIVITY_RANGE.apply(scores.productivity),
        cost_savings: COST_SAVINGS_RANGE.apply(scores.cost_savings),
        performance: PERFORMANCE_RANGE.apply(scores.performance),
        availability: AVAILABILITY_RANGE.apply(scores.availability),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL_RANGES: [MultiplierRange; 4] = [
        PRODUCTIVITY_RANGE,
        COST_SAVINGS_RANGE,
        PERFORMANCE_RANGE,
        AVAILABILITY_RANGE,
    ];

    #[test]
    fn endpoints_hit_range_bounds_exactly() {
        for range in ALL_RANGES {
            assert_eq!(range.apply(0.0), range.min);
            assert_eq!(range.apply(100.0), range.max);
        }
    }

    #[test]
    fn curve_is_cubic_not_linear() {
        // Halfway along the score axis only an eighth of the span is reached.
        let mid = COST_SAVINGS_RANGE.apply(50.0);
        assert!((mid - (0.10 + 0.125 * 0.20)).abs() < 1e-12);

        let linear_mid = (COST_SAVINGS_RANGE.min + COST_SAVINGS_RANGE.max) / 2.0;
        assert!(mid < linear_mid);
    }

    #[test]
    fn curve_uses_general_pow() {
        // Repeated multiplication lands one ulp lower for this score.
        let normalized = (71.6875_f64 / 100.0).powf(CURVE_POWER);
        assert_eq!(normalized, 0.368_409_063_232_421_95);
        assert_eq!(PERFORMANCE_RANGE.apply(71.6875), 0.031_052_271_896_972_662);
    }

    #[test]
    fn out_of_range_scores_are_not_clamped() {
        assert!(AVAILABILITY_RANGE.apply(120.0) > AVAILABILITY_RANGE.max);
        assert!(AVAILABILITY_RANGE.apply(-10.0) < AVAILABILITY_RANGE.min);
    }
}
