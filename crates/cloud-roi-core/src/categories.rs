use serde::{Deserialize, Serialize};

use crate::inputs::InputValues;
use crate::scoring::{
    cloud_provider_score, cost_of_failure_score, departments_score, failure_rate_score,
    industry_score, passthrough_score, pricing_model_score, response_time_score,
    service_model_score, spend_trend_score, storage_efficiency_score, usage_hours_score,
    vm_count_score, workload_score, ProviderContext,
};

/// The four aggregate scores, nominally 0–100.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryScores {
    pub productivity: f64,
    pub cost_savings: f64,
    pub performance: f64,
    pub availability: f64,
}

/// One `(weight, component score)` pair of a category.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WeightedTerm {
    pub weight: f64,
    pub score: f64,
}

const fn term(weight: f64, score: f64) -> WeightedTerm {
    WeightedTerm { weight, score }
}

/// Sum of `weight * score` over the sum of weights. Terms are accumulated in
/// order so results are reproducible to the bit.
pub fn weighted_average(terms: &[WeightedTerm]) -> f64 {
    let numerator = terms.iter().fold(0.0, |acc, t| acc + t.weight * t.score);
    let divisor = terms.iter().fold(0.0, |acc, t| acc + t.weight);
    numerator / divisor
}

pub fn productivity_terms(inputs: &InputValues) -> [WeightedTerm; 8] {
    [
        term(3.0, workload_score(inputs.workload_in_cloud_description)),
        term(3.0, usage_hours_score(inputs.cloud_usage_hours)),
        term(2.0, service_model_score(&inputs.service_model)),
        term(1.0, spend_trend_score(inputs.spend_trend)),
        term(1.0, industry_score(inputs.industry_type)),
        term(2.0, passthrough_score(inputs.time_on_ops)),
        term(2.0, passthrough_score(inputs.manual_toil)),
        term(1.0, passthrough_score(inputs.gross_margin)),
    ]
}

pub fn cost_savings_terms(inputs: &InputValues) -> [WeightedTerm; 5] {
    [
        term(3.0, pricing_model_score(inputs.pricing_model)),
        term(3.0, passthrough_score(inputs.compute_spend)),
        term(2.0, passthrough_score(inputs.cost_sensitive_workloads)),
        term(2.0, passthrough_score(inputs.container_workloads)),
        term(
            1.0,
            cloud_provider_score(inputs.cloud_provider, ProviderContext::Cost),
        ),
    ]
}

pub fn performance_terms(inputs: &InputValues) -> [WeightedTerm; 8] {
    [
        term(3.0, vm_count_score(inputs.number_of_vms)),
        term(3.0, passthrough_score(inputs.vm_utilization)),
        term(2.0, passthrough_score(inputs.container_workloads)),
        term(2.0, service_model_score(&inputs.service_model)),
        term(
            1.0,
            cloud_provider_score(inputs.cloud_provider, ProviderContext::Performance),
        ),
        term(1.0, spend_trend_score(inputs.spend_trend)),
        term(2.0, storage_efficiency_score(inputs.storage_efficiency)),
        term(2.0, response_time_score(inputs.response_time)),
    ]
}

pub fn availability_terms(inputs: &InputValues) -> [WeightedTerm; 5] {
    [
        term(
            3.0,
            cloud_provider_score(inputs.cloud_provider, ProviderContext::Availability),
        ),
        term(3.0, failure_rate_score(inputs.failure_rate)),
        term(2.0, cost_of_failure_score(inputs.cost_of_failure)),
        term(3.0, departments_score(inputs.departments_served)),
        term(2.0, workload_score(inputs.workload_in_cloud_description)),
    ]
}

pub fn category_scores(inputs: &InputValues) -> CategoryScores {
    CategoryScores {
        productivity: weighted_average(&productivity_terms(inputs)),
        cost_savings: weighted_average(&cost_savings_terms(inputs)),
        performance: weighted_average(&performance_terms(inputs)),
        availability: weighted_average(&availability_terms(inputs)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn weight_sum(terms: &[WeightedTerm]) -> f64 {
        terms.iter().map(|t| t.weight).sum()
    }

    #[test]
    fn divisors_match_published_weights() {
        let inputs = InputValues::default();
        assert_eq!(weight_sum(&productivity_terms(&inputs)), 15.0);
        assert_eq!(weight_sum(&cost_savings_terms(&inputs)), 11.0);
        assert_eq!(weight_sum(&performance_terms(&inputs)), 16.0);
        assert_eq!(weight_sum(&availability_terms(&inputs)), 13.0);
    }

    #[test]
    fn default_inputs_produce_expected_category_scores() {
        let scores = category_scores(&InputValues::default());

        // 3*100 + 3*60 + 2*78 + 30 + 80 + 2*30 + 2*60 + 47 = 973
        assert!((scores.productivity - 973.0 / 15.0).abs() < 1e-9);
        // 3*85 + 3*45 + 2*50 + 2*50 + 80 = 670
        assert!((scores.cost_savings - 670.0 / 11.0).abs() < 1e-9);
        // 3*60 + 3*65 + 2*50 + 2*78 + 80 + 30 + 2*60 + 2*30 = 921
        assert!((scores.performance - 921.0 / 16.0).abs() < 1e-9);
        // 3*90 + 3*70 + 2*50 + 3*75 + 2*100 = 1005
        assert!((scores.availability - 1005.0 / 13.0).abs() < 1e-9);
    }

    #[test]
    fn weighted_average_of_equal_scores_is_that_score() {
        let terms = [term(3.0, 42.0), term(1.0, 42.0), term(2.0, 42.0)];
        assert_eq!(weighted_average(&terms), 42.0);
    }
}
