use serde::{Deserialize, Serialize};

use crate::categories::{category_scores, CategoryScores};
use crate::gains::{calculate_gains, GainBreakdown, GainInputs};
use crate::inputs::InputValues;
use crate::multiplier::{category_multipliers, CategoryMultipliers};
use crate::scoring::{passthrough_score, workload_score};

/// Everything a caller needs to render one evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalculationResults {
    pub productivity_gain: f64,
    pub cost_savings: f64,
    pub performance_gain: f64,
    pub availability_gain: f64,
    #[serde(rename = "totalROI")]
    pub total_roi: f64,
    pub roi_percentage: f64,
    pub monthly_gains: f64,
    pub scores: CategoryScores,
}

/// Results plus the intermediate values that produced them.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Evaluation {
    pub results: CalculationResults,
    pub multipliers: CategoryMultipliers,
    pub gains: GainBreakdown,
}

/// Runs the full pipeline: component scores, category scores, multipliers,
/// gains. Pure and deterministic; equal inputs give bit-identical outputs.
pub fn compute(inputs: &InputValues) -> CalculationResults {
    evaluate(inputs).results
}

pub fn evaluate(inputs: &InputValues) -> Evaluation {
    let scores = category_scores(inputs);
    let multipliers = category_multipliers(&scores);
    let gains = calculate_gains(
        &GainInputs {
            revenue_per_year: inputs.revenue_per_year,
            cloud_spend_per_year: inputs.cloud_spend_per_year,
            engineers: inputs.engineers,
            engineer_cost_per_year: inputs.engineer_cost_per_year,
            workload_score: workload_score(inputs.workload_in_cloud_description),
            gross_margin_score: passthrough_score(inputs.gross_margin),
        },
        &multipliers,
    );

    Evaluation {
        results: CalculationResults {
            productivity_gain: gains.productivity_gain,
            cost_savings: gains.cost_savings,
            performance_gain: gains.performance_gain,
            availability_gain: gains.availability_gain,
            total_roi: gains.total_roi,
            roi_percentage: gains.roi_percentage,
            monthly_gains: gains.monthly_gains,
            scores,
        },
        multipliers,
        gains,
    }
}
