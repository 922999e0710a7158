use crate::multiplier::CategoryMultipliers;

/// Fixed annual migration cost charged against the gains in the ROI ratio.
pub const ANNUAL_MIGRATION_COST_IMPACT: f64 = 120_000.0;

/// Share of revenue that can ever be attributed to cloud workloads.
pub const REVENUE_CLOUD_CAP: f64 = 0.7;

pub const MONTHS_PER_YEAR: f64 = 12.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainInputs {
    pub revenue_per_year: f64,
    pub cloud_spend_per_year: f64,
    pub engineers: u32,
    pub engineer_cost_per_year: f64,
    pub workload_score: f64,
    pub gross_margin_score: f64,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GainBreakdown {
    pub revenue_cloud: f64,
    pub productivity_gain: f64,
    pub cost_savings: f64,
    pub performance_gain: f64,
    pub availability_gain: f64,
    pub total_roi: f64,
    pub roi_percentage: f64,
    pub monthly_gains: f64,
}

pub fn revenue_cloud(revenue_per_year: f64, workload_score: f64) -> f64 {
    revenue_per_year * (workload_score / 100.0).min(REVENUE_CLOUD_CAP)
}

/// ROI relative to spend plus migration cost. Cloud spend appears in the
/// denominator only.
pub fn roi_percentage(total_roi: f64, cloud_spend_per_year: f64) -> f64 {
    (total_roi - ANNUAL_MIGRATION_COST_IMPACT)
        / (cloud_spend_per_year + ANNUAL_MIGRATION_COST_IMPACT)
        * 100.0
}

pub fn calculate_gains(inputs: &GainInputs, multipliers: &CategoryMultipliers) -> GainBreakdown {
    let revenue_cloud = revenue_cloud(inputs.revenue_per_year, inputs.workload_score);

    let productivity_gain =
        f64::from(inputs.engineers) * inputs.engineer_cost_per_year * multipliers.productivity;
    let cost_savings = inputs.cloud_spend_per_year * multipliers.cost_savings;
    let performance_gain =
        revenue_cloud * multipliers.performance * inputs.gross_margin_score / 100.0;
    let availability_gain =
        revenue_cloud * multipliers.availability * inputs.gross_margin_score / 100.0;

    let total_roi = productivity_gain + cost_savings + performance_gain + availability_gain;

    GainBreakdown {
        revenue_cloud,
        productivity_gain,
        cost_savings,
        performance_gain,
        availability_gain,
        total_roi,
        roi_percentage: roi_percentage(total_roi, inputs.cloud_spend_per_year),
        monthly_gains: total_roi / MONTHS_PER_YEAR,
    }
}
