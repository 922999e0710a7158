//! Component scorers: one raw input field in, one 0–100 sub-score out.
//!
//! Categorical fields go through a [`ScoreTable`], a closed lookup with an
//! explicit default entry. Numeric fields are either banded by thresholds or
//! passed through unchanged.

use crate::inputs::{
    CloudProvider, IndustryType, PricingModel, ServiceModel, SpendTrend, StorageEfficiency,
    VmCountBucket, WorkloadDescription,
};

/// Lookup from a categorical value to its score. Keys missing from `entries`
/// (including every `Unrecognized` variant) score as `default`.
#[derive(Debug)]
pub struct ScoreTable<K: 'static> {
    pub entries: &'static [(K, f64)],
    pub default: f64,
}

impl<K: PartialEq> ScoreTable<K> {
    pub fn lookup(&self, key: &K) -> f64 {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map_or(self.default, |(_, score)| *score)
    }

    pub fn contains(&self, key: &K) -> bool {
        self.entries.iter().any(|(k, _)| k == key)
    }
}

/// Which category is asking for a cloud-provider score.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderContext {
    Cost,
    Performance,
    Availability,
}

pub const WORKLOAD_SCORES: ScoreTable<WorkloadDescription> = ScoreTable {
    entries: &[
        (WorkloadDescription::AlmostAll, 100.0),
        (WorkloadDescription::MostCloud, 90.0),
        (WorkloadDescription::Balanced, 75.0),
        (WorkloadDescription::EarlyAdoption, 60.0),
        (WorkloadDescription::MostlyOnprem, 40.0),
    ],
    default: 30.0,
};

pub const SPEND_TREND_SCORES: ScoreTable<SpendTrend> = ScoreTable {
    entries: &[
        (SpendTrend::Decreasing, 80.0),
        (SpendTrend::Stable, 50.0),
        (SpendTrend::Increasing, 30.0),
    ],
    default: 50.0,
};

pub const INDUSTRY_SCORES: ScoreTable<IndustryType> = ScoreTable {
    entries: &[
        (IndustryType::Tech, 90.0),
        (IndustryType::Healthcare, 80.0),
        (IndustryType::Retail, 70.0),
        (IndustryType::Government, 60.0),
    ],
    default: 70.0,
};

pub const PRICING_MODEL_SCORES: ScoreTable<PricingModel> = ScoreTable {
    entries: &[
        (PricingModel::Spot, 85.0),
        (PricingModel::Reserved, 75.0),
        (PricingModel::Ondemand, 60.0),
    ],
    default: 60.0,
};

pub const VM_COUNT_SCORES: ScoreTable<VmCountBucket> = ScoreTable {
    entries: &[
        (VmCountBucket::Low, 45.0),
        (VmCountBucket::Medium, 60.0),
        (VmCountBucket::High, 75.0),
        (VmCountBucket::VeryHigh, 90.0),
    ],
    default: 45.0,
};

pub const STORAGE_EFFICIENCY_SCORES: ScoreTable<StorageEfficiency> = ScoreTable {
    entries: &[
        (StorageEfficiency::High, 90.0),
        (StorageEfficiency::Moderate, 60.0),
        (StorageEfficiency::Low, 40.0),
    ],
    default: 60.0,
};

// `Others` has no entry of its own; it shares the default row.
pub const PROVIDER_COST_SCORES: ScoreTable<CloudProvider> = ScoreTable {
    entries: &[
        (CloudProvider::Aws, 90.0),
        (CloudProvider::Azure, 80.0),
        (CloudProvider::Gcp, 75.0),
    ],
    default: 60.0,
};

pub const PROVIDER_PERFORMANCE_SCORES: ScoreTable<CloudProvider> = ScoreTable {
    entries: &[
        (CloudProvider::Aws, 85.0),
        (CloudProvider::Azure, 80.0),
        (CloudProvider::Gcp, 82.0),
    ],
    default: 70.0,
};

pub const PROVIDER_AVAILABILITY_SCORES: ScoreTable<CloudProvider> = ScoreTable {
    entries: &[
        (CloudProvider::Aws, 95.0),
        (CloudProvider::Azure, 90.0),
        (CloudProvider::Gcp, 85.0),
    ],
    default: 70.0,
};

pub fn workload_score(description: WorkloadDescription) -> f64 {
    WORKLOAD_SCORES.lookup(&description)
}

pub fn spend_trend_score(trend: SpendTrend) -> f64 {
    SPEND_TREND_SCORES.lookup(&trend)
}

pub fn industry_score(industry: IndustryType) -> f64 {
    INDUSTRY_SCORES.lookup(&industry)
}

pub fn pricing_model_score(model: PricingModel) -> f64 {
    PRICING_MODEL_SCORES.lookup(&model)
}

pub fn vm_count_score(bucket: VmCountBucket) -> f64 {
    VM_COUNT_SCORES.lookup(&bucket)
}

pub fn storage_efficiency_score(efficiency: StorageEfficiency) -> f64 {
    STORAGE_EFFICIENCY_SCORES.lookup(&efficiency)
}

pub fn cloud_provider_score(provider: CloudProvider, context: ProviderContext) -> f64 {
    let table = match context {
        ProviderContext::Cost => &PROVIDER_COST_SCORES,
        ProviderContext::Performance => &PROVIDER_PERFORMANCE_SCORES,
        ProviderContext::Availability => &PROVIDER_AVAILABILITY_SCORES,
    };
    table.lookup(&provider)
}

/// Weekly cloud usage hours.
pub fn usage_hours_score(hours: f64) -> f64 {
    if hours > 160.0 {
        95.0
    } else if hours >= 130.0 {
        80.0
    } else if hours >= 100.0 {
        70.0
    } else if hours >= 70.0 {
        60.0
    } else {
        45.0
    }
}

/// Response time in milliseconds; faster is better.
pub fn response_time_score(ms: f64) -> f64 {
    if ms < 200.0 {
        90.0
    } else if ms <= 500.0 {
        80.0
    } else if ms <= 800.0 {
        60.0
    } else if ms <= 1200.0 {
        40.0
    } else {
        30.0
    }
}

pub fn departments_score(count: u32) -> f64 {
    match count {
        15.. => 95.0,
        10..=14 => 85.0,
        7..=9 => 75.0,
        4..=6 => 60.0,
        1..=3 => 45.0,
        0 => 30.0,
    }
}

pub fn failure_rate_score(percentage: f64) -> f64 {
    if percentage < 0.5 {
        90.0
    } else if percentage <= 1.0 {
        80.0
    } else if percentage <= 2.0 {
        70.0
    } else if percentage <= 3.0 {
        50.0
    } else {
        30.0
    }
}

pub fn cost_of_failure_score(percentage: f64) -> f64 {
    if percentage < 0.5 {
        90.0
    } else if percentage <= 1.0 {
        70.0
    } else if percentage <= 2.0 {
        50.0
    } else {
        30.0
    }
}

/// Per-unit contributions of each service model share. Not renormalized, so a
/// split that does not total 100 scales the result proportionally.
pub fn service_model_score(model: &ServiceModel) -> f64 {
    let saas = model.saas / 100.0 * 90.0;
    let paas = model.paas / 100.0 * 80.0;
    let iaas = model.iaas / 100.0 * 60.0;
    saas + paas + iaas
}

/// Percentage fields that act as their own score: time on ops, manual toil,
/// compute spend, cost-sensitive workloads, container workloads, gross margin
/// and VM utilization. No clamping.
pub const fn passthrough_score(percentage: f64) -> f64 {
    percentage
}
