use serde::{Deserialize, Serialize};

/// Percentage split of cloud usage across service models.
///
/// The three shares are meant to add up to 100 but nothing here enforces it.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ServiceModel {
    pub saas: f64,
    pub paas: f64,
    pub iaas: f64,
}

impl ServiceModel {
    pub fn total(&self) -> f64 {
        self.saas + self.paas + self.iaas
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkloadDescription {
    AlmostAll,
    MostCloud,
    Balanced,
    EarlyAdoption,
    MostlyOnprem,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SpendTrend {
    Increasing,
    Stable,
    Decreasing,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IndustryType {
    Tech,
    Healthcare,
    Retail,
    Government,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PricingModel {
    Spot,
    Reserved,
    Ondemand,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudProvider {
    Aws,
    Azure,
    Gcp,
    Others,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmCountBucket {
    Low,
    Medium,
    High,
    VeryHigh,
    #[serde(other)]
    Unrecognized,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StorageEfficiency {
    High,
    Moderate,
    Low,
    #[serde(other)]
    Unrecognized,
}

/// One complete parameter snapshot for a single evaluation.
///
/// Field names follow the camelCase wire format used by the calculator UI and
/// the stored records. Categorical fields never fail to deserialize: values
/// outside the known set land on the `Unrecognized` variant and score as the
/// table default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputValues {
    #[serde(default)]
    pub company_name: String,
    pub revenue_per_year: f64,
    pub cloud_spend_per_year: f64,
    pub engineers: u32,
    pub engineer_cost_per_year: f64,
    pub workload_in_cloud_description: WorkloadDescription,
    pub cloud_usage_hours: f64,
    pub service_model: ServiceModel,
    pub spend_trend: SpendTrend,
    pub industry_type: IndustryType,
    pub time_on_ops: f64,
    pub manual_toil: f64,
    pub container_workloads: f64,
    pub pricing_model: PricingModel,
    pub compute_spend: f64,
    pub cost_sensitive_workloads: f64,
    pub cloud_provider: CloudProvider,
    pub gross_margin: f64,
    #[serde(rename = "numberOfVMs")]
    pub number_of_vms: VmCountBucket,
    pub vm_utilization: f64,
    pub storage_efficiency: StorageEfficiency,
    pub response_time: f64,
    pub departments_served: u32,
    pub failure_rate: f64,
    pub cost_of_failure: f64,
}

impl Default for InputValues {
    /// The calculator's opening state.
    fn default() -> Self {
        Self {
            company_name: String::new(),
            revenue_per_year: 457_000_000.0,
            cloud_spend_per_year: 8_080_000.0,
            engineers: 416,
            engineer_cost_per_year: 150_000.0,
            workload_in_cloud_description: WorkloadDescription::AlmostAll,
            cloud_usage_hours: 84.0,
            service_model: ServiceModel {
                saas: 40.0,
                paas: 30.0,
                iaas: 30.0,
            },
            spend_trend: SpendTrend::Increasing,
            industry_type: IndustryType::Healthcare,
            time_on_ops: 30.0,
            manual_toil: 60.0,
            container_workloads: 50.0,
            pricing_model: PricingModel::Spot,
            compute_spend: 45.0,
            cost_sensitive_workloads: 50.0,
            cloud_provider: CloudProvider::Azure,
            gross_margin: 47.0,
            number_of_vms: VmCountBucket::Medium,
            vm_utilization: 65.0,
            storage_efficiency: StorageEfficiency::Moderate,
            response_time: 1280.0,
            departments_served: 8,
            failure_rate: 1.5,
            cost_of_failure: 2.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_categorical_values_deserialize_as_unrecognized() {
        let mut raw = serde_json::to_value(InputValues::default()).expect("serialize defaults");
        raw["industryType"] = serde_json::json!("aerospace");
        raw["workloadInCloudDescription"] = serde_json::json!("we are mostly in the cloud");

        let parsed: InputValues = serde_json::from_value(raw).expect("parse inputs");
        assert_eq!(parsed.industry_type, IndustryType::Unrecognized);
        assert_eq!(
            parsed.workload_in_cloud_description,
            WorkloadDescription::Unrecognized
        );
    }

    #[test]
    fn wire_names_match_calculator_payload() {
        let raw = serde_json::to_value(InputValues::default()).expect("serialize defaults");
        assert_eq!(raw["numberOfVMs"], "medium");
        assert_eq!(raw["workloadInCloudDescription"], "almost_all");
        assert_eq!(raw["serviceModel"]["saas"], 40.0);
        assert_eq!(raw["departmentsServed"], 8);
    }
}
