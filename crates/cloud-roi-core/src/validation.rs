//! Boundary checks for callers that collect inputs. The engine itself never
//! consults these: it computes whatever it is given.

use serde::{Deserialize, Serialize};

use crate::inputs::{
    CloudProvider, IndustryType, InputValues, PricingModel, SpendTrend, StorageEfficiency,
    VmCountBucket, WorkloadDescription,
};

const SERVICE_MODEL_TOLERANCE: f64 = 0.01;
const HOURS_PER_WEEK: f64 = 168.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Severity {
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationIssue {
    pub field: &'static str,
    pub severity: Severity,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct ValidationReport {
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    pub fn has_errors(&self) -> bool {
        self.issues.iter().any(|i| i.severity == Severity::Error)
    }

    pub fn errors(&self) -> impl Iterator<Item = &ValidationIssue> {
        self.issues.iter().filter(|i| i.severity == Severity::Error)
    }

    pub fn is_clean(&self) -> bool {
        self.issues.is_empty()
    }

    fn error(&mut self, field: &'static str, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            field,
            severity: Severity::Error,
            message: message.into(),
        });
    }

    fn warning(&mut self, field: &'static str, message: impl Into<String>) {
        self.issues.push(ValidationIssue {
            field,
            severity: Severity::Warning,
            message: message.into(),
        });
    }

    fn non_negative(&mut self, field: &'static str, value: f64) {
        if !value.is_finite() {
            self.error(field, "must be a finite number");
        } else if value < 0.0 {
            self.error(field, format!("must not be negative (got {value})"));
        }
    }

    fn within(&mut self, field: &'static str, value: f64, min: f64, max: f64) {
        if !value.is_finite() {
            self.error(field, "must be a finite number");
        } else if value < min || value > max {
            self.error(field, format!("must be between {min} and {max} (got {value})"));
        }
    }

    fn defaulted(&mut self, field: &'static str, unrecognized: bool) {
        if unrecognized {
            self.warning(field, "unrecognized value; the default score was used");
        }
    }
}

pub fn validate_inputs(inputs: &InputValues) -> ValidationReport {
    let mut report = ValidationReport::default();

    report.non_negative("revenuePerYear", inputs.revenue_per_year);
    report.non_negative("cloudSpendPerYear", inputs.cloud_spend_per_year);
    report.non_negative("engineerCostPerYear", inputs.engineer_cost_per_year);
    report.non_negative("responseTime", inputs.response_time);
    report.non_negative("failureRate", inputs.failure_rate);
    report.non_negative("costOfFailure", inputs.cost_of_failure);
    report.within("cloudUsageHours", inputs.cloud_usage_hours, 0.0, HOURS_PER_WEEK);

    for (field, value) in [
        ("timeOnOps", inputs.time_on_ops),
        ("manualToil", inputs.manual_toil),
        ("containerWorkloads", inputs.container_workloads),
        ("computeSpend", inputs.compute_spend),
        ("costSensitiveWorkloads", inputs.cost_sensitive_workloads),
        ("vmUtilization", inputs.vm_utilization),
        ("grossMargin", inputs.gross_margin),
        ("serviceModel.saas", inputs.service_model.saas),
        ("serviceModel.paas", inputs.service_model.paas),
        ("serviceModel.iaas", inputs.service_model.iaas),
    ] {
        report.within(field, value, 0.0, 100.0);
    }

    let total = inputs.service_model.total();
    if total.is_finite() && (total - 100.0).abs() > SERVICE_MODEL_TOLERANCE {
        report.warning(
            "serviceModel",
            format!("shares add up to {total}, not 100; the score is not renormalized"),
        );
    }

    report.defaulted(
        "workloadInCloudDescription",
        inputs.workload_in_cloud_description == WorkloadDescription::Unrecognized,
    );
    report.defaulted(
        "spendTrend",
        inputs.spend_trend == SpendTrend::Unrecognized,
    );
    report.defaulted(
        "industryType",
        inputs.industry_type == IndustryType::Unrecognized,
    );
    report.defaulted(
        "pricingModel",
        inputs.pricing_model == PricingModel::Unrecognized,
    );
    report.defaulted(
        "cloudProvider",
        inputs.cloud_provider == CloudProvider::Unrecognized,
    );
    report.defaulted(
        "numberOfVMs",
        inputs.number_of_vms == VmCountBucket::Unrecognized,
    );
    report.defaulted(
        "storageEfficiency",
        inputs.storage_efficiency == StorageEfficiency::Unrecognized,
    );

    report
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::inputs::ServiceModel;

    #[test]
    fn calculator_defaults_are_clean() {
        let report = validate_inputs(&InputValues::default());
        assert!(report.is_clean(), "{:?}", report.issues);
    }

    #[test]
    fn service_model_gap_is_a_warning_only() {
        let inputs = InputValues {
            service_model: ServiceModel {
                saas: 50.0,
                paas: 30.0,
                iaas: 30.0,
            },
            ..InputValues::default()
        };
        let report = validate_inputs(&inputs);
        assert!(!report.has_errors());
        assert_eq!(report.issues.len(), 1);
        assert_eq!(report.issues[0].field, "serviceModel");
    }

    #[test]
    fn out_of_range_numbers_are_errors() {
        let inputs = InputValues {
            cloud_usage_hours: 200.0,
            revenue_per_year: -1.0,
            gross_margin: f64::NAN,
            ..InputValues::default()
        };
        let report = validate_inputs(&inputs);
        let fields = report.errors().map(|i| i.field).collect::<Vec<_>>();
        assert_eq!(fields, vec!["revenuePerYear", "cloudUsageHours", "grossMargin"]);
    }

    #[test]
    fn unrecognized_categories_are_reported_as_defaulted() {
        let inputs = InputValues {
            industry_type: IndustryType::Unrecognized,
            number_of_vms: VmCountBucket::Unrecognized,
            ..InputValues::default()
        };
        let report = validate_inputs(&inputs);
        assert!(!report.has_errors());
        let fields = report.issues.iter().map(|i| i.field).collect::<Vec<_>>();
        assert_eq!(fields, vec!["industryType", "numberOfVMs"]);
    }
}
