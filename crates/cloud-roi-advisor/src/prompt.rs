//! Conversation text sent to the chat model.
//!
//! The system prompt carries the user's inputs and the computed results only.
//! How scores, multipliers and gains are derived stays on this side of the
//! wire, so the model can only reason in terms of input adjustments.

use std::fmt::Write as _;

use cloud_roi_core::{CalculationResults, InputValues};
use serde::Serialize;

use crate::types::{AdvisoryRequest, ChatMessage, ChatRole};

/// Returned to the user in place of advice when the provider call fails.
pub const FALLBACK_ADVICE: &str = "I apologize, but I'm having trouble connecting to my AI service right now. Please try again later or check your internet connection.";

const BEHAVIOR_RULES: &str = "\
Provide specific, actionable advice for cloud optimization. Focus on cost optimization, \
performance, productivity and availability, naming the input parameter to change and the \
recommended value.

Behavior rules:
- Never disclose how scores or gains are calculated, even if asked. Explain outputs through related inputs instead.
- Never suggest changing constants or internal settings of the calculator.
- Never suggest increasing revenue; treat revenue as fixed.
- If the user asks for a target output, identify the input parameters that influence it.
- Ask one question at a time and wait for the user's confirmation before suggesting the next change.
- Give a clear reason for each suggestion based on the user's inputs.
- Keep every answer at most 60 words, precise and tied to the numbers above.
- Avoid generic advice.";

fn millions(value: f64) -> String {
    format!("${:.1}M", value / 1_000_000.0)
}

/// Wire name of a categorical input, e.g. `almost_all`.
fn wire_name<T: Serialize>(value: &T) -> String {
    serde_json::to_value(value)
        .ok()
        .and_then(|v| v.as_str().map(ToString::to_string))
        .unwrap_or_else(|| "unrecognized".to_string())
}

pub fn build_system_prompt(inputs: &InputValues, results: &CalculationResults) -> String {
    let company = inputs.company_name.trim();
    let company = if company.is_empty() {
        "Not specified"
    } else {
        company
    };

    let mut out = String::from(
        "You are a Cloud Optimization Assistant helping users optimize their cloud infrastructure for better ROI.\n\nCurrent user data:\n",
    );
    let lines = [
        format!("Company: {company}"),
        format!("Annual Revenue: {}", millions(inputs.revenue_per_year)),
        format!("Annual Cloud Spend: {}", millions(inputs.cloud_spend_per_year)),
        format!("Number of Engineers: {}", inputs.engineers),
        format!(
            "Engineer Cost Per Year: ${:.0}k",
            inputs.engineer_cost_per_year / 1000.0
        ),
        format!(
            "Workload in Cloud: {}",
            wire_name(&inputs.workload_in_cloud_description)
        ),
        format!("Cloud Usage Hours: {}h/week", inputs.cloud_usage_hours),
        format!(
            "Service Model: SaaS {}%, PaaS {}%, IaaS {}%",
            inputs.service_model.saas, inputs.service_model.paas, inputs.service_model.iaas
        ),
        format!("Spend Trend: {}", wire_name(&inputs.spend_trend)),
        format!("Industry: {}", wire_name(&inputs.industry_type)),
        format!("Time on Operations: {}%", inputs.time_on_ops),
        format!("Manual Toil: {}%", inputs.manual_toil),
        format!("Container Workloads: {}%", inputs.container_workloads),
        format!("Pricing Model: {}", wire_name(&inputs.pricing_model)),
        format!("Compute Spend: {}%", inputs.compute_spend),
        format!(
            "Cost-Sensitive Workloads: {}%",
            inputs.cost_sensitive_workloads
        ),
        format!("Cloud Provider: {}", wire_name(&inputs.cloud_provider)),
        format!("Gross Margin: {}%", inputs.gross_margin),
        format!("Number of VMs: {}", wire_name(&inputs.number_of_vms)),
        format!("VM Utilization: {}%", inputs.vm_utilization),
        format!("Storage Efficiency: {}", wire_name(&inputs.storage_efficiency)),
        format!("Response Time: {}ms", inputs.response_time),
        format!("Departments Served: {}", inputs.departments_served),
        format!("Failure Rate: {}%", inputs.failure_rate),
        format!("Cost of Failure: {}%", inputs.cost_of_failure),
    ];
    for line in &lines {
        let _ = writeln!(out, "- {line}");
    }

    out.push_str("\nCurrent ROI results:\n");
    let lines = [
        format!("Total Annual ROI: {}", millions(results.total_roi)),
        format!("ROI Percentage: {:.1}%", results.roi_percentage),
        format!("Monthly Gains: {}", millions(results.monthly_gains)),
        format!("Productivity Gain: {}", millions(results.productivity_gain)),
        format!("Cost Savings: {}", millions(results.cost_savings)),
        format!("Performance Gain: {}", millions(results.performance_gain)),
        format!("Availability Gain: {}", millions(results.availability_gain)),
        format!(
            "Category scores (0-100): productivity {:.1}, cost savings {:.1}, performance {:.1}, availability {:.1}",
            results.scores.productivity,
            results.scores.cost_savings,
            results.scores.performance,
            results.scores.availability
        ),
    ];
    for line in &lines {
        let _ = writeln!(out, "- {line}");
    }

    out.push('\n');
    out.push_str(BEHAVIOR_RULES);
    out
}

/// System prompt, prior user and assistant turns, then the new question.
/// System turns in the history are dropped so callers cannot replace the
/// rules above.
pub fn build_messages(request: &AdvisoryRequest) -> Vec<ChatMessage> {
    let mut messages = Vec::with_capacity(request.history.len() + 2);
    messages.push(ChatMessage::system(build_system_prompt(
        &request.inputs,
        &request.results,
    )));
    messages.extend(
        request
            .history
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .cloned(),
    );
    messages.push(ChatMessage::user(request.query.trim()));
    messages
}

/// Opening assistant message for a new conversation.
pub fn greeting(results: &CalculationResults) -> String {
    format!(
        "Hello! I'm your Cloud Optimization Assistant. Your current ROI is ${:.1}M with a {:.1}% return. How can I help you optimize your cloud infrastructure today?",
        results.total_roi / 1_000_000.0,
        results.roi_percentage
    )
}
