use crate::engine::CalculationResults;

/// `$1.23M`, `$4.56K` or `$7.89`. Losses keep the unit: `-$5.00M`.
pub fn format_currency(value: f64) -> String {
    let sign = if value < 0.0 { "-" } else { "" };
    let magnitude = value.abs();
    if magnitude >= 1_000_000.0 {
        format!("{sign}${:.2}M", magnitude / 1_000_000.0)
    } else if magnitude >= 1_000.0 {
        format!("{sign}${:.2}K", magnitude / 1_000.0)
    } else {
        format!("{sign}${magnitude:.2}")
    }
}

pub fn format_percentage(value: f64) -> String {
    format!("{value:.1}%")
}

/// One line for logs and tool output.
pub fn summary_line(company_name: &str, results: &CalculationResults) -> String {
    let company = company_name.trim();
    let company = if company.is_empty() {
        "Unnamed company"
    } else {
        company
    };
    format!(
        "{company}: total annual gain {} ({} ROI, {} per month)",
        format_currency(results.total_roi),
        format_percentage(results.roi_percentage),
        format_currency(results.monthly_gains),
    )
}
