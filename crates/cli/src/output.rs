//! Output formatting utilities
//!
//! Report rows carry plain numbers; every unit suffix and rounding for
//! display happens here.

use clap::ValueEnum;
use colored::Colorize;
use report_lib::ClusterReportRow;
use serde::Serialize;
use tabled::{settings::Style, Table, Tabled};

/// Output format for CLI commands
#[derive(Debug, Clone, Copy, Default, ValueEnum)]
pub enum OutputFormat {
    /// Table format (default)
    #[default]
    Table,
    /// JSON format
    Json,
}

/// Column headers of the exported report, in order
pub const REPORT_COLUMNS: [&str; 9] = [
    "UUID",
    "External IP",
    "Cluster Name",
    "IOPS",
    "Latency",
    "CPU",
    "Memory",
    "Storage",
    "RF2 Storage",
];

/// Display form of one report row
#[derive(Debug, Clone, PartialEq, Tabled, Serialize)]
pub struct ReportRowView {
    #[tabled(rename = "UUID")]
    pub unique_id: String,
    #[tabled(rename = "External IP")]
    pub external_address: String,
    #[tabled(rename = "Cluster Name")]
    pub name: String,
    #[tabled(rename = "IOPS")]
    pub iops: String,
    #[tabled(rename = "Latency")]
    pub latency: String,
    #[tabled(rename = "CPU")]
    pub cpu: String,
    #[tabled(rename = "Memory")]
    pub memory: String,
    #[tabled(rename = "Storage")]
    pub storage: String,
    #[tabled(rename = "RF2 Storage")]
    pub rf2_storage: String,
}

impl From<&ClusterReportRow> for ReportRowView {
    fn from(row: &ClusterReportRow) -> Self {
        Self {
            unique_id: row.unique_id.clone(),
            external_address: row.external_address.clone(),
            name: row.name.clone(),
            iops: format_iops(row.iops),
            latency: format_latency(row.latency_ms),
            cpu: format_percent(row.cpu_percent),
            memory: format_percent(row.memory_percent),
            storage: format_percent(row.storage_percent),
            rf2_storage: format!("{}%", row.rf2_storage_percent),
        }
    }
}

impl ReportRowView {
    /// Fields in `REPORT_COLUMNS` order
    pub fn record(&self) -> [&str; 9] {
        [
            &self.unique_id,
            &self.external_address,
            &self.name,
            &self.iops,
            &self.latency,
            &self.cpu,
            &self.memory,
            &self.storage,
            &self.rf2_storage,
        ]
    }
}

/// Print a table from a list of items
pub fn print_table<T: Tabled + Serialize>(items: &[T], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            if items.is_empty() {
                println!("{}", "No items found".yellow());
                return;
            }
            let table = Table::new(items).with(Style::rounded()).to_string();
            println!("{}", table);
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(&items) {
                println!("{}", json);
            }
        }
    }
}

/// Print report rows: formatted table, or raw numbers as JSON
pub fn print_report(rows: &[ClusterReportRow], format: OutputFormat) {
    match format {
        OutputFormat::Table => {
            let views: Vec<ReportRowView> = rows.iter().map(ReportRowView::from).collect();
            print_table(&views, format);
        }
        OutputFormat::Json => {
            if let Ok(json) = serde_json::to_string_pretty(rows) {
                println!("{}", json);
            }
        }
    }
}

/// Print a success message
pub fn print_success(message: &str) {
    eprintln!("{} {}", "✓".green().bold(), message);
}

/// Print an error message
pub fn print_error(message: &str) {
    eprintln!("{} {}", "✗".red().bold(), message);
}

/// Print an info message
pub fn print_info(message: &str) {
    eprintln!("{} {}", "ℹ".blue().bold(), message);
}

/// IOPS as a whole number
pub fn format_iops(iops: f64) -> String {
    format!("{:.0}", iops)
}

/// Latency in milliseconds
pub fn format_latency(ms: f64) -> String {
    format!("{:.2} ms", ms)
}

/// Percentage with two decimals
pub fn format_percent(percent: f64) -> String {
    format!("{:.2}%", percent)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row() -> ClusterReportRow {
        ClusterReportRow {
            unique_id: "uuid-alpha".to_string(),
            external_address: "10.0.0.1".to_string(),
            name: "alpha".to_string(),
            iops: 2200.4,
            latency_ms: 1.5,
            cpu_percent: 45.3,
            memory_percent: 70.0,
            storage_percent: 41.0,
            rf2_storage_percent: 50,
        }
    }

    #[test]
    fn test_format_helpers() {
        assert_eq!(format_iops(2200.6), "2201");
        assert_eq!(format_latency(1.5), "1.50 ms");
        assert_eq!(format_percent(45.3), "45.30%");
    }

    #[test]
    fn test_row_view() {
        let view = ReportRowView::from(&row());

        assert_eq!(
            view.record(),
            [
                "uuid-alpha",
                "10.0.0.1",
                "alpha",
                "2200",
                "1.50 ms",
                "45.30%",
                "70.00%",
                "41.00%",
                "50%",
            ]
        );
    }

    #[test]
    fn test_view_columns_match_report_columns() {
        let headers: Vec<String> = ReportRowView::headers().into_iter().map(|h| h.to_string()).collect();
        assert_eq!(headers, REPORT_COLUMNS);
    }
}
