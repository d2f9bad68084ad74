//! CSV export of the finished report

use crate::output::{ReportRowView, REPORT_COLUMNS};
use anyhow::{Context, Result};
use chrono::{DateTime, Local};
use report_lib::{ClusterReportRow, ReportSink};
use std::path::{Path, PathBuf};
use tracing::info;

/// File name for a report started at `started`
pub fn report_filename(started: DateTime<Local>) -> String {
    format!("cluster_report_{}.csv", started.format("%Y%m%d_%H%M%S"))
}

/// Write rows to `path` with the fixed column order
pub fn write_report(path: &Path, rows: &[ClusterReportRow]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create {}", path.display()))?;

    writer.write_record(REPORT_COLUMNS)?;
    for row in rows {
        writer.write_record(ReportRowView::from(row).record())?;
    }
    writer
        .flush()
        .with_context(|| format!("Failed to write {}", path.display()))?;

    Ok(())
}

/// Sink writing a timestamp-named CSV into a directory
pub struct CsvSink {
    path: PathBuf,
    written: bool,
}

impl CsvSink {
    pub fn new(output_dir: &Path, started: DateTime<Local>) -> Self {
        Self {
            path: output_dir.join(report_filename(started)),
            written: false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn written(&self) -> bool {
        self.written
    }
}

impl ReportSink for CsvSink {
    fn export(&mut self, rows: &[ClusterReportRow]) -> Result<()> {
        write_report(&self.path, rows)?;
        self.written = true;
        info!(event = "report_exported", path = %self.path.display(), rows = rows.len(), "Report written");
        Ok(())
    }
}

/// Sink for `--no-export`: the rows are only printed
#[derive(Default)]
pub struct DiscardSink;

impl ReportSink for DiscardSink {
    fn export(&mut self, _rows: &[ClusterReportRow]) -> Result<()> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn rows() -> Vec<ClusterReportRow> {
        vec![
            ClusterReportRow {
                unique_id: "uuid-alpha".to_string(),
                external_address: "10.0.0.1".to_string(),
                name: "alpha".to_string(),
                iops: 2200.0,
                latency_ms: 1.5,
                cpu_percent: 45.3,
                memory_percent: 70.0,
                storage_percent: 41.0,
                rf2_storage_percent: 50,
            },
            ClusterReportRow {
                unique_id: "uuid-beta".to_string(),
                external_address: "10.0.0.2".to_string(),
                name: "beta, west".to_string(),
                iops: 310.0,
                latency_ms: 0.85,
                cpu_percent: 12.0,
                memory_percent: 65.0,
                storage_percent: 12.0,
                rf2_storage_percent: 31,
            },
        ]
    }

    #[test]
    fn test_report_filename() {
        let started = Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        assert_eq!(report_filename(started), "cluster_report_20260307_090501.csv");
    }

    #[test]
    fn test_csv_sink_writes_rows_in_column_order() {
        let dir = tempfile::tempdir().unwrap();
        let started = Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        let mut sink = CsvSink::new(dir.path(), started);

        sink.export(&rows()).unwrap();

        assert!(sink.written());
        let content = std::fs::read_to_string(sink.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(
            lines[0],
            "UUID,External IP,Cluster Name,IOPS,Latency,CPU,Memory,Storage,RF2 Storage"
        );
        assert_eq!(
            lines[1],
            "uuid-alpha,10.0.0.1,alpha,2200,1.50 ms,45.30%,70.00%,41.00%,50%"
        );
        assert_eq!(
            lines[2],
            "uuid-beta,10.0.0.2,\"beta, west\",310,0.85 ms,12.00%,65.00%,12.00%,31%"
        );
    }

    #[test]
    fn test_csv_sink_unwritable_directory() {
        let started = Local.with_ymd_and_hms(2026, 3, 7, 9, 5, 1).unwrap();
        let mut sink = CsvSink::new(Path::new("/nonexistent/dir"), started);

        assert!(sink.export(&rows()).is_err());
        assert!(!sink.written());
    }
}
