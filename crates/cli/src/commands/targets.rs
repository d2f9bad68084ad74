//! Target listing command

use anyhow::Result;
use std::path::Path;
use tabled::Tabled;

use crate::config::load_targets;
use crate::output::{print_table, OutputFormat};

/// Row for the targets table
#[derive(Tabled, serde::Serialize)]
struct TargetRow {
    #[tabled(rename = "#")]
    position: usize,
    #[tabled(rename = "Prism Central VIP")]
    address: String,
}

/// Show the targets a report run would poll
pub fn list_targets(path: &Path, format: OutputFormat) -> Result<()> {
    let rows: Vec<TargetRow> = load_targets(path)?
        .into_iter()
        .enumerate()
        .map(|(i, target)| TargetRow {
            position: i + 1,
            address: target.address,
        })
        .collect();

    print_table(&rows, format);
    Ok(())
}
