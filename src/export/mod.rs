use anyhow::{Context, Result};
use std::io::Write;
use std::path::Path;
use tracing::info;

use crate::models::MonthlyBudget;

const HEADER: [&str; 4] = ["month", "category", "percentage", "amount"];

/// Write one row per category plus a trailing `Unallocated` row when the
/// rounded amounts don't cover the whole total.
pub(crate) fn write_snapshot<W: Write>(writer: W, budget: &MonthlyBudget) -> Result<usize> {
    let mut wtr = csv::Writer::from_writer(writer);
    wtr.write_record(HEADER)?;

    let mut rows = 0;
    for cat in &budget.categories {
        let percentage = format!("{:.1}", cat.percentage);
        let amount = cat.amount(budget.total_budget).to_string();
        wtr.write_record([&budget.month, &cat.name, &percentage, &amount])?;
        rows += 1;
    }

    let unallocated = budget.categories.unallocated(budget.total_budget);
    if !unallocated.is_zero() {
        let share = (100.0 - budget.categories.total_percentage()).max(0.0);
        let share = format!("{share:.1}");
        let amount = unallocated.to_string();
        wtr.write_record([budget.month.as_str(), "Unallocated", share.as_str(), amount.as_str()])?;
        rows += 1;
    }

    wtr.flush().context("Failed to flush CSV output")?;
    Ok(rows)
}

pub(crate) fn export_snapshot(path: &Path, budget: &MonthlyBudget) -> Result<usize> {
    let file = std::fs::File::create(path)
        .with_context(|| format!("Failed to create export file: {}", path.display()))?;
    let rows = write_snapshot(file, budget)?;
    info!(month = %budget.month, rows, path = %path.display(), "exported snapshot");
    Ok(rows)
}
