use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

use crate::models::{CategorySet, MainCategory};

/// Amounts per main category read from a `category,amount` CSV.
#[derive(Debug, Clone, Default, PartialEq)]
pub(crate) struct ReferenceDistribution {
    entries: Vec<(MainCategory, Decimal)>,
}

impl ReferenceDistribution {
    pub(crate) fn new(entries: Vec<(MainCategory, Decimal)>) -> Self {
        Self { entries }
    }

    /// The built-in reference amounts for every main category.
    pub(crate) fn built_in() -> Self {
        Self::new(
            MainCategory::all()
                .iter()
                .map(|main| (*main, main.reference_amount()))
                .collect(),
        )
    }

    pub(crate) fn entries(&self) -> &[(MainCategory, Decimal)] {
        &self.entries
    }

    /// One amount per category in `set`, summing repeated rows. Categories
    /// the file doesn't mention get zero.
    pub(crate) fn amounts_for(&self, set: &CategorySet) -> Vec<Decimal> {
        set.iter()
            .map(|cat| {
                let Some(main) = cat.main_category() else {
                    return Decimal::ZERO;
                };
                self.entries
                    .iter()
                    .filter(|(m, _)| *m == main)
                    .map(|(_, amount)| *amount)
                    .sum()
            })
            .collect()
    }
}

/// Read a reference distribution. The first row is treated as a header when
/// its amount column doesn't parse as a number.
pub(crate) fn read_reference(path: &Path) -> Result<ReferenceDistribution> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .has_headers(false)
        .trim(csv::Trim::All)
        .from_path(path)
        .with_context(|| format!("Failed to open reference file: {}", path.display()))?;

    let mut entries = Vec::new();
    for (i, result) in rdr.records().enumerate() {
        let record = result.context("Failed to read CSV record")?;
        let name = record.get(0).unwrap_or_default();
        let raw_amount = record.get(1).unwrap_or_default();

        if name.is_empty() && raw_amount.is_empty() {
            continue;
        }
        if i == 0 && parse_amount(raw_amount).is_err() {
            debug!(header = ?record, "skipping header row");
            continue;
        }

        let main = MainCategory::parse(name)
            .with_context(|| format!("Row {}: unknown category '{}'", i + 1, name))?;
        let amount = parse_amount(raw_amount)
            .with_context(|| format!("Row {}: failed to parse amount", i + 1))?;
        if amount.is_sign_negative() && !amount.is_zero() {
            anyhow::bail!("Row {}: amount must not be negative", i + 1);
        }
        entries.push((main, amount));
    }

    if entries.is_empty() {
        anyhow::bail!("Reference file has no amounts: {}", path.display());
    }
    debug!(rows = entries.len(), "read reference distribution");
    Ok(ReferenceDistribution::new(entries))
}

/// Parse a money amount, tolerating thousands separators and a leading
/// currency sign.
pub(crate) fn parse_amount(s: &str) -> Result<Decimal> {
    let cleaned: String = s
        .trim()
        .chars()
        .filter(|c| !matches!(c, ',' | '$' | '€' | '£' | '₩' | '¥' | '_' | ' '))
        .collect();
    if cleaned.is_empty() {
        anyhow::bail!("Empty amount");
    }
    Decimal::from_str(&cleaned).with_context(|| format!("Failed to parse '{}' as an amount", s))
}

#[cfg(test)]
#[path = "reference_tests.rs"]
mod tests;
