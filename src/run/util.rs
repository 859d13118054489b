use rust_decimal::{Decimal, RoundingStrategy};

/// Format an amount with thousand separators. Whole amounts print without
/// decimals, anything else with two.
/// e.g. `1234567` → `"1,234,567"`, `-1234.5` → `"-1,234.50"`
pub(crate) fn format_amount(val: Decimal) -> String {
    let abs = val.abs();
    let formatted = if abs.fract().is_zero() {
        format!("{:.0}", abs.trunc())
    } else {
        format!(
            "{:.2}",
            abs.round_dp_with_strategy(2, RoundingStrategy::MidpointAwayFromZero)
        )
    };
    let mut parts = formatted.split('.');
    let int_part = parts.next().unwrap_or("0");
    let dec_part = parts.next();

    let with_commas: String = int_part
        .as_bytes()
        .rchunks(3)
        .rev()
        .map(|chunk| std::str::from_utf8(chunk).unwrap_or(""))
        .collect::<Vec<_>>()
        .join(",");

    let sign = if val < Decimal::ZERO { "-" } else { "" };
    match dec_part {
        Some(dec) => format!("{sign}{with_commas}.{dec}"),
        None => format!("{sign}{with_commas}"),
    }
}

pub(crate) fn format_percent(val: f64) -> String {
    format!("{val:.1}%")
}

/// A fixed-width bar for a 0-100 share, e.g. `[####------]`.
pub(crate) fn bar(percentage: f64, width: usize) -> String {
    let filled = ((percentage.clamp(0.0, 100.0) / 100.0) * width as f64).round() as usize;
    let filled = filled.min(width);
    format!("[{}{}]", "#".repeat(filled), "-".repeat(width - filled))
}

/// Truncate a string to `max` visible characters, appending "…" if truncated.
pub(crate) fn truncate(s: &str, max: usize) -> String {
    if max == 0 {
        return String::new();
    }
    if s.chars().count() <= max {
        return s.to_string();
    }
    let truncated: String = s.chars().take(max.saturating_sub(1)).collect();
    format!("{truncated}…")
}

pub(crate) fn shellexpand(path: &str) -> String {
    if let Some(rest) = path.strip_prefix("~/") {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
        format!("{home}/{rest}")
    } else {
        path.to_string()
    }
}
