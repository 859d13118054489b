use chrono::{Datelike, Months, NaiveDate};
use regex::Regex;
use std::sync::LazyLock;

static MONTH_SHAPE: LazyLock<Option<Regex>> =
    LazyLock::new(|| Regex::new(r"^[0-9]{4}-[0-9]{2}$").ok());

/// `YYYY-MM` for the local clock.
pub fn current_month() -> String {
    chrono::Local::now().format("%Y-%m").to_string()
}

pub fn today() -> String {
    chrono::Local::now().format("%Y-%m-%d").to_string()
}

/// True for a `YYYY-MM` string naming a real month.
pub fn is_valid_month(month: &str) -> bool {
    MONTH_SHAPE
        .as_ref()
        .is_some_and(|shape| shape.is_match(month))
        && first_day(month).is_some()
}

/// The month `months_back` months before `month`.
pub fn shift_back(month: &str, months_back: u32) -> Option<String> {
    let first = first_day(month)?;
    let shifted = first.checked_sub_months(Months::new(months_back))?;
    Some(shifted.format("%Y-%m").to_string())
}

/// Month part of a `YYYY-MM-DD` date.
pub fn month_of(date: &str) -> Option<String> {
    let parsed = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;
    Some(format!("{:04}-{:02}", parsed.year(), parsed.month()))
}

/// Short display label, e.g. `Mar 2024`.
pub fn label(month: &str) -> String {
    first_day(month)
        .map(|d| d.format("%b %Y").to_string())
        .unwrap_or_else(|| month.to_string())
}

fn first_day(month: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(&format!("{month}-01"), "%Y-%m-%d").ok()
}
