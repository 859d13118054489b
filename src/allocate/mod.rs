//! Splitting a fixed 100% pool across budget categories.
//!
//! Every edit keeps shares non-negative. Slider edits (`set_percentage`) also
//! keep the pool summing to 100; amount edits only correct an overflow and
//! leave any shortfall unallocated.

pub mod convert;
mod error;

pub use error::AllocError;

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use tracing::debug;

use crate::models::{Category, CategorySet, Change, Edit};

pub const MAX_PERCENTAGE: f64 = 100.0;

/// Granularity of slider-driven redistribution unless configured otherwise.
pub const DEFAULT_STEP: f64 = 5.0;

/// Allowed drift of the total from 100 after an edit.
pub const SUM_TOLERANCE: f64 = 0.1;

const EPSILON: f64 = 1e-9;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Allocator {
    step: f64,
}

impl Default for Allocator {
    fn default() -> Self {
        Self { step: DEFAULT_STEP }
    }
}

impl Allocator {
    pub fn new(step: f64) -> Result<Self, AllocError> {
        if !step.is_finite() || step <= 0.0 {
            return Err(AllocError::InvalidStep(step));
        }
        Ok(Self { step })
    }

    pub fn step(&self) -> f64 {
        self.step
    }

    /// Run one edit and report every category whose share moved.
    pub fn apply(
        &self,
        set: &mut CategorySet,
        total_budget: Decimal,
        edit: &Edit,
    ) -> Result<Vec<Change>, AllocError> {
        let before = set.percentages();
        match edit {
            Edit::Percent { index, value } => self.set_percentage(set, *index, *value)?,
            Edit::Amount { index, amount } => {
                self.set_amount(set, *index, *amount, total_budget)?
            }
            Edit::Recommend { ratios } => apply_recommended_ratios(set, ratios)?,
        }
        Ok(changes_since(&before, set))
    }

    /// Set one category's share and push the difference onto the others.
    ///
    /// The others move in proportion to their current share, rounded to the
    /// step. Any overflow left after that is taken from the others in set
    /// order (and finally from the edited category). A shortfall the edit
    /// itself created is handed back to the others in set order, up to the
    /// total the set had before the edit (at most 100). A balanced set stays
    /// at 100; budget an amount edit left unallocated stays unallocated.
    pub fn set_percentage(
        &self,
        set: &mut CategorySet,
        index: usize,
        value: f64,
    ) -> Result<(), AllocError> {
        check_index(set, index)?;
        if !value.is_finite() {
            return Err(AllocError::NotFinite(value));
        }
        let value = value.clamp(0.0, MAX_PERCENTAGE);

        let categories = set.as_mut_slice();
        let target = total(categories).min(MAX_PERCENTAGE);
        let old = categories[index].percentage;
        let difference = value - old;
        categories[index].percentage = value;
        debug!(index, old, new = value, "set percentage");

        if difference.abs() > EPSILON {
            self.shift_others(categories, index, difference);
        }

        let sum = total(categories);
        if sum - MAX_PERCENTAGE > EPSILON {
            self.trim_excess(categories, index, sum - MAX_PERCENTAGE);
        }

        let sum = total(categories);
        if target - sum > EPSILON {
            fill_deficit(categories, index, target - sum);
        }
        Ok(())
    }

    /// Set one category from a currency amount. Only an overflow is
    /// corrected, continuously and in proportion to the others' shares.
    pub fn set_amount(
        &self,
        set: &mut CategorySet,
        index: usize,
        amount: Decimal,
        total_budget: Decimal,
    ) -> Result<(), AllocError> {
        check_index(set, index)?;
        let percentage = convert::to_percentage(amount, total_budget)?;

        let categories = set.as_mut_slice();
        categories[index].percentage = percentage;
        debug!(index, %amount, percentage, "set amount");

        let other_total = other_total(categories, index);
        let excess = percentage + other_total - MAX_PERCENTAGE;
        if excess > EPSILON && other_total > 0.0 {
            for (i, cat) in categories.iter_mut().enumerate() {
                if i != index {
                    let share = cat.percentage / other_total;
                    cat.percentage = (cat.percentage - excess * share).max(0.0);
                }
            }
            debug!(excess, "reduced other categories");
        }
        Ok(())
    }

    fn shift_others(&self, categories: &mut [Category], index: usize, difference: f64) {
        let other_total = other_total(categories, index);
        if other_total <= 0.0 {
            debug!(index, "other categories are empty, nothing to redistribute");
            return;
        }

        let magnitude = difference.abs();
        for (i, cat) in categories.iter_mut().enumerate() {
            if i == index {
                continue;
            }
            let adjustment = self.round_to_step(magnitude * (cat.percentage / other_total));
            cat.percentage = if difference > 0.0 {
                (cat.percentage - adjustment).max(0.0)
            } else {
                (cat.percentage + adjustment).min(MAX_PERCENTAGE)
            };
        }
    }

    fn trim_excess(&self, categories: &mut [Category], index: usize, excess: f64) {
        debug!(excess, "trimming excess");
        let mut remaining = excess;
        for (i, cat) in categories.iter_mut().enumerate() {
            if remaining <= EPSILON {
                break;
            }
            if i == index {
                continue;
            }
            let stepped = ((remaining / self.step) - EPSILON).ceil() * self.step;
            let decrease = cat.percentage.min(stepped);
            if decrease > 0.0 {
                cat.percentage = (cat.percentage - decrease).max(0.0);
                remaining -= decrease;
            }
        }

        if remaining > EPSILON {
            let edited = &mut categories[index];
            edited.percentage = (edited.percentage - remaining).max(0.0);
        }
    }

    fn round_to_step(&self, value: f64) -> f64 {
        (value / self.step).round() * self.step
    }
}

fn fill_deficit(categories: &mut [Category], index: usize, deficit: f64) {
    debug!(deficit, "filling deficit");
    let mut remaining = deficit;
    for (i, cat) in categories.iter_mut().enumerate() {
        if remaining <= EPSILON {
            break;
        }
        if i == index {
            continue;
        }
        let room = MAX_PERCENTAGE - cat.percentage;
        let add = room.min(remaining);
        if add > 0.0 {
            cat.percentage += add;
            remaining -= add;
        }
    }

    if remaining > EPSILON {
        let edited = &mut categories[index];
        edited.percentage = (edited.percentage + remaining).min(MAX_PERCENTAGE);
    }
}

/// Overwrite every share from raw target ratios. Each ratio is rounded to one
/// decimal and the rounding error lands on the largest share (first one on a
/// tie), so the result sums to exactly 100.
pub fn apply_recommended_ratios(set: &mut CategorySet, ratios: &[f64]) -> Result<(), AllocError> {
    if set.is_empty() {
        return Err(AllocError::EmptySet);
    }
    if ratios.len() != set.len() {
        return Err(AllocError::RatioCountMismatch {
            expected: set.len(),
            actual: ratios.len(),
        });
    }
    if let Some(bad) = ratios.iter().find(|r| !r.is_finite()) {
        return Err(AllocError::NotFinite(*bad));
    }
    if ratios.iter().any(|r| *r < 0.0) {
        return Err(AllocError::InvalidRatios(
            "ratios must not be negative".into(),
        ));
    }
    if ratios.iter().all(|r| *r == 0.0) {
        return Err(AllocError::InvalidRatios("ratios are all zero".into()));
    }

    let adjusted = round_and_adjust(ratios);
    if adjusted.iter().any(|r| *r < 0.0) {
        let sum: f64 = ratios.iter().sum();
        return Err(AllocError::InvalidRatios(format!(
            "ratios sum to {sum:.1}, too far from 100 to rebalance"
        )));
    }

    for (cat, ratio) in set.as_mut_slice().iter_mut().zip(adjusted) {
        cat.percentage = ratio;
    }
    debug!(ratios = ?set.percentages(), "applied recommended ratios");
    Ok(())
}

/// Round to one decimal, then fold the rounding error into the largest value.
pub fn round_and_adjust(ratios: &[f64]) -> Vec<f64> {
    let mut rounded: Vec<f64> = ratios.iter().map(|r| round_one_decimal(*r)).collect();
    let difference = MAX_PERCENTAGE - rounded.iter().sum::<f64>();
    if difference.abs() > EPSILON {
        if let Some(max_index) = first_max_index(&rounded) {
            rounded[max_index] = round_one_decimal(rounded[max_index] + difference);
        }
    }
    rounded
}

/// Turn a reference distribution of amounts into raw percentage ratios.
pub fn normalize_ratios(amounts: &[Decimal]) -> Result<Vec<f64>, AllocError> {
    if amounts.iter().any(|a| a.is_sign_negative() && !a.is_zero()) {
        return Err(AllocError::InvalidRatios(
            "reference amounts must not be negative".into(),
        ));
    }
    let total: Decimal = amounts.iter().copied().sum();
    if total <= Decimal::ZERO {
        return Err(AllocError::InvalidRatios(
            "reference amounts sum to zero".into(),
        ));
    }
    Ok(amounts
        .iter()
        .map(|a| share(*a, total) * MAX_PERCENTAGE)
        .collect())
}

fn share(amount: Decimal, total: Decimal) -> f64 {
    amount
        .checked_div(total)
        .and_then(|r| r.to_f64())
        .unwrap_or(0.0)
}

/// True when the shares sum to 100 within `SUM_TOLERANCE`.
pub fn is_balanced(set: &CategorySet) -> bool {
    (set.total_percentage() - MAX_PERCENTAGE).abs() <= SUM_TOLERANCE
}

fn check_index(set: &CategorySet, index: usize) -> Result<(), AllocError> {
    if set.is_empty() {
        return Err(AllocError::EmptySet);
    }
    if index >= set.len() {
        return Err(AllocError::IndexOutOfBounds {
            index,
            len: set.len(),
        });
    }
    Ok(())
}

fn total(categories: &[Category]) -> f64 {
    categories.iter().map(|c| c.percentage).sum()
}

fn other_total(categories: &[Category], index: usize) -> f64 {
    categories
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != index)
        .map(|(_, c)| c.percentage)
        .sum()
}

fn first_max_index(values: &[f64]) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (i, v) in values.iter().enumerate() {
        match best {
            Some((_, max)) if *v <= max => {}
            _ => best = Some((i, *v)),
        }
    }
    best.map(|(i, _)| i)
}

fn round_one_decimal(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

fn changes_since(before: &[f64], set: &CategorySet) -> Vec<Change> {
    before
        .iter()
        .zip(set.iter())
        .enumerate()
        .filter(|(_, (old, cat))| (cat.percentage - **old).abs() > EPSILON)
        .map(|(index, (old, cat))| Change {
            index,
            before: *old,
            after: cat.percentage,
        })
        .collect()
}

#[cfg(test)]
mod tests;
