use rust_decimal::prelude::{FromPrimitive, ToPrimitive};
use rust_decimal::{Decimal, RoundingStrategy};

use super::error::AllocError;
use super::MAX_PERCENTAGE;

/// Whole-unit amount for a share of the total budget.
pub fn to_amount(percentage: f64, total_budget: Decimal) -> Decimal {
    let Some(pct) = Decimal::from_f64(percentage) else {
        return Decimal::ZERO;
    };
    total_budget
        .checked_mul(pct)
        .map(|v| v / Decimal::ONE_HUNDRED)
        .unwrap_or(Decimal::MAX)
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
}

/// Share of the total budget an amount represents, clamped to `[0, 100]`.
pub fn to_percentage(amount: Decimal, total_budget: Decimal) -> Result<f64, AllocError> {
    if total_budget.is_zero() {
        return Err(AllocError::DivisionByZero);
    }
    if total_budget.is_sign_negative() {
        return Err(AllocError::NegativeBudget(total_budget));
    }
    let ratio = amount
        .checked_div(total_budget)
        .and_then(|r| r.to_f64())
        .unwrap_or(f64::MAX);
    Ok((ratio * MAX_PERCENTAGE).clamp(0.0, MAX_PERCENTAGE))
}

/// How much of a budget has been spent, capped at 100. Zero for an empty
/// budget.
pub fn spending_ratio(spent: Decimal, budget: Decimal) -> f64 {
    if budget <= Decimal::ZERO {
        return 0.0;
    }
    let ratio = spent
        .checked_div(budget)
        .and_then(|r| r.to_f64())
        .unwrap_or(f64::MAX);
    (ratio * MAX_PERCENTAGE).clamp(0.0, MAX_PERCENTAGE)
}
