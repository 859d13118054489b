//! Spending insights: which main category took the most, how categories
//! moved against the previous month, and where inside each main category
//! the money went.

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;

use super::{MainCategory, MonthlyBudget, Spending};
use crate::allocate::{convert, MAX_PERCENTAGE};

/// The main category with the largest spend in a month.
#[derive(Debug, Clone, PartialEq)]
pub struct TopSpending {
    pub category: MainCategory,
    pub spent: Decimal,
    /// Share of the whole budget, in whole percent. Not capped.
    pub ratio: f64,
}

/// The most notable month-over-month move among main categories.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryComparison {
    pub category: MainCategory,
    pub current: Decimal,
    pub previous: Decimal,
    /// Size of the change relative to the previous month, in whole percent.
    pub change_ratio: f64,
    pub is_increase: bool,
}

/// Spending inside one main category, split by sub-category.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryBreakdown {
    pub category: MainCategory,
    pub budget_amount: Decimal,
    pub segments: Vec<SubCategorySpend>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubCategorySpend {
    pub sub_category: String,
    pub spent: Decimal,
    /// Share of the main category's budget, capped at 100.
    pub ratio: f64,
}

/// Largest spender among main categories; the earliest one in display order
/// wins a tie. `None` when nothing was spent.
pub fn highest_spending(
    spent_by_main: &[(MainCategory, Decimal)],
    total_budget: Decimal,
) -> Option<TopSpending> {
    let mut top: Option<(MainCategory, Decimal)> = None;
    for main in MainCategory::all() {
        let spent = spent_in(spent_by_main, *main);
        if spent > top.map_or(Decimal::ZERO, |(_, best)| best) {
            top = Some((*main, spent));
        }
    }
    let (category, spent) = top?;
    let ratio = if total_budget > Decimal::ZERO {
        percent_of(spent, total_budget).round()
    } else {
        0.0
    };
    Some(TopSpending {
        category,
        spent,
        ratio,
    })
}

/// Pick the category to call out when comparing two months.
///
/// If anything grew, the largest relative increase is reported. Otherwise
/// the smallest decrease is. A category with no spend last month counts as
/// a 100% increase when it has spend now. `None` when nothing changed.
pub fn compare_months(
    current: &[(MainCategory, Decimal)],
    previous: &[(MainCategory, Decimal)],
) -> Option<CategoryComparison> {
    let moves: Vec<(MainCategory, Decimal, Decimal, f64)> = MainCategory::all()
        .iter()
        .map(|main| {
            let cur = spent_in(current, *main);
            let prev = spent_in(previous, *main);
            (*main, cur, prev, change_ratio(cur, prev))
        })
        .collect();

    let any_increase = moves.iter().any(|(_, cur, prev, _)| cur > prev);
    let mut best: Option<&(MainCategory, Decimal, Decimal, f64)> = None;
    for candidate in &moves {
        let (_, cur, prev, ratio) = candidate;
        let eligible = if any_increase { cur > prev } else { *ratio != 0.0 };
        if eligible && best.is_none_or(|(_, _, _, best_ratio)| ratio > best_ratio) {
            best = Some(candidate);
        }
    }

    best.map(|(category, cur, prev, ratio)| CategoryComparison {
        category: *category,
        current: *cur,
        previous: *prev,
        change_ratio: ratio.abs().round(),
        is_increase: any_increase,
    })
}

/// Sub-category spend for every budgeted main category that has any, in
/// budget order. Sub-categories keep the order they were first recorded in.
pub fn sub_category_breakdown(
    budget: &MonthlyBudget,
    spending: &[Spending],
) -> Vec<CategoryBreakdown> {
    let mut out = Vec::new();
    for cat in &budget.categories {
        let Some(main) = cat.main_category() else {
            continue;
        };
        let budget_amount = cat.amount(budget.total_budget);

        let mut segments: Vec<SubCategorySpend> = Vec::new();
        for s in spending.iter().filter(|s| s.main_category() == main) {
            match segments
                .iter_mut()
                .find(|seg| seg.sub_category.eq_ignore_ascii_case(&s.sub_category))
            {
                Some(seg) => seg.spent += s.amount,
                None => segments.push(SubCategorySpend {
                    sub_category: s.sub_category.clone(),
                    spent: s.amount,
                    ratio: 0.0,
                }),
            }
        }
        segments.retain(|seg| seg.spent > Decimal::ZERO);
        if segments.is_empty() {
            continue;
        }
        for seg in &mut segments {
            seg.ratio = convert::spending_ratio(seg.spent, budget_amount);
        }
        out.push(CategoryBreakdown {
            category: main,
            budget_amount,
            segments,
        });
    }
    out
}

fn spent_in(spent_by_main: &[(MainCategory, Decimal)], main: MainCategory) -> Decimal {
    spent_by_main
        .iter()
        .filter(|(m, _)| *m == main)
        .map(|(_, amount)| *amount)
        .sum()
}

fn change_ratio(current: Decimal, previous: Decimal) -> f64 {
    if previous > Decimal::ZERO {
        percent_of(current - previous, previous)
    } else if current > Decimal::ZERO {
        MAX_PERCENTAGE
    } else {
        0.0
    }
}

fn percent_of(amount: Decimal, total: Decimal) -> f64 {
    amount
        .checked_div(total)
        .and_then(|r| r.to_f64())
        .unwrap_or(0.0)
        * MAX_PERCENTAGE
}
