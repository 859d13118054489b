use anyhow::{Context, Result};
use rust_decimal::prelude::ToPrimitive;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use super::{month, Category, CategorySet, MainCategory};
use crate::allocate::{self, convert};

#[derive(Debug, Clone, PartialEq)]
pub struct MonthlyBudget {
    /// Format: "YYYY-MM"
    pub month: String,
    pub total_budget: Decimal,
    pub categories: CategorySet,
    pub updated_at: String,
}

impl MonthlyBudget {
    pub fn new(month: String, total_budget: Decimal) -> Self {
        Self {
            month,
            total_budget,
            categories: CategorySet::with_defaults(),
            updated_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn touch(&mut self) {
        self.updated_at = chrono::Utc::now().to_rfc3339();
    }

    /// Persistence payload: one rounded amount per main category.
    pub fn to_request(&self) -> Result<BudgetRequest> {
        let mut main_category_budgets = Vec::with_capacity(self.categories.len());
        for cat in &self.categories {
            let amount = cat.amount(self.total_budget);
            let budget_amount = amount
                .to_i64()
                .with_context(|| format!("{} amount out of range: {amount}", cat.name))?;
            main_category_budgets.push(CategoryBudget {
                main_category: cat.name.clone(),
                budget_amount,
            });
        }
        Ok(BudgetRequest {
            month: self.month.clone(),
            main_category_budgets,
        })
    }

    /// Build a budget from a validated request. The total is the sum of the
    /// requested amounts and each share is rounded so the set sums to 100.
    pub fn from_request(request: &BudgetRequest) -> Result<Self> {
        request.validate()?;

        let amounts: Vec<Decimal> = MainCategory::all()
            .iter()
            .map(|main| {
                request
                    .main_category_budgets
                    .iter()
                    .filter(|b| MainCategory::parse(&b.main_category) == Some(*main))
                    .map(|b| Decimal::from(b.budget_amount))
                    .sum()
            })
            .collect();
        let total_budget: Decimal = amounts.iter().copied().sum();

        let mut budget = Self::new(request.month.clone(), total_budget);
        if total_budget > Decimal::ZERO {
            let ratios = allocate::normalize_ratios(&amounts)?;
            allocate::apply_recommended_ratios(&mut budget.categories, &ratios)?;
        }
        Ok(budget)
    }

    /// Compare each category's budget against what was spent in it.
    pub fn summarize(&self, spent_by_main: &[(MainCategory, Decimal)]) -> BudgetSummary {
        let categories: Vec<CategoryStatus> = self
            .categories
            .iter()
            .map(|cat| {
                let spent = cat
                    .main_category()
                    .map(|main| {
                        spent_by_main
                            .iter()
                            .filter(|(m, _)| *m == main)
                            .map(|(_, amount)| *amount)
                            .sum()
                    })
                    .unwrap_or(Decimal::ZERO);
                CategoryStatus::new(cat, self.total_budget, spent)
            })
            .collect();

        let total_spent: Decimal = categories.iter().map(|c| c.spent).sum();
        BudgetSummary {
            total_budget: self.total_budget,
            total_spent,
            remaining: self.total_budget - total_spent,
            spending_ratio: convert::spending_ratio(total_spent, self.total_budget),
            is_over_budget: total_spent > self.total_budget,
            categories,
        }
    }
}

/// Wire shape the remote budget service accepts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BudgetRequest {
    pub month: String,
    pub main_category_budgets: Vec<CategoryBudget>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryBudget {
    pub main_category: String,
    pub budget_amount: i64,
}

impl BudgetRequest {
    pub fn validate(&self) -> Result<()> {
        if !month::is_valid_month(&self.month) {
            anyhow::bail!("Invalid month '{}' (expected YYYY-MM)", self.month);
        }
        if self.main_category_budgets.is_empty() {
            anyhow::bail!("Category budgets are required");
        }
        for budget in &self.main_category_budgets {
            if MainCategory::parse(&budget.main_category).is_none() {
                anyhow::bail!("Unknown category: {}", budget.main_category);
            }
            if budget.budget_amount < 0 {
                anyhow::bail!("{} budget amount must not be negative", budget.main_category);
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CategoryStatus {
    pub name: String,
    pub budget_amount: Decimal,
    pub spent: Decimal,
    pub spending_ratio: f64,
    pub is_over_budget: bool,
}

impl CategoryStatus {
    fn new(cat: &Category, total_budget: Decimal, spent: Decimal) -> Self {
        let budget_amount = cat.amount(total_budget);
        Self {
            name: cat.name.clone(),
            budget_amount,
            spent,
            spending_ratio: convert::spending_ratio(spent, budget_amount),
            is_over_budget: spent > budget_amount,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct BudgetSummary {
    pub total_budget: Decimal,
    pub total_spent: Decimal,
    pub remaining: Decimal,
    pub spending_ratio: f64,
    pub is_over_budget: bool,
    pub categories: Vec<CategoryStatus>,
}

/// Totals for one month, used by the history view.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthSummary {
    pub month: String,
    pub total_spent: Decimal,
    pub total_budget: Decimal,
}
