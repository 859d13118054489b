use rust_decimal::Decimal;
use std::collections::HashSet;

use super::MainCategory;
use crate::allocate::{convert, AllocError};

/// One budget bucket and its share of the whole, in percent.
#[derive(Debug, Clone, PartialEq)]
pub struct Category {
    pub name: String,
    pub percentage: f64,
}

impl Category {
    pub fn new(name: impl Into<String>, percentage: f64) -> Self {
        Self {
            name: name.into(),
            percentage,
        }
    }

    pub fn amount(&self, total_budget: Decimal) -> Decimal {
        convert::to_amount(self.percentage, total_budget)
    }

    pub fn main_category(&self) -> Option<MainCategory> {
        MainCategory::parse(&self.name)
    }
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({:.1}%)", self.name, self.percentage)
    }
}

/// Ordered categories for one budgeting period.
///
/// The set is owned by whoever loaded it and is handed to the allocator as
/// `&mut`, so there is only ever one writer.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategorySet {
    categories: Vec<Category>,
}

impl CategorySet {
    /// Names must be unique, compared case-insensitively.
    pub fn new(categories: Vec<Category>) -> Result<Self, AllocError> {
        let mut seen = HashSet::new();
        for cat in &categories {
            if !seen.insert(cat.name.trim().to_lowercase()) {
                return Err(AllocError::DuplicateCategory(cat.name.clone()));
            }
        }
        Ok(Self { categories })
    }

    /// The taxonomy's main categories at their default shares.
    pub fn with_defaults() -> Self {
        Self {
            categories: MainCategory::all()
                .iter()
                .map(|main| Category::new(main.as_str(), main.default_percentage()))
                .collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Category> {
        self.categories.iter()
    }

    pub fn get(&self, index: usize) -> Option<&Category> {
        self.categories.get(index)
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [Category] {
        &mut self.categories
    }

    pub fn percentages(&self) -> Vec<f64> {
        self.categories.iter().map(|c| c.percentage).collect()
    }

    pub fn total_percentage(&self) -> f64 {
        self.categories.iter().map(|c| c.percentage).sum()
    }

    /// Case-insensitive position of a category by name.
    pub fn position(&self, name: &str) -> Option<usize> {
        let lower = name.trim().to_lowercase();
        self.categories
            .iter()
            .position(|c| c.name.to_lowercase() == lower)
    }

    /// Build a value per category by looking up its main category; names
    /// outside the taxonomy get zero.
    pub fn align<F>(&self, value_for: F) -> Vec<f64>
    where
        F: Fn(MainCategory) -> f64,
    {
        self.categories
            .iter()
            .map(|c| c.main_category().map(&value_for).unwrap_or(0.0))
            .collect()
    }

    pub fn amounts(&self, total_budget: Decimal) -> Vec<Decimal> {
        self.categories
            .iter()
            .map(|c| c.amount(total_budget))
            .collect()
    }

    /// Budget left over after every category's rounded amount is taken out.
    pub fn unallocated(&self, total_budget: Decimal) -> Decimal {
        total_budget - self.amounts(total_budget).into_iter().sum::<Decimal>()
    }
}

impl<'a> IntoIterator for &'a CategorySet {
    type Item = &'a Category;
    type IntoIter = std::slice::Iter<'a, Category>;

    fn into_iter(self) -> Self::IntoIter {
        self.categories.iter()
    }
}
