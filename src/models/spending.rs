use rust_decimal::Decimal;

use super::MainCategory;

/// A single expense recorded against a sub-category.
#[derive(Debug, Clone)]
pub struct Spending {
    pub id: Option<i64>,
    /// Format: "YYYY-MM-DD"
    pub date: String,
    pub sub_category: String,
    pub amount: Decimal,
    pub note: String,
    pub created_at: String,
}

impl Spending {
    pub fn new(date: String, sub_category: String, amount: Decimal) -> Self {
        Self {
            id: None,
            date,
            sub_category,
            amount,
            note: String::new(),
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }

    pub fn main_category(&self) -> MainCategory {
        MainCategory::for_sub_category(&self.sub_category)
    }
}
