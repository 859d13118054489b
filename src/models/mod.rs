mod budget;
mod category;
mod edit;
mod insights;
pub mod month;
mod spending;
mod taxonomy;

pub use budget::{BudgetRequest, MonthSummary, MonthlyBudget};
pub use category::{Category, CategorySet};
pub use edit::{Change, Edit};
pub use insights::{compare_months, highest_spending, sub_category_breakdown};
pub use spending::Spending;
pub use taxonomy::{MainCategory, Preset, DEFAULT_TOTAL_BUDGET};
