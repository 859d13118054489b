use rust_decimal::Decimal;

/// A single user edit against a category set.
#[derive(Debug, Clone, PartialEq)]
pub enum Edit {
    /// Slider-style: set a category's share directly.
    Percent { index: usize, value: f64 },
    /// Type-in style: set a category's currency amount.
    Amount { index: usize, amount: Decimal },
    /// Overwrite every share from a reference distribution.
    Recommend { ratios: Vec<f64> },
}

/// One category whose percentage moved during an edit.
#[derive(Debug, Clone, PartialEq)]
pub struct Change {
    pub index: usize,
    pub before: f64,
    pub after: f64,
}

impl Change {
    pub fn delta(&self) -> f64 {
        self.after - self.before
    }
}
