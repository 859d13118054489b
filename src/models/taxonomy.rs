use rust_decimal::Decimal;

/// Fixed set of top-level spending categories a budget is split across.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MainCategory {
    Food,
    Transport,
    Living,
    Culture,
    Other,
}

impl MainCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Food => "Food",
            Self::Transport => "Transport",
            Self::Living => "Living",
            Self::Culture => "Culture",
            Self::Other => "Other",
        }
    }

    /// Case-insensitive lookup. Returns `None` for names outside the taxonomy.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "food" | "dining" => Some(Self::Food),
            "transport" | "transportation" => Some(Self::Transport),
            "living" => Some(Self::Living),
            "culture" => Some(Self::Culture),
            "other" | "etc" => Some(Self::Other),
            _ => None,
        }
    }

    /// Display order.
    pub fn all() -> &'static [MainCategory] {
        &[
            Self::Food,
            Self::Transport,
            Self::Living,
            Self::Culture,
            Self::Other,
        ]
    }

    pub fn sub_categories(&self) -> &'static [&'static str] {
        match self {
            Self::Food => &["Restaurants", "Cafes", "Delivery"],
            Self::Transport => &["Public Transit", "Taxi"],
            Self::Living => &["Phone", "Utilities", "Groceries", "Medical", "Education"],
            Self::Culture => &[
                "Performances",
                "Shopping",
                "Nightlife",
                "Movies",
                "Subscriptions",
            ],
            Self::Other => &["Other"],
        }
    }

    /// Share of a fresh budget, in percent.
    pub fn default_percentage(&self) -> f64 {
        match self {
            Self::Food => 40.0,
            Self::Transport => 15.0,
            Self::Living => 25.0,
            Self::Culture => 15.0,
            Self::Other => 5.0,
        }
    }

    /// Reference monthly amount used to derive recommended ratios.
    pub fn reference_amount(&self) -> Decimal {
        match self {
            Self::Food => Decimal::from(400_000),
            Self::Transport => Decimal::from(100_000),
            Self::Living => Decimal::from(300_000),
            Self::Culture => Decimal::from(200_000),
            Self::Other => Decimal::from(50_000),
        }
    }

    /// Main category owning a sub-category. Unknown names fall into `Other`.
    pub fn for_sub_category(sub: &str) -> Self {
        let lower = sub.trim().to_lowercase();
        Self::all()
            .iter()
            .copied()
            .find(|main| {
                main.sub_categories()
                    .iter()
                    .any(|s| s.to_lowercase() == lower)
            })
            .unwrap_or(Self::Other)
    }

    /// Canonical spelling of a known sub-category.
    pub fn canonical_sub_category(sub: &str) -> Option<&'static str> {
        let lower = sub.trim().to_lowercase();
        Self::all()
            .iter()
            .flat_map(|main| main.sub_categories().iter())
            .find(|s| s.to_lowercase() == lower)
            .copied()
    }
}

impl std::fmt::Display for MainCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

pub const DEFAULT_TOTAL_BUDGET: i64 = 1_000_000;

/// Canned allocations offered by `recommend --preset`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    FoodFocused,
    Transit,
    Living,
    Culture,
    Balanced,
}

impl Preset {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FoodFocused => "food",
            Self::Transit => "transit",
            Self::Living => "living",
            Self::Culture => "culture",
            Self::Balanced => "balanced",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "food" | "food-focused" => Some(Self::FoodFocused),
            "transit" | "transport" => Some(Self::Transit),
            "living" => Some(Self::Living),
            "culture" => Some(Self::Culture),
            "balanced" => Some(Self::Balanced),
            _ => None,
        }
    }

    pub fn all() -> &'static [Preset] {
        &[
            Self::FoodFocused,
            Self::Transit,
            Self::Living,
            Self::Culture,
            Self::Balanced,
        ]
    }

    /// Ratios in `MainCategory::all()` order.
    pub fn ratios(&self) -> [f64; 5] {
        match self {
            Self::FoodFocused => [40.0, 15.0, 25.0, 15.0, 5.0],
            Self::Transit => [35.0, 20.0, 25.0, 15.0, 5.0],
            Self::Living => [38.0, 12.0, 30.0, 15.0, 5.0],
            Self::Culture => [42.0, 15.0, 23.0, 18.0, 2.0],
            Self::Balanced => [36.0, 18.0, 28.0, 12.0, 6.0],
        }
    }

    pub fn ratio_for(&self, main: MainCategory) -> f64 {
        MainCategory::all()
            .iter()
            .position(|m| *m == main)
            .and_then(|i| self.ratios().get(i).copied())
            .unwrap_or(0.0)
    }
}
