mod schema;

use anyhow::{Context, Result};
use rusqlite::{params, Connection, OptionalExtension};
use rust_decimal::Decimal;
use std::path::Path;
use std::str::FromStr;
use tracing::{debug, info};

use crate::allocate::{Allocator, DEFAULT_STEP};
use crate::models::*;

const SLIDER_STEP_KEY: &str = "slider_step";

pub(crate) struct Database {
    conn: Connection,
}

impl Database {
    pub(crate) fn open(path: &Path) -> Result<Self> {
        let conn = Connection::open(path)
            .with_context(|| format!("Failed to open database: {}", path.display()))?;
        conn.execute_batch("PRAGMA journal_mode=WAL; PRAGMA foreign_keys=ON;")
            .context("Failed to set database pragmas")?;
        let mut db = Self { conn };
        db.migrate().context("Database migration failed")?;
        debug!(path = %path.display(), "database opened");
        Ok(db)
    }

    #[cfg(test)]
    pub(crate) fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        conn.execute_batch("PRAGMA foreign_keys=ON;")?;
        let mut db = Self { conn };
        db.migrate()?;
        Ok(db)
    }

    fn migrate(&mut self) -> Result<()> {
        let has_version_table: bool = self.conn.query_row(
            "SELECT EXISTS(SELECT 1 FROM sqlite_master WHERE type='table' AND name='schema_version')",
            [],
            |row| row.get(0),
        )?;

        if !has_version_table {
            // Fresh database - apply full schema
            self.conn.execute_batch(schema::SCHEMA_V1)?;
            self.conn.execute(
                "INSERT INTO schema_version (version) VALUES (?1)",
                params![schema::CURRENT_VERSION],
            )?;
            return Ok(());
        }

        let current: i32 = self
            .conn
            .query_row("SELECT version FROM schema_version LIMIT 1", [], |row| {
                row.get(0)
            })
            .unwrap_or(0);

        for &(from_version, sql) in schema::MIGRATIONS {
            if current <= from_version {
                self.conn.execute_batch(sql)?;
            }
        }

        if current < schema::CURRENT_VERSION {
            self.conn.execute(
                "UPDATE schema_version SET version = ?1",
                params![schema::CURRENT_VERSION],
            )?;
        }

        Ok(())
    }

    // ── Settings ──────────────────────────────────────────────

    pub(crate) fn get_setting(&self, key: &str) -> Result<Option<String>> {
        Ok(self
            .conn
            .query_row(
                "SELECT value FROM settings WHERE key = ?1",
                params![key],
                |row| row.get(0),
            )
            .optional()?)
    }

    pub(crate) fn set_setting(&self, key: &str, value: &str) -> Result<()> {
        self.conn.execute(
            "INSERT INTO settings (key, value) VALUES (?1, ?2)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value",
            params![key, value],
        )?;
        Ok(())
    }

    /// Redistribution step for slider edits. Falls back to the default when
    /// unset or unparseable.
    pub(crate) fn slider_step(&self) -> Result<f64> {
        let step = self
            .get_setting(SLIDER_STEP_KEY)?
            .and_then(|v| v.parse::<f64>().ok())
            .filter(|s| Allocator::new(*s).is_ok())
            .unwrap_or(DEFAULT_STEP);
        Ok(step)
    }

    pub(crate) fn set_slider_step(&self, step: f64) -> Result<()> {
        Allocator::new(step)?;
        self.set_setting(SLIDER_STEP_KEY, &step.to_string())
    }

    // ── Budgets ───────────────────────────────────────────────

    /// Store a month's total and allocation, replacing any earlier snapshot.
    pub(crate) fn save_budget(&mut self, budget: &MonthlyBudget) -> Result<()> {
        let tx = self.conn.transaction()?;
        tx.execute(
            "INSERT INTO monthly_budgets (month, total_budget, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)
             ON CONFLICT(month) DO UPDATE SET
                total_budget = excluded.total_budget,
                updated_at = excluded.updated_at",
            params![
                budget.month,
                budget.total_budget.to_string(),
                budget.updated_at,
            ],
        )?;
        tx.execute(
            "DELETE FROM category_allocations WHERE month = ?1",
            params![budget.month],
        )?;
        for (position, cat) in budget.categories.iter().enumerate() {
            tx.execute(
                "INSERT INTO category_allocations (month, main_category, position, percentage)
                 VALUES (?1, ?2, ?3, ?4)",
                params![budget.month, cat.name, position as i64, cat.percentage],
            )?;
        }
        tx.commit()?;
        info!(month = %budget.month, total = %budget.total_budget, "budget saved");
        Ok(())
    }

    pub(crate) fn get_budget(&self, month: &str) -> Result<Option<MonthlyBudget>> {
        let header: Option<(String, String)> = self
            .conn
            .query_row(
                "SELECT total_budget, updated_at FROM monthly_budgets WHERE month = ?1",
                params![month],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((total_str, updated_at)) = header else {
            return Ok(None);
        };

        let mut stmt = self.conn.prepare(
            "SELECT main_category, percentage FROM category_allocations
             WHERE month = ?1 ORDER BY position",
        )?;
        let rows = stmt.query_map(params![month], |row| {
            Ok(Category {
                name: row.get(0)?,
                percentage: row.get(1)?,
            })
        })?;
        let categories = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        let categories = CategorySet::new(categories)
            .with_context(|| format!("Stored allocation for {month} is invalid"))?;

        Ok(Some(MonthlyBudget {
            month: month.to_string(),
            total_budget: Decimal::from_str(&total_str).unwrap_or_default(),
            categories,
            updated_at,
        }))
    }

    /// Most recent stored budget strictly before `month`.
    pub(crate) fn get_latest_budget_before(&self, month: &str) -> Result<Option<MonthlyBudget>> {
        let previous: Option<String> = self
            .conn
            .query_row(
                "SELECT month FROM monthly_budgets WHERE month < ?1 ORDER BY month DESC LIMIT 1",
                params![month],
                |row| row.get(0),
            )
            .optional()?;
        match previous {
            Some(m) => self.get_budget(&m),
            None => Ok(None),
        }
    }

    /// The budget in force for `month`: its own snapshot, else the latest
    /// earlier one carried forward, else the defaults. Nothing is written.
    pub(crate) fn get_effective_budget(&self, month: &str) -> Result<MonthlyBudget> {
        if let Some(budget) = self.get_budget(month)? {
            return Ok(budget);
        }
        if let Some(previous) = self.get_latest_budget_before(month)? {
            debug!(from = %previous.month, to = month, "carrying budget forward");
            let mut budget = MonthlyBudget::new(month.to_string(), previous.total_budget);
            budget.categories = previous.categories;
            return Ok(budget);
        }
        Ok(MonthlyBudget::new(
            month.to_string(),
            Decimal::from(DEFAULT_TOTAL_BUDGET),
        ))
    }

    /// Stored months, newest first.
    pub(crate) fn get_budget_months(&self) -> Result<Vec<String>> {
        let mut stmt = self
            .conn
            .prepare("SELECT month FROM monthly_budgets ORDER BY month DESC")?;
        let rows = stmt.query_map([], |row| row.get(0))?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    pub(crate) fn delete_budget(&self, month: &str) -> Result<bool> {
        let deleted = self
            .conn
            .execute("DELETE FROM monthly_budgets WHERE month = ?1", params![month])?;
        Ok(deleted > 0)
    }

    // ── Spending ──────────────────────────────────────────────

    pub(crate) fn insert_spending(&self, spending: &Spending) -> Result<i64> {
        self.conn.execute(
            "INSERT INTO spending (date, sub_category, amount, note, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                spending.date,
                spending.sub_category,
                spending.amount.to_string(),
                spending.note,
                spending.created_at,
            ],
        )?;
        Ok(self.conn.last_insert_rowid())
    }

    pub(crate) fn get_spending(&self, month: &str) -> Result<Vec<Spending>> {
        let mut stmt = self.conn.prepare(
            "SELECT id, date, sub_category, amount, note, created_at
             FROM spending WHERE date LIKE ?1
             ORDER BY date, id",
        )?;
        let rows = stmt.query_map(params![format!("{month}%")], |row| {
            let amount_str: String = row.get(3)?;
            Ok(Spending {
                id: Some(row.get(0)?),
                date: row.get(1)?,
                sub_category: row.get(2)?,
                amount: Decimal::from_str(&amount_str).unwrap_or_default(),
                note: row.get(4)?,
                created_at: row.get(5)?,
            })
        })?;
        Ok(rows.collect::<std::result::Result<Vec<_>, _>>()?)
    }

    /// Spending for a month rolled up to main categories, in display order.
    /// Categories with nothing spent are left out.
    pub(crate) fn get_spending_by_main_category(
        &self,
        month: &str,
    ) -> Result<Vec<(MainCategory, Decimal)>> {
        let spending = self.get_spending(month)?;
        Ok(MainCategory::all()
            .iter()
            .filter_map(|main| {
                let total: Decimal = spending
                    .iter()
                    .filter(|s| s.main_category() == *main)
                    .map(|s| s.amount)
                    .sum();
                (!total.is_zero()).then_some((*main, total))
            })
            .collect())
    }

    pub(crate) fn get_total_spent(&self, month: &str) -> Result<Decimal> {
        Ok(self.get_spending(month)?.iter().map(|s| s.amount).sum())
    }

    pub(crate) fn get_month_summary(&self, month: &str) -> Result<MonthSummary> {
        Ok(MonthSummary {
            month: month.to_string(),
            total_spent: self.get_total_spent(month)?,
            total_budget: self.get_effective_budget(month)?.total_budget,
        })
    }
}
