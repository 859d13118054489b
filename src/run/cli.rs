use anyhow::{Context, Result};
use rust_decimal::Decimal;
use std::path::Path;
use tracing::debug;

use super::util::{bar, format_amount, format_percent, shellexpand, truncate};
use crate::allocate::{self, Allocator};
use crate::db::Database;
use crate::import::{parse_amount, read_reference, ReferenceDistribution};
use crate::models::*;

const BAR_WIDTH: usize = 20;

pub(crate) fn as_cli(args: &[String], db: &mut Database) -> Result<()> {
    let Some(command) = args.get(1) else {
        return cli_show(&[], db);
    };
    match command.as_str() {
        "show" => cli_show(&args[2..], db),
        "total" | "t" => cli_total(&args[2..], db),
        "percent" | "p" => cli_percent(&args[2..], db),
        "amount" | "a" => cli_amount(&args[2..], db),
        "recommend" => cli_recommend(&args[2..], db),
        "spend" => cli_spend(&args[2..], db),
        "spending" => cli_spending(&args[2..], db),
        "summary" | "s" => cli_summary(&args[2..], db),
        "history" => cli_history(&args[2..], db),
        "insights" | "i" => cli_insights(&args[2..], db),
        "months" => cli_months(db),
        "reset" => cli_reset(&args[2..], db),
        "export" => cli_export(&args[2..], db),
        "request" => cli_request(&args[2..], db),
        "load-request" => cli_load_request(&args[2..], db),
        "step" => cli_step(&args[2..], db),
        "--help" | "-h" | "help" => {
            print_usage();
            Ok(())
        }
        "--version" | "-V" | "version" => {
            println!("budgetsplit {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        other => {
            print_usage();
            anyhow::bail!("Unknown command: {other}");
        }
    }
}

fn print_usage() {
    let presets: Vec<&str> = Preset::all().iter().map(|p| p.as_str()).collect();
    println!("BudgetSplit - split a monthly budget across categories");
    println!();
    println!("Usage: budgetsplit [command]");
    println!();
    println!("Commands:");
    println!("  (none), show                  Show this month's allocation");
    println!("  total <amount>                Set the total budget");
    println!("  percent <category> <value>    Set a category's share; the others rebalance");
    println!("  amount <category> <amount>    Set a category's amount");
    println!("  recommend                     Apply the built-in reference distribution");
    println!("    --preset <name>             Use a preset ({})", presets.join(", "));
    println!("    --from <file.csv>           Use a category,amount CSV");
    println!("  spend <sub-category> <amount> Record spending");
    println!("    --date <YYYY-MM-DD>         Date of the expense (default: today)");
    println!("    --note <text>               Free-form note");
    println!("  spending                      List this month's spending");
    println!("  summary [YYYY-MM]             Budget vs. spending per category");
    println!("    --detail                    Also break spending down by sub-category");
    println!("  insights                      Top category and change from last month");
    println!("  history [N]                   Totals for the last N months (default: 2)");
    println!("  months                        List months with a stored budget");
    println!("  reset                         Delete the stored budget for a month");
    println!("  export [path]                 Export the allocation to CSV");
    println!("  request                       Print the budget as a JSON request");
    println!("  load-request <file.json>      Store a budget from a JSON request");
    println!("  step [value]                  Show or set the slider step");
    println!("  --help, -h                    Show this help");
    println!("  --version, -V                 Show version");
    println!();
    println!("Most commands accept --month <YYYY-MM> (default: current month).");
}

// ── Allocation ────────────────────────────────────────────────

fn cli_show(args: &[String], db: &mut Database) -> Result<()> {
    let month = month_arg(args)?;
    let budget = db.get_effective_budget(&month)?;
    print_budget(&budget);
    Ok(())
}

fn cli_total(args: &[String], db: &mut Database) -> Result<()> {
    let raw = positionals(args)
        .first()
        .copied()
        .context("Usage: budgetsplit total <amount> [--month <YYYY-MM>]")?;
    let amount = parse_amount(raw)?;
    if amount < Decimal::ZERO {
        anyhow::bail!("Total budget must not be negative");
    }

    let month = month_arg(args)?;
    let mut budget = db.get_effective_budget(&month)?;
    budget.total_budget = amount;
    budget.touch();
    db.save_budget(&budget)?;
    println!("Total budget for {} set to {}", month, format_amount(amount));
    println!();
    print_budget(&budget);
    Ok(())
}

fn cli_percent(args: &[String], db: &mut Database) -> Result<()> {
    let usage = "Usage: budgetsplit percent <category> <value> [--month <YYYY-MM>]";
    let pos = positionals(args);
    let (Some(name), Some(raw)) = (pos.first(), pos.get(1)) else {
        anyhow::bail!(usage);
    };
    let value: f64 = raw
        .trim_end_matches('%')
        .parse()
        .with_context(|| format!("Invalid percentage: {raw}"))?;

    let month = month_arg(args)?;
    let mut budget = db.get_effective_budget(&month)?;
    let index = category_index(&budget.categories, name)?;
    let edit = Edit::Percent { index, value };
    apply_edit(db, &mut budget, &edit)
}

fn cli_amount(args: &[String], db: &mut Database) -> Result<()> {
    let usage = "Usage: budgetsplit amount <category> <amount> [--month <YYYY-MM>]";
    let pos = positionals(args);
    let (Some(name), Some(raw)) = (pos.first(), pos.get(1)) else {
        anyhow::bail!(usage);
    };
    let amount = parse_amount(raw)?;

    let month = month_arg(args)?;
    let mut budget = db.get_effective_budget(&month)?;
    let index = category_index(&budget.categories, name)?;
    let edit = Edit::Amount { index, amount };
    apply_edit(db, &mut budget, &edit)
}

fn cli_recommend(args: &[String], db: &mut Database) -> Result<()> {
    let month = month_arg(args)?;
    let mut budget = db.get_effective_budget(&month)?;

    let ratios = if let Some(name) = flag(args, "--preset") {
        let preset = Preset::parse(name).with_context(|| {
            let names: Vec<&str> = Preset::all().iter().map(|p| p.as_str()).collect();
            format!("Unknown preset '{name}'. Expected one of: {}", names.join(", "))
        })?;
        println!("Applying preset: {}", preset.as_str());
        budget.categories.align(|main| preset.ratio_for(main))
    } else {
        let reference = match flag(args, "--from") {
            Some(path) => {
                let reference = read_reference(Path::new(&shellexpand(path)))?;
                println!("Read {} reference rows from {path}", reference.entries().len());
                reference
            }
            None => ReferenceDistribution::built_in(),
        };
        allocate::normalize_ratios(&reference.amounts_for(&budget.categories))?
    };

    apply_edit(db, &mut budget, &Edit::Recommend { ratios })
}

fn cli_step(args: &[String], db: &mut Database) -> Result<()> {
    match positionals(args).first() {
        None => {
            let allocator = Allocator::new(db.slider_step()?)?;
            println!("Slider step: {}", allocator.step());
        }
        Some(raw) => {
            let step: f64 = raw
                .parse()
                .with_context(|| format!("Invalid step: {raw}"))?;
            db.set_slider_step(step)?;
            println!("Slider step set to {step}");
        }
    }
    Ok(())
}

fn apply_edit(db: &mut Database, budget: &mut MonthlyBudget, edit: &Edit) -> Result<()> {
    let allocator = Allocator::new(db.slider_step()?)?;
    let changes = allocator.apply(&mut budget.categories, budget.total_budget, edit)?;
    debug!(month = %budget.month, changed = changes.len(), "edit applied");

    if changes.is_empty() {
        println!("No changes");
        return Ok(());
    }
    budget.touch();
    db.save_budget(budget)?;
    print_changes(budget, &changes);
    println!();
    print_budget(budget);
    Ok(())
}

// ── Spending ──────────────────────────────────────────────────

fn cli_spend(args: &[String], db: &mut Database) -> Result<()> {
    let usage = "Usage: budgetsplit spend <sub-category> <amount> [--date <YYYY-MM-DD>] [--note <text>]";
    let pos = positionals(args);
    let (Some(sub), Some(raw)) = (pos.first(), pos.get(1)) else {
        anyhow::bail!(usage);
    };
    let amount = parse_amount(raw)?;
    if amount <= Decimal::ZERO {
        anyhow::bail!("Spending amount must be positive");
    }

    let date = flag(args, "--date")
        .map(str::to_string)
        .unwrap_or_else(month::today);
    if month::month_of(&date).is_none() {
        anyhow::bail!("Invalid date '{date}' (expected YYYY-MM-DD)");
    }

    let sub_category = match MainCategory::canonical_sub_category(sub) {
        Some(known) => known.to_string(),
        None => {
            eprintln!("Note: '{sub}' is not a known sub-category, counting it under Other");
            sub.to_string()
        }
    };

    let mut spending = Spending::new(date, sub_category, amount);
    if let Some(note) = flag(args, "--note") {
        spending.note = note.to_string();
    }
    let id = db.insert_spending(&spending)?;
    println!(
        "Recorded #{id}: {} for {} ({}) on {}",
        format_amount(amount),
        spending.sub_category,
        spending.main_category(),
        spending.date
    );
    Ok(())
}

fn cli_spending(args: &[String], db: &mut Database) -> Result<()> {
    let month = month_arg(args)?;
    let entries = db.get_spending(&month)?;
    if entries.is_empty() {
        println!("No spending for {month}");
        return Ok(());
    }

    println!(
        "{:<5} {:<10} {:<16} {:>12}  Note",
        "ID", "Date", "Sub-category", "Amount"
    );
    println!("{}", "─".repeat(60));
    for s in &entries {
        println!(
            "{:<5} {:<10} {:<16} {:>12}  {}",
            s.id.unwrap_or(0),
            s.date,
            truncate(&s.sub_category, 16),
            format_amount(s.amount),
            s.note,
        );
    }
    Ok(())
}

fn cli_summary(args: &[String], db: &mut Database) -> Result<()> {
    let (detail, args) = switch(args, "--detail");
    let args = args.as_slice();
    let month = match positionals(args).first() {
        Some(m) if month::is_valid_month(m) => m.to_string(),
        Some(m) => anyhow::bail!("Invalid month '{m}' (expected YYYY-MM)"),
        None => month_arg(args)?,
    };

    let budget = db.get_effective_budget(&month)?;
    let spent = db.get_spending_by_main_category(&month)?;
    let summary = budget.summarize(&spent);

    println!("BudgetSplit - {}", month::label(&month));
    println!("{}", "─".repeat(56));
    println!("  Budget:     {}", format_amount(summary.total_budget));
    println!("  Spent:      {}", format_amount(summary.total_spent));
    println!("  Remaining:  {}", format_amount(summary.remaining));
    println!("  Used:       {}", format_percent(summary.spending_ratio));
    if summary.is_over_budget {
        println!("  Over budget!");
    }

    println!();
    println!(
        "  {:<12} {:>12} {:>12} {:>7}",
        "Category", "Budget", "Spent", "Used"
    );
    for status in &summary.categories {
        println!(
            "  {:<12} {:>12} {:>12} {:>7}{}",
            truncate(&status.name, 12),
            format_amount(status.budget_amount),
            format_amount(status.spent),
            format_percent(status.spending_ratio),
            if status.is_over_budget { "  OVER" } else { "" },
        );
    }

    if detail {
        let entries = db.get_spending(&month)?;
        for group in sub_category_breakdown(&budget, &entries) {
            println!();
            println!("  {} ({} budget)", group.category, format_amount(group.budget_amount));
            for seg in &group.segments {
                println!(
                    "    {:<14} {:>12} {:>7}",
                    truncate(&seg.sub_category, 14),
                    format_amount(seg.spent),
                    format_percent(seg.ratio),
                );
            }
        }
    }
    Ok(())
}

fn cli_insights(args: &[String], db: &mut Database) -> Result<()> {
    let month = month_arg(args)?;
    let previous = month::shift_back(&month, 1)
        .with_context(|| format!("No month before {month}"))?;

    let budget = db.get_effective_budget(&month)?;
    let spent = db.get_spending_by_main_category(&month)?;
    let spent_before = db.get_spending_by_main_category(&previous)?;

    println!("Insights - {}", month::label(&month));
    println!("{}", "─".repeat(56));
    match highest_spending(&spent, budget.total_budget) {
        Some(top) => println!(
            "  Top category:  {} ({}, {:.0}% of the budget)",
            top.category,
            format_amount(top.spent),
            top.ratio
        ),
        None => println!("  Top category:  no spending recorded"),
    }
    match compare_months(&spent, &spent_before) {
        Some(cmp) => println!(
            "  vs {}:   {} {} {:.0}% ({} -> {})",
            month::label(&previous),
            cmp.category,
            if cmp.is_increase { "up" } else { "down" },
            cmp.change_ratio,
            format_amount(cmp.previous),
            format_amount(cmp.current),
        ),
        None => println!("  vs {}:   no change", month::label(&previous)),
    }
    Ok(())
}

fn cli_history(args: &[String], db: &mut Database) -> Result<()> {
    let count: u32 = match positionals(args).first() {
        Some(raw) => raw
            .parse()
            .with_context(|| format!("Invalid month count: {raw}"))?,
        None => 2,
    };
    if count == 0 {
        anyhow::bail!("Month count must be at least 1");
    }

    let current = month_arg(args)?;
    println!("{:<10} {:>14} {:>14} {:>7}", "Month", "Budget", "Spent", "Used");
    println!("{}", "─".repeat(48));
    for back in 0..count {
        let Some(month) = month::shift_back(&current, back) else {
            break;
        };
        let summary = db.get_month_summary(&month)?;
        let ratio = allocate::convert::spending_ratio(summary.total_spent, summary.total_budget);
        println!(
            "{:<10} {:>14} {:>14} {:>7}",
            month::label(&summary.month),
            format_amount(summary.total_budget),
            format_amount(summary.total_spent),
            format_percent(ratio),
        );
    }
    Ok(())
}

// ── Stored budgets ────────────────────────────────────────────

fn cli_months(db: &mut Database) -> Result<()> {
    let months = db.get_budget_months()?;
    if months.is_empty() {
        println!("No stored budgets");
        return Ok(());
    }
    for month in &months {
        if let Some(budget) = db.get_budget(month)? {
            println!(
                "{month}  {:>14}  updated {}",
                format_amount(budget.total_budget),
                budget.updated_at
            );
        }
    }
    Ok(())
}

fn cli_reset(args: &[String], db: &mut Database) -> Result<()> {
    let month = month_arg(args)?;
    if db.delete_budget(&month)? {
        println!("Deleted budget for {month}");
    } else {
        println!("No stored budget for {month}");
    }
    Ok(())
}

fn cli_export(args: &[String], db: &mut Database) -> Result<()> {
    let month = month_arg(args)?;

    // Output path is the first non-flag argument
    let output_path = positionals(args)
        .first()
        .map(|a| shellexpand(a))
        .unwrap_or_else(|| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".into());
            format!("{home}/budgetsplit-{month}.csv")
        });

    let budget = db.get_effective_budget(&month)?;
    let rows = crate::export::export_snapshot(Path::new(&output_path), &budget)?;
    println!("Exported {rows} rows to {output_path}");
    Ok(())
}

fn cli_request(args: &[String], db: &mut Database) -> Result<()> {
    let month = month_arg(args)?;
    let budget = db.get_effective_budget(&month)?;
    let request = budget.to_request()?;
    println!("{}", serde_json::to_string_pretty(&request)?);
    Ok(())
}

fn cli_load_request(args: &[String], db: &mut Database) -> Result<()> {
    let file_path = positionals(args)
        .first()
        .map(|a| shellexpand(a))
        .context("Usage: budgetsplit load-request <file.json>")?;
    let content = std::fs::read_to_string(&file_path)
        .with_context(|| format!("Failed to read {file_path}"))?;
    let request: BudgetRequest =
        serde_json::from_str(&content).context("Failed to parse budget request")?;

    let budget = MonthlyBudget::from_request(&request)?;
    db.save_budget(&budget)?;
    println!("Stored budget for {}", budget.month);
    println!();
    print_budget(&budget);
    Ok(())
}

// ── Helpers ───────────────────────────────────────────────────

fn category_index(set: &CategorySet, name: &str) -> Result<usize> {
    set.position(name)
        .or_else(|| MainCategory::parse(name).and_then(|main| set.position(main.as_str())))
        .with_context(|| {
            let names: Vec<&str> = set.iter().map(|c| c.name.as_str()).collect();
            format!("Unknown category '{name}'. Expected one of: {}", names.join(", "))
        })
}

/// Whether a value-less `--switch` is present, and the arguments without it.
fn switch(args: &[String], name: &str) -> (bool, Vec<String>) {
    let present = args.iter().any(|a| a == name);
    let rest = args.iter().filter(|a| *a != name).cloned().collect();
    (present, rest)
}

fn flag<'a>(args: &'a [String], name: &str) -> Option<&'a str> {
    args.windows(2)
        .find(|w| w[0] == name)
        .map(|w| w[1].as_str())
}

/// Arguments that are neither `--flag`s nor their values.
fn positionals(args: &[String]) -> Vec<&str> {
    let mut out = Vec::new();
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        if arg.starts_with("--") {
            iter.next();
        } else {
            out.push(arg.as_str());
        }
    }
    out
}

fn month_arg(args: &[String]) -> Result<String> {
    match flag(args, "--month") {
        Some(m) if month::is_valid_month(m) => Ok(m.to_string()),
        Some(m) => anyhow::bail!("Invalid month '{m}' (expected YYYY-MM)"),
        None => Ok(month::current_month()),
    }
}

fn print_budget(budget: &MonthlyBudget) {
    println!("Budget - {}", month::label(&budget.month));
    println!("{}", "─".repeat(60));
    println!("  Total: {}", format_amount(budget.total_budget));
    println!();
    for cat in &budget.categories {
        println!(
            "  {:<12} {:>6} {:>14}  {}",
            truncate(&cat.name, 12),
            format_percent(cat.percentage),
            format_amount(cat.amount(budget.total_budget)),
            bar(cat.percentage, BAR_WIDTH),
        );
    }
    println!("  {}", "─".repeat(34));
    println!(
        "  {:<12} {:>6}",
        "Allocated",
        format_percent(budget.categories.total_percentage())
    );

    let unallocated = budget.categories.unallocated(budget.total_budget);
    if !unallocated.is_zero() {
        println!(
            "  {:<12} {:>6} {:>14}",
            "Unallocated",
            "",
            format_amount(unallocated)
        );
    }
    if !allocate::is_balanced(&budget.categories) {
        println!(
            "  Note: shares sum to {}, not 100%",
            format_percent(budget.categories.total_percentage())
        );
    }
}

fn print_changes(budget: &MonthlyBudget, changes: &[Change]) {
    println!("Changed:");
    for change in changes {
        let name = budget
            .categories
            .get(change.index)
            .map(|c| c.name.as_str())
            .unwrap_or("?");
        println!(
            "  {:<12} {:>6} -> {:>6}  ({:+.1})",
            name,
            format_percent(change.before),
            format_percent(change.after),
            change.delta(),
        );
    }
}

#[cfg(test)]
#[path = "cli_tests.rs"]
mod tests;
