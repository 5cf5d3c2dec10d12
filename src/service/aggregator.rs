//! Pure summary statistics over budget rows.
//!
//! Every function here filters its input with [`is_valid`] first and never
//! relies on the order rows arrive in, so the same input always yields the
//! same output.

use std::cmp::Ordering;

use crate::models::{BudgetRow, BudgetSummary, ChartSlice, TableRow};

/// Number of individual slices kept before the tail is folded into "Others".
pub const TOP_N: usize = 8;
pub const OTHERS_LABEL: &str = "Others";

const PLACEHOLDER_CATEGORIES: [&str; 2] = ["unknown category", "unknown"];

/// A row takes part in aggregation only with a positive finite amount and a real category.
pub fn is_valid(row: &BudgetRow) -> bool {
    let category = row.category.trim();
    row.amount.is_finite()
        && row.amount > 0.0
        && !category.is_empty()
        && !PLACEHOLDER_CATEGORIES
            .iter()
            .any(|p| category.eq_ignore_ascii_case(p))
}

/// Valid rows sorted by amount descending. The sort is stable, so equal
/// amounts keep the order they were seen in.
pub fn filter_and_sort(rows: &[BudgetRow]) -> Vec<BudgetRow> {
    let mut valid: Vec<BudgetRow> = rows.iter().filter(|r| is_valid(r)).cloned().collect();
    valid.sort_by(by_amount_desc);
    valid
}

fn by_amount_desc(a: &BudgetRow, b: &BudgetRow) -> Ordering {
    b.amount.total_cmp(&a.amount)
}

pub fn total_budget(rows: &[BudgetRow]) -> f64 {
    rows.iter().filter(|r| is_valid(r)).map(|r| r.amount).sum()
}

pub fn largest_category(rows: &[BudgetRow]) -> Option<BudgetRow> {
    filter_and_sort(rows).into_iter().next()
}

/// Percentage change from `previous_total` to `current_total`, rounded to two
/// decimals. Zero when there is nothing to compare against.
pub fn year_over_year_change(current_total: f64, previous_total: f64) -> f64 {
    if !previous_total.is_finite() || previous_total == 0.0 || !current_total.is_finite() {
        return 0.0;
    }
    let change = (current_total - previous_total) / previous_total * 100.0;
    round2(change)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summary of `rows`, with the year-over-year delta taken against `previous`
/// (the same filter scope one fiscal year earlier).
pub fn summarize(rows: &[BudgetRow], previous: &[BudgetRow]) -> BudgetSummary {
    let current_total = total_budget(rows);
    BudgetSummary {
        total_budget: current_total,
        largest_category: largest_category(rows),
        year_over_year_change: year_over_year_change(current_total, total_budget(previous)),
    }
}

/// Summary of a row set that spans several fiscal years. The total and the
/// largest row cover every year; the year-over-year delta compares the latest
/// year present with the one before it.
pub fn summarize_across_years(rows: &[BudgetRow]) -> BudgetSummary {
    let mut summary = summarize(rows, &[]);
    let latest = rows.iter().filter(|r| is_valid(r)).map(|r| r.year).max();
    if let Some(latest) = latest {
        let total_in = |year: i32| -> f64 {
            rows.iter()
                .filter(|r| r.year == year && is_valid(r))
                .map(|r| r.amount)
                .sum()
        };
        summary.year_over_year_change =
            year_over_year_change(total_in(latest), total_in(latest.saturating_sub(1)));
    }
    summary
}

/// The [`TOP_N`] largest rows as chart slices, plus one "Others" slice holding
/// the sum of everything after them when there is anything left.
pub fn top_n_with_others(rows: &[BudgetRow]) -> Vec<ChartSlice> {
    let sorted = filter_and_sort(rows);
    let mut slices: Vec<ChartSlice> = sorted
        .iter()
        .take(TOP_N)
        .map(|r| ChartSlice {
            category: r.category.clone(),
            amount: r.amount,
        })
        .collect();

    if sorted.len() > TOP_N {
        let rest: f64 = sorted[TOP_N..].iter().map(|r| r.amount).sum();
        slices.push(ChartSlice {
            category: OTHERS_LABEL.to_string(),
            amount: rest,
        });
    }
    slices
}

/// Share of `total` as a percentage; zero when the total is zero.
pub fn percent_of_total(amount: f64, total: f64) -> f64 {
    if total == 0.0 || !total.is_finite() {
        return 0.0;
    }
    amount / total * 100.0
}

/// Percentage formatted to one decimal, e.g. `25.0%`.
pub fn format_percent(amount: f64, total: f64) -> String {
    format!("{:.1}%", percent_of_total(amount, total))
}

pub fn table_rows(rows: &[BudgetRow]) -> Vec<TableRow> {
    let sorted = filter_and_sort(rows);
    let total: f64 = sorted.iter().map(|r| r.amount).sum();
    sorted
        .into_iter()
        .map(|row| TableRow {
            percent_of_total: format_percent(row.amount, total),
            row,
        })
        .collect()
}
