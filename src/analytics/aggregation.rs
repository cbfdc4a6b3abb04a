//! Turns the backend's month → category → amount matrix into the geometry of
//! a stacked bar chart.

use std::collections::{BTreeMap, HashSet};

use time::{Date, format_description::BorrowedFormatItem, macros::format_description};

use crate::transaction::DATE_FORMAT;

/// Spending per category for each month, keyed by "YYYY-MM".
pub type MonthlyCategoryMatrix = BTreeMap<String, BTreeMap<String, f64>>;

/// The tallest bar fills this share of the chart height, leaving room for labels.
pub const BAR_CEILING_PERCENT: f64 = 90.0;

/// One category's slice of a month's bar.
#[derive(Debug, Clone, PartialEq)]
pub struct Segment {
    /// The category name.
    pub category: String,
    /// The amount spent in the category that month.
    pub value: f64,
    /// `value` as a percentage of the month's total.
    pub percent: f64,
}

/// A single month's stacked bar.
#[derive(Debug, Clone, PartialEq)]
pub struct MonthBar {
    /// The month key, e.g. "2025-01".
    pub month: String,
    /// Human readable label, e.g. "Jan 2025".
    pub label: String,
    /// Total spending across the requested categories.
    pub total: f64,
    /// Bar height as a percentage of the chart height.
    pub height_percent: f64,
    /// Non-zero categories in the requested category order.
    pub segments: Vec<Segment>,
}

/// A category's total across all months.
#[derive(Debug, Clone, PartialEq)]
pub struct LegendEntry {
    /// The category name.
    pub category: String,
    /// Total spending across every month.
    pub total: f64,
}

/// The renderable chart, or an explicit marker that there is nothing to draw.
#[derive(Debug, Clone, PartialEq)]
pub enum ChartModel {
    /// No months or no categories were supplied.
    NoData,
    /// At least one month and one category were supplied.
    Chart {
        /// Bars in ascending month order.
        months: Vec<MonthBar>,
        /// The shared scale, never less than one.
        max_value: f64,
        /// Categories with spending in at least one month.
        legend: Vec<LegendEntry>,
    },
}

/// Build the stacked chart for `matrix`, stacking `categories` in order.
///
/// Categories missing from a month count as zero. Negative or non-finite
/// values are treated as zero since the matrix holds spending magnitudes.
/// A category listed more than once is stacked once, at its first position.
pub fn build_chart(matrix: &MonthlyCategoryMatrix, categories: &[String]) -> ChartModel {
    let mut seen = HashSet::new();
    let categories: Vec<&String> = categories
        .iter()
        .filter(|category| seen.insert(*category))
        .collect();

    if matrix.is_empty() || categories.is_empty() {
        return ChartModel::NoData;
    }

    let value_of = |month: &BTreeMap<String, f64>, category: &str| -> f64 {
        month
            .get(category)
            .copied()
            .filter(|value| value.is_finite() && *value > 0.0)
            .unwrap_or(0.0)
    };

    // BTreeMap iterates keys in ascending order and zero-padded "YYYY-MM" keys
    // sort chronologically.
    let totals: Vec<(&String, &BTreeMap<String, f64>, f64)> = matrix
        .iter()
        .map(|(month, values)| {
            let total = categories
                .iter()
                .map(|category| value_of(values, category))
                .sum();
            (month, values, total)
        })
        .collect();

    let max_value = totals
        .iter()
        .map(|(_, _, total)| *total)
        .fold(1.0_f64, f64::max);

    let months = totals
        .into_iter()
        .map(|(month, values, total)| {
            let segments = categories
                .iter()
                .filter_map(|category| {
                    let value = value_of(values, category);
                    (value > 0.0).then(|| Segment {
                        category: (*category).clone(),
                        value,
                        percent: value / total * 100.0,
                    })
                })
                .collect();

            MonthBar {
                month: month.clone(),
                label: month_label(month),
                total,
                height_percent: total / max_value * BAR_CEILING_PERCENT,
                segments,
            }
        })
        .collect();

    let legend = categories
        .iter()
        .filter_map(|category| {
            let total: f64 = matrix
                .values()
                .map(|values| value_of(values, category))
                .sum();
            (total > 0.0).then(|| LegendEntry {
                category: (*category).clone(),
                total,
            })
        })
        .collect();

    ChartModel::Chart {
        months,
        max_value,
        legend,
    }
}

const MONTH_LABEL_FORMAT: &[BorrowedFormatItem] = format_description!("[month repr:short] [year]");

/// Format a "YYYY-MM" key as e.g. "Jan 2025", falling back to the raw key.
pub fn month_label(month_key: &str) -> String {
    Date::parse(&format!("{month_key}-1"), DATE_FORMAT)
        .ok()
        .and_then(|first_of_month| first_of_month.format(MONTH_LABEL_FORMAT).ok())
        .unwrap_or_else(|| month_key.to_owned())
}
