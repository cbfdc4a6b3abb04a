//! HTML rendering for the analytics page.

use std::collections::HashMap;

use maud::{Markup, PreEscaped, html};

use crate::{
    alert::Alert,
    backend::{CategoryTotal, DateRange, SpendingSummary},
    category::{ColorPair, Theme},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, CARD_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, HeadElement,
        PAGE_CONTAINER_STYLE, base, format_currency, format_percent,
    },
    navigation::NavBar,
};

use super::aggregation::{ChartModel, LegendEntry, MonthBar};

/// Everything the backend supplied for one date range.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct AnalyticsData {
    pub summary: SpendingSummary,
    pub breakdown: Vec<CategoryTotal>,
    pub chart: ChartModel,
}

impl AnalyticsData {
    /// Every category name that needs a colour.
    pub fn category_names(&self) -> impl Iterator<Item = &str> {
        let legend: &[LegendEntry] = match &self.chart {
            ChartModel::NoData => &[],
            ChartModel::Chart { legend, .. } => legend,
        };

        self.breakdown
            .iter()
            .map(|total| total.name.as_str())
            .chain(legend.iter().map(|entry| entry.category.as_str()))
    }
}

const CHART_STYLE: &str = r#"
    .stacked-bar {
        display: flex;
        flex-direction: column-reverse;
        width: 100%;
        border-radius: 0.25rem 0.25rem 0 0;
        overflow: hidden;
    }
"#;

const CHART_HEIGHT: &str = "height: 16rem;";

pub(super) fn analytics_page(
    range: DateRange,
    data: Option<&AnalyticsData>,
    colors: &HashMap<String, ColorPair>,
    theme: Theme,
    show_lock: bool,
    alert: Option<Alert>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::ANALYTICS_VIEW)
        .with_lock(show_lock)
        .into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            @if let Some(alert) = alert {
                div class="w-full max-w-md mb-4" { (alert.into_panel()) }
            }

            section class="w-full max-w-5xl space-y-6"
            {
                h1 class="text-xl font-bold dark:text-white" { "Analytics" }

                (range_form(range))

                @if let Some(data) = data {
                    (summary_cards(&data.summary))
                    (breakdown_view(&data.breakdown, data.summary.total_spending, colors))
                    (chart_view(&data.chart, colors))
                }

                (export_form(range))
            }
        }
    };

    base(
        "Analytics",
        theme,
        &[HeadElement::Style(PreEscaped(CHART_STYLE.to_owned()))],
        &content,
    )
}

fn range_form(range: DateRange) -> Markup {
    html! {
        form
            method="get"
            action=(endpoints::ANALYTICS_VIEW)
            class="flex flex-wrap items-end gap-4"
        {
            div
            {
                label for="start" class=(FORM_LABEL_STYLE) { "From" }
                input
                    type="date"
                    id="start"
                    name="start"
                    value=(range.start)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="end" class=(FORM_LABEL_STYLE) { "To" }
                input
                    type="date"
                    id="end"
                    name="end"
                    value=(range.end)
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Apply" }
            }
        }
    }
}

fn summary_cards(summary: &SpendingSummary) -> Markup {
    let net_class = if summary.net_cash_flow < 0.0 {
        "text-red-700 dark:text-red-300"
    } else {
        "text-green-700 dark:text-green-300"
    };

    html! {
        div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-4 gap-4"
        {
            (summary_card("Total spending", &format_currency(summary.total_spending), ""))
            (summary_card("Total income", &format_currency(summary.total_income), ""))
            (summary_card("Net cash flow", &format_currency(summary.net_cash_flow), net_class))
            (summary_card("Transactions", &summary.transaction_count.to_string(), ""))
        }

        @if let Some(top_category) = &summary.top_category {
            p class="text-sm text-gray-600 dark:text-gray-400"
            {
                "Top spending category: "
                span class="font-semibold" data-top-category { (top_category) }
            }
        }
    }
}

fn summary_card(title: &str, value: &str, value_class: &str) -> Markup {
    html! {
        div class=(CARD_STYLE) data-summary-card=(title)
        {
            h3 class="text-sm font-medium text-gray-600 dark:text-gray-400" { (title) }
            p class={ "mt-2 text-2xl font-bold dark:text-white " (value_class) } { (value) }
        }
    }
}

fn breakdown_view(
    breakdown: &[CategoryTotal],
    total_spending: f64,
    colors: &HashMap<String, ColorPair>,
) -> Markup {
    html! {
        section class=(CARD_STYLE)
        {
            h2 class="text-lg font-semibold mb-4 dark:text-white" { "Spending by category" }

            @if breakdown.is_empty() {
                p class="text-gray-600 dark:text-gray-400" { "No spending in this period." }
            } @else {
                ul class="space-y-3"
                {
                    @for total in breakdown {
                        @let share = breakdown_share(total.value, total_spending);
                        li data-category=(total.name)
                        {
                            div class="flex justify-between text-sm dark:text-white"
                            {
                                span { (total.name) }
                                span { (format_currency(total.value)) " (" (format_percent(share)) ")" }
                            }
                            div class="w-full h-2 mt-1 bg-gray-200 rounded dark:bg-gray-700"
                            {
                                div
                                    class="h-2 rounded"
                                    style=(bar_style(share, colors.get(&total.name))) {}
                            }
                        }
                    }
                }
            }
        }
    }
}

/// A category's share of total spending as a fraction in [0, 1].
pub(super) fn breakdown_share(value: f64, total_spending: f64) -> f64 {
    if total_spending > 0.0 && value.is_finite() {
        (value / total_spending).clamp(0.0, 1.0)
    } else {
        0.0
    }
}

fn bar_style(share: f64, color: Option<&ColorPair>) -> String {
    let width = format!("width: {:.1}%;", share * 100.0);

    match color {
        Some(color) => format!("{width} background-color: {};", color.foreground),
        None => width,
    }
}

fn chart_view(chart: &ChartModel, colors: &HashMap<String, ColorPair>) -> Markup {
    html! {
        section class=(CARD_STYLE)
        {
            h2 class="text-lg font-semibold mb-4 dark:text-white" { "Monthly spending" }

            @match chart {
                ChartModel::NoData => {
                    p class="text-gray-600 dark:text-gray-400" data-no-chart-data
                    {
                        "No spending data for this period."
                    }
                }
                ChartModel::Chart { months, max_value, legend } => {
                    (stacked_bars(months, *max_value, colors))
                    (chart_legend(legend, colors))
                }
            }
        }
    }
}

fn stacked_bars(months: &[MonthBar], max_value: f64, colors: &HashMap<String, ColorPair>) -> Markup {
    html! {
        div class="flex items-end gap-2" style=(CHART_HEIGHT) data-max-value=(max_value)
        {
            @for month in months {
                div
                    class="flex flex-col items-center justify-end flex-1 h-full"
                    data-month=(month.month)
                    title={ (month.label) ": " (format_currency(month.total)) }
                {
                    div
                        class="stacked-bar"
                        style=(format!("height: {:.1}%;", month.height_percent))
                    {
                        @for segment in &month.segments {
                            div
                                data-segment=(segment.category)
                                title={ (segment.category) ": " (format_currency(segment.value)) }
                                style=(segment_style(segment.percent, colors.get(&segment.category))) {}
                        }
                    }

                    span class="mt-1 text-xs text-gray-600 dark:text-gray-400 whitespace-nowrap"
                    {
                        (month.label)
                    }
                }
            }
        }
    }
}

fn segment_style(percent: f64, color: Option<&ColorPair>) -> String {
    let height = format!("height: {percent:.1}%;");

    match color {
        Some(color) => format!("{height} background-color: {};", color.foreground),
        None => height,
    }
}

fn chart_legend(legend: &[LegendEntry], colors: &HashMap<String, ColorPair>) -> Markup {
    html! {
        ul class="flex flex-wrap gap-4 mt-4 text-sm dark:text-white"
        {
            @for entry in legend {
                li class="flex items-center gap-2" data-legend=(entry.category)
                {
                    span
                        class="inline-block w-3 h-3 rounded-sm"
                        style=[colors.get(&entry.category).map(|color| format!("background-color: {};", color.foreground))] {}
                    (entry.category) " " (format_currency(entry.total))
                }
            }
        }
    }
}

fn export_form(range: DateRange) -> Markup {
    html! {
        section class=(CARD_STYLE)
        {
            h2 class="text-lg font-semibold mb-4 dark:text-white" { "Export" }

            form
                hx-post=(endpoints::EXPORT)
                hx-swap="none"
                hx-target-error="#alert-container"
                class="grid grid-cols-1 sm:grid-cols-2 gap-4"
            {
                input type="hidden" name="start" value=(range.start);
                input type="hidden" name="end" value=(range.end);

                div
                {
                    label for="format" class=(FORM_LABEL_STYLE) { "Format" }
                    select id="format" name="format" class=(FORM_TEXT_INPUT_STYLE)
                    {
                        option value="csv" selected { "CSV" }
                        option value="json" { "JSON" }
                    }
                }

                div
                {
                    label for="file_path" class=(FORM_LABEL_STYLE) { "Save to" }
                    input
                        type="text"
                        id="file_path"
                        name="file_path"
                        placeholder="/home/me/spending.csv"
                        class=(FORM_TEXT_INPUT_STYLE)
                        required;
                }

                div class="sm:col-span-2"
                {
                    button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Export" }
                }
            }
        }
    }
}
