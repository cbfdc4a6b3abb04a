//! HTML rendering for the transactions page.

use std::collections::HashMap;

use maud::{Markup, html};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    alert::Alert,
    category::{ColorPair, Theme},
    endpoints::{self, with_transaction_id},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_LINK_STYLE, CATEGORY_BADGE_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_ROW_STYLE,
        base, format_currency, format_percent,
    },
    navigation::NavBar,
    session::{Snapshot, ViewSession},
};

use super::{
    CategorySelection, RowMode, SortDirection, SortKey, SortSpec, Transaction, TransactionId,
    pipeline,
};

/// The max number of graphemes to display in the merchant column before
/// truncating and displaying ellipses.
const MAX_MERCHANT_GRAPHEMES: usize = 32;

/// The element every row action replaces.
pub(crate) const CONTENT_ID: &str = "transactions-content";
const CONTENT_TARGET: &str = "#transactions-content";
const CATEGORY_LIST_ID: &str = "category-options";

fn amount_class(amount: f64) -> &'static str {
    if amount < 0.0 {
        "text-red-700 dark:text-red-300"
    } else {
        "text-green-700 dark:text-green-300"
    }
}

/// Render the full transactions page.
pub(crate) fn transactions_page(
    content: Markup,
    theme: Theme,
    show_lock: bool,
    alert: Option<Alert>,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::TRANSACTIONS_VIEW)
        .with_lock(show_lock)
        .into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            @if let Some(alert) = alert {
                div class="w-full max-w-md mb-4" { (alert.into_panel()) }
            }

            (content)
        }
    };

    base("Transactions", theme, &[], &content)
}

/// Render the table section from the session's snapshot, sort, filter and row editor.
///
/// New categories are assigned colours as a side effect.
pub(crate) fn transactions_content(session: &mut ViewSession) -> Markup {
    let ViewSession {
        sort,
        selection,
        editor,
        colors,
        theme,
        snapshot,
        ..
    } = session;

    let empty = Snapshot::default();
    let snapshot = snapshot.as_ref().unwrap_or(&empty);
    let rows = pipeline::apply(&snapshot.transactions, selection, *sort);
    let category_options = snapshot.category_options();

    let palette: HashMap<String, ColorPair> = colors
        .colors_for(
            category_options
                .iter()
                .map(String::as_str)
                .chain(rows.iter().map(|transaction| transaction.category.as_str())),
        )
        .into_iter()
        .map(|(category, color)| (category, color.for_theme(*theme)))
        .collect();

    let has_transactions = !snapshot.transactions.is_empty();

    html! {
        section id=(CONTENT_ID) class="space-y-4 w-full lg:max-w-5xl"
        {
            header class="flex justify-between flex-wrap items-end"
            {
                h1 class="text-xl font-bold" { "Transactions" }

                @if has_transactions {
                    p class="text-sm text-gray-500 dark:text-gray-400"
                    {
                        "Showing " (rows.len()) " of " (snapshot.transactions.len()) " transactions"
                    }
                }

                a href=(endpoints::IMPORT_VIEW) class=(LINK_STYLE) { "Import Statement" }
            }

            @if !category_options.is_empty() {
                (category_filter(&category_options, selection, *sort, &palette))
            }

            @if !has_transactions {
                p class="text-gray-600 dark:text-gray-400"
                {
                    "No transactions yet. "
                    a href=(endpoints::IMPORT_VIEW) class=(LINK_STYLE) { "Import a bank statement" }
                    " to get started."
                }
            } @else if rows.is_empty() {
                p class="text-gray-600 dark:text-gray-400"
                {
                    "No transactions match the selected categories."
                }
            } @else {
                div class="overflow-x-auto rounded"
                {
                    table class="w-full text-sm text-left rtl:text-right text-gray-500 dark:text-gray-400"
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                (sort_header(SortKey::Date, *sort, ""))
                                (sort_header(SortKey::Merchant, *sort, ""))
                                th scope="col" class="px-6 py-3" { "Category" }
                                th scope="col" class="px-6 py-3" { "Confidence" }
                                (sort_header(SortKey::Amount, *sort, "text-right"))
                                th scope="col" class="px-6 py-3" { span class="sr-only" { "Actions" } }
                            }
                        }

                        tbody
                        {
                            @for transaction in &rows {
                                (transaction_row(transaction, editor.mode(), &palette))
                            }
                        }
                    }
                }
            }

            datalist id=(CATEGORY_LIST_ID)
            {
                @for category in &category_options {
                    option value=(category) {}
                }
            }
        }
    }
}

/// The URL that applies `sort` to the transactions page.
pub(crate) fn sort_url(sort: SortSpec) -> String {
    format!(
        "{}?sort={}&direction={}",
        endpoints::TRANSACTIONS_VIEW,
        sort.key.as_query_value(),
        sort.direction.as_query_value()
    )
}

fn sort_header(key: SortKey, active: SortSpec, extra_class: &str) -> Markup {
    let indicator = match (active.key == key, active.direction) {
        (false, _) => "",
        (true, SortDirection::Ascending) => " ▲",
        (true, SortDirection::Descending) => " ▼",
    };
    let aria_sort = (active.key == key).then_some(match active.direction {
        SortDirection::Ascending => "ascending",
        SortDirection::Descending => "descending",
    });

    html! {
        th scope="col" class={ "px-6 py-3 " (extra_class) } aria-sort=[aria_sort]
        {
            a href=(sort_url(active.toggled(key))) class="hover:underline"
            {
                (key.label()) (indicator)
            }
        }
    }
}

fn category_filter(
    options: &[String],
    selection: &CategorySelection,
    sort: SortSpec,
    palette: &HashMap<String, ColorPair>,
) -> Markup {
    html! {
        form
            id="category-filter"
            method="get"
            action=(endpoints::TRANSACTIONS_VIEW)
            hx-get=(endpoints::TRANSACTIONS_VIEW)
            hx-trigger="change"
            hx-target=(CONTENT_TARGET)
            hx-select=(CONTENT_TARGET)
            hx-swap="outerHTML"
            hx-push-url="true"
            class="rounded bg-white dark:bg-gray-800 p-4"
        {
            input type="hidden" name="filter" value="1";
            input type="hidden" name="sort" value=(sort.key.as_query_value());
            input type="hidden" name="direction" value=(sort.direction.as_query_value());

            fieldset class="flex flex-wrap gap-3 items-center"
            {
                legend class="text-sm font-semibold mb-2" { "Categories" }

                @for category in options {
                    label class="inline-flex items-center gap-1 cursor-pointer"
                    {
                        input
                            type="checkbox"
                            name="category"
                            value=(category)
                            checked[selection.contains(category)];

                        (category_badge(category, palette))
                    }
                }
            }

            div class="flex gap-4 mt-3 text-sm"
            {
                noscript { button type="submit" class=(BUTTON_LINK_STYLE) { "Apply" } }

                @if !selection.is_empty() {
                    a href={ (endpoints::TRANSACTIONS_VIEW) "?filter=1" } class=(LINK_STYLE) { "Show all" }
                }
            }
        }
    }
}

fn category_badge(category: &str, palette: &HashMap<String, ColorPair>) -> Markup {
    let style = palette.get(category).map(ColorPair::css);

    html! {
        span class=(CATEGORY_BADGE_STYLE) style=[style] { (category) }
    }
}

/// Text to show in the merchant column and, when truncated, the full text for the tooltip.
fn truncate_merchant(merchant: &str) -> (String, Option<&str>) {
    let merchant_length = merchant.graphemes(true).count();

    if merchant_length <= MAX_MERCHANT_GRAPHEMES {
        (merchant.to_owned(), None)
    } else {
        let truncated: String = merchant
            .graphemes(true)
            .take(MAX_MERCHANT_GRAPHEMES - 3)
            .collect();
        (truncated + "...", Some(merchant))
    }
}

fn transaction_row(
    transaction: &Transaction,
    mode: &RowMode,
    palette: &HashMap<String, ColorPair>,
) -> Markup {
    match mode {
        RowMode::Editing {
            id, buffer, error, ..
        } if id == &transaction.id => editing_row(transaction, buffer, error.as_deref()),
        RowMode::Saving { id, category, .. } if id == &transaction.id => {
            saving_row(transaction, category)
        }
        RowMode::PendingDelete { id } if id == &transaction.id => html! {
            tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
            {
                (static_cells(transaction, palette))
                td class=(TABLE_CELL_STYLE) { (confirm_delete_actions(&transaction.id)) }
            }
        },
        _ => html! {
            tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
            {
                (static_cells(transaction, palette))
                td class=(TABLE_CELL_STYLE) { (row_actions(&transaction.id)) }
            }
        },
    }
}

fn date_cell(transaction: &Transaction) -> Markup {
    html! {
        td class={ (TABLE_CELL_STYLE) " whitespace-nowrap" }
        {
            @match transaction.date {
                Some(date) => time datetime=(date) { (date) },
                None => span class="italic text-gray-400" { "Invalid date" },
            }
        }
    }
}

fn merchant_cell(transaction: &Transaction) -> Markup {
    let (merchant, tooltip) = truncate_merchant(&transaction.merchant);

    html! {
        td class=(TABLE_CELL_STYLE) title=[tooltip] { (merchant) }
    }
}

fn confidence_cell(transaction: &Transaction) -> Markup {
    let percent = format_percent(transaction.confidence_or_zero());

    html! {
        td class=(TABLE_CELL_STYLE)
        {
            div class="flex items-center gap-2"
            {
                div class="w-16 h-2 rounded bg-gray-200 dark:bg-gray-700"
                {
                    div class="h-2 rounded bg-blue-500" style={ "width: " (percent) ";" } {}
                }
                span class="text-xs" { (percent) }
            }
        }
    }
}

fn amount_cell(transaction: &Transaction) -> Markup {
    html! {
        @match transaction.amount {
            Some(amount) => td class={ (TABLE_CELL_STYLE) " text-right " (amount_class(amount)) }
            {
                (format_currency(amount.abs()))
            },
            None => td class={ (TABLE_CELL_STYLE) " text-right italic text-gray-400" }
            {
                "Invalid amount"
            },
        }
    }
}

fn static_cells(transaction: &Transaction, palette: &HashMap<String, ColorPair>) -> Markup {
    html! {
        (date_cell(transaction))
        (merchant_cell(transaction))
        td class=(TABLE_CELL_STYLE) { (category_badge(&transaction.category, palette)) }
        (confidence_cell(transaction))
        (amount_cell(transaction))
    }
}

fn row_actions(id: &TransactionId) -> Markup {
    html! {
        div class="flex gap-4 justify-end"
        {
            button
                type="button"
                hx-get=(with_transaction_id(endpoints::EDIT_TRANSACTION_VIEW, id.as_str()))
                hx-target=(CONTENT_TARGET)
                hx-swap="outerHTML"
                hx-target-error="#alert-container"
                class=(BUTTON_LINK_STYLE)
            {
                "Edit"
            }

            button
                type="button"
                hx-get=(with_transaction_id(endpoints::DELETE_TRANSACTION_VIEW, id.as_str()))
                hx-target=(CONTENT_TARGET)
                hx-swap="outerHTML"
                hx-target-error="#alert-container"
                class=(BUTTON_DELETE_STYLE)
            {
                "Delete"
            }
        }
    }
}

fn confirm_delete_actions(id: &TransactionId) -> Markup {
    html! {
        div class="flex gap-4 justify-end items-center"
        {
            span class="text-gray-900 dark:text-white" { "Delete this transaction?" }

            button
                type="button"
                hx-delete=(with_transaction_id(endpoints::TRANSACTIONS_API, id.as_str()))
                hx-target=(CONTENT_TARGET)
                hx-swap="outerHTML"
                hx-target-error="#alert-container"
                class=(BUTTON_DELETE_STYLE)
            {
                "Confirm"
            }

            button
                type="button"
                hx-post=(endpoints::CANCEL_DELETE_TRANSACTION)
                hx-target=(CONTENT_TARGET)
                hx-swap="outerHTML"
                hx-target-error="#alert-container"
                class=(BUTTON_LINK_STYLE)
            {
                "Cancel"
            }
        }
    }
}

fn editing_row(transaction: &Transaction, buffer: &str, error: Option<&str>) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            (date_cell(transaction))
            (merchant_cell(transaction))

            td class=(TABLE_CELL_STYLE) colspan="2"
            {
                form
                    hx-put=(endpoints::TRANSACTIONS_API)
                    hx-target=(CONTENT_TARGET)
                    hx-swap="outerHTML"
                    hx-target-error="#alert-container"
                    class="flex flex-col gap-1"
                {
                    input type="hidden" name="transaction_id" value=(transaction.id);

                    div class="flex gap-2 items-center"
                    {
                        input
                            type="text"
                            name="category"
                            value=(buffer)
                            list=(CATEGORY_LIST_ID)
                            aria-label="Category"
                            autofocus
                            class=(FORM_TEXT_INPUT_STYLE);

                        button type="submit" class=(BUTTON_LINK_STYLE) { "Save" }

                        button
                            type="button"
                            hx-post=(endpoints::CANCEL_EDIT_TRANSACTION)
                            hx-target=(CONTENT_TARGET)
                            hx-swap="outerHTML"
                            hx-target-error="#alert-container"
                            class=(BUTTON_LINK_STYLE)
                        {
                            "Cancel"
                        }
                    }

                    @if let Some(error) = error {
                        p class="text-red-500 text-sm" role="alert" { (error) }
                    }
                }
            }

            (amount_cell(transaction))
            td class=(TABLE_CELL_STYLE) {}
        }
    }
}

fn saving_row(transaction: &Transaction, category: &str) -> Markup {
    html! {
        tr class=(TABLE_ROW_STYLE) data-transaction-id=(transaction.id)
        {
            (date_cell(transaction))
            (merchant_cell(transaction))
            td class=(TABLE_CELL_STYLE) colspan="2"
            {
                input
                    type="text"
                    value=(category)
                    aria-label="Category"
                    disabled
                    class=(FORM_TEXT_INPUT_STYLE);
            }
            (amount_cell(transaction))
            td class=(TABLE_CELL_STYLE) { "Saving..." }
        }
    }
}

#[cfg(test)]
mod tests {
    use scraper::{ElementRef, Html, Selector};
    use time::macros::date;

    use crate::{
        endpoints,
        session::{Snapshot, ViewSession},
        test_utils::assert_valid_html,
        transaction::{
            CategorySelection, SortDirection, SortKey, SortSpec, Transaction, TransactionId,
        },
    };

    use super::{sort_url, transactions_content, truncate_merchant};

    fn transaction(id: &str, merchant: &str, amount: f64, category: &str) -> Transaction {
        Transaction {
            id: TransactionId::new(id),
            date: Some(date!(2025 - 01 - 15)),
            merchant: merchant.to_owned(),
            amount: Some(amount),
            category: category.to_owned(),
            confidence: Some(0.5),
        }
    }

    fn session_with(transactions: Vec<Transaction>) -> ViewSession {
        ViewSession {
            snapshot: Some(Snapshot {
                transactions,
                categories: vec!["Food".to_owned(), "Transport".to_owned()],
            }),
            ..Default::default()
        }
    }

    fn render(session: &mut ViewSession) -> Html {
        let html = Html::parse_fragment(&transactions_content(session).into_string());
        assert_valid_html(&html);
        html
    }

    fn rows(html: &Html) -> Vec<ElementRef<'_>> {
        html.select(&Selector::parse("tbody tr").unwrap()).collect()
    }

    fn row_ids(html: &Html) -> Vec<String> {
        rows(html)
            .iter()
            .filter_map(|row| row.value().attr("data-transaction-id"))
            .map(str::to_owned)
            .collect()
    }

    #[test]
    fn renders_rows_in_session_order() {
        let mut session = session_with(vec![
            transaction("1", "Bakery", -5.0, "Food"),
            transaction("2", "Bus", -2.5, "Transport"),
            transaction("3", "Airline", -300.0, "Travel"),
        ]);
        session.sort = SortSpec::new(SortKey::Merchant, SortDirection::Ascending);

        let html = render(&mut session);

        assert_eq!(row_ids(&html), vec!["3", "1", "2"]);
    }

    #[test]
    fn filters_by_selected_categories() {
        let mut session = session_with(vec![
            transaction("1", "Bakery", -5.0, "Food"),
            transaction("2", "Bus", -2.5, "Transport"),
        ]);
        session.selection = CategorySelection::from_iter(["Transport"]);

        let html = render(&mut session);

        assert_eq!(row_ids(&html), vec!["2"]);
        let checked: Vec<_> = html
            .select(&Selector::parse("input[name=category][checked]").unwrap())
            .filter_map(|input| input.value().attr("value"))
            .collect();
        assert_eq!(checked, vec!["Transport"]);
    }

    #[test]
    fn amounts_are_magnitudes_coloured_by_sign() {
        let mut session = session_with(vec![
            transaction("1", "Salary", 1000.0, "Income"),
            transaction("2", "Bakery", -5.0, "Food"),
        ]);

        let html = render(&mut session);

        let amounts: Vec<_> = html
            .select(&Selector::parse("tbody td.text-right").unwrap())
            .map(|cell| {
                (
                    cell.text().collect::<String>().trim().to_owned(),
                    cell.value().attr("class").unwrap_or_default().to_owned(),
                )
            })
            .collect();
        assert!(!amounts[0].0.starts_with('-'));
        assert!(amounts[0].1.contains("text-green-700"));
        assert!(!amounts[1].0.starts_with('-'));
        assert!(amounts[1].1.contains("text-red-700"));
    }

    #[test]
    fn missing_confidence_shows_zero() {
        let mut no_confidence = transaction("1", "Bakery", -5.0, "Food");
        no_confidence.confidence = None;
        let mut session = session_with(vec![no_confidence]);

        let html = render(&mut session);

        let text = rows(&html)[0].text().collect::<String>();
        assert!(text.contains("0%"), "got {text}");
    }

    #[test]
    fn badges_use_category_colours() {
        let mut session = session_with(vec![transaction("1", "Bakery", -5.0, "Food")]);

        let html = render(&mut session);

        let badge = html
            .select(&Selector::parse("tbody span.rounded-full").unwrap())
            .next()
            .unwrap();
        assert!(
            badge
                .value()
                .attr("style")
                .is_some_and(|style| style.starts_with("background-color: hsl("))
        );
    }

    #[test]
    fn editing_row_shows_form_and_error() {
        let mut session = session_with(vec![transaction("1", "Bakery", -5.0, "Food")]);
        session
            .editor
            .begin_edit(TransactionId::new("1"), "Food");
        session
            .editor
            .update_buffer(&TransactionId::new("1"), "  ")
            .unwrap();
        let _ = session.editor.confirm();

        let html = render(&mut session);

        let form = html
            .select(&Selector::parse("tbody form").unwrap())
            .next()
            .expect("editing row should contain a form");
        assert_eq!(form.value().attr("hx-put"), Some(endpoints::TRANSACTIONS_API));
        let error = form
            .select(&Selector::parse("p[role=alert]").unwrap())
            .next()
            .unwrap();
        assert_eq!(error.text().collect::<String>(), "Category cannot be empty");
    }

    #[test]
    fn pending_delete_row_asks_for_confirmation() {
        let mut session = session_with(vec![
            transaction("1", "Bakery", -5.0, "Food"),
            transaction("2", "Bus", -2.5, "Transport"),
        ]);
        session.editor.request_delete(TransactionId::new("2"));

        let html = render(&mut session);

        let confirm_buttons: Vec<_> = html
            .select(&Selector::parse("button[hx-delete]").unwrap())
            .filter_map(|button| button.value().attr("hx-delete"))
            .collect();
        assert_eq!(confirm_buttons, vec!["/api/transactions?transaction_id=2"]);
    }

    #[test]
    fn empty_snapshot_prompts_import() {
        let mut session = ViewSession::default();

        let html = render(&mut session);

        assert!(rows(&html).is_empty());
        let link = html
            .select(&Selector::parse("p a").unwrap())
            .next()
            .unwrap();
        assert_eq!(link.value().attr("href"), Some(endpoints::IMPORT_VIEW));
    }

    #[test]
    fn sort_links_toggle() {
        let sort = SortSpec::default();

        assert_eq!(
            sort_url(sort.toggled(SortKey::Date)),
            "/transactions?sort=date&direction=asc"
        );
        assert_eq!(
            sort_url(sort.toggled(SortKey::Amount)),
            "/transactions?sort=amount&direction=asc"
        );
    }

    #[test]
    fn long_merchants_are_truncated() {
        let merchant = "A".repeat(40);

        let (text, tooltip) = truncate_merchant(&merchant);

        assert_eq!(text.len(), 32);
        assert!(text.ends_with("..."));
        assert_eq!(tooltip, Some(merchant.as_str()));
    }
}
