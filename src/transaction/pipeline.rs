//! The filter and sort pipeline that turns the backend's transactions into the
//! ordered rows shown in the transactions table.

use std::{cmp::Ordering, collections::BTreeSet};

use serde::{Deserialize, Serialize};

use super::Transaction;

/// The column a transaction table is sorted by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Calendar date.
    Date,
    /// Merchant name, ignoring case.
    Merchant,
    /// Absolute amount, ignoring sign.
    Amount,
}

impl SortKey {
    /// All keys in table column order.
    pub const ALL: [SortKey; 3] = [SortKey::Date, SortKey::Merchant, SortKey::Amount];

    /// The value used for this key in URL query strings.
    pub fn as_query_value(self) -> &'static str {
        match self {
            SortKey::Date => "date",
            SortKey::Merchant => "merchant",
            SortKey::Amount => "amount",
        }
    }

    /// Column heading text.
    pub fn label(self) -> &'static str {
        match self {
            SortKey::Date => "Date",
            SortKey::Merchant => "Merchant",
            SortKey::Amount => "Amount",
        }
    }
}

/// The direction of a sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortDirection {
    /// Natural order of the comparator.
    #[serde(rename = "asc")]
    Ascending,
    /// Reverse of the natural order.
    #[serde(rename = "desc")]
    Descending,
}

impl SortDirection {
    /// The value used for this direction in URL query strings.
    pub fn as_query_value(self) -> &'static str {
        match self {
            SortDirection::Ascending => "asc",
            SortDirection::Descending => "desc",
        }
    }

    fn flipped(self) -> Self {
        match self {
            SortDirection::Ascending => SortDirection::Descending,
            SortDirection::Descending => SortDirection::Ascending,
        }
    }
}

/// The single active sort key and direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SortSpec {
    /// The column to sort by.
    pub key: SortKey,
    /// The direction to sort in.
    pub direction: SortDirection,
}

impl Default for SortSpec {
    /// Newest transactions first.
    fn default() -> Self {
        Self {
            key: SortKey::Date,
            direction: SortDirection::Descending,
        }
    }
}

impl SortSpec {
    /// Create a sort spec.
    pub fn new(key: SortKey, direction: SortDirection) -> Self {
        Self { key, direction }
    }

    /// The spec that results from selecting `key`.
    ///
    /// Selecting the active key flips the direction, selecting a different key
    /// sorts by that key in ascending order.
    pub fn toggled(self, key: SortKey) -> Self {
        if key == self.key {
            Self::new(key, self.direction.flipped())
        } else {
            Self::new(key, SortDirection::Ascending)
        }
    }
}

/// An allow-list of categories.
///
/// An empty selection means no filter is applied.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CategorySelection(BTreeSet<String>);

impl CategorySelection {
    /// A selection that shows every transaction.
    pub fn all() -> Self {
        Self::default()
    }

    /// Whether no filter is applied.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Whether `category` is explicitly selected.
    pub fn contains(&self, category: &str) -> bool {
        self.0.contains(category)
    }

    /// Whether a transaction in `category` passes the filter.
    pub fn allows(&self, category: &str) -> bool {
        self.is_empty() || self.contains(category)
    }

    /// The selected categories in sorted order.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

impl<S: Into<String>> FromIterator<S> for CategorySelection {
    fn from_iter<T: IntoIterator<Item = S>>(iter: T) -> Self {
        Self(
            iter.into_iter()
                .map(Into::into)
                .filter(|category: &String| !category.is_empty())
                .collect(),
        )
    }
}

/// Filter `transactions` by `selection` and order them by `sort`.
///
/// The input is left untouched. Ties keep their input order. Transactions whose
/// sort field could not be parsed (e.g. a malformed date) always come last,
/// whichever direction is requested.
pub fn apply(
    transactions: &[Transaction],
    selection: &CategorySelection,
    sort: SortSpec,
) -> Vec<Transaction> {
    let mut rows: Vec<Transaction> = transactions
        .iter()
        .filter(|transaction| selection.allows(&transaction.category))
        .cloned()
        .collect();

    // `sort_by` is stable.
    rows.sort_by(|a, b| compare(a, b, sort));

    rows
}

fn compare(a: &Transaction, b: &Transaction, sort: SortSpec) -> Ordering {
    match sort.key {
        SortKey::Date => compare_optional(a.date, b.date, sort.direction, |a, b| a.cmp(&b)),
        SortKey::Amount => compare_optional(
            a.amount.map(f64::abs),
            b.amount.map(f64::abs),
            sort.direction,
            |a, b| a.total_cmp(&b),
        ),
        SortKey::Merchant => {
            apply_direction(compare_case_insensitive(&a.merchant, &b.merchant), sort.direction)
        }
    }
}

/// Compare two values, ranking missing values after present ones in both
/// directions.
fn compare_optional<T>(
    a: Option<T>,
    b: Option<T>,
    direction: SortDirection,
    compare: impl Fn(T, T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => apply_direction(compare(a, b), direction),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn apply_direction(ordering: Ordering, direction: SortDirection) -> Ordering {
    match direction {
        SortDirection::Ascending => ordering,
        SortDirection::Descending => ordering.reverse(),
    }
}

fn compare_case_insensitive(a: &str, b: &str) -> Ordering {
    let a = a.chars().flat_map(char::to_lowercase);
    let b = b.chars().flat_map(char::to_lowercase);
    a.cmp(b)
}
