//! An in-process backend that keeps everything in memory.
//!
//! Used by the tests and by `--demo`, where it is seeded with a year of
//! sample transactions.

use std::{
    collections::{BTreeMap, BTreeSet, HashMap},
    fs::File,
    io::BufWriter,
    sync::{Arc, Mutex, MutexGuard},
};

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use time::{Date, Duration};

use crate::{
    analytics::{first_of_month_months_before, month_key},
    transaction::{Transaction, TransactionId, UNCATEGORIZED, parse_date},
};

use super::{
    Backend, BackendError, CategoryTotal, DateRange, ExportFormat, ExportRequest,
    MonthlySpending, SpendingSummary, StatementKind, TransactionUpdate,
};

#[derive(Debug, Default)]
struct MemoryStore {
    transactions: Vec<Transaction>,
    vocabulary: BTreeSet<String>,
    password_digest: Option<Vec<u8>>,
    next_id: u64,
    #[cfg(test)]
    fault: Option<BackendError>,
}

impl MemoryStore {
    fn insert(&mut self, mut transaction: Transaction) {
        self.next_id += 1;
        if transaction.id.as_str().is_empty() {
            transaction.id = TransactionId::new(self.next_id.to_string());
        }
        self.vocabulary.insert(transaction.category.clone());
        self.transactions.push(transaction);
    }

    fn in_range(&self, range: DateRange) -> impl Iterator<Item = &Transaction> {
        self.transactions
            .iter()
            .filter(move |transaction| transaction.date.is_some_and(|date| range.contains(date)))
    }

    fn spending_by_category(&self, range: DateRange) -> HashMap<String, f64> {
        let mut totals = HashMap::new();

        for transaction in self.in_range(range) {
            if let Some(amount) = transaction.amount.filter(|amount| *amount < 0.0) {
                *totals.entry(transaction.category.clone()).or_insert(0.0) += amount.abs();
            }
        }

        totals
    }

    fn check_password(&self, password: &str) -> bool {
        match self.password_digest {
            Some(ref digest) => *digest == password_digest(password),
            None => true,
        }
    }
}

fn password_digest(password: &str) -> Vec<u8> {
    Sha256::digest(password.as_bytes()).to_vec()
}

fn export_error(error: impl std::fmt::Display) -> BackendError {
    BackendError::Rejected(format!("Export failed: {error}"))
}

/// Sorts by amount, largest first, then by name.
fn sorted_totals(totals: HashMap<String, f64>) -> Vec<CategoryTotal> {
    let mut totals: Vec<CategoryTotal> = totals
        .into_iter()
        .map(|(name, value)| CategoryTotal { name, value })
        .collect();

    totals.sort_by(|a, b| b.value.total_cmp(&a.value).then_with(|| a.name.cmp(&b.name)));
    totals
}

/// A [Backend] that holds transactions in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    store: Arc<Mutex<MemoryStore>>,
}

impl MemoryBackend {
    /// An empty backend with no password set.
    pub fn new() -> Self {
        Self::default()
    }

    /// A backend holding `transactions`.
    pub fn with_transactions(transactions: Vec<Transaction>) -> Self {
        let mut store = MemoryStore::default();

        for transaction in transactions {
            store.insert(transaction);
        }

        Self {
            store: Arc::new(Mutex::new(store)),
        }
    }

    /// A backend with a year of made up transactions ending on `today`.
    pub fn with_sample_data(today: Date) -> Self {
        Self::with_transactions(sample_transactions(today))
    }

    /// Make every following call fail with `fault`, or succeed again with `None`.
    #[cfg(test)]
    pub(crate) fn set_fault(&self, fault: Option<BackendError>) {
        if let Ok(mut store) = self.store.lock() {
            store.fault = fault;
        }
    }

    fn lock(&self) -> Result<MutexGuard<'_, MemoryStore>, BackendError> {
        let store = self
            .store
            .lock()
            .inspect_err(|error| tracing::error!("could not acquire memory store lock: {error}"))
            .map_err(|_| BackendError::Unavailable("memory store lock poisoned".to_owned()))?;

        #[cfg(test)]
        if let Some(fault) = store.fault.clone() {
            return Err(fault);
        }

        Ok(store)
    }
}

#[derive(Debug, Serialize)]
struct ExportRow<'a> {
    category: &'a str,
    total: f64,
}

#[derive(Debug, Deserialize)]
struct StatementRow {
    date: String,
    #[serde(alias = "merchant", alias = "Description", alias = "Merchant")]
    description: String,
    #[serde(alias = "Amount")]
    amount: String,
    #[serde(default, alias = "Category")]
    category: Option<String>,
}

fn read_statement_csv(file_path: &str) -> Result<Vec<Transaction>, BackendError> {
    let mut reader = csv::Reader::from_path(file_path)
        .map_err(|error| BackendError::Rejected(format!("Could not open {file_path}: {error}")))?;

    let mut transactions = Vec::new();

    for (index, row) in reader.deserialize::<StatementRow>().enumerate() {
        // Header is line 1.
        let line = index + 2;
        let row = row.map_err(|error| {
            BackendError::Rejected(format!("Could not read line {line}: {error}"))
        })?;

        let date = parse_date(&row.date).ok_or_else(|| {
            BackendError::Rejected(format!("Invalid date {:?} on line {line}", row.date))
        })?;
        let amount: f64 = row
            .amount
            .trim()
            .replace(['$', ','], "")
            .parse()
            .map_err(|_| {
                BackendError::Rejected(format!("Invalid amount {:?} on line {line}", row.amount))
            })?;
        let category = row
            .category
            .map(|category| category.trim().to_owned())
            .filter(|category| !category.is_empty())
            .unwrap_or_else(|| UNCATEGORIZED.to_owned());

        transactions.push(Transaction {
            id: TransactionId::new(""),
            date: Some(date),
            merchant: row.description.trim().to_owned(),
            amount: Some(amount),
            category,
            confidence: None,
        });
    }

    Ok(transactions)
}

fn write_export(request: &ExportRequest, rows: &[CategoryTotal]) -> Result<(), BackendError> {
    match request.format {
        ExportFormat::Csv => {
            let mut writer =
                csv::Writer::from_path(&request.file_path).map_err(export_error)?;

            for row in rows {
                writer
                    .serialize(ExportRow {
                        category: &row.name,
                        total: row.value,
                    })
                    .map_err(export_error)?;
            }

            writer.flush().map_err(export_error)
        }
        ExportFormat::Json => {
            let file = File::create(&request.file_path).map_err(export_error)?;
            let rows: Vec<ExportRow> = rows
                .iter()
                .map(|row| ExportRow {
                    category: &row.name,
                    total: row.value,
                })
                .collect();

            serde_json::to_writer_pretty(BufWriter::new(file), &rows)
                .map_err(export_error)
        }
    }
}

#[async_trait]
impl Backend for MemoryBackend {
    async fn get_transactions(&self) -> Result<Vec<Transaction>, BackendError> {
        let store = self.lock()?;
        let mut transactions = store.transactions.clone();
        transactions.sort_by(|a, b| b.date.cmp(&a.date));

        Ok(transactions)
    }

    async fn get_spending_summary(
        &self,
        range: DateRange,
    ) -> Result<SpendingSummary, BackendError> {
        let store = self.lock()?;

        let mut summary = SpendingSummary::default();
        for transaction in store.in_range(range) {
            let amount = transaction.amount.unwrap_or(0.0);
            if amount < 0.0 {
                summary.total_spending += amount.abs();
            } else {
                summary.total_income += amount;
            }
            summary.transaction_count += 1;
        }
        summary.net_cash_flow = summary.total_income - summary.total_spending;
        summary.top_category = sorted_totals(store.spending_by_category(range))
            .into_iter()
            .next()
            .map(|total| total.name);

        Ok(summary)
    }

    async fn get_category_breakdown(
        &self,
        range: DateRange,
    ) -> Result<Vec<CategoryTotal>, BackendError> {
        let store = self.lock()?;

        Ok(sorted_totals(store.spending_by_category(range)))
    }

    async fn get_monthly_spending_by_category(
        &self,
        range: DateRange,
    ) -> Result<MonthlySpending, BackendError> {
        let store = self.lock()?;

        let mut data: BTreeMap<String, BTreeMap<String, f64>> = BTreeMap::new();
        for transaction in store.in_range(range) {
            let (Some(date), Some(amount)) = (transaction.date, transaction.amount) else {
                continue;
            };
            if amount >= 0.0 {
                continue;
            }

            *data
                .entry(month_key(date))
                .or_default()
                .entry(transaction.category.clone())
                .or_insert(0.0) += amount.abs();
        }

        let categories = sorted_totals(store.spending_by_category(range))
            .into_iter()
            .map(|total| total.name)
            .collect();

        Ok(MonthlySpending { data, categories })
    }

    async fn get_categories(&self) -> Result<Vec<String>, BackendError> {
        let store = self.lock()?;

        Ok(store.vocabulary.iter().cloned().collect())
    }

    async fn update_transaction(
        &self,
        id: &TransactionId,
        update: &TransactionUpdate,
    ) -> Result<(), BackendError> {
        let mut store = self.lock()?;

        let transaction = store
            .transactions
            .iter_mut()
            .find(|transaction| &transaction.id == id)
            .ok_or_else(|| BackendError::Rejected("Failed to update transaction".to_owned()))?;

        transaction.category = update.category.clone();
        // A category chosen by the user is certain.
        transaction.confidence = Some(1.0);
        store.vocabulary.insert(update.category.clone());

        Ok(())
    }

    async fn delete_transaction(&self, id: &TransactionId) -> Result<(), BackendError> {
        let mut store = self.lock()?;

        let count_before = store.transactions.len();
        store.transactions.retain(|transaction| &transaction.id != id);

        if store.transactions.len() == count_before {
            return Err(BackendError::Rejected(
                "Transaction not found. It may have already been deleted.".to_owned(),
            ));
        }

        Ok(())
    }

    async fn export_spending(&self, request: &ExportRequest) -> Result<u64, BackendError> {
        let rows = {
            let store = self.lock()?;
            sorted_totals(store.spending_by_category(request.range))
        };

        write_export(request, &rows)?;

        Ok(rows.len() as u64)
    }

    async fn import_statement(
        &self,
        file_path: &str,
        kind: StatementKind,
    ) -> Result<u64, BackendError> {
        let transactions = match kind {
            StatementKind::Csv => read_statement_csv(file_path)?,
            StatementKind::Pdf => {
                return Err(BackendError::Rejected(
                    "PDF statements cannot be imported in demo mode".to_owned(),
                ));
            }
        };

        let mut store = self.lock()?;
        let count = transactions.len() as u64;
        for transaction in transactions {
            store.insert(transaction);
        }

        Ok(count)
    }

    async fn check_password_status(&self) -> Result<bool, BackendError> {
        Ok(self.lock()?.password_digest.is_some())
    }

    async fn verify_password(&self, password: &str) -> Result<(), BackendError> {
        if self.lock()?.check_password(password) {
            Ok(())
        } else {
            Err(BackendError::Rejected("Invalid password".to_owned()))
        }
    }

    async fn setup_password(&self, password: &str) -> Result<(), BackendError> {
        let mut store = self.lock()?;

        if store.password_digest.is_some() {
            return Err(BackendError::Rejected(
                "Password protection is already enabled".to_owned(),
            ));
        }

        store.password_digest = Some(password_digest(password));
        Ok(())
    }

    async fn change_password(
        &self,
        old_password: &str,
        new_password: &str,
    ) -> Result<(), BackendError> {
        let mut store = self.lock()?;

        if store.password_digest.is_none() {
            return Err(BackendError::Rejected(
                "Password protection is not enabled".to_owned(),
            ));
        }

        if !store.check_password(old_password) {
            return Err(BackendError::Rejected(
                "Current password is incorrect".to_owned(),
            ));
        }

        store.password_digest = Some(password_digest(new_password));
        Ok(())
    }

    async fn disable_password(&self, password: &str) -> Result<(), BackendError> {
        let mut store = self.lock()?;

        if !store.check_password(password) {
            return Err(BackendError::Rejected("Invalid password".to_owned()));
        }

        store.password_digest = None;
        Ok(())
    }
}

/// Recurring (merchant, category, amount, day of month) entries for the demo.
const SAMPLE_MONTH: [(&str, &str, f64, i64); 11] = [
    ("Employer Ltd", "Income", 4200.0, 0),
    ("City Apartments", "Rent", -1650.0, 1),
    ("Fresh Market", "Groceries", -142.35, 3),
    ("Metro Transit", "Transportation", -48.0, 5),
    ("StreamFlix", "Entertainment", -15.99, 7),
    ("Fresh Market", "Groceries", -98.6, 10),
    ("CloudHost", "Cloud Services", -12.0, 12),
    ("Corner Cafe", "Dining Out", -23.4, 14),
    ("City Parking", "Parking", -9.5, 17),
    ("Gym Co", "Health & Fitness", -55.0, 20),
    ("Assistant AI", "AI Services", -20.0, 24),
];

fn sample_transactions(today: Date) -> Vec<Transaction> {
    let mut transactions = Vec::new();

    for months_back in (0..12).rev() {
        let month_start = first_of_month_months_before(today, months_back);
        // Vary amounts a little from month to month.
        let wobble = 1.0 + f64::from(months_back % 4) * 0.07;

        for (merchant, category, amount, day_offset) in SAMPLE_MONTH {
            let date = month_start + Duration::days(day_offset);

            if date > today {
                continue;
            }

            let amount = if amount < 0.0 && category != "Rent" {
                (amount * wobble * 100.0).round() / 100.0
            } else {
                amount
            };

            transactions.push(Transaction {
                id: TransactionId::new(""),
                date: Some(date),
                merchant: merchant.to_owned(),
                amount: Some(amount),
                category: category.to_owned(),
                confidence: Some(if category == "Dining Out" { 0.62 } else { 0.91 }),
            });
        }
    }

    transactions.push(Transaction {
        id: TransactionId::new(""),
        date: Some(today),
        merchant: "Unknown Vendor".to_owned(),
        amount: Some(-31.0),
        category: UNCATEGORIZED.to_owned(),
        confidence: None,
    });

    transactions
}
