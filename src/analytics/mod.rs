//! Spending summaries, the monthly stacked chart and exports.

mod aggregation;
mod analytics_page;
mod export_endpoint;
mod range;
mod view;

pub use aggregation::MonthlyCategoryMatrix;
pub use analytics_page::get_analytics_page;
pub use export_endpoint::export_endpoint;
pub use range::{first_of_month_months_before, month_key};
