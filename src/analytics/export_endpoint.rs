//! Defines the endpoint for exporting spending to a file.

use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use serde::Deserialize;

use crate::{
    Error,
    alert::Alert,
    backend::{ExportFormat, ExportRequest},
    timezone::current_local_date,
};

use super::{analytics_page::AnalyticsState, range::RangeQuery};

/// The form submitted from the export panel.
#[derive(Debug, Deserialize)]
pub struct ExportForm {
    /// The first day to export, `YYYY-MM-DD`.
    #[serde(default)]
    pub start: Option<String>,
    /// The last day to export, `YYYY-MM-DD`.
    #[serde(default)]
    pub end: Option<String>,
    /// "csv" or "json".
    pub format: String,
    /// Where the backend should write the file.
    pub file_path: String,
}

impl ExportForm {
    fn into_request(self, today: time::Date) -> Result<ExportRequest, Error> {
        let file_path = self.file_path.trim();
        if file_path.is_empty() {
            return Err(Error::EmptyFilePath);
        }

        let format: ExportFormat = self.format.parse()?;
        let range = RangeQuery {
            start: self.start,
            end: self.end,
        }
        .resolve(today)?;

        Ok(ExportRequest {
            range,
            format,
            file_path: file_path.to_owned(),
        })
    }
}

/// Ask the backend to write the spending in a date range to a file.
pub async fn export_endpoint(
    State(state): State<AnalyticsState>,
    Form(form): Form<ExportForm>,
) -> Response {
    let today = match current_local_date(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let request = match form.into_request(today) {
        Ok(request) => request,
        Err(error) => return error.into_alert_response(),
    };

    match state.backend.export_spending(&request).await {
        Ok(count) => {
            tracing::info!(
                "Exported {count} records as {} to {}",
                request.format,
                request.file_path
            );

            Alert::Success {
                message: "Export complete".to_owned(),
                details: format!("Exported {count} records to {}", request.file_path),
            }
            .into_html()
            .into_response()
        }
        Err(error) => {
            tracing::warn!("Could not export to {}: {error}", request.file_path);
            Error::Backend(error).into_alert_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use scraper::Selector;
    use time::{OffsetDateTime, macros::date};

    use crate::{
        Error,
        backend::{BackendError, ExportFormat, MemoryBackend},
        session::new_shared_session,
        test_utils::parse_html_fragment,
    };

    use super::{AnalyticsState, ExportForm, export_endpoint};

    fn form(file_path: &str, format: &str) -> ExportForm {
        ExportForm {
            start: Some("2025-01-01".to_owned()),
            end: Some("2025-12-31".to_owned()),
            format: format.to_owned(),
            file_path: file_path.to_owned(),
        }
    }

    fn state_with(backend: MemoryBackend) -> AnalyticsState {
        AnalyticsState {
            backend: Arc::new(backend),
            session: new_shared_session(),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    #[test]
    fn builds_request_from_form() {
        let request = form(" /tmp/out.json ", "json")
            .into_request(date!(2025 - 06 - 01))
            .unwrap();

        assert_eq!(request.file_path, "/tmp/out.json");
        assert_eq!(request.format, ExportFormat::Json);
        assert_eq!(request.range.start, date!(2025 - 01 - 01));
        assert_eq!(request.range.end, date!(2025 - 12 - 31));
    }

    #[test]
    fn empty_path_is_rejected() {
        let result = form("  ", "csv").into_request(date!(2025 - 06 - 01));

        assert_eq!(result, Err(Error::EmptyFilePath));
    }

    #[test]
    fn unknown_format_is_rejected() {
        let result = form("/tmp/out.xlsx", "xlsx").into_request(date!(2025 - 06 - 01));

        assert_eq!(result, Err(Error::InvalidExportFormat("xlsx".to_owned())));
    }

    #[tokio::test]
    async fn empty_path_never_reaches_backend() {
        let backend = MemoryBackend::new();
        backend.set_fault(Some(BackendError::Unavailable("should not be called".to_owned())));

        let response = export_endpoint(State(state_with(backend)), Form(form("", "csv"))).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn successful_export_reports_count() {
        let today = OffsetDateTime::now_utc().date();
        let path = std::env::temp_dir().join(format!(
            "spendview-export-{}.csv",
            std::process::id()
        ));
        let path = path.to_string_lossy().to_string();
        let state = state_with(MemoryBackend::with_sample_data(today));
        let export_form = ExportForm {
            start: None,
            end: None,
            format: "csv".to_owned(),
            file_path: path.clone(),
        };

        let response = export_endpoint(State(state), Form(export_form)).await;

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_fragment(response).await;
        let alert = html
            .select(&Selector::parse("[role=status]").unwrap())
            .next()
            .expect("want a success alert")
            .text()
            .collect::<String>();
        assert!(alert.contains("Exported"));
        assert!(alert.contains(&path));
        let _ = std::fs::remove_file(path);
    }

    #[tokio::test]
    async fn backend_rejection_is_shown() {
        let backend = MemoryBackend::new();
        backend.set_fault(Some(BackendError::Rejected("Disk full".to_owned())));

        let response =
            export_endpoint(State(state_with(backend)), Form(form("/tmp/out.csv", "csv"))).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let html = parse_html_fragment(response).await;
        let text = html.root_element().text().collect::<String>();
        assert!(text.contains("Disk full"));
    }
}
