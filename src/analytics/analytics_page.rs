//! Defines the route handler for the analytics page.

use std::{collections::HashMap, sync::Arc};

use axum::{
    extract::{FromRef, State},
    response::{IntoResponse, Response},
};
use axum_extra::extract::Query;

use crate::{
    AppState, Error,
    alert::Alert,
    backend::{Backend, BackendError, DateRange},
    session::{SharedSession, lock_session},
    timezone::current_local_date,
};

use super::{
    aggregation::build_chart,
    range::{RangeQuery, default_range},
    view::{AnalyticsData, analytics_page},
};

/// The state needed for the analytics page and the export endpoint.
#[derive(Debug, Clone)]
pub struct AnalyticsState {
    /// The service that computes the summaries.
    pub backend: Arc<dyn Backend>,
    /// The view session with the theme and category colours.
    pub session: SharedSession,
    /// The local timezone as a canonical timezone name, e.g. "Pacific/Auckland".
    pub local_timezone: String,
}

impl FromRef<AppState> for AnalyticsState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            backend: state.backend.clone(),
            session: state.session.clone(),
            local_timezone: state.local_timezone.clone(),
        }
    }
}

/// Display spending summaries for a date range.
///
/// The range defaults to the last twelve calendar months. If any of the
/// backend queries fail, none of the data is shown.
pub async fn get_analytics_page(
    State(state): State<AnalyticsState>,
    Query(query): Query<RangeQuery>,
) -> Result<Response, Error> {
    let today = current_local_date(&state.local_timezone)?;

    let (range, range_alert) = match query.resolve(today) {
        Ok(range) => (range, None),
        Err(error) => {
            tracing::debug!("Ignoring invalid analytics range: {error}");
            let (_, alert) = error.into_alert();
            (default_range(today), Some(alert))
        }
    };

    let (data, load_alert) = match load_analytics(state.backend.as_ref(), range).await {
        Ok(data) => (Some(data), None),
        Err(error) => {
            tracing::error!("Could not load analytics for {range:?}: {error}");
            let alert = Alert::Error {
                message: "Could not load analytics".to_owned(),
                details: error.user_message(),
            };
            (None, Some(alert))
        }
    };

    let mut session = lock_session(&state.session)?;
    let theme = session.theme;
    let colors: HashMap<_, _> = match &data {
        Some(data) => session
            .colors
            .colors_for(data.category_names())
            .into_iter()
            .map(|(category, color)| (category, color.for_theme(theme)))
            .collect(),
        None => HashMap::new(),
    };
    let show_lock = session.password_enabled == Some(true);

    Ok(analytics_page(
        range,
        data.as_ref(),
        &colors,
        theme,
        show_lock,
        load_alert.or(range_alert),
    )
    .into_response())
}

async fn load_analytics(
    backend: &dyn Backend,
    range: DateRange,
) -> Result<AnalyticsData, BackendError> {
    let (summary, breakdown, monthly) = tokio::try_join!(
        backend.get_spending_summary(range),
        backend.get_category_breakdown(range),
        backend.get_monthly_spending_by_category(range),
    )?;

    Ok(AnalyticsData {
        summary,
        breakdown,
        chart: build_chart(&monthly.data, &monthly.categories),
    })
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{extract::State, http::StatusCode};
    use axum_extra::extract::Query;
    use scraper::Selector;
    use time::OffsetDateTime;

    use crate::{
        analytics::range::RangeQuery,
        backend::{BackendError, MemoryBackend},
        category::Theme,
        session::{lock_session, new_shared_session},
        test_utils::{assert_valid_html, parse_html_document},
    };

    use super::{AnalyticsState, get_analytics_page};

    fn state_with(backend: MemoryBackend) -> AnalyticsState {
        AnalyticsState {
            backend: Arc::new(backend),
            session: new_shared_session(),
            local_timezone: "Etc/UTC".to_owned(),
        }
    }

    fn today() -> time::Date {
        OffsetDateTime::now_utc().date()
    }

    #[tokio::test]
    async fn renders_summary_for_sample_data() {
        let state = state_with(MemoryBackend::with_sample_data(today()));

        let response = get_analytics_page(State(state.clone()), Query(RangeQuery::default()))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert_valid_html(&html);
        assert_eq!(
            html.select(&Selector::parse("[data-summary-card]").unwrap())
                .count(),
            4
        );
        assert!(
            html.select(&Selector::parse("[data-month]").unwrap())
                .next()
                .is_some()
        );
        assert_eq!(lock_session(&state.session).unwrap().theme, Theme::Light);
    }

    #[tokio::test]
    async fn empty_backend_shows_no_data_message() {
        let state = state_with(MemoryBackend::new());

        let response = get_analytics_page(State(state), Query(RangeQuery::default()))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert!(
            html.select(&Selector::parse("[data-no-chart-data]").unwrap())
                .next()
                .is_some()
        );
    }

    #[tokio::test]
    async fn backend_failure_shows_no_partial_data() {
        let backend = MemoryBackend::with_sample_data(today());
        backend.set_fault(Some(BackendError::Unavailable("down".to_owned())));
        let state = state_with(backend);

        let response = get_analytics_page(State(state), Query(RangeQuery::default()))
            .await
            .unwrap();

        let html = parse_html_document(response).await;
        assert_eq!(
            html.select(&Selector::parse("[data-summary-card]").unwrap())
                .count(),
            0
        );
        let alert = html
            .select(&Selector::parse("main [role=alert]").unwrap())
            .next()
            .expect("page should show an error alert");
        assert!(
            alert
                .text()
                .collect::<String>()
                .contains("Could not load analytics")
        );
    }

    #[tokio::test]
    async fn invalid_date_falls_back_to_default_range() {
        let state = state_with(MemoryBackend::new());

        let response = get_analytics_page(
            State(state),
            Query(RangeQuery {
                start: Some("last tuesday".to_owned()),
                end: None,
            }),
        )
        .await
        .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let html = parse_html_document(response).await;
        assert!(
            html.select(&Selector::parse("main [role=alert]").unwrap())
                .next()
                .is_some()
        );
    }

    #[tokio::test]
    async fn invalid_timezone_is_an_error() {
        let state = AnalyticsState {
            local_timezone: "Middle/Earth".to_owned(),
            ..state_with(MemoryBackend::new())
        };

        let result = get_analytics_page(State(state), Query(RangeQuery::default())).await;

        assert!(result.is_err());
    }
}
