use axum::{
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    category::Theme,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        base, loading_spinner,
    },
    navigation::NavBar,
    session::{SharedSession, lock_session},
};

fn import_form_view() -> Markup {
    let spinner = loading_spinner();

    html! {
        form
            hx-post=(endpoints::IMPORT)
            hx-disabled-elt="#file_path, #submit-button"
            hx-indicator="#indicator"
            hx-swap="none"
            hx-target-error="#alert-container"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="file_path" class=(FORM_LABEL_STYLE)
                {
                    "Statement file"
                }

                input
                    id="file_path"
                    type="text"
                    name="file_path"
                    placeholder="/home/me/Downloads/statement.csv"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                p class="mt-2 text-sm text-gray-600 dark:text-gray-400"
                {
                    "Enter the path to a CSV or PDF bank statement. \
                    The transactions are categorised as they are imported."
                }
            }

            button
                type="submit"
                id="submit-button"
                class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator" { (spinner) }
                " Import"
            }
        }
    }
}

fn import_view(theme: Theme, show_lock: bool) -> Markup {
    let nav_bar = NavBar::new(endpoints::IMPORT_VIEW)
        .with_lock(show_lock)
        .into_html();
    let form = import_form_view();

    let content = html! {
        (nav_bar)

        div class=(FORM_CONTAINER_STYLE)
        {
            div class="relative w-full max-w-md"
            {
                h1 class="mb-4 text-xl font-bold" { "Import Transactions" }
                (form)
            }
        }
    };

    base("Import Transactions", theme, &[], &content)
}

/// Route handler for the import page.
pub async fn get_import_page(State(session): State<SharedSession>) -> Result<Response, Error> {
    let (theme, show_lock) = {
        let session = lock_session(&session)?;
        (session.theme, session.password_enabled == Some(true))
    };

    Ok(import_view(theme, show_lock).into_response())
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode};

    use crate::{
        endpoints,
        session::new_shared_session,
        test_utils::{
            assert_content_type, assert_form_input, assert_form_submit_button, assert_hx_endpoint,
            assert_valid_html, must_get_form, parse_html_document,
        },
    };

    use super::get_import_page;

    #[tokio::test]
    async fn render_page() {
        let response = get_import_page(State(new_shared_session())).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_content_type(&response, "text/html; charset=utf-8");

        let html = parse_html_document(response).await;
        assert_valid_html(&html);

        let form = must_get_form(&html);
        assert_hx_endpoint(&form, endpoints::IMPORT, "hx-post");
        assert_form_input(&form, "file_path", "text");
        assert_form_submit_button(&form);
    }
}
