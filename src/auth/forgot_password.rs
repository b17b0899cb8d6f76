use axum::response::{IntoResponse, Response};
use maud::{Markup, html};

use crate::{
    endpoints,
    html::{LINK_STYLE, base, log_in_register},
};

fn forgot_password_view() -> Markup {
    let content = html! {
        div class="space-y-4 text-gray-900 dark:text-white"
        {
            p class="text-justify"
            {
                "Passwords are reset by whoever runs the server. Ask them to run the "
                code { "reset_password" }
                " program next to the server and point it at the database file:"
            }

            pre class="p-2 rounded bg-gray-100 dark:bg-gray-900 text-sm overflow-x-auto"
            {
                "reset_password --db-path ledgerdesk.db --email you@example.com"
            }

            p
            {
                a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE) { "Back to log in" }
            }
        }
    };

    base(
        "Forgot Password",
        &[],
        &log_in_register("Forgot your password?", &content),
    )
}

/// Renders a page describing how the user's password can be reset.
pub async fn get_forgot_password_page() -> Response {
    forgot_password_view().into_response()
}

#[cfg(test)]
mod forgot_password_tests {
    use axum::http::StatusCode;

    use crate::{
        auth::get_forgot_password_page,
        test_utils::{assert_valid_html, parse_html_document},
    };

    #[tokio::test]
    async fn page_explains_reset_tool() {
        let response = get_forgot_password_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert!(document.html().contains("reset_password"));
    }
}
