//! Alert system for displaying success and error messages to users.
//!
//! Alerts are rendered as HTML fragments that HTMX swaps into the
//! `#alert-container` element defined in the base page template.

use axum::response::{Html, IntoResponse, Response};
use maud::{Markup, html};

/// An alert message to show the user.
#[derive(Debug, Clone, PartialEq)]
pub enum Alert {
    Success { message: String, details: String },
    SuccessSimple { message: String },
    Error { message: String, details: String },
    ErrorSimple { message: String },
}

impl Alert {
    fn view(&self) -> Markup {
        let (is_success, message, details) = match self {
            Alert::Success { message, details } => (true, message, Some(details)),
            Alert::SuccessSimple { message } => (true, message, None),
            Alert::Error { message, details } => (false, message, Some(details)),
            Alert::ErrorSimple { message } => (false, message, None),
        };

        let style = if is_success {
            "p-4 mb-4 text-sm text-green-800 rounded-lg bg-green-50 \
            dark:bg-gray-800 dark:text-green-400 shadow"
        } else {
            "p-4 mb-4 text-sm text-red-800 rounded-lg bg-red-50 \
            dark:bg-gray-800 dark:text-red-400 shadow"
        };

        html! {
            div class=(style) role="alert" data-alert=(if is_success { "success" } else { "error" })
            {
                div class="flex justify-between items-start gap-4"
                {
                    div
                    {
                        span class="font-semibold" { (message) }

                        @if let Some(details) = details {
                            @if !details.is_empty() {
                                p class="mt-1" { (details) }
                            }
                        }
                    }

                    button
                        type="button"
                        aria-label="Dismiss"
                        onclick="this.closest('[role=alert]').remove()"
                        class="font-bold"
                    {
                        "×"
                    }
                }
            }
        }
    }

    /// Render the alert as an HTML fragment.
    pub fn into_html(self) -> Html<String> {
        Html(self.view().into_string())
    }
}

impl IntoResponse for Alert {
    fn into_response(self) -> Response {
        self.into_html().into_response()
    }
}

#[cfg(test)]
mod alert_tests {
    use scraper::{Html, Selector};

    use crate::alert::Alert;

    #[test]
    fn error_alert_contains_message_and_details() {
        let alert = Alert::Error {
            message: "Oops".to_owned(),
            details: "Try again".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().0);

        let selector = Selector::parse("[role=alert]").unwrap();
        let element = html.select(&selector).next().expect("No alert found");
        assert_eq!(element.value().attr("data-alert"), Some("error"));
        let text = element.text().collect::<String>();
        assert!(text.contains("Oops"));
        assert!(text.contains("Try again"));
    }

    #[test]
    fn simple_success_alert_has_no_details() {
        let alert = Alert::SuccessSimple {
            message: "Saved".to_owned(),
        };

        let html = Html::parse_fragment(&alert.into_html().0);

        let selector = Selector::parse("p").unwrap();
        assert!(html.select(&selector).next().is_none());
    }
}
