//! The settings page: the organization's name and the period close.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    app_state::DbState,
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        PAGE_CONTAINER_STYLE, base, format_date, page_header,
    },
    navigation::NavBar,
    organization::{Organization, Tenant, close_period, get_organization, rename_organization},
    timezone::local_today,
};

fn settings_view(organization: &Organization, today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::SETTINGS_VIEW).into_html();
    let default_close_date = organization.lock_date.map_or(today, |lock_date| lock_date.max(today));

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-8"
            {
                (page_header("Settings", None))

                section class=(FORM_CONTAINER_STYLE)
                {
                    form
                        hx-put=(endpoints::ORGANIZATION_API)
                        hx-target-error="#alert-container"
                        class="w-full space-y-4"
                    {
                        div
                        {
                            label for="name" class=(FORM_LABEL_STYLE) { "Business name" }

                            input
                                type="text"
                                name="name"
                                id="name"
                                value=(organization.name)
                                required
                                class=(FORM_TEXT_INPUT_STYLE);
                        }

                        button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save" }
                    }
                }

                section class=(FORM_CONTAINER_STYLE)
                {
                    h2 class="text-lg font-semibold self-start" { "Close a period" }

                    p class="text-sm text-gray-600 dark:text-gray-400 self-start" data-lock-date
                    {
                        @match organization.lock_date {
                            Some(lock_date) => {
                                "The books are closed up to and including "
                                time datetime=(format_date(lock_date)) { (format_date(lock_date)) }
                                "."
                            }
                            None => { "No periods have been closed." }
                        }
                    }

                    form
                        hx-post=(endpoints::CLOSE_PERIOD_API)
                        hx-target-error="#alert-container"
                        hx-confirm="Entries dated on or before this date can no longer be posted or reversed. Continue?"
                        class="w-full space-y-4"
                    {
                        div
                        {
                            label for="through" class=(FORM_LABEL_STYLE) { "Close books through" }

                            input
                                type="date"
                                name="through"
                                id="through"
                                value=(format_date(default_close_date))
                                max=(format_date(today))
                                required
                                class=(FORM_TEXT_INPUT_STYLE);
                        }

                        button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Close period" }
                    }
                }
            }
        }
    };

    base("Settings", &[], &content)
}

/// Display the settings page.
pub async fn get_settings_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let organization = get_organization(tenant.organization_id, &connection)?;

    Ok(settings_view(&organization, today).into_response())
}

#[derive(Debug, Deserialize)]
pub struct RenameForm {
    pub name: String,
}

/// Rename the tenant's organization.
pub async fn rename_organization_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Form(form): Form<RenameForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match rename_organization(tenant.organization_id, &form.name, &connection) {
        Ok(()) => (
            HxRedirect(endpoints::SETTINGS_VIEW.to_owned()),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct ClosePeriodForm {
    pub through: Date,
}

/// Close the books through the submitted date.
pub async fn close_period_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Form(form): Form<ClosePeriodForm>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match close_period(tenant.organization_id, form.through, today, &connection) {
        Ok(_) => {
            tracing::info!(
                "Closed books of organization {} through {}",
                tenant.organization_id,
                form.through
            );
            (
                HxRedirect(endpoints::SETTINGS_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod settings_tests {
    use axum::{Extension, Form, extract::State, http::StatusCode};
    use time::macros::date;

    use crate::{
        endpoints,
        organization::{
            get_organization,
            settings::{
                ClosePeriodForm, RenameForm, close_period_endpoint, get_settings_page,
                rename_organization_endpoint,
            },
        },
        test_utils::{TestBooks, assert_hx_redirect, assert_valid_html, parse_html_document, select_texts},
    };

    #[tokio::test]
    async fn page_shows_lock_date() {
        let (state, tenant) = TestBooks::standard().db_state();
        close_period_endpoint(
            State(state.clone()),
            Extension(tenant),
            Form(ClosePeriodForm {
                through: date!(2024 - 12 - 31),
            }),
        )
        .await;

        let response = get_settings_page(State(state), Extension(tenant))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(
            select_texts(&document, "[data-lock-date]"),
            ["The books are closed up to and including 2024-12-31."]
        );
    }

    #[tokio::test]
    async fn close_period_redirects_to_settings() {
        let (state, tenant) = TestBooks::standard().db_state();

        let response = close_period_endpoint(
            State(state.clone()),
            Extension(tenant),
            Form(ClosePeriodForm {
                through: date!(2025 - 01 - 31),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        assert_hx_redirect(&response, endpoints::SETTINGS_VIEW);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(
            get_organization(tenant.organization_id, &connection)
                .unwrap()
                .lock_date,
            Some(date!(2025 - 01 - 31))
        );
    }

    #[tokio::test]
    async fn reopening_a_period_is_rejected() {
        let (state, tenant) = TestBooks::standard().db_state();
        let close = |through| {
            close_period_endpoint(
                State(state.clone()),
                Extension(tenant),
                Form(ClosePeriodForm { through }),
            )
        };
        close(date!(2025 - 01 - 31)).await;

        let response = close(date!(2024 - 12 - 31)).await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[tokio::test]
    async fn blank_name_is_rejected() {
        let (state, tenant) = TestBooks::standard().db_state();

        let response = rename_organization_endpoint(
            State(state),
            Extension(tenant),
            Form(RenameForm {
                name: "  ".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
