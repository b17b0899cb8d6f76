//! Registration: creates an organization, its chart of accounts and the owner's user account.

use std::sync::{Arc, Mutex};

use axum::{
    Form,
    extract::{FromRef, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::{PrivateCookieJar, cookie::Key};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use time::Duration;

use crate::{
    AppState, Error,
    account::ChartTemplate,
    auth::{PasswordHash, ValidatedPassword, create_user, normalize_email, set_auth_cookie},
    endpoints,
    html::{
        BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE, base,
        loading_spinner, log_in_register, password_input,
    },
    organization::{Tenant, insert_organization_with_chart},
};

/// Inline error messages for each field of the registration form.
#[derive(Debug, Default)]
struct FieldErrors<'a> {
    organization_name: Option<&'a str>,
    email: Option<&'a str>,
    password: Option<&'a str>,
    confirm_password: Option<&'a str>,
}

fn field_error(message: Option<&str>) -> Markup {
    html! {
        @if let Some(message) = message {
            p class="text-red-500 text-base" { (message) }
        }
    }
}

fn registration_form(form: &RegisterForm, errors: &FieldErrors) -> Markup {
    html! {
        form
            hx-post=(endpoints::ORGANIZATIONS_API)
            hx-swap="outerHTML"
            hx-indicator="#indicator"
            hx-disabled-elt="#submit-button"
            class="space-y-4 md:space-y-6"
        {
            div
            {
                label for="organization_name" class=(FORM_LABEL_STYLE) { "Business name" }

                input
                    type="text"
                    name="organization_name"
                    id="organization_name"
                    value=(form.organization_name)
                    required
                    autofocus
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error(errors.organization_name))
            }

            div
            {
                label for="template" class=(FORM_LABEL_STYLE) { "Chart of accounts" }

                select name="template" id="template" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for template in ChartTemplate::ALL {
                        option value=(template.as_str()) selected[template == form.template]
                        {
                            (template.label())
                        }
                    }
                }
            }

            div
            {
                label for="email" class=(FORM_LABEL_STYLE) { "Email" }

                input
                    type="email"
                    name="email"
                    id="email"
                    value=(form.email)
                    autocomplete="email"
                    required
                    class=(FORM_TEXT_INPUT_STYLE);

                (field_error(errors.email))
            }

            (password_input("password", "Password", errors.password))
            (password_input("confirm_password", "Confirm password", errors.confirm_password))

            button type="submit" id="submit-button" class=(BUTTON_PRIMARY_STYLE)
            {
                span class="inline htmx-indicator" id="indicator"
                {
                    (loading_spinner())
                }
                "Create books"
            }

            p class="text-sm font-light text-gray-500 dark:text-gray-400"
            {
                "Already registered? "
                a href=(endpoints::LOG_IN_VIEW) class=(LINK_STYLE) { "Log in here" }
            }
        }
    }
}

/// Display the registration page.
pub async fn get_register_page() -> Response {
    let form = RegisterForm {
        organization_name: String::new(),
        template: ChartTemplate::default(),
        email: String::new(),
        password: String::new(),
        confirm_password: String::new(),
    };
    let registration_form = registration_form(&form, &FieldErrors::default());
    let content = log_in_register("Set up your books", &registration_form);

    base("Register", &[], &content).into_response()
}

/// The state needed for registering a new organization.
#[derive(Debug, Clone)]
pub struct RegistrationState {
    /// The key to be used for signing and encrypting private cookies.
    pub cookie_key: Key,
    /// The duration for which cookies used for authentication are valid.
    pub cookie_duration: Duration,
    pub db_connection: Arc<Mutex<Connection>>,
}

impl FromRef<AppState> for RegistrationState {
    fn from_ref(state: &AppState) -> Self {
        Self {
            cookie_key: state.cookie_key.clone(),
            cookie_duration: state.cookie_duration,
            db_connection: state.db_connection.clone(),
        }
    }
}

// this impl tells `PrivateCookieJar` how to access the key from our state
impl FromRef<RegistrationState> for Key {
    fn from_ref(state: &RegistrationState) -> Self {
        state.cookie_key.clone()
    }
}

#[derive(Clone, Serialize, Deserialize)]
pub struct RegisterForm {
    pub organization_name: String,
    #[serde(default)]
    pub template: ChartTemplate,
    pub email: String,
    pub password: String,
    pub confirm_password: String,
}

/// Create the organization and its owner in one transaction.
fn create_books(
    form: &RegisterForm,
    password_hash: PasswordHash,
    connection: &Connection,
) -> Result<Tenant, Error> {
    let transaction = connection.unchecked_transaction()?;
    let organization =
        insert_organization_with_chart(&form.organization_name, form.template, &transaction)?;
    let user = create_user(organization.id, &form.email, password_hash, &transaction)?;
    transaction.commit()?;

    Ok(Tenant {
        user_id: user.id,
        organization_id: organization.id,
    })
}

/// Handler for registration requests via the POST method.
///
/// On success the new owner is logged in and redirected to the dashboard.
pub async fn register_organization(
    State(state): State<RegistrationState>,
    jar: PrivateCookieJar,
    Form(form): Form<RegisterForm>,
) -> Response {
    let render = |errors: FieldErrors| registration_form(&form, &errors).into_response();

    if form.organization_name.trim().is_empty() {
        return render(FieldErrors {
            organization_name: Some("Enter the name of your business."),
            ..Default::default()
        });
    }

    let email = match normalize_email(&form.email) {
        Ok(email) => email,
        Err(error) => {
            let message = error.to_string();
            return registration_form(
                &form,
                &FieldErrors {
                    email: Some(&message),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    let validated_password = match ValidatedPassword::new(
        &form.password,
        &[email.as_str(), form.organization_name.as_str()],
    ) {
        Ok(password) => password,
        Err(error) => {
            let message = error.to_string();
            return registration_form(
                &form,
                &FieldErrors {
                    password: Some(&message),
                    ..Default::default()
                },
            )
            .into_response();
        }
    };

    if form.password != form.confirm_password {
        return render(FieldErrors {
            confirm_password: Some("Passwords do not match"),
            ..Default::default()
        });
    }

    let password_hash = match PasswordHash::new(validated_password, PasswordHash::DEFAULT_COST) {
        Ok(hash) => hash,
        Err(error) => {
            tracing::error!("an error occurred while hashing a password: {error}");
            return error.into_alert_response();
        }
    };

    let result = match state.db_connection.lock() {
        Ok(connection) => create_books(&form, password_hash, &connection),
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let tenant = match result {
        Ok(tenant) => tenant,
        Err(Error::DuplicateEmail(_)) => {
            return render(FieldErrors {
                email: Some("That email address is already registered, log in instead."),
                ..Default::default()
            });
        }
        Err(error) => {
            tracing::error!("An unhandled error occurred while registering: {error}");
            return error.into_alert_response();
        }
    };

    tracing::info!(
        "Registered organization {} with owner {}",
        tenant.organization_id,
        tenant.user_id
    );

    match set_auth_cookie(jar, tenant, state.cookie_duration) {
        Ok(jar) => (
            HxRedirect(endpoints::DASHBOARD_VIEW.to_owned()),
            jar,
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::error!("An error occurred while setting the auth cookie: {error}");
            (
                HxRedirect(endpoints::LOG_IN_VIEW.to_owned()),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod register_page_tests {
    use axum::http::StatusCode;

    use crate::{
        auth::get_register_page,
        endpoints,
        test_utils::{
            assert_form_input, assert_form_submit_button, assert_hx_endpoint, assert_valid_html,
            must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_register_page() {
        let response = get_register_page().await;

        assert_eq!(response.status(), StatusCode::OK);
        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::ORGANIZATIONS_API, "hx-post");
        assert_form_input(&form, "organization_name", "text");
        assert_form_input(&form, "email", "email");
        assert_form_input(&form, "password", "password");
        assert_form_input(&form, "confirm_password", "password");
        assert_form_submit_button(&form);
    }
}
