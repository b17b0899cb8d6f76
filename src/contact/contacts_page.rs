//! The contacts page, with the form for adding a contact.

use axum::{
    Extension, Form,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    alert::Alert,
    app_state::DbState,
    contact::{Contact, ContactId, ContactKind, create_contact, delete_contact, list_contacts},
    endpoints::{self, format_endpoint},
    form::empty_string_as_none,
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, page_header, text_input,
    },
    navigation::NavBar,
    organization::Tenant,
};

fn kind_filter_links(selected: Option<ContactKind>) -> Markup {
    let filter_link = |kind: Option<ContactKind>, label: &str| {
        let href = match kind {
            Some(kind) => format!("{}?kind={}", endpoints::CONTACTS_VIEW, kind.as_str()),
            None => endpoints::CONTACTS_VIEW.to_owned(),
        };
        let class = if kind == selected {
            "font-semibold underline"
        } else {
            LINK_STYLE
        };

        html! { a href=(href) class=(class) { (label) } }
    };

    html! {
        nav class="flex gap-4 text-sm" aria-label="Contact type"
        {
            (filter_link(None, "All"))
            (filter_link(Some(ContactKind::Customer), "Customers"))
            (filter_link(Some(ContactKind::Vendor), "Vendors"))
        }
    }
}

fn create_contact_form(default_kind: ContactKind) -> Markup {
    html! {
        form
            hx-post=(endpoints::CONTACTS_API)
            hx-target-error="#alert-container"
            class="w-full space-y-4"
        {
            (text_input("Name", "name", "", true))

            div
            {
                label for="email" class=(FORM_LABEL_STYLE) { "Email" }

                input
                    type="email"
                    name="email"
                    id="email"
                    class=(FORM_TEXT_INPUT_STYLE);
            }

            div
            {
                label for="kind" class=(FORM_LABEL_STYLE) { "Type" }

                select name="kind" id="kind" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for kind in ContactKind::ALL {
                        option value=(kind.as_str()) selected[kind == default_kind] { (kind) }
                    }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Add contact" }
        }
    }
}

fn contacts_view(contacts: &[Contact], kind: Option<ContactKind>) -> Markup {
    let nav_bar = NavBar::new(endpoints::CONTACTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl grid gap-8 lg:grid-cols-3"
            {
                section class="lg:col-span-2 space-y-4"
                {
                    (page_header("Contacts", None))
                    (kind_filter_links(kind))

                    div class="overflow-x-auto rounded shadow"
                    {
                        table class=(TABLE_STYLE)
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Email" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Actions" } }
                                }
                            }

                            tbody
                            {
                                @for contact in contacts {
                                    tr class=(TABLE_ROW_STYLE) data-contact-row
                                    {
                                        th scope="row" class="px-6 py-4 font-medium text-gray-900 dark:text-white"
                                        {
                                            (contact.name)
                                        }
                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            @if let Some(email) = &contact.email {
                                                a href={"mailto:" (email)} class=(LINK_STYLE) { (email) }
                                            }
                                        }
                                        td class=(TABLE_CELL_STYLE) { (contact.kind) }
                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            button
                                                hx-delete=(format_endpoint(endpoints::CONTACT_API, contact.id))
                                                hx-confirm={"Delete " (contact.name) "?"}
                                                hx-target="closest tr"
                                                hx-target-error="#alert-container"
                                                hx-swap="delete"
                                                class=(BUTTON_DELETE_STYLE)
                                            {
                                                "Delete"
                                            }
                                        }
                                    }
                                }

                                @if contacts.is_empty() {
                                    tr class=(TABLE_ROW_STYLE)
                                    {
                                        td colspan="4" class="px-6 py-4 text-center" { "No contacts yet." }
                                    }
                                }
                            }
                        }
                    }
                }

                section class=(FORM_CONTAINER_STYLE)
                {
                    h2 class="text-lg font-semibold self-start" { "New contact" }
                    (create_contact_form(kind.unwrap_or(ContactKind::Customer)))
                }
            }
        }
    };

    base("Contacts", &[], &content)
}

#[derive(Debug, Default, Deserialize)]
pub struct ContactsQuery {
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub kind: Option<ContactKind>,
}

/// Display the organization's contacts.
pub async fn get_contacts_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Query(query): Query<ContactsQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let contacts = list_contacts(tenant.organization_id, query.kind, &connection)?;

    Ok(contacts_view(&contacts, query.kind).into_response())
}

#[derive(Debug, Deserialize)]
pub struct ContactForm {
    pub name: String,
    #[serde(default)]
    pub email: String,
    pub kind: ContactKind,
}

pub async fn create_contact_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Form(form): Form<ContactForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_contact(
        tenant.organization_id,
        &form.name,
        Some(&form.email),
        form.kind,
        &connection,
    ) {
        Ok(contact) => (
            HxRedirect(format!(
                "{}?kind={}",
                endpoints::CONTACTS_VIEW,
                contact.kind.as_str()
            )),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

pub async fn delete_contact_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(contact_id): Path<ContactId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match delete_contact(tenant.organization_id, contact_id, &connection) {
        // The status code has to be 200 OK or HTMX will not delete the table row.
        Ok(()) => Alert::SuccessSimple {
            message: "Contact deleted".to_owned(),
        }
        .into_response(),
        Err(error) => error.into_alert_response(),
    }
}
