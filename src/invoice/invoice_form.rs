//! The form for drafting an invoice.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;
use time::{Date, Duration};

use crate::{
    Error,
    account::{Account, AccountKind, AccountRole, postable_accounts},
    app_state::DbState,
    contact::{Contact, ContactId, ContactKind, list_contacts},
    document::parse_tax_rate,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_STYLE,
        WIDE_FORM_CONTAINER_STYLE, add_line_script, base, date_input, page_header,
    },
    invoice::{NewInvoice, NewInvoiceLine, create_invoice},
    money::Money,
    navigation::NavBar,
    organization::Tenant,
    timezone::local_today,
};

const INITIAL_ROWS: usize = 3;

/// The number of days until a new invoice falls due.
const PAYMENT_TERMS_DAYS: i64 = 30;

fn line_row(revenue_accounts: &[Account]) -> Markup {
    html! {
        tr data-line-row
        {
            td class="px-2 py-2 min-w-48"
            {
                input
                    type="text"
                    name="description"
                    aria-label="Description"
                    class=(FORM_TEXT_INPUT_STYLE);
            }
            td class="px-2 py-2 w-24"
            {
                input
                    type="number"
                    name="quantity"
                    aria-label="Quantity"
                    min="1"
                    step="1"
                    placeholder="1"
                    class=(FORM_TEXT_INPUT_STYLE);
            }
            td class="px-2 py-2"
            {
                input
                    type="text"
                    inputmode="decimal"
                    name="unit_price"
                    aria-label="Unit price"
                    placeholder="0.00"
                    class=(FORM_TEXT_INPUT_STYLE);
            }
            td class="px-2 py-2 min-w-48"
            {
                select name="account_id" aria-label="Revenue account" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for account in revenue_accounts {
                        option
                            value=(account.id)
                            selected[account.role == Some(AccountRole::SalesRevenue)]
                        {
                            (account.code) " " (account.name)
                        }
                    }
                }
            }
        }
    }
}

fn new_invoice_view(customers: &[Contact], revenue_accounts: &[Account], today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_INVOICE_VIEW).into_html();
    let row = line_row(revenue_accounts);

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-4"
            {
                (page_header("New Invoice", Some((endpoints::INVOICES_VIEW, "Back to invoices"))))

                @if customers.is_empty() {
                    p class="text-sm" data-no-customers
                    {
                        "Add a customer on the "
                        a href={(endpoints::CONTACTS_VIEW) "?kind=customer"} class=(LINK_STYLE) { "contacts page" }
                        " before drafting an invoice."
                    }
                }

                div class=(WIDE_FORM_CONTAINER_STYLE)
                {
                    form
                        hx-post=(endpoints::INVOICES_API)
                        hx-target-error="#alert-container"
                        class="w-full space-y-4"
                    {
                        div class="grid gap-4 md:grid-cols-2"
                        {
                            div
                            {
                                label for="customer_id" class=(FORM_LABEL_STYLE) { "Customer" }

                                select name="customer_id" id="customer_id" required class=(FORM_TEXT_INPUT_STYLE)
                                {
                                    @for customer in customers {
                                        option value=(customer.id) { (customer.name) }
                                    }
                                }
                            }

                            div
                            {
                                label for="tax_rate" class=(FORM_LABEL_STYLE) { "Tax rate (%)" }

                                input
                                    type="text"
                                    inputmode="decimal"
                                    name="tax_rate"
                                    id="tax_rate"
                                    placeholder="0"
                                    class=(FORM_TEXT_INPUT_STYLE);
                            }

                            (date_input("Issue date", "issue_date", today))
                            (date_input("Due date", "due_date", today + Duration::days(PAYMENT_TERMS_DAYS)))
                        }

                        table class=(TABLE_STYLE)
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Quantity" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Unit price" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                }
                            }

                            tbody id="lines"
                            {
                                @for _ in 0..INITIAL_ROWS {
                                    (row)
                                }
                            }
                        }

                        template id="line-template" { (row) }

                        div class="flex gap-4"
                        {
                            button type="button" id="add-line" class=(BUTTON_SECONDARY_STYLE)
                            {
                                "Add line"
                            }

                            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Save draft" }
                        }
                    }
                }
            }
        }
    };

    base("New Invoice", &[add_line_script()], &content)
}

/// Display the form for drafting an invoice.
pub async fn get_new_invoice_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let customers = list_contacts(
        tenant.organization_id,
        Some(ContactKind::Customer),
        &connection,
    )?;
    let revenue_accounts =
        postable_accounts(tenant.organization_id, &[AccountKind::Revenue], &connection)?;

    Ok(new_invoice_view(&customers, &revenue_accounts, today).into_response())
}

/// The form data for a draft invoice.
///
/// Each line is spread over the four repeated fields, matched up by position.
#[derive(Debug, Deserialize)]
pub struct InvoiceForm {
    pub customer_id: ContactId,
    pub issue_date: Date,
    pub due_date: Date,
    #[serde(default)]
    pub tax_rate: String,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default)]
    pub quantity: Vec<String>,
    #[serde(default)]
    pub unit_price: Vec<String>,
    #[serde(default)]
    pub account_id: Vec<String>,
}

impl InvoiceForm {
    /// Convert the form into a new invoice, skipping rows left blank.
    ///
    /// A blank quantity means one.
    ///
    /// # Errors
    ///
    /// - [Error::EmptyField] if a row has a quantity or price but no description.
    /// - [Error::InvalidQuantity] if a quantity is not a whole number.
    /// - [Error::InvalidAmount] if a unit price or the tax rate cannot be parsed.
    /// - [Error::InvalidAccount] if an account ID is not a number.
    pub(super) fn into_new_invoice(self) -> Result<NewInvoice, Error> {
        let field = |values: &[String], index: usize| -> String {
            values
                .get(index)
                .map(|value| value.trim().to_owned())
                .unwrap_or_default()
        };

        let mut lines = Vec::new();

        for index in 0..self.description.len() {
            let description = field(&self.description, index);
            let quantity = field(&self.quantity, index);
            let unit_price = field(&self.unit_price, index);
            let account_id = field(&self.account_id, index);

            if description.is_empty() {
                if quantity.is_empty() && unit_price.is_empty() {
                    continue;
                }

                return Err(Error::EmptyField("Line description"));
            }

            let quantity = if quantity.is_empty() {
                1
            } else {
                quantity.parse().map_err(|_| Error::InvalidQuantity)?
            };

            lines.push(NewInvoiceLine {
                description,
                quantity,
                unit_price: unit_price.parse::<Money>()?,
                account_id: account_id.parse().map_err(|_| {
                    Error::InvalidAccount(format!("\"{account_id}\" is not an account"))
                })?,
            });
        }

        Ok(NewInvoice {
            customer_id: self.customer_id,
            issue_date: self.issue_date,
            due_date: self.due_date,
            tax_rate_bps: parse_tax_rate(&self.tax_rate)?,
            lines,
        })
    }
}

/// Save a draft invoice and redirect to it.
pub async fn create_invoice_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Form(form): Form<InvoiceForm>,
) -> Response {
    let new_invoice = match form.into_new_invoice() {
        Ok(new_invoice) => new_invoice,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_invoice(tenant.organization_id, new_invoice, &connection) {
        Ok(invoice) => (
            HxRedirect(format_endpoint(endpoints::INVOICE_VIEW, invoice.id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::debug!("rejected invoice: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod invoice_form_tests {
    use time::macros::date;

    use crate::{Error, invoice::invoice_form::InvoiceForm, money::Money};

    fn form() -> InvoiceForm {
        InvoiceForm {
            customer_id: 1,
            issue_date: date!(2025 - 03 - 01),
            due_date: date!(2025 - 03 - 31),
            tax_rate: "12.5".to_owned(),
            description: vec!["Widgets".to_owned(), "".to_owned()],
            quantity: vec!["".to_owned(), "".to_owned()],
            unit_price: vec!["$1,000.00".to_owned(), "".to_owned()],
            account_id: vec!["7".to_owned(), "7".to_owned()],
        }
    }

    #[test]
    fn skips_blank_rows_and_defaults_quantity() {
        let new_invoice = form().into_new_invoice().unwrap();

        assert_eq!(new_invoice.tax_rate_bps, 1250);
        assert_eq!(new_invoice.lines.len(), 1);
        assert_eq!(new_invoice.lines[0].quantity, 1);
        assert_eq!(new_invoice.lines[0].unit_price, Money::from_dollars(1000));
        assert_eq!(new_invoice.lines[0].account_id, 7);
    }

    #[test]
    fn price_without_description_is_rejected() {
        let mut form = form();
        form.unit_price[1] = "5".to_owned();

        assert_eq!(
            form.into_new_invoice(),
            Err(Error::EmptyField("Line description"))
        );
    }

    #[test]
    fn fractional_quantity_is_rejected() {
        let mut form = form();
        form.quantity[0] = "1.5".to_owned();

        assert_eq!(form.into_new_invoice(), Err(Error::InvalidQuantity));
    }
}

#[cfg(test)]
mod new_invoice_page_tests {
    use axum::{Extension, extract::State};

    use crate::{
        contact::{ContactKind, create_contact},
        endpoints,
        invoice::get_new_invoice_page,
        test_utils::{
            TestBooks, assert_hx_endpoint, assert_valid_html, must_get_form, parse_html_document,
            select_texts,
        },
    };

    #[tokio::test]
    async fn offers_customers_and_revenue_accounts() {
        let books = TestBooks::standard();
        let org = books.organization_id();
        create_contact(org, "Acme", None, ContactKind::Customer, &books.connection).unwrap();
        create_contact(org, "Paper Co", None, ContactKind::Vendor, &books.connection).unwrap();
        let (state, tenant) = books.db_state();

        let response = get_new_invoice_page(State(state), Extension(tenant))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::INVOICES_API, "hx-post");
        assert_eq!(select_texts(&document, "#customer_id option"), ["Acme"]);
        assert_eq!(
            select_texts(&document, "tbody#lines tr:first-child option"),
            ["4000 Sales", "4100 Service Income", "4900 Other Income"]
        );
        assert_eq!(
            select_texts(&document, "tbody#lines tr:first-child option[selected]"),
            ["4000 Sales"]
        );
    }

    #[tokio::test]
    async fn prompts_for_customer_when_there_are_none() {
        let (state, tenant) = TestBooks::standard().db_state();

        let response = get_new_invoice_page(State(state), Extension(tenant))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(select_texts(&document, "[data-no-customers]").len(), 1);
    }
}

#[cfg(test)]
mod create_invoice_endpoint_tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use time::macros::date;

    use crate::{
        contact::{ContactKind, create_contact},
        endpoints::{self, format_endpoint},
        invoice::{InvoiceStatus, create_invoice_endpoint, invoice_form::InvoiceForm, list_invoices},
        test_utils::{TestBooks, account_by_code, assert_hx_redirect},
    };

    #[tokio::test]
    async fn creates_draft_and_redirects() {
        let books = TestBooks::standard();
        let customer = create_contact(
            books.organization_id(),
            "Acme",
            None,
            ContactKind::Customer,
            &books.connection,
        )
        .unwrap();
        let sales = account_by_code(&books, "4000");
        let (state, tenant) = books.db_state();

        let response = create_invoice_endpoint(
            State(state.clone()),
            Extension(tenant),
            Form(InvoiceForm {
                customer_id: customer.id,
                issue_date: date!(2025 - 03 - 01),
                due_date: date!(2025 - 03 - 31),
                tax_rate: "15".to_owned(),
                description: vec!["Widgets".to_owned()],
                quantity: vec!["3".to_owned()],
                unit_price: vec!["10".to_owned()],
                account_id: vec![sales.id.to_string()],
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let invoices = list_invoices(tenant.organization_id, &connection).unwrap();
        assert_eq!(invoices.len(), 1);
        assert_eq!(invoices[0].status, InvoiceStatus::Draft);
        assert_eq!(invoices[0].totals.total.to_string(), "34.50");
        assert_hx_redirect(
            &response,
            &format_endpoint(endpoints::INVOICE_VIEW, invoices[0].id),
        );
    }

    #[tokio::test]
    async fn empty_invoice_is_rejected() {
        let books = TestBooks::standard();
        let customer = create_contact(
            books.organization_id(),
            "Acme",
            None,
            ContactKind::Customer,
            &books.connection,
        )
        .unwrap();
        let (state, tenant) = books.db_state();

        let response = create_invoice_endpoint(
            State(state),
            Extension(tenant),
            Form(InvoiceForm {
                customer_id: customer.id,
                issue_date: date!(2025 - 03 - 01),
                due_date: date!(2025 - 03 - 31),
                tax_rate: String::new(),
                description: vec![String::new()],
                quantity: vec![String::new()],
                unit_price: vec![String::new()],
                account_id: vec![String::new()],
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
