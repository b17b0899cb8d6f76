//! The form for entering a bill received from a vendor.

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
    account::{Account, AccountKind, postable_accounts},
    app_state::DbState,
    bill::{BillLine, NewBill, create_bill},
    contact::{Contact, ContactId, ContactKind, list_contacts},
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_STYLE,
        WIDE_FORM_CONTAINER_STYLE, add_line_script, base, date_input, page_header, text_input,
    },
    navigation::NavBar,
    organization::Tenant,
    timezone::local_today,
};

const INITIAL_ROWS: usize = 3;

/// The number of days until a new bill falls due.
const PAYMENT_TERMS_DAYS: i64 = 14;

fn line_row(expense_accounts: &[Account], asset_accounts: &[Account]) -> Markup {
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
            td class="px-2 py-2"
            {
                input
                    type="text"
                    inputmode="decimal"
                    name="amount"
                    aria-label="Amount"
                    placeholder="0.00"
                    class=(FORM_TEXT_INPUT_STYLE);
            }
            td class="px-2 py-2 min-w-48"
            {
                select name="account_id" aria-label="Account" class=(FORM_TEXT_INPUT_STYLE)
                {
                    optgroup label="Expenses"
                    {
                        @for account in expense_accounts {
                            option value=(account.id) { (account.code) " " (account.name) }
                        }
                    }
                    optgroup label="Assets"
                    {
                        @for account in asset_accounts {
                            option value=(account.id) { (account.code) " " (account.name) }
                        }
                    }
                }
            }
        }
    }
}

fn new_bill_view(vendors: &[Contact], accounts: &[Account], today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_BILL_VIEW).into_html();
    let (expense_accounts, asset_accounts): (Vec<Account>, Vec<Account>) = accounts
        .iter()
        .cloned()
        .partition(|account| account.kind == AccountKind::Expense);
    let row = line_row(&expense_accounts, &asset_accounts);

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-4"
            {
                (page_header("New Bill", Some((endpoints::BILLS_VIEW, "Back to bills"))))

                @if vendors.is_empty() {
                    p class="text-sm" data-no-vendors
                    {
                        "Add a vendor on the "
                        a href={(endpoints::CONTACTS_VIEW) "?kind=vendor"} class=(LINK_STYLE) { "contacts page" }
                        " before entering a bill."
                    }
                }

                div class=(WIDE_FORM_CONTAINER_STYLE)
                {
                    form
                        hx-post=(endpoints::BILLS_API)
                        hx-target-error="#alert-container"
                        class="w-full space-y-4"
                    {
                        div class="grid gap-4 md:grid-cols-2"
                        {
                            div
                            {
                                label for="vendor_id" class=(FORM_LABEL_STYLE) { "Vendor" }

                                select name="vendor_id" id="vendor_id" required class=(FORM_TEXT_INPUT_STYLE)
                                {
                                    @for vendor in vendors {
                                        option value=(vendor.id) { (vendor.name) }
                                    }
                                }
                            }

                            (text_input("Vendor reference", "reference", "", false))
                            (date_input("Bill date", "bill_date", today))
                            (date_input("Due date", "due_date", today + Duration::days(PAYMENT_TERMS_DAYS)))
                        }

                        table class=(TABLE_STYLE)
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Amount" }
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

    base("New Bill", &[add_line_script()], &content)
}

/// Display the form for entering a bill.
pub async fn get_new_bill_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let vendors = list_contacts(tenant.organization_id, Some(ContactKind::Vendor), &connection)?;
    let accounts = postable_accounts(
        tenant.organization_id,
        &[AccountKind::Expense, AccountKind::Asset],
        &connection,
    )?;

    Ok(new_bill_view(&vendors, &accounts, today).into_response())
}

/// The form data for a draft bill.
///
/// Each line is spread over the three repeated fields, matched up by position.
#[derive(Debug, Deserialize)]
pub struct BillForm {
    pub vendor_id: ContactId,
    #[serde(default)]
    pub reference: String,
    pub bill_date: Date,
    pub due_date: Date,
    #[serde(default)]
    pub description: Vec<String>,
    #[serde(default)]
    pub amount: Vec<String>,
    #[serde(default)]
    pub account_id: Vec<String>,
}

impl BillForm {
    /// Convert the form into a new bill, skipping rows left blank.
    pub(super) fn into_new_bill(self) -> Result<NewBill, Error> {
        let mut lines = Vec::new();

        for (index, description) in self.description.iter().enumerate() {
            let description = description.trim();
            let amount = self.amount.get(index).map(|s| s.trim()).unwrap_or_default();
            let account_id = self
                .account_id
                .get(index)
                .map(|s| s.trim())
                .unwrap_or_default();

            if description.is_empty() {
                if amount.is_empty() {
                    continue;
                }

                return Err(Error::EmptyField("Line description"));
            }

            lines.push(BillLine {
                description: description.to_owned(),
                amount: amount.parse()?,
                account_id: account_id.parse().map_err(|_| {
                    Error::InvalidAccount(format!("\"{account_id}\" is not an account"))
                })?,
            });
        }

        Ok(NewBill {
            vendor_id: self.vendor_id,
            reference: self.reference,
            bill_date: self.bill_date,
            due_date: self.due_date,
            lines,
        })
    }
}

/// Save a draft bill and redirect to it.
pub async fn create_bill_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Form(form): Form<BillForm>,
) -> Response {
    let new_bill = match form.into_new_bill() {
        Ok(new_bill) => new_bill,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_bill(tenant.organization_id, new_bill, &connection) {
        Ok(bill) => (
            HxRedirect(format_endpoint(endpoints::BILL_VIEW, bill.id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::debug!("rejected bill: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod bill_form_tests {
    use time::macros::date;

    use crate::{Error, bill::bill_form::BillForm, money::Money};

    fn form() -> BillForm {
        BillForm {
            vendor_id: 1,
            reference: " INV-9 ".to_owned(),
            bill_date: date!(2025 - 04 - 01),
            due_date: date!(2025 - 04 - 15),
            description: vec!["Rent".to_owned(), "".to_owned()],
            amount: vec!["1,000".to_owned(), "".to_owned()],
            account_id: vec!["12".to_owned(), "12".to_owned()],
        }
    }

    #[test]
    fn skips_blank_rows() {
        let new_bill = form().into_new_bill().unwrap();

        assert_eq!(new_bill.lines.len(), 1);
        assert_eq!(new_bill.lines[0].amount, Money::from_dollars(1000));
        assert_eq!(new_bill.lines[0].account_id, 12);
    }

    #[test]
    fn amount_without_description_is_rejected() {
        let mut form = form();
        form.amount[1] = "20".to_owned();

        assert_eq!(form.into_new_bill(), Err(Error::EmptyField("Line description")));
    }
}

#[cfg(test)]
mod new_bill_page_tests {
    use axum::{Extension, extract::State};

    use crate::{
        bill::get_new_bill_page,
        contact::{ContactKind, create_contact},
        endpoints,
        test_utils::{
            TestBooks, assert_hx_endpoint, assert_valid_html, must_get_form, parse_html_document,
            select_texts,
        },
    };

    #[tokio::test]
    async fn offers_vendors_and_expenses_before_assets() {
        let books = TestBooks::standard();
        let org = books.organization_id();
        create_contact(org, "Acme", None, ContactKind::Customer, &books.connection).unwrap();
        create_contact(org, "Paper Co", None, ContactKind::Vendor, &books.connection).unwrap();
        let (state, tenant) = books.db_state();

        let response = get_new_bill_page(State(state), Extension(tenant)).await.unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::BILLS_API, "hx-post");
        assert_eq!(select_texts(&document, "#vendor_id option"), ["Paper Co"]);
        let options = select_texts(&document, "tbody#lines tr:first-child option");
        assert_eq!(options.first().map(String::as_str), Some("6000 Operating Expenses"));
        assert!(options.contains(&"1500 Equipment".to_owned()));
        assert!(!options.contains(&"4000 Sales".to_owned()));
    }
}

#[cfg(test)]
mod create_bill_endpoint_tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use time::macros::date;

    use crate::{
        bill::{BillStatus, bill_form::BillForm, create_bill_endpoint, list_bills},
        contact::{ContactKind, create_contact},
        endpoints::{self, format_endpoint},
        money::Money,
        test_utils::{TestBooks, account_by_code, assert_hx_redirect},
    };

    #[tokio::test]
    async fn creates_draft_and_redirects() {
        let books = TestBooks::standard();
        let vendor = create_contact(
            books.organization_id(),
            "Paper Co",
            None,
            ContactKind::Vendor,
            &books.connection,
        )
        .unwrap();
        let supplies = account_by_code(&books, "6400");
        let (state, tenant) = books.db_state();

        let response = create_bill_endpoint(
            State(state.clone()),
            Extension(tenant),
            Form(BillForm {
                vendor_id: vendor.id,
                reference: "PC-1".to_owned(),
                bill_date: date!(2025 - 04 - 01),
                due_date: date!(2025 - 04 - 15),
                description: vec!["Paper".to_owned()],
                amount: vec!["45.50".to_owned()],
                account_id: vec![supplies.id.to_string()],
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let bills = list_bills(tenant.organization_id, &connection).unwrap();
        assert_eq!(bills.len(), 1);
        assert_eq!(bills[0].status, BillStatus::Draft);
        assert_eq!(bills[0].total, Money::from_cents(4550));
        assert_hx_redirect(&response, &format_endpoint(endpoints::BILL_VIEW, bills[0].id));
    }
}
