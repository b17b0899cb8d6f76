//! A single bill with its payments and the actions that move it through its life.

use std::collections::HashMap;

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::{Account, AccountId, AccountKind, AccountRole, list_accounts},
    app_state::DbState,
    bill::{
        Bill, BillId, BillPayment, BillStatus, approve_bill, bills_page::bill_status_badge,
        get_bill, list_bill_payments, record_bill_payment, void_bill,
    },
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_NUMBER_CELL_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, amount_input,
        base, format_currency, format_date, page_header,
    },
    money::Money,
    navigation::NavBar,
    organization::Tenant,
    timezone::local_today,
};

fn account_name(accounts: &HashMap<AccountId, Account>, account_id: AccountId) -> String {
    accounts
        .get(&account_id)
        .map(|account| format!("{} {}", account.code, account.name))
        .unwrap_or_default()
}

fn action_buttons(bill: &Bill) -> Markup {
    let can_void = matches!(bill.status, BillStatus::Draft | BillStatus::Approved);

    html! {
        div class="flex gap-4"
        {
            @if bill.status == BillStatus::Draft {
                button
                    hx-post=(format_endpoint(endpoints::APPROVE_BILL_API, bill.id))
                    hx-target-error="#alert-container"
                    hx-confirm="Approve this bill and post it to the ledger?"
                    class="px-4 py-2 bg-blue-500 dark:bg-blue-600 hover:enabled:bg-blue-600 \
                        hover:enabled:dark:bg-blue-700 text-white rounded"
                    data-approve-button
                {
                    "Approve bill"
                }
            }

            @if can_void {
                button
                    hx-post=(format_endpoint(endpoints::VOID_BILL_API, bill.id))
                    hx-target-error="#alert-container"
                    hx-confirm="Void this bill? Any posted entry will be reversed."
                    class=(BUTTON_DELETE_STYLE)
                    data-void-button
                {
                    "Void bill"
                }
            }
        }
    }
}

fn payment_form(bill: &Bill, payment_accounts: &[Account], today: Date) -> Markup {
    html! {
        section class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-lg font-semibold self-start" { "Pay this bill" }

            form
                hx-post=(format_endpoint(endpoints::BILL_PAYMENTS_API, bill.id))
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                (amount_input("Amount", "amount", &bill.outstanding().to_string()))

                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "Date paid" }

                    input
                        type="date"
                        name="date"
                        id="date"
                        value=(format_date(today.max(bill.bill_date)))
                        min=(format_date(bill.bill_date))
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="account_id" class=(FORM_LABEL_STYLE) { "Paid from" }

                    select name="account_id" id="account_id" required class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for account in payment_accounts {
                            option
                                value=(account.id)
                                selected[account.role == Some(AccountRole::Bank)]
                            {
                                (account.code) " " (account.name)
                            }
                        }
                    }
                }

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Record payment" }
            }
        }
    }
}

fn payments_table(payments: &[BillPayment], accounts: &HashMap<AccountId, Account>) -> Markup {
    html! {
        section class="space-y-2"
        {
            h2 class="text-lg font-semibold" { "Payments" }

            div class="overflow-x-auto rounded shadow"
            {
                table class=(TABLE_STYLE)
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Paid from" }
                            th scope="col" class=(TABLE_CELL_STYLE) { "Entry" }
                            th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Amount" }
                        }
                    }

                    tbody
                    {
                        @for payment in payments {
                            tr class=(TABLE_ROW_STYLE) data-payment-row
                            {
                                td class=(TABLE_CELL_STYLE) { (format_date(payment.date)) }
                                td class=(TABLE_CELL_STYLE) { (account_name(accounts, payment.account_id)) }
                                td class=(TABLE_CELL_STYLE)
                                {
                                    a
                                        href=(format_endpoint(endpoints::JOURNAL_ENTRY_VIEW, payment.journal_entry_id))
                                        class=(LINK_STYLE)
                                    {
                                        "View entry"
                                    }
                                }
                                td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(payment.amount)) }
                            }
                        }

                        @if payments.is_empty() {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td colspan="4" class="px-6 py-4 text-center" { "No payments recorded." }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn bill_view(
    bill: &Bill,
    payments: &[BillPayment],
    accounts: &HashMap<AccountId, Account>,
    today: Date,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::BILL_VIEW).into_html();
    let title = format!("Bill {}", bill.number);
    let mut payment_accounts: Vec<Account> = accounts
        .values()
        .filter(|account| account.kind == AccountKind::Asset && !account.archived)
        .cloned()
        .collect();
    payment_accounts.sort_by(|a, b| a.code.cmp(&b.code));

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-6"
            {
                (page_header(&title, Some((endpoints::BILLS_VIEW, "Back to bills"))))

                dl class="grid grid-cols-2 gap-x-6 gap-y-2 text-sm md:grid-cols-4"
                {
                    dt class="font-semibold" { "Vendor" }
                    dd data-vendor { (bill.vendor_name) }
                    dt class="font-semibold" { "Status" }
                    dd data-status { (bill_status_badge(bill, today)) }
                    dt class="font-semibold" { "Bill date" }
                    dd { (format_date(bill.bill_date)) }
                    dt class="font-semibold" { "Due" }
                    dd { (format_date(bill.due_date)) }

                    @if !bill.reference.is_empty() {
                        dt class="font-semibold" { "Reference" }
                        dd data-reference { (bill.reference) }
                    }

                    @if let Some(entry_id) = bill.journal_entry_id {
                        dt class="font-semibold" { "Journal entry" }
                        dd
                        {
                            a href=(format_endpoint(endpoints::JOURNAL_ENTRY_VIEW, entry_id)) class=(LINK_STYLE)
                            {
                                "View entry"
                            }
                        }
                    }
                }

                div class="overflow-x-auto rounded shadow"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for line in &bill.lines {
                                tr class=(TABLE_ROW_STYLE) data-line-row
                                {
                                    td class=(TABLE_CELL_STYLE) { (line.description) }
                                    td class=(TABLE_CELL_STYLE) { (account_name(accounts, line.account_id)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(line.amount)) }
                                }
                            }
                        }

                        tfoot class="text-gray-900 dark:text-white"
                        {
                            tr class="font-semibold"
                            {
                                th scope="row" colspan="2" class=(TABLE_NUMBER_CELL_STYLE) { "Total" }
                                td class=(TABLE_NUMBER_CELL_STYLE) data-total { (format_currency(bill.total)) }
                            }
                            tr
                            {
                                th scope="row" colspan="2" class=(TABLE_NUMBER_CELL_STYLE) { "Paid" }
                                td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(bill.amount_paid)) }
                            }
                            tr class="font-semibold"
                            {
                                th scope="row" colspan="2" class=(TABLE_NUMBER_CELL_STYLE) { "Outstanding" }
                                td class=(TABLE_NUMBER_CELL_STYLE) data-outstanding { (format_currency(bill.outstanding())) }
                            }
                        }
                    }
                }

                (action_buttons(bill))

                @if bill.status != BillStatus::Draft {
                    (payments_table(payments, accounts))
                }

                @if bill.status.is_open() {
                    (payment_form(bill, &payment_accounts, today))
                }
            }
        }
    };

    base(&title, &[], &content)
}

/// Display a bill with its lines, payments and available actions.
pub async fn get_bill_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(bill_id): Path<BillId>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let organization_id = tenant.organization_id;
    let bill = get_bill(organization_id, bill_id, &connection)?;
    let payments = list_bill_payments(organization_id, bill_id, &connection)?;
    let accounts: HashMap<AccountId, Account> = list_accounts(organization_id, &connection)?
        .into_iter()
        .map(|account| (account.id, account))
        .collect();

    Ok(bill_view(&bill, &payments, &accounts, today).into_response())
}

fn redirect_to_bill(bill_id: BillId) -> Response {
    (
        HxRedirect(format_endpoint(endpoints::BILL_VIEW, bill_id)),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Approve a draft bill.
pub async fn approve_bill_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(bill_id): Path<BillId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match approve_bill(tenant, bill_id, &connection) {
        Ok(bill) => redirect_to_bill(bill.id),
        Err(error) => error.into_alert_response(),
    }
}

/// Void a bill, reversing its entry on today's date.
pub async fn void_bill_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(bill_id): Path<BillId>,
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

    match void_bill(tenant, bill_id, today, &connection) {
        Ok(bill) => redirect_to_bill(bill.id),
        Err(error) => error.into_alert_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct BillPaymentForm {
    pub amount: String,
    pub date: Date,
    pub account_id: AccountId,
}

/// Record a payment made against a bill.
pub async fn record_bill_payment_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(bill_id): Path<BillId>,
    Form(form): Form<BillPaymentForm>,
) -> Response {
    let amount: Money = match form.amount.parse() {
        Ok(amount) => amount,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match record_bill_payment(tenant, bill_id, amount, form.date, form.account_id, &connection) {
        Ok(payment) => redirect_to_bill(payment.bill_id),
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod bill_page_tests {
    use axum::{
        Extension,
        extract::{Path, State},
    };

    use crate::{
        Error,
        bill::{approve_bill, get_bill_page, test_bills::draft_bill},
        test_utils::{TestBooks, assert_valid_html, parse_html_document, select_texts},
    };

    #[tokio::test]
    async fn draft_shows_approve_and_lines() {
        let books = TestBooks::standard();
        let bill = draft_bill(&books);
        let (state, tenant) = books.db_state();

        let response = get_bill_page(State(state), Extension(tenant), Path(bill.id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(select_texts(&document, "[data-approve-button]").len(), 1);
        assert_eq!(select_texts(&document, "[data-reference]"), ["L-778"]);
        assert_eq!(
            select_texts(&document, "[data-line-row] td:nth-child(2)"),
            ["6100 Rent", "6200 Utilities"]
        );
        assert!(select_texts(&document, "form").is_empty());
    }

    #[tokio::test]
    async fn approved_shows_payment_form_from_bank() {
        let books = TestBooks::standard();
        let bill = draft_bill(&books);
        approve_bill(books.tenant, bill.id, &books.connection).unwrap();
        let (state, tenant) = books.db_state();

        let response = get_bill_page(State(state), Extension(tenant), Path(bill.id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert!(select_texts(&document, "[data-approve-button]").is_empty());
        assert_eq!(
            select_texts(&document, "#account_id option[selected]"),
            ["1020 Bank Account"]
        );
        assert_eq!(select_texts(&document, "[data-outstanding]"), ["$1,120.00"]);
    }

    #[tokio::test]
    async fn other_organization_gets_not_found() {
        let books = TestBooks::standard();
        let bill = draft_bill(&books);
        let other = books.other_tenant();
        let (state, _) = books.db_state();

        let got = get_bill_page(State(state), Extension(other), Path(bill.id)).await;

        assert_eq!(got.err(), Some(Error::NotFound));
    }
}
