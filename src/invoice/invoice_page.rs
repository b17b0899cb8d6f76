//! A single invoice with its payments and the actions that move it through its life.

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
    document::format_tax_rate,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE,
        FORM_TEXT_INPUT_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_NUMBER_CELL_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, amount_input,
        base, format_currency, format_date, page_header,
    },
    invoice::{
        Invoice, InvoiceId, InvoicePayment, InvoiceStatus, get_invoice, invoices_page::invoice_status_badge,
        issue_invoice, list_invoice_payments, record_invoice_payment, void_invoice,
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

fn action_buttons(invoice: &Invoice) -> Markup {
    let can_void = matches!(invoice.status, InvoiceStatus::Draft | InvoiceStatus::Issued);

    html! {
        div class="flex gap-4"
        {
            @if invoice.status == InvoiceStatus::Draft {
                button
                    hx-post=(format_endpoint(endpoints::ISSUE_INVOICE_API, invoice.id))
                    hx-target-error="#alert-container"
                    hx-confirm="Issue this invoice and post it to the ledger?"
                    class="px-4 py-2 bg-blue-500 dark:bg-blue-600 hover:enabled:bg-blue-600 \
                        hover:enabled:dark:bg-blue-700 text-white rounded"
                    data-issue-button
                {
                    "Issue invoice"
                }
            }

            @if can_void {
                button
                    hx-post=(format_endpoint(endpoints::VOID_INVOICE_API, invoice.id))
                    hx-target-error="#alert-container"
                    hx-confirm="Void this invoice? Any posted entry will be reversed."
                    class=(BUTTON_DELETE_STYLE)
                    data-void-button
                {
                    "Void invoice"
                }
            }
        }
    }
}

fn payment_form(invoice: &Invoice, deposit_accounts: &[Account], today: Date) -> Markup {
    html! {
        section class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-lg font-semibold self-start" { "Record a payment" }

            form
                hx-post=(format_endpoint(endpoints::INVOICE_PAYMENTS_API, invoice.id))
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                (amount_input("Amount", "amount", &invoice.outstanding().to_string()))

                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "Date received" }

                    input
                        type="date"
                        name="date"
                        id="date"
                        value=(format_date(today.max(invoice.issue_date)))
                        min=(format_date(invoice.issue_date))
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="account_id" class=(FORM_LABEL_STYLE) { "Deposit to" }

                    select name="account_id" id="account_id" required class=(FORM_TEXT_INPUT_STYLE)
                    {
                        @for account in deposit_accounts {
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

fn payments_table(payments: &[InvoicePayment], accounts: &HashMap<AccountId, Account>) -> Markup {
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
                            th scope="col" class=(TABLE_CELL_STYLE) { "Deposited to" }
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

fn invoice_view(
    invoice: &Invoice,
    payments: &[InvoicePayment],
    accounts: &HashMap<AccountId, Account>,
    today: Date,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::INVOICE_VIEW).into_html();
    let title = format!("Invoice {}", invoice.number);
    let mut deposit_accounts: Vec<Account> = accounts
        .values()
        .filter(|account| {
            account.kind == AccountKind::Asset
                && !account.archived
                && account.role != Some(AccountRole::AccountsReceivable)
        })
        .cloned()
        .collect();
    deposit_accounts.sort_by(|a, b| a.code.cmp(&b.code));

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-6"
            {
                (page_header(&title, Some((endpoints::INVOICES_VIEW, "Back to invoices"))))

                dl class="grid grid-cols-2 gap-x-6 gap-y-2 text-sm md:grid-cols-4"
                {
                    dt class="font-semibold" { "Customer" }
                    dd data-customer { (invoice.customer_name) }
                    dt class="font-semibold" { "Status" }
                    dd data-status { (invoice_status_badge(invoice, today)) }
                    dt class="font-semibold" { "Issued" }
                    dd { (format_date(invoice.issue_date)) }
                    dt class="font-semibold" { "Due" }
                    dd { (format_date(invoice.due_date)) }

                    @if let Some(entry_id) = invoice.journal_entry_id {
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
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Quantity" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Unit price" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for line in &invoice.lines {
                                tr class=(TABLE_ROW_STYLE) data-line-row
                                {
                                    td class=(TABLE_CELL_STYLE) { (line.description) }
                                    td class=(TABLE_CELL_STYLE) { (account_name(accounts, line.account_id)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (line.quantity) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(line.unit_price)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(line.amount)) }
                                }
                            }
                        }

                        tfoot class="text-gray-900 dark:text-white"
                        {
                            tr
                            {
                                th scope="row" colspan="4" class=(TABLE_NUMBER_CELL_STYLE) { "Subtotal" }
                                td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(invoice.totals.subtotal)) }
                            }
                            tr
                            {
                                th scope="row" colspan="4" class=(TABLE_NUMBER_CELL_STYLE)
                                {
                                    "Tax (" (format_tax_rate(invoice.tax_rate_bps)) ")"
                                }
                                td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(invoice.totals.tax)) }
                            }
                            tr class="font-semibold"
                            {
                                th scope="row" colspan="4" class=(TABLE_NUMBER_CELL_STYLE) { "Total" }
                                td class=(TABLE_NUMBER_CELL_STYLE) data-total { (format_currency(invoice.totals.total)) }
                            }
                            tr
                            {
                                th scope="row" colspan="4" class=(TABLE_NUMBER_CELL_STYLE) { "Paid" }
                                td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(invoice.amount_paid)) }
                            }
                            tr class="font-semibold"
                            {
                                th scope="row" colspan="4" class=(TABLE_NUMBER_CELL_STYLE) { "Outstanding" }
                                td class=(TABLE_NUMBER_CELL_STYLE) data-outstanding { (format_currency(invoice.outstanding())) }
                            }
                        }
                    }
                }

                (action_buttons(invoice))

                @if invoice.status != InvoiceStatus::Draft {
                    (payments_table(payments, accounts))
                }

                @if invoice.status.is_open() {
                    (payment_form(invoice, &deposit_accounts, today))
                }
            }
        }
    };

    base(&title, &[], &content)
}

/// Display an invoice with its lines, payments and available actions.
pub async fn get_invoice_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(invoice_id): Path<InvoiceId>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let organization_id = tenant.organization_id;
    let invoice = get_invoice(organization_id, invoice_id, &connection)?;
    let payments = list_invoice_payments(organization_id, invoice_id, &connection)?;
    let accounts: HashMap<AccountId, Account> = list_accounts(organization_id, &connection)?
        .into_iter()
        .map(|account| (account.id, account))
        .collect();

    Ok(invoice_view(&invoice, &payments, &accounts, today).into_response())
}

fn redirect_to_invoice(invoice_id: InvoiceId) -> Response {
    (
        HxRedirect(format_endpoint(endpoints::INVOICE_VIEW, invoice_id)),
        StatusCode::SEE_OTHER,
    )
        .into_response()
}

/// Issue a draft invoice.
pub async fn issue_invoice_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(invoice_id): Path<InvoiceId>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match issue_invoice(tenant, invoice_id, &connection) {
        Ok(invoice) => redirect_to_invoice(invoice.id),
        Err(error) => error.into_alert_response(),
    }
}

/// Void an invoice, reversing its entry on today's date.
pub async fn void_invoice_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(invoice_id): Path<InvoiceId>,
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

    match void_invoice(tenant, invoice_id, today, &connection) {
        Ok(invoice) => redirect_to_invoice(invoice.id),
        Err(error) => error.into_alert_response(),
    }
}

#[derive(Debug, Deserialize)]
pub struct PaymentForm {
    pub amount: String,
    pub date: Date,
    pub account_id: AccountId,
}

/// Record a payment received against an invoice.
pub async fn record_invoice_payment_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(invoice_id): Path<InvoiceId>,
    Form(form): Form<PaymentForm>,
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

    match record_invoice_payment(
        tenant,
        invoice_id,
        amount,
        form.date,
        form.account_id,
        &connection,
    ) {
        Ok(payment) => redirect_to_invoice(payment.invoice_id),
        Err(error) => error.into_alert_response(),
    }
}
