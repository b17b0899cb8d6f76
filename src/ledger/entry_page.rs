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
    account::{Account, AccountId, list_accounts},
    app_state::DbState,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_NUMBER_CELL_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, format_currency,
        format_date, page_header,
    },
    ledger::{
        EntrySource, JournalEntry, JournalEntryId, get_entry, journal_page::status_badge,
        reverse_entry,
    },
    money::Money,
    navigation::NavBar,
    organization::Tenant,
    timezone::local_today,
};

/// The page showing the document that created an entry, if there is one.
fn source_url(entry: &JournalEntry) -> Option<String> {
    let source_id = entry.source_id?;
    let endpoint = match entry.source {
        EntrySource::Invoice | EntrySource::InvoicePayment => endpoints::INVOICE_VIEW,
        EntrySource::Bill | EntrySource::BillPayment => endpoints::BILL_VIEW,
        EntrySource::Sale => endpoints::SALE_VIEW,
        EntrySource::StockAdjustment => endpoints::PRODUCT_VIEW,
        EntrySource::Manual | EntrySource::Reversal => return None,
    };

    Some(format_endpoint(endpoint, source_id))
}

fn entry_link(entry: Option<&JournalEntry>) -> Markup {
    html! {
        @if let Some(entry) = entry {
            a href=(format_endpoint(endpoints::JOURNAL_ENTRY_VIEW, entry.id)) class=(LINK_STYLE)
            {
                (entry.number)
            }
        }
    }
}

fn reverse_form(entry: &JournalEntry, today: Date) -> Markup {
    let default_date = entry.date.max(today);

    html! {
        section class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-lg font-semibold self-start" { "Reverse this entry" }

            form
                hx-post=(format_endpoint(endpoints::REVERSE_ENTRY_API, entry.id))
                hx-target-error="#alert-container"
                hx-confirm="Post an entry that cancels this one?"
                class="w-full space-y-4"
            {
                div
                {
                    label for="date" class=(FORM_LABEL_STYLE) { "Reversal date" }

                    input
                        type="date"
                        name="date"
                        id="date"
                        value=(format_date(default_date))
                        min=(format_date(entry.date))
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                div
                {
                    label for="memo" class=(FORM_LABEL_STYLE) { "Memo" }

                    input
                        type="text"
                        name="memo"
                        id="memo"
                        placeholder={"Reversal of " (entry.number)}
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                button type="submit" class=(BUTTON_DELETE_STYLE) { "Reverse entry" }
            }
        }
    }
}

struct EntryPage<'a> {
    entry: &'a JournalEntry,
    accounts: &'a HashMap<AccountId, Account>,
    reverses: Option<&'a JournalEntry>,
    reversed_by: Option<&'a JournalEntry>,
    today: Date,
}

fn entry_view(page: EntryPage<'_>) -> Markup {
    let EntryPage {
        entry,
        accounts,
        reverses,
        reversed_by,
        today,
    } = page;
    let nav_bar = NavBar::new(endpoints::JOURNAL_ENTRY_VIEW).into_html();
    let title = format!("Journal Entry {}", entry.number);
    let debits: Money = entry.lines.iter().map(|line| line.debit).sum();
    let credits: Money = entry.lines.iter().map(|line| line.credit).sum();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-6"
            {
                (page_header(&title, Some((endpoints::JOURNAL_VIEW, "Back to journal"))))

                dl class="grid grid-cols-2 gap-x-6 gap-y-2 text-sm md:grid-cols-4"
                {
                    dt class="font-semibold" { "Date" }
                    dd { time datetime=(format_date(entry.date)) { (format_date(entry.date)) } }
                    dt class="font-semibold" { "Status" }
                    dd { (status_badge(entry.status)) }
                    dt class="font-semibold" { "Source" }
                    dd
                    {
                        @match source_url(entry) {
                            Some(url) => { a href=(url) class=(LINK_STYLE) { (entry.source) } }
                            None => { (entry.source) }
                        }
                    }
                    dt class="font-semibold" { "Memo" }
                    dd data-memo { (entry.memo) }

                    @if reverses.is_some() {
                        dt class="font-semibold" { "Reverses" }
                        dd data-reverses { (entry_link(reverses)) }
                    }

                    @if reversed_by.is_some() {
                        dt class="font-semibold" { "Reversed by" }
                        dd data-reversed-by { (entry_link(reversed_by)) }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Debit" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Credit" }
                            }
                        }

                        tbody
                        {
                            @for line in &entry.lines {
                                tr class=(TABLE_ROW_STYLE) data-line-row
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        @if let Some(account) = accounts.get(&line.account_id) {
                                            a
                                                href=(format_endpoint(endpoints::ACCOUNT_LEDGER_VIEW, account.id))
                                                class=(LINK_STYLE)
                                            {
                                                (account.code) " " (account.name)
                                            }
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (line.description) }
                                    td class=(TABLE_NUMBER_CELL_STYLE)
                                    {
                                        @if line.debit.is_positive() { (format_currency(line.debit)) }
                                    }
                                    td class=(TABLE_NUMBER_CELL_STYLE)
                                    {
                                        @if line.credit.is_positive() { (format_currency(line.credit)) }
                                    }
                                }
                            }
                        }

                        tfoot
                        {
                            tr class="font-semibold text-gray-900 dark:text-white"
                            {
                                th scope="row" colspan="2" class=(TABLE_CELL_STYLE) { "Total" }
                                td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(debits)) }
                                td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(credits)) }
                            }
                        }
                    }
                }

                @if entry.can_be_reversed() {
                    (reverse_form(entry, today))
                }
            }
        }
    };

    base(&title, &[], &content)
}

/// Display a journal entry with its lines.
pub async fn get_entry_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(entry_id): Path<JournalEntryId>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let organization_id = tenant.organization_id;
    let entry = get_entry(organization_id, entry_id, &connection)?;
    let reverses = entry
        .reverses
        .map(|id| get_entry(organization_id, id, &connection))
        .transpose()?;
    let reversed_by = entry
        .reversed_by
        .map(|id| get_entry(organization_id, id, &connection))
        .transpose()?;
    let accounts: HashMap<AccountId, Account> = list_accounts(organization_id, &connection)?
        .into_iter()
        .map(|account| (account.id, account))
        .collect();

    Ok(entry_view(EntryPage {
        entry: &entry,
        accounts: &accounts,
        reverses: reverses.as_ref(),
        reversed_by: reversed_by.as_ref(),
        today,
    })
    .into_response())
}

#[derive(Debug, Deserialize)]
pub struct ReverseForm {
    pub date: Date,
    #[serde(default)]
    pub memo: String,
}

/// Reverse a journal entry and redirect to the reversing entry.
pub async fn reverse_entry_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(entry_id): Path<JournalEntryId>,
    Form(form): Form<ReverseForm>,
) -> Response {
    let memo = Some(form.memo.trim()).filter(|memo| !memo.is_empty());

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match reverse_entry(tenant, entry_id, form.date, memo, &connection) {
        Ok(reversal) => {
            tracing::info!(
                "Reversed journal entry {entry_id} with {} in organization {}",
                reversal.number,
                tenant.organization_id
            );
            (
                HxRedirect(format_endpoint(endpoints::JOURNAL_ENTRY_VIEW, reversal.id)),
                StatusCode::SEE_OTHER,
            )
                .into_response()
        }
        Err(error) => error.into_alert_response(),
    }
}
