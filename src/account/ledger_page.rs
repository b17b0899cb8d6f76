//! The account ledger: every line posted to one account with a running balance.

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    account::{Account, AccountId, get_account},
    app_state::DbState,
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_NUMBER_CELL_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, format_currency,
        format_date, page_header,
    },
    ledger::{AccountActivity, account_activity},
    money::Money,
    navigation::NavBar,
    organization::Tenant,
};

struct LedgerRow {
    activity: AccountActivity,
    /// The balance after this line in the account's normal-balance sign.
    balance: Money,
}

fn with_running_balance(account: &Account, activity: Vec<AccountActivity>) -> Vec<LedgerRow> {
    let mut signed_balance = Money::ZERO;

    activity
        .into_iter()
        .map(|activity| {
            signed_balance += activity.debit - activity.credit;

            LedgerRow {
                activity,
                balance: account.kind.normal_balance(signed_balance),
            }
        })
        .collect()
}

fn ledger_view(account: &Account, rows: &[LedgerRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNT_LEDGER_VIEW).into_html();
    let title = format!("{} {}", account.code, account.name);
    let closing_balance = rows.last().map(|row| row.balance).unwrap_or_default();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl space-y-4"
            {
                (page_header(&title, Some((endpoints::ACCOUNTS_VIEW, "Back to accounts"))))

                p class="text-sm"
                {
                    (account.kind) " account, normal balance "
                    @if account.kind.is_debit_normal() { "debit" } @else { "credit" }
                    @if account.archived { " (archived)" }
                }

                div class="overflow-x-auto rounded shadow"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Entry" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Memo" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Debit" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Credit" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Balance" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                @let activity = &row.activity;
                                tr class=(TABLE_ROW_STYLE) data-ledger-row
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        time datetime=(format_date(activity.date)) { (format_date(activity.date)) }
                                    }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a
                                            href=(format_endpoint(endpoints::JOURNAL_ENTRY_VIEW, activity.entry_id))
                                            class=(LINK_STYLE)
                                        {
                                            (activity.number)
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        (activity.memo)
                                        @if !activity.description.is_empty() {
                                            span class="block text-xs" { (activity.description) }
                                        }
                                    }
                                    td class=(TABLE_NUMBER_CELL_STYLE)
                                    {
                                        @if activity.debit.is_positive() { (format_currency(activity.debit)) }
                                    }
                                    td class=(TABLE_NUMBER_CELL_STYLE)
                                    {
                                        @if activity.credit.is_positive() { (format_currency(activity.credit)) }
                                    }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(row.balance)) }
                                }
                            }

                            @if rows.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="6" class="px-6 py-4 text-center"
                                    {
                                        "Nothing has been posted to this account."
                                    }
                                }
                            }
                        }

                        tfoot
                        {
                            tr class="font-semibold text-gray-900 dark:text-white"
                            {
                                th scope="row" colspan="5" class=(TABLE_CELL_STYLE) { "Closing balance" }
                                td class=(TABLE_NUMBER_CELL_STYLE) data-closing-balance
                                {
                                    (format_currency(closing_balance))
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base(&title, &[], &content)
}

/// Display the lines posted to an account, oldest first.
pub async fn get_account_ledger_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account = get_account(tenant.organization_id, account_id, &connection)?;
    let activity = account_activity(tenant.organization_id, account_id, &connection)?;
    let rows = with_running_balance(&account, activity);

    Ok(ledger_view(&account, &rows).into_response())
}

#[cfg(test)]
mod account_ledger_page_tests {
    use axum::{
        Extension,
        extract::{Path, State},
    };
    use time::macros::date;

    use crate::{
        account::get_account_ledger_page,
        ledger::{EntrySource, NewJournalEntry, post_entry},
        money::Money,
        test_utils::{
            TestBooks, account_by_code, assert_valid_html, parse_html_document, select_texts,
        },
    };

    #[tokio::test]
    async fn shows_running_balance_in_normal_sign() {
        let books = TestBooks::standard();
        let bank = account_by_code(&books, "1020");
        let sales = account_by_code(&books, "4000");
        let rent = account_by_code(&books, "6100");
        let sale = NewJournalEntry::new(date!(2025 - 06 - 01), "Sale", EntrySource::Manual)
            .debit(bank.id, Money::from_dollars(500), "")
            .credit(sales.id, Money::from_dollars(500), "");
        let rent_payment = NewJournalEntry::new(date!(2025 - 06 - 02), "Rent", EntrySource::Manual)
            .debit(rent.id, Money::from_dollars(200), "")
            .credit(bank.id, Money::from_dollars(200), "");
        post_entry(books.tenant, sale, &books.connection).unwrap();
        post_entry(books.tenant, rent_payment, &books.connection).unwrap();
        let (state, tenant) = books.db_state();

        let bank_response = get_account_ledger_page(State(state.clone()), Extension(tenant), Path(bank.id))
            .await
            .unwrap();
        let sales_response = get_account_ledger_page(State(state), Extension(tenant), Path(sales.id))
            .await
            .unwrap();

        let bank_page = parse_html_document(bank_response).await;
        assert_valid_html(&bank_page);
        assert_eq!(
            select_texts(&bank_page, "[data-ledger-row] td:nth-child(6)"),
            ["$500.00", "$300.00"]
        );
        let sales_page = parse_html_document(sales_response).await;
        assert_eq!(
            select_texts(&sales_page, "[data-closing-balance]"),
            ["$500.00"]
        );
    }
}
