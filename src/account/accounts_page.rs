//! Displays the chart of accounts and each account's balance.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    account::{Account, account_balances, account_depths, list_accounts, sort_as_tree},
    app_state::DbState,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_STYLE, BUTTON_SECONDARY_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_NUMBER_CELL_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base,
        edit_delete_action_links, format_currency, page_header,
    },
    money::Money,
    navigation::NavBar,
    organization::Tenant,
    timezone::local_today,
};

/// An account with the data the accounts table displays.
#[derive(Debug, PartialEq)]
struct AccountTableRow {
    account: Account,
    depth: usize,
    /// The balance in the account's normal-balance sign.
    balance: Money,
}

fn archive_button(account: &Account) -> Markup {
    let (label, archived) = if account.archived {
        ("Restore", "false")
    } else {
        ("Archive", "true")
    };

    html! {
        button
            hx-post=(format_endpoint(endpoints::ARCHIVE_ACCOUNT_API, account.id))
            hx-vals={"{\"archived\": \"" (archived) "\"}"}
            hx-target-error="#alert-container"
            class=(BUTTON_SECONDARY_STYLE)
        {
            (label)
        }
    }
}

fn table_row(row: &AccountTableRow) -> Markup {
    let account = &row.account;
    let indent = format!("padding-left: {}rem", row.depth as f32 * 1.5);
    let action_links = edit_delete_action_links(
        &format_endpoint(endpoints::EDIT_ACCOUNT_VIEW, account.id),
        &format_endpoint(endpoints::ACCOUNT_API, account.id),
        &format!(
            "Are you sure you want to delete the account '{} {}'? This cannot be undone.",
            account.code, account.name
        ),
        "closest tr",
        "delete",
    );

    html! {
        tr class=(TABLE_ROW_STYLE) data-account-row data-archived[account.archived]
        {
            td class=(TABLE_CELL_STYLE) { (account.code) }
            th
                scope="row"
                class="px-6 py-4 font-medium text-gray-900 whitespace-nowrap dark:text-white"
                style=(indent)
            {
                a href=(format_endpoint(endpoints::ACCOUNT_LEDGER_VIEW, account.id)) class=(LINK_STYLE)
                {
                    (account.name)
                }

                @if account.archived {
                    " "
                    span class={(BADGE_STYLE) " bg-gray-100 text-gray-800 dark:bg-gray-700 dark:text-gray-300"}
                    {
                        "Archived"
                    }
                }
            }
            td class=(TABLE_CELL_STYLE) { (account.kind) }
            td class=(TABLE_CELL_STYLE)
            {
                @if let Some(role) = account.role { (role) }
            }
            td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(row.balance)) }
            td class=(TABLE_CELL_STYLE)
            {
                div class="flex gap-4 items-center"
                {
                    (action_links)
                    (archive_button(account))
                }
            }
        }
    }
}

fn accounts_view(rows: &[AccountTableRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::ACCOUNTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-6xl space-y-4"
            {
                (page_header("Chart of Accounts", Some((endpoints::NEW_ACCOUNT_VIEW, "Add account"))))

                div class="overflow-x-auto rounded shadow"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Code" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Type" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Role" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Balance" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Actions" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                (table_row(row))
                            }
                        }
                    }
                }
            }
        }
    };

    base("Accounts", &[], &content)
}

/// Display the chart of accounts as a tree with current balances.
pub async fn get_accounts_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts = list_accounts(tenant.organization_id, &connection)?;
    let balances = account_balances(tenant.organization_id, today, &connection)?;
    let depths = account_depths(&accounts);

    let rows: Vec<AccountTableRow> = sort_as_tree(accounts)
        .into_iter()
        .map(|account| {
            let signed_balance = balances.get(&account.id).copied().unwrap_or_default();

            AccountTableRow {
                depth: depths.get(&account.id).copied().unwrap_or_default(),
                balance: account.kind.normal_balance(signed_balance),
                account,
            }
        })
        .collect();

    Ok(accounts_view(&rows).into_response())
}

#[cfg(test)]
mod accounts_page_tests {
    use axum::{Extension, extract::State};
    use time::OffsetDateTime;

    use crate::{
        account::get_accounts_page,
        ledger::{EntrySource, NewJournalEntry, post_entry},
        money::Money,
        test_utils::{
            TestBooks, account_by_code, assert_valid_html, parse_html_document, select_texts,
        },
    };

    #[tokio::test]
    async fn shows_balances_in_normal_sign() {
        let books = TestBooks::standard();
        let bank = account_by_code(&books, "1020");
        let sales = account_by_code(&books, "4000");
        let today = OffsetDateTime::now_utc().date();
        let entry = NewJournalEntry::new(today, "Consulting", EntrySource::Manual)
            .debit(bank.id, Money::from_cents(25_000), "")
            .credit(sales.id, Money::from_cents(25_000), "");
        post_entry(books.tenant, entry, &books.connection).unwrap();
        let (state, tenant) = books.db_state();

        let response = get_accounts_page(State(state), Extension(tenant))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let codes = select_texts(&document, "[data-account-row] td:first-child");
        let balances = select_texts(&document, "[data-account-row] td:nth-child(5)");
        let balance_of = |code: &str| {
            let index = codes.iter().position(|c| c == code).unwrap();
            balances[index].clone()
        };
        assert_eq!(balance_of("1020"), "$250.00");
        assert_eq!(balance_of("4000"), "$250.00");
        assert_eq!(balance_of("6100"), "$0.00");
    }

    #[tokio::test]
    async fn children_follow_their_parent() {
        let (state, tenant) = TestBooks::standard().db_state();

        let response = get_accounts_page(State(state), Extension(tenant))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        let codes = select_texts(&document, "[data-account-row] td:first-child");
        assert_eq!(&codes[..4], ["1000", "1010", "1020", "1100"]);
    }
}
