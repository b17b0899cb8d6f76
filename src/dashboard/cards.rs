//! Summary cards for the dashboard: cash, receivables, payables and profit.

use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    account::{AccountRole, account_balances, list_accounts},
    bill::list_bills,
    endpoints,
    html::{LINK_STYLE, format_currency},
    invoice::list_invoices,
    money::Money,
    organization::OrganizationId,
    report::{income_statement, start_of_year},
};

#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct SummaryCards {
    /// The balance of the cash, bank and card clearing accounts.
    pub cash_on_hand: Money,
    pub receivables: Money,
    pub overdue_invoices: usize,
    pub payables: Money,
    pub net_income_ytd: Money,
}

pub(super) fn summary_cards(
    organization_id: OrganizationId,
    today: Date,
    connection: &Connection,
) -> Result<SummaryCards, Error> {
    let balances = account_balances(organization_id, today, connection)?;
    let cash_on_hand = list_accounts(organization_id, connection)?
        .iter()
        .filter(|account| {
            matches!(
                account.role,
                Some(AccountRole::Cash | AccountRole::Bank | AccountRole::CardClearing)
            )
        })
        .filter_map(|account| {
            balances
                .get(&account.id)
                .map(|&balance| account.kind.normal_balance(balance))
        })
        .sum();

    let invoices = list_invoices(organization_id, connection)?;
    let receivables = invoices.iter().map(|invoice| invoice.outstanding()).sum();
    let overdue_invoices = invoices
        .iter()
        .filter(|invoice| invoice.is_overdue(today))
        .count();
    let payables = list_bills(organization_id, connection)?
        .iter()
        .map(|bill| bill.outstanding())
        .sum();
    let net_income_ytd =
        income_statement(organization_id, start_of_year(today), today, connection)?.net_income();

    Ok(SummaryCards {
        cash_on_hand,
        receivables,
        overdue_invoices,
        payables,
        net_income_ytd,
    })
}

fn card(name: &str, title: &str, amount: Money, footer: Markup) -> Markup {
    html! {
        div
            class="bg-white dark:bg-gray-800 border border-gray-200
                   dark:border-gray-700 rounded-lg p-4 shadow-md
                   flex flex-col justify-between min-h-[140px]"
            data-card=(name)
        {
            div {
                h4 class="text-lg font-semibold mb-3" { (title) }

                div class="text-3xl font-bold mb-1" data-card-amount {
                    (format_currency(amount))
                }
            }

            div class="mt-3 text-sm text-gray-600 dark:text-gray-400" {
                (footer)
            }
        }
    }
}

pub(super) fn cards_view(cards: &SummaryCards) -> Markup {
    let net_income_colour = if cards.net_income_ytd.is_negative() {
        "text-red-600 dark:text-red-400"
    } else {
        "text-green-600 dark:text-green-400"
    };

    html! {
        section class="w-full mx-auto mb-8" {
            div class="grid grid-cols-1 sm:grid-cols-2 lg:grid-cols-4 gap-4" {
                (card("cash", "Cash on hand", cards.cash_on_hand, html! {
                    "Cash, bank and card clearing"
                }))

                (card("receivables", "Owed to you", cards.receivables, html! {
                    @if cards.overdue_invoices > 0 {
                        span class="font-medium text-red-600 dark:text-red-400" data-overdue-count {
                            (cards.overdue_invoices) " overdue"
                        }
                        " · "
                    }
                    a href=(endpoints::INVOICES_VIEW) class=(LINK_STYLE) { "Invoices" }
                }))

                (card("payables", "You owe", cards.payables, html! {
                    a href=(endpoints::BILLS_VIEW) class=(LINK_STYLE) { "Bills" }
                }))

                (card("net-income", "Net income this year", cards.net_income_ytd, html! {
                    span class=(net_income_colour) {
                        @if cards.net_income_ytd.is_negative() { "Loss" } @else { "Profit" }
                    }
                    " · "
                    a href=(endpoints::INCOME_STATEMENT_VIEW) class=(LINK_STYLE) { "Income statement" }
                }))
            }
        }
    }
}
