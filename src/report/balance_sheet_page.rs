use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    app_state::DbState,
    endpoints,
    html::{BADGE_DANGER_COLOUR, PAGE_CONTAINER_STYLE, badge, base, format_currency, page_header},
    navigation::NavBar,
    organization::Tenant,
    report::{
        BalanceSheet, ReportQuery, balance_sheet,
        filters::{as_of_filter, report_tabs},
        sections::statement_section,
    },
    timezone::local_today,
};

fn balance_sheet_view(sheet: &BalanceSheet) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();
    let liabilities_and_equity = sheet.total_liabilities + sheet.total_equity;

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-4"
            {
                (page_header("Balance sheet", None))
                (report_tabs(endpoints::BALANCE_SHEET_VIEW))
                (as_of_filter(endpoints::BALANCE_SHEET_VIEW, sheet.as_of))

                @if !sheet.is_balanced() {
                    p data-unbalanced
                    {
                        (badge("Assets do not equal liabilities plus equity", BADGE_DANGER_COLOUR))
                    }
                }

                (statement_section("Assets", "assets", &sheet.assets, &[], sheet.total_assets))
                (statement_section("Liabilities", "liabilities", &sheet.liabilities, &[], sheet.total_liabilities))
                (statement_section(
                    "Equity",
                    "equity",
                    &sheet.equity,
                    &[("Retained earnings", sheet.retained_earnings)],
                    sheet.total_equity,
                ))

                p class="flex justify-between px-6 py-4 rounded shadow font-semibold"
                {
                    span { "Total liabilities and equity" }
                    span data-liabilities-and-equity { (format_currency(liabilities_and_equity)) }
                }
            }
        }
    };

    base("Balance sheet", &[], &content)
}

/// Display assets, liabilities and equity as of the `as_of` query parameter, by default today.
pub async fn get_balance_sheet_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let as_of = query.as_of_or(local_today(&state.local_timezone)?);
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let sheet = balance_sheet(tenant.organization_id, as_of, &connection)?;

    Ok(balance_sheet_view(&sheet).into_response())
}

#[cfg(test)]
mod balance_sheet_page_tests {
    use axum::{
        Extension,
        extract::{Query, State},
    };
    use time::macros::date;

    use crate::{
        report::{
            ReportQuery, get_balance_sheet_page, test_reports::issued_invoice_and_approved_bill,
        },
        test_utils::{TestBooks, assert_valid_html, parse_html_document, select_texts},
    };

    #[tokio::test]
    async fn shows_balanced_sheet_with_retained_earnings() {
        let books = TestBooks::standard();
        issued_invoice_and_approved_bill(&books);
        let (state, tenant) = books.db_state();

        let response = get_balance_sheet_page(
            State(state),
            Extension(tenant),
            Query(ReportQuery {
                as_of: Some(date!(2025 - 12 - 31)),
                ..ReportQuery::default()
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert!(select_texts(&document, "[data-unbalanced]").is_empty());
        assert_eq!(
            select_texts(&document, "[data-section-total]"),
            ["$287.50", "$1,157.50", "-$870.00"]
        );
        assert_eq!(
            select_texts(&document, "[data-section=equity] [data-extra-row] td:last-child"),
            ["-$870.00"]
        );
        assert_eq!(select_texts(&document, "[data-liabilities-and-equity]"), ["$287.50"]);
    }
}
