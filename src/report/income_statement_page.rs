use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::Date;

use crate::{
    Error,
    app_state::DbState,
    endpoints,
    html::{PAGE_CONTAINER_STYLE, base, format_currency, page_header},
    navigation::NavBar,
    organization::Tenant,
    report::{
        IncomeStatement, ReportQuery,
        filters::{range_filter, report_tabs},
        income_statement,
        sections::statement_section,
    },
    timezone::local_today,
};

fn statement_body(statement: &IncomeStatement) -> Markup {
    let net_income = statement.net_income();
    let net_income_style = if net_income.is_negative() {
        "text-red-600 dark:text-red-400"
    } else {
        "text-green-600 dark:text-green-400"
    };

    html! {
        (statement_section("Revenue", "revenue", &statement.revenue, &[], statement.total_revenue))
        (statement_section("Expenses", "expenses", &statement.expenses, &[], statement.total_expenses))

        p class="flex justify-between px-6 py-4 rounded shadow text-lg font-semibold"
        {
            span { "Net income" }
            span class=(net_income_style) data-net-income { (format_currency(net_income)) }
        }
    }
}

fn income_statement_view(from: Date, to: Date, statement: Result<IncomeStatement, Error>) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-4"
            {
                (page_header("Income statement", None))
                (report_tabs(endpoints::INCOME_STATEMENT_VIEW))
                (range_filter(endpoints::INCOME_STATEMENT_VIEW, from, to))

                @match statement {
                    Ok(statement) => {
                        (statement_body(&statement))
                    }
                    Err(error) => {
                        p class="text-red-600 dark:text-red-400" data-range-error { (error) }
                    }
                }
            }
        }
    };

    base("Income statement", &[], &content)
}

/// Display revenue, expenses and net income for the `from` and `to` query
/// parameters, by default the year to date.
pub async fn get_income_statement_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Query(query): Query<ReportQuery>,
) -> Result<Response, Error> {
    let (from, to) = query.range_or(local_today(&state.local_timezone)?);
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let statement = match income_statement(tenant.organization_id, from, to, &connection) {
        Err(error @ Error::InvalidDateRange { .. }) => Err(error),
        other => Ok(other?),
    };

    Ok(income_statement_view(from, to, statement).into_response())
}

#[cfg(test)]
mod income_statement_page_tests {
    use axum::{
        Extension,
        extract::{Query, State},
    };
    use time::macros::date;

    use crate::{
        report::{
            ReportQuery, get_income_statement_page, test_reports::issued_invoice_and_approved_bill,
        },
        test_utils::{TestBooks, assert_valid_html, parse_html_document, select_texts},
    };

    #[tokio::test]
    async fn shows_sections_and_net_income() {
        let books = TestBooks::standard();
        issued_invoice_and_approved_bill(&books);
        let (state, tenant) = books.db_state();

        let response = get_income_statement_page(
            State(state),
            Extension(tenant),
            Query(ReportQuery {
                from: Some(date!(2025 - 01 - 01)),
                to: Some(date!(2025 - 12 - 31)),
                ..ReportQuery::default()
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(
            select_texts(&document, "[data-section=revenue] [data-line-row] td:first-child"),
            ["4000", "4100"]
        );
        assert_eq!(
            select_texts(&document, "[data-section-total]"),
            ["$250.00", "$1,120.00"]
        );
        assert_eq!(select_texts(&document, "[data-net-income]"), ["-$870.00"]);
    }

    #[tokio::test]
    async fn backwards_range_shows_message() {
        let (state, tenant) = TestBooks::standard().db_state();

        let response = get_income_statement_page(
            State(state),
            Extension(tenant),
            Query(ReportQuery {
                from: Some(date!(2025 - 06 - 01)),
                to: Some(date!(2025 - 01 - 01)),
                ..ReportQuery::default()
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(select_texts(&document, "[data-range-error]").len(), 1);
        assert!(select_texts(&document, "[data-net-income]").is_empty());
    }
}
