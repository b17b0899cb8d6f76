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
    html::{
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_NUMBER_CELL_STYLE,
        TABLE_ROW_STYLE, TABLE_STYLE, base, format_date, format_percent, format_ratio,
        page_header,
    },
    navigation::NavBar,
    organization::Tenant,
    report::{
        ReportQuery, Ratios,
        filters::{as_of_filter, report_tabs},
        ratios, start_of_year,
    },
    timezone::local_today,
};

/// A table of financial ratios. Undefined ratios are shown as a dash.
pub fn ratios_table(ratios: &Ratios) -> Markup {
    let rows = [
        ("Current ratio", "current-ratio", format_ratio(ratios.current_ratio)),
        ("Quick ratio", "quick-ratio", format_ratio(ratios.quick_ratio)),
        ("Debt to equity", "debt-to-equity", format_ratio(ratios.debt_to_equity)),
        ("Gross margin", "gross-margin", format_percent(ratios.gross_margin)),
        ("Net margin", "net-margin", format_percent(ratios.net_margin)),
    ];

    html! {
        div class="overflow-x-auto rounded shadow"
        {
            table class=(TABLE_STYLE)
            {
                tbody
                {
                    @for (label, key, value) in rows {
                        tr class=(TABLE_ROW_STYLE)
                        {
                            th scope="row" class=(TABLE_CELL_STYLE) { (label) }
                            td class=(TABLE_NUMBER_CELL_STYLE) data-ratio=(key) { (value) }
                        }
                    }
                }
            }
        }
    }
}

fn reports_view(as_of: Date, ratios: &Ratios) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();
    let reports = [
        (
            endpoints::TRIAL_BALANCE_VIEW,
            "Trial balance",
            "Debits and credits per account, with a CSV download.",
        ),
        (
            endpoints::INCOME_STATEMENT_VIEW,
            "Income statement",
            "Revenue, expenses and net income over a range of dates.",
        ),
        (
            endpoints::BALANCE_SHEET_VIEW,
            "Balance sheet",
            "What the business owns and owes on a given day.",
        ),
        (
            endpoints::AGING_VIEW,
            "Aging",
            "Unpaid invoices and bills by how long they are overdue.",
        ),
    ];

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-6"
            {
                (page_header("Reports", None))
                (report_tabs(endpoints::REPORTS_VIEW))

                ul class="grid gap-4 md:grid-cols-2"
                {
                    @for (url, title, description) in reports {
                        li class="rounded shadow px-4 py-3"
                        {
                            a href=(url) class={ (LINK_STYLE) " font-semibold" } { (title) }
                            p class="text-sm text-gray-600 dark:text-gray-400" { (description) }
                        }
                    }
                }

                section class="space-y-2"
                {
                    h2 class="text-lg font-semibold"
                    {
                        "Ratios"
                        span class="ml-2 text-sm font-normal text-gray-600 dark:text-gray-400"
                        {
                            "Year to " (format_date(as_of))
                        }
                    }

                    (as_of_filter(endpoints::REPORTS_VIEW, as_of))
                    (ratios_table(ratios))
                }
            }
        }
    };

    base("Reports", &[], &content)
}

/// Display the list of reports and the ratios for the year to the `as_of` query parameter.
pub async fn get_reports_page(
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

    let ratios = ratios(tenant.organization_id, start_of_year(as_of), as_of, &connection)?;

    Ok(reports_view(as_of, &ratios).into_response())
}

#[cfg(test)]
mod reports_page_tests {
    use axum::{
        Extension,
        extract::{Query, State},
    };
    use time::macros::date;

    use crate::{
        report::{ReportQuery, get_reports_page, test_reports::issued_invoice_and_approved_bill},
        test_utils::{TestBooks, assert_valid_html, parse_html_document, select_texts},
    };

    #[tokio::test]
    async fn shows_ratios_for_year_to_date() {
        let books = TestBooks::standard();
        issued_invoice_and_approved_bill(&books);
        let (state, tenant) = books.db_state();

        let response = get_reports_page(
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
        assert_eq!(select_texts(&document, "[data-ratio=current-ratio]"), ["0.25"]);
        assert_eq!(select_texts(&document, "[data-ratio=gross-margin]"), ["100.0%"]);
        assert_eq!(select_texts(&document, "[data-ratio=net-margin]"), ["-348.0%"]);
    }

    #[tokio::test]
    async fn empty_books_show_dashes() {
        let (state, tenant) = TestBooks::standard().db_state();

        let response = get_reports_page(State(state), Extension(tenant), Query(ReportQuery::default()))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(select_texts(&document, "[data-ratio=current-ratio]"), ["–"]);
    }
}
