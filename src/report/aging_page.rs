use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    app_state::DbState,
    endpoints::{self, format_endpoint},
    form::empty_date_as_none,
    html::{
        BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, LINK_STYLE,
        PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_NUMBER_CELL_STYLE,
        TABLE_ROW_STYLE, TABLE_STYLE, base, format_currency, format_date, page_header,
    },
    navigation::NavBar,
    organization::Tenant,
    report::{AgingBucket, AgingKind, AgingReport, aging, filters::report_tabs},
    timezone::local_today,
};

#[derive(Debug, Default, Deserialize)]
pub struct AgingQuery {
    #[serde(default)]
    pub kind: AgingKind,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub as_of: Option<Date>,
}

fn aging_filter(kind: AgingKind, as_of: Date) -> Markup {
    html! {
        form method="get" action=(endpoints::AGING_VIEW) class="flex flex-wrap items-end gap-4" data-report-filter
        {
            div
            {
                label for="kind" class=(FORM_LABEL_STYLE) { "Show" }
                select name="kind" id="kind" class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for option in [AgingKind::Receivable, AgingKind::Payable] {
                        option value=(option.as_str()) selected[option == kind] { (option.label()) }
                    }
                }
            }
            div
            {
                label for="as_of" class=(FORM_LABEL_STYLE) { "As of" }
                input
                    type="date"
                    name="as_of"
                    id="as_of"
                    value=(format_date(as_of))
                    class=(FORM_TEXT_INPUT_STYLE);
            }
            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Show" }
        }
    }
}

fn aging_view(report: &AgingReport) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();
    let (contact_heading, document_view) = match report.kind {
        AgingKind::Receivable => ("Customer", endpoints::INVOICE_VIEW),
        AgingKind::Payable => ("Vendor", endpoints::BILL_VIEW),
    };
    let title = format!("Aged {}", report.kind.label().to_lowercase());

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl space-y-4"
            {
                (page_header(&title, None))
                (report_tabs(endpoints::AGING_VIEW))
                (aging_filter(report.kind, report.as_of))

                dl class="grid grid-cols-3 gap-4 md:grid-cols-6"
                {
                    @for bucket in AgingBucket::ALL {
                        div class="rounded shadow px-4 py-3"
                        {
                            dt class="text-xs uppercase text-gray-500 dark:text-gray-400" { (bucket.label()) }
                            dd class="text-lg font-semibold tabular-nums" data-bucket-total
                            {
                                (format_currency(report.bucket_total(bucket)))
                            }
                        }
                    }
                    div class="rounded shadow px-4 py-3"
                    {
                        dt class="text-xs uppercase text-gray-500 dark:text-gray-400" { "Total" }
                        dd class="text-lg font-semibold tabular-nums" data-aging-total { (format_currency(report.total())) }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Number" }
                                th scope="col" class=(TABLE_CELL_STYLE) { (contact_heading) }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Due" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Days past due" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Bucket" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Outstanding" }
                            }
                        }

                        tbody
                        {
                            @for row in &report.rows {
                                tr class=(TABLE_ROW_STYLE) data-aging-row
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a href=(format_endpoint(document_view, row.document_id)) class=(LINK_STYLE)
                                        {
                                            (row.number)
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (row.contact_name) }
                                    td class=(TABLE_CELL_STYLE) { (format_date(row.due_date)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (row.days_past_due.max(0)) }
                                    td class=(TABLE_CELL_STYLE) { (row.bucket.label()) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(row.outstanding)) }
                                }
                            }

                            @if report.rows.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="6" class="px-6 py-4 text-center" { "Nothing outstanding." }
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

/// Display open invoices (`kind=receivable`) or bills (`kind=payable`)
/// bucketed by how far past due they are.
pub async fn get_aging_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Query(query): Query<AgingQuery>,
) -> Result<Response, Error> {
    let as_of = query
        .as_of
        .map_or_else(|| local_today(&state.local_timezone), Ok)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let report = aging(tenant.organization_id, query.kind, as_of, &connection)?;

    Ok(aging_view(&report).into_response())
}

#[cfg(test)]
mod aging_page_tests {
    use axum::{
        Extension,
        extract::{Query, State},
    };
    use time::macros::date;

    use crate::{
        report::{
            AgingKind, aging_page::AgingQuery, get_aging_page,
            test_reports::issued_invoice_and_approved_bill,
        },
        test_utils::{TestBooks, assert_valid_html, parse_html_document, select_texts},
    };

    #[tokio::test]
    async fn shows_receivables_by_bucket() {
        let books = TestBooks::standard();
        let (invoice, _) = issued_invoice_and_approved_bill(&books);
        let (state, tenant) = books.db_state();

        let response = get_aging_page(
            State(state),
            Extension(tenant),
            Query(AgingQuery {
                kind: AgingKind::Receivable,
                as_of: Some(date!(2025 - 05 - 15)),
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(
            select_texts(&document, "[data-aging-row] td:first-child"),
            [invoice.number]
        );
        assert_eq!(
            select_texts(&document, "[data-bucket-total]"),
            ["$0.00", "$0.00", "$287.50", "$0.00", "$0.00"]
        );
        assert_eq!(select_texts(&document, "[data-aging-total]"), ["$287.50"]);
    }

    #[tokio::test]
    async fn shows_payables() {
        let books = TestBooks::standard();
        let (_, bill) = issued_invoice_and_approved_bill(&books);
        let (state, tenant) = books.db_state();

        let response = get_aging_page(
            State(state),
            Extension(tenant),
            Query(AgingQuery {
                kind: AgingKind::Payable,
                as_of: Some(date!(2025 - 04 - 10)),
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(
            select_texts(&document, "[data-aging-row] td:first-child"),
            [bill.number]
        );
        assert_eq!(
            select_texts(&document, "[data-aging-row] td:nth-child(5)"),
            ["Current"]
        );
    }
}
