//! The receipt for a single sale.

use axum::{
    Extension,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    Error,
    app_state::DbState,
    document::format_tax_rate,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_DELETE_STYLE, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_NUMBER_CELL_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base,
        format_currency, format_date, page_header,
    },
    navigation::NavBar,
    organization::Tenant,
    pos::{Sale, SaleId, SaleStatus, get_sale, sales_page::sale_status_badge, void_sale},
    timezone::local_today,
};

fn totals_rows(sale: &Sale) -> Markup {
    html! {
        tr
        {
            th scope="row" colspan="4" class=(TABLE_NUMBER_CELL_STYLE) { "Subtotal" }
            td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(sale.totals.subtotal)) }
        }
        @if !sale.totals.discount.is_zero() {
            tr
            {
                th scope="row" colspan="4" class=(TABLE_NUMBER_CELL_STYLE) { "Discount" }
                td class=(TABLE_NUMBER_CELL_STYLE) data-discount { "-" (format_currency(sale.totals.discount)) }
            }
        }
        tr
        {
            th scope="row" colspan="4" class=(TABLE_NUMBER_CELL_STYLE)
            {
                "Tax (" (format_tax_rate(sale.tax_rate_bps)) "%)"
            }
            td class=(TABLE_NUMBER_CELL_STYLE) data-tax { (format_currency(sale.totals.tax)) }
        }
        tr class="font-semibold"
        {
            th scope="row" colspan="4" class=(TABLE_NUMBER_CELL_STYLE) { "Total" }
            td class=(TABLE_NUMBER_CELL_STYLE) data-total { (format_currency(sale.totals.total)) }
        }
        @for tender in &sale.tenders {
            tr data-tender-row
            {
                th scope="row" colspan="4" class=(TABLE_NUMBER_CELL_STYLE) { (tender.method.label()) }
                td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(tender.amount)) }
            }
        }
        @if !sale.change.is_zero() {
            tr
            {
                th scope="row" colspan="4" class=(TABLE_NUMBER_CELL_STYLE) { "Change" }
                td class=(TABLE_NUMBER_CELL_STYLE) data-change { (format_currency(sale.change)) }
            }
        }
    }
}

fn sale_view(sale: &Sale) -> Markup {
    let nav_bar = NavBar::new(endpoints::SALE_VIEW).into_html();
    let title = format!("Sale {}", sale.number);

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-3xl space-y-6"
            {
                (page_header(&title, Some((endpoints::SALES_VIEW, "Back to sales"))))

                dl class="grid grid-cols-2 gap-x-6 gap-y-2 text-sm md:grid-cols-4"
                {
                    dt class="font-semibold" { "Date" }
                    dd { (format_date(sale.date)) }
                    dt class="font-semibold" { "Status" }
                    dd data-status { (sale_status_badge(sale.status)) }

                    @if let Some(entry_id) = sale.journal_entry_id {
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Product" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Quantity" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Price" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Discount" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Amount" }
                            }
                        }

                        tbody
                        {
                            @for line in &sale.lines {
                                tr class=(TABLE_ROW_STYLE) data-line-row
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a href=(format_endpoint(endpoints::PRODUCT_VIEW, line.product_id)) class=(LINK_STYLE)
                                        {
                                            (line.product_name)
                                        }
                                    }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (line.quantity) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(line.unit_price)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(line.discount)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(line.amount())) }
                                }
                            }
                        }

                        tfoot class="text-gray-900 dark:text-white"
                        {
                            (totals_rows(sale))
                        }
                    }
                }

                @if sale.status == SaleStatus::Completed {
                    button
                        hx-post=(format_endpoint(endpoints::VOID_SALE_API, sale.id))
                        hx-target-error="#alert-container"
                        hx-confirm="Void this sale? The stock goes back on the shelf and the entry is reversed."
                        class=(BUTTON_DELETE_STYLE)
                        data-void-button
                    {
                        "Void sale"
                    }
                }
            }
        }
    };

    base(&title, &[], &content)
}

/// Display a sale as a receipt.
pub async fn get_sale_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(sale_id): Path<SaleId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let sale = get_sale(tenant.organization_id, sale_id, &connection)?;

    Ok(sale_view(&sale).into_response())
}

/// Void a sale, returning its stock and reversing its entry.
pub async fn void_sale_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(sale_id): Path<SaleId>,
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

    match void_sale(tenant, sale_id, today, &connection) {
        Ok(sale) => (
            HxRedirect(format_endpoint(endpoints::SALE_VIEW, sale.id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => error.into_alert_response(),
    }
}

#[cfg(test)]
mod sale_page_tests {
    use axum::{
        Extension,
        extract::{Path, State},
    };

    use crate::{
        Error,
        pos::{
            get_sale_page,
            test_sales::{SALE_DATE, cash_sale},
            void_sale,
        },
        stock::test_products::stocked_product,
        test_utils::{TestBooks, assert_valid_html, parse_html_document, select_texts},
    };

    #[tokio::test]
    async fn shows_receipt_with_void_button() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 10);
        let sale = cash_sale(&books, &product, 2);
        let (state, tenant) = books.db_state();

        let response = get_sale_page(State(state), Extension(tenant), Path(sale.id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(select_texts(&document, "[data-line-row] td:first-child"), ["Product A1"]);
        assert_eq!(select_texts(&document, "[data-total]"), ["$20.00"]);
        assert_eq!(select_texts(&document, "[data-tender-row] td"), ["$20.00"]);
        assert_eq!(select_texts(&document, "[data-void-button]").len(), 1);
    }

    #[tokio::test]
    async fn voided_sale_has_no_void_button() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 10);
        let sale = cash_sale(&books, &product, 1);
        void_sale(books.tenant, sale.id, SALE_DATE, &books.connection).unwrap();
        let (state, tenant) = books.db_state();

        let response = get_sale_page(State(state), Extension(tenant), Path(sale.id))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(select_texts(&document, "[data-status]"), ["Voided"]);
        assert!(select_texts(&document, "[data-void-button]").is_empty());
    }

    #[tokio::test]
    async fn other_organizations_sale_is_not_found() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 10);
        let sale = cash_sale(&books, &product, 1);
        let other = books.other_tenant();
        let (state, _) = books.db_state();

        let result = get_sale_page(State(state), Extension(other), Path(sale.id)).await;

        assert_eq!(result.err(), Some(Error::NotFound));
    }
}
