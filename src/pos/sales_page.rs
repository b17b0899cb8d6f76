use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    app_state::DbState,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_NEUTRAL_COLOUR, BADGE_SUCCESS_COLOUR, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_NUMBER_CELL_STYLE, TABLE_ROW_STYLE,
        TABLE_STYLE, badge, base, format_currency, format_date,
        page_header,
    },
    navigation::NavBar,
    organization::Tenant,
    pos::{DailySales, Sale, SaleStatus, daily_sales_totals, list_sales},
};

pub(super) fn sale_status_badge(status: SaleStatus) -> Markup {
    let colour = match status {
        SaleStatus::Completed => BADGE_SUCCESS_COLOUR,
        SaleStatus::Voided => BADGE_NEUTRAL_COLOUR,
    };

    badge(status.label(), colour)
}

fn daily_totals_table(days: &[DailySales]) -> Markup {
    html! {
        section class="space-y-2"
        {
            h2 class="text-lg font-semibold" { "Daily takings" }

            div class="overflow-x-auto rounded shadow"
            {
                table class=(TABLE_STYLE)
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                            th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Sales" }
                            th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Total" }
                        }
                    }

                    tbody
                    {
                        @for day in days {
                            tr class=(TABLE_ROW_STYLE) data-day-row
                            {
                                td class=(TABLE_CELL_STYLE) { (format_date(day.date)) }
                                td class=(TABLE_NUMBER_CELL_STYLE) { (day.count) }
                                td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(day.total)) }
                            }
                        }
                    }
                }
            }
        }
    }
}

fn sales_view(sales: &[Sale]) -> Markup {
    let nav_bar = NavBar::new(endpoints::SALES_VIEW).into_html();
    let days = daily_sales_totals(sales);

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-6"
            {
                (page_header("Sales", Some((endpoints::POS_VIEW, "Open register"))))

                @if !days.is_empty() {
                    (daily_totals_table(&days))
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Total" }
                            }
                        }

                        tbody
                        {
                            @for sale in sales {
                                tr class=(TABLE_ROW_STYLE) data-sale-row
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a href=(format_endpoint(endpoints::SALE_VIEW, sale.id)) class=(LINK_STYLE)
                                        {
                                            (sale.number)
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (format_date(sale.date)) }
                                    td class=(TABLE_CELL_STYLE) { (sale_status_badge(sale.status)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(sale.totals.total)) }
                                }
                            }

                            @if sales.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="4" class="px-6 py-4 text-center"
                                    {
                                        "No sales yet. "
                                        a href=(endpoints::POS_VIEW) class=(LINK_STYLE) { "Open the register" }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Sales", &[], &content)
}

/// Display the organization's sales with takings per day.
pub async fn get_sales_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let sales = list_sales(tenant.organization_id, &connection)?;

    Ok(sales_view(&sales).into_response())
}
