use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use time::Date;

use crate::{
    Error,
    app_state::DbState,
    bill::{Bill, BillStatus, list_bills},
    endpoints::{self, format_endpoint},
    html::{
        BADGE_DANGER_COLOUR, BADGE_NEUTRAL_COLOUR, BADGE_SUCCESS_COLOUR, BADGE_WARNING_COLOUR,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_NUMBER_CELL_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, badge, base, format_currency,
        format_date, page_header,
    },
    money::Money,
    navigation::NavBar,
    organization::Tenant,
    timezone::local_today,
};

pub(super) fn bill_status_badge(bill: &Bill, today: Date) -> Markup {
    if bill.is_overdue(today) {
        return html! {
            (badge(bill.status.label(), BADGE_WARNING_COLOUR))
            " "
            span data-overdue { (badge("Overdue", BADGE_DANGER_COLOUR)) }
        };
    }

    let colour = match bill.status {
        BillStatus::Paid => BADGE_SUCCESS_COLOUR,
        BillStatus::Approved | BillStatus::PartiallyPaid => BADGE_WARNING_COLOUR,
        BillStatus::Draft | BillStatus::Void => BADGE_NEUTRAL_COLOUR,
    };

    badge(bill.status.label(), colour)
}

fn bills_view(bills: &[Bill], today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::BILLS_VIEW).into_html();
    let total_outstanding: Money = bills.iter().map(Bill::outstanding).sum();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-6xl space-y-4"
            {
                (page_header("Bills", Some((endpoints::NEW_BILL_VIEW, "New bill"))))

                p class="text-sm" data-total-outstanding
                {
                    "To pay: " (format_currency(total_outstanding))
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Vendor" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Reference" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Due" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Total" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Outstanding" }
                            }
                        }

                        tbody
                        {
                            @for bill in bills {
                                tr class=(TABLE_ROW_STYLE) data-bill-row
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a href=(format_endpoint(endpoints::BILL_VIEW, bill.id)) class=(LINK_STYLE)
                                        {
                                            (bill.number)
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (bill.vendor_name) }
                                    td class=(TABLE_CELL_STYLE) { (bill.reference) }
                                    td class=(TABLE_CELL_STYLE) { (format_date(bill.bill_date)) }
                                    td class=(TABLE_CELL_STYLE) { (format_date(bill.due_date)) }
                                    td class=(TABLE_CELL_STYLE) { (bill_status_badge(bill, today)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(bill.total)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(bill.outstanding())) }
                                }
                            }

                            @if bills.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="8" class="px-6 py-4 text-center"
                                    {
                                        "No bills yet. "
                                        a href=(endpoints::NEW_BILL_VIEW) class=(LINK_STYLE) { "Enter one" }
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

    base("Bills", &[], &content)
}

/// Display the organization's bills, newest first.
pub async fn get_bills_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let bills = list_bills(tenant.organization_id, &connection)?;

    Ok(bills_view(&bills, today).into_response())
}
