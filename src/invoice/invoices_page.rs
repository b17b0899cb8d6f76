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
    endpoints::{self, format_endpoint},
    html::{
        BADGE_DANGER_COLOUR, BADGE_NEUTRAL_COLOUR, BADGE_SUCCESS_COLOUR, BADGE_WARNING_COLOUR,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_NUMBER_CELL_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, badge, base, format_currency,
        format_date, page_header,
    },
    invoice::{Invoice, InvoiceStatus, list_invoices},
    money::Money,
    navigation::NavBar,
    organization::Tenant,
    timezone::local_today,
};

pub(super) fn invoice_status_badge(invoice: &Invoice, today: Date) -> Markup {
    if invoice.is_overdue(today) {
        return html! {
            (badge(invoice.status.label(), BADGE_WARNING_COLOUR))
            " "
            span data-overdue { (badge("Overdue", BADGE_DANGER_COLOUR)) }
        };
    }

    let colour = match invoice.status {
        InvoiceStatus::Paid => BADGE_SUCCESS_COLOUR,
        InvoiceStatus::Issued | InvoiceStatus::PartiallyPaid => BADGE_WARNING_COLOUR,
        InvoiceStatus::Draft | InvoiceStatus::Void => BADGE_NEUTRAL_COLOUR,
    };

    badge(invoice.status.label(), colour)
}

fn invoices_view(invoices: &[Invoice], today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::INVOICES_VIEW).into_html();
    let total_outstanding: Money = invoices.iter().map(Invoice::outstanding).sum();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-6xl space-y-4"
            {
                (page_header("Invoices", Some((endpoints::NEW_INVOICE_VIEW, "New invoice"))))

                p class="text-sm" data-total-outstanding
                {
                    "Outstanding: " (format_currency(total_outstanding))
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Customer" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Issued" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Due" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Total" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Outstanding" }
                            }
                        }

                        tbody
                        {
                            @for invoice in invoices {
                                tr class=(TABLE_ROW_STYLE) data-invoice-row
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a
                                            href=(format_endpoint(endpoints::INVOICE_VIEW, invoice.id))
                                            class=(LINK_STYLE)
                                        {
                                            (invoice.number)
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (invoice.customer_name) }
                                    td class=(TABLE_CELL_STYLE) { (format_date(invoice.issue_date)) }
                                    td class=(TABLE_CELL_STYLE) { (format_date(invoice.due_date)) }
                                    td class=(TABLE_CELL_STYLE) { (invoice_status_badge(invoice, today)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(invoice.totals.total)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(invoice.outstanding())) }
                                }
                            }

                            @if invoices.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="7" class="px-6 py-4 text-center"
                                    {
                                        "No invoices yet. "
                                        a href=(endpoints::NEW_INVOICE_VIEW) class=(LINK_STYLE) { "Draft one" }
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

    base("Invoices", &[], &content)
}

/// Display the organization's invoices, newest first.
pub async fn get_invoices_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let invoices = list_invoices(tenant.organization_id, &connection)?;

    Ok(invoices_view(&invoices, today).into_response())
}
