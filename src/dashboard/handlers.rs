//! The dashboard page: summary cards, monthly charts and financial ratios.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use rusqlite::Connection;
use time::Date;

use crate::{
    Error,
    app_state::DbState,
    dashboard::{
        aggregation::{last_months, monthly_totals},
        cards::{SummaryCards, cards_view, summary_cards},
        charts::{DashboardChart, charts_script, charts_view, net_income_chart, revenue_expenses_chart},
    },
    endpoints,
    html::{HeadElement, base, link},
    ledger::count_entries,
    navigation::NavBar,
    organization::Tenant,
    report::{Ratios, ratios, ratios_table, start_of_year},
    timezone::local_today,
};

/// How many months the charts cover, including the current one.
const CHART_MONTHS: usize = 12;

struct DashboardData {
    cards: SummaryCards,
    charts: [DashboardChart; 2],
    ratios: Ratios,
}

/// Display an overview of the organization's finances.
pub async fn get_dashboard_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    match build_dashboard_data(tenant, today, &connection)? {
        Some(data) => Ok(dashboard_view(&data).into_response()),
        None => Ok(dashboard_no_data_view().into_response()),
    }
}

/// Everything the dashboard shows, or `None` if nothing has been posted yet.
fn build_dashboard_data(
    tenant: Tenant,
    today: Date,
    connection: &Connection,
) -> Result<Option<DashboardData>, Error> {
    let organization_id = tenant.organization_id;

    if count_entries(organization_id, connection)? == 0 {
        return Ok(None);
    }

    let cards = summary_cards(organization_id, today, connection)
        .inspect_err(|error| tracing::error!("could not build dashboard cards: {error}"))?;
    let months = last_months(today, CHART_MONTHS);
    let monthly_totals = monthly_totals(organization_id, &months, today, connection)
        .inspect_err(|error| tracing::error!("could not get monthly totals: {error}"))?;
    let ratios = ratios(organization_id, start_of_year(today), today, connection)?;

    let charts = [
        DashboardChart {
            id: "revenue-expenses-chart",
            options: revenue_expenses_chart(&monthly_totals).to_string(),
        },
        DashboardChart {
            id: "net-income-chart",
            options: net_income_chart(&monthly_totals).to_string(),
        },
    ];

    Ok(Some(DashboardData {
        cards,
        charts,
        ratios,
    }))
}

fn dashboard_no_data_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();
    let new_invoice_link = link(endpoints::NEW_INVOICE_VIEW, "drafting an invoice");
    let new_entry_link = link(endpoints::NEW_JOURNAL_ENTRY_VIEW, "posting a journal entry");

    let content = html!(
        (nav_bar)

        div
            class="flex flex-col items-center px-6 py-8 mx-auto text-gray-900 dark:text-white"
            data-empty-state
        {
            h2 class="text-xl font-bold"
            {
                "Nothing here yet..."
            }

            p
            {
                "Your figures will show up here once the books have some activity.
                Get started by " (new_invoice_link) " or " (new_entry_link) "."
            }
        }
    );

    base("Dashboard", &[], &content)
}

fn dashboard_view(data: &DashboardData) -> Markup {
    let nav_bar = NavBar::new(endpoints::DASHBOARD_VIEW).into_html();

    let content = html!(
        (nav_bar)

        div
            id="dashboard-content"
            class="flex flex-col items-center px-2 lg:px-6 lg:py-8 mx-auto
                max-w-screen-xl text-gray-900 dark:text-white"
        {
            (cards_view(&data.cards))

            (charts_view(&data.charts))

            section class="w-full mx-auto mb-8"
            {
                div class="flex justify-between items-baseline mb-4"
                {
                    h3 class="text-xl font-semibold" { "Ratios" }

                    span class="text-sm text-gray-600 dark:text-gray-400"
                    {
                        "Year to date"
                    }
                }

                (ratios_table(&data.ratios))
            }
        }
    );

    let scripts = [
        HeadElement::ScriptLink("/static/echarts.6.0.0.min.js".to_owned()),
        charts_script(&data.charts),
    ];

    base("Dashboard", &scripts, &content)
}
