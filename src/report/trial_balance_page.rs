use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    app_state::DbState,
    endpoints::{self, format_endpoint},
    export::csv_response,
    html::{
        BADGE_DANGER_COLOUR, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_NUMBER_CELL_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, badge, base,
        format_currency, format_date, page_header,
    },
    navigation::NavBar,
    organization::Tenant,
    report::{
        ReportQuery, TrialBalance,
        filters::{as_of_filter, report_tabs},
        trial_balance,
    },
    timezone::local_today,
};

fn trial_balance_view(report: &TrialBalance) -> Markup {
    let nav_bar = NavBar::new(endpoints::REPORTS_VIEW).into_html();
    let csv_url = format!(
        "{}?as_of={}",
        endpoints::TRIAL_BALANCE_CSV,
        format_date(report.as_of)
    );

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-4"
            {
                (page_header("Trial balance", Some((&csv_url, "Download CSV"))))
                (report_tabs(endpoints::TRIAL_BALANCE_VIEW))
                (as_of_filter(endpoints::TRIAL_BALANCE_VIEW, report.as_of))

                @if !report.is_balanced() {
                    p data-unbalanced { (badge("Debits and credits do not agree", BADGE_DANGER_COLOUR)) }
                }

                div class="overflow-x-auto rounded shadow"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Code" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Debit" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Credit" }
                            }
                        }

                        tbody
                        {
                            @for row in &report.rows {
                                tr class=(TABLE_ROW_STYLE) data-account-row
                                {
                                    td class=(TABLE_CELL_STYLE) { (row.code) }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a href=(format_endpoint(endpoints::ACCOUNT_LEDGER_VIEW, row.account_id)) class=(LINK_STYLE)
                                        {
                                            (row.name)
                                        }
                                    }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(row.debit)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(row.credit)) }
                                }
                            }

                            @if report.rows.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="4" class="px-6 py-4 text-center" { "Nothing posted by this date." }
                                }
                            }
                        }

                        tfoot class="text-gray-900 dark:text-white"
                        {
                            tr class="font-semibold"
                            {
                                th scope="row" colspan="2" class=(TABLE_NUMBER_CELL_STYLE) { "Total" }
                                td class=(TABLE_NUMBER_CELL_STYLE) data-total-debit { (format_currency(report.total_debit)) }
                                td class=(TABLE_NUMBER_CELL_STYLE) data-total-credit { (format_currency(report.total_credit)) }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Trial balance", &[], &content)
}

/// Display the trial balance as of the `as_of` query parameter, by default today.
pub async fn get_trial_balance_page(
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

    let report = trial_balance(tenant.organization_id, as_of, &connection)?;

    Ok(trial_balance_view(&report).into_response())
}

/// Download the trial balance as CSV.
pub async fn get_trial_balance_csv(
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

    let report = trial_balance(tenant.organization_id, as_of, &connection)?;

    csv_response(
        &format!("trial-balance-{}.csv", format_date(as_of)),
        &report.rows,
    )
}
