//! Date parameters shared by the report pages.

use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    endpoints,
    form::empty_date_as_none,
    html::{BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, format_date},
    report::start_of_year,
};

/// The query string of a report page. Missing dates fall back to the local
/// today and the start of its year.
#[derive(Debug, Default, Deserialize)]
pub struct ReportQuery {
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub as_of: Option<Date>,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub from: Option<Date>,
    #[serde(default, deserialize_with = "empty_date_as_none")]
    pub to: Option<Date>,
}

impl ReportQuery {
    pub fn as_of_or(&self, today: Date) -> Date {
        self.as_of.unwrap_or(today)
    }

    /// The requested range, by default the year to date.
    pub fn range_or(&self, today: Date) -> (Date, Date) {
        let to = self.to.unwrap_or(today);
        let from = self.from.unwrap_or_else(|| start_of_year(to));

        (from, to)
    }
}

fn date_field(label: &str, name: &str, value: Date) -> Markup {
    html! {
        div
        {
            label for=(name) class=(FORM_LABEL_STYLE) { (label) }
            input
                type="date"
                name=(name)
                id=(name)
                value=(format_date(value))
                class=(FORM_TEXT_INPUT_STYLE);
        }
    }
}

/// A GET form for reports at a point in time.
pub(super) fn as_of_filter(action: &str, as_of: Date) -> Markup {
    html! {
        form method="get" action=(action) class="flex flex-wrap items-end gap-4" data-report-filter
        {
            (date_field("As of", "as_of", as_of))
            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Show" }
        }
    }
}

/// A GET form for reports over a range of dates.
pub(super) fn range_filter(action: &str, from: Date, to: Date) -> Markup {
    html! {
        form method="get" action=(action) class="flex flex-wrap items-end gap-4" data-report-filter
        {
            (date_field("From", "from", from))
            (date_field("To", "to", to))
            button type="submit" class=(BUTTON_SECONDARY_STYLE) { "Show" }
        }
    }
}

/// Links between the reports, with the current one highlighted.
pub(super) fn report_tabs(active: &str) -> Markup {
    let tabs = [
        (endpoints::REPORTS_VIEW, "Overview"),
        (endpoints::TRIAL_BALANCE_VIEW, "Trial balance"),
        (endpoints::INCOME_STATEMENT_VIEW, "Income statement"),
        (endpoints::BALANCE_SHEET_VIEW, "Balance sheet"),
        (endpoints::AGING_VIEW, "Aging"),
    ];

    html! {
        nav class="flex flex-wrap gap-2 text-sm" aria-label="Reports"
        {
            @for (url, title) in tabs {
                @if url == active {
                    span class="px-3 py-1 rounded bg-blue-600 text-white" aria-current="page" { (title) }
                } @else {
                    a
                        href=(url)
                        class="px-3 py-1 rounded text-gray-900 hover:bg-gray-100 dark:text-white dark:hover:bg-gray-700"
                    {
                        (title)
                    }
                }
            }
        }
    }
}
