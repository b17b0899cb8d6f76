//! Tables of accounts used by the income statement and balance sheet.

use maud::{Markup, html};

use crate::{
    endpoints::{self, format_endpoint},
    html::{
        LINK_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_NUMBER_CELL_STYLE,
        TABLE_ROW_STYLE, TABLE_STYLE, format_currency,
    },
    money::Money,
    report::StatementLine,
};

/// A titled list of accounts with a total row.
///
/// `extra_rows` are shown after the accounts and before the total, for lines
/// such as retained earnings that are not backed by an account.
pub(super) fn statement_section(
    title: &str,
    section: &str,
    lines: &[StatementLine],
    extra_rows: &[(&str, Money)],
    total: Money,
) -> Markup {
    html! {
        section class="space-y-2" data-section=(section)
        {
            div class="overflow-x-auto rounded shadow"
            {
                table class=(TABLE_STYLE)
                {
                    thead class=(TABLE_HEADER_STYLE)
                    {
                        tr
                        {
                            th scope="col" colspan="2" class=(TABLE_CELL_STYLE) { (title) }
                            th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Amount" }
                        }
                    }

                    tbody
                    {
                        @for line in lines {
                            tr class=(TABLE_ROW_STYLE) data-line-row
                            {
                                td class="px-6 py-2 w-24" { (line.code) }
                                td class="px-6 py-2"
                                {
                                    a href=(format_endpoint(endpoints::ACCOUNT_LEDGER_VIEW, line.account_id)) class=(LINK_STYLE)
                                    {
                                        (line.name)
                                    }
                                }
                                td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(line.amount)) }
                            }
                        }

                        @for (label, amount) in extra_rows {
                            tr class=(TABLE_ROW_STYLE) data-extra-row
                            {
                                td class="px-6 py-2" {}
                                td class="px-6 py-2 italic" { (label) }
                                td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(*amount)) }
                            }
                        }

                        @if lines.is_empty() && extra_rows.is_empty() {
                            tr class=(TABLE_ROW_STYLE)
                            {
                                td colspan="3" class="px-6 py-4 text-center" { "Nothing to show." }
                            }
                        }
                    }

                    tfoot class="text-gray-900 dark:text-white"
                    {
                        tr class="font-semibold"
                        {
                            th scope="row" colspan="2" class=(TABLE_CELL_STYLE) { "Total " (title.to_lowercase()) }
                            td class=(TABLE_NUMBER_CELL_STYLE) data-section-total { (format_currency(total)) }
                        }
                    }
                }
            }
        }
    }
}
