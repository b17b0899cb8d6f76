use axum::{
    Extension,
    extract::{Query, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};
use unicode_segmentation::UnicodeSegmentation;

use crate::{
    Error,
    app_state::ListState,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_NEUTRAL_COLOUR, BADGE_SUCCESS_COLOUR, LINK_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_NUMBER_CELL_STYLE, TABLE_ROW_STYLE,
        TABLE_STYLE, badge, base, format_currency, format_date, page_header,
    },
    ledger::{EntryStatus, JournalEntry, count_entries, list_entries},
    navigation::NavBar,
    organization::Tenant,
    pagination::{PageQuery, PageWindow, pagination_view},
};

/// The max number of graphemes of a memo to show in the journal table.
const MAX_MEMO_GRAPHEMES: usize = 40;

/// The memo shortened for the table, plus the full text when it was cut.
fn format_memo(memo: &str) -> (String, Option<&str>) {
    if memo.graphemes(true).count() <= MAX_MEMO_GRAPHEMES {
        return (memo.to_owned(), None);
    }

    let truncated: String = memo.graphemes(true).take(MAX_MEMO_GRAPHEMES - 3).collect();
    (truncated + "...", Some(memo))
}

pub(super) fn status_badge(status: EntryStatus) -> Markup {
    let colour = match status {
        EntryStatus::Posted => BADGE_SUCCESS_COLOUR,
        EntryStatus::Reversed => BADGE_NEUTRAL_COLOUR,
    };

    badge(status.label(), colour)
}

fn journal_view(entries: &[JournalEntry], window: &PageWindow, max_pages: u64) -> Markup {
    let nav_bar = NavBar::new(endpoints::JOURNAL_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl space-y-4"
            {
                (page_header("Journal", Some((endpoints::NEW_JOURNAL_ENTRY_VIEW, "New entry"))))

                div class="flex justify-end"
                {
                    a href=(endpoints::JOURNAL_CSV) class=(LINK_STYLE) download { "Export CSV" }
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
                                th scope="col" class=(TABLE_CELL_STYLE) { "Memo" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Source" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "Status" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Total" }
                            }
                        }

                        tbody
                        {
                            @for entry in entries {
                                tr class=(TABLE_ROW_STYLE) data-entry-row
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a
                                            href=(format_endpoint(endpoints::JOURNAL_ENTRY_VIEW, entry.id))
                                            class=(LINK_STYLE)
                                        {
                                            (entry.number)
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        time datetime=(format_date(entry.date)) { (format_date(entry.date)) }
                                    }
                                    @let (memo, full_memo) = format_memo(&entry.memo);
                                    td class=(TABLE_CELL_STYLE) title=[full_memo] data-memo { (memo) }
                                    td class=(TABLE_CELL_STYLE) { (entry.source) }
                                    td class=(TABLE_CELL_STYLE) { (status_badge(entry.status)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(entry.total())) }
                                }
                            }

                            @if entries.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="6" class="px-6 py-4 text-center"
                                    {
                                        "Nothing has been posted yet."
                                    }
                                }
                            }
                        }
                    }
                }

                (pagination_view(endpoints::JOURNAL_VIEW, window, max_pages))
            }
        }
    };

    base("Journal", &[], &content)
}

/// Display a page of journal entries, newest first.
pub async fn get_journal_page(
    State(state): State<ListState>,
    Extension(tenant): Extension<Tenant>,
    Query(query): Query<PageQuery>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let entry_count = count_entries(tenant.organization_id, &connection)?;
    let window = PageWindow::new(&query, &state.pagination_config, entry_count);
    let entries = list_entries(
        tenant.organization_id,
        window.per_page,
        window.offset(),
        &connection,
    )?;

    Ok(journal_view(&entries, &window, state.pagination_config.max_pages).into_response())
}

#[cfg(test)]
mod journal_page_tests {
    use axum::{
        Extension,
        extract::{Query, State},
    };
    use time::macros::date;

    use crate::{
        ledger::{EntrySource, NewJournalEntry, get_journal_page, post_entry},
        money::Money,
        pagination::PageQuery,
        test_utils::{
            TestBooks, account_by_code, assert_valid_html, parse_html_document, select_texts,
        },
    };

    fn post_cash_sale(books: &TestBooks, day: u8, amount: i64) {
        let cash = account_by_code(books, "1010");
        let sales = account_by_code(books, "4000");
        let date = date!(2025 - 03 - 01).replace_day(day).unwrap();
        let entry = NewJournalEntry::new(date, &format!("Sale {day}"), EntrySource::Manual)
            .debit(cash.id, Money::from_dollars(amount), "")
            .credit(sales.id, Money::from_dollars(amount), "");

        post_entry(books.tenant, entry, &books.connection).unwrap();
    }

    #[tokio::test]
    async fn lists_newest_entries_first() {
        let books = TestBooks::standard();
        post_cash_sale(&books, 1, 10);
        post_cash_sale(&books, 3, 30);
        post_cash_sale(&books, 2, 20);
        let (state, tenant) = books.list_state();

        let response = get_journal_page(State(state), Extension(tenant), Query(PageQuery::default()))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(
            select_texts(&document, "[data-entry-row] td:nth-child(3)"),
            ["Sale 3", "Sale 2", "Sale 1"]
        );
        assert_eq!(
            select_texts(&document, "[data-entry-row] td:nth-child(6)"),
            ["$30.00", "$20.00", "$10.00"]
        );
    }

    #[tokio::test]
    async fn pages_through_entries() {
        let books = TestBooks::standard();
        for day in 1..=5 {
            post_cash_sale(&books, day, i64::from(day));
        }
        let (state, tenant) = books.list_state();

        let response = get_journal_page(
            State(state),
            Extension(tenant),
            Query(PageQuery {
                page: Some(2),
                per_page: Some(2),
            }),
        )
        .await
        .unwrap();

        let document = parse_html_document(response).await;
        assert_eq!(
            select_texts(&document, "[data-entry-row] td:nth-child(3)"),
            ["Sale 3", "Sale 2"]
        );
        assert_eq!(select_texts(&document, "nav[aria-label=Pagination] [aria-current=page]"), ["2"]);
    }

    #[tokio::test]
    async fn hides_other_organizations_entries() {
        let books = TestBooks::standard();
        let other = books.other_tenant();
        let cash = books.account_in(other.organization_id, "1010");
        let sales = books.account_in(other.organization_id, "4000");
        let entry = NewJournalEntry::new(date!(2025 - 03 - 01), "Elsewhere", EntrySource::Manual)
            .debit(cash.id, Money::from_dollars(5), "")
            .credit(sales.id, Money::from_dollars(5), "");
        post_entry(other, entry, &books.connection).unwrap();
        let (state, tenant) = books.list_state();

        let response = get_journal_page(State(state), Extension(tenant), Query(PageQuery::default()))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert!(select_texts(&document, "[data-entry-row]").is_empty());
    }
}

#[cfg(test)]
mod format_memo_tests {
    use crate::ledger::journal_page::{MAX_MEMO_GRAPHEMES, format_memo};

    #[test]
    fn short_memo_is_unchanged() {
        assert_eq!(format_memo("Rent for March"), ("Rent for March".to_owned(), None));
    }

    #[test]
    fn long_memo_is_cut_on_grapheme_boundaries() {
        let memo = "é".repeat(MAX_MEMO_GRAPHEMES + 5);

        let (shown, full) = format_memo(&memo);

        assert_eq!(shown, format!("{}...", "é".repeat(MAX_MEMO_GRAPHEMES - 3)));
        assert_eq!(full, Some(memo.as_str()));
    }
}
