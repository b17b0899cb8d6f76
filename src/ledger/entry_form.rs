//! The form for posting a manual journal entry.

use axum::{
    Extension,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
// Repeated fields need serde_html_form, which axum_extra's Form uses.
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    account::{Account, AccountId, list_accounts, sort_as_tree},
    app_state::DbState,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_TEXT_INPUT_STYLE, PAGE_CONTAINER_STYLE,
        TABLE_CELL_STYLE, TABLE_HEADER_STYLE, TABLE_STYLE, WIDE_FORM_CONTAINER_STYLE,
        add_line_script, base, date_input, page_header, text_input,
    },
    ledger::{EntrySource, JournalLine, NewJournalEntry, post_entry},
    money::parse_optional_amount,
    navigation::NavBar,
    organization::Tenant,
    timezone::local_today,
};

/// The number of blank rows on a new entry form.
const INITIAL_ROWS: usize = 4;

fn account_select(accounts: &[Account]) -> Markup {
    html! {
        select name="account_id" aria-label="Account" class=(FORM_TEXT_INPUT_STYLE)
        {
            option value="" { "Select an account" }

            @for account in accounts {
                option value=(account.id) { (account.code) " " (account.name) }
            }
        }
    }
}

fn line_row(accounts: &[Account]) -> Markup {
    html! {
        tr data-line-row
        {
            td class="px-2 py-2 min-w-48" { (account_select(accounts)) }
            td class="px-2 py-2"
            {
                input
                    type="text"
                    inputmode="decimal"
                    name="debit"
                    aria-label="Debit"
                    placeholder="0.00"
                    class=(FORM_TEXT_INPUT_STYLE);
            }
            td class="px-2 py-2"
            {
                input
                    type="text"
                    inputmode="decimal"
                    name="credit"
                    aria-label="Credit"
                    placeholder="0.00"
                    class=(FORM_TEXT_INPUT_STYLE);
            }
            td class="px-2 py-2"
            {
                input
                    type="text"
                    name="description"
                    aria-label="Description"
                    class=(FORM_TEXT_INPUT_STYLE);
            }
        }
    }
}

fn new_entry_view(accounts: &[Account], today: Date) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_JOURNAL_ENTRY_VIEW).into_html();
    let row = line_row(accounts);

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-4"
            {
                (page_header("New Journal Entry", Some((endpoints::JOURNAL_VIEW, "Back to journal"))))

                div class=(WIDE_FORM_CONTAINER_STYLE)
                {
                    form
                        hx-post=(endpoints::JOURNAL_API)
                        hx-target-error="#alert-container"
                        class="w-full space-y-4"
                    {
                        div class="grid gap-4 md:grid-cols-2"
                        {
                            (date_input("Date", "date", today))
                            (text_input("Memo", "memo", "", false))
                        }

                        table class=(TABLE_STYLE)
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Account" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Debit" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Credit" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Description" }
                                }
                            }

                            tbody id="lines"
                            {
                                @for _ in 0..INITIAL_ROWS {
                                    (row)
                                }
                            }
                        }

                        template id="line-template" { (row) }

                        div class="flex gap-4"
                        {
                            button type="button" id="add-line" class=(BUTTON_SECONDARY_STYLE)
                            {
                                "Add line"
                            }

                            button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Post entry" }
                        }
                    }
                }
            }
        }
    };

    base(
        "New Journal Entry",
        &[add_line_script()],
        &content,
    )
}

/// Display the form for a manual journal entry.
pub async fn get_new_entry_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let accounts: Vec<Account> = sort_as_tree(list_accounts(tenant.organization_id, &connection)?)
        .into_iter()
        .filter(|account| !account.archived)
        .collect();

    Ok(new_entry_view(&accounts, today).into_response())
}

/// The form data for a manual journal entry.
///
/// Each line is spread over the four repeated fields, matched up by position.
#[derive(Debug, Deserialize)]
pub struct JournalEntryForm {
    pub date: Date,
    #[serde(default)]
    pub memo: String,
    #[serde(default)]
    pub account_id: Vec<String>,
    #[serde(default)]
    pub debit: Vec<String>,
    #[serde(default)]
    pub credit: Vec<String>,
    #[serde(default)]
    pub description: Vec<String>,
}

impl JournalEntryForm {
    /// Collect the filled in rows into journal lines. Blank rows are skipped.
    ///
    /// # Errors
    ///
    /// - [Error::InvalidLine] with the row number if a row has an amount but no account.
    /// - [Error::InvalidAccount] if an account ID is not a number.
    /// - [Error::InvalidAmount] if an amount cannot be parsed.
    fn lines(&self) -> Result<Vec<JournalLine>, Error> {
        let field = |values: &[String], index: usize| -> String {
            values
                .get(index)
                .map(|value| value.trim().to_owned())
                .unwrap_or_default()
        };

        let mut lines = Vec::new();

        for index in 0..self.account_id.len() {
            let account_id = field(&self.account_id, index);
            let debit = field(&self.debit, index);
            let credit = field(&self.credit, index);
            let description = field(&self.description, index);

            if account_id.is_empty() {
                if debit.is_empty() && credit.is_empty() {
                    continue;
                }

                return Err(Error::InvalidLine(index + 1));
            }

            let account_id: AccountId = account_id
                .parse()
                .map_err(|_| Error::InvalidAccount(format!("\"{account_id}\" is not an account")))?;

            lines.push(JournalLine {
                account_id,
                debit: parse_optional_amount(&debit)?,
                credit: parse_optional_amount(&credit)?,
                description,
            });
        }

        Ok(lines)
    }
}

/// Post a manual journal entry and redirect to it.
pub async fn post_journal_entry(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Form(form): Form<JournalEntryForm>,
) -> Response {
    let lines = match form.lines() {
        Ok(lines) => lines,
        Err(error) => return error.into_alert_response(),
    };

    let mut new_entry = NewJournalEntry::new(form.date, &form.memo, EntrySource::Manual);
    new_entry.lines = lines;

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match post_entry(tenant, new_entry, &connection) {
        Ok(entry) => (
            HxRedirect(format_endpoint(endpoints::JOURNAL_ENTRY_VIEW, entry.id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::debug!("rejected journal entry: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod new_entry_page_tests {
    use axum::{Extension, extract::State};

    use crate::{
        account::set_account_archived,
        ledger::get_new_entry_page,
        endpoints,
        test_utils::{
            TestBooks, account_by_code, assert_hx_endpoint, assert_valid_html, must_get_form,
            parse_html_document, select_texts,
        },
    };

    #[tokio::test]
    async fn offers_active_accounts() {
        let books = TestBooks::standard();
        let rent = account_by_code(&books, "6100");
        set_account_archived(books.organization_id(), rent.id, true, &books.connection).unwrap();
        let (state, tenant) = books.db_state();

        let response = get_new_entry_page(State(state), Extension(tenant))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::JOURNAL_API, "hx-post");
        let options = select_texts(&document, "tbody#lines tr:first-child option");
        assert!(options.contains(&"1010 Cash on Hand".to_owned()));
        assert!(!options.iter().any(|option| option.contains("Rent")));
        assert_eq!(select_texts(&document, "tbody#lines [data-line-row]").len(), 4);
    }
}

#[cfg(test)]
mod post_journal_entry_tests {
    use axum::{Extension, extract::State, http::StatusCode};
    use axum_extra::extract::Form;
    use time::macros::date;

    use crate::{
        Error,
        endpoints::{self, format_endpoint},
        ledger::{
            EntrySource, count_entries, entry_form::JournalEntryForm, list_entries,
            post_journal_entry,
        },
        money::Money,
        test_utils::{TestBooks, account_by_code, assert_hx_redirect},
    };

    fn strings(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| (*value).to_owned()).collect()
    }

    fn form(account_ids: &[&str], debits: &[&str], credits: &[&str]) -> JournalEntryForm {
        JournalEntryForm {
            date: date!(2025 - 04 - 01),
            memo: "Owner contribution".to_owned(),
            account_id: strings(account_ids),
            debit: strings(debits),
            credit: strings(credits),
            description: strings(&vec![""; account_ids.len()]),
        }
    }

    #[tokio::test]
    async fn posts_balanced_entry() {
        let books = TestBooks::standard();
        let bank = account_by_code(&books, "1020").id.to_string();
        let capital = account_by_code(&books, "3000").id.to_string();
        let (state, tenant) = books.db_state();

        let response = post_journal_entry(
            State(state.clone()),
            Extension(tenant),
            Form(form(
                &[&bank, &capital, "", ""],
                &["1,000.00", "", "", ""],
                &["", "1000", "", ""],
            )),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let entries = list_entries(tenant.organization_id, 10, 0, &connection).unwrap();
        assert_eq!(entries.len(), 1);
        let entry = &entries[0];
        assert_hx_redirect(
            &response,
            &format_endpoint(endpoints::JOURNAL_ENTRY_VIEW, entry.id),
        );
        assert_eq!(entry.source, EntrySource::Manual);
        assert_eq!(entry.memo, "Owner contribution");
        assert_eq!(entry.total(), Money::from_dollars(1000));
        assert_eq!(entry.lines.len(), 2);
    }

    #[tokio::test]
    async fn rejects_unbalanced_entry() {
        let books = TestBooks::standard();
        let bank = account_by_code(&books, "1020").id.to_string();
        let capital = account_by_code(&books, "3000").id.to_string();
        let (state, tenant) = books.db_state();

        let response = post_journal_entry(
            State(state.clone()),
            Extension(tenant),
            Form(form(&[&bank, &capital], &["100", ""], &["", "90"])),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_entries(tenant.organization_id, &connection).unwrap(), 0);
    }

    #[tokio::test]
    async fn huge_amounts_are_rejected_and_books_stay_usable() {
        let books = TestBooks::standard();
        let bank = account_by_code(&books, "1020").id.to_string();
        let capital = account_by_code(&books, "3000").id.to_string();
        let (state, tenant) = books.db_state();

        let response = post_journal_entry(
            State(state.clone()),
            Extension(tenant),
            Form(form(
                &[&bank, &bank, &capital],
                &["92233720368547758.07", "1", ""],
                &["", "", "1"],
            )),
        )
        .await;

        assert!(response.status().is_client_error());
        assert!(!state.db_connection.is_poisoned());

        let response = post_journal_entry(
            State(state.clone()),
            Extension(tenant),
            Form(form(&[&bank, &capital], &["10", ""], &["", "10"])),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        assert_eq!(count_entries(tenant.organization_id, &connection).unwrap(), 1);
    }

    #[test]
    fn rejects_amount_without_account() {
        let got = form(&["1", ""], &["100", ""], &["", "100"]).lines();

        assert_eq!(got, Err(Error::InvalidLine(2)));
    }

    #[test]
    fn skips_blank_rows() {
        let got = form(&["1", "", "2"], &["5", "", ""], &["", "", "5.00"])
            .lines()
            .unwrap();

        assert_eq!(got.len(), 2);
        assert_eq!(got[1].account_id, 2);
        assert_eq!(got[1].credit, Money::from_dollars(5));
    }

    #[tokio::test]
    async fn rejects_other_organizations_account() {
        let books = TestBooks::standard();
        let other = books.other_organization();
        let bank = account_by_code(&books, "1020").id.to_string();
        let foreign = books.account_in(other, "3000").id.to_string();
        let (state, tenant) = books.db_state();

        let response = post_journal_entry(
            State(state),
            Extension(tenant),
            Form(form(&[&bank, &foreign], &["100", ""], &["", "100"])),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
