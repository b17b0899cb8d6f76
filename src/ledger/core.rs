//! The journal: an append-only record of balanced entries.
//!
//! Every change to the books goes through [post_entry] or [reverse_entry].
//! Subledgers that need to write their own rows in the same transaction call
//! [insert_entry] and [insert_reversal] on an open transaction instead.

use std::collections::HashSet;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::{Date, OffsetDateTime};

use crate::{
    Error,
    account::{AccountId, get_account},
    auth::UserID,
    document::{format_number, next_sequence},
    money::Money,
    organization::{OrganizationId, Tenant, ensure_period_open},
    sql_enum::sql_text_enum,
};

pub type JournalEntryId = i64;

/// The prefix of journal entry numbers, e.g. JE-000001.
pub const ENTRY_NUMBER_PREFIX: &str = "JE";

/// What created a journal entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntrySource {
    Manual,
    Invoice,
    InvoicePayment,
    Bill,
    BillPayment,
    Sale,
    StockAdjustment,
    Reversal,
}

impl EntrySource {
    pub const ALL: [EntrySource; 8] = [
        EntrySource::Manual,
        EntrySource::Invoice,
        EntrySource::InvoicePayment,
        EntrySource::Bill,
        EntrySource::BillPayment,
        EntrySource::Sale,
        EntrySource::StockAdjustment,
        EntrySource::Reversal,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntrySource::Manual => "manual",
            EntrySource::Invoice => "invoice",
            EntrySource::InvoicePayment => "invoice_payment",
            EntrySource::Bill => "bill",
            EntrySource::BillPayment => "bill_payment",
            EntrySource::Sale => "sale",
            EntrySource::StockAdjustment => "stock_adjustment",
            EntrySource::Reversal => "reversal",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntrySource::Manual => "Manual",
            EntrySource::Invoice => "Invoice",
            EntrySource::InvoicePayment => "Invoice payment",
            EntrySource::Bill => "Bill",
            EntrySource::BillPayment => "Bill payment",
            EntrySource::Sale => "Sale",
            EntrySource::StockAdjustment => "Stock adjustment",
            EntrySource::Reversal => "Reversal",
        }
    }
}

sql_text_enum!(EntrySource);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryStatus {
    Posted,
    /// A reversing entry has been posted against this entry.
    Reversed,
}

impl EntryStatus {
    pub const ALL: [EntryStatus; 2] = [EntryStatus::Posted, EntryStatus::Reversed];

    pub fn as_str(&self) -> &'static str {
        match self {
            EntryStatus::Posted => "posted",
            EntryStatus::Reversed => "reversed",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            EntryStatus::Posted => "Posted",
            EntryStatus::Reversed => "Reversed",
        }
    }
}

sql_text_enum!(EntryStatus);

/// One side of a journal entry: a debit or a credit to a single account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JournalLine {
    pub account_id: AccountId,
    pub debit: Money,
    pub credit: Money,
    pub description: String,
}

impl JournalLine {
    pub fn debit(account_id: AccountId, amount: Money, description: &str) -> Self {
        Self {
            account_id,
            debit: amount,
            credit: Money::ZERO,
            description: description.to_owned(),
        }
    }

    pub fn credit(account_id: AccountId, amount: Money, description: &str) -> Self {
        Self {
            account_id,
            debit: Money::ZERO,
            credit: amount,
            description: description.to_owned(),
        }
    }

    /// The same line with its debit and credit swapped.
    pub fn swapped(&self) -> Self {
        Self {
            account_id: self.account_id,
            debit: self.credit,
            credit: self.debit,
            description: self.description.clone(),
        }
    }
}

/// A journal entry that has not been posted yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewJournalEntry {
    pub date: Date,
    pub memo: String,
    pub source: EntrySource,
    /// The ID of the invoice, bill, sale or product that created the entry.
    pub source_id: Option<i64>,
    pub lines: Vec<JournalLine>,
}

impl NewJournalEntry {
    pub fn new(date: Date, memo: &str, source: EntrySource) -> Self {
        Self {
            date,
            memo: memo.to_owned(),
            source,
            source_id: None,
            lines: Vec::new(),
        }
    }

    pub fn source_id(mut self, source_id: i64) -> Self {
        self.source_id = Some(source_id);
        self
    }

    pub fn line(mut self, line: JournalLine) -> Self {
        self.lines.push(line);
        self
    }

    /// Add a debit line. Zero amounts are skipped, so optional parts of a
    /// document such as tax can be added unconditionally.
    pub fn debit(self, account_id: AccountId, amount: Money, description: &str) -> Self {
        if amount.is_zero() {
            return self;
        }

        self.line(JournalLine::debit(account_id, amount, description))
    }

    /// Add a credit line. Zero amounts are skipped.
    pub fn credit(self, account_id: AccountId, amount: Money, description: &str) -> Self {
        if amount.is_zero() {
            return self;
        }

        self.line(JournalLine::credit(account_id, amount, description))
    }
}

/// A posted journal entry.
#[derive(Debug, Clone, PartialEq)]
pub struct JournalEntry {
    pub id: JournalEntryId,
    pub organization_id: OrganizationId,
    /// The display number, e.g. JE-000001.
    pub number: String,
    pub date: Date,
    pub memo: String,
    pub source: EntrySource,
    pub source_id: Option<i64>,
    pub status: EntryStatus,
    /// The entry this entry reverses.
    pub reverses: Option<JournalEntryId>,
    /// The entry that reversed this entry.
    pub reversed_by: Option<JournalEntryId>,
    pub created_by: UserID,
    pub created_at: OffsetDateTime,
    pub lines: Vec<JournalLine>,
}

impl JournalEntry {
    /// The sum of the debits, which equals the sum of the credits.
    pub fn total(&self) -> Money {
        self.lines.iter().map(|line| line.debit).sum()
    }

    pub fn can_be_reversed(&self) -> bool {
        self.status == EntryStatus::Posted && self.reverses.is_none()
    }
}

/// Create the journal tables.
///
/// Triggers make entries and lines append-only. The only update allowed is
/// marking an entry as reversed.
pub fn create_journal_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS journal_entry (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL REFERENCES organization(id),
            sequence INTEGER NOT NULL,
            date TEXT NOT NULL,
            memo TEXT NOT NULL,
            source TEXT NOT NULL,
            source_id INTEGER,
            status TEXT NOT NULL DEFAULT 'posted' CHECK (status IN ('posted', 'reversed')),
            reverses INTEGER REFERENCES journal_entry(id),
            reversed_by INTEGER REFERENCES journal_entry(id),
            created_by INTEGER NOT NULL REFERENCES user(id),
            created_at TEXT NOT NULL,
            UNIQUE(organization_id, sequence)
        );

        CREATE INDEX IF NOT EXISTS journal_entry_organization_date
            ON journal_entry(organization_id, date);

        CREATE TABLE IF NOT EXISTS journal_line (
            id INTEGER PRIMARY KEY,
            entry_id INTEGER NOT NULL REFERENCES journal_entry(id),
            account_id INTEGER NOT NULL REFERENCES account(id),
            debit INTEGER NOT NULL CHECK (debit >= 0),
            credit INTEGER NOT NULL CHECK (credit >= 0),
            description TEXT NOT NULL,
            CHECK ((debit > 0 AND credit = 0) OR (credit > 0 AND debit = 0))
        );

        CREATE INDEX IF NOT EXISTS journal_line_entry ON journal_line(entry_id);
        CREATE INDEX IF NOT EXISTS journal_line_account ON journal_line(account_id);

        CREATE TRIGGER IF NOT EXISTS journal_entry_append_only
        BEFORE UPDATE OF organization_id, sequence, date, memo, source, source_id, reverses,
            created_by, created_at ON journal_entry
        BEGIN
            SELECT RAISE(ABORT, 'journal entries cannot be changed');
        END;

        CREATE TRIGGER IF NOT EXISTS journal_entry_no_delete
        BEFORE DELETE ON journal_entry
        BEGIN
            SELECT RAISE(ABORT, 'journal entries cannot be deleted');
        END;

        CREATE TRIGGER IF NOT EXISTS journal_line_append_only
        BEFORE UPDATE ON journal_line
        BEGIN
            SELECT RAISE(ABORT, 'journal lines cannot be changed');
        END;

        CREATE TRIGGER IF NOT EXISTS journal_line_no_delete
        BEFORE DELETE ON journal_line
        BEGIN
            SELECT RAISE(ABORT, 'journal lines cannot be deleted');
        END;",
    )
}

/// Check the shape of an entry's lines and return the entry total.
///
/// # Errors
///
/// - [Error::TooFewLines] if there are fewer than two lines.
/// - [Error::InvalidLine] with the one-based line number if a line does not
///   have exactly one positive side.
/// - [Error::InvalidAmount] if the debits or credits overflow when summed.
/// - [Error::UnbalancedEntry] if debits and credits differ.
pub fn validate_lines(lines: &[JournalLine]) -> Result<Money, Error> {
    if lines.len() < 2 {
        return Err(Error::TooFewLines);
    }

    for (index, line) in lines.iter().enumerate() {
        let is_debit = line.debit.is_positive() && line.credit.is_zero();
        let is_credit = line.credit.is_positive() && line.debit.is_zero();

        if !(is_debit || is_credit) {
            return Err(Error::InvalidLine(index + 1));
        }
    }

    let debits = Money::try_sum(lines.iter().map(|line| line.debit))?;
    let credits = Money::try_sum(lines.iter().map(|line| line.credit))?;

    if debits != credits {
        return Err(Error::UnbalancedEntry { debits, credits });
    }

    Ok(debits)
}

fn validate_accounts(
    organization_id: OrganizationId,
    lines: &[JournalLine],
    allow_archived: bool,
    connection: &Connection,
) -> Result<(), Error> {
    let account_ids: HashSet<AccountId> = lines.iter().map(|line| line.account_id).collect();

    for account_id in account_ids {
        let account = match get_account(organization_id, account_id, connection) {
            Ok(account) => account,
            Err(Error::NotFound) => {
                return Err(Error::InvalidAccount(format!(
                    "account {account_id} does not exist"
                )));
            }
            Err(error) => return Err(error),
        };

        if account.archived && !allow_archived {
            return Err(Error::InvalidAccount(format!(
                "{} {} is archived",
                account.code, account.name
            )));
        }
    }

    Ok(())
}

/// Validate and post a journal entry in its own transaction.
///
/// Either the entry and all of its lines are stored, or nothing is.
///
/// # Errors
///
/// See [validate_lines], plus:
/// - [Error::InvalidAccount] if an account is missing, archived, or belongs
///   to another organization.
/// - [Error::PeriodLocked] if the date is on or before the lock date.
pub fn post_entry(
    tenant: Tenant,
    new_entry: NewJournalEntry,
    connection: &Connection,
) -> Result<JournalEntry, Error> {
    let transaction = connection.unchecked_transaction()?;
    let entry = insert_entry(tenant, new_entry, &transaction)?;
    transaction.commit()?;

    Ok(entry)
}

/// Validate and insert a journal entry without starting a transaction.
///
/// The caller must run this inside a transaction so that a failure part way
/// through leaves no partial entry behind.
pub(crate) fn insert_entry(
    tenant: Tenant,
    new_entry: NewJournalEntry,
    connection: &Connection,
) -> Result<JournalEntry, Error> {
    write_entry(tenant, new_entry, None, connection)
}

fn write_entry(
    tenant: Tenant,
    new_entry: NewJournalEntry,
    reverses: Option<JournalEntryId>,
    connection: &Connection,
) -> Result<JournalEntry, Error> {
    let organization_id = tenant.organization_id;

    validate_lines(&new_entry.lines)?;
    validate_accounts(
        organization_id,
        &new_entry.lines,
        reverses.is_some(),
        connection,
    )?;
    ensure_period_open(organization_id, new_entry.date, connection)?;

    let sequence = next_sequence("journal_entry", organization_id, connection)?;
    let created_at = OffsetDateTime::now_utc();
    let memo = new_entry.memo.trim().to_owned();

    connection.execute(
        "INSERT INTO journal_entry
            (organization_id, sequence, date, memo, source, source_id, status, reverses,
            created_by, created_at)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, 'posted', ?7, ?8, ?9)",
        (
            organization_id,
            sequence,
            new_entry.date,
            &memo,
            new_entry.source,
            new_entry.source_id,
            reverses,
            tenant.user_id.as_i64(),
            created_at,
        ),
    )?;
    let id = connection.last_insert_rowid();

    let mut statement = connection.prepare(
        "INSERT INTO journal_line (entry_id, account_id, debit, credit, description)
        VALUES (?1, ?2, ?3, ?4, ?5)",
    )?;
    for line in &new_entry.lines {
        statement.execute((
            id,
            line.account_id,
            line.debit,
            line.credit,
            line.description.trim(),
        ))?;
    }

    tracing::debug!(
        "Posted journal entry {} for organization {organization_id}",
        format_number(ENTRY_NUMBER_PREFIX, sequence)
    );

    Ok(JournalEntry {
        id,
        organization_id,
        number: format_number(ENTRY_NUMBER_PREFIX, sequence),
        date: new_entry.date,
        memo,
        source: new_entry.source,
        source_id: new_entry.source_id,
        status: EntryStatus::Posted,
        reverses,
        reversed_by: None,
        created_by: tenant.user_id,
        created_at,
        lines: new_entry
            .lines
            .into_iter()
            .map(|line| JournalLine {
                description: line.description.trim().to_owned(),
                ..line
            })
            .collect(),
    })
}

/// Post an entry that cancels `entry_id` and mark the original as reversed.
///
/// Returns the reversing entry. `memo` defaults to "Reversal of JE-...".
///
/// # Errors
///
/// - [Error::NotFound] if the entry does not exist in the tenant's organization.
/// - [Error::CannotReverseReversal] if the entry is itself a reversal.
/// - [Error::AlreadyReversed] if the entry has already been reversed,
///   including by a concurrent request.
/// - [Error::ReversalBeforeOriginal] if `date` is before the original date.
/// - [Error::PeriodLocked] if `date` is on or before the lock date.
pub fn reverse_entry(
    tenant: Tenant,
    entry_id: JournalEntryId,
    date: Date,
    memo: Option<&str>,
    connection: &Connection,
) -> Result<JournalEntry, Error> {
    let transaction = connection.unchecked_transaction()?;
    let reversal = insert_reversal(tenant, entry_id, date, memo, &transaction)?;
    transaction.commit()?;

    Ok(reversal)
}

/// [reverse_entry] without starting a transaction.
pub(crate) fn insert_reversal(
    tenant: Tenant,
    entry_id: JournalEntryId,
    date: Date,
    memo: Option<&str>,
    connection: &Connection,
) -> Result<JournalEntry, Error> {
    let original = get_entry(tenant.organization_id, entry_id, connection)?;

    if original.reverses.is_some() {
        return Err(Error::CannotReverseReversal);
    }
    if original.status == EntryStatus::Reversed {
        return Err(Error::AlreadyReversed);
    }
    if date < original.date {
        return Err(Error::ReversalBeforeOriginal(original.date));
    }

    let default_memo = format!("Reversal of {}", original.number);
    let memo = memo
        .map(str::trim)
        .filter(|memo| !memo.is_empty())
        .unwrap_or(&default_memo);

    let new_entry = NewJournalEntry {
        date,
        memo: memo.to_owned(),
        source: EntrySource::Reversal,
        source_id: original.source_id,
        lines: original.lines.iter().map(JournalLine::swapped).collect(),
    };
    let reversal = write_entry(tenant, new_entry, Some(original.id), connection)?;
    mark_reversed(tenant, original.id, reversal.id, connection)?;

    Ok(reversal)
}

/// Flag `original_id` as reversed by `reversal_id`.
///
/// Only a posted entry matches, so when two reversals race on separate
/// connections the one that commits second gets [Error::AlreadyReversed]
/// and its transaction is rolled back.
fn mark_reversed(
    tenant: Tenant,
    original_id: JournalEntryId,
    reversal_id: JournalEntryId,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE journal_entry SET status = 'reversed', reversed_by = ?1
        WHERE id = ?2 AND organization_id = ?3 AND status = 'posted'",
        (reversal_id, original_id, tenant.organization_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::AlreadyReversed);
    }

    Ok(())
}

const ENTRY_COLUMNS: &str = "id, organization_id, sequence, date, memo, source, source_id, \
    status, reverses, reversed_by, created_by, created_at";

fn map_row_to_entry(row: &Row) -> Result<JournalEntry, rusqlite::Error> {
    Ok(JournalEntry {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        number: format_number(ENTRY_NUMBER_PREFIX, row.get(2)?),
        date: row.get(3)?,
        memo: row.get(4)?,
        source: row.get(5)?,
        source_id: row.get(6)?,
        status: row.get(7)?,
        reverses: row.get(8)?,
        reversed_by: row.get(9)?,
        created_by: UserID::new(row.get(10)?),
        created_at: row.get(11)?,
        lines: Vec::new(),
    })
}

fn get_lines(entry_id: JournalEntryId, connection: &Connection) -> Result<Vec<JournalLine>, Error> {
    connection
        .prepare(
            "SELECT account_id, debit, credit, description FROM journal_line
            WHERE entry_id = ?1 ORDER BY id",
        )?
        .query_map((entry_id,), |row| {
            Ok(JournalLine {
                account_id: row.get(0)?,
                debit: row.get(1)?,
                credit: row.get(2)?,
                description: row.get(3)?,
            })
        })?
        .map(|maybe_line| maybe_line.map_err(Error::from))
        .collect()
}

/// Get a journal entry and its lines.
///
/// # Errors
///
/// Returns [Error::NotFound] if the entry does not exist in the organization.
pub fn get_entry(
    organization_id: OrganizationId,
    entry_id: JournalEntryId,
    connection: &Connection,
) -> Result<JournalEntry, Error> {
    let mut entry = connection.query_row(
        &format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entry WHERE id = ?1 AND organization_id = ?2"
        ),
        (entry_id, organization_id),
        map_row_to_entry,
    )?;
    entry.lines = get_lines(entry.id, connection)?;

    Ok(entry)
}

/// A page of journal entries, newest first.
pub fn list_entries(
    organization_id: OrganizationId,
    limit: u64,
    offset: u64,
    connection: &Connection,
) -> Result<Vec<JournalEntry>, Error> {
    let mut entries = connection
        .prepare(&format!(
            "SELECT {ENTRY_COLUMNS} FROM journal_entry WHERE organization_id = ?1
            ORDER BY date DESC, sequence DESC LIMIT ?2 OFFSET ?3"
        ))?
        .query_map(
            (
                organization_id,
                i64::try_from(limit).unwrap_or(i64::MAX),
                i64::try_from(offset).unwrap_or(i64::MAX),
            ),
            map_row_to_entry,
        )?
        .collect::<Result<Vec<_>, _>>()?;

    for entry in &mut entries {
        entry.lines = get_lines(entry.id, connection)?;
    }

    Ok(entries)
}

pub fn count_entries(
    organization_id: OrganizationId,
    connection: &Connection,
) -> Result<u64, Error> {
    let count: i64 = connection.query_row(
        "SELECT COUNT(*) FROM journal_entry WHERE organization_id = ?1",
        (organization_id,),
        |row| row.get(0),
    )?;

    Ok(count.unsigned_abs())
}

/// A line posted to one account, with the entry it belongs to.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountActivity {
    pub entry_id: JournalEntryId,
    pub number: String,
    pub date: Date,
    pub memo: String,
    pub description: String,
    pub debit: Money,
    pub credit: Money,
}

/// Every line posted to `account_id`, oldest first.
pub fn account_activity(
    organization_id: OrganizationId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Vec<AccountActivity>, Error> {
    connection
        .prepare(
            "SELECT e.id, e.sequence, e.date, e.memo, l.description, l.debit, l.credit
            FROM journal_line l
            INNER JOIN journal_entry e ON e.id = l.entry_id
            WHERE e.organization_id = ?1 AND l.account_id = ?2
            ORDER BY e.date, e.sequence, l.id",
        )?
        .query_map((organization_id, account_id), |row| {
            Ok(AccountActivity {
                entry_id: row.get(0)?,
                number: format_number(ENTRY_NUMBER_PREFIX, row.get(1)?),
                date: row.get(2)?,
                memo: row.get(3)?,
                description: row.get(4)?,
                debit: row.get(5)?,
                credit: row.get(6)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

/// One journal line flattened for export.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct JournalExportRow {
    pub number: String,
    #[serde(with = "crate::ledger::iso_date")]
    pub date: Date,
    pub memo: String,
    pub source: EntrySource,
    pub status: EntryStatus,
    pub account_code: String,
    pub account_name: String,
    pub description: String,
    pub debit: Money,
    pub credit: Money,
}

pub(crate) mod iso_date {
    //! Serializes a [time::Date] as YYYY-MM-DD.
    use serde::Serializer;
    use time::Date;

    pub fn serialize<S>(date: &Date, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(date)
    }
}

/// Every journal line in the organization, in posting order.
pub fn journal_export_rows(
    organization_id: OrganizationId,
    connection: &Connection,
) -> Result<Vec<JournalExportRow>, Error> {
    connection
        .prepare(
            "SELECT e.sequence, e.date, e.memo, e.source, e.status, a.code, a.name,
                l.description, l.debit, l.credit
            FROM journal_line l
            INNER JOIN journal_entry e ON e.id = l.entry_id
            INNER JOIN account a ON a.id = l.account_id
            WHERE e.organization_id = ?1
            ORDER BY e.sequence, l.id",
        )?
        .query_map((organization_id,), |row| {
            Ok(JournalExportRow {
                number: format_number(ENTRY_NUMBER_PREFIX, row.get(0)?),
                date: row.get(1)?,
                memo: row.get(2)?,
                source: row.get(3)?,
                status: row.get(4)?,
                account_code: row.get(5)?,
                account_name: row.get(6)?,
                description: row.get(7)?,
                debit: row.get(8)?,
                credit: row.get(9)?,
            })
        })?
        .map(|maybe_row| maybe_row.map_err(Error::from))
        .collect()
}

#[cfg(test)]
mod validate_lines_tests {
    use crate::{
        Error,
        ledger::{JournalLine, validate_lines},
        money::Money,
    };

    fn debit(cents: i64) -> JournalLine {
        JournalLine::debit(1, Money::from_cents(cents), "")
    }

    fn credit(cents: i64) -> JournalLine {
        JournalLine::credit(2, Money::from_cents(cents), "")
    }

    #[test]
    fn balanced_lines_return_total() {
        let got = validate_lines(&[debit(700), debit(300), credit(1000)]);

        assert_eq!(got, Ok(Money::from_cents(1000)));
    }

    #[test]
    fn single_line_is_too_few() {
        assert_eq!(validate_lines(&[debit(100)]), Err(Error::TooFewLines));
    }

    #[test]
    fn line_with_both_sides_is_invalid() {
        let both = JournalLine {
            credit: Money::from_cents(100),
            ..debit(100)
        };

        assert_eq!(
            validate_lines(&[debit(100), both, credit(100)]),
            Err(Error::InvalidLine(2))
        );
    }

    #[test]
    fn zero_and_negative_lines_are_invalid() {
        assert_eq!(
            validate_lines(&[debit(0), credit(0)]),
            Err(Error::InvalidLine(1))
        );
        assert_eq!(
            validate_lines(&[debit(100), credit(-100)]),
            Err(Error::InvalidLine(2))
        );
    }

    #[test]
    fn unbalanced_lines_report_both_totals() {
        assert_eq!(
            validate_lines(&[debit(100), credit(90)]),
            Err(Error::UnbalancedEntry {
                debits: Money::from_cents(100),
                credits: Money::from_cents(90),
            })
        );
    }

    #[test]
    fn overflowing_totals_are_rejected_instead_of_wrapping() {
        // Wrapping arithmetic would make these debits equal the credits.
        let lines = [debit(i64::MAX), debit(i64::MAX), debit(4), credit(1), credit(1)];

        assert!(matches!(validate_lines(&lines), Err(Error::InvalidAmount(_))));
    }
}
