//! Bills from vendors and the payments made against them.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    account::{AccountId, AccountKind, AccountRole, get_account_by_role, get_postable_account},
    contact::{ContactId, ContactKind, get_contact_of_kind},
    document::{format_number, next_sequence, sum_by_account, validate_payment},
    ledger::{EntrySource, JournalEntryId, NewJournalEntry, insert_entry, insert_reversal},
    money::Money,
    organization::{OrganizationId, Tenant},
    sql_enum::sql_text_enum,
};

pub type BillId = i64;
pub type BillPaymentId = i64;

/// The prefix of bill numbers, e.g. BILL-000001.
pub const BILL_NUMBER_PREFIX: &str = "BILL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillStatus {
    Draft,
    Approved,
    PartiallyPaid,
    Paid,
    Void,
}

impl BillStatus {
    pub const ALL: [BillStatus; 5] = [
        BillStatus::Draft,
        BillStatus::Approved,
        BillStatus::PartiallyPaid,
        BillStatus::Paid,
        BillStatus::Void,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            BillStatus::Draft => "draft",
            BillStatus::Approved => "approved",
            BillStatus::PartiallyPaid => "partially_paid",
            BillStatus::Paid => "paid",
            BillStatus::Void => "void",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            BillStatus::Draft => "Draft",
            BillStatus::Approved => "Approved",
            BillStatus::PartiallyPaid => "Partially paid",
            BillStatus::Paid => "Paid",
            BillStatus::Void => "Void",
        }
    }

    /// Whether the organization still owes money on the bill.
    pub fn is_open(&self) -> bool {
        matches!(self, BillStatus::Approved | BillStatus::PartiallyPaid)
    }

    fn invalid_for(self, action: &'static str) -> Error {
        Error::InvalidStatus {
            action,
            status: self.label().to_lowercase(),
        }
    }
}

sql_text_enum!(BillStatus);

/// A line of a bill, charged to an expense or asset account.
#[derive(Debug, Clone, PartialEq)]
pub struct BillLine {
    pub description: String,
    pub amount: Money,
    pub account_id: AccountId,
}

/// A bill that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewBill {
    pub vendor_id: ContactId,
    /// The vendor's own invoice number, if any.
    pub reference: String,
    pub bill_date: Date,
    pub due_date: Date,
    pub lines: Vec<BillLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Bill {
    pub id: BillId,
    pub organization_id: OrganizationId,
    /// The display number, e.g. BILL-000001.
    pub number: String,
    pub vendor_id: ContactId,
    pub vendor_name: String,
    pub reference: String,
    pub bill_date: Date,
    pub due_date: Date,
    pub status: BillStatus,
    pub total: Money,
    /// The entry posted when the bill was approved.
    pub journal_entry_id: Option<JournalEntryId>,
    pub amount_paid: Money,
    pub lines: Vec<BillLine>,
}

impl Bill {
    /// What is still owed to the vendor. Drafts and void bills owe nothing.
    pub fn outstanding(&self) -> Money {
        if self.status.is_open() {
            self.total - self.amount_paid
        } else {
            Money::ZERO
        }
    }

    pub fn is_overdue(&self, today: Date) -> bool {
        self.status.is_open() && self.due_date < today
    }
}

/// A payment made against a bill.
#[derive(Debug, Clone, PartialEq)]
pub struct BillPayment {
    pub id: BillPaymentId,
    pub bill_id: BillId,
    pub date: Date,
    pub amount: Money,
    /// The asset account the payment was made from.
    pub account_id: AccountId,
    pub journal_entry_id: JournalEntryId,
}

pub fn create_bill_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS bill (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL REFERENCES organization(id) ON DELETE CASCADE,
            sequence INTEGER NOT NULL,
            vendor_id INTEGER NOT NULL REFERENCES contact(id),
            reference TEXT NOT NULL,
            bill_date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            total INTEGER NOT NULL,
            status TEXT NOT NULL,
            journal_entry_id INTEGER REFERENCES journal_entry(id),
            amount_paid INTEGER NOT NULL DEFAULT 0,
            UNIQUE(organization_id, sequence)
        );

        CREATE TABLE IF NOT EXISTS bill_line (
            id INTEGER PRIMARY KEY,
            bill_id INTEGER NOT NULL REFERENCES bill(id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            amount INTEGER NOT NULL,
            account_id INTEGER NOT NULL REFERENCES account(id)
        );

        CREATE TABLE IF NOT EXISTS bill_payment (
            id INTEGER PRIMARY KEY,
            bill_id INTEGER NOT NULL REFERENCES bill(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            amount INTEGER NOT NULL,
            account_id INTEGER NOT NULL REFERENCES account(id),
            journal_entry_id INTEGER NOT NULL REFERENCES journal_entry(id)
        );

        CREATE INDEX IF NOT EXISTS idx_bill_organization ON bill(organization_id, status);
        CREATE INDEX IF NOT EXISTS idx_bill_line_bill ON bill_line(bill_id);
        CREATE INDEX IF NOT EXISTS idx_bill_payment_bill ON bill_payment(bill_id);",
    )
}

/// Save a draft bill. Nothing is posted to the ledger until it is approved.
///
/// # Errors
///
/// - [Error::InvalidContact] if the vendor is not a vendor of the organization.
/// - [Error::InvalidDocument] if there are no lines or the due date is
///   before the bill date.
/// - [Error::EmptyField] if a line has no description.
/// - [Error::InvalidAmount] if a line amount is not positive.
/// - [Error::InvalidAccount] if a line account is not an active expense or asset account.
pub fn create_bill(
    organization_id: OrganizationId,
    new_bill: NewBill,
    connection: &Connection,
) -> Result<Bill, Error> {
    let vendor = get_contact_of_kind(
        organization_id,
        new_bill.vendor_id,
        ContactKind::Vendor,
        connection,
    )?;

    if new_bill.lines.is_empty() {
        return Err(Error::InvalidDocument(
            "a bill needs at least one line".to_owned(),
        ));
    }

    if new_bill.due_date < new_bill.bill_date {
        return Err(Error::InvalidDocument(
            "the due date cannot be before the bill date".to_owned(),
        ));
    }

    let mut lines = Vec::with_capacity(new_bill.lines.len());
    for line in new_bill.lines {
        let description = line.description.trim();
        if description.is_empty() {
            return Err(Error::EmptyField("Line description"));
        }
        if !line.amount.is_positive() {
            return Err(Error::InvalidAmount(line.amount.to_string()));
        }
        get_postable_account(
            organization_id,
            line.account_id,
            &[AccountKind::Expense, AccountKind::Asset],
            "expense or asset account",
            connection,
        )?;

        lines.push(BillLine {
            description: description.to_owned(),
            ..line
        });
    }

    let total = Money::try_sum(lines.iter().map(|line| line.amount))?;
    let reference = new_bill.reference.trim().to_owned();

    let transaction = connection.unchecked_transaction()?;
    let sequence = next_sequence("bill", organization_id, &transaction)?;

    transaction.execute(
        "INSERT INTO bill
            (organization_id, sequence, vendor_id, reference, bill_date, due_date, total, status)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        (
            organization_id,
            sequence,
            vendor.id,
            &reference,
            new_bill.bill_date,
            new_bill.due_date,
            total,
            BillStatus::Draft,
        ),
    )?;
    let id = transaction.last_insert_rowid();

    {
        let mut statement = transaction.prepare(
            "INSERT INTO bill_line (bill_id, description, amount, account_id)
            VALUES (?1, ?2, ?3, ?4)",
        )?;
        for line in &lines {
            statement.execute((id, &line.description, line.amount, line.account_id))?;
        }
    }

    transaction.commit()?;

    Ok(Bill {
        id,
        organization_id,
        number: format_number(BILL_NUMBER_PREFIX, sequence),
        vendor_id: vendor.id,
        vendor_name: vendor.name,
        reference,
        bill_date: new_bill.bill_date,
        due_date: new_bill.due_date,
        status: BillStatus::Draft,
        total,
        journal_entry_id: None,
        amount_paid: Money::ZERO,
        lines,
    })
}

/// Approve a draft bill and post it to the ledger on its bill date.
///
/// Debits each line account and credits accounts payable with the total.
///
/// # Errors
///
/// - [Error::NotFound] if the bill does not exist in the organization.
/// - [Error::InvalidStatus] if the bill is not a draft.
/// - [Error::MissingAccountRole] if there is no payables account.
/// - [Error::PeriodLocked] if the bill date is in a closed period.
pub fn approve_bill(tenant: Tenant, bill_id: BillId, connection: &Connection) -> Result<Bill, Error> {
    let organization_id = tenant.organization_id;
    let bill = get_bill(organization_id, bill_id, connection)?;

    if bill.status != BillStatus::Draft {
        return Err(bill.status.invalid_for("approve"));
    }

    let payable = get_account_by_role(organization_id, AccountRole::AccountsPayable, connection)?;
    let memo = if bill.reference.is_empty() {
        format!("Bill {} from {}", bill.number, bill.vendor_name)
    } else {
        format!(
            "Bill {} from {} ({})",
            bill.number, bill.vendor_name, bill.reference
        )
    };

    let mut new_entry =
        NewJournalEntry::new(bill.bill_date, &memo, EntrySource::Bill).source_id(bill.id);
    for (account_id, amount) in
        sum_by_account(bill.lines.iter().map(|line| (line.account_id, line.amount)))
    {
        new_entry = new_entry.debit(account_id, amount, "");
    }
    new_entry = new_entry.credit(payable.id, bill.total, &bill.vendor_name);

    let transaction = connection.unchecked_transaction()?;
    let entry = insert_entry(tenant, new_entry, &transaction)?;
    let rows_affected = transaction.execute(
        "UPDATE bill SET status = ?1, journal_entry_id = ?2
        WHERE id = ?3 AND organization_id = ?4 AND status = ?5",
        (
            BillStatus::Approved,
            entry.id,
            bill.id,
            organization_id,
            BillStatus::Draft,
        ),
    )?;
    if rows_affected == 0 {
        return Err(BillStatus::Approved.invalid_for("approve"));
    }
    transaction.commit()?;

    tracing::info!("Approved bill {} for organization {organization_id}", bill.number);

    Ok(Bill {
        status: BillStatus::Approved,
        journal_entry_id: Some(entry.id),
        ..bill
    })
}

/// Record a payment to the vendor and post it to the ledger.
///
/// Debits accounts payable and credits `payment_account_id`.
///
/// # Errors
///
/// - [Error::NotFound] if the bill does not exist in the organization.
/// - [Error::InvalidStatus] if the bill is not approved or partially paid.
/// - [Error::InvalidAmount] if `amount` is not positive.
/// - [Error::Overpayment] if `amount` is more than the outstanding amount.
/// - [Error::InvalidDocument] if `date` is before the bill date.
/// - [Error::InvalidAccount] if the payment account is not an active asset account.
/// - [Error::PeriodLocked] if `date` is in a closed period.
pub fn record_bill_payment(
    tenant: Tenant,
    bill_id: BillId,
    amount: Money,
    date: Date,
    payment_account_id: AccountId,
    connection: &Connection,
) -> Result<BillPayment, Error> {
    let organization_id = tenant.organization_id;
    let bill = get_bill(organization_id, bill_id, connection)?;

    if !bill.status.is_open() {
        return Err(bill.status.invalid_for("record a payment on"));
    }

    validate_payment(amount, bill.outstanding())?;

    if date < bill.bill_date {
        return Err(Error::InvalidDocument(format!(
            "the payment date cannot be before the bill date {}",
            bill.bill_date
        )));
    }

    let payment_account = get_postable_account(
        organization_id,
        payment_account_id,
        &[AccountKind::Asset],
        "payment account",
        connection,
    )?;
    let payable = get_account_by_role(organization_id, AccountRole::AccountsPayable, connection)?;
    let memo = format!("Payment for bill {}", bill.number);
    let new_entry = NewJournalEntry::new(date, &memo, EntrySource::BillPayment)
        .source_id(bill.id)
        .debit(payable.id, amount, &bill.vendor_name)
        .credit(payment_account.id, amount, "");

    let amount_paid = bill.amount_paid + amount;
    let status = if amount_paid == bill.total {
        BillStatus::Paid
    } else {
        BillStatus::PartiallyPaid
    };

    let transaction = connection.unchecked_transaction()?;
    let entry = insert_entry(tenant, new_entry, &transaction)?;
    transaction.execute(
        "INSERT INTO bill_payment (bill_id, date, amount, account_id, journal_entry_id)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (bill.id, date, amount, payment_account.id, entry.id),
    )?;
    let payment_id = transaction.last_insert_rowid();

    let rows_affected = transaction.execute(
        "UPDATE bill SET amount_paid = ?1, status = ?2
        WHERE id = ?3 AND organization_id = ?4 AND amount_paid = ?5",
        (amount_paid, status, bill.id, organization_id, bill.amount_paid),
    )?;
    if rows_affected == 0 {
        return Err(Error::Overpayment(bill.outstanding()));
    }
    transaction.commit()?;

    Ok(BillPayment {
        id: payment_id,
        bill_id: bill.id,
        date,
        amount,
        account_id: payment_account.id,
        journal_entry_id: entry.id,
    })
}

/// Void a bill.
///
/// A draft is voided directly. An approved bill has its journal entry
/// reversed on `date`, or on the bill date if that is later.
///
/// # Errors
///
/// - [Error::NotFound] if the bill does not exist in the organization.
/// - [Error::DocumentHasPayments] if any payment has been recorded.
/// - [Error::InvalidStatus] if the bill is already void.
/// - [Error::PeriodLocked] if the reversal date is in a closed period.
pub fn void_bill(
    tenant: Tenant,
    bill_id: BillId,
    date: Date,
    connection: &Connection,
) -> Result<Bill, Error> {
    let organization_id = tenant.organization_id;
    let bill = get_bill(organization_id, bill_id, connection)?;

    match bill.status {
        BillStatus::Draft | BillStatus::Approved => {}
        BillStatus::PartiallyPaid | BillStatus::Paid => return Err(Error::DocumentHasPayments),
        BillStatus::Void => return Err(bill.status.invalid_for("void")),
    }

    let transaction = connection.unchecked_transaction()?;

    if let Some(entry_id) = bill.journal_entry_id {
        let memo = format!("Void bill {}", bill.number);
        insert_reversal(
            tenant,
            entry_id,
            date.max(bill.bill_date),
            Some(&memo),
            &transaction,
        )?;
    }

    let rows_affected = transaction.execute(
        "UPDATE bill SET status = ?1
        WHERE id = ?2 AND organization_id = ?3 AND status = ?4 AND amount_paid = 0",
        (BillStatus::Void, bill.id, organization_id, bill.status),
    )?;
    if rows_affected == 0 {
        return Err(Error::DocumentHasPayments);
    }
    transaction.commit()?;

    tracing::info!("Voided bill {} for organization {organization_id}", bill.number);

    Ok(Bill {
        status: BillStatus::Void,
        ..bill
    })
}

const BILL_COLUMNS: &str = "bill.id, bill.organization_id, bill.sequence, bill.vendor_id, \
    contact.name, bill.reference, bill.bill_date, bill.due_date, bill.status, bill.total, \
    bill.journal_entry_id, bill.amount_paid";

fn map_row_to_bill(row: &Row) -> Result<Bill, rusqlite::Error> {
    Ok(Bill {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        number: format_number(BILL_NUMBER_PREFIX, row.get(2)?),
        vendor_id: row.get(3)?,
        vendor_name: row.get(4)?,
        reference: row.get(5)?,
        bill_date: row.get(6)?,
        due_date: row.get(7)?,
        status: row.get(8)?,
        total: row.get(9)?,
        journal_entry_id: row.get(10)?,
        amount_paid: row.get(11)?,
        lines: Vec::new(),
    })
}

/// Get a bill and its lines.
///
/// # Errors
///
/// Returns [Error::NotFound] if the bill does not exist in the organization.
pub fn get_bill(
    organization_id: OrganizationId,
    bill_id: BillId,
    connection: &Connection,
) -> Result<Bill, Error> {
    let mut bill = connection.query_row(
        &format!(
            "SELECT {BILL_COLUMNS} FROM bill
            INNER JOIN contact ON contact.id = bill.vendor_id
            WHERE bill.id = ?1 AND bill.organization_id = ?2"
        ),
        (bill_id, organization_id),
        map_row_to_bill,
    )?;

    bill.lines = connection
        .prepare(
            "SELECT description, amount, account_id FROM bill_line
            WHERE bill_id = ?1 ORDER BY id",
        )?
        .query_map((bill.id,), |row| {
            Ok(BillLine {
                description: row.get(0)?,
                amount: row.get(1)?,
                account_id: row.get(2)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(bill)
}

/// The organization's bills, newest first. Lines are not loaded.
pub fn list_bills(
    organization_id: OrganizationId,
    connection: &Connection,
) -> Result<Vec<Bill>, Error> {
    connection
        .prepare(&format!(
            "SELECT {BILL_COLUMNS} FROM bill
            INNER JOIN contact ON contact.id = bill.vendor_id
            WHERE bill.organization_id = ?1
            ORDER BY bill.bill_date DESC, bill.sequence DESC"
        ))?
        .query_map((organization_id,), map_row_to_bill)?
        .map(|maybe_bill| maybe_bill.map_err(Error::from))
        .collect()
}

/// The payments made against a bill, oldest first.
pub fn list_bill_payments(
    organization_id: OrganizationId,
    bill_id: BillId,
    connection: &Connection,
) -> Result<Vec<BillPayment>, Error> {
    connection
        .prepare(
            "SELECT bill_payment.id, bill_payment.bill_id, bill_payment.date,
                bill_payment.amount, bill_payment.account_id, bill_payment.journal_entry_id
            FROM bill_payment
            INNER JOIN bill ON bill.id = bill_payment.bill_id
            WHERE bill_payment.bill_id = ?1 AND bill.organization_id = ?2
            ORDER BY bill_payment.date, bill_payment.id",
        )?
        .query_map((bill_id, organization_id), |row| {
            Ok(BillPayment {
                id: row.get(0)?,
                bill_id: row.get(1)?,
                date: row.get(2)?,
                amount: row.get(3)?,
                account_id: row.get(4)?,
                journal_entry_id: row.get(5)?,
            })
        })?
        .map(|maybe_payment| maybe_payment.map_err(Error::from))
        .collect()
}
