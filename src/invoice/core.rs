//! Invoices to customers and the payments received against them.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    account::{AccountId, AccountKind, AccountRole, get_account_by_role, get_postable_account},
    contact::{ContactId, ContactKind, get_contact_of_kind},
    document::{DocumentTotals, format_number, next_sequence, sum_by_account, validate_payment},
    ledger::{EntrySource, JournalEntryId, NewJournalEntry, insert_entry, insert_reversal},
    money::Money,
    organization::{OrganizationId, Tenant},
    sql_enum::sql_text_enum,
};

pub type InvoiceId = i64;
pub type InvoicePaymentId = i64;

/// The prefix of invoice numbers, e.g. INV-000001.
pub const INVOICE_NUMBER_PREFIX: &str = "INV";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    Draft,
    Issued,
    PartiallyPaid,
    Paid,
    Void,
}

impl InvoiceStatus {
    pub const ALL: [InvoiceStatus; 5] = [
        InvoiceStatus::Draft,
        InvoiceStatus::Issued,
        InvoiceStatus::PartiallyPaid,
        InvoiceStatus::Paid,
        InvoiceStatus::Void,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "draft",
            InvoiceStatus::Issued => "issued",
            InvoiceStatus::PartiallyPaid => "partially_paid",
            InvoiceStatus::Paid => "paid",
            InvoiceStatus::Void => "void",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            InvoiceStatus::Draft => "Draft",
            InvoiceStatus::Issued => "Issued",
            InvoiceStatus::PartiallyPaid => "Partially paid",
            InvoiceStatus::Paid => "Paid",
            InvoiceStatus::Void => "Void",
        }
    }

    /// Whether the customer still owes money on the invoice.
    pub fn is_open(&self) -> bool {
        matches!(self, InvoiceStatus::Issued | InvoiceStatus::PartiallyPaid)
    }

    fn invalid_for(self, action: &'static str) -> Error {
        Error::InvalidStatus {
            action,
            status: self.label().to_lowercase(),
        }
    }
}

sql_text_enum!(InvoiceStatus);

/// A line of an invoice as entered by the user.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoiceLine {
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
    /// The revenue account the line is credited to.
    pub account_id: AccountId,
}

/// An invoice that has not been saved yet.
#[derive(Debug, Clone, PartialEq)]
pub struct NewInvoice {
    pub customer_id: ContactId,
    pub issue_date: Date,
    pub due_date: Date,
    pub tax_rate_bps: u32,
    pub lines: Vec<NewInvoiceLine>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct InvoiceLine {
    pub description: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub account_id: AccountId,
    /// `quantity` times `unit_price`.
    pub amount: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Invoice {
    pub id: InvoiceId,
    pub organization_id: OrganizationId,
    /// The display number, e.g. INV-000001.
    pub number: String,
    pub customer_id: ContactId,
    pub customer_name: String,
    pub issue_date: Date,
    pub due_date: Date,
    pub tax_rate_bps: u32,
    pub status: InvoiceStatus,
    pub totals: DocumentTotals,
    /// The entry posted when the invoice was issued.
    pub journal_entry_id: Option<JournalEntryId>,
    pub amount_paid: Money,
    pub lines: Vec<InvoiceLine>,
}

impl Invoice {
    /// What the customer still owes. Drafts and void invoices owe nothing.
    pub fn outstanding(&self) -> Money {
        if self.status.is_open() {
            self.totals.total - self.amount_paid
        } else {
            Money::ZERO
        }
    }

    pub fn is_overdue(&self, today: Date) -> bool {
        self.status.is_open() && self.due_date < today
    }
}

/// A payment received against an invoice.
#[derive(Debug, Clone, PartialEq)]
pub struct InvoicePayment {
    pub id: InvoicePaymentId,
    pub invoice_id: InvoiceId,
    pub date: Date,
    pub amount: Money,
    /// The asset account the payment was deposited to.
    pub account_id: AccountId,
    pub journal_entry_id: JournalEntryId,
}

pub fn create_invoice_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS invoice (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL REFERENCES organization(id) ON DELETE CASCADE,
            sequence INTEGER NOT NULL,
            customer_id INTEGER NOT NULL REFERENCES contact(id),
            issue_date TEXT NOT NULL,
            due_date TEXT NOT NULL,
            tax_rate_bps INTEGER NOT NULL,
            subtotal INTEGER NOT NULL,
            tax INTEGER NOT NULL,
            total INTEGER NOT NULL,
            status TEXT NOT NULL,
            journal_entry_id INTEGER REFERENCES journal_entry(id),
            amount_paid INTEGER NOT NULL DEFAULT 0,
            UNIQUE(organization_id, sequence)
        );

        CREATE TABLE IF NOT EXISTS invoice_line (
            id INTEGER PRIMARY KEY,
            invoice_id INTEGER NOT NULL REFERENCES invoice(id) ON DELETE CASCADE,
            description TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            unit_price INTEGER NOT NULL,
            amount INTEGER NOT NULL,
            account_id INTEGER NOT NULL REFERENCES account(id)
        );

        CREATE TABLE IF NOT EXISTS invoice_payment (
            id INTEGER PRIMARY KEY,
            invoice_id INTEGER NOT NULL REFERENCES invoice(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            amount INTEGER NOT NULL,
            account_id INTEGER NOT NULL REFERENCES account(id),
            journal_entry_id INTEGER NOT NULL REFERENCES journal_entry(id)
        );

        CREATE INDEX IF NOT EXISTS idx_invoice_organization ON invoice(organization_id, status);
        CREATE INDEX IF NOT EXISTS idx_invoice_line_invoice ON invoice_line(invoice_id);
        CREATE INDEX IF NOT EXISTS idx_invoice_payment_invoice ON invoice_payment(invoice_id);",
    )
}

/// Save a draft invoice. Nothing is posted to the ledger until it is issued.
///
/// # Errors
///
/// - [Error::InvalidContact] if the customer is not a customer of the organization.
/// - [Error::InvalidDocument] if there are no lines or the due date is
///   before the issue date.
/// - [Error::EmptyField] if a line has no description.
/// - [Error::InvalidQuantity] if a quantity is not positive.
/// - [Error::InvalidAmount] if a unit price is negative or a line amount overflows.
/// - [Error::InvalidAccount] if a line account is not an active revenue account.
pub fn create_invoice(
    organization_id: OrganizationId,
    new_invoice: NewInvoice,
    connection: &Connection,
) -> Result<Invoice, Error> {
    let customer = get_contact_of_kind(
        organization_id,
        new_invoice.customer_id,
        ContactKind::Customer,
        connection,
    )?;

    if new_invoice.lines.is_empty() {
        return Err(Error::InvalidDocument(
            "an invoice needs at least one line".to_owned(),
        ));
    }

    if new_invoice.due_date < new_invoice.issue_date {
        return Err(Error::InvalidDocument(
            "the due date cannot be before the issue date".to_owned(),
        ));
    }

    if new_invoice.tax_rate_bps > 10_000 {
        return Err(Error::InvalidAmount(new_invoice.tax_rate_bps.to_string()));
    }

    let mut lines = Vec::with_capacity(new_invoice.lines.len());
    for line in new_invoice.lines {
        let description = line.description.trim();
        if description.is_empty() {
            return Err(Error::EmptyField("Line description"));
        }
        if line.quantity <= 0 {
            return Err(Error::InvalidQuantity);
        }
        if line.unit_price.is_negative() {
            return Err(Error::InvalidAmount(line.unit_price.to_string()));
        }
        get_postable_account(
            organization_id,
            line.account_id,
            &[AccountKind::Revenue],
            "revenue account",
            connection,
        )?;

        lines.push(InvoiceLine {
            description: description.to_owned(),
            quantity: line.quantity,
            unit_price: line.unit_price,
            account_id: line.account_id,
            amount: line.unit_price.times(line.quantity)?,
        });
    }

    let totals = DocumentTotals::new(
        lines.iter().map(|line| line.amount),
        new_invoice.tax_rate_bps,
    )?;

    let transaction = connection.unchecked_transaction()?;
    let sequence = next_sequence("invoice", organization_id, &transaction)?;

    transaction.execute(
        "INSERT INTO invoice
            (organization_id, sequence, customer_id, issue_date, due_date, tax_rate_bps,
            subtotal, tax, total, status)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        (
            organization_id,
            sequence,
            customer.id,
            new_invoice.issue_date,
            new_invoice.due_date,
            new_invoice.tax_rate_bps,
            totals.subtotal,
            totals.tax,
            totals.total,
            InvoiceStatus::Draft,
        ),
    )?;
    let id = transaction.last_insert_rowid();

    {
        let mut statement = transaction.prepare(
            "INSERT INTO invoice_line
                (invoice_id, description, quantity, unit_price, amount, account_id)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )?;
        for line in &lines {
            statement.execute((
                id,
                &line.description,
                line.quantity,
                line.unit_price,
                line.amount,
                line.account_id,
            ))?;
        }
    }

    transaction.commit()?;

    Ok(Invoice {
        id,
        organization_id,
        number: format_number(INVOICE_NUMBER_PREFIX, sequence),
        customer_id: customer.id,
        customer_name: customer.name,
        issue_date: new_invoice.issue_date,
        due_date: new_invoice.due_date,
        tax_rate_bps: new_invoice.tax_rate_bps,
        status: InvoiceStatus::Draft,
        totals,
        journal_entry_id: None,
        amount_paid: Money::ZERO,
        lines,
    })
}

/// Issue a draft invoice and post it to the ledger on its issue date.
///
/// Debits accounts receivable with the total, credits each revenue account
/// with its lines and credits sales tax payable with the tax.
///
/// # Errors
///
/// - [Error::NotFound] if the invoice does not exist in the organization.
/// - [Error::InvalidStatus] if the invoice is not a draft.
/// - [Error::InvalidDocument] if the total is zero.
/// - [Error::MissingAccountRole] if there is no receivables account, or no
///   sales tax account when the invoice has tax.
/// - [Error::PeriodLocked] if the issue date is in a closed period.
pub fn issue_invoice(
    tenant: Tenant,
    invoice_id: InvoiceId,
    connection: &Connection,
) -> Result<Invoice, Error> {
    let organization_id = tenant.organization_id;
    let invoice = get_invoice(organization_id, invoice_id, connection)?;

    if invoice.status != InvoiceStatus::Draft {
        return Err(invoice.status.invalid_for("issue"));
    }

    if !invoice.totals.total.is_positive() {
        return Err(Error::InvalidDocument(
            "an invoice with a total of zero cannot be issued".to_owned(),
        ));
    }

    let receivable = get_account_by_role(organization_id, AccountRole::AccountsReceivable, connection)?;
    let memo = format!("Invoice {} to {}", invoice.number, invoice.customer_name);

    let mut new_entry = NewJournalEntry::new(invoice.issue_date, &memo, EntrySource::Invoice)
        .source_id(invoice.id)
        .debit(receivable.id, invoice.totals.total, "");
    for (account_id, amount) in sum_by_account(
        invoice
            .lines
            .iter()
            .map(|line| (line.account_id, line.amount)),
    ) {
        new_entry = new_entry.credit(account_id, amount, "");
    }
    if invoice.totals.tax.is_positive() {
        let sales_tax =
            get_account_by_role(organization_id, AccountRole::SalesTaxPayable, connection)?;
        new_entry = new_entry.credit(sales_tax.id, invoice.totals.tax, "Sales tax");
    }

    let transaction = connection.unchecked_transaction()?;
    let entry = insert_entry(tenant, new_entry, &transaction)?;
    let rows_affected = transaction.execute(
        "UPDATE invoice SET status = ?1, journal_entry_id = ?2
        WHERE id = ?3 AND organization_id = ?4 AND status = ?5",
        (
            InvoiceStatus::Issued,
            entry.id,
            invoice.id,
            organization_id,
            InvoiceStatus::Draft,
        ),
    )?;
    if rows_affected == 0 {
        return Err(InvoiceStatus::Issued.invalid_for("issue"));
    }
    transaction.commit()?;

    tracing::info!("Issued invoice {} for organization {organization_id}", invoice.number);

    Ok(Invoice {
        status: InvoiceStatus::Issued,
        journal_entry_id: Some(entry.id),
        ..invoice
    })
}

/// Record a payment from the customer and post it to the ledger.
///
/// Debits `deposit_account_id` and credits accounts receivable.
///
/// # Errors
///
/// - [Error::NotFound] if the invoice does not exist in the organization.
/// - [Error::InvalidStatus] if the invoice is not issued or partially paid.
/// - [Error::InvalidAmount] if `amount` is not positive.
/// - [Error::Overpayment] if `amount` is more than the outstanding amount.
/// - [Error::InvalidDocument] if `date` is before the issue date.
/// - [Error::InvalidAccount] if the deposit account is not an active asset account.
/// - [Error::PeriodLocked] if `date` is in a closed period.
pub fn record_invoice_payment(
    tenant: Tenant,
    invoice_id: InvoiceId,
    amount: Money,
    date: Date,
    deposit_account_id: AccountId,
    connection: &Connection,
) -> Result<InvoicePayment, Error> {
    let organization_id = tenant.organization_id;
    let invoice = get_invoice(organization_id, invoice_id, connection)?;

    if !invoice.status.is_open() {
        return Err(invoice.status.invalid_for("record a payment on"));
    }

    validate_payment(amount, invoice.outstanding())?;

    if date < invoice.issue_date {
        return Err(Error::InvalidDocument(format!(
            "the payment date cannot be before the issue date {}",
            invoice.issue_date
        )));
    }

    let deposit_account = get_postable_account(
        organization_id,
        deposit_account_id,
        &[AccountKind::Asset],
        "deposit account",
        connection,
    )?;
    let receivable = get_account_by_role(organization_id, AccountRole::AccountsReceivable, connection)?;
    if deposit_account.id == receivable.id {
        return Err(Error::InvalidAccount(
            "payments cannot be deposited to accounts receivable".to_owned(),
        ));
    }

    let memo = format!("Payment for invoice {}", invoice.number);
    let new_entry = NewJournalEntry::new(date, &memo, EntrySource::InvoicePayment)
        .source_id(invoice.id)
        .debit(deposit_account.id, amount, "")
        .credit(receivable.id, amount, &invoice.customer_name);

    let amount_paid = invoice.amount_paid + amount;
    let status = if amount_paid == invoice.totals.total {
        InvoiceStatus::Paid
    } else {
        InvoiceStatus::PartiallyPaid
    };

    let transaction = connection.unchecked_transaction()?;
    let entry = insert_entry(tenant, new_entry, &transaction)?;
    transaction.execute(
        "INSERT INTO invoice_payment (invoice_id, date, amount, account_id, journal_entry_id)
        VALUES (?1, ?2, ?3, ?4, ?5)",
        (invoice.id, date, amount, deposit_account.id, entry.id),
    )?;
    let payment_id = transaction.last_insert_rowid();

    // A concurrent payment changes amount_paid, so the update only applies to what was checked.
    let rows_affected = transaction.execute(
        "UPDATE invoice SET amount_paid = ?1, status = ?2
        WHERE id = ?3 AND organization_id = ?4 AND amount_paid = ?5",
        (amount_paid, status, invoice.id, organization_id, invoice.amount_paid),
    )?;
    if rows_affected == 0 {
        return Err(Error::Overpayment(invoice.outstanding()));
    }
    transaction.commit()?;

    Ok(InvoicePayment {
        id: payment_id,
        invoice_id: invoice.id,
        date,
        amount,
        account_id: deposit_account.id,
        journal_entry_id: entry.id,
    })
}

/// Void an invoice.
///
/// A draft is voided directly. An issued invoice has its journal entry
/// reversed on `date`, or on the issue date if that is later.
///
/// # Errors
///
/// - [Error::NotFound] if the invoice does not exist in the organization.
/// - [Error::DocumentHasPayments] if any payment has been recorded.
/// - [Error::InvalidStatus] if the invoice is already void.
/// - [Error::PeriodLocked] if the reversal date is in a closed period.
pub fn void_invoice(
    tenant: Tenant,
    invoice_id: InvoiceId,
    date: Date,
    connection: &Connection,
) -> Result<Invoice, Error> {
    let organization_id = tenant.organization_id;
    let invoice = get_invoice(organization_id, invoice_id, connection)?;

    match invoice.status {
        InvoiceStatus::Draft | InvoiceStatus::Issued => {}
        InvoiceStatus::PartiallyPaid | InvoiceStatus::Paid => {
            return Err(Error::DocumentHasPayments);
        }
        InvoiceStatus::Void => return Err(invoice.status.invalid_for("void")),
    }

    let transaction = connection.unchecked_transaction()?;

    if let Some(entry_id) = invoice.journal_entry_id {
        let memo = format!("Void invoice {}", invoice.number);
        insert_reversal(
            tenant,
            entry_id,
            date.max(invoice.issue_date),
            Some(&memo),
            &transaction,
        )?;
    }

    let rows_affected = transaction.execute(
        "UPDATE invoice SET status = ?1
        WHERE id = ?2 AND organization_id = ?3 AND status = ?4 AND amount_paid = 0",
        (InvoiceStatus::Void, invoice.id, organization_id, invoice.status),
    )?;
    if rows_affected == 0 {
        return Err(Error::DocumentHasPayments);
    }
    transaction.commit()?;

    tracing::info!("Voided invoice {} for organization {organization_id}", invoice.number);

    Ok(Invoice {
        status: InvoiceStatus::Void,
        ..invoice
    })
}

const INVOICE_COLUMNS: &str = "invoice.id, invoice.organization_id, invoice.sequence, \
    invoice.customer_id, contact.name, invoice.issue_date, invoice.due_date, \
    invoice.tax_rate_bps, invoice.status, invoice.subtotal, invoice.tax, invoice.total, \
    invoice.journal_entry_id, invoice.amount_paid";

fn map_row_to_invoice(row: &Row) -> Result<Invoice, rusqlite::Error> {
    Ok(Invoice {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        number: format_number(INVOICE_NUMBER_PREFIX, row.get(2)?),
        customer_id: row.get(3)?,
        customer_name: row.get(4)?,
        issue_date: row.get(5)?,
        due_date: row.get(6)?,
        tax_rate_bps: row.get(7)?,
        status: row.get(8)?,
        totals: DocumentTotals {
            subtotal: row.get(9)?,
            tax: row.get(10)?,
            total: row.get(11)?,
        },
        journal_entry_id: row.get(12)?,
        amount_paid: row.get(13)?,
        lines: Vec::new(),
    })
}

fn get_invoice_lines(
    invoice_id: InvoiceId,
    connection: &Connection,
) -> Result<Vec<InvoiceLine>, Error> {
    connection
        .prepare(
            "SELECT description, quantity, unit_price, account_id, amount FROM invoice_line
            WHERE invoice_id = ?1 ORDER BY id",
        )?
        .query_map((invoice_id,), |row| {
            Ok(InvoiceLine {
                description: row.get(0)?,
                quantity: row.get(1)?,
                unit_price: row.get(2)?,
                account_id: row.get(3)?,
                amount: row.get(4)?,
            })
        })?
        .map(|maybe_line| maybe_line.map_err(Error::from))
        .collect()
}

/// Get an invoice and its lines.
///
/// # Errors
///
/// Returns [Error::NotFound] if the invoice does not exist in the organization.
pub fn get_invoice(
    organization_id: OrganizationId,
    invoice_id: InvoiceId,
    connection: &Connection,
) -> Result<Invoice, Error> {
    let mut invoice = connection.query_row(
        &format!(
            "SELECT {INVOICE_COLUMNS} FROM invoice
            INNER JOIN contact ON contact.id = invoice.customer_id
            WHERE invoice.id = ?1 AND invoice.organization_id = ?2"
        ),
        (invoice_id, organization_id),
        map_row_to_invoice,
    )?;
    invoice.lines = get_invoice_lines(invoice.id, connection)?;

    Ok(invoice)
}

/// The organization's invoices, newest first. Lines are not loaded.
pub fn list_invoices(
    organization_id: OrganizationId,
    connection: &Connection,
) -> Result<Vec<Invoice>, Error> {
    connection
        .prepare(&format!(
            "SELECT {INVOICE_COLUMNS} FROM invoice
            INNER JOIN contact ON contact.id = invoice.customer_id
            WHERE invoice.organization_id = ?1
            ORDER BY invoice.issue_date DESC, invoice.sequence DESC"
        ))?
        .query_map((organization_id,), map_row_to_invoice)?
        .map(|maybe_invoice| maybe_invoice.map_err(Error::from))
        .collect()
}

/// The payments recorded against an invoice, oldest first.
pub fn list_invoice_payments(
    organization_id: OrganizationId,
    invoice_id: InvoiceId,
    connection: &Connection,
) -> Result<Vec<InvoicePayment>, Error> {
    connection
        .prepare(
            "SELECT invoice_payment.id, invoice_payment.invoice_id, invoice_payment.date,
                invoice_payment.amount, invoice_payment.account_id,
                invoice_payment.journal_entry_id
            FROM invoice_payment
            INNER JOIN invoice ON invoice.id = invoice_payment.invoice_id
            WHERE invoice_payment.invoice_id = ?1 AND invoice.organization_id = ?2
            ORDER BY invoice_payment.date, invoice_payment.id",
        )?
        .query_map((invoice_id, organization_id), |row| {
            Ok(InvoicePayment {
                id: row.get(0)?,
                invoice_id: row.get(1)?,
                date: row.get(2)?,
                amount: row.get(3)?,
                account_id: row.get(4)?,
                journal_entry_id: row.get(5)?,
            })
        })?
        .map(|maybe_payment| maybe_payment.map_err(Error::from))
        .collect()
}


#[cfg(test)]
mod invoice_tests {
    use time::macros::date;

    use crate::{
        Error,
        contact::{ContactKind, create_contact},
        invoice::{
            InvoiceStatus, NewInvoice, NewInvoiceLine, create_invoice, get_invoice,
            issue_invoice, list_invoice_payments, record_invoice_payment, void_invoice,
        },
        ledger::{EntryStatus, get_entry},
        money::Money,
        organization::close_period,
        test_utils::{TestBooks, account_by_code},
    };

    use super::test_invoices::{DUE_DATE, ISSUE_DATE, draft_invoice};

    #[test]
    fn create_computes_totals_and_number() {
        let books = TestBooks::standard();

        let invoice = draft_invoice(&books);

        assert_eq!(invoice.number, "INV-000001");
        assert_eq!(invoice.status, InvoiceStatus::Draft);
        assert_eq!(invoice.totals.subtotal, Money::from_dollars(250));
        assert_eq!(invoice.totals.tax, Money::from_cents(37_50));
        assert_eq!(invoice.totals.total, Money::from_cents(287_50));
        assert_eq!(
            get_invoice(books.organization_id(), invoice.id, &books.connection),
            Ok(invoice)
        );
    }

    #[test]
    fn create_rejects_vendor() {
        let books = TestBooks::standard();
        let vendor = create_contact(
            books.organization_id(),
            "Paper Co",
            None,
            ContactKind::Vendor,
            &books.connection,
        )
        .unwrap();

        let got = create_invoice(
            books.organization_id(),
            NewInvoice {
                customer_id: vendor.id,
                issue_date: ISSUE_DATE,
                due_date: DUE_DATE,
                tax_rate_bps: 0,
                lines: vec![NewInvoiceLine {
                    description: "Widgets".to_owned(),
                    quantity: 1,
                    unit_price: Money::from_dollars(10),
                    account_id: account_by_code(&books, "4000").id,
                }],
            },
            &books.connection,
        );

        assert!(matches!(got, Err(Error::InvalidContact(_))));
    }

    #[test]
    fn create_validates_document() {
        let books = TestBooks::standard();
        let customer = create_contact(
            books.organization_id(),
            "Acme",
            None,
            ContactKind::Customer,
            &books.connection,
        )
        .unwrap();
        let line = NewInvoiceLine {
            description: "Widgets".to_owned(),
            quantity: 1,
            unit_price: Money::from_dollars(10),
            account_id: account_by_code(&books, "4000").id,
        };
        let valid = NewInvoice {
            customer_id: customer.id,
            issue_date: ISSUE_DATE,
            due_date: DUE_DATE,
            tax_rate_bps: 0,
            lines: vec![line.clone()],
        };

        let no_lines = NewInvoice {
            lines: vec![],
            ..valid.clone()
        };
        let due_before_issue = NewInvoice {
            due_date: date!(2025 - 02 - 01),
            ..valid.clone()
        };
        let zero_quantity = NewInvoice {
            lines: vec![NewInvoiceLine {
                quantity: 0,
                ..line.clone()
            }],
            ..valid.clone()
        };
        let expense_account = NewInvoice {
            lines: vec![NewInvoiceLine {
                account_id: account_by_code(&books, "6100").id,
                ..line
            }],
            ..valid
        };

        let org = books.organization_id();
        assert!(matches!(
            create_invoice(org, no_lines, &books.connection),
            Err(Error::InvalidDocument(_))
        ));
        assert!(matches!(
            create_invoice(org, due_before_issue, &books.connection),
            Err(Error::InvalidDocument(_))
        ));
        assert_eq!(
            create_invoice(org, zero_quantity, &books.connection),
            Err(Error::InvalidQuantity)
        );
        assert!(matches!(
            create_invoice(org, expense_account, &books.connection),
            Err(Error::InvalidAccount(_))
        ));
    }

    #[test]
    fn issue_posts_receivable_revenue_and_tax() {
        let books = TestBooks::standard();
        let invoice = draft_invoice(&books);

        let issued = issue_invoice(books.tenant, invoice.id, &books.connection).unwrap();

        assert_eq!(issued.status, InvoiceStatus::Issued);
        let entry = get_entry(
            books.organization_id(),
            issued.journal_entry_id.unwrap(),
            &books.connection,
        )
        .unwrap();
        assert_eq!(entry.date, ISSUE_DATE);
        assert_eq!(entry.source_id, Some(invoice.id));
        let postings: Vec<_> = entry
            .lines
            .iter()
            .map(|line| (line.account_id, line.debit, line.credit))
            .collect();
        assert_eq!(
            postings,
            [
                (account_by_code(&books, "1100").id, Money::from_cents(287_50), Money::ZERO),
                (account_by_code(&books, "4000").id, Money::ZERO, Money::from_dollars(200)),
                (account_by_code(&books, "4100").id, Money::ZERO, Money::from_dollars(50)),
                (account_by_code(&books, "2100").id, Money::ZERO, Money::from_cents(37_50)),
            ]
        );
    }

    #[test]
    fn issue_twice_is_rejected() {
        let books = TestBooks::standard();
        let invoice = draft_invoice(&books);
        issue_invoice(books.tenant, invoice.id, &books.connection).unwrap();

        let got = issue_invoice(books.tenant, invoice.id, &books.connection);

        assert_eq!(
            got,
            Err(Error::InvalidStatus {
                action: "issue",
                status: "issued".to_owned()
            })
        );
    }

    #[test]
    fn issue_in_closed_period_is_rejected() {
        let books = TestBooks::standard();
        let invoice = draft_invoice(&books);
        close_period(
            books.organization_id(),
            ISSUE_DATE,
            date!(2025 - 04 - 01),
            &books.connection,
        )
        .unwrap();

        let got = issue_invoice(books.tenant, invoice.id, &books.connection);

        assert_eq!(got, Err(Error::PeriodLocked(ISSUE_DATE)));
        let unchanged = get_invoice(books.organization_id(), invoice.id, &books.connection).unwrap();
        assert_eq!(unchanged.status, InvoiceStatus::Draft);
    }

    #[test]
    fn payments_move_status_to_paid() {
        let books = TestBooks::standard();
        let bank = account_by_code(&books, "1020");
        let invoice = draft_invoice(&books);
        issue_invoice(books.tenant, invoice.id, &books.connection).unwrap();

        record_invoice_payment(
            books.tenant,
            invoice.id,
            Money::from_dollars(100),
            date!(2025 - 03 - 10),
            bank.id,
            &books.connection,
        )
        .unwrap();
        let partial = get_invoice(books.organization_id(), invoice.id, &books.connection).unwrap();
        record_invoice_payment(
            books.tenant,
            invoice.id,
            Money::from_cents(187_50),
            date!(2025 - 03 - 20),
            bank.id,
            &books.connection,
        )
        .unwrap();
        let paid = get_invoice(books.organization_id(), invoice.id, &books.connection).unwrap();

        assert_eq!(partial.status, InvoiceStatus::PartiallyPaid);
        assert_eq!(partial.outstanding(), Money::from_cents(187_50));
        assert_eq!(paid.status, InvoiceStatus::Paid);
        assert_eq!(paid.outstanding(), Money::ZERO);
        let payments =
            list_invoice_payments(books.organization_id(), invoice.id, &books.connection).unwrap();
        assert_eq!(payments.len(), 2);
        let entry = get_entry(
            books.organization_id(),
            payments[0].journal_entry_id,
            &books.connection,
        )
        .unwrap();
        assert_eq!(entry.source_id, Some(invoice.id));
        assert_eq!(entry.lines[0].account_id, bank.id);
        assert_eq!(entry.lines[1].account_id, account_by_code(&books, "1100").id);
    }

    #[test]
    fn overpayment_is_rejected() {
        let books = TestBooks::standard();
        let invoice = draft_invoice(&books);
        issue_invoice(books.tenant, invoice.id, &books.connection).unwrap();

        let got = record_invoice_payment(
            books.tenant,
            invoice.id,
            Money::from_dollars(300),
            date!(2025 - 03 - 10),
            account_by_code(&books, "1020").id,
            &books.connection,
        );

        assert_eq!(got, Err(Error::Overpayment(Money::from_cents(287_50))));
    }

    #[test]
    fn payment_on_draft_is_rejected() {
        let books = TestBooks::standard();
        let invoice = draft_invoice(&books);

        let got = record_invoice_payment(
            books.tenant,
            invoice.id,
            Money::from_dollars(10),
            date!(2025 - 03 - 10),
            account_by_code(&books, "1020").id,
            &books.connection,
        );

        assert!(matches!(got, Err(Error::InvalidStatus { .. })));
    }

    #[test]
    fn payment_to_revenue_account_is_rejected() {
        let books = TestBooks::standard();
        let invoice = draft_invoice(&books);
        issue_invoice(books.tenant, invoice.id, &books.connection).unwrap();

        let got = record_invoice_payment(
            books.tenant,
            invoice.id,
            Money::from_dollars(10),
            date!(2025 - 03 - 10),
            account_by_code(&books, "4000").id,
            &books.connection,
        );

        assert!(matches!(got, Err(Error::InvalidAccount(_))));
    }

    #[test]
    fn void_draft_posts_nothing() {
        let books = TestBooks::standard();
        let invoice = draft_invoice(&books);

        let voided =
            void_invoice(books.tenant, invoice.id, date!(2025 - 03 - 05), &books.connection)
                .unwrap();

        assert_eq!(voided.status, InvoiceStatus::Void);
        assert_eq!(voided.journal_entry_id, None);
    }

    #[test]
    fn void_issued_reverses_entry() {
        let books = TestBooks::standard();
        let invoice = draft_invoice(&books);
        let issued = issue_invoice(books.tenant, invoice.id, &books.connection).unwrap();

        void_invoice(books.tenant, invoice.id, date!(2025 - 03 - 05), &books.connection).unwrap();

        let entry = get_entry(
            books.organization_id(),
            issued.journal_entry_id.unwrap(),
            &books.connection,
        )
        .unwrap();
        assert_eq!(entry.status, EntryStatus::Reversed);
        let got = get_invoice(books.organization_id(), invoice.id, &books.connection).unwrap();
        assert_eq!(got.status, InvoiceStatus::Void);
        assert_eq!(got.outstanding(), Money::ZERO);
    }

    #[test]
    fn void_with_payments_is_rejected() {
        let books = TestBooks::standard();
        let invoice = draft_invoice(&books);
        issue_invoice(books.tenant, invoice.id, &books.connection).unwrap();
        record_invoice_payment(
            books.tenant,
            invoice.id,
            Money::from_dollars(10),
            date!(2025 - 03 - 10),
            account_by_code(&books, "1020").id,
            &books.connection,
        )
        .unwrap();

        let got = void_invoice(books.tenant, invoice.id, date!(2025 - 03 - 11), &books.connection);

        assert_eq!(got, Err(Error::DocumentHasPayments));
    }

    #[test]
    fn invoices_are_scoped_to_organization() {
        let books = TestBooks::standard();
        let invoice = draft_invoice(&books);
        let other = books.other_tenant();

        assert_eq!(
            get_invoice(other.organization_id, invoice.id, &books.connection),
            Err(Error::NotFound)
        );
        assert_eq!(
            issue_invoice(other, invoice.id, &books.connection),
            Err(Error::NotFound)
        );
    }

    #[test]
    fn overdue_only_when_open_and_past_due() {
        let books = TestBooks::standard();
        let invoice = draft_invoice(&books);
        let after_due = date!(2025 - 04 - 01);

        assert!(!invoice.is_overdue(after_due));
        let issued = issue_invoice(books.tenant, invoice.id, &books.connection).unwrap();
        assert!(issued.is_overdue(after_due));
        assert!(!issued.is_overdue(DUE_DATE));
    }
}
