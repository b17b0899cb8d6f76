//! Numbering and totals shared by journal entries, invoices, bills and sales.

use rusqlite::Connection;
use serde::Serialize;

use crate::{Error, account::AccountId, money::Money, organization::OrganizationId};

/// The next sequence number for `table` in the organization, starting at one.
///
/// `table` must have `organization_id` and `sequence` columns. Numbers are
/// assigned inside the caller's transaction, and the table's
/// `UNIQUE(organization_id, sequence)` constraint rejects any duplicate.
pub(crate) fn next_sequence(
    table: &'static str,
    organization_id: OrganizationId,
    connection: &Connection,
) -> Result<i64, Error> {
    connection
        .query_row(
            &format!("SELECT COALESCE(MAX(sequence), 0) + 1 FROM {table} WHERE organization_id = ?1"),
            (organization_id,),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Format a sequence number for display, e.g. `INV-000042`.
pub fn format_number(prefix: &str, sequence: i64) -> String {
    format!("{prefix}-{sequence:06}")
}

/// The subtotal, tax and total of an invoice or bill.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DocumentTotals {
    pub subtotal: Money,
    pub tax: Money,
    pub total: Money,
}

impl DocumentTotals {
    /// Totals for line amounts taxed at `tax_rate_bps` basis points.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAmount] if the totals overflow.
    pub fn new(
        line_amounts: impl IntoIterator<Item = Money>,
        tax_rate_bps: u32,
    ) -> Result<Self, Error> {
        let subtotal = Money::try_sum(line_amounts)?;
        let tax = subtotal.percent_bps(tax_rate_bps);

        Ok(Self {
            subtotal,
            tax,
            total: subtotal.checked_add(tax)?,
        })
    }
}

/// Sum line amounts per account, keeping the order in which accounts first appear.
pub(crate) fn sum_by_account(
    amounts: impl IntoIterator<Item = (AccountId, Money)>,
) -> Vec<(AccountId, Money)> {
    let mut sums: Vec<(AccountId, Money)> = Vec::new();

    for (account_id, amount) in amounts {
        match sums.iter_mut().find(|(id, _)| *id == account_id) {
            Some((_, sum)) => *sum += amount,
            None => sums.push((account_id, amount)),
        }
    }

    sums
}

/// Check a payment against what is still owed on a document.
///
/// # Errors
///
/// - [Error::InvalidAmount] if `amount` is not positive.
/// - [Error::Overpayment] if `amount` is more than `outstanding`.
pub(crate) fn validate_payment(amount: Money, outstanding: Money) -> Result<(), Error> {
    if !amount.is_positive() {
        return Err(Error::InvalidAmount(amount.to_string()));
    }

    if amount > outstanding {
        return Err(Error::Overpayment(outstanding));
    }

    Ok(())
}

/// Parse a tax rate such as "15" or "12.5" (percent) into basis points.
///
/// # Errors
///
/// Returns [Error::InvalidAmount] for negative rates, rates above 100%, or
/// more than two decimal places.
pub fn parse_tax_rate(raw: &str) -> Result<u32, Error> {
    let raw = raw.trim().trim_end_matches('%');
    if raw.is_empty() {
        return Ok(0);
    }

    // A percentage with two decimal places has the same digits as an amount in cents.
    let basis_points = raw
        .parse::<Money>()
        .map_err(|_| Error::InvalidAmount(raw.to_owned()))?
        .cents();

    if !(0..=10_000).contains(&basis_points) {
        return Err(Error::InvalidAmount(raw.to_owned()));
    }

    Ok(basis_points as u32)
}

/// Format basis points as a percentage, e.g. 1250 as "12.5%".
pub fn format_tax_rate(basis_points: u32) -> String {
    let whole = basis_points / 100;
    let fraction = basis_points % 100;

    match fraction {
        0 => format!("{whole}%"),
        f if f % 10 == 0 => format!("{whole}.{}%", f / 10),
        f => format!("{whole}.{f:02}%"),
    }
}
