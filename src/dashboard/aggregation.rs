//! Monthly revenue and expense totals for the dashboard charts.

use std::collections::HashMap;

use rusqlite::Connection;
use time::{Date, Month};

use crate::{Error, account::AccountKind, money::Money, organization::OrganizationId};

/// Revenue and expenses posted in one calendar month, each in its normal sign.
#[derive(Debug, Clone, Copy, PartialEq)]
pub(super) struct MonthlyTotals {
    /// The first day of the month.
    pub month: Date,
    pub revenue: Money,
    pub expenses: Money,
}

impl MonthlyTotals {
    pub fn net_income(&self) -> Money {
        self.revenue - self.expenses
    }
}

fn previous_month(month: Date) -> Date {
    let (year, previous) = match month.month() {
        Month::January => (month.year() - 1, Month::December),
        other => (month.year(), other.previous()),
    };

    Date::from_calendar_date(year, previous, 1).unwrap_or(month)
}

/// The first day of each of the `count` months up to and including the month of `today`, oldest first.
pub(super) fn last_months(today: Date, count: usize) -> Vec<Date> {
    let mut month = today.replace_day(1).unwrap_or(today);
    let mut months = Vec::with_capacity(count);

    for _ in 0..count {
        months.push(month);
        month = previous_month(month);
    }

    months.reverse();
    months
}

fn month_key(month: Date) -> String {
    format!("{}-{:02}", month.year(), u8::from(month.month()))
}

/// Revenue and expenses for each of `months`, counting entries dated up to `to`.
///
/// Months without postings are included with zero totals.
pub(super) fn monthly_totals(
    organization_id: OrganizationId,
    months: &[Date],
    to: Date,
    connection: &Connection,
) -> Result<Vec<MonthlyTotals>, Error> {
    let Some(&from) = months.first() else {
        return Ok(Vec::new());
    };

    let mut credits_less_debits: HashMap<(String, AccountKind), Money> = HashMap::new();
    let mut statement = connection.prepare(
        "SELECT substr(e.date, 1, 7), a.kind, SUM(l.credit) - SUM(l.debit)
        FROM journal_line l
        INNER JOIN journal_entry e ON e.id = l.entry_id
        INNER JOIN account a ON a.id = l.account_id
        WHERE e.organization_id = ?1
            AND e.date >= ?2
            AND e.date <= ?3
            AND a.kind IN ('revenue', 'expense')
        GROUP BY substr(e.date, 1, 7), a.kind",
    )?;
    let rows = statement.query_map((organization_id, from, to), |row| {
        Ok((
            row.get::<_, String>(0)?,
            row.get::<_, AccountKind>(1)?,
            row.get::<_, Money>(2)?,
        ))
    })?;

    for row in rows {
        let (month, kind, amount) = row?;
        credits_less_debits.insert((month, kind), amount);
    }

    Ok(months
        .iter()
        .map(|&month| {
            let key = month_key(month);
            let amount = |kind| {
                credits_less_debits
                    .get(&(key.clone(), kind))
                    .copied()
                    .unwrap_or(Money::ZERO)
            };

            MonthlyTotals {
                month,
                revenue: amount(AccountKind::Revenue),
                expenses: -amount(AccountKind::Expense),
            }
        })
        .collect())
}

/// Month names with the year, e.g. "Mar 2025".
pub(super) fn format_month_labels(months: &[Date]) -> Vec<String> {
    months
        .iter()
        .map(|month| {
            let name = match month.month() {
                Month::January => "Jan",
                Month::February => "Feb",
                Month::March => "Mar",
                Month::April => "Apr",
                Month::May => "May",
                Month::June => "Jun",
                Month::July => "Jul",
                Month::August => "Aug",
                Month::September => "Sep",
                Month::October => "Oct",
                Month::November => "Nov",
                Month::December => "Dec",
            };

            format!("{name} {}", month.year())
        })
        .collect()
}
