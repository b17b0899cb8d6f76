//! Financial statements, aging and ratios computed from the posted journal.
//!
//! Every report reads journal lines directly. Reversed entries and their
//! reversals are both included, so a reversal nets its original to zero.

use std::collections::HashMap;

use rusqlite::Connection;
use serde::Serialize;
use time::Date;

use crate::{
    Error,
    account::{Account, AccountId, AccountKind, AccountRole, list_accounts},
    bill::list_bills,
    invoice::list_invoices,
    money::Money,
    organization::OrganizationId,
};

/// Total debits and credits per account for lines dated inside the range.
///
/// A missing `from` means since the beginning of the books.
fn line_totals(
    organization_id: OrganizationId,
    from: Option<Date>,
    to: Date,
    connection: &Connection,
) -> Result<HashMap<AccountId, (Money, Money)>, Error> {
    connection
        .prepare(
            "SELECT l.account_id, SUM(l.debit), SUM(l.credit)
            FROM journal_line l
            INNER JOIN journal_entry e ON e.id = l.entry_id
            WHERE e.organization_id = ?1
                AND (?2 IS NULL OR e.date >= ?2)
                AND e.date <= ?3
            GROUP BY l.account_id",
        )?
        .query_map((organization_id, from, to), |row| {
            Ok((
                row.get::<_, AccountId>(0)?,
                (row.get::<_, Money>(1)?, row.get::<_, Money>(2)?),
            ))
        })?
        .map(|maybe_total| maybe_total.map_err(Error::from))
        .collect()
}

/// Signed balances (debits minus credits) for lines dated inside the range.
fn signed_balances(
    organization_id: OrganizationId,
    from: Option<Date>,
    to: Date,
    connection: &Connection,
) -> Result<HashMap<AccountId, Money>, Error> {
    Ok(line_totals(organization_id, from, to, connection)?
        .into_iter()
        .map(|(account_id, (debit, credit))| (account_id, debit - credit))
        .collect())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrialBalanceRow {
    #[serde(skip)]
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub debit: Money,
    pub credit: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrialBalance {
    pub as_of: Date,
    pub rows: Vec<TrialBalanceRow>,
    pub total_debit: Money,
    pub total_credit: Money,
}

impl TrialBalance {
    pub fn is_balanced(&self) -> bool {
        self.total_debit == self.total_credit
    }
}

/// The debits and credits posted to each account up to and including `as_of`.
///
/// Accounts without postings are left out. Rows are ordered by account code.
pub fn trial_balance(
    organization_id: OrganizationId,
    as_of: Date,
    connection: &Connection,
) -> Result<TrialBalance, Error> {
    let totals = line_totals(organization_id, None, as_of, connection)?;
    let accounts = list_accounts(organization_id, connection)?;

    let rows: Vec<TrialBalanceRow> = accounts
        .into_iter()
        .filter_map(|account| {
            totals
                .get(&account.id)
                .map(|&(debit, credit)| TrialBalanceRow {
                    account_id: account.id,
                    code: account.code.as_str().to_owned(),
                    name: account.name,
                    kind: account.kind,
                    debit,
                    credit,
                })
        })
        .collect();

    Ok(TrialBalance {
        as_of,
        total_debit: rows.iter().map(|row| row.debit).sum(),
        total_credit: rows.iter().map(|row| row.credit).sum(),
        rows,
    })
}

/// An account on a statement with its balance in the account's normal sign.
#[derive(Debug, Clone, PartialEq)]
pub struct StatementLine {
    pub account_id: AccountId,
    pub code: String,
    pub name: String,
    pub amount: Money,
}

/// The non-zero accounts of one kind, ordered by code.
fn statement_lines(
    accounts: &[Account],
    balances: &HashMap<AccountId, Money>,
    kind: AccountKind,
) -> Vec<StatementLine> {
    accounts
        .iter()
        .filter(|account| account.kind == kind)
        .filter_map(|account| {
            let balance = balances.get(&account.id).copied().unwrap_or(Money::ZERO);

            (!balance.is_zero()).then(|| StatementLine {
                account_id: account.id,
                code: account.code.as_str().to_owned(),
                name: account.name.clone(),
                amount: kind.normal_balance(balance),
            })
        })
        .collect()
}

fn total(lines: &[StatementLine]) -> Money {
    lines.iter().map(|line| line.amount).sum()
}

#[derive(Debug, Clone, PartialEq)]
pub struct IncomeStatement {
    pub from: Date,
    pub to: Date,
    pub revenue: Vec<StatementLine>,
    pub expenses: Vec<StatementLine>,
    pub total_revenue: Money,
    pub total_expenses: Money,
    /// The part of the expenses posted to the cost of goods sold account.
    pub cost_of_goods_sold: Money,
}

impl IncomeStatement {
    pub fn gross_profit(&self) -> Money {
        self.total_revenue - self.cost_of_goods_sold
    }

    pub fn net_income(&self) -> Money {
        self.total_revenue - self.total_expenses
    }
}

/// Revenue and expense activity dated from `from` to `to`, inclusive.
///
/// # Errors
///
/// - [Error::InvalidDateRange] if `from` is after `to`.
pub fn income_statement(
    organization_id: OrganizationId,
    from: Date,
    to: Date,
    connection: &Connection,
) -> Result<IncomeStatement, Error> {
    if from > to {
        return Err(Error::InvalidDateRange { from, to });
    }

    let balances = signed_balances(organization_id, Some(from), to, connection)?;
    let accounts = list_accounts(organization_id, connection)?;

    let revenue = statement_lines(&accounts, &balances, AccountKind::Revenue);
    let expenses = statement_lines(&accounts, &balances, AccountKind::Expense);
    let cost_of_goods_sold = accounts
        .iter()
        .filter(|account| account.role == Some(AccountRole::CostOfGoodsSold))
        .filter_map(|account| balances.get(&account.id))
        .copied()
        .sum();

    Ok(IncomeStatement {
        from,
        to,
        total_revenue: total(&revenue),
        total_expenses: total(&expenses),
        revenue,
        expenses,
        cost_of_goods_sold,
    })
}

#[derive(Debug, Clone, PartialEq)]
pub struct BalanceSheet {
    pub as_of: Date,
    pub assets: Vec<StatementLine>,
    pub liabilities: Vec<StatementLine>,
    pub equity: Vec<StatementLine>,
    /// Net income from the first entry through `as_of` that has not been closed to an equity account.
    pub retained_earnings: Money,
    pub total_assets: Money,
    pub total_liabilities: Money,
    /// The equity accounts plus retained earnings.
    pub total_equity: Money,
    pub current_assets: Money,
    pub current_liabilities: Money,
    pub inventory: Money,
}

impl BalanceSheet {
    /// Whether assets equal liabilities plus equity.
    pub fn is_balanced(&self) -> bool {
        self.total_assets == self.total_liabilities + self.total_equity
    }
}

/// Asset, liability and equity balances at the end of `as_of`.
pub fn balance_sheet(
    organization_id: OrganizationId,
    as_of: Date,
    connection: &Connection,
) -> Result<BalanceSheet, Error> {
    let balances = signed_balances(organization_id, None, as_of, connection)?;
    let accounts = list_accounts(organization_id, connection)?;

    let assets = statement_lines(&accounts, &balances, AccountKind::Asset);
    let liabilities = statement_lines(&accounts, &balances, AccountKind::Liability);
    let equity = statement_lines(&accounts, &balances, AccountKind::Equity);

    let revenue = total(&statement_lines(&accounts, &balances, AccountKind::Revenue));
    let expenses = total(&statement_lines(&accounts, &balances, AccountKind::Expense));
    let retained_earnings = revenue - expenses;

    let normal_balance_where = |predicate: &dyn Fn(&Account) -> bool| -> Money {
        accounts
            .iter()
            .filter(|account| predicate(account))
            .filter_map(|account| {
                balances
                    .get(&account.id)
                    .map(|&balance| account.kind.normal_balance(balance))
            })
            .sum()
    };

    let current_assets =
        normal_balance_where(&|account| account.kind == AccountKind::Asset && account.is_current);
    let current_liabilities = normal_balance_where(&|account| {
        account.kind == AccountKind::Liability && account.is_current
    });
    let inventory = normal_balance_where(&|account| account.role == Some(AccountRole::Inventory));

    Ok(BalanceSheet {
        as_of,
        total_assets: total(&assets),
        total_liabilities: total(&liabilities),
        total_equity: total(&equity) + retained_earnings,
        assets,
        liabilities,
        equity,
        retained_earnings,
        current_assets,
        current_liabilities,
        inventory,
    })
}

/// Whether an aging report covers money owed to or by the organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AgingKind {
    #[default]
    Receivable,
    Payable,
}

impl AgingKind {
    pub fn label(&self) -> &'static str {
        match self {
            AgingKind::Receivable => "Receivables",
            AgingKind::Payable => "Payables",
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AgingKind::Receivable => "receivable",
            AgingKind::Payable => "payable",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum AgingBucket {
    Current,
    Days1To30,
    Days31To60,
    Days61To90,
    Over90,
}

impl AgingBucket {
    pub const ALL: [AgingBucket; 5] = [
        AgingBucket::Current,
        AgingBucket::Days1To30,
        AgingBucket::Days31To60,
        AgingBucket::Days61To90,
        AgingBucket::Over90,
    ];

    /// The bucket for a document `days_past_due` days after its due date.
    pub fn for_days_past_due(days_past_due: i64) -> Self {
        match days_past_due {
            ..=0 => AgingBucket::Current,
            1..=30 => AgingBucket::Days1To30,
            31..=60 => AgingBucket::Days31To60,
            61..=90 => AgingBucket::Days61To90,
            _ => AgingBucket::Over90,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AgingBucket::Current => "Current",
            AgingBucket::Days1To30 => "1-30 days",
            AgingBucket::Days31To60 => "31-60 days",
            AgingBucket::Days61To90 => "61-90 days",
            AgingBucket::Over90 => "Over 90 days",
        }
    }

    fn index(self) -> usize {
        self as usize
    }
}

/// An open document with what is still owed on it.
#[derive(Debug, Clone, PartialEq)]
pub struct AgingRow {
    pub document_id: i64,
    pub number: String,
    pub contact_name: String,
    pub due_date: Date,
    pub days_past_due: i64,
    pub bucket: AgingBucket,
    pub outstanding: Money,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AgingReport {
    pub kind: AgingKind,
    pub as_of: Date,
    /// Most overdue first.
    pub rows: Vec<AgingRow>,
    /// The outstanding total of each bucket, in the order of [AgingBucket::ALL].
    pub bucket_totals: [Money; 5],
}

impl AgingReport {
    pub fn total(&self) -> Money {
        self.bucket_totals.iter().copied().sum()
    }

    pub fn bucket_total(&self, bucket: AgingBucket) -> Money {
        self.bucket_totals[bucket.index()]
    }
}

/// Open invoices or bills dated on or before `as_of`, bucketed by days past due.
///
/// The outstanding amount is what is owed now; payments dated after `as_of`
/// are not added back.
pub fn aging(
    organization_id: OrganizationId,
    kind: AgingKind,
    as_of: Date,
    connection: &Connection,
) -> Result<AgingReport, Error> {
    let open_documents: Vec<(i64, String, String, Date, Money)> = match kind {
        AgingKind::Receivable => list_invoices(organization_id, connection)?
            .into_iter()
            .filter(|invoice| invoice.status.is_open() && invoice.issue_date <= as_of)
            .map(|invoice| {
                let outstanding = invoice.outstanding();
                (
                    invoice.id,
                    invoice.number,
                    invoice.customer_name,
                    invoice.due_date,
                    outstanding,
                )
            })
            .collect(),
        AgingKind::Payable => list_bills(organization_id, connection)?
            .into_iter()
            .filter(|bill| bill.status.is_open() && bill.bill_date <= as_of)
            .map(|bill| {
                let outstanding = bill.outstanding();
                (bill.id, bill.number, bill.vendor_name, bill.due_date, outstanding)
            })
            .collect(),
    };

    let mut bucket_totals = [Money::ZERO; 5];
    let mut rows: Vec<AgingRow> = open_documents
        .into_iter()
        .filter(|(.., outstanding)| outstanding.is_positive())
        .map(|(document_id, number, contact_name, due_date, outstanding)| {
            let days_past_due = (as_of - due_date).whole_days();
            let bucket = AgingBucket::for_days_past_due(days_past_due);
            bucket_totals[bucket.index()] += outstanding;

            AgingRow {
                document_id,
                number,
                contact_name,
                due_date,
                days_past_due,
                bucket,
                outstanding,
            }
        })
        .collect();

    rows.sort_by(|a, b| {
        b.days_past_due
            .cmp(&a.days_past_due)
            .then_with(|| a.number.cmp(&b.number))
    });

    Ok(AgingReport {
        kind,
        as_of,
        rows,
        bucket_totals,
    })
}

/// Liquidity, leverage and profitability ratios.
///
/// A ratio is `None` when its denominator is zero.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Ratios {
    pub current_ratio: Option<f64>,
    /// Current assets less inventory, over current liabilities.
    pub quick_ratio: Option<f64>,
    pub debt_to_equity: Option<f64>,
    pub gross_margin: Option<f64>,
    pub net_margin: Option<f64>,
}

fn ratio(numerator: Money, denominator: Money) -> Option<f64> {
    (!denominator.is_zero()).then(|| numerator.as_f64() / denominator.as_f64())
}

impl Ratios {
    pub fn from_statements(balance_sheet: &BalanceSheet, income_statement: &IncomeStatement) -> Self {
        let current_liabilities = balance_sheet.current_liabilities;
        let revenue = income_statement.total_revenue;

        Self {
            current_ratio: ratio(balance_sheet.current_assets, current_liabilities),
            quick_ratio: ratio(
                balance_sheet.current_assets - balance_sheet.inventory,
                current_liabilities,
            ),
            debt_to_equity: ratio(balance_sheet.total_liabilities, balance_sheet.total_equity),
            gross_margin: ratio(income_statement.gross_profit(), revenue),
            net_margin: ratio(income_statement.net_income(), revenue),
        }
    }
}

/// Ratios from the balance sheet at `as_of` and the income statement for `from` to `as_of`.
pub fn ratios(
    organization_id: OrganizationId,
    from: Date,
    as_of: Date,
    connection: &Connection,
) -> Result<Ratios, Error> {
    let balance_sheet = balance_sheet(organization_id, as_of, connection)?;
    let income_statement = income_statement(organization_id, from, as_of, connection)?;

    Ok(Ratios::from_statements(&balance_sheet, &income_statement))
}

/// January 1st of the year `date` falls in.
pub fn start_of_year(date: Date) -> Date {
    date.replace_ordinal(1).unwrap_or(date)
}

#[cfg(test)]
pub(crate) mod test_reports {
    use crate::{
        bill::{Bill, approve_bill, test_bills::draft_bill},
        invoice::{Invoice, issue_invoice, test_invoices::draft_invoice},
        test_utils::TestBooks,
    };

    /// Issue the standard test invoice ($287.50 owed by Acme, issued
    /// 2025-03-01) and approve the standard test bill ($1,120 owed to the
    /// landlord, dated 2025-04-01).
    pub(crate) fn issued_invoice_and_approved_bill(books: &TestBooks) -> (Invoice, Bill) {
        let invoice = draft_invoice(books);
        let invoice = issue_invoice(books.tenant, invoice.id, &books.connection).unwrap();
        let bill = draft_bill(books);
        let bill = approve_bill(books.tenant, bill.id, &books.connection).unwrap();

        (invoice, bill)
    }
}

#[cfg(test)]
mod trial_balance_tests {
    use time::macros::date;

    use crate::{
        ledger::{EntrySource, NewJournalEntry, post_entry, reverse_entry},
        money::Money,
        report::{test_reports::issued_invoice_and_approved_bill, trial_balance},
        test_utils::{TestBooks, account_by_code},
    };

    #[test]
    fn debits_equal_credits() {
        let books = TestBooks::standard();
        issued_invoice_and_approved_bill(&books);

        let got = trial_balance(books.organization_id(), date!(2025 - 12 - 31), &books.connection)
            .unwrap();

        assert!(got.is_balanced());
        assert_eq!(got.total_debit, Money::from_cents(140_750));
        let codes: Vec<&str> = got.rows.iter().map(|row| row.code.as_str()).collect();
        assert_eq!(codes, ["1100", "2010", "2100", "4000", "4100", "6100", "6200"]);
        assert_eq!(got.rows[0].debit, Money::from_cents(28_750));
    }

    #[test]
    fn leaves_out_entries_after_as_of() {
        let books = TestBooks::standard();
        issued_invoice_and_approved_bill(&books);

        let got = trial_balance(books.organization_id(), date!(2025 - 03 - 15), &books.connection)
            .unwrap();

        assert_eq!(got.total_debit, Money::from_cents(28_750));
        assert!(got.rows.iter().all(|row| row.code != "2010"));
    }

    #[test]
    fn reversal_nets_original_to_zero() {
        let books = TestBooks::standard();
        let cash = account_by_code(&books, "1010");
        let income = account_by_code(&books, "4900");
        let entry = post_entry(
            books.tenant,
            NewJournalEntry::new(date!(2025 - 06 - 01), "Refund", EntrySource::Manual)
                .debit(cash.id, Money::from_dollars(40), "")
                .credit(income.id, Money::from_dollars(40), ""),
            &books.connection,
        )
        .unwrap();
        reverse_entry(books.tenant, entry.id, date!(2025 - 06 - 02), None, &books.connection)
            .unwrap();

        let got = trial_balance(books.organization_id(), date!(2025 - 06 - 30), &books.connection)
            .unwrap();

        assert!(got.is_balanced());
        for row in &got.rows {
            assert_eq!(row.debit, row.credit, "account {} does not net to zero", row.code);
        }
    }

    #[test]
    fn ignores_other_organizations() {
        let books = TestBooks::standard();
        issued_invoice_and_approved_bill(&books);
        let other = books.other_organization();

        let got = trial_balance(other, date!(2025 - 12 - 31), &books.connection).unwrap();

        assert!(got.rows.is_empty());
        assert_eq!(got.total_debit, Money::ZERO);
    }
}

#[cfg(test)]
mod income_statement_tests {
    use time::macros::date;

    use crate::{
        Error,
        money::Money,
        report::{income_statement, test_reports::issued_invoice_and_approved_bill},
        test_utils::TestBooks,
    };

    #[test]
    fn revenue_less_expenses() {
        let books = TestBooks::standard();
        issued_invoice_and_approved_bill(&books);

        let got = income_statement(
            books.organization_id(),
            date!(2025 - 01 - 01),
            date!(2025 - 12 - 31),
            &books.connection,
        )
        .unwrap();

        assert_eq!(got.total_revenue, Money::from_dollars(250));
        assert_eq!(got.total_expenses, Money::from_dollars(1120));
        assert_eq!(got.net_income(), Money::from_dollars(-870));
        assert_eq!(got.revenue.len(), 2);
        assert_eq!(got.expenses.len(), 2);
    }

    #[test]
    fn only_counts_activity_in_range() {
        let books = TestBooks::standard();
        issued_invoice_and_approved_bill(&books);

        let got = income_statement(
            books.organization_id(),
            date!(2025 - 03 - 01),
            date!(2025 - 03 - 31),
            &books.connection,
        )
        .unwrap();

        assert_eq!(got.total_revenue, Money::from_dollars(250));
        assert!(got.expenses.is_empty());
    }

    #[test]
    fn rejects_backwards_range() {
        let books = TestBooks::standard();

        let got = income_statement(
            books.organization_id(),
            date!(2025 - 04 - 01),
            date!(2025 - 03 - 01),
            &books.connection,
        );

        assert_eq!(
            got,
            Err(Error::InvalidDateRange {
                from: date!(2025 - 04 - 01),
                to: date!(2025 - 03 - 01),
            })
        );
    }
}

#[cfg(test)]
mod balance_sheet_tests {
    use time::macros::date;

    use crate::{
        money::Money,
        report::{balance_sheet, test_reports::issued_invoice_and_approved_bill},
        test_utils::TestBooks,
    };

    #[test]
    fn assets_equal_liabilities_plus_equity() {
        let books = TestBooks::standard();
        issued_invoice_and_approved_bill(&books);

        let got = balance_sheet(books.organization_id(), date!(2025 - 12 - 31), &books.connection)
            .unwrap();

        assert!(got.is_balanced());
        assert_eq!(got.total_assets, Money::from_cents(28_750));
        assert_eq!(got.total_liabilities, Money::from_cents(115_750));
        assert_eq!(got.retained_earnings, Money::from_dollars(-870));
        assert_eq!(got.total_equity, Money::from_dollars(-870));
        assert_eq!(got.current_assets, Money::from_cents(28_750));
        assert_eq!(got.current_liabilities, Money::from_cents(115_750));
    }

    #[test]
    fn empty_books_are_balanced() {
        let books = TestBooks::standard();

        let got = balance_sheet(books.organization_id(), date!(2025 - 12 - 31), &books.connection)
            .unwrap();

        assert!(got.is_balanced());
        assert!(got.assets.is_empty());
        assert_eq!(got.total_equity, Money::ZERO);
    }
}

#[cfg(test)]
mod aging_tests {
    use time::macros::date;

    use crate::{
        invoice::{record_invoice_payment, test_invoices::draft_invoice},
        money::Money,
        report::{AgingBucket, AgingKind, aging, test_reports::issued_invoice_and_approved_bill},
        test_utils::{TestBooks, account_by_code},
    };

    #[test]
    fn buckets_by_days_past_due() {
        assert_eq!(AgingBucket::for_days_past_due(-5), AgingBucket::Current);
        assert_eq!(AgingBucket::for_days_past_due(0), AgingBucket::Current);
        assert_eq!(AgingBucket::for_days_past_due(1), AgingBucket::Days1To30);
        assert_eq!(AgingBucket::for_days_past_due(30), AgingBucket::Days1To30);
        assert_eq!(AgingBucket::for_days_past_due(31), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_days_past_due(60), AgingBucket::Days31To60);
        assert_eq!(AgingBucket::for_days_past_due(61), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_days_past_due(90), AgingBucket::Days61To90);
        assert_eq!(AgingBucket::for_days_past_due(91), AgingBucket::Over90);
    }

    #[test]
    fn receivables_leave_out_drafts() {
        let books = TestBooks::standard();
        let (invoice, _) = issued_invoice_and_approved_bill(&books);
        draft_invoice(&books);

        let got = aging(
            books.organization_id(),
            AgingKind::Receivable,
            date!(2025 - 05 - 15),
            &books.connection,
        )
        .unwrap();

        assert_eq!(got.rows.len(), 1);
        assert_eq!(got.rows[0].number, invoice.number);
        assert_eq!(got.rows[0].days_past_due, 45);
        assert_eq!(got.rows[0].bucket, AgingBucket::Days31To60);
        assert_eq!(got.bucket_total(AgingBucket::Days31To60), Money::from_cents(28_750));
        assert_eq!(got.total(), Money::from_cents(28_750));
    }

    #[test]
    fn payables_use_what_is_still_owed() {
        let books = TestBooks::standard();
        let (_, bill) = issued_invoice_and_approved_bill(&books);
        crate::bill::record_bill_payment(
            books.tenant,
            bill.id,
            Money::from_dollars(120),
            date!(2025 - 04 - 10),
            account_by_code(&books, "1020").id,
            &books.connection,
        )
        .unwrap();

        let got = aging(
            books.organization_id(),
            AgingKind::Payable,
            date!(2025 - 05 - 15),
            &books.connection,
        )
        .unwrap();

        assert_eq!(got.rows.len(), 1);
        assert_eq!(got.rows[0].bucket, AgingBucket::Days1To30);
        assert_eq!(got.rows[0].outstanding, Money::from_dollars(1000));
    }

    #[test]
    fn paid_and_future_documents_are_left_out() {
        let books = TestBooks::standard();
        let (invoice, _) = issued_invoice_and_approved_bill(&books);
        record_invoice_payment(
            books.tenant,
            invoice.id,
            invoice.totals.total,
            date!(2025 - 03 - 05),
            account_by_code(&books, "1020").id,
            &books.connection,
        )
        .unwrap();

        let receivables = aging(
            books.organization_id(),
            AgingKind::Receivable,
            date!(2025 - 05 - 15),
            &books.connection,
        )
        .unwrap();
        let payables_before_bill = aging(
            books.organization_id(),
            AgingKind::Payable,
            date!(2025 - 03 - 15),
            &books.connection,
        )
        .unwrap();

        assert!(receivables.rows.is_empty());
        assert!(payables_before_bill.rows.is_empty());
    }
}
