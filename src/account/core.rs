//! The chart of accounts: account kinds, roles, codes and their storage.

use std::{collections::HashMap, fmt::Display};

use rusqlite::{
    Connection, Row, ToSql,
    types::{FromSql, FromSqlResult, ToSqlOutput, ValueRef},
};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error, error::is_unique_violation, money::Money, organization::OrganizationId,
    sql_enum::sql_text_enum,
};

pub type AccountId = i64;

/// The five classes of account in double-entry bookkeeping.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountKind {
    Asset,
    Liability,
    Equity,
    Revenue,
    Expense,
}

impl AccountKind {
    pub const ALL: [AccountKind; 5] = [
        AccountKind::Asset,
        AccountKind::Liability,
        AccountKind::Equity,
        AccountKind::Revenue,
        AccountKind::Expense,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountKind::Asset => "asset",
            AccountKind::Liability => "liability",
            AccountKind::Equity => "equity",
            AccountKind::Revenue => "revenue",
            AccountKind::Expense => "expense",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccountKind::Asset => "Asset",
            AccountKind::Liability => "Liability",
            AccountKind::Equity => "Equity",
            AccountKind::Revenue => "Revenue",
            AccountKind::Expense => "Expense",
        }
    }

    /// Whether a debit increases the account.
    pub fn is_debit_normal(&self) -> bool {
        matches!(self, AccountKind::Asset | AccountKind::Expense)
    }

    /// Convert a signed balance (debits minus credits) so that it is positive
    /// when the account has its normal balance.
    pub fn normal_balance(&self, signed_balance: Money) -> Money {
        if self.is_debit_normal() {
            signed_balance
        } else {
            -signed_balance
        }
    }
}

sql_text_enum!(AccountKind);

/// A well-known purpose for an account that subledgers post to.
///
/// Each role is held by at most one account per organization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccountRole {
    Cash,
    Bank,
    CardClearing,
    AccountsReceivable,
    AccountsPayable,
    Inventory,
    SalesTaxPayable,
    OwnerEquity,
    RetainedEarnings,
    SalesRevenue,
    CostOfGoodsSold,
    InventoryAdjustment,
}

impl AccountRole {
    pub const ALL: [AccountRole; 12] = [
        AccountRole::Cash,
        AccountRole::Bank,
        AccountRole::CardClearing,
        AccountRole::AccountsReceivable,
        AccountRole::AccountsPayable,
        AccountRole::Inventory,
        AccountRole::SalesTaxPayable,
        AccountRole::OwnerEquity,
        AccountRole::RetainedEarnings,
        AccountRole::SalesRevenue,
        AccountRole::CostOfGoodsSold,
        AccountRole::InventoryAdjustment,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Cash => "cash",
            AccountRole::Bank => "bank",
            AccountRole::CardClearing => "card_clearing",
            AccountRole::AccountsReceivable => "accounts_receivable",
            AccountRole::AccountsPayable => "accounts_payable",
            AccountRole::Inventory => "inventory",
            AccountRole::SalesTaxPayable => "sales_tax_payable",
            AccountRole::OwnerEquity => "owner_equity",
            AccountRole::RetainedEarnings => "retained_earnings",
            AccountRole::SalesRevenue => "sales_revenue",
            AccountRole::CostOfGoodsSold => "cost_of_goods_sold",
            AccountRole::InventoryAdjustment => "inventory_adjustment",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AccountRole::Cash => "Cash",
            AccountRole::Bank => "Bank",
            AccountRole::CardClearing => "Card Clearing",
            AccountRole::AccountsReceivable => "Accounts Receivable",
            AccountRole::AccountsPayable => "Accounts Payable",
            AccountRole::Inventory => "Inventory",
            AccountRole::SalesTaxPayable => "Sales Tax Payable",
            AccountRole::OwnerEquity => "Owner's Equity",
            AccountRole::RetainedEarnings => "Retained Earnings",
            AccountRole::SalesRevenue => "Sales Revenue",
            AccountRole::CostOfGoodsSold => "Cost of Goods Sold",
            AccountRole::InventoryAdjustment => "Inventory Adjustment",
        }
    }

    /// The kind of account that can hold this role.
    pub fn required_kind(&self) -> AccountKind {
        match self {
            AccountRole::Cash
            | AccountRole::Bank
            | AccountRole::CardClearing
            | AccountRole::AccountsReceivable
            | AccountRole::Inventory => AccountKind::Asset,
            AccountRole::AccountsPayable | AccountRole::SalesTaxPayable => AccountKind::Liability,
            AccountRole::OwnerEquity | AccountRole::RetainedEarnings => AccountKind::Equity,
            AccountRole::SalesRevenue => AccountKind::Revenue,
            AccountRole::CostOfGoodsSold | AccountRole::InventoryAdjustment => {
                AccountKind::Expense
            }
        }
    }
}

sql_text_enum!(AccountRole);

/// The maximum number of characters in an account code.
pub const MAX_ACCOUNT_CODE_LENGTH: usize = 16;

/// A short code that orders the chart of accounts, e.g. "1010" or "6-100".
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct AccountCode(String);

impl AccountCode {
    /// Validate an account code.
    ///
    /// # Errors
    ///
    /// Returns [Error::InvalidAccountCode] if the trimmed code is empty, longer
    /// than [MAX_ACCOUNT_CODE_LENGTH] or contains anything other than ASCII
    /// digits, dots and dashes.
    pub fn new(code: &str) -> Result<Self, Error> {
        let code = code.trim();

        if code.is_empty()
            || code.len() > MAX_ACCOUNT_CODE_LENGTH
            || !code
                .chars()
                .all(|c| c.is_ascii_digit() || c == '.' || c == '-')
        {
            return Err(Error::InvalidAccountCode(code.to_owned()));
        }

        Ok(Self(code.to_owned()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for AccountCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

impl ToSql for AccountCode {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        Ok(ToSqlOutput::from(self.0.as_str()))
    }
}

impl FromSql for AccountCode {
    fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
        value.as_str().map(|code| Self(code.to_owned()))
    }
}

/// An account in an organization's chart of accounts.
#[derive(Debug, Clone, PartialEq)]
pub struct Account {
    pub id: AccountId,
    pub organization_id: OrganizationId,
    pub code: AccountCode,
    pub name: String,
    pub kind: AccountKind,
    pub parent_id: Option<AccountId>,
    pub role: Option<AccountRole>,
    /// Whether the account is a current asset or liability, used for liquidity ratios.
    pub is_current: bool,
    /// Archived accounts stay in reports but cannot receive new postings.
    pub archived: bool,
}

/// The user editable fields of an account.
#[derive(Debug, Clone, PartialEq)]
pub struct AccountDetails {
    pub code: AccountCode,
    pub name: String,
    pub kind: AccountKind,
    pub parent_id: Option<AccountId>,
    pub role: Option<AccountRole>,
    pub is_current: bool,
}

pub fn create_account_table(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute(
        "CREATE TABLE IF NOT EXISTS account (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL REFERENCES organization(id) ON DELETE CASCADE,
            code TEXT NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            parent_id INTEGER REFERENCES account(id),
            role TEXT,
            is_current INTEGER NOT NULL DEFAULT 0,
            archived INTEGER NOT NULL DEFAULT 0,
            UNIQUE(organization_id, code),
            UNIQUE(organization_id, role)
        )",
        (),
    )?;

    Ok(())
}

const ACCOUNT_COLUMNS: &str =
    "id, organization_id, code, name, kind, parent_id, role, is_current, archived";

pub fn map_row_to_account(row: &Row) -> Result<Account, rusqlite::Error> {
    Ok(Account {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        code: row.get(2)?,
        name: row.get(3)?,
        kind: row.get(4)?,
        parent_id: row.get(5)?,
        role: row.get(6)?,
        is_current: row.get(7)?,
        archived: row.get(8)?,
    })
}

fn validate_details(
    organization_id: OrganizationId,
    account_id: Option<AccountId>,
    details: &AccountDetails,
    connection: &Connection,
) -> Result<(), Error> {
    if details.name.trim().is_empty() {
        return Err(Error::EmptyField("Account name"));
    }

    if let Some(role) = details.role {
        if role.required_kind() != details.kind {
            return Err(Error::InvalidAccount(format!(
                "the role {role} needs a {} account",
                role.required_kind().label().to_lowercase()
            )));
        }
    }

    let Some(parent_id) = details.parent_id else {
        return Ok(());
    };

    let parent = match get_account(organization_id, parent_id, connection) {
        Ok(parent) => parent,
        Err(Error::NotFound) => return Err(Error::InvalidParentAccount),
        Err(error) => return Err(error),
    };

    if parent.kind != details.kind {
        return Err(Error::InvalidParentAccount);
    }

    // Walk up from the new parent; reaching the account itself means a cycle.
    if let Some(account_id) = account_id {
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current.id == account_id {
                return Err(Error::InvalidParentAccount);
            }

            ancestor = match current.parent_id {
                Some(id) => Some(get_account(organization_id, id, connection)?),
                None => None,
            };
        }
    }

    Ok(())
}

fn map_write_error(error: rusqlite::Error, details: &AccountDetails) -> Error {
    if is_unique_violation(&error, "account.code") {
        Error::DuplicateAccountCode(details.code.to_string())
    } else if is_unique_violation(&error, "account.role") {
        Error::InvalidAccount(format!(
            "another account already has the role {}",
            details.role.map(|role| role.label()).unwrap_or_default()
        ))
    } else {
        error.into()
    }
}

/// Add an account to the organization's chart of accounts.
///
/// # Errors
///
/// - [Error::DuplicateAccountCode] if the code is taken.
/// - [Error::InvalidParentAccount] if the parent is missing or of another kind.
/// - [Error::InvalidAccount] if the role is taken or needs another kind of account.
pub fn create_account(
    organization_id: OrganizationId,
    details: AccountDetails,
    connection: &Connection,
) -> Result<Account, Error> {
    validate_details(organization_id, None, &details, connection)?;

    connection
        .execute(
            "INSERT INTO account (organization_id, code, name, kind, parent_id, role, is_current)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                organization_id,
                &details.code,
                details.name.trim(),
                details.kind,
                details.parent_id,
                details.role,
                details.is_current,
            ),
        )
        .map_err(|error| map_write_error(error, &details))?;

    Ok(Account {
        id: connection.last_insert_rowid(),
        organization_id,
        code: details.code,
        name: details.name.trim().to_owned(),
        kind: details.kind,
        parent_id: details.parent_id,
        role: details.role,
        is_current: details.is_current,
        archived: false,
    })
}

/// Update an account's details.
///
/// Changing the kind of an account with children is refused since children
/// must share their parent's kind.
pub fn update_account(
    organization_id: OrganizationId,
    account_id: AccountId,
    details: AccountDetails,
    connection: &Connection,
) -> Result<Account, Error> {
    let existing = get_account(organization_id, account_id, connection)?;
    validate_details(organization_id, Some(account_id), &details, connection)?;

    if existing.kind != details.kind && count_children(account_id, connection)? > 0 {
        return Err(Error::InvalidParentAccount);
    }

    connection
        .execute(
            "UPDATE account
            SET code = ?1, name = ?2, kind = ?3, parent_id = ?4, role = ?5, is_current = ?6
            WHERE id = ?7 AND organization_id = ?8",
            (
                &details.code,
                details.name.trim(),
                details.kind,
                details.parent_id,
                details.role,
                details.is_current,
                account_id,
                organization_id,
            ),
        )
        .map_err(|error| map_write_error(error, &details))?;

    Ok(Account {
        code: details.code,
        name: details.name.trim().to_owned(),
        kind: details.kind,
        parent_id: details.parent_id,
        role: details.role,
        is_current: details.is_current,
        ..existing
    })
}

pub fn set_account_archived(
    organization_id: OrganizationId,
    account_id: AccountId,
    archived: bool,
    connection: &Connection,
) -> Result<(), Error> {
    let rows_affected = connection.execute(
        "UPDATE account SET archived = ?1 WHERE id = ?2 AND organization_id = ?3",
        (archived, account_id, organization_id),
    )?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    Ok(())
}

fn count_children(account_id: AccountId, connection: &Connection) -> Result<i64, Error> {
    connection
        .query_row(
            "SELECT COUNT(*) FROM account WHERE parent_id = ?1",
            (account_id,),
            |row| row.get(0),
        )
        .map_err(Error::from)
}

/// Delete an account that has never been used.
///
/// # Errors
///
/// Returns [Error::AccountInUse] if the account has journal lines, child
/// accounts or a role, or if an invoice, bill or payment refers to it.
pub fn delete_account(
    organization_id: OrganizationId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<(), Error> {
    let account = get_account(organization_id, account_id, connection)?;

    let line_count: i64 = connection.query_row(
        "SELECT (SELECT COUNT(*) FROM journal_line WHERE account_id = ?1)
            + (SELECT COUNT(*) FROM invoice_line WHERE account_id = ?1)
            + (SELECT COUNT(*) FROM invoice_payment WHERE account_id = ?1)
            + (SELECT COUNT(*) FROM bill_line WHERE account_id = ?1)
            + (SELECT COUNT(*) FROM bill_payment WHERE account_id = ?1)",
        (account_id,),
        |row| row.get(0),
    )?;

    if line_count > 0 || account.role.is_some() || count_children(account_id, connection)? > 0 {
        return Err(Error::AccountInUse);
    }

    connection.execute(
        "DELETE FROM account WHERE id = ?1 AND organization_id = ?2",
        (account_id, organization_id),
    )?;

    Ok(())
}

pub fn get_account(
    organization_id: OrganizationId,
    account_id: AccountId,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .query_row(
            &format!("SELECT {ACCOUNT_COLUMNS} FROM account WHERE id = ?1 AND organization_id = ?2"),
            (account_id, organization_id),
            map_row_to_account,
        )
        .map_err(Error::from)
}

/// Get an account that a document can post to.
///
/// `purpose` names the field for the error message, e.g. "revenue account".
///
/// # Errors
///
/// Returns [Error::InvalidAccount] if the account does not exist in the
/// organization, is archived, or is not one of `kinds`.
pub fn get_postable_account(
    organization_id: OrganizationId,
    account_id: AccountId,
    kinds: &[AccountKind],
    purpose: &str,
    connection: &Connection,
) -> Result<Account, Error> {
    let account = match get_account(organization_id, account_id, connection) {
        Ok(account) => account,
        Err(Error::NotFound) => {
            return Err(Error::InvalidAccount(format!(
                "account {account_id} does not exist"
            )));
        }
        Err(error) => return Err(error),
    };

    if account.archived {
        return Err(Error::InvalidAccount(format!(
            "{} {} is archived",
            account.code, account.name
        )));
    }

    if !kinds.contains(&account.kind) {
        return Err(Error::InvalidAccount(format!(
            "{} {} cannot be used as the {purpose}",
            account.code, account.name
        )));
    }

    Ok(account)
}

/// Accounts of the given kinds that are not archived, in chart order.
pub fn postable_accounts(
    organization_id: OrganizationId,
    kinds: &[AccountKind],
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    let accounts = list_accounts(organization_id, connection)?
        .into_iter()
        .filter(|account| !account.archived && kinds.contains(&account.kind))
        .collect();

    Ok(accounts)
}

/// Get the account that holds `role`.
///
/// # Errors
///
/// Returns [Error::MissingAccountRole] if no account has the role.
pub fn get_account_by_role(
    organization_id: OrganizationId,
    role: AccountRole,
    connection: &Connection,
) -> Result<Account, Error> {
    connection
        .query_row(
            &format!(
                "SELECT {ACCOUNT_COLUMNS} FROM account WHERE organization_id = ?1 AND role = ?2"
            ),
            (organization_id, role),
            map_row_to_account,
        )
        .map_err(|error| match error {
            rusqlite::Error::QueryReturnedNoRows => Error::MissingAccountRole(role),
            error => error.into(),
        })
}

/// All accounts in the organization, ordered by code.
pub fn list_accounts(
    organization_id: OrganizationId,
    connection: &Connection,
) -> Result<Vec<Account>, Error> {
    connection
        .prepare(&format!(
            "SELECT {ACCOUNT_COLUMNS} FROM account WHERE organization_id = ?1 ORDER BY code"
        ))?
        .query_map((organization_id,), map_row_to_account)?
        .map(|maybe_account| maybe_account.map_err(Error::from))
        .collect()
}

/// The signed balance (debits minus credits) of every account with postings
/// dated on or before `as_of`.
///
/// Accounts without postings are absent from the map.
pub fn account_balances(
    organization_id: OrganizationId,
    as_of: Date,
    connection: &Connection,
) -> Result<HashMap<AccountId, Money>, Error> {
    connection
        .prepare(
            "SELECT l.account_id, SUM(l.debit) - SUM(l.credit)
            FROM journal_line l
            INNER JOIN journal_entry e ON e.id = l.entry_id
            WHERE e.organization_id = ?1 AND e.date <= ?2
            GROUP BY l.account_id",
        )?
        .query_map((organization_id, as_of), |row| {
            Ok((row.get::<_, AccountId>(0)?, row.get::<_, Money>(1)?))
        })?
        .map(|maybe_balance| maybe_balance.map_err(Error::from))
        .collect()
}

/// The depth of each account in the hierarchy, where top level accounts are zero.
pub fn account_depths(accounts: &[Account]) -> HashMap<AccountId, usize> {
    let parents: HashMap<AccountId, Option<AccountId>> = accounts
        .iter()
        .map(|account| (account.id, account.parent_id))
        .collect();

    accounts
        .iter()
        .map(|account| {
            let mut depth = 0;
            let mut parent = account.parent_id;
            // The bound stops a corrupted hierarchy from looping forever.
            while let Some(parent_id) = parent {
                if depth > accounts.len() {
                    break;
                }
                depth += 1;
                parent = parents.get(&parent_id).copied().flatten();
            }

            (account.id, depth)
        })
        .collect()
}

/// Order accounts so that children follow their parent, siblings by code.
pub fn sort_as_tree(accounts: Vec<Account>) -> Vec<Account> {
    let mut children: HashMap<Option<AccountId>, Vec<Account>> = HashMap::new();
    let ids: Vec<AccountId> = accounts.iter().map(|account| account.id).collect();

    for account in accounts {
        // Orphans (parent outside the list) are shown at the top level.
        let key = account.parent_id.filter(|parent_id| ids.contains(parent_id));
        children.entry(key).or_default().push(account);
    }

    for siblings in children.values_mut() {
        siblings.sort_by(|a, b| a.code.cmp(&b.code));
    }

    let mut ordered = Vec::with_capacity(ids.len());
    let mut stack: Vec<Account> = children.remove(&None).unwrap_or_default();
    stack.reverse();

    while let Some(account) = stack.pop() {
        if let Some(mut kids) = children.remove(&Some(account.id)) {
            kids.reverse();
            stack.extend(kids);
        }
        ordered.push(account);
    }

    ordered
}

#[cfg(test)]
mod account_code_tests {
    use crate::{Error, account::AccountCode};

    #[test]
    fn accepts_digits_dots_and_dashes() {
        assert!(AccountCode::new("1010").is_ok());
        assert!(AccountCode::new("6-100.2").is_ok());
        assert_eq!(AccountCode::new(" 42 ").unwrap().as_str(), "42");
    }

    #[test]
    fn rejects_letters_and_long_codes() {
        for code in ["", "A100", "1 0", "12345678901234567"] {
            assert!(
                matches!(AccountCode::new(code), Err(Error::InvalidAccountCode(_))),
                "want error for {code:?}"
            );
        }
    }
}

#[cfg(test)]
mod account_kind_tests {
    use crate::{
        account::{AccountKind, AccountRole},
        money::Money,
    };

    #[test]
    fn normal_balance_flips_credit_accounts() {
        let balance = Money::from_cents(-500);

        assert_eq!(AccountKind::Asset.normal_balance(balance), balance);
        assert_eq!(AccountKind::Revenue.normal_balance(balance), -balance);
    }

    #[test]
    fn round_trips_through_text() {
        for role in AccountRole::ALL {
            assert_eq!(role.as_str().parse::<AccountRole>(), Ok(role));
        }
        for kind in AccountKind::ALL {
            assert_eq!(kind.as_str().parse::<AccountKind>(), Ok(kind));
        }
    }
}
