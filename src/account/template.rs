//! Starter charts of accounts for new organizations.

use std::{collections::HashMap, fmt::Display, str::FromStr};

use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::{
    Error,
    account::{AccountCode, AccountDetails, AccountKind, AccountRole, create_account},
    organization::OrganizationId,
};

/// The chart of accounts a new organization starts with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartTemplate {
    /// A service business: cash, bank, receivables, payables and sales tax.
    #[default]
    Standard,
    /// A shop: the standard chart plus inventory, card clearing and cost of goods sold.
    Retail,
}

impl ChartTemplate {
    pub const ALL: [ChartTemplate; 2] = [ChartTemplate::Standard, ChartTemplate::Retail];

    pub fn as_str(&self) -> &'static str {
        match self {
            ChartTemplate::Standard => "standard",
            ChartTemplate::Retail => "retail",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            ChartTemplate::Standard => "Standard (services)",
            ChartTemplate::Retail => "Retail (inventory and point of sale)",
        }
    }

    fn accounts(&self) -> Vec<TemplateAccount> {
        let mut accounts = STANDARD_ACCOUNTS.to_vec();

        if *self == ChartTemplate::Retail {
            accounts.extend_from_slice(RETAIL_ACCOUNTS);
            accounts.sort_by_key(|account| account.code);
        }

        accounts
    }
}

impl Display for ChartTemplate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for ChartTemplate {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|template| template.as_str() == s)
            .ok_or_else(|| Error::UnknownOption(s.to_owned()))
    }
}

#[derive(Debug, Clone, Copy)]
struct TemplateAccount {
    code: &'static str,
    name: &'static str,
    kind: AccountKind,
    role: Option<AccountRole>,
    is_current: bool,
    parent_code: Option<&'static str>,
}

const fn account(
    code: &'static str,
    name: &'static str,
    kind: AccountKind,
    role: Option<AccountRole>,
    is_current: bool,
    parent_code: Option<&'static str>,
) -> TemplateAccount {
    TemplateAccount {
        code,
        name,
        kind,
        role,
        is_current,
        parent_code,
    }
}

use AccountKind::{Asset, Equity, Expense, Liability, Revenue};

const STANDARD_ACCOUNTS: &[TemplateAccount] = &[
    account("1000", "Current Assets", Asset, None, true, None),
    account("1010", "Cash on Hand", Asset, Some(AccountRole::Cash), true, Some("1000")),
    account("1020", "Bank Account", Asset, Some(AccountRole::Bank), true, Some("1000")),
    account(
        "1100",
        "Accounts Receivable",
        Asset,
        Some(AccountRole::AccountsReceivable),
        true,
        Some("1000"),
    ),
    account("1500", "Equipment", Asset, None, false, None),
    account("2000", "Current Liabilities", Liability, None, true, None),
    account(
        "2010",
        "Accounts Payable",
        Liability,
        Some(AccountRole::AccountsPayable),
        true,
        Some("2000"),
    ),
    account(
        "2100",
        "Sales Tax Payable",
        Liability,
        Some(AccountRole::SalesTaxPayable),
        true,
        Some("2000"),
    ),
    account("2500", "Loans", Liability, None, false, None),
    account("3000", "Owner's Equity", Equity, Some(AccountRole::OwnerEquity), false, None),
    account(
        "3100",
        "Retained Earnings",
        Equity,
        Some(AccountRole::RetainedEarnings),
        false,
        None,
    ),
    account("4000", "Sales", Revenue, Some(AccountRole::SalesRevenue), false, None),
    account("4100", "Service Income", Revenue, None, false, None),
    account("4900", "Other Income", Revenue, None, false, None),
    account("6000", "Operating Expenses", Expense, None, false, None),
    account("6100", "Rent", Expense, None, false, Some("6000")),
    account("6200", "Utilities", Expense, None, false, Some("6000")),
    account("6300", "Wages", Expense, None, false, Some("6000")),
    account("6400", "Office Supplies", Expense, None, false, Some("6000")),
    account("6900", "Bank Fees", Expense, None, false, Some("6000")),
];

const RETAIL_ACCOUNTS: &[TemplateAccount] = &[
    account(
        "1030",
        "Card Clearing",
        Asset,
        Some(AccountRole::CardClearing),
        true,
        Some("1000"),
    ),
    account("1200", "Inventory", Asset, Some(AccountRole::Inventory), true, Some("1000")),
    account(
        "5000",
        "Cost of Goods Sold",
        Expense,
        Some(AccountRole::CostOfGoodsSold),
        false,
        None,
    ),
    account(
        "5100",
        "Inventory Adjustments",
        Expense,
        Some(AccountRole::InventoryAdjustment),
        false,
        None,
    ),
];

/// Create the accounts in `template` for a new organization.
///
/// Accounts are inserted in code order, so parents always exist before their children.
pub fn seed_chart_of_accounts(
    organization_id: OrganizationId,
    template: ChartTemplate,
    connection: &Connection,
) -> Result<(), Error> {
    let mut ids_by_code = HashMap::new();

    for entry in template.accounts() {
        let parent_id = entry
            .parent_code
            .and_then(|code| ids_by_code.get(code).copied());

        let account = create_account(
            organization_id,
            AccountDetails {
                code: AccountCode::new(entry.code)?,
                name: entry.name.to_owned(),
                kind: entry.kind,
                parent_id,
                role: entry.role,
                is_current: entry.is_current,
            },
            connection,
        )?;

        ids_by_code.insert(entry.code, account.id);
    }

    Ok(())
}

#[cfg(test)]
mod template_tests {
    use std::collections::HashSet;

    use crate::account::{AccountRole, ChartTemplate, template::STANDARD_ACCOUNTS};

    #[test]
    fn retail_assigns_every_role() {
        let roles: HashSet<AccountRole> = ChartTemplate::Retail
            .accounts()
            .iter()
            .filter_map(|account| account.role)
            .collect();

        for role in AccountRole::ALL {
            assert!(roles.contains(&role), "retail chart is missing {role}");
        }
    }

    #[test]
    fn roles_match_account_kinds() {
        for template in ChartTemplate::ALL {
            for account in template.accounts() {
                if let Some(role) = account.role {
                    assert_eq!(role.required_kind(), account.kind, "{}", account.code);
                }
            }
        }
    }

    #[test]
    fn parents_come_before_children() {
        for template in ChartTemplate::ALL {
            let accounts = template.accounts();

            for (index, account) in accounts.iter().enumerate() {
                if let Some(parent_code) = account.parent_code {
                    let parent_index = accounts
                        .iter()
                        .position(|candidate| candidate.code == parent_code)
                        .unwrap();
                    assert!(parent_index < index, "{} before parent", account.code);
                }
            }
        }
    }

    #[test]
    fn standard_is_a_subset_of_retail() {
        let retail = ChartTemplate::Retail.accounts();

        for account in STANDARD_ACCOUNTS {
            assert!(retail.iter().any(|candidate| candidate.code == account.code));
        }
    }
}
