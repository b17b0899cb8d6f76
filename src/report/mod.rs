//! Financial reports: trial balance, income statement, balance sheet, aging and ratios.

mod aging_page;
mod balance_sheet_page;
mod core;
mod filters;
mod income_statement_page;
mod reports_page;
mod sections;
mod trial_balance_page;

pub use aging_page::get_aging_page;
pub use balance_sheet_page::get_balance_sheet_page;
pub use core::{
    AgingBucket, AgingKind, AgingReport, AgingRow, BalanceSheet, IncomeStatement, Ratios,
    StatementLine, TrialBalance, TrialBalanceRow, aging, balance_sheet, income_statement, ratios,
    start_of_year, trial_balance,
};
pub use filters::ReportQuery;
pub use income_statement_page::get_income_statement_page;
pub use reports_page::{get_reports_page, ratios_table};
pub use trial_balance_page::{get_trial_balance_csv, get_trial_balance_page};

#[cfg(test)]
pub(crate) use core::test_reports;
