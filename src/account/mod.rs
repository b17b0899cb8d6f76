//! The chart of accounts and its pages.

mod accounts_page;
mod core;
mod create_endpoint;
mod create_page;
mod delete_endpoint;
mod edit_endpoint;
mod edit_page;
mod form;
mod ledger_page;
mod template;

pub use accounts_page::get_accounts_page;
pub use core::{
    Account, AccountCode, AccountDetails, AccountId, AccountKind, AccountRole,
    MAX_ACCOUNT_CODE_LENGTH, account_balances, account_depths, create_account,
    create_account_table, delete_account, get_account, get_account_by_role, get_postable_account,
    list_accounts, map_row_to_account, postable_accounts, set_account_archived, sort_as_tree,
    update_account,
};
pub use create_endpoint::create_account_endpoint;
pub use create_page::get_new_account_page;
pub use delete_endpoint::delete_account_endpoint;
pub use edit_endpoint::{archive_account_endpoint, edit_account_endpoint};
pub use edit_page::get_edit_account_page;
pub use ledger_page::get_account_ledger_page;
pub use template::{ChartTemplate, seed_chart_of_accounts};
