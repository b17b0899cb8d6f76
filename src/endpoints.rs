//! The URIs of the app's pages and API endpoints.
//!
//! For endpoints that take a parameter, e.g., '/accounts/{account_id}', use [format_endpoint].

/// The root route which redirects to the dashboard.
pub const ROOT: &str = "/";
/// The landing page for logged in users.
pub const DASHBOARD_VIEW: &str = "/dashboard";
/// The route for getting the registration page.
pub const REGISTER_VIEW: &str = "/register";
/// The route for getting the log in page.
pub const LOG_IN_VIEW: &str = "/log_in";
/// The route for instructions for resetting a password.
pub const FORGOT_PASSWORD_VIEW: &str = "/forgot_password";
/// The page to display when an internal server error occurs.
pub const INTERNAL_ERROR_VIEW: &str = "/error";
/// The route for static files.
pub const STATIC: &str = "/static";
/// Ask the server for a cup of coffee.
pub const COFFEE: &str = "/coffee";

/// The chart of accounts.
pub const ACCOUNTS_VIEW: &str = "/accounts";
/// The page for adding an account.
pub const NEW_ACCOUNT_VIEW: &str = "/accounts/new";
/// The page for editing an account.
pub const EDIT_ACCOUNT_VIEW: &str = "/accounts/{account_id}/edit";
/// The postings to an account with a running balance.
pub const ACCOUNT_LEDGER_VIEW: &str = "/accounts/{account_id}";

/// The list of journal entries.
pub const JOURNAL_VIEW: &str = "/journal";
/// The page for writing a manual journal entry.
pub const NEW_JOURNAL_ENTRY_VIEW: &str = "/journal/new";
/// A single journal entry.
pub const JOURNAL_ENTRY_VIEW: &str = "/journal/{entry_id}";

/// Customers and vendors.
pub const CONTACTS_VIEW: &str = "/contacts";

/// The list of invoices.
pub const INVOICES_VIEW: &str = "/invoices";
/// The page for drafting an invoice.
pub const NEW_INVOICE_VIEW: &str = "/invoices/new";
/// A single invoice.
pub const INVOICE_VIEW: &str = "/invoices/{invoice_id}";

/// The list of bills.
pub const BILLS_VIEW: &str = "/bills";
/// The page for entering a bill.
pub const NEW_BILL_VIEW: &str = "/bills/new";
/// A single bill.
pub const BILL_VIEW: &str = "/bills/{bill_id}";

/// The product catalogue with stock levels.
pub const PRODUCTS_VIEW: &str = "/products";
/// The page for adding a product.
pub const NEW_PRODUCT_VIEW: &str = "/products/new";
/// The page for editing a product.
pub const EDIT_PRODUCT_VIEW: &str = "/products/{product_id}/edit";
/// A product with its stock movements.
pub const PRODUCT_VIEW: &str = "/products/{product_id}";

/// The point of sale register.
pub const POS_VIEW: &str = "/pos";
/// The list of point of sale sales.
pub const SALES_VIEW: &str = "/sales";
/// A single sale.
pub const SALE_VIEW: &str = "/sales/{sale_id}";

/// The reports overview with financial ratios.
pub const REPORTS_VIEW: &str = "/reports";
/// The trial balance report.
pub const TRIAL_BALANCE_VIEW: &str = "/reports/trial_balance";
/// The income statement report.
pub const INCOME_STATEMENT_VIEW: &str = "/reports/income_statement";
/// The balance sheet report.
pub const BALANCE_SHEET_VIEW: &str = "/reports/balance_sheet";
/// The receivables and payables aging report.
pub const AGING_VIEW: &str = "/reports/aging";
/// The trial balance as a CSV download.
pub const TRIAL_BALANCE_CSV: &str = "/reports/trial_balance.csv";
/// The journal as a CSV download.
pub const JOURNAL_CSV: &str = "/journal.csv";

/// Organization settings and period close.
pub const SETTINGS_VIEW: &str = "/settings";

/// The route for logging in a user.
pub const LOG_IN_API: &str = "/api/log_in";
/// The route for the client to log out the current user.
pub const LOG_OUT: &str = "/api/log_out";
/// The route for registering an organization and its owner.
pub const ORGANIZATIONS_API: &str = "/api/organizations";
/// The route for renaming the organization.
pub const ORGANIZATION_API: &str = "/api/settings/organization";
/// The route for closing a period.
pub const CLOSE_PERIOD_API: &str = "/api/settings/close_period";

/// The route to create an account.
pub const ACCOUNTS_API: &str = "/api/accounts";
/// The route to update or delete an account.
pub const ACCOUNT_API: &str = "/api/accounts/{account_id}";
/// The route to archive or restore an account.
pub const ARCHIVE_ACCOUNT_API: &str = "/api/accounts/{account_id}/archive";

/// The route to post a manual journal entry.
pub const JOURNAL_API: &str = "/api/journal";
/// The route to reverse a journal entry.
pub const REVERSE_ENTRY_API: &str = "/api/journal/{entry_id}/reverse";

/// The route to create a contact.
pub const CONTACTS_API: &str = "/api/contacts";
/// The route to delete a contact.
pub const CONTACT_API: &str = "/api/contacts/{contact_id}";

/// The route to create a draft invoice.
pub const INVOICES_API: &str = "/api/invoices";
/// The route to issue an invoice.
pub const ISSUE_INVOICE_API: &str = "/api/invoices/{invoice_id}/issue";
/// The route to record a payment against an invoice.
pub const INVOICE_PAYMENTS_API: &str = "/api/invoices/{invoice_id}/payments";
/// The route to void an invoice.
pub const VOID_INVOICE_API: &str = "/api/invoices/{invoice_id}/void";

/// The route to create a draft bill.
pub const BILLS_API: &str = "/api/bills";
/// The route to approve a bill.
pub const APPROVE_BILL_API: &str = "/api/bills/{bill_id}/approve";
/// The route to record a payment against a bill.
pub const BILL_PAYMENTS_API: &str = "/api/bills/{bill_id}/payments";
/// The route to void a bill.
pub const VOID_BILL_API: &str = "/api/bills/{bill_id}/void";

/// The route to create a product.
pub const PRODUCTS_API: &str = "/api/products";
/// The route to update a product.
pub const PRODUCT_API: &str = "/api/products/{product_id}";
/// The route to adjust a product's stock level.
pub const STOCK_ADJUSTMENTS_API: &str = "/api/products/{product_id}/adjustments";
/// The route to look up a product by barcode or SKU.
pub const PRODUCT_LOOKUP_API: &str = "/api/products/lookup";

/// The route to price a cart without saving it.
pub const POS_QUOTE_API: &str = "/api/pos/quote";
/// The route to complete a sale.
pub const CHECKOUT_API: &str = "/api/pos/checkout";
/// The route to void a sale.
pub const VOID_SALE_API: &str = "/api/sales/{sale_id}/void";

/// Replace the parameter in `endpoint_path` with `id`.
///
/// A parameter is a string that starts with a left brace, followed by
/// lowercase letters or underscores, and ends with a right brace.
/// For example, in the endpoint path '/accounts/{account_id}', '{account_id}' is the parameter.
///
/// This function assumes that an endpoint path only contains ASCII characters
/// and a single parameter.
///
/// If no parameter is found in `endpoint_path`, the function returns the
/// the original `endpoint_path`.
pub fn format_endpoint(endpoint_path: &str, id: i64) -> String {
    let Some(param_start) = endpoint_path.find('{') else {
        return endpoint_path.to_owned();
    };

    let param_end = endpoint_path[param_start..]
        .find('}')
        .map(|offset| param_start + offset + 1)
        .unwrap_or(endpoint_path.len());

    format!(
        "{}{}{}",
        &endpoint_path[..param_start],
        id,
        &endpoint_path[param_end..]
    )
}
