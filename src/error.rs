//! Defines the app level error type and conversions to rendered HTML pages and alerts.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use time::Date;

use crate::{
    account::AccountRole, alert::Alert, internal_server_error::InternalServerError, money::Money,
    not_found::NotFoundError,
};

/// The errors that may occur in the application.
#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    /// The user provided an invalid combination of email and password.
    #[error("incorrect email or password")]
    InvalidCredentials,

    /// The auth token cookie is missing from the cookie jar in the request.
    #[error("no cookies in the cookie jar :(")]
    CookieMissing,

    /// The auth token could not be parsed or has expired.
    #[error("the auth token is invalid or has expired")]
    InvalidToken,

    /// The user provided a password that is too easy to guess.
    #[error("password is too weak: {0}")]
    TooWeak(String),

    /// The password and the confirmation password differ.
    #[error("passwords do not match")]
    PasswordsDoNotMatch,

    /// An unexpected error occurred with the underlying hashing library.
    ///
    /// The error string should only be logged for debugging on the server.
    #[error("hashing failed: {0}")]
    HashingError(String),

    /// The email address is not in a usable format.
    #[error("\"{0}\" is not a valid email address")]
    InvalidEmail(String),

    /// A user with the email address is already registered.
    #[error("the email address {0} is already registered")]
    DuplicateEmail(String),

    /// A submitted value is not one of the allowed options, e.g. an unknown account kind.
    #[error("\"{0}\" is not one of the available options")]
    UnknownOption(String),

    /// A required text field was blank.
    #[error("{0} cannot be empty")]
    EmptyField(&'static str),

    /// A money amount could not be parsed or is out of range.
    #[error("\"{0}\" is not a valid amount")]
    InvalidAmount(String),

    /// A date in the future was used where only past or present dates make sense.
    #[error("{0} is a date in the future, which is not allowed")]
    FutureDate(Date),

    /// An account code contains characters other than digits, dots and dashes,
    /// or is too long.
    #[error("\"{0}\" is not a valid account code, use up to 16 digits, dots or dashes")]
    InvalidAccountCode(String),

    /// The account code is already used in the organization's chart of accounts.
    #[error("the account code {0} is already in use")]
    DuplicateAccountCode(String),

    /// The parent account is missing, of a different kind, or would create a cycle.
    #[error("the parent account is not valid for this account")]
    InvalidParentAccount,

    /// The account has postings, children or a role and cannot be deleted.
    #[error("the account is in use and cannot be deleted, archive it instead")]
    AccountInUse,

    /// The organization has no account assigned to a role a workflow needs.
    #[error("no account has the role \"{0}\", assign it on the accounts page")]
    MissingAccountRole(AccountRole),

    /// An account cannot be used in the requested way.
    #[error("invalid account: {0}")]
    InvalidAccount(String),

    /// A journal entry needs at least two lines.
    #[error("a journal entry needs at least two lines")]
    TooFewLines,

    /// A journal line must have exactly one of debit or credit set to a positive amount.
    #[error("line {0} must have either a debit or a credit amount greater than zero")]
    InvalidLine(usize),

    /// The debits and credits of a journal entry do not sum to the same amount.
    #[error("debits ({debits}) do not equal credits ({credits})")]
    UnbalancedEntry {
        /// The sum of all debit amounts.
        debits: Money,
        /// The sum of all credit amounts.
        credits: Money,
    },

    /// The date falls on or before the organization's lock date.
    #[error("the period up to {0} is closed, use a later date")]
    PeriodLocked(Date),

    /// The new lock date is earlier than the current lock date.
    #[error("the books are already closed up to {0}, periods cannot be reopened")]
    LockDateBackwards(Date),

    /// The journal entry has already been reversed.
    #[error("the journal entry has already been reversed")]
    AlreadyReversed,

    /// A reversing entry cannot itself be reversed.
    #[error("a reversing entry cannot be reversed")]
    CannotReverseReversal,

    /// A reversal was dated before the entry it reverses.
    #[error("the reversal date must not be before the original entry date {0}")]
    ReversalBeforeOriginal(Date),

    /// The contact is referenced by an invoice or bill.
    #[error("the contact has invoices or bills and cannot be deleted")]
    ContactInUse,

    /// The contact does not exist or is of the wrong kind.
    #[error("invalid contact: {0}")]
    InvalidContact(String),

    /// An invoice, bill or sale is missing information or is inconsistent.
    #[error("{0}")]
    InvalidDocument(String),

    /// The requested action is not allowed in the document's current status.
    #[error("cannot {action} a document that is {status}")]
    InvalidStatus {
        /// What the user tried to do, e.g. "issue".
        action: &'static str,
        /// The current status of the document.
        status: String,
    },

    /// A payment is larger than the amount still owed.
    #[error("the payment exceeds the outstanding amount of {0}")]
    Overpayment(Money),

    /// The document has payments recorded against it.
    #[error("the document has payments recorded against it and cannot be voided")]
    DocumentHasPayments,

    /// The SKU is already used by another product.
    #[error("the SKU {0} is already in use")]
    DuplicateSku(String),

    /// The barcode is already used by another product.
    #[error("the barcode {0} is already in use")]
    DuplicateBarcode(String),

    /// A stock movement would take the quantity on hand below zero.
    #[error("not enough stock of {product}, only {available} on hand")]
    InsufficientStock {
        /// The product name.
        product: String,
        /// The quantity on hand.
        available: i64,
    },

    /// A quantity of zero, or a negative quantity where only positive ones are allowed.
    #[error("quantity must be greater than zero")]
    InvalidQuantity,

    /// The cart has no lines.
    #[error("the cart is empty")]
    EmptyCart,

    /// The tendered payments do not cover the sale total.
    #[error("payments of {tendered} do not cover the total of {total}")]
    InsufficientPayment {
        /// The sale total.
        total: Money,
        /// The sum of the tendered payments.
        tendered: Money,
    },

    /// Change can only be given from cash.
    #[error("card payments cannot exceed the amount owed")]
    CardOverpayment,

    /// The requested resource was not found.
    ///
    /// For HTTP request handlers, the client should check that the parameters
    /// (e.g., ID) are correct and that the resource has been created.
    ///
    /// Internally, this error may occur when a query returns no rows.
    #[error("the requested resource could not be found")]
    NotFound,

    /// An unhandled/unexpected SQL error.
    #[error("an unexpected SQL error occurred: {0}")]
    SqlError(rusqlite::Error),

    /// An error occurred while getting the local timezone from a canonical timezone string.
    #[error("invalid timezone {0}")]
    InvalidTimezoneError(String),

    /// Could not acquire the database lock
    #[error("could not acquire the database lock")]
    DatabaseLockError,

    /// An error occurred while serializing a struct as JSON
    #[error("could not serialize as JSON: {0}")]
    JSONSerializationError(String),

    /// A report was asked for a range that ends before it starts.
    #[error("the start date {from} is after the end date {to}")]
    InvalidDateRange {
        /// The first day of the range.
        from: Date,
        /// The last day of the range.
        to: Date,
    },

    /// An error occurred while writing a CSV export.
    #[error("could not write CSV: {0}")]
    CsvError(String),
}

impl From<rusqlite::Error> for Error {
    fn from(value: rusqlite::Error) -> Self {
        match value {
            rusqlite::Error::QueryReturnedNoRows => Error::NotFound,
            error => {
                tracing::error!("an unhandled SQL error occurred: {}", error);
                Error::SqlError(error)
            }
        }
    }
}

/// Code 2067 occurs when a UNIQUE constraint failed.
pub(crate) const SQLITE_CONSTRAINT_UNIQUE: i32 = 2067;

/// Whether `error` is a UNIQUE constraint violation on `column`, e.g. "account.code".
pub(crate) fn is_unique_violation(error: &rusqlite::Error, column: &str) -> bool {
    matches!(
        error,
        rusqlite::Error::SqliteFailure(sql_error, Some(description))
            if sql_error.extended_code == SQLITE_CONSTRAINT_UNIQUE && description.contains(column)
    )
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        match self {
            Error::NotFound => NotFoundError.into_response(),
            Error::InvalidTimezoneError(timezone) => InternalServerError {
                description: "Invalid Timezone Settings",
                fix: &format!(
                    "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                ),
            }
            .into_response(),
            Error::MissingAccountRole(role) => InternalServerError {
                description: "Chart of Accounts Incomplete",
                fix: &format!(
                    "No account has the role \"{role}\". Edit an account on the accounts page \
                    and assign the role."
                ),
            }
            .into_response(),
            Error::DatabaseLockError => InternalServerError::default().into_response(),
            // Any errors that are not handled above are not intended to be shown to the client.
            error => {
                tracing::error!("An unexpected error occurred: {}", error);
                InternalServerError::default().into_response()
            }
        }
    }
}

impl Error {
    /// Convert the error into an HTTP response with an HTML alert.
    pub fn into_alert_response(self) -> Response {
        let (status_code, alert) = match self {
            Error::NotFound => (
                StatusCode::NOT_FOUND,
                Alert::Error {
                    message: "Not found".to_owned(),
                    details: "The item could not be found. \
                    Try refreshing the page to see if it has been deleted."
                        .to_owned(),
                },
            ),
            Error::InvalidTimezoneError(timezone) => (
                StatusCode::INTERNAL_SERVER_ERROR,
                Alert::Error {
                    message: "Invalid Timezone Settings".to_owned(),
                    details: format!(
                        "Could not get local timezone \"{timezone}\". Check your server settings and \
                    ensure the timezone has been set to valid, canonical timezone string"
                    ),
                },
            ),
            Error::UnbalancedEntry { .. }
            | Error::TooFewLines
            | Error::InvalidLine(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Alert::Error {
                    message: "Journal entry is not balanced".to_owned(),
                    details: self.to_string(),
                },
            ),
            Error::PeriodLocked(_) | Error::LockDateBackwards(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Alert::Error {
                    message: "Period closed".to_owned(),
                    details: self.to_string(),
                },
            ),
            Error::AlreadyReversed
            | Error::InvalidStatus { .. }
            | Error::DocumentHasPayments
            | Error::AccountInUse
            | Error::ContactInUse => (
                StatusCode::CONFLICT,
                Alert::Error {
                    message: "Action not allowed".to_owned(),
                    details: self.to_string(),
                },
            ),
            Error::InsufficientStock { .. }
            | Error::InsufficientPayment { .. }
            | Error::CardOverpayment
            | Error::EmptyCart
            | Error::Overpayment(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Alert::Error {
                    message: "Could not complete payment".to_owned(),
                    details: self.to_string(),
                },
            ),
            Error::MissingAccountRole(_) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                Alert::Error {
                    message: "Chart of accounts incomplete".to_owned(),
                    details: self.to_string(),
                },
            ),
            Error::InvalidAmount(_)
            | Error::FutureDate(_)
            | Error::InvalidDateRange { .. }
            | Error::EmptyField(_)
            | Error::UnknownOption(_)
            | Error::InvalidEmail(_)
            | Error::DuplicateEmail(_)
            | Error::InvalidAccountCode(_)
            | Error::DuplicateAccountCode(_)
            | Error::InvalidParentAccount
            | Error::InvalidAccount(_)
            | Error::CannotReverseReversal
            | Error::ReversalBeforeOriginal(_)
            | Error::InvalidContact(_)
            | Error::InvalidDocument(_)
            | Error::DuplicateSku(_)
            | Error::DuplicateBarcode(_)
            | Error::InvalidQuantity => (
                StatusCode::BAD_REQUEST,
                Alert::Error {
                    message: "Invalid input".to_owned(),
                    details: self.to_string(),
                },
            ),
            error => {
                tracing::error!("An unexpected error occurred: {error}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Alert::Error {
                        message: "Something went wrong".to_owned(),
                        details:
                            "An unexpected error occurred, check the server logs for more details."
                                .to_owned(),
                    },
                )
            }
        };

        (status_code, alert.into_html()).into_response()
    }
}

#[cfg(test)]
mod alert_response_tests {
    use axum::http::StatusCode;

    use crate::{Error, money::Money};

    #[test]
    fn unbalanced_entry_is_unprocessable() {
        let response = Error::UnbalancedEntry {
            debits: Money::from_cents(100),
            credits: Money::from_cents(90),
        }
        .into_alert_response();

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[test]
    fn already_reversed_is_conflict() {
        let response = Error::AlreadyReversed.into_alert_response();

        assert_eq!(response.status(), StatusCode::CONFLICT);
    }

    #[test]
    fn unexpected_errors_are_internal() {
        let response = Error::DatabaseLockError.into_alert_response();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
