//! Bills from vendors: entering, approving, paying and voiding.

mod bill_form;
mod bill_page;
mod bills_page;
mod core;

pub use bill_form::{create_bill_endpoint, get_new_bill_page};
pub use bill_page::{
    approve_bill_endpoint, get_bill_page, record_bill_payment_endpoint, void_bill_endpoint,
};
pub use bills_page::get_bills_page;
pub use core::{
    BILL_NUMBER_PREFIX, Bill, BillId, BillLine, BillPayment, BillPaymentId, BillStatus, NewBill,
    approve_bill, create_bill, create_bill_tables, get_bill, list_bill_payments, list_bills,
    record_bill_payment, void_bill,
};

#[cfg(test)]
pub(crate) use core::test_bills;
