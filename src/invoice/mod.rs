//! Invoices to customers: drafting, issuing, payments and voiding.

mod core;
mod invoice_form;
mod invoice_page;
mod invoices_page;

pub use core::{
    INVOICE_NUMBER_PREFIX, Invoice, InvoiceId, InvoiceLine, InvoicePayment, InvoicePaymentId,
    InvoiceStatus, NewInvoice, NewInvoiceLine, create_invoice, create_invoice_tables, get_invoice,
    issue_invoice, list_invoice_payments, list_invoices, record_invoice_payment, void_invoice,
};
pub use invoice_form::{create_invoice_endpoint, get_new_invoice_page};
pub use invoice_page::{
    get_invoice_page, issue_invoice_endpoint, record_invoice_payment_endpoint,
    void_invoice_endpoint,
};
pub use invoices_page::get_invoices_page;

#[cfg(test)]
pub(crate) use core::test_invoices;
