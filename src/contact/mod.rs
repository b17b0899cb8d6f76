//! Customers and vendors.

mod contacts_page;
mod core;

pub use contacts_page::{create_contact_endpoint, delete_contact_endpoint, get_contacts_page};
pub use core::{
    Contact, ContactId, ContactKind, create_contact, create_contact_table, delete_contact,
    get_contact, get_contact_of_kind, list_contacts,
};
