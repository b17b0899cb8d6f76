//! The double-entry journal and its pages.

mod core;
mod entry_form;
mod entry_page;
mod export;
mod journal_page;

pub use core::{
    AccountActivity, ENTRY_NUMBER_PREFIX, EntrySource, EntryStatus, JournalEntry,
    JournalEntryId, JournalExportRow, JournalLine, NewJournalEntry, account_activity,
    count_entries, create_journal_tables, get_entry, journal_export_rows, list_entries,
    post_entry, reverse_entry, validate_lines,
};
pub(crate) use core::{insert_entry, insert_reversal, iso_date};
pub use entry_form::{get_new_entry_page, post_journal_entry};
pub use entry_page::{get_entry_page, reverse_entry_endpoint};
pub use export::get_journal_csv;
pub use journal_page::get_journal_page;
