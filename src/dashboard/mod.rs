//! The dashboard: an at-a-glance view of cash, receivables, payables and profit.

mod aggregation;
mod cards;
mod charts;
mod handlers;

pub use handlers::get_dashboard_page;
