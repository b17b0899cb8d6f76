//! The point of sale: a register that prices a cart, takes cash and card, and records sales.

mod core;
mod register;
mod sale_page;
mod sales_page;

pub use core::{
    Cart, CartLine, CartTotals, DailySales, SALE_NUMBER_PREFIX, Sale, SaleId, SaleLine,
    SaleStatus, Settlement, Tender, TenderMethod, checkout, create_sale_tables,
    daily_sales_totals, get_sale, list_sales, settle_tenders, void_sale,
};
pub use register::{checkout_endpoint, get_pos_page, lookup_product_endpoint, quote_endpoint};
pub use sale_page::{get_sale_page, void_sale_endpoint};
pub use sales_page::get_sales_page;

#[cfg(test)]
pub(crate) use core::test_sales;
