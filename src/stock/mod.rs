//! Products, stock levels and inventory adjustments.

mod core;
mod edit_product;
mod form;
mod new_product;
mod product_page;
mod products_page;

pub use core::{
    MovementKind, Product, ProductDetails, ProductId, StockMovement, StockMovementId,
    adjust_stock, create_product, create_stock_tables, find_product_by_barcode, get_product,
    list_movements, list_products, update_product,
};
pub(crate) use core::insert_movement;
pub use edit_product::{get_edit_product_page, update_product_endpoint};
pub use new_product::{create_product_endpoint, get_new_product_page};
pub use product_page::{adjust_stock_endpoint, get_product_page};
pub use products_page::get_products_page;

#[cfg(test)]
pub(crate) use core::test_products;
