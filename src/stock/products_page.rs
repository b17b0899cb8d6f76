use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    app_state::DbState,
    endpoints::{self, format_endpoint},
    html::{
        BADGE_NEUTRAL_COLOUR, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE,
        TABLE_HEADER_STYLE, TABLE_NUMBER_CELL_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, badge, base,
        format_currency, page_header,
    },
    money::Money,
    navigation::NavBar,
    organization::Tenant,
    stock::{Product, list_products},
};

struct ProductRow {
    product: Product,
    stock_value: Money,
}

fn products_view(rows: &[ProductRow]) -> Markup {
    let nav_bar = NavBar::new(endpoints::PRODUCTS_VIEW).into_html();
    let total_value: Money = rows.iter().map(|row| row.stock_value).sum();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-6xl space-y-4"
            {
                (page_header("Products", Some((endpoints::NEW_PRODUCT_VIEW, "New product"))))

                p class="text-sm" data-stock-value
                {
                    "Stock at cost: " (format_currency(total_value))
                }

                div class="overflow-x-auto rounded shadow"
                {
                    table class=(TABLE_STYLE)
                    {
                        thead class=(TABLE_HEADER_STYLE)
                        {
                            tr
                            {
                                th scope="col" class=(TABLE_CELL_STYLE) { "Name" }
                                th scope="col" class=(TABLE_CELL_STYLE) { "SKU" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Price" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Cost" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "On hand" }
                                th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Value" }
                            }
                        }

                        tbody
                        {
                            @for row in rows {
                                @let product = &row.product;
                                tr class=(TABLE_ROW_STYLE) data-product-row
                                {
                                    td class=(TABLE_CELL_STYLE)
                                    {
                                        a href=(format_endpoint(endpoints::PRODUCT_VIEW, product.id)) class=(LINK_STYLE)
                                        {
                                            (product.name)
                                        }

                                        @if product.archived {
                                            " " (badge("Archived", BADGE_NEUTRAL_COLOUR))
                                        }
                                    }
                                    td class=(TABLE_CELL_STYLE) { (product.sku) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(product.unit_price)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(product.unit_cost)) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (product.quantity_on_hand) }
                                    td class=(TABLE_NUMBER_CELL_STYLE) { (format_currency(row.stock_value)) }
                                }
                            }

                            @if rows.is_empty() {
                                tr class=(TABLE_ROW_STYLE)
                                {
                                    td colspan="6" class="px-6 py-4 text-center"
                                    {
                                        "No products yet. "
                                        a href=(endpoints::NEW_PRODUCT_VIEW) class=(LINK_STYLE) { "Add one" }
                                        "."
                                    }
                                }
                            }
                        }
                    }
                }
            }
        }
    };

    base("Products", &[], &content)
}

/// Display the organization's products with their stock levels.
pub async fn get_products_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let rows = list_products(tenant.organization_id, &connection)?
        .into_iter()
        .map(|product| {
            Ok(ProductRow {
                stock_value: product.stock_value()?,
                product,
            })
        })
        .collect::<Result<Vec<_>, Error>>()?;

    Ok(products_view(&rows).into_response())
}
