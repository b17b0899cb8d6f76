//! A product's details, movement history and stock adjustment form.

use axum::{
    Extension, Form,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};
use serde::Deserialize;
use time::Date;

use crate::{
    Error,
    app_state::DbState,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, FORM_CONTAINER_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_NUMBER_CELL_STYLE, TABLE_ROW_STYLE, TABLE_STYLE, base, date_input, format_currency,
        format_date, page_header, text_input,
    },
    money::Money,
    navigation::NavBar,
    organization::Tenant,
    stock::{Product, ProductId, StockMovement, adjust_stock, get_product, list_movements},
    timezone::local_today,
};

fn adjustment_form(product: &Product, today: Date) -> Markup {
    html! {
        section class=(FORM_CONTAINER_STYLE)
        {
            h2 class="text-lg font-semibold self-start" { "Adjust stock" }

            form
                hx-post=(format_endpoint(endpoints::STOCK_ADJUSTMENTS_API, product.id))
                hx-target-error="#alert-container"
                class="w-full space-y-4"
            {
                div
                {
                    label for="quantity_delta" class=(FORM_LABEL_STYLE)
                    {
                        "Change in quantity (negative to write off)"
                    }

                    input
                        type="number"
                        name="quantity_delta"
                        id="quantity_delta"
                        step="1"
                        required
                        class=(FORM_TEXT_INPUT_STYLE);
                }

                (date_input("Date", "date", today))
                (text_input("Note", "note", "", false))

                button type="submit" class=(BUTTON_PRIMARY_STYLE) { "Adjust stock" }
            }
        }
    }
}

fn product_view(
    product: &Product,
    stock_value: Money,
    movements: &[StockMovement],
    today: Date,
) -> Markup {
    let nav_bar = NavBar::new(endpoints::PRODUCT_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-4xl space-y-6"
            {
                (page_header(&product.name, Some((endpoints::PRODUCTS_VIEW, "Back to products"))))

                dl class="grid grid-cols-2 gap-x-6 gap-y-2 text-sm md:grid-cols-4"
                {
                    dt class="font-semibold" { "SKU" }
                    dd { (product.sku) }
                    dt class="font-semibold" { "Barcode" }
                    dd { (product.barcode.as_deref().unwrap_or("None")) }
                    dt class="font-semibold" { "Price" }
                    dd { (format_currency(product.unit_price)) }
                    dt class="font-semibold" { "Cost" }
                    dd { (format_currency(product.unit_cost)) }
                    dt class="font-semibold" { "On hand" }
                    dd data-on-hand { (product.quantity_on_hand) }
                    dt class="font-semibold" { "Value at cost" }
                    dd data-stock-value { (format_currency(stock_value)) }
                }

                a href=(format_endpoint(endpoints::EDIT_PRODUCT_VIEW, product.id)) class=(LINK_STYLE)
                {
                    "Edit product"
                }

                section class="space-y-2"
                {
                    h2 class="text-lg font-semibold" { "Movements" }

                    div class="overflow-x-auto rounded shadow"
                    {
                        table class=(TABLE_STYLE)
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Date" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Kind" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Note" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Entry" }
                                    th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Change" }
                                }
                            }

                            tbody
                            {
                                @for movement in movements {
                                    tr class=(TABLE_ROW_STYLE) data-movement-row
                                    {
                                        td class=(TABLE_CELL_STYLE) { (format_date(movement.date)) }
                                        td class=(TABLE_CELL_STYLE) { (movement.kind) }
                                        td class=(TABLE_CELL_STYLE) { (movement.note) }
                                        td class=(TABLE_CELL_STYLE)
                                        {
                                            @if let Some(entry_id) = movement.journal_entry_id {
                                                a
                                                    href=(format_endpoint(endpoints::JOURNAL_ENTRY_VIEW, entry_id))
                                                    class=(LINK_STYLE)
                                                {
                                                    "View entry"
                                                }
                                            }
                                        }
                                        td class=(TABLE_NUMBER_CELL_STYLE) { (format!("{:+}", movement.quantity_delta)) }
                                    }
                                }

                                @if movements.is_empty() {
                                    tr class=(TABLE_ROW_STYLE)
                                    {
                                        td colspan="5" class="px-6 py-4 text-center" { "No stock movements yet." }
                                    }
                                }
                            }
                        }
                    }
                }

                (adjustment_form(product, today))
            }
        }
    };

    base(&product.name, &[], &content)
}

/// Display a product with its stock history.
pub async fn get_product_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(product_id): Path<ProductId>,
) -> Result<Response, Error> {
    let today = local_today(&state.local_timezone)?;
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let product = get_product(tenant.organization_id, product_id, &connection)?;
    let movements = list_movements(tenant.organization_id, product_id, &connection)?;
    let stock_value = product.stock_value()?;

    Ok(product_view(&product, stock_value, &movements, today).into_response())
}

#[derive(Debug, Deserialize)]
pub struct StockAdjustmentForm {
    pub quantity_delta: i64,
    pub date: Date,
    #[serde(default)]
    pub note: String,
}

/// Adjust a product's stock and redirect back to the product.
pub async fn adjust_stock_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(product_id): Path<ProductId>,
    Form(form): Form<StockAdjustmentForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match adjust_stock(
        tenant,
        product_id,
        form.quantity_delta,
        form.date,
        &form.note,
        &connection,
    ) {
        Ok(movement) => (
            HxRedirect(format_endpoint(endpoints::PRODUCT_VIEW, movement.product_id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::debug!("could not adjust stock of product {product_id}: {error}");
            error.into_alert_response()
        }
    }
}


#[cfg(test)]
mod adjust_stock_endpoint_tests {
    use axum::{
        Extension, Form,
        extract::{Path, State},
        http::StatusCode,
    };
    use time::macros::date;

    use crate::{
        stock::{
            adjust_stock_endpoint, get_product, product_page::StockAdjustmentForm,
            test_products::stocked_product,
        },
        test_utils::TestBooks,
    };

    #[tokio::test]
    async fn write_off_reduces_stock() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 5);
        let (state, tenant) = books.db_state();

        let response = adjust_stock_endpoint(
            State(state.clone()),
            Extension(tenant),
            Path(product.id),
            Form(StockAdjustmentForm {
                quantity_delta: -2,
                date: date!(2025 - 02 - 01),
                note: "Broken".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let got = get_product(tenant.organization_id, product.id, &connection).unwrap();
        assert_eq!(got.quantity_on_hand, 3);
    }

    #[tokio::test]
    async fn write_off_beyond_stock_is_unprocessable() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 1);
        let (state, tenant) = books.db_state();

        let response = adjust_stock_endpoint(
            State(state),
            Extension(tenant),
            Path(product.id),
            Form(StockAdjustmentForm {
                quantity_delta: -2,
                date: date!(2025 - 02 - 01),
                note: String::new(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }
}
