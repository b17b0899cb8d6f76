//! The register: a cart built by scanning or picking products, priced live and checked out.

use axum::{
    Extension, Json,
    extract::{Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_extra::extract::Form;
use axum_htmx::HxRedirect;
use maud::{Markup, PreEscaped, html};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use serde_json::json;

use crate::{
    Error,
    app_state::DbState,
    document::parse_tax_rate,
    endpoints::{self, format_endpoint},
    html::{
        BUTTON_PRIMARY_STYLE, BUTTON_SECONDARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE,
        HeadElement, LINK_STYLE, PAGE_CONTAINER_STYLE, TABLE_CELL_STYLE, TABLE_HEADER_STYLE,
        TABLE_NUMBER_CELL_STYLE, TABLE_STYLE, base, format_currency, page_header,
    },
    money::{Money, parse_optional_amount},
    navigation::NavBar,
    organization::{OrganizationId, Tenant},
    pos::{Cart, CartLine, CartTotals, Tender, TenderMethod, checkout, settle_tenders},
    stock::{Product, ProductId, find_product_by_barcode, get_product, list_products},
    timezone::local_today,
};

/// Buffers keystrokes that arrive faster than a person can type and treats
/// them as a barcode scan when Enter arrives.
const REGISTER_SCRIPT: &str = r#"
document.addEventListener("DOMContentLoaded", () => {
    const MAX_KEY_GAP_MS = 50;
    const MIN_SCAN_LENGTH = 4;

    const form = document.getElementById("cart-form");
    const lines = document.getElementById("cart-lines");
    const template = document.getElementById("cart-line-template");
    const status = document.getElementById("scan-status");
    const codeInput = document.getElementById("scan-code");
    const productSelect = document.getElementById("product-select");
    const lookupUrl = form.dataset.lookupUrl;

    const refresh = () => htmx.trigger(form, "cart-changed");

    const addProduct = (product) => {
        const existing = lines.querySelector(`tr[data-product-id="${product.id}"]`);

        if (existing) {
            const quantity = existing.querySelector("input[name=quantity]");
            quantity.value = Number(quantity.value || 0) + 1;
        } else {
            const row = template.content.firstElementChild.cloneNode(true);
            row.dataset.productId = product.id;
            row.querySelector("input[name=product_id]").value = product.id;
            row.querySelector("[data-name]").textContent = product.name;
            row.querySelector("[data-price]").textContent = "$" + product.unit_price;
            lines.appendChild(row);
        }

        status.textContent = "Added " + product.name;
        refresh();
    };

    const lookUp = (code) => {
        fetch(lookupUrl + "?code=" + encodeURIComponent(code))
            .then((response) => response.json().then((body) => ({ ok: response.ok, body })))
            .then(({ ok, body }) => {
                if (ok) {
                    addProduct(body);
                } else {
                    status.textContent = body.error;
                }
            })
            .catch(() => {
                status.textContent = "Could not look up " + code;
            });
    };

    let buffer = "";
    let lastKeyAt = 0;

    document.addEventListener("keydown", (event) => {
        const now = performance.now();
        if (now - lastKeyAt > MAX_KEY_GAP_MS) {
            buffer = "";
        }
        lastKeyAt = now;

        if (event.key === "Enter") {
            if (buffer.length >= MIN_SCAN_LENGTH) {
                event.preventDefault();
                if (document.activeElement === codeInput) {
                    codeInput.value = "";
                }
                lookUp(buffer);
            }
            buffer = "";
            return;
        }

        if (event.key.length === 1) {
            buffer += event.key;
        }
    }, true);

    codeInput.addEventListener("keydown", (event) => {
        if (event.key === "Enter" && !event.defaultPrevented && codeInput.value.trim()) {
            event.preventDefault();
            lookUp(codeInput.value.trim());
            codeInput.value = "";
        }
    });

    document.getElementById("add-product").addEventListener("click", () => {
        const option = productSelect.selectedOptions[0];
        if (option && option.value) {
            addProduct({
                id: option.value,
                name: option.dataset.name,
                unit_price: option.dataset.price,
            });
        }
    });

    lines.addEventListener("click", (event) => {
        const button = event.target.closest("[data-remove-line]");
        if (button) {
            button.closest("tr").remove();
            refresh();
        }
    });
});
"#;

fn cart_line_template() -> Markup {
    html! {
        template id="cart-line-template"
        {
            tr data-cart-line
            {
                td class=(TABLE_CELL_STYLE)
                {
                    input type="hidden" name="product_id";
                    span data-name {}
                }
                td class=(TABLE_NUMBER_CELL_STYLE) data-price {}
                td class="px-2 py-2 w-24"
                {
                    input
                        type="number"
                        name="quantity"
                        aria-label="Quantity"
                        min="1"
                        step="1"
                        value="1"
                        class=(FORM_TEXT_INPUT_STYLE);
                }
                td class="px-2 py-2 w-28"
                {
                    input
                        type="text"
                        inputmode="decimal"
                        name="discount"
                        aria-label="Discount"
                        placeholder="0.00"
                        class=(FORM_TEXT_INPUT_STYLE);
                }
                td class="px-2 py-2"
                {
                    button type="button" data-remove-line class="text-red-600 hover:text-red-500" { "Remove" }
                }
            }
        }
    }
}

/// The cart totals and what the customer still owes or gets back.
fn quote_fragment(result: Result<(CartTotals, Money, Money), Error>) -> Markup {
    let (totals, cash, card) = match result {
        Ok(quote) => quote,
        Err(error) => {
            return html! {
                p class="text-sm text-red-600" data-quote-error { (error) }
            };
        }
    };

    let tendered = cash + card;
    let tenders = [
        Tender {
            method: TenderMethod::Cash,
            amount: cash,
        },
        Tender {
            method: TenderMethod::Card,
            amount: card,
        },
    ];
    let tenders: Vec<Tender> = tenders
        .into_iter()
        .filter(|tender| !tender.amount.is_zero())
        .collect();

    html! {
        dl class="grid grid-cols-2 gap-y-1 text-sm tabular-nums"
        {
            dt { "Subtotal" }
            dd class="text-right" data-quote-subtotal { (format_currency(totals.subtotal)) }
            dt { "Discount" }
            dd class="text-right" data-quote-discount { (format_currency(totals.discount)) }
            dt { "Tax" }
            dd class="text-right" data-quote-tax { (format_currency(totals.tax)) }
            dt class="font-semibold text-lg" { "Total" }
            dd class="text-right font-semibold text-lg" data-quote-total { (format_currency(totals.total)) }

            @if !tendered.is_zero() {
                @match settle_tenders(totals.total, &tenders) {
                    Ok(settlement) => {
                        dt { "Change due" }
                        dd class="text-right" data-quote-change { (format_currency(settlement.change)) }
                    }
                    Err(Error::InsufficientPayment { total, tendered }) => {
                        dt { "Still owed" }
                        dd class="text-right" data-quote-owed { (format_currency(total - tendered)) }
                    }
                    Err(error) => {
                        dd class="col-span-2 text-red-600" data-quote-error { (error) }
                    }
                }
            }
        }
    }
}

fn register_view(products: &[Product]) -> Markup {
    let nav_bar = NavBar::new(endpoints::POS_VIEW).into_html();

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-5xl space-y-4"
            {
                (page_header("Register", Some((endpoints::SALES_VIEW, "Sales"))))

                section class="flex flex-wrap items-end gap-4"
                {
                    div
                    {
                        label for="scan-code" class=(FORM_LABEL_STYLE) { "Barcode or SKU" }
                        input
                            type="text"
                            id="scan-code"
                            autocomplete="off"
                            autofocus
                            placeholder="Scan or type a code"
                            class=(FORM_TEXT_INPUT_STYLE);
                    }

                    div
                    {
                        label for="product-select" class=(FORM_LABEL_STYLE) { "Product" }
                        select id="product-select" class=(FORM_TEXT_INPUT_STYLE)
                        {
                            option value="" { "Pick a product" }
                            @for product in products {
                                option
                                    value=(product.id)
                                    data-name=(product.name)
                                    data-price=(product.unit_price)
                                {
                                    (product.name) " (" (product.quantity_on_hand) " on hand)"
                                }
                            }
                        }
                    }

                    button type="button" id="add-product" class=(BUTTON_SECONDARY_STYLE) { "Add" }

                    p id="scan-status" class="text-sm" role="status" {}
                }

                @if products.is_empty() {
                    p class="text-sm" data-no-products
                    {
                        "There is nothing to sell yet. "
                        a href=(endpoints::NEW_PRODUCT_VIEW) class=(LINK_STYLE) { "Add a product" }
                        "."
                    }
                }

                form
                    id="cart-form"
                    data-lookup-url=(endpoints::PRODUCT_LOOKUP_API)
                    hx-post=(endpoints::POS_QUOTE_API)
                    hx-trigger="change, keyup changed delay:300ms, cart-changed"
                    hx-target="#cart-totals"
                    hx-target-error="#alert-container"
                    class="grid gap-6 md:grid-cols-3"
                {
                    div class="md:col-span-2 overflow-x-auto rounded shadow"
                    {
                        table class=(TABLE_STYLE)
                        {
                            thead class=(TABLE_HEADER_STYLE)
                            {
                                tr
                                {
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Product" }
                                    th scope="col" class=(TABLE_NUMBER_CELL_STYLE) { "Price" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Quantity" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { "Discount" }
                                    th scope="col" class=(TABLE_CELL_STYLE) { span class="sr-only" { "Remove" } }
                                }
                            }

                            tbody id="cart-lines" {}
                        }

                        (cart_line_template())
                    }

                    div class="space-y-4"
                    {
                        div
                        {
                            label for="tax_rate" class=(FORM_LABEL_STYLE) { "Tax rate (%)" }
                            input
                                type="text"
                                inputmode="decimal"
                                name="tax_rate"
                                id="tax_rate"
                                placeholder="0"
                                class=(FORM_TEXT_INPUT_STYLE);
                        }

                        div
                        {
                            label for="cash" class=(FORM_LABEL_STYLE) { "Cash tendered" }
                            input
                                type="text"
                                inputmode="decimal"
                                name="cash"
                                id="cash"
                                placeholder="0.00"
                                class=(FORM_TEXT_INPUT_STYLE);
                        }

                        div
                        {
                            label for="card" class=(FORM_LABEL_STYLE) { "Card" }
                            input
                                type="text"
                                inputmode="decimal"
                                name="card"
                                id="card"
                                placeholder="0.00"
                                class=(FORM_TEXT_INPUT_STYLE);
                        }

                        div id="cart-totals" aria-live="polite"
                        {
                            (quote_fragment(Ok((CartTotals::default(), Money::ZERO, Money::ZERO))))
                        }

                        button
                            type="button"
                            hx-post=(endpoints::CHECKOUT_API)
                            hx-include="#cart-form"
                            hx-target-error="#alert-container"
                            class=(BUTTON_PRIMARY_STYLE)
                            data-checkout-button
                        {
                            "Complete sale"
                        }
                    }
                }
            }
        }
    };

    base(
        "Register",
        &[HeadElement::ScriptSource(PreEscaped(REGISTER_SCRIPT.to_owned()))],
        &content,
    )
}

/// Display the register.
pub async fn get_pos_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let products: Vec<Product> = list_products(tenant.organization_id, &connection)?
        .into_iter()
        .filter(|product| !product.archived)
        .collect();

    Ok(register_view(&products).into_response())
}

/// The register form. Each cart line is spread over the repeated fields, matched up by position.
#[derive(Debug, Default, Deserialize)]
pub struct CartForm {
    #[serde(default)]
    pub product_id: Vec<ProductId>,
    #[serde(default)]
    pub quantity: Vec<String>,
    #[serde(default)]
    pub discount: Vec<String>,
    #[serde(default)]
    pub tax_rate: String,
    #[serde(default)]
    pub cash: String,
    #[serde(default)]
    pub card: String,
}

impl CartForm {
    /// Build the cart, pricing each line at the product's current price.
    ///
    /// A blank quantity means one.
    fn to_cart(
        &self,
        organization_id: OrganizationId,
        connection: &Connection,
    ) -> Result<Cart, Error> {
        let mut lines = Vec::with_capacity(self.product_id.len());

        for (index, product_id) in self.product_id.iter().enumerate() {
            let quantity = self.quantity.get(index).map(|s| s.trim()).unwrap_or_default();
            let discount = self.discount.get(index).map(String::as_str).unwrap_or_default();
            let product = get_product(organization_id, *product_id, connection)?;

            lines.push(CartLine {
                product_id: product.id,
                quantity: if quantity.is_empty() {
                    1
                } else {
                    quantity.parse().map_err(|_| Error::InvalidQuantity)?
                },
                unit_price: product.unit_price,
                discount: parse_optional_amount(discount)?,
            });
        }

        Ok(Cart {
            lines,
            tax_rate_bps: parse_tax_rate(&self.tax_rate)?,
        })
    }

    fn tendered(&self) -> Result<(Money, Money), Error> {
        Ok((
            parse_optional_amount(&self.cash)?,
            parse_optional_amount(&self.card)?,
        ))
    }

    /// The cash and card amounts that were filled in.
    fn tenders(&self) -> Result<Vec<Tender>, Error> {
        let (cash, card) = self.tendered()?;

        Ok([
            Tender {
                method: TenderMethod::Cash,
                amount: cash,
            },
            Tender {
                method: TenderMethod::Card,
                amount: card,
            },
        ]
        .into_iter()
        .filter(|tender| !tender.amount.is_zero())
        .collect())
    }
}

/// Price the cart without saving anything.
pub async fn quote_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Form(form): Form<CartForm>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let quote = form
        .to_cart(tenant.organization_id, &connection)
        .and_then(|cart| cart.totals())
        .and_then(|totals| form.tendered().map(|(cash, card)| (totals, cash, card)));

    quote_fragment(quote).into_response()
}

/// Complete the sale on today's date and show the receipt.
pub async fn checkout_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Form(form): Form<CartForm>,
) -> Response {
    let today = match local_today(&state.local_timezone) {
        Ok(today) => today,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    let result = form
        .to_cart(tenant.organization_id, &connection)
        .and_then(|cart| Ok((cart, form.tenders()?)))
        .and_then(|(cart, tenders)| checkout(tenant, &cart, &tenders, today, &connection));

    match result {
        Ok(sale) => (
            HxRedirect(format_endpoint(endpoints::SALE_VIEW, sale.id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::debug!("checkout failed: {error}");
            error.into_alert_response()
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct LookupQuery {
    pub code: String,
}

/// What the register needs to know about a scanned product.
#[derive(Debug, Serialize)]
struct ProductLookup {
    id: ProductId,
    sku: String,
    name: String,
    unit_price: Money,
    quantity_on_hand: i64,
}

/// Find an active product by barcode or SKU and return it as JSON.
pub async fn lookup_product_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Query(query): Query<LookupQuery>,
) -> Response {
    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({ "error": Error::DatabaseLockError.to_string() })),
            )
                .into_response();
        }
    };

    match find_product_by_barcode(tenant.organization_id, &query.code, &connection) {
        Ok(product) => (
            StatusCode::OK,
            Json(ProductLookup {
                id: product.id,
                sku: product.sku,
                name: product.name,
                unit_price: product.unit_price,
                quantity_on_hand: product.quantity_on_hand,
            }),
        )
            .into_response(),
        Err(Error::NotFound) => (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": format!("No product has the code {}", query.code.trim()) })),
        )
            .into_response(),
        Err(error) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(json!({ "error": error.to_string() })),
        )
            .into_response(),
    }
}

#[cfg(test)]
mod register_page_tests {
    use axum::{Extension, extract::State};

    use crate::{
        pos::get_pos_page,
        stock::{ProductDetails, create_product, test_products::stocked_product},
        test_utils::{TestBooks, assert_valid_html, parse_html_document, select_texts},
    };

    #[tokio::test]
    async fn offers_active_products() {
        let books = TestBooks::retail();
        stocked_product(&books, "A1", 3);
        create_product(
            books.organization_id(),
            ProductDetails {
                sku: "OLD".to_owned(),
                barcode: None,
                name: "Old stock".to_owned(),
                unit_price: crate::money::Money::from_dollars(1),
                unit_cost: crate::money::Money::ZERO,
                archived: true,
            },
            &books.connection,
        )
        .unwrap();
        let (state, tenant) = books.db_state();

        let response = get_pos_page(State(state), Extension(tenant)).await.unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        assert_eq!(
            select_texts(&document, "#product-select option[value]:not([value=''])"),
            ["Product A1 (3 on hand)"]
        );
        assert_eq!(select_texts(&document, "[data-checkout-button]").len(), 1);
        assert_eq!(select_texts(&document, "[data-quote-total]"), ["$0.00"]);
    }
}

#[cfg(test)]
mod quote_endpoint_tests {
    use axum::{Extension, extract::State};
    use axum_extra::extract::Form;

    use crate::{
        pos::{quote_endpoint, register::CartForm},
        stock::test_products::stocked_product,
        test_utils::{TestBooks, parse_html_fragment, select_texts},
    };

    #[tokio::test]
    async fn prices_cart_and_shows_change() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 5);
        let (state, tenant) = books.db_state();

        let response = quote_endpoint(
            State(state),
            Extension(tenant),
            Form(CartForm {
                product_id: vec![product.id],
                quantity: vec!["2".to_owned()],
                discount: vec!["1".to_owned()],
                tax_rate: "10".to_owned(),
                cash: "25".to_owned(),
                card: String::new(),
            }),
        )
        .await;

        let fragment = parse_html_fragment(response).await;
        assert_eq!(select_texts(&fragment, "[data-quote-total]"), ["$20.90"]);
        assert_eq!(select_texts(&fragment, "[data-quote-change]"), ["$4.10"]);
    }

    #[tokio::test]
    async fn shows_amount_still_owed() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 5);
        let (state, tenant) = books.db_state();

        let response = quote_endpoint(
            State(state),
            Extension(tenant),
            Form(CartForm {
                product_id: vec![product.id],
                quantity: vec![String::new()],
                card: "4".to_owned(),
                ..CartForm::default()
            }),
        )
        .await;

        let fragment = parse_html_fragment(response).await;
        assert_eq!(select_texts(&fragment, "[data-quote-owed]"), ["$6.00"]);
    }

    #[tokio::test]
    async fn invalid_discount_is_reported_inline() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 5);
        let (state, tenant) = books.db_state();

        let response = quote_endpoint(
            State(state),
            Extension(tenant),
            Form(CartForm {
                product_id: vec![product.id],
                quantity: vec!["1".to_owned()],
                discount: vec!["50".to_owned()],
                ..CartForm::default()
            }),
        )
        .await;

        let fragment = parse_html_fragment(response).await;
        assert_eq!(select_texts(&fragment, "[data-quote-error]").len(), 1);
    }
}


#[cfg(test)]
mod lookup_product_endpoint_tests {
    use axum::{
        Extension,
        body::to_bytes,
        extract::{Query, State},
        http::StatusCode,
    };

    use crate::{
        pos::{lookup_product_endpoint, register::LookupQuery},
        stock::test_products::stocked_product,
        test_utils::TestBooks,
    };

    #[tokio::test]
    async fn returns_product_json() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 5);
        let (state, tenant) = books.db_state();

        let response = lookup_product_endpoint(
            State(state),
            Extension(tenant),
            Query(LookupQuery {
                code: "9400A1".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["id"], product.id);
        assert_eq!(json["name"], "Product A1");
        assert_eq!(json["unit_price"], "10.00");
    }

    #[tokio::test]
    async fn unknown_code_is_not_found() {
        let (state, tenant) = TestBooks::retail().db_state();

        let response = lookup_product_endpoint(
            State(state),
            Extension(tenant),
            Query(LookupQuery {
                code: "0000".to_owned(),
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
