//! The page and endpoint for adding a product.

use axum::{
    Extension, Form,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use axum_htmx::HxRedirect;
use maud::{Markup, html};

use crate::{
    Error,
    app_state::DbState,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, PAGE_CONTAINER_STYLE, base, page_header},
    navigation::NavBar,
    organization::Tenant,
    stock::{
        create_product,
        form::{FormAction, ProductForm, ProductFormValues, product_form},
    },
};

fn new_product_view() -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_PRODUCT_VIEW).into_html();
    let form = product_form(
        FormAction::Create(endpoints::PRODUCTS_API),
        &ProductFormValues::default(),
    );

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                (page_header("New Product", Some((endpoints::PRODUCTS_VIEW, "Back to products"))))

                p class="text-sm"
                {
                    "New products start with nothing on hand. Count stock in from the product page."
                }

                div class=(FORM_CONTAINER_STYLE) { (form) }
            }
        }
    };

    base("New Product", &[], &content)
}

pub async fn get_new_product_page() -> Response {
    new_product_view().into_response()
}

/// Create a product and redirect to its page.
pub async fn create_product_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Form(form): Form<ProductForm>,
) -> Response {
    let details = match form.into_details() {
        Ok(details) => details,
        Err(error) => return error.into_alert_response(),
    };

    let connection = match state.db_connection.lock() {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("could not acquire database lock: {error}");
            return Error::DatabaseLockError.into_alert_response();
        }
    };

    match create_product(tenant.organization_id, details, &connection) {
        Ok(product) => (
            HxRedirect(format_endpoint(endpoints::PRODUCT_VIEW, product.id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::debug!("could not create product: {error}");
            error.into_alert_response()
        }
    }
}

#[cfg(test)]
mod new_product_tests {
    use axum::{Extension, Form, extract::State, http::StatusCode};

    use crate::{
        endpoints::{self, format_endpoint},
        stock::{create_product_endpoint, form::ProductForm, get_new_product_page, list_products},
        test_utils::{
            TestBooks, assert_form_input, assert_hx_endpoint, assert_hx_redirect,
            assert_valid_html, must_get_form, parse_html_document,
        },
    };

    fn form(sku: &str) -> ProductForm {
        ProductForm {
            sku: sku.to_owned(),
            barcode: "9400001".to_owned(),
            name: "Green Tea".to_owned(),
            unit_price: "6.50".to_owned(),
            unit_cost: "2.10".to_owned(),
            archived: None,
        }
    }

    #[tokio::test]
    async fn page_has_product_form() {
        let response = get_new_product_page().await;

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::PRODUCTS_API, "hx-post");
        assert_form_input(&form, "sku", "text");
        assert_form_input(&form, "name", "text");
    }

    #[tokio::test]
    async fn creates_product_and_redirects() {
        let (state, tenant) = TestBooks::retail().db_state();

        let response =
            create_product_endpoint(State(state.clone()), Extension(tenant), Form(form("TEA")))
                .await;

        assert_eq!(response.status(), StatusCode::SEE_OTHER);
        let connection = state.db_connection.lock().unwrap();
        let products = list_products(tenant.organization_id, &connection).unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].barcode.as_deref(), Some("9400001"));
        assert_hx_redirect(
            &response,
            &format_endpoint(endpoints::PRODUCT_VIEW, products[0].id),
        );
    }

    #[tokio::test]
    async fn duplicate_sku_is_bad_request() {
        let (state, tenant) = TestBooks::retail().db_state();
        create_product_endpoint(State(state.clone()), Extension(tenant), Form(form("TEA"))).await;

        let response = create_product_endpoint(
            State(state),
            Extension(tenant),
            Form(ProductForm {
                barcode: String::new(),
                ..form("TEA")
            }),
        )
        .await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
