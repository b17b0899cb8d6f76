//! The page and endpoint for editing a product.

use axum::{
    Extension, Form,
    extract::{Path, State},
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
        Product, ProductId,
        form::{FormAction, ProductForm, ProductFormValues, product_form},
        get_product, update_product,
    },
};

fn edit_product_view(product: &Product) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_PRODUCT_VIEW).into_html();
    let form = product_form(
        FormAction::Update(&format_endpoint(endpoints::PRODUCT_API, product.id)),
        &ProductFormValues::from(product),
    );
    let product_url = format_endpoint(endpoints::PRODUCT_VIEW, product.id);
    let title = format!("Edit {}", product.name);

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                (page_header(&title, Some((&product_url, "Back to product"))))

                div class=(FORM_CONTAINER_STYLE) { (form) }
            }
        }
    };

    base("Edit Product", &[], &content)
}

pub async fn get_edit_product_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(product_id): Path<ProductId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let product = get_product(tenant.organization_id, product_id, &connection)?;

    Ok(edit_product_view(&product).into_response())
}

/// Update a product and redirect to its page.
pub async fn update_product_endpoint(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(product_id): Path<ProductId>,
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

    match update_product(tenant.organization_id, product_id, details, &connection) {
        Ok(product) => (
            HxRedirect(format_endpoint(endpoints::PRODUCT_VIEW, product.id)),
            StatusCode::SEE_OTHER,
        )
            .into_response(),
        Err(error) => {
            tracing::debug!("could not update product {product_id}: {error}");
            error.into_alert_response()
        }
    }
}
