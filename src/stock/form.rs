//! The form shared by the new and edit product pages.

use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    form::is_checked,
    html::{BUTTON_PRIMARY_STYLE, amount_input, text_input},
    money::parse_optional_amount,
    stock::{Product, ProductDetails},
};

/// The values shown in the product form.
#[derive(Debug, Clone, Default, PartialEq)]
pub(super) struct ProductFormValues {
    pub sku: String,
    pub barcode: String,
    pub name: String,
    pub unit_price: String,
    pub unit_cost: String,
    pub archived: bool,
}

impl From<&Product> for ProductFormValues {
    fn from(product: &Product) -> Self {
        Self {
            sku: product.sku.clone(),
            barcode: product.barcode.clone().unwrap_or_default(),
            name: product.name.clone(),
            unit_price: product.unit_price.to_string(),
            unit_cost: product.unit_cost.to_string(),
            archived: product.archived,
        }
    }
}

/// Where the form is submitted to.
pub(super) enum FormAction<'a> {
    Create(&'a str),
    Update(&'a str),
}

pub(super) fn product_form(action: FormAction<'_>, values: &ProductFormValues) -> Markup {
    let (hx_post, hx_put, submit_text) = match action {
        FormAction::Create(url) => (Some(url), None, "Create product"),
        FormAction::Update(url) => (None, Some(url), "Save changes"),
    };
    let is_update = hx_put.is_some();

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (text_input("Name", "name", &values.name, true))
            (text_input("SKU", "sku", &values.sku, true))
            (text_input("Barcode", "barcode", &values.barcode, false))
            (amount_input("Sale price", "unit_price", &values.unit_price))
            (amount_input("Unit cost", "unit_cost", &values.unit_cost))

            @if is_update {
                div class="flex items-center gap-2"
                {
                    input type="checkbox" name="archived" id="archived" checked[values.archived];

                    label for="archived" class="text-sm" { "Archived (hidden from the register)" }
                }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}

/// The form data for creating or updating a product.
#[derive(Debug, Deserialize)]
pub struct ProductForm {
    pub sku: String,
    #[serde(default)]
    pub barcode: String,
    pub name: String,
    pub unit_price: String,
    #[serde(default)]
    pub unit_cost: String,
    #[serde(default)]
    pub archived: Option<String>,
}

impl ProductForm {
    pub(super) fn into_details(self) -> Result<ProductDetails, Error> {
        Ok(ProductDetails {
            sku: self.sku,
            barcode: Some(self.barcode),
            name: self.name,
            unit_price: self.unit_price.parse()?,
            unit_cost: parse_optional_amount(&self.unit_cost)?,
            archived: is_checked(&self.archived),
        })
    }
}
