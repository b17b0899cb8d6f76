//! Assertions over the forms rendered by page handlers.

use scraper::{ElementRef, Html, Selector};

#[track_caller]
fn selector(css: &str) -> Selector {
    Selector::parse(css).unwrap_or_else(|error| panic!("bad selector {css:?}: {error}"))
}

/// The first form on the page.
#[track_caller]
pub(crate) fn must_get_form(html: &Html) -> ElementRef<'_> {
    html.select(&selector("form"))
        .next()
        .expect("No form found")
}

/// Assert that `form` sends its request to `endpoint` with the HTMX verb `attribute`,
/// e.g. `hx-post` or `hx-put`.
#[track_caller]
pub(crate) fn assert_hx_endpoint(form: &ElementRef<'_>, endpoint: &str, attribute: &str) {
    let target = form
        .value()
        .attr(attribute)
        .unwrap_or_else(|| panic!("{attribute} attribute missing"));

    assert_eq!(
        target, endpoint,
        "want form with attribute {attribute}=\"{endpoint}\", got {target:?}"
    );
}

/// The first input named `name`. Repeated-row forms reuse names, so later
/// rows are ignored.
#[track_caller]
fn must_find_input<'a>(form: &ElementRef<'a>, name: &str) -> ElementRef<'a> {
    form.select(&selector(&format!("input[name=\"{name}\"]")))
        .next()
        .unwrap_or_else(|| panic!("No input found with name \"{name}\""))
}

#[track_caller]
fn assert_required_input_of_type(input: &ElementRef<'_>, name: &str, type_: &str) {
    let input_type = input.value().attr("type").unwrap_or_default();

    assert_eq!(
        input_type, type_,
        "want input {name} with type \"{type_}\", got {input_type:?}"
    );
    assert!(
        input.value().attr("required").is_some(),
        "want input with name {name} to have the required attribute but got none"
    );
}

/// Assert that `form` has a required input called `name` of type `type_`.
#[track_caller]
pub(crate) fn assert_form_input(form: &ElementRef<'_>, name: &str, type_: &str) {
    let input = must_find_input(form, name);

    assert_required_input_of_type(&input, name, type_);
}

/// Like [assert_form_input], and also check the prefilled value.
#[track_caller]
pub(crate) fn assert_form_input_with_value(
    form: &ElementRef<'_>,
    name: &str,
    type_: &str,
    value: &str,
) {
    let input = must_find_input(form, name);
    assert_required_input_of_type(&input, name, type_);

    let input_value = input.value().attr("value").unwrap_or_default();
    assert_eq!(
        input_value, value,
        "want input {name} with value \"{value}\", got {input_value:?}"
    );
}

/// The option labels of the select called `name`, in page order.
#[track_caller]
pub(crate) fn form_select_options(form: &ElementRef<'_>, name: &str) -> Vec<String> {
    let select = form
        .select(&selector(&format!("select[name=\"{name}\"]")))
        .next()
        .unwrap_or_else(|| panic!("No select found with name \"{name}\""));

    select
        .select(&selector("option"))
        .map(|option| option.text().collect::<String>().trim().to_owned())
        .collect()
}

#[track_caller]
pub(crate) fn assert_form_submit_button(form: &ElementRef<'_>) {
    let has_submit = form
        .select(&selector("button"))
        .any(|button| button.value().attr("type") == Some("submit"));

    assert!(has_submit, "want a button with type=\"submit\"");
}
