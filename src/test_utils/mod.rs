#![allow(missing_docs)]

pub(crate) mod books;
pub(crate) mod form;
pub(crate) mod html;
pub(crate) mod http;

pub(crate) use books::{TEST_EMAIL, TEST_PASSWORD, TEST_TIMEZONE, TestBooks, account_by_code};
pub(crate) use form::{
    assert_form_input, assert_form_input_with_value, assert_form_submit_button,
    assert_hx_endpoint, form_select_options, must_get_form,
};
pub(crate) use html::{assert_valid_html, parse_html_document, parse_html_fragment, select_texts};
pub(crate) use http::{
    assert_content_type, assert_hx_redirect, assert_status_ok, get_header, get_set_cookie,
    response_text,
};
