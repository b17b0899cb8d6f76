//! The page for adding an account to the chart of accounts.

use axum::{
    Extension,
    extract::State,
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    account::{
        Account,
        form::{AccountFormValues, FormAction, account_form},
        list_accounts, sort_as_tree,
    },
    app_state::DbState,
    endpoints,
    html::{FORM_CONTAINER_STYLE, PAGE_CONTAINER_STYLE, base, page_header},
    navigation::NavBar,
    organization::Tenant,
};

fn create_account_view(parents: &[Account]) -> Markup {
    let nav_bar = NavBar::new(endpoints::NEW_ACCOUNT_VIEW).into_html();
    let form = account_form(
        FormAction::Create(endpoints::ACCOUNTS_API),
        &AccountFormValues::default(),
        parents,
    );

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                (page_header("New Account", Some((endpoints::ACCOUNTS_VIEW, "Back to accounts"))))

                div class=(FORM_CONTAINER_STYLE) { (form) }
            }
        }
    };

    base("New Account", &[], &content)
}

/// Renders the page for creating an account.
pub async fn get_new_account_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let parents: Vec<Account> = sort_as_tree(list_accounts(tenant.organization_id, &connection)?)
        .into_iter()
        .filter(|account| !account.archived)
        .collect();

    Ok(create_account_view(&parents).into_response())
}

#[cfg(test)]
mod create_account_page_tests {
    use axum::{Extension, extract::State};

    use crate::{
        account::get_new_account_page,
        endpoints,
        test_utils::{
            TestBooks, assert_form_input, assert_form_submit_button, assert_hx_endpoint,
            assert_valid_html, form_select_options, must_get_form, parse_html_document,
        },
    };

    #[tokio::test]
    async fn render_page() {
        let (state, tenant) = TestBooks::standard().db_state();

        let response = get_new_account_page(State(state), Extension(tenant))
            .await
            .unwrap();

        let document = parse_html_document(response).await;
        assert_valid_html(&document);
        let form = must_get_form(&document);
        assert_hx_endpoint(&form, endpoints::ACCOUNTS_API, "hx-post");
        assert_form_input(&form, "code", "text");
        assert_form_input(&form, "name", "text");
        assert_form_submit_button(&form);
        let parent_options = form_select_options(&form, "parent_id");
        assert_eq!(parent_options[0], "None");
        assert!(parent_options.contains(&"1000 Current Assets (Asset)".to_owned()));
    }
}
