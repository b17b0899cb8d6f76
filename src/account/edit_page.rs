//! The page for editing an account.

use std::collections::HashSet;

use axum::{
    Extension,
    extract::{Path, State},
    response::{IntoResponse, Response},
};
use maud::{Markup, html};

use crate::{
    Error,
    account::{
        Account, AccountId,
        form::{AccountFormValues, FormAction, account_form},
        get_account, list_accounts, sort_as_tree,
    },
    app_state::DbState,
    endpoints::{self, format_endpoint},
    html::{FORM_CONTAINER_STYLE, PAGE_CONTAINER_STYLE, base, page_header},
    navigation::NavBar,
    organization::Tenant,
};

/// The accounts that `account_id` may be moved under: everything except the
/// account itself and its descendants.
fn parent_candidates(account_id: AccountId, accounts: Vec<Account>) -> Vec<Account> {
    let mut excluded = HashSet::from([account_id]);
    // Tree order puts descendants after their ancestor, so one pass is enough.
    let ordered = sort_as_tree(accounts);
    for account in &ordered {
        if account
            .parent_id
            .is_some_and(|parent_id| excluded.contains(&parent_id))
        {
            excluded.insert(account.id);
        }
    }

    ordered
        .into_iter()
        .filter(|account| !excluded.contains(&account.id) && !account.archived)
        .collect()
}

fn edit_account_view(account: &Account, parents: &[Account]) -> Markup {
    let nav_bar = NavBar::new(endpoints::EDIT_ACCOUNT_VIEW).into_html();
    let form = account_form(
        FormAction::Update(&format_endpoint(endpoints::ACCOUNT_API, account.id)),
        &AccountFormValues::from(account),
        parents,
    );
    let title = format!("Edit {} {}", account.code, account.name);

    let content = html! {
        (nav_bar)

        main class=(PAGE_CONTAINER_STYLE)
        {
            div class="w-full max-w-md space-y-4"
            {
                (page_header(&title, Some((endpoints::ACCOUNTS_VIEW, "Back to accounts"))))

                div class=(FORM_CONTAINER_STYLE) { (form) }
            }
        }
    };

    base("Edit Account", &[], &content)
}

/// Renders the page for editing an account.
pub async fn get_edit_account_page(
    State(state): State<DbState>,
    Extension(tenant): Extension<Tenant>,
    Path(account_id): Path<AccountId>,
) -> Result<Response, Error> {
    let connection = state
        .db_connection
        .lock()
        .inspect_err(|error| tracing::error!("could not acquire database lock: {error}"))
        .map_err(|_| Error::DatabaseLockError)?;

    let account = get_account(tenant.organization_id, account_id, &connection)?;
    let parents = parent_candidates(
        account_id,
        list_accounts(tenant.organization_id, &connection)?,
    );

    Ok(edit_account_view(&account, &parents).into_response())
}
