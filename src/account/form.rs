//! The form shared by the new and edit account pages.

use maud::{Markup, html};
use serde::Deserialize;

use crate::{
    Error,
    account::{Account, AccountCode, AccountDetails, AccountId, AccountKind, AccountRole},
    form::{empty_string_as_none, is_checked},
    html::{BUTTON_PRIMARY_STYLE, FORM_LABEL_STYLE, FORM_TEXT_INPUT_STYLE, text_input},
};

/// The values shown in the account form.
#[derive(Debug, Clone, PartialEq)]
pub(super) struct AccountFormValues {
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    pub parent_id: Option<AccountId>,
    pub role: Option<AccountRole>,
    pub is_current: bool,
}

impl Default for AccountFormValues {
    fn default() -> Self {
        Self {
            code: String::new(),
            name: String::new(),
            kind: AccountKind::Asset,
            parent_id: None,
            role: None,
            is_current: false,
        }
    }
}

impl From<&Account> for AccountFormValues {
    fn from(account: &Account) -> Self {
        Self {
            code: account.code.to_string(),
            name: account.name.clone(),
            kind: account.kind,
            parent_id: account.parent_id,
            role: account.role,
            is_current: account.is_current,
        }
    }
}

/// Where the form is submitted to.
pub(super) enum FormAction<'a> {
    Create(&'a str),
    Update(&'a str),
}

/// Render the account form.
///
/// `parents` lists the accounts that may be picked as the parent. The account
/// being edited and its descendants should already be removed.
pub(super) fn account_form(
    action: FormAction<'_>,
    values: &AccountFormValues,
    parents: &[Account],
) -> Markup {
    let (hx_post, hx_put, submit_text) = match action {
        FormAction::Create(url) => (Some(url), None, "Create account"),
        FormAction::Update(url) => (None, Some(url), "Save changes"),
    };

    html! {
        form
            hx-post=[hx_post]
            hx-put=[hx_put]
            hx-target-error="#alert-container"
            class="w-full space-y-4 md:space-y-6"
        {
            (text_input("Code", "code", &values.code, true))
            (text_input("Name", "name", &values.name, true))

            div
            {
                label for="kind" class=(FORM_LABEL_STYLE) { "Type" }

                select name="kind" id="kind" required class=(FORM_TEXT_INPUT_STYLE)
                {
                    @for kind in AccountKind::ALL {
                        option value=(kind.as_str()) selected[kind == values.kind] { (kind) }
                    }
                }
            }

            div
            {
                label for="parent_id" class=(FORM_LABEL_STYLE) { "Parent account" }

                select name="parent_id" id="parent_id" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "None" }

                    @for parent in parents {
                        option
                            value=(parent.id)
                            selected[values.parent_id == Some(parent.id)]
                        {
                            (parent.code) " " (parent.name) " (" (parent.kind) ")"
                        }
                    }
                }
            }

            div
            {
                label for="role" class=(FORM_LABEL_STYLE) { "Role" }

                select name="role" id="role" class=(FORM_TEXT_INPUT_STYLE)
                {
                    option value="" { "None" }

                    @for role in AccountRole::ALL {
                        option value=(role.as_str()) selected[values.role == Some(role)]
                        {
                            (role) " (" (role.required_kind()) ")"
                        }
                    }
                }
            }

            div class="flex items-center gap-2"
            {
                input
                    type="checkbox"
                    name="is_current"
                    id="is_current"
                    checked[values.is_current];

                label for="is_current" class="text-sm" { "Current asset or liability" }
            }

            button type="submit" class=(BUTTON_PRIMARY_STYLE) { (submit_text) }
        }
    }
}

/// The form data for creating or updating an account.
#[derive(Debug, Deserialize)]
pub struct AccountForm {
    pub code: String,
    pub name: String,
    pub kind: AccountKind,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub parent_id: Option<AccountId>,
    #[serde(default, deserialize_with = "empty_string_as_none")]
    pub role: Option<AccountRole>,
    #[serde(default)]
    pub is_current: Option<String>,
}

impl AccountForm {
    pub(super) fn into_details(self) -> Result<AccountDetails, Error> {
        Ok(AccountDetails {
            code: AccountCode::new(&self.code)?,
            name: self.name,
            kind: self.kind,
            parent_id: self.parent_id,
            role: self.role,
            is_current: is_checked(&self.is_current),
        })
    }
}
