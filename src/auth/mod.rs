//! Users, registration, log in and log out, and the middleware guarding protected routes.

mod cookie;
mod forgot_password;
mod log_in;
mod log_out;
mod middleware;
mod password;
mod redirect;
mod register;
mod token;
mod user;

pub use cookie::{DEFAULT_COOKIE_DURATION, invalidate_auth_cookie, set_auth_cookie};
pub use forgot_password::get_forgot_password_page;
pub use log_in::{LoginState, get_log_in_page, post_log_in};
pub use log_out::get_log_out;
pub use middleware::{AuthState, auth_guard, auth_guard_hx};
pub use password::{PasswordHash, ValidatedPassword};
pub use redirect::normalize_redirect_url;
pub use register::{RegisterForm, RegistrationState, get_register_page, register_organization};
pub use user::{
    User, UserID, create_user, create_user_table, get_user_by_email, get_user_by_id,
    normalize_email, update_password,
};

#[cfg(test)]
pub(crate) use cookie::COOKIE_TOKEN;
