//! Application router configuration with protected and unprotected route definitions.

use axum::{
    Router,
    http::StatusCode,
    middleware,
    response::{Html, IntoResponse, Redirect, Response},
    routing::{delete, get, post, put},
};
use tower_http::services::ServeDir;

use crate::{
    AppState,
    account::{
        archive_account_endpoint, create_account_endpoint, delete_account_endpoint,
        edit_account_endpoint, get_account_ledger_page, get_accounts_page, get_edit_account_page,
        get_new_account_page,
    },
    auth::{
        auth_guard, auth_guard_hx, get_forgot_password_page, get_log_in_page, get_log_out,
        get_register_page, post_log_in, register_organization,
    },
    bill::{
        approve_bill_endpoint, create_bill_endpoint, get_bill_page, get_bills_page,
        get_new_bill_page, record_bill_payment_endpoint, void_bill_endpoint,
    },
    contact::{create_contact_endpoint, delete_contact_endpoint, get_contacts_page},
    dashboard::get_dashboard_page,
    endpoints,
    internal_server_error::get_internal_server_error_page,
    invoice::{
        create_invoice_endpoint, get_invoice_page, get_invoices_page, get_new_invoice_page,
        issue_invoice_endpoint, record_invoice_payment_endpoint, void_invoice_endpoint,
    },
    ledger::{
        get_entry_page, get_journal_csv, get_journal_page, get_new_entry_page, post_journal_entry,
        reverse_entry_endpoint,
    },
    not_found::get_404_not_found,
    organization::{close_period_endpoint, get_settings_page, rename_organization_endpoint},
    pos::{
        checkout_endpoint, get_pos_page, get_sale_page, get_sales_page, lookup_product_endpoint,
        quote_endpoint, void_sale_endpoint,
    },
    report::{
        get_aging_page, get_balance_sheet_page, get_income_statement_page, get_reports_page,
        get_trial_balance_csv, get_trial_balance_page,
    },
    stock::{
        adjust_stock_endpoint, create_product_endpoint, get_edit_product_page,
        get_new_product_page, get_product_page, get_products_page, update_product_endpoint,
    },
};

/// Return a router with all the app's routes.
pub fn build_router(state: AppState) -> Router {
    let unprotected_routes = Router::new()
        .route(endpoints::COFFEE, get(get_coffee))
        .route(endpoints::LOG_IN_VIEW, get(get_log_in_page))
        .route(endpoints::LOG_IN_API, post(post_log_in))
        .route(endpoints::LOG_OUT, get(get_log_out))
        .route(endpoints::REGISTER_VIEW, get(get_register_page))
        .route(
            endpoints::FORGOT_PASSWORD_VIEW,
            get(get_forgot_password_page),
        )
        .route(endpoints::ORGANIZATIONS_API, post(register_organization))
        .route(
            endpoints::INTERNAL_ERROR_VIEW,
            get(get_internal_server_error_page),
        );

    let protected_routes = Router::new()
        .route(endpoints::ROOT, get(get_index_page))
        .route(endpoints::DASHBOARD_VIEW, get(get_dashboard_page))
        .route(endpoints::ACCOUNTS_VIEW, get(get_accounts_page))
        .route(endpoints::NEW_ACCOUNT_VIEW, get(get_new_account_page))
        .route(endpoints::EDIT_ACCOUNT_VIEW, get(get_edit_account_page))
        .route(endpoints::ACCOUNT_LEDGER_VIEW, get(get_account_ledger_page))
        .route(endpoints::JOURNAL_VIEW, get(get_journal_page))
        .route(endpoints::JOURNAL_CSV, get(get_journal_csv))
        .route(endpoints::NEW_JOURNAL_ENTRY_VIEW, get(get_new_entry_page))
        .route(endpoints::JOURNAL_ENTRY_VIEW, get(get_entry_page))
        .route(endpoints::CONTACTS_VIEW, get(get_contacts_page))
        .route(endpoints::INVOICES_VIEW, get(get_invoices_page))
        .route(endpoints::NEW_INVOICE_VIEW, get(get_new_invoice_page))
        .route(endpoints::INVOICE_VIEW, get(get_invoice_page))
        .route(endpoints::BILLS_VIEW, get(get_bills_page))
        .route(endpoints::NEW_BILL_VIEW, get(get_new_bill_page))
        .route(endpoints::BILL_VIEW, get(get_bill_page))
        .route(endpoints::PRODUCTS_VIEW, get(get_products_page))
        .route(endpoints::NEW_PRODUCT_VIEW, get(get_new_product_page))
        .route(endpoints::EDIT_PRODUCT_VIEW, get(get_edit_product_page))
        .route(endpoints::PRODUCT_VIEW, get(get_product_page))
        .route(endpoints::POS_VIEW, get(get_pos_page))
        .route(endpoints::SALES_VIEW, get(get_sales_page))
        .route(endpoints::SALE_VIEW, get(get_sale_page))
        .route(endpoints::REPORTS_VIEW, get(get_reports_page))
        .route(endpoints::TRIAL_BALANCE_VIEW, get(get_trial_balance_page))
        .route(endpoints::TRIAL_BALANCE_CSV, get(get_trial_balance_csv))
        .route(
            endpoints::INCOME_STATEMENT_VIEW,
            get(get_income_statement_page),
        )
        .route(endpoints::BALANCE_SHEET_VIEW, get(get_balance_sheet_page))
        .route(endpoints::AGING_VIEW, get(get_aging_page))
        .route(endpoints::SETTINGS_VIEW, get(get_settings_page))
        .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard));

    // These routes are called by HTMX or scripts, so auth redirects go through the HX-REDIRECT header.
    let protected_routes = protected_routes.merge(
        Router::new()
            .route(endpoints::ACCOUNTS_API, post(create_account_endpoint))
            .route(
                endpoints::ACCOUNT_API,
                put(edit_account_endpoint).delete(delete_account_endpoint),
            )
            .route(
                endpoints::ARCHIVE_ACCOUNT_API,
                post(archive_account_endpoint),
            )
            .route(endpoints::JOURNAL_API, post(post_journal_entry))
            .route(endpoints::REVERSE_ENTRY_API, post(reverse_entry_endpoint))
            .route(endpoints::CONTACTS_API, post(create_contact_endpoint))
            .route(endpoints::CONTACT_API, delete(delete_contact_endpoint))
            .route(endpoints::INVOICES_API, post(create_invoice_endpoint))
            .route(endpoints::ISSUE_INVOICE_API, post(issue_invoice_endpoint))
            .route(
                endpoints::INVOICE_PAYMENTS_API,
                post(record_invoice_payment_endpoint),
            )
            .route(endpoints::VOID_INVOICE_API, post(void_invoice_endpoint))
            .route(endpoints::BILLS_API, post(create_bill_endpoint))
            .route(endpoints::APPROVE_BILL_API, post(approve_bill_endpoint))
            .route(
                endpoints::BILL_PAYMENTS_API,
                post(record_bill_payment_endpoint),
            )
            .route(endpoints::VOID_BILL_API, post(void_bill_endpoint))
            .route(endpoints::PRODUCTS_API, post(create_product_endpoint))
            .route(endpoints::PRODUCT_LOOKUP_API, get(lookup_product_endpoint))
            .route(endpoints::PRODUCT_API, put(update_product_endpoint))
            .route(
                endpoints::STOCK_ADJUSTMENTS_API,
                post(adjust_stock_endpoint),
            )
            .route(endpoints::POS_QUOTE_API, post(quote_endpoint))
            .route(endpoints::CHECKOUT_API, post(checkout_endpoint))
            .route(endpoints::VOID_SALE_API, post(void_sale_endpoint))
            .route(
                endpoints::ORGANIZATION_API,
                put(rename_organization_endpoint),
            )
            .route(endpoints::CLOSE_PERIOD_API, post(close_period_endpoint))
            .route_layer(middleware::from_fn_with_state(state.clone(), auth_guard_hx)),
    );

    protected_routes
        .merge(unprotected_routes)
        .nest_service(endpoints::STATIC, ServeDir::new("static/"))
        .fallback(get_404_not_found)
        .with_state(state)
}

/// Attempt to get a cup of coffee from the server.
async fn get_coffee() -> Response {
    (StatusCode::IM_A_TEAPOT, Html("I'm a teapot")).into_response()
}

/// The root path '/' redirects to the dashboard page.
async fn get_index_page() -> Redirect {
    Redirect::to(endpoints::DASHBOARD_VIEW)
}


#[cfg(test)]
mod router_tests {
    use axum::http::StatusCode;
    use axum_extra::extract::cookie::Cookie;
    use axum_test::TestServer;
    use rusqlite::Connection;

    use crate::{
        AppState,
        account::ChartTemplate,
        auth::{COOKIE_TOKEN, RegisterForm},
        endpoints,
        pagination::PaginationConfig,
        routing::build_router,
        test_utils::TEST_TIMEZONE,
    };

    const PASSWORD: &str = "Correct-Horse-Battery-Staple-42";

    fn get_test_server() -> TestServer {
        let state = AppState::new(
            Connection::open_in_memory().unwrap(),
            "hunter2 but longer",
            TEST_TIMEZONE,
            PaginationConfig::default(),
        )
        .unwrap();

        TestServer::new(build_router(state))
    }

    async fn register(server: &TestServer, email: &str, template: ChartTemplate) -> Cookie<'static> {
        let response = server
            .post(endpoints::ORGANIZATIONS_API)
            .form(&RegisterForm {
                organization_name: "Corner Store".to_owned(),
                template,
                email: email.to_owned(),
                password: PASSWORD.to_owned(),
                confirm_password: PASSWORD.to_owned(),
            })
            .await;

        response.assert_status(StatusCode::SEE_OTHER);
        response.cookie(COOKIE_TOKEN)
    }

    #[tokio::test]
    async fn protected_pages_redirect_to_log_in() {
        let server = get_test_server();

        let response = server.get(endpoints::REPORTS_VIEW).await;

        response.assert_status(StatusCode::SEE_OTHER);
        let location = response.header("location");
        assert!(
            location
                .to_str()
                .unwrap()
                .starts_with(endpoints::LOG_IN_VIEW)
        );
    }

    #[tokio::test]
    async fn registered_owner_sees_empty_dashboard() {
        let server = get_test_server();
        let cookie = register(&server, "owner@example.com", ChartTemplate::Standard).await;

        let response = server
            .get(endpoints::DASHBOARD_VIEW)
            .add_cookie(cookie)
            .await;

        response.assert_status_ok();
        assert!(response.text().contains("data-empty-state"));
    }

    #[tokio::test]
    async fn every_report_page_renders_for_new_books() {
        let server = get_test_server();
        let cookie = register(&server, "owner@example.com", ChartTemplate::Retail).await;

        for endpoint in [
            endpoints::ACCOUNTS_VIEW,
            endpoints::JOURNAL_VIEW,
            endpoints::INVOICES_VIEW,
            endpoints::BILLS_VIEW,
            endpoints::PRODUCTS_VIEW,
            endpoints::POS_VIEW,
            endpoints::SALES_VIEW,
            endpoints::REPORTS_VIEW,
            endpoints::TRIAL_BALANCE_VIEW,
            endpoints::INCOME_STATEMENT_VIEW,
            endpoints::BALANCE_SHEET_VIEW,
            endpoints::AGING_VIEW,
            endpoints::SETTINGS_VIEW,
        ] {
            let response = server.get(endpoint).add_cookie(cookie.clone()).await;

            assert_eq!(
                response.status_code(),
                StatusCode::OK,
                "{endpoint} did not render"
            );
        }
    }

    #[tokio::test]
    async fn product_lookup_is_routed_before_product_id() {
        let server = get_test_server();
        let cookie = register(&server, "owner@example.com", ChartTemplate::Retail).await;

        let response = server
            .get(endpoints::PRODUCT_LOOKUP_API)
            .add_query_param("code", "no-such-code")
            .add_cookie(cookie)
            .await;

        response.assert_status_not_found();
        assert!(response.text().contains("error"));
    }

    #[tokio::test]
    async fn unknown_route_renders_not_found() {
        let server = get_test_server();

        let response = server.get("/definitely/not/here").await;

        response.assert_status_not_found();
    }

    #[tokio::test]
    async fn coffee_is_not_served() {
        let server = get_test_server();

        let response = server.get(endpoints::COFFEE).await;

        response.assert_status(StatusCode::IM_A_TEAPOT);
    }
}
