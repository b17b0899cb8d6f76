//! Seeds a demo shop so the app has something to show straight away.

use rusqlite::Connection;
use time::{Date, Duration};

use crate::{
    Error,
    account::{AccountRole, ChartTemplate, get_account_by_role, list_accounts},
    auth::{PasswordHash, create_user},
    bill::{BillLine, NewBill, approve_bill, create_bill},
    contact::{ContactKind, create_contact},
    invoice::{NewInvoice, NewInvoiceLine, create_invoice, issue_invoice, record_invoice_payment},
    ledger::{EntrySource, NewJournalEntry, post_entry},
    money::Money,
    organization::{Tenant, create_organization},
    pos::{Cart, CartLine, Tender, TenderMethod, checkout},
    stock::{ProductDetails, adjust_stock, create_product},
};

/// The name of the organization [create_demo_books] creates.
pub const DEMO_ORGANIZATION_NAME: &str = "Corner Store";

fn product(sku: &str, name: &str, price_cents: i64, cost_cents: i64) -> ProductDetails {
    ProductDetails {
        sku: sku.to_owned(),
        barcode: Some(format!("9400000{sku}")),
        name: name.to_owned(),
        unit_price: Money::from_cents(price_cents),
        unit_cost: Money::from_cents(cost_cents),
        archived: false,
    }
}

/// Create a retail organization owned by `email`, with opening capital,
/// stocked products, an invoice, a bill and a register sale dated in the
/// weeks before `today`.
pub fn create_demo_books(
    email: &str,
    password_hash: PasswordHash,
    today: Date,
    connection: &Connection,
) -> Result<Tenant, Error> {
    let organization = create_organization(DEMO_ORGANIZATION_NAME, ChartTemplate::Retail, connection)?;
    let user = create_user(organization.id, email, password_hash, connection)?;
    let tenant = Tenant {
        user_id: user.id,
        organization_id: organization.id,
    };
    let organization_id = organization.id;
    let account = |role| get_account_by_role(organization_id, role, connection);
    let opening_date = today - Duration::days(60);

    post_entry(
        tenant,
        NewJournalEntry::new(opening_date, "Opening capital", EntrySource::Manual)
            .debit(account(AccountRole::Bank)?.id, Money::from_dollars(5_000), "")
            .credit(account(AccountRole::OwnerEquity)?.id, Money::from_dollars(5_000), ""),
        connection,
    )?;

    let beans = create_product(
        organization_id,
        product("1001", "Coffee beans 1kg", 3_200, 1_800),
        connection,
    )?;
    let mug = create_product(organization_id, product("1002", "Mug", 1_500, 600), connection)?;
    create_product(organization_id, product("1003", "Tea tin", 1_200, 500), connection)?;
    for (product, quantity) in [(&beans, 40), (&mug, 24)] {
        adjust_stock(tenant, product.id, quantity, opening_date, "Opening stock", connection)?;
    }

    let customer = create_contact(
        organization_id,
        "Harbour Cafe",
        Some("accounts@harbourcafe.example"),
        ContactKind::Customer,
        connection,
    )?;
    let invoice_date = today - Duration::days(45);
    let invoice = create_invoice(
        organization_id,
        NewInvoice {
            customer_id: customer.id,
            issue_date: invoice_date,
            due_date: invoice_date + Duration::days(30),
            tax_rate_bps: 1500,
            lines: vec![NewInvoiceLine {
                description: "Wholesale coffee beans".to_owned(),
                quantity: 10,
                unit_price: Money::from_dollars(28),
                account_id: account(AccountRole::SalesRevenue)?.id,
            }],
        },
        connection,
    )?;
    issue_invoice(tenant, invoice.id, connection)?;
    record_invoice_payment(
        tenant,
        invoice.id,
        Money::from_dollars(150),
        invoice_date + Duration::days(14),
        account(AccountRole::Bank)?.id,
        connection,
    )?;

    let vendor = create_contact(organization_id, "City Property", None, ContactKind::Vendor, connection)?;
    let rent = list_accounts(organization_id, connection)?
        .into_iter()
        .find(|account| account.code.as_str() == "6100")
        .ok_or(Error::NotFound)?;
    let bill_date = today - Duration::days(20);
    let bill = create_bill(
        organization_id,
        NewBill {
            vendor_id: vendor.id,
            reference: "CP-2041".to_owned(),
            bill_date,
            due_date: bill_date + Duration::days(14),
            lines: vec![BillLine {
                description: "Shop rent".to_owned(),
                amount: Money::from_dollars(1_200),
                account_id: rent.id,
            }],
        },
        connection,
    )?;
    approve_bill(tenant, bill.id, connection)?;

    let cart = Cart {
        lines: vec![
            CartLine {
                product_id: beans.id,
                quantity: 2,
                unit_price: beans.unit_price,
                discount: Money::ZERO,
            },
            CartLine {
                product_id: mug.id,
                quantity: 1,
                unit_price: mug.unit_price,
                discount: Money::from_dollars(3),
            },
        ],
        tax_rate_bps: 1500,
    };
    let total = cart.totals()?.total;
    checkout(
        tenant,
        &cart,
        &[Tender {
            method: TenderMethod::Card,
            amount: total,
        }],
        today - Duration::days(2),
        connection,
    )?;

    tracing::info!("Created demo books for organization {organization_id}");

    Ok(tenant)
}
