//! Register sales: carts, tenders, checkout and voids.

use std::collections::BTreeMap;

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    account::{AccountRole, get_account_by_role},
    document::{format_number, next_sequence},
    ledger::{EntrySource, JournalEntryId, NewJournalEntry, insert_entry, insert_reversal},
    money::Money,
    organization::{OrganizationId, Tenant},
    sql_enum::sql_text_enum,
    stock::{MovementKind, ProductId, get_product, insert_movement},
};

pub type SaleId = i64;

/// The prefix of sale numbers, e.g. POS-000001.
pub const SALE_NUMBER_PREFIX: &str = "POS";

/// A product in the cart.
#[derive(Debug, Clone, PartialEq)]
pub struct CartLine {
    pub product_id: ProductId,
    pub quantity: i64,
    pub unit_price: Money,
    /// An amount taken off the whole line, not per unit.
    pub discount: Money,
}

impl CartLine {
    /// The line amount before the discount.
    pub fn gross(&self) -> Result<Money, Error> {
        self.unit_price.times(self.quantity)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Cart {
    pub lines: Vec<CartLine>,
    pub tax_rate_bps: u32,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CartTotals {
    /// The sum of the line amounts before discounts.
    pub subtotal: Money,
    pub discount: Money,
    /// The subtotal less discounts, which tax is charged on.
    pub taxable: Money,
    pub tax: Money,
    pub total: Money,
}

impl Cart {
    /// Price the cart.
    ///
    /// # Errors
    ///
    /// - [Error::InvalidQuantity] if a line quantity is not positive.
    /// - [Error::InvalidAmount] if a price is negative, a discount is
    ///   negative or more than the line amount, or the totals overflow.
    /// - [Error::InvalidDocument] if the tax rate is over 100%.
    pub fn totals(&self) -> Result<CartTotals, Error> {
        if self.tax_rate_bps > 10_000 {
            return Err(Error::InvalidDocument(
                "the tax rate cannot be more than 100%".to_owned(),
            ));
        }

        let mut subtotal = Money::ZERO;
        let mut discount = Money::ZERO;

        for line in &self.lines {
            if line.quantity <= 0 {
                return Err(Error::InvalidQuantity);
            }
            if line.unit_price.is_negative() {
                return Err(Error::InvalidAmount(line.unit_price.to_string()));
            }

            let gross = line.gross()?;
            if line.discount.is_negative() || line.discount > gross {
                return Err(Error::InvalidAmount(line.discount.to_string()));
            }

            subtotal = subtotal.checked_add(gross)?;
            discount = discount.checked_add(line.discount)?;
        }

        let taxable = subtotal.checked_sub(discount)?;
        let tax = taxable.percent_bps(self.tax_rate_bps);
        let total = taxable.checked_add(tax)?;

        Ok(CartTotals {
            subtotal,
            discount,
            taxable,
            tax,
            total,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenderMethod {
    Cash,
    Card,
}

impl TenderMethod {
    pub const ALL: [TenderMethod; 2] = [TenderMethod::Cash, TenderMethod::Card];

    pub fn as_str(&self) -> &'static str {
        match self {
            TenderMethod::Cash => "cash",
            TenderMethod::Card => "card",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            TenderMethod::Cash => "Cash",
            TenderMethod::Card => "Card",
        }
    }
}

sql_text_enum!(TenderMethod);

/// A payment handed over at the register.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Tender {
    pub method: TenderMethod,
    pub amount: Money,
}

/// How the tenders of a sale cover its total.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Settlement {
    pub cash: Money,
    pub card: Money,
    pub change: Money,
}

impl Settlement {
    /// The cash kept after giving change.
    pub fn cash_kept(&self) -> Money {
        self.cash - self.change
    }
}

/// Check that `tenders` pay `total` and work out the change.
///
/// # Errors
///
/// - [Error::InvalidAmount] if a tender is not positive or the tenders
///   overflow when summed.
/// - [Error::InsufficientPayment] if the tenders do not cover the total.
/// - [Error::CardOverpayment] if the change is more than the cash tendered.
pub fn settle_tenders(total: Money, tenders: &[Tender]) -> Result<Settlement, Error> {
    let mut settlement = Settlement::default();

    for tender in tenders {
        if !tender.amount.is_positive() {
            return Err(Error::InvalidAmount(tender.amount.to_string()));
        }

        match tender.method {
            TenderMethod::Cash => settlement.cash = settlement.cash.checked_add(tender.amount)?,
            TenderMethod::Card => settlement.card = settlement.card.checked_add(tender.amount)?,
        }
    }

    let tendered = settlement.cash.checked_add(settlement.card)?;
    if tendered < total {
        return Err(Error::InsufficientPayment { total, tendered });
    }

    settlement.change = tendered - total;
    if settlement.change > settlement.cash {
        return Err(Error::CardOverpayment);
    }

    Ok(settlement)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleStatus {
    Completed,
    Voided,
}

impl SaleStatus {
    pub const ALL: [SaleStatus; 2] = [SaleStatus::Completed, SaleStatus::Voided];

    pub fn as_str(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "completed",
            SaleStatus::Voided => "voided",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            SaleStatus::Completed => "Completed",
            SaleStatus::Voided => "Voided",
        }
    }
}

sql_text_enum!(SaleStatus);

/// A sold line, with the product name and cost as they were at the time of sale.
#[derive(Debug, Clone, PartialEq)]
pub struct SaleLine {
    pub product_id: ProductId,
    pub product_name: String,
    pub quantity: i64,
    pub unit_price: Money,
    pub discount: Money,
    pub unit_cost: Money,
}

impl SaleLine {
    pub fn amount(&self) -> Money {
        self.unit_price
            .times(self.quantity)
            .map(|gross| gross - self.discount)
            .unwrap_or(Money::ZERO)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Sale {
    pub id: SaleId,
    pub organization_id: OrganizationId,
    /// The display number, e.g. POS-000001.
    pub number: String,
    pub date: Date,
    pub tax_rate_bps: u32,
    pub totals: CartTotals,
    pub change: Money,
    pub status: SaleStatus,
    pub journal_entry_id: Option<JournalEntryId>,
    pub lines: Vec<SaleLine>,
    pub tenders: Vec<Tender>,
}

pub fn create_sale_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS sale (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL REFERENCES organization(id) ON DELETE CASCADE,
            sequence INTEGER NOT NULL,
            date TEXT NOT NULL,
            tax_rate_bps INTEGER NOT NULL,
            subtotal INTEGER NOT NULL,
            discount INTEGER NOT NULL,
            taxable INTEGER NOT NULL,
            tax INTEGER NOT NULL,
            total INTEGER NOT NULL,
            change_given INTEGER NOT NULL,
            status TEXT NOT NULL,
            journal_entry_id INTEGER REFERENCES journal_entry(id),
            UNIQUE(organization_id, sequence)
        );

        CREATE TABLE IF NOT EXISTS sale_line (
            id INTEGER PRIMARY KEY,
            sale_id INTEGER NOT NULL REFERENCES sale(id) ON DELETE CASCADE,
            product_id INTEGER NOT NULL REFERENCES product(id),
            product_name TEXT NOT NULL,
            quantity INTEGER NOT NULL,
            unit_price INTEGER NOT NULL,
            discount INTEGER NOT NULL,
            unit_cost INTEGER NOT NULL
        );

        CREATE TABLE IF NOT EXISTS sale_tender (
            id INTEGER PRIMARY KEY,
            sale_id INTEGER NOT NULL REFERENCES sale(id) ON DELETE CASCADE,
            method TEXT NOT NULL,
            amount INTEGER NOT NULL
        );

        CREATE INDEX IF NOT EXISTS idx_sale_organization_date ON sale(organization_id, date);
        CREATE INDEX IF NOT EXISTS idx_sale_line_sale ON sale_line(sale_id);
        CREATE INDEX IF NOT EXISTS idx_sale_tender_sale ON sale_tender(sale_id);",
    )
}

/// Complete a sale: take the stock, store the sale and post it to the ledger.
///
/// The entry debits cash (less change) and card clearing, credits sales
/// revenue with the taxable amount and sales tax with the tax, and moves the
/// cost of the goods from inventory to cost of goods sold.
///
/// # Errors
///
/// - [Error::EmptyCart] if the cart has no lines.
/// - Any error from [Cart::totals] or [settle_tenders].
/// - [Error::InvalidDocument] if the total is zero or a product is archived.
/// - [Error::NotFound] if a product does not exist in the organization.
/// - [Error::InsufficientStock] if there are not enough of a product on hand.
/// - [Error::MissingAccountRole] if an account the sale posts to is not set up.
/// - [Error::PeriodLocked] if `date` is in a closed period.
pub fn checkout(
    tenant: Tenant,
    cart: &Cart,
    tenders: &[Tender],
    date: Date,
    connection: &Connection,
) -> Result<Sale, Error> {
    let organization_id = tenant.organization_id;

    if cart.lines.is_empty() {
        return Err(Error::EmptyCart);
    }

    let totals = cart.totals()?;
    if !totals.total.is_positive() {
        return Err(Error::InvalidDocument(
            "a sale must have a total greater than zero".to_owned(),
        ));
    }
    let settlement = settle_tenders(totals.total, tenders)?;

    let mut products = Vec::with_capacity(cart.lines.len());
    for line in &cart.lines {
        let product = get_product(organization_id, line.product_id, connection)?;
        if product.archived {
            return Err(Error::InvalidDocument(format!(
                "{} is archived and cannot be sold",
                product.name
            )));
        }
        products.push(product);
    }

    let mut cost = Money::ZERO;
    for (line, product) in cart.lines.iter().zip(&products) {
        cost = cost.checked_add(product.unit_cost.times(line.quantity)?)?;
    }

    let transaction = connection.unchecked_transaction()?;
    let sequence = next_sequence("sale", organization_id, &transaction)?;
    let number = format_number(SALE_NUMBER_PREFIX, sequence);

    transaction.execute(
        "INSERT INTO sale (organization_id, sequence, date, tax_rate_bps, subtotal, discount,
            taxable, tax, total, change_given, status)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
        (
            organization_id,
            sequence,
            date,
            cart.tax_rate_bps,
            totals.subtotal,
            totals.discount,
            totals.taxable,
            totals.tax,
            totals.total,
            settlement.change,
            SaleStatus::Completed,
        ),
    )?;
    let sale_id = transaction.last_insert_rowid();

    let role_account = |role: AccountRole, amount: Money| -> Result<Option<i64>, Error> {
        if amount.is_zero() {
            Ok(None)
        } else {
            get_account_by_role(organization_id, role, &transaction).map(|account| Some(account.id))
        }
    };

    let mut new_entry =
        NewJournalEntry::new(date, &format!("Sale {number}"), EntrySource::Sale).source_id(sale_id);
    if let Some(cash) = role_account(AccountRole::Cash, settlement.cash_kept())? {
        new_entry = new_entry.debit(cash, settlement.cash_kept(), "Cash");
    }
    if let Some(card) = role_account(AccountRole::CardClearing, settlement.card)? {
        new_entry = new_entry.debit(card, settlement.card, "Card");
    }
    if let Some(revenue) = role_account(AccountRole::SalesRevenue, totals.taxable)? {
        new_entry = new_entry.credit(revenue, totals.taxable, "");
    }
    if let Some(tax) = role_account(AccountRole::SalesTaxPayable, totals.tax)? {
        new_entry = new_entry.credit(tax, totals.tax, "Sales tax");
    }
    if let Some(cogs) = role_account(AccountRole::CostOfGoodsSold, cost)? {
        let inventory = get_account_by_role(organization_id, AccountRole::Inventory, &transaction)?;
        new_entry = new_entry
            .debit(cogs, cost, "")
            .credit(inventory.id, cost, "");
    }
    let entry = insert_entry(tenant, new_entry, &transaction)?;

    transaction.execute(
        "UPDATE sale SET journal_entry_id = ?1 WHERE id = ?2",
        (entry.id, sale_id),
    )?;

    let mut lines = Vec::with_capacity(cart.lines.len());
    for (line, product) in cart.lines.iter().zip(products) {
        transaction.execute(
            "INSERT INTO sale_line
                (sale_id, product_id, product_name, quantity, unit_price, discount, unit_cost)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                sale_id,
                product.id,
                &product.name,
                line.quantity,
                line.unit_price,
                line.discount,
                product.unit_cost,
            ),
        )?;
        insert_movement(
            &product,
            -line.quantity,
            date,
            MovementKind::Sale,
            &number,
            Some(entry.id),
            &transaction,
        )?;

        lines.push(SaleLine {
            product_id: product.id,
            product_name: product.name,
            quantity: line.quantity,
            unit_price: line.unit_price,
            discount: line.discount,
            unit_cost: product.unit_cost,
        });
    }

    for tender in tenders {
        transaction.execute(
            "INSERT INTO sale_tender (sale_id, method, amount) VALUES (?1, ?2, ?3)",
            (sale_id, tender.method, tender.amount),
        )?;
    }

    transaction.commit()?;

    tracing::info!(
        "Completed sale {number} of {} for organization {organization_id}",
        totals.total
    );

    Ok(Sale {
        id: sale_id,
        organization_id,
        number,
        date,
        tax_rate_bps: cart.tax_rate_bps,
        totals,
        change: settlement.change,
        status: SaleStatus::Completed,
        journal_entry_id: Some(entry.id),
        lines,
        tenders: tenders.to_vec(),
    })
}

/// Void a completed sale, reversing its entry and putting the stock back.
///
/// The reversal is dated `date`, or the sale date if that is later.
///
/// # Errors
///
/// - [Error::NotFound] if the sale does not exist in the organization.
/// - [Error::InvalidStatus] if the sale is already voided.
/// - [Error::PeriodLocked] if the reversal date is in a closed period.
pub fn void_sale(
    tenant: Tenant,
    sale_id: SaleId,
    date: Date,
    connection: &Connection,
) -> Result<Sale, Error> {
    let organization_id = tenant.organization_id;
    let sale = get_sale(organization_id, sale_id, connection)?;

    if sale.status != SaleStatus::Completed {
        return Err(Error::InvalidStatus {
            action: "void",
            status: sale.status.label().to_lowercase(),
        });
    }

    let date = date.max(sale.date);
    let transaction = connection.unchecked_transaction()?;

    let reversal_id = match sale.journal_entry_id {
        Some(entry_id) => {
            let memo = format!("Void sale {}", sale.number);
            Some(insert_reversal(tenant, entry_id, date, Some(&memo), &transaction)?.id)
        }
        None => None,
    };

    for line in &sale.lines {
        let product = get_product(organization_id, line.product_id, &transaction)?;
        insert_movement(
            &product,
            line.quantity,
            date,
            MovementKind::SaleVoid,
            &sale.number,
            reversal_id,
            &transaction,
        )?;
    }

    let rows_affected = transaction.execute(
        "UPDATE sale SET status = ?1 WHERE id = ?2 AND organization_id = ?3 AND status = ?4",
        (
            SaleStatus::Voided,
            sale.id,
            organization_id,
            SaleStatus::Completed,
        ),
    )?;
    if rows_affected == 0 {
        return Err(Error::InvalidStatus {
            action: "void",
            status: SaleStatus::Voided.label().to_lowercase(),
        });
    }
    transaction.commit()?;

    tracing::info!("Voided sale {} for organization {organization_id}", sale.number);

    Ok(Sale {
        status: SaleStatus::Voided,
        ..sale
    })
}

const SALE_COLUMNS: &str = "id, organization_id, sequence, date, tax_rate_bps, subtotal, \
    discount, taxable, tax, total, change_given, status, journal_entry_id";

fn map_row_to_sale(row: &Row) -> Result<Sale, rusqlite::Error> {
    Ok(Sale {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        number: format_number(SALE_NUMBER_PREFIX, row.get(2)?),
        date: row.get(3)?,
        tax_rate_bps: row.get(4)?,
        totals: CartTotals {
            subtotal: row.get(5)?,
            discount: row.get(6)?,
            taxable: row.get(7)?,
            tax: row.get(8)?,
            total: row.get(9)?,
        },
        change: row.get(10)?,
        status: row.get(11)?,
        journal_entry_id: row.get(12)?,
        lines: Vec::new(),
        tenders: Vec::new(),
    })
}

/// Get a sale with its lines and tenders.
pub fn get_sale(
    organization_id: OrganizationId,
    sale_id: SaleId,
    connection: &Connection,
) -> Result<Sale, Error> {
    let mut sale = connection.query_row(
        &format!("SELECT {SALE_COLUMNS} FROM sale WHERE id = ?1 AND organization_id = ?2"),
        (sale_id, organization_id),
        map_row_to_sale,
    )?;

    sale.lines = connection
        .prepare(
            "SELECT product_id, product_name, quantity, unit_price, discount, unit_cost
            FROM sale_line WHERE sale_id = ?1 ORDER BY id",
        )?
        .query_map((sale.id,), |row| {
            Ok(SaleLine {
                product_id: row.get(0)?,
                product_name: row.get(1)?,
                quantity: row.get(2)?,
                unit_price: row.get(3)?,
                discount: row.get(4)?,
                unit_cost: row.get(5)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    sale.tenders = connection
        .prepare("SELECT method, amount FROM sale_tender WHERE sale_id = ?1 ORDER BY id")?
        .query_map((sale.id,), |row| {
            Ok(Tender {
                method: row.get(0)?,
                amount: row.get(1)?,
            })
        })?
        .collect::<Result<Vec<_>, _>>()?;

    Ok(sale)
}

/// The organization's sales, newest first. Lines and tenders are not loaded.
pub fn list_sales(
    organization_id: OrganizationId,
    connection: &Connection,
) -> Result<Vec<Sale>, Error> {
    connection
        .prepare(&format!(
            "SELECT {SALE_COLUMNS} FROM sale
            WHERE organization_id = ?1
            ORDER BY date DESC, sequence DESC"
        ))?
        .query_map((organization_id,), map_row_to_sale)?
        .map(|maybe_sale| maybe_sale.map_err(Error::from))
        .collect()
}

/// The completed sales of one day.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DailySales {
    pub date: Date,
    pub count: usize,
    pub total: Money,
}

/// Total the completed sales by day, newest day first. Voided sales are left out.
pub fn daily_sales_totals(sales: &[Sale]) -> Vec<DailySales> {
    let mut by_date: BTreeMap<Date, DailySales> = BTreeMap::new();

    for sale in sales
        .iter()
        .filter(|sale| sale.status == SaleStatus::Completed)
    {
        let day = by_date.entry(sale.date).or_insert(DailySales {
            date: sale.date,
            count: 0,
            total: Money::ZERO,
        });
        day.count += 1;
        day.total += sale.totals.total;
    }

    by_date.into_values().rev().collect()
}

#[cfg(test)]
mod cart_tests {
    use crate::{
        Error,
        money::Money,
        pos::{Cart, CartLine, CartTotals},
    };

    fn line(quantity: i64, unit_price: i64, discount: i64) -> CartLine {
        CartLine {
            product_id: 1,
            quantity,
            unit_price: Money::from_dollars(unit_price),
            discount: Money::from_dollars(discount),
        }
    }

    #[test]
    fn totals_apply_discount_before_tax() {
        let cart = Cart {
            lines: vec![line(2, 10, 5), line(1, 30, 0)],
            tax_rate_bps: 1500,
        };

        assert_eq!(
            cart.totals(),
            Ok(CartTotals {
                subtotal: Money::from_dollars(50),
                discount: Money::from_dollars(5),
                taxable: Money::from_dollars(45),
                tax: Money::from_cents(675),
                total: Money::from_cents(5175),
            })
        );
    }

    #[test]
    fn discount_larger_than_line_is_rejected() {
        let cart = Cart {
            lines: vec![line(1, 10, 11)],
            tax_rate_bps: 0,
        };

        assert!(matches!(cart.totals(), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn zero_quantity_is_rejected() {
        let cart = Cart {
            lines: vec![line(0, 10, 0)],
            tax_rate_bps: 0,
        };

        assert_eq!(cart.totals(), Err(Error::InvalidQuantity));
    }

    #[test]
    fn oversized_line_is_rejected() {
        let huge = CartLine {
            product_id: 1,
            quantity: 1,
            unit_price: Money::from_cents(i64::MAX),
            discount: Money::ZERO,
        };
        let cart = Cart {
            lines: vec![huge.clone(), huge],
            tax_rate_bps: 0,
        };

        assert!(matches!(cart.totals(), Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn empty_cart_totals_zero() {
        assert_eq!(Cart::default().totals(), Ok(CartTotals::default()));
    }
}

#[cfg(test)]
mod settle_tenders_tests {
    use crate::{
        Error,
        money::Money,
        pos::{Settlement, Tender, TenderMethod, settle_tenders},
    };

    fn cash(dollars: i64) -> Tender {
        Tender {
            method: TenderMethod::Cash,
            amount: Money::from_dollars(dollars),
        }
    }

    fn card(dollars: i64) -> Tender {
        Tender {
            method: TenderMethod::Card,
            amount: Money::from_dollars(dollars),
        }
    }

    #[test]
    fn cash_gives_change() {
        let got = settle_tenders(Money::from_dollars(17), &[cash(20)]);

        assert_eq!(
            got,
            Ok(Settlement {
                cash: Money::from_dollars(20),
                card: Money::ZERO,
                change: Money::from_dollars(3),
            })
        );
    }

    #[test]
    fn split_tender_covers_total() {
        let settlement = settle_tenders(Money::from_dollars(50), &[card(30), cash(25)]).unwrap();

        assert_eq!(settlement.change, Money::from_dollars(5));
        assert_eq!(settlement.cash_kept(), Money::from_dollars(20));
    }

    #[test]
    fn short_payment_is_rejected() {
        let got = settle_tenders(Money::from_dollars(50), &[cash(20), card(20)]);

        assert_eq!(
            got,
            Err(Error::InsufficientPayment {
                total: Money::from_dollars(50),
                tendered: Money::from_dollars(40),
            })
        );
    }

    #[test]
    fn card_cannot_produce_change() {
        let got = settle_tenders(Money::from_dollars(50), &[card(45), cash(2), card(10)]);

        assert_eq!(got, Err(Error::CardOverpayment));
    }

    #[test]
    fn overflowing_tenders_are_rejected() {
        let huge = Tender {
            method: TenderMethod::Card,
            amount: Money::from_cents(i64::MAX),
        };

        let got = settle_tenders(Money::from_dollars(10), &[huge, huge]);

        assert!(matches!(got, Err(Error::InvalidAmount(_))));
    }

    #[test]
    fn zero_tender_is_rejected() {
        let got = settle_tenders(Money::ZERO, &[cash(0)]);

        assert!(matches!(got, Err(Error::InvalidAmount(_))));
    }
}

#[cfg(test)]
pub(crate) mod test_sales {
    use time::{Date, macros::date};

    use crate::{
        money::Money,
        pos::{Cart, CartLine, Sale, Tender, TenderMethod, checkout},
        stock::Product,
        test_utils::TestBooks,
    };

    pub(crate) const SALE_DATE: Date = date!(2025 - 02 - 14);

    /// Sell `quantity` of `product` at its price with no tax, paid in cash.
    pub(crate) fn cash_sale(books: &TestBooks, product: &Product, quantity: i64) -> Sale {
        let cart = Cart {
            lines: vec![CartLine {
                product_id: product.id,
                quantity,
                unit_price: product.unit_price,
                discount: Money::ZERO,
            }],
            tax_rate_bps: 0,
        };
        let total = cart.totals().unwrap().total;

        checkout(
            books.tenant,
            &cart,
            &[Tender {
                method: TenderMethod::Cash,
                amount: total,
            }],
            SALE_DATE,
            &books.connection,
        )
        .unwrap()
    }
}

#[cfg(test)]
mod checkout_tests {
    use time::macros::date;

    use crate::{
        Error,
        ledger::{EntryStatus, get_entry},
        money::Money,
        pos::{
            Cart, CartLine, SaleStatus, Tender, TenderMethod, checkout, daily_sales_totals,
            get_sale, list_sales, void_sale,
        },
        stock::{MovementKind, get_product, list_movements, test_products::stocked_product},
        test_utils::{TestBooks, account_by_code},
    };

    use super::test_sales::{SALE_DATE, cash_sale};

    fn tender(method: TenderMethod, cents: i64) -> Tender {
        Tender {
            method,
            amount: Money::from_cents(cents),
        }
    }

    #[test]
    fn split_tender_sale_posts_every_leg() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 10);
        // 3 × $10 less $2 discount = $28 taxable, 15% tax = $4.20, total $32.20.
        let cart = Cart {
            lines: vec![CartLine {
                product_id: product.id,
                quantity: 3,
                unit_price: product.unit_price,
                discount: Money::from_dollars(2),
            }],
            tax_rate_bps: 1500,
        };
        let tenders = [
            tender(TenderMethod::Card, 2000),
            tender(TenderMethod::Cash, 1500),
        ];

        let sale = checkout(books.tenant, &cart, &tenders, SALE_DATE, &books.connection).unwrap();

        assert_eq!(sale.number, "POS-000001");
        assert_eq!(sale.totals.total, Money::from_cents(3220));
        assert_eq!(sale.change, Money::from_cents(280));
        let entry = get_entry(
            books.organization_id(),
            sale.journal_entry_id.unwrap(),
            &books.connection,
        )
        .unwrap();
        let postings: Vec<_> = entry
            .lines
            .iter()
            .map(|line| (line.account_id, line.debit, line.credit))
            .collect();
        assert_eq!(
            postings,
            [
                (account_by_code(&books, "1010").id, Money::from_cents(1220), Money::ZERO),
                (account_by_code(&books, "1030").id, Money::from_cents(2000), Money::ZERO),
                (account_by_code(&books, "4000").id, Money::ZERO, Money::from_cents(2800)),
                (account_by_code(&books, "2100").id, Money::ZERO, Money::from_cents(420)),
                (account_by_code(&books, "5000").id, Money::from_dollars(12), Money::ZERO),
                (account_by_code(&books, "1200").id, Money::ZERO, Money::from_dollars(12)),
            ]
        );
        assert_eq!(
            get_product(books.organization_id(), product.id, &books.connection)
                .unwrap()
                .quantity_on_hand,
            7
        );
        assert_eq!(
            get_sale(books.organization_id(), sale.id, &books.connection),
            Ok(sale)
        );
    }

    #[test]
    fn overselling_rolls_back_everything() {
        let books = TestBooks::retail();
        let plenty = stocked_product(&books, "A1", 10);
        let scarce = stocked_product(&books, "B1", 1);
        let cart = Cart {
            lines: vec![
                CartLine {
                    product_id: plenty.id,
                    quantity: 2,
                    unit_price: plenty.unit_price,
                    discount: Money::ZERO,
                },
                CartLine {
                    product_id: scarce.id,
                    quantity: 2,
                    unit_price: scarce.unit_price,
                    discount: Money::ZERO,
                },
            ],
            tax_rate_bps: 0,
        };

        let got = checkout(
            books.tenant,
            &cart,
            &[tender(TenderMethod::Cash, 4000)],
            SALE_DATE,
            &books.connection,
        );

        assert_eq!(
            got,
            Err(Error::InsufficientStock {
                product: "Product B1".to_owned(),
                available: 1
            })
        );
        assert!(list_sales(books.organization_id(), &books.connection).unwrap().is_empty());
        assert_eq!(
            get_product(books.organization_id(), plenty.id, &books.connection)
                .unwrap()
                .quantity_on_hand,
            10
        );
    }

    #[test]
    fn empty_cart_is_rejected() {
        let books = TestBooks::retail();

        let got = checkout(
            books.tenant,
            &Cart::default(),
            &[tender(TenderMethod::Cash, 100)],
            SALE_DATE,
            &books.connection,
        );

        assert_eq!(got, Err(Error::EmptyCart));
    }

    #[test]
    fn other_organizations_product_is_not_found() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 5);
        let other = books.other_tenant();
        let cart = Cart {
            lines: vec![CartLine {
                product_id: product.id,
                quantity: 1,
                unit_price: product.unit_price,
                discount: Money::ZERO,
            }],
            tax_rate_bps: 0,
        };

        let got = checkout(
            other,
            &cart,
            &[tender(TenderMethod::Cash, 1000)],
            SALE_DATE,
            &books.connection,
        );

        assert_eq!(got, Err(Error::NotFound));
    }

    #[test]
    fn void_reverses_entry_and_restores_stock() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 5);
        let sale = cash_sale(&books, &product, 2);

        let voided =
            void_sale(books.tenant, sale.id, date!(2025 - 02 - 15), &books.connection).unwrap();

        assert_eq!(voided.status, SaleStatus::Voided);
        let entry = get_entry(
            books.organization_id(),
            sale.journal_entry_id.unwrap(),
            &books.connection,
        )
        .unwrap();
        assert_eq!(entry.status, EntryStatus::Reversed);
        assert_eq!(
            get_product(books.organization_id(), product.id, &books.connection)
                .unwrap()
                .quantity_on_hand,
            5
        );
        let kinds: Vec<_> = list_movements(books.organization_id(), product.id, &books.connection)
            .unwrap()
            .into_iter()
            .map(|movement| movement.kind)
            .collect();
        assert_eq!(
            kinds,
            [MovementKind::SaleVoid, MovementKind::Sale, MovementKind::Adjustment]
        );
    }

    #[test]
    fn void_twice_is_rejected() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 5);
        let sale = cash_sale(&books, &product, 1);
        void_sale(books.tenant, sale.id, SALE_DATE, &books.connection).unwrap();

        let got = void_sale(books.tenant, sale.id, SALE_DATE, &books.connection);

        assert!(matches!(got, Err(Error::InvalidStatus { action: "void", .. })));
    }

    #[test]
    fn daily_totals_skip_voided_sales() {
        let books = TestBooks::retail();
        let product = stocked_product(&books, "A1", 10);
        cash_sale(&books, &product, 1);
        cash_sale(&books, &product, 2);
        let voided = cash_sale(&books, &product, 3);
        void_sale(books.tenant, voided.id, SALE_DATE, &books.connection).unwrap();
        let sales = list_sales(books.organization_id(), &books.connection).unwrap();

        let got = daily_sales_totals(&sales);

        assert_eq!(got.len(), 1);
        assert_eq!(got[0].count, 2);
        assert_eq!(got[0].total, Money::from_dollars(30));
    }
}
