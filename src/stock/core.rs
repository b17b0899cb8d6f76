//! Products and the movements that change how many are on hand.

use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};
use time::Date;

use crate::{
    Error,
    account::{AccountRole, get_account_by_role},
    error::is_unique_violation,
    ledger::{EntrySource, JournalEntryId, NewJournalEntry, insert_entry},
    money::Money,
    organization::{OrganizationId, Tenant, ensure_period_open},
    sql_enum::sql_text_enum,
};

pub type ProductId = i64;
pub type StockMovementId = i64;

/// A product that can be sold at the register.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Product {
    pub id: ProductId,
    pub organization_id: OrganizationId,
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub unit_price: Money,
    pub unit_cost: Money,
    pub quantity_on_hand: i64,
    /// Archived products stay in history but cannot be sold.
    pub archived: bool,
}

impl Product {
    /// The value of the stock on hand at cost.
    pub fn stock_value(&self) -> Result<Money, Error> {
        self.unit_cost.times(self.quantity_on_hand)
    }
}

/// The user editable fields of a product.
#[derive(Debug, Clone, PartialEq)]
pub struct ProductDetails {
    pub sku: String,
    pub barcode: Option<String>,
    pub name: String,
    pub unit_price: Money,
    pub unit_cost: Money,
    pub archived: bool,
}

impl ProductDetails {
    fn validated(self) -> Result<Self, Error> {
        let sku = self.sku.trim().to_owned();
        if sku.is_empty() {
            return Err(Error::EmptyField("SKU"));
        }

        let name = self.name.trim().to_owned();
        if name.is_empty() {
            return Err(Error::EmptyField("Product name"));
        }

        for amount in [self.unit_price, self.unit_cost] {
            if amount.is_negative() {
                return Err(Error::InvalidAmount(amount.to_string()));
            }
        }

        let barcode = self
            .barcode
            .map(|barcode| barcode.trim().to_owned())
            .filter(|barcode| !barcode.is_empty());

        Ok(Self {
            sku,
            barcode,
            name,
            ..self
        })
    }
}

/// Why a product's stock level changed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MovementKind {
    Adjustment,
    Sale,
    SaleVoid,
}

impl MovementKind {
    pub const ALL: [MovementKind; 3] = [
        MovementKind::Adjustment,
        MovementKind::Sale,
        MovementKind::SaleVoid,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            MovementKind::Adjustment => "adjustment",
            MovementKind::Sale => "sale",
            MovementKind::SaleVoid => "sale_void",
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            MovementKind::Adjustment => "Adjustment",
            MovementKind::Sale => "Sale",
            MovementKind::SaleVoid => "Voided sale",
        }
    }
}

sql_text_enum!(MovementKind);

#[derive(Debug, Clone, PartialEq)]
pub struct StockMovement {
    pub id: StockMovementId,
    pub product_id: ProductId,
    pub date: Date,
    /// Positive when stock comes in, negative when it goes out.
    pub quantity_delta: i64,
    pub kind: MovementKind,
    pub note: String,
    pub journal_entry_id: Option<JournalEntryId>,
}

pub fn create_stock_tables(connection: &Connection) -> Result<(), rusqlite::Error> {
    connection.execute_batch(
        "CREATE TABLE IF NOT EXISTS product (
            id INTEGER PRIMARY KEY,
            organization_id INTEGER NOT NULL REFERENCES organization(id) ON DELETE CASCADE,
            sku TEXT NOT NULL,
            barcode TEXT,
            name TEXT NOT NULL,
            unit_price INTEGER NOT NULL,
            unit_cost INTEGER NOT NULL,
            quantity_on_hand INTEGER NOT NULL DEFAULT 0 CHECK (quantity_on_hand >= 0),
            archived INTEGER NOT NULL DEFAULT 0,
            UNIQUE(organization_id, sku),
            UNIQUE(organization_id, barcode)
        );

        CREATE TABLE IF NOT EXISTS stock_movement (
            id INTEGER PRIMARY KEY,
            product_id INTEGER NOT NULL REFERENCES product(id) ON DELETE CASCADE,
            date TEXT NOT NULL,
            quantity_delta INTEGER NOT NULL,
            kind TEXT NOT NULL,
            note TEXT NOT NULL,
            journal_entry_id INTEGER REFERENCES journal_entry(id)
        );

        CREATE INDEX IF NOT EXISTS idx_stock_movement_product ON stock_movement(product_id);",
    )
}

fn map_write_error(error: rusqlite::Error, details: &ProductDetails) -> Error {
    if is_unique_violation(&error, "product.sku") {
        Error::DuplicateSku(details.sku.clone())
    } else if is_unique_violation(&error, "product.barcode") {
        Error::DuplicateBarcode(details.barcode.clone().unwrap_or_default())
    } else {
        error.into()
    }
}

/// Create a product with nothing on hand.
///
/// Stock is brought in with [adjust_stock] so that its value reaches the ledger.
///
/// # Errors
///
/// - [Error::EmptyField] if the SKU or name is blank.
/// - [Error::InvalidAmount] if the price or cost is negative.
/// - [Error::DuplicateSku] or [Error::DuplicateBarcode] if another product
///   in the organization already uses them.
pub fn create_product(
    organization_id: OrganizationId,
    details: ProductDetails,
    connection: &Connection,
) -> Result<Product, Error> {
    let details = details.validated()?;

    connection
        .execute(
            "INSERT INTO product
                (organization_id, sku, barcode, name, unit_price, unit_cost, archived)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            (
                organization_id,
                &details.sku,
                &details.barcode,
                &details.name,
                details.unit_price,
                details.unit_cost,
                details.archived,
            ),
        )
        .map_err(|error| map_write_error(error, &details))?;

    Ok(Product {
        id: connection.last_insert_rowid(),
        organization_id,
        sku: details.sku,
        barcode: details.barcode,
        name: details.name,
        unit_price: details.unit_price,
        unit_cost: details.unit_cost,
        quantity_on_hand: 0,
        archived: details.archived,
    })
}

/// Update a product's details. The quantity on hand is left alone.
///
/// # Errors
///
/// Same as [create_product], plus [Error::NotFound] if the product does not
/// exist in the organization.
pub fn update_product(
    organization_id: OrganizationId,
    product_id: ProductId,
    details: ProductDetails,
    connection: &Connection,
) -> Result<Product, Error> {
    let details = details.validated()?;

    let rows_affected = connection
        .execute(
            "UPDATE product
            SET sku = ?1, barcode = ?2, name = ?3, unit_price = ?4, unit_cost = ?5, archived = ?6
            WHERE id = ?7 AND organization_id = ?8",
            (
                &details.sku,
                &details.barcode,
                &details.name,
                details.unit_price,
                details.unit_cost,
                details.archived,
                product_id,
                organization_id,
            ),
        )
        .map_err(|error| map_write_error(error, &details))?;

    if rows_affected == 0 {
        return Err(Error::NotFound);
    }

    get_product(organization_id, product_id, connection)
}

const PRODUCT_COLUMNS: &str =
    "id, organization_id, sku, barcode, name, unit_price, unit_cost, quantity_on_hand, archived";

fn map_row_to_product(row: &Row) -> Result<Product, rusqlite::Error> {
    Ok(Product {
        id: row.get(0)?,
        organization_id: row.get(1)?,
        sku: row.get(2)?,
        barcode: row.get(3)?,
        name: row.get(4)?,
        unit_price: row.get(5)?,
        unit_cost: row.get(6)?,
        quantity_on_hand: row.get(7)?,
        archived: row.get(8)?,
    })
}

pub fn get_product(
    organization_id: OrganizationId,
    product_id: ProductId,
    connection: &Connection,
) -> Result<Product, Error> {
    connection
        .query_row(
            &format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE id = ?1 AND organization_id = ?2"),
            (product_id, organization_id),
            map_row_to_product,
        )
        .map_err(Error::from)
}

/// The organization's products ordered by name.
pub fn list_products(
    organization_id: OrganizationId,
    connection: &Connection,
) -> Result<Vec<Product>, Error> {
    connection
        .prepare(&format!(
            "SELECT {PRODUCT_COLUMNS} FROM product
            WHERE organization_id = ?1
            ORDER BY archived, name COLLATE NOCASE, sku"
        ))?
        .query_map((organization_id,), map_row_to_product)?
        .map(|maybe_product| maybe_product.map_err(Error::from))
        .collect()
}

/// Find an active product by an exact barcode match, falling back to the SKU.
///
/// # Errors
///
/// Returns [Error::NotFound] if no active product has the code.
pub fn find_product_by_barcode(
    organization_id: OrganizationId,
    code: &str,
    connection: &Connection,
) -> Result<Product, Error> {
    let code = code.trim();
    if code.is_empty() {
        return Err(Error::NotFound);
    }

    connection
        .query_row(
            &format!(
                "SELECT {PRODUCT_COLUMNS} FROM product
                WHERE organization_id = ?1 AND archived = 0 AND (barcode = ?2 OR sku = ?2)
                ORDER BY barcode = ?2 DESC
                LIMIT 1"
            ),
            (organization_id, code),
            map_row_to_product,
        )
        .map_err(Error::from)
}

/// Change the quantity on hand and record the movement.
///
/// The caller must run this inside a transaction together with any journal
/// entry for the movement.
///
/// # Errors
///
/// Returns [Error::InsufficientStock] if the quantity on hand would go below zero.
pub(crate) fn insert_movement(
    product: &Product,
    quantity_delta: i64,
    date: Date,
    kind: MovementKind,
    note: &str,
    journal_entry_id: Option<JournalEntryId>,
    connection: &Connection,
) -> Result<StockMovement, Error> {
    let rows_affected = connection.execute(
        "UPDATE product SET quantity_on_hand = quantity_on_hand + ?1
        WHERE id = ?2 AND organization_id = ?3 AND quantity_on_hand + ?1 >= 0",
        (quantity_delta, product.id, product.organization_id),
    )?;

    if rows_affected == 0 {
        let available: i64 = connection.query_row(
            "SELECT quantity_on_hand FROM product WHERE id = ?1 AND organization_id = ?2",
            (product.id, product.organization_id),
            |row| row.get(0),
        )?;

        return Err(Error::InsufficientStock {
            product: product.name.clone(),
            available,
        });
    }

    connection.execute(
        "INSERT INTO stock_movement (product_id, date, quantity_delta, kind, note, journal_entry_id)
        VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        (product.id, date, quantity_delta, kind, note, journal_entry_id),
    )?;

    Ok(StockMovement {
        id: connection.last_insert_rowid(),
        product_id: product.id,
        date,
        quantity_delta,
        kind,
        note: note.to_owned(),
        journal_entry_id,
    })
}

/// Count stock in or write it off, posting the change in value to the ledger.
///
/// An increase debits inventory and credits inventory adjustments at unit
/// cost, a decrease does the opposite. Nothing is posted for products
/// without a cost.
///
/// # Errors
///
/// - [Error::NotFound] if the product does not exist in the organization.
/// - [Error::InvalidQuantity] if `quantity_delta` is zero.
/// - [Error::InsufficientStock] if the quantity on hand would go below zero.
/// - [Error::PeriodLocked] if `date` is in a closed period.
/// - [Error::MissingAccountRole] if the inventory accounts are not set up.
pub fn adjust_stock(
    tenant: Tenant,
    product_id: ProductId,
    quantity_delta: i64,
    date: Date,
    note: &str,
    connection: &Connection,
) -> Result<StockMovement, Error> {
    let organization_id = tenant.organization_id;
    let product = get_product(organization_id, product_id, connection)?;

    if quantity_delta == 0 {
        return Err(Error::InvalidQuantity);
    }

    let new_quantity = product
        .quantity_on_hand
        .checked_add(quantity_delta)
        .ok_or(Error::InvalidQuantity)?;

    if new_quantity < 0 {
        return Err(Error::InsufficientStock {
            product: product.name,
            available: product.quantity_on_hand,
        });
    }

    ensure_period_open(organization_id, date, connection)?;

    let quantity = quantity_delta.checked_abs().ok_or(Error::InvalidQuantity)?;
    let value = product.unit_cost.times(quantity)?;
    let note = note.trim();

    let transaction = connection.unchecked_transaction()?;

    let entry_id = if value.is_positive() {
        let inventory = get_account_by_role(organization_id, AccountRole::Inventory, &transaction)?;
        let adjustments =
            get_account_by_role(organization_id, AccountRole::InventoryAdjustment, &transaction)?;
        let memo = if note.is_empty() {
            format!("Stock adjustment for {}", product.name)
        } else {
            format!("Stock adjustment for {}: {note}", product.name)
        };
        let description = format!("{quantity_delta:+} × {}", product.sku);

        let new_entry = NewJournalEntry::new(date, &memo, EntrySource::StockAdjustment)
            .source_id(product.id);
        let new_entry = if quantity_delta > 0 {
            new_entry
                .debit(inventory.id, value, &description)
                .credit(adjustments.id, value, "")
        } else {
            new_entry
                .debit(adjustments.id, value, "")
                .credit(inventory.id, value, &description)
        };

        Some(insert_entry(tenant, new_entry, &transaction)?.id)
    } else {
        None
    };

    let movement = insert_movement(
        &product,
        quantity_delta,
        date,
        MovementKind::Adjustment,
        note,
        entry_id,
        &transaction,
    )?;
    transaction.commit()?;

    tracing::info!(
        "Adjusted stock of {} by {quantity_delta} for organization {organization_id}",
        product.sku
    );

    Ok(movement)
}

/// A product's stock movements, newest first.
pub fn list_movements(
    organization_id: OrganizationId,
    product_id: ProductId,
    connection: &Connection,
) -> Result<Vec<StockMovement>, Error> {
    connection
        .prepare(
            "SELECT stock_movement.id, stock_movement.product_id, stock_movement.date,
                stock_movement.quantity_delta, stock_movement.kind, stock_movement.note,
                stock_movement.journal_entry_id
            FROM stock_movement
            INNER JOIN product ON product.id = stock_movement.product_id
            WHERE stock_movement.product_id = ?1 AND product.organization_id = ?2
            ORDER BY stock_movement.date DESC, stock_movement.id DESC",
        )?
        .query_map((product_id, organization_id), |row| {
            Ok(StockMovement {
                id: row.get(0)?,
                product_id: row.get(1)?,
                date: row.get(2)?,
                quantity_delta: row.get(3)?,
                kind: row.get(4)?,
                note: row.get(5)?,
                journal_entry_id: row.get(6)?,
            })
        })?
        .map(|maybe_movement| maybe_movement.map_err(Error::from))
        .collect()
}
