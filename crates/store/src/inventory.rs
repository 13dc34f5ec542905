//! Inventory ledger rules.
//!
//! The catalog and its ledger are mutated together: every quantity change
//! appends exactly one transaction, so create + add quantities minus use
//! quantities always equals the product's current quantity. Usage beyond the
//! current stock is rejected whole; neither the quantity nor the ledger is
//! touched.

use chrono::{DateTime, Utc};

use vaadly_model::{new_id, Document, InventoryProduct, InventoryTransaction, InventoryTxKind};

use crate::error::DomainError;

/// Create a catalog product. An initial quantity > 0 is recorded as one
/// `create` transaction attributed to the current building.
pub fn create_product(
    mut document: Document,
    name: &str,
    quantity: u32,
    price_per_unit: f64,
    now: DateTime<Utc>,
) -> Result<Document, DomainError> {
    let (building_id, building_name) = current_building_snapshot(&document)?;
    let product = InventoryProduct {
        id: new_id(),
        name: name.to_string(),
        quantity,
        price_per_unit,
        created_at: now,
    };

    if quantity > 0 {
        document.inventory_transactions.push(InventoryTransaction {
            id: new_id(),
            product_id: product.id.clone(),
            building_id,
            building_name,
            kind: InventoryTxKind::Create,
            quantity,
            cost: f64::from(quantity) * price_per_unit,
            notes: Some("New product created".to_string()),
            date: now.date_naive(),
            created_at: now,
        });
    }

    document.inventory_products.push(product);
    Ok(document)
}

/// Edit catalog fields. Quantity is deliberately not editable here; it only
/// moves through `add_stock`/`use_stock` so the ledger stays balanced.
pub fn update_product(
    mut document: Document,
    product_id: &str,
    name: &str,
    price_per_unit: f64,
) -> Result<Document, DomainError> {
    let product = find_product_mut(&mut document, product_id)?;
    product.name = name.to_string();
    product.price_per_unit = price_per_unit;
    Ok(document)
}

/// Increase stock and append the matching `add` transaction.
pub fn add_stock(
    mut document: Document,
    product_id: &str,
    quantity: u32,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<Document, DomainError> {
    if quantity == 0 {
        return Err(DomainError::InvalidOperation(
            "stock additions must be positive".to_string(),
        ));
    }
    let (building_id, building_name) = current_building_snapshot(&document)?;
    let product = find_product_mut(&mut document, product_id)?;
    product.quantity += quantity;
    let cost = f64::from(quantity) * product.price_per_unit;
    let product_id = product.id.clone();

    document.inventory_transactions.push(InventoryTransaction {
        id: new_id(),
        product_id,
        building_id,
        building_name,
        kind: InventoryTxKind::Add,
        quantity,
        cost,
        notes,
        date: now.date_naive(),
        created_at: now,
    });
    Ok(document)
}

/// Record usage, costed at the product's current unit price.
///
/// Rejects with [`DomainError::InsufficientStock`] when the request exceeds
/// the current quantity; the document is returned untouched in that case
/// because the error fires before any field is assigned.
pub fn use_stock(
    mut document: Document,
    product_id: &str,
    quantity: u32,
    notes: Option<String>,
    now: DateTime<Utc>,
) -> Result<Document, DomainError> {
    let (building_id, building_name) = current_building_snapshot(&document)?;
    let product = find_product_mut(&mut document, product_id)?;
    if quantity > product.quantity {
        return Err(DomainError::InsufficientStock {
            requested: quantity,
            available: product.quantity,
        });
    }
    product.quantity -= quantity;
    let cost = f64::from(quantity) * product.price_per_unit;
    let product_id = product.id.clone();

    document.inventory_transactions.push(InventoryTransaction {
        id: new_id(),
        product_id,
        building_id,
        building_name,
        kind: InventoryTxKind::Use,
        quantity,
        cost,
        notes,
        date: now.date_naive(),
        created_at: now,
    });
    Ok(document)
}

/// Delete a product and its entire ledger history (no orphaned rows).
pub fn remove_product(mut document: Document, product_id: &str) -> Document {
    document.inventory_products.retain(|p| p.id != product_id);
    document
        .inventory_transactions
        .retain(|t| t.product_id != product_id);
    document
}

fn current_building_snapshot(document: &Document) -> Result<(String, String), DomainError> {
    document
        .current_building()
        .map(|b| (b.id.clone(), b.name.clone()))
        .ok_or_else(|| {
            DomainError::InvalidOperation("current building does not resolve".to_string())
        })
}

fn find_product_mut<'a>(
    document: &'a mut Document,
    product_id: &str,
) -> Result<&'a mut InventoryProduct, DomainError> {
    document
        .inventory_products
        .iter_mut()
        .find(|p| p.id == product_id)
        .ok_or_else(|| DomainError::InvalidOperation(format!("no product with id {product_id}")))
}
