//! Demo data for local runs.

use stockyard_core::{DomainResult, Quantity, Sku, WarehouseId};
use stockyard_directory::NewProduct;
use stockyard_inventory::MovementContext;

use crate::services::Services;

const PRODUCTS: [(&str, &str, &str); 3] = [
    ("SKU-001", "Hex bolt M8", "hardware"),
    ("SKU-002", "Hex nut M8", "hardware"),
    ("SKU-003", "Wood glue 250ml", "chemicals"),
];

/// Two warehouses with one location each, three products, and stock for
/// every product in both warehouses.
pub fn demo(services: &Services) -> DomainResult<()> {
    let dir = &services.directory;
    let a = dir.add_warehouse(WarehouseId::new(1), "WH-A")?;
    let b = dir.add_warehouse(WarehouseId::new(2), "WH-B")?;
    dir.add_location(a.id, "A-01", Some("Aisle A".into()))?;
    dir.add_location(b.id, "B-01", Some("Aisle B".into()))?;

    let ctx = MovementContext::new("seed", None);
    for (sku, name, category) in PRODUCTS {
        dir.create_product(NewProduct {
            sku: sku.into(),
            name: name.into(),
            category: Some(category.into()),
            unit: Some("pcs".into()),
            image_url: None,
        })?;
        let sku = Sku::parse(sku)?;
        for (warehouse_id, qty, threshold) in [(a.id, 50, 10), (b.id, 20, 5)] {
            services.ledger.receive(warehouse_id, &sku, Quantity::new(qty)?, &ctx)?;
            services
                .ledger
                .set_threshold(warehouse_id, &sku, Quantity::new(threshold)?, &ctx)?;
        }
    }

    tracing::info!(warehouses = 2, products = PRODUCTS.len(), "demo data seeded");
    Ok(())
}
