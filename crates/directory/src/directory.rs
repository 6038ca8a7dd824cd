//! In-memory reference tables.

use std::collections::BTreeMap;

use chrono::Utc;
use parking_lot::RwLock;

use stockyard_core::{DomainError, DomainResult, LocationId, ProductId, Sku, WarehouseId};

use crate::product::{NewProduct, Page, PageRequest, Product, ProductPatch, ProductQuery};
use crate::warehouse::{Location, Warehouse};

#[derive(Debug, Default)]
struct Tables {
    warehouses: BTreeMap<WarehouseId, Warehouse>,
    locations: BTreeMap<LocationId, Location>,
    products: BTreeMap<ProductId, Product>,
    next_location_id: u64,
    next_product_id: u64,
}

/// Read-mostly store of warehouses, locations and products.
///
/// Ids are assigned sequentially; results are returned in id order.
#[derive(Debug, Default)]
pub struct Directory {
    tables: RwLock<Tables>,
}

impl Directory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_warehouse(&self, id: WarehouseId, name: impl Into<String>) -> DomainResult<Warehouse> {
        let name = name.into();
        if name.trim().is_empty() {
            return Err(DomainError::validation("warehouse name cannot be empty"));
        }
        let mut t = self.tables.write();
        if t.warehouses.contains_key(&id) {
            return Err(DomainError::conflict(format!("warehouse {id} already exists")));
        }
        let warehouse = Warehouse { id, name };
        t.warehouses.insert(id, warehouse.clone());
        Ok(warehouse)
    }

    pub fn list_warehouses(&self) -> Vec<Warehouse> {
        self.tables.read().warehouses.values().cloned().collect()
    }

    pub fn get_warehouse(&self, id: WarehouseId) -> DomainResult<Warehouse> {
        self.tables
            .read()
            .warehouses
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("warehouse {id}")))
    }

    pub fn ensure_warehouse(&self, id: WarehouseId) -> DomainResult<()> {
        self.get_warehouse(id).map(|_| ())
    }

    pub fn add_location(
        &self,
        warehouse_id: WarehouseId,
        code: impl Into<String>,
        name: Option<String>,
    ) -> DomainResult<Location> {
        let code = code.into();
        if code.trim().is_empty() {
            return Err(DomainError::validation("location code cannot be empty"));
        }
        let mut t = self.tables.write();
        if !t.warehouses.contains_key(&warehouse_id) {
            return Err(DomainError::not_found(format!("warehouse {warehouse_id}")));
        }
        if t
            .locations
            .values()
            .any(|l| l.warehouse_id == warehouse_id && l.code == code)
        {
            return Err(DomainError::conflict(format!(
                "location {code} already exists in warehouse {warehouse_id}"
            )));
        }
        t.next_location_id += 1;
        let location = Location {
            id: LocationId::new(t.next_location_id),
            warehouse_id,
            code,
            name,
        };
        t.locations.insert(location.id, location.clone());
        Ok(location)
    }

    pub fn list_locations(&self, warehouse_id: Option<WarehouseId>) -> Vec<Location> {
        self.tables
            .read()
            .locations
            .values()
            .filter(|l| warehouse_id.is_none_or(|w| l.warehouse_id == w))
            .cloned()
            .collect()
    }

    pub fn get_location(&self, id: LocationId) -> DomainResult<Location> {
        self.tables
            .read()
            .locations
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("location {id}")))
    }

    pub fn create_product(&self, input: NewProduct) -> DomainResult<Product> {
        let (sku, name) = input.validate()?;
        let mut t = self.tables.write();
        if t.products.values().any(|p| p.sku == sku) {
            return Err(DomainError::conflict(format!("sku {sku} already exists")));
        }
        t.next_product_id += 1;
        let product = Product {
            id: ProductId::new(t.next_product_id),
            sku,
            name,
            category: input.category,
            unit: input.unit,
            image_url: input.image_url,
            created_at: Utc::now(),
        };
        t.products.insert(product.id, product.clone());
        Ok(product)
    }

    pub fn get_product(&self, id: ProductId) -> DomainResult<Product> {
        self.tables
            .read()
            .products
            .get(&id)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))
    }

    pub fn product_by_sku(&self, sku: &Sku) -> DomainResult<Product> {
        self.tables
            .read()
            .products
            .values()
            .find(|p| &p.sku == sku)
            .cloned()
            .ok_or_else(|| DomainError::not_found(format!("product with sku {sku}")))
    }

    /// Run `f` while every listed sku is known to exist in the catalog.
    ///
    /// The read lock is held until `f` returns, so `delete_product` cannot
    /// interleave. `f` must not call back into the directory.
    pub fn with_products<R>(
        &self,
        skus: &[Sku],
        f: impl FnOnce() -> DomainResult<R>,
    ) -> DomainResult<R> {
        let t = self.tables.read();
        for sku in skus {
            if !t.products.values().any(|p| &p.sku == sku) {
                return Err(DomainError::not_found(format!("product with sku {sku}")));
            }
        }
        f()
    }

    pub fn update_product(&self, id: ProductId, patch: ProductPatch) -> DomainResult<Product> {
        let mut t = self.tables.write();
        let product = t
            .products
            .get_mut(&id)
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))?;

        // Validate on a copy so a rejected patch leaves the stored row untouched.
        let mut updated = product.clone();
        patch.apply_to(&mut updated)?;
        *product = updated.clone();
        Ok(updated)
    }

    /// Delete a product after `guard` approves it.
    ///
    /// The guard runs under the directory write lock, so no order can pick up
    /// the product between the reference check and the removal.
    pub fn delete_product<F>(&self, id: ProductId, guard: F) -> DomainResult<Product>
    where
        F: FnOnce(&Product) -> DomainResult<()>,
    {
        let mut t = self.tables.write();
        let product = t
            .products
            .get(&id)
            .ok_or_else(|| DomainError::not_found(format!("product {id}")))?;
        guard(product)?;
        t.products
            .remove(&id)
            .ok_or_else(|| DomainError::invariant("product vanished under write lock"))
    }

    pub fn list_products(&self, query: &ProductQuery, page: PageRequest) -> Page<Product> {
        let matching: Vec<Product> = self
            .tables
            .read()
            .products
            .values()
            .filter(|p| query.matches(p))
            .cloned()
            .collect();
        Page::slice(matching, page)
    }
}
