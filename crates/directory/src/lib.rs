//! Reference directory: warehouses, locations and the product catalog.
//!
//! These are lookup tables consumed by the order engines and the ledger;
//! they carry no business rules beyond validation and sku uniqueness.

pub mod directory;
pub mod product;
pub mod warehouse;

pub use directory::Directory;
pub use product::{NewProduct, Page, PageRequest, Product, ProductPatch, ProductQuery, MAX_PAGE_SIZE};
pub use warehouse::{Location, Warehouse};
