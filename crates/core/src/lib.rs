//! `stockyard-core`: domain foundation building blocks.
//!
//! This crate contains **pure domain** primitives (no infrastructure concerns).

pub mod aggregate;
pub mod error;
pub mod id;
pub mod value_object;

pub use aggregate::{Aggregate, AggregateRoot};
pub use error::{DomainError, DomainResult, Shortage};
pub use id::{InboundOrderId, LocationId, OutboundOrderId, ProductId, StocktakeId, WarehouseId};
pub use value_object::{Money, NumericInput, Quantity, Sku, ValueObject};
