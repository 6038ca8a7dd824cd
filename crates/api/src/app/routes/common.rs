use std::str::FromStr;

use stockyard_auth::WarehouseScope;
use stockyard_core::{DomainError, WarehouseId};

use crate::app::errors::ApiError;

/// Parse a path id; malformed ids are validation errors, not 404s.
pub fn parse_id<T>(raw: &str) -> Result<T, ApiError>
where
    T: FromStr<Err = DomainError>,
{
    raw.parse::<T>().map_err(ApiError::from)
}

/// Check an explicit `warehouse_id` filter against the caller's scope.
pub fn authorize_filter(scope: &WarehouseScope, warehouse_id: Option<WarehouseId>) -> Result<(), ApiError> {
    if let Some(w) = warehouse_id {
        scope.authorize_warehouse(w)?;
    }
    Ok(())
}

/// Check a stored order's warehouse against the caller's scope.
pub fn authorize_order(scope: &WarehouseScope, warehouse_id: Option<WarehouseId>) -> Result<(), ApiError> {
    let w = warehouse_id.ok_or_else(|| DomainError::invariant("stored order without warehouse"))?;
    scope.authorize_warehouse(w)?;
    Ok(())
}
