//! Warehouse-level authorization.

use std::collections::BTreeSet;

use serde::Serialize;
use thiserror::Error;

use stockyard_core::WarehouseId;

use crate::{JwtClaims, Role};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthzError {
    #[error("forbidden: warehouse {0} is outside the caller's scope")]
    WarehouseOutOfScope(WarehouseId),
}

/// Set of warehouses a principal may read or mutate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "warehouse_ids", rename_all = "snake_case")]
pub enum WarehouseScope {
    /// Every warehouse, present and future.
    All,
    Only(BTreeSet<WarehouseId>),
}

impl WarehouseScope {
    pub fn new(roles: &[Role], warehouse_ids: &[WarehouseId]) -> Self {
        if roles.iter().any(Role::is_admin) {
            return WarehouseScope::All;
        }
        WarehouseScope::Only(warehouse_ids.iter().copied().collect())
    }

    pub fn from_claims(claims: &JwtClaims) -> Self {
        Self::new(&claims.roles, &claims.warehouse_ids)
    }

    pub fn allows(&self, warehouse_id: WarehouseId) -> bool {
        match self {
            WarehouseScope::All => true,
            WarehouseScope::Only(ids) => ids.contains(&warehouse_id),
        }
    }

    pub fn authorize_warehouse(&self, warehouse_id: WarehouseId) -> Result<(), AuthzError> {
        if self.allows(warehouse_id) {
            Ok(())
        } else {
            Err(AuthzError::WarehouseOutOfScope(warehouse_id))
        }
    }

    /// Like `allows`, for records whose warehouse may be unknown.
    pub fn allows_opt(&self, warehouse_id: Option<WarehouseId>) -> bool {
        match warehouse_id {
            Some(w) => self.allows(w),
            None => matches!(self, WarehouseScope::All),
        }
    }
}
