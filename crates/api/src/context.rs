use stockyard_auth::{PrincipalId, Role};

/// Principal context for a request (authenticated identity + roles).
///
/// The matching `WarehouseScope` is inserted next to it by the auth middleware.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PrincipalContext {
    principal_id: PrincipalId,
    roles: Vec<Role>,
}

impl PrincipalContext {
    pub fn new(principal_id: PrincipalId, roles: Vec<Role>) -> Self {
        Self { principal_id, roles }
    }

    pub fn principal_id(&self) -> PrincipalId {
        self.principal_id
    }

    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Name recorded as `created_by` / movement operator.
    pub fn operator(&self) -> String {
        self.principal_id.to_string()
    }
}
