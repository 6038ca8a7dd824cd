//! `stockyard-auth`: the authenticated principal boundary.
//!
//! Tokens are issued elsewhere. This crate verifies them and turns the claims
//! into a warehouse scope; it knows nothing about HTTP or storage.

pub mod claims;
pub mod jwt;
pub mod principal;
pub mod roles;
pub mod scope;

pub use claims::{JwtClaims, TokenValidationError, validate_claims};
pub use jwt::{Hs256JwtValidator, JwtValidator};
pub use principal::PrincipalId;
pub use roles::Role;
pub use scope::{AuthzError, WarehouseScope};
