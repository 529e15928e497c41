pub mod claims;
pub mod config;
pub mod error;
pub mod guards;
pub mod roles;

pub use claims::AccessClaims;
pub use config::ExpiryConfig;
pub use error::{AuthError, AuthResult};
pub use guards::{ensure_role, GuardError};
pub use roles::{
    Role, ROLE_MEMBER, ROLE_SALES_TEAM, ROLE_STAFF, ROLE_STAFF_ADMIN, ROLE_SUPER_ADMIN,
    ROLE_SUPPORT_TEAM, ROLE_TENANT_ADMIN,
};
