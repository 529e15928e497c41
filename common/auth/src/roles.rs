use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub const ROLE_SUPER_ADMIN: &str = "super_admin";
pub const ROLE_SUPPORT_TEAM: &str = "support_team";
pub const ROLE_TENANT_ADMIN: &str = "tenant_admin";
pub const ROLE_STAFF_ADMIN: &str = "staff_admin";
pub const ROLE_STAFF: &str = "staff";
pub const ROLE_SALES_TEAM: &str = "sales_team";
pub const ROLE_MEMBER: &str = "member";

/// Permission tier of a platform user.
///
/// The server sends roles as snake_case strings. Anything outside the known set
/// is kept verbatim in `Unknown` so a cached profile round-trips unchanged, but
/// such a role never satisfies a role guard.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(from = "String", into = "String")]
pub enum Role {
    SuperAdmin,
    SupportTeam,
    TenantAdmin,
    StaffAdmin,
    Staff,
    SalesTeam,
    #[default]
    Member,
    Unknown(String),
}

impl Role {
    pub const KNOWN: [Role; 7] = [
        Role::SuperAdmin,
        Role::SupportTeam,
        Role::TenantAdmin,
        Role::StaffAdmin,
        Role::Staff,
        Role::SalesTeam,
        Role::Member,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            Role::SuperAdmin => ROLE_SUPER_ADMIN,
            Role::SupportTeam => ROLE_SUPPORT_TEAM,
            Role::TenantAdmin => ROLE_TENANT_ADMIN,
            Role::StaffAdmin => ROLE_STAFF_ADMIN,
            Role::Staff => ROLE_STAFF,
            Role::SalesTeam => ROLE_SALES_TEAM,
            Role::Member => ROLE_MEMBER,
            Role::Unknown(raw) => raw.as_str(),
        }
    }

    /// Platform operators with cross-tenant visibility.
    pub fn is_platform(&self) -> bool {
        matches!(self, Role::SuperAdmin | Role::SupportTeam)
    }

    /// Roles that administer a single tenant.
    pub fn is_tenant_admin(&self) -> bool {
        matches!(self, Role::TenantAdmin | Role::StaffAdmin | Role::SalesTeam)
    }

    pub fn is_known(&self) -> bool {
        !matches!(self, Role::Unknown(_))
    }

    /// Landing route after login when no return path was preserved.
    pub fn home_route(&self) -> &'static str {
        match self {
            Role::SuperAdmin | Role::SupportTeam => "/admin/dashboard",
            Role::TenantAdmin | Role::StaffAdmin | Role::SalesTeam => "/tenant-admin/dashboard",
            Role::Staff => "/staff/dashboard",
            Role::Member | Role::Unknown(_) => "/dashboard",
        }
    }

    pub fn label(&self) -> &str {
        match self {
            Role::SuperAdmin => "Super Admin",
            Role::SupportTeam => "Support Team",
            Role::TenantAdmin => "Tenant Admin",
            Role::StaffAdmin => "Staff Admin",
            Role::Staff => "Staff",
            Role::SalesTeam => "Sales Team",
            Role::Member => "Member",
            Role::Unknown(raw) => raw.as_str(),
        }
    }
}

impl FromStr for Role {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_ascii_lowercase();
        let role = match normalized.as_str() {
            ROLE_SUPER_ADMIN => Role::SuperAdmin,
            ROLE_SUPPORT_TEAM => Role::SupportTeam,
            ROLE_TENANT_ADMIN => Role::TenantAdmin,
            ROLE_STAFF_ADMIN => Role::StaffAdmin,
            ROLE_STAFF => Role::Staff,
            ROLE_SALES_TEAM => Role::SalesTeam,
            ROLE_MEMBER | "user" | "" => Role::Member,
            _ => Role::Unknown(s.to_string()),
        };
        Ok(role)
    }
}

impl From<String> for Role {
    fn from(value: String) -> Self {
        match value.parse::<Role>() {
            Ok(role) => role,
            Err(never) => match never {},
        }
    }
}

impl From<Role> for String {
    fn from(value: Role) -> Self {
        match value {
            Role::Unknown(raw) => raw,
            other => other.as_str().to_string(),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_known_roles_case_insensitively() {
        assert_eq!("Super_Admin".parse::<Role>().unwrap(), Role::SuperAdmin);
        assert_eq!("staff".parse::<Role>().unwrap(), Role::Staff);
        assert_eq!(" sales_team ".parse::<Role>().unwrap(), Role::SalesTeam);
        assert_eq!("user".parse::<Role>().unwrap(), Role::Member);
    }

    #[test]
    fn unknown_role_round_trips_verbatim() {
        let role: Role = serde_json::from_str("\"auditor\"").expect("deserialize");
        assert_eq!(role, Role::Unknown("auditor".to_string()));
        assert!(!role.is_known());
        assert_eq!(serde_json::to_string(&role).unwrap(), "\"auditor\"");
    }

    #[test]
    fn known_roles_serialize_as_snake_case() {
        for role in Role::KNOWN {
            let json = serde_json::to_string(&role).unwrap();
            let back: Role = serde_json::from_str(&json).unwrap();
            assert_eq!(back, role);
        }
        assert_eq!(
            serde_json::to_string(&Role::TenantAdmin).unwrap(),
            "\"tenant_admin\""
        );
    }

    #[test]
    fn home_routes_follow_role_family() {
        assert_eq!(Role::SupportTeam.home_route(), "/admin/dashboard");
        assert_eq!(Role::StaffAdmin.home_route(), "/tenant-admin/dashboard");
        assert_eq!(Role::Staff.home_route(), "/staff/dashboard");
        assert_eq!(Role::Unknown("x".into()).home_route(), "/dashboard");
    }
}
