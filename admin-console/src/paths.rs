//! Role-based REST path resolution.
//!
//! The same logical resource lives under a different prefix depending on who
//! is asking. Resolution is pure; callers pass the role read from the cached
//! user at call time so a mid-session role change applies to the next call.

use std::fmt;

use common_auth::Role;

/// Logical resources whose endpoint depends on the caller's role.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resource {
    Groups,
    Recipients,
    Batches,
}

impl Resource {
    pub const ALL: [Resource; 3] = [Resource::Groups, Resource::Recipients, Resource::Batches];

    pub fn as_str(&self) -> &'static str {
        match self {
            Resource::Groups => "groups",
            Resource::Recipients => "recipients",
            Resource::Batches => "batches",
        }
    }
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathFamily {
    /// Cross-tenant operators.
    Platform,
    TenantAdmin,
    TenantStaff,
    /// Non-role-qualified paths for anonymous or unrecognised callers.
    Legacy,
}

impl PathFamily {
    pub fn for_role(role: Option<&Role>) -> Self {
        match role {
            Some(Role::SuperAdmin | Role::SupportTeam) => PathFamily::Platform,
            Some(Role::TenantAdmin | Role::StaffAdmin | Role::SalesTeam) => PathFamily::TenantAdmin,
            Some(Role::Staff) => PathFamily::TenantStaff,
            Some(Role::Member | Role::Unknown(_)) | None => PathFamily::Legacy,
        }
    }
}

/// Path prefix (no trailing slash) for `resource` as seen by `role`.
pub fn resolve_path(role: Option<&Role>, resource: Resource) -> String {
    let family = PathFamily::for_role(role);
    match (family, resource) {
        (PathFamily::Platform, _) => format!("/admin/{resource}"),
        (PathFamily::TenantAdmin, Resource::Batches) => "/batches/admin".to_string(),
        (PathFamily::TenantAdmin, _) => format!("/tenant-admin/{resource}"),
        (PathFamily::TenantStaff, Resource::Batches) => "/batches/staff".to_string(),
        (PathFamily::TenantStaff, _) => format!("/tenant-staff/{resource}"),
        (PathFamily::Legacy, _) => legacy_path(resource),
    }
}

// TODO: confirm each legacy /tenants/{resource} route against the backend
// route table; groups and batches may not be served there.
fn legacy_path(resource: Resource) -> String {
    format!("/tenants/{resource}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn platform_roles_use_admin_prefix() {
        for role in [Role::SuperAdmin, Role::SupportTeam] {
            assert_eq!(resolve_path(Some(&role), Resource::Groups), "/admin/groups");
            assert_eq!(resolve_path(Some(&role), Resource::Batches), "/admin/batches");
        }
    }

    #[test]
    fn tenant_admin_family_special_cases_batches() {
        for role in [Role::TenantAdmin, Role::StaffAdmin, Role::SalesTeam] {
            assert_eq!(
                resolve_path(Some(&role), Resource::Recipients),
                "/tenant-admin/recipients"
            );
            assert_eq!(resolve_path(Some(&role), Resource::Batches), "/batches/admin");
        }
    }

    #[test]
    fn staff_uses_staff_prefix_and_batches_sub_path() {
        assert_eq!(
            resolve_path(Some(&Role::Staff), Resource::Groups),
            "/tenant-staff/groups"
        );
        assert_eq!(
            resolve_path(Some(&Role::Staff), Resource::Batches),
            "/batches/staff"
        );
    }

    #[test]
    fn anonymous_member_and_unknown_fall_back_to_legacy() {
        let unknown = Role::Unknown("auditor".into());
        for role in [None, Some(&Role::Member), Some(&unknown)] {
            for resource in Resource::ALL {
                assert_eq!(
                    resolve_path(role, resource),
                    format!("/tenants/{}", resource.as_str())
                );
            }
        }
    }

    #[test]
    fn every_pair_is_deterministic_and_non_empty() {
        let mut roles: Vec<Option<Role>> = Role::KNOWN.into_iter().map(Some).collect();
        roles.push(Some(Role::Unknown("x".into())));
        roles.push(None);

        for role in &roles {
            for resource in Resource::ALL {
                let first = resolve_path(role.as_ref(), resource);
                let second = resolve_path(role.as_ref(), resource);
                assert!(first.starts_with('/') && first.len() > 1);
                assert!(!first.ends_with('/'));
                assert_eq!(first, second);
            }
        }
    }
}
