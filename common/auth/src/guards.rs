use crate::roles::Role;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardError {
    Unauthenticated,
    Forbidden { required: Vec<Role>, actual: Role },
}

impl GuardError {
    pub fn message(&self) -> String {
        match self {
            GuardError::Unauthenticated => "Authentication required".to_string(),
            GuardError::Forbidden { required, .. } => {
                if required.is_empty() {
                    "Insufficient role".to_string()
                } else {
                    let names = required.iter().map(Role::as_str).collect::<Vec<_>>();
                    format!("Insufficient role. Required one of: {}", names.join(", "))
                }
            }
        }
    }
}

/// Checks a user's role against an allowed set.
///
/// `None` means no authenticated user. An empty `allowed` slice admits any
/// authenticated user. Unknown role strings never satisfy a non-empty set.
pub fn ensure_role(role: Option<&Role>, allowed: &[Role]) -> Result<(), GuardError> {
    let role = role.ok_or(GuardError::Unauthenticated)?;

    if allowed.is_empty() {
        return Ok(());
    }

    if role.is_known() && allowed.contains(role) {
        Ok(())
    } else {
        Err(GuardError::Forbidden {
            required: allowed.to_vec(),
            actual: role.clone(),
        })
    }
}
