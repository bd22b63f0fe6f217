use std::collections::HashSet;

use super::Role;

/// The identity the gate binds to a request after a successful validation.
///
/// Built fresh for every request and carried as an axum request extension;
/// it never outlives the request and is never persisted.
#[derive(Debug, Clone)]
pub struct AuthenticatedPrincipal {
    pub user_id: String,
    pub roles: HashSet<Role>,
}

impl AuthenticatedPrincipal {
    /// A principal with a single role (the common case: tokens carry one).
    pub fn single(user_id: impl Into<String>, role: Role) -> Self {
        Self {
            user_id: user_id.into(),
            roles: HashSet::from([role]),
        }
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}
