use crate::auth::api_key::AuthContext;
use crate::domain::entities::Permission;
use crate::domain::error::DomainError;

/// Guards a handler behind one required permission string.
pub fn require_permission(ctx: &AuthContext, permission: Permission) -> Result<(), DomainError> {
    if ctx.api_key.has_permission(permission) {
        Ok(())
    } else {
        Err(DomainError::Forbidden(format!(
            "api key lacks required permission {}",
            permission.as_str()
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::entities::{ApiKey, KeyEnvironment};
    use crate::domain::types::PartnerId;
    use std::collections::HashSet;

    fn ctx_with(permissions: HashSet<Permission>) -> AuthContext {
        AuthContext {
            api_key: ApiKey::new(PartnerId::new(), "hash".into(), KeyEnvironment::Sandbox, permissions, None),
        }
    }

    #[test]
    fn allows_when_permission_present() {
        let ctx = ctx_with(HashSet::from([Permission::WalletsRead]));
        assert!(require_permission(&ctx, Permission::WalletsRead).is_ok());
    }

    #[test]
    fn denies_when_permission_absent() {
        let ctx = ctx_with(HashSet::from([Permission::WalletsRead]));
        let err = require_permission(&ctx, Permission::TransactionsWrite).unwrap_err();
        assert!(matches!(err, DomainError::Forbidden(_)));
    }
}
