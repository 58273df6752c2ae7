use std::sync::Arc;

use chrono::Utc;
use sha2::{Digest, Sha256};

use crate::domain::entities::ApiKey;
use crate::domain::error::DomainError;
use crate::domain::repository::{ApiKeyRepository, PartnerRepository};
use crate::domain::types::PartnerId;

pub fn hash_secret(secret: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hex::encode(hasher.finalize())
}

/// The authenticated identity attached to a request once the bearer
/// token has been resolved to an active key.
#[derive(Debug, Clone)]
pub struct AuthContext {
    pub api_key: ApiKey,
}

impl AuthContext {
    pub fn partner_id(&self) -> PartnerId {
        self.api_key.partner_id
    }
}

/// Resolves the `Authorization: Bearer <secret>` header into an
/// `AuthContext`. Looks up by the secret's SHA-256 digest — the
/// plaintext secret is never stored, so this is the only lookup path.
pub struct Authenticator {
    api_keys: Arc<dyn ApiKeyRepository>,
    partners: Arc<dyn PartnerRepository>,
}

impl Authenticator {
    pub fn new(api_keys: Arc<dyn ApiKeyRepository>, partners: Arc<dyn PartnerRepository>) -> Self {
        Self { api_keys, partners }
    }

    pub async fn authenticate(&self, bearer_secret: &str) -> Result<AuthContext, DomainError> {
        let hash = hash_secret(bearer_secret);
        let key = self
            .api_keys
            .find_by_hash(&hash)
            .await?
            .ok_or_else(|| DomainError::Unauthenticated("invalid or unknown api key".into()))?;

        if !key.is_usable(Utc::now()) {
            return Err(DomainError::Unauthenticated("api key is inactive or expired".into()));
        }

        let partner = self
            .partners
            .find_by_id(key.partner_id)
            .await?
            .ok_or_else(|| DomainError::Unauthenticated("invalid or unknown api key".into()))?;

        if !partner.is_approved() {
            return Err(DomainError::Unauthenticated("partner is not approved".into()));
        }

        self.api_keys.touch_last_used(key.id).await?;

        Ok(AuthContext { api_key: key })
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;
    use crate::domain::entities::{KeyEnvironment, Partner, PartnerStatus};
    use crate::domain::repository::{MockApiKeyRepository, MockPartnerRepository};

    #[test]
    fn hash_is_deterministic_and_not_the_plaintext() {
        let hash1 = hash_secret("sk_live_abc123");
        let hash2 = hash_secret("sk_live_abc123");
        assert_eq!(hash1, hash2);
        assert_ne!(hash1, "sk_live_abc123");
        assert_eq!(hash1.len(), 64);
    }

    #[test]
    fn different_secrets_hash_differently() {
        assert_ne!(hash_secret("a"), hash_secret("b"));
    }

    fn sample_key(partner_id: PartnerId) -> ApiKey {
        ApiKey::new(partner_id, hash_secret("sk_test_1"), KeyEnvironment::Sandbox, HashSet::new(), None)
    }

    fn sample_partner(status: PartnerStatus) -> Partner {
        let mut partner = Partner::new("acme".to_string()).unwrap();
        partner.status = status;
        partner
    }

    #[tokio::test]
    async fn rejects_keys_whose_partner_is_not_approved() {
        let partner_id = PartnerId::new();
        let key = sample_key(partner_id);

        let mut api_keys = MockApiKeyRepository::new();
        api_keys.expect_find_by_hash().returning(move |_| Ok(Some(key.clone())));
        api_keys.expect_touch_last_used().times(0);

        let mut partners = MockPartnerRepository::new();
        partners
            .expect_find_by_id()
            .returning(move |_| Ok(Some(sample_partner(PartnerStatus::Suspended))));

        let authenticator = Authenticator::new(Arc::new(api_keys), Arc::new(partners));
        let err = authenticator.authenticate("sk_test_1").await.unwrap_err();
        assert!(matches!(err, DomainError::Unauthenticated(_)));
    }

    #[tokio::test]
    async fn accepts_keys_whose_partner_is_approved() {
        let partner_id = PartnerId::new();
        let key = sample_key(partner_id);

        let mut api_keys = MockApiKeyRepository::new();
        api_keys.expect_find_by_hash().returning(move |_| Ok(Some(key.clone())));
        api_keys.expect_touch_last_used().returning(|_| Ok(()));

        let mut partners = MockPartnerRepository::new();
        partners
            .expect_find_by_id()
            .returning(move |_| Ok(Some(sample_partner(PartnerStatus::Approved))));

        let authenticator = Authenticator::new(Arc::new(api_keys), Arc::new(partners));
        let ctx = authenticator.authenticate("sk_test_1").await.unwrap();
        assert_eq!(ctx.partner_id(), partner_id);
    }
}
