pub mod api_key;
pub mod permissions;
pub mod rate_limit;

pub use api_key::{hash_secret, AuthContext, Authenticator};
pub use permissions::require_permission;
pub use rate_limit::{RateLimitDecision, RateLimiter};

pub use crate::domain::entities::Permission;
