//! The verified identity and context bound to a request by the auth core.

use serde::{Deserialize, Serialize};

/// Claims carried by a bearer token.
///
/// Derived from the token per request; never cached across requests.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Claims {
    /// Numeric user id.
    pub user_id: i32,
    /// Username.
    pub username: String,
    /// Originating device id.
    pub device_id: String,
    /// Subscription tier string carried in the token (e.g. `"free"`, `"pro"`).
    pub plan_type: String,
    /// Expiry instant, seconds since the Unix epoch.
    pub exp: usize,
}
