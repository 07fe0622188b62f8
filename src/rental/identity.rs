// Caller identity supplied by the upstream gateway
//
// Credentials are verified before requests reach this service; the gateway
// forwards the result in X-User, X-Role and X-Customer-Id headers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ApiError;

pub const USER_HEADER: &str = "x-user";
pub const ROLE_HEADER: &str = "x-role";
pub const CUSTOMER_HEADER: &str = "x-customer-id";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Customer,
    Administrator,
}

impl Role {
    pub fn from_str(s: &str) -> Result<Self, String> {
        match s.trim().to_lowercase().as_str() {
            "customer" => Ok(Role::Customer),
            "admin" | "administrator" => Ok(Role::Administrator),
            _ => Err(format!("Invalid role: {}", s)),
        }
    }
}

/// Who is calling, and which customer record they act as
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CallerIdentity {
    pub username: String,
    pub role: Role,
    pub customer_id: Option<String>,
}

impl CallerIdentity {
    pub fn administrator(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::Administrator,
            customer_id: None,
        }
    }

    pub fn customer(username: impl Into<String>, customer_id: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            role: Role::Customer,
            customer_id: Some(customer_id.into()),
        }
    }

    pub fn is_administrator(&self) -> bool {
        self.role == Role::Administrator
    }

    /// Administrators act for anyone; customers only for their own key
    pub fn can_act_for(&self, customer_id: &str) -> bool {
        self.is_administrator() || self.customer_id.as_deref() == Some(customer_id)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for CallerIdentity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let header = |name: &str| -> Option<String> {
            parts
                .headers
                .get(name)
                .and_then(|value| value.to_str().ok())
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(str::to_string)
        };

        let username = header(USER_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Missing X-User header".to_string()))?;
        let role = header(ROLE_HEADER)
            .ok_or_else(|| ApiError::Unauthorized("Missing X-Role header".to_string()))
            .and_then(|raw| Role::from_str(&raw).map_err(ApiError::Unauthorized))?;

        let identity = match role {
            Role::Administrator => CallerIdentity::administrator(username),
            Role::Customer => {
                let customer_id = header(CUSTOMER_HEADER).ok_or_else(|| {
                    ApiError::Unauthorized("Customer callers must send X-Customer-Id".to_string())
                })?;
                CallerIdentity::customer(username, customer_id)
            }
        };

        debug!("Request from {} ({:?})", identity.username, identity.role);
        Ok(identity)
    }
}
