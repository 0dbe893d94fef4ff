use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Error, Result};
use crate::middleware::auth::Claims;

/// The authenticated user, passed explicitly into the quiz controller
/// rather than read from ambient state.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: Uuid,
    pub email: String,
}

impl CurrentUser {
    pub fn from_claims(claims: &Claims) -> Result<Self> {
        let id = Uuid::parse_str(&claims.sub)
            .map_err(|_| Error::Unauthorized("invalid subject claim".to_string()))?;
        Ok(Self {
            id,
            email: claims.email.clone().unwrap_or_default(),
        })
    }
}
