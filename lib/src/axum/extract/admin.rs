use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_auth::AuthBasic;

use crate::auth::check_credentials;
use crate::error::{Error, ErrorKind};
use crate::Service;

/// Operator authenticated through http basic auth.
///
/// Rejects with [`ErrorKind::Unauthorized`], which turns into a basic auth
/// challenge.
#[derive(Clone, Debug)]
pub struct Admin {
    pub username: String,
}

#[async_trait]
impl<S: Send + Sync> FromRequestParts<S> for Admin {
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let service = parts
            .extensions
            .get::<Service>()
            .cloned()
            .ok_or_else(|| ErrorKind::Other("service extension unavailable".to_string()))?;

        let AuthBasic((username, password)) = AuthBasic::from_request_parts(parts, state)
            .await
            .map_err(|_| ErrorKind::Unauthorized)?;

        check_credentials(&service.config.admin, &username, password.as_deref()).map_err(|e| {
            tracing::debug!(%username, "operator authentication failed");
            e
        })?;

        Ok(Self { username })
    }
}
