use std::convert::Infallible;

use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tracing::warn;

use crate::error::{AuthError, AuthenticationReason};
use crate::record::{AuthStatus, SessionContext};

/// Session attached by [`require_role`](crate::require_role).
///
/// Reads the decision already made for this request; it never consults the store.
/// Without a gate layer in front of the handler it rejects with 401.
#[derive(Debug, Clone)]
pub struct CurrentSession(pub SessionContext);

#[async_trait]
impl<S> FromRequestParts<S> for CurrentSession
where
    S: Send + Sync,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<SessionContext>() {
            Some(context) => Ok(Self(context.clone())),
            None => {
                warn!(path = %parts.uri.path(), "no session context on request; is the route gated?");
                Err(AuthError::AuthenticationRequired(AuthenticationReason::MissingToken))
            }
        }
    }
}

/// Session attached by [`optional_auth`](crate::optional_auth), if any.
#[derive(Debug, Clone)]
pub struct MaybeSession(pub Option<SessionContext>);

impl MaybeSession {
    pub fn is_authenticated(&self) -> bool {
        self.0.is_some()
    }

    pub fn status(&self) -> AuthStatus {
        AuthStatus::from(self.0.as_ref())
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for MaybeSession
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(Self(parts.extensions.get::<SessionContext>().cloned()))
    }
}
