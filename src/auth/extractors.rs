use std::sync::Arc;

use async_trait::async_trait;
use axum::{
    extract::{FromRef, FromRequestParts},
    http::request::Parts,
};
use axum_extra::{
    headers::{authorization::Bearer, Authorization},
    TypedHeader,
};
use tracing::{event, Level};

use super::{AuthError, Principal, UserDirectory};

/// Extract the user from the request's Bearer token, rejecting the request unless the user
/// may use the admin site.
#[derive(Debug, Clone)]
pub struct Authed(pub Arc<Principal>);

impl std::ops::Deref for Authed {
    type Target = Principal;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for Authed
where
    S: Send + Sync,
    Arc<dyn UserDirectory>: FromRef<S>,
{
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let bearer = TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
            .await
            .map_err(|_| AuthError::Unauthenticated)?;

        let directory = Arc::<dyn UserDirectory>::from_ref(state);
        let user = directory
            .get_user_by_api_key(bearer.0.token())
            .await
            .map_err(|e| {
                event!(Level::ERROR, err=?e, "User lookup failed");
                AuthError::Lookup
            })?
            .ok_or(AuthError::Unauthenticated)?;

        user.check_admin_access()?;

        Ok(Authed(Arc::new(user)))
    }
}
