mod extractors;
pub mod permissions;
mod users;

use axum::response::IntoResponse;
pub use extractors::*;
use serde::{Deserialize, Serialize};
use thiserror::Error;
pub use users::*;

use crate::{errors::HttpError, make_object_id};

make_object_id!(UserId, usr);
make_object_id!(GroupId, grp);

/// An error related to authentication
#[derive(Debug, Error)]
pub enum AuthError {
    /// The user is not logged in
    #[error("Not authenticated")]
    Unauthenticated,
    /// The user is inactive
    #[error("User is disabled")]
    Disabled,
    /// The user is active, but does not have access to the admin site
    #[error("User does not have admin site access")]
    NotStaff,
    /// The user directory failed
    #[error("Failed to look up user")]
    Lookup,
}

impl HttpError for AuthError {
    fn status_code(&self) -> axum::http::StatusCode {
        match self {
            Self::Unauthenticated => axum::http::StatusCode::UNAUTHORIZED,
            Self::Disabled | Self::NotStaff => axum::http::StatusCode::FORBIDDEN,
            Self::Lookup => axum::http::StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_kind(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "unauthenticated",
            Self::Disabled => "disabled",
            Self::NotStaff => "not_staff",
            Self::Lookup => "auth_lookup",
        }
    }
}

impl IntoResponse for AuthError {
    fn into_response(self) -> axum::response::Response {
        self.to_response()
    }
}

/// The user performing a request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Principal {
    pub id: UserId,
    pub username: String,
    pub email: String,
    pub active: bool,
    pub is_staff: bool,
    pub is_superuser: bool,
    /// Groups the user belongs to
    #[serde(default)]
    pub groups: Vec<GroupId>,
}

impl Principal {
    /// Return Ok if this user may use the admin site.
    pub fn check_admin_access(&self) -> Result<(), AuthError> {
        if !self.active {
            return Err(AuthError::Disabled);
        }

        if !(self.is_staff || self.is_superuser) {
            return Err(AuthError::NotStaff);
        }

        Ok(())
    }
}

impl std::fmt::Display for Principal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.username)
    }
}

/// Returns true if the user holds site-wide administrative privilege.
pub fn is_admin(user: &Principal) -> bool {
    user.active && user.is_superuser
}
