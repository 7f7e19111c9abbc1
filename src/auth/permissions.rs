use std::{
    collections::{BTreeSet, HashSet},
    sync::Mutex,
};

use async_trait::async_trait;
use axum::{response::IntoResponse, Json};
use error_stack::Report;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::instrument;

use super::{Authed, GroupId, Principal, UserId};

#[derive(Debug, Serialize)]
pub struct PermissionInfo {
    name: &'static str,
    description: &'static str,
    key: &'static str,
}

pub const PERMISSIONS: &[PermissionInfo] = &[
    PermissionInfo {
        name: "View Images",
        description: "View an Image object",
        key: "Image::view",
    },
    PermissionInfo {
        name: "Change Images",
        description: "Edit an Image object",
        key: "Image::change",
    },
    PermissionInfo {
        name: "Delete Images",
        description: "Delete Image objects",
        key: "Image::delete",
    },
];

pub async fn list_permissions(_authed: Authed) -> impl IntoResponse {
    Json(PERMISSIONS)
}

/// An error from the object permission registry
#[derive(Debug, Error)]
#[error("Object permission registry failed")]
pub struct PermissionError;

/// A reference to one specific record.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ObjectRef {
    /// The record type, such as `Image`
    pub object_type: String,
    pub object_id: String,
}

impl ObjectRef {
    pub fn new(object_type: impl Into<String>, object_id: impl ToString) -> Self {
        Self {
            object_type: object_type.into(),
            object_id: object_id.to_string(),
        }
    }
}

/// Who a grant applies to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(tag = "type", content = "id", rename_all = "snake_case")]
pub enum Grantee {
    User(UserId),
    Group(GroupId),
}

/// The capability a grant gives on its object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Codename {
    View,
    Change,
}

impl Codename {
    /// The codenames given by [ObjectPermissionRegistry::assign] and
    /// [ObjectPermissionRegistry::assign_group].
    pub const DEFAULT: [Codename; 2] = [Codename::View, Codename::Change];
}

/// A permission on a single object, held by a user or group.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Grant {
    pub grantee: Grantee,
    pub object: ObjectRef,
    pub codename: Codename,
}

/// Storage for object-level permissions.
#[async_trait]
pub trait ObjectPermissionRegistry: Send + Sync {
    /// Give the user view and change permissions on the object.
    async fn assign(&self, user: UserId, object: &ObjectRef) -> Result<(), Report<PermissionError>>;

    /// Give each group view and change permissions on the object.
    async fn assign_group(
        &self,
        groups: &BTreeSet<GroupId>,
        object: &ObjectRef,
    ) -> Result<(), Report<PermissionError>>;

    /// Remove every grant on the object.
    async fn remove_all(&self, object: &ObjectRef) -> Result<(), Report<PermissionError>>;

    /// List the grants on the object.
    async fn grants_for(&self, object: &ObjectRef) -> Result<Vec<Grant>, Report<PermissionError>>;
}

/// Check whether the user holds `codename` on the object, directly or through a group.
/// Superusers hold every permission.
#[instrument(skip(registry, user), fields(user = %user.username))]
pub async fn has_perm(
    registry: &dyn ObjectPermissionRegistry,
    user: &Principal,
    object: &ObjectRef,
    codename: Codename,
) -> Result<bool, Report<PermissionError>> {
    if !user.active {
        return Ok(false);
    }

    if user.is_superuser {
        return Ok(true);
    }

    let groups = user.groups.iter().collect::<HashSet<_>>();
    let grants = registry.grants_for(object).await?;
    Ok(grants.iter().any(|grant| {
        grant.codename == codename
            && match &grant.grantee {
                Grantee::User(id) => id == &user.id,
                Grantee::Group(id) => groups.contains(id),
            }
    }))
}

/// An [ObjectPermissionRegistry] that keeps its grants in memory.
#[derive(Default)]
pub struct InMemoryPermissionRegistry {
    grants: Mutex<BTreeSet<Grant>>,
}

impl InMemoryPermissionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&self, grantee: Grantee, object: &ObjectRef) -> Result<(), Report<PermissionError>> {
        let mut grants = self
            .grants
            .lock()
            .map_err(|_| Report::new(PermissionError))?;
        for codename in Codename::DEFAULT {
            grants.insert(Grant {
                grantee,
                object: object.clone(),
                codename,
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ObjectPermissionRegistry for InMemoryPermissionRegistry {
    #[instrument(skip(self))]
    async fn assign(&self, user: UserId, object: &ObjectRef) -> Result<(), Report<PermissionError>> {
        self.insert(Grantee::User(user), object)
    }

    #[instrument(skip(self))]
    async fn assign_group(
        &self,
        groups: &BTreeSet<GroupId>,
        object: &ObjectRef,
    ) -> Result<(), Report<PermissionError>> {
        for group in groups {
            self.insert(Grantee::Group(*group), object)?;
        }
        Ok(())
    }

    #[instrument(skip(self))]
    async fn remove_all(&self, object: &ObjectRef) -> Result<(), Report<PermissionError>> {
        self.grants
            .lock()
            .map_err(|_| Report::new(PermissionError))?
            .retain(|grant| &grant.object != object);
        Ok(())
    }

    async fn grants_for(&self, object: &ObjectRef) -> Result<Vec<Grant>, Report<PermissionError>> {
        let grants = self
            .grants
            .lock()
            .map_err(|_| Report::new(PermissionError))?;
        Ok(grants
            .iter()
            .filter(|grant| &grant.object == object)
            .cloned()
            .collect())
    }
}
