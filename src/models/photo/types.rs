use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::PhotoId;
use crate::{
    admin::AdminModel,
    auth::{GroupId, UserId},
};

/// An uploaded image file, as kept on the photo record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageFile {
    /// The storage key of the file
    pub key: String,
    pub filename: String,
    pub size: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Photo {
    pub id: PhotoId,
    pub title: String,
    pub caption: String,
    pub image: Option<ImageFile>,
    /// Comma-separated tag labels
    pub tags: String,
    pub allow_anonymous_view: bool,
    pub allow_user_view: bool,
    pub allow_user_edit: bool,
    pub status: bool,
    pub status_detail: String,
    pub creator: Option<UserId>,
    pub creator_username: String,
    pub owner: Option<UserId>,
    pub owner_username: String,
    pub create_dt: DateTime<Utc>,
    pub update_dt: DateTime<Utc>,
}

impl Photo {
    /// An unsaved photo with default values
    pub fn new() -> Self {
        let now = Utc::now();
        Self {
            id: PhotoId::new(),
            title: String::new(),
            caption: String::new(),
            image: None,
            tags: String::new(),
            allow_anonymous_view: Self::default_allow_anonymous_view(),
            allow_user_view: false,
            allow_user_edit: false,
            status: Self::default_status(),
            status_detail: Self::default_status_detail(),
            creator: None,
            creator_username: String::new(),
            owner: None,
            owner_username: String::new(),
            create_dt: now,
            update_dt: now,
        }
    }

    pub fn default_allow_anonymous_view() -> bool {
        true
    }

    pub fn default_status() -> bool {
        true
    }

    pub fn default_status_detail() -> String {
        "active".to_string()
    }
}

impl Default for Photo {
    fn default() -> Self {
        Self::new()
    }
}

impl AdminModel for Photo {
    type Id = PhotoId;

    const OBJECT_NAME: &'static str = "Image";

    fn pk(&self) -> &PhotoId {
        &self.id
    }

    fn object_repr(&self) -> String {
        if self.title.is_empty() {
            self.id.to_string()
        } else {
            self.title.clone()
        }
    }
}

/// An image file submitted with the admin form
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub struct ImageUpload {
    pub filename: String,
    /// Base64-encoded file contents
    pub content: String,
}

/// The admin form submission for a photo
#[derive(Debug, Clone, Deserialize)]
#[cfg_attr(test, derive(Serialize))]
pub struct PhotoAdminPayload {
    #[serde(default)]
    pub image: Option<ImageUpload>,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub caption: String,
    #[serde(default)]
    pub tags: String,
    #[serde(default = "Photo::default_allow_anonymous_view")]
    pub allow_anonymous_view: bool,
    /// Whether logged-in users may (view, edit) the photo
    #[serde(default)]
    pub user_perms: (bool, bool),
    /// Groups given view and change permissions on the photo
    #[serde(default)]
    pub group_perms: BTreeSet<GroupId>,
    #[serde(default = "Photo::default_status")]
    pub status: bool,
    #[serde(default = "Photo::default_status_detail")]
    pub status_detail: String,
}
