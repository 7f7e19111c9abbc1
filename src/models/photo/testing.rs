use std::collections::BTreeSet;

use base64::Engine;

use super::{ImageUpload, PhotoAdminPayload};
use crate::auth::GroupId;

/// A tiny stand-in for image bytes
pub const TEST_IMAGE: &[u8] = b"\x89PNG\r\n\x1a\nnot-really-a-png";

/// Generate a PhotoAdminPayload for testing.
/// Parameter `i` controls the value of some of the fields, just to make sure that the objects
/// don't all look identical.
pub fn make_payload(i: usize) -> PhotoAdminPayload {
    PhotoAdminPayload {
        image: Some(ImageUpload {
            filename: format!("photo-{i}.png"),
            content: base64::engine::general_purpose::STANDARD.encode(TEST_IMAGE),
        }),
        title: format!("Test photo {i}"),
        caption: format!("Caption {i}"),
        tags: format!("test, photo-{i}"),
        allow_anonymous_view: true,
        user_perms: (true, i % 2 == 0),
        group_perms: BTreeSet::new(),
        status: true,
        status_detail: "active".to_string(),
    }
}

/// Like [make_payload], but granting the photo to `groups`, and without a new image.
pub fn make_update_payload(i: usize, groups: &[GroupId]) -> PhotoAdminPayload {
    PhotoAdminPayload {
        image: None,
        group_perms: groups.iter().copied().collect(),
        ..make_payload(i)
    }
}
