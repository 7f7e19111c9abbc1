use std::collections::BTreeSet;

use base64::Engine;
use bytes::Bytes;

use super::{Photo, PhotoAdminPayload};
use crate::{
    admin::form::{FormErrors, ModelForm},
    auth::GroupId,
};

pub const MAX_TITLE_LEN: usize = 200;
pub const STATUS_DETAIL_CHOICES: &[&str] = &["active", "inactive", "pending"];
pub const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "gif", "webp"];

/// A decoded image upload
#[derive(Debug, Clone)]
pub struct ImageData {
    pub filename: String,
    pub content: Bytes,
}

/// Validated photo form data
#[derive(Debug, Clone)]
pub struct PhotoCleaned {
    pub image: Option<ImageData>,
    pub title: String,
    pub caption: String,
    pub tags: String,
    pub allow_anonymous_view: bool,
    pub user_perms: (bool, bool),
    pub group_perms: BTreeSet<GroupId>,
    pub status: bool,
    pub status_detail: String,
}

/// Trim tag labels and join them with commas, dropping blanks and repeats.
pub fn normalize_tags(tags: &str) -> String {
    let mut labels: Vec<&str> = Vec::new();
    for label in tags.split(',').map(str::trim).filter(|l| !l.is_empty()) {
        if !labels.contains(&label) {
            labels.push(label);
        }
    }
    labels.join(", ")
}

fn clean_filename(filename: &str) -> Option<String> {
    let name = filename
        .rsplit(|c| c == '/' || c == '\\')
        .next()
        .unwrap_or_default()
        .trim();
    let (stem, extension) = name.rsplit_once('.')?;
    let valid = !stem.is_empty()
        && IMAGE_EXTENSIONS
            .iter()
            .any(|ext| ext.eq_ignore_ascii_case(extension));
    valid.then(|| name.to_string())
}

impl ModelForm for PhotoAdminPayload {
    type Model = Photo;
    type Cleaned = PhotoCleaned;

    fn clean(self, instance: Option<&Photo>) -> Result<PhotoCleaned, FormErrors> {
        let mut errors = FormErrors::new();

        let title = self.title.trim().to_string();
        if title.chars().count() > MAX_TITLE_LEN {
            errors.add(
                "title",
                format!("Ensure this value has at most {MAX_TITLE_LEN} characters."),
            );
        }

        if !STATUS_DETAIL_CHOICES.contains(&self.status_detail.as_str()) {
            errors.add(
                "status_detail",
                format!(
                    "Select a valid choice. {} is not one of the available choices.",
                    self.status_detail
                ),
            );
        }

        let image = match self.image {
            Some(upload) => {
                let filename = clean_filename(&upload.filename);
                let content = base64::engine::general_purpose::STANDARD
                    .decode(upload.content.trim())
                    .ok()
                    .filter(|c| !c.is_empty());
                match (filename, content) {
                    (Some(filename), Some(content)) => Some(ImageData {
                        filename,
                        content: Bytes::from(content),
                    }),
                    (None, _) => {
                        errors.add(
                            "image",
                            format!(
                                "Upload a valid image. Allowed extensions are: {}.",
                                IMAGE_EXTENSIONS.join(", ")
                            ),
                        );
                        None
                    }
                    (_, None) => {
                        errors.add("image", "The submitted file is empty or not valid base64.");
                        None
                    }
                }
            }
            None => {
                let has_existing = instance.is_some_and(|photo| photo.image.is_some());
                if !has_existing {
                    errors.add("image", "This field is required.");
                }
                None
            }
        };

        errors.into_result()?;

        Ok(PhotoCleaned {
            image,
            title,
            caption: self.caption,
            tags: normalize_tags(&self.tags),
            allow_anonymous_view: self.allow_anonymous_view,
            user_perms: self.user_perms,
            group_perms: self.group_perms,
            status: self.status,
            status_detail: self.status_detail,
        })
    }

    fn changed_data(cleaned: &PhotoCleaned, instance: &Photo) -> Vec<&'static str> {
        let checks = [
            ("image", cleaned.image.is_some()),
            ("title", cleaned.title != instance.title),
            ("caption", cleaned.caption != instance.caption),
            ("tags", cleaned.tags != instance.tags),
            (
                "allow_anonymous_view",
                cleaned.allow_anonymous_view != instance.allow_anonymous_view,
            ),
            (
                "user_perms",
                cleaned.user_perms != (instance.allow_user_view, instance.allow_user_edit),
            ),
            ("status", cleaned.status != instance.status),
            ("status_detail", cleaned.status_detail != instance.status_detail),
        ];

        checks
            .into_iter()
            .filter_map(|(field, changed)| changed.then_some(field))
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::models::photo::testing::make_payload;

    #[test]
    fn tags_are_normalized() {
        assert_eq!(normalize_tags(" beach, sunset ,,beach,  "), "beach, sunset");
        assert_eq!(normalize_tags(""), "");
    }

    #[test]
    fn filenames() {
        assert_eq!(clean_filename("../../etc/cat.JPG").as_deref(), Some("cat.JPG"));
        assert_eq!(clean_filename("C:\\pics\\dog.png").as_deref(), Some("dog.png"));
        assert_eq!(clean_filename("notes.txt"), None);
        assert_eq!(clean_filename(".png"), None);
        assert_eq!(clean_filename("noextension"), None);
    }

    #[test]
    fn image_required_when_adding() {
        let mut payload = make_payload(1);
        payload.image = None;

        let errors = payload.clone().clean(None).unwrap_err();
        assert_eq!(errors.get("image").unwrap(), ["This field is required."]);

        let mut existing = Photo::new();
        existing.image = Some(crate::models::photo::ImageFile {
            key: "photos/x/a.png".to_string(),
            filename: "a.png".to_string(),
            size: 3,
        });
        assert!(payload.clean(Some(&existing)).is_ok());
    }

    #[test]
    fn rejects_long_title_and_bad_status() {
        let mut payload = make_payload(1);
        payload.title = "x".repeat(MAX_TITLE_LEN + 1);
        payload.status_detail = "archived".to_string();

        let errors = payload.clean(None).unwrap_err();
        assert!(errors.get("title").is_some());
        assert!(errors.get("status_detail").is_some());
        assert!(errors.get("image").is_none());
    }

    #[test]
    fn rejects_invalid_upload() {
        let mut payload = make_payload(1);
        payload.image.as_mut().unwrap().content = "%%%".to_string();
        let errors = payload.clean(None).unwrap_err();
        assert!(errors.get("image").is_some());
    }

    #[test]
    fn changed_fields() {
        let cleaned = make_payload(1).clean(None).unwrap();
        let mut existing = Photo::new();
        existing.title = cleaned.title.clone();
        existing.caption = cleaned.caption.clone();
        existing.tags = cleaned.tags.clone();
        (existing.allow_user_view, existing.allow_user_edit) = cleaned.user_perms;

        let mut cleaned = cleaned;
        cleaned.image = None;
        assert!(PhotoAdminPayload::changed_data(&cleaned, &existing).is_empty());

        cleaned.title = "Another".to_string();
        cleaned.user_perms = (!cleaned.user_perms.0, cleaned.user_perms.1);
        assert_eq!(
            PhotoAdminPayload::changed_data(&cleaned, &existing),
            vec!["title", "user_perms"]
        );
    }
}
