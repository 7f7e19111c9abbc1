use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use error_stack::{Report, ResultExt};
use tracing::{event, instrument, Level};
use typed_builder::TypedBuilder;

use super::{
    form::ModelForm,
    history::{self, AdminHistory},
    AdminModel, AdminOptions, AdminRequest, Fieldset, ModelAdmin,
};
use crate::{
    auth::{
        is_admin,
        permissions::{has_perm, Codename, ObjectPermissionRegistry},
    },
    event_log::{EventLogEntry, EventLogSink, InstanceRef, UserRef},
    models::photo::{
        form::PhotoCleaned, queries::PhotoStore, ImageFile, Photo, PhotoAdminPayload, PhotoId,
    },
    notification::{get_notice_recipients, NoticeContext, NoticeType, Notifier, SettingsStore},
    storage::Storage,
    Error,
};

pub const PHOTO_ADDED: u32 = 990100;
pub const PHOTO_EDITED: u32 = 990200;
pub const PHOTO_DELETED: u32 = 990300;

/// The site setting that lists who receives notices
pub const NOTICE_RECIPIENTS_SETTING: (&str, &str, &str) = ("site", "global", "allnoticerecipients");

pub const PHOTO_ADMIN_OPTIONS: AdminOptions = AdminOptions {
    list_display: &["title", "caption", "update_dt", "create_dt", "tags"],
    fieldsets: &[
        Fieldset {
            name: None,
            fields: &["image", "title", "caption", "tags"],
        },
        Fieldset {
            name: Some("Administrative"),
            fields: &[
                "allow_anonymous_view",
                "user_perms",
                "group_perms",
                "status",
                "status_detail",
            ],
        },
    ],
};

/// A notifier along with the notice type to send through it.
#[derive(Clone)]
pub struct NoticeDispatch {
    pub notifier: Arc<dyn Notifier>,
    pub notice_type: NoticeType,
}

/// The admin controller for photos
#[derive(TypedBuilder)]
pub struct PhotoAdmin {
    store: Arc<dyn PhotoStore>,
    permissions: Arc<dyn ObjectPermissionRegistry>,
    event_log: Arc<dyn EventLogSink>,
    history: Arc<dyn AdminHistory>,
    storage: Arc<Storage>,
    settings: Arc<dyn SettingsStore>,
    /// When None, notices are not sent.
    #[builder(default)]
    notices: Option<NoticeDispatch>,
}

impl PhotoAdmin {
    pub fn permissions(&self) -> &dyn ObjectPermissionRegistry {
        self.permissions.as_ref()
    }

    fn storage_key(id: &PhotoId, filename: &str) -> String {
        format!("photos/{id}/{filename}")
    }

    async fn remove_image(&self, key: &str) -> Result<(), Report<Error>> {
        self.storage
            .delete(key)
            .await
            .change_context(Error::Storage)
    }

    /// Replace the photo's grants with the submitted groups plus the creator.
    #[instrument(skip_all, fields(photo = %photo.id))]
    async fn reconcile_permissions(
        &self,
        photo: &Photo,
        form: &PhotoCleaned,
        change: bool,
    ) -> Result<(), Report<Error>> {
        let object = photo.object_ref();

        if change {
            self.permissions
                .remove_all(&object)
                .await
                .change_context(Error::Permissions)?;
        }

        self.permissions
            .assign_group(&form.group_perms, &object)
            .await
            .change_context(Error::Permissions)?;

        if let Some(creator) = photo.creator {
            self.permissions
                .assign(creator, &object)
                .await
                .change_context(Error::Permissions)?;
        }

        Ok(())
    }

    /// Tell the configured recipients about the save, unless the user is an administrator.
    #[instrument(skip_all, fields(photo = %photo.id))]
    async fn notify(&self, request: &AdminRequest, photo: &Photo) -> Result<(), Report<Error>> {
        if is_admin(&request.user) {
            return Ok(());
        }

        let (scope, scope_category, name) = NOTICE_RECIPIENTS_SETTING;
        let recipients =
            get_notice_recipients(self.settings.as_ref(), scope, scope_category, name)
                .await
                .change_context(Error::Notification)?;
        if recipients.is_empty() {
            event!(Level::DEBUG, "No notice recipients configured");
            return Ok(());
        }

        let Some(notices) = self.notices.as_ref() else {
            event!(Level::DEBUG, "Notices are not configured");
            return Ok(());
        };

        let context = NoticeContext {
            object: serde_json::to_value(photo).change_context(Error::Notification)?,
            object_name: Photo::OBJECT_NAME.to_string(),
            object_repr: photo.object_repr(),
            user: UserRef::from(request.user.as_ref()),
            request: request.context.clone(),
        };

        notices
            .notifier
            .send_emails(&recipients, &notices.notice_type, &context)
            .await
            .change_context(Error::Notification)
    }

    async fn log_event(
        &self,
        request: &AdminRequest,
        photo: &Photo,
        event_id: u32,
        verb: &str,
        object_repr: String,
    ) -> Result<(), Report<Error>> {
        let name = Photo::OBJECT_NAME;
        let entry = EventLogEntry::builder()
            .event_id(event_id)
            .event_data(format!(
                "{name} ({}) {verb} by {}",
                photo.id, request.user.username
            ))
            .description(format!("{name} {verb}"))
            .user(request.user.as_ref())
            .request(request.context.clone())
            .instance(InstanceRef {
                object_type: name.to_string(),
                object_id: photo.id.to_string(),
                object_repr,
            })
            .build();

        self.event_log
            .log(entry)
            .await
            .change_context(Error::EventLog)
    }
}

#[async_trait]
impl ModelAdmin for PhotoAdmin {
    type Model = Photo;
    type Form = PhotoAdminPayload;

    fn options(&self) -> &AdminOptions {
        &PHOTO_ADMIN_OPTIONS
    }

    fn history(&self) -> &dyn AdminHistory {
        self.history.as_ref()
    }

    async fn get_object(&self, id: &PhotoId) -> Result<Option<Photo>, Report<Error>> {
        self.store.get(*id).await
    }

    async fn get_queryset(&self) -> Result<Vec<Photo>, Report<Error>> {
        self.store.list().await
    }

    async fn has_view_permission(
        &self,
        request: &AdminRequest,
        object: &Photo,
    ) -> Result<bool, Report<Error>> {
        has_perm(
            self.permissions.as_ref(),
            &request.user,
            &object.object_ref(),
            Codename::View,
        )
        .await
        .change_context(Error::Permissions)
    }

    async fn has_change_permission(
        &self,
        request: &AdminRequest,
        object: &Photo,
    ) -> Result<bool, Report<Error>> {
        has_perm(
            self.permissions.as_ref(),
            &request.user,
            &object.object_ref(),
            Codename::Change,
        )
        .await
        .change_context(Error::Permissions)
    }

    #[instrument(skip_all, fields(user = %request.user.username, change = change))]
    async fn save_model(
        &self,
        request: &AdminRequest,
        object: Option<Photo>,
        form: <PhotoAdminPayload as ModelForm>::Cleaned,
        change: bool,
    ) -> Result<Photo, Report<Error>> {
        let mut instance = object.unwrap_or_default();

        instance.title = form.title.clone();
        instance.caption = form.caption.clone();
        instance.tags = form.tags.clone();
        instance.allow_anonymous_view = form.allow_anonymous_view;
        (instance.allow_user_view, instance.allow_user_edit) = form.user_perms;
        instance.status = form.status;
        instance.status_detail = form.status_detail.clone();

        if !change {
            let user = &request.user;
            instance.creator = Some(user.id);
            instance.creator_username = user.username.clone();
            instance.owner = Some(user.id);
            instance.owner_username = user.username.clone();
            instance.create_dt = Utc::now();
        }

        let previous_key = instance.image.as_ref().map(|image| image.key.clone());
        if let Some(image) = &form.image {
            let key = Self::storage_key(&instance.id, &image.filename);
            self.storage
                .put(&key, image.content.clone())
                .await
                .change_context(Error::Storage)?;
            instance.image = Some(ImageFile {
                key,
                filename: image.filename.clone(),
                size: image.content.len(),
            });
        }

        instance.update_dt = Utc::now();
        let instance = self.store.save(instance).await?;

        let current_key = instance.image.as_ref().map(|image| image.key.as_str());
        if let Some(previous_key) = previous_key.filter(|key| Some(key.as_str()) != current_key) {
            self.remove_image(&previous_key).await?;
        }

        self.reconcile_permissions(&instance, &form, change).await?;
        self.notify(request, &instance).await?;

        Ok(instance)
    }

    #[instrument(skip_all, fields(photo = %object.id))]
    async fn delete_model(
        &self,
        _request: &AdminRequest,
        object: &Photo,
    ) -> Result<(), Report<Error>> {
        let deleted = self.store.delete(object.id).await?;
        if !deleted {
            return Err(Report::new(Error::NotFound(Photo::OBJECT_NAME)));
        }

        self.permissions
            .remove_all(&object.object_ref())
            .await
            .change_context(Error::Permissions)?;

        if let Some(image) = &object.image {
            self.remove_image(&image.key).await?;
        }

        Ok(())
    }

    async fn log_addition(&self, request: &AdminRequest, object: &Photo) -> Result<(), Report<Error>> {
        history::log_addition(self.history(), request, object).await?;
        self.log_event(request, object, PHOTO_ADDED, "added", object.object_repr())
            .await
    }

    async fn log_change(
        &self,
        request: &AdminRequest,
        object: &Photo,
        message: &str,
    ) -> Result<(), Report<Error>> {
        history::log_change(self.history(), request, object, message).await?;
        self.log_event(request, object, PHOTO_EDITED, "edited", object.object_repr())
            .await
    }

    async fn log_deletion(
        &self,
        request: &AdminRequest,
        object: &Photo,
        object_repr: &str,
    ) -> Result<(), Report<Error>> {
        history::log_deletion(self.history(), request, object, object_repr).await?;
        self.log_event(
            request,
            object,
            PHOTO_DELETED,
            "deleted",
            object_repr.to_string(),
        )
        .await
    }
}
