//! Controllers for the admin site. Each model registers a [ModelAdmin] that owns the
//! save/delete hooks and the audit hooks for that model, and the generic views in [views]
//! drive them.

pub mod form;
pub mod history;
pub mod photo;
pub mod views;

use std::{fmt::Display, sync::Arc};

use async_trait::async_trait;
use error_stack::Report;
use serde::Serialize;

use self::{form::ModelForm, history::AdminHistory};
use crate::{
    auth::{permissions::ObjectRef, Principal},
    requests::RequestContext,
    Error,
};

/// The user and HTTP request behind an admin operation
#[derive(Debug, Clone)]
pub struct AdminRequest {
    pub user: Arc<Principal>,
    pub context: RequestContext,
}

/// A model that can be managed from the admin site.
pub trait AdminModel: Serialize + Send + Sync + 'static {
    type Id: Display + Send + Sync;

    /// The model name shown in logs and messages
    const OBJECT_NAME: &'static str;

    fn pk(&self) -> &Self::Id;

    /// A short human-readable description of the object
    fn object_repr(&self) -> String;

    fn object_ref(&self) -> ObjectRef {
        ObjectRef::new(Self::OBJECT_NAME, self.pk())
    }

    /// Pick `columns` out of the serialized object for a list row.
    fn list_row(&self, columns: &[&str]) -> serde_json::Map<String, serde_json::Value> {
        let value = serde_json::to_value(self).unwrap_or_default();
        columns
            .iter()
            .map(|column| {
                (
                    column.to_string(),
                    value.get(column).cloned().unwrap_or_default(),
                )
            })
            .collect()
    }
}

/// A named group of fields on the admin form
#[derive(Debug, Clone, Serialize)]
pub struct Fieldset {
    pub name: Option<&'static str>,
    pub fields: &'static [&'static str],
}

/// Presentation settings for a model's admin pages
#[derive(Debug, Clone, Serialize)]
pub struct AdminOptions {
    /// Columns shown in the object list
    pub list_display: &'static [&'static str],
    pub fieldsets: &'static [Fieldset],
}

/// The admin controller for one model.
#[async_trait]
pub trait ModelAdmin: Send + Sync {
    type Model: AdminModel;
    type Form: ModelForm<Model = Self::Model>;

    fn options(&self) -> &AdminOptions;

    /// Where the default log hooks write.
    fn history(&self) -> &dyn AdminHistory;

    async fn get_object(
        &self,
        id: &<Self::Model as AdminModel>::Id,
    ) -> Result<Option<Self::Model>, Report<Error>>;

    async fn get_queryset(&self) -> Result<Vec<Self::Model>, Report<Error>>;

    /// Whether the user may see `object`.
    async fn has_view_permission(
        &self,
        _request: &AdminRequest,
        _object: &Self::Model,
    ) -> Result<bool, Report<Error>> {
        Ok(true)
    }

    /// Whether the user may change or delete `object`.
    async fn has_change_permission(
        &self,
        _request: &AdminRequest,
        _object: &Self::Model,
    ) -> Result<bool, Report<Error>> {
        Ok(true)
    }

    /// Persist the form. `object` is the existing object when `change` is true.
    async fn save_model(
        &self,
        request: &AdminRequest,
        object: Option<Self::Model>,
        form: <Self::Form as ModelForm>::Cleaned,
        change: bool,
    ) -> Result<Self::Model, Report<Error>>;

    async fn delete_model(
        &self,
        request: &AdminRequest,
        object: &Self::Model,
    ) -> Result<(), Report<Error>>;

    async fn log_addition(
        &self,
        request: &AdminRequest,
        object: &Self::Model,
    ) -> Result<(), Report<Error>> {
        history::log_addition(self.history(), request, object).await
    }

    async fn log_change(
        &self,
        request: &AdminRequest,
        object: &Self::Model,
        message: &str,
    ) -> Result<(), Report<Error>> {
        history::log_change(self.history(), request, object, message).await
    }

    async fn log_deletion(
        &self,
        request: &AdminRequest,
        object: &Self::Model,
        object_repr: &str,
    ) -> Result<(), Report<Error>> {
        history::log_deletion(self.history(), request, object, object_repr).await
    }
}
