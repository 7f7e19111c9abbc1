//! The add, change, and delete flows shared by every [ModelAdmin].

use error_stack::Report;
use tracing::{event, instrument, Level};

use super::{
    form::{construct_change_message, ModelForm},
    AdminModel, AdminRequest, ModelAdmin,
};
use crate::Error;

type ModelOf<A> = <A as ModelAdmin>::Model;
type IdOf<A> = <ModelOf<A> as AdminModel>::Id;

fn object_name<A: ModelAdmin>() -> &'static str {
    <ModelOf<A> as AdminModel>::OBJECT_NAME
}

fn not_found<A: ModelAdmin>() -> Report<Error> {
    Report::new(Error::NotFound(object_name::<A>()))
}

/// Load the object, failing if it is missing or the user may not change it.
async fn get_changeable<A: ModelAdmin>(
    admin: &A,
    request: &AdminRequest,
    id: &IdOf<A>,
) -> Result<ModelOf<A>, Report<Error>> {
    let existing = admin.get_object(id).await?.ok_or_else(not_found::<A>)?;
    if !admin.has_change_permission(request, &existing).await? {
        return Err(Report::new(Error::Forbidden));
    }
    Ok(existing)
}

/// Validate and save a new object, then log the addition.
#[instrument(skip_all, fields(user = %request.user.username))]
pub async fn add_view<A: ModelAdmin>(
    admin: &A,
    request: &AdminRequest,
    form: A::Form,
) -> Result<ModelOf<A>, Report<Error>> {
    let cleaned = form.clean(None).map_err(|e| Report::new(Error::Validation(e)))?;
    let object = admin.save_model(request, None, cleaned, false).await?;
    admin.log_addition(request, &object).await?;

    event!(Level::INFO, object_id = %object.pk(), "Added {}", object_name::<A>());
    Ok(object)
}

/// Validate and save changes to an existing object, then log the change.
#[instrument(skip_all, fields(user = %request.user.username, object_id = %id))]
pub async fn change_view<A: ModelAdmin>(
    admin: &A,
    request: &AdminRequest,
    id: &IdOf<A>,
    form: A::Form,
) -> Result<ModelOf<A>, Report<Error>> {
    let existing = get_changeable(admin, request, id).await?;
    let cleaned = form
        .clean(Some(&existing))
        .map_err(|e| Report::new(Error::Validation(e)))?;
    let message = construct_change_message(&A::Form::changed_data(&cleaned, &existing));

    let object = admin.save_model(request, Some(existing), cleaned, true).await?;
    admin.log_change(request, &object, &message).await?;

    event!(Level::INFO, %message, "Changed {}", object_name::<A>());
    Ok(object)
}

/// Delete an existing object, then log the deletion.
#[instrument(skip_all, fields(user = %request.user.username, object_id = %id))]
pub async fn delete_view<A: ModelAdmin>(
    admin: &A,
    request: &AdminRequest,
    id: &IdOf<A>,
) -> Result<(), Report<Error>> {
    let existing = get_changeable(admin, request, id).await?;
    let object_repr = existing.object_repr();

    admin.delete_model(request, &existing).await?;
    admin.log_deletion(request, &existing, &object_repr).await?;

    event!(Level::INFO, "Deleted {}", object_name::<A>());
    Ok(())
}

/// One row per object the user may view, holding only the `list_display` columns.
pub async fn changelist_view<A: ModelAdmin>(
    admin: &A,
    request: &AdminRequest,
) -> Result<Vec<serde_json::Map<String, serde_json::Value>>, Report<Error>> {
    let columns = admin.options().list_display;
    let mut rows = Vec::new();
    for object in admin.get_queryset().await? {
        if admin.has_view_permission(request, &object).await? {
            rows.push(object.list_row(columns));
        }
    }
    Ok(rows)
}

/// Load one object the user may view.
pub async fn detail_view<A: ModelAdmin>(
    admin: &A,
    request: &AdminRequest,
    id: &IdOf<A>,
) -> Result<ModelOf<A>, Report<Error>> {
    let object = admin.get_object(id).await?.ok_or_else(not_found::<A>)?;
    if !admin.has_view_permission(request, &object).await? {
        return Err(Report::new(Error::Forbidden));
    }
    Ok(object)
}
