use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing, Json, Router,
};
use error_stack::ResultExt;

use super::{PhotoAdminPayload, PhotoId};
use crate::{
    admin::{
        views::{add_view, change_view, changelist_view, delete_view, detail_view},
        AdminModel, AdminRequest, ModelAdmin,
    },
    auth::Authed,
    errors::WrapReport,
    requests::RequestContext,
    server::ServerState,
    Error,
};

fn admin_request(auth: Authed, context: RequestContext) -> AdminRequest {
    AdminRequest {
        user: auth.0,
        context,
    }
}

async fn list(
    State(state): State<ServerState>,
    auth: Authed,
    context: RequestContext,
) -> Result<impl IntoResponse, WrapReport<Error>> {
    let request = admin_request(auth, context);
    let rows = changelist_view(&state.photo_admin, &request).await?;
    Ok(Json(rows))
}

async fn options(State(state): State<ServerState>, _auth: Authed) -> impl IntoResponse {
    Json(state.photo_admin.options().clone())
}

async fn get(
    State(state): State<ServerState>,
    auth: Authed,
    context: RequestContext,
    Path(id): Path<PhotoId>,
) -> Result<impl IntoResponse, WrapReport<Error>> {
    let request = admin_request(auth, context);
    let photo = detail_view(&state.photo_admin, &request, &id).await?;
    Ok(Json(photo))
}

async fn create(
    State(state): State<ServerState>,
    auth: Authed,
    context: RequestContext,
    Json(payload): Json<PhotoAdminPayload>,
) -> Result<impl IntoResponse, WrapReport<Error>> {
    let request = admin_request(auth, context);
    let photo = add_view(&state.photo_admin, &request, payload).await?;

    Ok((StatusCode::CREATED, Json(photo)))
}

async fn update(
    State(state): State<ServerState>,
    auth: Authed,
    context: RequestContext,
    Path(id): Path<PhotoId>,
    Json(payload): Json<PhotoAdminPayload>,
) -> Result<impl IntoResponse, WrapReport<Error>> {
    let request = admin_request(auth, context);
    let photo = change_view(&state.photo_admin, &request, &id, payload).await?;

    Ok(Json(photo))
}

async fn delete(
    State(state): State<ServerState>,
    auth: Authed,
    context: RequestContext,
    Path(id): Path<PhotoId>,
) -> Result<impl IntoResponse, WrapReport<Error>> {
    let request = admin_request(auth, context);
    delete_view(&state.photo_admin, &request, &id).await?;

    Ok(StatusCode::OK)
}

async fn list_permissions(
    State(state): State<ServerState>,
    auth: Authed,
    Path(id): Path<PhotoId>,
) -> Result<impl IntoResponse, WrapReport<Error>> {
    let admin = &state.photo_admin;
    let photo = admin
        .get_object(&id)
        .await?
        .ok_or(Error::NotFound("Image"))?;

    let request = admin_request(auth, RequestContext::default());
    if !admin.has_change_permission(&request, &photo).await? {
        return Err(Error::Forbidden.into());
    }

    let grants = admin
        .permissions()
        .grants_for(&photo.object_ref())
        .await
        .change_context(Error::Permissions)?;

    Ok(Json(grants))
}

pub fn create_routes() -> Router<ServerState> {
    Router::new()
        .route("/photos", routing::get(list).post(create))
        .route("/photos/options", routing::get(options))
        .route(
            "/photos/:id",
            routing::get(get).put(update).delete(delete),
        )
        .route("/photos/:id/permissions", routing::get(list_permissions))
}
