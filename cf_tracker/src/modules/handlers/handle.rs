use crate::modules::{
    error::ApiError,
    models::request::{AddHandleRequest, ValidatedJson},
};
use axum::{
    extract::{Extension, Path},
    Json,
};
use cf_tracker_libs::{
    codeforces::JudgeApi,
    store::{CachedSubmission, NewUser, RecordStore, TrackedUser, UserPatch},
    MessageResponse,
};
use std::sync::Arc;

pub async fn list_handles(Extension(store): Extension<Arc<RecordStore>>) -> Json<Vec<TrackedUser>> {
    Json(store.users())
}

pub async fn add_handle(
    Extension(store): Extension<Arc<RecordStore>>,
    Extension(judge): Extension<Arc<dyn JudgeApi>>,
    ValidatedJson(request): ValidatedJson<AddHandleRequest>,
) -> Result<Json<TrackedUser>, ApiError> {
    let handle = request.handle.trim();

    if store.user(handle).is_some() {
        return Err(ApiError::AlreadyExists(String::from("Handle already exists")));
    }

    let info = judge.user_info(handle).await.map_err(|e| {
        tracing::warn!("failed to validate handle {} against the judge: {:?}", handle, e);
        ApiError::Upstream(String::from("Invalid Codeforces handle"))
    })?;

    // the judge returns the canonical spelling, which becomes the key
    let user = store.create_user(NewUser::from(info))?;
    tracing::info!("Handle {} is now tracked", user.handle);

    Ok(Json(user))
}

pub async fn delete_handle(
    Path(handle): Path<String>,
    Extension(store): Extension<Arc<RecordStore>>,
) -> Result<Json<MessageResponse>, ApiError> {
    if store.delete_user(&handle) {
        tracing::info!("Handle {} and its cached submissions were deleted", handle);
        Ok(Json(MessageResponse::new("Handle deleted successfully")))
    } else {
        Err(ApiError::NotFound(String::from("Handle not found")))
    }
}

pub async fn refresh_handle(
    Path(handle): Path<String>,
    Extension(store): Extension<Arc<RecordStore>>,
    Extension(judge): Extension<Arc<dyn JudgeApi>>,
) -> Result<Json<TrackedUser>, ApiError> {
    if store.user(&handle).is_none() {
        return Err(ApiError::NotFound(String::from("Handle not found")));
    }

    let info = judge.user_info(&handle).await.map_err(|e| {
        tracing::warn!("failed to refresh handle {} from the judge: {:?}", handle, e);
        ApiError::Upstream(String::from("Invalid Codeforces handle"))
    })?;

    store
        .update_user(&handle, UserPatch::from(info))
        .map(Json)
        .ok_or_else(|| ApiError::NotFound(String::from("Handle not found")))
}

pub async fn handle_submissions(
    Path(handle): Path<String>,
    Extension(store): Extension<Arc<RecordStore>>,
) -> Result<Json<Vec<CachedSubmission>>, ApiError> {
    if store.user(&handle).is_none() {
        return Err(ApiError::NotFound(String::from("Handle not found")));
    }

    Ok(Json(store.submissions_by_handle(&handle)))
}
