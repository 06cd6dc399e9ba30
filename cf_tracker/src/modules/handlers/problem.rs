use crate::modules::{
    error::ApiError,
    models::request::{AddProblemRequest, ValidatedJson},
};
use axum::{
    extract::{Extension, Path},
    Json,
};
use cf_tracker_libs::{
    codeforces::{JudgeApi, ProblemId},
    store::{CachedSubmission, NewProblem, RecordStore, TrackedProblem},
    MessageResponse,
};
use std::sync::Arc;

pub async fn list_problems(
    Extension(store): Extension<Arc<RecordStore>>,
) -> Json<Vec<TrackedProblem>> {
    Json(store.problems())
}

pub async fn add_problem(
    Extension(store): Extension<Arc<RecordStore>>,
    Extension(judge): Extension<Arc<dyn JudgeApi>>,
    ValidatedJson(request): ValidatedJson<AddProblemRequest>,
) -> Result<Json<TrackedProblem>, ApiError> {
    let problem_id: ProblemId = request
        .problem_id
        .parse()
        .map_err(|_| ApiError::Validation(String::from("Invalid problem ID format")))?;

    if store.problem(&request.problem_id).is_some() {
        return Err(ApiError::AlreadyExists(String::from("Problem already exists")));
    }

    let info = judge.problem(&problem_id).await.map_err(|e| {
        tracing::warn!("failed to validate problem {} against the judge: {:?}", problem_id, e);
        ApiError::Upstream(String::from("Invalid problem ID"))
    })?;

    let problem = store.create_problem(NewProblem::from_judge(&problem_id, info))?;
    tracing::info!("Problem {} is now tracked", problem.problem_id);

    Ok(Json(problem))
}

pub async fn delete_problem(
    Path(problem_id): Path<String>,
    Extension(store): Extension<Arc<RecordStore>>,
) -> Result<Json<MessageResponse>, ApiError> {
    if store.delete_problem(&problem_id) {
        tracing::info!("Problem {} was deleted", problem_id);
        Ok(Json(MessageResponse::new("Problem deleted successfully")))
    } else {
        Err(ApiError::NotFound(String::from("Problem not found")))
    }
}

pub async fn problem_submissions(
    Path(problem_id): Path<String>,
    Extension(store): Extension<Arc<RecordStore>>,
) -> Result<Json<Vec<CachedSubmission>>, ApiError> {
    if store.problem(&problem_id).is_none() {
        return Err(ApiError::NotFound(String::from("Problem not found")));
    }

    Ok(Json(store.submissions_by_problem(&problem_id)))
}
