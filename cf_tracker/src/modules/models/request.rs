use crate::modules::error::ApiError;
use axum::{
    async_trait,
    body::HttpBody,
    extract::FromRequest,
    http::Request,
    BoxError, Json,
};
use cf_tracker_libs::codeforces::ProblemId;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use validator::{Validate, ValidationError, ValidationErrors};

const MAX_HANDLE_LENGTH: usize = 64;

fn validate_handle(value: &str) -> Result<(), ValidationError> {
    let handle = value.trim();
    if handle.is_empty() {
        Err(ValidationError::new("Handle is required"))
    } else if handle.chars().count() > MAX_HANDLE_LENGTH {
        Err(ValidationError::new("Handle is too long"))
    } else {
        Ok(())
    }
}

fn validate_problem_id(value: &str) -> Result<(), ValidationError> {
    if value.is_empty() {
        return Err(ValidationError::new("Problem ID is required"));
    }
    match value.parse::<ProblemId>() {
        Ok(_) => Ok(()),
        Err(_) => Err(ValidationError::new("Invalid problem ID format")),
    }
}

#[derive(Debug, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct AddHandleRequest {
    #[serde(default)]
    #[validate(custom = "validate_handle")]
    pub handle: String,
}

#[derive(Debug, Serialize, Deserialize, Validate, PartialEq, Eq)]
pub struct AddProblemRequest {
    #[serde(default, rename = "problemId")]
    #[validate(custom = "validate_problem_id")]
    pub problem_id: String,
}

/// First validation failure, reported by its code.
fn describe(errors: &ValidationErrors) -> String {
    errors
        .field_errors()
        .values()
        .flat_map(|errors| errors.iter())
        .next()
        .map(|error| {
            error
                .message
                .as_ref()
                .map(|message| message.to_string())
                .unwrap_or_else(|| error.code.to_string())
        })
        .unwrap_or_else(|| String::from("Invalid request data"))
}

/// JSON body extractor that rejects undecodable or invalid bodies with a 400.
pub struct ValidatedJson<T>(pub T);

#[async_trait]
impl<T, S, B> FromRequest<S, B> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
    B: HttpBody + Send + 'static,
    B::Data: Send,
    B::Error: Into<BoxError>,
{
    type Rejection = ApiError;

    async fn from_request(req: Request<B>, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| {
                tracing::error!("Parsing error: {}", rejection);
                ApiError::Validation(String::from("Invalid request data"))
            })?;

        value.validate().map_err(|rejection| {
            tracing::error!("Validation error: {}", rejection);
            ApiError::Validation(describe(&rejection))
        })?;

        Ok(ValidatedJson(value))
    }
}
