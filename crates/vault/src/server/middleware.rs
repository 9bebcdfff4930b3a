//! Request-level plumbing shared by the data routes: caller identity and
//! extractors whose rejections use the service's JSON error body.

use axum::{
    async_trait,
    extract::{
        rejection::{JsonRejection, PathRejection},
        FromRequest, FromRequestParts, Path, Request,
    },
    http::request::Parts,
    response::Response,
    Json,
};
use common::ServiceError;
use serde::de::DeserializeOwned;
use tracing::debug;

use super::{handlers::error_response, state::AppState};

/// The authenticated caller, as asserted by the upstream identity layer.
///
/// Read from the header named by [`AppState::user_header_name`]. Requests
/// without it are rejected with 401 before any handler runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caller(pub String);

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let header = state.user_header_name.as_str();
        match parts.headers.get(header).map(|v| v.to_str()) {
            Some(Ok(id)) if !id.trim().is_empty() => Ok(Caller(id.trim().to_owned())),
            Some(_) => Err(error_response(&ServiceError::Unauthorized(format!(
                "{header} header does not hold a usable user id"
            )))),
            None => Err(error_response(&ServiceError::Unauthorized(format!(
                "missing {header} header"
            )))),
        }
    }
}

/// JSON request body. Any rejection becomes a 400 `bad_request`.
///
/// The message names the kind of problem only; serde's text can quote the
/// submitted values, so it goes to the debug log instead.
#[derive(Debug, Clone)]
pub struct ApiJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ApiJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match Json::<T>::from_request(req, state).await {
            Ok(Json(value)) => Ok(ApiJson(value)),
            Err(rejection) => {
                debug!(status = %rejection.status(), "request body rejected");
                Err(error_response(&ServiceError::BadRequest(
                    json_rejection_message(&rejection).into(),
                )))
            }
        }
    }
}

fn json_rejection_message(rejection: &JsonRejection) -> &'static str {
    match rejection {
        JsonRejection::MissingJsonContentType(_) => {
            "expected a body with content-type application/json"
        }
        JsonRejection::JsonSyntaxError(_) => "request body is not valid JSON",
        JsonRejection::JsonDataError(_) => {
            "request body is missing a field or has a field of the wrong type"
        }
        _ => "request body could not be read",
    }
}

/// Path parameters. Any rejection becomes a 400 `bad_request`.
#[derive(Debug, Clone)]
pub struct ApiPath<T>(pub T);

#[async_trait]
impl<T, S> FromRequestParts<S> for ApiPath<T>
where
    T: DeserializeOwned + Send,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        match Path::<T>::from_request_parts(parts, state).await {
            Ok(Path(value)) => Ok(ApiPath(value)),
            Err(rejection) => Err(path_rejection_response(&rejection)),
        }
    }
}

fn path_rejection_response(rejection: &PathRejection) -> Response {
    debug!(status = %rejection.status(), "path parameters rejected");
    error_response(&ServiceError::BadRequest("invalid path parameter".into()))
}
