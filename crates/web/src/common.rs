use axum::{
    extract::{rejection::JsonRejection, OriginalUri, Query, Request},
    http::{Method, StatusCode},
    response::IntoResponse,
    routing::MethodFilter,
    Json,
};
use model::{response::WriteResponse, ExampleData};
use schemars::{schema_for, schema_for_value, JsonSchema};
use serde::{Deserialize, Serialize};
use world::RequestError;

pub type RouteResult<O> = Result<O, RouteErrorResponse>;
pub type WriteResult = Result<Json<WriteResponse>, Failure>;

/// A `MethodFilter` that matches all http methods.
pub(crate) const METHOD_FILTER_ALL: MethodFilter = MethodFilter::GET
    .or(MethodFilter::POST)
    .or(MethodFilter::PATCH)
    .or(MethodFilter::PUT)
    .or(MethodFilter::DELETE);

fn status_of(error: &RequestError) -> StatusCode {
    match error {
        RequestError::NotFound(_) => StatusCode::NOT_FOUND,
        RequestError::Invalid(_) => StatusCode::BAD_REQUEST,
        RequestError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// - Services returning commonly used responses -

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct SchemaParams {
    #[serde(default = "Default::default")]
    example_data: bool,
}

pub(crate) async fn schema<T: ExampleData + JsonSchema + Serialize>(
    Query(params): Query<SchemaParams>,
) -> impl IntoResponse {
    if params.example_data {
        Json(schema_for_value!(T::example_data()))
    } else {
        Json(schema_for!(T))
    }
}

pub(crate) async fn route_not_found(
    OriginalUri(original_uri): OriginalUri,
    req: Request,
) -> impl IntoResponse {
    RouteErrorResponse::not_found(req.method(), original_uri.path())
}

// - Commonly used responeses -

/// Error body of the read endpoints and of unknown routes.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteErrorResponse {
    #[serde(skip)]
    pub status_code: StatusCode,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub http_method: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_uri: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl RouteErrorResponse {
    pub fn new(status_code: StatusCode) -> Self {
        Self {
            status_code,
            http_method: None,
            requested_uri: None,
            message: None,
        }
    }

    pub fn not_found(method: &Method, uri: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND)
            .with_method(method)
            .with_uri(uri)
            .with_default_message()
    }

    pub fn with_method(mut self, method: &Method) -> Self {
        self.http_method = Some(method.to_string());
        self
    }

    pub fn with_uri(mut self, uri: impl Into<String>) -> Self {
        self.requested_uri = Some(uri.into());
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_default_message(self) -> Self {
        let message = self
            .status_code
            .canonical_reason()
            .unwrap_or("i dunno what happened here :/");
        self.with_message(message)
    }
}

impl From<RequestError> for RouteErrorResponse {
    fn from(value: RequestError) -> Self {
        let status_code = status_of(&value);
        if status_code.is_server_error() {
            log::error!("request failed: {}", value);
        }
        Self::new(status_code).with_message(value.to_string())
    }
}

impl IntoResponse for RouteErrorResponse {
    fn into_response(self) -> axum::response::Response {
        (self.status_code, Json(self)).into_response()
    }
}

/// Error of the write endpoints, answered with `{success: false, error}`.
#[derive(Debug, Clone)]
pub struct Failure {
    pub status_code: StatusCode,
    pub error: String,
}

impl Failure {
    pub fn new(status_code: StatusCode, error: impl Into<String>) -> Self {
        Self {
            status_code,
            error: error.into(),
        }
    }
}

impl From<RequestError> for Failure {
    fn from(value: RequestError) -> Self {
        let status_code = status_of(&value);
        if status_code.is_server_error() {
            log::error!("write failed: {}", value);
        } else {
            log::debug!("write rejected: {}", value);
        }
        Self::new(status_code, value.to_string())
    }
}

impl From<JsonRejection> for Failure {
    fn from(value: JsonRejection) -> Self {
        log::debug!("malformed request body: {}", value.body_text());
        Self::new(StatusCode::BAD_REQUEST, value.body_text())
    }
}

impl IntoResponse for Failure {
    fn into_response(self) -> axum::response::Response {
        (self.status_code, Json(WriteResponse::failure(self.error))).into_response()
    }
}
