use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::db::StoreError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ApiError {
    BadRequest,
    NotFound,
    MethodNotAllowed,
    Unprocessable,
}

/// How a handler reports a failed store call: lookups answer 404, mutations 422.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Lookup,
    Mutation,
}

#[derive(Serialize)]
struct ErrorBody {
    success: bool,
    error: u16,
    message: &'static str,
}

impl ApiError {
    pub fn status(self) -> StatusCode {
        match self {
            ApiError::BadRequest => StatusCode::BAD_REQUEST,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiError::Unprocessable => StatusCode::UNPROCESSABLE_ENTITY,
        }
    }

    pub fn message(self) -> &'static str {
        match self {
            ApiError::BadRequest => "bad request",
            ApiError::NotFound => "resource not found",
            ApiError::MethodNotAllowed => "method not allowed",
            ApiError::Unprocessable => "unprocessable",
        }
    }

    pub fn from_store(error: StoreError, boundary: Boundary) -> Self {
        match &error {
            StoreError::NotFound => tracing::info!(?boundary, "{error}"),
            StoreError::Constraint(_) => tracing::warn!(?boundary, "{error}"),
            StoreError::Database(_) | StoreError::Migration(_) => {
                tracing::error!(?boundary, "Store failure: {error}")
            }
        }
        match boundary {
            Boundary::Lookup => ApiError::NotFound,
            Boundary::Mutation => ApiError::Unprocessable,
        }
    }

    pub fn lookup(error: StoreError) -> Self {
        Self::from_store(error, Boundary::Lookup)
    }

    pub fn mutation(error: StoreError) -> Self {
        Self::from_store(error, Boundary::Mutation)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            success: false,
            error: self.status().as_u16(),
            message: self.message(),
        };
        (self.status(), Json(body)).into_response()
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::info!("Rejected request body: {}", rejection.body_text());
        ApiError::BadRequest
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        tracing::info!("Rejected query string: {}", rejection.body_text());
        ApiError::BadRequest
    }
}

// path parameters that do not parse mean the route does not exist
impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::info!("Rejected path: {}", rejection.body_text());
        ApiError::NotFound
    }
}
