//! Error types for the rule catalogue
//!
//! Library code returns [`AppError`]; HTTP handlers turn it into a JSON
//! response through the [`IntoResponse`] impl below.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("storage error: {0}")]
    Storage(#[from] redb::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("config error: {0}")]
    Config(String),

    #[error("rule not found: {0}")]
    RuleNotFound(String),

    #[error("category not found: {0}")]
    CategoryNotFound(String),

    #[error("cannot derive a slug from {0:?}")]
    EmptySlug(String),

    #[error("seed data error: {0}")]
    SeedData(String),
}

impl AppError {
    /// Stable machine-readable code included in JSON error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            AppError::Storage(_) => "storage",
            AppError::Serialization(_) => "serialization",
            AppError::Io(_) => "io",
            AppError::Config(_) => "config",
            AppError::RuleNotFound(_) | AppError::CategoryNotFound(_) => "not_found",
            AppError::EmptySlug(_) => "empty_slug",
            AppError::SeedData(_) => "seed_data",
        }
    }

    fn status(&self) -> StatusCode {
        match self {
            AppError::RuleNotFound(_) | AppError::CategoryNotFound(_) => StatusCode::NOT_FOUND,
            AppError::EmptySlug(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

// redb reports each stage (open, begin, table, read/write, commit) with its
// own error type; all of them fold into `redb::Error`.
macro_rules! storage_error_from {
    ($($ty:ty),* $(,)?) => {
        $(
            impl From<$ty> for AppError {
                fn from(err: $ty) -> Self {
                    AppError::Storage(err.into())
                }
            }
        )*
    };
}

storage_error_from!(
    redb::DatabaseError,
    redb::TransactionError,
    redb::TableError,
    redb::StorageError,
    redb::CommitError,
);

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
        }

        (
            status,
            Json(json!({
                "error": self.to_string(),
                "code": self.code(),
            })),
        )
            .into_response()
    }
}
