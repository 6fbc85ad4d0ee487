use std::collections::BTreeMap;

use serde_json::{json, Value};
use thiserror::Error;
use warp::{
    http::StatusCode,
    reject::Reject,
    reply::{Reply, Response},
};

use crate::constants::ErrorMessage;

/// Field-keyed validation messages, rendered as `{"field": ["message", ...]}`.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct FieldErrors {
    fields: BTreeMap<String, Vec<String>>,
}

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn single(field: &str, message: ErrorMessage) -> Self {
        let mut errors = Self::new();
        errors.add(field, message);
        errors
    }

    pub fn add(&mut self, field: &str, message: ErrorMessage) {
        self.add_text(field, message.as_str());
    }

    pub fn add_text(&mut self, field: &str, message: &str) {
        let messages = self.fields.entry(field.to_owned()).or_default();
        if !messages.iter().any(|m| m == message) {
            messages.push(message.to_owned());
        }
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn contains(&self, field: &str) -> bool {
        self.fields.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.fields.get(field).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Turns the collected messages into an error, or hands `value` back when none were added.
    pub fn finish<T>(self, value: T) -> Result<T, ApiError> {
        if self.is_empty() {
            Ok(value)
        } else {
            Err(ApiError::Validation(self))
        }
    }

    fn to_json(&self) -> Value {
        json!(self.fields)
    }
}

#[derive(Debug, Clone, Error)]
pub enum ApiError {
    #[error("validation failed: {0:?}")]
    Validation(FieldErrors),
    #[error("authentication credentials were not provided")]
    Unauthorized,
    #[error("permission denied")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("nothing to delete")]
    NothingToDelete,
    #[error("{0}")]
    Conflict(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("malformed body: {0}")]
    MalformedBody(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    pub fn not_found() -> Self {
        Self::NotFound(String::from("Not found."))
    }

    pub fn conflict(message: ErrorMessage) -> Self {
        Self::Conflict(message.as_str().to_owned())
    }

    pub fn bad_request(message: ErrorMessage) -> Self {
        Self::BadRequest(message.as_str().to_owned())
    }

    pub fn invalid(field: &str, message: ErrorMessage) -> Self {
        Self::Validation(FieldErrors::single(field, message))
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_)
            | ApiError::Conflict(_)
            | ApiError::BadRequest(_)
            | ApiError::MalformedBody(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden => StatusCode::FORBIDDEN,
            ApiError::NotFound(_) | ApiError::NothingToDelete => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn body(&self) -> Value {
        match self {
            ApiError::Validation(errors) => errors.to_json(),
            ApiError::Unauthorized => {
                json!({ "detail": "Authentication credentials were not provided." })
            }
            ApiError::Forbidden => {
                json!({ "detail": "You do not have permission to perform this action." })
            }
            ApiError::NotFound(detail) => json!({ "detail": detail }),
            ApiError::NothingToDelete => {
                json!({ "errors": ErrorMessage::NothingToDelete.as_str() })
            }
            ApiError::Conflict(message) | ApiError::BadRequest(message) => {
                json!({ "errors": message })
            }
            ApiError::MalformedBody(reason) => {
                json!({ "detail": format!("JSON parse error - {reason}") })
            }
            ApiError::Internal(_) => json!({ "detail": "Internal server error." }),
        }
    }
}

impl Reject for ApiError {}

impl Reply for ApiError {
    fn into_response(self) -> Response {
        if let ApiError::Internal(info) = &self {
            log::error!("> {info}");
        }
        let status = self.status();
        warp::reply::with_status(warp::reply::json(&self.body()), status).into_response()
    }
}

pub struct QueryError {
    info: String,
    constraint: Option<String>,
}

impl QueryError {
    pub fn new(info: String) -> Self {
        Self {
            info,
            constraint: None,
        }
    }

    /// Name of the violated constraint, when the database reported one.
    pub fn constraint(&self) -> Option<&str> {
        self.constraint.as_deref()
    }
}

impl From<sqlx::Error> for QueryError {
    fn from(value: sqlx::Error) -> Self {
        match value {
            sqlx::Error::Database(e) => Self {
                info: format!("{e}"),
                constraint: e.constraint().map(str::to_owned),
            },
            sqlx::Error::Configuration(e) => Self::new(format!("{e}")),
            sqlx::Error::Io(e) => Self::new(format!("{e}")),
            sqlx::Error::Tls(e) => Self::new(format!("{e}")),
            sqlx::Error::Protocol(e) => Self::new(e),
            sqlx::Error::RowNotFound => Self::new(String::from("RowNotFound")),
            sqlx::Error::ColumnNotFound(e) => Self::new(format!("Column not found: {e}")),
            sqlx::Error::ColumnDecode { index, source } => {
                Self::new(format!("Column decode {index} ({source})"))
            }
            sqlx::Error::Decode(e) => Self::new(format!("{e}")),
            sqlx::Error::PoolTimedOut => Self::new(String::from("Pool timed out")),
            sqlx::Error::PoolClosed => Self::new(String::from("Pool closed")),
            sqlx::Error::Migrate(e) => Self::new(format!("{e}")),
            e => Self::new(format!("{e}")),
        }
    }
}

impl From<QueryError> for ApiError {
    fn from(value: QueryError) -> Self {
        ApiError::Internal(value.info)
    }
}

pub struct CacheError {
    info: String,
}

impl From<redis::RedisError> for CacheError {
    fn from(value: redis::RedisError) -> Self {
        Self {
            info: format!("{:?} - {:?}", value.code(), value.detail()),
        }
    }
}

impl From<CacheError> for ApiError {
    fn from(value: CacheError) -> Self {
        ApiError::Internal(value.info)
    }
}

impl std::fmt::Display for CacheError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({})", self.info)
    }
}
