// Client-side error types
use serde_json::Value;
use std::collections::BTreeMap;
use thiserror::Error;

/// Every failure of an outbound request, normalized to one shape:
/// an optional status code plus a message.
#[derive(Debug, Clone, Error)]
pub enum ApiError {
    /// Transport failure: connection refused, DNS, timeout
    #[error("network error: {0}")]
    Network(String),

    /// Non-2xx response
    #[error("{message}")]
    Status {
        status: u16,
        message: String,
        field_errors: BTreeMap<String, Vec<String>>,
    },

    /// 2xx response whose body could not be decoded
    #[error("invalid JSON response: {0}")]
    InvalidJson(String),

    #[error("invalid URL: {0}")]
    InvalidUrl(String),
}

impl ApiError {
    pub fn network(message: impl Into<String>) -> Self {
        ApiError::Network(message.into())
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn status_error(status: u16, message: impl Into<String>) -> Self {
        ApiError::Status {
            status,
            message: message.into(),
            field_errors: BTreeMap::new(),
        }
    }

    /// Build from a non-2xx status and the raw response body.
    ///
    /// Understands DRF-style bodies: `{"detail": ...}`, `{"non_field_errors": [...]}`
    /// and per-field lists such as `{"username": ["already exists"]}`.
    pub fn from_response(status: u16, body: &str) -> Self {
        let parsed: Option<Value> = serde_json::from_str(body).ok();
        let field_errors = parsed.as_ref().map(collect_field_errors).unwrap_or_default();

        let message = parsed
            .as_ref()
            .and_then(|value| extract_message(value, &field_errors))
            .unwrap_or_else(|| default_message(status).to_string());

        ApiError::Status {
            status,
            message,
            field_errors,
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            ApiError::Network(msg) => msg,
            ApiError::Status { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::InvalidUrl(msg) => msg,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }

    /// Server-side validation failure (400 or 422)
    pub fn is_validation(&self) -> bool {
        matches!(self.status(), Some(400) | Some(422))
    }

    pub fn field_errors(&self) -> Option<&BTreeMap<String, Vec<String>>> {
        match self {
            ApiError::Status { field_errors, .. } => Some(field_errors),
            _ => None,
        }
    }

    pub fn has_field_error(&self, field: &str) -> bool {
        self.field_errors()
            .map(|errors| errors.contains_key(field))
            .unwrap_or(false)
    }

    /// Stable code for machine-readable output
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::Network(_) => "NETWORK_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::InvalidUrl(_) => "INVALID_URL",
            ApiError::Status { status, .. } => match status {
                400 => "BAD_REQUEST",
                401 => "UNAUTHORIZED",
                403 => "FORBIDDEN",
                404 => "NOT_FOUND",
                409 => "CONFLICT",
                422 => "UNPROCESSABLE_ENTITY",
                429 => "TOO_MANY_REQUESTS",
                500..=599 => "SERVER_ERROR",
                _ => "HTTP_ERROR",
            },
        }
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ApiError::InvalidJson(err.to_string())
        } else if let Some(status) = err.status() {
            ApiError::status_error(status.as_u16(), err.to_string())
        } else {
            ApiError::Network(err.to_string())
        }
    }
}

const MESSAGE_KEYS: [&str; 3] = ["detail", "message", "error"];

fn collect_field_errors(body: &Value) -> BTreeMap<String, Vec<String>> {
    let mut errors = BTreeMap::new();
    let Some(object) = body.as_object() else {
        return errors;
    };

    for (field, value) in object {
        if MESSAGE_KEYS.contains(&field.as_str()) {
            continue;
        }
        let messages: Vec<String> = match value {
            Value::String(s) => vec![s.clone()],
            Value::Array(items) => items
                .iter()
                .filter_map(|item| item.as_str().map(str::to_string))
                .collect(),
            _ => continue,
        };
        if !messages.is_empty() {
            errors.insert(field.clone(), messages);
        }
    }
    errors
}

fn extract_message(body: &Value, field_errors: &BTreeMap<String, Vec<String>>) -> Option<String> {
    if let Some(message) = MESSAGE_KEYS
        .iter()
        .find_map(|key| body.get(*key).and_then(Value::as_str))
    {
        return Some(message.to_string());
    }

    if let Some(first) = field_errors.get("non_field_errors").and_then(|m| m.first()) {
        return Some(first.clone());
    }

    field_errors
        .iter()
        .next()
        .and_then(|(field, messages)| messages.first().map(|m| format!("{}: {}", field, m)))
}

fn default_message(status: u16) -> &'static str {
    match status {
        400 => "Bad request",
        401 => "Authentication required",
        403 => "Forbidden",
        404 => "Not found",
        409 => "Conflict",
        422 => "Unprocessable entity",
        500..=599 => "Server error",
        _ => "Request failed",
    }
}

/// A pre-submit check failed; the request was never sent.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }

    pub fn required(field: &'static str) -> Self {
        Self::new(field, format!("{} is required", field))
    }
}
