//! Request parameter extraction for the create endpoints.
//!
//! Clients may send either a JSON object or a urlencoded form. Forms may
//! repeat a key to build a list (`options=A&options=B`), JSON bodies use an
//! array for the same field. Scalars are coerced the way a form-oriented API
//! usually does: `"3"` is a valid integer, `3` is a valid text.

use std::collections::HashMap;

use axum::{
    body::Bytes,
    extract::{FromRequest, Request},
    http::{header::CONTENT_TYPE, StatusCode},
    Form, Json,
};
use serde_json::Value;
use thiserror::Error;

use crate::error::AppError;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParamError {
    #[error("missing required parameter '{field}'")]
    Missing { field: String },
    #[error("parameter '{field}' must be {expected}")]
    WrongType { field: String, expected: &'static str },
    #[error("parameter '{field}' must contain at least one value")]
    Empty { field: String },
    #[error("malformed request body: {0}")]
    Malformed(String),
}

impl ParamError {
    /// The offending field name, empty for body-level errors.
    pub fn field(&self) -> &str {
        match self {
            ParamError::Missing { field }
            | ParamError::WrongType { field, .. }
            | ParamError::Empty { field } => field,
            ParamError::Malformed(_) => "",
        }
    }
}

/// Parsed request parameters, keyed by name.
///
/// Each key holds every value the client sent for it, in order. A JSON array
/// is kept as a single `Value::Array` entry.
#[derive(Debug, Clone, Default)]
pub struct Params {
    values: HashMap<String, Vec<Value>>,
}

impl Params {
    pub fn from_pairs<I>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut values: HashMap<String, Vec<Value>> = HashMap::new();
        for (k, v) in pairs {
            values.entry(k).or_default().push(Value::String(v));
        }
        Self { values }
    }

    pub fn from_json(body: Value) -> Result<Self, ParamError> {
        match body {
            Value::Object(map) => Ok(Self {
                values: map.into_iter().map(|(k, v)| (k, vec![v])).collect(),
            }),
            Value::Null => Ok(Self::default()),
            _ => Err(ParamError::Malformed("request body must be a JSON object".to_string())),
        }
    }

    fn first(&self, field: &str) -> Result<&Value, ParamError> {
        match self.values.get(field).and_then(|v| v.first()) {
            Some(Value::Null) | None => Err(ParamError::Missing { field: field.to_string() }),
            Some(v) => Ok(v),
        }
    }

    /// A required text parameter. Numbers are accepted and rendered as text.
    pub fn text(&self, field: &str) -> Result<String, ParamError> {
        as_text(self.first(field)?, field)
    }

    /// A required integer parameter. Integer strings are accepted, and so are
    /// integral floats that fit in an `i64`.
    pub fn int(&self, field: &str) -> Result<i64, ParamError> {
        let wrong = || ParamError::WrongType { field: field.to_string(), expected: "an integer" };
        match self.first(field)? {
            Value::Number(n) => n
                .as_i64()
                .or_else(|| n.as_f64().and_then(integral_f64))
                .ok_or_else(wrong),
            Value::String(s) => s.trim().parse::<i64>().map_err(|_| wrong()),
            _ => Err(wrong()),
        }
    }

    /// A required, non-empty list of text values.
    pub fn text_list(&self, field: &str) -> Result<Vec<String>, ParamError> {
        let raw = self.values.get(field).ok_or_else(|| ParamError::Missing { field: field.to_string() })?;
        let items: Vec<&Value> = match raw.as_slice() {
            [Value::Array(arr)] => arr.iter().collect(),
            [Value::Null] => return Err(ParamError::Missing { field: field.to_string() }),
            other => other.iter().collect(),
        };
        if items.is_empty() {
            return Err(ParamError::Empty { field: field.to_string() });
        }
        items
            .into_iter()
            .map(|v| {
                as_text(v, field).map_err(|_| ParamError::WrongType {
                    field: field.to_string(),
                    expected: "a list of text values",
                })
            })
            .collect()
    }
}

/// `i64::MAX as f64` rounds up to 2^63, so the upper bound is exclusive.
fn integral_f64(f: f64) -> Option<i64> {
    let in_range = f >= i64::MIN as f64 && f < i64::MAX as f64;
    (f.fract() == 0.0 && in_range).then_some(f as i64)
}

fn as_text(value: &Value, field: &str) -> Result<String, ParamError> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        _ => Err(ParamError::WrongType { field: field.to_string(), expected: "text" }),
    }
}

enum BodyKind {
    Json,
    Form,
    Unspecified,
    Other(String),
}

fn body_kind(req: &Request) -> BodyKind {
    match req.headers().get(CONTENT_TYPE).and_then(|v| v.to_str().ok()) {
        None => BodyKind::Unspecified,
        Some(ct) if ct.starts_with("application/json") => BodyKind::Json,
        Some(ct) if ct.starts_with("application/x-www-form-urlencoded") => BodyKind::Form,
        Some(ct) => BodyKind::Other(ct.to_string()),
    }
}

/// Maps a body extractor rejection onto the API's error types. Oversized
/// bodies keep their 413, other client faults become a malformed body.
pub(crate) fn rejection(status: StatusCode, text: String) -> AppError {
    match status {
        StatusCode::PAYLOAD_TOO_LARGE => AppError::PayloadTooLarge(text),
        s if s.is_client_error() => ParamError::Malformed(text).into(),
        s => AppError::Internal(anyhow::anyhow!("body extraction failed with {}: {}", s, text)),
    }
}

impl<S> FromRequest<S> for Params
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        match body_kind(&req) {
            BodyKind::Form => {
                let Form(pairs) = Form::<Vec<(String, String)>>::from_request(req, state)
                    .await
                    .map_err(|e| rejection(e.status(), e.body_text()))?;
                Ok(Params::from_pairs(pairs))
            }
            BodyKind::Json => {
                let Json(body) = Json::<Value>::from_request(req, state)
                    .await
                    .map_err(|e| rejection(e.status(), e.body_text()))?;
                Ok(Params::from_json(body)?)
            }
            BodyKind::Unspecified => {
                // No content type: an empty body means "no parameters", anything else must be JSON
                let bytes = Bytes::from_request(req, state)
                    .await
                    .map_err(|e| rejection(e.status(), e.body_text()))?;
                if bytes.iter().all(u8::is_ascii_whitespace) {
                    return Ok(Params::default());
                }
                let body: Value =
                    serde_json::from_slice(&bytes).map_err(|e| ParamError::Malformed(e.to_string()))?;
                Ok(Params::from_json(body)?)
            }
            BodyKind::Other(ct) => {
                Err(ParamError::Malformed(format!("unsupported content type: {}", ct)).into())
            }
        }
    }
}
