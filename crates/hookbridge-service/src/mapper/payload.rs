//! Typed access to a decoded webhook body.

use serde_json::{Map, Value};

use hookbridge_core::error::AppError;
use hookbridge_core::result::AppResult;

/// Key carrying the request discriminator in JSON webhooks.
pub const REQUEST_TYPE_KEY: &str = "request_type";
/// Key the upload endpoint uses for the spooled file path.
pub const UPLOADED_FILE_KEY: &str = "uploaded_file";

/// A webhook payload: a flat JSON object of partially trusted fields.
///
/// Absent keys and JSON `null` are treated the same way.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Payload {
    fields: Map<String, Value>,
}

impl Payload {
    /// Wrap a decoded JSON value. Anything but an object is rejected.
    pub fn from_value(value: Value) -> AppResult<Self> {
        match value {
            Value::Object(fields) => Ok(Self { fields }),
            other => Err(AppError::invalid_field(
                "payload",
                format!("expected a JSON object, got {}", json_type(&other)),
            )),
        }
    }

    /// Build a payload from string pairs such as multipart form fields.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let fields = pairs
            .into_iter()
            .map(|(k, v)| (k.into(), Value::String(v.into())))
            .collect();
        Self { fields }
    }

    /// Set a field, replacing any previous value.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(key.into(), value.into());
    }

    /// Raw value of a field; `None` for absent and `null`.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key).filter(|v| !v.is_null())
    }

    /// Whether a non-null value is present.
    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    /// Scalar field rendered as text; absent is `MissingField`.
    pub fn required_str(&self, key: &str) -> AppResult<String> {
        match self.get(key) {
            Some(value) => scalar_text(key, value),
            None => Err(AppError::missing_field(key)),
        }
    }

    /// Scalar field rendered as text, if present.
    pub fn optional_str(&self, key: &str) -> AppResult<Option<String>> {
        self.get(key).map(|v| scalar_text(key, v)).transpose()
    }

    /// Integer unix timestamp; absent is `MissingField`.
    pub fn required_timestamp(&self, key: &str) -> AppResult<i64> {
        match self.get(key) {
            Some(value) => timestamp(key, value),
            None => Err(AppError::missing_field(key)),
        }
    }

    /// Integer unix timestamp, if present. Zero counts as absent, the way
    /// the storage service reports "not set".
    pub fn optional_timestamp(&self, key: &str) -> AppResult<Option<i64>> {
        match self.get(key) {
            Some(value) => Ok(Some(timestamp(key, value)?).filter(|ts| *ts != 0)),
            None => Ok(None),
        }
    }

    /// Truthiness of a flag field: `true`, a non-zero number, or a string
    /// such as `"true"`, `"1"`, `"yes"`.
    pub fn flag(&self, key: &str) -> bool {
        match self.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
            Some(Value::String(s)) => matches!(
                s.trim().to_ascii_lowercase().as_str(),
                "true" | "1" | "yes" | "on"
            ),
            _ => false,
        }
    }
}

impl From<Map<String, Value>> for Payload {
    fn from(fields: Map<String, Value>) -> Self {
        Self { fields }
    }
}

fn scalar_text(key: &str, value: &Value) -> AppResult<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(AppError::invalid_field(
            key,
            format!("expected a scalar, got {}", json_type(other)),
        )),
    }
}

fn timestamp(key: &str, value: &Value) -> AppResult<i64> {
    let parsed = match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        _ => None,
    };
    parsed.ok_or_else(|| AppError::invalid_field(key, "expected an integer unix timestamp"))
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
