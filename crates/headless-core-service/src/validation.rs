use serde::Serialize;
use serde_json::Value;
use std::convert::TryFrom;
use std::fmt;
use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum ValidationError {
    #[error("URL cannot be empty")]
    EmptyUrl,
    #[error("Malformed URL: {0}")]
    MalformedUrl(String),
    #[error("URL must have a host")]
    MissingHost,
    #[error("Unsupported URL scheme: {0}")]
    UnsupportedScheme(String),
    #[error("Base URL must not carry a query or fragment: {0}")]
    UnexpectedSuffix(String),
    #[error("Content id must be a positive integer, got {0}")]
    InvalidContentId(i64),
}

/// An absolute http(s) base URL such as a site or frontend root.
///
/// The raw text is kept as configured (it may or may not end in a slash);
/// callers pick [`BaseUrl::trimmed`] or [`BaseUrl::with_trailing_slash`]
/// depending on how they concatenate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct BaseUrl(String);

impl BaseUrl {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The base with exactly one trailing slash stripped.
    pub fn trimmed(&self) -> &str {
        crate::rewrite::trim_trailing_slash(&self.0)
    }

    pub fn with_trailing_slash(&self) -> String {
        crate::rewrite::with_trailing_slash(&self.0)
    }
}

impl fmt::Display for BaseUrl {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<&str> for BaseUrl {
    type Error = ValidationError;

    fn try_from(raw: &str) -> Result<Self, Self::Error> {
        let raw = raw.trim();
        if raw.is_empty() {
            return Err(ValidationError::EmptyUrl);
        }

        let url = Url::parse(raw).map_err(|_| ValidationError::MalformedUrl(raw.to_string()))?;

        match url.scheme() {
            "http" | "https" => {}
            scheme => return Err(ValidationError::UnsupportedScheme(scheme.to_string())),
        }

        match url.host_str() {
            Some(host) if !host.is_empty() => {}
            _ => return Err(ValidationError::MissingHost),
        }

        if url.query().is_some() || url.fragment().is_some() {
            return Err(ValidationError::UnexpectedSuffix(raw.to_string()));
        }

        Ok(BaseUrl(raw.to_string()))
    }
}

pub fn validate_base_url(url_str: &str) -> Result<BaseUrl, ValidationError> {
    BaseUrl::try_from(url_str)
}

pub fn validate_content_id(id: i64) -> Result<i32, ValidationError> {
    match i32::try_from(id) {
        Ok(id) if id > 0 => Ok(id),
        _ => Err(ValidationError::InvalidContentId(id)),
    }
}

/// Accept a stored content id only when it is present and a non-negative
/// integer, either as a JSON number or a numeric string.
pub fn sanitize_content_id(value: &Value) -> Option<i32> {
    match value {
        Value::Number(n) => n.as_i64().and_then(|n| i32::try_from(n).ok()),
        Value::String(s) => s.trim().parse::<i32>().ok(),
        _ => None,
    }
    .filter(|id| *id >= 0)
}
