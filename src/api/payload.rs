use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::error::{Error, Result};

/// Formats the price list endpoints can answer in.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum AcceptType {
    #[default]
    Json,
    Xml,
    Dbf,
    Csv,
}

impl AcceptType {
    /// The media type sent in the `Accept` header.
    pub fn as_mime(&self) -> &'static str {
        match self {
            AcceptType::Json => "application/json",
            AcceptType::Xml => "application/xml",
            AcceptType::Dbf => "application/dbf",
            AcceptType::Csv => "text/csv",
        }
    }

    /// Matches a `Content-Type` header, ignoring parameters such as `charset`.
    fn from_content_type(content_type: &str) -> Option<Self> {
        let essence = content_type
            .split(';')
            .next()
            .unwrap_or_default()
            .trim()
            .to_ascii_lowercase();
        match essence.as_str() {
            "application/json" => Some(AcceptType::Json),
            "application/xml" | "text/xml" => Some(AcceptType::Xml),
            "application/dbf" | "application/x-dbf" => Some(AcceptType::Dbf),
            "text/csv" => Some(AcceptType::Csv),
            _ if essence.ends_with("+json") => Some(AcceptType::Json),
            _ => None,
        }
    }
}

impl fmt::Display for AcceptType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_mime())
    }
}

impl FromStr for AcceptType {
    type Err = Error;

    /// Accepts either a short name (`json`, `csv`, ...) or the full media type.
    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "json" => Ok(AcceptType::Json),
            "xml" => Ok(AcceptType::Xml),
            "dbf" => Ok(AcceptType::Dbf),
            "csv" => Ok(AcceptType::Csv),
            other => AcceptType::from_content_type(other)
                .ok_or_else(|| Error::Config(format!("unsupported accept type: {s}"))),
        }
    }
}

/// A decoded response body.
///
/// Only JSON is parsed. XML and CSV come back as text, DBF as raw bytes.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    Json(Value),
    Text(String),
    Binary(Vec<u8>),
}

impl Payload {
    /// Decodes `body` by the response's `Content-Type`, falling back to what was requested.
    pub(crate) fn decode(
        requested: AcceptType,
        content_type: Option<&str>,
        body: &[u8],
    ) -> Result<Self> {
        let format = content_type
            .and_then(AcceptType::from_content_type)
            .unwrap_or(requested);

        match format {
            AcceptType::Json if body.iter().all(u8::is_ascii_whitespace) => {
                Ok(Payload::Json(Value::Null))
            }
            AcceptType::Json => serde_json::from_slice(body)
                .map(Payload::Json)
                .map_err(|e| Error::Decode(e.to_string())),
            AcceptType::Xml | AcceptType::Csv => String::from_utf8(body.to_vec())
                .map(Payload::Text)
                .map_err(|e| Error::Decode(e.to_string())),
            AcceptType::Dbf => Ok(Payload::Binary(body.to_vec())),
        }
    }

    pub fn as_json(&self) -> Option<&Value> {
        match self {
            Payload::Json(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Payload::Text(text) => Some(text),
            _ => None,
        }
    }

    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Payload::Binary(bytes) => Some(bytes),
            _ => None,
        }
    }

    /// Deserializes a JSON payload into a typed model.
    pub fn into_json<T: serde::de::DeserializeOwned>(self) -> Result<T> {
        match self {
            Payload::Json(value) => {
                serde_json::from_value(value).map_err(|e| Error::Decode(e.to_string()))
            }
            _ => Err(Error::Decode("payload is not JSON".to_string())),
        }
    }
}
