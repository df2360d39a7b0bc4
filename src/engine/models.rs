//! Result types returned by the engine.
//!
//! These are the wire shapes the front door serializes:
//!
//! ```json
//! [
//!   {
//!     "url": "https://example.com",
//!     "meta": { "status": 200, "contentType": "text/html; charset=utf-8", "contentLength": 1256 },
//!     "elements": [ { "tagName": "p", "count": 2 }, { "tagName": "a", "count": 1 } ]
//!   },
//!   {
//!     "url": "not a url",
//!     "meta": { "status": 500, "contentType": "", "contentLength": 0,
//!               "error": "invalid URL: relative URL without a base", "errorKind": "invalid_url" },
//!     "elements": []
//!   }
//! ]
//! ```

use serde::{Deserialize, Serialize};

use super::fetch::FetchError;

/// Status recorded when the fetch itself failed (no upstream response).
pub const INTERNAL_ERROR_STATUS: u16 = 500;

/// One URL's outcome
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FetchResult {
    pub url: String,
    pub meta: Meta,
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Meta {
    pub status: u16,
    #[serde(default)]
    pub content_type: String,
    #[serde(default)]
    pub content_length: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    /// Separates transport failures from a genuine upstream 500
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_kind: Option<FetchErrorKind>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Element {
    pub tag_name: String,
    pub count: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FetchErrorKind {
    InvalidUrl,
    Timeout,
    Transport,
    BodyRead,
    Internal,
}

impl FetchResult {
    /// Result for a response that arrived, before any body inspection
    pub fn with_status(url: impl Into<String>, status: u16) -> Self {
        Self {
            url: url.into(),
            meta: Meta {
                status,
                ..Meta::default()
            },
            elements: Vec::new(),
        }
    }

    /// Result for a fetch that produced no usable response.
    ///
    /// Content fields stay zeroed and the tag list stays empty.
    pub fn failed(url: impl Into<String>, error: &FetchError) -> Self {
        Self {
            url: url.into(),
            meta: Meta {
                status: INTERNAL_ERROR_STATUS,
                error: Some(error.to_string()),
                error_kind: Some(error.kind()),
                ..Meta::default()
            },
            elements: Vec::new(),
        }
    }

    pub fn is_error(&self) -> bool {
        self.meta.error.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_success_serializes_camel_case_without_error_fields() {
        let mut result = FetchResult::with_status("https://example.com", 200);
        result.meta.content_type = "text/html".to_string();
        result.meta.content_length = 11;
        result.elements.push(Element {
            tag_name: "p".to_string(),
            count: 1,
        });

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(
            value,
            json!({
                "url": "https://example.com",
                "meta": { "status": 200, "contentType": "text/html", "contentLength": 11 },
                "elements": [ { "tagName": "p", "count": 1 } ]
            })
        );
    }

    #[test]
    fn test_failed_result_has_no_content() {
        let result = FetchResult::failed("https://example.com", &FetchError::Timeout);

        assert!(result.is_error());
        assert_eq!(result.meta.status, INTERNAL_ERROR_STATUS);
        assert_eq!(result.meta.error_kind, Some(FetchErrorKind::Timeout));
        assert!(result.meta.content_type.is_empty());
        assert_eq!(result.meta.content_length, 0);
        assert!(result.elements.is_empty());

        let value = serde_json::to_value(&result).unwrap();
        assert_eq!(value["meta"]["errorKind"], "timeout");
    }
}
