//! Request plumbing shared by handlers

use axum::body::Body;
use axum::http::{HeaderMap, header::CONTENT_TYPE};
use bytes::Bytes;
use http_body_util::{BodyExt, LengthLimitError, Limited};

use crate::api::error::ApiError;

/// Require a `Content-Type` of `application/json` (parameters allowed).
///
/// Rejects look-alikes such as `application/jsonp` or `text/json`.
pub fn require_json(headers: &HeaderMap) -> Result<mime::Mime, ApiError> {
    let raw = headers
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ApiError::InvalidPayload("missing Content-Type header".into()))?;

    let media_type: mime::Mime = raw
        .parse()
        .map_err(|_| ApiError::InvalidPayload(format!("invalid Content-Type: {}", raw)))?;

    if media_type.type_() != mime::APPLICATION || media_type.subtype() != mime::JSON {
        return Err(ApiError::InvalidPayload(format!(
            "Content-Type must be application/json, got: {}",
            media_type.essence_str()
        )));
    }

    Ok(media_type)
}

/// Collect the body, failing as soon as it grows past `limit` bytes.
pub async fn read_limited(body: Body, limit: usize) -> Result<Bytes, ApiError> {
    Limited::new(body, limit)
        .collect()
        .await
        .map(|collected| collected.to_bytes())
        .map_err(|err| {
            if err.downcast_ref::<LengthLimitError>().is_some() {
                ApiError::PayloadTooLarge(limit)
            } else {
                ApiError::InvalidPayload(format!("failed to read body: {}", err))
            }
        })
}
