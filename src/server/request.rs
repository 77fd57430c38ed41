use std::io::{self, Read};
use std::sync::Arc;

use http::Method;
use serde_json::Value;
use thiserror::Error;
use tracing::debug;

use crate::dispatcher::HandlerRequest;
use crate::ids::RequestId;

/// Largest accepted request body; larger requests answer `413`.
pub const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// Why a transport request could not become a [`HandlerRequest`].
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("invalid method: {0}")]
    InvalidMethod(#[from] http::method::InvalidMethod),

    #[error("request body exceeds {limit} bytes")]
    PayloadTooLarge { limit: u64 },

    #[error("failed to read request body: {0}")]
    Body(#[source] io::Error),
}

impl TransportError {
    /// Status code the client is answered with.
    pub fn status(&self) -> u16 {
        match self {
            TransportError::PayloadTooLarge { .. } => 413,
            TransportError::InvalidMethod(_) | TransportError::Body(_) => 400,
        }
    }
}

/// Build a [`HandlerRequest`] from transport-level parts.
///
/// `target` is the raw request target (`/path?query`). The `x-request-id`
/// header is reused when it holds a valid ULID.
///
/// # Errors
///
/// The method token is not a valid HTTP method.
pub fn build_request(
    method: &str,
    target: &str,
    headers: Vec<(String, String)>,
    body: &[u8],
) -> Result<HandlerRequest, http::method::InvalidMethod> {
    let method = Method::from_bytes(method.as_bytes())?;
    let mut req = HandlerRequest::from_target(method, target);

    let inbound_id = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("x-request-id"))
        .map(|(_, v)| v.as_str());
    req.request_id = RequestId::from_header_or_new(inbound_id);

    let content_type = headers
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("content-type"))
        .map(|(_, v)| v.clone());
    req.body = parse_body(body, content_type.as_deref());

    req.headers = headers
        .into_iter()
        .map(|(k, v)| (Arc::from(k.as_str()), v))
        .collect();

    Ok(req)
}

/// Decode a request body.
///
/// Empty bodies are `None`. A body is parsed as JSON when the content type
/// says so or is absent; anything that is not JSON is kept as a string
/// (lossily decoded).
pub fn parse_body(body: &[u8], content_type: Option<&str>) -> Option<Value> {
    if body.is_empty() {
        return None;
    }
    let json_expected = content_type.map_or(true, |ct| ct.contains("json"));
    if json_expected {
        if let Ok(value) = serde_json::from_slice(body) {
            return Some(value);
        }
        debug!(len = body.len(), "Body is not valid JSON; keeping it as text");
    }
    Some(Value::String(String::from_utf8_lossy(body).into_owned()))
}

/// Read at most `limit` bytes of body.
///
/// # Errors
///
/// [`TransportError::PayloadTooLarge`] when more than `limit` bytes are
/// available, [`TransportError::Body`] when reading fails.
pub fn read_body<R: Read>(reader: R, limit: u64) -> Result<Vec<u8>, TransportError> {
    let mut body = Vec::new();
    reader
        .take(limit + 1)
        .read_to_end(&mut body)
        .map_err(TransportError::Body)?;
    if body.len() as u64 > limit {
        return Err(TransportError::PayloadTooLarge { limit });
    }
    Ok(body)
}

/// Read a `tiny_http` request into a [`HandlerRequest`].
pub(crate) fn from_transport(req: &mut tiny_http::Request) -> Result<HandlerRequest, TransportError> {
    // A declared length over the limit is refused before any body is read
    if req.body_length().is_some_and(|len| len as u64 > MAX_BODY_BYTES) {
        return Err(TransportError::PayloadTooLarge {
            limit: MAX_BODY_BYTES,
        });
    }

    let headers: Vec<(String, String)> = req
        .headers()
        .iter()
        .map(|h| (h.field.to_string(), h.value.to_string()))
        .collect();

    let body = read_body(req.as_reader(), MAX_BODY_BYTES)?;

    let method = req.method().as_str().to_string();
    let target = req.url().to_string();
    Ok(build_request(&method, &target, headers, &body)?)
}
