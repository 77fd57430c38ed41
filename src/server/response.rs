use tiny_http::{Header, Response};
use tracing::warn;

use crate::dispatcher::HandlerResponse;

/// Convert a [`HandlerResponse`] into a `tiny_http` response.
///
/// Headers that are not valid on the wire are dropped with a warning.
/// `x-request-id` is added so clients can correlate logs.
pub(crate) fn to_transport(
    res: &HandlerResponse,
    request_id: &str,
) -> Response<std::io::Cursor<Vec<u8>>> {
    let mut out = Response::from_data(res.body_bytes()).with_status_code(res.status);

    for (name, value) in &res.headers {
        match Header::from_bytes(name.as_bytes(), value.as_bytes()) {
            Ok(header) => out.add_header(header),
            Err(()) => warn!(header = %name, "Dropping invalid response header"),
        }
    }
    if res.get_header("x-request-id").is_none() {
        if let Ok(header) = Header::from_bytes(&b"x-request-id"[..], request_id.as_bytes()) {
            out.add_header(header);
        }
    }
    out
}
