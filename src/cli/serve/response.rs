//! HTTP response handlers.

use std::io::Cursor;

use anyhow::Result;
use bytes::Bytes;
use tiny_http::{Header, Request, Response, StatusCode};

use crate::cache::Headers;
use crate::pipeline::Prepared;
use crate::pipeline::headers::{CONTENT_TYPE, ETAG};
use crate::utils::mime::types::PLAIN;

/// Send a pipeline result, answering `304` when the client's validator matches.
pub fn respond_prepared(request: Request, prepared: Prepared) -> Result<()> {
    let Prepared::Found { body, headers } = prepared else {
        return respond_not_found(request);
    };

    if let Some(etag) = headers.get(ETAG)
        && request_header(&request, "If-None-Match").is_some_and(|v| etag_matches(&v, etag))
    {
        let response = Response::empty(StatusCode(304)).with_header(make_header(ETAG, etag)?);
        request.respond(response)?;
        return Ok(());
    }

    send_bytes(request, 200, &headers, body)
}

/// Respond with 404 Not Found.
pub fn respond_not_found(request: Request) -> Result<()> {
    respond_status(request, 404, "404 Not Found")
}

/// Respond with a plain-text status page.
pub fn respond_status(request: Request, status: u16, message: &str) -> Result<()> {
    let response = Response::from_string(message)
        .with_status_code(StatusCode(status))
        .with_header(make_header(CONTENT_TYPE, PLAIN)?);
    request.respond(response)?;
    Ok(())
}

fn send_bytes(request: Request, status: u16, headers: &Headers, body: Bytes) -> Result<()> {
    let headers = headers
        .iter()
        .map(|(key, value)| make_header(key, value))
        .collect::<Result<Vec<_>>>()?;
    let length = body.len();

    let response = Response::new(
        StatusCode(status),
        headers,
        Cursor::new(body),
        Some(length),
        None,
    );
    request.respond(response)?;
    Ok(())
}

/// Whether an `If-None-Match` value matches `etag`.
pub fn etag_matches(if_none_match: &str, etag: &str) -> bool {
    if_none_match
        .split(',')
        .map(str::trim)
        .any(|candidate| candidate == "*" || candidate == etag)
}

/// Extract a request header by case-insensitive name.
pub fn request_header(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.to_string())
}

fn make_header(key: &str, value: &str) -> Result<Header> {
    Header::from_bytes(key.as_bytes(), value.as_bytes())
        .map_err(|()| anyhow::anyhow!("invalid header {key}: {value}"))
}
