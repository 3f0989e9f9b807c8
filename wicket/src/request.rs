use thiserror::Error;

use crate::{HeaderMap, Method};

/// A parsed HTTP/1.1 request. Built once from a single raw buffer and
/// never mutated afterwards; dropped as soon as its response is written.
#[derive(Debug)]
pub struct Request {
    method: Method,
    path: String,
    version: String,
    headers: HeaderMap,
    body: Vec<u8>,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ParseError {
    #[error("empty request")]
    Empty,
    #[error("request head is not valid utf-8")]
    NotUtf8,
    #[error("bad request line: {0:?}")]
    BadRequestLine(String),
    #[error("bad header line: {0:?}")]
    BadHeader(String),
}

impl Request {
    /// Parses a complete request from `raw`. The head (request line and
    /// headers) must be UTF-8; everything after the first `\r\n\r\n` is
    /// taken as the body verbatim, so binary bodies survive untouched.
    pub fn parse(raw: &[u8]) -> Result<Self, ParseError> {
        let (head, body) = match find_blank_line(raw) {
            Some(pos) => (&raw[..pos], raw[pos + 4..].to_vec()),
            // No separator: the reference parser still yields the head
            // fields, with no body.
            None => (raw, Vec::new()),
        };

        let head = std::str::from_utf8(head).map_err(|_| ParseError::NotUtf8)?;
        if head.trim().is_empty() {
            return Err(ParseError::Empty);
        }

        let mut lines = head.split("\r\n");
        let request_line = lines.next().unwrap_or("");
        let (method, path, version) = parse_request_line(request_line)?;

        let mut headers = HeaderMap::new();
        for line in lines {
            if line.is_empty() {
                break;
            }
            let (name, value) = parse_header_line(line)?;
            headers.set(name, value);
        }

        Ok(Request {
            method,
            path,
            version,
            headers,
            body,
        })
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    /// Case-insensitive single-header lookup.
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.get(name)
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

/// `GET /path HTTP/1.1` — exactly three space-separated fields.
fn parse_request_line(line: &str) -> Result<(Method, String, String), ParseError> {
    let fields: Vec<&str> = line.split(' ').collect();
    match fields.as_slice() {
        [method, path, version] if !method.is_empty() && !path.is_empty() && !version.is_empty() => {
            Ok((
                Method::from_token(method),
                path.to_string(),
                version.to_string(),
            ))
        }
        _ => Err(ParseError::BadRequestLine(line.to_string())),
    }
}

fn parse_header_line(line: &str) -> Result<(&str, &str), ParseError> {
    let mut parts = line.splitn(2, ':');
    let name = parts.next().unwrap_or("").trim();
    let value = parts
        .next()
        .ok_or_else(|| ParseError::BadHeader(line.to_string()))?;
    if name.is_empty() {
        return Err(ParseError::BadHeader(line.to_string()));
    }
    Ok((name, value.trim()))
}

pub(crate) fn find_blank_line(raw: &[u8]) -> Option<usize> {
    raw.windows(4).position(|window| window == b"\r\n\r\n")
}
