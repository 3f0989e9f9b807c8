use std::io::Write;

use crate::HeaderMap;

/// The closed set of status codes this server emits. The code/reason
/// mapping lives here and nowhere else; add a variant before emitting a
/// new code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Ok,
    Created,
    NotFound,
    InternalServerError,
}

impl Status {
    pub fn code(self) -> u16 {
        match self {
            Status::Ok => 200,
            Status::Created => 201,
            Status::NotFound => 404,
            Status::InternalServerError => 500,
        }
    }

    pub fn reason(self) -> &'static str {
        match self {
            Status::Ok => "OK",
            Status::Created => "Created",
            Status::NotFound => "Not Found",
            Status::InternalServerError => "Internal Server Error",
        }
    }
}

/// An outbound response. Built by a handler, serialized exactly once,
/// then discarded.
#[derive(Debug)]
pub struct Response {
    status: Status,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl Response {
    pub fn empty(status: Status) -> Self {
        Response {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn builder(status: Status) -> ResponseBuilder {
        ResponseBuilder {
            status,
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn status(&self) -> Status {
        self.status
    }

    pub fn body(&self) -> Option<&[u8]> {
        self.body.as_deref()
    }

    /// Renders the wire form: status line, `Content-Length` (always
    /// derived from the body, caller-supplied values are ignored), the
    /// remaining headers in insertion order, a blank line, then the raw
    /// body bytes.
    pub fn serialize(&self) -> Vec<u8> {
        let body = self.body.as_deref().unwrap_or(&[]);

        let mut out = Vec::with_capacity(64 + body.len());
        let _ = write!(
            out,
            "HTTP/1.1 {} {}\r\n",
            self.status.code(),
            self.status.reason()
        );
        let _ = write!(out, "Content-Length: {}\r\n", body.len());
        for (name, value) in self.headers.iter() {
            if name.eq_ignore_ascii_case("content-length") {
                log::warn!("Dropping caller-supplied Content-Length: {}", value);
                continue;
            }
            let _ = write!(out, "{}: {}\r\n", name, value);
        }
        out.extend_from_slice(b"\r\n");
        out.extend_from_slice(body);
        out
    }
}

pub struct ResponseBuilder {
    status: Status,
    headers: HeaderMap,
    body: Option<Vec<u8>>,
}

impl ResponseBuilder {
    pub fn header<N, V>(mut self, name: N, value: V) -> Self
    where
        N: Into<String>,
        V: Into<String>,
    {
        self.headers.set(name, value);
        self
    }

    pub fn headers(mut self, headers: HeaderMap) -> Self {
        for (name, value) in headers.iter() {
            self.headers.set(name, value);
        }
        self
    }

    pub fn content_type(self, content_type: &str) -> Self {
        self.header("Content-Type", content_type)
    }

    pub fn body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }

    pub fn body_from_string(self, body: &str) -> Self {
        self.body(body.as_bytes().to_vec())
    }

    pub fn build(self) -> Response {
        Response {
            status: self.status,
            headers: self.headers,
            body: self.body,
        }
    }
}
