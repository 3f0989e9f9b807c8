//! A deliberately small HTTP/1.1 message library: parse one request off
//! a socket, hand it to the application, write one response back, close.
//! Keep-alive, chunked bodies and pipelining are out of scope.

pub mod encoding;
pub mod request;
pub mod response;
pub mod server;

pub use request::{ParseError, Request};
pub use response::{Response, ResponseBuilder, Status};

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Method {
    GET,
    POST,
    /// Any other token from the request line. Carried through so routing
    /// can answer it (with a 404) instead of the parser rejecting it.
    Other(String),
}

impl Method {
    pub(crate) fn from_token(token: &str) -> Self {
        match token {
            "GET" => Method::GET,
            "POST" => Method::POST,
            other => Method::Other(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Method::GET => "GET",
            Method::POST => "POST",
            Method::Other(token) => token,
        }
    }
}

/// Header mapping built once at parse time. Names keep the casing they
/// arrived with and entries keep insertion order for serialization;
/// lookups are ASCII-case-insensitive.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct HeaderMap {
    entries: Vec<(String, String)>,
}

impl HeaderMap {
    pub fn new() -> Self {
        HeaderMap::default()
    }

    pub fn set<N, V>(&mut self, name: N, value: V)
    where
        N: Into<String>,
        V: Into<String>,
    {
        let name = name.into();
        let value = value.into();
        if let Some(entry) = self
            .entries
            .iter_mut()
            .find(|(n, _)| n.eq_ignore_ascii_case(&name))
        {
            entry.1 = value;
        } else {
            self.entries.push((name, value));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|(n, _)| n.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(n, v)| (n.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn header_lookup_ignores_case_but_keeps_original_casing() {
        let mut headers = HeaderMap::new();
        headers.set("Accept-Encoding", "gzip");

        assert_eq!(headers.get("accept-encoding"), Some("gzip"));
        assert_eq!(headers.get("ACCEPT-ENCODING"), Some("gzip"));

        let rendered: Vec<_> = headers.iter().collect();
        assert_eq!(rendered, vec![("Accept-Encoding", "gzip")]);
    }

    #[test]
    fn setting_an_existing_header_replaces_regardless_of_case() {
        let mut headers = HeaderMap::new();
        headers.set("content-type", "text/plain");
        headers.set("Content-Type", "application/octet-stream");

        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("Content-Type"), Some("application/octet-stream"));
    }

    #[test]
    fn iteration_preserves_insertion_order() {
        let mut headers = HeaderMap::new();
        headers.set("Content-Type", "text/plain");
        headers.set("Content-Encoding", "gzip");

        let names: Vec<_> = headers.iter().map(|(n, _)| n).collect();
        assert_eq!(names, vec!["Content-Type", "Content-Encoding"]);
    }

    #[test]
    fn unknown_method_tokens_are_carried_through() {
        assert_eq!(Method::from_token("GET"), Method::GET);
        assert_eq!(
            Method::from_token("PATCH"),
            Method::Other("PATCH".to_string())
        );
        assert_eq!(Method::from_token("PATCH").as_str(), "PATCH");
    }
}
