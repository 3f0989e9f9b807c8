//! Response-body content negotiation. The only encoding on offer is
//! gzip; anything else falls back to the identity payload.

use std::io::{self, Write};

use flate2::write::GzEncoder;
use flate2::Compression;

use crate::HeaderMap;

/// Encodings we are willing to produce.
pub const SUPPORTED_ENCODINGS: &[&str] = &["gzip"];

/// A negotiated body plus the headers that describe it.
#[derive(Debug)]
pub struct Negotiated {
    pub body: Vec<u8>,
    pub headers: HeaderMap,
}

/// Decides whether to gzip `payload` based on the client's
/// `Accept-Encoding` header (absent means no). Matching is a
/// case-insensitive substring test, as the reference behavior: a value
/// of `deflate, gzip` qualifies.
pub fn negotiate(accept_encoding: Option<&str>, payload: &[u8]) -> io::Result<Negotiated> {
    let accepted = accept_encoding
        .map(|value| value.to_ascii_lowercase())
        .map(|value| {
            SUPPORTED_ENCODINGS
                .iter()
                .any(|encoding| value.contains(encoding))
        })
        .unwrap_or(false);

    let mut headers = HeaderMap::new();
    headers.set("Content-Type", "text/plain");

    if accepted {
        log::trace!("Client accepts gzip; compressing {} bytes", payload.len());
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(payload)?;
        let body = encoder.finish()?;
        headers.set("Content-Encoding", "gzip");
        Ok(Negotiated { body, headers })
    } else {
        Ok(Negotiated {
            body: payload.to_vec(),
            headers,
        })
    }
}
