use std::io::{self, Read, Write};
use std::net::{Shutdown, SocketAddr, TcpListener, TcpStream};
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use thiserror::Error;

use crate::request::find_blank_line;
use crate::{ParseError, Request, Response};

const READ_TIMEOUT: Duration = Duration::from_millis(500);
const MAX_REQUEST_BYTES: usize = 64 * 1024;

/// Binds `bind_address` and spawns the accept thread. Each connection is
/// read and parsed there; well-formed requests arrive on the returned
/// channel paired with the [`Responder`] that writes their response.
/// Malformed requests are logged and their connection dropped.
///
/// The bound address is returned so callers can bind port 0 and discover
/// the real port. One request is served per connection; no keep-alive.
pub fn serve(
    bind_address: &str,
) -> Result<(SocketAddr, mpsc::Receiver<(Request, Responder)>), BindError> {
    let listener = TcpListener::bind(bind_address)?;
    let addr = listener.local_addr()?;
    let (tx, rx) = mpsc::channel();

    thread::spawn(move || {
        for stream in listener.incoming() {
            let mut stream = match stream {
                Ok(stream) => stream,
                Err(e) => {
                    log::error!("Accept failed: {:?}", e);
                    continue;
                }
            };
            if let Err(e) = stream.set_read_timeout(Some(READ_TIMEOUT)) {
                log::error!("Setting socket read timeout: {:?}", e);
                continue;
            }

            match read_one_request(&mut stream) {
                Ok(req) => {
                    log::debug!("{} {}", req.method().as_str(), req.path());
                    if tx.send((req, Responder { stream })).is_err() {
                        log::info!("Request handler has gone away; shutting down listener");
                        break;
                    }
                }
                Err(HttpError::Stream(e)) => {
                    log::error!("Error reading http request: {:?}", e);
                }
                Err(e) => {
                    log::debug!("Dropping connection: {}", e);
                }
            }
        }
    });

    Ok((addr, rx))
}

#[derive(Debug, Error)]
pub enum BindError {
    #[error("Unable to listen on http port")]
    HttpListenError(#[from] io::Error),
}

#[derive(Debug, Error)]
pub enum HttpError {
    #[error("Error reading request")]
    Stream(#[from] io::Error),
    #[error("Malformed request: {0}")]
    Malformed(#[from] ParseError),
    #[error("Request larger than {} bytes", MAX_REQUEST_BYTES)]
    Oversized,
}

/// Writes exactly one response to its connection and closes it.
pub struct Responder {
    stream: TcpStream,
}

impl Responder {
    pub fn send(mut self, response: Response) -> io::Result<()> {
        let bytes = response.serialize();
        log::trace!(
            "{} response, {} bytes on the wire",
            response.status().code(),
            bytes.len()
        );
        self.stream.write_all(&bytes)?;
        self.stream.flush()?;
        self.stream.shutdown(Shutdown::Write)
    }
}

fn read_one_request(stream: &mut TcpStream) -> Result<Request, HttpError> {
    let raw = read_request_bytes(stream)?;
    Ok(Request::parse(&raw)?)
}

/// Buffers reads until the header/body separator has arrived and, when a
/// `Content-Length` is declared, until that many body bytes follow it.
/// Bytes past the declared length are discarded. EOF hands over whatever
/// arrived. Still one request per connection; this only protects against
/// a request split across packets.
fn read_request_bytes<R: Read>(stream: &mut R) -> Result<Vec<u8>, HttpError> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 4096];

    loop {
        if let Some(pos) = find_blank_line(&buf) {
            match declared_content_length(&buf[..pos]) {
                None => return Ok(buf),
                Some(content_length) => {
                    // The declared length is untrusted; bound it before
                    // it enters any arithmetic.
                    if content_length > MAX_REQUEST_BYTES.saturating_sub(pos + 4) {
                        return Err(HttpError::Oversized);
                    }
                    let wanted = pos + 4 + content_length;
                    if buf.len() >= wanted {
                        buf.truncate(wanted);
                        return Ok(buf);
                    }
                }
            }
        } else if buf.len() >= MAX_REQUEST_BYTES {
            return Err(HttpError::Oversized);
        }

        let n = stream.read(&mut chunk)?;
        if n == 0 {
            return Ok(buf);
        }
        buf.extend_from_slice(&chunk[..n]);
    }
}

/// Best-effort scan of the (unparsed) head for a `Content-Length`
/// header. Real validation happens in `Request::parse`.
fn declared_content_length(head: &[u8]) -> Option<usize> {
    let head = std::str::from_utf8(head).ok()?;
    for line in head.split("\r\n").skip(1) {
        let mut parts = line.splitn(2, ':');
        let name = parts.next()?;
        if let Some(value) = parts.next() {
            if name.eq_ignore_ascii_case("content-length") {
                return value.trim().parse().ok();
            }
        }
    }
    None
}
