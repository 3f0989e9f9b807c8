use std::io;

use anyhow::Context;

use wicket::encoding;
use wicket::server::Responder;
use wicket::{Method, Request, Response, Status};

use crate::config::AppConfig;
use crate::store::FileStore;

/// The router. Consumes one parsed request, produces exactly one
/// response. No state is shared across requests beyond the (immutable)
/// file store root.
pub struct App {
    store: FileStore,
}

impl App {
    pub fn new(config: &AppConfig) -> anyhow::Result<Self> {
        if !config.directory.exists() {
            std::fs::create_dir_all(&config.directory).context("Creating data directory")?;
        }
        let root = config
            .directory
            .canonicalize()
            .context("Resolving data directory")?;

        log::info!("Serving files from {}", root.to_string_lossy());

        Ok(App {
            store: FileStore::new(root),
        })
    }

    pub fn handle(&self, req: Request, resp: Responder) -> anyhow::Result<()> {
        let response = self.route(&req)?;
        resp.send(response).context("Writing response")?;
        Ok(())
    }

    fn route(&self, req: &Request) -> anyhow::Result<Response> {
        if req.path() == "/" {
            return Ok(Response::empty(Status::Ok));
        }
        if let Some(value) = req.path().strip_prefix("/echo/") {
            return self.echo(req, value);
        }
        if req.path() == "/user-agent" {
            return Ok(self.user_agent(req));
        }
        if let Some(name) = req.path().strip_prefix("/files/") {
            return Ok(self.files(req, name));
        }
        Ok(Response::empty(Status::NotFound))
    }

    fn echo(&self, req: &Request, value: &str) -> anyhow::Result<Response> {
        let negotiated = encoding::negotiate(req.header("Accept-Encoding"), value.as_bytes())
            .context("Compressing echo body")?;

        Ok(Response::builder(Status::Ok)
            .headers(negotiated.headers)
            .body(negotiated.body)
            .build())
    }

    /// A missing `User-Agent` header answers with an empty body rather
    /// than an error.
    fn user_agent(&self, req: &Request) -> Response {
        let agent = req.header("User-Agent").unwrap_or("");
        Response::builder(Status::Ok)
            .content_type("text/plain")
            .body_from_string(agent)
            .build()
    }

    fn files(&self, req: &Request, name: &str) -> Response {
        match req.method() {
            Method::GET => match self.store.read(name) {
                Ok(Some(bytes)) => Response::builder(Status::Ok)
                    .content_type("application/octet-stream")
                    .body(bytes)
                    .build(),
                Ok(None) => Response::empty(Status::NotFound),
                // Unreadable is indistinguishable from absent, as far as
                // the client is concerned.
                Err(e) => {
                    log::warn!("Reading {:?}: {}", name, e);
                    Response::empty(Status::NotFound)
                }
            },
            Method::POST => match self.store.write(name, req.body()) {
                Ok(()) => Response::empty(Status::Created),
                Err(e) if e.kind() == io::ErrorKind::InvalidInput => {
                    Response::empty(Status::NotFound)
                }
                Err(e) => {
                    log::error!("Writing {:?}: {}", name, e);
                    Response::empty(Status::InternalServerError)
                }
            },
            other => {
                log::debug!("No handler for {} on /files/", other.as_str());
                Response::empty(Status::NotFound)
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn app() -> (tempfile::TempDir, App) {
        let dir = tempfile::tempdir().unwrap();
        let app = App {
            store: FileStore::new(dir.path().to_path_buf()),
        };
        (dir, app)
    }

    fn route(app: &App, raw: &[u8]) -> Response {
        app.route(&Request::parse(raw).unwrap()).unwrap()
    }

    #[test]
    fn root_is_200_with_empty_body() {
        let (_dir, app) = app();
        let response = route(&app, b"GET / HTTP/1.1\r\n\r\n");

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.body(), None);
    }

    #[test]
    fn echo_returns_the_path_remainder() {
        let (_dir, app) = app();
        let response = route(&app, b"GET /echo/abc HTTP/1.1\r\n\r\n");

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.body(), Some(b"abc" as &[u8]));
    }

    #[test]
    fn echo_compresses_when_gzip_is_accepted() {
        let (_dir, app) = app();
        let response = route(
            &app,
            b"GET /echo/abc HTTP/1.1\r\nAccept-Encoding: gzip\r\n\r\n",
        );

        assert_eq!(response.status(), Status::Ok);
        // gzip magic bytes
        assert!(response.body().unwrap().starts_with(&[0x1f, 0x8b]));
    }

    #[test]
    fn user_agent_is_echoed_back() {
        let (_dir, app) = app();
        let response = route(
            &app,
            b"GET /user-agent HTTP/1.1\r\nUser-Agent: foobar/1.2.3\r\n\r\n",
        );

        assert_eq!(response.body(), Some(b"foobar/1.2.3" as &[u8]));
    }

    #[test]
    fn missing_user_agent_yields_an_empty_body() {
        let (_dir, app) = app();
        let response = route(&app, b"GET /user-agent HTTP/1.1\r\n\r\n");

        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.body(), Some(b"" as &[u8]));
    }

    #[test]
    fn files_get_missing_is_404() {
        let (_dir, app) = app();
        let response = route(&app, b"GET /files/nope HTTP/1.1\r\n\r\n");

        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(response.body(), None);
    }

    #[test]
    fn files_post_then_get_round_trips() {
        let (_dir, app) = app();

        let response = route(
            &app,
            b"POST /files/foo.txt HTTP/1.1\r\nContent-Length: 5\r\n\r\nhello",
        );
        assert_eq!(response.status(), Status::Created);
        assert_eq!(response.body(), None);

        let response = route(&app, b"GET /files/foo.txt HTTP/1.1\r\n\r\n");
        assert_eq!(response.status(), Status::Ok);
        assert_eq!(response.body(), Some(b"hello" as &[u8]));
    }

    #[test]
    fn files_post_write_failure_is_500() {
        let (dir, app) = app();
        // A directory squatting on the filename makes the write fail
        // for any uid, unlike permission bits.
        std::fs::create_dir(dir.path().join("taken")).unwrap();

        let response = route(
            &app,
            b"POST /files/taken HTTP/1.1\r\nContent-Length: 1\r\n\r\nx",
        );
        assert_eq!(response.status(), Status::InternalServerError);
    }

    #[test]
    fn files_with_other_methods_are_404() {
        let (_dir, app) = app();
        let response = route(&app, b"DELETE /files/foo.txt HTTP/1.1\r\n\r\n");
        assert_eq!(response.status(), Status::NotFound);
    }

    #[test]
    fn files_traversal_is_404_not_500() {
        let (_dir, app) = app();

        let response = route(&app, b"GET /files/../secret HTTP/1.1\r\n\r\n");
        assert_eq!(response.status(), Status::NotFound);

        let response = route(
            &app,
            b"POST /files/../escape HTTP/1.1\r\nContent-Length: 1\r\n\r\nx",
        );
        assert_eq!(response.status(), Status::NotFound);
    }

    #[test]
    fn unknown_routes_are_404() {
        let (_dir, app) = app();
        let response = route(&app, b"GET /nonsense HTTP/1.1\r\n\r\n");

        assert_eq!(response.status(), Status::NotFound);
        assert_eq!(response.body(), None);
    }

    #[test]
    fn echo_prefix_requires_the_trailing_slash() {
        let (_dir, app) = app();
        let response = route(&app, b"GET /echo HTTP/1.1\r\n\r\n");
        assert_eq!(response.status(), Status::NotFound);
    }
}
