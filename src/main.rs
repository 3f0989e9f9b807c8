use std::error::Error;
use std::io::{stdout, Write};
use std::os::unix::prelude::AsRawFd;
use std::path::Path;

use echofs::{app, config};

fn main() -> Result<(), Box<dyn Error>> {
    pretty_env_logger::init_timed();

    let matches = clap::App::new("echofs")
        .version(clap::crate_version!())
        .about("Minimal HTTP/1.1 server: echo, user-agent and a file store")
        .arg(
            clap::Arg::with_name("directory")
                .long("directory")
                .help("Data directory for the /files/ route (default: current directory)")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("config")
                .long("config")
                .short("c")
                .help("Path to an optional TOML configuration file")
                .takes_value(true),
        )
        .arg(
            clap::Arg::with_name("print-info")
                .long("print-info")
                .help("Print connection details as JSON and then close stdout")
                .long_help(
                    "Print connection details as JSON and then close stdout. \
                     Useful when the server is allowed to pick the listen port.",
                )
                .takes_value(false),
        )
        .get_matches();

    let config = config::load(
        matches.value_of("config").map(Path::new),
        matches.value_of("directory"),
    )?;

    let app = app::App::new(&config)?;

    let (addr, requests) = wicket::server::serve(&config.listen)?;
    log::info!("Listening on {}", addr);

    if matches.is_present("print-info") {
        let stdout = stdout();
        let mut s = stdout.lock();
        write!(s, r#"{{ "port": {} }}"#, addr.port())?;
        s.flush()?;
        unsafe {
            let _ = libc::close(s.as_raw_fd());
        };
    }

    for (req, responder) in requests {
        if let Err(e) = app.handle(req, responder) {
            log::error!("Something went wrong: {:?}", e);
        }
    }

    Ok(())
}
