use std::env;

use ner::api::CliError;
use tracing::warn;
use tracing_subscriber::EnvFilter;

const DEFAULT_PORT: u16 = 8080;

/// Port for `serve [port]`. A missing argument or one that is not a valid
/// `u16` falls back to the default; the latter is logged.
fn serve_port(arg: Option<&str>) -> u16 {
    match arg.map(|raw| (raw, raw.parse::<u16>())) {
        None => DEFAULT_PORT,
        Some((_, Ok(port))) => port,
        Some((raw, Err(e))) => {
            warn!(arg = raw, error = %e, port = DEFAULT_PORT, "invalid port, using default");
            DEFAULT_PORT
        }
    }
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();

    let raw_args: Vec<String> = env::args().collect();
    if raw_args.get(1).map(|s| s.as_str()) == Some("serve") {
        let port = serve_port(raw_args.get(2).map(String::as_str));
        if let Err(e) = ner::api::run_http_server(port).await {
            eprintln!("Server error: {e}");
            std::process::exit(1);
        }
        return;
    }

    match ner::api::run_cli(raw_args) {
        Ok(json) => println!("{json}"),
        Err(CliError::Args(e)) => e.exit(),
        Err(e) => {
            eprintln!("Error: {e}");
            std::process::exit(1);
        }
    }
}
