#![warn(clippy::dbg_macro)]

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use sqlink_db::BridgeDb;
use tracing::error;
use tracing_subscriber::EnvFilter;

use config::HttpConfig;
use dispatch::Dispatcher;
use error::Result;
use stdio::StdioTransport;

mod config;
mod dispatch;
mod error;
mod http;
mod stdio;

/// Local SQL and file command bridge for editor front-ends.
#[derive(Parser)]
#[command(name = "sqlink-bridge", version)]
struct Cli {
    #[command(subcommand)]
    transport: Transport,
}

#[derive(Subcommand)]
enum Transport {
    /// Serve the line-oriented protocol on stdin/stdout
    Stdio {
        /// SQLite database file, created if missing
        #[arg(long)]
        database_filepath: PathBuf,

        /// File the client writes each request body to
        #[arg(long)]
        request_body_filepath: PathBuf,

        /// File the response body is written to
        #[arg(long)]
        response_body_filepath: PathBuf,

        /// Directory import/export paths are resolved against
        #[arg(long)]
        workdir: PathBuf,

        /// Scratch database file; a temporary file is used when omitted
        #[arg(long)]
        scratch_filepath: Option<PathBuf>,
    },

    /// Serve the same commands over HTTP
    Http {
        /// SQLite database file, created if missing
        #[arg(long)]
        database_filepath: PathBuf,

        /// Directory import/export paths are resolved against
        #[arg(long)]
        workdir: PathBuf,

        /// Scratch database file; a temporary file is used when omitted
        #[arg(long)]
        scratch_filepath: Option<PathBuf>,

        /// Address to listen on, overrides the config file
        #[arg(long)]
        bind: Option<String>,

        /// Origin allowed by the CORS headers, overrides the config file
        #[arg(long)]
        allowed_origin: Option<String>,

        /// TOML config file for the HTTP transport
        #[arg(long)]
        config: Option<PathBuf>,
    },
}

#[actix_web::main]
async fn main() -> ExitCode {
    // Logs go to stderr so the stdio control channel stays clean.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    match run(Cli::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("{err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<()> {
    match cli.transport {
        Transport::Stdio {
            database_filepath,
            request_body_filepath,
            response_body_filepath,
            workdir,
            scratch_filepath,
        } => {
            let db = BridgeDb::open(&database_filepath, scratch_filepath.as_deref())?;
            let dispatcher = Dispatcher::new(db, workdir);
            let stdin = std::io::stdin();
            let stdout = std::io::stdout();
            StdioTransport::new(dispatcher, request_body_filepath, response_body_filepath)
                .run(stdin.lock(), stdout.lock())
        }
        Transport::Http {
            database_filepath,
            workdir,
            scratch_filepath,
            bind,
            allowed_origin,
            config,
        } => {
            let mut http_config = match config {
                Some(path) => HttpConfig::from_file(&path)?,
                None => HttpConfig::default(),
            };
            if let Some(bind) = bind {
                http_config.bind = bind;
            }
            if let Some(origin) = allowed_origin {
                http_config.allowed_origin = origin;
            }

            let db = BridgeDb::open(&database_filepath, scratch_filepath.as_deref())?;
            let dispatcher = Dispatcher::new(db, workdir);
            http::serve(dispatcher, http_config).await
        }
    }
}
