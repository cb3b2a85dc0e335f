//! Line-oriented transport over stdin/stdout.
//!
//! The control channel carries one command path per input line and one
//! status code per output line. Request and response bodies travel through
//! two fixed files agreed on at startup, so binary payloads never touch the
//! line channel.

use std::io::{BufRead, Write};
use std::path::PathBuf;

use tracing::debug;

use crate::dispatch::Dispatcher;
use crate::error::{IoContext, Result};

pub struct StdioTransport {
    dispatcher: Dispatcher,
    request_body: PathBuf,
    response_body: PathBuf,
}

impl StdioTransport {
    pub fn new(dispatcher: Dispatcher, request_body: PathBuf, response_body: PathBuf) -> Self {
        Self {
            dispatcher,
            request_body,
            response_body,
        }
    }

    /// Serve commands until `input` reaches end of file, then close the
    /// database handles.
    ///
    /// Each command is answered with a single `200` or `400` line; per-command
    /// failures are written to the response body file as plain text and never
    /// end the loop. Only channel I/O errors are fatal.
    pub fn run(mut self, input: impl BufRead, mut output: impl Write) -> Result<()> {
        for line in input.lines() {
            let line = line.io_context(|| "Failed to read from the command channel".into())?;
            let path = line.trim();
            if path.is_empty() {
                continue;
            }

            let status = match self.serve_one(path) {
                Ok(payload) => {
                    std::fs::write(&self.response_body, payload).io_context(|| {
                        format!("Failed to write '{}'", self.response_body.display())
                    })?;
                    200
                }
                Err(message) => {
                    std::fs::write(&self.response_body, message).io_context(|| {
                        format!("Failed to write '{}'", self.response_body.display())
                    })?;
                    400
                }
            };
            debug!(path, status, "served command");
            writeln!(output, "{status}")
                .io_context(|| "Failed to write to the command channel".into())?;
            output
                .flush()
                .io_context(|| "Failed to flush the command channel".into())?;
        }

        self.dispatcher.close()?;
        Ok(())
    }

    // The request body is re-read for every command; the client rewrites the
    // file before each line.
    fn serve_one(&mut self, path: &str) -> std::result::Result<Vec<u8>, String> {
        let body = std::fs::read(&self.request_body)
            .map_err(|e| format!("Failed to read '{}': {e}", self.request_body.display()))?;
        self.dispatcher
            .dispatch(path, &body)
            .map_err(|e| e.to_string())
    }
}
